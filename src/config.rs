use anyhow::Result;
use sea_orm::Database;
use std::path::PathBuf;
use std::time::Duration;

use crate::db;
use crate::schemas::AppState;
use crate::session::SessionStore;

/// Runtime configuration assembled from CLI arguments and environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub users_file: PathBuf,
    pub session_ttl: Duration,
}

/// SQLite URLs without connection options get `mode=rwc` so the database
/// file is created on first run.
pub fn normalize_database_url(url: &str) -> String {
    if url.starts_with("sqlite:") && !url.contains('?') && !url.ends_with("::memory:") {
        format!("{url}?mode=rwc")
    } else {
        url.to_string()
    }
}

/// Initialize application state: connect, backfill missing seed tables,
/// set up the session store.
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    let database_url = normalize_database_url(&config.database_url);
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(&database_url).await?;

    db::seed_database(&db).await?;

    let sessions = SessionStore::new(config.session_ttl);

    Ok(AppState {
        db,
        sessions,
        users_file: config.users_file.clone(),
    })
}
