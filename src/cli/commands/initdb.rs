use anyhow::Result;
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, error, info, trace};

use crate::config::normalize_database_url;
use crate::db::seed_database;

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    let url = normalize_database_url(database_url);
    let db: DatabaseConnection = match Database::connect(&url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    info!("Backfilling missing seed tables");
    match seed_database(&db).await {
        Ok(_) => {
            info!("All seed tables present; existing tables left untouched");
        }
        Err(e) => {
            error!("Failed to seed database: {}", e);
            return Err(e.into());
        }
    }

    info!("Database initialization completed successfully!");
    Ok(())
}
