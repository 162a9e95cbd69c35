use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::{OpenApi, ToSchema};

use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Active login sessions
    pub sessions: SessionStore,
    /// Credential file, re-read on every login attempt
    pub users_file: PathBuf,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::session_info,
        crate::handlers::tables::list_tables,
        crate::handlers::tables::get_table,
        crate::handlers::tables::replace_table,
        crate::handlers::tables::get_table_series,
    ),
    components(
        schemas(
            ApiResponse<crate::handlers::auth::LoginResponse>,
            ApiResponse<crate::handlers::auth::SessionInfo>,
            ApiResponse<Vec<crate::handlers::tables::TableSummary>>,
            ApiResponse<crate::db::TableData>,
            ApiResponse<crate::handlers::tables::ReplaceTableResponse>,
            ApiResponse<Vec<crate::db::SeriesPoint>>,
            ApiResponse<String>,
            ErrorResponse,
            HealthResponse,
            crate::credentials::TablePermission,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::SessionInfo,
            crate::handlers::tables::TableSummary,
            crate::handlers::tables::ReplaceTableRequest,
            crate::handlers::tables::ReplaceTableResponse,
            crate::db::ColumnInfo,
            crate::db::ColumnSpec,
            crate::db::TableData,
            crate::db::SeriesPoint,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, logout and session inspection"),
        (name = "tables", description = "Dashboard table viewing and editing"),
    ),
    info(
        title = "FinDash API",
        description = "Internal financial dashboard - YAML-defined users, per-table permissions, SQLite-backed tables",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
