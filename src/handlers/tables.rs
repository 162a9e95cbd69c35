use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::JsonValue;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};
use utoipa::ToSchema;

use crate::db::{self, ColumnSpec, DbError, SeriesPoint, TableData};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::session::AuthSession;

/// One table the current user may view
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TableSummary {
    /// Table name
    pub name: String,
    /// Whether the current user may replace the table contents
    pub edit: bool,
    /// Current version stamp
    pub version: i64,
}

/// Request body for replacing a table wholesale
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReplaceTableRequest {
    /// Column declarations for the recreated table
    pub columns: Vec<ColumnSpec>,
    /// All rows of the edited table, keyed by column name
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<JsonValue>,
    /// When set, the save is rejected unless it matches the stored version
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Result of a table replacement
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReplaceTableResponse {
    pub name: String,
    /// New version stamp after the save
    pub version: i64,
    /// Number of rows now stored
    pub rows: usize,
}

/// Query parameter for the chart series endpoint
#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub column: String,
}

fn forbidden(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "FORBIDDEN".to_string(),
            success: false,
        }),
    )
}

fn db_error_response(err: DbError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code, message) = match &err {
        DbError::TableNotFound(name) => (
            StatusCode::NOT_FOUND,
            "TABLE_NOT_FOUND",
            format!("Table '{}' not found", name),
        ),
        DbError::VersionConflict {
            table,
            expected,
            found,
        } => (
            StatusCode::CONFLICT,
            "VERSION_CONFLICT",
            format!(
                "Table '{}' was modified by someone else (expected version {}, found {})",
                table, expected, found
            ),
        ),
        DbError::ColumnNotFound(column) => (
            StatusCode::BAD_REQUEST,
            "COLUMN_NOT_FOUND",
            format!("Column '{}' not found", column),
        ),
        DbError::NonNumericColumn(column) => (
            StatusCode::BAD_REQUEST,
            "COLUMN_NOT_NUMERIC",
            format!("Column '{}' is not numeric and cannot be charted", column),
        ),
        DbError::InvalidIdentifier(_)
        | DbError::UnsupportedColumnType(_)
        | DbError::NoColumns => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.to_string()),
        DbError::Database(db_err) => {
            error!("database error: {}", db_err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "An internal database error occurred".to_string(),
            )
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        }),
    )
}

/// List the tables the current user may view
///
/// Tables granted in the permission file but absent from the database are
/// omitted. An empty list means nothing is available for this user.
#[utoipa::path(
    get,
    path = "/api/v1/tables",
    tag = "tables",
    responses(
        (status = 200, description = "Viewable tables", body = ApiResponse<Vec<TableSummary>>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn list_tables(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<ApiResponse<Vec<TableSummary>>>, (StatusCode, Json<ErrorResponse>)> {
    let existing = db::tables::existing_tables(&state.db)
        .await
        .map_err(db_error_response)?;

    let mut summaries = Vec::new();
    for name in session.viewable_tables() {
        if !existing.iter().any(|t| *t == name) {
            warn!(
                "user '{}' has view access to missing table '{}'",
                session.username, name
            );
            continue;
        }
        let version = db::tables::table_version(&state.db, &name)
            .await
            .map_err(db_error_response)?;
        summaries.push(TableSummary {
            edit: session.can_edit(&name),
            name,
            version,
        });
    }

    Ok(Json(ApiResponse {
        data: summaries,
        message: "Tables retrieved successfully".to_string(),
        success: true,
    }))
}

/// Fetch the full contents of a table
#[utoipa::path(
    get,
    path = "/api/v1/tables/{table_name}",
    tag = "tables",
    params(
        ("table_name" = String, Path, description = "Table name"),
    ),
    responses(
        (status = 200, description = "Table contents", body = ApiResponse<TableData>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "View permission missing", body = ErrorResponse),
        (status = 404, description = "Table not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, session))]
pub async fn get_table(
    Path(table_name): Path<String>,
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<ApiResponse<TableData>>, (StatusCode, Json<ErrorResponse>)> {
    if !session.can_view(&table_name) {
        return Err(forbidden("You do not have view access to this table"));
    }

    let data = db::tables::read_table(&state.db, &table_name)
        .await
        .map_err(db_error_response)?;

    Ok(Json(ApiResponse {
        data,
        message: "Table retrieved successfully".to_string(),
        success: true,
    }))
}

/// Replace the whole table with the edited rows
///
/// Last save wins unless `expected_version` is supplied, in which case a
/// stale version is rejected with 409 and nothing is written.
#[utoipa::path(
    put,
    path = "/api/v1/tables/{table_name}",
    tag = "tables",
    params(
        ("table_name" = String, Path, description = "Table name"),
    ),
    request_body = ReplaceTableRequest,
    responses(
        (status = 200, description = "Table replaced", body = ApiResponse<ReplaceTableResponse>),
        (status = 400, description = "Invalid columns or rows", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Edit permission missing", body = ErrorResponse),
        (status = 404, description = "Table not found", body = ErrorResponse),
        (status = 409, description = "Version conflict", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, session, request))]
pub async fn replace_table(
    Path(table_name): Path<String>,
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(request): Json<ReplaceTableRequest>,
) -> Result<Json<ApiResponse<ReplaceTableResponse>>, (StatusCode, Json<ErrorResponse>)> {
    if !session.can_view(&table_name) {
        return Err(forbidden("You do not have view access to this table"));
    }
    if !session.can_edit(&table_name) {
        return Err(forbidden("Read-only access for this table"));
    }

    let version = db::tables::replace_table(
        &state.db,
        &table_name,
        &request.columns,
        &request.rows,
        request.expected_version,
    )
    .await
    .map_err(db_error_response)?;

    Ok(Json(ApiResponse {
        data: ReplaceTableResponse {
            name: table_name,
            version,
            rows: request.rows.len(),
        },
        message: "Table updated successfully".to_string(),
        success: true,
    }))
}

/// Chart series for one numeric column of a table
///
/// Points are indexed by the `date` column when the table has one, otherwise
/// by row position.
#[utoipa::path(
    get,
    path = "/api/v1/tables/{table_name}/series",
    tag = "tables",
    params(
        ("table_name" = String, Path, description = "Table name"),
        ("column" = String, Query, description = "Numeric column to chart"),
    ),
    responses(
        (status = 200, description = "Chart series", body = ApiResponse<Vec<SeriesPoint>>),
        (status = 400, description = "Unknown or non-numeric column", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "View permission missing", body = ErrorResponse),
        (status = 404, description = "Table not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, session))]
pub async fn get_table_series(
    Path(table_name): Path<String>,
    Query(query): Query<SeriesQuery>,
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<ApiResponse<Vec<SeriesPoint>>>, (StatusCode, Json<ErrorResponse>)> {
    if !session.can_view(&table_name) {
        return Err(forbidden("You do not have view access to this table"));
    }

    let points = db::tables::column_series(&state.db, &table_name, &query.column)
        .await
        .map_err(db_error_response)?;

    Ok(Json(ApiResponse {
        data: points,
        message: "Series retrieved successfully".to_string(),
        success: true,
    }))
}
