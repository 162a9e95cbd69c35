use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::credentials::{self, TablePermission};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::session::AuthSession;

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// Username as it appears in the credential file
    pub username: String,
    /// Password (verified against the stored hash or legacy plaintext)
    pub password: String,
}

/// Successful login response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    pub username: String,
    /// Per-table access flags copied from the credential file at login time
    pub permissions: BTreeMap<String, TablePermission>,
}

/// Current session description
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SessionInfo {
    pub username: String,
    pub permissions: BTreeMap<String, TablePermission>,
}

/// Log in with username and password
///
/// The credential file is re-read on every attempt, so edits to it take
/// effect without a restart.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 503, description = "Credential file missing or unreadable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let users = match credentials::load_users(&state.users_file) {
        Ok(users) => users,
        Err(e) => {
            error!(
                "failed to load credential file '{}': {}",
                state.users_file.display(),
                e
            );
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Credential file is missing or unreadable; logins are disabled"
                        .to_string(),
                    code: "CREDENTIALS_UNAVAILABLE".to_string(),
                    success: false,
                }),
            ));
        }
    };

    let verified = users
        .get(&request.username)
        .map(|user| user.verify_password(&request.password));

    match verified {
        Some(true) => {
            let permissions = users[&request.username].permissions.clone();
            let session = state
                .sessions
                .create(request.username.clone(), permissions)
                .await;
            info!("user '{}' logged in", session.username);
            let response = ApiResponse {
                data: LoginResponse {
                    token: session.token,
                    username: session.username,
                    permissions: session.permissions,
                },
                message: format!("Logged in as {}", request.username),
                success: true,
            };
            Ok(Json(response))
        }
        Some(false) | None => {
            warn!("failed login attempt for user '{}'", request.username);
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid username or password".to_string(),
                    code: "INVALID_CREDENTIALS".to_string(),
                    success: false,
                }),
            ))
        }
    }
}

/// Log out and destroy the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session destroyed", body = ApiResponse<String>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Json<ApiResponse<String>> {
    state.sessions.destroy(&session.token).await;
    info!("user '{}' logged out", session.username);
    Json(ApiResponse {
        data: session.username,
        message: "Logged out".to_string(),
        success: true,
    })
}

/// Describe the current session
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionInfo>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn session_info(AuthSession(session): AuthSession) -> Json<ApiResponse<SessionInfo>> {
    Json(ApiResponse {
        data: SessionInfo {
            username: session.username,
            permissions: session.permissions,
        },
        message: "Session retrieved successfully".to_string(),
        success: true,
    })
}
