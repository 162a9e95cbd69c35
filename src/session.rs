use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;
use moka::future::Cache;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::credentials::TablePermission;
use crate::schemas::{AppState, ErrorResponse};

/// Authenticated context for one user, created on login and destroyed on
/// logout or idle expiry.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub permissions: BTreeMap<String, TablePermission>,
}

impl Session {
    pub fn permission_for(&self, table: &str) -> TablePermission {
        self.permissions.get(table).copied().unwrap_or_default()
    }

    pub fn can_view(&self, table: &str) -> bool {
        self.permission_for(table).view
    }

    pub fn can_edit(&self, table: &str) -> bool {
        self.permission_for(table).edit
    }

    /// Table names this session may view, in permission-file order.
    pub fn viewable_tables(&self) -> Vec<String> {
        self.permissions
            .iter()
            .filter(|(_, perm)| perm.view)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Token-indexed session storage with idle expiry.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cache: Cache<String, Session>,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle_ttl)
            .build();
        Self { cache }
    }

    /// Create a session for a freshly authenticated user.
    pub async fn create(
        &self,
        username: String,
        permissions: BTreeMap<String, TablePermission>,
    ) -> Session {
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            token: token.clone(),
            username,
            permissions,
        };
        self.cache.insert(token, session.clone()).await;
        session
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.cache.get(token).await
    }

    /// Destroy a session. Destroying an unknown token is a no-op.
    pub async fn destroy(&self, token: &str) {
        self.cache.invalidate(token).await;
    }
}

/// Extractor requiring a valid `Authorization: Bearer <token>` session.
///
/// Rejects with 401 when the header is missing, malformed, or the token does
/// not resolve to a live session.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

fn unauthorized(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "UNAUTHORIZED".to_string(),
            success: false,
        }),
    )
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = header
            .trim()
            .strip_prefix("Bearer ")
            .or_else(|| header.trim().strip_prefix("bearer "))
            .ok_or_else(|| unauthorized("Authorization header must be a bearer token"))?;

        match state.sessions.get(token).await {
            Some(session) => Ok(Self(session)),
            None => {
                debug!("rejected request with unknown or expired session token");
                Err(unauthorized("Invalid or expired session"))
            }
        }
    }
}
