//! REST API endpoint handlers.
//!
//! Each user has at most one open edit session on the REST side, created on
//! first `GET /api/settings/{user}` and released when it is saved or
//! deleted. The number of open sessions is capped; when the cap is reached,
//! sessions without unsaved changes are dropped to make room.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use membudget::config::PanelConfig;
use membudget::error::{AllocatorError, SessionError, StoreError};
use membudget::log::{LogBuffer, LogLine};
use membudget::session::EditSession;
use membudget::settings::{SettingsStore, UserSettings};
use serde::Deserialize;
use tracing::debug;

use crate::snapshot::AllocationSnapshot;

/// Maximum log lines returned by `GET /api/logs`.
const MAX_API_LOGS: usize = 200;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<Mutex<HashMap<String, EditSession>>>,
    pub store: Arc<dyn SettingsStore>,
    pub panel: Arc<PanelConfig>,
    pub logs: Option<LogBuffer>,
    /// Cap on open REST sessions.
    pub max_sessions: usize,
}

/// Handler error, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    /// No edit session is open for the user.
    NoSession(String),
    /// Every open session has unsaved changes and the cap is reached.
    TooManySessions(usize),
    Session(SessionError),
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<AllocatorError> for ApiError {
    fn from(e: AllocatorError) -> Self {
        Self::Session(e.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NoSession(_) => StatusCode::NOT_FOUND,
            Self::TooManySessions(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Session(SessionError::Allocator(AllocatorError::InvalidHandle { .. })) => {
                StatusCode::BAD_REQUEST
            }
            Self::Session(SessionError::Allocator(AllocatorError::Config(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Session(SessionError::Store(StoreError::InvalidUser(_))) => {
                StatusCode::BAD_REQUEST
            }
            Self::Session(SessionError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NoSession(user) => format!("no open settings session for {user:?}"),
            Self::TooManySessions(cap) => {
                format!("{cap} settings sessions have unsaved changes; save or delete one")
            }
            Self::Session(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}

/// Convert a wire handle index to an allocator index.
///
/// Negative indices can never be movable; they are reported exactly like
/// any other immovable handle.
pub fn handle_index(handle: i64) -> Result<usize, AllocatorError> {
    usize::try_from(handle).map_err(|_| AllocatorError::InvalidHandle {
        index: handle,
        last: membudget::category::CATEGORY_COUNT - 1,
    })
}

/// GET /api/settings/{user}: Open (or resume) the user's edit session.
pub async fn get_settings(
    State(app): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<AllocationSnapshot>, ApiError> {
    let mut sessions = app.sessions.lock().unwrap_or_else(|e| e.into_inner());
    if !sessions.contains_key(&user) {
        let session = EditSession::open(app.store.as_ref(), &user, &app.panel)?;
        if sessions.len() >= app.max_sessions {
            let before = sessions.len();
            sessions.retain(|_, open| open.is_dirty());
            debug!(dropped = before - sessions.len(), "evicted clean REST sessions");
            if sessions.len() >= app.max_sessions {
                return Err(ApiError::TooManySessions(app.max_sessions));
            }
        }
        debug!(user, "opened REST edit session");
        sessions.insert(user.clone(), session);
    }
    let session = sessions
        .get(&user)
        .ok_or_else(|| ApiError::NoSession(user.clone()))?;
    Ok(Json(AllocationSnapshot::from_session(session)))
}

/// Request body for POST /api/settings/{user}/move.
#[derive(Deserialize)]
pub struct MoveRequest {
    pub handle: i64,
    pub value: i64,
}

/// POST /api/settings/{user}/move: Drag one handle.
///
/// Out-of-range values are clamped, not rejected. Returns 400 for an
/// immovable handle and 404 if the session was never opened.
pub async fn post_move(
    State(app): State<AppState>,
    Path(user): Path<String>,
    Json(body): Json<MoveRequest>,
) -> Result<Json<AllocationSnapshot>, ApiError> {
    let mut sessions = app.sessions.lock().unwrap_or_else(|e| e.into_inner());
    let session = sessions
        .get_mut(&user)
        .ok_or_else(|| ApiError::NoSession(user.clone()))?;
    session.move_handle(handle_index(body.handle)?, body.value)?;
    Ok(Json(AllocationSnapshot::from_session(session)))
}

/// POST /api/settings/{user}/save: Persist the session's allocation.
///
/// Returns the stored settings record and releases the session; the next
/// GET reopens it from the store. A failed save keeps the session open.
pub async fn post_save(
    State(app): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<UserSettings>, ApiError> {
    let mut sessions = app.sessions.lock().unwrap_or_else(|e| e.into_inner());
    let session = sessions
        .get_mut(&user)
        .ok_or_else(|| ApiError::NoSession(user.clone()))?;
    let saved = session.save(app.store.as_ref())?;
    sessions.remove(&user);
    Ok(Json(saved))
}

/// POST /api/settings/{user}/reset: Restore the default split.
pub async fn post_reset(
    State(app): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<AllocationSnapshot>, ApiError> {
    let mut sessions = app.sessions.lock().unwrap_or_else(|e| e.into_inner());
    let session = sessions
        .get_mut(&user)
        .ok_or_else(|| ApiError::NoSession(user.clone()))?;
    session.reset()?;
    Ok(Json(AllocationSnapshot::from_session(session)))
}

/// DELETE /api/settings/{user}: Discard the edit session without saving.
///
/// Returns 204 if a session was open, 404 otherwise.
pub async fn delete_settings(State(app): State<AppState>, Path(user): Path<String>) -> StatusCode {
    let mut sessions = app.sessions.lock().unwrap_or_else(|e| e.into_inner());
    match sessions.remove(&user) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// GET /api/schema: JSON Schema of the flat per-category mapping.
pub async fn get_schema() -> Json<serde_json::Value> {
    Json(membudget::category_sizes_schema())
}

/// GET /api/logs: Most recent captured log lines.
pub async fn get_logs(State(app): State<AppState>) -> Json<Vec<LogLine>> {
    let lines = app
        .logs
        .as_ref()
        .map(|buf| buf.recent(MAX_API_LOGS))
        .unwrap_or_default();
    Json(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use membudget::error::ConfigError;

    #[test]
    fn move_request_deserializes() {
        let req: MoveRequest = serde_json::from_str(r#"{"handle":6,"value":7950}"#).unwrap();
        assert_eq!(req.handle, 6);
        assert_eq!(req.value, 7950);
    }

    #[test]
    fn negative_handle_is_invalid() {
        assert_eq!(handle_index(3), Ok(3));
        assert!(matches!(
            handle_index(-1),
            Err(AllocatorError::InvalidHandle { index: -1, last: 7 })
        ));
    }

    #[test]
    fn errors_map_to_status_codes() {
        let invalid = ApiError::from(AllocatorError::InvalidHandle { index: 0, last: 7 });
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let config = ApiError::from(AllocatorError::Config(ConfigError::Overflow));
        assert_eq!(config.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let user = ApiError::Session(StoreError::InvalidUser("x/y".into()).into());
        assert_eq!(user.status(), StatusCode::BAD_REQUEST);

        let io = ApiError::Session(StoreError::Io(std::io::Error::other("boom")).into());
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ApiError::NoSession("alice".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::TooManySessions(4).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
