use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use overdrinks_shared::errors::{AppError, AppResult};
use overdrinks_shared::types::api::FieldError;
use overdrinks_shared::types::auth::AuthUser;

use crate::services::match_ledger::{self, MatchDetails, MatchResult};
use crate::AppState;

// --- POST /api/matches ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub target_id: Option<Uuid>,
    pub venue_id: Option<Uuid>,
}

pub async fn create_match(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMatchRequest>,
) -> AppResult<Json<MatchResult>> {
    let mut errors = Vec::new();
    if req.target_id.is_none() {
        errors.push(FieldError::new("targetId", "targetId is required"));
    }
    if req.venue_id.is_none() {
        errors.push(FieldError::new("venueId", "venueId is required"));
    }
    if !errors.is_empty() {
        return Err(AppError::validation_list("invalid match request", errors));
    }

    let (Some(target_id), Some(venue_id)) = (req.target_id, req.venue_id) else {
        return Err(AppError::bad_request("invalid match request"));
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let result = match_ledger::request_match(&mut conn, user.id, target_id, venue_id)?;

    Ok(Json(result))
}

// --- GET /api/matches ---

pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<MatchDetails>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let rows = match_ledger::list_matches(&mut conn, user.id)?;
    Ok(Json(rows))
}
