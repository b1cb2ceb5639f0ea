use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use overdrinks_shared::errors::{AppError, AppResult, ErrorCode};
use overdrinks_shared::types::api::{FieldError, MessageResponse};
use overdrinks_shared::types::auth::AuthUser;

use crate::models::{CheckIn, CheckInMode};
use crate::routes::auth::upsert_from_claims;
use crate::services::presence;
use crate::AppState;

// --- POST /api/checkin ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub venue_id: Option<Uuid>,
    pub mode: Option<String>,
    #[serde(default)]
    pub ai_recommendations: bool,
}

pub async fn check_in(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckInRequest>,
) -> AppResult<Json<CheckIn>> {
    let mut errors = Vec::new();
    if req.venue_id.is_none() {
        errors.push(FieldError::new("venueId", "venueId is required"));
    }
    if req.mode.is_none() {
        errors.push(FieldError::new("mode", "mode is required"));
    }
    if !errors.is_empty() {
        return Err(AppError::validation_list("invalid check-in", errors));
    }

    let (Some(venue_id), Some(mode_raw)) = (req.venue_id, req.mode.as_deref()) else {
        return Err(AppError::bad_request("invalid check-in"));
    };

    let mode = CheckInMode::from_str(mode_raw)
        .map_err(|msg| AppError::new(ErrorCode::InvalidCheckInMode, msg))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    upsert_from_claims(&mut conn, &user)?;

    let row = presence::check_in(&mut conn, user.id, venue_id, mode, req.ai_recommendations)?;
    Ok(Json(row))
}

// --- POST /api/checkout ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    pub venue_id: Option<Uuid>,
}

pub async fn check_out(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckOutRequest>,
) -> AppResult<Json<MessageResponse>> {
    let Some(venue_id) = req.venue_id else {
        return Err(AppError::validation_list(
            "invalid check-out",
            vec![FieldError::new("venueId", "venueId is required")],
        ));
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let closed = presence::check_out(&mut conn, user.id, venue_id)?;

    tracing::info!(user_id = %user.id, venue_id = %closed.venue_id, "user checked out");
    Ok(Json(MessageResponse::new("checked out")))
}

// --- GET /api/checkin/current ---

pub async fn current_check_in(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<CheckIn>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let row = presence::current_check_in(&mut conn, user.id)?;
    Ok(Json(row))
}
