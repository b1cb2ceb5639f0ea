use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use overdrinks_shared::errors::{AppError, AppResult, ErrorCode};
use overdrinks_shared::types::api::FieldError;
use overdrinks_shared::types::auth::AuthUser;

use crate::models::{NewVenue, Venue};
use crate::schema::venues;
use crate::services::presence::{self, VenueUser};
use crate::AppState;

// --- GET /api/venues ---

pub async fn list_venues(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<Venue>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = venues::table
        .order(venues::name.asc())
        .load::<Venue>(&mut conn)?;

    Ok(Json(rows))
}

// --- GET /api/venues/:venue_id ---

pub async fn get_venue(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<Uuid>,
) -> AppResult<Json<Venue>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let venue = venues::table
        .find(venue_id)
        .first::<Venue>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::VenueNotFound, "venue not found"))?;

    Ok(Json(venue))
}

// --- POST /api/venues ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVenueRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub venue_type: Option<String>,
    pub music_type: Option<String>,
    pub vibe: Option<String>,
    pub description: Option<String>,
}

pub async fn create_venue(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateVenueRequest>,
) -> AppResult<Json<Venue>> {
    let mut errors = Vec::new();
    let name = required(req.name, "name", &mut errors);
    let address = required(req.address, "address", &mut errors);
    let venue_type = required(req.venue_type, "venueType", &mut errors);
    let music_type = required(req.music_type, "musicType", &mut errors);
    let vibe = required(req.vibe, "vibe", &mut errors);

    if !errors.is_empty() {
        return Err(AppError::validation_list("invalid venue", errors));
    }
    let (Some(name), Some(address), Some(venue_type), Some(music_type), Some(vibe)) =
        (name, address, venue_type, music_type, vibe)
    else {
        return Err(AppError::bad_request("invalid venue"));
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let venue = diesel::insert_into(venues::table)
        .values(&NewVenue {
            name,
            address,
            venue_type,
            music_type,
            vibe,
            description: req.description,
        })
        .get_result::<Venue>(&mut conn)?;

    tracing::info!(venue_id = %venue.id, name = %venue.name, "venue created");
    Ok(Json(venue))
}

// --- POST /api/venues/initialize ---

/// One-time seed of the reference venue set. Safe to call repeatedly: once
/// any venues exist, returns the current list without inserting.
pub async fn initialize_venues(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<Venue>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = venues::table.count().get_result::<i64>(&mut conn)?;
    if existing > 0 {
        let rows = venues::table
            .order(venues::name.asc())
            .load::<Venue>(&mut conn)?;
        return Ok(Json(rows));
    }

    let seeded = diesel::insert_into(venues::table)
        .values(&seed_venues())
        .get_results::<Venue>(&mut conn)?;

    tracing::info!(count = seeded.len(), "venues seeded");
    Ok(Json(seeded))
}

// --- GET /api/venues/:venue_id/users ---

pub async fn get_venue_users(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<Uuid>,
) -> AppResult<Json<Vec<VenueUser>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let roster = presence::users_at_venue(&mut conn, venue_id, user.id)?;
    Ok(Json(roster))
}

// --- GET /api/venues/:venue_id/popularity ---

#[derive(Debug, Serialize)]
pub struct PopularityResponse {
    pub count: i64,
}

pub async fn get_venue_popularity(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<Uuid>,
) -> AppResult<Json<PopularityResponse>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let count = presence::venue_popularity(&mut conn, venue_id)?;
    Ok(Json(PopularityResponse { count }))
}

// --- helpers ---

fn required(
    value: Option<String>,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(FieldError::new(path, format!("{path} is required")));
            None
        }
    }
}

fn seed_venues() -> Vec<NewVenue> {
    let venue = |name: &str, address: &str, venue_type: &str, music: &str, vibe: &str, desc: &str| {
        NewVenue {
            name: name.to_string(),
            address: address.to_string(),
            venue_type: venue_type.to_string(),
            music_type: music.to_string(),
            vibe: vibe.to_string(),
            description: Some(desc.to_string()),
        }
    };

    vec![
        venue(
            "The Velvet Room",
            "12 Harrow Ln",
            "cocktail-bar",
            "jazz",
            "intimate",
            "Low-lit cocktail lounge with live jazz on weekends",
        ),
        venue(
            "Static",
            "48 Meridian Ave",
            "nightclub",
            "electronic",
            "high-energy",
            "Warehouse club with a late-night electronic lineup",
        ),
        venue(
            "Barrel & Vine",
            "203 Court St",
            "wine-bar",
            "acoustic",
            "relaxed",
            "Neighborhood wine bar with a long natural list",
        ),
        venue(
            "The Crow's Nest",
            "7 Dockside Way",
            "dive-bar",
            "rock",
            "casual",
            "Cheap pints, loud jukebox, no pretense",
        ),
        venue(
            "Halcyon Rooftop",
            "90 Tower Pl",
            "rooftop-bar",
            "house",
            "upscale",
            "Skyline views and a strict door after ten",
        ),
        venue(
            "El Farol",
            "310 Alameda Blvd",
            "cantina",
            "latin",
            "lively",
            "Salsa floor in the back, mezcal list up front",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_set_is_nonempty_with_unique_names() {
        let seeds = seed_venues();
        assert!(!seeds.is_empty());

        let mut names: Vec<&str> = seeds.iter().map(|v| v.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), seeds.len());
    }

    #[test]
    fn seed_venues_have_all_required_fields() {
        for v in seed_venues() {
            assert!(!v.name.trim().is_empty());
            assert!(!v.address.trim().is_empty());
            assert!(!v.venue_type.trim().is_empty());
            assert!(!v.music_type.trim().is_empty());
            assert!(!v.vibe.trim().is_empty());
        }
    }

    #[test]
    fn required_trims_and_rejects_blank_values() {
        let mut errors = Vec::new();
        assert_eq!(
            required(Some("  Static  ".into()), "name", &mut errors),
            Some("Static".into())
        );
        assert!(required(Some("   ".into()), "address", &mut errors).is_none());
        assert!(required(None, "vibe", &mut errors).is_none());
        assert_eq!(errors.len(), 2);
    }
}
