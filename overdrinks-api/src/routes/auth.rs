use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::sync::Arc;

use overdrinks_shared::errors::{AppError, AppResult};
use overdrinks_shared::types::auth::AuthUser;

use crate::models::{UpsertUser, User};
use crate::schema::users;
use crate::AppState;

// --- GET /api/auth/user ---

/// Returns the acting user's identity record, creating it from the token
/// claims on first authentication.
pub async fn get_current_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<User>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let row = upsert_from_claims(&mut conn, &user)?;
    Ok(Json(row))
}

/// Inserts or refreshes the user row backing the token claims. Profile and
/// check-in flows call this so a first-time caller has an identity row
/// before any foreign key needs it.
pub(crate) fn upsert_from_claims(conn: &mut PgConnection, user: &AuthUser) -> AppResult<User> {
    let upsert = UpsertUser {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        profile_image_url: user.profile_image_url.clone(),
    };

    let row = diesel::insert_into(users::table)
        .values(&upsert)
        .on_conflict(users::id)
        .do_update()
        .set((&upsert, users::updated_at.eq(Utc::now())))
        .get_result::<User>(conn)?;

    Ok(row)
}
