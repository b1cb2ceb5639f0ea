use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use overdrinks_shared::errors::{AppError, AppResult, ErrorCode};
use overdrinks_shared::types::api::FieldError;
use overdrinks_shared::types::auth::AuthUser;

use crate::models::{Gender, NewProfile, Profile, SexualOrientation, UpdateProfile};
use crate::routes::auth::upsert_from_claims;
use crate::schema::profiles;
use crate::AppState;

// --- GET /api/profile ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Profile>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(profile))
}

// --- POST /api/profile ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub gender: Option<String>,
    pub sexual_orientation: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_photo_url: Option<String>,
}

pub async fn create_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let mut errors = Vec::new();

    let username = match req.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(name.to_string()),
        _ => {
            errors.push(FieldError::new("username", "username is required"));
            None
        }
    };

    let gender = parse_field::<Gender>(req.gender.as_deref(), "gender", &mut errors);
    let orientation = parse_field::<SexualOrientation>(
        req.sexual_orientation.as_deref(),
        "sexualOrientation",
        &mut errors,
    );

    if req.birthday.is_none() {
        errors.push(FieldError::new("birthday", "birthday is required"));
    }

    if !errors.is_empty() {
        return Err(AppError::validation_list("invalid profile", errors));
    }

    // All four unwrap through the same guard above.
    let (Some(username), Some(gender), Some(orientation), Some(birthday)) =
        (username, gender, orientation, req.birthday)
    else {
        return Err(AppError::internal("profile validation state inconsistent"));
    };

    validate_username(&username)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // First profile-creation can be the first authenticated call; make sure
    // the identity row exists before the foreign key needs it.
    upsert_from_claims(&mut conn, &user)?;

    let existing = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .count()
        .get_result::<i64>(&mut conn)?;
    if existing > 0 {
        return Err(AppError::new(
            ErrorCode::ProfileAlreadyExists,
            "profile already exists",
        ));
    }

    ensure_username_free(&mut conn, &username, None)?;

    let interests = serde_json::to_value(&req.interests)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let profile = diesel::insert_into(profiles::table)
        .values(&NewProfile {
            user_id: user.id,
            username: username.clone(),
            bio: req.bio,
            interests,
            gender: gender.as_str().to_string(),
            sexual_orientation: orientation.as_str().to_string(),
            birthday,
            profile_photo_url: req.profile_photo_url,
        })
        .get_result::<Profile>(&mut conn)
        .map_err(username_conflict)?;

    tracing::info!(user_id = %user.id, username = %username, "profile created");
    Ok(Json(profile))
}

// --- PUT /api/profile ---

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub interests: Option<Vec<String>>,
    pub gender: Option<String>,
    pub sexual_orientation: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_photo_url: Option<String>,
}

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    let mut errors = Vec::new();

    let gender = parse_field::<Gender>(req.gender.as_deref(), "gender", &mut errors);
    let orientation = parse_field::<SexualOrientation>(
        req.sexual_orientation.as_deref(),
        "sexualOrientation",
        &mut errors,
    );
    if !errors.is_empty() {
        return Err(AppError::validation_list("invalid profile", errors));
    }

    if let Some(name) = req.username.as_deref() {
        validate_username(name)?;
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::user_id.eq(user.id))
        .first::<Profile>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    if let Some(name) = req.username.as_deref() {
        ensure_username_free(&mut conn, name, Some(user.id))?;
    }

    let interests = match req.interests {
        Some(list) => Some(
            serde_json::to_value(&list).map_err(|e| AppError::internal(e.to_string()))?,
        ),
        None => None,
    };

    let changes = UpdateProfile {
        username: req.username,
        bio: req.bio,
        interests,
        gender: gender.map(|g| g.as_str().to_string()),
        sexual_orientation: orientation.map(|o| o.as_str().to_string()),
        birthday: req.birthday,
        profile_photo_url: req.profile_photo_url,
    };

    let updated = diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((&changes, profiles::updated_at.eq(chrono::Utc::now())))
        .get_result::<Profile>(&mut conn)
        .map_err(username_conflict)?;

    Ok(Json(updated))
}

// --- helpers ---

fn parse_field<T: FromStr<Err = String>>(
    raw: Option<&str>,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match raw {
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(msg) => {
                errors.push(FieldError::new(path, msg));
                None
            }
        },
        None => {
            errors.push(FieldError::new(path, format!("{path} is required")));
            None
        }
    }
}

fn validate_username(name: &str) -> AppResult<()> {
    if name.len() < 3 || name.len() > 30 {
        return Err(AppError::new(
            ErrorCode::InvalidUsername,
            "username must be between 3 and 30 characters",
        ));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AppError::new(
            ErrorCode::InvalidUsername,
            "username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

/// The pre-insert uniqueness check races with concurrent writers; a
/// unique-violation out of the profiles table is the username index losing
/// that race, and gets the same conflict answer as the check itself.
fn username_conflict(e: diesel::result::Error) -> AppError {
    match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => AppError::new(ErrorCode::UsernameTaken, "username is already taken"),
        other => AppError::Database(other),
    }
}

fn ensure_username_free(
    conn: &mut diesel::pg::PgConnection,
    name: &str,
    exclude_user: Option<uuid::Uuid>,
) -> AppResult<()> {
    let count = match exclude_user {
        Some(user_id) => profiles::table
            .filter(profiles::username.eq(name))
            .filter(profiles::user_id.ne(user_id))
            .count()
            .get_result::<i64>(conn)?,
        None => profiles::table
            .filter(profiles::username.eq(name))
            .count()
            .get_result::<i64>(conn)?,
    };

    let taken = count > 0;
    if taken {
        return Err(AppError::new(
            ErrorCode::UsernameTaken,
            "username is already taken",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_is_bounded() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("sam_92").is_ok());
    }

    #[test]
    fn username_rejects_punctuation() {
        assert!(validate_username("sam-92").is_err());
        assert!(validate_username("sam 92").is_err());
        assert!(validate_username("sam!").is_err());
    }

    #[test]
    fn parse_field_collects_unknown_values() {
        let mut errors = Vec::new();
        let parsed = parse_field::<Gender>(Some("robot"), "gender", &mut errors);
        assert!(parsed.is_none());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "gender");
    }

    #[test]
    fn racing_username_insert_maps_to_conflict() {
        let err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        );
        match username_conflict(err) {
            AppError::Known { code, .. } => assert_eq!(code, ErrorCode::UsernameTaken),
            other => panic!("expected UsernameTaken, got {other:?}"),
        }
    }

    #[test]
    fn other_database_errors_pass_through() {
        let err = diesel::result::Error::NotFound;
        assert!(matches!(username_conflict(err), AppError::Database(_)));
    }

    #[test]
    fn parse_field_reports_missing_values() {
        let mut errors = Vec::new();
        let parsed = parse_field::<SexualOrientation>(None, "sexualOrientation", &mut errors);
        assert!(parsed.is_none());
        assert_eq!(errors[0].message, "sexualOrientation is required");
    }
}
