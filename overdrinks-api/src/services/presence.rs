use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use overdrinks_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{CheckIn, CheckInMode, NewCheckIn, Profile, User};
use crate::schema::{check_ins, profiles, users, venues};

use super::{acquire_xact_lock, user_lock_key};

/// A roster entry: the user spread at the top level with their profile and
/// open check-in nested, matching the client contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueUser {
    #[serde(flatten)]
    pub user: User,
    pub profile: Profile,
    pub check_in: CheckIn,
}

/// Opens a check-in for the user at the venue, closing any prior open
/// check-in first. Both steps run in one transaction under a per-user
/// advisory lock, so a user can never end up with two open rows.
pub fn check_in(
    conn: &mut PgConnection,
    user_id: Uuid,
    venue_id: Uuid,
    mode: CheckInMode,
    ai_recommendations: bool,
) -> AppResult<CheckIn> {
    ensure_venue_exists(conn, venue_id)?;
    ensure_user_exists(conn, user_id)?;

    let row = conn.transaction::<CheckIn, diesel::result::Error, _>(|conn| {
        acquire_xact_lock(conn, user_lock_key(user_id))?;

        // Closing zero rows is fine: the user simply was not checked in.
        diesel::update(
            check_ins::table
                .filter(check_ins::user_id.eq(user_id))
                .filter(check_ins::checked_out_at.is_null()),
        )
        .set(check_ins::checked_out_at.eq(Utc::now()))
        .execute(conn)?;

        diesel::insert_into(check_ins::table)
            .values(&NewCheckIn {
                user_id,
                venue_id,
                mode: mode.as_str().to_string(),
                ai_recommendations,
            })
            .get_result::<CheckIn>(conn)
    })?;

    tracing::info!(user_id = %user_id, venue_id = %venue_id, mode = %mode, "user checked in");
    Ok(row)
}

/// Closes the open check-in for `(user, venue)`. Reports 404 when there is
/// nothing to close rather than silently succeeding, so clients learn their
/// presence state was already gone.
pub fn check_out(conn: &mut PgConnection, user_id: Uuid, venue_id: Uuid) -> AppResult<CheckIn> {
    let closed = diesel::update(
        check_ins::table
            .filter(check_ins::user_id.eq(user_id))
            .filter(check_ins::venue_id.eq(venue_id))
            .filter(check_ins::checked_out_at.is_null()),
    )
    .set(check_ins::checked_out_at.eq(Utc::now()))
    .get_result::<CheckIn>(conn)
    .optional()?;

    closed.ok_or_else(|| {
        AppError::new(
            ErrorCode::CheckInNotFound,
            "no open check-in at this venue",
        )
    })
}

/// The user's single open check-in. Ordered newest-first as a tie-break in
/// case an invariant violation ever left more than one open row.
pub fn current_check_in(conn: &mut PgConnection, user_id: Uuid) -> AppResult<CheckIn> {
    check_ins::table
        .filter(check_ins::user_id.eq(user_id))
        .filter(check_ins::checked_out_at.is_null())
        .order(check_ins::checked_in_at.desc())
        .first::<CheckIn>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CheckInNotFound, "not checked in anywhere"))
}

/// Everyone currently present at the venue, newest arrival first, with the
/// viewer excluded and the visibility rule applied.
pub fn users_at_venue(
    conn: &mut PgConnection,
    venue_id: Uuid,
    viewer_id: Uuid,
) -> AppResult<Vec<VenueUser>> {
    ensure_venue_exists(conn, venue_id)?;

    let viewer_profile = profiles::table
        .filter(profiles::user_id.eq(viewer_id))
        .first::<Profile>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let rows = check_ins::table
        .inner_join(users::table.inner_join(profiles::table))
        .filter(check_ins::venue_id.eq(venue_id))
        .filter(check_ins::checked_out_at.is_null())
        .filter(check_ins::user_id.ne(viewer_id))
        .order(check_ins::checked_in_at.desc())
        .load::<(CheckIn, (User, Profile))>(conn)?;

    Ok(rows
        .into_iter()
        .filter(|(check_in, _)| roster_visible(&check_in.mode, &viewer_profile.sexual_orientation))
        .map(|(check_in, (user, profile))| VenueUser {
            user,
            profile,
            check_in,
        })
        .collect())
}

/// Number of open check-ins at the venue.
pub fn venue_popularity(conn: &mut PgConnection, venue_id: Uuid) -> AppResult<i64> {
    ensure_venue_exists(conn, venue_id)?;

    let count = check_ins::table
        .filter(check_ins::venue_id.eq(venue_id))
        .filter(check_ins::checked_out_at.is_null())
        .count()
        .get_result::<i64>(conn)?;

    Ok(count)
}

/// Visibility rule for the roster: a candidate in friends mode is visible to
/// everyone; otherwise the candidate's check-in mode is compared against the
/// viewer's sexual orientation. That second branch compares a seeking mode
/// to an orientation, which never holds for the current enum values; it is
/// kept as-is for client compatibility pending product clarification.
pub(crate) fn roster_visible(candidate_mode: &str, viewer_orientation: &str) -> bool {
    candidate_mode == CheckInMode::Friends.as_str() || candidate_mode == viewer_orientation
}

fn ensure_venue_exists(conn: &mut PgConnection, venue_id: Uuid) -> AppResult<()> {
    let exists = venues::table
        .find(venue_id)
        .select(venues::id)
        .first::<Uuid>(conn)
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::VenueNotFound, "venue not found"))
    }
}

pub(crate) fn ensure_user_exists(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    let exists = users::table
        .find(user_id)
        .select(users::id)
        .first::<Uuid>(conn)
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::UserNotFound, "user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friends_mode_is_visible_to_everyone() {
        assert!(roster_visible("friends", "straight"));
        assert!(roster_visible("friends", "gay"));
        assert!(roster_visible("friends", "other"));
    }

    #[test]
    fn dating_mode_requires_literal_equality_with_orientation() {
        // No orientation value equals "dating", so dating check-ins are
        // hidden from every viewer under the current rule.
        for orientation in ["straight", "gay", "lesbian", "bisexual", "pansexual"] {
            assert!(!roster_visible("dating", orientation));
        }
        // The literal comparison, exercised directly.
        assert!(roster_visible("dating", "dating"));
    }
}
