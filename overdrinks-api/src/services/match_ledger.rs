use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use overdrinks_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Match, MatchStatus, NewMatch, Profile, User, Venue};
use crate::schema::{matches, profiles, users, venues};

use super::{acquire_xact_lock, pair_lock_key};

/// Pending requests older than this are treated as dead and flipped to
/// expired the next time the pair is looked at. There is no background
/// sweep; expiry happens lazily at reconciliation time.
pub const PENDING_REQUEST_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize)]
pub struct MatchResult {
    #[serde(rename = "match")]
    pub record: Match,
    #[serde(rename = "isMatch")]
    pub is_match: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchParticipant {
    #[serde(flatten)]
    pub user: User,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    #[serde(flatten)]
    pub record: Match,
    pub requester: MatchParticipant,
    pub target: MatchParticipant,
    pub venue: Venue,
}

/// What `request_match` should do, given what already exists for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconciliation {
    /// A forward row still binds the pair; reject the request.
    Duplicate,
    /// A live reverse pending row exists; flip it to matched.
    CompletePair,
    /// The reverse pending row outlived its TTL; expire it and open a new
    /// pending request in the forward direction.
    ExpireReverseAndOpen,
    /// Nothing binding on either side; open a pending request.
    OpenPending,
}

/// Whether an existing same-direction row still binds the pair. Matched and
/// rejected rows are permanent outcomes; an expired row is spent, and a
/// pending row stops binding once it outlives the TTL.
pub(crate) fn forward_binds(status: &str, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    if status == MatchStatus::Expired.as_str() {
        return false;
    }
    if status == MatchStatus::Pending.as_str() {
        return now - created_at <= Duration::hours(PENDING_REQUEST_TTL_HOURS);
    }
    true
}

/// The reconciliation rule, separated from storage. The second arrival for a
/// pair always completes it; a repeat of a still-outstanding same-direction
/// request is a duplicate. A spent forward row (expired, or pending past its
/// TTL) does not block the pair: the request proceeds as if that row were
/// absent, so an expired request can be retried and the counterpart's live
/// pending can still be completed.
pub(crate) fn reconcile(
    forward: Option<(&str, DateTime<Utc>)>,
    reverse: Option<(&str, DateTime<Utc>)>,
    now: DateTime<Utc>,
) -> Reconciliation {
    if let Some((status, created_at)) = forward {
        if forward_binds(status, created_at, now) {
            return Reconciliation::Duplicate;
        }
    }

    match reverse {
        Some((status, created_at)) if status == MatchStatus::Pending.as_str() => {
            if now - created_at > Duration::hours(PENDING_REQUEST_TTL_HOURS) {
                Reconciliation::ExpireReverseAndOpen
            } else {
                Reconciliation::CompletePair
            }
        }
        _ => Reconciliation::OpenPending,
    }
}

/// Records interest from `requester` toward `target` at `venue`. Returns the
/// pending forward row, or the reverse row flipped to matched when the other
/// side asked first. The lookup-and-branch runs in one transaction under a
/// pair-scoped advisory lock, so two racing requests for the same pair
/// resolve to exactly one matched row.
pub fn request_match(
    conn: &mut PgConnection,
    requester_id: Uuid,
    target_id: Uuid,
    venue_id: Uuid,
) -> AppResult<MatchResult> {
    if requester_id == target_id {
        return Err(AppError::new(
            ErrorCode::CannotMatchSelf,
            "cannot send a match request to yourself",
        ));
    }

    super::presence::ensure_user_exists(conn, target_id)?;
    let venue_exists = venues::table
        .find(venue_id)
        .select(venues::id)
        .first::<Uuid>(conn)
        .optional()?
        .is_some();
    if !venue_exists {
        return Err(AppError::new(ErrorCode::VenueNotFound, "venue not found"));
    }

    let result = conn.transaction::<MatchResult, AppError, _>(|conn| {
        acquire_xact_lock(conn, pair_lock_key(requester_id, target_id, venue_id))?;

        let forward = matches::table
            .filter(matches::requester_id.eq(requester_id))
            .filter(matches::target_id.eq(target_id))
            .filter(matches::venue_id.eq(venue_id))
            .first::<Match>(conn)
            .optional()?;

        let reverse = matches::table
            .filter(matches::requester_id.eq(target_id))
            .filter(matches::target_id.eq(requester_id))
            .filter(matches::venue_id.eq(venue_id))
            .first::<Match>(conn)
            .optional()?;

        let now = Utc::now();
        let decision = reconcile(
            forward.as_ref().map(|m| (m.status.as_str(), m.created_at)),
            reverse.as_ref().map(|m| (m.status.as_str(), m.created_at)),
            now,
        );

        // Past the Duplicate branch, any forward row left is spent.
        match (decision, reverse) {
            (Reconciliation::Duplicate, _) => Err(AppError::new(
                ErrorCode::DuplicateMatchRequest,
                "a match request for this user at this venue already exists",
            )),
            (Reconciliation::CompletePair, Some(reverse)) => {
                retire_stale_forward(conn, forward.as_ref())?;

                let flipped = diesel::update(matches::table.find(reverse.id))
                    .set((
                        matches::status.eq(MatchStatus::Matched.as_str()),
                        matches::matched_at.eq(now),
                    ))
                    .get_result::<Match>(conn)?;

                tracing::info!(match_id = %flipped.id, venue_id = %venue_id, "mutual match");
                Ok(MatchResult {
                    record: flipped,
                    is_match: true,
                })
            }
            (Reconciliation::ExpireReverseAndOpen, Some(reverse)) => {
                diesel::update(matches::table.find(reverse.id))
                    .set(matches::status.eq(MatchStatus::Expired.as_str()))
                    .execute(conn)?;

                open_pending(conn, forward, requester_id, target_id, venue_id, now)
            }
            _ => open_pending(conn, forward, requester_id, target_id, venue_id, now),
        }
    })?;

    Ok(result)
}

/// A stale pending forward row is flipped to expired once noticed, so the
/// ledger never shows a pending request that can no longer complete.
fn retire_stale_forward(
    conn: &mut PgConnection,
    forward: Option<&Match>,
) -> Result<(), AppError> {
    if let Some(row) = forward {
        if row.status == MatchStatus::Pending.as_str() {
            diesel::update(matches::table.find(row.id))
                .set(matches::status.eq(MatchStatus::Expired.as_str()))
                .execute(conn)?;
        }
    }
    Ok(())
}

/// Opens a pending request. When a spent forward row exists it is reset to
/// pending in place, keeping one row per direction per pair and venue.
fn open_pending(
    conn: &mut PgConnection,
    spent_forward: Option<Match>,
    requester_id: Uuid,
    target_id: Uuid,
    venue_id: Uuid,
    now: DateTime<Utc>,
) -> Result<MatchResult, AppError> {
    let row = match spent_forward {
        Some(spent) => diesel::update(matches::table.find(spent.id))
            .set((
                matches::status.eq(MatchStatus::Pending.as_str()),
                matches::created_at.eq(now),
                matches::matched_at.eq(None::<DateTime<Utc>>),
            ))
            .get_result::<Match>(conn)?,
        None => diesel::insert_into(matches::table)
            .values(&NewMatch {
                requester_id,
                target_id,
                venue_id,
                status: MatchStatus::Pending.as_str().to_string(),
            })
            .get_result::<Match>(conn)?,
    };

    Ok(MatchResult {
        record: row,
        is_match: false,
    })
}

/// All matched rows involving the user, newest match first, with both
/// participants and the venue attached.
pub fn list_matches(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<MatchDetails>> {
    let rows = matches::table
        .filter(matches::status.eq(MatchStatus::Matched.as_str()))
        .filter(
            matches::requester_id
                .eq(user_id)
                .or(matches::target_id.eq(user_id)),
        )
        .order(matches::matched_at.desc())
        .load::<Match>(conn)?;

    if rows.is_empty() {
        return Ok(vec![]);
    }

    let mut user_ids: Vec<Uuid> = rows
        .iter()
        .flat_map(|m| [m.requester_id, m.target_id])
        .collect();
    user_ids.sort();
    user_ids.dedup();

    let mut venue_ids: Vec<Uuid> = rows.iter().map(|m| m.venue_id).collect();
    venue_ids.sort();
    venue_ids.dedup();

    let users_by_id: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&user_ids))
        .load::<User>(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let profiles_by_user: HashMap<Uuid, Profile> = profiles::table
        .filter(profiles::user_id.eq_any(&user_ids))
        .load::<Profile>(conn)?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();

    let venues_by_id: HashMap<Uuid, Venue> = venues::table
        .filter(venues::id.eq_any(&venue_ids))
        .load::<Venue>(conn)?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let mut details = Vec::with_capacity(rows.len());
    for record in rows {
        let (Some(requester), Some(target), Some(venue)) = (
            users_by_id.get(&record.requester_id),
            users_by_id.get(&record.target_id),
            venues_by_id.get(&record.venue_id),
        ) else {
            tracing::warn!(match_id = %record.id, "match references missing user or venue");
            continue;
        };

        details.push(MatchDetails {
            requester: MatchParticipant {
                user: requester.clone(),
                profile: profiles_by_user.get(&record.requester_id).cloned(),
            },
            target: MatchParticipant {
                user: target.clone(),
                profile: profiles_by_user.get(&record.target_id).cloned(),
            },
            venue: venue.clone(),
            record,
        });
    }

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> DateTime<Utc> {
        Utc::now() - Duration::minutes(5)
    }

    fn stale() -> DateTime<Utc> {
        Utc::now() - Duration::hours(PENDING_REQUEST_TTL_HOURS + 1)
    }

    #[test]
    fn first_request_opens_pending() {
        assert_eq!(reconcile(None, None, Utc::now()), Reconciliation::OpenPending);
    }

    #[test]
    fn second_arrival_completes_the_pair() {
        assert_eq!(
            reconcile(None, Some(("pending", fresh())), Utc::now()),
            Reconciliation::CompletePair
        );
    }

    #[test]
    fn outstanding_forward_request_is_rejected_regardless_of_reverse() {
        let forward = Some(("pending", fresh()));
        assert_eq!(reconcile(forward, None, Utc::now()), Reconciliation::Duplicate);
        assert_eq!(
            reconcile(forward, Some(("pending", fresh())), Utc::now()),
            Reconciliation::Duplicate
        );
        assert_eq!(
            reconcile(forward, Some(("matched", fresh())), Utc::now()),
            Reconciliation::Duplicate
        );
    }

    #[test]
    fn settled_forward_outcomes_still_bind_the_pair() {
        for status in ["matched", "rejected"] {
            assert_eq!(
                reconcile(Some((status, stale())), None, Utc::now()),
                Reconciliation::Duplicate
            );
        }
    }

    /// An expired request must not strand the pair: when the other side has
    /// since opened a live pending request, reciprocating completes it.
    #[test]
    fn expired_forward_row_does_not_block_reciprocation() {
        assert_eq!(
            reconcile(Some(("expired", stale())), Some(("pending", fresh())), Utc::now()),
            Reconciliation::CompletePair
        );
    }

    #[test]
    fn expired_forward_row_allows_a_fresh_request() {
        assert_eq!(
            reconcile(Some(("expired", stale())), None, Utc::now()),
            Reconciliation::OpenPending
        );
    }

    #[test]
    fn forward_pending_past_ttl_no_longer_binds() {
        assert_eq!(
            reconcile(Some(("pending", stale())), Some(("pending", fresh())), Utc::now()),
            Reconciliation::CompletePair
        );
        assert_eq!(
            reconcile(Some(("pending", stale())), None, Utc::now()),
            Reconciliation::OpenPending
        );
    }

    #[test]
    fn stale_reverse_pending_is_expired_and_replaced() {
        assert_eq!(
            reconcile(None, Some(("pending", stale())), Utc::now()),
            Reconciliation::ExpireReverseAndOpen
        );
    }

    #[test]
    fn settled_reverse_rows_do_not_complete_a_pair() {
        for status in ["matched", "rejected", "expired"] {
            assert_eq!(
                reconcile(None, Some((status, fresh())), Utc::now()),
                Reconciliation::OpenPending
            );
        }
    }

    /// Running the two sides of a pair in either submission order yields the
    /// same decisions: the first opens pending, the second completes.
    #[test]
    fn reconciliation_is_order_independent() {
        let now = Utc::now();

        // order 1: A then B
        let a_first = reconcile(None, None, now);
        let b_second = reconcile(None, Some(("pending", now)), now);

        // order 2: B then A
        let b_first = reconcile(None, None, now);
        let a_second = reconcile(None, Some(("pending", now)), now);

        assert_eq!(a_first, Reconciliation::OpenPending);
        assert_eq!(b_first, Reconciliation::OpenPending);
        assert_eq!(b_second, Reconciliation::CompletePair);
        assert_eq!(a_second, Reconciliation::CompletePair);
    }

    #[test]
    fn reverse_at_exact_ttl_boundary_still_completes() {
        let now = Utc::now();
        let created = now - Duration::hours(PENDING_REQUEST_TTL_HOURS);
        assert_eq!(
            reconcile(None, Some(("pending", created)), now),
            Reconciliation::CompletePair
        );
        assert!(forward_binds("pending", created, now));
    }
}
