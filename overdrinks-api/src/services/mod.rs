use std::hash::{Hash, Hasher};

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use uuid::Uuid;

pub mod match_ledger;
pub mod presence;

/// Takes a transaction-scoped Postgres advisory lock. Read-then-write
/// sequences (close-then-open check-in, lookup-then-flip reconciliation)
/// run under one of these so concurrent requests against the same key are
/// serialized by the database.
pub(crate) fn acquire_xact_lock(conn: &mut PgConnection, key: i64) -> QueryResult<usize> {
    diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
        .bind::<BigInt, _>(key)
        .execute(conn)
}

pub(crate) fn user_lock_key(user_id: Uuid) -> i64 {
    hash_key(&("checkin", user_id))
}

/// Lock key for a match pair at a venue. The pair is ordered before hashing
/// so both directions of a request map to the same key.
pub(crate) fn pair_lock_key(a: Uuid, b: Uuid, venue_id: Uuid) -> i64 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    hash_key(&("match", lo, hi, venue_id))
}

fn hash_key<T: Hash>(value: &T) -> i64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_lock_key_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let venue = Uuid::new_v4();
        assert_eq!(pair_lock_key(a, b, venue), pair_lock_key(b, a, venue));
    }

    #[test]
    fn pair_lock_key_distinguishes_venues() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(
            pair_lock_key(a, b, Uuid::new_v4()),
            pair_lock_key(a, b, Uuid::new_v4())
        );
    }

    #[test]
    fn user_and_pair_keys_do_not_collide_trivially() {
        let user = Uuid::new_v4();
        assert_ne!(user_lock_key(user), pair_lock_key(user, user, user));
    }
}
