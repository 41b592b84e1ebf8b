//! Time-lock policy.
//!
//! Pure functions of `(lock, now)`. The registry samples the clock once per
//! operation and passes the same `now` to every check.

use strongbox_protocol::types::Timestamp;

/// Whether an entry locked until `unlock_time` may be withdrawn at `now`.
/// Unlocked at exactly `unlock_time`.
pub fn is_unlocked(unlock_time: Timestamp, now: Timestamp) -> bool {
    now >= unlock_time
}

/// Seconds until unlock; zero once unlocked.
pub fn remaining(unlock_time: Timestamp, now: Timestamp) -> u64 {
    unlock_time.saturating_sub(now)
}

/// Whether an authorization with `deadline` has expired at `now`.
/// Still valid at exactly `deadline`.
pub fn is_expired(deadline: Timestamp, now: Timestamp) -> bool {
    now > deadline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_boundary() {
        assert!(!is_unlocked(100, 99));
        assert!(is_unlocked(100, 100));
        assert!(is_unlocked(100, 101));
        assert!(is_unlocked(0, 0));
    }

    #[test]
    fn test_remaining() {
        assert_eq!(remaining(100, 40), 60);
        assert_eq!(remaining(100, 100), 0);
        assert_eq!(remaining(100, 500), 0);
    }

    #[test]
    fn test_deadline_boundary() {
        assert!(!is_expired(100, 99));
        assert!(!is_expired(100, 100));
        assert!(is_expired(100, 101));
    }
}
