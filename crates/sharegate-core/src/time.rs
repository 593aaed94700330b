//! Time helpers. All timestamps are Unix milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in Unix milliseconds.
///
/// A clock set before the epoch reads as 0, which only makes expiry checks
/// stricter.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Whether a record with the given expiry is in force at `now`.
///
/// `expires_at == None || expires_at > now`. No grace period.
pub fn is_live(expires_at: Option<i64>, now: i64) -> bool {
    match expires_at {
        None => true,
        Some(at) => at > now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_expiry_is_live() {
        assert!(is_live(None, i64::MAX));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        assert!(is_live(Some(1001), 1000));
        assert!(!is_live(Some(1000), 1000));
        assert!(!is_live(Some(999), 1000));
    }
}
