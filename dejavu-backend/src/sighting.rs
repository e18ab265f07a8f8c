use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value stored under a fingerprint.
///
/// Only the presence of a sighting drives the duplicate decision. The
/// timestamps and counter are bookkeeping for logs and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    /// When the fingerprint was first recorded in the current window.
    pub first_seen: DateTime<Utc>,
    /// When the fingerprint was last recorded.
    pub last_seen: DateTime<Utc>,
    /// How many times the fingerprint was recorded in the current window.
    pub count: u64,
}

impl Sighting {
    /// First sighting at `now`.
    pub fn first(now: DateTime<Utc>) -> Self {
        Self {
            first_seen: now,
            last_seen: now,
            count: 1,
        }
    }

    /// Sighting that follows `previous`, or a first one when there is none.
    pub fn next(previous: Option<&Sighting>, now: DateTime<Utc>) -> Self {
        match previous {
            Some(previous) => Self {
                first_seen: previous.first_seen,
                last_seen: now,
                count: previous.count.saturating_add(1),
            },
            None => Self::first(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_next_keeps_first_seen() {
        let start = Utc::now();
        let later = start + Duration::seconds(5);
        let first = Sighting::first(start);
        let second = Sighting::next(Some(&first), later);

        assert_eq!(second.first_seen, start);
        assert_eq!(second.last_seen, later);
        assert_eq!(second.count, 2);
        assert_eq!(Sighting::next(None, later), Sighting::first(later));
    }
}
