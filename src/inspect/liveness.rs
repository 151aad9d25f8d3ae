//! Liveness classification from network recency

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Requests within this window mean the tab is busy right now
pub const ACTIVE_WINDOW_MS: i64 = 10_000;
pub const RECENT_WINDOW_MS: i64 = 5 * 60 * 1000;
pub const IDLE_WINDOW_MS: i64 = 60 * 60 * 1000;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Active,
    Recent,
    Idle,
    Inactive,
}

impl Liveness {
    /// Bucket order used when grouping by status
    pub const ORDER: [Liveness; 4] = [
        Liveness::Active,
        Liveness::Recent,
        Liveness::Idle,
        Liveness::Inactive,
    ];

    pub fn classify(last_activity_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last_activity_at else {
            return Liveness::Inactive;
        };
        let elapsed = (now - last).num_milliseconds().max(0);
        if elapsed < ACTIVE_WINDOW_MS {
            Liveness::Active
        } else if elapsed < RECENT_WINDOW_MS {
            Liveness::Recent
        } else if elapsed < IDLE_WINDOW_MS {
            Liveness::Idle
        } else {
            Liveness::Inactive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Active => "active",
            Liveness::Recent => "recent",
            Liveness::Idle => "idle",
            Liveness::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for Liveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_thresholds() {
        let now = now();
        let ago = |secs| Some(now - Duration::seconds(secs));

        assert_eq!(Liveness::classify(ago(5), now), Liveness::Active);
        assert_eq!(Liveness::classify(ago(61), now), Liveness::Recent);
        assert_eq!(Liveness::classify(ago(600), now), Liveness::Idle);
        assert_eq!(Liveness::classify(ago(3601), now), Liveness::Inactive);
        assert_eq!(Liveness::classify(None, now), Liveness::Inactive);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let now = now();
        assert_eq!(
            Liveness::classify(Some(now - Duration::seconds(10)), now),
            Liveness::Recent
        );
        assert_eq!(
            Liveness::classify(Some(now - Duration::minutes(5)), now),
            Liveness::Idle
        );
        assert_eq!(
            Liveness::classify(Some(now - Duration::hours(1)), now),
            Liveness::Inactive
        );
    }

    #[test]
    fn test_future_timestamp_counts_as_active() {
        let now = now();
        assert_eq!(
            Liveness::classify(Some(now + Duration::seconds(30)), now),
            Liveness::Active
        );
    }
}
