use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Answer to "may this voter vote for this entry right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEligibility {
    pub can_vote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<u32>,
}

impl VoteEligibility {
    pub const fn open() -> Self {
        Self {
            can_vote: true,
            hours_remaining: None,
        }
    }

    pub const fn wait(hours_remaining: u32) -> Self {
        Self {
            can_vote: false,
            hours_remaining: Some(hours_remaining),
        }
    }

    pub fn summary(&self) -> String {
        match self.hours_remaining {
            None => "vote accepted".to_string(),
            Some(1) => "you can vote for this entry again in 1 hour".to_string(),
            Some(hours) => format!("you can vote for this entry again in {hours} hours"),
        }
    }
}

/// Fixed per-voter, per-entry vote window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownGuard {
    window: Duration,
}

impl Default for CooldownGuard {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl CooldownGuard {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_hours(hours: u32) -> Self {
        Self::new(Duration::hours(i64::from(hours)))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide from the most recent vote for the (entry, voter) pair.
    pub fn evaluate(&self, last_vote: Option<DateTime<Utc>>, now: DateTime<Utc>) -> VoteEligibility {
        let Some(last_vote) = last_vote else {
            return VoteEligibility::open();
        };

        // A vote stamped ahead of `now` counts as just cast.
        let elapsed = (now - last_vote).max(Duration::zero());
        if elapsed >= self.window {
            return VoteEligibility::open();
        }

        // Any leftover fraction of an hour, down to the nanosecond, counts as a full hour.
        let remaining = self.window - elapsed;
        let whole = remaining.num_hours();
        let hours = if remaining > Duration::hours(whole) {
            whole + 1
        } else {
            whole
        };
        VoteEligibility::wait(u32::try_from(hours.max(1)).unwrap_or(u32::MAX))
    }
}
