use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for competition events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Identifier wrapper for a single submission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

/// Identifier for anyone allowed to rate entries (judges and audience raters alike).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaterId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse grouping used to spread podium places across age brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassLevel {
    PrePrimary,
    Primary,
    Middle,
    Secondary,
}

impl ClassLevel {
    pub const fn ordered() -> [ClassLevel; 4] {
        [
            ClassLevel::PrePrimary,
            ClassLevel::Primary,
            ClassLevel::Middle,
            ClassLevel::Secondary,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ClassLevel::PrePrimary => "Pre-Primary",
            ClassLevel::Primary => "Primary",
            ClassLevel::Middle => "Middle",
            ClassLevel::Secondary => "Secondary",
        }
    }

    /// Parse free-text class levels from registration forms.
    ///
    /// Unknown or blank values yield `None`; such entries stay rankable but are
    /// never grouped.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "preprimary" | "kg" | "lkg" | "ukg" | "nursery" => Some(Self::PrePrimary),
            "primary" | "class13" | "class15" | "grades13" => Some(Self::Primary),
            "middle" | "class46" | "class68" | "grades46" => Some(Self::Middle),
            "secondary" | "senior" | "class710" | "class912" | "grades710" => {
                Some(Self::Secondary)
            }
            _ => None,
        }
    }
}

/// Registered submission with its cumulative community counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub event_id: EventId,
    pub title: String,
    pub class_level: Option<ClassLevel>,
    pub vote_count: u64,
    pub view_count: u64,
}

/// Raw rating of one entry by one rater.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub rater_id: RaterId,
    pub entry_id: EntryId,
    pub score: f64,
}

impl ScoreRecord {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 10.0;

    pub fn in_range(&self) -> bool {
        self.score.is_finite() && (Self::MIN_SCORE..=Self::MAX_SCORE).contains(&self.score)
    }
}

/// Community vote as appended by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: VoterIdentity,
    pub entry_id: EntryId,
    pub cast_at: DateTime<Utc>,
}

/// First-time view marker for a voter on an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewRecord {
    pub voter: VoterIdentity,
    pub entry_id: EntryId,
}

/// Phone-number identity in canonical 10-digit form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoterIdentity(String);

impl VoterIdentity {
    pub const DIGITS: usize = 10;

    pub fn parse(raw: &str) -> Result<Self, VoterIdentityError> {
        let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
        let stray = raw
            .chars()
            .any(|ch| !(ch.is_ascii_digit() || matches!(ch, ' ' | '-' | '+' | '(' | ')' | '.')));
        if stray || digits.is_empty() {
            return Err(VoterIdentityError::Malformed(raw.to_string()));
        }

        let canonical = match digits.len() {
            10 => digits,
            11 if digits.starts_with('0') => digits[1..].to_string(),
            12 if digits.starts_with("91") => digits[2..].to_string(),
            found => return Err(VoterIdentityError::WrongLength { found }),
        };

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VoterIdentity {
    type Error = VoterIdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VoterIdentity> for String {
    fn from(value: VoterIdentity) -> Self {
        value.0
    }
}

/// Rejection raised when a phone number cannot be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoterIdentityError {
    #[error("voter identity '{0}' is not a phone number")]
    Malformed(String),
    #[error("voter identity must have 10 digits, found {found}")]
    WrongLength { found: usize },
}

/// Which signal a leaderboard ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    #[default]
    Judge,
    Community,
}

impl RankingMetric {
    pub const fn label(self) -> &'static str {
        match self {
            RankingMetric::Judge => "judge",
            RankingMetric::Community => "community",
        }
    }
}
