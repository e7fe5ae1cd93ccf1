use serde::{Deserialize, Serialize};

use super::aggregate::JudgeRoster;
use super::domain::{
    Entry, EntryId, EventId, ScoreRecord, ViewRecord, VoteRecord, VoterIdentity,
};

/// Result of a create-if-absent view insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewInsert {
    Created,
    AlreadyRecorded,
}

/// Storage abstraction over entries, score records, votes, and views.
///
/// Counter increments must be single atomic operations at the storage layer;
/// callers never read a counter and write it back.
///
/// Votes are appended before the counter is incremented. If the increment
/// fails the vote record stays, so the voter is cooling down while the counter
/// lags by one until the store is reconciled.
///
/// Methods are synchronous and may block. Async callers run them through
/// `tokio::task::spawn_blocking` when they are off the request path.
pub trait ContestRepository: Send + Sync {
    fn entries_for_event(&self, event_id: &EventId) -> Result<Vec<Entry>, RepositoryError>;
    fn entry(&self, entry_id: &EntryId) -> Result<Option<Entry>, RepositoryError>;
    fn scores_for_event(&self, event_id: &EventId) -> Result<Vec<ScoreRecord>, RepositoryError>;
    fn judge_roster(&self, event_id: &EventId) -> Result<JudgeRoster, RepositoryError>;

    fn latest_vote(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<Option<VoteRecord>, RepositoryError>;
    fn append_vote(&self, vote: VoteRecord) -> Result<(), RepositoryError>;
    /// Atomically add one vote, returning the new total.
    fn increment_vote_count(&self, entry_id: &EntryId) -> Result<u64, RepositoryError>;

    fn view_exists(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<bool, RepositoryError>;
    fn insert_view(&self, view: ViewRecord) -> Result<ViewInsert, RepositoryError>;
    /// Atomically add one view, returning the new total.
    fn increment_view_count(&self, entry_id: &EntryId) -> Result<u64, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired after an accepted vote (push notification, webhook, ...).
pub trait VoteNotifier: Send + Sync {
    fn vote_accepted(&self, notice: VoteNotice) -> Result<(), NotifierError>;
}

/// Payload describing an accepted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteNotice {
    pub event_id: EventId,
    pub entry_id: EntryId,
    pub vote_count: u64,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
