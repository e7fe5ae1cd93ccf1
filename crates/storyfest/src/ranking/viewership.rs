use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{EntryId, ViewRecord, VoterIdentity};
use super::repository::{ContestRepository, RepositoryError, ViewInsert};

/// What `record_view` did for a (entry, voter) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ViewOutcome {
    Counted { view_count: u64 },
    AlreadyCounted,
}

/// Count at most one view per voter identity per entry.
pub struct ViewRecorder;

impl ViewRecorder {
    /// The counter only moves when the store reports it created the record, so
    /// two racing calls that both pass the existence check still count once.
    pub fn record<R>(
        repository: &R,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<ViewOutcome, RepositoryError>
    where
        R: ContestRepository + ?Sized,
    {
        if repository.view_exists(entry_id, voter)? {
            debug!(entry = %entry_id, "view already counted");
            return Ok(ViewOutcome::AlreadyCounted);
        }

        let view = ViewRecord {
            voter: voter.clone(),
            entry_id: entry_id.clone(),
        };

        match repository.insert_view(view)? {
            ViewInsert::Created => {
                let view_count = repository.increment_view_count(entry_id)?;
                Ok(ViewOutcome::Counted { view_count })
            }
            ViewInsert::AlreadyRecorded => Ok(ViewOutcome::AlreadyCounted),
        }
    }
}
