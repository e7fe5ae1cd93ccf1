use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use storyfest::ranking::{
    ChangeNotification, ChangeSource, ContestRepository, ContestSnapshot, Entry, EntryId, EventId,
    JudgeRoster, NotifierError, RepositoryError, ScoreRecord, ViewInsert, ViewRecord, VoteNotice,
    VoteNotifier, VoteRecord, VoterIdentity,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct ContestTables {
    entries: Vec<Entry>,
    scores: Vec<ScoreRecord>,
    votes: Vec<VoteRecord>,
    views: HashSet<ViewRecord>,
}

/// Process-local contest store. Writes publish onto the change feed when one is attached.
#[derive(Default, Clone)]
pub(crate) struct InMemoryContestRepository {
    tables: Arc<Mutex<ContestTables>>,
    roster: Arc<Mutex<JudgeRoster>>,
    changes: Option<mpsc::Sender<ChangeNotification>>,
}

impl InMemoryContestRepository {
    pub(crate) fn from_snapshot(snapshot: ContestSnapshot) -> Self {
        let ContestSnapshot {
            entries,
            scores,
            roster,
        } = snapshot;

        Self {
            tables: Arc::new(Mutex::new(ContestTables {
                entries,
                scores,
                ..ContestTables::default()
            })),
            roster: Arc::new(Mutex::new(roster)),
            changes: None,
        }
    }

    pub(crate) fn with_change_feed(mut self, sender: mpsc::Sender<ChangeNotification>) -> Self {
        self.changes = Some(sender);
        self
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, ContestTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("contest tables poisoned".to_string()))
    }

    fn publish(&self, event_id: EventId, source: ChangeSource) {
        let Some(sender) = &self.changes else {
            return;
        };
        if let Err(err) = sender.try_send(ChangeNotification { event_id, source }) {
            // A full queue already holds a pending recompute for someone.
            warn!(error = %err, "change notification dropped");
        }
    }

    fn event_of(tables: &ContestTables, entry_id: &EntryId) -> Result<EventId, RepositoryError> {
        tables
            .entries
            .iter()
            .find(|entry| &entry.id == entry_id)
            .map(|entry| entry.event_id.clone())
            .ok_or(RepositoryError::NotFound)
    }
}

impl ContestRepository for InMemoryContestRepository {
    fn entries_for_event(&self, event_id: &EventId) -> Result<Vec<Entry>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .entries
            .iter()
            .filter(|entry| &entry.event_id == event_id)
            .cloned()
            .collect())
    }

    fn entry(&self, entry_id: &EntryId) -> Result<Option<Entry>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .entries
            .iter()
            .find(|entry| &entry.id == entry_id)
            .cloned())
    }

    fn scores_for_event(&self, event_id: &EventId) -> Result<Vec<ScoreRecord>, RepositoryError> {
        let tables = self.tables()?;
        let ids: HashSet<&EntryId> = tables
            .entries
            .iter()
            .filter(|entry| &entry.event_id == event_id)
            .map(|entry| &entry.id)
            .collect();
        Ok(tables
            .scores
            .iter()
            .filter(|record| ids.contains(&record.entry_id))
            .cloned()
            .collect())
    }

    fn judge_roster(&self, _event_id: &EventId) -> Result<JudgeRoster, RepositoryError> {
        self.roster
            .lock()
            .map(|roster| roster.clone())
            .map_err(|_| RepositoryError::Unavailable("judge roster poisoned".to_string()))
    }

    fn latest_vote(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<Option<VoteRecord>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .votes
            .iter()
            .filter(|vote| &vote.entry_id == entry_id && &vote.voter == voter)
            .max_by_key(|vote| vote.cast_at)
            .cloned())
    }

    fn append_vote(&self, vote: VoteRecord) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let event_id = Self::event_of(&tables, &vote.entry_id)?;
        tables.votes.push(vote);
        drop(tables);
        self.publish(event_id, ChangeSource::Votes);
        Ok(())
    }

    fn increment_vote_count(&self, entry_id: &EntryId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables()?;
        let entry = tables
            .entries
            .iter_mut()
            .find(|entry| &entry.id == entry_id)
            .ok_or(RepositoryError::NotFound)?;
        entry.vote_count += 1;
        Ok(entry.vote_count)
    }

    fn view_exists(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<bool, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.views.contains(&ViewRecord {
            voter: voter.clone(),
            entry_id: entry_id.clone(),
        }))
    }

    fn insert_view(&self, view: ViewRecord) -> Result<ViewInsert, RepositoryError> {
        let mut tables = self.tables()?;
        let event_id = Self::event_of(&tables, &view.entry_id)?;
        if !tables.views.insert(view) {
            return Ok(ViewInsert::AlreadyRecorded);
        }
        drop(tables);
        self.publish(event_id, ChangeSource::Views);
        Ok(ViewInsert::Created)
    }

    fn increment_view_count(&self, entry_id: &EntryId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables()?;
        let entry = tables
            .entries
            .iter_mut()
            .find(|entry| &entry.id == entry_id)
            .ok_or(RepositoryError::NotFound)?;
        entry.view_count += 1;
        Ok(entry.view_count)
    }
}

/// Vote notifier that records accepted votes in the service log.
#[derive(Default, Clone)]
pub(crate) struct LoggingVoteNotifier {
    sent: Arc<Mutex<Vec<VoteNotice>>>,
}

impl VoteNotifier for LoggingVoteNotifier {
    fn vote_accepted(&self, notice: VoteNotice) -> Result<(), NotifierError> {
        info!(
            event = %notice.event_id,
            entry = %notice.entry_id,
            vote_count = notice.vote_count,
            "vote accepted"
        );
        self.sent
            .lock()
            .map_err(|_| NotifierError::Transport("notice log poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

impl LoggingVoteNotifier {
    pub(crate) fn sent(&self) -> Vec<VoteNotice> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storyfest::ranking::ClassLevel;

    fn snapshot() -> ContestSnapshot {
        ContestSnapshot {
            entries: vec![Entry {
                id: EntryId("e1".to_string()),
                event_id: EventId("finals".to_string()),
                title: "The Lost Kite".to_string(),
                class_level: Some(ClassLevel::Primary),
                vote_count: 0,
                view_count: 0,
            }],
            ..ContestSnapshot::default()
        }
    }

    #[tokio::test]
    async fn writes_publish_change_notifications() {
        let (sender, mut receiver) = mpsc::channel(4);
        let repository = InMemoryContestRepository::from_snapshot(snapshot()).with_change_feed(sender);
        let voter = VoterIdentity::parse("9000000001").expect("valid voter");

        repository
            .append_vote(VoteRecord {
                voter: voter.clone(),
                entry_id: EntryId("e1".to_string()),
                cast_at: Utc::now(),
            })
            .expect("vote stored");
        let view = ViewRecord {
            voter,
            entry_id: EntryId("e1".to_string()),
        };
        assert_eq!(
            repository.insert_view(view.clone()).expect("view stored"),
            ViewInsert::Created
        );
        assert_eq!(
            repository.insert_view(view).expect("view stored"),
            ViewInsert::AlreadyRecorded
        );

        let first = receiver.recv().await.expect("vote notification");
        let second = receiver.recv().await.expect("view notification");
        assert_eq!(first.source, ChangeSource::Votes);
        assert_eq!(second.source, ChangeSource::Views);
        assert_eq!(second.event_id, EventId("finals".to_string()));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn votes_for_missing_entries_are_not_found() {
        let repository = InMemoryContestRepository::default();
        let result = repository.append_vote(VoteRecord {
            voter: VoterIdentity::parse("9000000001").expect("valid voter"),
            entry_id: EntryId("ghost".to_string()),
            cast_at: Utc::now(),
        });

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
