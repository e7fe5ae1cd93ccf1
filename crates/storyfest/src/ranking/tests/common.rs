use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::ranking::aggregate::JudgeRoster;
use crate::ranking::domain::{
    ClassLevel, Entry, EntryId, EventId, RaterId, ScoreRecord, ViewRecord, VoteRecord,
    VoterIdentity,
};
use crate::ranking::policy::RankingPolicy;
use crate::ranking::repository::{
    ContestRepository, NotifierError, RepositoryError, ViewInsert, VoteNotice, VoteNotifier,
};
use crate::ranking::service::RankingService;

pub(super) const EVENT: &str = "spring-finals";

pub(super) fn event_id() -> EventId {
    EventId(EVENT.to_string())
}

pub(super) fn entry_id(id: &str) -> EntryId {
    EntryId(id.to_string())
}

pub(super) fn voter(raw: &str) -> VoterIdentity {
    VoterIdentity::parse(raw).expect("valid voter identity")
}

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 1, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn entry(id: &str, level: Option<ClassLevel>) -> Entry {
    Entry {
        id: entry_id(id),
        event_id: event_id(),
        title: format!("Story {id}"),
        class_level: level,
        vote_count: 0,
        view_count: 0,
    }
}

pub(super) fn judges() -> Vec<RaterId> {
    ["judge-1", "judge-2", "judge-3"]
        .into_iter()
        .map(|id| RaterId(id.to_string()))
        .collect()
}

/// Entry A scores [8, 9, 9] in Primary, entry B scores [9] in Middle.
pub(super) fn seeded_repository() -> MemoryRepository {
    let repository = MemoryRepository::default();
    repository.add_entry(entry("a", Some(ClassLevel::Primary)));
    repository.add_entry(entry("b", Some(ClassLevel::Middle)));
    repository.add_score("judge-1", "a", 8.0);
    repository.add_score("judge-2", "a", 9.0);
    repository.add_score("judge-3", "a", 9.0);
    repository.add_score("judge-1", "b", 9.0);
    repository
}

pub(super) fn build_service(
    repository: MemoryRepository,
    policy: RankingPolicy,
) -> (
    RankingService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(repository);
    let notifier = Arc::new(MemoryNotifier::default());
    let service = RankingService::new(repository.clone(), notifier.clone(), policy);
    (service, repository, notifier)
}

#[derive(Default)]
struct MemoryState {
    entries: Vec<Entry>,
    scores: Vec<ScoreRecord>,
    votes: Vec<VoteRecord>,
    views: HashSet<ViewRecord>,
}

#[derive(Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
    roster: Arc<Mutex<JudgeRoster>>,
    offline: Arc<AtomicBool>,
    stale_view_reads: Arc<AtomicBool>,
    failing_vote_counter: Arc<AtomicBool>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            roster: Arc::new(Mutex::new(JudgeRoster::new(judges()))),
            offline: Arc::default(),
            stale_view_reads: Arc::default(),
            failing_vote_counter: Arc::default(),
        }
    }
}

impl MemoryRepository {
    pub(super) fn add_entry(&self, entry: Entry) {
        self.lock().entries.push(entry);
    }

    pub(super) fn add_score(&self, rater: &str, entry: &str, score: f64) {
        self.lock().scores.push(ScoreRecord {
            rater_id: RaterId(rater.to_string()),
            entry_id: entry_id(entry),
            score,
        });
    }

    pub(super) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make `view_exists` always answer `false`, as a lagging replica would.
    pub(super) fn set_stale_view_reads(&self, stale: bool) {
        self.stale_view_reads.store(stale, Ordering::SeqCst);
    }

    /// Make `increment_vote_count` fail after the vote record is appended.
    pub(super) fn set_failing_vote_counter(&self, failing: bool) {
        self.failing_vote_counter.store(failing, Ordering::SeqCst);
    }

    pub(super) fn counters(&self, id: &str) -> (u64, u64) {
        let state = self.lock();
        state
            .entries
            .iter()
            .find(|entry| entry.id.0 == id)
            .map(|entry| (entry.vote_count, entry.view_count))
            .expect("entry present")
    }

    pub(super) fn vote_records(&self) -> usize {
        self.lock().votes.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("repository mutex poisoned")
    }

    fn ensure_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("database offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ContestRepository for MemoryRepository {
    fn entries_for_event(&self, event_id: &EventId) -> Result<Vec<Entry>, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .lock()
            .entries
            .iter()
            .filter(|entry| &entry.event_id == event_id)
            .cloned()
            .collect())
    }

    fn entry(&self, entry_id: &EntryId) -> Result<Option<Entry>, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .lock()
            .entries
            .iter()
            .find(|entry| &entry.id == entry_id)
            .cloned())
    }

    fn scores_for_event(&self, event_id: &EventId) -> Result<Vec<ScoreRecord>, RepositoryError> {
        self.ensure_online()?;
        let state = self.lock();
        let ids: HashSet<&EntryId> = state
            .entries
            .iter()
            .filter(|entry| &entry.event_id == event_id)
            .map(|entry| &entry.id)
            .collect();
        Ok(state
            .scores
            .iter()
            .filter(|score| ids.contains(&score.entry_id))
            .cloned()
            .collect())
    }

    fn judge_roster(&self, _event_id: &EventId) -> Result<JudgeRoster, RepositoryError> {
        self.ensure_online()?;
        Ok(self.roster.lock().expect("roster mutex poisoned").clone())
    }

    fn latest_vote(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<Option<VoteRecord>, RepositoryError> {
        self.ensure_online()?;
        Ok(self
            .lock()
            .votes
            .iter()
            .filter(|vote| &vote.entry_id == entry_id && &vote.voter == voter)
            .max_by_key(|vote| vote.cast_at)
            .cloned())
    }

    fn append_vote(&self, vote: VoteRecord) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        self.lock().votes.push(vote);
        Ok(())
    }

    fn increment_vote_count(&self, entry_id: &EntryId) -> Result<u64, RepositoryError> {
        self.ensure_online()?;
        if self.failing_vote_counter.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("counter update failed".to_string()));
        }
        let mut state = self.lock();
        let entry = state
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
        self.ensure_online()?;
        if self.stale_view_reads.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.lock().views.contains(&ViewRecord {
            voter: voter.clone(),
            entry_id: entry_id.clone(),
        }))
    }

    fn insert_view(&self, view: ViewRecord) -> Result<ViewInsert, RepositoryError> {
        self.ensure_online()?;
        if self.lock().views.insert(view) {
            Ok(ViewInsert::Created)
        } else {
            Ok(ViewInsert::AlreadyRecorded)
        }
    }

    fn increment_view_count(&self, entry_id: &EntryId) -> Result<u64, RepositoryError> {
        self.ensure_online()?;
        let mut state = self.lock();
        let entry = state
            .entries
            .iter_mut()
            .find(|entry| &entry.id == entry_id)
            .ok_or(RepositoryError::NotFound)?;
        entry.view_count += 1;
        Ok(entry.view_count)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<VoteNotice>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<VoteNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl VoteNotifier for MemoryNotifier {
    fn vote_accepted(&self, notice: VoteNotice) -> Result<(), NotifierError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::Transport("push gateway timeout".to_string()));
        }
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
