use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cooldown::{CooldownGuard, VoteEligibility};
use super::domain::{EntryId, EventId, RankingMetric, VoteRecord, VoterIdentity};
use super::eligibility::EligibilityPool;
use super::leaderboard::Leaderboard;
use super::policy::RankingPolicy;
use super::repository::{ContestRepository, RepositoryError, VoteNotice, VoteNotifier};
use super::selection::PodiumSlot;
use super::standings::{compute_standings, EventStandings};
use super::viewership::{ViewOutcome, ViewRecorder};

/// Outcome of a vote submission. Rejections are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum VoteOutcome {
    Accepted { vote_count: u64 },
    CoolingDown { hours_remaining: u32 },
    NotEligible,
}

/// Service composing the store, the ranking pipeline, and the vote guards.
pub struct RankingService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    policy: RankingPolicy,
    cooldown: CooldownGuard,
    last_good: RwLock<HashMap<EventId, Arc<EventStandings>>>,
}

impl<R, N> RankingService<R, N>
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, policy: RankingPolicy) -> Self {
        Self {
            repository,
            notifier,
            cooldown: policy.cooldown(),
            policy,
            last_good: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Recompute an event from the store and remember the result.
    pub fn refresh(&self, event_id: &EventId) -> Result<Arc<EventStandings>, RankingServiceError> {
        let entries = self.repository.entries_for_event(event_id)?;
        let scores = self.repository.scores_for_event(event_id)?;
        let roster = self.repository.judge_roster(event_id)?;

        let standings = Arc::new(compute_standings(
            event_id,
            &entries,
            &scores,
            &roster,
            &self.policy,
            Utc::now(),
        ));

        debug!(
            event = %event_id,
            entries = entries.len(),
            scores = scores.len(),
            podium = standings.judge.podium.len(),
            pool = standings.judge.pool.len(),
            "recomputed standings"
        );

        self.last_good
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event_id.clone(), standings.clone());

        Ok(standings)
    }

    /// Fresh standings, or the last good ones while the store is unavailable.
    pub fn standings(&self, event_id: &EventId) -> Result<Arc<EventStandings>, RankingServiceError> {
        match self.refresh(event_id) {
            Ok(standings) => Ok(standings),
            Err(RankingServiceError::Repository(RepositoryError::Unavailable(reason))) => {
                match self.cached(event_id) {
                    Some(cached) => {
                        warn!(
                            event = %event_id,
                            %reason,
                            computed_at = %cached.computed_at,
                            "store unavailable, serving last computed standings"
                        );
                        Ok(cached)
                    }
                    None => Err(RepositoryError::Unavailable(reason).into()),
                }
            }
            Err(other) => Err(other),
        }
    }

    pub fn cached(&self, event_id: &EventId) -> Option<Arc<EventStandings>> {
        self.last_good
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_id)
            .cloned()
    }

    pub fn podium(
        &self,
        event_id: &EventId,
        metric: RankingMetric,
    ) -> Result<Vec<PodiumSlot>, RankingServiceError> {
        let standings = self.standings(event_id)?;
        Ok(standings.metric(metric).podium.clone())
    }

    pub fn leaderboard(
        &self,
        event_id: &EventId,
        metric: RankingMetric,
    ) -> Result<Leaderboard, RankingServiceError> {
        let standings = self.standings(event_id)?;
        Ok(standings.metric(metric).leaderboard.clone())
    }

    pub fn eligible_pool(&self, event_id: &EventId) -> Result<EligibilityPool, RankingServiceError> {
        let standings = self.standings(event_id)?;
        Ok(standings.eligible_pool().clone())
    }

    pub fn can_vote(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
        now: DateTime<Utc>,
    ) -> Result<VoteEligibility, RankingServiceError> {
        if self.repository.entry(entry_id)?.is_none() {
            return Err(RankingServiceError::UnknownEntry(entry_id.clone()));
        }

        self.cooldown_for(entry_id, voter, now)
    }

    fn cooldown_for(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
        now: DateTime<Utc>,
    ) -> Result<VoteEligibility, RankingServiceError> {
        let last_vote = self.repository.latest_vote(entry_id, voter)?;
        Ok(self
            .cooldown
            .evaluate(last_vote.map(|vote| vote.cast_at), now))
    }

    /// Accept a community vote, re-checking the cooldown at submission time.
    pub fn cast_vote(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
        now: DateTime<Utc>,
    ) -> Result<VoteOutcome, RankingServiceError> {
        let entry = self
            .repository
            .entry(entry_id)?
            .ok_or_else(|| RankingServiceError::UnknownEntry(entry_id.clone()))?;

        let eligibility = self.cooldown_for(entry_id, voter, now)?;
        if let Some(hours_remaining) = eligibility.hours_remaining {
            info!(entry = %entry_id, hours_remaining, "vote rejected by cooldown");
            return Ok(VoteOutcome::CoolingDown { hours_remaining });
        }

        let standings = self.standings(&entry.event_id)?;
        if !standings.accepts_votes_for(entry_id) {
            info!(entry = %entry_id, event = %entry.event_id, "vote rejected, entry outside voting pool");
            return Ok(VoteOutcome::NotEligible);
        }

        self.repository.append_vote(VoteRecord {
            voter: voter.clone(),
            entry_id: entry_id.clone(),
            cast_at: now,
        })?;
        let vote_count = match self.repository.increment_vote_count(entry_id) {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    entry = %entry_id,
                    error = %err,
                    "vote recorded but counter increment failed"
                );
                return Err(err.into());
            }
        };

        let notice = VoteNotice {
            event_id: entry.event_id.clone(),
            entry_id: entry_id.clone(),
            vote_count,
        };
        if let Err(err) = self.notifier.vote_accepted(notice) {
            warn!(entry = %entry_id, error = %err, "vote notification failed");
        }

        Ok(VoteOutcome::Accepted { vote_count })
    }

    pub fn record_view(
        &self,
        entry_id: &EntryId,
        voter: &VoterIdentity,
    ) -> Result<ViewOutcome, RankingServiceError> {
        if self.repository.entry(entry_id)?.is_none() {
            return Err(RankingServiceError::UnknownEntry(entry_id.clone()));
        }

        Ok(ViewRecorder::record(self.repository.as_ref(), entry_id, voter)?)
    }
}

/// Error raised by the ranking service.
#[derive(Debug, thiserror::Error)]
pub enum RankingServiceError {
    #[error("entry {0} not found")]
    UnknownEntry(EntryId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
