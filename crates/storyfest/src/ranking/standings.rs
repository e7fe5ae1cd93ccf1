use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregate::{aggregate_scores, RaterRoles, ScoreSummary};
use super::domain::{Entry, EntryId, EventId, RankingMetric, ScoreRecord};
use super::eligibility::{partition_pool, EligibilityPool};
use super::leaderboard::{project_leaderboard, Leaderboard};
use super::policy::RankingPolicy;
use super::selection::{Candidate, PodiumSlot};

/// Podium, pool, and rendered board for a single metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStandings {
    pub podium: Vec<PodiumSlot>,
    pub pool: EligibilityPool,
    pub leaderboard: Leaderboard,
}

/// Everything derived for one event from its current record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStandings {
    pub event_id: EventId,
    pub judge: MetricStandings,
    pub community: MetricStandings,
    pub computed_at: DateTime<Utc>,
}

impl EventStandings {
    pub fn metric(&self, metric: RankingMetric) -> &MetricStandings {
        match metric {
            RankingMetric::Judge => &self.judge,
            RankingMetric::Community => &self.community,
        }
    }

    /// The public voting pool is drawn from judge scores.
    pub fn eligible_pool(&self) -> &EligibilityPool {
        &self.judge.pool
    }

    /// Podium entries and pool members may receive community votes.
    pub fn accepts_votes_for(&self, entry_id: &EntryId) -> bool {
        self.judge
            .podium
            .iter()
            .any(|slot| &slot.entry_id == entry_id)
            || self.judge.pool.contains(entry_id)
    }
}

/// Recompute every derived view from scratch.
///
/// Pure over its inputs: repeated calls with the same records yield equal
/// standings (modulo `computed_at`).
pub fn compute_standings<R>(
    event_id: &EventId,
    entries: &[Entry],
    scores: &[ScoreRecord],
    roles: &R,
    policy: &RankingPolicy,
    computed_at: DateTime<Utc>,
) -> EventStandings
where
    R: RaterRoles + ?Sized,
{
    let summaries = aggregate_scores(scores, roles);

    EventStandings {
        event_id: event_id.clone(),
        judge: metric_standings(RankingMetric::Judge, entries, &summaries, policy),
        community: metric_standings(RankingMetric::Community, entries, &summaries, policy),
        computed_at,
    }
}

fn metric_standings(
    metric: RankingMetric,
    entries: &[Entry],
    summaries: &BTreeMap<EntryId, ScoreSummary>,
    policy: &RankingPolicy,
) -> MetricStandings {
    let candidates: Vec<Candidate> = entries
        .iter()
        .map(|entry| Candidate::for_metric(metric, entry, summaries.get(&entry.id)))
        .collect();

    let podium = policy.selector().select(&candidates);
    let pool = partition_pool(&candidates, &podium, policy.pool_size);
    let leaderboard = project_leaderboard(metric, entries, &candidates, &podium, &pool);

    MetricStandings {
        podium,
        pool,
        leaderboard,
    }
}
