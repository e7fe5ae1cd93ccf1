//! Ranking and voting-eligibility engine for storytelling competitions.
//!
//! Judge scores are aggregated per entry, a class-stratified podium is drawn
//! from them, the next band of entries forms the public voting pool, and vote
//! and view writes are gated by the cooldown and first-view rules. Every read
//! recomputes from the current record set.

pub mod aggregate;
pub mod cooldown;
pub mod domain;
pub mod eligibility;
pub mod feed;
pub mod import;
pub mod leaderboard;
mod policy;
pub mod repository;
pub mod router;
pub mod selection;
pub mod service;
pub mod standings;
mod viewership;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate_scores, JudgeRoster, RaterRoles, ScoreSummary};
pub use cooldown::{CooldownGuard, VoteEligibility};
pub use domain::{
    ClassLevel, Entry, EntryId, EventId, RankingMetric, RaterId, ScoreRecord, ViewRecord,
    VoteRecord, VoterIdentity, VoterIdentityError,
};
pub use eligibility::{partition_pool, EligibilityPool};
pub use feed::{spawn_recompute_worker, ChangeNotification, ChangeSource};
pub use import::{ContestImportError, ContestImporter, ContestSnapshot};
pub use leaderboard::{format_score, project_leaderboard, Leaderboard, Standing};
pub use policy::RankingPolicy;
pub use repository::{
    ContestRepository, NotifierError, RepositoryError, ViewInsert, VoteNotice, VoteNotifier,
};
pub use router::ranking_router;
pub use selection::{Candidate, PodiumSlot, StratifiedSelector};
pub use service::{RankingService, RankingServiceError, VoteOutcome};
pub use standings::{compute_standings, EventStandings, MetricStandings};
pub use viewership::{ViewOutcome, ViewRecorder};
