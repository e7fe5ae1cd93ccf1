use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::aggregate::ScoreSummary;
use super::domain::{ClassLevel, Entry, EntryId, RankingMetric};

/// Entry projected onto a single ranking metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub entry_id: EntryId,
    pub class_level: Option<ClassLevel>,
    pub score: f64,
    /// Secondary key favoring entries backed by more evidence (judge reviews, votes).
    pub tie_break: u64,
    pub qualifies: bool,
}

impl Candidate {
    /// Project an entry for the judge board: average score, tie-broken by review count.
    pub fn judged(entry: &Entry, summary: Option<&ScoreSummary>) -> Self {
        let summary = summary.copied().unwrap_or_default();
        Self {
            entry_id: entry.id.clone(),
            class_level: entry.class_level,
            score: summary.average_score,
            tie_break: u64::from(summary.review_count),
            qualifies: summary.is_reviewed(),
        }
    }

    /// Project an entry for the community board: the vote counter is the score.
    ///
    /// Ties on votes fall back to the view counter before input order. Plain
    /// review-count ordering has no meaning for votes, so views stand in as the
    /// evidence key here.
    pub fn community(entry: &Entry) -> Self {
        Self {
            entry_id: entry.id.clone(),
            class_level: entry.class_level,
            score: entry.vote_count as f64,
            tie_break: entry.view_count,
            qualifies: entry.vote_count > 0,
        }
    }

    pub fn for_metric(
        metric: RankingMetric,
        entry: &Entry,
        summary: Option<&ScoreSummary>,
    ) -> Self {
        match metric {
            RankingMetric::Judge => Self::judged(entry, summary),
            RankingMetric::Community => Self::community(entry),
        }
    }
}

/// Podium member with its 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodiumSlot {
    pub entry_id: EntryId,
    pub rank: u32,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_level: Option<ClassLevel>,
    #[serde(skip)]
    pub(crate) backfilled: bool,
}

/// Stratified top-K selection with a per-class cap and global backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifiedSelector {
    pub size: usize,
    pub per_partition_cap: usize,
}

impl Default for StratifiedSelector {
    fn default() -> Self {
        Self {
            size: 6,
            per_partition_cap: 2,
        }
    }
}

impl StratifiedSelector {
    pub fn new(size: usize, per_partition_cap: usize) -> Self {
        Self {
            size,
            per_partition_cap,
        }
    }

    pub fn select(&self, candidates: &[Candidate]) -> Vec<PodiumSlot> {
        let ranked = rank_qualifying(candidates);
        if self.size == 0 || ranked.is_empty() {
            return Vec::new();
        }

        let mut groups: BTreeMap<ClassLevel, Vec<Ranked<'_>>> = BTreeMap::new();
        for item in &ranked {
            if let Some(level) = item.candidate.class_level {
                groups.entry(level).or_default().push(*item);
            }
        }

        let mut selected: Vec<(Ranked<'_>, bool)> = Vec::with_capacity(self.size);
        let mut taken: HashSet<&EntryId> = HashSet::new();

        'rounds: for round in 0..self.per_partition_cap {
            let mut picks: Vec<Ranked<'_>> = groups
                .values()
                .filter_map(|group| group.get(round).copied())
                .collect();
            if picks.is_empty() {
                break;
            }
            picks.sort_by(compare_ranked);

            for pick in picks {
                if selected.len() == self.size {
                    break 'rounds;
                }
                taken.insert(&pick.candidate.entry_id);
                selected.push((pick, false));
            }
        }

        for item in &ranked {
            if selected.len() == self.size {
                break;
            }
            if taken.insert(&item.candidate.entry_id) {
                selected.push((*item, true));
            }
        }

        selected.sort_by(|(a, _), (b, _)| compare_ranked(a, b));
        selected
            .into_iter()
            .enumerate()
            .map(|(index, (item, backfilled))| PodiumSlot {
                entry_id: item.candidate.entry_id.clone(),
                rank: index as u32 + 1,
                score: item.candidate.score,
                class_level: item.candidate.class_level,
                backfilled,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Ranked<'a> {
    pub(crate) position: usize,
    pub(crate) candidate: &'a Candidate,
}

/// Qualifying candidates in podium order: score desc, tie-break desc, input order.
pub(crate) fn rank_qualifying(candidates: &[Candidate]) -> Vec<Ranked<'_>> {
    let mut ranked: Vec<Ranked<'_>> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.qualifies)
        .map(|(position, candidate)| Ranked {
            position,
            candidate,
        })
        .collect();
    ranked.sort_by(compare_ranked);
    ranked
}

pub(crate) fn compare_ranked(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.candidate
        .score
        .total_cmp(&a.candidate.score)
        .then_with(|| b.candidate.tie_break.cmp(&a.candidate.tie_break))
        .then_with(|| a.position.cmp(&b.position))
}
