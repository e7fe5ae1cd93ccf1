use std::collections::HashMap;

use serde::Serialize;

use super::domain::{ClassLevel, Entry, EntryId, RankingMetric};
use super::eligibility::EligibilityPool;
use super::selection::{Candidate, PodiumSlot};

/// Places shown with podium styling; the rest of the top-K are runners-up.
pub const HIGHLIGHTED_PLACES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub entry_id: EntryId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_level: Option<ClassLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_label: Option<&'static str>,
    pub rank: u32,
    pub score: f64,
    pub display_score: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub metric: RankingMetric,
    pub metric_label: &'static str,
    pub podium: Vec<Standing>,
    pub runners_up: Vec<Standing>,
    pub contenders: Vec<Standing>,
    pub bootstrap: bool,
    pub empty: bool,
}

impl Leaderboard {
    pub fn top(&self) -> impl Iterator<Item = &Standing> {
        self.podium.iter().chain(self.runners_up.iter())
    }
}

pub fn format_score(metric: RankingMetric, score: f64) -> String {
    match metric {
        RankingMetric::Judge => format!("{score:.1}/10"),
        RankingMetric::Community => format!("{}", score.max(0.0).round() as u64),
    }
}

/// Shape a podium and voting pool into the board the presentation layer renders.
pub fn project_leaderboard(
    metric: RankingMetric,
    entries: &[Entry],
    candidates: &[Candidate],
    podium: &[PodiumSlot],
    pool: &EligibilityPool,
) -> Leaderboard {
    let titles: HashMap<&EntryId, &str> = entries
        .iter()
        .map(|entry| (&entry.id, entry.title.as_str()))
        .collect();
    let by_id: HashMap<&EntryId, &Candidate> = candidates
        .iter()
        .map(|candidate| (&candidate.entry_id, candidate))
        .collect();

    let standing = |entry_id: &EntryId, rank: u32, score: f64, class_level: Option<ClassLevel>| Standing {
        entry_id: entry_id.clone(),
        title: titles.get(entry_id).copied().unwrap_or_default().to_string(),
        class_level,
        class_label: class_level.map(ClassLevel::label),
        rank,
        score,
        display_score: format_score(metric, score),
    };

    let (podium_slots, runner_slots): (Vec<&PodiumSlot>, Vec<&PodiumSlot>) = podium
        .iter()
        .partition(|slot| slot.rank <= HIGHLIGHTED_PLACES);

    let to_standing =
        |slot: &PodiumSlot| standing(&slot.entry_id, slot.rank, slot.score, slot.class_level);
    let podium_standings: Vec<Standing> = podium_slots.into_iter().map(to_standing).collect();
    let runners_up: Vec<Standing> = runner_slots.into_iter().map(to_standing).collect();

    let next_rank = podium.len() as u32 + 1;
    let contenders: Vec<Standing> = pool
        .entries
        .iter()
        .enumerate()
        .map(|(offset, entry_id)| {
            let (score, class_level) = by_id
                .get(entry_id)
                .map(|candidate| (candidate.score, candidate.class_level))
                .unwrap_or((0.0, None));
            standing(entry_id, next_rank + offset as u32, score, class_level)
        })
        .collect();

    let empty = podium_standings.is_empty() && contenders.is_empty();

    Leaderboard {
        metric,
        metric_label: metric.label(),
        podium: podium_standings,
        runners_up,
        contenders,
        bootstrap: pool.bootstrap,
        empty,
    }
}
