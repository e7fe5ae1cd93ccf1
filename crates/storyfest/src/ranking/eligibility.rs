use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::EntryId;
use super::selection::{rank_qualifying, Candidate, PodiumSlot};

/// Non-podium entries open to public voting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPool {
    /// Set while nothing qualifies yet; every non-podium entry is then eligible.
    pub bootstrap: bool,
    pub entries: Vec<EntryId>,
    /// Entries neither on the podium nor in the pool.
    pub excluded: Vec<EntryId>,
}

impl EligibilityPool {
    pub fn contains(&self, entry_id: &EntryId) -> bool {
        self.entries.contains(entry_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Select the bounded voting pool that sits just below the podium.
pub fn partition_pool(
    candidates: &[Candidate],
    podium: &[PodiumSlot],
    pool_size: usize,
) -> EligibilityPool {
    let on_podium: HashSet<&EntryId> = podium.iter().map(|slot| &slot.entry_id).collect();
    let ranked = rank_qualifying(candidates);

    let (bootstrap, entries): (bool, Vec<EntryId>) = if ranked.is_empty() {
        let everyone = candidates
            .iter()
            .filter(|candidate| !on_podium.contains(&candidate.entry_id))
            .map(|candidate| candidate.entry_id.clone())
            .collect();
        (true, everyone)
    } else {
        let pool = ranked
            .iter()
            .filter(|item| !on_podium.contains(&item.candidate.entry_id))
            .take(pool_size)
            .map(|item| item.candidate.entry_id.clone())
            .collect();
        (false, pool)
    };

    let in_pool: HashSet<&EntryId> = entries.iter().collect();
    let excluded = candidates
        .iter()
        .map(|candidate| &candidate.entry_id)
        .filter(|id| !on_podium.contains(id) && !in_pool.contains(id))
        .cloned()
        .collect();

    EligibilityPool {
        bootstrap,
        entries,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::domain::ClassLevel;
    use crate::ranking::selection::StratifiedSelector;

    fn candidate(id: &str, score: f64, reviews: u64) -> Candidate {
        Candidate {
            entry_id: EntryId(id.to_string()),
            class_level: Some(ClassLevel::Primary),
            score,
            tie_break: reviews,
            qualifies: reviews > 0,
        }
    }

    #[test]
    fn bootstrap_makes_everyone_eligible() {
        let candidates: Vec<Candidate> = (0..10)
            .map(|index| candidate(&format!("e{index}"), 0.0, 0))
            .collect();

        let podium = StratifiedSelector::default().select(&candidates);
        let pool = partition_pool(&candidates, &podium, 45);

        assert!(podium.is_empty());
        assert!(pool.bootstrap);
        assert_eq!(pool.len(), 10);
        assert!(pool.excluded.is_empty());
    }

    #[test]
    fn pool_is_bounded_and_disjoint_from_podium() {
        let candidates: Vec<Candidate> = (0..60)
            .map(|index| candidate(&format!("e{index:02}"), f64::from(index % 10), 1))
            .collect();

        let podium = StratifiedSelector::new(6, 6).select(&candidates);
        let pool = partition_pool(&candidates, &podium, 45);

        assert!(!pool.bootstrap);
        assert_eq!(pool.len(), 45);
        assert!(podium.iter().all(|slot| !pool.contains(&slot.entry_id)));
        assert_eq!(podium.len() + pool.len() + pool.excluded.len(), 60);
    }

    #[test]
    fn unreviewed_entries_are_excluded_once_judging_starts() {
        let candidates = vec![
            candidate("scored", 6.0, 2),
            candidate("waiting", 0.0, 0),
            candidate("also-scored", 5.0, 1),
        ];

        let pool = partition_pool(&candidates, &[], 45);

        assert_eq!(
            pool.entries,
            vec![EntryId("scored".to_string()), EntryId("also-scored".to_string())]
        );
        assert_eq!(pool.excluded, vec![EntryId("waiting".to_string())]);
    }

    #[test]
    fn pool_follows_podium_order() {
        let candidates = vec![
            candidate("low", 3.0, 1),
            candidate("high", 9.0, 1),
            candidate("mid", 6.0, 3),
            candidate("mid-thin", 6.0, 1),
        ];

        let podium = StratifiedSelector::new(1, 1).select(&candidates);
        let pool = partition_pool(&candidates, &podium, 2);

        assert_eq!(podium[0].entry_id, EntryId("high".to_string()));
        assert_eq!(
            pool.entries,
            vec![EntryId("mid".to_string()), EntryId("mid-thin".to_string())]
        );
        assert_eq!(pool.excluded, vec![EntryId("low".to_string())]);
    }
}
