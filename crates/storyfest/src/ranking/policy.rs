use serde::{Deserialize, Serialize};

use super::cooldown::CooldownGuard;
use super::selection::StratifiedSelector;

/// Tunable sizes and windows for podium, voting pool, and vote cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingPolicy {
    pub podium_size: usize,
    pub per_class_cap: usize,
    pub pool_size: usize,
    pub cooldown_hours: u32,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            podium_size: 6,
            per_class_cap: 2,
            pool_size: 45,
            cooldown_hours: 24,
        }
    }
}

impl RankingPolicy {
    pub fn selector(&self) -> StratifiedSelector {
        StratifiedSelector::new(self.podium_size, self.per_class_cap)
    }

    pub fn cooldown(&self) -> CooldownGuard {
        CooldownGuard::from_hours(self.cooldown_hours)
    }
}
