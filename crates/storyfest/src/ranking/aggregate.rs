use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{EntryId, RaterId, ScoreRecord};

/// Capability answering whether a rater's scores count toward the judge aggregate.
pub trait RaterRoles {
    fn is_judge(&self, rater: &RaterId) -> bool;
}

/// Set of rater identities holding the judge role for an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeRoster {
    judges: HashSet<RaterId>,
}

impl JudgeRoster {
    pub fn new<I>(judges: I) -> Self
    where
        I: IntoIterator<Item = RaterId>,
    {
        Self {
            judges: judges.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, rater: RaterId) {
        self.judges.insert(rater);
    }

    pub fn len(&self) -> usize {
        self.judges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.judges.is_empty()
    }
}

impl RaterRoles for JudgeRoster {
    fn is_judge(&self, rater: &RaterId) -> bool {
        self.judges.contains(rater)
    }
}

impl RaterRoles for HashSet<RaterId> {
    fn is_judge(&self, rater: &RaterId) -> bool {
        self.contains(rater)
    }
}

/// Judge aggregate for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub average_score: f64,
    pub review_count: u32,
    /// Ratings from raters without the judge role; never part of the average.
    pub audience_review_count: u32,
}

impl ScoreSummary {
    pub fn is_reviewed(&self) -> bool {
        self.review_count > 0
    }
}

/// Reduce raw score records into per-entry judge averages.
///
/// A repeated (rater, entry) pair replaces the earlier record. Entries without
/// judge records are absent from the map and read as `ScoreSummary::default()`.
pub fn aggregate_scores<R>(records: &[ScoreRecord], roles: &R) -> BTreeMap<EntryId, ScoreSummary>
where
    R: RaterRoles + ?Sized,
{
    let mut latest: HashMap<(&RaterId, &EntryId), f64> = HashMap::new();
    let mut order: Vec<(&RaterId, &EntryId)> = Vec::new();

    for record in records {
        if !record.in_range() {
            warn!(
                rater = %record.rater_id.0,
                entry = %record.entry_id,
                score = record.score,
                "ignoring out-of-range score record"
            );
            continue;
        }

        let key = (&record.rater_id, &record.entry_id);
        if latest.insert(key, record.score).is_none() {
            order.push(key);
        }
    }

    let mut totals: BTreeMap<EntryId, (f64, u32, u32)> = BTreeMap::new();
    for key in order {
        let (rater, entry) = key;
        let score = latest[&key];
        let slot = totals.entry(entry.clone()).or_insert((0.0, 0, 0));
        if roles.is_judge(rater) {
            slot.0 += score;
            slot.1 += 1;
        } else {
            slot.2 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(entry, (total, count, audience))| {
            let average_score = if count == 0 {
                0.0
            } else {
                round_one_decimal(total / f64::from(count))
            };
            (
                entry,
                ScoreSummary {
                    average_score,
                    review_count: count,
                    audience_review_count: audience,
                },
            )
        })
        .collect()
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rater: &str, entry: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            rater_id: RaterId(rater.to_string()),
            entry_id: EntryId(entry.to_string()),
            score,
        }
    }

    fn roster() -> JudgeRoster {
        JudgeRoster::new(["j1", "j2", "j3"].map(|id| RaterId(id.to_string())))
    }

    #[test]
    fn averages_judge_scores_to_one_decimal() {
        let records = vec![
            record("j1", "a", 8.0),
            record("j2", "a", 9.0),
            record("j3", "a", 9.0),
        ];

        let summaries = aggregate_scores(&records, &roster());
        let a = summaries[&EntryId("a".to_string())];

        assert_eq!(a.average_score, 8.7);
        assert_eq!(a.review_count, 3);
    }

    #[test]
    fn audience_ratings_are_counted_separately() {
        let records = vec![record("j1", "a", 6.0), record("fan", "a", 10.0)];

        let summaries = aggregate_scores(&records, &roster());
        let a = summaries[&EntryId("a".to_string())];

        assert_eq!(a.average_score, 6.0);
        assert_eq!(a.review_count, 1);
        assert_eq!(a.audience_review_count, 1);
    }

    #[test]
    fn audience_only_entry_has_no_judge_reviews() {
        let records = vec![record("fan", "b", 10.0)];

        let summaries = aggregate_scores(&records, &roster());
        let b = summaries[&EntryId("b".to_string())];

        assert!(!b.is_reviewed());
        assert_eq!(b.average_score, 0.0);
    }

    #[test]
    fn repeated_pair_keeps_latest_score() {
        let records = vec![record("j1", "a", 4.0), record("j1", "a", 7.0)];

        let summaries = aggregate_scores(&records, &roster());
        let a = summaries[&EntryId("a".to_string())];

        assert_eq!(a.review_count, 1);
        assert_eq!(a.average_score, 7.0);
    }

    #[test]
    fn out_of_range_scores_are_ignored() {
        let records = vec![
            record("j1", "a", 11.0),
            record("j2", "a", f64::NAN),
            record("j3", "a", -1.0),
        ];

        let summaries = aggregate_scores(&records, &roster());

        assert!(summaries.is_empty());
    }
}
