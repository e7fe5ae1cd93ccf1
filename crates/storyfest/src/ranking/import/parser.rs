use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::ranking::domain::{ClassLevel, Entry, EntryId, EventId, RaterId, ScoreRecord};

pub(crate) fn parse_entries<R: Read>(reader: R) -> Result<Vec<Entry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for record in csv_reader.deserialize::<EntryRow>() {
        let row = record?;
        let title = row.title.unwrap_or_else(|| row.entry_id.clone());
        entries.push(Entry {
            id: EntryId(row.entry_id),
            event_id: EventId(row.event_id),
            title,
            class_level: row.class_level.as_deref().and_then(ClassLevel::parse),
            vote_count: row.votes.unwrap_or(0),
            view_count: row.views.unwrap_or(0),
        });
    }

    Ok(entries)
}

#[derive(Debug)]
pub(crate) struct RatedScore {
    pub(crate) record: ScoreRecord,
    pub(crate) judge: bool,
}

pub(crate) fn parse_scores<R: Read>(reader: R) -> Result<Vec<RatedScore>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut scores = Vec::new();

    for record in csv_reader.deserialize::<ScoreRow>() {
        let row = record?;
        let judge = row
            .role
            .as_deref()
            .map(|role| role.eq_ignore_ascii_case("judge"))
            .unwrap_or(false);
        scores.push(RatedScore {
            record: ScoreRecord {
                rater_id: RaterId(row.rater_id),
                entry_id: EntryId(row.entry_id),
                score: row.score,
            },
            judge,
        });
    }

    Ok(scores)
}

#[derive(Debug, Deserialize)]
struct EntryRow {
    entry_id: String,
    event_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    class_level: Option<String>,
    #[serde(default)]
    votes: Option<u64>,
    #[serde(default)]
    views: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    rater_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    role: Option<String>,
    entry_id: String,
    score: f64,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
