mod parser;

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use super::aggregate::JudgeRoster;
use super::domain::{Entry, EventId, ScoreRecord};
use super::policy::RankingPolicy;
use super::standings::{compute_standings, EventStandings};

#[derive(Debug)]
pub enum ContestImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ContestImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContestImportError::Io(err) => write!(f, "failed to read contest export: {}", err),
            ContestImportError::Csv(err) => write!(f, "invalid contest CSV data: {}", err),
        }
    }
}

impl std::error::Error for ContestImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContestImportError::Io(err) => Some(err),
            ContestImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ContestImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ContestImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Entries, score records, and judge roster loaded from CSV exports.
#[derive(Debug, Clone, Default)]
pub struct ContestSnapshot {
    pub entries: Vec<Entry>,
    pub scores: Vec<ScoreRecord>,
    pub roster: JudgeRoster,
}

impl ContestSnapshot {
    pub fn events(&self) -> Vec<EventId> {
        self.entries
            .iter()
            .map(|entry| entry.event_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn standings(
        &self,
        event_id: &EventId,
        policy: &RankingPolicy,
        computed_at: DateTime<Utc>,
    ) -> EventStandings {
        let entries: Vec<Entry> = self
            .entries
            .iter()
            .filter(|entry| &entry.event_id == event_id)
            .cloned()
            .collect();

        compute_standings(
            event_id,
            &entries,
            &self.scores,
            &self.roster,
            policy,
            computed_at,
        )
    }
}

pub struct ContestImporter;

impl ContestImporter {
    pub fn from_paths<P, Q>(entries: P, scores: Q) -> Result<ContestSnapshot, ContestImportError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let entries = std::fs::File::open(entries)?;
        let scores = std::fs::File::open(scores)?;
        Self::from_readers(entries, scores)
    }

    /// Scores CSV rows whose `role` column reads `judge` populate the roster.
    pub fn from_readers<E, S>(entries: E, scores: S) -> Result<ContestSnapshot, ContestImportError>
    where
        E: Read,
        S: Read,
    {
        let entries = parser::parse_entries(entries)?;
        let mut roster = JudgeRoster::default();
        let mut records = Vec::new();

        for rated in parser::parse_scores(scores)? {
            if rated.judge {
                roster.insert(rated.record.rater_id.clone());
            }
            records.push(rated.record);
        }

        info!(
            entries = entries.len(),
            scores = records.len(),
            judges = roster.len(),
            "loaded contest snapshot"
        );

        Ok(ContestSnapshot {
            entries,
            scores: records,
            roster,
        })
    }
}
