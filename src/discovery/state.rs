//! Search state tracker
//!
//! Bookkeeping threaded through every phase of one search. It only ever
//! grows: phases are marked complete, log entries are appended, counts
//! only rise, and disabled sources stay disabled. Clones share the same
//! underlying state, so a caller can poll [`SearchState::snapshot`] while
//! the search runs.

use super::types::SearchPhase;
use crate::source::SourceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// What happened to one logged call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Succeeded,
    Failed { kind: String, message: String },
    /// Not attempted, e.g. because the source was disabled.
    Skipped { reason: String },
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One executed (or skipped) external call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub source: String,
    pub query: String,
    pub result_count: usize,
    pub outcome: QueryOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Immutable view of the state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub phase: SearchPhase,
    pub completed_phases: Vec<SearchPhase>,
    /// Highest candidate count observed per source.
    pub candidate_counts: BTreeMap<String, usize>,
    pub query_log: Vec<QueryLogEntry>,
    pub companies: BTreeSet<String>,
    pub disabled_sources: BTreeSet<String>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            phase: SearchPhase::Init,
            completed_phases: Vec::new(),
            candidate_counts: BTreeMap::new(),
            query_log: Vec::new(),
            companies: BTreeSet::new(),
            disabled_sources: BTreeSet::new(),
        }
    }
}

impl StateSnapshot {
    pub fn successful_queries(&self) -> usize {
        self.query_log.iter().filter(|e| e.outcome.is_success()).count()
    }

    pub fn failed_queries(&self) -> usize {
        self.query_log.iter().filter(|e| e.outcome.is_failure()).count()
    }

    /// Successful calls logged under `source`.
    pub fn successes_from(&self, source: &str) -> usize {
        self.query_log
            .iter()
            .filter(|e| e.source == source && e.outcome.is_success())
            .count()
    }

    pub fn is_complete(&self, phase: SearchPhase) -> bool {
        self.completed_phases.contains(&phase)
    }
}

/// Shared handle to the state of one search.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    inner: Arc<Mutex<StateSnapshot>>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    // Every update is a single push or insert; poisoning is recovered.
    fn lock(&self) -> MutexGuard<'_, StateSnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Move to `phase`. Phases never move backwards.
    pub fn enter(&self, phase: SearchPhase) {
        let mut state = self.lock();
        if phase > state.phase {
            state.phase = phase;
        }
    }

    pub fn complete(&self, phase: SearchPhase) {
        let mut state = self.lock();
        if !state.completed_phases.contains(&phase) {
            state.completed_phases.push(phase);
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.lock().phase
    }

    /// Log the outcome of one call.
    pub fn record(&self, source: &str, query: &str, outcome: Result<usize, &SourceError>) {
        let (result_count, outcome) = match outcome {
            Ok(n) => (n, QueryOutcome::Succeeded),
            Err(e) => (
                0,
                QueryOutcome::Failed {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                },
            ),
        };
        self.push(source, query, result_count, outcome);
    }

    pub fn record_skip(&self, source: &str, query: &str, reason: &str) {
        self.push(
            source,
            query,
            0,
            QueryOutcome::Skipped {
                reason: reason.to_string(),
            },
        );
    }

    fn push(&self, source: &str, query: &str, result_count: usize, outcome: QueryOutcome) {
        self.lock().query_log.push(QueryLogEntry {
            source: source.to_string(),
            query: query.to_string(),
            result_count,
            outcome,
            timestamp: Utc::now(),
        });
    }

    /// Raise the candidate count for `source`; lower values are ignored.
    pub fn observe_count(&self, source: &str, count: usize) {
        let mut state = self.lock();
        let slot = state.candidate_counts.entry(source.to_string()).or_insert(0);
        *slot = (*slot).max(count);
    }

    pub fn add_companies<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.lock();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() {
                state.companies.insert(name.to_string());
            }
        }
    }

    /// Stop using `source` for the rest of this search.
    pub fn disable(&self, source: &str) {
        self.lock().disabled_sources.insert(source.to_string());
    }

    pub fn is_disabled(&self, source: &str) -> bool {
        self.lock().disabled_sources.contains(source)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.lock().clone()
    }
}
