//! Result types for a discovery run

use super::state::StateSnapshot;
use crate::model::{Candidate, CountryPatentRecord, EnrichmentRecord, ExpansionPass, QueryContext};
use crate::query::QueryCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-country patent lists, each keyed by patent number within its country.
pub type PatentMap = BTreeMap<String, Vec<CountryPatentRecord>>;

/// Orchestration phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Init,
    Enriching,
    Synthesizing,
    Searching,
    ExpandingPriority,
    ExpandingCitation,
    ResolvingCountries,
    CompletingMetadata,
    Merging,
    Done,
}

impl SearchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Enriching => "enriching",
            Self::Synthesizing => "synthesizing",
            Self::Searching => "searching",
            Self::ExpandingPriority => "expanding_priority",
            Self::ExpandingCitation => "expanding_citation",
            Self::ResolvingCountries => "resolving_countries",
            Self::CompletingMetadata => "completing_metadata",
            Self::Merging => "merging",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a result is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum SearchFault {
    /// Every search surface failed and nothing was found.
    AllSourcesFailed,
    /// The caller cancelled the run; `phase` is the first phase cut short.
    Cancelled { phase: SearchPhase },
}

/// Counts recomputed from the final collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_candidates: usize,
    pub total_patents: usize,
    pub candidates_by_source: BTreeMap<String, usize>,
    pub candidates_by_pass: BTreeMap<ExpansionPass, usize>,
    pub patents_by_country: BTreeMap<String, usize>,
    pub queries_executed: usize,
    pub queries_failed: usize,
}

/// What was learned about the molecule before and during the search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceSummary {
    pub enrichment: EnrichmentRecord,
    pub queries_by_category: BTreeMap<QueryCategory, usize>,
    /// Companies and applicants seen anywhere in the run.
    pub companies: Vec<String>,
}

/// The complete outcome of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub search_id: Uuid,
    pub context: QueryContext,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    /// Candidate publications sorted by identifier.
    pub candidates: Vec<Candidate>,
    pub patents_by_country: PatentMap,
    pub intelligence: IntelligenceSummary,
    pub summary: ResultSummary,
    pub state: StateSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<SearchFault>,
}

impl SearchResult {
    /// Every country record, newest publication first. Undated records go last.
    pub fn all_patents(&self) -> Vec<&CountryPatentRecord> {
        let mut all: Vec<&CountryPatentRecord> = self.patents_by_country.values().flatten().collect();
        all.sort_by(|a, b| {
            b.publication_date
                .cmp(&a.publication_date)
                .then_with(|| a.patent_number.cmp(&b.patent_number))
        });
        all
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateId;

    fn record(number: &str, date: Option<&str>) -> CountryPatentRecord {
        let mut r = CountryPatentRecord::new(number, &number[..2], CandidateId::parse("WO2011051540").unwrap());
        r.publication_date = date.map(String::from);
        r
    }

    #[test]
    fn phases_are_ordered() {
        assert!(SearchPhase::Init < SearchPhase::Enriching);
        assert!(SearchPhase::CompletingMetadata < SearchPhase::Merging);
        assert_eq!(SearchPhase::ExpandingCitation.to_string(), "expanding_citation");
    }

    #[test]
    fn all_patents_newest_first() {
        let mut patents = PatentMap::new();
        patents.insert(
            "BR".into(),
            vec![record("BR112012008823", Some("2016-01-05")), record("BR122020000001", None)],
        );
        patents.insert("US".into(), vec![record("US8975254", Some("2015-03-10"))]);

        let result = SearchResult {
            search_id: Uuid::new_v4(),
            context: QueryContext::new("darolutamide"),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            elapsed_secs: 0.0,
            candidates: Vec::new(),
            patents_by_country: patents,
            intelligence: IntelligenceSummary::default(),
            summary: ResultSummary::default(),
            state: StateSnapshot::default(),
            fault: None,
        };
        let order: Vec<_> = result.all_patents().iter().map(|r| r.patent_number.as_str()).collect();
        assert_eq!(order, vec!["BR112012008823", "US8975254", "BR122020000001"]);
    }

    #[test]
    fn fault_serializes_with_tag() {
        let json = serde_json::to_value(SearchFault::Cancelled {
            phase: SearchPhase::Searching,
        })
        .unwrap();
        assert_eq!(json["fault"], "cancelled");
        assert_eq!(json["phase"], "searching");
    }
}
