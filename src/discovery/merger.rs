//! Final dedup and merge
//!
//! Unifies candidates and per-country patent lists and recomputes every
//! summary count from the unified collections.

use super::state::StateSnapshot;
use super::types::{PatentMap, ResultSummary};
use crate::model::{CandidateSet, CountryPatentRecord};
use std::collections::HashMap;

/// Merges partial results into one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultMerger;

impl ResultMerger {
    pub fn new() -> Self {
        Self
    }

    /// Union candidate sets. Earlier sets keep their ordering and passes;
    /// provenance is unioned.
    pub fn merge_candidates<'a>(&self, sets: impl IntoIterator<Item = &'a CandidateSet>) -> CandidateSet {
        let mut merged = CandidateSet::new();
        for set in sets {
            merged.absorb(set);
        }
        merged
    }

    /// Unify patent lists by patent number within each country.
    ///
    /// Every record lands under its own country code. When a number occurs
    /// twice, the first record is kept and only its empty fields are filled
    /// from the later one.
    pub fn merge_patents(&self, maps: impl IntoIterator<Item = PatentMap>) -> PatentMap {
        let mut merged = PatentMap::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for map in maps {
            for (country, records) in map {
                merged.entry(country).or_default();
                for record in records {
                    let key = (record.country.clone(), record.patent_number.clone());
                    let list = merged.entry(record.country.clone()).or_default();
                    match index.get(&key) {
                        Some(&at) => {
                            list[at].fill_missing(&record);
                        }
                        None => {
                            index.insert(key, list.len());
                            list.push(record);
                        }
                    }
                }
            }
        }
        merged
    }

    pub fn summarize(
        &self,
        candidates: &CandidateSet,
        patents: &PatentMap,
        state: &StateSnapshot,
    ) -> ResultSummary {
        ResultSummary {
            total_candidates: candidates.len(),
            total_patents: patents.values().map(Vec::len).sum(),
            candidates_by_source: candidates.count_by_source(),
            candidates_by_pass: candidates.count_by_pass(),
            patents_by_country: patents.iter().map(|(c, list)| (c.clone(), list.len())).collect(),
            queries_executed: state.successful_queries() + state.failed_queries(),
            queries_failed: state.failed_queries(),
        }
    }
}

/// Applicants across all records, first-seen order, case-insensitively unique.
pub fn applicants(patents: &PatentMap) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    patents
        .values()
        .flatten()
        .flat_map(|r: &CountryPatentRecord| r.applicants.iter())
        .filter(|a| seen.insert(a.to_lowercase()))
        .cloned()
        .collect()
}
