//! Metadata completion
//!
//! Records still missing a title, applicants, classifications or a filing
//! date get one point lookup each. Only empty fields are filled.

use super::cancel::CancellationToken;
use super::resolver::apply_bibliography;
use super::state::SearchState;
use super::types::PatentMap;
use crate::source::RegistryLookup;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionReport {
    pub lookups: usize,
    pub failed: usize,
    /// Records that gained at least one field.
    pub completed: usize,
}

pub struct MetadataCompleter {
    lookup: Arc<dyn RegistryLookup>,
}

impl MetadataCompleter {
    pub fn new(lookup: Arc<dyn RegistryLookup>) -> Self {
        Self { lookup }
    }

    pub async fn complete(
        &self,
        patents: &mut PatentMap,
        state: &SearchState,
        cancel: &CancellationToken,
    ) -> CompletionReport {
        let source = self.lookup.id();
        let mut report = CompletionReport::default();

        for record in patents.values_mut().flatten() {
            if !record.needs_completion() {
                continue;
            }
            if cancel.is_cancelled() {
                break;
            }
            let query = format!("publication {}", record.patent_number);
            if state.is_disabled(source) {
                state.record_skip(source, &query, "source disabled");
                continue;
            }

            report.lookups += 1;
            match self.lookup.publication(&record.patent_number).await {
                Ok(Some(biblio)) => {
                    let filled = apply_bibliography(record, &biblio);
                    state.record(source, &query, Ok(filled));
                    if filled > 0 {
                        report.completed += 1;
                        state.add_companies(&record.applicants);
                    }
                }
                Ok(None) => state.record(source, &query, Ok(0)),
                Err(e) => {
                    report.failed += 1;
                    state.record(source, &query, Err(&e));
                    if e.is_auth() {
                        tracing::warn!(source, error = %e, "disabling registry lookups");
                        state.disable(source);
                    }
                }
            }
        }

        tracing::info!(
            lookups = report.lookups,
            completed = report.completed,
            failed = report.failed,
            "metadata completion finished"
        );
        report
    }
}
