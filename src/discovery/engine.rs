//! Discovery engine: runs every query against every search surface

use super::cancel::CancellationToken;
use super::state::SearchState;
use crate::model::{CandidateSet, ExpansionPass};
use crate::query::QuerySet;
use crate::source::SearchAdapter;
use std::collections::HashSet;
use std::sync::Arc;

/// Runs the synthesized queries and collects seed candidates.
///
/// Adapters run one after another and each query is sent on its own, so
/// pacing is whatever the adapter's gate enforces. A failed query is logged
/// and skipped. An authentication failure disables that adapter for the
/// rest of the search; the others continue.
pub struct DiscoveryEngine {
    adapters: Vec<Arc<dyn SearchAdapter>>,
}

impl DiscoveryEngine {
    /// Adapters are deduplicated by `id()`, first registration wins.
    pub fn new(adapters: Vec<Arc<dyn SearchAdapter>>) -> Self {
        let mut seen = HashSet::new();
        let adapters = adapters
            .into_iter()
            .filter(|a| seen.insert(a.id().to_string()))
            .collect();
        Self { adapters }
    }

    pub fn adapters(&self) -> &[Arc<dyn SearchAdapter>] {
        &self.adapters
    }

    pub async fn run(
        &self,
        queries: &QuerySet,
        state: &SearchState,
        cancel: &CancellationToken,
    ) -> CandidateSet {
        let mut candidates = CandidateSet::new();

        for adapter in &self.adapters {
            let source = adapter.id();
            let mut found_here = HashSet::new();

            for query in queries.for_surface(adapter.surface()) {
                if cancel.is_cancelled() {
                    tracing::info!(source, "search cancelled");
                    return candidates;
                }
                if state.is_disabled(source) {
                    state.record_skip(source, &query.text, "source disabled");
                    continue;
                }

                match adapter.search(query).await {
                    Ok(ids) => {
                        state.record(source, &query.text, Ok(ids.len()));
                        for id in ids {
                            found_here.insert(id.clone());
                            candidates.insert(id, source, ExpansionPass::Seed);
                        }
                        state.observe_count(source, found_here.len());
                    }
                    Err(e) => {
                        state.record(source, &query.text, Err(&e));
                        if e.is_auth() {
                            tracing::warn!(source, error = %e, "disabling source for this search");
                            state.disable(source);
                        } else {
                            tracing::debug!(source, query = %query.text, error = %e, "query failed");
                        }
                    }
                }
            }

            tracing::info!(source, candidates = found_here.len(), "source finished");
        }

        candidates
    }
}
