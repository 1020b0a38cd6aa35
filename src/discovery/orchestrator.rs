//! Search orchestrator
//!
//! Drives one search through its phases:
//!
//! ```text
//! INIT → ENRICHING → SYNTHESIZING → SEARCHING → EXPANDING_PRIORITY →
//! EXPANDING_CITATION → RESOLVING_COUNTRIES → COMPLETING_METADATA →
//! MERGING → DONE
//! ```
//!
//! No phase failure aborts the run. A failing source is logged and, on
//! authentication failure, disabled; the remaining sources carry on. Only
//! when every search surface failed and nothing was found does the result
//! carry [`SearchFault::AllSourcesFailed`]. Cancellation is checked before
//! and after each phase; a phase cut short is not marked complete, and the
//! run skips straight to merging what it has.

use super::cancel::CancellationToken;
use super::completer::MetadataCompleter;
use super::engine::DiscoveryEngine;
use super::expander::GraphExpander;
use super::merger::{applicants, ResultMerger};
use super::resolver::CountryResolver;
use super::state::SearchState;
use super::types::{IntelligenceSummary, PatentMap, SearchFault, SearchPhase, SearchResult};
use crate::config::{EnrichmentLimits, ExpansionConfig, QueryLimits, SearchConfig};
use crate::enrichment::{http_sources, EnrichmentAggregator, FactSource, FactSourceRegistry};
use crate::model::{CandidateSet, EnrichmentRecord, QueryContext};
use crate::query::{QuerySet, QuerySynthesizer};
use crate::source::{
    gate_for, HttpMarkupFetcher, OpsRegistry, RegistryLookup, SearchAdapter, SourceError,
    WebSearchAdapter,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub struct SearchOrchestrator {
    aggregator: EnrichmentAggregator,
    synthesizer: QuerySynthesizer,
    engine: DiscoveryEngine,
    lookup: Option<Arc<dyn RegistryLookup>>,
    expansion: ExpansionConfig,
    merger: ResultMerger,
}

/// Builder for [`SearchOrchestrator`].
#[derive(Default)]
pub struct SearchOrchestratorBuilder {
    fact_sources: Vec<Arc<dyn FactSource>>,
    adapters: Vec<Arc<dyn SearchAdapter>>,
    lookup: Option<Arc<dyn RegistryLookup>>,
    limits: EnrichmentLimits,
    queries: QueryLimits,
    expansion: ExpansionConfig,
    fact_source_ms: u64,
}

impl SearchOrchestratorBuilder {
    pub fn fact_source(mut self, source: Arc<dyn FactSource>) -> Self {
        self.fact_sources.push(source);
        self
    }

    pub fn fact_sources(mut self, sources: impl IntoIterator<Item = Arc<dyn FactSource>>) -> Self {
        self.fact_sources.extend(sources);
        self
    }

    /// Add a search surface.
    pub fn adapter(mut self, adapter: Arc<dyn SearchAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Add the patent registry, used both as a search surface and for
    /// family, citation and point lookups.
    pub fn registry<R>(mut self, registry: Arc<R>) -> Self
    where
        R: SearchAdapter + RegistryLookup + 'static,
    {
        self.adapters.push(registry.clone());
        self.lookup = Some(registry);
        self
    }

    /// Set the lookup capability alone, without a search surface.
    pub fn lookup(mut self, lookup: Arc<dyn RegistryLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn enrichment_limits(mut self, limits: EnrichmentLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn query_limits(mut self, limits: QueryLimits) -> Self {
        self.queries = limits;
        self
    }

    pub fn expansion(mut self, expansion: ExpansionConfig) -> Self {
        self.expansion = expansion;
        self
    }

    pub fn fact_source_interval_ms(mut self, ms: u64) -> Self {
        self.fact_source_ms = ms;
        self
    }

    pub fn build(self) -> SearchOrchestrator {
        let aggregator = EnrichmentAggregator::new(FactSourceRegistry::new(self.fact_sources), self.limits)
            .with_gate(gate_for(self.fact_source_ms));
        SearchOrchestrator {
            aggregator,
            synthesizer: QuerySynthesizer::new(self.queries),
            engine: DiscoveryEngine::new(self.adapters),
            lookup: self.lookup,
            expansion: self.expansion,
            merger: ResultMerger::new(),
        }
    }
}

impl SearchOrchestrator {
    pub fn builder() -> SearchOrchestratorBuilder {
        SearchOrchestratorBuilder::default()
    }

    /// Wire the HTTP sources described by `config`.
    ///
    /// The registry is only added when credentials are present in the
    /// environment; without it the search runs on the web surface alone
    /// and no expansion happens.
    pub fn live(config: &SearchConfig) -> Result<Self, SourceError> {
        let mut builder = Self::builder()
            .fact_sources(http_sources(&config.fact_sources)?)
            .enrichment_limits(config.limits.clone())
            .query_limits(config.queries.clone())
            .expansion(config.expansion.clone())
            .fact_source_interval_ms(config.pacing.fact_source_ms);

        match config.registry.credentials() {
            Some(credentials) => {
                let registry = OpsRegistry::new(config.registry.clone(), credentials)?
                    .with_results_per_query(config.queries.results_per_query)
                    .with_search_gate(gate_for(config.pacing.registry_ms))
                    .with_lookup_gate(gate_for(config.pacing.lookup_ms));
                builder = builder.registry(Arc::new(registry));
            }
            None => tracing::warn!("registry credentials not set; registry search and expansion disabled"),
        }

        if config.web.enabled {
            let web = WebSearchAdapter::new(Arc::new(HttpMarkupFetcher::new(config.web.clone())))
                .with_gate(gate_for(config.pacing.web_ms));
            builder = builder.adapter(Arc::new(web));
        }

        Ok(builder.build())
    }

    /// Enrich and synthesize only, without searching.
    pub async fn plan(&self, context: &QueryContext) -> (EnrichmentRecord, QuerySet) {
        let enrichment = self.aggregator.enrich(context).await;
        let queries = self.synthesizer.synthesize(context, &enrichment.record);
        (enrichment.record, queries)
    }

    pub async fn search(&self, context: QueryContext) -> SearchResult {
        self.search_with(context, SearchState::new(), &CancellationToken::new())
            .await
    }

    /// Run a search with caller-held state and cancellation handles.
    pub async fn search_with(
        &self,
        context: QueryContext,
        state: SearchState,
        cancel: &CancellationToken,
    ) -> SearchResult {
        let search_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(%search_id, molecule = context.molecule(), "search started");

        let mut run = Run {
            state: &state,
            cancel,
            fault: None,
        };
        let mut record = EnrichmentRecord::default();
        let mut queries = QuerySet::new();
        let mut candidates = CandidateSet::new();
        let mut patents: PatentMap = context
            .target_countries()
            .iter()
            .map(|c| (c.clone(), Vec::new()))
            .collect();

        if run.begin(SearchPhase::Enriching) {
            let enrichment = self.aggregator.enrich(&context).await;
            for report in &enrichment.reports {
                let outcome = match &report.error {
                    Some(e) => Err(e),
                    None => Ok(report.facts),
                };
                state.record(&report.source, context.molecule(), outcome);
            }
            record = enrichment.record;
            state.add_companies(record.companies.iter());
            run.end(SearchPhase::Enriching);
        }

        if run.begin(SearchPhase::Synthesizing) {
            queries = self.synthesizer.synthesize(&context, &record);
            run.end(SearchPhase::Synthesizing);
        }

        if run.begin(SearchPhase::Searching) {
            candidates = self.engine.run(&queries, &state, cancel).await;
            run.end(SearchPhase::Searching);

            let snap = state.snapshot();
            let adapters = self.engine.adapters();
            let surfaces_failed = !adapters.is_empty()
                && adapters.iter().all(|a| snap.successes_from(a.id()) == 0);
            if candidates.is_empty() && surfaces_failed && run.fault.is_none() {
                tracing::warn!("every search surface failed");
                run.fault = Some(SearchFault::AllSourcesFailed);
            }
        }

        if let Some(lookup) = self.lookup.as_ref().filter(|_| run.fault.is_none()) {
            let expander = GraphExpander::new(Arc::clone(lookup), &self.expansion);

            if run.begin(SearchPhase::ExpandingPriority) {
                expander.expand_priority(&mut candidates, &state, cancel).await;
                run.end(SearchPhase::ExpandingPriority);
            }
            if run.begin(SearchPhase::ExpandingCitation) {
                expander.expand_citations(&mut candidates, &state, cancel).await;
                run.end(SearchPhase::ExpandingCitation);
            }
            if run.begin(SearchPhase::ResolvingCountries) {
                patents = CountryResolver::new(Arc::clone(lookup))
                    .resolve_all(&candidates, context.target_countries(), &state, cancel)
                    .await;
                run.end(SearchPhase::ResolvingCountries);
            }
            if run.begin(SearchPhase::CompletingMetadata) {
                MetadataCompleter::new(Arc::clone(lookup))
                    .complete(&mut patents, &state, cancel)
                    .await;
                run.end(SearchPhase::CompletingMetadata);
            }
        } else if self.lookup.is_none() {
            tracing::info!("no registry lookups configured; skipping expansion and resolution");
        }

        // Merging always runs, even after cancellation or total failure.
        state.enter(SearchPhase::Merging);
        let candidates = self.merger.merge_candidates([&candidates]);
        let patents = self.merger.merge_patents([patents]);
        state.add_companies(applicants(&patents));
        state.complete(SearchPhase::Merging);
        state.enter(SearchPhase::Done);

        let snapshot = state.snapshot();
        let summary = self.merger.summarize(&candidates, &patents, &snapshot);
        let intelligence = IntelligenceSummary {
            queries_by_category: queries.stats(),
            companies: snapshot.companies.iter().cloned().collect(),
            enrichment: record,
        };

        tracing::info!(
            %search_id,
            candidates = summary.total_candidates,
            patents = summary.total_patents,
            fault = ?run.fault,
            "search finished"
        );

        SearchResult {
            search_id,
            context,
            started_at,
            finished_at: Utc::now(),
            elapsed_secs: clock.elapsed().as_secs_f64(),
            candidates: candidates.to_sorted_vec(),
            patents_by_country: patents,
            intelligence,
            summary,
            state: snapshot,
            fault: run.fault,
        }
    }
}

/// Phase bookkeeping for one run.
struct Run<'a> {
    state: &'a SearchState,
    cancel: &'a CancellationToken,
    fault: Option<SearchFault>,
}

impl Run<'_> {
    /// Enter `phase` unless the run is cancelled or already faulted.
    fn begin(&mut self, phase: SearchPhase) -> bool {
        if self.fault.is_some() {
            return false;
        }
        if self.cancel.is_cancelled() {
            tracing::info!(phase = %phase, "search cancelled");
            self.fault = Some(SearchFault::Cancelled { phase });
            return false;
        }
        tracing::debug!(phase = %phase, "phase started");
        self.state.enter(phase);
        true
    }

    /// Mark `phase` complete, or record it as cut short if cancellation
    /// arrived while it ran.
    fn end(&mut self, phase: SearchPhase) {
        if self.cancel.is_cancelled() {
            tracing::info!(phase = %phase, "search cancelled mid-phase");
            self.fault = Some(SearchFault::Cancelled { phase });
            return;
        }
        self.state.complete(phase);
    }
}
