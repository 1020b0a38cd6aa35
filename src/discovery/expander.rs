//! Graph expansion over family and citation links
//!
//! Two bounded passes over the candidate set:
//!
//! - **Priority expansion** takes the first `priority_frontier` candidates
//!   in discovery order, fetches each family, and adds the international
//!   publications listed in the members' publication references. Priority
//!   claims point at earlier filings, not siblings, and are never read.
//! - **Citation expansion** takes the first `citation_frontier` candidates
//!   and adds the international publications that cite them.
//!
//! Each pass processes its frontier once and stops. Candidates added
//! during a pass are not expanded in the same pass, so the number of
//! lookups never exceeds the frontier size.

use super::cancel::CancellationToken;
use super::state::SearchState;
use crate::config::ExpansionConfig;
use crate::model::{CandidateId, CandidateSet, ExpansionPass};
use crate::source::{FamilyDetail, FamilyMember, RegistryLookup, SourceError};
use std::sync::Arc;

/// Provenance label for candidates found through family links.
pub const FAMILY_SOURCE: &str = "family";
/// Provenance label for candidates found through citations.
pub const CITATION_SOURCE: &str = "citation";

/// Outcome of one expansion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    /// Lookups issued, successful or not.
    pub lookups: usize,
    pub failed: usize,
    /// Candidates new to the set.
    pub added: usize,
}

/// International publications among the members' publication references.
pub fn sibling_publications(members: &[FamilyMember]) -> Vec<CandidateId> {
    members
        .iter()
        .flat_map(|m| m.publication.iter())
        .filter(|d| d.country == "WO")
        .filter_map(|d| d.candidate_id())
        .collect()
}

pub struct GraphExpander {
    lookup: Arc<dyn RegistryLookup>,
    priority_frontier: usize,
    citation_frontier: usize,
}

impl GraphExpander {
    pub fn new(lookup: Arc<dyn RegistryLookup>, config: &ExpansionConfig) -> Self {
        Self {
            lookup,
            priority_frontier: config.priority_frontier,
            citation_frontier: config.effective_citation_frontier(),
        }
    }

    pub async fn expand_priority(
        &self,
        candidates: &mut CandidateSet,
        state: &SearchState,
        cancel: &CancellationToken,
    ) -> ExpansionReport {
        let frontier = candidates.frontier(self.priority_frontier);
        self.pass(
            candidates,
            frontier,
            ExpansionPass::PriorityExpansion,
            FAMILY_SOURCE,
            state,
            cancel,
        )
        .await
    }

    pub async fn expand_citations(
        &self,
        candidates: &mut CandidateSet,
        state: &SearchState,
        cancel: &CancellationToken,
    ) -> ExpansionReport {
        let frontier = candidates.frontier(self.citation_frontier);
        self.pass(
            candidates,
            frontier,
            ExpansionPass::CitationExpansion,
            CITATION_SOURCE,
            state,
            cancel,
        )
        .await
    }

    async fn neighbours(&self, id: &CandidateId, pass: ExpansionPass) -> Result<Vec<CandidateId>, SourceError> {
        match pass {
            ExpansionPass::CitationExpansion => self.lookup.citing(id).await,
            _ => {
                let members = self.lookup.family(id, FamilyDetail::Plain).await?;
                Ok(sibling_publications(&members))
            }
        }
    }

    async fn pass(
        &self,
        candidates: &mut CandidateSet,
        frontier: Vec<CandidateId>,
        pass: ExpansionPass,
        label: &str,
        state: &SearchState,
        cancel: &CancellationToken,
    ) -> ExpansionReport {
        let source = self.lookup.id();
        let mut report = ExpansionReport::default();

        for id in frontier {
            if cancel.is_cancelled() {
                break;
            }
            let query = format!("{} {}", label, id);
            if state.is_disabled(source) {
                state.record_skip(source, &query, "source disabled");
                continue;
            }

            report.lookups += 1;
            match self.neighbours(&id, pass).await {
                Ok(found) => {
                    state.record(source, &query, Ok(found.len()));
                    for neighbour in found {
                        if candidates.insert(neighbour, label, pass) {
                            report.added += 1;
                        }
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    state.record(source, &query, Err(&e));
                    if e.is_auth() {
                        tracing::warn!(source, error = %e, "disabling registry lookups");
                        state.disable(source);
                    } else {
                        tracing::debug!(candidate = %id, error = %e, "expansion lookup skipped");
                    }
                }
            }
        }

        state.observe_count(label, candidates.count_by_source().get(label).copied().unwrap_or(0));
        tracing::info!(
            pass = pass.as_str(),
            lookups = report.lookups,
            added = report.added,
            total = candidates.len(),
            "expansion pass finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DocumentId, MockRegistry};

    fn id(raw: &str) -> CandidateId {
        CandidateId::parse(raw).unwrap()
    }

    fn seeded(ids: &[&str]) -> CandidateSet {
        let mut set = CandidateSet::new();
        for raw in ids {
            set.insert(id(raw), "registry", ExpansionPass::Seed);
        }
        set
    }

    fn config(k: usize, k2: usize) -> ExpansionConfig {
        ExpansionConfig {
            priority_frontier: k,
            citation_frontier: k2,
        }
    }

    #[tokio::test]
    async fn family_siblings_join_the_set() {
        let registry = MockRegistry::new().with_family(
            "WO2011051540",
            vec![
                FamilyMember::published_as("WO", "2011051540"),
                FamilyMember::published_as("WO", "2012134273"),
                FamilyMember::published_as("BR", "112012008823"),
            ],
        );
        let expander = GraphExpander::new(Arc::new(registry), &config(15, 10));
        let mut set = seeded(&["WO2011051540"]);

        let report = expander
            .expand_priority(&mut set, &SearchState::new(), &CancellationToken::new())
            .await;

        let ids: Vec<_> = set.ids().map(|c| c.as_str().to_string()).collect();
        assert_eq!(ids, vec!["WO2011051540", "WO2012134273"]);
        assert_eq!(report.added, 1);
        assert_eq!(set.get(&id("WO2012134273")).unwrap().pass, ExpansionPass::PriorityExpansion);
    }

    #[tokio::test]
    async fn priority_claims_are_not_siblings() {
        let mut member = FamilyMember::published_as("WO", "2011051540");
        member.priority_claims = vec![DocumentId::new("WO", "2009999999")];
        let registry = MockRegistry::new().with_family("WO2011051540", vec![member]);
        let expander = GraphExpander::new(Arc::new(registry), &config(15, 10));
        let mut set = seeded(&["WO2011051540"]);

        expander
            .expand_priority(&mut set, &SearchState::new(), &CancellationToken::new())
            .await;
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn lookups_bounded_by_frontier() {
        let registry = Arc::new(MockRegistry::new());
        let expander = GraphExpander::new(registry.clone(), &config(3, 2));
        let mut set = seeded(&[
            "WO2011000001",
            "WO2011000002",
            "WO2011000003",
            "WO2011000004",
            "WO2011000005",
        ]);
        let state = SearchState::new();
        let cancel = CancellationToken::new();

        let p = expander.expand_priority(&mut set, &state, &cancel).await;
        let c = expander.expand_citations(&mut set, &state, &cancel).await;

        assert_eq!(p.lookups, 3);
        assert_eq!(c.lookups, 2);
        assert_eq!(registry.family_calls(), 3);
        assert_eq!(registry.citing_calls(), 2);
    }

    #[tokio::test]
    async fn new_candidates_are_not_expanded_in_the_same_pass() {
        let registry = Arc::new(
            MockRegistry::new()
                .with_family("WO2011051540", vec![FamilyMember::published_as("WO", "2012134273")])
                .with_family("WO2012134273", vec![FamilyMember::published_as("WO", "2014000001")]),
        );
        let expander = GraphExpander::new(registry.clone(), &config(15, 10));
        let mut set = seeded(&["WO2011051540"]);

        expander
            .expand_priority(&mut set, &SearchState::new(), &CancellationToken::new())
            .await;
        assert_eq!(set.len(), 2);
        assert_eq!(registry.family_calls(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_is_skipped() {
        let registry = MockRegistry::new()
            .with_family_error("WO2011000001", SourceError::Transient("timeout".into()))
            .with_family("WO2011000002", vec![FamilyMember::published_as("WO", "2013000009")]);
        let expander = GraphExpander::new(Arc::new(registry), &config(15, 10));
        let mut set = seeded(&["WO2011000001", "WO2011000002"]);
        let state = SearchState::new();

        let report = expander
            .expand_priority(&mut set, &state, &CancellationToken::new())
            .await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.added, 1);
        assert_eq!(state.snapshot().failed_queries(), 1);
    }

    #[tokio::test]
    async fn citations_join_with_their_own_provenance() {
        let registry = MockRegistry::new().with_citing("WO2011051540", &["WO2016162604"]);
        let expander = GraphExpander::new(Arc::new(registry), &config(15, 10));
        let mut set = seeded(&["WO2011051540"]);

        expander
            .expand_citations(&mut set, &SearchState::new(), &CancellationToken::new())
            .await;
        let found = set.get(&id("WO2016162604")).unwrap();
        assert_eq!(found.pass, ExpansionPass::CitationExpansion);
        assert!(found.sources.contains(CITATION_SOURCE));
    }
}
