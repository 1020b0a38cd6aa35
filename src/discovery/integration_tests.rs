//! End-to-end discovery scenarios against scripted sources

#[cfg(test)]
mod tests {
    use crate::config::ExpansionConfig;
    use crate::discovery::{
        CancellationToken, DiscoveryEngine, GraphExpander, MetadataCompleter, PatentMap,
        SearchFault, SearchOrchestrator, SearchPhase, SearchState,
    };
    use crate::enrichment::{MockFactSource, SourceFacts, TrialRecord};
    use crate::model::{CandidateId, CandidateSet, CountryPatentRecord, ExpansionPass, QueryContext};
    use crate::query::{Query, QueryCategory, QuerySet, Surface};
    use crate::source::{
        Bibliography, FamilyMember, LocalizedText, MockRegistry, MockSearch, SearchAdapter, SourceError,
    };
    use async_trait::async_trait;
    use std::collections::{BTreeSet, HashSet};
    use std::sync::Arc;

    fn id(raw: &str) -> CandidateId {
        CandidateId::parse(raw).unwrap()
    }

    fn darolutamide(countries: &[&str]) -> QueryContext {
        QueryContext::new("darolutamide")
            .with_brand("Nubeqa")
            .with_countries(countries.iter().copied())
    }

    fn facts() -> SourceFacts {
        SourceFacts {
            names: vec!["ODM-201".into(), "BAY-1841788".into(), "Darolutamide".into()],
            brands: vec!["Nubeqa".into()],
            sponsors: vec!["Bayer HealthCare Pharmaceuticals Inc.".into()],
            trials: vec![TrialRecord {
                conditions: vec!["Prostate Cancer".into()],
                sponsor: Some("Bayer".into()),
                phases: vec!["PHASE3".into()],
            }],
            texts: vec!["Darolutamide is an androgen receptor antagonist".into()],
            ..Default::default()
        }
    }

    fn en_title(text: &str) -> LocalizedText {
        LocalizedText {
            lang: Some("en".into()),
            text: text.into(),
        }
    }

    // ================================================================
    // Scenarios
    // ================================================================

    // === Scenario: enrichment drives query synthesis ===
    #[tokio::test]
    async fn enrichment_terms_become_queries() {
        let orchestrator = SearchOrchestrator::builder()
            .fact_source(Arc::new(MockFactSource::answering("chemical_names", facts())))
            .build();

        let (record, queries) = orchestrator.plan(&darolutamide(&["BR"])).await;

        assert!(record.dev_codes.contains("ODM-201"));
        assert!(record.mechanisms.contains("androgen receptor antagonist"));
        assert!(queries.contains_text("txt=\"darolutamide\""));
        assert!(queries.contains_text("txt=\"ODM-201\""));
        assert!(queries.contains_text("txt=\"androgen receptor antagonist\""));
        assert!(queries
            .iter()
            .any(|q| q.category == QueryCategory::Classification && q.text.contains("A61K31/44")));
    }

    // === Scenario: family expansion adds a sibling ===
    #[tokio::test]
    async fn family_sibling_joins_candidates() {
        let registry = Arc::new(
            MockRegistry::new()
                .with_default_search(&["WO2011051540"])
                .with_family(
                    "WO2011051540",
                    vec![
                        FamilyMember::published_as("WO", "2011051540"),
                        FamilyMember::published_as("WO", "2012134273"),
                    ],
                ),
        );
        let orchestrator = SearchOrchestrator::builder().registry(registry).build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        let ids: Vec<&str> = result.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["WO2011051540", "WO2012134273"]);
        let sibling = result.candidates.iter().find(|c| c.id == id("WO2012134273")).unwrap();
        assert_eq!(sibling.pass, ExpansionPass::PriorityExpansion);
        assert!(result.fault.is_none());
    }

    // === Scenario: case variants from two adapters collapse ===
    #[tokio::test]
    async fn case_variants_across_adapters_collapse() {
        let first = MockSearch::new("first", Surface::Registry).with_default_results(&["WO2011051540"]);
        let second = MockSearch::new("second", Surface::Registry).with_default_results(&["wo2011051540"]);
        let orchestrator = SearchOrchestrator::builder()
            .adapter(Arc::new(first))
            .adapter(Arc::new(second))
            .build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].id.as_str(), "WO2011051540");
        assert_eq!(result.candidates[0].sources.len(), 2);
        assert_eq!(result.summary.candidates_by_source["first"], 1);
        assert_eq!(result.summary.candidates_by_source["second"], 1);
    }

    // === Scenario: only target countries are resolved ===
    #[tokio::test]
    async fn resolution_keeps_target_countries_only() {
        let registry = Arc::new(
            MockRegistry::new()
                .with_search("txt=\"darolutamide\"", &["WO2011051540"])
                .with_family(
                    "WO2011051540",
                    vec![
                        FamilyMember::published_as("BR", "112012008823"),
                        FamilyMember::published_as("US", "8975254"),
                    ],
                ),
        );
        let orchestrator = SearchOrchestrator::builder().registry(registry).build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        assert_eq!(result.patents_by_country.len(), 1);
        assert_eq!(result.patents_by_country["BR"].len(), 1);
        assert_eq!(result.patents_by_country["BR"][0].patent_number, "BR112012008823");
        assert_eq!(result.summary.total_patents, 1);
    }

    // === Scenario: three of ten queries time out ===
    #[tokio::test]
    async fn partial_query_failures_are_logged_and_skipped() {
        let mut queries = QuerySet::new();
        for n in 0..10 {
            queries.push(Query::registry(format!("txt=\"term{}\"", n), QueryCategory::Core));
        }
        let mut surface = MockSearch::new("registry", Surface::Registry).with_default_results(&["WO2011051540"]);
        for n in [2, 5, 8] {
            surface = surface.with_failure(format!("txt=\"term{}\"", n), SourceError::Transient("timeout".into()));
        }
        let engine = DiscoveryEngine::new(vec![Arc::new(surface)]);
        let state = SearchState::new();

        let found = engine.run(&queries, &state, &CancellationToken::new()).await;

        assert!(!found.is_empty());
        let snap = state.snapshot();
        assert_eq!(snap.failed_queries(), 3);
        assert_eq!(snap.successful_queries(), 7);
        assert!(snap.disabled_sources.is_empty());
    }

    // === Scenario: completion fills gaps without overwriting ===
    #[tokio::test]
    async fn completion_keeps_populated_applicants() {
        let registry = Arc::new(
            MockRegistry::new()
                .with_search("txt=\"darolutamide\"", &["WO2011051540"])
                .with_family(
                    "WO2011051540",
                    vec![FamilyMember::published_as("BR", "112012008823").with_biblio(Bibliography {
                        applicants: vec!["Orion".into()],
                        ..Default::default()
                    })],
                )
                .with_publication(
                    "BR112012008823",
                    Bibliography {
                        titles: vec![en_title("X")],
                        applicants: vec!["Orion Corp".into()],
                        ..Default::default()
                    },
                ),
        );
        let orchestrator = SearchOrchestrator::builder().registry(registry.clone()).build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        let record = &result.patents_by_country["BR"][0];
        assert_eq!(record.title.as_deref(), Some("X"));
        assert_eq!(record.applicants, vec!["Orion".to_string()]);
        assert_eq!(registry.publication_calls(), 1);
        assert!(result.intelligence.companies.contains(&"Orion".to_string()));
    }

    // ================================================================
    // Degradation
    // ================================================================

    #[tokio::test]
    async fn auth_failure_on_registry_leaves_web_running() {
        let registry = Arc::new(MockRegistry::new().failing_with(SourceError::Auth("bad key".into())));
        let web = MockSearch::new("web", Surface::Web).with_default_results(&["WO2016162604"]);
        let orchestrator = SearchOrchestrator::builder()
            .registry(registry.clone())
            .adapter(Arc::new(web))
            .build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        assert!(result.fault.is_none());
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(registry.search_calls(), 1);
        assert!(result.state.disabled_sources.contains("registry"));
        // Lookups share the registry id and stay disabled.
        assert_eq!(registry.family_calls(), 0);
    }

    #[tokio::test]
    async fn every_surface_failing_faults_the_result() {
        let registry = Arc::new(MockRegistry::new().failing_with(SourceError::Auth("bad key".into())));
        let web = MockSearch::new("web", Surface::Web).failing_with(SourceError::Transient("blocked".into()));
        let orchestrator = SearchOrchestrator::builder()
            .registry(registry.clone())
            .adapter(Arc::new(web))
            .build();

        let result = orchestrator.search(darolutamide(&["BR", "MX"])).await;

        assert_eq!(result.fault, Some(SearchFault::AllSourcesFailed));
        assert!(result.candidates.is_empty());
        assert_eq!(registry.family_calls(), 0);
        assert!(result.patents_by_country["BR"].is_empty());
        assert!(result.patents_by_country["MX"].is_empty());
        assert_eq!(result.state.phase, SearchPhase::Done);
    }

    #[tokio::test]
    async fn failing_fact_source_is_logged_and_others_used() {
        let orchestrator = SearchOrchestrator::builder()
            .fact_source(Arc::new(MockFactSource::failing(
                "trials",
                SourceError::Transient("503".into()),
            )))
            .fact_source(Arc::new(MockFactSource::answering("chemical_names", facts())))
            .adapter(Arc::new(MockSearch::new("web", Surface::Web)))
            .build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        let failed: Vec<_> = result
            .state
            .query_log
            .iter()
            .filter(|e| e.outcome.is_failure())
            .map(|e| e.source.as_str())
            .collect();
        assert_eq!(failed, vec!["trials"]);
        assert_eq!(result.intelligence.enrichment.sources_used, vec!["chemical_names".to_string()]);
        assert!(result
            .intelligence
            .companies
            .iter()
            .any(|c| c.starts_with("Bayer HealthCare")));
    }

    #[tokio::test]
    async fn cancelled_search_merges_and_reports_phase() {
        let registry = Arc::new(MockRegistry::new().with_default_search(&["WO2011051540"]));
        let orchestrator = SearchOrchestrator::builder().registry(registry.clone()).build();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let state = SearchState::new();
        let result = orchestrator
            .search_with(darolutamide(&["BR"]), state.clone(), &cancel)
            .await;

        assert_eq!(
            result.fault,
            Some(SearchFault::Cancelled {
                phase: SearchPhase::Enriching
            })
        );
        assert_eq!(registry.search_calls(), 0);
        assert!(result.patents_by_country.contains_key("BR"));
        assert!(state.snapshot().is_complete(SearchPhase::Merging));
    }

    /// Web surface that cancels the run on its first query and still
    /// reports what it found.
    struct CancellingSearch {
        cancel: CancellationToken,
    }

    #[async_trait]
    impl SearchAdapter for CancellingSearch {
        fn id(&self) -> &str {
            "web"
        }

        fn surface(&self) -> Surface {
            Surface::Web
        }

        async fn search(&self, _query: &Query) -> Result<BTreeSet<CandidateId>, SourceError> {
            self.cancel.cancel();
            Ok([id("WO2011051540")].into_iter().collect())
        }
    }

    #[tokio::test]
    async fn cancellation_mid_search_names_the_interrupted_phase() {
        let cancel = CancellationToken::new();
        let registry = Arc::new(MockRegistry::new());
        let orchestrator = SearchOrchestrator::builder()
            .lookup(registry.clone())
            .adapter(Arc::new(CancellingSearch {
                cancel: cancel.clone(),
            }))
            .build();

        let result = orchestrator
            .search_with(darolutamide(&["BR"]), SearchState::new(), &cancel)
            .await;

        assert_eq!(
            result.fault,
            Some(SearchFault::Cancelled {
                phase: SearchPhase::Searching
            })
        );
        assert_eq!(
            result.state.completed_phases,
            vec![SearchPhase::Enriching, SearchPhase::Synthesizing, SearchPhase::Merging]
        );
        assert_eq!(registry.family_calls(), 0);
        assert_eq!(result.candidates.len(), 1);
    }

    #[tokio::test]
    async fn phases_complete_in_order() {
        let registry = Arc::new(MockRegistry::new().with_default_search(&["WO2011051540"]));
        let orchestrator = SearchOrchestrator::builder().registry(registry).build();

        let result = orchestrator.search(darolutamide(&["BR"])).await;

        assert_eq!(
            result.state.completed_phases,
            vec![
                SearchPhase::Enriching,
                SearchPhase::Synthesizing,
                SearchPhase::Searching,
                SearchPhase::ExpandingPriority,
                SearchPhase::ExpandingCitation,
                SearchPhase::ResolvingCountries,
                SearchPhase::CompletingMetadata,
                SearchPhase::Merging,
            ]
        );
        assert!(result.finished_at >= result.started_at);
    }

    // ================================================================
    // Properties
    // ================================================================

    fn seeded(ids: &[&str]) -> CandidateSet {
        let mut set = CandidateSet::new();
        for raw in ids {
            set.insert(id(raw), "registry", ExpansionPass::Seed);
        }
        set
    }

    fn expansion(k: usize, k2: usize) -> ExpansionConfig {
        ExpansionConfig {
            priority_frontier: k,
            citation_frontier: k2,
        }
    }

    #[tokio::test]
    async fn expansion_reaches_a_fixed_point() {
        let registry = MockRegistry::new()
            .with_family(
                "WO2011051540",
                vec![
                    FamilyMember::published_as("WO", "2011051540"),
                    FamilyMember::published_as("WO", "2012134273"),
                ],
            )
            .with_family("WO2012134273", vec![FamilyMember::published_as("WO", "2011051540")]);
        let expander = GraphExpander::new(Arc::new(registry), &expansion(15, 10));
        let mut set = seeded(&["WO2011051540"]);
        let state = SearchState::new();
        let cancel = CancellationToken::new();

        expander.expand_priority(&mut set, &state, &cancel).await;
        expander.expand_priority(&mut set, &state, &cancel).await;
        let before = set.len();
        let again = expander.expand_priority(&mut set, &state, &cancel).await;

        assert_eq!(again.added, 0);
        assert_eq!(set.len(), before);
    }

    #[tokio::test]
    async fn candidate_count_never_shrinks_and_cost_is_bounded() {
        let registry = Arc::new(
            MockRegistry::new()
                .with_family("WO2011000001", vec![FamilyMember::published_as("WO", "2012000001")])
                .with_citing("WO2011000002", &["WO2015000001", "WO2015000002"]),
        );
        let expander = GraphExpander::new(registry.clone(), &expansion(2, 3));
        let mut set = seeded(&[
            "WO2011000001",
            "WO2011000002",
            "WO2011000003",
            "WO2011000004",
            "WO2011000005",
            "WO2011000006",
        ]);
        let state = SearchState::new();
        let cancel = CancellationToken::new();

        let start = set.len();
        let priority = expander.expand_priority(&mut set, &state, &cancel).await;
        let after_priority = set.len();
        let citation = expander.expand_citations(&mut set, &state, &cancel).await;

        assert!(after_priority >= start);
        assert!(set.len() >= after_priority);
        assert!(priority.lookups <= 2);
        // Citation frontier is clamped to the priority frontier.
        assert!(citation.lookups <= 2);
        assert_eq!(registry.family_calls(), 2);
        assert_eq!(set.len(), 9);
    }

    #[tokio::test]
    async fn patents_are_unique_and_filed_under_their_country() {
        let shared = vec![
            FamilyMember::published_as("BR", "112012008823"),
            FamilyMember::published_as("US", "8975254"),
            FamilyMember::published_as("EP", "2493858"),
        ];
        let registry = Arc::new(
            MockRegistry::new()
                .with_search("txt=\"darolutamide\"", &["WO2011051540", "WO2012134273"])
                .with_family("WO2011051540", shared.clone())
                .with_family("WO2012134273", shared),
        );
        let orchestrator = SearchOrchestrator::builder().registry(registry).build();

        let result = orchestrator.search(darolutamide(&["BR", "US"])).await;

        for (country, records) in &result.patents_by_country {
            let numbers: HashSet<&str> = records.iter().map(|r| r.patent_number.as_str()).collect();
            assert_eq!(numbers.len(), records.len());
            assert!(records.iter().all(|r| &r.country == country));
        }
        assert!(!result.patents_by_country.contains_key("EP"));
        assert_eq!(result.summary.patents_by_country["BR"], 1);
        assert_eq!(result.summary.patents_by_country["US"], 1);
    }

    #[tokio::test]
    async fn synthesized_queries_are_case_insensitively_unique() {
        let mut noisy = facts();
        noisy.names.extend(["DAROLUTAMIDE".into(), "odm-201".into(), "NUBEQA".into()]);
        let orchestrator = SearchOrchestrator::builder()
            .fact_source(Arc::new(MockFactSource::answering("chemical_names", noisy)))
            .build();

        let (_, queries) = orchestrator.plan(&darolutamide(&["BR"])).await;

        let lowered: Vec<String> = queries.iter().map(|q| q.text.to_lowercase()).collect();
        let unique: HashSet<&String> = lowered.iter().collect();
        assert_eq!(unique.len(), lowered.len());
    }

    #[tokio::test]
    async fn completion_never_empties_a_field() {
        let mut record = CountryPatentRecord::new("BR112012008823", "BR", id("WO2011051540"));
        record.title = Some("Compounds".into());
        record.applicants = vec!["Orion".into()];

        let registry = MockRegistry::new().with_publication("BR112012008823", Bibliography::default());
        let mut patents = PatentMap::new();
        patents.insert("BR".into(), vec![record.clone()]);

        MetadataCompleter::new(Arc::new(registry))
            .complete(&mut patents, &SearchState::new(), &CancellationToken::new())
            .await;

        assert_eq!(patents["BR"][0].title, record.title);
        assert_eq!(patents["BR"][0].applicants, record.applicants);
    }
}
