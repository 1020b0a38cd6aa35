//! Enrichment aggregator
//!
//! Fans out to every registered fact source concurrently, isolates each
//! source's failure, and folds the raw facts into one classified,
//! capped [`EnrichmentRecord`].

use super::sources::{FactSource, SourceFacts};
use super::taxonomy::{Taxonomy, TermKind};
use crate::config::EnrichmentLimits;
use crate::model::{EnrichmentRecord, QueryContext, TermSet};
use crate::source::rate::{NoDelay, RateGate};
use crate::source::SourceError;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// Registry of fact sources, deduplicated by `id()`.
pub struct FactSourceRegistry {
    sources: Vec<Arc<dyn FactSource>>,
}

impl FactSourceRegistry {
    pub fn new(sources: Vec<Arc<dyn FactSource>>) -> Self {
        let mut seen = HashSet::new();
        let sources = sources
            .into_iter()
            .filter(|s| seen.insert(s.id().to_string()))
            .collect();
        Self { sources }
    }

    pub fn empty() -> Self {
        Self { sources: Vec::new() }
    }

    pub fn sources(&self) -> &[Arc<dyn FactSource>] {
        &self.sources
    }
}

/// How one fact source fared.
#[derive(Debug, Clone)]
pub struct FactReport {
    pub source: String,
    /// Raw facts returned; zero on failure.
    pub facts: usize,
    pub error: Option<SourceError>,
}

/// Aggregation output: the record plus per-source reports.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub record: EnrichmentRecord,
    pub reports: Vec<FactReport>,
}

pub struct EnrichmentAggregator {
    registry: FactSourceRegistry,
    limits: EnrichmentLimits,
    gate: Arc<dyn RateGate>,
}

impl EnrichmentAggregator {
    pub fn new(registry: FactSourceRegistry, limits: EnrichmentLimits) -> Self {
        Self {
            registry,
            limits,
            gate: Arc::new(NoDelay),
        }
    }

    /// Space out the start of each source call.
    pub fn with_gate(mut self, gate: Arc<dyn RateGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn registry(&self) -> &FactSourceRegistry {
        &self.registry
    }

    /// Query every source and build the record. Never fails; a failing
    /// source contributes nothing and is reported.
    pub async fn enrich(&self, context: &QueryContext) -> Enrichment {
        let molecule = context.molecule();
        let brand = context.brand();

        let calls = self.registry.sources().iter().map(|source| {
            let gate = Arc::clone(&self.gate);
            async move {
                gate.wait().await;
                (source.id().to_string(), source.lookup(molecule, brand).await)
            }
        });
        let outcomes = join_all(calls).await;

        let mut answered = Vec::new();
        let mut reports = Vec::with_capacity(outcomes.len());
        for (source, outcome) in outcomes {
            match outcome {
                Ok(facts) => {
                    tracing::debug!(source = %source, names = facts.names.len(), "fact source answered");
                    reports.push(FactReport {
                        source: source.clone(),
                        facts: count_facts(&facts),
                        error: None,
                    });
                    answered.push((source, facts));
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "fact source failed");
                    reports.push(FactReport {
                        source,
                        facts: 0,
                        error: Some(e),
                    });
                }
            }
        }

        let record = self.fold(context, answered);
        tracing::info!(
            molecule,
            terms = record.total_terms(),
            sources = record.sources_used.len(),
            "enrichment complete"
        );
        Enrichment { record, reports }
    }

    /// Classify and cap the raw facts of the sources that answered.
    fn fold(&self, context: &QueryContext, answered: Vec<(String, SourceFacts)>) -> EnrichmentRecord {
        let taxonomy = Taxonomy::standard();
        let limits = &self.limits;
        let mut record = EnrichmentRecord {
            synonyms: TermSet::bounded(limits.synonyms, limits.max_term_len),
            dev_codes: TermSet::bounded(limits.dev_codes, limits.max_term_len),
            registry_numbers: TermSet::bounded(limits.registry_numbers, limits.max_term_len),
            companies: TermSet::bounded(limits.companies, limits.max_company_len),
            mechanisms: TermSet::bounded(limits.mechanisms, limits.max_term_len),
            indications: TermSet::bounded(limits.indications, limits.max_term_len),
            ..Default::default()
        };

        let mut names: Vec<&str> = Vec::new();
        let mut texts: Vec<&str> = Vec::new();
        let mut conditions: Vec<&str> = Vec::new();

        for (source, facts) in &answered {
            record.sources_used.push(source.clone());
            record.chemical.fill_from(&facts.chemical);
            names.extend(facts.names.iter().map(String::as_str));
            names.extend(facts.brands.iter().map(String::as_str));
            texts.extend(facts.texts.iter().map(String::as_str));
            for trial in &facts.trials {
                conditions.extend(trial.conditions.iter().map(String::as_str));
            }
            record.companies.extend(&facts.sponsors);
        }

        for name in &names {
            let name = name.trim();
            if name.eq_ignore_ascii_case(context.molecule()) {
                continue;
            }
            match taxonomy.classify(name) {
                TermKind::ChemicalId => {
                    if record.chemical.inchi_key.is_none() {
                        record.chemical.inchi_key = Some(name.to_string());
                    }
                }
                TermKind::RegistryNumber => {
                    record.registry_numbers.insert(name);
                }
                TermKind::DevCode => {
                    record.dev_codes.insert(name);
                }
                TermKind::Synonym => {
                    record.synonyms.insert(name);
                }
            }
        }

        let mechanism_input = record
            .synonyms
            .iter()
            .chain(texts.iter().copied())
            .collect::<Vec<_>>();
        record
            .mechanisms
            .extend(taxonomy.detect_mechanisms(mechanism_input));

        let indication_input = conditions.iter().chain(texts.iter()).copied();
        record
            .indications
            .extend(taxonomy.detect_indications(indication_input));

        if !record.indications.is_empty() {
            record.therapeutic_area =
                Some(taxonomy.therapeutic_area(record.indications.as_slice()).to_string());
        }
        record.patent_types = taxonomy.patent_types(names.iter().copied());
        record
    }
}

fn count_facts(facts: &SourceFacts) -> usize {
    facts.names.len()
        + facts.brands.len()
        + facts.sponsors.len()
        + facts.trials.len()
        + facts.texts.len()
        + usize::from(!facts.chemical.is_empty())
}
