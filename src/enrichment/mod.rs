//! Molecule enrichment
//!
//! Before any patent search runs, independent fact sources are asked what
//! they know about the molecule: names, identifiers, sponsors, trials and
//! literature. The aggregator classifies those raw facts through one
//! ordered [`Taxonomy`] and produces the [`EnrichmentRecord`](crate::model::EnrichmentRecord)
//! that drives query synthesis.

mod aggregator;
pub mod sources;
mod taxonomy;

pub use aggregator::{Enrichment, EnrichmentAggregator, FactReport, FactSourceRegistry};
pub use sources::{
    http_sources, ChemicalNameSource, DrugApplicationSource, FactSource, LiteratureSource,
    MockFactSource, SourceFacts, TrialRecord, TrialRegistrySource,
};
pub use taxonomy::{area_keyword, Taxonomy, TermKind, GENERAL_AREA};
