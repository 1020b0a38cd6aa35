//! Patent discovery pipeline
//!
//! One search runs these components in order, each reading and extending
//! the shared [`SearchState`]:
//!
//! - **DiscoveryEngine**: sends the synthesized queries to every search
//!   surface and collects seed candidates
//! - **GraphExpander**: bounded family and citation expansion
//! - **CountryResolver**: turns international candidates into per-country
//!   patent records
//! - **MetadataCompleter**: point lookups for records with gaps
//! - **ResultMerger**: final dedup and summary counts
//!
//! [`SearchOrchestrator`] wires them together with enrichment and query
//! synthesis.
//!
//! # Example
//!
//! ```ignore
//! use patfinder::discovery::SearchOrchestrator;
//! use patfinder::model::QueryContext;
//!
//! let orchestrator = SearchOrchestrator::live(&config)?;
//! let context = QueryContext::new("darolutamide")
//!     .with_brand("Nubeqa")
//!     .with_countries(["BR"]);
//! let result = orchestrator.search(context).await;
//! for patent in result.all_patents() {
//!     println!("{} {:?}", patent.patent_number, patent.title);
//! }
//! ```

mod cancel;
mod completer;
mod engine;
mod expander;
#[cfg(test)]
mod integration_tests;
mod merger;
mod orchestrator;
mod resolver;
mod state;
mod types;

pub use cancel::CancellationToken;
pub use completer::{CompletionReport, MetadataCompleter};
pub use engine::DiscoveryEngine;
pub use expander::{sibling_publications, ExpansionReport, GraphExpander, CITATION_SOURCE, FAMILY_SOURCE};
pub use merger::{applicants, ResultMerger};
pub use orchestrator::{SearchOrchestrator, SearchOrchestratorBuilder};
pub use resolver::{apply_bibliography, build_record, CountryResolver};
pub use state::{QueryLogEntry, QueryOutcome, SearchState, StateSnapshot};
pub use types::{
    IntelligenceSummary, PatentMap, ResultSummary, SearchFault, SearchPhase, SearchResult,
};
