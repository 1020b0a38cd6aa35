//! Patfinder: pharmaceutical patent discovery engine
//!
//! Given a molecule name, an optional brand name and a set of target
//! countries, finds the international patent publications related to the
//! molecule and the national patents they turned into.
//!
//! # Pipeline
//!
//! - **Enrichment**: fact sources are queried concurrently for synonyms,
//!   development codes, sponsors, mechanisms and indications
//! - **Query synthesis**: the enrichment record becomes a deduplicated,
//!   categorized query list for the registry and web surfaces
//! - **Discovery**: queries run against every surface; family and citation
//!   links widen the candidate set within fixed frontiers
//! - **Resolution**: international candidates are resolved into per-country
//!   patent records, and records with gaps get a point lookup
//!
//! # Example
//!
//! ```no_run
//! use patfinder::{QueryContext, SearchConfig, SearchOrchestrator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchConfig::load(&SearchConfig::default_path()?)?;
//! let orchestrator = SearchOrchestrator::live(&config)?;
//! let context = QueryContext::new("darolutamide").with_countries(["BR", "MX"]);
//! let result = orchestrator.search(context).await;
//! println!("{} patents", result.summary.total_patents);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod enrichment;
pub mod model;
pub mod query;
pub mod source;

pub use config::{ConfigError, SearchConfig};
pub use discovery::{CancellationToken, SearchFault, SearchOrchestrator, SearchResult, SearchState};
pub use model::{CandidateId, CountryPatentRecord, EnrichmentRecord, QueryContext};
pub use source::SourceError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
