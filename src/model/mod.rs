//! Core data model for a patent discovery run
//!
//! Every value here is created fresh per search and discarded once the
//! result object has been returned.

mod candidate;
mod context;
mod enrichment;
mod patent;

pub use candidate::{Candidate, CandidateId, CandidateSet, ExpansionPass};
pub use context::QueryContext;
pub use enrichment::{ChemicalIdentifiers, EnrichmentRecord, PatentTypeHint, TermSet};
pub use patent::{CountryPatentRecord, ReferenceLinks};
