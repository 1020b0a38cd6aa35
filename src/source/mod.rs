//! External search surfaces
//!
//! Adapters for the patent registry and the web search surface, the error
//! taxonomy they share, decoded registry payloads, and call pacing.
//! Payloads are decoded once, here, into explicit typed structures; the
//! discovery pipeline never sees raw JSON or markup.

mod error;
pub mod http;
pub mod mock;
pub mod payload;
pub mod rate;
mod registry;
mod traits;
mod web;

pub use error::SourceError;
pub use mock::{MockCall, MockRegistry, MockSearch};
pub use rate::{gate_for, FixedIntervalGate, NoDelay, RateGate};
pub use registry::OpsRegistry;
pub use traits::{
    Bibliography, DocumentId, FamilyDetail, FamilyMember, LocalizedText, RegistryLookup,
    SearchAdapter,
};
pub use web::{extract_ids, HttpMarkupFetcher, MarkupFetcher, WebSearchAdapter};
