//! Query synthesis
//!
//! Converts an enrichment record into a categorized, deduplicated list of
//! search queries. Classification-code tables live in [`classification`].

pub mod classification;
mod synthesizer;
mod types;

pub use synthesizer::{clean_term, is_valid_term, looks_like_company, QuerySynthesizer};
pub use types::{Query, QueryCategory, QuerySet, Surface};
