//! Shared fixtures for the pipeline tests
//!
//! A scripted "darolutamide" world: one fact source, a registry with a
//! small family graph, and a canned web page.

pub mod fixtures;

pub use fixtures::{darolutamide_facts, darolutamide_registry, CannedFetcher, BR_PATENT, SEED, SIBLING};
