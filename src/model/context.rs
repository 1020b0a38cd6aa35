//! Query context for a single search

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The caller-supplied subject of a search. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    molecule: String,
    brand: Option<String>,
    target_countries: BTreeSet<String>,
}

impl QueryContext {
    /// Create a context for a molecule. Surrounding whitespace is trimmed.
    pub fn new(molecule: impl Into<String>) -> Self {
        Self {
            molecule: molecule.into().trim().to_string(),
            brand: None,
            target_countries: BTreeSet::new(),
        }
    }

    /// Attach a brand name. Blank names are ignored.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        let brand = brand.into().trim().to_string();
        self.brand = if brand.is_empty() { None } else { Some(brand) };
        self
    }

    /// Add target country codes (upper-cased, blanks dropped).
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.target_countries.extend(
            countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty()),
        );
        self
    }

    pub fn molecule(&self) -> &str {
        &self.molecule
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn target_countries(&self) -> &BTreeSet<String> {
        &self.target_countries
    }

    pub fn targets(&self, country: &str) -> bool {
        self.target_countries.contains(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countries_are_normalized_and_deduplicated() {
        let ctx = QueryContext::new(" darolutamide ").with_countries(["br", "BR", " us ", ""]);
        assert_eq!(ctx.molecule(), "darolutamide");
        assert_eq!(ctx.target_countries().len(), 2);
        assert!(ctx.targets("BR"));
        assert!(ctx.targets("US"));
    }

    #[test]
    fn blank_brand_is_none() {
        let ctx = QueryContext::new("x").with_brand("   ");
        assert!(ctx.brand().is_none());
        let ctx = QueryContext::new("x").with_brand("Nubeqa");
        assert_eq!(ctx.brand(), Some("Nubeqa"));
    }
}
