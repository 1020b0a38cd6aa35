//! Enrichment record: classified facts about a molecule

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A bounded, insertion-ordered set of terms deduplicated case-insensitively.
///
/// Empty strings and strings longer than `max_len` characters are refused,
/// as is anything past `cap` entries. Internal whitespace is collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TermSet {
    items: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
    max_len: usize,
}

impl From<Vec<String>> for TermSet {
    fn from(items: Vec<String>) -> Self {
        let mut set = Self::default();
        set.extend(items);
        set
    }
}

impl From<TermSet> for Vec<String> {
    fn from(set: TermSet) -> Self {
        set.items
    }
}

impl Default for TermSet {
    fn default() -> Self {
        Self::bounded(usize::MAX, usize::MAX)
    }
}

impl TermSet {
    pub fn bounded(cap: usize, max_len: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            cap,
            max_len,
        }
    }

    /// Insert a term. Returns `true` if it was accepted.
    pub fn insert(&mut self, term: &str) -> bool {
        if self.items.len() >= self.cap {
            return false;
        }
        let term = term.split_whitespace().collect::<Vec<_>>().join(" ");
        if term.is_empty() || term.chars().count() > self.max_len {
            return false;
        }
        if !self.seen.insert(term.to_lowercase()) {
            return false;
        }
        self.items.push(term);
        true
    }

    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            self.insert(term.as_ref());
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.seen.contains(&term.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn first(&self) -> Option<&str> {
        self.items.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }
}

/// Structural identifiers for the molecule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChemicalIdentifiers {
    pub molecular_formula: Option<String>,
    pub inchi: Option<String>,
    pub inchi_key: Option<String>,
    pub smiles: Option<String>,
}

impl ChemicalIdentifiers {
    /// Fill each empty field from `other`.
    pub fn fill_from(&mut self, other: &ChemicalIdentifiers) {
        fill(&mut self.molecular_formula, &other.molecular_formula);
        fill(&mut self.inchi, &other.inchi);
        fill(&mut self.inchi_key, &other.inchi_key);
        fill(&mut self.smiles, &other.smiles);
    }

    pub fn is_empty(&self) -> bool {
        self.molecular_formula.is_none()
            && self.inchi.is_none()
            && self.inchi_key.is_none()
            && self.smiles.is_none()
    }
}

fn fill(slot: &mut Option<String>, from: &Option<String>) {
    if slot.is_none() {
        if let Some(value) = from.as_ref().filter(|v| !v.trim().is_empty()) {
            *slot = Some(value.clone());
        }
    }
}

/// Kind of patent the synonym pool suggests exists for the molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatentTypeHint {
    ProductDerivative,
    Formulation,
    Process,
    Combination,
    NewUse,
}

/// Facts gathered about a molecule before search. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub synonyms: TermSet,
    pub dev_codes: TermSet,
    pub registry_numbers: TermSet,
    pub companies: TermSet,
    pub mechanisms: TermSet,
    pub indications: TermSet,
    pub chemical: ChemicalIdentifiers,
    pub therapeutic_area: Option<String>,
    pub patent_types: Vec<PatentTypeHint>,
    /// Fact sources that answered, in registration order.
    pub sources_used: Vec<String>,
}

impl EnrichmentRecord {
    pub fn total_terms(&self) -> usize {
        self.synonyms.len()
            + self.dev_codes.len()
            + self.registry_numbers.len()
            + self.companies.len()
            + self.mechanisms.len()
            + self.indications.len()
    }
}
