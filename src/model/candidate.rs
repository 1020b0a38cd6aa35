//! Candidate publications and the provenance-tagged candidate set

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Canonical publication identifier: jurisdiction prefix plus digit string.
///
/// Only constructible through [`CandidateId::parse`], so every stored
/// identifier is already in canonical form (`WO2011051540`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// Parse a raw identifier into canonical form.
    ///
    /// Case is folded, punctuation and whitespace are stripped, and a
    /// trailing kind code (`A1`, `B2`, ...) is dropped. Returns `None` when
    /// what remains is not two letters followed by digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '/' | '-' | '.' | ',' | '_'))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let prefix = compact.get(..2)?;
        if !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }

        let rest = &compact[2..];
        let digits_end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return None;
        }

        let kind = &rest[digits_end..];
        if !kind.is_empty() && !is_kind_code(kind) {
            return None;
        }

        Some(Self(format!("{}{}", prefix, &rest[..digits_end])))
    }

    /// Build from a jurisdiction code and a document number as the registry reports them.
    pub fn from_parts(country: &str, number: &str) -> Option<Self> {
        Self::parse(&format!("{}{}", country, number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn jurisdiction(&self) -> &str {
        &self.0[..2]
    }

    pub fn number(&self) -> &str {
        &self.0[2..]
    }

    pub fn is_international(&self) -> bool {
        self.jurisdiction() == "WO"
    }
}

fn is_kind_code(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_digit())
        && s.len() <= 2
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which discovery pass first introduced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionPass {
    Seed,
    PriorityExpansion,
    CitationExpansion,
}

impl ExpansionPass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::PriorityExpansion => "priority_expansion",
            Self::CitationExpansion => "citation_expansion",
        }
    }
}

/// A candidate publication with the sources that reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub sources: BTreeSet<String>,
    pub pass: ExpansionPass,
}

/// Insertion-ordered set of candidates keyed by canonical identifier.
///
/// Iteration follows discovery order, which is what frontier selection
/// uses, so the same sequence of insertions always yields the same frontier.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    order: Vec<CandidateId>,
    entries: HashMap<CandidateId, Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `source` reported `id` during `pass`.
    ///
    /// Returns `true` if the identifier was new. For known identifiers the
    /// source is added to its provenance and the original pass is kept.
    pub fn insert(&mut self, id: CandidateId, source: &str, pass: ExpansionPass) -> bool {
        if let Some(existing) = self.entries.get_mut(&id) {
            existing.sources.insert(source.to_string());
            return false;
        }
        self.order.push(id.clone());
        self.entries.insert(
            id.clone(),
            Candidate {
                id,
                sources: BTreeSet::from([source.to_string()]),
                pass,
            },
        );
        true
    }

    /// Union another set into this one, keeping this set's ordering first.
    pub fn absorb(&mut self, other: &CandidateSet) {
        for candidate in other.iter() {
            for source in &candidate.sources {
                self.insert(candidate.id.clone(), source, candidate.pass);
            }
        }
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &CandidateId) -> Option<&Candidate> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Candidates in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &CandidateId> {
        self.order.iter()
    }

    /// The first `size` identifiers in discovery order.
    pub fn frontier(&self, size: usize) -> Vec<CandidateId> {
        self.order.iter().take(size).cloned().collect()
    }

    /// Number of candidates each source reported (a candidate counts for every source).
    pub fn count_by_source(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for candidate in self.iter() {
            for source in &candidate.sources {
                *counts.entry(source.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn count_by_pass(&self) -> BTreeMap<ExpansionPass, usize> {
        let mut counts = BTreeMap::new();
        for candidate in self.iter() {
            *counts.entry(candidate.pass).or_insert(0) += 1;
        }
        counts
    }

    /// Candidates sorted by identifier, for stable output.
    pub fn to_sorted_vec(&self) -> Vec<Candidate> {
        let mut all: Vec<Candidate> = self.iter().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> CandidateId {
        CandidateId::parse(raw).unwrap()
    }

    #[test]
    fn parse_strips_punctuation_and_case() {
        assert_eq!(id("wo2011051540").as_str(), "WO2011051540");
        assert_eq!(id("WO 2011/051540").as_str(), "WO2011051540");
        assert_eq!(id("WO/2011/051540").as_str(), "WO2011051540");
        assert_eq!(id("WO-2011-051540").as_str(), "WO2011051540");
    }

    #[test]
    fn parse_drops_kind_code() {
        assert_eq!(id("WO2011051540A1").as_str(), "WO2011051540");
        assert_eq!(id("BR112012008823A2").as_str(), "BR112012008823");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(CandidateId::parse("").is_none());
        assert!(CandidateId::parse("W").is_none());
        assert!(CandidateId::parse("WO").is_none());
        assert!(CandidateId::parse("12345").is_none());
        assert!(CandidateId::parse("WOabc").is_none());
        assert!(CandidateId::parse("WO2011051540XYZ").is_none());
    }

    #[test]
    fn from_parts_matches_parse() {
        let a = CandidateId::from_parts("WO", "2011051540").unwrap();
        assert_eq!(a, id("WO2011051540"));
        assert!(a.is_international());
        assert_eq!(a.number(), "2011051540");
    }

    #[test]
    fn set_keeps_one_entry_per_canonical_id() {
        let mut set = CandidateSet::new();
        assert!(set.insert(id("WO2011051540"), "registry", ExpansionPass::Seed));
        assert!(!set.insert(id("wo2011051540"), "web", ExpansionPass::Seed));

        assert_eq!(set.len(), 1);
        let candidate = set.get(&id("WO2011051540")).unwrap();
        assert_eq!(candidate.sources.len(), 2);
    }

    #[test]
    fn known_candidate_keeps_original_pass() {
        let mut set = CandidateSet::new();
        set.insert(id("WO2011051540"), "registry", ExpansionPass::Seed);
        set.insert(id("WO2011051540"), "registry", ExpansionPass::CitationExpansion);
        assert_eq!(set.get(&id("WO2011051540")).unwrap().pass, ExpansionPass::Seed);
    }

    #[test]
    fn frontier_follows_discovery_order() {
        let mut set = CandidateSet::new();
        for raw in ["WO2015000003", "WO2011000001", "WO2013000002"] {
            set.insert(id(raw), "registry", ExpansionPass::Seed);
        }
        let frontier = set.frontier(2);
        assert_eq!(frontier, vec![id("WO2015000003"), id("WO2011000001")]);
        assert_eq!(set.frontier(10).len(), 3);
    }

    #[test]
    fn counts_reflect_provenance() {
        let mut set = CandidateSet::new();
        set.insert(id("WO2011000001"), "registry", ExpansionPass::Seed);
        set.insert(id("WO2011000001"), "web", ExpansionPass::Seed);
        set.insert(id("WO2012000002"), "registry", ExpansionPass::PriorityExpansion);

        let by_source = set.count_by_source();
        assert_eq!(by_source["registry"], 2);
        assert_eq!(by_source["web"], 1);

        let by_pass = set.count_by_pass();
        assert_eq!(by_pass[&ExpansionPass::Seed], 1);
        assert_eq!(by_pass[&ExpansionPass::PriorityExpansion], 1);
    }
}
