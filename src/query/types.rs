//! Query types and the deduplicated query list

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// What a query is probing for.
///
/// Declaration order is the synthesis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Core,
    Formulation,
    Crystalline,
    Salt,
    Process,
    Combination,
    Mechanism,
    Indication,
    Company,
    Classification,
}

impl QueryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Formulation => "formulation",
            Self::Crystalline => "crystalline",
            Self::Salt => "salt",
            Self::Process => "process",
            Self::Combination => "combination",
            Self::Mechanism => "mechanism",
            Self::Indication => "indication",
            Self::Company => "company",
            Self::Classification => "classification",
        }
    }
}

/// The search surface whose syntax a query is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Field-based registry syntax (`txt="..."`, `ic=...`).
    Registry,
    /// Free-text web search.
    Web,
}

/// A surface-specific query string with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub category: QueryCategory,
    pub surface: Surface,
}

impl Query {
    pub fn registry(text: impl Into<String>, category: QueryCategory) -> Self {
        Self {
            text: text.into(),
            category,
            surface: Surface::Registry,
        }
    }

    pub fn web(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: QueryCategory::Core,
            surface: Surface::Web,
        }
    }
}

/// Ordered list of queries with no two texts equal ignoring case.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuerySet {
    queries: Vec<Query>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl QuerySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query unless its text (case-insensitively) is already present.
    pub fn push(&mut self, query: Query) -> bool {
        let key = query.text.trim().to_lowercase();
        if key.is_empty() || !self.seen.insert(key) {
            return false;
        }
        self.queries.push(query);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Query> {
        self.queries.iter()
    }

    pub fn for_surface(&self, surface: Surface) -> impl Iterator<Item = &Query> {
        self.queries.iter().filter(move |q| q.surface == surface)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.seen.contains(&text.trim().to_lowercase())
    }

    /// Number of queries per category.
    pub fn stats(&self) -> BTreeMap<QueryCategory, usize> {
        let mut stats = BTreeMap::new();
        for query in &self.queries {
            *stats.entry(query.category).or_insert(0) += 1;
        }
        stats
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a Query;
    type IntoIter = std::slice::Iter<'a, Query>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_rejects_case_insensitive_duplicates() {
        let mut set = QuerySet::new();
        assert!(set.push(Query::registry("txt=\"ODM-201\"", QueryCategory::Core)));
        assert!(!set.push(Query::registry("TXT=\"odm-201\"", QueryCategory::Mechanism)));
        assert!(!set.push(Query::registry("   ", QueryCategory::Core)));
        assert_eq!(set.len(), 1);
        assert!(set.contains_text("txt=\"odm-201\""));
    }

    #[test]
    fn stats_count_by_category() {
        let mut set = QuerySet::new();
        set.push(Query::registry("a", QueryCategory::Core));
        set.push(Query::registry("b", QueryCategory::Core));
        set.push(Query::registry("c", QueryCategory::Salt));
        set.push(Query::web("d"));

        let stats = set.stats();
        assert_eq!(stats[&QueryCategory::Core], 3);
        assert_eq!(stats[&QueryCategory::Salt], 1);
        assert_eq!(set.for_surface(Surface::Web).count(), 1);
    }
}
