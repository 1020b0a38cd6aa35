//! Scripted sources for tests
//!
//! - `MockRegistry`: search plus family, citation and point lookups
//! - `MockSearch`: a bare search surface
//!
//! Unscripted queries and lookups answer with empty results. Every call
//! is recorded so tests can assert on call counts and order.

use super::error::SourceError;
use super::traits::{Bibliography, FamilyDetail, FamilyMember, RegistryLookup, SearchAdapter};
use crate::model::CandidateId;
use crate::query::{Query, Surface};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

/// A call received by a mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Search(String),
    Family(CandidateId, FamilyDetail),
    Citing(CandidateId),
    Publication(String),
}

fn ids(raw: &[&str]) -> Vec<CandidateId> {
    raw.iter().filter_map(|s| CandidateId::parse(s)).collect()
}

/// Canonical form of a scripted identifier, or the raw text if it has none.
fn key(raw: &str) -> String {
    CandidateId::parse(raw)
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Default)]
struct CallLog(Mutex<Vec<MockCall>>);

impl CallLog {
    fn push(&self, call: MockCall) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn snapshot(&self) -> Vec<MockCall> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Mock patent registry.
pub struct MockRegistry {
    id: String,
    searches: HashMap<String, Result<Vec<CandidateId>, SourceError>>,
    default_search: Vec<CandidateId>,
    families: HashMap<String, Vec<FamilyMember>>,
    family_errors: HashMap<String, SourceError>,
    oversized: HashSet<String>,
    citations: HashMap<String, Result<Vec<CandidateId>, SourceError>>,
    publications: HashMap<String, Result<Bibliography, SourceError>>,
    failure: Option<SourceError>,
    calls: CallLog,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::with_id("registry")
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            searches: HashMap::new(),
            default_search: Vec::new(),
            families: HashMap::new(),
            family_errors: HashMap::new(),
            oversized: HashSet::new(),
            citations: HashMap::new(),
            publications: HashMap::new(),
            failure: None,
            calls: CallLog::default(),
        }
    }

    /// Results for one exact query text.
    pub fn with_search(mut self, query: impl Into<String>, found: &[&str]) -> Self {
        self.searches.insert(query.into(), Ok(ids(found)));
        self
    }

    pub fn with_search_error(mut self, query: impl Into<String>, error: SourceError) -> Self {
        self.searches.insert(query.into(), Err(error));
        self
    }

    /// Results for every query without its own script.
    pub fn with_default_search(mut self, found: &[&str]) -> Self {
        self.default_search = ids(found);
        self
    }

    pub fn with_family(mut self, id: &str, members: Vec<FamilyMember>) -> Self {
        self.families.insert(key(id), members);
        self
    }

    pub fn with_family_error(mut self, id: &str, error: SourceError) -> Self {
        self.family_errors.insert(key(id), error);
        self
    }

    /// Refuse the detailed family of `id` as oversized; the plain variant
    /// answers with the scripted members stripped of bibliography.
    pub fn with_oversized_family(mut self, id: &str) -> Self {
        self.oversized.insert(key(id));
        self
    }

    pub fn with_citing(mut self, id: &str, citing: &[&str]) -> Self {
        self.citations.insert(key(id), Ok(ids(citing)));
        self
    }

    pub fn with_citing_error(mut self, id: &str, error: SourceError) -> Self {
        self.citations.insert(key(id), Err(error));
        self
    }

    pub fn with_publication(mut self, patent_number: impl Into<String>, biblio: Bibliography) -> Self {
        self.publications.insert(patent_number.into(), Ok(biblio));
        self
    }

    pub fn with_publication_error(mut self, patent_number: impl Into<String>, error: SourceError) -> Self {
        self.publications.insert(patent_number.into(), Err(error));
        self
    }

    /// Fail every call with `error`.
    pub fn failing_with(mut self, error: SourceError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.snapshot()
    }

    pub fn search_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Search(_)))
    }

    pub fn family_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Family(..)))
    }

    pub fn citing_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Citing(_)))
    }

    pub fn publication_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Publication(_)))
    }

    fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.snapshot().iter().filter(|c| pred(c)).count()
    }

    fn fail(&self) -> Result<(), SourceError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SearchAdapter for MockRegistry {
    fn id(&self) -> &str {
        &self.id
    }

    fn surface(&self) -> Surface {
        Surface::Registry
    }

    async fn search(&self, query: &Query) -> Result<BTreeSet<CandidateId>, SourceError> {
        self.calls.push(MockCall::Search(query.text.clone()));
        self.fail()?;
        match self.searches.get(&query.text) {
            Some(Ok(found)) => Ok(found.iter().cloned().collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(self.default_search.iter().cloned().collect()),
        }
    }
}

#[async_trait]
impl RegistryLookup for MockRegistry {
    fn id(&self) -> &str {
        &self.id
    }

    async fn family(
        &self,
        id: &CandidateId,
        detail: FamilyDetail,
    ) -> Result<Vec<FamilyMember>, SourceError> {
        self.calls.push(MockCall::Family(id.clone(), detail));
        self.fail()?;
        if let Some(e) = self.family_errors.get(id.as_str()) {
            return Err(e.clone());
        }
        let oversized = self.oversized.contains(id.as_str());
        if oversized && detail == FamilyDetail::WithBiblio {
            return Err(SourceError::Oversized);
        }
        let members = self.families.get(id.as_str()).cloned().unwrap_or_default();
        Ok(if oversized || detail == FamilyDetail::Plain {
            members
                .into_iter()
                .map(|m| FamilyMember { biblio: None, ..m })
                .collect()
        } else {
            members
        })
    }

    async fn citing(&self, id: &CandidateId) -> Result<Vec<CandidateId>, SourceError> {
        self.calls.push(MockCall::Citing(id.clone()));
        self.fail()?;
        match self.citations.get(id.as_str()) {
            Some(result) => result.clone(),
            None => Ok(Vec::new()),
        }
    }

    async fn publication(&self, patent_number: &str) -> Result<Option<Bibliography>, SourceError> {
        self.calls.push(MockCall::Publication(patent_number.to_string()));
        self.fail()?;
        match self.publications.get(patent_number) {
            Some(Ok(biblio)) => Ok(Some(biblio.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(None),
        }
    }
}

/// Mock search surface.
pub struct MockSearch {
    id: String,
    surface: Surface,
    results: HashMap<String, Vec<CandidateId>>,
    default_results: Vec<CandidateId>,
    failures: HashMap<String, SourceError>,
    failure: Option<SourceError>,
    calls: CallLog,
}

impl MockSearch {
    pub fn new(id: impl Into<String>, surface: Surface) -> Self {
        Self {
            id: id.into(),
            surface,
            results: HashMap::new(),
            default_results: Vec::new(),
            failures: HashMap::new(),
            failure: None,
            calls: CallLog::default(),
        }
    }

    pub fn with_results(mut self, query: impl Into<String>, found: &[&str]) -> Self {
        self.results.insert(query.into(), ids(found));
        self
    }

    pub fn with_default_results(mut self, found: &[&str]) -> Self {
        self.default_results = ids(found);
        self
    }

    pub fn with_failure(mut self, query: impl Into<String>, error: SourceError) -> Self {
        self.failures.insert(query.into(), error);
        self
    }

    pub fn failing_with(mut self, error: SourceError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Query texts received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.calls
            .snapshot()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Search(q) => Some(q),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SearchAdapter for MockSearch {
    fn id(&self) -> &str {
        &self.id
    }

    fn surface(&self) -> Surface {
        self.surface
    }

    async fn search(&self, query: &Query) -> Result<BTreeSet<CandidateId>, SourceError> {
        self.calls.push(MockCall::Search(query.text.clone()));
        if let Some(e) = self.failure.as_ref().or_else(|| self.failures.get(&query.text)) {
            return Err(e.clone());
        }
        let found = self.results.get(&query.text).unwrap_or(&self.default_results);
        Ok(found.iter().cloned().collect())
    }
}
