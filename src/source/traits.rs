//! Capability traits for external search surfaces
//!
//! A [`SearchAdapter`] answers one query against one surface. The patent
//! registry additionally implements [`RegistryLookup`] for the relationship
//! and bibliographic lookups used by expansion, resolution and completion.

use super::error::SourceError;
use crate::model::CandidateId;
use crate::query::{Query, Surface};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A publication identifier as reported inside a registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentId {
    pub country: String,
    pub number: String,
    pub kind: Option<String>,
    /// ISO `YYYY-MM-DD` where the registry supplied one.
    pub date: Option<String>,
}

impl DocumentId {
    pub fn new(country: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            number: number.into(),
            kind: None,
            date: None,
        }
    }

    /// Country-prefixed patent number, e.g. `BR112012008823`.
    pub fn patent_number(&self) -> String {
        format!("{}{}", self.country, self.number)
    }

    pub fn candidate_id(&self) -> Option<CandidateId> {
        CandidateId::from_parts(&self.country, &self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub lang: Option<String>,
    pub text: String,
}

/// Bibliographic fields of one publication. Absent fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bibliography {
    pub titles: Vec<LocalizedText>,
    pub abstracts: Vec<LocalizedText>,
    pub applicants: Vec<String>,
    pub inventors: Vec<String>,
    pub classifications: Vec<String>,
    pub publication_date: Option<String>,
    pub filing_date: Option<String>,
    pub priority_date: Option<String>,
}

impl Bibliography {
    pub fn title_in(&self, lang: &str) -> Option<&str> {
        self.titles
            .iter()
            .find(|t| t.lang.as_deref() == Some(lang))
            .map(|t| t.text.as_str())
    }

    /// First title not in `lang`.
    pub fn title_not_in(&self, lang: &str) -> Option<&str> {
        self.titles
            .iter()
            .find(|t| t.lang.as_deref() != Some(lang))
            .map(|t| t.text.as_str())
    }

    pub fn abstract_in(&self, lang: &str) -> Option<&str> {
        self.abstracts
            .iter()
            .find(|t| t.lang.as_deref() == Some(lang))
            .or_else(|| self.abstracts.first())
            .map(|t| t.text.as_str())
    }
}

/// One member of a patent family, before field extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Identifiers from the member's publication reference.
    pub publication: Vec<DocumentId>,
    /// Identifiers from the member's priority claims. Not siblings.
    pub priority_claims: Vec<DocumentId>,
    pub biblio: Option<Bibliography>,
}

impl FamilyMember {
    pub fn published_as(country: &str, number: &str) -> Self {
        Self {
            publication: vec![DocumentId::new(country, number)],
            ..Default::default()
        }
    }

    pub fn with_biblio(mut self, biblio: Bibliography) -> Self {
        self.biblio = Some(biblio);
        self
    }
}

/// How much detail a family request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyDetail {
    /// Members with bibliographic data. May be refused as oversized.
    WithBiblio,
    /// Member identifiers only.
    Plain,
}

/// Executes one query against one external search surface.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Stable identifier used for provenance and the query log.
    fn id(&self) -> &str;

    /// Which query syntax this adapter understands.
    fn surface(&self) -> Surface;

    /// Run a query and return the canonical candidate identifiers it found.
    async fn search(&self, query: &Query) -> Result<BTreeSet<CandidateId>, SourceError>;
}

/// Relationship and bibliographic lookups against the patent registry.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    fn id(&self) -> &str;

    /// Family members of a publication.
    async fn family(
        &self,
        id: &CandidateId,
        detail: FamilyDetail,
    ) -> Result<Vec<FamilyMember>, SourceError>;

    /// International publications that cite `id`.
    async fn citing(&self, id: &CandidateId) -> Result<Vec<CandidateId>, SourceError>;

    /// Bibliographic data for a country-prefixed patent number.
    async fn publication(&self, patent_number: &str) -> Result<Option<Bibliography>, SourceError>;
}
