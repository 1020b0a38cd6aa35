//! Wire shapes of the patent registry's JSON responses
//!
//! The registry renders XML as JSON: text lives under `"$"`, attributes
//! under `"@name"`, and any element may be a single object or an array.
//! These structs are decoded once at the adapter boundary and converted
//! into the flat types in [`super::traits`]; nothing past this module
//! sees the raw shape.

use super::traits::{Bibliography, DocumentId, FamilyMember, LocalizedText};
use crate::model::CandidateId;
use serde::Deserialize;

/// An element that may appear once or as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::Many(items) => items.iter(),
            Self::One(item) => std::slice::from_ref(item).iter(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Text {
    #[serde(rename = "$", default)]
    pub value: String,
}

fn text(t: &Option<Text>) -> Option<String> {
    t.as_ref()
        .map(|t| t.value.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDocumentId {
    #[serde(rename = "@document-id-type")]
    pub id_type: Option<String>,
    pub country: Option<Text>,
    #[serde(rename = "doc-number")]
    pub doc_number: Option<Text>,
    pub kind: Option<Text>,
    pub date: Option<Text>,
}

impl RawDocumentId {
    fn is_docdb(&self) -> bool {
        self.id_type.as_deref() == Some("docdb")
    }

    fn decode(&self) -> Option<DocumentId> {
        Some(DocumentId {
            country: text(&self.country)?.to_ascii_uppercase(),
            number: text(&self.doc_number)?,
            kind: text(&self.kind),
            date: text(&self.date).map(|d| normalize_date(&d)),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reference {
    #[serde(rename = "document-id", default)]
    pub document_id: OneOrMany<RawDocumentId>,
}

impl Reference {
    /// The docdb-format identifiers in this reference.
    fn docdb_ids(&self) -> Vec<DocumentId> {
        self.document_id
            .iter()
            .filter(|d| d.is_docdb())
            .filter_map(RawDocumentId::decode)
            .collect()
    }

    /// The first dated identifier of any format.
    fn first_date(&self) -> Option<String> {
        self.document_id
            .iter()
            .find_map(|d| text(&d.date))
            .map(|d| normalize_date(&d))
    }
}

/// `20120503` becomes `2012-05-03`; anything else passes through.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    #[serde(rename = "ops:world-patent-data")]
    pub data: SearchData,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    #[serde(rename = "ops:biblio-search")]
    pub biblio_search: BiblioSearch,
}

#[derive(Debug, Deserialize)]
pub struct BiblioSearch {
    #[serde(rename = "ops:search-result", default)]
    pub result: Option<SearchResultBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResultBlock {
    #[serde(rename = "ops:publication-reference", default)]
    pub references: OneOrMany<Reference>,
}

impl SearchEnvelope {
    /// International publications named in the result, in response order.
    pub fn international_ids(&self) -> Vec<CandidateId> {
        let Some(result) = &self.data.biblio_search.result else {
            return Vec::new();
        };
        result
            .references
            .iter()
            .flat_map(|r| r.docdb_ids())
            .filter(|d| d.country == "WO")
            .filter_map(|d| CandidateId::from_parts(&d.country, &d.number))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Bibliographic data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LangText {
    #[serde(rename = "@lang")]
    pub lang: Option<String>,
    #[serde(rename = "$", default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAbstract {
    #[serde(rename = "@lang")]
    pub lang: Option<String>,
    #[serde(default)]
    pub p: OneOrMany<Text>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Name {
    pub name: Option<Text>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Party {
    #[serde(rename = "@data-format")]
    pub data_format: Option<String>,
    #[serde(rename = "applicant-name", alias = "inventor-name")]
    pub name: Option<Name>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Applicants {
    #[serde(default)]
    pub applicant: OneOrMany<Party>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventors {
    #[serde(default)]
    pub inventor: OneOrMany<Party>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parties {
    pub applicants: Option<Applicants>,
    pub inventors: Option<Inventors>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpcEntry {
    pub text: Option<Text>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpcBlock {
    #[serde(rename = "classification-ipcr", default)]
    pub entries: OneOrMany<IpcEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriorityClaims {
    #[serde(rename = "priority-claim", default)]
    pub claims: OneOrMany<Reference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BibliographicData {
    #[serde(rename = "invention-title", default)]
    pub titles: OneOrMany<LangText>,
    pub parties: Option<Parties>,
    #[serde(rename = "classifications-ipcr")]
    pub ipc: Option<IpcBlock>,
    #[serde(rename = "publication-reference")]
    pub publication: Option<Reference>,
    #[serde(rename = "application-reference")]
    pub application: Option<Reference>,
    #[serde(rename = "priority-claims")]
    pub priority_claims: Option<PriorityClaims>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeDocument {
    #[serde(rename = "bibliographic-data")]
    pub biblio: Option<BibliographicData>,
    #[serde(rename = "abstract", default)]
    pub abstracts: OneOrMany<RawAbstract>,
}

impl ExchangeDocument {
    pub fn decode(&self) -> Bibliography {
        let mut out = Bibliography::default();

        out.abstracts = self
            .abstracts
            .iter()
            .filter_map(|a| {
                let body = a
                    .p
                    .iter()
                    .map(|p| p.value.trim())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                (!body.is_empty()).then(|| LocalizedText {
                    lang: a.lang.clone(),
                    text: body,
                })
            })
            .collect();

        let Some(bib) = &self.biblio else {
            return out;
        };

        out.titles = bib
            .titles
            .iter()
            .filter(|t| !t.value.trim().is_empty())
            .map(|t| LocalizedText {
                lang: t.lang.clone(),
                text: t.value.trim().to_string(),
            })
            .collect();

        if let Some(parties) = &bib.parties {
            if let Some(applicants) = &parties.applicants {
                out.applicants = party_names(applicants.applicant.iter());
            }
            if let Some(inventors) = &parties.inventors {
                out.inventors = party_names(inventors.inventor.iter());
            }
        }

        if let Some(ipc) = &bib.ipc {
            out.classifications = ipc
                .entries
                .iter()
                .filter_map(|e| text(&e.text))
                .filter_map(|t| compact_ipc(&t))
                .fold(Vec::new(), |mut acc, code| {
                    if !acc.contains(&code) {
                        acc.push(code);
                    }
                    acc
                });
        }

        out.publication_date = bib.publication.as_ref().and_then(Reference::first_date);
        out.filing_date = bib.application.as_ref().and_then(Reference::first_date);
        out.priority_date = bib
            .priority_claims
            .as_ref()
            .and_then(|p| p.claims.iter().filter_map(Reference::first_date).min());

        out
    }
}

/// Party names, preferring the `original` rendering when the registry gives both.
fn party_names<'a>(parties: impl Iterator<Item = &'a Party>) -> Vec<String> {
    let all: Vec<&Party> = parties.collect();
    let has_original = all
        .iter()
        .any(|p| p.data_format.as_deref() == Some("original"));

    let mut names: Vec<String> = Vec::new();
    for party in all {
        if has_original && party.data_format.as_deref() != Some("original") {
            continue;
        }
        let Some(name) = party.name.as_ref().and_then(|n| text(&n.name)) else {
            continue;
        };
        let name = name.trim_end_matches(',').trim().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// `A61K  31/4155   20060101AFI...` becomes `A61K31/4155`.
fn compact_ipc(raw: &str) -> Option<String> {
    let mut parts = raw.split_whitespace();
    let class = parts.next()?;
    match parts.next() {
        Some(group) if group.contains('/') => Some(format!("{}{}", class, group)),
        _ => Some(class.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FamilyEnvelope {
    #[serde(rename = "ops:world-patent-data")]
    pub data: FamilyData,
}

#[derive(Debug, Deserialize)]
pub struct FamilyData {
    #[serde(rename = "ops:patent-family")]
    pub family: PatentFamily,
}

#[derive(Debug, Deserialize)]
pub struct PatentFamily {
    #[serde(rename = "ops:family-member", default)]
    pub members: OneOrMany<RawFamilyMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFamilyMember {
    #[serde(rename = "publication-reference", default)]
    pub publication: Reference,
    #[serde(rename = "priority-claim", default)]
    pub priority_claims: OneOrMany<Reference>,
    #[serde(rename = "exchange-document")]
    pub exchange_document: Option<OneOrMany<ExchangeDocument>>,
}

impl FamilyEnvelope {
    pub fn members(self) -> Vec<FamilyMember> {
        self.data
            .family
            .members
            .into_vec()
            .into_iter()
            .map(|m| FamilyMember {
                publication: m.publication.docdb_ids(),
                priority_claims: m
                    .priority_claims
                    .iter()
                    .flat_map(|r| r.document_id.iter().filter_map(RawDocumentId::decode))
                    .collect(),
                biblio: m
                    .exchange_document
                    .as_ref()
                    .and_then(|docs| docs.iter().next().map(ExchangeDocument::decode)),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Point lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PublicationEnvelope {
    #[serde(rename = "ops:world-patent-data")]
    pub data: PublicationData,
}

#[derive(Debug, Deserialize)]
pub struct PublicationData {
    #[serde(rename = "exchange-documents")]
    pub documents: ExchangeDocuments,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeDocuments {
    #[serde(rename = "exchange-document", default)]
    pub documents: OneOrMany<ExchangeDocument>,
}

impl PublicationEnvelope {
    pub fn bibliography(&self) -> Option<Bibliography> {
        self.data.documents.documents.iter().next().map(ExchangeDocument::decode)
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Seconds, sent as a string by the registry.
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
}

impl TokenResponse {
    pub fn ttl_secs(&self) -> u64 {
        match &self.expires_in {
            Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(1200),
            Some(serde_json::Value::String(s)) => s.parse().unwrap_or(1200),
            _ => 1200,
        }
    }
}
