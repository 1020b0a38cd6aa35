//! Country resolution
//!
//! Turns international candidates into per-country patent records by
//! reading their families. A family refused as oversized is fetched again
//! without bibliographic detail; the completer fills the gaps later.

use super::cancel::CancellationToken;
use super::state::SearchState;
use super::types::PatentMap;
use crate::model::{CandidateId, CandidateSet, CountryPatentRecord};
use crate::source::{Bibliography, DocumentId, FamilyDetail, FamilyMember, RegistryLookup, SourceError};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// Build a record for `doc` from whatever bibliography is available.
/// Missing fields stay empty.
pub fn build_record(doc: &DocumentId, origin: &CandidateId, biblio: Option<&Bibliography>) -> CountryPatentRecord {
    let mut record = CountryPatentRecord::new(doc.patent_number(), &doc.country, origin.clone());
    record.kind = doc.kind.clone();
    record.publication_date = doc.date.clone();
    if let Some(biblio) = biblio {
        apply_bibliography(&mut record, biblio);
    }
    record
}

/// Copy bibliography fields into empty slots of `record`.
pub fn apply_bibliography(record: &mut CountryPatentRecord, biblio: &Bibliography) -> usize {
    let english = biblio.title_in("en");
    let title = english.or_else(|| biblio.titles.first().map(|t| t.text.as_str()));
    let original = english.and_then(|_| biblio.title_not_in("en"));

    let mut found = CountryPatentRecord::new(&record.patent_number, &record.country, record.origin.clone());
    found.title = title.map(String::from);
    found.title_original = original.map(String::from);
    found.abstract_text = biblio.abstract_in("en").map(String::from);
    found.applicants = biblio.applicants.clone();
    found.inventors = biblio.inventors.clone();
    found.classifications = biblio.classifications.clone();
    found.publication_date = biblio.publication_date.clone();
    found.filing_date = biblio.filing_date.clone();
    found.priority_date = biblio.priority_date.clone();
    record.fill_missing(&found)
}

pub struct CountryResolver {
    lookup: Arc<dyn RegistryLookup>,
}

impl CountryResolver {
    pub fn new(lookup: Arc<dyn RegistryLookup>) -> Self {
        Self { lookup }
    }

    /// Family members of `id` published in one of `targets`, by country.
    pub async fn resolve(
        &self,
        id: &CandidateId,
        targets: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Vec<FamilyMember>>, SourceError> {
        let members = match self.lookup.family(id, FamilyDetail::WithBiblio).await {
            Err(SourceError::Oversized) => {
                tracing::debug!(candidate = %id, "family too large, retrying without bibliography");
                self.lookup.family(id, FamilyDetail::Plain).await?
            }
            other => other?,
        };

        let mut by_country: BTreeMap<String, Vec<FamilyMember>> = BTreeMap::new();
        for member in members {
            let country = member
                .publication
                .iter()
                .map(|d| d.country.clone())
                .find(|c| targets.contains(c));
            if let Some(country) = country {
                by_country.entry(country).or_default().push(member);
            }
        }
        Ok(by_country)
    }

    /// Resolve every international candidate into records for the target
    /// countries. A patent number reached from several candidates keeps the
    /// record built first.
    pub async fn resolve_all(
        &self,
        candidates: &CandidateSet,
        targets: &BTreeSet<String>,
        state: &SearchState,
        cancel: &CancellationToken,
    ) -> PatentMap {
        let source = self.lookup.id();
        let mut patents: PatentMap = targets.iter().map(|c| (c.clone(), Vec::new())).collect();
        let mut seen: HashSet<String> = HashSet::new();

        for id in candidates.ids().filter(|c| c.is_international()) {
            if cancel.is_cancelled() {
                break;
            }
            let query = format!("resolve {}", id);
            if state.is_disabled(source) {
                state.record_skip(source, &query, "source disabled");
                continue;
            }

            let members = match self.resolve(id, targets).await {
                Ok(members) => members,
                Err(e) => {
                    state.record(source, &query, Err(&e));
                    if e.is_auth() {
                        tracing::warn!(source, error = %e, "disabling registry lookups");
                        state.disable(source);
                    } else {
                        tracing::debug!(candidate = %id, error = %e, "family lookup skipped");
                    }
                    continue;
                }
            };

            let mut built = 0;
            for (country, members) in members {
                for member in &members {
                    let Some(doc) = member.publication.iter().find(|d| d.country == country) else {
                        continue;
                    };
                    let record = build_record(doc, id, member.biblio.as_ref());
                    if !seen.insert(record.patent_number.clone()) {
                        continue;
                    }
                    state.add_companies(&record.applicants);
                    patents.entry(country.clone()).or_default().push(record);
                    built += 1;
                }
            }
            state.record(source, &query, Ok(built));
        }

        let total: usize = patents.values().map(Vec::len).sum();
        tracing::info!(patents = total, countries = targets.len(), "country resolution finished");
        patents
    }
}
