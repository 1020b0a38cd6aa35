//! Country-level patent records

use super::CandidateId;
use serde::{Deserialize, Serialize};

/// Links to public databases where a patent can be inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLinks {
    pub espacenet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_office: Option<String>,
}

impl ReferenceLinks {
    pub fn for_patent(patent_number: &str, country: &str) -> Self {
        let national_office = match country {
            "BR" => Some(format!(
                "https://busca.inpi.gov.br/pePI/servlet/PatenteServletController?Action=detail&CodPedido={}",
                patent_number
            )),
            "US" => Some(format!("https://patents.google.com/patent/{}", patent_number)),
            "MX" => Some("https://siga.impi.gob.mx/".to_string()),
            "AR" => Some("https://portaltramites.inpi.gob.ar/".to_string()),
            _ => None,
        };
        Self {
            espacenet: format!(
                "https://worldwide.espacenet.com/patent/search?q=pn%3D{}",
                patent_number
            ),
            national_office,
        }
    }
}

/// A family member in one target jurisdiction.
///
/// Keyed by `patent_number` within its country. Fields are only ever
/// filled in after creation; see [`CountryPatentRecord::fill_missing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryPatentRecord {
    pub patent_number: String,
    pub country: String,
    pub kind: Option<String>,
    /// International publication this record was reached from.
    pub origin: CandidateId,
    pub title: Option<String>,
    /// Title in the filing language when an English one also exists.
    pub title_original: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub applicants: Vec<String>,
    pub inventors: Vec<String>,
    pub classifications: Vec<String>,
    pub publication_date: Option<String>,
    pub filing_date: Option<String>,
    pub priority_date: Option<String>,
    pub links: ReferenceLinks,
}

impl CountryPatentRecord {
    pub fn new(patent_number: impl Into<String>, country: impl Into<String>, origin: CandidateId) -> Self {
        let patent_number = patent_number.into();
        let country = country.into();
        let links = ReferenceLinks::for_patent(&patent_number, &country);
        Self {
            patent_number,
            country,
            kind: None,
            origin,
            title: None,
            title_original: None,
            abstract_text: None,
            applicants: Vec::new(),
            inventors: Vec::new(),
            classifications: Vec::new(),
            publication_date: None,
            filing_date: None,
            priority_date: None,
            links,
        }
    }

    /// True when any field the completer can supply is still empty.
    pub fn needs_completion(&self) -> bool {
        self.title.is_none()
            || self.applicants.is_empty()
            || self.classifications.is_empty()
            || self.filing_date.is_none()
    }

    /// Copy every field from `other` whose counterpart here is empty.
    ///
    /// Populated fields are never touched. Identity fields (`patent_number`,
    /// `country`, `origin`) are left alone. Returns the number of fields filled.
    pub fn fill_missing(&mut self, other: &CountryPatentRecord) -> usize {
        let mut filled = 0;
        filled += fill_opt(&mut self.kind, &other.kind);
        filled += fill_opt(&mut self.title, &other.title);
        filled += fill_opt(&mut self.title_original, &other.title_original);
        filled += fill_opt(&mut self.abstract_text, &other.abstract_text);
        filled += fill_vec(&mut self.applicants, &other.applicants);
        filled += fill_vec(&mut self.inventors, &other.inventors);
        filled += fill_vec(&mut self.classifications, &other.classifications);
        filled += fill_opt(&mut self.publication_date, &other.publication_date);
        filled += fill_opt(&mut self.filing_date, &other.filing_date);
        filled += fill_opt(&mut self.priority_date, &other.priority_date);
        filled
    }
}

fn fill_opt(slot: &mut Option<String>, from: &Option<String>) -> usize {
    match (slot.as_deref(), from.as_deref()) {
        (None, Some(v)) | (Some(""), Some(v)) if !v.trim().is_empty() => {
            *slot = Some(v.to_string());
            1
        }
        _ => 0,
    }
}

fn fill_vec(slot: &mut Vec<String>, from: &[String]) -> usize {
    if slot.is_empty() && !from.is_empty() {
        slot.extend(from.iter().cloned());
        1
    } else {
        0
    }
}
