//! Fact sources
//!
//! Each source answers one lookup for a molecule and reports whatever raw
//! facts it found. Payloads are decoded here; classification happens in
//! the aggregator.

use crate::config::FactSourceConfig;
use crate::model::ChemicalIdentifiers;
use crate::source::http::{client, endpoint, send_json};
use crate::source::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One trial registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub conditions: Vec<String>,
    pub sponsor: Option<String>,
    pub phases: Vec<String>,
}

/// Raw facts from one source. Unclassified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFacts {
    /// Names and identifiers of the molecule, in source order.
    pub names: Vec<String>,
    pub brands: Vec<String>,
    pub sponsors: Vec<String>,
    pub trials: Vec<TrialRecord>,
    /// Free text (article titles and the like) scanned for mechanisms and indications.
    pub texts: Vec<String>,
    pub chemical: ChemicalIdentifiers,
}

impl SourceFacts {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.brands.is_empty()
            && self.sponsors.is_empty()
            && self.trials.is_empty()
            && self.texts.is_empty()
            && self.chemical.is_empty()
    }
}

/// A source of facts about a molecule.
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Stable identifier, used for deduplication and status reporting.
    fn id(&self) -> &str;

    async fn lookup(&self, molecule: &str, brand: Option<&str>) -> Result<SourceFacts, SourceError>;
}

/// Treat "nothing known about this name" as an empty answer.
fn empty_if_not_found<T: Default>(result: Result<T, SourceError>) -> Result<T, SourceError> {
    match result {
        Err(SourceError::NotFound(_)) => Ok(T::default()),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Chemical-name lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct SynonymsEnvelope {
    #[serde(rename = "InformationList", default)]
    information_list: InformationList,
}

#[derive(Debug, Default, Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<SynonymEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SynonymEntry {
    #[serde(rename = "Synonym", default)]
    synonyms: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertiesEnvelope {
    #[serde(rename = "PropertyTable", default)]
    table: PropertyTable,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<Properties>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(rename = "MolecularFormula")]
    formula: Option<String>,
    #[serde(rename = "InChI")]
    inchi: Option<String>,
    #[serde(rename = "InChIKey")]
    inchi_key: Option<String>,
    #[serde(rename = "CanonicalSMILES", alias = "ConnectivitySMILES")]
    smiles: Option<String>,
}

/// Synonyms and structural identifiers from a chemical-name service.
pub struct ChemicalNameSource {
    client: Client,
    base_url: String,
}

impl ChemicalNameSource {
    pub const ID: &'static str = "chemical_names";

    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FactSource for ChemicalNameSource {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn lookup(&self, molecule: &str, _brand: Option<&str>) -> Result<SourceFacts, SourceError> {
        let url = endpoint(&self.base_url, &["compound", "name", molecule, "synonyms", "JSON"])?;
        let synonyms: SynonymsEnvelope =
            empty_if_not_found(send_json(self.client.get(url), "synonyms").await)?;

        let mut facts = SourceFacts {
            names: synonyms
                .information_list
                .information
                .into_iter()
                .next()
                .map(|e| e.synonyms)
                .unwrap_or_default(),
            ..Default::default()
        };

        // Properties are a bonus; a failure here keeps the synonyms.
        let url = endpoint(
            &self.base_url,
            &[
                "compound",
                "name",
                molecule,
                "property",
                "MolecularFormula,InChI,InChIKey,CanonicalSMILES",
                "JSON",
            ],
        )?;
        match send_json::<PropertiesEnvelope>(self.client.get(url), "properties").await {
            Ok(props) => {
                if let Some(p) = props.table.properties.into_iter().next() {
                    facts.chemical = ChemicalIdentifiers {
                        molecular_formula: p.formula,
                        inchi: p.inchi,
                        inchi_key: p.inchi_key,
                        smiles: p.smiles,
                    };
                }
            }
            Err(e) => tracing::debug!(error = %e, "chemical properties unavailable"),
        }

        Ok(facts)
    }
}

// ---------------------------------------------------------------------------
// Drug-application registry
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ApplicationsEnvelope {
    #[serde(default)]
    results: Vec<Application>,
}

#[derive(Debug, Default, Deserialize)]
struct Application {
    sponsor_name: Option<String>,
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Default, Deserialize)]
struct Product {
    brand_name: Option<String>,
}

/// Sponsors and brand names from a drug-application registry.
pub struct DrugApplicationSource {
    client: Client,
    url: String,
}

impl DrugApplicationSource {
    pub const ID: &'static str = "drug_applications";

    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn search(&self, term: &str) -> Result<ApplicationsEnvelope, SourceError> {
        // A space is encoded as '+', which the registry reads as OR.
        let search = format!("openfda.brand_name:\"{0}\" openfda.generic_name:\"{0}\"", term);
        let request = self
            .client
            .get(&self.url)
            .query(&[("search", search.as_str()), ("limit", "100")]);
        empty_if_not_found(send_json(request, "drug applications").await)
    }
}

#[async_trait]
impl FactSource for DrugApplicationSource {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn lookup(&self, molecule: &str, brand: Option<&str>) -> Result<SourceFacts, SourceError> {
        let mut facts = SourceFacts::default();
        let mut last_error = None;
        let mut answered = false;

        for term in std::iter::once(molecule).chain(brand) {
            match self.search(term).await {
                Ok(envelope) => {
                    answered = true;
                    for app in envelope.results {
                        facts.sponsors.extend(app.sponsor_name);
                        facts
                            .brands
                            .extend(app.products.into_iter().filter_map(|p| p.brand_name));
                    }
                }
                Err(e) => {
                    tracing::debug!(term, error = %e, "drug application search failed");
                    last_error = Some(e);
                }
            }
        }

        match (answered, last_error) {
            (false, Some(e)) => Err(e),
            _ => Ok(facts),
        }
    }
}

// ---------------------------------------------------------------------------
// Literature search
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct SearchIdsEnvelope {
    #[serde(default)]
    esearchresult: SearchIds,
}

#[derive(Debug, Default, Deserialize)]
struct SearchIds {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryEnvelope {
    #[serde(default)]
    result: SummaryResult,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    articles: HashMap<String, SummaryValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SummaryValue {
    Article { title: String },
    Other(serde_json::Value),
}

/// Article titles from a literature index.
pub struct LiteratureSource {
    client: Client,
    base_url: String,
    summaries: usize,
}

impl LiteratureSource {
    pub const ID: &'static str = "literature";
    const SEARCH_MAX: &'static str = "50";
    const SUMMARIES: usize = 10;

    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            summaries: Self::SUMMARIES,
        }
    }
}

#[async_trait]
impl FactSource for LiteratureSource {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn lookup(&self, molecule: &str, _brand: Option<&str>) -> Result<SourceFacts, SourceError> {
        let term = format!("{} patent", molecule);
        let url = endpoint(&self.base_url, &["esearch.fcgi"])?;
        let request = self.client.get(url).query(&[
            ("db", "pubmed"),
            ("term", term.as_str()),
            ("retmax", Self::SEARCH_MAX),
            ("retmode", "json"),
        ]);
        let ids: SearchIdsEnvelope = send_json(request, "literature search").await?;

        let top: Vec<String> = ids.esearchresult.idlist.into_iter().take(self.summaries).collect();
        if top.is_empty() {
            return Ok(SourceFacts::default());
        }

        let joined = top.join(",");
        let url = endpoint(&self.base_url, &["esummary.fcgi"])?;
        let request = self.client.get(url).query(&[
            ("db", "pubmed"),
            ("id", joined.as_str()),
            ("retmode", "json"),
        ]);
        let summaries: SummaryEnvelope = send_json(request, "literature summaries").await?;

        let mut result = summaries.result;
        let order = if result.uids.is_empty() { top } else { std::mem::take(&mut result.uids) };
        let texts = order
            .iter()
            .filter_map(|uid| match result.articles.remove(uid) {
                Some(SummaryValue::Article { title }) if !title.trim().is_empty() => Some(title),
                _ => None,
            })
            .collect();

        Ok(SourceFacts {
            texts,
            ..Default::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Trial registry
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct StudiesEnvelope {
    #[serde(default)]
    studies: Vec<Study>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Study {
    #[serde(default)]
    protocol_section: Protocol,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Protocol {
    conditions_module: Option<ConditionsModule>,
    sponsor_collaborators_module: Option<SponsorModule>,
    design_module: Option<DesignModule>,
}

#[derive(Debug, Default, Deserialize)]
struct ConditionsModule {
    #[serde(default)]
    conditions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SponsorModule {
    lead_sponsor: Option<LeadSponsor>,
}

#[derive(Debug, Default, Deserialize)]
struct LeadSponsor {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DesignModule {
    #[serde(default)]
    phases: Vec<String>,
}

/// Conditions, sponsors and phases from a clinical trial registry.
pub struct TrialRegistrySource {
    client: Client,
    url: String,
}

impl TrialRegistrySource {
    pub const ID: &'static str = "trials";

    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FactSource for TrialRegistrySource {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn lookup(&self, molecule: &str, _brand: Option<&str>) -> Result<SourceFacts, SourceError> {
        let request = self.client.get(&self.url).query(&[
            ("query.term", molecule),
            ("pageSize", "50"),
            ("format", "json"),
        ]);
        let envelope: StudiesEnvelope = send_json(request, "trials").await?;

        let mut facts = SourceFacts::default();
        for study in envelope.studies {
            let protocol = study.protocol_section;
            let trial = TrialRecord {
                conditions: protocol.conditions_module.map(|m| m.conditions).unwrap_or_default(),
                sponsor: protocol
                    .sponsor_collaborators_module
                    .and_then(|m| m.lead_sponsor)
                    .and_then(|s| s.name),
                phases: protocol.design_module.map(|m| m.phases).unwrap_or_default(),
            };
            facts.sponsors.extend(trial.sponsor.clone());
            facts.trials.push(trial);
        }
        Ok(facts)
    }
}

/// The four HTTP fact sources, sharing one client.
pub fn http_sources(config: &FactSourceConfig) -> Result<Vec<Arc<dyn FactSource>>, SourceError> {
    let http = client(config.timeout_secs, None)?;
    Ok(vec![
        Arc::new(ChemicalNameSource::new(http.clone(), &config.chemical_names_url)),
        Arc::new(DrugApplicationSource::new(http.clone(), &config.drug_applications_url)),
        Arc::new(LiteratureSource::new(http.clone(), &config.literature_url)),
        Arc::new(TrialRegistrySource::new(http, &config.trials_url)),
    ])
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// Scripted fact source for tests.
pub struct MockFactSource {
    id: String,
    response: Result<SourceFacts, SourceError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockFactSource {
    /// A source that answers with `facts`.
    pub fn answering(id: impl Into<String>, facts: SourceFacts) -> Self {
        Self {
            id: id.into(),
            response: Ok(facts),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that always fails with `error`.
    pub fn failing(id: impl Into<String>, error: SourceError) -> Self {
        Self {
            id: id.into(),
            response: Err(error),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FactSource for MockFactSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn lookup(&self, _molecule: &str, _brand: Option<&str>) -> Result<SourceFacts, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_result_skips_uid_list() {
        let body = json!({"result": {
            "uids": ["2", "1"],
            "1": {"uid": "1", "title": "Darolutamide in nmCRPC"},
            "2": {"uid": "2", "title": "An androgen receptor antagonist"}
        }});
        let env: SummaryEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(env.result.uids, vec!["2", "1"]);
        assert!(matches!(env.result.articles.get("1"), Some(SummaryValue::Article { .. })));
    }

    #[test]
    fn trial_payload_decodes_with_missing_modules() {
        let body = json!({"studies": [
            {"protocolSection": {
                "conditionsModule": {"conditions": ["Prostate Cancer"]},
                "sponsorCollaboratorsModule": {"leadSponsor": {"name": "Bayer"}},
                "designModule": {"phases": ["PHASE3"]}
            }},
            {"protocolSection": {}}
        ]});
        let env: StudiesEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(env.studies.len(), 2);
        let first = &env.studies[0].protocol_section;
        assert_eq!(first.conditions_module.as_ref().unwrap().conditions, vec!["Prostate Cancer"]);
        assert!(env.studies[1].protocol_section.design_module.is_none());
    }

    #[test]
    fn synonyms_payload_decodes() {
        let body = json!({"InformationList": {"Information": [{"CID": 67171867, "Synonym": ["darolutamide", "ODM-201"]}]}});
        let env: SynonymsEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(env.information_list.information[0].synonyms.len(), 2);
    }

    #[test]
    fn not_found_is_empty() {
        let r: Result<Vec<String>, _> = empty_if_not_found(Err(SourceError::NotFound("x".into())));
        assert!(r.unwrap().is_empty());
        let r: Result<Vec<String>, _> = empty_if_not_found(Err(SourceError::Oversized));
        assert!(r.is_err());
    }

    #[tokio::test]
    async fn mock_counts_calls() {
        let mock = MockFactSource::failing("m", SourceError::Transient("down".into()));
        assert!(mock.lookup("x", None).await.is_err());
        assert!(mock.lookup("x", None).await.is_err());
        assert_eq!(mock.calls(), 2);
    }
}
