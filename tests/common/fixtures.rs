//! Scripted sources for the darolutamide scenario

use async_trait::async_trait;
use patfinder::enrichment::{SourceFacts, TrialRecord};
use patfinder::source::{Bibliography, FamilyMember, LocalizedText, MarkupFetcher, MockRegistry};
use patfinder::SourceError;
use std::sync::Mutex;

pub const SEED: &str = "WO2011051540";
pub const SIBLING: &str = "WO2012134273";
pub const BR_PATENT: &str = "BR112012008823";

pub fn darolutamide_facts() -> SourceFacts {
    SourceFacts {
        names: vec!["ODM-201".into(), "1297538-32-9".into(), "BAY-1841788".into()],
        brands: vec!["Nubeqa".into()],
        sponsors: vec!["Bayer HealthCare Pharmaceuticals Inc.".into()],
        trials: vec![TrialRecord {
            conditions: vec!["Prostate Cancer".into()],
            sponsor: Some("Bayer".into()),
            phases: vec!["PHASE3".into()],
        }],
        texts: vec!["Darolutamide, a nonsteroidal androgen receptor antagonist".into()],
        ..Default::default()
    }
}

fn title(lang: &str, text: &str) -> LocalizedText {
    LocalizedText {
        lang: Some(lang.into()),
        text: text.into(),
    }
}

/// Seed found by the core query; its family holds a sibling and BR, US
/// and MX members. The BR member arrives without a title.
pub fn darolutamide_registry() -> MockRegistry {
    MockRegistry::new()
        .with_search("txt=\"darolutamide\"", &[SEED])
        .with_search("txt=\"ODM-201\"", &[SEED, "wo2011051540"])
        .with_family(
            SEED,
            vec![
                FamilyMember::published_as("WO", "2011051540"),
                FamilyMember::published_as("WO", "2012134273"),
                FamilyMember::published_as("BR", "112012008823").with_biblio(Bibliography {
                    applicants: vec!["ORION CORP".into()],
                    filing_date: Some("2010-10-27".into()),
                    ..Default::default()
                }),
                FamilyMember::published_as("US", "8975254").with_biblio(Bibliography {
                    titles: vec![title("en", "Androgen receptor modulating compounds")],
                    applicants: vec!["ORION CORP".into()],
                    classifications: vec!["C07D403/10".into()],
                    filing_date: Some("2010-10-27".into()),
                    ..Default::default()
                }),
                FamilyMember::published_as("MX", "2012004784"),
            ],
        )
        .with_citing(SEED, &["WO2016162604"])
        .with_publication(
            BR_PATENT,
            Bibliography {
                titles: vec![
                    title("pt", "Compostos moduladores de receptores androgênicos"),
                    title("en", "Androgen receptor modulating compounds"),
                ],
                applicants: vec!["Orion Corporation".into()],
                classifications: vec!["A61K31/4155".into()],
                ..Default::default()
            },
        )
}

/// Markup fetcher answering every query with the same page.
pub struct CannedFetcher {
    page: String,
    queries: Mutex<Vec<String>>,
}

impl CannedFetcher {
    pub fn new(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarkupFetcher for CannedFetcher {
    async fn fetch(&self, query: &str) -> Result<String, SourceError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.page.clone())
    }
}
