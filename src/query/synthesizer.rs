//! Query synthesis from an enrichment record
//!
//! Queries are produced in a fixed category order: core identity, the
//! universal pattern categories, the enrichment-driven categories, then
//! classification codes. Web-surface queries follow the registry ones.
//! The final list is deduplicated case-insensitively.

use super::classification::{
    codes_for_indication, codes_for_mechanism, COMBINATION_CODE, FORMULATION_CODES,
    GENERIC_CODES, PROCESS_CODE,
};
use super::types::{Query, QueryCategory, QuerySet};
use crate::config::QueryLimits;
use crate::enrichment::Taxonomy;
use crate::model::{EnrichmentRecord, QueryContext};

/// Characters the registry query syntax cannot escape.
const UNESCAPABLE: &[char] = &['(', ')', '/', '<', '>', '"', '\''];
const MIN_TERM_LEN: usize = 3;

const MAX_BRAND_LEN: usize = 30;
const MAX_DEV_CODE_LEN: usize = 20;
const MAX_SYNONYM_LEN: usize = 25;
const MAX_MECHANISM_LEN: usize = 60;
const MAX_INDICATION_LEN: usize = 60;
const MAX_COMPANY_LEN: usize = 60;

const FORMULATION_TERMS: &[&str] = &[
    "formulation",
    "pharmaceutical composition",
    "composition",
    "tablet",
    "capsule",
    "controlled release",
    "sustained release",
];

const CRYSTALLINE_TERMS: &[&str] = &[
    "crystalline",
    "crystal",
    "polymorph",
    "solid state",
    "form a",
    "form b",
    "form i",
    "form ii",
    "form 1",
    "form 2",
    "anhydrous",
    "hydrate",
    "solvate",
    "X-ray diffraction",
    "powder diffraction",
];

const SALT_TERMS: &[&str] = &[
    "salt",
    "pharmaceutically acceptable salt",
    "hydrochloride",
    "mesylate",
    "tosylate",
    "sulfate",
];

const PROCESS_TERMS: &[&str] = &["synthesis", "preparation", "process", "manufacturing"];

const COMBINATION_TERMS: &[&str] = &["combination", "combination therapy", "co-administration"];

/// Tokens that mark a name as a company rather than a person or institute.
const COMPANY_MARKERS: &[&str] = &[
    "pharma", "inc", "ltd", "corp", "gmbh", "sa", "ag", "ab", "llc", "co", "laboratories",
    "therapeutics",
];

const WEB_SITE: &str = "site:patents.google.com";
const WEB_YEAR_WINDOWS: &[(u16, u16)] = &[(2000, 2005), (2006, 2010)];
const WEB_DEV_CODES: usize = 3;

/// Collapse whitespace and strip characters the registry syntax cannot
/// escape. Applied to the molecule only; enrichment terms carrying such
/// characters are rejected instead.
pub fn clean_term(term: &str) -> String {
    term.chars()
        .filter(|c| !UNESCAPABLE.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A term is usable when it is at least three characters, at most
/// `max_len`, and free of unescapable characters.
pub fn is_valid_term(term: &str, max_len: usize) -> bool {
    let len = term.chars().count();
    len >= MIN_TERM_LEN && len <= max_len && !term.contains(UNESCAPABLE)
}

fn normalize(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when any token of `name` is a company marker.
pub fn looks_like_company(name: &str) -> bool {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| COMPANY_MARKERS.contains(&token) || token.contains("pharma"))
}

/// Turns facts into an ordered, deduplicated query list.
#[derive(Debug, Clone, Default)]
pub struct QuerySynthesizer {
    limits: QueryLimits,
}

impl QuerySynthesizer {
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    pub fn synthesize(&self, context: &QueryContext, record: &EnrichmentRecord) -> QuerySet {
        let mut set = QuerySet::new();
        let molecule = clean_term(context.molecule());
        if molecule.is_empty() {
            return set;
        }

        self.core(&mut set, &molecule, context.brand(), record);
        self.patterns(&mut set, &molecule);
        self.mechanisms(&mut set, &molecule, record);
        self.indications(&mut set, &molecule, record);
        self.companies(&mut set, &molecule, record);
        self.classification(&mut set, &molecule, record);
        self.web(&mut set, &molecule, record);

        tracing::debug!(
            molecule = %molecule,
            total = set.len(),
            "synthesized queries"
        );
        set
    }

    fn core(
        &self,
        set: &mut QuerySet,
        molecule: &str,
        brand: Option<&str>,
        record: &EnrichmentRecord,
    ) {
        fn push(set: &mut QuerySet, text: String) {
            set.push(Query::registry(text, QueryCategory::Core));
        }

        push(set, format!("txt=\"{}\"", molecule));
        push(set, format!("ti=\"{}\"", molecule));
        push(set, format!("ab=\"{}\"", molecule));

        let brand = brand.map(normalize).filter(|b| is_valid_term(b, MAX_BRAND_LEN));
        if let Some(brand) = &brand {
            push(set, format!("txt=\"{}\"", brand));
            push(set, format!("ti=\"{}\"", brand));
        }

        let taxonomy = Taxonomy::standard();
        let codes = record
            .dev_codes
            .iter()
            .map(normalize)
            .filter(|c| taxonomy.is_dev_code(c) && is_valid_term(c, MAX_DEV_CODE_LEN))
            .take(self.limits.dev_codes);
        for code in codes {
            let compact = code.replace('-', "");
            push(set, format!("txt=\"{}\"", code));
            if compact != code {
                push(set, format!("txt=\"{}\"", compact));
            }
        }

        for number in record
            .registry_numbers
            .iter()
            .filter(|n| is_valid_term(n, MAX_DEV_CODE_LEN))
            .take(self.limits.registry_numbers)
        {
            push(set, format!("txt=\"{}\"", number));
        }

        let molecule_lower = molecule.to_lowercase();
        let brand_lower = brand.as_deref().map(str::to_lowercase);
        let synonyms = record
            .synonyms
            .iter()
            .map(normalize)
            .filter(|s| is_valid_term(s, MAX_SYNONYM_LEN))
            .filter(|s| {
                let lower = s.to_lowercase();
                lower != molecule_lower && Some(&lower) != brand_lower.as_ref()
            })
            .take(self.limits.synonyms);
        for synonym in synonyms {
            push(set, format!("txt=\"{}\"", synonym));
        }
    }

    fn patterns(&self, set: &mut QuerySet, molecule: &str) {
        let groups: [(QueryCategory, &[&str]); 5] = [
            (QueryCategory::Formulation, FORMULATION_TERMS),
            (QueryCategory::Crystalline, CRYSTALLINE_TERMS),
            (QueryCategory::Salt, SALT_TERMS),
            (QueryCategory::Process, PROCESS_TERMS),
            (QueryCategory::Combination, COMBINATION_TERMS),
        ];
        for (category, terms) in groups {
            for term in terms {
                set.push(Query::registry(
                    format!("txt=\"{}\" and txt=\"{}\"", molecule, term),
                    category,
                ));
            }
        }
    }

    fn valid_mechanisms<'a>(&self, record: &'a EnrichmentRecord) -> impl Iterator<Item = String> + 'a {
        record
            .mechanisms
            .iter()
            .map(normalize)
            .filter(|m| is_valid_term(m, MAX_MECHANISM_LEN))
            .take(self.limits.mechanisms)
    }

    fn valid_indications<'a>(&self, record: &'a EnrichmentRecord) -> impl Iterator<Item = String> + 'a {
        record
            .indications
            .iter()
            .map(normalize)
            .filter(|i| is_valid_term(i, MAX_INDICATION_LEN))
            .take(self.limits.indications)
    }

    fn mechanisms(&self, set: &mut QuerySet, molecule: &str, record: &EnrichmentRecord) {
        for mechanism in self.valid_mechanisms(record) {
            for text in [
                format!("txt=\"{}\"", mechanism),
                format!("ti=\"{}\"", mechanism),
                format!("txt=\"{}\" and txt=\"{}\"", molecule, mechanism),
            ] {
                set.push(Query::registry(text, QueryCategory::Mechanism));
            }
        }
    }

    fn indications(&self, set: &mut QuerySet, molecule: &str, record: &EnrichmentRecord) {
        for indication in self.valid_indications(record) {
            for text in [
                format!("txt=\"{}\" and txt=\"{}\"", molecule, indication),
                format!("txt=\"{}\" and txt=\"treatment\" and txt=\"{}\"", molecule, indication),
            ] {
                set.push(Query::registry(text, QueryCategory::Indication));
            }
        }
    }

    fn companies(&self, set: &mut QuerySet, molecule: &str, record: &EnrichmentRecord) {
        let focus = record
            .indications
            .first()
            .map(normalize)
            .filter(|i| is_valid_term(i, MAX_INDICATION_LEN));
        let companies = record
            .companies
            .iter()
            .filter(|c| looks_like_company(c))
            .map(normalize)
            .filter(|c| is_valid_term(c, MAX_COMPANY_LEN))
            .take(self.limits.companies);

        for company in companies {
            set.push(Query::registry(
                format!("pa=\"{}\" and txt=\"{}\"", company, molecule),
                QueryCategory::Company,
            ));
            if let Some(focus) = &focus {
                set.push(Query::registry(
                    format!("pa=\"{}\" and ti=\"{}\"", company, focus),
                    QueryCategory::Company,
                ));
            }
        }
    }

    fn classification(&self, set: &mut QuerySet, molecule: &str, record: &EnrichmentRecord) {
        let mut code = |text: String| {
            set.push(Query::registry(text, QueryCategory::Classification));
        };

        let fixed = GENERIC_CODES
            .iter()
            .chain(FORMULATION_CODES)
            .chain([&PROCESS_CODE, &COMBINATION_CODE]);
        for ipc in fixed {
            code(format!("ic=\"{}\" and txt=\"{}\"", ipc, molecule));
        }

        for mechanism in self.valid_mechanisms(record) {
            let codes = codes_for_mechanism(&mechanism);
            if let Some(first) = codes.first() {
                code(format!("txt=\"{}\" and ic=\"{}\"", mechanism, first));
            }
            for ipc in codes {
                code(format!("ic=\"{}\" and txt=\"{}\"", ipc, molecule));
            }
        }

        for indication in self.valid_indications(record) {
            let codes = codes_for_indication(&indication);
            if let Some(first) = codes.first() {
                code(format!("txt=\"{}\" and ic=\"{}\"", indication, first));
            }
            for ipc in codes {
                code(format!("ic=\"{}\" and txt=\"{}\"", ipc, molecule));
            }
        }
    }

    fn web(&self, set: &mut QuerySet, molecule: &str, record: &EnrichmentRecord) {
        let taxonomy = Taxonomy::standard();
        let dev_codes: Vec<String> = record
            .dev_codes
            .iter()
            .map(normalize)
            .filter(|c| taxonomy.is_dev_code(c))
            .take(WEB_DEV_CODES)
            .collect();

        let mut texts = vec![format!("\"{}\" patent WO {}", molecule, WEB_SITE)];
        if let Some(number) = record.registry_numbers.first() {
            texts.push(format!("\"{}\" patent WO {}", number, WEB_SITE));
        }
        for code in &dev_codes {
            texts.push(format!("\"{}\" patent WO {}", code, WEB_SITE));
        }
        for (start, end) in WEB_YEAR_WINDOWS {
            texts.push(format!(
                "\"{}\" patent WO{}..WO{} {}",
                molecule, start, end, WEB_SITE
            ));
        }
        if let Some(code) = dev_codes.first() {
            texts.push(format!("\"{}\" OR \"{}\" patent WO {}", molecule, code, WEB_SITE));
        }

        for text in texts.into_iter().take(self.limits.web_cap) {
            set.push(Query::web(text));
        }
    }
}
