//! Classification taxonomy for raw facts
//!
//! One ordered table of pattern rules decides what a raw string is
//! (structural identifier, registry number, development code, or plain
//! synonym). Rules are evaluated most specific first and the first match
//! wins. Mechanism and indication detection use their own ordered tables.

use crate::model::PatentTypeHint;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// What a raw name string turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Structural identifier such as an InChIKey.
    ChemicalId,
    /// CAS-like number or another registry accession.
    RegistryNumber,
    DevCode,
    Synonym,
}

struct ClassificationRule {
    kind: TermKind,
    pattern: Regex,
    /// Upper bound on term length for this rule, in bytes.
    max_len: usize,
}

/// Canonical indications and the keywords that reveal them.
const INDICATIONS: &[(&str, &[&str])] = &[
    ("prostate cancer", &["prostate cancer", "prostate carcinoma", "castration resistant", "castration-resistant"]),
    ("breast cancer", &["breast cancer", "breast carcinoma"]),
    ("lung cancer", &["lung cancer", "nsclc", "sclc"]),
    ("leukemia", &["leukemia", "leukaemia", "lymphoma", "myeloma"]),
    ("cancer", &["cancer", "carcinoma", "tumor", "tumour", "neoplasm", "oncology", "malignancy"]),
    ("hypertension", &["hypertension", "high blood pressure"]),
    ("heart failure", &["heart failure", "cardiac failure", "chf"]),
    ("arrhythmia", &["arrhythmia", "atrial fibrillation", "afib"]),
    ("alzheimer", &["alzheimer", "dementia", "cognitive impairment"]),
    ("parkinson", &["parkinson", "parkinsonian"]),
    ("epilepsy", &["epilepsy", "seizure"]),
    ("pain", &["pain", "analgesia", "nociception"]),
    ("diabetes", &["diabetes", "diabetic", "hyperglycemia"]),
    ("obesity", &["obesity", "weight loss", "anti-obesity"]),
    ("hiv", &["hiv", "aids", "antiretroviral"]),
    ("hepatitis", &["hepatitis", "hcv", "hbv"]),
    ("infection", &["infection", "antibiotic", "antimicrobial"]),
    ("inflammation", &["inflammation", "inflammatory"]),
    ("arthritis", &["arthritis", "rheumatoid"]),
    ("asthma", &["asthma", "copd"]),
    ("depression", &["depression", "antidepressant"]),
    ("anxiety", &["anxiety", "anxiolytic"]),
    ("schizophrenia", &["schizophrenia", "psychosis", "antipsychotic"]),
];

/// Therapeutic areas by canonical indication. First area with a hit wins.
const AREAS: &[(&str, &[&str])] = &[
    ("oncology", &["cancer", "prostate cancer", "breast cancer", "lung cancer", "leukemia"]),
    ("cardiology", &["hypertension", "heart failure", "arrhythmia"]),
    ("neurology", &["alzheimer", "parkinson", "epilepsy", "pain"]),
    ("metabolic", &["diabetes", "obesity"]),
    ("infectious", &["hiv", "hepatitis", "infection"]),
    ("immunology", &["inflammation", "arthritis", "asthma"]),
    ("psychiatry", &["depression", "anxiety", "schizophrenia"]),
];

pub const GENERAL_AREA: &str = "general";

const PATENT_TYPES: &[(PatentTypeHint, &[&str])] = &[
    (
        PatentTypeHint::ProductDerivative,
        &["salt", "polymorph", "crystal", "ester", "prodrug", "metabolite", "hydrate", "solvate"],
    ),
    (
        PatentTypeHint::Formulation,
        &["formulation", "composition", "tablet", "capsule", "dosage"],
    ),
    (
        PatentTypeHint::Process,
        &["synthesis", "preparation", "process", "manufacturing", "method of making"],
    ),
    (
        PatentTypeHint::Combination,
        &["combination", "co-administration", "fixed-dose", "dual therapy"],
    ),
    (
        PatentTypeHint::NewUse,
        &["treatment", "therapy", "method of treating", "for use in"],
    ),
];

const MECHANISM_MIN_LEN: usize = 5;
const MECHANISM_MAX_LEN: usize = 60;

/// Words a captured span may open with that are not part of the mechanism.
const LEADING_FILLERS: &[&str] = &["a", "an", "the", "is"];

/// The compiled rule tables.
pub struct Taxonomy {
    rules: Vec<ClassificationRule>,
    mechanisms: Vec<Regex>,
}

fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("taxonomy patterns are valid")
}

impl Taxonomy {
    /// The shared, lazily compiled taxonomy.
    pub fn standard() -> &'static Taxonomy {
        static TAXONOMY: OnceLock<Taxonomy> = OnceLock::new();
        TAXONOMY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let rule = |kind, src: &str, max_len| ClassificationRule {
            kind,
            pattern: pattern(src),
            max_len,
        };
        let rules = vec![
            rule(TermKind::ChemicalId, r"^[A-Z]{14}-[A-Z]{10}-[A-Z]$", 27),
            rule(TermKind::RegistryNumber, r"^\d{2,7}-\d{2}-\d$", 12),
            rule(TermKind::RegistryNumber, r"(?i)^UNII-[A-Z0-9]{10}$", 15),
            rule(TermKind::RegistryNumber, r"(?i)^CHEMBL\d+$", 20),
            rule(TermKind::RegistryNumber, r"^DB\d{5}$", 7),
            rule(TermKind::RegistryNumber, r"(?i)^DTXSID\d+$", 20),
            rule(TermKind::DevCode, r"(?i)^[A-Z]{2,5}-?\d{3,7}[A-Z]?$", 19),
        ];

        let suffix = "inhibitor|antagonist|agonist|modulator|blocker";
        let mechanisms = vec![
            pattern(&format!(r"\b(\w+\s+\w+\s+\w+)\s+({})\b", suffix)),
            pattern(&format!(r"\b(\w+\s+\w+)\s+({})\b", suffix)),
            pattern(r"\b(nonsteroidal\s+\w+)"),
            pattern(r"\b(non-steroidal\s+\w+)"),
            pattern(r"\b(anti-\w+)"),
            pattern(r"\b(anti\s+\w+)"),
            pattern(r"\b(anti\w{6,})"),
            pattern(r"\b(\w+\s+receptor)\s+(inhibitor|antagonist|agonist|modulator)\b"),
            pattern(r"\b(\w{4,})\s+(inhibitor|antagonist|agonist|modulator|blocker|activator)\b"),
            pattern(r"\b(selective)\s+(\w+)\s+(inhibitor|antagonist)\b"),
        ];

        Self { rules, mechanisms }
    }

    /// Classify one raw name. The first matching rule decides.
    pub fn classify(&self, term: &str) -> TermKind {
        let term = term.trim();
        self.rules
            .iter()
            .find(|r| term.len() <= r.max_len && r.pattern.is_match(term))
            .map(|r| r.kind)
            .unwrap_or(TermKind::Synonym)
    }

    pub fn is_dev_code(&self, term: &str) -> bool {
        self.classify(term) == TermKind::DevCode
    }

    /// Mechanism phrases found in `texts`, deduplicated case-insensitively
    /// in first-seen order.
    pub fn detect_mechanisms<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for text in texts {
            let lower = text.to_lowercase();
            for re in &self.mechanisms {
                for caps in re.captures_iter(&lower) {
                    let joined = caps
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    let mechanism = joined
                        .split_whitespace()
                        .skip_while(|w| LEADING_FILLERS.contains(w))
                        .collect::<Vec<_>>()
                        .join(" ");

                    if mechanism.len() < MECHANISM_MIN_LEN || mechanism.len() > MECHANISM_MAX_LEN {
                        continue;
                    }
                    if mechanism == "anti" || mechanism == "selective" {
                        continue;
                    }
                    if seen.insert(mechanism.clone()) {
                        found.push(mechanism);
                    }
                }
            }
        }
        found
    }

    /// Canonical indications whose keywords appear in `texts`, first-seen order.
    pub fn detect_indications<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for text in texts {
            let lower = text.to_lowercase();
            for (indication, keywords) in INDICATIONS {
                if keywords.iter().any(|k| lower.contains(k))
                    && !found.iter().any(|f| f == indication)
                {
                    found.push(indication.to_string());
                }
            }
        }
        found
    }

    /// Therapeutic area for a set of canonical indications.
    pub fn therapeutic_area<S: AsRef<str>>(&self, indications: &[S]) -> &'static str {
        AREAS
            .iter()
            .find(|(_, members)| {
                indications
                    .iter()
                    .any(|i| members.contains(&i.as_ref().to_lowercase().as_str()))
            })
            .map(|(area, _)| *area)
            .unwrap_or(GENERAL_AREA)
    }

    /// Patent types hinted at by the synonym pool.
    pub fn patent_types<'a>(&self, synonyms: impl IntoIterator<Item = &'a str>) -> Vec<PatentTypeHint> {
        let text = synonyms
            .into_iter()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        PATENT_TYPES
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(hint, _)| *hint)
            .collect()
    }
}

/// Representative search keyword for a therapeutic area.
pub fn area_keyword(area: &str) -> Option<&'static str> {
    match area {
        "oncology" => Some("cancer"),
        "cardiology" => Some("cardiovascular"),
        "neurology" => Some("neurological"),
        "metabolic" => Some("metabolic"),
        "infectious" => Some("infection"),
        "immunology" => Some("inflammatory"),
        "psychiatry" => Some("psychiatric"),
        _ => None,
    }
}
