//! Static classification-code tables
//!
//! Technical codes (A61K subclasses) are chosen from detected mechanisms and
//! therapeutic-activity codes (A61P) from detected indications. Tables are
//! scanned in order and the first pattern contained in the term wins, so
//! the more specific patterns come first.

/// Mechanism pattern to technical classification codes.
pub const MECHANISM_CODES: &[(&str, &[&str])] = &[
    ("tyrosine kinase inhibitor", &["A61K31/519"]),
    ("kinase inhibitor", &["A61K31/519", "A61K31/5377"]),
    ("androgen receptor antagonist", &["A61K31/44", "A61K31/4439"]),
    ("androgen receptor agonist", &["A61K31/568"]),
    ("estrogen receptor", &["A61K31/56"]),
    ("parp inhibitor", &["A61K31/519", "A61K31/5377"]),
    ("proteasome inhibitor", &["A61K31/395"]),
    ("ace inhibitor", &["A61K31/401"]),
    ("hmg-coa reductase inhibitor", &["A61K31/40"]),
    ("gpcr", &["A61K31/40", "A61K31/44"]),
    ("ion channel", &["A61K31/135", "A61K31/137"]),
    ("serotonin", &["A61K31/404"]),
    ("dopamine", &["A61K31/137"]),
    ("antiviral", &["A61K31/7076"]),
    ("antibiotic", &["A61K31/43"]),
    ("inhibitor", &["A61K31"]),
    ("antagonist", &["A61K31"]),
    ("agonist", &["A61K31"]),
    ("modulator", &["A61K31"]),
];

/// Indication pattern to therapeutic-activity codes.
pub const INDICATION_CODES: &[(&str, &[&str])] = &[
    ("prostate cancer", &["A61P13/08", "A61P35/00"]),
    ("breast cancer", &["A61P35/00"]),
    ("lung cancer", &["A61P35/00", "A61P11/00"]),
    ("leukemia", &["A61P35/02"]),
    ("cancer", &["A61P35/00"]),
    ("hypertension", &["A61P9/12"]),
    ("heart failure", &["A61P9/04"]),
    ("arrhythmia", &["A61P9/06"]),
    ("alzheimer", &["A61P25/28"]),
    ("parkinson", &["A61P25/16"]),
    ("epilepsy", &["A61P25/08"]),
    ("pain", &["A61P29/00", "A61P25/04"]),
    ("diabetes", &["A61P3/10"]),
    ("obesity", &["A61P3/04"]),
    ("hiv", &["A61P31/18"]),
    ("hepatitis", &["A61P31/12"]),
    ("infection", &["A61P31/00"]),
    ("inflammation", &["A61P29/00"]),
    ("arthritis", &["A61P19/02"]),
    ("asthma", &["A61P11/06"]),
    ("depression", &["A61P25/24"]),
    ("anxiety", &["A61P25/22"]),
    ("schizophrenia", &["A61P25/18"]),
];

/// Codes that apply to every pharmaceutical, combined with the molecule name.
pub const GENERIC_CODES: &[&str] = &["A61K", "A61K31", "A61K9"];

/// Tablet and capsule preparations.
pub const FORMULATION_CODES: &[&str] = &["A61K9/20", "A61K9/48"];

/// Organic chemistry, used with process queries.
pub const PROCESS_CODE: &str = "C07";

/// Combinations of active ingredients.
pub const COMBINATION_CODE: &str = "A61K45/06";

const MECHANISM_FALLBACK: &[&str] = &["A61K31"];
const INDICATION_FALLBACK: &[&str] = &["A61P"];

fn lookup(table: &[(&str, &'static [&'static str])], term: &str) -> Option<&'static [&'static str]> {
    let term = term.to_lowercase();
    table
        .iter()
        .find(|(pattern, _)| term.contains(pattern))
        .map(|(_, codes)| *codes)
}

/// Technical codes for a mechanism, falling back to `A61K31`.
pub fn codes_for_mechanism(mechanism: &str) -> &'static [&'static str] {
    lookup(MECHANISM_CODES, mechanism).unwrap_or(MECHANISM_FALLBACK)
}

/// Therapeutic-activity codes for an indication, falling back to `A61P`.
pub fn codes_for_indication(indication: &str) -> &'static [&'static str] {
    lookup(INDICATION_CODES, indication).unwrap_or(INDICATION_FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_patterns_win() {
        assert_eq!(codes_for_mechanism("Tyrosine kinase inhibitor"), &["A61K31/519"]);
        assert_eq!(
            codes_for_mechanism("androgen receptor antagonist"),
            &["A61K31/44", "A61K31/4439"]
        );
        assert_eq!(
            codes_for_indication("metastatic prostate cancer"),
            &["A61P13/08", "A61P35/00"]
        );
    }

    #[test]
    fn unknown_terms_fall_back() {
        assert_eq!(codes_for_mechanism("something else"), &["A61K31"]);
        assert_eq!(codes_for_indication("gout"), &["A61P"]);
    }
}
