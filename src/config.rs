//! Search configuration
//!
//! Loaded from YAML. Every section and field has a default, so a partial
//! file (or none at all) is valid. Registry credentials are read from the
//! environment only.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const OPS_KEY_VAR: &str = "PATFINDER_OPS_KEY";
pub const OPS_SECRET_VAR: &str = "PATFINDER_OPS_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Top-level configuration for one search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub limits: EnrichmentLimits,
    pub queries: QueryLimits,
    pub expansion: ExpansionConfig,
    pub pacing: PacingConfig,
    pub registry: RegistryConfig,
    pub web: WebConfig,
    pub fact_sources: FactSourceConfig,
}

/// Per-category caps and term lengths for the enrichment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentLimits {
    pub synonyms: usize,
    pub dev_codes: usize,
    pub registry_numbers: usize,
    pub companies: usize,
    pub mechanisms: usize,
    pub indications: usize,
    pub max_term_len: usize,
    pub max_company_len: usize,
}

impl Default for EnrichmentLimits {
    fn default() -> Self {
        Self {
            synonyms: 50,
            dev_codes: 20,
            registry_numbers: 10,
            companies: 30,
            mechanisms: 20,
            indications: 20,
            max_term_len: 100,
            max_company_len: 120,
        }
    }
}

/// Per-category caps on synthesized queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    pub dev_codes: usize,
    pub synonyms: usize,
    pub registry_numbers: usize,
    pub mechanisms: usize,
    pub indications: usize,
    pub companies: usize,
    /// Upper bound on web-surface queries.
    pub web_cap: usize,
    /// Matches requested per registry query.
    pub results_per_query: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            dev_codes: 10,
            synonyms: 5,
            registry_numbers: 3,
            mechanisms: 8,
            indications: 8,
            companies: 10,
            web_cap: 10,
            results_per_query: 100,
        }
    }
}

/// Frontier sizes for the two expansion passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub priority_frontier: usize,
    pub citation_frontier: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            priority_frontier: 15,
            citation_frontier: 10,
        }
    }
}

impl ExpansionConfig {
    /// Citation frontier, never larger than the priority frontier.
    pub fn effective_citation_frontier(&self) -> usize {
        self.citation_frontier.min(self.priority_frontier)
    }
}

/// Minimum spacing between calls, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Between registry search queries.
    pub registry_ms: u64,
    /// Between family, citation and point lookups.
    pub lookup_ms: u64,
    pub web_ms: u64,
    pub fact_source_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            registry_ms: 200,
            lookup_ms: 300,
            web_ms: 15_000,
            fact_source_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    pub auth_url: String,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ops.epo.org/3.2/rest-services".to_string(),
            auth_url: "https://ops.epo.org/3.2/auth/accesstoken".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Consumer key and secret for the registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub key: String,
    pub secret: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("key", &"***")
            .field("secret", &"***")
            .finish()
    }
}

impl RegistryConfig {
    /// Credentials from the environment, if both variables are set and non-empty.
    pub fn credentials(&self) -> Option<RegistryCredentials> {
        let key = env::var(OPS_KEY_VAR).ok().filter(|v| !v.trim().is_empty())?;
        let secret = env::var(OPS_SECRET_VAR).ok().filter(|v| !v.trim().is_empty())?;
        Some(RegistryCredentials { key, secret })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Disable to run registry-only searches.
    pub enabled: bool,
    pub search_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_url: "https://www.google.com/search".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactSourceConfig {
    pub chemical_names_url: String,
    pub drug_applications_url: String,
    pub literature_url: String,
    pub trials_url: String,
    pub timeout_secs: u64,
}

impl Default for FactSourceConfig {
    fn default() -> Self {
        Self {
            chemical_names_url: "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string(),
            drug_applications_url: "https://api.fda.gov/drug/drugsfda.json".to_string(),
            literature_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            trials_url: "https://clinicaltrials.gov/api/v2/studies".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SearchConfig {
    /// Default config file location: `<config_dir>/patfinder/config.yaml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("patfinder").join("config.yaml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SearchConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.expansion.priority_frontier, 15);
        assert_eq!(config.pacing.lookup_ms, 300);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "expansion:\n  priority_frontier: 12\npacing:\n  web_ms: 0").unwrap();

        let config = SearchConfig::load(file.path()).unwrap();
        assert_eq!(config.expansion.priority_frontier, 12);
        assert_eq!(config.expansion.citation_frontier, 10);
        assert_eq!(config.pacing.web_ms, 0);
        assert_eq!(config.pacing.registry_ms, 200);
        assert_eq!(config.queries.results_per_query, 100);
    }

    #[test]
    fn citation_frontier_is_clamped() {
        let config = ExpansionConfig {
            priority_frontier: 4,
            citation_frontier: 10,
        };
        assert_eq!(config.effective_citation_frontier(), 4);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "expansion: [not, a, map]").unwrap();
        let err = SearchConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn credentials_are_redacted_in_debug() {
        let creds = RegistryCredentials {
            key: "k".into(),
            secret: "s3cret".into(),
        };
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }
}
