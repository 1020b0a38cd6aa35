//! Patent registry adapter over HTTP
//!
//! Speaks the registry's JSON REST interface with an OAuth2
//! client-credentials token. The token is cached and refreshed shortly
//! before it expires; a 401 drops the cached token and retries once.

use super::error::SourceError;
use super::http::{client, endpoint};
use super::payload::{FamilyEnvelope, PublicationEnvelope, SearchEnvelope, TokenResponse};
use super::rate::{NoDelay, RateGate};
use super::traits::{Bibliography, FamilyDetail, FamilyMember, RegistryLookup, SearchAdapter};
use crate::config::{RegistryConfig, RegistryCredentials};
use crate::model::CandidateId;
use crate::query::{Query, Surface};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Refresh this long before the registry says the token expires.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct OpsRegistry {
    client: Client,
    config: RegistryConfig,
    credentials: RegistryCredentials,
    results_per_query: usize,
    token: Mutex<Option<CachedToken>>,
    search_gate: Arc<dyn RateGate>,
    lookup_gate: Arc<dyn RateGate>,
}

impl OpsRegistry {
    pub const ID: &'static str = "registry";

    pub fn new(config: RegistryConfig, credentials: RegistryCredentials) -> Result<Self, SourceError> {
        let client = client(config.timeout_secs, None)?;
        Ok(Self {
            client,
            config,
            credentials,
            results_per_query: 100,
            token: Mutex::new(None),
            search_gate: Arc::new(NoDelay),
            lookup_gate: Arc::new(NoDelay),
        })
    }

    /// Cap on matches requested per search. The registry serves at most 100.
    pub fn with_results_per_query(mut self, n: usize) -> Self {
        self.results_per_query = n.clamp(1, 100);
        self
    }

    /// Gate for search queries.
    pub fn with_search_gate(mut self, gate: Arc<dyn RateGate>) -> Self {
        self.search_gate = gate;
        self
    }

    /// Gate for family, citation and point lookups.
    pub fn with_lookup_gate(mut self, gate: Arc<dyn RateGate>) -> Self {
        self.lookup_gate = gate;
        self
    }

    async fn token(&self) -> Result<String, SourceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("requesting registry access token");
        let response = self
            .client
            .post(&self.config.auth_url)
            .basic_auth(&self.credentials.key, Some(&self.credentials.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            // Any refusal from the token endpoint means the credentials are bad.
            return Err(match SourceError::from_status(status, "token") {
                SourceError::Transient(msg) if status.is_client_error() => SourceError::Auth(msg),
                other => other,
            });
        }
        let body: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;

        let expires_at = Instant::now() + Duration::from_secs(body.ttl_secs());
        let value = body.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        token: &str,
        context: &str,
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status(status, context));
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Parse(format!("{}: {}", context, e)))
    }

    /// Authenticated GET; a rejected token is refreshed and the call retried
    /// once. A refusal from the token endpoint itself is not retried.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, SourceError> {
        let token = self.token().await?;
        match self.get_once(&url, &token, context).await {
            Err(SourceError::Auth(msg)) => {
                tracing::debug!(context, %msg, "token rejected, refreshing");
                self.invalidate().await;
                let token = self.token().await?;
                self.get_once(&url, &token, context).await
            }
            other => other,
        }
    }

    fn search_url(&self, cql: &str) -> Result<Url, SourceError> {
        let mut url = endpoint(&self.config.base_url, &["published-data", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", cql)
            .append_pair("Range", &format!("1-{}", self.results_per_query));
        Ok(url)
    }

    async fn run_search(&self, cql: &str) -> Result<Vec<CandidateId>, SourceError> {
        let url = self.search_url(cql)?;
        match self.get_json::<SearchEnvelope>(url, "search").await {
            Ok(envelope) => Ok(envelope.international_ids()),
            // The registry answers 404 when nothing matches.
            Err(SourceError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SearchAdapter for OpsRegistry {
    fn id(&self) -> &str {
        Self::ID
    }

    fn surface(&self) -> Surface {
        Surface::Registry
    }

    async fn search(&self, query: &Query) -> Result<BTreeSet<CandidateId>, SourceError> {
        self.search_gate.wait().await;
        let ids = self.run_search(&query.text).await?;
        tracing::debug!(query = %query.text, found = ids.len(), "registry search");
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl RegistryLookup for OpsRegistry {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn family(
        &self,
        id: &CandidateId,
        detail: FamilyDetail,
    ) -> Result<Vec<FamilyMember>, SourceError> {
        self.lookup_gate.wait().await;
        let mut segments = vec!["family", "publication", "docdb", id.as_str()];
        if detail == FamilyDetail::WithBiblio {
            segments.push("biblio");
        }
        let url = endpoint(&self.config.base_url, &segments)?;
        let envelope: FamilyEnvelope = self.get_json(url, "family").await?;
        Ok(envelope.members())
    }

    async fn citing(&self, id: &CandidateId) -> Result<Vec<CandidateId>, SourceError> {
        self.lookup_gate.wait().await;
        let cql = format!("ct=\"{}\"", id);
        let ids = self.run_search(&cql).await?;
        Ok(ids.into_iter().filter(|c| *c != *id).collect())
    }

    async fn publication(&self, patent_number: &str) -> Result<Option<Bibliography>, SourceError> {
        self.lookup_gate.wait().await;
        let url = endpoint(
            &self.config.base_url,
            &["published-data", "publication", "epodoc", patent_number, "biblio"],
        )?;
        match self.get_json::<PublicationEnvelope>(url, "publication").await {
            Ok(envelope) => Ok(envelope.bibliography()),
            Err(SourceError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
