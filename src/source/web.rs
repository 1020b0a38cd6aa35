//! Web search surface
//!
//! Markup is fetched by a [`MarkupFetcher`]; the adapter only pulls
//! international publication numbers out of it. Swapping the fetching
//! mechanism never touches the adapter or the pipeline.

use super::error::SourceError;
use super::http::client;
use super::rate::{NoDelay, RateGate};
use super::traits::SearchAdapter;
use crate::config::WebConfig;
use crate::model::CandidateId;
use crate::query::{Query, Surface};
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

/// Fetches the raw result markup for one query.
#[async_trait]
pub trait MarkupFetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<String, SourceError>;
}

/// Plain HTTP fetcher. Every call opens its own session, which is dropped
/// when the call returns, on success or failure.
pub struct HttpMarkupFetcher {
    config: WebConfig,
}

impl HttpMarkupFetcher {
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MarkupFetcher for HttpMarkupFetcher {
    async fn fetch(&self, query: &str) -> Result<String, SourceError> {
        let session = client(self.config.timeout_secs, Some(&self.config.user_agent))?;
        let response = session
            .get(&self.config.search_url)
            .query(&[("q", query), ("num", "100")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::from_status(status, "web search"));
        }
        Ok(response.text().await?)
    }
}

fn wo_pattern() -> &'static Regex {
    static WO: OnceLock<Regex> = OnceLock::new();
    // WO2011051540, WO 2011 051540, WO2011/051540, WO/2011/051540, WO2011051540A1.
    // A seventh serial digit means a longer number, not a match.
    WO.get_or_init(|| {
        Regex::new(r"(?i)\bWO\s*/?\s*(\d{4})\s*/?\s*(\d{6})(?:\D|$)")
            .expect("publication pattern is valid")
    })
}

/// International publication numbers mentioned in `markup`, canonicalized.
pub fn extract_ids(markup: &str) -> BTreeSet<CandidateId> {
    wo_pattern()
        .captures_iter(markup)
        .filter_map(|caps| {
            let number = format!("{}{}", &caps[1], &caps[2]);
            CandidateId::from_parts("WO", &number)
        })
        .collect()
}

pub struct WebSearchAdapter {
    fetcher: Arc<dyn MarkupFetcher>,
    gate: Arc<dyn RateGate>,
}

impl WebSearchAdapter {
    pub const ID: &'static str = "web";

    pub fn new(fetcher: Arc<dyn MarkupFetcher>) -> Self {
        Self {
            fetcher,
            gate: Arc::new(NoDelay),
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn RateGate>) -> Self {
        self.gate = gate;
        self
    }
}

#[async_trait]
impl SearchAdapter for WebSearchAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn surface(&self) -> Surface {
        Surface::Web
    }

    async fn search(&self, query: &Query) -> Result<BTreeSet<CandidateId>, SourceError> {
        self.gate.wait().await;
        let markup = self.fetcher.fetch(&query.text).await?;
        let ids = extract_ids(&markup);
        tracing::debug!(query = %query.text, bytes = markup.len(), found = ids.len(), "web search");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl MarkupFetcher for Canned {
        async fn fetch(&self, _query: &str) -> Result<String, SourceError> {
            Ok(self.0.to_string())
        }
    }

    fn ids(list: &[&str]) -> BTreeSet<CandidateId> {
        list.iter().filter_map(|s| CandidateId::parse(s)).collect()
    }

    #[test]
    fn extracts_every_layout() {
        let markup = r#"
            <a href="https://patents.google.com/patent/WO2011051540A1/en">x</a>
            <span>wo 2012 134273</span>
            <span>WO2016/162604</span>
            <span>WO/2019/012345</span>
        "#;
        assert_eq!(
            extract_ids(markup),
            ids(&["WO2011051540", "WO2012134273", "WO2016162604", "WO2019012345"])
        );
    }

    #[test]
    fn duplicates_collapse() {
        let found = extract_ids("WO2011051540 and wo2011051540 and WO 2011/051540");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn ignores_embedded_and_short_numbers() {
        assert!(extract_ids("SWO2011051540 WO201105 US2011051540").is_empty());
    }

    #[test]
    fn overlong_serials_are_not_truncated() {
        assert!(extract_ids("WO20110515401234").is_empty());
        assert_eq!(
            extract_ids("WO20110515401234 WO2012134273A1, WO2016162604"),
            ids(&["WO2012134273", "WO2016162604"])
        );
    }

    #[tokio::test]
    async fn adapter_searches_through_fetcher() {
        let adapter = WebSearchAdapter::new(Arc::new(Canned("see WO2011051540")));
        let found = adapter.search(&Query::web("darolutamide patent")).await.unwrap();
        assert_eq!(found, ids(&["WO2011051540"]));
        assert_eq!(adapter.surface(), Surface::Web);
    }
}
