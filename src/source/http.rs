//! Shared HTTP plumbing for JSON-speaking sources

use super::error::SourceError;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a client with a request timeout.
pub fn client(timeout_secs: u64, user_agent: Option<&str>) -> Result<Client, SourceError> {
    let mut builder = Client::builder().timeout(Duration::from_secs(timeout_secs));
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    builder
        .build()
        .map_err(|e| SourceError::Transient(format!("http client: {}", e)))
}

/// `base` with each segment appended, percent-encoded.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, SourceError> {
    let mut url =
        Url::parse(base).map_err(|e| SourceError::Parse(format!("bad base url {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| SourceError::Parse(format!("base url cannot take a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a request and decode a JSON body. Non-success statuses are
/// classified through [`SourceError::from_status`].
pub async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    context: &str,
) -> Result<T, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::from_status(status, context));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SourceError::Parse(format!("{}: {}", context, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_segments() {
        let url = endpoint(
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug",
            &["compound", "name", "5-fluoro uracil", "synonyms", "JSON"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/5-fluoro%20uracil/synonyms/JSON"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let url = endpoint("https://example.org/api/", &["x"]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/x");
    }

    #[test]
    fn endpoint_rejects_bad_base() {
        assert!(matches!(endpoint("not a url", &["x"]), Err(SourceError::Parse(_))));
    }
}
