//! Agent Card discovery: fetch, parse and validate `/.well-known/agent.json`.
//!
//! Discovery talks to endpoints that may be slow, flaky or simply wrong, so
//! the fetch is retried a bounded number of times on transient failures
//! (network errors and 5xx). Client errors (4xx) and malformed documents are
//! reported immediately.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::agent_card::AgentCard;
use crate::error::{A2AError, A2AResult};
use crate::transport::{self, jsonrpc::JSON_MEDIA_TYPE};

/// Path of the agent card relative to the agent's base URL.
pub const WELL_KNOWN_PATH: &str = "/.well-known/agent.json";

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Per-attempt HTTP timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches and validates agent cards.
#[derive(Debug, Clone)]
pub struct Discoverer {
    http: Client,
    max_retries: u32,
    retry_delay: Duration,
    headers: BTreeMap<String, String>,
}

impl Default for Discoverer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Discoverer {
    /// Create a discoverer with the given per-attempt timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_http_client(transport::build_http_client(timeout))
    }

    /// Create a discoverer on top of an existing HTTP client.
    pub fn with_http_client(http: Client) -> Self {
        Self {
            http,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            headers: BTreeMap::new(),
        }
    }

    /// Set the number of retries after the first attempt and the delay between them.
    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Extra headers sent with every discovery request (e.g. credentials).
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Total number of attempts a discovery makes before giving up.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Discover the agent card published under `agent_url`.
    ///
    /// `agent_url` may omit the scheme (`http` is assumed) and may carry a
    /// path. Cancelling `cancel` aborts the in-flight attempt or the delay
    /// between attempts with [`A2AError::Cancelled`].
    pub async fn discover(
        &self,
        cancel: &CancellationToken,
        agent_url: &str,
    ) -> A2AResult<AgentCard> {
        let card_url = Url::parse(&build_discovery_url(agent_url))?;
        tracing::debug!(agent = %agent_url, url = %card_url, "Discovering agent card");

        let body = self.fetch_with_retry(cancel, &card_url).await?;
        let card = Self::parse(&body)?;

        tracing::info!(
            name = %card.name,
            version = %card.version,
            endpoints = card.endpoints.len(),
            skills = card.skills.len(),
            "Discovered A2A agent"
        );
        Ok(card)
    }

    /// Decode and validate an agent card document.
    pub fn parse(body: &[u8]) -> A2AResult<AgentCard> {
        let card: AgentCard = serde_json::from_slice(body)
            .map_err(|e| A2AError::Decode(format!("failed to parse agent card JSON: {e}")))?;
        card.validate()?;
        Ok(card)
    }

    /// A single GET of the card URL, without retries.
    pub async fn fetch_once(&self, card_url: &Url) -> A2AResult<Vec<u8>> {
        let mut request = self
            .http
            .get(card_url.clone())
            .header(ACCEPT, JSON_MEDIA_TYPE);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        match status.as_u16() {
            _ if status.is_success() => Ok(response.bytes().await?.to_vec()),
            404 => Err(A2AError::CardNotFound(card_url.to_string())),
            401 | 403 => Err(A2AError::AccessDenied {
                status: status.as_u16(),
                url: card_url.to_string(),
            }),
            _ => Err(transport::status_error(response).await),
        }
    }

    async fn fetch_with_retry(
        &self,
        cancel: &CancellationToken,
        card_url: &Url,
    ) -> A2AResult<Vec<u8>> {
        let attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(A2AError::Cancelled),
                result = self.fetch_once(card_url) => result,
            };
            let err = match result {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempt >= attempts {
                return Err(A2AError::RetriesExhausted {
                    attempts,
                    source: Box::new(err),
                });
            }
            tracing::warn!(
                url = %card_url,
                attempt,
                attempts,
                error = %err,
                "Agent card fetch failed, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(A2AError::Cancelled),
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
            attempt += 1;
        }
    }
}

/// Build the discovery URL for an agent base address.
///
/// Adds `http://` unless the address starts with `http://` or `https://`, drops a trailing slash and
/// appends [`WELL_KNOWN_PATH`]. Applying it to its own output is a no-op.
/// Blank input yields an empty string.
pub fn build_discovery_url(agent_url: &str) -> String {
    let agent_url = agent_url.trim();
    if agent_url.is_empty() {
        return String::new();
    }

    let lower = agent_url.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        agent_url.to_string()
    } else {
        format!("http://{agent_url}")
    };

    match Url::parse(&with_scheme) {
        Ok(mut url) => {
            let path = append_well_known(url.path());
            url.set_path(&path);
            url.to_string()
        }
        Err(_) => append_well_known(&with_scheme),
    }
}

fn append_well_known(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.ends_with(WELL_KNOWN_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{WELL_KNOWN_PATH}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn card_json() -> serde_json::Value {
        serde_json::json!({
            "name": "k8s-agent",
            "description": "Kubernetes troubleshooting agent",
            "version": "0.3.1",
            "capabilities": {"streaming": true},
            "endpoints": [
                {"type": "a2a", "url": "http://localhost:8083/api/a2a", "methods": ["tasks/send", "tasks/status"]}
            ]
        })
    }

    fn fast_discoverer() -> Discoverer {
        Discoverer::new(Duration::from_secs(5)).with_retry_policy(3, Duration::from_millis(10))
    }

    #[test]
    fn test_build_discovery_url() {
        assert_eq!(
            build_discovery_url("http://agent.example.com"),
            "http://agent.example.com/.well-known/agent.json"
        );
        assert_eq!(
            build_discovery_url("https://agent.example.com/"),
            "https://agent.example.com/.well-known/agent.json"
        );
        assert_eq!(
            build_discovery_url("localhost:8083/api/a2a/kagent/k8s-agent/"),
            "http://localhost:8083/api/a2a/kagent/k8s-agent/.well-known/agent.json"
        );
        assert_eq!(build_discovery_url("   "), "");

        // A scheme inside the query does not count as the address's scheme.
        let url = Url::parse(&build_discovery_url("agent.local/cb?u=http://x")).unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("agent.local"));
        assert_eq!(url.path(), "/cb/.well-known/agent.json");
        assert_eq!(url.query(), Some("u=http://x"));
    }

    #[test]
    fn test_build_discovery_url_is_idempotent() {
        for base in [
            "agent.local",
            "agent.local/",
            "http://agent.local/a/b",
            "https://agent.local/a/b/",
            "http://agent.local:9000/?tenant=x",
        ] {
            let once = build_discovery_url(base);
            let twice = build_discovery_url(&once);
            assert_eq!(once, twice, "not idempotent for {base}");
            assert_eq!(once.matches(WELL_KNOWN_PATH).count(), 1);
        }
    }

    #[test]
    fn test_parse_rejects_invalid_cards() {
        let err = Discoverer::parse(br#"{"name": "x", "version": ""}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = Discoverer::parse(b"<html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_discover_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/agents/k8s/.well-known/agent.json"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(card_json()))
            .expect(1)
            .mount(&server)
            .await;

        let card = fast_discoverer()
            .discover(&CancellationToken::new(), &format!("{}/agents/k8s/", server.uri()))
            .await
            .unwrap();
        assert_eq!(card.name, "k8s-agent");
        assert!(card.supports_streaming());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WELL_KNOWN_PATH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        // A long retry delay would blow the timeout if 404 were retried.
        let discoverer =
            Discoverer::new(Duration::from_secs(5)).with_retry_policy(3, Duration::from_secs(30));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            discoverer.discover(&CancellationToken::new(), &server.uri()),
        )
        .await
        .expect("404 must fail without waiting for a retry");
        assert!(matches!(result, Err(A2AError::CardNotFound(_))));
    }

    #[tokio::test]
    async fn test_access_denied_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = fast_discoverer()
            .discover(&CancellationToken::new(), &server.uri())
            .await
            .unwrap_err();
        assert!(matches!(err, A2AError::AccessDenied { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WELL_KNOWN_PATH))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(WELL_KNOWN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(card_json()))
            .expect(1)
            .mount(&server)
            .await;

        let card = fast_discoverer()
            .discover(&CancellationToken::new(), &server.uri())
            .await
            .unwrap();
        let expected: AgentCard = serde_json::from_value(card_json()).unwrap();
        assert_eq!(card, expected);
    }

    #[tokio::test]
    async fn test_retries_exhausted_wraps_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(4)
            .mount(&server)
            .await;

        let err = fast_discoverer()
            .discover(&CancellationToken::new(), &server.uri())
            .await
            .unwrap_err();
        match err {
            A2AError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 4);
                assert_eq!(source.status(), Some(502));
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_card_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fast_discoverer()
            .discover(&CancellationToken::new(), &server.uri())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let discoverer =
            Discoverer::new(Duration::from_secs(5)).with_retry_policy(3, Duration::from_secs(30));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            discoverer.discover(&cancel, &server.uri()),
        )
        .await
        .expect("cancellation must interrupt the retry delay");
        assert!(matches!(result, Err(A2AError::Cancelled)));
    }

    #[tokio::test]
    async fn test_extra_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(card_json()))
            .expect(1)
            .mount(&server)
            .await;

        let headers = BTreeMap::from([("Authorization".to_string(), "Bearer secret".to_string())]);
        fast_discoverer()
            .with_headers(headers)
            .discover(&CancellationToken::new(), &server.uri())
            .await
            .unwrap();
    }
}
