// src/fetch/http.rs
// =============================================================================
// Fetches pages and images over HTTP.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all workers)
// - Fixed User-Agent header and per-request timeout
// - Non-2xx responses become FetchError::Status instead of a "successful" body
// =============================================================================

use super::Fetcher;
use crate::error::{FetchError, SetupError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Spider/1.0)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the HTTP client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// reqwest-backed Fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Building the client can only fail on TLS backend initialisation,
    // which is a setup problem rather than a per-request one
    pub fn new(config: &FetchConfig) -> Result<Self, SetupError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        trace!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn at(server: &MockServer, route: &str) -> Url {
        Url::parse(&server.uri()).unwrap().join(route).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_build_client() {
        assert!(HttpFetcher::new(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_user_agent() {
        let server = MockServer::start().await;
        // Requests without the expected header fall through to wiremock's 404
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let body = fetcher.fetch(&at(&server, "/page.html")).await.unwrap();

        assert_eq!(body, b"<html>hi</html>".to_vec());
    }

    #[tokio::test]
    async fn test_custom_user_agent_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "test-agent/0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let config = FetchConfig {
            user_agent: "test-agent/0.1".to_string(),
            ..FetchConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        assert_eq!(fetcher.fetch(&at(&server, "/")).await, Ok(b"ok".to_vec()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();

        assert_eq!(
            fetcher.fetch(&at(&server, "/missing.png")).await,
            Err(FetchError::Status(404))
        );
        assert_eq!(
            fetcher.fetch(&at(&server, "/busy")).await,
            Err(FetchError::Status(503))
        );
    }

    #[tokio::test]
    async fn test_redirect_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();

        assert_eq!(
            fetcher.fetch(&at(&server, "/old")).await,
            Ok(b"moved".to_vec())
        );
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            ..FetchConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        assert_eq!(
            fetcher.fetch(&at(&server, "/slow")).await,
            Err(FetchError::Timeout)
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let url = Url::parse(&format!("http://{}/", addr)).unwrap();

        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(FetchError::Connect(_))
        ));
    }
}
