//! Rate sources and the sequential endpoint walk.

use std::time::Duration;

use async_trait::async_trait;
use ratekit_common::{constants, Currency};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EndpointError, FxError, FxResult};
use crate::normalize::normalize;
use crate::table::RateTable;

/// Trait for anything that can turn a URL into a JSON payload.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch and decode the payload at `url`.
    async fn fetch_json(&self, url: &str) -> FxResult<Value>;
}

/// HTTP rate source backed by `reqwest`.
pub struct HttpRateSource {
    client: Client,
}

impl HttpRateSource {
    /// Create a source with the default 10 second timeout.
    pub fn new() -> FxResult<Self> {
        Self::with_timeout(constants::request_timeout())
    }

    /// Create a source with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> FxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ratekit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FxError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_json(&self, url: &str) -> FxResult<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FxError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FxError::MalformedResponse(e.to_string()))
    }
}

/// Substitute the base code into an endpoint template.
///
/// `{base}` receives the lower-case code and `{BASE}` the upper-case one.
pub fn render_endpoint(template: &str, base: &Currency) -> String {
    template
        .replace("{base}", &base.lower())
        .replace("{BASE}", base.code())
}

/// Try each endpoint in order and return the first usable rate table.
///
/// Failures are collected per endpoint; only when all of them fail is a
/// [`FxError::Connectivity`] returned.
pub async fn fetch_rates(
    source: &dyn RateSource,
    endpoints: &[String],
    base: &Currency,
) -> FxResult<RateTable> {
    let mut errors = Vec::new();

    for template in endpoints {
        let url = render_endpoint(template, base);

        let attempt = match source.fetch_json(&url).await {
            Ok(payload) => {
                let table = normalize(&payload, base);
                if table.is_empty() {
                    Err(FxError::MalformedResponse(
                        "no recognizable rates in payload".to_string(),
                    ))
                } else {
                    Ok(table)
                }
            }
            Err(e) => Err(e),
        };

        match attempt {
            Ok(table) => {
                debug!(
                    source = source.name(),
                    endpoint = %url,
                    base = %base,
                    rates = table.len(),
                    "Fetched rates"
                );
                return Ok(table);
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    endpoint = %url,
                    base = %base,
                    error = %e,
                    "Endpoint failed to return rates"
                );
                errors.push(EndpointError::new(template.clone(), e.to_string()));
            }
        }
    }

    Err(FxError::Connectivity { errors })
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    responses: dashmap::DashMap<String, Value>,
    calls: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: dashmap::DashMap::new(),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Serve `payload` for `url`. Unknown URLs fail with a transport error.
    pub fn set_response(&self, url: impl Into<String>, payload: Value) {
        self.responses.insert(url.into(), payload);
    }

    /// Stop serving `url`.
    pub fn remove_response(&self, url: &str) {
        self.responses.remove(url);
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_json(&self, url: &str) -> FxResult<Value> {
        self.calls.lock().push(url.to_string());
        self.responses
            .get(url)
            .map(|r| r.value().clone())
            .ok_or_else(|| FxError::Transport(format!("connection refused: {}", url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn endpoints(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_http_source_builds() {
        let source = HttpRateSource::new().unwrap();
        assert_eq!(source.name(), "HTTP");
    }

    #[test]
    fn test_render_endpoint() {
        let usd = Currency::usd();
        assert_eq!(
            render_endpoint("https://open.er-api.com/v6/latest/{BASE}", &usd),
            "https://open.er-api.com/v6/latest/USD"
        );
        assert_eq!(
            render_endpoint("https://cdn.example.com/currencies/{base}.json", &usd),
            "https://cdn.example.com/currencies/usd.json"
        );
    }

    #[tokio::test]
    async fn test_first_endpoint_wins() {
        let source = MockRateSource::new("test");
        source.set_response("https://a/USD", json!({"rates": {"EUR": 0.92}}));
        source.set_response("https://b/usd", json!({"usd": {"eur": 0.5}}));

        let table = fetch_rates(
            &source,
            &endpoints(&["https://a/{BASE}", "https://b/{base}"]),
            &Currency::usd(),
        )
        .await
        .unwrap();

        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.92)));
        assert_eq!(source.calls(), vec!["https://a/USD".to_string()]);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_endpoint() {
        let source = MockRateSource::new("test");
        source.set_response("https://a/USD", json!({"message": "quota exceeded"}));
        source.set_response("https://c/usd", json!({"usd": {"eur": 0.91}}));

        let table = fetch_rates(
            &source,
            &endpoints(&["https://a/{BASE}", "https://b/{BASE}", "https://c/{base}"]),
            &Currency::usd(),
        )
        .await
        .unwrap();

        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.91)));
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_all_endpoints_fail() {
        let source = MockRateSource::new("test");
        source.set_response("https://a/USD", json!({"error": "bad base"}));

        let result = fetch_rates(
            &source,
            &endpoints(&["https://a/{BASE}", "https://b/{base}"]),
            &Currency::usd(),
        )
        .await;

        let err = result.unwrap_err();
        let errors = err.endpoint_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].endpoint, "https://a/{BASE}");
        assert!(errors[0].message.contains("Malformed response"));
        assert_eq!(errors[1].endpoint, "https://b/{base}");
        assert!(errors[1].message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_no_endpoints() {
        let source = MockRateSource::new("test");
        let result = fetch_rates(&source, &[], &Currency::usd()).await;

        assert!(matches!(result, Err(FxError::Connectivity { ref errors }) if errors.is_empty()));
        assert_eq!(source.call_count(), 0);
    }

    /// Serve exactly one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    fn local_source() -> HttpRateSource {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpRateSource::from_client(client)
    }

    #[tokio::test]
    async fn test_http_source_fetches_json() {
        let base_url = serve_once("200 OK", r#"{"result":"success","rates":{"EUR":0.92}}"#).await;
        let source = local_source();

        let table = fetch_rates(
            &source,
            &[format!("{}/latest/{{BASE}}", base_url)],
            &Currency::usd(),
        )
        .await
        .unwrap();

        assert_eq!(table.get(&Currency::eur()), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_http_source_reports_status() {
        let base_url = serve_once("503 Service Unavailable", "{}").await;
        let source = local_source();

        let result = source.fetch_json(&format!("{}/latest/USD", base_url)).await;

        assert!(matches!(result, Err(FxError::HttpStatus { status: 503 })));
    }

    #[tokio::test]
    async fn test_http_source_rejects_non_json() {
        let base_url = serve_once("200 OK", "<html>rate limited</html>").await;
        let source = local_source();

        let result = source.fetch_json(&format!("{}/latest/USD", base_url)).await;

        assert!(matches!(result, Err(FxError::MalformedResponse(_))));
    }
}
