//! Plain-HTTP reachability probe

use std::time::{Duration, Instant};

use log::debug;
use reqwest::Client;

use super::dns::elapsed_ms;
use crate::types::HttpProbeResult;

/// Client that never follows redirects: the first response is authoritative.
pub(super) fn build_client(request_timeout: Duration) -> Client {
    Client::builder()
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|e| {
            log::warn!("[HTTP] Failed to build probe client, using defaults: {e}");
            Client::new()
        })
}

/// GET `url` and record the status of the first response.
pub(super) async fn probe(client: &Client, domain: &str, url: &str) -> HttpProbeResult {
    let start = Instant::now();
    let outcome = client.get(url).send().await;
    let latency_ms = elapsed_ms(start);

    match outcome {
        Ok(response) => {
            let status = response.status().as_u16();
            debug!("[HTTP] {url} -> {status} in {latency_ms}ms");
            HttpProbeResult {
                domain: domain.to_string(),
                status_code: Some(status),
                latency_ms,
                error: None,
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "HTTP request timed out".to_string()
            } else {
                format!("HTTP request failed: {e}")
            };
            debug!("[HTTP] {url} failed after {latency_ms}ms: {error}");
            HttpProbeResult {
                domain: domain.to_string(),
                status_code: None,
                latency_ms,
                error: Some(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn redirect_is_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", "https://elsewhere.test/"),
            )
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5));
        let result = probe(&client, "site.test", &format!("{}/", server.uri())).await;
        assert_eq!(result.status_code, Some(301));
        assert!(result.is_reachable());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn server_error_still_counts_as_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5));
        let result = probe(&client, "site.test", &server.uri()).await;
        assert_eq!(result.status_code, Some(503));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_millis(200));
        let result = probe(&client, "site.test", &server.uri()).await;
        assert!(!result.is_reachable());
        assert_eq!(result.error.as_deref(), Some("HTTP request timed out"));
    }

    #[tokio::test]
    async fn refused_connection_is_failure() {
        let client = build_client(Duration::from_secs(2));
        let result = probe(&client, "site.test", "http://127.0.0.1:9/").await;
        assert!(result.status_code.is_none());
        assert!(result.error.is_some());
    }
}
