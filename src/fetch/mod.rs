//! HTTP retrieval of station reading files.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};
use tracing::debug;

/// GETs `url` and returns the body. Non-success statuses are errors.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("GET {} returned status {}: {}", url, status, body);
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Fetched remote readings");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::auth::UrlParam;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Answers every request with a fixed status and body, recording URLs.
    struct CannedClient {
        status: u16,
        body: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl CannedClient {
        fn new(status: u16, body: &'static str) -> (Self, Arc<Mutex<Vec<String>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let client = CannedClient {
                status,
                body,
                seen: Arc::clone(&seen),
            };
            (client, seen)
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.seen.lock().unwrap().push(req.url().to_string());
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(resp.into())
        }
    }

    #[tokio::test]
    async fn test_fetch_bytes_returns_body() {
        let (client, seen) = CannedClient::new(200, "station_id\n");
        let bytes = fetch_bytes(&client, "https://example.test/readings.csv")
            .await
            .unwrap();

        assert_eq!(bytes, b"station_id\n");
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["https://example.test/readings.csv"]
        );
    }

    #[tokio::test]
    async fn test_url_param_appends_api_key() {
        let (inner, seen) = CannedClient::new(200, "");
        let client = UrlParam {
            inner,
            param_name: "API_KEY".to_string(),
            key: "secret".to_string(),
        };

        fetch_bytes(&client, "https://example.test/readings.csv?format=csv")
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            "https://example.test/readings.csv?format=csv&API_KEY=secret"
        );
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let (client, _) = CannedClient::new(500, "upstream down");
        let err = fetch_bytes(&client, "https://example.test/readings.csv")
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("500"), "got {msg}");
        assert!(msg.contains("upstream down"), "got {msg}");
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let (client, seen) = CannedClient::new(200, "");
        assert!(fetch_bytes(&client, "not a url").await.is_err());
        assert!(seen.lock().unwrap().is_empty());
    }
}
