use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal HTTP transport, so sources can be wrapped (API keys) or faked in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
