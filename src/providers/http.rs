use async_trait::async_trait;
use std::time::Duration;

use crate::providers::backend::ApiError;

/// Transport seam between the backend client and the network.
///
/// Production code uses [`ReqwestClient`]; tests substitute a canned
/// implementation so loop behavior can be exercised without a live server.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient(reqwest::Client);

impl ReqwestClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response, ApiError> {
        self.0
            .execute(req)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }
}
