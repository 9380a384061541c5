use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::BackendError;
use crate::response::RawResponse;

#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// The only way the sync core talks to the network.
///
/// Implementations report every HTTP status as a `RawResponse`; only
/// connection-level failures come back as `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: Request) -> Result<RawResponse, BackendError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: Request) -> Result<RawResponse, BackendError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        tracing::debug!(url = %request.url, status, "request completed");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
