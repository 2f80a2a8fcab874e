use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use crate::error::{Result, RiskError};

/// Raw reply from an upstream provider. Fetchers inspect the status and parse
/// the body themselves.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Errors on any non-2xx status so the retry layer can classify it
    /// (5xx transient, 4xx terminal).
    pub fn ensure_success(self, provider: &'static str) -> Result<HttpResponse> {
        if (200..300).contains(&self.status) {
            Ok(self)
        } else {
            Err(RiskError::UpstreamStatus { provider, status: self.status })
        }
    }
}

/// Minimal HTTP seam between the fetchers and the network. Production wires
/// in [`HttpGateway`]; tests inject counting doubles.
pub trait HttpGet: Send + Sync {
    fn get(
        &self,
        provider: &'static str,
        url: &str,
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// Pooled reqwest client with a per-attempt timeout. One instance is shared
/// across all three providers.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| RiskError::UpstreamTransport {
                provider: "http client",
                detail: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpGet for HttpGateway {
    async fn get(&self, provider: &'static str, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await.map_err(|e| {
            RiskError::UpstreamTransport { provider, detail: describe_reqwest_error(&e) }
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| RiskError::UpstreamTransport {
            provider,
            detail: describe_reqwest_error(&e),
        })?;
        Ok(HttpResponse { status, body })
    }
}

/// Keep chained causes so network failures (DNS/TLS/socket) stay visible in
/// the surfaced error.
fn describe_reqwest_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}
