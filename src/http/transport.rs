use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use std::future::Future;
use std::time::Duration;

/// One outgoing call as handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

/// What a [`Transport`] gives back: status, headers and the body text.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TransportResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// `Retry-After` in (possibly fractional) seconds; zero when absent or unusable.
    pub fn retry_after(&self) -> Duration {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(Duration::ZERO)
    }
}

/// The HTTP collaborator the request pipeline sends through.
///
/// Connection handling, TLS and timeouts are the transport's business.
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> impl Future<Output = Result<TransportResponse>> + Send;
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(build_client(cfg)?))
    }
}

pub fn build_client(cfg: &Config) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()?;
    Ok(client)
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let res = builder.send().await.map_err(Error::from)?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.text().await.map_err(Error::from)?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
