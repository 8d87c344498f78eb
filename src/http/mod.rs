//! The request pipeline.
//!
//! Every API call funnels through [`HttpClient::request`], which serializes
//! calls behind the client-wide [`RequestGate`], pre-sleeps on local bucket
//! predictions, obeys the server's `Retry-After`, and turns non-200 responses
//! into errors.

mod gate;
mod route;
mod transport;

pub use gate::{Buckets, GateGuard, RequestGate};
pub use route::{PathParam, Route};
pub use transport::{build_client, ReqwestTransport, Transport, TransportRequest, TransportResponse};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::limiter::Bucket;
use crate::types::Params;
use log::{debug, error, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::Instant;

/// Attempts made before a server-imposed rate limit is reported as exhausted.
pub const MAX_ATTEMPTS: u32 = 5;

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(v) => Ok(v),
            Payload::Text(t) => Err(Error::decode(format!(
                "expected a JSON document, got text: {}",
                truncate(&t, 120)
            ))),
        }
    }

    /// The human-readable detail carried by an error body.
    ///
    /// JSON-API error documents yield the first entry's `detail`; anything
    /// else is reported verbatim.
    pub fn error_detail(&self) -> Option<String> {
        match self {
            Payload::Text(t) if t.is_empty() => None,
            Payload::Text(t) => Some(t.clone()),
            Payload::Json(v) => {
                let first = v
                    .get("errors")
                    .and_then(Value::as_array)
                    .and_then(|errors| errors.first());
                match first {
                    Some(entry) => entry.get("detail").map(|d| match d {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    }),
                    None => Some(v.to_string()),
                }
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Decode as JSON when the media type says so, otherwise keep the text.
pub fn json_or_text(res: &TransportResponse) -> Result<Payload> {
    let is_json = res
        .content_type()
        .and_then(|ct| ct.split(';').next())
        .map(|mt| mt.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);
    if is_json {
        Ok(Payload::Json(serde_json::from_str(&res.body)?))
    } else {
        Ok(Payload::Text(res.body.clone()))
    }
}

/// Optional parts of a call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions<'a> {
    pub bucket: Option<&'a Bucket>,
    pub params: Option<&'a Params>,
    pub json: Option<&'a Value>,
}

/// Low-level client shared by every endpoint.
pub struct HttpClient<T: Transport> {
    transport: T,
    base_url: String,
    user_agent: String,
    token: Option<String>,
    sleep_on_ratelimit: bool,
    gate: RequestGate,
}

impl HttpClient<ReqwestTransport> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::from_config(cfg)?, cfg))
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn new(transport: T, cfg: &Config) -> Self {
        Self {
            transport,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
            user_agent: cfg.user_agent.clone(),
            token: cfg.token.clone(),
            sleep_on_ratelimit: cfg.sleep_on_ratelimit,
            gate: RequestGate::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn sleep_on_ratelimit(&self) -> bool {
        self.sleep_on_ratelimit
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn headers(&self, has_body: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| Error::Config(format!("invalid user agent {:?}", self.user_agent)))?;
        headers.insert(USER_AGENT, ua);
        if let Some(token) = &self.token {
            let auth = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Config("token contains invalid header characters".into()))?;
            headers.insert(AUTHORIZATION, auth);
        }
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }

    /// Perform one logical call and return the decoded body.
    ///
    /// Holds the exclusion gate throughout. When the server sends a positive
    /// `Retry-After` the call either sleeps and retries (up to
    /// [`MAX_ATTEMPTS`]) or, with sleeping disabled, fails immediately while
    /// keeping the gate closed until the cool-down has passed.
    pub async fn request(&self, route: &Route, opts: RequestOptions<'_>) -> Result<Payload> {
        let headers = self.headers(opts.json.is_some())?;
        let body = opts.json.map(serde_json::to_string).transpose()?;
        let query = opts.params.map(Params::to_pairs).unwrap_or_default();
        let request = TransportRequest {
            method: route.method().clone(),
            url: route.url().to_string(),
            headers,
            query,
            body,
        };

        let mut gate = self.gate.acquire().await;
        let mut last: Option<(StatusCode, Option<String>)> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(bucket) = opts.bucket {
                let wait = gate.limiter(bucket)?.get_retry_after(Instant::now());
                if !wait.is_zero() {
                    debug!(
                        "{} locally rate limited for {:.2}s",
                        route,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
            }

            let res = self.transport.send(request.clone()).await?;
            if let Some(bucket) = opts.bucket {
                gate.limiter(bucket)?.update_rate_limit(Instant::now());
            }
            debug!("{} returned {} (attempt {})", route, res.status, attempt);

            let payload = json_or_text(&res)?;
            let retry_after = res.retry_after();
            if !retry_after.is_zero() {
                if self.sleep_on_ratelimit {
                    warn!(
                        "{} rate limited; retrying in {:.2}s",
                        route,
                        retry_after.as_secs_f64()
                    );
                    last = Some((res.status, payload.error_detail()));
                    tokio::time::sleep(retry_after).await;
                    continue;
                }
                let err = Error::RateLimited {
                    status: res.status,
                    detail: payload.error_detail(),
                    retry_after,
                };
                warn!(
                    "{} rate limited and sleep_on_ratelimit is off; holding the gate for {:.2}s: {}",
                    route,
                    retry_after.as_secs_f64(),
                    err
                );
                gate.defer(retry_after);
                return Err(err);
            }

            if res.status != StatusCode::OK {
                let err = Error::Http {
                    status: res.status,
                    detail: payload.error_detail(),
                };
                error!(
                    "{} failed with {}; params: {:?}",
                    route,
                    err,
                    opts.params.map(Params::to_pairs).unwrap_or_default()
                );
                return Err(err);
            }

            return Ok(payload);
        }

        let (status, detail) = last.unwrap_or((StatusCode::TOO_MANY_REQUESTS, None));
        Err(Error::RetriesExhausted {
            status,
            detail,
            attempts: MAX_ATTEMPTS,
        })
    }

    /// [`request`](Self::request), insisting on a JSON body.
    pub async fn request_json(&self, route: &Route, opts: RequestOptions<'_>) -> Result<Value> {
        self.request(route, opts).await?.into_json()
    }
}
