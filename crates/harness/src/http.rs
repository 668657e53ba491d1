//! HTTP collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(HarnessError::SpecParse(format!("unsupported HTTP method '{other}'"))),
        }
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Parse the body as JSON.
    ///
    /// A body that is not JSON means the actual value cannot be resolved,
    /// so this is a collaborator error rather than an assertion failure.
    pub fn json(&self) -> HarnessResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| {
            HarnessError::collaborator(format!(
                "response body (status {}) is not JSON: {e}: {}",
                self.status,
                excerpt(&self.body, 120)
            ))
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Truncate text on a char boundary for logs and journals
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Issues requests on behalf of a case
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, method: HttpMethod, url: &str, body: Option<&Value>) -> HarnessResult<HttpResponse>;
}

/// reqwest-backed client used for live runs
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("plancheck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn request(&self, method: HttpMethod, url: &str, body: Option<&Value>) -> HarnessResult<HttpResponse> {
        let mut builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        }
        .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HarnessError::Timeout {
                    what: format!("{method} {url}"),
                    ms: self.timeout.as_millis() as u64,
                }
            } else {
                HarnessError::collaborator(format!("{method} {url} failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(%method, url, status, bytes = body.len(), "HTTP exchange");

        Ok(HttpResponse { status, body })
    }
}
