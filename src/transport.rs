//! HTTP transport used by the processor to execute online engine requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{RequestParams, Result};

/// HTTP method of an outgoing engine request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// A raw upstream response handed to an engine's parser.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    /// Response headers (lowercase names).
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for executing the HTTP request an online engine described.
///
/// Implementations only move bytes; status checking, deadlines and
/// suspension are handled by the processor.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request described by `params`.
    async fn send(&self, params: &RequestParams) -> Result<HttpResponse>;
}

/// A transport backed by a shared reqwest client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport` with default settings.
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; a3s-metasearch/0.1)")
            .gzip(true)
            .brotli(true)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Creates a `ReqwestTransport` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, params: &RequestParams) -> Result<HttpResponse> {
        let mut request = match params.method {
            HttpMethod::Get => self.client.get(&params.url),
            HttpMethod::Post => self.client.post(&params.url),
        };
        request = request.timeout(params.timeout);

        for (name, value) in &params.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !params.cookies.is_empty() {
            request = request.header("Cookie", cookie_header(&params.cookies));
        }
        if let Some(body) = &params.body {
            request = request.body(body.clone());
        } else if !params.form.is_empty() {
            request = request.form(&params.form);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
