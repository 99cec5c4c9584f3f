//! Content fetching from the site, files, and stdin.
//!
//! All site traffic goes through a [`Requestor`]. [`HttpRequestor`] talks to
//! the network with reqwest; [`MemoryRequestor`] serves canned responses.
//! Requests are always awaited one at a time.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
#[cfg(feature = "fetch")]
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::report::Reporter;
use crate::{RanobeError, Result};

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub text: String,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, text: impl Into<String>) -> Self {
        Self { url: url.into(), status, text: text.into() }
    }

    /// Whether the status is 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

/// Capability to perform GET requests.
#[allow(async_fn_in_trait)]
pub trait Requestor {
    async fn get(&self, url: &str) -> Result<Response>;
}

/// Performs a GET that must succeed.
///
/// A non-success status is reported through `reporter` with `message` and
/// turned into [`RanobeError::Request`].
pub async fn get_ok<R: Requestor>(
    requestor: &R, url: &str, reporter: &dyn Reporter, message: &str,
) -> Result<Response> {
    tracing::debug!(url, "GET");
    let response = requestor.get(url).await?;

    if !response.ok() {
        reporter.request_error(&response, message);
        return Err(RanobeError::Request { status: response.status, url: response.url });
    }

    Ok(response)
}

/// HTTP client configuration for fetching pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Optional proxy URL applied to every request.
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            proxy: None,
        }
    }
}

/// Requestor backed by a reqwest client.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpRequestor {
    client: reqwest::Client,
    timeout: u64,
}

#[cfg(feature = "fetch")]
impl HttpRequestor {
    /// Builds a client with the configured timeout, user agent and proxy.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| RanobeError::ConfigError(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(RanobeError::HttpError)?;
        Ok(Self { client, timeout: config.timeout })
    }
}

#[cfg(feature = "fetch")]
impl Requestor for HttpRequestor {
    async fn get(&self, url: &str) -> Result<Response> {
        let parsed_url = url::Url::parse(url).map_err(|e| RanobeError::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .get(parsed_url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "ru-RU,ru;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RanobeError::Timeout { timeout: self.timeout }
                } else {
                    RanobeError::HttpError(e)
                }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let text = response.text().await?;

        Ok(Response { url: final_url, status, text })
    }
}

/// Requestor serving canned responses, for offline runs and tests.
///
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MemoryRequestor {
    responses: HashMap<String, (u16, String)>,
    requested: Mutex<Vec<String>>,
}

impl MemoryRequestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a 200 response.
    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), (200, body.into()));
        self
    }

    /// Registers a response with an explicit status.
    pub fn with_status(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), (status, body.into()));
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Requestor for MemoryRequestor {
    async fn get(&self, url: &str) -> Result<Response> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }

        let (status, text) = self.responses.get(url).cloned().unwrap_or((404, String::new()));
        Ok(Response::new(url, status, text))
    }
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(RanobeError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(RanobeError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(RanobeError::from)?;

    Ok(buffer)
}
