//! Outbound HTTP, behind a trait so the request layer can be driven by a fake.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::config::Config;
use crate::models::Method;

/// A request as the resilient layer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub method: Method,
  /// Absolute URL or a path relative to the API base
  pub url: String,
  pub body: Option<Value>,
}

impl ApiRequest {
  pub fn new(method: Method, url: impl Into<String>, body: Option<Value>) -> Self {
    Self {
      method,
      url: url.into(),
      body,
    }
  }
}

/// Whatever the server answered, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// No response was obtained at all.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait Transport: Send + Sync {
  /// Perform one request. HTTP error statuses are responses, not errors.
  async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Name of the session cookie the API authenticates with.
const SESSION_COOKIE: &str = "session";

/// reqwest-backed transport sending the session cookie with every call.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
  base_url: Url,
}

impl ReqwestTransport {
  pub fn new(config: &Config) -> Result<Self, TransportError> {
    let mut base_url = Url::parse(&config.api.base_url)
      .map_err(|e| TransportError(format!("invalid API base URL '{}': {}", config.api.base_url, e)))?;
    // A trailing slash makes joins append to the base path instead of replacing its last segment
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let jar = Arc::new(Jar::default());
    if let Some(session) = Config::get_session_cookie() {
      jar.add_cookie_str(&format!("{}={}", SESSION_COOKIE, session), &base_url);
    }

    let client = reqwest::Client::builder()
      .cookie_provider(jar)
      .build()
      .map_err(|e| TransportError(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self { client, base_url })
  }

  /// Resolve a request URL against the API base.
  ///
  /// Paths are appended to the base path, so with a base of
  /// `https://host/vhc` the path `/api/jobs` becomes
  /// `https://host/vhc/api/jobs`. Absolute URLs are used unchanged.
  pub fn resolve(&self, url: &str) -> Result<Url, TransportError> {
    if let Ok(absolute) = Url::parse(url) {
      return Ok(absolute);
    }
    self
      .base_url
      .join(url.trim_start_matches('/'))
      .map_err(|e| TransportError(format!("invalid request URL '{}': {}", url, e)))
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }
}

fn to_reqwest(method: Method) -> reqwest::Method {
  match method {
    Method::Get => reqwest::Method::GET,
    Method::Post => reqwest::Method::POST,
    Method::Put => reqwest::Method::PUT,
    Method::Patch => reqwest::Method::PATCH,
    Method::Delete => reqwest::Method::DELETE,
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
    let url = self.resolve(&request.url)?;
    let mut builder = self.client.request(to_reqwest(request.method), url);

    if let Some(body) = &request.body {
      let bytes = serde_json::to_vec(body)
        .map_err(|e| TransportError(format!("failed to encode request body: {}", e)))?;
      builder = builder
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(bytes);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| TransportError(e.to_string()))?;
    // Once a status is in, the server has answered. A truncated body must not
    // turn that answer into a network failure.
    let status = response.status().as_u16();
    let body = match response.text().await {
      Ok(body) => body,
      Err(e) => {
        warn!(status, error = %e, "failed to read response body");
        String::new()
      }
    };

    Ok(RawResponse { status, body })
  }
}
