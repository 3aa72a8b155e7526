//! Response handed back to callers of the resilient layer.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::transport::RawResponse;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  /// Live answer from the server
  Network,
  /// Synthesized from the local cache while offline
  Cache {
    /// Capture time of the oldest record used
    cached_at: Option<DateTime<Utc>>,
  },
  /// The mutation was queued for later replay
  Queued { operation_id: i64 },
}

/// A fetch-shaped response: status, body, and an advisory source marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
  status: u16,
  body: String,
  source: ResponseSource,
}

impl ApiResponse {
  pub fn from_network(raw: RawResponse) -> Self {
    Self {
      status: raw.status,
      body: raw.body,
      source: ResponseSource::Network,
    }
  }

  pub fn from_cache(payload: &Value, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      status: 200,
      body: payload.to_string(),
      source: ResponseSource::Cache { cached_at },
    }
  }

  pub fn from_queue(operation_id: i64) -> Self {
    Self {
      status: 202,
      body: json!({"queued": true, "operationId": operation_id}).to_string(),
      source: ResponseSource::Queued { operation_id },
    }
  }

  /// True for any 2xx status, including synthesized responses.
  pub fn ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn status(&self) -> u16 {
    self.status
  }

  pub fn text(&self) -> &str {
    &self.body
  }

  pub fn into_text(self) -> String {
    self.body
  }

  pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
    serde_json::from_str(&self.body)
  }

  pub fn source(&self) -> ResponseSource {
    self.source
  }

  pub fn served_from_cache(&self) -> bool {
    matches!(self.source, ResponseSource::Cache { .. })
  }

  pub fn queued(&self) -> bool {
    matches!(self.source, ResponseSource::Queued { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_queued_response_shape() {
    let response = ApiResponse::from_queue(3);
    assert!(response.ok());
    assert!(response.queued());
    assert!(!response.served_from_cache());
    let body: Value = response.json().unwrap();
    assert_eq!(body["queued"], true);
    assert_eq!(body["operationId"], 3);
  }

  #[test]
  fn test_cache_response_wraps_payload() {
    let payload = json!({"id": "42", "status": "created"});
    let response = ApiResponse::from_cache(&payload, None);
    assert_eq!(response.status(), 200);
    assert!(response.served_from_cache());
    assert_eq!(response.json::<Value>().unwrap(), payload);
  }

  #[test]
  fn test_network_response_passes_through() {
    let response = ApiResponse::from_network(RawResponse {
      status: 201,
      body: "created".to_string(),
    });
    assert!(response.ok());
    assert_eq!(response.text(), "created");
    assert_eq!(response.source(), ResponseSource::Network);
  }
}
