//! Error types for the cache store and the request layer.

use thiserror::Error;

use crate::cache::Partition;

/// Errors raised by a [`CacheStore`](crate::cache::CacheStore).
#[derive(Debug, Error)]
pub enum StoreError {
  /// The backing store could not be opened or a transaction did not complete.
  #[error("cache storage unavailable: {0}")]
  StorageUnavailable(String),

  /// A record handed to `upsert` has no value in the partition's key field.
  #[error("record for {partition} has no `{field}` key field")]
  MissingKey {
    partition: Partition,
    field: &'static str,
  },

  /// The partition does not declare an index with this name.
  #[error("partition {partition} has no index named `{index}`")]
  UnknownIndex { partition: Partition, index: String },

  /// A stored value could not be decoded.
  #[error("corrupt cache entry {partition}/{key}: {reason}")]
  Corrupt {
    partition: Partition,
    key: String,
    reason: String,
  },
}

impl From<rusqlite::Error> for StoreError {
  fn from(e: rusqlite::Error) -> Self {
    StoreError::StorageUnavailable(e.to_string())
  }
}

/// Errors surfaced to callers of [`ResilientClient::send`](crate::http::ResilientClient::send).
#[derive(Debug, Error)]
pub enum RequestError {
  /// The server answered with a non-2xx status. Never cached or queued.
  #[error("request failed with status {status}: {body}")]
  ServerRejected { status: u16, body: String },

  /// No response was obtained (offline, DNS, connection reset...).
  #[error("network failure: {0}")]
  NetworkFailure(String),
}

impl RequestError {
  /// HTTP status for server rejections.
  pub fn status(&self) -> Option<u16> {
    match self {
      RequestError::ServerRejected { status, .. } => Some(*status),
      RequestError::NetworkFailure(_) => None,
    }
  }

  pub fn is_network_failure(&self) -> bool {
    matches!(self, RequestError::NetworkFailure(_))
  }
}
