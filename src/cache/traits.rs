//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::Partition;
use crate::error::StoreError;

/// Trait for typed entities that live in a cache partition.
///
/// The key must come from domain identity (job id, VRM...) so that saving
/// the same entity twice overwrites rather than duplicates.
pub trait Cacheable: Serialize + DeserializeOwned {
  /// Unique identifier within the partition
  fn cache_key(&self) -> String;

  /// Partition this entity type is stored in
  fn partition() -> Partition;
}

/// A record as held by the store, stamped with its capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRecord {
  pub partition: Partition,
  pub key: String,
  pub data: Value,
  /// When the record was last written
  pub cached_at: DateTime<Utc>,
}

impl CachedRecord {
  /// Decode the stored JSON into a typed entity.
  pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
    serde_json::from_value(self.data.clone()).map_err(|e| StoreError::Corrupt {
      partition: self.partition,
      key: self.key.clone(),
      reason: e.to_string(),
    })
  }
}
