//! Test doubles for the transport and the store.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{ApiRequest, RawResponse, Transport, TransportError};
use crate::cache::{CacheStore, CachedRecord, Partition};
use crate::error::StoreError;
use crate::models::{NewPendingOperation, PendingOperation};

/// Transport answering from a script, recording every request it sees.
#[derive(Default)]
pub struct FakeTransport {
  script: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
  calls: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(&self, status: u16, body: &str) -> &Self {
    self.script.lock().unwrap().push_back(Ok(RawResponse {
      status,
      body: body.to_string(),
    }));
    self
  }

  pub fn fail(&self, message: &str) -> &Self {
    self
      .script
      .lock()
      .unwrap()
      .push_back(Err(TransportError(message.to_string())));
    self
  }

  pub fn calls(&self) -> Vec<ApiRequest> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl Transport for FakeTransport {
  async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
    self.calls.lock().unwrap().push(request.clone());
    self
      .script
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| Err(TransportError("connection refused".to_string())))
  }
}

/// Store whose every operation fails.
pub struct BrokenStore;

fn unavailable<T>() -> Result<T, StoreError> {
  Err(StoreError::StorageUnavailable("quota exceeded".to_string()))
}

impl CacheStore for BrokenStore {
  fn initialize(&self) -> Result<(), StoreError> {
    unavailable()
  }

  fn get(&self, _partition: Partition, _key: &str) -> Result<Option<CachedRecord>, StoreError> {
    unavailable()
  }

  fn get_all(&self, _partition: Partition) -> Result<Vec<CachedRecord>, StoreError> {
    unavailable()
  }

  fn get_all_by_index(
    &self,
    _partition: Partition,
    _index: &str,
    _value: &str,
  ) -> Result<Vec<CachedRecord>, StoreError> {
    unavailable()
  }

  fn put(
    &self,
    _partition: Partition,
    _key: &str,
    _record: &Value,
  ) -> Result<CachedRecord, StoreError> {
    unavailable()
  }

  fn delete(&self, _partition: Partition, _key: &str) -> Result<(), StoreError> {
    unavailable()
  }

  fn clear_all(&self) -> Result<(), StoreError> {
    unavailable()
  }

  fn enqueue(&self, _operation: NewPendingOperation) -> Result<PendingOperation, StoreError> {
    unavailable()
  }

  fn store_list_result(
    &self,
    _partition: Partition,
    _items: &[Value],
  ) -> Result<CachedRecord, StoreError> {
    unavailable()
  }

  fn get_list_result(&self, _partition: Partition) -> Result<Option<CachedRecord>, StoreError> {
    unavailable()
  }
}
