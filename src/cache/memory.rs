//! In-memory cache storage, for tests and ephemeral sessions.

use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::partition::Partition;
use super::storage::CacheStore;
use super::traits::{CachedRecord, Cacheable};
use crate::error::StoreError;
use crate::models::{NewPendingOperation, PendingOperation};

#[derive(Default)]
struct MemoryState {
  partitions: HashMap<Partition, BTreeMap<String, CachedRecord>>,
  lists: HashMap<Partition, CachedRecord>,
  next_pending_id: i64,
}

/// Storage that keeps everything in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
  state: Mutex<MemoryState>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
    self
      .state
      .lock()
      .map_err(|e| StoreError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }
}

fn stamp(partition: Partition, key: &str, record: &Value) -> CachedRecord {
  CachedRecord {
    partition,
    key: key.to_string(),
    data: record.clone(),
    cached_at: Utc::now(),
  }
}

impl CacheStore for MemoryStore {
  fn initialize(&self) -> Result<(), StoreError> {
    self.lock().map(|_| ())
  }

  fn get(&self, partition: Partition, key: &str) -> Result<Option<CachedRecord>, StoreError> {
    let state = self.lock()?;
    Ok(
      state
        .partitions
        .get(&partition)
        .and_then(|records| records.get(key))
        .cloned(),
    )
  }

  fn get_all(&self, partition: Partition) -> Result<Vec<CachedRecord>, StoreError> {
    let state = self.lock()?;
    Ok(
      state
        .partitions
        .get(&partition)
        .map(|records| records.values().cloned().collect())
        .unwrap_or_default(),
    )
  }

  fn get_all_by_index(
    &self,
    partition: Partition,
    index: &str,
    value: &str,
  ) -> Result<Vec<CachedRecord>, StoreError> {
    if partition.index(index).is_none() {
      return Err(StoreError::UnknownIndex {
        partition,
        index: index.to_string(),
      });
    }

    Ok(
      self
        .get_all(partition)?
        .into_iter()
        .filter(|record| {
          partition
            .index_values(&record.data)
            .iter()
            .any(|(name, v)| *name == index && v == value)
        })
        .collect(),
    )
  }

  fn put(
    &self,
    partition: Partition,
    key: &str,
    record: &Value,
  ) -> Result<CachedRecord, StoreError> {
    let stored = stamp(partition, key, record);
    let mut state = self.lock()?;
    state
      .partitions
      .entry(partition)
      .or_default()
      .insert(key.to_string(), stored.clone());
    Ok(stored)
  }

  fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError> {
    let mut state = self.lock()?;
    if let Some(records) = state.partitions.get_mut(&partition) {
      records.remove(key);
    }
    Ok(())
  }

  fn clear_all(&self) -> Result<(), StoreError> {
    let mut state = self.lock()?;
    state.partitions.clear();
    state.lists.clear();
    Ok(())
  }

  fn enqueue(&self, operation: NewPendingOperation) -> Result<PendingOperation, StoreError> {
    let mut state = self.lock()?;
    state.next_pending_id += 1;
    let operation = operation.into_operation(state.next_pending_id, Utc::now());
    let key = operation.cache_key();
    let data = serde_json::to_value(&operation).map_err(|e| StoreError::Corrupt {
      partition: Partition::PendingOperations,
      key: key.clone(),
      reason: e.to_string(),
    })?;
    state
      .partitions
      .entry(Partition::PendingOperations)
      .or_default()
      .insert(key.clone(), stamp(Partition::PendingOperations, &key, &data));
    Ok(operation)
  }

  fn store_list_result(
    &self,
    partition: Partition,
    items: &[Value],
  ) -> Result<CachedRecord, StoreError> {
    let stored = stamp(partition, partition.name(), &Value::Array(items.to_vec()));
    self.lock()?.lists.insert(partition, stored.clone());
    Ok(stored)
  }

  fn get_list_result(&self, partition: Partition) -> Result<Option<CachedRecord>, StoreError> {
    Ok(self.lock()?.lists.get(&partition).cloned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Customer, Method, OperationKind};
  use serde_json::json;

  #[test]
  fn test_round_trip_and_delete() {
    let store = MemoryStore::new();
    store.initialize().unwrap();

    let customer = Customer {
      id: "c-1".to_string(),
      name: "Jo Bloggs".to_string(),
      email: None,
      phone: Some("01234 567890".to_string()),
    };
    store.save(&customer).unwrap();
    assert_eq!(store.load::<Customer>("c-1").unwrap(), Some(customer));

    store.delete(Partition::Customers, "c-1").unwrap();
    store.delete(Partition::Customers, "c-1").unwrap();
    assert!(store.load::<Customer>("c-1").unwrap().is_none());
  }

  #[test]
  fn test_index_lookup_matches_sqlite_semantics() {
    let store = MemoryStore::new();
    store
      .upsert(Partition::Jobs, &json!({"id": "1", "status": "created"}))
      .unwrap();
    store
      .upsert(Partition::Jobs, &json!({"id": "2", "status": "completed"}))
      .unwrap();

    let created = store
      .get_all_by_index(Partition::Jobs, "by_status", "created")
      .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].key, "1");
    assert!(store
      .get_all_by_index(Partition::Jobs, "by_colour", "red")
      .is_err());
  }

  #[test]
  fn test_put_overwrites_without_merging() {
    let store = MemoryStore::new();
    store
      .put(Partition::Vehicles, "AB12CDE", &json!({"vrm": "AB12CDE", "make": "Ford"}))
      .unwrap();
    store
      .put(Partition::Vehicles, "AB12CDE", &json!({"vrm": "AB12CDE"}))
      .unwrap();

    let all = store.get_all(Partition::Vehicles).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].data, json!({"vrm": "AB12CDE"}));
  }

  #[test]
  fn test_list_result_is_replaced_not_merged() {
    let store = MemoryStore::new();
    store
      .store_list_result(Partition::Jobs, &[json!({"id": "1"}), json!({"id": "2"})])
      .unwrap();
    store
      .store_list_result(Partition::Jobs, &[json!({"id": "1"})])
      .unwrap();

    let list = store.get_list_result(Partition::Jobs).unwrap().unwrap();
    assert_eq!(list.data, json!([{"id": "1"}]));
    assert!(store.get_list_result(Partition::Vehicles).unwrap().is_none());

    store.clear_all().unwrap();
    assert!(store.get_list_result(Partition::Jobs).unwrap().is_none());
  }

  #[test]
  fn test_clear_keeps_id_sequence() {
    let store = MemoryStore::new();
    let op = || NewPendingOperation {
      kind: OperationKind::UpdateJob,
      payload: None,
      endpoint: "/api/jobs/1".to_string(),
      method: Method::Delete,
    };
    let first = store.enqueue(op()).unwrap();
    store.clear_all().unwrap();
    assert!(store.pending_operations().unwrap().is_empty());

    let second = store.enqueue(op()).unwrap();
    assert!(second.id > first.id);
  }
}
