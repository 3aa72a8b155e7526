//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::partition::Partition;
use super::traits::{Cacheable, CachedRecord};
use crate::error::StoreError;
use crate::models::{NewPendingOperation, PendingOperation};

/// Trait for cache storage backends.
///
/// Every write stamps a capture time. Reads of an absent key return `None`,
/// deletes of an absent key succeed.
pub trait CacheStore: Send + Sync {
  /// Open the backing store and create its schema. Safe to call repeatedly.
  fn initialize(&self) -> Result<(), StoreError>;

  /// Point lookup.
  fn get(&self, partition: Partition, key: &str) -> Result<Option<CachedRecord>, StoreError>;

  /// Every record in a partition, in no particular order.
  fn get_all(&self, partition: Partition) -> Result<Vec<CachedRecord>, StoreError>;

  /// Records whose declared index `index` equals `value`.
  fn get_all_by_index(
    &self,
    partition: Partition,
    index: &str,
    value: &str,
  ) -> Result<Vec<CachedRecord>, StoreError>;

  /// Upsert `record` at `key`, overwriting any previous value.
  fn put(&self, partition: Partition, key: &str, record: &Value)
    -> Result<CachedRecord, StoreError>;

  /// Remove a record if present.
  fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError>;

  /// Empty every partition, all or nothing.
  fn clear_all(&self) -> Result<(), StoreError>;

  /// Append to the pending-operation queue, assigning the next id.
  fn enqueue(&self, operation: NewPendingOperation) -> Result<PendingOperation, StoreError>;

  /// Replace the last collection response seen for a partition.
  fn store_list_result(&self, partition: Partition, items: &[Value])
    -> Result<CachedRecord, StoreError>;

  /// The last collection response stored for a partition, as a JSON array.
  fn get_list_result(&self, partition: Partition) -> Result<Option<CachedRecord>, StoreError>;

  /// Upsert keyed by the partition's identity field.
  fn upsert(&self, partition: Partition, record: &Value) -> Result<CachedRecord, StoreError> {
    let key = partition.key_of(record).ok_or(StoreError::MissingKey {
      partition,
      field: partition.key_fields()[0],
    })?;
    self.put(partition, &key, record)
  }

  /// Pending operations in insertion order.
  fn pending_operations(&self) -> Result<Vec<PendingOperation>, StoreError> {
    let mut operations = self
      .get_all(Partition::PendingOperations)?
      .iter()
      .map(CachedRecord::decode::<PendingOperation>)
      .collect::<Result<Vec<_>, _>>()?;
    operations.sort_by_key(|op| op.id);
    Ok(operations)
  }

  /// Note a failed replay attempt against a queued operation.
  fn record_replay_failure(&self, id: i64, error: &str) -> Result<(), StoreError> {
    let key = id.to_string();
    let Some(record) = self.get(Partition::PendingOperations, &key)? else {
      return Ok(());
    };
    let mut operation: PendingOperation = record.decode()?;
    operation.attempts += 1;
    operation.last_error = Some(error.to_string());
    self.save(&operation).map(|_| ())
  }

  /// Store a typed entity under its own key.
  fn save<T: Cacheable>(&self, entity: &T) -> Result<CachedRecord, StoreError> {
    let key = entity.cache_key();
    let data = serde_json::to_value(entity).map_err(|e| StoreError::Corrupt {
      partition: T::partition(),
      key: key.clone(),
      reason: e.to_string(),
    })?;
    self.put(T::partition(), &key, &data)
  }

  /// Load a typed entity.
  fn load<T: Cacheable>(&self, key: &str) -> Result<Option<T>, StoreError> {
    self
      .get(T::partition(), key)?
      .map(|record| record.decode())
      .transpose()
  }

  /// Load every entity of a type.
  fn load_all<T: Cacheable>(&self) -> Result<Vec<T>, StoreError> {
    self
      .get_all(T::partition())?
      .iter()
      .map(CachedRecord::decode)
      .collect()
  }
}

/// Bumped whenever `CACHE_SCHEMA` changes shape.
const SCHEMA_VERSION: i32 = 2;

/// Sequence name for pending-operation ids.
const PENDING_SEQUENCE: &str = "pending_operations";

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One row per cached record (serialized JSON), keyed by partition + identity
CREATE TABLE IF NOT EXISTS records (
    partition TEXT NOT NULL,
    record_key TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (partition, record_key)
);

CREATE INDEX IF NOT EXISTS idx_records_cached_at
    ON records(partition, cached_at);

-- Secondary index values, rewritten on every put
CREATE TABLE IF NOT EXISTS record_index (
    partition TEXT NOT NULL,
    record_key TEXT NOT NULL,
    index_name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (partition, record_key, index_name)
);

CREATE INDEX IF NOT EXISTS idx_record_index_lookup
    ON record_index(partition, index_name, value);

-- Last collection response per partition, replaced on every list fetch
CREATE TABLE IF NOT EXISTS list_results (
    partition TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL
);

-- Monotonic id allocation; survives clear_all so ids are never reused
CREATE TABLE IF NOT EXISTS sequences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
"#;

/// SQLite-based cache storage implementation.
///
/// The connection is opened lazily by `initialize` (or the first operation),
/// behind the same lock every operation takes.
pub struct SqliteStore {
  path: Option<PathBuf>,
  conn: Mutex<Option<Connection>>,
}

impl SqliteStore {
  /// A store backed by the file at `path`. Nothing is opened yet.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: Some(path.into()),
      conn: Mutex::new(None),
    }
  }

  /// A store backed by a private in-memory database.
  pub fn in_memory() -> Self {
    Self {
      path: None,
      conn: Mutex::new(None),
    }
  }

  /// Open (and initialize) the store at the default location.
  pub fn open_default() -> Result<Self, StoreError> {
    let store = Self::new(Self::default_path()?);
    store.initialize()?;
    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::StorageUnavailable("could not determine data directory".into()))?;

    Ok(data_dir.join("vhc").join("cache.db"))
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  fn open_connection(&self) -> Result<Connection, StoreError> {
    let conn = match &self.path {
      Some(path) => {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
          std::fs::create_dir_all(parent).map_err(|e| {
            StoreError::StorageUnavailable(format!("failed to create cache directory: {}", e))
          })?;
        }
        Connection::open(path).map_err(|e| {
          StoreError::StorageUnavailable(format!(
            "failed to open cache database at {}: {}",
            path.display(),
            e
          ))
        })?
      }
      None => Connection::open_in_memory()?,
    };

    run_migrations(&conn)?;
    Ok(conn)
  }

  fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, StoreError> {
    self
      .conn
      .lock()
      .map_err(|e| StoreError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }

  /// Run `f` against the open connection, opening it first if needed.
  fn with_conn<R>(
    &self,
    f: impl FnOnce(&mut Connection) -> Result<R, StoreError>,
  ) -> Result<R, StoreError> {
    let mut guard = self.lock()?;
    if guard.is_none() {
      *guard = Some(self.open_connection()?);
    }
    match guard.as_mut() {
      Some(conn) => f(conn),
      None => Err(StoreError::StorageUnavailable("connection not open".into())),
    }
  }
}

/// Create or upgrade the schema according to `PRAGMA user_version`.
fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
  let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
  if version >= SCHEMA_VERSION {
    return Ok(());
  }

  debug!(from = version, to = SCHEMA_VERSION, "upgrading cache schema");
  conn
    .execute_batch(CACHE_SCHEMA)
    .map_err(|e| StoreError::StorageUnavailable(format!("failed to run cache migrations: {}", e)))?;
  conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
  Ok(())
}

fn now_stamp() -> (DateTime<Utc>, String) {
  let now = Utc::now();
  (now, now.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse a stored RFC 3339 capture time.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| format!("failed to parse datetime '{}': {}", s, e))
}

fn decode_row(
  partition: Partition,
  key: String,
  data: &[u8],
  cached_at: &str,
) -> Result<CachedRecord, StoreError> {
  let corrupt = |reason: String| StoreError::Corrupt {
    partition,
    key: key.clone(),
    reason,
  };
  let data: Value = serde_json::from_slice(data).map_err(|e| corrupt(e.to_string()))?;
  let cached_at = parse_datetime(cached_at).map_err(corrupt)?;
  Ok(CachedRecord {
    partition,
    key,
    data,
    cached_at,
  })
}

/// Decode a batch of rows, skipping entries that no longer parse.
fn decode_rows(partition: Partition, rows: Vec<(String, Vec<u8>, String)>) -> Vec<CachedRecord> {
  rows
    .into_iter()
    .filter_map(|(key, data, cached_at)| {
      match decode_row(partition, key, &data, &cached_at) {
        Ok(record) => Some(record),
        Err(e) => {
          warn!(error = %e, "skipping unreadable cache entry");
          None
        }
      }
    })
    .collect()
}

/// Write a record and its index rows inside an open transaction.
fn write_record(
  tx: &Transaction<'_>,
  partition: Partition,
  key: &str,
  record: &Value,
) -> Result<CachedRecord, StoreError> {
  let data = serde_json::to_vec(record).map_err(|e| StoreError::Corrupt {
    partition,
    key: key.to_string(),
    reason: e.to_string(),
  })?;
  let (cached_at, stamp) = now_stamp();

  tx.execute(
    "INSERT INTO records (partition, record_key, data, cached_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(partition, record_key)
     DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
    params![partition.name(), key, data, stamp],
  )?;

  tx.execute(
    "DELETE FROM record_index WHERE partition = ?1 AND record_key = ?2",
    params![partition.name(), key],
  )?;
  for (index, value) in partition.index_values(record) {
    tx.execute(
      "INSERT INTO record_index (partition, record_key, index_name, value)
       VALUES (?1, ?2, ?3, ?4)",
      params![partition.name(), key, index, value],
    )?;
  }

  Ok(CachedRecord {
    partition,
    key: key.to_string(),
    data: record.clone(),
    cached_at,
  })
}

impl CacheStore for SqliteStore {
  fn initialize(&self) -> Result<(), StoreError> {
    self.with_conn(|_| Ok(()))
  }

  fn get(&self, partition: Partition, key: &str) -> Result<Option<CachedRecord>, StoreError> {
    self.with_conn(|conn| {
      let row: Option<(Vec<u8>, String)> = conn
        .query_row(
          "SELECT data, cached_at FROM records WHERE partition = ?1 AND record_key = ?2",
          params![partition.name(), key],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

      row
        .map(|(data, cached_at)| decode_row(partition, key.to_string(), &data, &cached_at))
        .transpose()
    })
  }

  fn get_all(&self, partition: Partition) -> Result<Vec<CachedRecord>, StoreError> {
    self.with_conn(|conn| {
      let mut stmt =
        conn.prepare("SELECT record_key, data, cached_at FROM records WHERE partition = ?1")?;
      let rows = stmt
        .query_map(params![partition.name()], |row| {
          Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<(String, Vec<u8>, String)>, _>>()?;
      Ok(decode_rows(partition, rows))
    })
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

    self.with_conn(|conn| {
      let mut stmt = conn.prepare(
        "SELECT r.record_key, r.data, r.cached_at FROM records r
         INNER JOIN record_index i
           ON i.partition = r.partition AND i.record_key = r.record_key
         WHERE r.partition = ?1 AND i.index_name = ?2 AND i.value = ?3",
      )?;
      let rows = stmt
        .query_map(params![partition.name(), index, value], |row| {
          Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<(String, Vec<u8>, String)>, _>>()?;
      Ok(decode_rows(partition, rows))
    })
  }

  fn put(
    &self,
    partition: Partition,
    key: &str,
    record: &Value,
  ) -> Result<CachedRecord, StoreError> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      let stored = write_record(&tx, partition, key, record)?;
      tx.commit()?;
      Ok(stored)
    })
  }

  fn delete(&self, partition: Partition, key: &str) -> Result<(), StoreError> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      tx.execute(
        "DELETE FROM record_index WHERE partition = ?1 AND record_key = ?2",
        params![partition.name(), key],
      )?;
      tx.execute(
        "DELETE FROM records WHERE partition = ?1 AND record_key = ?2",
        params![partition.name(), key],
      )?;
      tx.commit()?;
      Ok(())
    })
  }

  fn clear_all(&self) -> Result<(), StoreError> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      tx.execute("DELETE FROM record_index", [])?;
      tx.execute("DELETE FROM records", [])?;
      tx.execute("DELETE FROM list_results", [])?;
      tx.commit()?;
      Ok(())
    })
  }

  fn enqueue(&self, operation: NewPendingOperation) -> Result<PendingOperation, StoreError> {
    self.with_conn(|conn| {
      let tx = conn.transaction()?;
      let id: i64 = tx.query_row(
        "INSERT INTO sequences (name, value) VALUES (?1, 1)
         ON CONFLICT(name) DO UPDATE SET value = value + 1
         RETURNING value",
        params![PENDING_SEQUENCE],
        |row| row.get(0),
      )?;

      let operation = operation.into_operation(id, Utc::now());
      let key = operation.cache_key();
      let data = serde_json::to_value(&operation).map_err(|e| StoreError::Corrupt {
        partition: Partition::PendingOperations,
        key: key.clone(),
        reason: e.to_string(),
      })?;
      write_record(&tx, Partition::PendingOperations, &key, &data)?;
      tx.commit()?;
      Ok(operation)
    })
  }

  fn store_list_result(
    &self,
    partition: Partition,
    items: &[Value],
  ) -> Result<CachedRecord, StoreError> {
    let list = Value::Array(items.to_vec());
    let data = serde_json::to_vec(&list).map_err(|e| StoreError::Corrupt {
      partition,
      key: partition.name().to_string(),
      reason: e.to_string(),
    })?;
    let (cached_at, stamp) = now_stamp();

    self.with_conn(|conn| {
      conn.execute(
        "INSERT OR REPLACE INTO list_results (partition, data, cached_at) VALUES (?1, ?2, ?3)",
        params![partition.name(), data, stamp],
      )?;
      Ok(CachedRecord {
        partition,
        key: partition.name().to_string(),
        data: list,
        cached_at,
      })
    })
  }

  fn get_list_result(&self, partition: Partition) -> Result<Option<CachedRecord>, StoreError> {
    self.with_conn(|conn| {
      let row: Option<(Vec<u8>, String)> = conn
        .query_row(
          "SELECT data, cached_at FROM list_results WHERE partition = ?1",
          params![partition.name()],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

      row
        .map(|(data, cached_at)| {
          decode_row(partition, partition.name().to_string(), &data, &cached_at)
        })
        .transpose()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Job, Method, OperationKind, Vehicle};
  use serde_json::json;

  fn store() -> SqliteStore {
    let store = SqliteStore::in_memory();
    store.initialize().unwrap();
    store
  }

  fn new_op(kind: OperationKind, endpoint: &str) -> NewPendingOperation {
    NewPendingOperation {
      kind,
      payload: Some(json!({"vrm": "AB12CDE"})),
      endpoint: endpoint.to_string(),
      method: Method::Post,
    }
  }

  #[test]
  fn test_initialize_is_idempotent() {
    let store = store();
    store.initialize().unwrap();
    store.initialize().unwrap();
    store
      .put(Partition::Jobs, "1", &json!({"id": "1"}))
      .unwrap();
    store.initialize().unwrap();
    assert!(store.get(Partition::Jobs, "1").unwrap().is_some());
  }

  #[test]
  fn test_operations_open_lazily() {
    let store = SqliteStore::in_memory();
    assert!(store.get(Partition::Jobs, "missing").unwrap().is_none());
  }

  #[test]
  fn test_get_absent_is_none() {
    assert!(store().get(Partition::Customers, "nobody").unwrap().is_none());
  }

  #[test]
  fn test_put_twice_keeps_one_record_with_latest_stamp() {
    let store = store();
    let record = json!({"id": "42", "status": "created"});

    let first = store.put(Partition::Jobs, "42", &record).unwrap();
    let second = store.put(Partition::Jobs, "42", &record).unwrap();

    let all = store.get_all(Partition::Jobs).unwrap();
    assert_eq!(all.len(), 1);
    assert!(second.cached_at >= first.cached_at);
    assert_eq!(all[0].data, record);
  }

  #[test]
  fn test_put_overwrites_without_merging() {
    let store = store();
    store
      .put(Partition::Jobs, "42", &json!({"id": "42", "status": "created", "vrm": "X1"}))
      .unwrap();
    store
      .put(Partition::Jobs, "42", &json!({"id": "42", "status": "completed"}))
      .unwrap();

    let stored = store.get(Partition::Jobs, "42").unwrap().unwrap();
    assert_eq!(stored.data, json!({"id": "42", "status": "completed"}));
  }

  #[test]
  fn test_delete_absent_is_noop() {
    let store = store();
    store
      .put(Partition::Vehicles, "AB12CDE", &json!({"vrm": "AB12CDE"}))
      .unwrap();
    store.delete(Partition::Vehicles, "ZZ99ZZZ").unwrap();
    assert_eq!(store.get_all(Partition::Vehicles).unwrap().len(), 1);

    store.delete(Partition::Vehicles, "AB12CDE").unwrap();
    store.delete(Partition::Vehicles, "AB12CDE").unwrap();
    assert!(store.get_all(Partition::Vehicles).unwrap().is_empty());
  }

  #[test]
  fn test_partitions_are_isolated() {
    let store = store();
    store.put(Partition::Jobs, "1", &json!({"id": "1"})).unwrap();
    store
      .put(Partition::Customers, "1", &json!({"id": "1", "name": "A"}))
      .unwrap();

    store.delete(Partition::Jobs, "1").unwrap();
    assert!(store.get(Partition::Customers, "1").unwrap().is_some());
  }

  #[test]
  fn test_get_all_by_index() {
    let store = store();
    store
      .upsert(Partition::Jobs, &json!({"id": "1", "user_id": "tech-a", "status": "created"}))
      .unwrap();
    store
      .upsert(Partition::Jobs, &json!({"id": "2", "user_id": "tech-b", "status": "created"}))
      .unwrap();
    store
      .upsert(Partition::Jobs, &json!({"id": "3", "userId": "tech-a", "status": "completed"}))
      .unwrap();

    let mut keys: Vec<_> = store
      .get_all_by_index(Partition::Jobs, "by_user", "tech-a")
      .unwrap()
      .into_iter()
      .map(|r| r.key)
      .collect();
    keys.sort();
    assert_eq!(keys, vec!["1", "3"]);

    // Reassigning a job moves it between index buckets
    store
      .upsert(Partition::Jobs, &json!({"id": "1", "user_id": "tech-b"}))
      .unwrap();
    assert_eq!(
      store
        .get_all_by_index(Partition::Jobs, "by_user", "tech-a")
        .unwrap()
        .len(),
      1
    );
  }

  #[test]
  fn test_unknown_index_is_an_error() {
    let err = store()
      .get_all_by_index(Partition::Vehicles, "by_user", "x")
      .unwrap_err();
    assert!(matches!(err, StoreError::UnknownIndex { .. }));
  }

  #[test]
  fn test_upsert_requires_key() {
    let err = store()
      .upsert(Partition::Jobs, &json!({"status": "created"}))
      .unwrap_err();
    assert!(matches!(
      err,
      StoreError::MissingKey {
        partition: Partition::Jobs,
        field: "id"
      }
    ));
  }

  #[test]
  fn test_clear_all_empties_every_partition() {
    let store = store();
    store.put(Partition::Jobs, "1", &json!({"id": "1"})).unwrap();
    store
      .put(Partition::UserProfile, "me", &json!({"id": "me", "name": "Sam"}))
      .unwrap();
    store
      .enqueue(new_op(OperationKind::CreateJob, "/api/jobs"))
      .unwrap();

    store.clear_all().unwrap();

    for partition in Partition::ALL {
      assert!(store.get_all(partition).unwrap().is_empty(), "{}", partition);
    }
  }

  #[test]
  fn test_enqueue_assigns_increasing_ids() {
    let store = store();
    let a = store
      .enqueue(new_op(OperationKind::CreateJob, "/api/jobs"))
      .unwrap();
    let b = store
      .enqueue(new_op(OperationKind::CreateJob, "/api/jobs"))
      .unwrap();
    assert!(b.id > a.id);

    store.clear_all().unwrap();
    let c = store
      .enqueue(new_op(OperationKind::UpdateVhc, "/api/vhc/1"))
      .unwrap();
    assert!(c.id > b.id, "ids are not reused after a reset");

    let pending = store.pending_operations().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, OperationKind::UpdateVhc);
  }

  #[test]
  fn test_pending_operations_are_ordered() {
    let store = store();
    for i in 0..12 {
      store
        .enqueue(new_op(OperationKind::UpdateJob, &format!("/api/jobs/{}", i)))
        .unwrap();
    }
    let endpoints: Vec<_> = store
      .pending_operations()
      .unwrap()
      .into_iter()
      .map(|op| op.endpoint)
      .collect();
    let expected: Vec<_> = (0..12).map(|i| format!("/api/jobs/{}", i)).collect();
    assert_eq!(endpoints, expected);
  }

  #[test]
  fn test_pending_by_kind_index() {
    let store = store();
    store
      .enqueue(new_op(OperationKind::CreateJob, "/api/jobs"))
      .unwrap();
    store
      .enqueue(new_op(OperationKind::CreateVhc, "/api/vhc/1"))
      .unwrap();

    let vhc = store
      .get_all_by_index(Partition::PendingOperations, "by_kind", "CREATE_VHC")
      .unwrap();
    assert_eq!(vhc.len(), 1);
  }

  #[test]
  fn test_record_replay_failure_increments_attempts() {
    let store = store();
    let op = store
      .enqueue(new_op(OperationKind::CreateJob, "/api/jobs"))
      .unwrap();

    store.record_replay_failure(op.id, "500 boom").unwrap();
    store.record_replay_failure(op.id, "500 again").unwrap();
    // Unknown ids are ignored
    store.record_replay_failure(9999, "gone").unwrap();

    let pending = store.pending_operations().unwrap();
    assert_eq!(pending[0].attempts, 2);
    assert_eq!(pending[0].last_error.as_deref(), Some("500 again"));
  }

  #[test]
  fn test_typed_save_and_load() {
    let store = store();
    let vehicle = Vehicle {
      vrm: "AB12CDE".to_string(),
      make: Some("Ford".to_string()),
      model: Some("Focus".to_string()),
      year: Some(2019),
      vin: None,
    };
    store.save(&vehicle).unwrap();

    assert_eq!(store.load::<Vehicle>("AB12CDE").unwrap(), Some(vehicle));
    assert!(store.load::<Job>("AB12CDE").unwrap().is_none());
    assert_eq!(store.load_all::<Vehicle>().unwrap().len(), 1);
  }

  #[test]
  fn test_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
      let store = SqliteStore::new(&path);
      store.initialize().unwrap();
      store
        .put(Partition::Jobs, "42", &json!({"id": "42", "status": "created"}))
        .unwrap();
      store
        .enqueue(new_op(OperationKind::CreateJob, "/api/jobs"))
        .unwrap();
    }

    let reopened = SqliteStore::new(&path);
    reopened.initialize().unwrap();
    let job = reopened.get(Partition::Jobs, "42").unwrap().unwrap();
    assert_eq!(job.data["status"], "created");
    assert_eq!(reopened.pending_operations().unwrap().len(), 1);
  }

  #[test]
  fn test_list_result_replaces_previous_list() {
    let store = store();
    store
      .store_list_result(Partition::Jobs, &[json!({"id": "1"}), json!({"id": "2"})])
      .unwrap();
    store
      .store_list_result(Partition::Jobs, &[json!({"id": "1"})])
      .unwrap();

    let list = store.get_list_result(Partition::Jobs).unwrap().unwrap();
    assert_eq!(list.data, json!([{"id": "1"}]));
    assert!(store.get_list_result(Partition::VhcRecords).unwrap().is_none());
    // Lists live apart from item records
    assert!(store.get_all(Partition::Jobs).unwrap().is_empty());

    store.clear_all().unwrap();
    assert!(store.get_list_result(Partition::Jobs).unwrap().is_none());
  }

  #[test]
  fn test_upgrades_version_one_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.db");
    {
      let conn = Connection::open(&path).unwrap();
      conn
        .execute_batch(
          "CREATE TABLE records (
             partition TEXT NOT NULL,
             record_key TEXT NOT NULL,
             data BLOB NOT NULL,
             cached_at TEXT NOT NULL,
             PRIMARY KEY (partition, record_key)
           );
           PRAGMA user_version = 1;",
        )
        .unwrap();
    }

    let store = SqliteStore::new(&path);
    store.initialize().unwrap();
    store
      .store_list_result(Partition::Jobs, &[json!({"id": "1"})])
      .unwrap();
    assert!(store.get_list_result(Partition::Jobs).unwrap().is_some());
  }

  #[test]
  fn test_concurrent_initialize_opens_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("cache.db"));

    std::thread::scope(|scope| {
      let handles: Vec<_> = (0..8)
        .map(|i| {
          let store = &store;
          scope.spawn(move || {
            store.initialize()?;
            store.put(Partition::Jobs, &i.to_string(), &json!({"id": i.to_string()}))
          })
        })
        .collect();
      for handle in handles {
        assert!(handle.join().unwrap().is_ok());
      }
    });

    assert_eq!(store.get_all(Partition::Jobs).unwrap().len(), 8);
    let version: i32 = store
      .with_conn(|conn| Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?))
      .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
  }

  #[test]
  fn test_unopenable_path_is_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let store = SqliteStore::new(blocker.join("cache.db"));
    let err = store.initialize().unwrap_err();
    assert!(matches!(err, StoreError::StorageUnavailable(_)));
  }
}
