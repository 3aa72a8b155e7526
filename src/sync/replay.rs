//! Replay of mutations queued while offline.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Connectivity;
use crate::cache::{CacheStore, Partition};
use crate::error::StoreError;
use crate::http::{ApiRequest, Transport};

/// Counts from one pass over the pending queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
  /// Sent and accepted, then removed from the queue
  pub replayed: usize,
  /// Rejected by the server and kept for another attempt
  pub failed: usize,
  /// Rejected too many times and dropped
  pub discarded: usize,
  /// Still queued when the pass ended
  pub remaining: usize,
}

/// Sends queued mutations back to the server in the order they were captured.
pub struct Replayer<S: CacheStore, T: Transport> {
  store: Arc<S>,
  transport: Arc<T>,
  connectivity: Connectivity,
  max_attempts: u32,
}

impl<S: CacheStore, T: Transport> Replayer<S, T> {
  pub fn new(store: Arc<S>, transport: Arc<T>, connectivity: Connectivity, max_attempts: u32) -> Self {
    Self {
      store,
      transport,
      connectivity,
      max_attempts: max_attempts.max(1),
    }
  }

  pub fn connectivity(&self) -> &Connectivity {
    &self.connectivity
  }

  pub fn transport(&self) -> &Arc<T> {
    &self.transport
  }

  /// Replay the queue once.
  ///
  /// Stops at the first network failure, leaving that entry and everything
  /// after it queued. Server rejections bump the entry's attempt count and
  /// the pass moves on.
  pub async fn drain(&self) -> Result<ReplayReport, StoreError> {
    let mut report = ReplayReport::default();
    let pending = self.store.pending_operations()?;
    if pending.is_empty() {
      return Ok(report);
    }
    info!(count = pending.len(), "replaying queued operations");

    for operation in pending {
      let key = operation.id.to_string();
      let request = ApiRequest::new(operation.method, operation.endpoint.clone(), operation.payload.clone());

      let raw = match self.transport.execute(&request).await {
        Ok(raw) => raw,
        Err(e) => {
          self.connectivity.set_online(false);
          warn!(id = operation.id, error = %e, "replay interrupted by network failure");
          break;
        }
      };
      self.connectivity.set_online(true);

      if raw.is_success() {
        self.store.delete(Partition::PendingOperations, &key)?;
        debug!(id = operation.id, kind = %operation.kind, status = raw.status, "replayed");
        report.replayed += 1;
      } else if operation.attempts + 1 >= self.max_attempts {
        self.store.delete(Partition::PendingOperations, &key)?;
        warn!(
          id = operation.id,
          kind = %operation.kind,
          status = raw.status,
          attempts = operation.attempts + 1,
          "discarding operation after repeated rejections"
        );
        report.discarded += 1;
      } else {
        let error = format!("status {}: {}", raw.status, raw.body);
        self.store.record_replay_failure(operation.id, &error)?;
        debug!(id = operation.id, status = raw.status, "replay rejected, keeping");
        report.failed += 1;
      }
    }

    report.remaining = self.store.pending_operations()?.len();
    info!(
      replayed = report.replayed,
      failed = report.failed,
      discarded = report.discarded,
      remaining = report.remaining,
      "replay finished"
    );
    Ok(report)
  }
}
