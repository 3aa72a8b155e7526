//! Connectivity tracking and replay of the offline queue.

mod connectivity;
mod replay;

pub use connectivity::Connectivity;
pub use replay::{ReplayReport, Replayer};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::config::SyncConfig;
use crate::http::{ApiRequest, Transport};
use crate::models::Method;

/// Build a replayer from `config` and start its connectivity watcher.
///
/// The watcher runs until the returned handle is aborted or the runtime
/// shuts down.
pub fn spawn_sync<S, T>(
  store: Arc<S>,
  transport: Arc<T>,
  connectivity: Connectivity,
  config: &SyncConfig,
) -> (Arc<Replayer<S, T>>, JoinHandle<()>)
where
  S: CacheStore + 'static,
  T: Transport + 'static,
{
  let replayer = Arc::new(Replayer::new(store, transport, connectivity, config.max_attempts));
  let watcher = watch_connectivity(
    Arc::clone(&replayer),
    config.health_path.clone(),
    config.probe_interval(),
  );
  (replayer, watcher)
}

/// Spawn a task that drains the queue whenever connectivity comes back.
///
/// While observed offline, `health_path` is probed every `interval`; any
/// HTTP answer counts as being back online. Requests that reach the server
/// bring it back too. Nothing is probed while offline is forced. The queue
/// is also drained once at startup if the client starts online.
pub fn watch_connectivity<S, T>(
  replayer: Arc<Replayer<S, T>>,
  health_path: String,
  interval: Duration,
) -> JoinHandle<()>
where
  S: CacheStore + 'static,
  T: Transport + 'static,
{
  tokio::spawn(async move {
    let connectivity = replayer.connectivity().clone();
    let mut rx = connectivity.subscribe();
    let probe = ApiRequest::new(Method::Get, health_path, None);

    let mut was_online = connectivity.is_online();
    if was_online {
      drain(&replayer).await;
    }

    loop {
      if connectivity.is_online() || connectivity.is_forced_offline() {
        if rx.changed().await.is_err() {
          break;
        }
      } else {
        tokio::select! {
          changed = rx.changed() => {
            if changed.is_err() {
              break;
            }
          }
          _ = tokio::time::sleep(interval) => {
            match replayer.transport().execute(&probe).await {
              Ok(raw) => {
                debug!(status = raw.status, "health probe answered");
                connectivity.set_online(true);
              }
              Err(e) => debug!(error = %e, "health probe failed"),
            }
          }
        }
      }

      let online = connectivity.is_online();
      if online && !was_online {
        info!("connectivity restored");
        drain(&replayer).await;
      }
      was_online = online;
    }
  })
}

async fn drain<S: CacheStore, T: Transport>(replayer: &Replayer<S, T>) {
  if let Err(e) = replayer.drain().await {
    warn!(error = %e, "replay failed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::http::testing::FakeTransport;
  use crate::models::{NewPendingOperation, OperationKind};
  use serde_json::json;

  fn queue_one(store: &MemoryStore) {
    store
      .enqueue(NewPendingOperation {
        kind: OperationKind::CreateJob,
        payload: Some(json!({"vrm": "AB12CDE"})),
        endpoint: "/api/jobs".to_string(),
        method: Method::Post,
      })
      .unwrap();
  }

  async fn wait_for_empty_queue(store: &MemoryStore) {
    for _ in 0..500 {
      if store.pending_operations().unwrap().is_empty() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("queue was never drained");
  }

  #[tokio::test]
  async fn test_health_check_brings_client_online_and_drains() {
    let store = Arc::new(MemoryStore::new());
    queue_one(&store);

    let transport = FakeTransport::new();
    transport.respond(200, "ok").respond(201, "{}");
    let connectivity = Connectivity::offline();
    let replayer = Arc::new(Replayer::new(
      Arc::clone(&store),
      Arc::new(transport),
      connectivity.clone(),
      5,
    ));

    let handle = watch_connectivity(
      Arc::clone(&replayer),
      "/api/health".to_string(),
      Duration::from_millis(10),
    );
    wait_for_empty_queue(&store).await;
    handle.abort();

    assert!(connectivity.is_online());
    let calls = replayer.transport().calls();
    assert_eq!(calls[0].url, "/api/health");
    assert_eq!(calls[1].url, "/api/jobs");
  }

  #[tokio::test]
  async fn test_spawn_sync_uses_configured_health_path() {
    let store = Arc::new(MemoryStore::new());
    queue_one(&store);

    let transport = FakeTransport::new();
    transport.respond(200, "ok").respond(201, "{}");
    let config = SyncConfig {
      health_path: "/healthz".to_string(),
      probe_interval_secs: 1,
      max_attempts: 3,
    };

    let (replayer, watcher) = spawn_sync(
      Arc::clone(&store),
      Arc::new(transport),
      Connectivity::offline(),
      &config,
    );
    wait_for_empty_queue(&store).await;
    watcher.abort();

    let calls = replayer.transport().calls();
    assert_eq!(calls[0].url, "/healthz");
    assert_eq!(calls[1].url, "/api/jobs");
  }

  #[tokio::test]
  async fn test_forced_offline_skips_health_checks() {
    let store = Arc::new(MemoryStore::new());
    queue_one(&store);

    let transport = FakeTransport::new();
    transport.respond(200, "ok").respond(201, "{}");
    let connectivity = Connectivity::forced_offline();
    let replayer = Arc::new(Replayer::new(
      Arc::clone(&store),
      Arc::new(transport),
      connectivity.clone(),
      5,
    ));

    let handle = watch_connectivity(
      Arc::clone(&replayer),
      "/api/health".to_string(),
      Duration::from_millis(5),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(replayer.transport().calls().is_empty());

    connectivity.set_forced_offline(false);
    connectivity.set_online(true);
    wait_for_empty_queue(&store).await;
    handle.abort();
  }

  #[tokio::test]
  async fn test_transition_to_online_triggers_drain() {
    let store = Arc::new(MemoryStore::new());
    queue_one(&store);

    let transport = FakeTransport::new();
    transport.respond(201, "{}");
    let connectivity = Connectivity::offline();
    let replayer = Arc::new(Replayer::new(
      Arc::clone(&store),
      Arc::new(transport),
      connectivity.clone(),
      5,
    ));

    let handle = watch_connectivity(
      Arc::clone(&replayer),
      "/api/health".to_string(),
      Duration::from_secs(3600),
    );
    connectivity.set_online(true);
    wait_for_empty_queue(&store).await;
    handle.abort();

    assert_eq!(replayer.transport().calls().len(), 1);
  }
}
