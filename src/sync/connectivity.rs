//! Shared online/offline flag with change notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the client's view of connectivity.
///
/// Two things are tracked. The observed state follows the network: a
/// transport error marks it offline and any HTTP answer marks it online.
/// Forced offline is set on purpose (`--offline`) and keeps requests off the
/// network until cleared. Every clone observes the same state, and
/// [`subscribe`](Self::subscribe) yields a receiver that wakes on each change.
#[derive(Clone, Debug)]
pub struct Connectivity {
  tx: Arc<watch::Sender<bool>>,
  forced_offline: Arc<AtomicBool>,
}

impl Connectivity {
  pub fn new(online: bool) -> Self {
    let (tx, _rx) = watch::channel(online);
    Self {
      tx: Arc::new(tx),
      forced_offline: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn online() -> Self {
    Self::new(true)
  }

  /// Observed offline. Requests still try the network.
  pub fn offline() -> Self {
    Self::new(false)
  }

  /// Offline on purpose. Requests skip the network entirely.
  pub fn forced_offline() -> Self {
    let connectivity = Self::new(false);
    connectivity.set_forced_offline(true);
    connectivity
  }

  pub fn is_online(&self) -> bool {
    !self.is_forced_offline() && *self.tx.borrow()
  }

  pub fn is_forced_offline(&self) -> bool {
    self.forced_offline.load(Ordering::SeqCst)
  }

  /// Update the observed state. Returns true when it actually changed.
  pub fn set_online(&self, online: bool) -> bool {
    self.tx.send_if_modified(|current| {
      if *current == online {
        false
      } else {
        *current = online;
        true
      }
    })
  }

  /// Force or release offline mode, waking subscribers.
  pub fn set_forced_offline(&self, forced: bool) {
    if self.forced_offline.swap(forced, Ordering::SeqCst) != forced {
      self.tx.send_modify(|_| {});
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<bool> {
    self.tx.subscribe()
  }
}

impl Default for Connectivity {
  fn default() -> Self {
    Self::online()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_online_reports_changes() {
    let connectivity = Connectivity::online();
    assert!(!connectivity.set_online(true));
    assert!(connectivity.set_online(false));
    assert!(!connectivity.is_online());
  }

  #[test]
  fn test_clones_share_state() {
    let a = Connectivity::offline();
    let b = a.clone();
    a.set_online(true);
    assert!(b.is_online());

    a.set_forced_offline(true);
    assert!(b.is_forced_offline());
  }

  #[test]
  fn test_forced_offline_overrides_observed_state() {
    let connectivity = Connectivity::forced_offline();
    connectivity.set_online(true);
    assert!(!connectivity.is_online());

    connectivity.set_forced_offline(false);
    assert!(connectivity.is_online());
  }

  #[tokio::test]
  async fn test_subscribers_wake_on_change() {
    let connectivity = Connectivity::offline();
    let mut rx = connectivity.subscribe();

    connectivity.set_online(true);
    rx.changed().await.unwrap();
    assert!(*rx.borrow_and_update());

    connectivity.set_forced_offline(true);
    rx.changed().await.unwrap();
    assert!(!connectivity.is_online());
  }
}
