//! Request layer that keeps working when the network does not.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::response::ApiResponse;
use super::routing::{self, CacheTarget};
use super::transport::{ApiRequest, RawResponse, Transport};
use crate::cache::{CacheStore, Partition};
use crate::error::{RequestError, StoreError};
use crate::models::{Method, NewPendingOperation};
use crate::sync::Connectivity;

/// Terminal state of a single request, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
  Succeeded,
  ServerRejected,
  ServedFromCache,
  Queued,
  PropagatedError,
}

impl fmt::Display for RequestOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      RequestOutcome::Succeeded => "succeeded",
      RequestOutcome::ServerRejected => "server_rejected",
      RequestOutcome::ServedFromCache => "served_from_cache",
      RequestOutcome::Queued => "queued",
      RequestOutcome::PropagatedError => "propagated_error",
    })
  }
}

/// HTTP client with write-through caching and an offline mutation queue.
///
/// On success, GET responses are mirrored into the store. When the network
/// is unreachable, reads are answered from the store and writes are queued
/// for [`Replayer`](crate::sync::Replayer). Server rejections pass straight
/// through and never touch the store. Every request tries the network unless
/// the client is forced offline.
pub struct ResilientClient<S: CacheStore, T: Transport> {
  store: Arc<S>,
  transport: Arc<T>,
  connectivity: Connectivity,
}

impl<S: CacheStore, T: Transport> ResilientClient<S, T> {
  pub fn new(store: Arc<S>, transport: Arc<T>, connectivity: Connectivity) -> Self {
    Self {
      store,
      transport,
      connectivity,
    }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  pub fn transport(&self) -> &Arc<T> {
    &self.transport
  }

  pub fn connectivity(&self) -> &Connectivity {
    &self.connectivity
  }

  pub async fn get(&self, url: &str) -> Result<ApiResponse, RequestError> {
    self.send(Method::Get, url, None).await
  }

  pub async fn post(&self, url: &str, body: Value) -> Result<ApiResponse, RequestError> {
    self.send(Method::Post, url, Some(body)).await
  }

  pub async fn put(&self, url: &str, body: Value) -> Result<ApiResponse, RequestError> {
    self.send(Method::Put, url, Some(body)).await
  }

  pub async fn patch(&self, url: &str, body: Value) -> Result<ApiResponse, RequestError> {
    self.send(Method::Patch, url, Some(body)).await
  }

  pub async fn delete(&self, url: &str) -> Result<ApiResponse, RequestError> {
    self.send(Method::Delete, url, None).await
  }

  /// Send one request.
  ///
  /// The caller always gets a fetch-shaped result: the live response, a
  /// cache-served or queued stand-in, or the original error. Failures of
  /// the store itself are logged and never replace that error.
  pub async fn send(
    &self,
    method: Method,
    url: &str,
    body: Option<Value>,
  ) -> Result<ApiResponse, RequestError> {
    let request = ApiRequest::new(method, url, body);

    let network_error = if self.connectivity.is_forced_offline() {
      RequestError::NetworkFailure("client is offline".to_string())
    } else {
      match self.transport.execute(&request).await {
        Ok(raw) => {
          if self.connectivity.set_online(true) {
            debug!("network reachable again");
          }
          return self.on_response(&request, raw);
        }
        Err(e) => {
          if self.connectivity.set_online(false) {
            debug!(error = %e, "network unreachable, switching to offline mode");
          }
          RequestError::NetworkFailure(e.0)
        }
      }
    };

    let result = self.fallback(request.clone(), network_error);
    let outcome = match &result {
      Ok(response) if response.served_from_cache() => RequestOutcome::ServedFromCache,
      Ok(_) => RequestOutcome::Queued,
      Err(_) => RequestOutcome::PropagatedError,
    };
    debug!(method = %request.method, url = %request.url, %outcome, "request finished");
    result
  }

  fn on_response(&self, request: &ApiRequest, raw: RawResponse) -> Result<ApiResponse, RequestError> {
    if !raw.is_success() {
      debug!(
        method = %request.method,
        url = %request.url,
        status = raw.status,
        outcome = %RequestOutcome::ServerRejected,
        "request finished"
      );
      return Err(RequestError::ServerRejected {
        status: raw.status,
        body: raw.body,
      });
    }

    if request.method.is_read() {
      self.write_through(&request.url, &raw.body);
    }

    debug!(
      method = %request.method,
      url = %request.url,
      status = raw.status,
      outcome = %RequestOutcome::Succeeded,
      "request finished"
    );
    Ok(ApiResponse::from_network(raw))
  }

  /// Mirror a successful GET into the store. Best effort.
  fn write_through(&self, url: &str, body: &str) {
    let Some(target) = routing::cache_target(url) else {
      return;
    };

    let payload: Value = match serde_json::from_str(body) {
      Ok(payload) => payload,
      Err(e) => {
        warn!(url, error = %e, "response is not JSON, not caching");
        return;
      }
    };

    match target {
      CacheTarget::Item { partition, key } => {
        if let Err(e) = self.store.put(partition, &key, &payload) {
          warn!(url, error = %e, "failed to cache response");
        }
      }
      CacheTarget::List { partition } => {
        let Value::Array(items) = payload else {
          warn!(url, "list response is not an array, not caching");
          return;
        };
        if let Err(e) = self.store.store_list_result(partition, &items) {
          warn!(url, error = %e, "failed to cache list response");
        }
        for item in &items {
          if let Err(e) = self.store.upsert(partition, item) {
            warn!(url, error = %e, "failed to cache list item");
          }
        }
      }
    }
  }

  fn fallback(&self, request: ApiRequest, error: RequestError) -> Result<ApiResponse, RequestError> {
    if request.method.is_read() {
      return self.read_cached(&request.url).ok_or(error);
    }

    let operation = NewPendingOperation {
      kind: routing::operation_kind(request.method, &request.url),
      payload: request.body,
      endpoint: request.url,
      method: request.method,
    };
    match self.store.enqueue(operation) {
      Ok(queued) => {
        debug!(id = queued.id, kind = %queued.kind, "queued offline mutation");
        Ok(ApiResponse::from_queue(queued.id))
      }
      Err(e) => {
        warn!(error = %e, "failed to queue offline mutation");
        Err(error)
      }
    }
  }

  /// Cached stand-in for a GET, if the route is cacheable and data exists.
  fn read_cached(&self, url: &str) -> Option<ApiResponse> {
    let lookup = match routing::cache_target(url)? {
      CacheTarget::Item { partition, key } => self.store.get(partition, &key).map(|record| {
        record.map(|record| ApiResponse::from_cache(&record.data, Some(record.cached_at)))
      }),
      CacheTarget::List { partition } => self.cached_list(partition),
    };

    lookup.unwrap_or_else(|e| {
      warn!(url, error = %e, "cache lookup failed");
      None
    })
  }

  /// The last live list for a partition. Members keep the list's order but
  /// show their latest item record, so item updates appear in the list.
  fn cached_list(&self, partition: Partition) -> Result<Option<ApiResponse>, StoreError> {
    let Some(list) = self.store.get_list_result(partition)? else {
      return Ok(None);
    };
    let Value::Array(items) = list.data else {
      return Ok(None);
    };

    let mut oldest = list.cached_at;
    let mut members = Vec::with_capacity(items.len());
    for item in items {
      let current = match partition.key_of(&item) {
        Some(key) => self.store.get(partition, &key)?,
        None => None,
      };
      match current {
        Some(record) => {
          oldest = oldest.min(record.cached_at);
          members.push(record.data);
        }
        None => members.push(item),
      }
    }

    Ok(Some(ApiResponse::from_cache(&Value::Array(members), Some(oldest))))
  }
}


impl<S: CacheStore, T: Transport> Clone for ResilientClient<S, T> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      transport: Arc::clone(&self.transport),
      connectivity: self.connectivity.clone(),
    }
  }
}
