//! URL routing for cache partitions and queued operation kinds.

use url::Url;

use crate::cache::Partition;
use crate::models::{Method, OperationKind};

/// Where a GET response for a route is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheTarget {
  /// A single record at this key
  Item { partition: Partition, key: String },
  /// The route returns the whole collection
  List { partition: Partition },
}

/// One row of the routing table.
#[derive(Debug)]
pub struct Route {
  /// Path segments; `None` captures the record key.
  pub segments: &'static [Option<&'static str>],
  pub partition: Partition,
  pub create: OperationKind,
  pub update: OperationKind,
}

impl Route {
  /// Match the leading segments of `path`, returning the captured key if any.
  /// A key equal to the collection name before it (`/api/jobs/jobs`) does not
  /// match.
  fn match_prefix(&self, path: &[&str]) -> Option<Option<String>> {
    if path.len() < self.segments.len() {
      return None;
    }
    let mut key = None;
    let mut collection = None;
    for (pattern, actual) in self.segments.iter().zip(path) {
      match pattern {
        Some(literal) if literal == actual => collection = Some(*literal),
        Some(_) => return None,
        None if collection == Some(*actual) => return None,
        None => key = Some((*actual).to_string()),
      }
    }
    Some(key)
  }
}

/// Ordered routing table; the most specific route is listed first.
pub const ROUTES: &[Route] = &[
  Route {
    segments: &[Some("api"), Some("jobs"), None],
    partition: Partition::Jobs,
    create: OperationKind::CreateJob,
    update: OperationKind::UpdateJob,
  },
  Route {
    segments: &[Some("api"), Some("jobs")],
    partition: Partition::Jobs,
    create: OperationKind::CreateJob,
    update: OperationKind::UpdateJob,
  },
  Route {
    segments: &[Some("api"), Some("vhc"), None],
    partition: Partition::VhcRecords,
    create: OperationKind::CreateVhc,
    update: OperationKind::UpdateVhc,
  },
  Route {
    segments: &[Some("api"), Some("fit-finish"), None],
    partition: Partition::FitFinishRecords,
    create: OperationKind::CreateFitFinish,
    update: OperationKind::UpdateFitFinish,
  },
];

/// Outcome of routing a URL.
#[derive(Debug, Clone)]
pub struct RouteMatch {
  pub route: &'static Route,
  /// Captured `{id}` segment, if the route has one
  pub key: Option<String>,
  /// True when the URL has no segments beyond the route's pattern
  pub exact: bool,
}

impl RouteMatch {
  /// Cache location for a GET on this URL. Sub-resources are not cached.
  pub fn cache_target(&self) -> Option<CacheTarget> {
    if !self.exact {
      return None;
    }
    let partition = self.route.partition;
    match &self.key {
      Some(key) => Some(CacheTarget::Item {
        partition,
        key: key.clone(),
      }),
      None => Some(CacheTarget::List { partition }),
    }
  }

  pub fn operation_kind(&self, method: Method) -> OperationKind {
    match method {
      Method::Post => self.route.create,
      _ => self.route.update,
    }
  }
}

/// Path segments of `url`, which may be absolute or a bare path.
/// Query strings and fragments are ignored, as are empty segments.
pub fn path_segments(url: &str) -> Vec<String> {
  let path = match Url::parse(url) {
    Ok(parsed) => parsed.path().to_string(),
    Err(_) => url
      .split(['?', '#'])
      .next()
      .unwrap_or_default()
      .to_string(),
  };
  path
    .split('/')
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

/// Find the most specific route for `url`.
pub fn resolve(url: &str) -> Option<RouteMatch> {
  let segments = path_segments(url);
  let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

  ROUTES
    .iter()
    .filter_map(|route| {
      route.match_prefix(&segments).map(|key| RouteMatch {
        route,
        key,
        exact: segments.len() == route.segments.len(),
      })
    })
    .max_by_key(|m| m.route.segments.len())
}

/// Cache location for a GET on `url`, if the response should be cached.
pub fn cache_target(url: &str) -> Option<CacheTarget> {
  resolve(url).and_then(|m| m.cache_target())
}

/// Kind recorded for a mutation on `url` queued while offline.
pub fn operation_kind(method: Method, url: &str) -> OperationKind {
  resolve(url)
    .map(|m| m.operation_kind(method))
    .unwrap_or(OperationKind::Unknown)
}
