//! Offline-first cache and request layer for vehicle health check inspections.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod inspection;
pub mod models;
pub mod sync;

pub use cache::{CacheStore, MemoryStore, Partition, SqliteStore};
pub use config::Config;
pub use error::{RequestError, StoreError};
pub use http::{ApiResponse, ReqwestTransport, ResilientClient};
pub use sync::{Connectivity, Replayer};
