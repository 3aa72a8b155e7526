//! Resilient request layer.
//!
//! Requests go out through a [`Transport`]. Successful GETs are mirrored into
//! the cache; when the network is unreachable, reads are served from the cache
//! and mutations are queued for replay.

mod client;
mod response;
pub mod routing;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{RequestOutcome, ResilientClient};
pub use response::{ApiResponse, ResponseSource};
pub use routing::CacheTarget;
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, Transport, TransportError};
