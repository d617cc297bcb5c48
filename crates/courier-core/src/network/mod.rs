//! Request plumbing shared by every call chain.
//!
//! This module provides:
//! - Duplicate suppression keyed by method, URL and body
//! - The reference-counted loading overlay with a debounced close
//! - Fixed-delay retry decisions
//! - The transport seam and its reqwest implementation

mod loading;
mod registry;
mod retry;
mod transport;

pub use loading::{Debouncer, LoadingCoordinator, LoadingGuard};
pub use registry::{request_key, PendingGuard, RequestKeyRegistry};
pub use retry::{RetryPolicy, RetryStats};
pub use transport::{
    parse_body, DynTransport, ReqwestTransport, Transport, TransportRequest, TransportResponse,
};
