//! Courier Core - client-side HTTP request orchestration.
//!
//! Wraps an HTTP transport with the behavior application code expects from
//! every backend call:
//! - duplicate suppression (a newer identical request supersedes the older)
//! - a shared loading overlay with a debounced close
//! - fixed-delay retries for transport failures
//! - business-code classification of `{code, msg, data}` payloads
//! - success and error notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_core::{ApiRequest, HttpOrchestrator, ReqwestTransport};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> courier_core::Result<()> {
//!     let transport = ReqwestTransport::from_env()?;
//!     let orchestrator = HttpOrchestrator::builder(Arc::new(transport)).build();
//!
//!     let payload = orchestrator
//!         .send(ApiRequest::get("/api/weather").query("city", "Hangzhou"))
//!         .await?;
//!     println!("{}", payload["data"]);
//!
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod network;
pub mod notify;
pub mod options;
pub mod orchestrator;
pub mod request;
pub mod storage;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use error::{CourierError, Result};
pub use network::{
    LoadingCoordinator, ReqwestTransport, RequestKeyRegistry, RetryPolicy, Transport,
    TransportRequest, TransportResponse,
};
pub use notify::{LoadingOverlay, NotificationPort, NoopOverlay, TracingNotifier};
pub use options::{LoadingSetting, NoticeMode, RequestOptions, ResolvedOptions};
pub use orchestrator::{HttpOrchestrator, HttpOrchestratorBuilder};
pub use request::ApiRequest;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
