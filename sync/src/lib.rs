//! Chain-sync triggering for a Crest node.
//!
//! Decides, as peer scores and the local chain change concurrently, which
//! single connection the node downloads a chain extension from:
//! - [`ScoreObserver`] — the shared, lock-free peer-selection state machine
//! - [`SyncConfig`] — TOML-backed configuration (score TTL, logging)
//! - collaborator traits ([`SignatureProvider`], [`OutboundSink`]) at the
//!   seams toward the history component and the transport

pub mod config;
pub mod error;
pub mod logging;
pub mod observer;

pub use config::SyncConfig;
pub use error::SyncError;
pub use logging::{init_logging, LogFormat};
pub use observer::{OutboundSink, ScoreObserver, SignatureProvider};
