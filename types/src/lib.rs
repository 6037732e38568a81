//! Fundamental types for the Crest sync subsystem.
//!
//! This crate defines the types shared between the transport layer, the
//! sync core, and the block applier: connection handles, cumulative chain
//! scores, and block identifiers.

pub mod block;
pub mod connection;
pub mod score;

pub use block::{Block, BlockSignature};
pub use connection::ConnectionId;
pub use score::Score;
