//! Decoded message types exchanged between the transport layer and the
//! sync core.
//!
//! The transport decodes wire frames into [`Message`] values and hands them
//! to the sync core; outbound messages travel the same enum in the other
//! direction. The sync core reacts to four kinds — score announcements,
//! extension requests/batches, and local-score broadcasts — and passes
//! every other kind through untouched in both directions.

use crest_types::{Block, BlockSignature, Score};
use serde::{Deserialize, Serialize};

/// A decoded node-to-node message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// A peer's announcement of its cumulative chain score.
    Score(Score),

    /// Ask a peer for blocks extending the local chain.
    ///
    /// `signatures` are the local chain's tip signatures, newest first, so
    /// the peer can locate the common ancestor.
    GetExtension { signatures: Vec<BlockSignature> },

    /// A batch of blocks answering a [`Message::GetExtension`].
    ///
    /// An empty batch means "you are already caught up".
    Extension { blocks: Vec<Block> },

    /// Broadcast of the local node's own chain score.
    LocalScore(Score),

    /// A relayed transaction — opaque to the sync core.
    Transaction(Vec<u8>),

    /// Inventory announcement of known block signatures — opaque to the
    /// sync core.
    Inventory(Vec<BlockSignature>),
}

impl Message {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Score(_) => "score",
            Message::GetExtension { .. } => "get_extension",
            Message::Extension { .. } => "extension",
            Message::LocalScore(_) => "local_score",
            Message::Transaction(_) => "transaction",
            Message::Inventory(_) => "inventory",
        }
    }
}
