//! Peer-score observation and extension-download triggering.
//!
//! One [`ScoreObserver`] instance is shared across every connection's
//! execution context. It tracks the most recent score each live peer
//! announced, decides which single connection (if any) is authorized to
//! stream a chain extension, and emits [`Message::GetExtension`] requests
//! when a download becomes justified.
//!
//! There is no coarse lock. Correctness rests on three things:
//! - the score table replaces entries atomically per key,
//! - the pinned slot only changes through single-word compare-and-swap,
//! - every handler snapshots "highest scored" before mutating and acts on
//!   the snapshot via CAS, so a losing racer's intended post-condition is
//!   already established by the winner.
//!
//! A failed CAS is never retried: it means another connection's context
//! already resolved the transition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crest_messages::Message;
use crest_types::{Block, BlockSignature, ConnectionId, Score};

/// Pin-slot encoding for "no connection pinned". Connection id 0 is
/// reserved by the transport, so the raw id doubles as the slot word.
const UNPINNED: u64 = 0;

/// Pull-based access to local chain state, supplied by the history
/// component.
///
/// `last_signatures` is re-evaluated at every request send — the local
/// chain can advance between the moment a connection is pinned and the
/// moment the request goes out, and the request must reflect the tip at
/// send time.
pub trait SignatureProvider: Send + Sync {
    /// The current local chain's tip signatures, newest first.
    fn last_signatures(&self) -> Vec<BlockSignature>;

    /// The local chain score at startup.
    fn initial_local_score(&self) -> Score;
}

/// Transport-side sink delivering a message to a specific connection.
///
/// Must not block: implementations enqueue onto the connection's own
/// writer, they do not wait for the wire.
pub trait OutboundSink: Send + Sync {
    fn send(&self, conn: ConnectionId, message: Message);
}

/// Shared peer-selection state machine.
///
/// Handlers may be invoked concurrently from as many threads as there are
/// connections; all of them take `&self`.
pub struct ScoreObserver {
    /// Most recently announced score per live connection.
    scores: Arc<DashMap<ConnectionId, Score>>,
    /// Raw id of the connection currently authorized to stream an
    /// extension, or [`UNPINNED`].
    pinned: AtomicU64,
    /// Last score the local node reported. Coarse trigger only — last
    /// writer wins.
    local_score: RwLock<Score>,
    /// How long a score entry stays valid without a fresher announcement.
    score_ttl: Duration,
    history: Arc<dyn SignatureProvider>,
    outbound: Arc<dyn OutboundSink>,
    /// Messages this core does not consume, forwarded to the applier.
    upstream: mpsc::UnboundedSender<(ConnectionId, Message)>,
}

impl ScoreObserver {
    /// Create an observer and the receiving end of its upstream channel.
    ///
    /// The receiver yields every inbound message the observer passes
    /// through — extension batches from the pinned connection included —
    /// tagged with the originating connection.
    pub fn new(
        score_ttl: Duration,
        history: Arc<dyn SignatureProvider>,
        outbound: Arc<dyn OutboundSink>,
    ) -> (Self, mpsc::UnboundedReceiver<(ConnectionId, Message)>) {
        let (upstream, upstream_rx) = mpsc::unbounded_channel();
        let local_score = history.initial_local_score();

        let observer = Self {
            scores: Arc::new(DashMap::new()),
            pinned: AtomicU64::new(UNPINNED),
            local_score: RwLock::new(local_score),
            score_ttl,
            history,
            outbound,
            upstream,
        };
        (observer, upstream_rx)
    }

    // ── Entry points ───────────────────────────────────────────────────

    /// An inbound message decoded from `conn`.
    ///
    /// Score announcements and extension batches are handled here; every
    /// other kind is forwarded upstream untouched.
    pub fn handle_message(&self, conn: ConnectionId, message: Message) {
        match message {
            Message::Score(score) => self.score_announced(conn, score),
            Message::Extension { blocks } => self.extension_received(conn, blocks),
            other => {
                tracing::trace!(conn = %conn, kind = other.kind(), "passing message upstream");
                self.forward_upstream(conn, other);
            }
        }
    }

    /// An outbound message on its way to `conn`.
    ///
    /// Local-score broadcasts are intercepted here (once per connection
    /// context they propagate through); every other kind goes straight to
    /// the transport.
    pub fn forward_message(&self, conn: ConnectionId, message: Message) {
        match message {
            Message::LocalScore(score) => self.local_score_changed(conn, score),
            other => self.outbound.send(conn, other),
        }
    }

    /// The transport closed `conn`.
    ///
    /// Removes the connection's score entry and, when the closing
    /// connection held the top score, hands the pin to the runner-up and
    /// requests an extension from it.
    pub fn connection_closed(&self, conn: ConnectionId) {
        // Snapshot the leader before touching the table: the decision
        // below must be about the world this close event arrived in.
        let best_before = self.highest_scored();

        if let Some((_, removed)) = self.scores.remove(&conn) {
            tracing::debug!(conn = %conn, score = %removed, "removed score of closed connection");
        }

        let Some((best, _)) = best_before else {
            return;
        };

        if best == conn {
            // The closing connection was the leader: promote second place.
            let second = self.highest_scored();
            if self.cas_pin(Some(conn), second.map(|(c, _)| c)) {
                match second {
                    Some((next, score)) => {
                        tracing::debug!(conn = %conn, next = %next, score = %score, "pin handed to runner-up");
                        self.request_extension(next, score);
                    }
                    None => {
                        tracing::debug!(conn = %conn, "last scored connection closed, unpinned");
                    }
                }
            }
        } else if self.cas_pin(Some(conn), None) {
            // Closing connection was pinned without holding the top score
            // (transient state) — just clear it.
            tracing::debug!(conn = %conn, "cleared pin of closed connection");
        }
    }

    // ── Inbound handlers ───────────────────────────────────────────────

    /// `conn` announced `new_score`.
    fn score_announced(&self, conn: ConnectionId, new_score: Score) {
        self.arm_expiry(conn, new_score);

        let previous = self.scores.insert(conn, new_score);
        tracing::debug!(conn = %conn, score = %new_score, "stored peer score");

        let Some((best, best_score)) = self.highest_scored() else {
            return;
        };

        let increased = previous.map_or(true, |p| p < new_score);
        let local = *self.local_score.read();

        // A new leader triggers a download only when the system is
        // completely unpinned; a failed CAS here means a download is
        // already in flight somewhere.
        if best == conn
            && increased
            && best_score > local
            && self.cas_pin(None, Some(conn))
        {
            tracing::debug!(conn = %conn, score = %best_score, local = %local, "pinned new leader");
            self.request_extension(conn, best_score);
        }
    }

    /// `conn` delivered an extension batch.
    fn extension_received(&self, conn: ConnectionId, blocks: Vec<Block>) {
        if self.pinned() == Some(conn) {
            if blocks.is_empty() {
                // The pinned peer reports we are caught up: release the
                // pin, swallow the message.
                if self.cas_pin(Some(conn), None) {
                    tracing::debug!(conn = %conn, "peer is out of blocks, unpinned");
                }
            } else {
                tracing::debug!(conn = %conn, blocks = blocks.len(), "forwarding extension batch");
                self.forward_upstream(conn, Message::Extension { blocks });
            }
        } else {
            // Not the authoritative source; forward for observation,
            // downstream decides whether to discard.
            tracing::debug!(
                conn = %conn,
                blocks = blocks.len(),
                "extension batch from unpinned connection"
            );
            self.forward_upstream(conn, Message::Extension { blocks });
        }
    }

    // ── Outbound handler ───────────────────────────────────────────────

    /// The local score changed to `new_score`, observed on the outbound
    /// path toward `conn`.
    fn local_score_changed(&self, conn: ConnectionId, new_score: Score) {
        // The local chain advanced through this context: if this
        // connection was pinned, its download is no longer the reason we
        // progress.
        if self.cas_pin(Some(conn), None) {
            tracing::debug!(conn = %conn, "fork applied, unpinned");
        }

        *self.local_score.write() = new_score;
        tracing::debug!(conn = %conn, score = %new_score, "local score updated");

        self.outbound.send(conn, Message::LocalScore(new_score));

        if let Some((best, best_score)) = self.highest_scored() {
            if best == conn && best_score > new_score {
                // The local score just fell below this connection's: a
                // download from it is newly justified. Forced store, not
                // CAS — this is the one transition that overrides whatever
                // the slot held.
                self.pinned.store(conn.raw(), Ordering::Release);
                tracing::debug!(conn = %conn, score = %best_score, "repinned leader after local score change");
                self.request_extension(conn, best_score);
            }
        }
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Highest-scored live connection, ties broken by connection id.
    ///
    /// The result is a point-in-time scan; the table may change before the
    /// caller acts on it, which is why every action below goes through CAS.
    fn highest_scored(&self) -> Option<(ConnectionId, Score)> {
        self.scores
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .max_by_key(|&(conn, score)| (score, conn))
    }

    /// CAS the pin slot from `expected` to `next`. A miss means another
    /// context already changed the pin; the caller simply skips its action.
    fn cas_pin(&self, expected: Option<ConnectionId>, next: Option<ConnectionId>) -> bool {
        let expected = expected.map_or(UNPINNED, |c| c.raw());
        let next = next.map_or(UNPINNED, |c| c.raw());
        self.pinned
            .compare_exchange(expected, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Schedule removal of `conn`'s entry after the TTL, conditioned on
    /// the stored value still being `score`.
    ///
    /// The condition checks the value only, not which announcement set it:
    /// a peer re-announcing the identical score inside the window can have
    /// its fresh entry expired by the earlier timer. Stale timers against a
    /// changed value are harmless no-ops.
    fn arm_expiry(&self, conn: ConnectionId, score: Score) {
        let scores = Arc::clone(&self.scores);
        let ttl = self.score_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if scores.remove_if(&conn, |_, v| *v == score).is_some() {
                tracing::debug!(conn = %conn, score = %score, "score entry expired");
            }
        });
    }

    /// Ask `conn` for blocks extending the local chain.
    ///
    /// Tip signatures are pulled from the history component here, at send
    /// time — never cached.
    fn request_extension(&self, conn: ConnectionId, score: Score) {
        let signatures = self.history.last_signatures();
        tracing::debug!(
            conn = %conn,
            score = %score,
            tips = signatures.len(),
            "requesting chain extension"
        );
        self.outbound.send(conn, Message::GetExtension { signatures });
    }

    fn forward_upstream(&self, conn: ConnectionId, message: Message) {
        if self.upstream.send((conn, message)).is_err() {
            tracing::warn!(conn = %conn, "upstream receiver dropped, message discarded");
        }
    }

    // ── Introspection ──────────────────────────────────────────────────

    /// The connection currently authorized to stream an extension, if any.
    pub fn pinned(&self) -> Option<ConnectionId> {
        match self.pinned.load(Ordering::Acquire) {
            UNPINNED => None,
            raw => Some(ConnectionId::new(raw)),
        }
    }

    /// Last score the local node reported.
    pub fn local_score(&self) -> Score {
        *self.local_score.read()
    }

    /// The score currently tracked for `conn`, if any.
    pub fn score_of(&self, conn: ConnectionId) -> Option<Score> {
        self.scores.get(&conn).map(|entry| *entry.value())
    }

    /// Number of connections with a live score entry.
    pub fn tracked_connections(&self) -> usize {
        self.scores.len()
    }
}
