//! Opaque peer-connection handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to one peer link, assigned by the transport layer.
///
/// Comparable by identity only — the sync core never inspects what a
/// connection points at. Id `0` is reserved (the transport never assigns
/// it), which lets the pinned-connection slot encode "unpinned" as a plain
/// zero word.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        debug_assert!(raw != 0, "connection id 0 is reserved");
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_comparison() {
        assert_eq!(ConnectionId::new(1), ConnectionId::new(1));
        assert_ne!(ConnectionId::new(1), ConnectionId::new(2));
    }

    #[test]
    fn display_form() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }
}
