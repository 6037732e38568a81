//! Cumulative chain score announced by peers.
//!
//! Scores are opaque to the sync core: it never computes them, it only
//! compares them. Higher is better. A peer's announced score may repeat or
//! decrease over time (the peer reorganised its chain), so no monotonicity
//! is assumed anywhere.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total accumulated chain weight a peer reports.
///
/// Internally a 256-bit unsigned integer — non-negative and totally ordered.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Score(U256);

impl Score {
    pub const ZERO: Self = Self(U256::zero());

    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl From<u64> for Score {
    fn from(raw: u64) -> Self {
        Self(U256::from(raw))
    }
}

impl From<u128> for Score {
    fn from(raw: u128) -> Self {
        Self(U256::from(raw))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score({})", self.0)
    }
}
