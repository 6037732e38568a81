//! Block identifiers and the minimal extension-block record.

use crate::Score;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 64-byte block signature — identifies a block in the chain.
///
/// Extension requests carry the local chain's tip signatures so the peer
/// knows where to extend from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSignature(pub [u8; 64]);

impl BlockSignature {
    pub const ZERO: Self = Self([0u8; 64]);

    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl Serialize for BlockSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for BlockSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SigVisitor;

        impl<'de> serde::de::Visitor<'de> for SigVisitor {
            type Value = BlockSignature;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "64 bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                let arr: [u8; 64] = v
                    .try_into()
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(BlockSignature(arr))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut arr = [0u8; 64];
                for (i, byte) in arr.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(BlockSignature(arr))
            }
        }

        deserializer.deserialize_bytes(SigVisitor)
    }
}

impl fmt::Debug for BlockSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockSignature(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for BlockSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// One block of a chain extension.
///
/// The sync core never validates or applies blocks — it only routes them —
/// so this carries just enough for the applier: identity, linkage, and the
/// score the block contributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// This block's signature.
    pub signature: BlockSignature,
    /// Signature of the block this one extends.
    pub parent: BlockSignature,
    /// Chain-score contribution of this block.
    pub score_delta: Score,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(n: u8) -> BlockSignature {
        let mut bytes = [0u8; 64];
        bytes[0] = n;
        BlockSignature::new(bytes)
    }

    #[test]
    fn signature_bincode_roundtrip() {
        let original = sig(42);
        let bytes = bincode::serialize(&original).unwrap();
        let decoded: BlockSignature = bincode::deserialize(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn block_bincode_roundtrip() {
        let block = Block {
            signature: sig(1),
            parent: sig(2),
            score_delta: Score::from(100u64),
        };
        let bytes = bincode::serialize(&block).unwrap();
        let decoded: Block = bincode::deserialize(&bytes).unwrap();
        assert_eq!(block, decoded);
    }

    #[test]
    fn debug_is_abbreviated() {
        let s = format!("{:?}", sig(0xAB));
        assert!(s.starts_with("BlockSignature(ab"));
        assert!(s.len() < 30);
    }

    #[test]
    fn display_is_full_hex() {
        assert_eq!(sig(0).to_string().len(), 128);
    }
}
