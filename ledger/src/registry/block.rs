//! # Block Structure
//!
//! A block is the atomic unit of the registry. Each block carries one
//! encoded payload, a link to the previous block (forming the chain), and
//! a digest proving neither has been touched since append.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Block                                                   │
//! │  ├── hash: Option<[u8; 32]>   (SHA-256, set at append)   │
//! │  ├── height: u64              (0 = genesis)              │
//! │  ├── body: String             (hex of payload JSON)      │
//! │  ├── timestamp: i64           (epoch seconds, at append) │
//! │  └── previous_hash: Option<[u8; 32]>  (None at genesis)  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The digest covers `height || timestamp || previous_hash || body`, with
//! the block's own `hash` excluded from the preimage. The previous-hash
//! field enters with an explicit presence tag, so "no predecessor" can
//! never collide with "predecessor whose hash is all zeroes".
//!
//! ## Lifecycle
//!
//! [`Block::create`] produces an unlinked block: payload encoded, every
//! append-time field still a placeholder. The chain's append operation —
//! and nothing else — assigns height, timestamp, and linkage, then seals
//! the digest. After that the block never changes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::crypto::hash::sha256_array;

/// Payload of the genesis block. The registry's birth certificate: it is
/// written once at chain creation and refused by [`Block::decode_payload`]
/// forever after, so nothing downstream ever depends on its content.
pub const GENESIS_SENTINEL: &str = "SIDEREAL/2026: per aspera ad astra";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures at the single-block level.
#[derive(Debug, Error)]
pub enum BlockError {
    /// The genesis payload is a sentinel; decoding it is a capability
    /// violation, not a data error.
    #[error("the genesis block carries a sentinel payload, not application data")]
    GenesisAccess,

    /// The payload could not be serialized to JSON.
    #[error("payload does not encode to JSON: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored body is not valid hex. Only reachable on a tampered or
    /// hand-built block; append never stores one.
    #[error("block body is not valid hex: {0}")]
    BodyNotHex(#[from] hex::FromHexError),

    /// The body decoded to bytes, but those bytes are not the requested
    /// payload type.
    #[error("block body does not decode to the requested payload: {0}")]
    Decode(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One record in the registry chain.
///
/// Fields are crate-private: the only writers are [`Block::create`] and the
/// chain append path, and the only mutation a block ever sees is the
/// one-time assignment of its append fields. Readers go through the
/// accessor methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// SHA-256 digest of the other four fields. `None` until appended.
    pub(crate) hash: Option<[u8; 32]>,
    /// Position in the chain; 0 is reserved for genesis.
    pub(crate) height: u64,
    /// Payload JSON, hex-encoded. Obscured from casual inspection, not
    /// encrypted.
    pub(crate) body: String,
    /// Unix timestamp in seconds, assigned at append time.
    pub(crate) timestamp: i64,
    /// Digest of the preceding block; `None` only at genesis.
    pub(crate) previous_hash: Option<[u8; 32]>,
}

impl Block {
    /// Encode `payload` into a fresh, unlinked block.
    ///
    /// Height, timestamp, linkage, and hash are placeholders until the
    /// chain appends the block.
    ///
    /// # Example
    ///
    /// ```
    /// use sidereal_ledger::registry::block::Block;
    /// use sidereal_ledger::registry::star::{Star, StarRecord};
    ///
    /// let record = StarRecord::new("1Address", Star::new("16h", "-26°", "mine"));
    /// let block = Block::create(&record).unwrap();
    /// assert!(block.hash().is_none());
    /// assert_eq!(block.height(), 0);
    /// ```
    pub fn create<T: Serialize>(payload: &T) -> Result<Self, BlockError> {
        let json = serde_json::to_vec(payload).map_err(BlockError::Encode)?;
        Ok(Self {
            hash: None,
            height: 0,
            body: hex::encode(json),
            timestamp: 0,
            previous_hash: None,
        })
    }

    /// Construct the unlinked genesis block with the sentinel payload.
    pub(crate) fn genesis() -> Self {
        Self::create(&serde_json::json!({ "data": GENESIS_SENTINEL }))
            .expect("static genesis payload always encodes")
    }

    /// Recompute the digest and compare it to the stored hash.
    ///
    /// `true` means untampered. A block that has never been appended has
    /// no hash and is reported untrusted.
    pub fn check_integrity(&self) -> bool {
        match self.hash {
            Some(stored) => stored == self.digest(),
            None => false,
        }
    }

    /// Decode the body back into its structured payload.
    ///
    /// # Errors
    ///
    /// [`BlockError::GenesisAccess`] at height 0 — the genesis sentinel is
    /// not application data, and an unappended block (also height 0) has
    /// nothing meaningful to read yet. [`BlockError::BodyNotHex`] /
    /// [`BlockError::Decode`] when the body has been corrupted out from
    /// under the hash.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, BlockError> {
        if self.height == 0 {
            return Err(BlockError::GenesisAccess);
        }
        let raw = hex::decode(&self.body)?;
        serde_json::from_slice(&raw).map_err(BlockError::Decode)
    }

    /// Assign the append-time fields. Called exactly once, by the chain's
    /// append operation, before the digest is sealed.
    pub(crate) fn assign_linkage(
        &mut self,
        height: u64,
        timestamp: i64,
        previous_hash: Option<[u8; 32]>,
    ) {
        debug_assert!(self.hash.is_none(), "linkage assigned after hash was sealed");
        self.height = height;
        self.timestamp = timestamp;
        self.previous_hash = previous_hash;
    }

    /// Seal the digest. Called exactly once, immediately after
    /// [`Block::assign_linkage`].
    pub(crate) fn assign_hash(&mut self, hash: [u8; 32]) {
        debug_assert!(self.hash.is_none(), "hash sealed twice");
        self.hash = Some(hash);
    }

    /// SHA-256 over the block's fields with `hash` treated as absent.
    ///
    /// Deterministic by construction: fixed-width little-endian integers,
    /// a one-byte presence tag in front of the optional predecessor
    /// digest, then the body bytes.
    pub(crate) fn digest(&self) -> [u8; 32] {
        let mut preimage = Vec::with_capacity(64 + self.body.len());
        preimage.extend_from_slice(&self.height.to_le_bytes());
        preimage.extend_from_slice(&self.timestamp.to_le_bytes());
        match &self.previous_hash {
            Some(prev) => {
                preimage.push(1);
                preimage.extend_from_slice(prev);
            }
            None => preimage.push(0),
        }
        preimage.extend_from_slice(self.body.as_bytes());
        sha256_array(&preimage)
    }

    // -- accessors ----------------------------------------------------------

    /// The sealed digest, or `None` before append.
    pub fn hash(&self) -> Option<[u8; 32]> {
        self.hash
    }

    /// The sealed digest as a hex string, or `None` before append.
    pub fn hash_hex(&self) -> Option<String> {
        self.hash.map(hex::encode)
    }

    /// Chain position. Only meaningful after append.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Hex-encoded payload JSON.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Append timestamp, Unix seconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Digest of the preceding block; `None` at genesis (and before append).
    pub fn previous_hash(&self) -> Option<[u8; 32]> {
        self.previous_hash
    }

    /// `previous_hash` as a hex string.
    pub fn previous_hash_hex(&self) -> Option<String> {
        self.previous_hash.map(hex::encode)
    }

    /// Whether this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::star::{Star, StarRecord};

    fn test_record() -> StarRecord {
        StarRecord::new(
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH",
            Star::new("16h 29m 1.0s", "-26° 29' 24.9", "Antares"),
        )
    }

    /// Walk a block through the append-time assignments the chain performs.
    fn link(mut block: Block, height: u64, previous_hash: Option<[u8; 32]>) -> Block {
        block.assign_linkage(height, 1_700_000_000, previous_hash);
        let digest = block.digest();
        block.assign_hash(digest);
        block
    }

    #[test]
    fn create_leaves_append_fields_blank() {
        let block = Block::create(&test_record()).unwrap();
        assert!(block.hash.is_none());
        assert!(block.previous_hash.is_none());
        assert_eq!(block.height, 0);
        assert_eq!(block.timestamp, 0);
        assert!(!block.body.is_empty());
    }

    #[test]
    fn body_is_hex_of_payload_json() {
        let record = test_record();
        let block = Block::create(&record).unwrap();
        let raw = hex::decode(&block.body).unwrap();
        let decoded: StarRecord = serde_json::from_slice(&raw).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn unappended_block_is_untrusted() {
        let block = Block::create(&test_record()).unwrap();
        assert!(!block.check_integrity());
    }

    #[test]
    fn linked_block_passes_integrity() {
        let block = link(Block::create(&test_record()).unwrap(), 1, Some([7u8; 32]));
        assert!(block.check_integrity());
    }

    #[test]
    fn digest_is_deterministic() {
        let block = link(Block::create(&test_record()).unwrap(), 1, Some([7u8; 32]));
        assert_eq!(block.digest(), block.digest());
    }

    #[test]
    fn tampered_body_fails_integrity() {
        let mut block = link(Block::create(&test_record()).unwrap(), 1, Some([7u8; 32]));
        block.body = hex::encode(br#"{"owner":"1Thief","star":{}}"#);
        assert!(!block.check_integrity());
    }

    #[test]
    fn tampered_timestamp_fails_integrity() {
        let mut block = link(Block::create(&test_record()).unwrap(), 1, Some([7u8; 32]));
        block.timestamp += 1;
        assert!(!block.check_integrity());
    }

    #[test]
    fn tampered_hash_fails_integrity() {
        let mut block = link(Block::create(&test_record()).unwrap(), 1, Some([7u8; 32]));
        if let Some(hash) = block.hash.as_mut() {
            hash[0] ^= 0xff;
        }
        assert!(!block.check_integrity());
    }

    #[test]
    fn absent_predecessor_differs_from_zero_predecessor() {
        // The presence tag keeps "no predecessor" and "all-zero predecessor"
        // apart in the preimage.
        let mut a = Block::create(&test_record()).unwrap();
        let mut b = a.clone();
        a.assign_linkage(1, 1_700_000_000, None);
        b.assign_linkage(1, 1_700_000_000, Some([0u8; 32]));
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn decode_payload_roundtrip() {
        let record = test_record();
        let block = link(Block::create(&record).unwrap(), 1, Some([7u8; 32]));
        let decoded: StarRecord = block.decode_payload().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn genesis_payload_is_sealed_off() {
        let genesis = link(Block::genesis(), 0, None);
        match genesis.decode_payload::<StarRecord>() {
            Err(BlockError::GenesisAccess) => {}
            other => panic!("expected GenesisAccess, got {other:?}"),
        }
    }

    #[test]
    fn unappended_block_refuses_decode() {
        // Height 0 before append means "not yet part of a chain", which is
        // just as unreadable as the genesis sentinel.
        let block = Block::create(&test_record()).unwrap();
        match block.decode_payload::<StarRecord>() {
            Err(BlockError::GenesisAccess) => {}
            other => panic!("expected GenesisAccess, got {other:?}"),
        }
    }

    #[test]
    fn corrupted_body_reports_bad_hex() {
        let mut block = link(Block::create(&test_record()).unwrap(), 1, Some([7u8; 32]));
        block.body = "not-hex-at-all".to_string();
        match block.decode_payload::<StarRecord>() {
            Err(BlockError::BodyNotHex(_)) => {}
            other => panic!("expected BodyNotHex, got {other:?}"),
        }
    }

    #[test]
    fn wrong_payload_type_reports_decode() {
        let genesis_shaped = serde_json::json!({ "data": "not a star record" });
        let block = link(Block::create(&genesis_shaped).unwrap(), 1, Some([7u8; 32]));
        match block.decode_payload::<StarRecord>() {
            Err(BlockError::Decode(_)) => {}
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn genesis_sentinel_is_embedded() {
        let genesis = Block::genesis();
        let raw = hex::decode(&genesis.body).unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.contains(GENESIS_SENTINEL));
    }
}
