//! # The Registry Chain
//!
//! An append-only, single-writer sequence of [`Block`]s. This is where the
//! registry's real invariants live: every block is linked to its
//! predecessor by hash, heights are dense from zero, and nothing is ever
//! mutated or removed after append.
//!
//! ## State Machine
//!
//! ```text
//! UNINITIALIZED ──ensure_genesis──▶ ACTIVE ──append──▶ ACTIVE ──▶ ...
//!   (height -1)                   (height 0)        (height n+1)
//! ```
//!
//! One transition in, then monotonic growth forever. There is no teardown;
//! the chain lives exactly as long as its process.
//!
//! ## Locking Discipline
//!
//! All mutable state sits behind one `tokio::sync::RwLock`. The whole
//! append sequence — snapshot height, link, seal digest, push, post-check —
//! runs inside a single writer section, so at most one append is in flight
//! and a block becomes visible only after it is fully linked and hashed.
//! Reads take the reader lock and may run concurrently; they observe a
//! consistent chain or wait, never a half-built block. Signature
//! verification happens *before* the writer lock is taken — it needs no
//! chain state, and ECDSA recovery under a writer lock would stall every
//! reader for no reason.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_CHALLENGE_WINDOW;
use crate::registry::block::{Block, BlockError};
use crate::registry::challenge::{self, VerificationError};
use crate::registry::star::{Star, StarRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunables for a [`Chain`] instance.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Freshness window for ownership challenges. Strict upper bound:
    /// a challenge aged exactly this long is already rejected.
    pub challenge_window: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            challenge_window: DEFAULT_CHALLENGE_WINDOW,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors and faults
// ---------------------------------------------------------------------------

/// How a caller identified the block it was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    /// Lookup by chain position.
    Height(u64),
    /// Lookup by sealed digest.
    Hash([u8; 32]),
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height(height) => write!(f, "height {height}"),
            Self::Hash(hash) => write!(f, "hash {}", hex::encode(hash)),
        }
    }
}

/// Failures of chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// No block matches the given reference.
    #[error("no block found at {0}")]
    NotFound(BlockRef),

    /// The ownership proof on a star submission was refused.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// A block-level failure (payload encoding, genesis access).
    #[error(transparent)]
    Block(#[from] BlockError),

    /// The post-append height check failed. This is an invariant violation,
    /// not a retryable condition — under the writer lock it should be
    /// unreachable.
    #[error("append left the chain inconsistent: chain height {height}, appended block height {block_height}")]
    AppendInconsistency { height: i64, block_height: u64 },
}

/// One finding from a full-chain validation sweep.
///
/// Faults never abort the sweep; they accumulate so a single pass reports
/// every damaged block. Serializable because the HTTP layer returns them
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainFault {
    /// The block's stored hash does not match its recomputed digest.
    Integrity { height: u64 },
    /// The block's previous-hash pointer does not match its predecessor.
    Linkage { height: u64 },
}

impl ChainFault {
    /// Height of the block the finding refers to.
    pub fn height(&self) -> u64 {
        match self {
            Self::Integrity { height } | Self::Linkage { height } => *height,
        }
    }
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrity { height } => write!(f, "integrity fault at height {height}"),
            Self::Linkage { height } => write!(f, "linkage fault at height {height}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Interior state, guarded by the chain's lock.
struct ChainState {
    /// Insertion order is height order; never reordered, never truncated.
    blocks: Vec<Block>,
    /// Cached `blocks.len() - 1`; -1 while the chain is empty.
    height: i64,
    /// Finding count of the most recent post-append sweep.
    sweep_faults: usize,
}

/// The registry ledger. One instance per process, explicitly constructed
/// and shared by `Arc` — there is no hidden global.
///
/// # Example
///
/// ```
/// use sidereal_ledger::registry::chain::{Chain, ChainConfig};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let chain = Chain::new(ChainConfig::default());
/// chain.ensure_genesis().await.unwrap();
/// assert_eq!(chain.height().await, 0);
/// # });
/// ```
pub struct Chain {
    state: RwLock<ChainState>,
    config: ChainConfig,
}

impl Chain {
    /// Create an empty, uninitialized chain.
    ///
    /// Call [`Chain::ensure_genesis`] before serving traffic; every other
    /// operation assumes the genesis block may or may not exist yet and
    /// behaves accordingly.
    pub fn new(config: ChainConfig) -> Self {
        Self {
            state: RwLock::new(ChainState {
                blocks: Vec::new(),
                height: -1,
                sweep_faults: 0,
            }),
            config,
        }
    }

    /// The configuration this chain was built with.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Create the genesis block if the chain is empty. Idempotent; the
    /// check-and-append runs under the writer lock, so two concurrent
    /// callers cannot both create genesis.
    pub async fn ensure_genesis(&self) -> Result<(), ChainError> {
        let mut state = self.state.write().await;
        if state.height >= 0 {
            return Ok(());
        }
        let genesis = Self::append_and_sweep_locked(&mut state, Block::genesis())?;
        info!(
            hash = genesis.hash_hex().unwrap_or_default(),
            "genesis block created"
        );
        Ok(())
    }

    /// Current chain height: -1 when empty, 0 after genesis, and so on.
    pub async fn height(&self) -> i64 {
        self.state.read().await.height
    }

    /// Append a block to the chain.
    ///
    /// Assigns the append-time fields (height, timestamp, previous-hash
    /// link), seals the digest, and publishes the block — all inside one
    /// writer section. Returns the fully linked block.
    ///
    /// After a successful publish the chain re-validates itself and logs
    /// any findings at warn level; the sweep never fails the append.
    pub async fn append(&self, block: Block) -> Result<Block, ChainError> {
        let mut state = self.state.write().await;
        Self::append_and_sweep_locked(&mut state, block)
    }

    /// Build the ownership challenge for an address at the current time:
    /// `"<address>:<unix seconds>:starRegistry"`. Pure; touches no chain
    /// state.
    pub fn request_ownership_message(&self, address: &str) -> String {
        challenge::compose_challenge(address, Utc::now().timestamp())
    }

    /// Register a star: verify the signed challenge, then append a block
    /// holding `{owner, star}`.
    ///
    /// Verification runs before the writer lock is taken. On any
    /// verification failure nothing is appended and the chain is untouched.
    pub async fn submit_star(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        star: Star,
    ) -> Result<Block, ChainError> {
        if let Err(err) =
            challenge::verify_ownership(address, message, signature, self.config.challenge_window)
        {
            debug!(owner = address, error = %err, "ownership verification rejected");
            return Err(err.into());
        }

        let record = StarRecord::new(address, star);
        let block = Block::create(&record)?;

        let mut state = self.state.write().await;
        let appended = Self::append_and_sweep_locked(&mut state, block)?;
        debug!(
            owner = address,
            height = appended.height(),
            "star registered"
        );
        Ok(appended)
    }

    /// Find the unique block with the given sealed digest (linear scan).
    pub async fn block_by_hash(&self, hash: [u8; 32]) -> Result<Block, ChainError> {
        let state = self.state.read().await;
        state
            .blocks
            .iter()
            .find(|block| block.hash == Some(hash))
            .cloned()
            .ok_or(ChainError::NotFound(BlockRef::Hash(hash)))
    }

    /// Return the block at the given height.
    pub async fn block_by_height(&self, height: u64) -> Result<Block, ChainError> {
        let state = self.state.read().await;
        state
            .blocks
            .get(height as usize)
            .cloned()
            .ok_or(ChainError::NotFound(BlockRef::Height(height)))
    }

    /// Collect every star owned by `address`, in chain order.
    ///
    /// The genesis block is excluded. A block whose body fails to decode is
    /// skipped with a warning — one corrupt block must not take down the
    /// whole scan.
    pub async fn stars_by_address(&self, address: &str) -> Vec<StarRecord> {
        let state = self.state.read().await;
        let mut stars = Vec::new();
        for block in state.blocks.iter().filter(|block| block.height > 0) {
            match block.decode_payload::<StarRecord>() {
                Ok(record) if record.owner == address => stars.push(record),
                Ok(_) => {}
                Err(err) => warn!(
                    height = block.height,
                    error = %err,
                    "skipping undecodable block body in owner scan"
                ),
            }
        }
        stars
    }

    /// Re-validate the entire chain and return every finding.
    ///
    /// An empty list means the chain is fully consistent. The sweep always
    /// completes — corrupt blocks produce findings, not failures. Full
    /// O(n) pass; invoked on demand, not before every read.
    pub async fn validate(&self) -> Vec<ChainFault> {
        let state = self.state.read().await;
        Self::validate_locked(&state.blocks)
    }

    /// Finding count of the most recent post-append sweep. Cheap to read;
    /// the shell polls it for its gauge after submissions.
    pub async fn last_sweep_fault_count(&self) -> usize {
        self.state.read().await.sweep_faults
    }

    // -- locked internals ---------------------------------------------------

    /// The append algorithm. Caller holds the writer lock.
    fn append_locked(state: &mut ChainState, mut block: Block) -> Result<Block, ChainError> {
        // 1. Snapshot the tip.
        let height = state.height;
        let previous_hash = if height >= 0 {
            state.blocks[height as usize].hash
        } else {
            None
        };

        // 2. Link, then 3. seal. Order matters: the digest covers the
        //    linkage fields.
        let new_height = (height + 1) as u64;
        block.assign_linkage(new_height, Utc::now().timestamp(), previous_hash);
        let digest = block.digest();
        block.assign_hash(digest);

        // 4. Publish.
        state.blocks.push(block.clone());
        state.height = height + 1;

        // 5. Post-condition: the chain height must now equal the block's.
        if state.height != new_height as i64 {
            return Err(ChainError::AppendInconsistency {
                height: state.height,
                block_height: new_height,
            });
        }

        debug!(
            height = new_height,
            hash = block.hash_hex().unwrap_or_default(),
            "block appended"
        );
        Ok(block)
    }

    /// Append plus the post-append validation sweep.
    fn append_and_sweep_locked(state: &mut ChainState, block: Block) -> Result<Block, ChainError> {
        let appended = Self::append_locked(state, block)?;

        let faults = Self::validate_locked(&state.blocks);
        state.sweep_faults = faults.len();
        for fault in &faults {
            warn!(%fault, "post-append sweep finding");
        }

        Ok(appended)
    }

    /// The validation pass over a block sequence.
    fn validate_locked(blocks: &[Block]) -> Vec<ChainFault> {
        let mut faults = Vec::new();
        let mut expected_previous: Option<[u8; 32]> = None;

        for block in blocks {
            if !block.check_integrity() {
                faults.push(ChainFault::Integrity {
                    height: block.height,
                });
            }
            if block.previous_hash != expected_previous {
                faults.push(ChainFault::Linkage {
                    height: block.height,
                });
            }
            // The tracker advances on every block, fault or not, so one bad
            // link is reported once instead of cascading down the chain.
            expected_previous = block.hash;
        }

        faults
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
