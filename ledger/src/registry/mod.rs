//! # Registry Module
//!
//! The star registry itself: blocks, the chain that orders them, the
//! ownership challenges that gate writes, and the payload types stored in
//! block bodies.
//!
//! ## Architecture
//!
//! ```text
//! star.rs      — Star / StarRecord payload types
//! block.rs     — Block structure, body codec, digest, integrity check
//! challenge.rs — Challenge compose/parse, freshness window, ownership proof
//! chain.rs     — Append-only chain with serialized writes and validation
//! ```
//!
//! ## Registration Lifecycle
//!
//! 1. **Challenge** — [`Chain::request_ownership_message`] hands the caller
//!    a timestamped string bound to their address.
//! 2. **Sign** — the caller signs it in their own wallet; the key never
//!    touches this process.
//! 3. **Submit** — [`Chain::submit_star`] verifies freshness and signature,
//!    then appends a block holding `{owner, star}`.
//! 4. **Read** — lookups by height, hash, or owner; full-chain validation
//!    on demand.
//!
//! ## Design Decisions
//!
//! - Block bodies are hex-encoded JSON. Obscured from a casual `curl`, not
//!   encrypted — the chain's guarantees are about integrity, not secrecy.
//! - The digest preimage tags the previous-hash field with a presence byte,
//!   so a missing predecessor can never be confused with an all-zero one.
//! - Append is a single writer section; verification runs before the lock.
//!   One writer, many readers, no torn blocks.

pub mod block;
pub mod challenge;
pub mod chain;
pub mod star;

pub use block::{Block, BlockError, GENESIS_SENTINEL};
pub use chain::{BlockRef, Chain, ChainConfig, ChainError, ChainFault};
pub use challenge::{compose_challenge, VerificationError};
pub use star::{Star, StarRecord};
