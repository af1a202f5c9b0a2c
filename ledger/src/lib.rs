// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SIDEREAL — Core Ledger Library
//!
//! SIDEREAL is a private, wallet-authenticated star registry: an
//! append-only, hash-linked ledger where each block records one star and
//! the address that proved it owns the claim. It is a blockchain in the
//! structural sense — linked digests, tamper evidence, a genesis block —
//! without the parts nobody asked for here: no consensus, no peers, no
//! token.
//!
//! ## Architecture
//!
//! Three modules, in dependency order:
//!
//! - **config** — Named constants and the tunables everything else reads.
//! - **crypto** — Digests and wallet-compatible ownership proofs. The only
//!   module allowed to spell "secp256k1".
//! - **registry** — Blocks, the chain, challenges, and star payloads. The
//!   part with actual invariants.
//!
//! ## Design Philosophy
//!
//! 1. The chain is the source of truth; everything else is a view of it.
//! 2. One writer at a time. Always. The lock is not optional.
//! 3. Verification before mutation — a bad signature never touches state.
//! 4. Corruption is detected loudly and reported precisely, never patched
//!    over.
//!
//! ## Quick Tour
//!
//! ```
//! use sidereal_ledger::crypto::wallet::{
//!     derive_address, generate_keypair, sign_message, AddressKind,
//! };
//! use sidereal_ledger::registry::chain::{Chain, ChainConfig};
//! use sidereal_ledger::registry::star::Star;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let chain = Chain::new(ChainConfig::default());
//! chain.ensure_genesis().await.unwrap();
//!
//! // The registrant's side: a wallet key and its address.
//! let (sk, vk) = generate_keypair();
//! let address = derive_address(&vk, AddressKind::P2pkh);
//!
//! // Challenge, sign, submit.
//! let message = chain.request_ownership_message(&address);
//! let signature = sign_message(&message, &sk, AddressKind::P2pkh).unwrap();
//! let star = Star::new("16h 29m 1.0s", "-26° 29' 24.9", "Antares");
//! let block = chain.submit_star(&address, &message, &signature, star).await.unwrap();
//!
//! assert_eq!(block.height(), 1);
//! assert!(chain.validate().await.is_empty());
//! # });
//! ```

pub mod config;
pub mod crypto;
pub mod registry;
