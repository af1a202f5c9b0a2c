//! # Cryptographic Primitives for SIDEREAL
//!
//! Everything security-related in the registry flows through here: the block
//! digests and the wallet-compatible ownership proofs.
//!
//! We deliberately chose boring, well-audited cryptography — specifically,
//! the exact constructions the wallet ecosystem already speaks:
//!
//! - **secp256k1** recoverable ECDSA for ownership signatures — not because
//!   we love the curve, but because our users' keys already live on it.
//! - **SHA-256 / double SHA-256** for block digests and the signed-message
//!   digest.
//! - **RIPEMD160** (inside hash160) for address derivation.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod hash;
pub mod wallet;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy. Life's too short for five levels of `use` statements.
pub use hash::{double_sha256, hash160, sha256, sha256_array};
pub use wallet::{
    derive_address, generate_keypair, magic_hash, sign_message, verify_message, AddressKind,
    SignatureError,
};
