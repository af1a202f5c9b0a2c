//! # Digest Primitives
//!
//! Cryptographic hash functions used throughout SIDEREAL. We support exactly
//! the functions the wallet ecosystem forces on us and refuse to support more
//! without a very good reason:
//!
//! - **SHA-256** — block digests, and the inner/outer halves of the
//!   double-hash used by the signed-message scheme.
//! - **double SHA-256** — `SHA-256(SHA-256(x))`, the digest wallets actually
//!   sign. The "we chose SHA-256 in 2009 and now we're stuck with it"
//!   ecosystem runs on this construction, so we do too.
//! - **hash160** — `RIPEMD160(SHA-256(x))`, the 20-byte public-key hash at
//!   the core of every address form we accept.
//!
//! There is no in-house hash anywhere in this crate. Interoperability with
//! keys our users already hold is the whole product; inventing digests would
//! defeat it.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. The `Vec` form exists because
/// most call sites feed the digest straight back into something that takes
/// `&[u8]` — another hash round, hex encoding. Callers that keep the
/// digest around use [`sha256_array`]; the allocation here is lost in the
/// noise next to the compression function.
///
/// # Example
///
/// ```
/// use sidereal_ledger::crypto::sha256;
///
/// let hash = sha256(b"SIDEREAL registry");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// SHA-256 returning a fixed-size array.
///
/// Block digests use this variant so the array type flows into
/// `Block.hash` without a fallible conversion.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// This is the digest wallet message signing operates on. The double-hash
/// provides protection against length extension attacks (which SHA-256 alone
/// is vulnerable to, though in practice this matters less than people think).
/// Returned as a fixed array because every caller feeds it straight into
/// ECDSA as a prehash.
///
/// # Example
///
/// ```
/// use sidereal_ledger::crypto::double_sha256;
///
/// let digest = double_sha256(b"raw message bytes");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256_array(&sha256(data))
}

/// Compute hash160: `RIPEMD160(SHA-256(data))`.
///
/// This is how a secp256k1 public key becomes the 20-byte payload of a
/// pay-to-pubkey-hash address, and (applied twice, with a witness script in
/// between) of the wrapped-segwit form. The SHA-256 first pass gives full
/// 256-bit mixing; RIPEMD160 then compresses to the 20 bytes the address
/// formats were standardized around.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = sha256(data);
    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha);
    let result = ripemd.finalize();
    let mut output = [0u8; 20];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty_vector() {
        // The empty-input digest, as published in every SHA-256 reference.
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_array_and_vec_forms_agree() {
        let data = b"per aspera ad astra";
        assert_eq!(sha256(data), sha256_array(data).to_vec());
    }

    #[test]
    fn test_double_sha256_is_two_rounds() {
        let first = sha256(b"sidereal");
        let double = double_sha256(b"sidereal");
        assert_eq!(double, sha256_array(&first));
        assert_ne!(double.as_slice(), first.as_slice());
    }

    #[test]
    fn test_double_sha256_known_vector() {
        // hash256("hello") — cross-checked against the reference tooling
        // the wallet ecosystem ships.
        let digest = double_sha256(b"hello");
        assert_eq!(
            hex::encode(digest),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_hash160_known_vector() {
        // hash160 of the generator-point compressed pubkey. Any tool that
        // derives the address for secret key 1 agrees on this value.
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        let h = hash160(&pubkey);
        assert_eq!(
            hex::encode(h),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_hash160_deterministic() {
        let a = hash160(b"same input");
        let b = hash160(b"same input");
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn test_hash160_differs_from_truncated_sha256() {
        // RIPEMD160 over SHA-256, not SHA-256 cut to 20 bytes. Easy mistake,
        // produces addresses nobody can spend from.
        let data = b"pubkey bytes";
        let h160 = hash160(data);
        let sha = sha256_array(data);
        assert_ne!(&h160[..], &sha[..20]);
    }
}
