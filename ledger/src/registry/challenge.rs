//! Ownership challenges: compose, parse, and verify.
//!
//! A registrant proves control of a wallet address in two round trips. The
//! registry first hands out a challenge string,
//!
//! ```text
//! <address>:<unix seconds>:starRegistry
//! ```
//!
//! the registrant signs it in their wallet, and the signed copy comes back
//! with the submission. Verification checks are ordered cheapest first
//! (string parsing before clock comparison before ECDSA recovery) so
//! invalid submissions waste minimal CPU.
//!
//! Only the middle field is ever interpreted — freshness needs the issue
//! timestamp. Everything else the signature covers verbatim, so a doctored
//! address or suffix simply fails signature verification.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::config::{CHALLENGE_SEPARATOR, CHALLENGE_SUFFIX};
use crate::crypto::wallet::{self, SignatureError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a star submission's ownership proof was refused.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The submitted message is not a `<address>:<timestamp>:starRegistry`
    /// challenge — the timestamp field is missing or unreadable.
    #[error("challenge is not of the form '<address>:<timestamp>:starRegistry'")]
    MalformedChallenge,

    /// The challenge was issued too long ago. The boundary is strict:
    /// `elapsed == window` is already expired.
    #[error("challenge expired: {elapsed_secs}s elapsed, window is {window_secs}s")]
    ChallengeExpired { elapsed_secs: i64, window_secs: i64 },

    /// The signature does not prove control of the claimed address.
    #[error("ownership proof rejected: {0}")]
    Signature(#[from] SignatureError),
}

// ---------------------------------------------------------------------------
// Challenge strings
// ---------------------------------------------------------------------------

/// Build the challenge string for an address at an issue time.
///
/// Pure formatting; the chain passes its current clock reading in. The
/// format is part of the public contract — deployed wallets sign exactly
/// this string.
pub fn compose_challenge(address: &str, issued_at: i64) -> String {
    format!(
        "{address}{sep}{issued_at}{sep}{CHALLENGE_SUFFIX}",
        sep = CHALLENGE_SEPARATOR
    )
}

/// Extract the issue timestamp (the second colon-delimited field) from a
/// challenge string.
///
/// # Errors
///
/// [`VerificationError::MalformedChallenge`] when the field is absent or
/// not an integer.
pub fn parse_challenge_timestamp(message: &str) -> Result<i64, VerificationError> {
    message
        .split(CHALLENGE_SEPARATOR)
        .nth(1)
        .and_then(|field| field.parse::<i64>().ok())
        .ok_or(VerificationError::MalformedChallenge)
}

/// Apply the freshness window to an issue timestamp.
///
/// Strict less-than: a challenge aged exactly `window` is rejected. Only
/// the upper bound is checked — a timestamp from the future yields a
/// negative elapsed time and passes, which is harmless because the
/// signature still has to cover the exact message text.
pub fn check_freshness(issued_at: i64, now: i64, window: Duration) -> Result<(), VerificationError> {
    let elapsed_secs = now - issued_at;
    let window_secs = window.as_secs() as i64;
    if elapsed_secs < window_secs {
        Ok(())
    } else {
        Err(VerificationError::ChallengeExpired {
            elapsed_secs,
            window_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify a signed challenge end to end.
///
/// The checks, in order:
///
/// 1. **Parse** — the challenge must carry a readable issue timestamp.
/// 2. **Freshness** — the response must arrive strictly inside the window.
/// 3. **Signature** — the signature must prove control of `address`.
///
/// # Errors
///
/// Returns the first failing check as a [`VerificationError`].
pub fn verify_ownership(
    address: &str,
    message: &str,
    signature: &str,
    window: Duration,
) -> Result<(), VerificationError> {
    // 1. Issue timestamp.
    let issued_at = parse_challenge_timestamp(message)?;

    // 2. Freshness window.
    check_freshness(issued_at, Utc::now().timestamp(), window)?;

    // 3. Wallet signature over the exact message text.
    wallet::verify_message(message, address, signature)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
