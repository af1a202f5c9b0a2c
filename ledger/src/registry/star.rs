//! Payload types for star registrations.
//!
//! These are the application-level records the registry stores inside block
//! bodies. They are deliberately plain serde structs — the ledger treats
//! them as opaque data and never interprets a coordinate.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Star
// ---------------------------------------------------------------------------

/// An astronomical object as its registrant describes it.
///
/// Coordinates are free-form strings in whatever notation the registrant's
/// star atlas uses (`"16h 29m 1.0s"`, `"-26° 29' 24.9"`). The registry
/// records them verbatim; it is a ledger, not an ephemeris.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Right ascension, registrant notation.
    pub ra: String,
    /// Declination, registrant notation.
    pub dec: String,
    /// The registrant's story — why this star, in their own words.
    pub story: String,
}

impl Star {
    /// Creates a new star descriptor.
    pub fn new(ra: impl Into<String>, dec: impl Into<String>, story: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
            story: story.into(),
        }
    }
}

impl fmt::Display for Star {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA {} / DEC {}", self.ra, self.dec)
    }
}

// ---------------------------------------------------------------------------
// StarRecord
// ---------------------------------------------------------------------------

/// What actually lands in a block body: the star plus the wallet address
/// that proved ownership at submission time.
///
/// The JSON field names (`owner`, `star`) are part of the stored format —
/// every block body in every deployed chain uses them. Treat as frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    /// Wallet address of the registrant, exactly as submitted.
    pub owner: String,
    /// The registered star.
    pub star: Star,
}

impl StarRecord {
    /// Creates a record binding a star to its owner's address.
    pub fn new(owner: impl Into<String>, star: Star) -> Self {
        Self {
            owner: owner.into(),
            star,
        }
    }
}

impl fmt::Display for StarRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.owner, self.star)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
