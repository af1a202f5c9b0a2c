//! # Registry Configuration & Constants
//!
//! Every magic number in SIDEREAL lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are wire-compatible with the wallets our users
//! already own, which means they are not ours to change. The ones that *are*
//! ours (ports, windows) get documented units so nobody has to guess.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Challenge Format
// ---------------------------------------------------------------------------

/// Fixed suffix of every ownership challenge. The full challenge reads
/// `<address>:<unix-seconds>:starRegistry`, and wallets sign it verbatim,
/// so this string is part of the public contract — treat it as frozen.
pub const CHALLENGE_SUFFIX: &str = "starRegistry";

/// Separator between the three challenge fields. Base58 and bech32 address
/// alphabets never contain a colon, so splitting on it is unambiguous.
pub const CHALLENGE_SEPARATOR: char = ':';

/// How long a signed challenge stays acceptable, measured in *seconds of
/// elapsed wall-clock time* between the timestamp embedded in the challenge
/// and the moment of submission. Strictly less-than: a submission at exactly
/// the window boundary is rejected.
// TODO: product still owes us a final answer on the submission window
// length; 5 minutes is the working default until that lands.
pub const DEFAULT_CHALLENGE_WINDOW: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// secp256k1 — not our favorite curve, but the one every wallet on the
/// planet already holds keys for. Ownership proofs only work if people can
/// sign with what they have.
pub const SIGNING_ALGORITHM: &str = "secp256k1";

/// Block digests come from SHA-256. 32 bytes, same as the double-SHA-256
/// used inside the wallet message scheme.
pub const DIGEST_LENGTH: usize = 32;

/// Recoverable compact signature length: 1 flag byte + 32-byte r + 32-byte s.
pub const COMPACT_SIGNATURE_LENGTH: usize = 65;

/// RIPEMD160(SHA256(pubkey)) output length — the 20-byte core of every
/// address form we accept.
pub const HASH160_LENGTH: usize = 20;

/// Base58check version byte for pay-to-pubkey-hash addresses ("1...").
pub const P2PKH_VERSION: u8 = 0x00;

/// Base58check version byte for pay-to-script-hash addresses ("3..."),
/// which is where wrapped-segwit signatures point.
pub const P2SH_VERSION: u8 = 0x05;

/// Bech32 human-readable prefixes for native segwit addresses.
pub const MAINNET_HRP: &str = "bc";
pub const TESTNET_HRP: &str = "tb";
pub const REGTEST_HRP: &str = "bcrt";

// ---------------------------------------------------------------------------
// Registry Version
// ---------------------------------------------------------------------------

/// The full version string, assembled at compile time so we don't allocate
/// for something this trivial at runtime.
pub const REGISTRY_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default REST API port. 8000 because the first in-house prototype served
/// there and every saved curl invocation in the team wiki still says so.
pub const DEFAULT_RPC_PORT: u16 = 8000;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 8001;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the bech32 prefix for a given network name.
/// Returns `None` for unrecognized networks — we don't guess.
pub fn hrp_for_network(network: &str) -> Option<&'static str> {
    match network {
        "mainnet" => Some(MAINNET_HRP),
        "testnet" => Some(TESTNET_HRP),
        "regtest" => Some(REGTEST_HRP),
        _ => None,
    }
}

/// Returns a friendly name for a base58check version byte, mainly for
/// logging. Unknown versions get a hex dump because we're helpful like that.
pub fn base58_version_name(version: u8) -> String {
    match version {
        P2PKH_VERSION => "p2pkh".to_string(),
        P2SH_VERSION => "p2sh".to_string(),
        other => format!("unknown(0x{:02X})", other),
    }
}
