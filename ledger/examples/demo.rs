//! Interactive CLI demo of the full SIDEREAL registry lifecycle.
//!
//! Walks through wallet key generation, ledger bootstrap, ownership
//! challenges, star registration under all three address families, lookups,
//! chain validation, and a gallery of rejected submissions. The output uses
//! ANSI escape codes for colored, storytelling-style terminal rendering.
//!
//! Run with:
//!   cargo run --example demo --release

use std::time::Instant;

use chrono::Utc;

use sidereal_ledger::crypto::wallet::{
    derive_address, generate_keypair, sign_message, verify_message, AddressKind, SigningKey,
};
use sidereal_ledger::registry::challenge::compose_challenge;
use sidereal_ledger::registry::chain::{Chain, ChainConfig};
use sidereal_ledger::registry::star::Star;
use sidereal_ledger::registry::{BlockRef, ChainError, StarRecord};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";
const RED: &str = "\x1b[31m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    SIDEREAL  --  Star Registry Lifecycle Demo                      {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    Version 0.1.0  |  secp256k1 + SHA-256d + Base58/Bech32          {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!(
        "{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}"
    );
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!(
        "{CYAN}------------------------------------------------------------------------{RESET}"
    );
}

fn subsection(text: &str) {
    println!("{DIM}{CYAN}  >> {text}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn rejected(text: &str) {
    println!("{RED}  [REJECTED] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn address_row(name: &str, family: &str, addr: &str, color: &str) {
    println!("  {color}{BOLD}{name:<12}{RESET} {DIM}{family:<12}{RESET} {WHITE}{addr}{RESET}");
}

fn star_row(record: &StarRecord) {
    println!(
        "  {MAGENTA}*{RESET} {WHITE}RA {}{RESET}  {WHITE}DEC {}{RESET}  {DIM}\"{}\"{RESET}",
        record.star.ra, record.star.dec, record.star.story
    );
}

fn separator() {
    println!(
        "{DIM}{CYAN}  . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . . {RESET}"
    );
}

fn short_hash(hex: &str) -> String {
    format!("{}...{}", &hex[..12], &hex[hex.len() - 8..])
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run the full challenge / sign / submit handshake for one star.
async fn register_star(
    chain: &Chain,
    key: &SigningKey,
    address: &str,
    kind: AddressKind,
    star: Star,
) -> Result<u64, ChainError> {
    let message = chain.request_ownership_message(address);
    let signature = sign_message(&message, key, kind).map_err(|err| {
        ChainError::Verification(sidereal_ledger::registry::VerificationError::Signature(err))
    })?;
    let block = chain.submit_star(address, &message, &signature, star).await?;
    Ok(block.height())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let demo_start = Instant::now();

    banner();

    // -----------------------------------------------------------------------
    // Step 1: Wallet Key Generation
    // -----------------------------------------------------------------------

    section(1, "Wallet Key Generation & Address Derivation");
    subsection("Generating secp256k1 keypairs and deriving wallet addresses...");

    let t = Instant::now();
    let (alice_sk, alice_vk) = generate_keypair();
    let (bob_sk, bob_vk) = generate_keypair();
    let (observatory_sk, observatory_vk) = generate_keypair();
    timing("keygen x3", t.elapsed());

    // One key, three faces: every keypair can present itself under any of
    // the supported address families.
    let alice_addr = derive_address(&alice_vk, AddressKind::P2pkh);
    let bob_addr = derive_address(&bob_vk, AddressKind::P2wpkh);
    let observatory_addr = derive_address(&observatory_vk, AddressKind::P2shP2wpkh);

    println!();
    address_row("Alice", "P2PKH", &alice_addr, BLUE);
    address_row("Bob", "P2WPKH", &bob_addr, GREEN);
    address_row("Observatory", "P2SH-P2WPKH", &observatory_addr, MAGENTA);
    println!();

    subsection("Alice's single key under every family:");
    for kind in [AddressKind::P2pkh, AddressKind::P2shP2wpkh, AddressKind::P2wpkh] {
        println!("    {DIM}{:?}{RESET} {WHITE}{}{RESET}", kind, derive_address(&alice_vk, kind));
    }

    assert!(alice_addr.starts_with('1'));
    assert!(observatory_addr.starts_with('3'));
    assert!(bob_addr.starts_with("bc1q"));
    success("Legacy, nested-segwit, and native-segwit addresses derived");

    // -----------------------------------------------------------------------
    // Step 2: Ledger Bootstrap
    // -----------------------------------------------------------------------

    section(2, "Ledger Bootstrap");
    subsection("Creating the chain and committing the genesis block...");

    let t = Instant::now();
    let chain = Chain::new(ChainConfig::default());
    assert_eq!(chain.height().await, -1, "fresh chain starts at -1");
    chain.ensure_genesis().await.expect("genesis");
    timing("bootstrap", t.elapsed());

    let genesis = chain
        .block_by_height(0)
        .await
        .expect("genesis is retrievable");
    info("Chain height", &chain.height().await.to_string());
    info(
        "Genesis hash",
        &short_hash(&genesis.hash_hex().expect("genesis is sealed")),
    );
    info(
        "Challenge window",
        &format!("{}s", chain.config().challenge_window.as_secs()),
    );
    assert!(genesis.previous_hash().is_none());
    success("Genesis committed; the registry is open for business");

    // -----------------------------------------------------------------------
    // Step 3: Ownership Challenge
    // -----------------------------------------------------------------------

    section(3, "Ownership Challenge Handshake");
    subsection("Requesting a challenge for Alice and signing it with her wallet key...");

    let message = chain.request_ownership_message(&alice_addr);
    info("Challenge", &message);

    let t = Instant::now();
    let signature = sign_message(&message, &alice_sk, AddressKind::P2pkh).expect("signing");
    timing("recoverable ECDSA sign", t.elapsed());
    info("Signature (base64)", &format!("{}...", &signature[..32]));

    let t = Instant::now();
    verify_message(&message, &alice_addr, &signature).expect("self-check");
    timing("recover + address match", t.elapsed());
    success("Signature recovers to a key that derives Alice's address");

    // -----------------------------------------------------------------------
    // Step 4: Star Registration
    // -----------------------------------------------------------------------

    section(4, "Star Registration (all three address families)");

    let registrations: [(&str, &SigningKey, &str, AddressKind, Star); 4] = [
        (
            "Alice",
            &alice_sk,
            &alice_addr,
            AddressKind::P2pkh,
            Star::new("16h 29m 24s", "-26° 25' 55\"", "Antares, heart of the scorpion"),
        ),
        (
            "Alice",
            &alice_sk,
            &alice_addr,
            AddressKind::P2pkh,
            Star::new("18h 36m 56s", "+38° 47' 01\"", "Vega, the harp star"),
        ),
        (
            "Bob",
            &bob_sk,
            &bob_addr,
            AddressKind::P2wpkh,
            Star::new("05h 55m 10s", "+07° 24' 25\"", "Betelgeuse, before it goes"),
        ),
        (
            "Observatory",
            &observatory_sk,
            &observatory_addr,
            AddressKind::P2shP2wpkh,
            Star::new("02h 31m 49s", "+89° 15' 51\"", "Polaris, the anchor of the north"),
        ),
    ];

    for (name, key, addr, kind, star) in registrations {
        subsection(&format!("{name} registers \"{}\"...", star.story));
        let t = Instant::now();
        let height = register_star(&chain, key, addr, kind, star)
            .await
            .expect("registration");
        timing("challenge + sign + verify + append", t.elapsed());
        info("Landed at height", &height.to_string());
    }

    separator();
    info("Chain height", &chain.height().await.to_string());
    success("Four stars registered across P2PKH, P2WPKH, and P2SH-P2WPKH owners");

    // -----------------------------------------------------------------------
    // Step 5: Lookups
    // -----------------------------------------------------------------------

    section(5, "Block Lookups & Owner Queries");
    subsection("Cross-checking height and hash lookups...");

    let by_height = chain.block_by_height(1).await.expect("block 1 exists");
    let hash = by_height.hash().expect("appended blocks are sealed");
    let by_hash = chain.block_by_hash(hash).await.expect("hash lookup");
    assert_eq!(by_height, by_hash, "both lookups return the same block");

    let record: StarRecord = by_height.decode_payload().expect("star record");
    info("Block 1 owner", &record.owner);
    info("Block 1 star", &record.star.to_string());
    success("Height and hash lookups agree, payload decodes");

    subsection("Scanning the sky by owner...");
    println!();
    for (name, addr, expected) in [
        ("Alice", &alice_addr, 2usize),
        ("Bob", &bob_addr, 1),
        ("Observatory", &observatory_addr, 1),
    ] {
        let stars = chain.stars_by_address(addr).await;
        assert_eq!(stars.len(), expected, "{name} owns {expected} star(s)");
        println!("  {BOLD}{WHITE}{name}{RESET} {DIM}({} star(s)){RESET}", stars.len());
        for record in &stars {
            star_row(record);
        }
    }
    println!();
    success("Owner scans return exactly the stars each wallet registered");

    // -----------------------------------------------------------------------
    // Step 6: Chain Validation
    // -----------------------------------------------------------------------

    section(6, "Full-Chain Validation");
    subsection("Recomputing every digest and checking every link...");

    let t = Instant::now();
    let faults = chain.validate().await;
    timing("validation sweep", t.elapsed());

    assert!(faults.is_empty(), "untampered chain validates clean");
    info("Blocks checked", &(chain.height().await + 1).to_string());
    info("Faults found", "0");
    info(
        "Faults in last post-append sweep",
        &chain.last_sweep_fault_count().await.to_string(),
    );
    success("Every digest matches, every link holds");

    // -----------------------------------------------------------------------
    // Step 7: Rejection Gallery
    // -----------------------------------------------------------------------

    section(7, "Rejection Gallery");
    subsection("Every submission below must bounce without touching the chain...");

    let height_before = chain.height().await;
    let doomed = Star::new("00h 00m 00s", "+00° 00' 00\"", "should never land");

    // 7a. A challenge signed an hour too late.
    let stale = compose_challenge(&alice_addr, Utc::now().timestamp() - 3_600);
    let stale_sig = sign_message(&stale, &alice_sk, AddressKind::P2pkh).expect("signing");
    match chain
        .submit_star(&alice_addr, &stale, &stale_sig, doomed.clone())
        .await
    {
        Err(err) => rejected(&format!("expired challenge: {err}")),
        Ok(_) => unreachable!("stale challenge must not land"),
    }

    // 7b. Bob signs Alice's challenge.
    let fresh = chain.request_ownership_message(&alice_addr);
    let forged = sign_message(&fresh, &bob_sk, AddressKind::P2pkh).expect("signing");
    match chain
        .submit_star(&alice_addr, &fresh, &forged, doomed.clone())
        .await
    {
        Err(err) => rejected(&format!("foreign signature: {err}")),
        Ok(_) => unreachable!("forged signature must not land"),
    }

    // 7c. A lookup for a hash nobody has ever produced.
    match chain.block_by_hash([0xAB; 32]).await {
        Err(err @ ChainError::NotFound(BlockRef::Hash(_))) => {
            rejected(&format!("phantom lookup: {err}"))
        }
        other => unreachable!("expected a miss, got {other:?}"),
    }

    assert_eq!(chain.height().await, height_before, "rejections left no trace");
    success("All three attacks bounced; chain height unchanged");

    // -----------------------------------------------------------------------
    // Final Summary
    // -----------------------------------------------------------------------

    let total_elapsed = demo_start.elapsed();

    println!();
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}    DEMO COMPLETE -- Final Summary                                  {RESET}"
    );
    println!(
        "{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}"
    );
    println!();

    println!("  {BOLD}{WHITE}Registry Statistics:{RESET}");
    println!("  {DIM}----------------------------------------------{RESET}");
    info("Wallets created", "3 (Alice, Bob, Observatory)");
    info("Stars registered", "4 (Antares, Vega, Betelgeuse, Polaris)");
    info("Blocks on chain", "5 (genesis + 4 registrations)");
    info("Rejections demonstrated", "3 (stale, forged, phantom)");
    info("Signing algorithm", "secp256k1 recoverable ECDSA (k256 0.13)");
    info("Block digest", "SHA-256 over height|time|prev|body");
    info("Address families", "P2PKH, P2SH-P2WPKH, P2WPKH");
    info("Challenge format", "<address>:<unix-secs>:starRegistry");
    println!();

    println!(
        "  {ITALIC}{DIM}Every star above is reachable by owner scan, height, and hash.{RESET}"
    );
    println!();
    println!(
        "  {BOLD}{GREEN}Total demo time: {:.2}s{RESET}",
        total_elapsed.as_secs_f64()
    );
    println!();
}
