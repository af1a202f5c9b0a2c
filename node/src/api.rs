//! # REST API
//!
//! Builds the axum router that exposes the registry node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                          |
//! |--------|--------------------------|--------------------------------------|
//! | GET    | `/health`                | Liveness probe                       |
//! | GET    | `/status`                | Node status summary                  |
//! | POST   | `/challenge`             | Issue an ownership challenge         |
//! | POST   | `/stars`                 | Submit a signed star registration    |
//! | GET    | `/stars/:address`        | Stars owned by a wallet address      |
//! | GET    | `/blocks/height/:height` | Block by height                      |
//! | GET    | `/blocks/hash/:hash`     | Block by hex-encoded hash            |
//! | GET    | `/chain/validate`        | Full-chain audit sweep               |
//!
//! ## Status mapping
//!
//! 200 on success, 400 for malformed input (bad hex hash, freeform
//! challenge text), 401 for failed ownership proofs, 404 for missing
//! blocks, 500 for internal ledger faults.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sidereal_ledger::registry::{
    Block, Chain, ChainError, ChainFault, Star, StarRecord, VerificationError,
};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The single shared ledger instance.
    pub chain: Arc<Chain>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/challenge", post(challenge_handler))
        .route("/stars", post(submit_star_handler))
        .route("/stars/:address", get(stars_by_address_handler))
        .route("/blocks/height/:height", get(block_by_height_handler))
        .route("/blocks/hash/:hash", get(block_by_hash_handler))
        .route("/chain/validate", get(validate_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /challenge`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeRequest {
    /// Wallet address that intends to register a star.
    pub address: String,
}

/// Response payload for `POST /challenge`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// The address the challenge was issued for.
    pub address: String,
    /// The exact text the wallet must sign, timestamp included.
    pub message: String,
}

/// Request body for `POST /stars`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitStarRequest {
    /// Wallet address claiming the star.
    pub address: String,
    /// The challenge message previously issued for this address.
    pub message: String,
    /// Base64 compact signature over the challenge message.
    pub signature: String,
    /// The star being registered.
    pub star: Star,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Current chain height. -1 means the chain has no genesis yet.
    pub height: i64,
    /// Ownership-challenge freshness window in seconds.
    pub challenge_window_secs: u64,
    /// Faults found by the most recent post-append sweep.
    pub sweep_faults: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Wire rendering of a ledger block.
///
/// Hashes travel as hex strings. The body stays in its stored hex-of-JSON
/// form so clients see exactly the bytes that were hashed.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    /// Block height.
    pub height: u64,
    /// Hex-encoded block hash.
    pub hash: Option<String>,
    /// Hex-encoded hash of the predecessor. `null` for genesis.
    pub previous_hash: Option<String>,
    /// Unix timestamp (seconds) captured at append time.
    pub timestamp: i64,
    /// Hex-encoded JSON payload.
    pub body: String,
}

impl From<&Block> for BlockResponse {
    fn from(block: &Block) -> Self {
        Self {
            height: block.height(),
            hash: block.hash_hex(),
            previous_hash: block.previous_hash_hex(),
            timestamp: block.timestamp(),
            body: block.body().to_string(),
        }
    }
}

/// Response payload for `GET /chain/validate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// True when the sweep found no faults.
    pub valid: bool,
    /// Every fault found, in ascending height order.
    pub faults: Vec<ChainFault>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps a ledger error onto the HTTP status space.
///
/// Freeform challenge text is the client's formatting mistake (400). Every
/// other verification failure is a failed ownership proof (401). Missing
/// blocks are 404. Anything left means the node itself is in trouble (500).
fn error_status(err: &ChainError) -> StatusCode {
    match err {
        ChainError::Verification(VerificationError::MalformedChallenge) => StatusCode::BAD_REQUEST,
        ChainError::Verification(_) => StatusCode::UNAUTHORIZED,
        ChainError::NotFound(_) => StatusCode::NOT_FOUND,
        ChainError::Block(_) | ChainError::AppendInconsistency { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &ChainError) -> (StatusCode, Json<ErrorResponse>) {
    (
        error_status(err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Parses a 64-character hex string into a block hash.
fn parse_block_hash(s: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.). It
/// intentionally does not inspect the chain — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns a node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        height: state.chain.height().await,
        challenge_window_secs: state.chain.config().challenge_window.as_secs(),
        sweep_faults: state.chain.last_sweep_fault_count().await as u64,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /challenge` — issues the ownership message a wallet must sign.
///
/// Stateless by design: the timestamp embedded in the message is the only
/// thing checked later, so nothing is stored between this call and the
/// follow-up `POST /stars`.
async fn challenge_handler(
    State(state): State<AppState>,
    Json(req): Json<ChallengeRequest>,
) -> impl IntoResponse {
    let message = state.chain.request_ownership_message(&req.address);
    state.metrics.challenges_issued_total.inc();
    Json(ChallengeResponse {
        address: req.address,
        message,
    })
}

/// `POST /stars` — verifies the signed challenge and appends the star.
///
/// The whole verify-and-append path runs inside the ledger; this handler
/// only translates the outcome into HTTP and records metrics.
async fn submit_star_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitStarRequest>,
) -> impl IntoResponse {
    let started = Instant::now();

    match state
        .chain
        .submit_star(&req.address, &req.message, &req.signature, req.star)
        .await
    {
        Ok(block) => {
            state.metrics.stars_registered_total.inc();
            state.metrics.blocks_appended_total.inc();
            state.metrics.chain_height.set(block.height() as i64);
            state
                .metrics
                .sweep_faults
                .set(state.chain.last_sweep_fault_count().await as i64);
            state
                .metrics
                .submit_latency_seconds
                .observe(started.elapsed().as_secs_f64());
            (StatusCode::OK, Json(BlockResponse::from(&block))).into_response()
        }
        Err(err) => {
            if matches!(err, ChainError::Verification(_)) {
                state.metrics.verification_failures_total.inc();
            }
            let (status, body) = error_response(&err);
            (status, body).into_response()
        }
    }
}

/// `GET /stars/:address` — every star registered by the given wallet.
///
/// Returns an empty array for addresses that never registered anything.
/// Undecodable blocks are skipped (and logged) inside the ledger.
async fn stars_by_address_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let stars: Vec<StarRecord> = state.chain.stars_by_address(&address).await;
    Json(stars)
}

/// `GET /blocks/height/:height` — returns a block by its height.
async fn block_by_height_handler(
    Path(height): Path<u64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.chain.block_by_height(height).await {
        Ok(block) => (StatusCode::OK, Json(BlockResponse::from(&block))).into_response(),
        Err(err) => {
            let (status, body) = error_response(&err);
            (status, body).into_response()
        }
    }
}

/// `GET /blocks/hash/:hash` — returns a block by its hex-encoded hash.
///
/// The hash must be exactly 64 hex characters; anything else is rejected
/// with a 400 before the chain is consulted.
async fn block_by_hash_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let hash = match parse_block_hash(&hash) {
        Some(h) => h,
        None => {
            let err = ErrorResponse {
                error: "hash must be exactly 64 hex characters".into(),
            };
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    match state.chain.block_by_hash(hash).await {
        Ok(block) => (StatusCode::OK, Json(BlockResponse::from(&block))).into_response(),
        Err(err) => {
            let (status, body) = error_response(&err);
            (status, body).into_response()
        }
    }
}

/// `GET /chain/validate` — runs a full audit sweep and reports the faults.
async fn validate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let faults = state.chain.validate().await;
    Json(ValidateResponse {
        valid: faults.is_empty(),
        faults,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    use sidereal_ledger::crypto::wallet::{
        derive_address, generate_keypair, sign_message, AddressKind, SigningKey,
    };
    use sidereal_ledger::registry::challenge::compose_challenge;
    use sidereal_ledger::registry::ChainConfig;

    /// Creates a test AppState backed by a fresh chain with genesis committed.
    async fn test_state() -> AppState {
        let chain = Arc::new(Chain::new(ChainConfig::default()));
        chain.ensure_genesis().await.expect("genesis");

        AppState {
            version: "0.1.0-test".into(),
            chain,
            metrics: Arc::new(crate::metrics::NodeMetrics::new()),
        }
    }

    /// Generates a wallet and its legacy address.
    fn wallet() -> (SigningKey, String) {
        let (sk, vk) = generate_keypair();
        let address = derive_address(&vk, AddressKind::P2pkh);
        (sk, address)
    }

    fn star_json() -> serde_json::Value {
        serde_json::json!({
            "ra": "16h 29m 24s",
            "dec": "-26° 25' 55\"",
            "story": "test star",
        })
    }

    /// Sends a GET request and returns (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with JSON body and returns (status, body_bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Drives the full challenge/sign/submit handshake through the router.
    async fn register_via_api(
        router: &Router,
        sk: &SigningKey,
        address: &str,
    ) -> (StatusCode, Vec<u8>) {
        let (status, body) = post_json(
            router,
            "/challenge",
            serde_json::json!({ "address": address }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let challenge: ChallengeResponse = serde_json::from_slice(&body).unwrap();

        let signature = sign_message(&challenge.message, sk, AddressKind::P2pkh).unwrap();
        post_json(
            router,
            "/stars",
            serde_json::json!({
                "address": address,
                "message": challenge.message,
                "signature": signature,
                "star": star_json(),
            }),
        )
        .await
    }

    // -- 1. Health endpoint ---------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let state = test_state().await;
        let router = create_router(state);
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    // -- 2. Status reflects bootstrap state -----------------------------------

    #[tokio::test]
    async fn status_reports_bootstrap_state() {
        let state = test_state().await;
        let router = create_router(state);
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.version, "0.1.0-test");
        assert_eq!(resp.height, 0);
        assert_eq!(resp.challenge_window_secs, 300);
        assert_eq!(resp.sweep_faults, 0);
    }

    // -- 3. Challenge issuance ------------------------------------------------

    #[tokio::test]
    async fn challenge_issues_signable_message() {
        let state = test_state().await;
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);

        let (status, body) = post_json(
            &router,
            "/challenge",
            serde_json::json!({ "address": "1BoatSLRHtKNngkdXEeobR76b53LETtpyT" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let resp: ChallengeResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.address, "1BoatSLRHtKNngkdXEeobR76b53LETtpyT");
        assert!(resp
            .message
            .starts_with("1BoatSLRHtKNngkdXEeobR76b53LETtpyT:"));
        assert!(resp.message.ends_with(":starRegistry"));
        assert_eq!(metrics.challenges_issued_total.get(), 1);
    }

    // -- 4. Full registration handshake ---------------------------------------

    #[tokio::test]
    async fn submitted_star_lands_on_chain() {
        let state = test_state().await;
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);
        let (sk, address) = wallet();

        let (status, body) = register_via_api(&router, &sk, &address).await;
        assert_eq!(status, StatusCode::OK);

        let block: BlockResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(block.height, 1);
        assert_eq!(block.hash.as_ref().map(String::len), Some(64));

        // The new block points back at genesis.
        let (status, body) = get(&router, "/blocks/height/0").await;
        assert_eq!(status, StatusCode::OK);
        let genesis: BlockResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(block.previous_hash, genesis.hash);

        // The owner scan shows the star.
        let (status, body) = get(&router, &format!("/stars/{address}")).await;
        assert_eq!(status, StatusCode::OK);
        let stars: Vec<StarRecord> = serde_json::from_slice(&body).unwrap();
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].owner, address);
        assert_eq!(stars[0].star.story, "test star");

        assert_eq!(metrics.stars_registered_total.get(), 1);
        assert_eq!(metrics.chain_height.get(), 1);
        assert_eq!(metrics.verification_failures_total.get(), 0);
    }

    // -- 5. Stale challenge is unauthorized ------------------------------------

    #[tokio::test]
    async fn stale_challenge_is_unauthorized() {
        let state = test_state().await;
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);
        let (sk, address) = wallet();

        let stale = compose_challenge(&address, chrono::Utc::now().timestamp() - 3_600);
        let signature = sign_message(&stale, &sk, AddressKind::P2pkh).unwrap();

        let (status, body) = post_json(
            &router,
            "/stars",
            serde_json::json!({
                "address": address,
                "message": stale,
                "signature": signature,
                "star": star_json(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(!err.error.is_empty());
        assert_eq!(metrics.verification_failures_total.get(), 1);
        assert_eq!(metrics.stars_registered_total.get(), 0);
    }

    // -- 6. Foreign signature is unauthorized ----------------------------------

    #[tokio::test]
    async fn foreign_signature_is_unauthorized() {
        let state = test_state().await;
        let router = create_router(state);
        let (_, address) = wallet();
        let (intruder_sk, _) = wallet();

        let (_, body) = post_json(
            &router,
            "/challenge",
            serde_json::json!({ "address": address }),
        )
        .await;
        let challenge: ChallengeResponse = serde_json::from_slice(&body).unwrap();
        let forged = sign_message(&challenge.message, &intruder_sk, AddressKind::P2pkh).unwrap();

        let (status, _) = post_json(
            &router,
            "/stars",
            serde_json::json!({
                "address": address,
                "message": challenge.message,
                "signature": forged,
                "star": star_json(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // -- 7. Freeform challenge text is a 400 -----------------------------------

    #[tokio::test]
    async fn freeform_message_is_bad_request() {
        let state = test_state().await;
        let router = create_router(state);
        let (sk, address) = wallet();

        let message = "please register my star";
        let signature = sign_message(message, &sk, AddressKind::P2pkh).unwrap();

        let (status, _) = post_json(
            &router,
            "/stars",
            serde_json::json!({
                "address": address,
                "message": message,
                "signature": signature,
                "star": star_json(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // -- 8. Owner scan for strangers -------------------------------------------

    #[tokio::test]
    async fn owner_scan_is_empty_for_strangers() {
        let state = test_state().await;
        let router = create_router(state);

        let (status, body) = get(&router, "/stars/1NobodyEverUsedThisAddress").await;

        assert_eq!(status, StatusCode::OK);
        let stars: Vec<StarRecord> = serde_json::from_slice(&body).unwrap();
        assert!(stars.is_empty());
    }

    // -- 9. Missing height is a 404 --------------------------------------------

    #[tokio::test]
    async fn missing_height_returns_404() {
        let state = test_state().await;
        let router = create_router(state);

        let (status, body) = get(&router, "/blocks/height/7").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(err.error.contains("height 7"));
    }

    // -- 10. Malformed hash is a 400 -------------------------------------------

    #[tokio::test]
    async fn malformed_hash_returns_400() {
        let state = test_state().await;
        let router = create_router(state);

        // Too short, and not hex at all.
        for bad in ["zzzz", "deadbeef"] {
            let (status, body) = get(&router, &format!("/blocks/hash/{bad}")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
            assert!(err.error.contains("64 hex"));
        }
    }

    // -- 11. Unknown hash is a 404 ---------------------------------------------

    #[tokio::test]
    async fn unknown_hash_returns_404() {
        let state = test_state().await;
        let router = create_router(state);

        let phantom = "ab".repeat(32);
        let (status, _) = get(&router, &format!("/blocks/hash/{phantom}")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // -- 12. Height and hash lookups agree --------------------------------------

    #[tokio::test]
    async fn hash_lookup_round_trips_with_height() {
        let state = test_state().await;
        let router = create_router(state);
        let (sk, address) = wallet();

        let (status, body) = register_via_api(&router, &sk, &address).await;
        assert_eq!(status, StatusCode::OK);
        let appended: BlockResponse = serde_json::from_slice(&body).unwrap();
        let hash = appended.hash.clone().unwrap();

        let (status, body) = get(&router, &format!("/blocks/hash/{hash}")).await;
        assert_eq!(status, StatusCode::OK);
        let by_hash: BlockResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(by_hash.height, appended.height);
        assert_eq!(by_hash.body, appended.body);
    }

    // -- 13. Validation endpoint ------------------------------------------------

    #[tokio::test]
    async fn validate_reports_clean_chain() {
        let state = test_state().await;
        let router = create_router(state);
        let (sk, address) = wallet();

        let (status, _) = register_via_api(&router, &sk, &address).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(&router, "/chain/validate").await;

        assert_eq!(status, StatusCode::OK);
        let resp: ValidateResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.valid);
        assert!(resp.faults.is_empty());
    }
}
