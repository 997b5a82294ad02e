//! drand-backed randomness: an HTTP client for a drand relay and a request
//! queue that turns beacons into jury-selection words.
//!
//! A request is only ever answered from a beacon round that was not yet
//! published when the request was made, so nobody (including the
//! challenger) can know the words when the dispute is opened.

use crate::{RandomWords, RandomnessError, RandomnessService};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use verity_types::{Clock, RequestId, SystemClock, Timestamp};

/// Default drand mainnet relay URL.
const DRAND_MAINNET_URL: &str = "https://api.drand.sh";

/// Chain hash of the drand quicknet network.
const QUICKNET_CHAIN_HASH: &str =
    "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971";

/// Domain separation tag for quicknet BLS signatures (G1, SHA-256 hash-to-curve).
const QUICKNET_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Distributed public key of quicknet (compressed G2 point).
const QUICKNET_PUBKEY_HEX: &str = concat!(
    "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c",
    "8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb",
    "5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a",
);

/// Quicknet publishes a round every 3 seconds starting at this time.
const QUICKNET_GENESIS: u64 = 1_692_803_367;
const QUICKNET_PERIOD: u64 = 3;

const WORD_DOMAIN: &[u8] = b"verity/jury-words/v1";

/// A drand beacon response.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DrandBeacon {
    pub round: u64,
    /// Hex-encoded randomness, `SHA-256(signature)`.
    pub randomness: String,
    /// Hex-encoded BLS signature over the round message.
    pub signature: String,
}

impl DrandBeacon {
    /// Decode the beacon's randomness after checking it derives from the
    /// signature. This does not check the BLS signature itself.
    pub fn randomness_bytes(&self) -> Result<[u8; 32], RandomnessError> {
        let sig = hex::decode(&self.signature)
            .map_err(|e| RandomnessError::InvalidBeacon(format!("signature hex: {e}")))?;
        let randomness = hex::decode(&self.randomness)
            .map_err(|e| RandomnessError::InvalidBeacon(format!("randomness hex: {e}")))?;
        let expected = Sha256::digest(&sig);
        if expected.as_slice() != randomness.as_slice() {
            return Err(RandomnessError::BeaconVerification(format!(
                "round {}: randomness is not SHA-256(signature)",
                self.round
            )));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&randomness);
        Ok(out)
    }
}

/// BLS12-381 verifier for unchained (quicknet-style) beacons.
pub struct DrandVerifier {
    pub_key_bytes: Vec<u8>,
}

impl DrandVerifier {
    /// Verifier for a custom network key (hex, compressed G2 point).
    pub fn new(pub_key_hex: &str) -> Result<Self, RandomnessError> {
        let pub_key_bytes = hex::decode(pub_key_hex)
            .map_err(|e| RandomnessError::InvalidPublicKey(format!("hex decode: {e}")))?;
        Ok(Self { pub_key_bytes })
    }

    pub fn quicknet() -> Result<Self, RandomnessError> {
        Self::new(QUICKNET_PUBKEY_HEX)
    }

    /// Full check: randomness derivation plus BLS signature over
    /// `SHA-256(round as big-endian u64)`.
    pub fn verify(&self, beacon: &DrandBeacon) -> Result<(), RandomnessError> {
        beacon.randomness_bytes()?;

        use blst::min_pk::{PublicKey, Signature};

        let sig_bytes = hex::decode(&beacon.signature)
            .map_err(|e| RandomnessError::InvalidBeacon(format!("signature hex: {e}")))?;
        let pk = PublicKey::from_bytes(&self.pub_key_bytes).map_err(|e| {
            RandomnessError::InvalidPublicKey(format!("G2 point deserialization: {e:?}"))
        })?;
        let sig = Signature::from_bytes(&sig_bytes).map_err(|e| {
            RandomnessError::InvalidBeacon(format!("G1 point deserialization: {e:?}"))
        })?;
        let message = Sha256::digest(beacon.round.to_be_bytes());

        match sig.verify(true, &message, QUICKNET_DST, &[], &pk, true) {
            blst::BLST_ERROR::BLST_SUCCESS => Ok(()),
            other => Err(RandomnessError::BeaconVerification(format!(
                "round {}: BLS signature rejected ({other:?})",
                beacon.round
            ))),
        }
    }
}

/// Round/time mapping of a drand chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainInfo {
    /// Seconds between rounds.
    pub period: u64,
    /// Unix time of round 1.
    pub genesis_time: u64,
}

impl ChainInfo {
    pub fn quicknet() -> Self {
        Self {
            period: QUICKNET_PERIOD,
            genesis_time: QUICKNET_GENESIS,
        }
    }

    /// The latest round published at `now` (0 before genesis).
    pub fn current_round(&self, now: u64) -> u64 {
        if now < self.genesis_time || self.period == 0 {
            return 0;
        }
        ((now - self.genesis_time) / self.period) + 1
    }
}

/// HTTP client for a drand relay.
pub struct DrandClient {
    base_url: String,
    client: reqwest::Client,
    chain_hash: Option<String>,
    verifier: Option<DrandVerifier>,
}

impl DrandClient {
    /// Client for the mainnet relay without BLS verification.
    pub fn new() -> Self {
        Self::with_url(DRAND_MAINNET_URL)
    }

    pub fn with_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            chain_hash: None,
            verifier: None,
        }
    }

    /// Client for quicknet with full BLS verification.
    pub fn quicknet() -> Result<Self, RandomnessError> {
        Ok(Self {
            chain_hash: Some(QUICKNET_CHAIN_HASH.to_string()),
            verifier: Some(DrandVerifier::quicknet()?),
            ..Self::new()
        })
    }

    fn api_prefix(&self) -> String {
        match &self.chain_hash {
            Some(hash) => format!("{}/{}", self.base_url, hash),
            None => self.base_url.clone(),
        }
    }

    /// Fetch and check the latest beacon.
    pub async fn fetch_latest(&self) -> Result<DrandBeacon, RandomnessError> {
        let url = format!("{}/public/latest", self.api_prefix());
        let resp = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| RandomnessError::DrandFetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RandomnessError::DrandFetch(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        let beacon: DrandBeacon = resp
            .json()
            .await
            .map_err(|e| RandomnessError::DrandFetch(e.to_string()))?;
        self.check(&beacon)?;
        Ok(beacon)
    }

    /// Verify with the attached BLS verifier, or the derivation check alone.
    pub fn check(&self, beacon: &DrandBeacon) -> Result<(), RandomnessError> {
        match &self.verifier {
            Some(verifier) => verifier.verify(beacon),
            None => beacon.randomness_bytes().map(|_| ()),
        }
    }
}

impl Default for DrandClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct PendingRequest {
    context: Vec<u8>,
    num_words: u32,
    /// Smallest beacon round allowed to answer this request.
    min_round: u64,
}

/// Production randomness provider backed by drand.
///
/// `request_random` only enqueues. The host periodically awaits
/// [`DrandRandomness::fulfill_pending`] and forwards every returned
/// [`RandomWords`] to the node.
pub struct DrandRandomness {
    client: DrandClient,
    chain: ChainInfo,
    /// Decides which rounds are already public when a request arrives.
    clock: Box<dyn Clock>,
    next_request: u64,
    pending: BTreeMap<RequestId, PendingRequest>,
}

impl DrandRandomness {
    pub fn new(client: DrandClient, chain: ChainInfo) -> Self {
        Self {
            client,
            chain,
            clock: Box::new(SystemClock),
            next_request: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Use the node's clock instead of wall-clock time.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn quicknet() -> Result<Self, RandomnessError> {
        Ok(Self::new(DrandClient::quicknet()?, ChainInfo::quicknet()))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn enqueue(&mut self, context: &[u8], num_words: u32, now: Timestamp) -> RequestId {
        let id = RequestId::new(self.next_request);
        self.next_request += 1;
        let min_round = self.chain.current_round(now.as_secs()) + 1;
        self.pending.insert(
            id,
            PendingRequest {
                context: context.to_vec(),
                num_words,
                min_round,
            },
        );
        tracing::debug!(request = %id, min_round, "randomness requested");
        id
    }

    /// Fetch the latest beacon and answer every request it is allowed to.
    pub async fn fulfill_pending(&mut self) -> Result<Vec<RandomWords>, RandomnessError> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let beacon = self.client.fetch_latest().await?;
        self.fulfill_with_beacon(&beacon)
    }

    /// Answer pending requests from an already-fetched beacon. Requests made
    /// at or after the beacon's round stay queued.
    pub fn fulfill_with_beacon(
        &mut self,
        beacon: &DrandBeacon,
    ) -> Result<Vec<RandomWords>, RandomnessError> {
        self.client.check(beacon)?;
        let randomness = beacon.randomness_bytes()?;

        let ready: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|(_, p)| p.min_round <= beacon.round)
            .map(|(id, _)| *id)
            .collect();

        let mut out = Vec::with_capacity(ready.len());
        for id in ready {
            if let Some(p) = self.pending.remove(&id) {
                out.push(RandomWords {
                    request: id,
                    words: derive_words(&randomness, id, &p.context, p.num_words),
                });
            }
        }
        if !out.is_empty() {
            tracing::info!(round = beacon.round, fulfilled = out.len(), "randomness fulfilled");
        }
        Ok(out)
    }
}

impl RandomnessService for DrandRandomness {
    fn request_random(
        &mut self,
        context: &[u8],
        num_words: u32,
    ) -> Result<RequestId, RandomnessError> {
        if num_words == 0 {
            return Err(RandomnessError::ZeroWords);
        }
        let now = self.clock.now();
        Ok(self.enqueue(context, num_words, now))
    }

    fn name(&self) -> &str {
        "drand"
    }
}

/// Expand one beacon into `n` request-specific words.
pub fn derive_words(
    randomness: &[u8; 32],
    request: RequestId,
    context: &[u8],
    n: u32,
) -> Vec<[u8; 32]> {
    (0..n)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update(WORD_DOMAIN);
            hasher.update(randomness);
            hasher.update(request.raw().to_be_bytes());
            hasher.update((context.len() as u64).to_be_bytes());
            hasher.update(context);
            hasher.update(i.to_be_bytes());
            let mut word = [0u8; 32];
            word.copy_from_slice(&hasher.finalize());
            word
        })
        .collect()
}
