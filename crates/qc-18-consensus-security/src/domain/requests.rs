//! Join requests, peer connections and inbound requests.

use serde::{Deserialize, Serialize};
use shared_crypto::ecdsa::{self, EcdsaSignature};
use shared_crypto::hashing::{leading_zero_bits, sha256_concat};
use shared_crypto::{CryptoError, CurvePoint, EcdsaKeyPair, Scalar};

use qc_zkp::{schnorr, SchnorrProof, ZkpResult};

use super::NodeId;

/// Proof of knowledge of the node's identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCredential {
    pub public_key: CurvePoint,
    pub proof: SchnorrProof,
}

impl IdentityCredential {
    /// Credential presented when joining as `node_id`. The proof is bound to
    /// the node id and does not verify for any other node.
    pub fn for_node(secret: &Scalar, node_id: &str, timestamp: u64) -> ZkpResult<Self> {
        let public_key = CurvePoint::mul_generator(secret);
        let proof =
            schnorr::prove_with_context(secret, &public_key, timestamp, node_id.as_bytes())?;
        Ok(Self { public_key, proof })
    }
}

/// Nonce such that `SHA256(node_id ‖ nonce)` has enough leading zero bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    pub nonce: u64,
}

impl ProofOfWork {
    /// Leading zero bits achieved for `node_id`.
    pub fn work(&self, node_id: &str) -> u32 {
        let digest = sha256_concat(&[node_id.as_bytes(), &self.nonce.to_be_bytes()]);
        leading_zero_bits(&digest)
    }

    /// Whether the work meets `difficulty` bits.
    pub fn is_valid(&self, node_id: &str, difficulty: u32) -> bool {
        self.work(node_id) >= difficulty
    }

    /// Brute-force a nonce, giving up after `max_iterations`.
    pub fn solve(node_id: &str, difficulty: u32, max_iterations: u64) -> Option<Self> {
        (0..max_iterations)
            .map(|nonce| ProofOfWork { nonce })
            .find(|pow| pow.is_valid(node_id, difficulty))
    }
}

/// Stake attestation: ECDSA signature by `staker_key` over `node_id ‖ amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeProof {
    pub amount: u64,
    pub staker_key: CurvePoint,
    pub signature: EcdsaSignature,
}

impl StakeProof {
    fn message(node_id: &str, amount: u64) -> Vec<u8> {
        let mut message = node_id.as_bytes().to_vec();
        message.extend_from_slice(&amount.to_be_bytes());
        message
    }

    /// Sign a stake of `amount` for `node_id`.
    pub fn create(node_id: &str, amount: u64, staker: &EcdsaKeyPair) -> Result<Self, CryptoError> {
        let signature = staker.sign(&Self::message(node_id, amount))?;
        Ok(Self {
            amount,
            staker_key: staker.public_key().clone(),
            signature,
        })
    }

    /// Signature check and minimum amount.
    pub fn is_valid(&self, node_id: &str, min_stake: u64) -> bool {
        self.amount >= min_stake
            && ecdsa::verify(
                &Self::message(node_id, self.amount),
                &self.signature,
                &self.staker_key,
            )
            .is_ok()
    }
}

/// Request by a node to join the validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeJoinRequest {
    pub node_id: NodeId,
    pub ip: String,
    pub credentials: Option<IdentityCredential>,
    pub proof_of_work: Option<ProofOfWork>,
    pub stake_proof: Option<StakeProof>,
    /// Request time (ms)
    pub timestamp: u64,
}

impl NodeJoinRequest {
    /// Request with no proofs attached.
    pub fn new(node_id: impl Into<NodeId>, ip: impl Into<String>, timestamp: u64) -> Self {
        Self {
            node_id: node_id.into(),
            ip: ip.into(),
            credentials: None,
            proof_of_work: None,
            stake_proof: None,
            timestamp,
        }
    }

    pub fn with_credentials(mut self, credentials: IdentityCredential) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_proof_of_work(mut self, pow: ProofOfWork) -> Self {
        self.proof_of_work = Some(pow);
        self
    }

    pub fn with_stake(mut self, stake: StakeProof) -> Self {
        self.stake_proof = Some(stake);
        self
    }
}

/// A peer connection as seen by the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub source_ip: String,
    /// Country code
    pub geo_location: String,
    pub asn: String,
    pub node_id: NodeId,
}

impl ConnectionRecord {
    pub fn new(
        source_ip: impl Into<String>,
        geo_location: impl Into<String>,
        asn: impl Into<String>,
        node_id: impl Into<NodeId>,
    ) -> Self {
        Self {
            source_ip: source_ip.into(),
            geo_location: geo_location.into(),
            asn: asn.into(),
            node_id: node_id.into(),
        }
    }
}

/// One inbound request, the unit of DoS analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRequest {
    pub source: String,
    pub size_bytes: u64,
    pub timestamp_ms: u64,
    /// Sender proved its identity
    pub authenticated: bool,
    /// Arrived on an already-established session
    pub established: bool,
    pub token: Option<String>,
    /// Request resulted in an error response
    pub is_error: bool,
}

impl InboundRequest {
    /// Anonymous, unestablished, successful request.
    pub fn new(source: impl Into<String>, size_bytes: u64, timestamp_ms: u64) -> Self {
        Self {
            source: source.into(),
            size_bytes,
            timestamp_ms,
            authenticated: false,
            established: false,
            token: None,
            is_error: false,
        }
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn established(mut self) -> Self {
        self.established = true;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.is_error = true;
        self
    }

    /// Scheduling priority; higher is served first.
    pub fn priority(&self) -> u8 {
        if self.authenticated {
            3
        } else if self.token.is_some() {
            2
        } else if self.established {
            1
        } else {
            0
        }
    }
}
