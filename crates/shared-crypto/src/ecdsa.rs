//! # ECDSA Signatures (secp256k1)
//!
//! Single-key ECDSA over the in-crate group arithmetic. Used for stake
//! proofs; consensus signatures go through [`crate::threshold`].
//!
//! ## Security Properties
//!
//! - Fresh random nonce per signature
//! - Low-S normalization (EIP-2)
//! - Public keys at infinity are rejected

use serde::{Deserialize, Serialize};

use crate::curve::{params::HALF_ORDER, CurvePoint, Scalar};
use crate::hashing::hash_message;
use crate::CryptoError;

/// ECDSA signature `(r, s)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// x-coordinate of the nonce point, reduced mod `n`
    pub r: Scalar,
    /// Proof scalar
    pub s: Scalar,
}

impl EcdsaSignature {
    /// 64-byte `r || s` encoding.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_bytes());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out
    }

    /// Decode `r || s`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 64 {
            return Err(CryptoError::InvalidSignature);
        }
        let r = Scalar::from_bytes(&bytes[..32]).map_err(|_| CryptoError::InvalidSignature)?;
        let s = Scalar::from_bytes(&bytes[32..]).map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Self { r, s })
    }
}

/// Sign `message` with `secret`.
pub fn sign(message: &[u8], secret: &Scalar) -> Result<EcdsaSignature, CryptoError> {
    if secret.is_zero() {
        return Err(CryptoError::InvalidScalar("zero private key".into()));
    }
    let z = hash_message(message);

    loop {
        let k = Scalar::random();
        let nonce_point = CurvePoint::mul_generator(&k);
        let r = Scalar::new(nonce_point.x().clone());
        if r.is_zero() {
            continue;
        }
        let k_inv = k.invert().ok_or(CryptoError::NotInvertible)?;
        let mut s = &k_inv * &(&z + &(&r * secret));
        if s.is_zero() {
            continue;
        }
        if *s.as_biguint() > *HALF_ORDER {
            s = -s;
        }
        return Ok(EcdsaSignature { r, s });
    }
}

/// Standard ECDSA verification.
///
/// Computes `u1 = z/s`, `u2 = r/s` and accepts iff `(u1·G + u2·Q).x mod n == r`.
pub fn verify(
    message: &[u8],
    signature: &EcdsaSignature,
    public_key: &CurvePoint,
) -> Result<(), CryptoError> {
    if public_key.is_infinity() || !public_key.is_on_curve() {
        return Err(CryptoError::InvalidPublicKey);
    }
    if signature.r.is_zero() || signature.s.is_zero() {
        return Err(CryptoError::InvalidSignature);
    }

    let z = hash_message(message);
    let s_inv = signature.s.invert().ok_or(CryptoError::InvalidSignature)?;
    let u1 = &z * &s_inv;
    let u2 = &signature.r * &s_inv;

    let point = CurvePoint::mul_generator(&u1).add(&public_key.mul(&u2));
    if point.is_infinity() {
        return Err(CryptoError::SignatureVerificationFailed);
    }
    if Scalar::new(point.x().clone()) != signature.r {
        return Err(CryptoError::SignatureVerificationFailed);
    }
    Ok(())
}

/// secp256k1 ECDSA keypair.
#[derive(Clone)]
pub struct EcdsaKeyPair {
    secret: Scalar,
    public: CurvePoint,
}

impl EcdsaKeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let secret = Scalar::random();
        let public = CurvePoint::mul_generator(&secret);
        Self { secret, public }
    }

    /// Create from an existing non-zero secret.
    pub fn from_secret(secret: Scalar) -> Result<Self, CryptoError> {
        if secret.is_zero() {
            return Err(CryptoError::InvalidScalar("zero private key".into()));
        }
        let public = CurvePoint::mul_generator(&secret);
        Ok(Self { secret, public })
    }

    /// Public key.
    pub fn public_key(&self) -> &CurvePoint {
        &self.public
    }

    /// Private scalar.
    pub fn secret(&self) -> &Scalar {
        &self.secret
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Result<EcdsaSignature, CryptoError> {
        sign(message, &self.secret)
    }
}

impl std::fmt::Debug for EcdsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
