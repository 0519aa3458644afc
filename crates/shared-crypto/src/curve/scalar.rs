//! Scalars modulo the curve order and modular helpers.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::params::CURVE_ORDER;
use crate::CryptoError;

/// Modular inverse via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(value, modulus) != 1`.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    if modulus.is_zero() {
        return None;
    }

    let m = BigInt::from(modulus.clone());
    let mut old_r = BigInt::from(value % modulus);
    let mut r = m.clone();
    let mut old_s = BigInt::one();
    let mut s = BigInt::zero();

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return None;
    }
    old_s.mod_floor(&m).to_biguint()
}

/// Element of `Z_n` where `n` is the secp256k1 group order.
#[derive(Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Scalar(BigUint);

impl Scalar {
    /// Create a scalar, reducing modulo `n`.
    pub fn new(value: BigUint) -> Self {
        Self(value % &*CURVE_ORDER)
    }

    /// Small integer scalar.
    pub fn from_u64(value: u64) -> Self {
        Self::new(BigUint::from(value))
    }

    /// Additive identity.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Multiplicative identity.
    pub fn one() -> Self {
        Self(BigUint::one())
    }

    /// Uniformly random non-zero scalar.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self(rng.gen_biguint_range(&BigUint::one(), &CURVE_ORDER))
    }

    /// Interpret big-endian bytes as an integer and reduce modulo `n`.
    pub fn from_bytes_reduced(bytes: &[u8]) -> Self {
        Self::new(BigUint::from_bytes_be(bytes))
    }

    /// Parse a canonical 32-byte big-endian scalar (must be `< n`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidScalar(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let value = BigUint::from_bytes_be(bytes);
        if value >= *CURVE_ORDER {
            return Err(CryptoError::InvalidScalar("value exceeds group order".into()));
        }
        Ok(Self(value))
    }

    /// 32-byte big-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; 32];
        out[32 - raw.len()..].copy_from_slice(&raw);
        out
    }

    /// Lowercase hex of the 32-byte encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse from hex produced by [`Scalar::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidScalar(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Underlying integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Check for zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiplicative inverse modulo `n`.
    pub fn invert(&self) -> Option<Self> {
        mod_inverse(&self.0, &CURVE_ORDER).map(Self)
    }

    /// `self^exp mod n`.
    pub fn pow(&self, exp: u64) -> Self {
        Self(self.0.modpow(&BigUint::from(exp), &CURVE_ORDER))
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar({})", self.to_hex())
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl<'a> Add<&'a Scalar> for &'a Scalar {
    type Output = Scalar;

    fn add(self, rhs: &'a Scalar) -> Scalar {
        Scalar::new(&self.0 + &rhs.0)
    }
}

impl<'a> Sub<&'a Scalar> for &'a Scalar {
    type Output = Scalar;

    fn sub(self, rhs: &'a Scalar) -> Scalar {
        // Both operands are reduced, so adding n keeps the difference non-negative.
        Scalar::new(&self.0 + &*CURVE_ORDER - &rhs.0)
    }
}

impl<'a> Mul<&'a Scalar> for &'a Scalar {
    type Output = Scalar;

    fn mul(self, rhs: &'a Scalar) -> Scalar {
        Scalar::new(&self.0 * &rhs.0)
    }
}

impl Neg for &Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        &Scalar::zero() - self
    }
}

macro_rules! forward_owned_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<Scalar> for Scalar {
            type Output = Scalar;

            fn $method(self, rhs: Scalar) -> Scalar {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $trait<&'a Scalar> for Scalar {
            type Output = Scalar;

            fn $method(self, rhs: &'a Scalar) -> Scalar {
                (&self).$method(rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        -&self
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Scalar::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
