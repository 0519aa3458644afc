//! Affine secp256k1 points.
//!
//! Public operations (`add`, `double`, `negate`) work in affine coordinates.
//! Scalar multiplication runs double-and-add in Jacobian coordinates so a
//! multiplication costs a single field inversion.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::params::{CURVE_B, FIELD_PRIME, GENERATOR_X, GENERATOR_Y, SQRT_EXPONENT};
use super::scalar::{mod_inverse, Scalar};
use crate::CryptoError;

// =============================================================================
// FIELD HELPERS (mod p)
// =============================================================================

fn fadd(a: &BigUint, b: &BigUint) -> BigUint {
    (a + b) % &*FIELD_PRIME
}

fn fsub(a: &BigUint, b: &BigUint) -> BigUint {
    (a + &*FIELD_PRIME - b) % &*FIELD_PRIME
}

fn fmul(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) % &*FIELD_PRIME
}

fn fsmall(a: &BigUint, k: u32) -> BigUint {
    (a * k) % &*FIELD_PRIME
}

fn finv(a: &BigUint) -> Option<BigUint> {
    mod_inverse(a, &FIELD_PRIME)
}

// =============================================================================
// AFFINE POINT
// =============================================================================

/// Point on secp256k1 (or the point at infinity).
///
/// # Invariant
/// Non-infinity points satisfy `y² = x³ + 7 (mod p)`. Infinity is stored
/// with zero coordinates so equality is structural.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CurvePoint {
    x: BigUint,
    y: BigUint,
    infinity: bool,
}

impl CurvePoint {
    /// The additive identity.
    pub fn infinity() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::zero(),
            infinity: true,
        }
    }

    /// The standard generator `G`.
    pub fn generator() -> Self {
        Self {
            x: GENERATOR_X.clone(),
            y: GENERATOR_Y.clone(),
            infinity: false,
        }
    }

    /// Create a point from affine coordinates, checking the curve equation.
    pub fn from_affine(x: BigUint, y: BigUint) -> Result<Self, CryptoError> {
        if x >= *FIELD_PRIME || y >= *FIELD_PRIME {
            return Err(CryptoError::NotOnCurve);
        }
        let point = Self {
            x,
            y,
            infinity: false,
        };
        if !point.is_on_curve() {
            return Err(CryptoError::NotOnCurve);
        }
        Ok(point)
    }

    /// `G * k` for a scalar `k`.
    pub fn mul_generator(k: &Scalar) -> Self {
        Self::generator().mul(k)
    }

    /// Whether this is the point at infinity.
    pub fn is_infinity(&self) -> bool {
        self.infinity
    }

    /// Affine x-coordinate (zero for infinity).
    pub fn x(&self) -> &BigUint {
        &self.x
    }

    /// Affine y-coordinate (zero for infinity).
    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// Check `y² == x³ + 7 (mod p)`. Infinity is on the curve.
    pub fn is_on_curve(&self) -> bool {
        if self.infinity {
            return true;
        }
        let lhs = fmul(&self.y, &self.y);
        let rhs = fadd(&fmul(&fmul(&self.x, &self.x), &self.x), &CURVE_B);
        lhs == rhs
    }

    /// Point addition. Falls through to [`CurvePoint::double`] when both
    /// operands are equal.
    pub fn add(&self, other: &CurvePoint) -> CurvePoint {
        if self.infinity {
            return other.clone();
        }
        if other.infinity {
            return self.clone();
        }
        if self.x == other.x {
            if self.y == other.y {
                return self.double();
            }
            // P + (-P)
            return Self::infinity();
        }

        let Some(inv) = finv(&fsub(&other.x, &self.x)) else {
            return Self::infinity();
        };
        let lambda = fmul(&fsub(&other.y, &self.y), &inv);
        let x3 = fsub(&fsub(&fmul(&lambda, &lambda), &self.x), &other.x);
        let y3 = fsub(&fmul(&lambda, &fsub(&self.x, &x3)), &self.y);

        Self {
            x: x3,
            y: y3,
            infinity: false,
        }
    }

    /// Point doubling: `λ = 3x² / 2y`.
    pub fn double(&self) -> CurvePoint {
        if self.infinity || self.y.is_zero() {
            return Self::infinity();
        }

        let numerator = fsmall(&fmul(&self.x, &self.x), 3);
        let Some(inv) = finv(&fsmall(&self.y, 2)) else {
            return Self::infinity();
        };
        let lambda = fmul(&numerator, &inv);
        let x3 = fsub(&fmul(&lambda, &lambda), &fsmall(&self.x, 2));
        let y3 = fsub(&fmul(&lambda, &fsub(&self.x, &x3)), &self.y);

        Self {
            x: x3,
            y: y3,
            infinity: false,
        }
    }

    /// `-P = (x, p - y)`.
    pub fn negate(&self) -> CurvePoint {
        if self.infinity {
            return self.clone();
        }
        Self {
            x: self.x.clone(),
            y: fsub(&BigUint::zero(), &self.y),
            infinity: false,
        }
    }

    /// `self - other`.
    pub fn sub(&self, other: &CurvePoint) -> CurvePoint {
        self.add(&other.negate())
    }

    /// Scalar multiplication by a reduced scalar.
    pub fn mul(&self, k: &Scalar) -> CurvePoint {
        self.scalar_multiply(k.as_biguint())
    }

    /// Double-and-add scalar multiplication by an arbitrary non-negative integer.
    pub fn scalar_multiply(&self, k: &BigUint) -> CurvePoint {
        if self.infinity || k.is_zero() {
            return Self::infinity();
        }

        let mut acc = JacobianPoint::infinity();
        for i in (0..k.bits()).rev() {
            acc = acc.double();
            if k.bit(i) {
                acc = acc.add_affine(self);
            }
        }
        acc.to_affine()
    }

    /// SEC1 compressed encoding (33 bytes). Infinity encodes as all zeros.
    pub fn to_compressed(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        if self.infinity {
            return out;
        }
        out[0] = if self.y.bit(0) { 0x03 } else { 0x02 };
        let x = self.x.to_bytes_be();
        out[33 - x.len()..].copy_from_slice(&x);
        out
    }

    /// Decode a SEC1 compressed point.
    pub fn from_compressed(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 33 {
            return Err(CryptoError::InvalidEncoding(format!(
                "expected 33 bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.iter().all(|b| *b == 0) {
            return Ok(Self::infinity());
        }
        let odd = match bytes[0] {
            0x02 => false,
            0x03 => true,
            tag => {
                return Err(CryptoError::InvalidEncoding(format!(
                    "unknown prefix 0x{tag:02x}"
                )))
            }
        };

        let x = BigUint::from_bytes_be(&bytes[1..]);
        if x >= *FIELD_PRIME {
            return Err(CryptoError::NotOnCurve);
        }
        let rhs = fadd(&fmul(&fmul(&x, &x), &x), &CURVE_B);
        let mut y = rhs.modpow(&SQRT_EXPONENT, &FIELD_PRIME);
        if y.bit(0) != odd {
            y = fsub(&BigUint::zero(), &y);
        }
        Self::from_affine(x, y)
    }

    /// Hex of the compressed encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Parse hex produced by [`CurvePoint::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
        Self::from_compressed(&bytes)
    }
}

impl Default for CurvePoint {
    fn default() -> Self {
        Self::infinity()
    }
}

impl fmt::Debug for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.infinity {
            write!(f, "CurvePoint(infinity)")
        } else {
            write!(f, "CurvePoint({})", self.to_hex())
        }
    }
}

impl fmt::Display for CurvePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for CurvePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CurvePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CurvePoint::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// JACOBIAN ACCUMULATOR
// =============================================================================

/// `(X, Y, Z)` representing `(X/Z², Y/Z³)`; `Z = 0` is infinity.
struct JacobianPoint {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl JacobianPoint {
    fn infinity() -> Self {
        Self {
            x: BigUint::one(),
            y: BigUint::one(),
            z: BigUint::zero(),
        }
    }

    fn from_affine(p: &CurvePoint) -> Self {
        Self {
            x: p.x.clone(),
            y: p.y.clone(),
            z: BigUint::one(),
        }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// dbl-2009-l (a = 0).
    fn double(&self) -> Self {
        if self.is_infinity() || self.y.is_zero() {
            return Self::infinity();
        }
        let a = fmul(&self.x, &self.x);
        let b = fmul(&self.y, &self.y);
        let c = fmul(&b, &b);
        let xb = fadd(&self.x, &b);
        let d = fsmall(&fsub(&fsub(&fmul(&xb, &xb), &a), &c), 2);
        let e = fsmall(&a, 3);
        let f = fmul(&e, &e);
        let x3 = fsub(&f, &fsmall(&d, 2));
        let y3 = fsub(&fmul(&e, &fsub(&d, &x3)), &fsmall(&c, 8));
        let z3 = fsmall(&fmul(&self.y, &self.z), 2);
        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// madd-2007-bl: Jacobian + affine.
    fn add_affine(&self, q: &CurvePoint) -> Self {
        if q.infinity {
            return Self {
                x: self.x.clone(),
                y: self.y.clone(),
                z: self.z.clone(),
            };
        }
        if self.is_infinity() {
            return Self::from_affine(q);
        }

        let z1z1 = fmul(&self.z, &self.z);
        let u2 = fmul(&q.x, &z1z1);
        let s2 = fmul(&fmul(&q.y, &self.z), &z1z1);
        let h = fsub(&u2, &self.x);
        let r = fsmall(&fsub(&s2, &self.y), 2);

        if h.is_zero() {
            if r.is_zero() {
                return self.double();
            }
            return Self::infinity();
        }

        let hh = fmul(&h, &h);
        let i = fsmall(&hh, 4);
        let j = fmul(&h, &i);
        let v = fmul(&self.x, &i);
        let x3 = fsub(&fsub(&fmul(&r, &r), &j), &fsmall(&v, 2));
        let y3 = fsub(
            &fmul(&r, &fsub(&v, &x3)),
            &fsmall(&fmul(&self.y, &j), 2),
        );
        let z1h = fadd(&self.z, &h);
        let z3 = fsub(&fsub(&fmul(&z1h, &z1h), &z1z1), &hh);

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    fn to_affine(&self) -> CurvePoint {
        if self.is_infinity() {
            return CurvePoint::infinity();
        }
        let Some(z_inv) = finv(&self.z) else {
            return CurvePoint::infinity();
        };
        let z_inv2 = fmul(&z_inv, &z_inv);
        let z_inv3 = fmul(&z_inv2, &z_inv);
        CurvePoint {
            x: fmul(&self.x, &z_inv2),
            y: fmul(&self.y, &z_inv3),
            infinity: false,
        }
    }
}
