//! secp256k1 domain parameters.
//!
//! `y² = x³ + 7` over `F_p`, prime order `n`, cofactor 1.

use lazy_static::lazy_static;
use num_bigint::BigUint;

lazy_static! {
    /// Field prime `p = 2^256 - 2^32 - 977`.
    pub static ref FIELD_PRIME: BigUint =
        hex_const("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F");

    /// Order of the generator.
    pub static ref CURVE_ORDER: BigUint =
        hex_const("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141");

    /// Curve coefficient `b`.
    pub static ref CURVE_B: BigUint = BigUint::from(7u32);

    /// Generator x-coordinate.
    pub static ref GENERATOR_X: BigUint =
        hex_const("79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");

    /// Generator y-coordinate.
    pub static ref GENERATOR_Y: BigUint =
        hex_const("483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8");

    /// `(p + 1) / 4`, the square-root exponent (p ≡ 3 mod 4).
    pub static ref SQRT_EXPONENT: BigUint = (&*FIELD_PRIME + 1u32) >> 2;

    /// `n / 2`, boundary for low-S normalisation.
    pub static ref HALF_ORDER: BigUint = &*CURVE_ORDER >> 1;
}

fn hex_const(digits: &str) -> BigUint {
    BigUint::parse_bytes(digits.as_bytes(), 16).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_parse() {
        assert_eq!(FIELD_PRIME.bits(), 256);
        assert_eq!(CURVE_ORDER.bits(), 256);
        assert!(*CURVE_ORDER < *FIELD_PRIME);
    }

    #[test]
    fn test_prime_is_three_mod_four() {
        assert_eq!(&*FIELD_PRIME % 4u32, BigUint::from(3u32));
    }
}
