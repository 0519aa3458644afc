//! # Pedersen Commitments
//!
//! `C = v·G + r·H` where `H` is derived by hashing to the curve
//! (try-and-increment), so nobody knows `log_G(H)`.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use shared_crypto::hashing::sha256_concat;
use shared_crypto::{CurvePoint, Scalar};

const GENERATOR_DOMAIN: &[u8] = b"quantum-chain/pedersen/H";

lazy_static! {
    /// Second generator `H`.
    pub static ref GENERATOR_H: CurvePoint = derive_generator(GENERATOR_DOMAIN);
}

/// Hash-to-curve by try-and-increment: the first counter whose digest is a
/// valid x-coordinate (even y) wins.
pub fn derive_generator(domain: &[u8]) -> CurvePoint {
    let mut counter: u32 = 0;
    loop {
        let digest = sha256_concat(&[domain, &counter.to_be_bytes()]);
        let mut encoded = [0u8; 33];
        encoded[0] = 0x02;
        encoded[1..].copy_from_slice(&digest);
        if let Ok(point) = CurvePoint::from_compressed(&encoded) {
            return point;
        }
        counter = counter.wrapping_add(1);
    }
}

/// A Pedersen commitment point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedersenCommitment(pub CurvePoint);

impl PedersenCommitment {
    /// `v·G + r·H`.
    pub fn commit(value: &Scalar, blinding: &Scalar) -> Self {
        let point = CurvePoint::mul_generator(value).add(&GENERATOR_H.mul(blinding));
        Self(point)
    }

    /// Check an opening.
    pub fn opens_to(&self, value: &Scalar, blinding: &Scalar) -> bool {
        Self::commit(value, blinding) == *self
    }

    /// Commitment point.
    pub fn point(&self) -> &CurvePoint {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generator_h_is_valid_and_independent() {
        assert!(GENERATOR_H.is_on_curve());
        assert!(!GENERATOR_H.is_infinity());
        assert_ne!(*GENERATOR_H, CurvePoint::generator());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(derive_generator(b"x"), derive_generator(b"x"));
        assert_ne!(derive_generator(b"x"), derive_generator(b"y"));
    }

    #[test]
    fn test_commitment_opens() {
        let v = Scalar::from_u64(42);
        let r = Scalar::random();
        let c = PedersenCommitment::commit(&v, &r);
        assert!(c.opens_to(&v, &r));
        assert!(!c.opens_to(&Scalar::from_u64(43), &r));
    }

    #[test]
    fn test_commitments_are_homomorphic() {
        let (v1, r1) = (Scalar::from_u64(5), Scalar::random());
        let (v2, r2) = (Scalar::from_u64(7), Scalar::random());
        let sum = PedersenCommitment::commit(&v1, &r1)
            .point()
            .add(PedersenCommitment::commit(&v2, &r2).point());
        assert_eq!(sum, PedersenCommitment::commit(&(&v1 + &v2), &(&r1 + &r2)).0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_sum_of_commitments_opens_to_sums(a in 0u64..1 << 32, b in 0u64..1 << 32) {
            let (ra, rb) = (Scalar::random(), Scalar::random());
            let sum = PedersenCommitment(
                PedersenCommitment::commit(&Scalar::from_u64(a), &ra)
                    .point()
                    .add(PedersenCommitment::commit(&Scalar::from_u64(b), &rb).point()),
            );
            prop_assert!(sum.opens_to(&Scalar::from_u64(a + b), &(&ra + &rb)));
        }
    }
}
