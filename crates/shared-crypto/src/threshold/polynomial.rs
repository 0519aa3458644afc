//! Secret polynomials and Feldman commitments.

use crate::curve::{CurvePoint, Scalar};

/// `f(x) = a_0 + a_1 x + ... + a_{t-1} x^{t-1}` over `Z_n`.
#[derive(Clone)]
pub struct Polynomial {
    coefficients: Vec<Scalar>,
}

impl Polynomial {
    /// Random polynomial of the given degree with a random constant term.
    pub fn random(degree: usize) -> Self {
        let coefficients = (0..=degree).map(|_| Scalar::random()).collect();
        Self { coefficients }
    }

    /// Polynomial from explicit coefficients, lowest degree first.
    pub fn from_coefficients(coefficients: Vec<Scalar>) -> Self {
        Self { coefficients }
    }

    /// Degree of the polynomial.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// The secret `f(0)`.
    pub fn constant(&self) -> Scalar {
        self.coefficients.first().cloned().unwrap_or_default()
    }

    /// Horner evaluation at `x`.
    pub fn evaluate(&self, x: &Scalar) -> Scalar {
        self.coefficients
            .iter()
            .rev()
            .fold(Scalar::zero(), |acc, coeff| &(&acc * x) + coeff)
    }

    /// Feldman commitments `a_k · G`.
    pub fn commitments(&self) -> Vec<CurvePoint> {
        self.coefficients
            .iter()
            .map(CurvePoint::mul_generator)
            .collect()
    }
}

impl std::fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Polynomial")
            .field("degree", &self.degree())
            .finish_non_exhaustive()
    }
}

/// Evaluate committed polynomial in the exponent: `Σ C_k · x^k`.
pub fn evaluate_commitments(commitments: &[CurvePoint], x: u32) -> CurvePoint {
    let x = Scalar::from_u64(u64::from(x));
    let mut power = Scalar::one();
    let mut acc = CurvePoint::infinity();
    for commitment in commitments {
        acc = acc.add(&commitment.mul(&power));
        power = &power * &x;
    }
    acc
}

/// Check `share · G == Σ C_k · index^k`.
pub fn verify_share(share: &Scalar, index: u32, commitments: &[CurvePoint]) -> bool {
    CurvePoint::mul_generator(share) == evaluate_commitments(commitments, index)
}
