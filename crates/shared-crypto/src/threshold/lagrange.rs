//! Lagrange interpolation at zero over party indices.

use std::collections::HashSet;

use super::error::{ThresholdError, ThresholdResult};
use crate::curve::Scalar;

/// `λ_i = Π_{j≠i} x_j / (x_j − x_i) mod n`.
pub fn lagrange_coefficient(index: u32, indices: &[u32]) -> ThresholdResult<Scalar> {
    if index == 0 {
        return Err(ThresholdError::UnknownParty(index));
    }
    if !indices.contains(&index) {
        return Err(ThresholdError::UnknownParty(index));
    }

    let xi = Scalar::from_u64(u64::from(index));
    let mut numerator = Scalar::one();
    let mut denominator = Scalar::one();
    let mut seen = HashSet::with_capacity(indices.len());

    for &j in indices {
        if !seen.insert(j) {
            return Err(ThresholdError::DuplicateParty(j));
        }
        if j == index {
            continue;
        }
        let xj = Scalar::from_u64(u64::from(j));
        numerator = &numerator * &xj;
        denominator = &denominator * &(&xj - &xi);
    }

    let inv = denominator
        .invert()
        .ok_or(ThresholdError::DuplicateParty(index))?;
    Ok(&numerator * &inv)
}

/// Reconstruct `f(0)` from `(index, f(index))` pairs.
pub fn interpolate_at_zero(points: &[(u32, Scalar)]) -> ThresholdResult<Scalar> {
    let indices: Vec<u32> = points.iter().map(|(i, _)| *i).collect();
    let mut acc = Scalar::zero();
    for (index, value) in points {
        let lambda = lagrange_coefficient(*index, &indices)?;
        acc = &acc + &(&lambda * value);
    }
    Ok(acc)
}
