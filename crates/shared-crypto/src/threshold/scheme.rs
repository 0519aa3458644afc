//! Coordinator over the in-process signing parties.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::dkg::{DkgOutput, PublicKeyShare, ThresholdParams};
use super::error::{ThresholdError, ThresholdResult};
use super::signing::{
    combine, commit, sign_partial, verify_partial, PartialSignature, SigningPackage,
    ThresholdSignature,
};
use crate::curve::{CurvePoint, Scalar};

/// Holds the key material produced by DKG and drives signing sessions.
///
/// A session whose partials fail verification is retried with fresh nonces
/// after dropping the offending signatories, until it succeeds or fewer than
/// `t` signatories remain.
#[derive(Debug, Clone)]
pub struct ThresholdScheme {
    keys: DkgOutput,
    faulty_signers: BTreeSet<u32>,
}

impl ThresholdScheme {
    /// Wrap the output of a completed ceremony.
    pub fn from_dkg(keys: DkgOutput) -> Self {
        Self {
            keys,
            faulty_signers: BTreeSet::new(),
        }
    }

    /// Signatories that will emit corrupted partial signatures.
    pub fn with_faulty_signers(mut self, signers: impl IntoIterator<Item = u32>) -> Self {
        self.faulty_signers.extend(signers);
        self
    }

    /// Ceremony parameters.
    pub fn params(&self) -> ThresholdParams {
        self.keys.params
    }

    /// Combined group public key.
    pub fn group_public_key(&self) -> &CurvePoint {
        &self.keys.group_public_key
    }

    /// Public verification shares.
    pub fn public_shares(&self) -> &[PublicKeyShare] {
        &self.keys.public_shares
    }

    /// Sign `message` with the given signatory indices.
    pub fn sign(&self, message: &[u8], signers: &[u32]) -> ThresholdResult<ThresholdSignature> {
        let threshold = self.keys.params.threshold();
        let mut active: BTreeSet<u32> = BTreeSet::new();
        for &index in signers {
            if self.keys.secret_share(index).is_none() {
                return Err(ThresholdError::UnknownParty(index));
            }
            active.insert(index);
        }

        loop {
            if active.len() < threshold {
                return Err(ThresholdError::InsufficientSignatories {
                    available: active.len(),
                    required: threshold,
                });
            }

            let (package, partials) = self.run_session(message, &active)?;

            let invalid: Vec<u32> = partials
                .iter()
                .filter(|p| {
                    self.keys
                        .public_share(p.signatory_id)
                        .map_or(true, |share| !verify_partial(&package, p, share))
                })
                .map(|p| p.signatory_id)
                .collect();

            if invalid.is_empty() {
                return combine(&package, &partials, &self.keys.public_shares, threshold);
            }

            warn!(
                ?invalid,
                remaining = active.len() - invalid.len(),
                "Dropping signatories with invalid partials"
            );
            for index in invalid {
                active.remove(&index);
            }
        }
    }

    /// One commit/sign round over `active`.
    fn run_session(
        &self,
        message: &[u8],
        active: &BTreeSet<u32>,
    ) -> ThresholdResult<(SigningPackage, Vec<PartialSignature>)> {
        let (nonces, commitments): (Vec<_>, Vec<_>) = active.iter().map(|&i| commit(i)).unzip();
        let package = SigningPackage::new(
            message,
            commitments,
            &self.keys.group_public_key,
            self.keys.params.threshold(),
        )?;

        let mut partials = Vec::with_capacity(active.len());
        for nonce in nonces {
            let index = nonce.index();
            let share = self
                .keys
                .secret_share(index)
                .ok_or(ThresholdError::UnknownParty(index))?;
            let mut partial = sign_partial(&package, nonce, share)?;
            if self.faulty_signers.contains(&index) {
                partial.response = &partial.response + &Scalar::one();
            }
            partials.push(partial);
        }
        debug!(signers = active.len(), "Signing session produced partials");
        Ok((package, partials))
    }
}
