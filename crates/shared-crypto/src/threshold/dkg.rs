//! # Distributed Key Generation
//!
//! Feldman-VSS ceremony run in-process for `n` simulated parties:
//!
//! 1. **Deal**: every party samples a degree `t-1` polynomial and broadcasts
//!    `a_k · G` for each coefficient.
//! 2. **Distribute**: every dealer evaluates its polynomial at each party index.
//! 3. **Verify**: every recipient checks each share against the dealer's
//!    commitments. A dealer with any rejected share is disqualified.
//! 4. **Combine**: shares from qualified dealers are summed; the group key is
//!    the sum of the qualified constant-term commitments.
//!
//! Fewer than `t` qualified dealers aborts the ceremony. A retry always
//! restarts from phase 1.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{ThresholdError, ThresholdResult};
use super::polynomial::{verify_share, Polynomial};
use crate::curve::{CurvePoint, Scalar};

/// `t`-of-`n` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    threshold: usize,
    parties: usize,
}

impl ThresholdParams {
    /// Validate `1 <= t <= n`.
    pub fn new(threshold: usize, parties: usize) -> ThresholdResult<Self> {
        if threshold == 0 || threshold > parties || parties > u32::MAX as usize {
            return Err(ThresholdError::InvalidParameters { threshold, parties });
        }
        Ok(Self { threshold, parties })
    }

    /// Minimum number of signatories.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Total number of parties.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Party indices `1..=n`.
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        1..=self.parties as u32
    }
}

/// A party's private share of the group key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretShare {
    /// Party index (1-based)
    pub index: u32,
    /// `f(index)` summed over qualified dealers
    pub value: Scalar,
}

impl std::fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretShare")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Public verification share `Y_i = s_i · G`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyShare {
    /// Party index (1-based)
    pub index: u32,
    /// Public share point
    pub point: CurvePoint,
}

/// Result of a successful ceremony.
#[derive(Debug, Clone)]
pub struct DkgOutput {
    /// Ceremony parameters
    pub params: ThresholdParams,
    /// Combined group public key `P`
    pub group_public_key: CurvePoint,
    /// Private share per party, ordered by index
    pub secret_shares: Vec<SecretShare>,
    /// Public share per party, ordered by index
    pub public_shares: Vec<PublicKeyShare>,
    /// Dealers whose contributions were combined
    pub qualified: Vec<u32>,
    /// Dealers excluded for bad shares
    pub disqualified: Vec<u32>,
}

impl DkgOutput {
    /// Secret share of one party.
    pub fn secret_share(&self, index: u32) -> Option<&SecretShare> {
        self.secret_shares.iter().find(|s| s.index == index)
    }

    /// Public share of one party.
    pub fn public_share(&self, index: u32) -> Option<&PublicKeyShare> {
        self.public_shares.iter().find(|s| s.index == index)
    }
}

/// In-process DKG ceremony.
#[derive(Debug, Clone)]
pub struct DkgCeremony {
    params: ThresholdParams,
    faulty_dealers: BTreeSet<u32>,
}

impl DkgCeremony {
    /// Ceremony with all dealers honest.
    pub fn new(params: ThresholdParams) -> Self {
        Self {
            params,
            faulty_dealers: BTreeSet::new(),
        }
    }

    /// Dealers that will hand out corrupted shares.
    pub fn with_faulty_dealers(mut self, dealers: impl IntoIterator<Item = u32>) -> Self {
        self.faulty_dealers.extend(dealers);
        self
    }

    /// Run one full ceremony.
    pub fn run(&self) -> ThresholdResult<DkgOutput> {
        let t = self.params.threshold();
        let indices: Vec<u32> = self.params.indices().collect();

        // Deal
        let mut commitments: BTreeMap<u32, Vec<CurvePoint>> = BTreeMap::new();
        let mut shares: BTreeMap<(u32, u32), Scalar> = BTreeMap::new();
        for &dealer in &indices {
            let poly = Polynomial::random(t - 1);
            commitments.insert(dealer, poly.commitments());
            for &recipient in &indices {
                let mut share = poly.evaluate(&Scalar::from_u64(u64::from(recipient)));
                if self.faulty_dealers.contains(&dealer) {
                    share = &share + &Scalar::one();
                }
                shares.insert((dealer, recipient), share);
            }
        }

        // Verify
        let mut disqualified = BTreeSet::new();
        for (&(dealer, recipient), share) in &shares {
            let Some(dealer_commitments) = commitments.get(&dealer) else {
                disqualified.insert(dealer);
                continue;
            };
            if !verify_share(share, recipient, dealer_commitments) {
                debug!(dealer, recipient, "DKG share rejected");
                disqualified.insert(dealer);
            }
        }
        let qualified: Vec<u32> = indices
            .iter()
            .copied()
            .filter(|d| !disqualified.contains(d))
            .collect();

        if qualified.len() < t {
            warn!(
                qualified = qualified.len(),
                required = t,
                "DKG ceremony aborted"
            );
            return Err(ThresholdError::InsufficientQualifiedDealers {
                qualified: qualified.len(),
                required: t,
            });
        }

        // Combine
        let mut group_public_key = CurvePoint::infinity();
        for dealer in &qualified {
            if let Some(c0) = commitments.get(dealer).and_then(|c| c.first()) {
                group_public_key = group_public_key.add(c0);
            }
        }

        let mut secret_shares = Vec::with_capacity(indices.len());
        let mut public_shares = Vec::with_capacity(indices.len());
        for &recipient in &indices {
            let value = qualified
                .iter()
                .filter_map(|dealer| shares.get(&(*dealer, recipient)))
                .fold(Scalar::zero(), |acc, s| &acc + s);
            public_shares.push(PublicKeyShare {
                index: recipient,
                point: CurvePoint::mul_generator(&value),
            });
            secret_shares.push(SecretShare {
                index: recipient,
                value,
            });
        }

        info!(
            threshold = t,
            parties = indices.len(),
            disqualified = disqualified.len(),
            "DKG ceremony complete"
        );

        Ok(DkgOutput {
            params: self.params,
            group_public_key,
            secret_shares,
            public_shares,
            qualified,
            disqualified: disqualified.into_iter().collect(),
        })
    }

    /// Run the ceremony, restarting from scratch on abort.
    pub fn run_with_retries(&self, max_attempts: usize) -> ThresholdResult<DkgOutput> {
        let attempts = max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.run() {
                Ok(output) => return Ok(output),
                Err(ThresholdError::InsufficientQualifiedDealers { .. }) => {
                    warn!(attempt, max_attempts = attempts, "Restarting DKG ceremony");
                }
                Err(e) => return Err(e),
            }
        }
        Err(ThresholdError::CeremonyFailed { attempts })
    }
}
