//! # Proof Flows
//!
//! Schnorr identity proofs and Pedersen range proofs through `qc-zkp`.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use qc_zkp::{schnorr, FreshnessConfig, ProofGuard, RangeProof, ZkpError};
    use shared_crypto::{CurvePoint, Scalar};

    const NOW: u64 = 1_700_000_000_000;

    fn identity() -> (Scalar, CurvePoint) {
        let secret = Scalar::random();
        let public_key = CurvePoint::mul_generator(&secret);
        (secret, public_key)
    }

    // =============================================================================
    // SCHNORR
    // =============================================================================

    #[test]
    fn test_honest_schnorr_proof_verifies() {
        let (secret, public_key) = identity();
        let proof = schnorr::prove(&secret, &public_key, NOW).unwrap();
        assert!(schnorr::verify(&proof, &public_key).is_ok());
    }

    #[test]
    fn test_mutated_schnorr_fields_fail() {
        let (secret, public_key) = identity();
        let proof = schnorr::prove(&secret, &public_key, NOW).unwrap();

        let mut bad_commitment = proof.clone();
        bad_commitment.commitment = bad_commitment.commitment.add(&CurvePoint::generator());
        assert!(schnorr::verify(&bad_commitment, &public_key).is_err());

        let mut bad_challenge = proof.clone();
        bad_challenge.challenge = &bad_challenge.challenge + &Scalar::one();
        assert!(schnorr::verify(&bad_challenge, &public_key).is_err());

        let mut bad_response = proof.clone();
        bad_response.response = &bad_response.response + &Scalar::one();
        assert_eq!(
            schnorr::verify(&bad_response, &public_key).unwrap_err(),
            ZkpError::VerificationFailed
        );

        let mut bad_timestamp = proof;
        bad_timestamp.timestamp += 1;
        assert_eq!(
            schnorr::verify(&bad_timestamp, &public_key).unwrap_err(),
            ZkpError::ChallengeMismatch
        );
    }

    #[test]
    fn test_proof_for_other_key_fails() {
        let (secret, public_key) = identity();
        let (_, other) = identity();
        let proof = schnorr::prove(&secret, &public_key, NOW).unwrap();
        assert!(schnorr::verify(&proof, &other).is_err());
    }

    #[test]
    fn test_guard_rejects_replay_and_stale_proofs() {
        let guard = ProofGuard::new(FreshnessConfig::default());
        let (secret, public_key) = identity();

        let proof = schnorr::prove(&secret, &public_key, NOW).unwrap();
        assert!(guard.verify(&proof, &public_key, NOW + 1_000).is_ok());
        assert_eq!(
            guard.verify(&proof, &public_key, NOW + 2_000).unwrap_err(),
            ZkpError::Replayed
        );

        let stale = schnorr::prove(&secret, &public_key, NOW).unwrap();
        assert!(matches!(
            guard.verify(&stale, &public_key, NOW + 10 * 60_000),
            Err(ZkpError::Expired { .. })
        ));
    }

    // =============================================================================
    // RANGE PROOFS
    // =============================================================================

    #[test]
    fn test_range_proof_bounds() {
        let blinding = Scalar::random();
        let (commitment, proof) = RangeProof::prove(0, &blinding, 0, 255).unwrap();
        assert!(proof.verify(&commitment).is_ok());

        let (commitment, proof) = RangeProof::prove(255, &blinding, 0, 255).unwrap();
        assert!(proof.verify(&commitment).is_ok());

        assert!(matches!(
            RangeProof::prove(256, &blinding, 0, 255),
            Err(ZkpError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_range_proof_does_not_transfer_between_commitments() {
        let (first, proof) = RangeProof::prove(40, &Scalar::random(), 10, 100).unwrap();
        let (second, _) = RangeProof::prove(40, &Scalar::random(), 10, 100).unwrap();

        assert!(proof.verify(&first).is_ok());
        assert!(proof.verify(&second).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_in_range_values_verify(value in 1_000u64..2_000) {
            let (commitment, proof) =
                RangeProof::prove(value, &Scalar::random(), 1_000, 2_000).unwrap();
            prop_assert!(proof.verify(&commitment).is_ok());
        }
    }
}
