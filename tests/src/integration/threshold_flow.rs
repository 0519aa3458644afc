//! # Threshold Signing Flow
//!
//! DKG → nonce commitments → partial signatures → combination → verification,
//! exercised through `shared-crypto` alone.

#[cfg(test)]
mod tests {
    use shared_crypto::threshold::signing::{combine, commit, sign_partial, SigningPackage};
    use shared_crypto::{
        DkgCeremony, DkgOutput, PartialSignature, ThresholdError, ThresholdParams,
        ThresholdScheme,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn ceremony(t: usize, n: usize) -> DkgOutput {
        DkgCeremony::new(ThresholdParams::new(t, n).unwrap())
            .run_with_retries(3)
            .unwrap()
    }

    /// Run rounds 1 and 2 for `signers` without combining.
    fn partials(
        keys: &DkgOutput,
        message: &[u8],
        signers: &[u32],
    ) -> (SigningPackage, Vec<PartialSignature>) {
        let (nonces, commitments): (Vec<_>, Vec<_>) = signers.iter().map(|&i| commit(i)).unzip();
        let package = SigningPackage::new(
            message,
            commitments,
            &keys.group_public_key,
            keys.params.threshold(),
        )
        .unwrap();
        let partials = nonces
            .into_iter()
            .map(|nonces| {
                let share = keys.secret_share(nonces.index()).unwrap();
                sign_partial(&package, nonces, share).unwrap()
            })
            .collect();
        (package, partials)
    }

    // =============================================================================
    // 2-OF-3 FLOW
    // =============================================================================

    #[test]
    fn test_two_of_three_dkg_sign_verify() {
        let keys = ceremony(2, 3);
        assert_eq!(keys.secret_shares.len(), 3);
        assert!(keys.disqualified.is_empty());

        let (package, parts) = partials(&keys, b"m1", &[1, 2]);
        let signature = combine(&package, &parts, &keys.public_shares, 2).unwrap();
        assert!(signature.verify(b"m1", &keys.group_public_key));

        let result = combine(&package, &parts[..1], &keys.public_shares, 2);
        assert_eq!(
            result.unwrap_err(),
            ThresholdError::InsufficientSignatories {
                available: 1,
                required: 2
            }
        );
    }

    #[test]
    fn test_signature_does_not_transfer_to_other_message() {
        let keys = ceremony(2, 3);
        let (package, parts) = partials(&keys, b"m1", &[2, 3]);
        let signature = combine(&package, &parts, &keys.public_shares, 2).unwrap();

        assert!(!signature.verify(b"m2", &keys.group_public_key));
        assert!(!signature.verify(b"m1", &ceremony(2, 3).group_public_key));
    }

    // =============================================================================
    // SIGNER COUNTS
    // =============================================================================

    #[test]
    fn test_any_signer_count_from_t_to_n_verifies() {
        let keys = ceremony(3, 5);
        let scheme = ThresholdScheme::from_dkg(keys);
        for k in 3..=5u32 {
            let signers: Vec<u32> = (1..=k).collect();
            let signature = scheme.sign(b"count", &signers).unwrap();
            assert!(
                signature.verify(b"count", scheme.group_public_key()),
                "k = {k}"
            );
        }
    }

    #[test]
    fn test_below_threshold_signer_counts_fail() {
        let scheme = ThresholdScheme::from_dkg(ceremony(3, 5));
        for k in 1..3u32 {
            let signers: Vec<u32> = (1..=k).collect();
            assert!(matches!(
                scheme.sign(b"count", &signers),
                Err(ThresholdError::InsufficientSignatories { .. })
            ));
        }
    }

    #[test]
    fn test_faulty_dealer_does_not_break_signing() {
        let keys = DkgCeremony::new(ThresholdParams::new(2, 4).unwrap())
            .with_faulty_dealers([3])
            .run_with_retries(3)
            .unwrap();
        assert_eq!(keys.disqualified, vec![3]);

        let scheme = ThresholdScheme::from_dkg(keys);
        let signature = scheme.sign(b"dealer", &[1, 4]).unwrap();
        assert!(signature.verify(b"dealer", scheme.group_public_key()));
    }

    #[test]
    fn test_faulty_signer_is_routed_around() {
        let scheme = ThresholdScheme::from_dkg(ceremony(2, 3)).with_faulty_signers([2]);

        let signature = scheme.sign(b"roast", &[1, 2, 3]).unwrap();
        assert!(signature.verify(b"roast", scheme.group_public_key()));
        assert!(scheme.sign(b"roast", &[1, 2]).is_err());
    }
}
