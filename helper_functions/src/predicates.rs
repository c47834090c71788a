use typenum::marker_traits::Unsigned;
use types::beacon_state::BeaconState;
use types::config::Config;
use types::primitives::*;
use types::types::{AttestationData, ExecutionPayloadHeader, IndexedAttestation, Validator};

use crate::beacon_state_accessors::get_domain;
use crate::crypto::bls_verify_aggregate;
use crate::error::Error;
use crate::misc::compute_signing_root;

pub fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

pub fn is_slashable_validator(validator: &Validator, epoch: Epoch) -> bool {
    !validator.slashed
        && validator.activation_epoch <= epoch
        && epoch < validator.withdrawable_epoch
}

pub fn is_slashable_attestation_data(data_1: &AttestationData, data_2: &AttestationData) -> bool {
    // Double vote
    (data_1 != data_2 && data_1.target.epoch == data_2.target.epoch) ||
    // Surround vote
    (data_1.source.epoch < data_2.source.epoch && data_2.target.epoch < data_1.target.epoch)
}

/// Structural validity of an indexed attestation, optionally including the
/// aggregate signature of the attesting validators.
pub fn is_valid_indexed_attestation<C: Config>(
    state: &BeaconState<C>,
    indexed_attestation: &IndexedAttestation<C>,
    verify_signature: bool,
) -> Result<(), Error> {
    let indices = &indexed_attestation.attesting_indices;

    if indices.is_empty() {
        return Err(Error::NoAttestingIndices);
    }
    if indices.len() > C::MaxValidatorsPerCommittee::to_usize() {
        return Err(Error::MaxIndicesExceeded);
    }
    // Strictly increasing implies sorted and free of duplicates.
    if !indices.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(Error::BadValidatorIndicesOrdering);
    }

    let pubkeys = indices
        .iter()
        .map(|index| {
            state
                .validators
                .get(*index as usize)
                .map(|validator| validator.pubkey)
                .ok_or(Error::IndexOutOfRange)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !verify_signature {
        return Ok(());
    }

    let domain = get_domain(
        state,
        C::domain_beacon_attester(),
        Some(indexed_attestation.data.target.epoch),
    );
    let signing_root = compute_signing_root(&indexed_attestation.data, domain);
    if !bls_verify_aggregate(
        &pubkeys,
        signing_root.as_bytes(),
        &indexed_attestation.signature,
    )? {
        return Err(Error::SignatureInvalid);
    }
    Ok(())
}

pub fn is_valid_merkle_branch(
    leaf: H256,
    branch: &[H256],
    depth: u64,
    index: u64,
    root: H256,
) -> bool {
    merkle_tree::is_valid_merkle_branch(leaf, branch, depth, index, root)
}

pub fn has_eth1_withdrawal_credential<C: Config>(validator: &Validator) -> bool {
    validator.withdrawal_credentials[0] == C::eth1_address_withdrawal_prefix_byte()
}

pub fn is_fully_withdrawable_validator<C: Config>(
    validator: &Validator,
    balance: Gwei,
    epoch: Epoch,
) -> bool {
    has_eth1_withdrawal_credential::<C>(validator)
        && validator.withdrawable_epoch <= epoch
        && balance > 0
}

pub fn is_partially_withdrawable_validator<C: Config>(validator: &Validator, balance: Gwei) -> bool {
    has_eth1_withdrawal_credential::<C>(validator)
        && validator.effective_balance == C::max_effective_balance()
        && balance > C::max_effective_balance()
}

/// The merge is complete once a non-default payload header has been stored.
pub fn is_merge_transition_complete<C: Config>(state: &BeaconState<C>) -> bool {
    state.latest_execution_payload_header != ExecutionPayloadHeader::default()
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;
    use types::config::MinimalConfig;
    use types::types::Checkpoint;

    use super::*;

    #[test]
    fn test_is_active_validator() {
        let validator = Validator {
            activation_epoch: 1,
            exit_epoch: 3,
            ..Validator::default()
        };
        assert!(!is_active_validator(&validator, 0));
        assert!(is_active_validator(&validator, 1));
        assert!(is_active_validator(&validator, 2));
        assert!(!is_active_validator(&validator, 3));
    }

    #[test]
    fn test_is_slashable_validator() {
        let validator = Validator {
            activation_epoch: 0,
            withdrawable_epoch: 2,
            ..Validator::default()
        };
        assert!(is_slashable_validator(&validator, 0));
        assert!(is_slashable_validator(&validator, 1));
        assert!(!is_slashable_validator(&validator, 2));
    }

    #[test]
    fn test_is_slashable_validator_already_slashed() {
        let validator = Validator {
            slashed: true,
            activation_epoch: 0,
            withdrawable_epoch: 2,
            ..Validator::default()
        };
        assert!(!is_slashable_validator(&validator, 1));
    }

    #[test]
    fn double_vote_is_slashable() {
        let data_1 = AttestationData {
            target: Checkpoint {
                epoch: 1,
                root: H256::from([0; 32]),
            },
            ..AttestationData::default()
        };
        let data_2 = AttestationData {
            target: Checkpoint {
                epoch: 1,
                root: H256::from([1; 32]),
            },
            ..AttestationData::default()
        };
        assert!(is_slashable_attestation_data(&data_1, &data_2));
        assert!(!is_slashable_attestation_data(&data_1, &data_1));
    }

    #[test]
    fn surround_vote_is_slashable() {
        let data_1 = AttestationData {
            source: Checkpoint {
                epoch: 0,
                ..Checkpoint::default()
            },
            target: Checkpoint {
                epoch: 3,
                ..Checkpoint::default()
            },
            ..AttestationData::default()
        };
        let data_2 = AttestationData {
            source: Checkpoint {
                epoch: 1,
                root: H256::from([1; 32]),
            },
            target: Checkpoint {
                epoch: 2,
                ..Checkpoint::default()
            },
            ..AttestationData::default()
        };
        assert!(is_slashable_attestation_data(&data_1, &data_2));
    }

    fn state_with_validators(count: usize) -> BeaconState<MinimalConfig> {
        BeaconState {
            validators: VariableList::from(vec![Validator::default(); count]),
            ..BeaconState::default()
        }
    }

    #[test]
    fn indexed_attestation_requires_indices() {
        let state = state_with_validators(4);
        let attestation = IndexedAttestation::default();
        assert_eq!(
            is_valid_indexed_attestation(&state, &attestation, false),
            Err(Error::NoAttestingIndices),
        );
    }

    #[test]
    fn indexed_attestation_rejects_unsorted_indices() {
        let state = state_with_validators(4);
        let attestation: IndexedAttestation<MinimalConfig> = IndexedAttestation {
            attesting_indices: VariableList::from(vec![2, 1]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            is_valid_indexed_attestation(&state, &attestation, false),
            Err(Error::BadValidatorIndicesOrdering),
        );
    }

    #[test]
    fn indexed_attestation_rejects_duplicate_indices() {
        let state = state_with_validators(4);
        let attestation: IndexedAttestation<MinimalConfig> = IndexedAttestation {
            attesting_indices: VariableList::from(vec![1, 1]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            is_valid_indexed_attestation(&state, &attestation, false),
            Err(Error::BadValidatorIndicesOrdering),
        );
    }

    #[test]
    fn indexed_attestation_accepts_sorted_known_indices_without_signature() {
        let state = state_with_validators(4);
        let attestation: IndexedAttestation<MinimalConfig> = IndexedAttestation {
            attesting_indices: VariableList::from(vec![0, 2, 3]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            is_valid_indexed_attestation(&state, &attestation, false),
            Ok(()),
        );
    }

    #[test]
    fn withdrawability_needs_the_eth1_credential_prefix() {
        let mut credentials = [0; 32];
        credentials[0] = 0x01;
        let eligible = Validator {
            withdrawal_credentials: H256::from(credentials),
            withdrawable_epoch: 0,
            ..Validator::default()
        };
        let bls_credentialed = Validator {
            withdrawable_epoch: 0,
            ..Validator::default()
        };

        assert!(is_fully_withdrawable_validator::<MinimalConfig>(
            &eligible, 1, 0,
        ));
        assert!(!is_fully_withdrawable_validator::<MinimalConfig>(
            &bls_credentialed,
            1,
            0,
        ));
        assert!(!is_fully_withdrawable_validator::<MinimalConfig>(
            &eligible, 0, 0,
        ));
    }

    #[test]
    fn partial_withdrawability_needs_an_excess_balance() {
        let mut credentials = [0; 32];
        credentials[0] = 0x01;
        let validator = Validator {
            withdrawal_credentials: H256::from(credentials),
            effective_balance: MinimalConfig::max_effective_balance(),
            ..Validator::default()
        };

        assert!(is_partially_withdrawable_validator::<MinimalConfig>(
            &validator,
            MinimalConfig::max_effective_balance() + 1,
        ));
        assert!(!is_partially_withdrawable_validator::<MinimalConfig>(
            &validator,
            MinimalConfig::max_effective_balance(),
        ));
    }
}
