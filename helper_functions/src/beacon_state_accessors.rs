use std::cmp;
use std::convert::TryFrom;

use integer_sqrt::IntegerSquareRoot;
use ssz_types::BitList;
use typenum::marker_traits::Unsigned;
use types::beacon_state::{BeaconState, ForkId};
use types::config::Config;
use types::consts;
use types::primitives::*;
use types::types::{AttestationData, Checkpoint, Validator, Withdrawal};

use crate::{
    crypto::hash,
    error::Error,
    math::int_to_bytes,
    misc::{
        compute_committee, compute_domain, compute_epoch_at_slot, compute_proposer_index,
        compute_start_slot_at_epoch,
    },
    predicates::{
        is_active_validator, is_fully_withdrawable_validator, is_partially_withdrawable_validator,
    },
};

pub fn get_current_epoch<C: Config>(state: &BeaconState<C>) -> Epoch {
    compute_epoch_at_slot::<C>(state.slot)
}

pub fn get_previous_epoch<C: Config>(state: &BeaconState<C>) -> Epoch {
    let current_epoch = get_current_epoch(state);
    let genesis_epoch = C::genesis_epoch();

    if current_epoch > genesis_epoch {
        current_epoch - 1
    } else {
        genesis_epoch
    }
}

pub fn get_block_root<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<H256, Error> {
    get_block_root_at_slot(state, compute_start_slot_at_epoch::<C>(epoch))
}

pub fn get_block_root_at_slot<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
) -> Result<H256, Error> {
    if !(slot < state.slot && state.slot <= slot + C::SlotsPerHistoricalRoot::to_u64()) {
        return Err(Error::SlotOutOfRange);
    }

    match usize::try_from(slot % C::SlotsPerHistoricalRoot::to_u64()) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => Ok(state.block_roots[id]),
    }
}

pub fn get_randao_mix<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<H256, Error> {
    match usize::try_from(epoch % C::EpochsPerHistoricalVector::to_u64()) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => Ok(state.randao_mixes[id]),
    }
}

pub fn get_active_validator_indices<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
) -> Vec<ValidatorIndex> {
    let mut active_validator_indices = Vec::new();
    for (i, validator) in state.validators.iter().enumerate() {
        if is_active_validator(validator, epoch) {
            active_validator_indices.push(i as u64);
        }
    }
    active_validator_indices
}

pub fn get_validator_churn_limit<C: Config>(state: &BeaconState<C>) -> u64 {
    let active_validator_indices = get_active_validator_indices(state, get_current_epoch(state));

    cmp::max(
        C::min_per_epoch_churn_limit(),
        active_validator_indices.len() as u64 / C::churn_limit_quotient(),
    )
}

pub fn get_seed<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
    domain_type: DomainType,
) -> Result<H256, Error> {
    let lookahead_mix = get_randao_mix(
        state,
        epoch + C::EpochsPerHistoricalVector::to_u64() - C::min_seed_lookahead() - 1,
    )?;

    let mut input = domain_type.to_vec();
    input.append(&mut int_to_bytes(epoch, 8));
    input.extend_from_slice(lookahead_mix.as_bytes());
    Ok(H256::from_slice(&hash(&input)))
}

pub fn get_committee_count_per_slot<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> u64 {
    let active = get_active_validator_indices(state, epoch).len() as u64;
    let slots_per_epoch = C::SlotsPerEpoch::to_u64();

    cmp::max(
        1,
        cmp::min(
            C::max_committees_per_slot(),
            active / slots_per_epoch / C::target_committee_size(),
        ),
    )
}

pub fn get_beacon_committee<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
    index: CommitteeIndex,
) -> Result<Vec<ValidatorIndex>, Error> {
    let epoch = compute_epoch_at_slot::<C>(slot);
    let committees_per_slot = get_committee_count_per_slot(state, epoch);
    let indices = get_active_validator_indices(state, epoch);
    let seed = get_seed(state, epoch, C::domain_beacon_attester())?;

    compute_committee::<C>(
        &indices,
        seed,
        (slot % C::SlotsPerEpoch::to_u64()) * committees_per_slot + index,
        committees_per_slot * C::SlotsPerEpoch::to_u64(),
    )
}

pub fn get_beacon_proposer_index<C: Config>(
    state: &BeaconState<C>,
) -> Result<ValidatorIndex, Error> {
    let epoch = get_current_epoch(state);
    let indices = get_active_validator_indices(state, epoch);

    let mut input = get_seed(state, epoch, C::domain_beacon_proposer())?
        .as_bytes()
        .to_vec();
    input.append(&mut int_to_bytes(state.slot, 8));
    let seed = H256::from_slice(&hash(&input));

    compute_proposer_index(state, &indices, seed)
}

/// Validator indices whose aggregation bits are set, in committee order or
/// ascending order when `sort` is requested.
pub fn get_attesting_indices<C: Config>(
    state: &BeaconState<C>,
    data: &AttestationData,
    bits: &BitList<C::MaxValidatorsPerCommittee>,
    sort: bool,
) -> Result<Vec<ValidatorIndex>, Error> {
    let committee = get_beacon_committee(state, data.slot, data.index)?;
    if bits.len() != committee.len() {
        return Err(Error::AttestationBitsInvalid);
    }

    let mut indices = committee
        .iter()
        .enumerate()
        .filter_map(|(position, index)| match bits.get(position) {
            Ok(true) => Some(*index),
            _ => None,
        })
        .collect::<Vec<_>>();
    if sort {
        indices.sort_unstable();
    }
    Ok(indices)
}

pub fn get_total_balance<C: Config>(
    state: &BeaconState<C>,
    indices: &[ValidatorIndex],
) -> Result<Gwei, Error> {
    let mut sum = 0;
    for index in indices {
        match usize::try_from(*index) {
            Err(_err) => return Err(Error::IndexOutOfRange),
            Ok(id) => {
                sum += state
                    .validators
                    .get(id)
                    .ok_or(Error::IndexOutOfRange)?
                    .effective_balance
            }
        }
    }
    // Floored so the base reward denominator can never be zero.
    Ok(cmp::max(C::effective_balance_increment(), sum))
}

pub fn get_total_active_balance<C: Config>(state: &BeaconState<C>) -> Result<Gwei, Error> {
    get_total_balance(
        state,
        &get_active_validator_indices(state, get_current_epoch(state)),
    )
}

pub fn get_base_reward_per_increment<C: Config>(state: &BeaconState<C>) -> Result<Gwei, Error> {
    Ok(C::effective_balance_increment() * C::base_reward_factor()
        / get_total_active_balance(state)?.integer_sqrt())
}

pub fn get_base_reward<C: Config>(
    state: &BeaconState<C>,
    index: ValidatorIndex,
    base_reward_per_increment: Gwei,
) -> Result<Gwei, Error> {
    let effective_balance = state
        .validators
        .get(index as usize)
        .ok_or(Error::IndexOutOfRange)?
        .effective_balance;
    Ok(effective_balance / C::effective_balance_increment() * base_reward_per_increment)
}

pub fn get_domain<C: Config>(
    state: &BeaconState<C>,
    domain_type: DomainType,
    message_epoch: Option<Epoch>,
) -> Domain {
    let epoch = message_epoch.unwrap_or_else(|| get_current_epoch(state));
    let fork_version = if epoch < state.fork.epoch {
        state.fork.previous_version
    } else {
        state.fork.current_version
    };
    compute_domain(domain_type, fork_version, state.genesis_validators_root)
}

/// Which of the timely source/target/head flags an attestation included with
/// `inclusion_delay` earns. Requires the attestation source to match the
/// justified checkpoint of its epoch.
pub fn get_attestation_participation_flag_indices<C: Config>(
    state: &BeaconState<C>,
    data: &AttestationData,
    inclusion_delay: u64,
) -> Result<Vec<usize>, Error> {
    let justified_checkpoint: Checkpoint = if data.target.epoch == get_current_epoch(state) {
        state.current_justified_checkpoint
    } else {
        state.previous_justified_checkpoint
    };

    if data.source != justified_checkpoint {
        return Err(Error::SourceCheckpointMismatch);
    }
    let is_matching_target = data.target.root == get_block_root(state, data.target.epoch)?;
    let is_matching_head =
        is_matching_target && data.beacon_block_root == get_block_root_at_slot(state, data.slot)?;

    let slots_per_epoch = C::SlotsPerEpoch::to_u64();
    let mut participation_flag_indices = Vec::with_capacity(consts::PARTICIPATION_FLAG_COUNT);
    if inclusion_delay <= slots_per_epoch.integer_sqrt() {
        participation_flag_indices.push(consts::TIMELY_SOURCE_FLAG_INDEX);
    }
    // The target window is unbounded from Deneb on.
    if is_matching_target && (state.version >= ForkId::Deneb || inclusion_delay <= slots_per_epoch)
    {
        participation_flag_indices.push(consts::TIMELY_TARGET_FLAG_INDEX);
    }
    if is_matching_head && inclusion_delay == C::min_attestation_inclusion_delay() {
        participation_flag_indices.push(consts::TIMELY_HEAD_FLAG_INDEX);
    }

    Ok(participation_flag_indices)
}

/// Per-participant and per-bit proposer rewards for a sync aggregate.
pub fn get_sync_rewards<C: Config>(state: &BeaconState<C>) -> Result<(Gwei, Gwei), Error> {
    let total_active_balance = get_total_active_balance(state)?;
    let total_active_increments = total_active_balance / C::effective_balance_increment();
    let total_base_rewards = get_base_reward_per_increment(state)? * total_active_increments;
    let max_participant_rewards = total_base_rewards * C::sync_reward_weight()
        / C::weight_denominator()
        / C::SlotsPerEpoch::to_u64();
    let participant_reward = max_participant_rewards / C::SyncCommitteeSize::to_u64();
    let proposer_reward =
        participant_reward * C::proposer_weight() / (C::weight_denominator() - C::proposer_weight());
    Ok((participant_reward, proposer_reward))
}

fn withdrawal_address(validator: &Validator) -> ExecutionAddress {
    let mut address = [0; 20];
    address.copy_from_slice(&validator.withdrawal_credentials.as_bytes()[12..]);
    ExecutionAddress::from(address)
}

/// The withdrawals the next payload must contain: a bounded sweep over the
/// registry starting at `next_withdrawal_validator_index`, taking full
/// balances of withdrawable validators and the excess of maxed-out ones.
pub fn get_expected_withdrawals<C: Config>(state: &BeaconState<C>) -> Vec<Withdrawal> {
    let epoch = get_current_epoch(state);
    let mut withdrawal_index = state.next_withdrawal_index;
    let mut validator_index = state.next_withdrawal_validator_index;
    let mut withdrawals: Vec<Withdrawal> = Vec::new();

    let validator_count = state.validators.len() as u64;
    if validator_count == 0 {
        return withdrawals;
    }

    let bound = cmp::min(validator_count, C::max_validators_per_withdrawals_sweep());
    for _ in 0..bound {
        let validator = &state.validators[validator_index as usize];
        let balance = state.balances[validator_index as usize];

        if is_fully_withdrawable_validator::<C>(validator, balance, epoch) {
            withdrawals.push(Withdrawal {
                index: withdrawal_index,
                validator_index,
                address: withdrawal_address(validator),
                amount: balance,
            });
            withdrawal_index += 1;
        } else if is_partially_withdrawable_validator::<C>(validator, balance) {
            withdrawals.push(Withdrawal {
                index: withdrawal_index,
                validator_index,
                address: withdrawal_address(validator),
                amount: balance - C::max_effective_balance(),
            });
            withdrawal_index += 1;
        }

        if withdrawals.len() == C::MaxWithdrawalsPerPayload::to_usize() {
            break;
        }
        validator_index = (validator_index + 1) % validator_count;
    }

    withdrawals
}

#[cfg(test)]
mod tests {
    use ssz_types::{FixedVector, VariableList};
    use types::config::MinimalConfig;
    use types::types::Fork;

    use super::*;

    fn active_validator(effective_balance: Gwei) -> Validator {
        Validator {
            effective_balance,
            activation_epoch: 0,
            exit_epoch: consts::FAR_FUTURE_EPOCH,
            withdrawable_epoch: consts::FAR_FUTURE_EPOCH,
            ..Validator::default()
        }
    }

    #[test]
    fn test_get_current_epoch() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            slot: 9,
            ..BeaconState::default()
        };
        assert_eq!(get_current_epoch(&state), 1);
    }

    #[test]
    fn test_get_previous_epoch() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            slot: 17,
            ..BeaconState::default()
        };
        assert_eq!(get_previous_epoch(&state), 1);
    }

    #[test]
    fn test_get_previous_epoch_genesis() {
        let state: BeaconState<MinimalConfig> = BeaconState::default();
        assert_eq!(get_previous_epoch(&state), MinimalConfig::genesis_epoch());
    }

    #[test]
    fn test_get_block_root_at_slot() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            slot: 2,
            block_roots: FixedVector::from(vec![H256::from([0; 32]), H256::from([1; 32])]),
            ..BeaconState::default()
        };
        assert_eq!(get_block_root_at_slot(&state, 1), Ok(H256::from([1; 32])));
    }

    #[test]
    fn test_get_block_root_at_slot_slot_equals_state_slot() {
        let state: BeaconState<MinimalConfig> = BeaconState::default();
        assert_eq!(
            get_block_root_at_slot(&state, 0),
            Err(Error::SlotOutOfRange),
        );
    }

    #[test]
    fn randao_mix_lookup_wraps_around_the_vector() {
        let mut mixes = vec![H256::zero(); 64];
        mixes[1] = H256::from([5; 32]);
        let state: BeaconState<MinimalConfig> = BeaconState {
            randao_mixes: FixedVector::from(mixes),
            ..BeaconState::default()
        };
        assert_eq!(get_randao_mix(&state, 1), Ok(H256::from([5; 32])));
        assert_eq!(get_randao_mix(&state, 65), Ok(H256::from([5; 32])));
    }

    #[test]
    fn test_get_active_validator_indices() {
        let exited = Validator {
            activation_epoch: 0,
            exit_epoch: 1,
            ..Validator::default()
        };
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![exited, active_validator(32_000_000_000)]),
            slot: 8,
            ..BeaconState::default()
        };
        assert_eq!(get_active_validator_indices(&state, 1), vec![1]);
    }

    #[test]
    fn test_get_validator_churn_limit() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![active_validator(32_000_000_000)]),
            ..BeaconState::default()
        };
        assert_eq!(
            get_validator_churn_limit(&state),
            MinimalConfig::min_per_epoch_churn_limit(),
        );
    }

    #[test]
    fn total_balance_is_floored_at_one_increment() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![active_validator(0)]),
            ..BeaconState::default()
        };
        assert_eq!(
            get_total_balance(&state, &[0]),
            Ok(MinimalConfig::effective_balance_increment()),
        );
    }

    #[test]
    fn test_get_total_active_balance() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![
                active_validator(10_000_000_000),
                active_validator(2_000_000_000),
            ]),
            ..BeaconState::default()
        };
        assert_eq!(get_total_active_balance(&state), Ok(12_000_000_000));
    }

    #[test]
    fn domain_uses_the_previous_fork_version_before_the_fork_epoch() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            fork: Fork {
                previous_version: Version::from([0, 0, 0, 1]),
                current_version: Version::from([1, 0, 0, 1]),
                epoch: 10,
            },
            ..BeaconState::default()
        };

        let before = get_domain(&state, MinimalConfig::domain_beacon_proposer(), Some(9));
        let after = get_domain(&state, MinimalConfig::domain_beacon_proposer(), Some(10));
        assert_ne!(before, after);
        assert_eq!(
            before,
            compute_domain(
                MinimalConfig::domain_beacon_proposer(),
                Version::from([0, 0, 0, 1]),
                H256::zero(),
            ),
        );
    }

    #[test]
    fn committee_count_is_clamped_to_at_least_one() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![active_validator(32_000_000_000)]),
            ..BeaconState::default()
        };
        assert_eq!(get_committee_count_per_slot(&state, 0), 1);
    }

    #[test]
    fn attesting_indices_reject_mismatched_bit_length() {
        let validators = vec![active_validator(32_000_000_000); 8];
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(validators),
            slot: 9,
            ..BeaconState::default()
        };
        let data = AttestationData {
            slot: 1,
            index: 0,
            ..AttestationData::default()
        };
        let bits = BitList::with_capacity(3).expect("the bitlist limit is large enough");

        let committee =
            get_beacon_committee(&state, data.slot, data.index).expect("the committee exists");
        assert_ne!(committee.len(), 3);
        assert_eq!(
            get_attesting_indices(&state, &data, &bits, false),
            Err(Error::AttestationBitsInvalid),
        );
    }

    #[test]
    fn attesting_indices_sort_when_requested() {
        let validators = vec![active_validator(32_000_000_000); 16];
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(validators),
            slot: 9,
            ..BeaconState::default()
        };
        let data = AttestationData {
            slot: 1,
            index: 0,
            ..AttestationData::default()
        };
        let committee =
            get_beacon_committee(&state, data.slot, data.index).expect("the committee exists");
        let mut bits: BitList<<MinimalConfig as Config>::MaxValidatorsPerCommittee> =
            BitList::with_capacity(committee.len()).expect("committee fits the limit");
        for position in 0..committee.len() {
            bits.set(position, true).expect("position is in range");
        }

        let indices =
            get_attesting_indices(&state, &data, &bits, true).expect("bits match the committee");
        let mut expected = committee;
        expected.sort_unstable();
        assert_eq!(indices, expected);
    }

    #[test]
    fn proposer_index_is_an_active_validator() {
        let validators = vec![active_validator(32_000_000_000); 8];
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(validators),
            ..BeaconState::default()
        };
        let proposer = get_beacon_proposer_index(&state).expect("validators are active");
        assert!(proposer < 8);
    }

    #[test]
    fn proposer_index_fails_without_active_validators() {
        let state: BeaconState<MinimalConfig> = BeaconState::default();
        assert_eq!(
            get_beacon_proposer_index(&state),
            Err(Error::NoActiveValidators),
        );
    }

    fn eth1_credentialed_validator(effective_balance: Gwei) -> Validator {
        let mut credentials = [0; 32];
        credentials[0] = 0x01;
        credentials[31] = 0xee;
        Validator {
            withdrawal_credentials: H256::from(credentials),
            ..active_validator(effective_balance)
        }
    }

    #[test]
    fn expected_withdrawals_take_the_partial_excess() {
        let max = MinimalConfig::max_effective_balance();
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![eth1_credentialed_validator(max)]),
            balances: VariableList::from(vec![max + 7]),
            ..BeaconState::default()
        };

        let withdrawals = get_expected_withdrawals(&state);
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].amount, 7);
        assert_eq!(withdrawals[0].validator_index, 0);
        assert_eq!(withdrawals[0].index, 0);
    }

    #[test]
    fn expected_withdrawals_take_the_full_balance_of_withdrawable_validators() {
        let max = MinimalConfig::max_effective_balance();
        let mut withdrawable = eth1_credentialed_validator(max);
        withdrawable.withdrawable_epoch = 0;
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![withdrawable]),
            balances: VariableList::from(vec![max]),
            ..BeaconState::default()
        };

        let withdrawals = get_expected_withdrawals(&state);
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].amount, max);
    }

    #[test]
    fn expected_withdrawals_skip_bls_credentialed_validators() {
        let max = MinimalConfig::max_effective_balance();
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![active_validator(max)]),
            balances: VariableList::from(vec![max * 2]),
            ..BeaconState::default()
        };
        assert!(get_expected_withdrawals(&state).is_empty());
    }

    #[test]
    fn sync_rewards_are_nonzero_for_a_staked_committee() {
        let validators = vec![active_validator(32_000_000_000); 32];
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(validators),
            ..BeaconState::default()
        };
        let (participant_reward, proposer_reward) =
            get_sync_rewards(&state).expect("balances are well-formed");
        assert!(participant_reward > 0);
        assert!(proposer_reward > 0);
        assert!(proposer_reward < participant_reward);
    }

    #[test]
    fn participation_flags_require_a_matching_source() {
        let state: BeaconState<MinimalConfig> = BeaconState {
            slot: 2,
            current_justified_checkpoint: Checkpoint {
                epoch: 0,
                root: H256::from([1; 32]),
            },
            ..BeaconState::default()
        };
        let data = AttestationData {
            slot: 1,
            ..AttestationData::default()
        };
        assert_eq!(
            get_attestation_participation_flag_indices(&state, &data, 1),
            Err(Error::SourceCheckpointMismatch),
        );
    }

    #[test]
    fn participation_flags_for_a_fully_matching_attestation() {
        let block_roots = vec![H256::from([9; 32]); 64];
        let state: BeaconState<MinimalConfig> = BeaconState {
            slot: 2,
            block_roots: FixedVector::from(block_roots),
            ..BeaconState::default()
        };
        let data = AttestationData {
            slot: 1,
            beacon_block_root: H256::from([9; 32]),
            target: Checkpoint {
                epoch: 0,
                root: H256::from([9; 32]),
            },
            ..AttestationData::default()
        };

        let flags = get_attestation_participation_flag_indices(&state, &data, 1)
            .expect("source matches the justified checkpoint");
        assert_eq!(
            flags,
            vec![
                consts::TIMELY_SOURCE_FLAG_INDEX,
                consts::TIMELY_TARGET_FLAG_INDEX,
                consts::TIMELY_HEAD_FLAG_INDEX,
            ],
        );
    }

    #[test]
    fn late_inclusion_loses_the_head_flag() {
        let block_roots = vec![H256::from([9; 32]); 64];
        let state: BeaconState<MinimalConfig> = BeaconState {
            slot: 4,
            block_roots: FixedVector::from(block_roots),
            ..BeaconState::default()
        };
        let data = AttestationData {
            slot: 1,
            beacon_block_root: H256::from([9; 32]),
            target: Checkpoint {
                epoch: 0,
                root: H256::from([9; 32]),
            },
            ..AttestationData::default()
        };

        let flags = get_attestation_participation_flag_indices(&state, &data, 3)
            .expect("source matches the justified checkpoint");
        assert!(!flags.contains(&consts::TIMELY_HEAD_FLAG_INDEX));
        assert!(flags.contains(&consts::TIMELY_TARGET_FLAG_INDEX));
    }
}
