use rayon::prelude::*;
use ssz_types::VariableList;
use typenum::marker_traits::Unsigned;
use types::beacon_state::{BeaconState, ForkId};
use types::config::Config;
use types::primitives::*;
use types::types::{Attestation, IndexedAttestation, PendingAttestation};

use helper_functions::{
    beacon_state_accessors::{
        get_attestation_participation_flag_indices, get_attesting_indices,
        get_base_reward, get_base_reward_per_increment, get_beacon_committee,
        get_beacon_proposer_index, get_block_root, get_block_root_at_slot,
        get_committee_count_per_slot, get_current_epoch, get_previous_epoch,
    },
    beacon_state_mutators::increase_balance,
    misc::compute_epoch_at_slot,
    predicates::is_valid_indexed_attestation,
};

use crate::{
    error::{AttestationInvalid, Error},
    ValidationMode,
};

/// Applies every attestation in the block, then verifies the collected
/// indexed attestations in one parallel batch when full validation is on.
pub fn process_attestations<C: Config>(
    state: &mut BeaconState<C>,
    attestations: &[Attestation<C>],
    mode: ValidationMode,
) -> Result<(), Error> {
    let base_reward_per_increment = get_base_reward_per_increment(state)?;

    let mut attesting_indices_sets = Vec::with_capacity(attestations.len());
    for attestation in attestations {
        attesting_indices_sets.push(process_attestation(
            state,
            attestation,
            base_reward_per_increment,
        )?);
    }

    if mode.is_full() {
        let state = &*state;
        attestations
            .par_iter()
            .zip(attesting_indices_sets)
            .try_for_each(|(attestation, attesting_indices)| {
                let indexed = IndexedAttestation {
                    attesting_indices: VariableList::from(attesting_indices),
                    data: attestation.data,
                    signature: attestation.signature,
                };
                is_valid_indexed_attestation(state, &indexed, true)?;
                Ok::<(), Error>(())
            })?;
    }

    Ok(())
}

/// Validates and applies one attestation, returning the sorted attesting
/// indices for signature verification by the caller.
pub fn process_attestation<C: Config>(
    state: &mut BeaconState<C>,
    attestation: &Attestation<C>,
    base_reward_per_increment: Gwei,
) -> Result<Vec<ValidatorIndex>, Error> {
    let data = &attestation.data;
    let current_epoch = get_current_epoch(state);
    let previous_epoch = get_previous_epoch(state);

    if (data.target.epoch != current_epoch && data.target.epoch != previous_epoch)
        || data.target.epoch != compute_epoch_at_slot::<C>(data.slot)
    {
        return Err(Error::InvalidAttestation(AttestationInvalid::TargetEpoch));
    }
    if data.slot + C::min_attestation_inclusion_delay() > state.slot
        || state.slot > data.slot + C::SlotsPerEpoch::to_u64()
    {
        return Err(Error::InvalidAttestation(AttestationInvalid::SlotRange));
    }
    if data.index >= get_committee_count_per_slot(state, data.target.epoch) {
        return Err(Error::InvalidAttestation(
            AttestationInvalid::CommitteeIndex,
        ));
    }

    if state.version == ForkId::Phase0 {
        process_attestation_phase0(state, attestation)
    } else {
        process_attestation_post_altair(state, attestation, base_reward_per_increment)
    }
}

fn process_attestation_phase0<C: Config>(
    state: &mut BeaconState<C>,
    attestation: &Attestation<C>,
) -> Result<Vec<ValidatorIndex>, Error> {
    let data = &attestation.data;
    let committee = get_beacon_committee(state, data.slot, data.index)?;
    if attestation.aggregation_bits.len() != committee.len() {
        return Err(Error::InvalidAttestation(AttestationInvalid::BitsLength));
    }

    let pending_attestation = PendingAttestation {
        aggregation_bits: attestation.aggregation_bits.clone(),
        data: *data,
        inclusion_delay: state.slot - data.slot,
        proposer_index: get_beacon_proposer_index(state)?,
    };

    let is_current_attestation = data.target.epoch == get_current_epoch(state);
    if is_current_attestation {
        if data.source != state.current_justified_checkpoint {
            return Err(Error::InvalidAttestation(
                AttestationInvalid::SourceMismatch,
            ));
        }
        state
            .current_epoch_attestations
            .push(pending_attestation.clone())
            .map_err(|_| Error::ListOverflow)?;
    } else {
        if data.source != state.previous_justified_checkpoint {
            return Err(Error::InvalidAttestation(
                AttestationInvalid::SourceMismatch,
            ));
        }
        state
            .previous_epoch_attestations
            .push(pending_attestation.clone())
            .map_err(|_| Error::ListOverflow)?;
    }

    let indices = get_attesting_indices(state, data, &attestation.aggregation_bits, true)?;
    let epoch_root = get_block_root(state, data.target.epoch)?;
    let slot_root = get_block_root_at_slot(state, data.slot)?;

    // Per-validator accounting the epoch transition reads instead of
    // rescanning every pending attestation.
    let validator_count = state.validators.len();
    let caches = if is_current_attestation {
        &mut state.current_epoch_caches
    } else {
        &mut state.previous_epoch_caches
    };
    caches.ensure(validator_count);

    for index in &indices {
        let index = *index as usize;

        let known_delay = caches.min_inclusion_delay[index]
            .as_ref()
            .map(|attestation| attestation.inclusion_delay);
        if known_delay.map_or(true, |delay| delay > pending_attestation.inclusion_delay) {
            caches.min_inclusion_delay[index] = Some(pending_attestation.clone());
        }

        caches.matching_source[index] = true;
        if data.target.root != epoch_root {
            continue;
        }
        caches.matching_target[index] = true;
        if data.beacon_block_root == slot_root {
            caches.matching_head[index] = true;
        }
    }

    Ok(indices)
}

fn process_attestation_post_altair<C: Config>(
    state: &mut BeaconState<C>,
    attestation: &Attestation<C>,
    base_reward_per_increment: Gwei,
) -> Result<Vec<ValidatorIndex>, Error> {
    let data = &attestation.data;
    let inclusion_delay = state.slot - data.slot;

    let participation_flag_indices =
        get_attestation_participation_flag_indices(state, data, inclusion_delay)?;
    let attesting_indices =
        get_attesting_indices(state, data, &attestation.aggregation_bits, true)?;

    let is_current_epoch = data.target.epoch == get_current_epoch(state);
    let mut proposer_reward_numerator = 0;

    for attester_index in &attesting_indices {
        let base_reward = get_base_reward(state, *attester_index, base_reward_per_increment)?;

        for (flag_index, weight) in C::participation_flag_weights().iter().enumerate() {
            let participation = if is_current_epoch {
                &mut state.current_epoch_participation
            } else {
                &mut state.previous_epoch_participation
            };
            let flags = participation
                .get_mut(*attester_index as usize)
                .ok_or(Error::StateAccessor(
                    helper_functions::error::Error::IndexOutOfRange,
                ))?;

            if !participation_flag_indices.contains(&flag_index) || flags.has_flag(flag_index) {
                continue;
            }
            *flags = flags.add_flag(flag_index);
            proposer_reward_numerator += base_reward * weight;
        }
    }

    let proposer_index = get_beacon_proposer_index(state)?;
    let proposer_reward_denominator = (C::weight_denominator() - C::proposer_weight())
        * C::weight_denominator()
        / C::proposer_weight();
    let reward = proposer_reward_numerator / proposer_reward_denominator;
    increase_balance(state, proposer_index, reward)?;

    Ok(attesting_indices)
}
