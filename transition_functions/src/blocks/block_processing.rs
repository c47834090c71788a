use std::cmp;

use itertools::{EitherOrBoth, Itertools};
use typenum::marker_traits::Unsigned;
use types::beacon_state::{BeaconState, ForkId};
use types::config::Config;
use types::consts::DEPOSIT_CONTRACT_TREE_DEPTH;
use types::primitives::*;
use types::types::{
    AttesterSlashing, BeaconBlock, BeaconBlockBody, BeaconBlockHeader, Deposit, DepositMessage,
    ProposerSlashing, SignedBlsToExecutionChange, SignedVoluntaryExit, SyncAggregate, Validator,
};

use helper_functions::{
    beacon_state_accessors::{
        get_beacon_proposer_index, get_current_epoch, get_domain, get_randao_mix,
        get_sync_rewards,
    },
    beacon_state_mutators::{
        decrease_balance, increase_balance, initiate_validator_exit, slash_validator,
    },
    crypto::{bls_verify, bls_verify_aggregate, hash, hash_tree_root},
    math::xor_hashes,
    misc::{compute_domain, compute_epoch_at_slot, compute_signing_root},
    predicates::{
        is_active_validator, is_slashable_attestation_data, is_slashable_validator,
        is_valid_indexed_attestation, is_valid_merkle_branch,
    },
};

use crate::{
    attestations::process_attestations,
    blocks::execution_payload::{
        process_execution_payload, process_withdrawals,
        verify_kzg_commitments_against_transactions,
    },
    error::{Error, ExitInvalid},
    ValidationMode,
};

/// Applies a block to a state already advanced to the block's slot,
/// dispatching every operation in canonical order.
pub fn process_block<C: Config>(
    state: &mut BeaconState<C>,
    block: &BeaconBlock<C>,
    mode: ValidationMode,
) -> Result<(), Error> {
    process_block_header(state, block, mode)?;
    // The payload steps run before randao: the payload's prev_randao is
    // checked against the mix that process_randao overwrites.
    if state.version >= ForkId::Capella {
        process_withdrawals(state, &block.body.execution_payload, mode)?;
    }
    if state.version >= ForkId::Bellatrix {
        if state.version >= ForkId::Deneb {
            verify_kzg_commitments_against_transactions(
                &block.body.execution_payload,
                &block.body.blob_kzg_commitments,
                mode,
            )?;
        }
        process_execution_payload(state, &block.body.execution_payload)?;
    }
    process_randao(state, &block.body, block.proposer_index, mode)?;
    process_eth1_data(state, &block.body)?;
    process_operations(state, &block.body, mode)?;
    if state.version >= ForkId::Altair {
        process_sync_aggregate(state, &block.body.sync_aggregate, mode)?;
    }
    Ok(())
}

pub fn process_block_header<C: Config>(
    state: &mut BeaconState<C>,
    block: &BeaconBlock<C>,
    mode: ValidationMode,
) -> Result<(), Error> {
    if mode.is_full() {
        if block.slot != state.slot {
            return Err(Error::InvalidHeader);
        }
        if block.slot <= state.latest_block_header.slot {
            return Err(Error::InvalidHeader);
        }
        if block.proposer_index != get_beacon_proposer_index(state)? {
            return Err(Error::InvalidHeader);
        }
        if block.parent_root != hash_tree_root(&state.latest_block_header) {
            return Err(Error::InvalidHeader);
        }
    }

    state.latest_block_header = BeaconBlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        // Zeroed here and backfilled by the next slot transition.
        state_root: H256::zero(),
        body_root: hash_tree_root(&block.body),
    };

    let proposer = state
        .validators
        .get(block.proposer_index as usize)
        .ok_or(Error::InvalidHeader)?;
    if proposer.slashed {
        return Err(Error::InvalidHeader);
    }
    Ok(())
}

pub fn process_randao<C: Config>(
    state: &mut BeaconState<C>,
    body: &BeaconBlockBody<C>,
    proposer_index: ValidatorIndex,
    mode: ValidationMode,
) -> Result<(), Error> {
    let epoch = get_current_epoch(state);

    if mode.is_full() {
        let proposer = state
            .validators
            .get(proposer_index as usize)
            .ok_or(Error::InvalidHeader)?;
        let domain = get_domain(state, C::domain_randao(), None);
        let signing_root = compute_signing_root(&epoch, domain);
        if !bls_verify(&proposer.pubkey, signing_root.as_bytes(), &body.randao_reveal)? {
            return Err(Error::InvalidSignature);
        }
    }

    let mix = xor_hashes(
        get_randao_mix(state, epoch)?,
        H256::from_slice(&hash(body.randao_reveal.as_bytes())),
    );
    let index = (epoch % C::EpochsPerHistoricalVector::to_u64()) as usize;
    state.randao_mixes[index] = mix;
    Ok(())
}

pub fn process_eth1_data<C: Config>(
    state: &mut BeaconState<C>,
    body: &BeaconBlockBody<C>,
) -> Result<(), Error> {
    state
        .eth1_data_votes
        .push(body.eth1_data)
        .map_err(|_| Error::ListOverflow)?;

    let num_votes = state
        .eth1_data_votes
        .iter()
        .filter(|vote| **vote == body.eth1_data)
        .count() as u64;
    if num_votes * 2 > C::epochs_per_eth1_voting_period() * C::SlotsPerEpoch::to_u64() {
        state.eth1_data = body.eth1_data;
    }
    Ok(())
}

fn process_operations<C: Config>(
    state: &mut BeaconState<C>,
    body: &BeaconBlockBody<C>,
    mode: ValidationMode,
) -> Result<(), Error> {
    // Outstanding deposits must be drained at the maximum rate.
    let outstanding = state
        .eth1_data
        .deposit_count
        .saturating_sub(state.eth1_deposit_index);
    let expected_deposits = cmp::min(C::MaxDeposits::to_u64(), outstanding);
    if body.deposits.len() as u64 != expected_deposits {
        return Err(Error::DepositCountMismatch);
    }

    for proposer_slashing in body.proposer_slashings.iter() {
        process_proposer_slashing(state, proposer_slashing, mode)?;
    }
    for attester_slashing in body.attester_slashings.iter() {
        process_attester_slashing(state, attester_slashing, mode)?;
    }
    process_attestations(state, &body.attestations, mode)?;
    for deposit in body.deposits.iter() {
        process_deposit(state, deposit, mode)?;
    }
    for voluntary_exit in body.voluntary_exits.iter() {
        process_voluntary_exit(state, voluntary_exit, mode)?;
    }
    if state.version >= ForkId::Capella {
        for change in body.bls_to_execution_changes.iter() {
            process_bls_to_execution_change(state, change, mode)?;
        }
    }
    Ok(())
}

pub fn process_proposer_slashing<C: Config>(
    state: &mut BeaconState<C>,
    proposer_slashing: &ProposerSlashing,
    mode: ValidationMode,
) -> Result<(), Error> {
    let header_1 = &proposer_slashing.signed_header_1.message;
    let header_2 = &proposer_slashing.signed_header_2.message;

    if header_1.slot != header_2.slot {
        return Err(Error::SlashingPrecondition);
    }
    if header_1.proposer_index != header_2.proposer_index {
        return Err(Error::SlashingPrecondition);
    }
    if hash_tree_root(header_1) == hash_tree_root(header_2) {
        return Err(Error::SlashingPrecondition);
    }

    let proposer = state
        .validators
        .get(header_1.proposer_index as usize)
        .ok_or(Error::SlashingPrecondition)?
        .clone();
    if !is_slashable_validator(&proposer, get_current_epoch(state)) {
        return Err(Error::SlashingPrecondition);
    }

    if mode.is_full() {
        for signed_header in &[
            &proposer_slashing.signed_header_1,
            &proposer_slashing.signed_header_2,
        ] {
            let domain = get_domain(
                state,
                C::domain_beacon_proposer(),
                Some(compute_epoch_at_slot::<C>(signed_header.message.slot)),
            );
            let signing_root = compute_signing_root(&signed_header.message, domain);
            if !bls_verify(
                &proposer.pubkey,
                signing_root.as_bytes(),
                &signed_header.signature,
            )? {
                return Err(Error::InvalidSignature);
            }
        }
    }

    slash_validator(state, header_1.proposer_index, None)?;
    Ok(())
}

pub fn process_attester_slashing<C: Config>(
    state: &mut BeaconState<C>,
    attester_slashing: &AttesterSlashing<C>,
    mode: ValidationMode,
) -> Result<(), Error> {
    let attestation_1 = &attester_slashing.attestation_1;
    let attestation_2 = &attester_slashing.attestation_2;

    if !is_slashable_attestation_data(&attestation_1.data, &attestation_2.data) {
        return Err(Error::SlashingPrecondition);
    }
    is_valid_indexed_attestation(state, attestation_1, mode.is_full())?;
    is_valid_indexed_attestation(state, attestation_2, mode.is_full())?;

    let current_epoch = get_current_epoch(state);
    let mut slashed_any = false;

    // Both index lists are strictly increasing, so a sorted merge finds the
    // intersection in one pass.
    let intersection = attestation_1
        .attesting_indices
        .iter()
        .merge_join_by(attestation_2.attesting_indices.iter(), |a, b| a.cmp(b))
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(index, _) => Some(*index),
            _ => None,
        })
        .collect::<Vec<_>>();

    for index in intersection {
        let validator = state
            .validators
            .get(index as usize)
            .ok_or(Error::SlashingPrecondition)?;
        if is_slashable_validator(validator, current_epoch) {
            slash_validator(state, index, None)?;
            slashed_any = true;
        }
    }

    if !slashed_any {
        return Err(Error::SlashingPrecondition);
    }
    Ok(())
}

pub fn process_deposit<C: Config>(
    state: &mut BeaconState<C>,
    deposit: &Deposit,
    mode: ValidationMode,
) -> Result<(), Error> {
    let deposit_leaf = hash_tree_root(&deposit.data);
    if mode.is_full()
        && !is_valid_merkle_branch(
            deposit_leaf,
            &deposit.proof,
            DEPOSIT_CONTRACT_TREE_DEPTH + 1,
            state.eth1_deposit_index,
            state.eth1_data.deposit_root,
        )
    {
        return Err(Error::InvalidMerkleProof);
    }

    // Deposits are consumed in order even when their signatures are bad.
    state.eth1_deposit_index += 1;

    let pubkey = deposit.data.pubkey;
    let amount = deposit.data.amount;
    if let Some(index) = state.validator_index_by_pubkey(&pubkey) {
        increase_balance(state, index, amount)?;
        return Ok(());
    }

    // Proof of possession; the deposit contract checks nothing, and deposits
    // are valid across forks, hence the bare genesis-version domain.
    let domain = compute_domain(
        C::domain_deposit(),
        C::genesis_fork_version(),
        H256::zero(),
    );
    let deposit_message = DepositMessage {
        pubkey,
        withdrawal_credentials: deposit.data.withdrawal_credentials,
        amount,
    };
    let signing_root = compute_signing_root(&deposit_message, domain);
    match bls_verify(&pubkey, signing_root.as_bytes(), &deposit.data.signature) {
        Ok(true) => {}
        Ok(false) => {
            // The sole silently ignored failure in the transition.
            log::debug!("skipping deposit with an invalid signature: {:?}", pubkey);
            return Ok(());
        }
        Err(_error) => return Err(Error::CryptoError),
    }

    state
        .validators
        .push(Validator {
            pubkey,
            withdrawal_credentials: deposit.data.withdrawal_credentials,
            effective_balance: cmp::min(
                amount - amount % C::effective_balance_increment(),
                C::max_effective_balance(),
            ),
            slashed: false,
            activation_eligibility_epoch: C::far_future_epoch(),
            activation_epoch: C::far_future_epoch(),
            exit_epoch: C::far_future_epoch(),
            withdrawable_epoch: C::far_future_epoch(),
        })
        .map_err(|_| Error::ListOverflow)?;
    state
        .balances
        .push(amount)
        .map_err(|_| Error::ListOverflow)?;

    if state.version >= ForkId::Altair {
        state
            .previous_epoch_participation
            .push(ParticipationFlags::default())
            .map_err(|_| Error::ListOverflow)?;
        state
            .current_epoch_participation
            .push(ParticipationFlags::default())
            .map_err(|_| Error::ListOverflow)?;
        state
            .inactivity_scores
            .push(0)
            .map_err(|_| Error::ListOverflow)?;
    }
    Ok(())
}

pub fn process_voluntary_exit<C: Config>(
    state: &mut BeaconState<C>,
    signed_exit: &SignedVoluntaryExit,
    mode: ValidationMode,
) -> Result<(), Error> {
    let exit = &signed_exit.message;
    let current_epoch = get_current_epoch(state);
    let validator = state
        .validators
        .get(exit.validator_index as usize)
        .ok_or(Error::ExitPrecondition(ExitInvalid::NotActive))?
        .clone();

    if !is_active_validator(&validator, current_epoch) {
        return Err(Error::ExitPrecondition(ExitInvalid::NotActive));
    }
    if validator.exit_epoch != C::far_future_epoch() {
        return Err(Error::ExitPrecondition(ExitInvalid::AlreadyExiting));
    }
    if current_epoch < exit.epoch {
        return Err(Error::ExitPrecondition(ExitInvalid::FutureEpoch));
    }
    if current_epoch < validator.activation_epoch + C::shard_committee_period() {
        return Err(Error::ExitPrecondition(ExitInvalid::TooRecent));
    }

    if mode.is_full() {
        let domain = get_domain(state, C::domain_voluntary_exit(), Some(exit.epoch));
        let signing_root = compute_signing_root(exit, domain);
        if !bls_verify(
            &validator.pubkey,
            signing_root.as_bytes(),
            &signed_exit.signature,
        )? {
            return Err(Error::InvalidSignature);
        }
    }

    initiate_validator_exit(state, exit.validator_index)?;
    Ok(())
}

pub fn process_bls_to_execution_change<C: Config>(
    state: &mut BeaconState<C>,
    signed_change: &SignedBlsToExecutionChange,
    mode: ValidationMode,
) -> Result<(), Error> {
    let change = &signed_change.message;
    let credentials = state
        .validators
        .get(change.validator_index as usize)
        .ok_or(Error::InvalidBlsToExecutionChange)?
        .withdrawal_credentials;

    if mode.is_full() {
        if credentials[0] != C::bls_withdrawal_prefix_byte() {
            return Err(Error::InvalidBlsToExecutionChange);
        }
        let hashed_pubkey = hash(change.from_bls_pubkey.as_bytes());
        if hashed_pubkey[1..] != credentials.as_bytes()[1..] {
            return Err(Error::InvalidBlsToExecutionChange);
        }

        let domain = compute_domain(
            C::domain_bls_to_execution_change(),
            C::genesis_fork_version(),
            state.genesis_validators_root,
        );
        let signing_root = compute_signing_root(change, domain);
        if !bls_verify(
            &change.from_bls_pubkey,
            signing_root.as_bytes(),
            &signed_change.signature,
        )? {
            return Err(Error::InvalidSignature);
        }
    }

    let mut rewritten = [0; 32];
    rewritten[0] = C::eth1_address_withdrawal_prefix_byte();
    rewritten[12..].copy_from_slice(change.to_execution_address.as_bytes());
    state.validators[change.validator_index as usize].withdrawal_credentials =
        H256::from(rewritten);
    Ok(())
}

pub fn process_sync_aggregate<C: Config>(
    state: &mut BeaconState<C>,
    aggregate: &SyncAggregate<C>,
    mode: ValidationMode,
) -> Result<(), Error> {
    let committee_pubkeys = state.current_sync_committee.pubkeys.clone();
    if aggregate.sync_committee_bits.len() > committee_pubkeys.len() {
        return Err(Error::SyncAggregateSize);
    }

    let (participant_reward, proposer_reward) = get_sync_rewards(state)?;
    let proposer_index = get_beacon_proposer_index(state)?;

    let mut voted_keys = Vec::new();
    let mut earned_proposer_reward = 0;
    for (position, pubkey) in committee_pubkeys.iter().enumerate() {
        let validator_index = state
            .validator_index_by_pubkey(pubkey)
            .ok_or(Error::StateAccessor(
                helper_functions::error::Error::IndexOutOfRange,
            ))?;
        let voted = aggregate
            .sync_committee_bits
            .get(position)
            .map_err(|_| Error::SyncAggregateSize)?;
        if voted {
            voted_keys.push(*pubkey);
            increase_balance(state, validator_index, participant_reward)?;
            earned_proposer_reward += proposer_reward;
        } else {
            decrease_balance(state, validator_index, participant_reward)?;
        }
    }
    increase_balance(state, proposer_index, earned_proposer_reward)?;

    if mode.is_full() {
        let previous_slot = state.slot.saturating_sub(1);
        let domain = get_domain(
            state,
            C::domain_sync_committee(),
            Some(compute_epoch_at_slot::<C>(previous_slot)),
        );
        let block_root = helper_functions::beacon_state_accessors::get_block_root_at_slot(
            state,
            previous_slot,
        )?;
        let signing_root = compute_signing_root(&block_root, domain);

        if voted_keys.is_empty() {
            if aggregate.sync_committee_signature != SignatureBytes::infinity() {
                return Err(Error::InvalidSignature);
            }
        } else if !bls_verify_aggregate(
            &voted_keys,
            signing_root.as_bytes(),
            &aggregate.sync_committee_signature,
        )? {
            return Err(Error::InvalidSignature);
        }
    }
    Ok(())
}
