use typenum::marker_traits::Unsigned;
use types::beacon_state::BeaconState;
use types::config::Config;
use types::consts;
use types::primitives::*;
use types::types::{ExecutionPayload, ExecutionPayloadHeader, KzgCommitment};

use helper_functions::{
    beacon_state_accessors::{
        get_current_epoch, get_expected_withdrawals, get_randao_mix,
    },
    beacon_state_mutators::decrease_balance,
    crypto::{hash, hash_tree_root},
    misc::compute_timestamp_at_slot,
    predicates::is_merge_transition_complete,
};

use crate::{error::Error, ValidationMode};

/// Derives the payload header stored on the state. The transactions root is
/// a two-level byte-list merkleization, not a plain SSZ hash of the list.
pub fn payload_header_of<C: Config>(
    payload: &ExecutionPayload<C>,
) -> Result<ExecutionPayloadHeader, Error> {
    let transactions = payload
        .transactions
        .iter()
        .map(|transaction| &transaction[..])
        .collect::<Vec<_>>();
    let transactions_root = merkle_tree::transactions_list_root(
        &transactions,
        C::MaxBytesPerTransaction::to_u64(),
        C::MaxTransactionsPerPayload::to_u64(),
    )
    .map_err(|_| Error::PayloadMismatch)?;

    Ok(ExecutionPayloadHeader {
        parent_hash: payload.parent_hash,
        fee_recipient: payload.fee_recipient,
        state_root: payload.state_root,
        receipts_root: payload.receipts_root,
        logs_bloom: payload.logs_bloom.clone(),
        prev_randao: payload.prev_randao,
        block_number: payload.block_number,
        gas_limit: payload.gas_limit,
        gas_used: payload.gas_used,
        timestamp: payload.timestamp,
        extra_data: payload.extra_data.clone(),
        base_fee_per_gas: payload.base_fee_per_gas,
        block_hash: payload.block_hash,
        transactions_root,
        withdrawals_root: hash_tree_root(&payload.withdrawals),
    })
}

pub fn process_execution_payload<C: Config>(
    state: &mut BeaconState<C>,
    payload: &ExecutionPayload<C>,
) -> Result<(), Error> {
    if is_merge_transition_complete(state)
        && payload.parent_hash != state.latest_execution_payload_header.block_hash
    {
        return Err(Error::PayloadMismatch);
    }
    if payload.prev_randao != get_randao_mix(state, get_current_epoch(state))? {
        return Err(Error::PayloadMismatch);
    }
    if payload.timestamp != compute_timestamp_at_slot(state, state.slot) {
        return Err(Error::PayloadMismatch);
    }

    state.latest_execution_payload_header = payload_header_of(payload)?;
    Ok(())
}

pub fn process_withdrawals<C: Config>(
    state: &mut BeaconState<C>,
    payload: &ExecutionPayload<C>,
    mode: ValidationMode,
) -> Result<(), Error> {
    let withdrawals = &payload.withdrawals;

    if mode.is_full() {
        let expected = get_expected_withdrawals(state);
        if expected.len() != withdrawals.len()
            || expected.iter().zip(withdrawals.iter()).any(|(a, b)| a != b)
        {
            return Err(Error::WithdrawalMismatch);
        }
    }

    for withdrawal in withdrawals.iter() {
        decrease_balance(state, withdrawal.validator_index, withdrawal.amount)?;
    }

    let validator_count = state.validators.len() as u64;
    if validator_count == 0 {
        return Ok(());
    }

    if let Some(last) = withdrawals.last() {
        state.next_withdrawal_index = last.index + 1;
    }
    if withdrawals.len() == C::MaxWithdrawalsPerPayload::to_usize() {
        let last = withdrawals
            .last()
            .expect("the list was just checked to be at its non-zero maximum");
        state.next_withdrawal_validator_index = (last.validator_index + 1) % validator_count;
    } else {
        state.next_withdrawal_validator_index = (state.next_withdrawal_validator_index
            + C::max_validators_per_withdrawals_sweep())
            % validator_count;
    }
    Ok(())
}

pub fn kzg_commitment_to_versioned_hash(commitment: &KzgCommitment) -> H256 {
    let mut versioned_hash = [0; 32];
    versioned_hash.copy_from_slice(&hash(commitment.as_bytes()));
    versioned_hash[0] = consts::VERSIONED_HASH_VERSION_KZG;
    H256::from(versioned_hash)
}

fn read_offset(bytes: &[u8], position: usize) -> Result<usize, Error> {
    let raw = bytes.get(position..position + 4).ok_or(Error::KzgMismatch)?;
    let mut offset = [0; 4];
    offset.copy_from_slice(raw);
    Ok(u32::from_le_bytes(offset) as usize)
}

/// The versioned hashes committed to by a blob transaction, read straight
/// from the SSZ offsets of the signed transaction envelope.
fn tx_peek_blob_versioned_hashes(transaction: &[u8]) -> Result<Vec<H256>, Error> {
    let message_offset = 1 + read_offset(transaction, 1)?;
    let hashes_offset = message_offset
        + read_offset(
            transaction,
            message_offset + consts::BLOB_TX_VERSIONED_HASHES_OFFSET,
        )?;
    if hashes_offset > transaction.len() || (transaction.len() - hashes_offset) % 32 != 0 {
        return Err(Error::KzgMismatch);
    }

    Ok(transaction[hashes_offset..]
        .chunks(32)
        .map(H256::from_slice)
        .collect())
}

/// Cross-checks the blob commitments carried by the block against the
/// versioned hashes declared by the payload's blob transactions.
pub fn verify_kzg_commitments_against_transactions<C: Config>(
    payload: &ExecutionPayload<C>,
    kzg_commitments: &[KzgCommitment],
    mode: ValidationMode,
) -> Result<(), Error> {
    if !mode.is_full() {
        return Ok(());
    }

    let mut transaction_versioned_hashes = Vec::new();
    for transaction in payload.transactions.iter() {
        if transaction.first() != Some(&C::blob_tx_type()) {
            continue;
        }
        transaction_versioned_hashes.extend(tx_peek_blob_versioned_hashes(transaction)?);
    }

    let commitment_versioned_hashes = kzg_commitments
        .iter()
        .map(kzg_commitment_to_versioned_hash)
        .collect::<Vec<_>>();

    if transaction_versioned_hashes != commitment_versioned_hashes {
        return Err(Error::KzgMismatch);
    }
    Ok(())
}
