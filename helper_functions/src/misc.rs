use std::cmp::max;
use std::convert::TryFrom;

use tree_hash::TreeHash;
use typenum::marker_traits::Unsigned;
use types::beacon_state::BeaconState;
use types::config::Config;
use types::consts;
use types::primitives::*;
use types::types::{ForkData, SigningData};

use crate::{
    crypto::{hash, hash_tree_root},
    error::Error,
    math::{bytes_to_int, int_to_bytes},
};

pub fn compute_epoch_at_slot<C: Config>(slot: Slot) -> Epoch {
    slot / C::SlotsPerEpoch::to_u64()
}

pub fn compute_start_slot_at_epoch<C: Config>(epoch: Epoch) -> Slot {
    epoch * C::SlotsPerEpoch::to_u64()
}

pub fn compute_activation_exit_epoch<C: Config>(epoch: Epoch) -> Epoch {
    epoch + 1 + C::max_seed_lookahead()
}

pub fn compute_timestamp_at_slot<C: Config>(state: &BeaconState<C>, slot: Slot) -> UnixSeconds {
    state.genesis_time + (slot - consts::GENESIS_SLOT) * C::seconds_per_slot()
}

/// Swap-or-not shuffling of a single index.
pub fn compute_shuffled_index<C: Config>(
    mut index: ValidatorIndex,
    index_count: u64,
    seed: H256,
) -> Result<ValidatorIndex, Error> {
    if index >= index_count {
        return Err(Error::IndexOutOfRange);
    }
    for current_round in 0..C::shuffle_round_count() {
        let pivot = bytes_to_int(hash_seed_round(&seed, current_round)) % index_count;
        let flip = (pivot + index_count - index) % index_count;
        let position = max(index, flip);
        let source = hash_seed_round_position(&seed, current_round, position);
        let byte = source[((position % 256) / 8) as usize];
        let bit = (byte >> (position % 8)) % 2;
        index = if bit == 0 { index } else { flip };
    }
    Ok(index)
}

fn hash_seed_round(seed: &H256, current_round: u8) -> [u8; 8] {
    let mut input = seed.as_bytes().to_vec();
    input.push(current_round);
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&hash(&input)[..8]);
    bytes
}

fn hash_seed_round_position(seed: &H256, current_round: u8, position: u64) -> Vec<u8> {
    let mut input = seed.as_bytes().to_vec();
    input.push(current_round);
    input.append(&mut int_to_bytes(position / 256, 4));
    hash(&input)
}

/// The committee with number `index` out of `count` committees drawn from
/// the shuffling of `indices`.
pub fn compute_committee<C: Config>(
    indices: &[ValidatorIndex],
    seed: H256,
    index: u64,
    count: u64,
) -> Result<Vec<ValidatorIndex>, Error> {
    let total = indices.len() as u64;
    let start = total * index / count;
    let end = total * (index + 1) / count;

    let mut committee = Vec::with_capacity(usize::try_from(end - start).unwrap_or(0));
    for position in start..end {
        let shuffled = compute_shuffled_index::<C>(position, total, seed)?;
        committee.push(indices[shuffled as usize]);
    }
    Ok(committee)
}

/// Effective-balance-weighted proposer sampling over the shuffling.
pub fn compute_proposer_index<C: Config>(
    state: &BeaconState<C>,
    indices: &[ValidatorIndex],
    seed: H256,
) -> Result<ValidatorIndex, Error> {
    if indices.is_empty() {
        return Err(Error::NoActiveValidators);
    }
    let total = indices.len() as u64;
    let max_random_byte = u64::from(u8::max_value());

    let mut i = 0;
    loop {
        let shuffled = compute_shuffled_index::<C>(i % total, total, seed)?;
        let candidate_index = indices[shuffled as usize];

        let mut input = seed.as_bytes().to_vec();
        input.append(&mut int_to_bytes(i / 32, 8));
        let random_byte = u64::from(hash(&input)[(i % 32) as usize]);

        let effective_balance = state
            .validators
            .get(candidate_index as usize)
            .ok_or(Error::IndexOutOfRange)?
            .effective_balance;
        if effective_balance * max_random_byte >= C::max_effective_balance() * random_byte {
            return Ok(candidate_index);
        }
        i += 1;
    }
}

pub fn compute_fork_data_root(current_version: Version, genesis_validators_root: H256) -> H256 {
    hash_tree_root(&ForkData {
        current_version,
        genesis_validators_root,
    })
}

/// A 32-byte signature domain: the 4-byte domain type followed by the first
/// 28 bytes of the fork data root.
pub fn compute_domain(
    domain_type: DomainType,
    fork_version: Version,
    genesis_validators_root: H256,
) -> Domain {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0; 32];
    domain[..4].copy_from_slice(&domain_type);
    domain[4..].copy_from_slice(&fork_data_root.as_bytes()[..28]);
    H256::from(domain)
}

pub fn compute_signing_root<T: TreeHash>(object: &T, domain: Domain) -> H256 {
    hash_tree_root(&SigningData {
        object_root: hash_tree_root(object),
        domain,
    })
}
