use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::{config::*, consts, primitives::*, types::*};

/// Which fork's rules the state is currently operating under.
///
/// The tag is bookkeeping, not consensus data: it is excluded from SSZ and
/// from the state root.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ForkId {
    Phase0,
    Altair,
    Bellatrix,
    Capella,
    Deneb,
}

impl Default for ForkId {
    fn default() -> Self {
        ForkId::Phase0
    }
}

/// Per-validator attestation bookkeeping kept alongside the phase0 pending
/// attestation lists. Mirrors the pending attestations, so it is not part of
/// the state root either; it only exists to make the epoch transition cheap.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct AttesterCaches<C: Config> {
    pub min_inclusion_delay: Vec<Option<PendingAttestation<C>>>,
    pub matching_source: Vec<bool>,
    pub matching_target: Vec<bool>,
    pub matching_head: Vec<bool>,
}

impl<C: Config> AttesterCaches<C> {
    /// Grows the cache vectors to cover `validator_count` validators.
    pub fn ensure(&mut self, validator_count: usize) {
        if self.matching_source.len() < validator_count {
            self.min_inclusion_delay.resize(validator_count, None);
            self.matching_source.resize(validator_count, false);
            self.matching_target.resize(validator_count, false);
            self.matching_head.resize(validator_count, false);
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, Encode, Decode, TreeHash)]
pub struct BeaconState<C: Config> {
    // Versioning
    pub genesis_time: UnixSeconds,
    pub genesis_validators_root: H256,
    pub slot: Slot,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub historical_roots: VariableList<H256, C::HistoricalRootsLimit>,

    // Eth1
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, C::SlotsPerEth1VotingPeriod>,
    pub eth1_deposit_index: u64,

    // Registry
    pub validators: VariableList<Validator, C::ValidatorRegistryLimit>,
    pub balances: VariableList<Gwei, C::ValidatorRegistryLimit>,

    // Shuffling
    pub randao_mixes: FixedVector<H256, C::EpochsPerHistoricalVector>,

    // Slashings
    pub slashings: FixedVector<Gwei, C::EpochsPerSlashingsVector>,

    // Attestations (phase0 only; empty from Altair on)
    pub previous_epoch_attestations:
        VariableList<PendingAttestation<C>, C::MaxAttestationsPerEpoch>,
    pub current_epoch_attestations: VariableList<PendingAttestation<C>, C::MaxAttestationsPerEpoch>,

    // Participation (Altair on; empty before)
    pub previous_epoch_participation: VariableList<ParticipationFlags, C::ValidatorRegistryLimit>,
    pub current_epoch_participation: VariableList<ParticipationFlags, C::ValidatorRegistryLimit>,

    // Finality
    pub justification_bits: BitVector<consts::JustificationBitsLength>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,

    // Inactivity (Altair on)
    pub inactivity_scores: VariableList<u64, C::ValidatorRegistryLimit>,

    // Sync committees (Altair on)
    pub current_sync_committee: SyncCommittee<C>,
    pub next_sync_committee: SyncCommittee<C>,

    // Execution (Bellatrix on)
    pub latest_execution_payload_header: ExecutionPayloadHeader,

    // Withdrawals (Capella on)
    pub next_withdrawal_index: WithdrawalIndex,
    pub next_withdrawal_validator_index: ValidatorIndex,

    // Bookkeeping, excluded from serialization and hashing
    #[ssz(skip_serializing, skip_deserializing)]
    #[tree_hash(skip_hashing)]
    pub version: ForkId,
    #[ssz(skip_serializing, skip_deserializing)]
    #[tree_hash(skip_hashing)]
    pub previous_epoch_caches: AttesterCaches<C>,
    #[ssz(skip_serializing, skip_deserializing)]
    #[tree_hash(skip_hashing)]
    pub current_epoch_caches: AttesterCaches<C>,
}

impl<C: Config> BeaconState<C> {
    /// Linear scan of the registry; deposits and sync committees both need
    /// this lookup and the registry order is the index order.
    pub fn validator_index_by_pubkey(&self, pubkey: &PublicKeyBytes) -> Option<ValidatorIndex> {
        self.validators
            .iter()
            .position(|validator| validator.pubkey == *pubkey)
            .map(|index| index as ValidatorIndex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_ids_are_ordered() {
        assert!(ForkId::Phase0 < ForkId::Altair);
        assert!(ForkId::Altair < ForkId::Bellatrix);
        assert!(ForkId::Bellatrix < ForkId::Capella);
        assert!(ForkId::Capella < ForkId::Deneb);
    }

    #[test]
    fn validator_index_by_pubkey_finds_registered_key() {
        let pubkey = PublicKeyBytes::from([3; 48]);
        let state: BeaconState<MinimalConfig> = BeaconState {
            validators: VariableList::from(vec![
                Validator::default(),
                Validator {
                    pubkey,
                    ..Validator::default()
                },
            ]),
            ..BeaconState::default()
        };

        assert_eq!(state.validator_index_by_pubkey(&pubkey), Some(1));
        assert_eq!(
            state.validator_index_by_pubkey(&PublicKeyBytes::from([4; 48])),
            None,
        );
    }

    #[test]
    fn attester_caches_grow_and_keep_entries() {
        let mut caches = AttesterCaches::<MinimalConfig>::default();
        caches.ensure(2);
        caches.matching_source[1] = true;
        caches.ensure(4);
        assert!(caches.matching_source[1]);
        assert_eq!(caches.matching_source.len(), 4);
    }
}
