use typenum::marker_traits::Unsigned;
use types::beacon_state::BeaconState;
use types::config::Config;
use types::primitives::{Slot, H256};
use types::types::SignedBeaconBlock;

use helper_functions::{
    beacon_state_accessors::{get_current_epoch, get_domain},
    crypto::{bls_verify, hash_tree_root},
    misc::compute_signing_root,
};

use crate::{
    blocks::{block_processing::process_block, fork_upgrades},
    epochs::EpochProcessor,
    error::Error,
    ValidationMode,
};

/// Runs a signed block through the full transition: slot advance, proposer
/// signature, block processing, state-root check. On any error the state is
/// tainted and must be discarded by the caller.
pub fn state_transition<C: Config, E: EpochProcessor<C>>(
    state: &mut BeaconState<C>,
    signed_block: &SignedBeaconBlock<C>,
    mode: ValidationMode,
    epoch_processor: &mut E,
) -> Result<(), Error> {
    let block = &signed_block.message;
    process_slots(state, block.slot, epoch_processor)?;

    if mode.is_full() {
        let proposer = state
            .validators
            .get(block.proposer_index as usize)
            .ok_or(Error::InvalidHeader)?;
        let domain = get_domain(state, C::domain_beacon_proposer(), None);
        let signing_root = compute_signing_root(block, domain);
        if !bls_verify(
            &proposer.pubkey,
            signing_root.as_bytes(),
            &signed_block.signature,
        )? {
            return Err(Error::InvalidSignature);
        }
    }

    process_block(state, block, mode)?;

    if mode.is_full() && block.state_root != hash_tree_root(state) {
        return Err(Error::InvalidHeader);
    }
    Ok(())
}

/// Advances the state through empty slots up to (but not including) `slot`,
/// firing the epoch hook at boundaries and applying scheduled fork upgrades.
pub fn process_slots<C: Config, E: EpochProcessor<C>>(
    state: &mut BeaconState<C>,
    slot: Slot,
    epoch_processor: &mut E,
) -> Result<(), Error> {
    if slot <= state.slot {
        return Err(Error::SlotOutOfOrder);
    }

    let slots_per_epoch = C::SlotsPerEpoch::to_u64();
    while state.slot < slot {
        transition_slot(state);
        // Process the epoch on the start slot of the next epoch.
        if (state.slot + 1) % slots_per_epoch == 0 {
            epoch_processor.process_epoch(state)?;
        }
        state.slot += 1;

        if state.slot % slots_per_epoch != 0 {
            continue;
        }
        let epoch = get_current_epoch(state);
        if epoch == C::altair_fork_epoch() {
            fork_upgrades::upgrade_to_altair(state)?;
        }
        if epoch == C::bellatrix_fork_epoch() {
            fork_upgrades::upgrade_to_bellatrix(state)?;
        }
        if epoch == C::capella_fork_epoch() {
            fork_upgrades::upgrade_to_capella(state)?;
        }
        if epoch == C::deneb_fork_epoch() {
            fork_upgrades::upgrade_to_deneb(state)?;
        }
    }
    Ok(())
}

fn transition_slot<C: Config>(state: &mut BeaconState<C>) {
    let previous_state_root = hash_tree_root(state);
    let roots_index = (state.slot % C::SlotsPerHistoricalRoot::to_u64()) as usize;
    state.state_roots[roots_index] = previous_state_root;

    if state.latest_block_header.state_root == H256::zero() {
        state.latest_block_header.state_root = previous_state_root;
    }

    let previous_block_root = hash_tree_root(&state.latest_block_header);
    state.block_roots[roots_index] = previous_block_root;
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;
    use types::beacon_state::ForkId;
    use types::config::{Config, MinimalConfig};
    use types::consts::FAR_FUTURE_EPOCH;
    use types::primitives::*;
    use types::types::{BeaconBlock, SignedBeaconBlock, Validator};

    use helper_functions::crypto::hash;
    use helper_functions::math::xor_hashes;

    use super::*;

    struct CountingEpochProcessor {
        invocations: usize,
    }

    impl<C: Config> EpochProcessor<C> for CountingEpochProcessor {
        fn process_epoch(&mut self, _state: &mut BeaconState<C>) -> Result<(), Error> {
            self.invocations += 1;
            Ok(())
        }
    }

    fn staked_validator(seed: u8) -> Validator {
        Validator {
            pubkey: PublicKeyBytes::from([seed; 48]),
            effective_balance: MinimalConfig::max_effective_balance(),
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        }
    }

    fn altair_state_at_slot(slot: Slot) -> BeaconState<MinimalConfig> {
        // The sync committee is left at its default (all-zero keys), which
        // resolves to validator 0; that validator's balance is kept at zero
        // so missed-participation penalties cannot move it.
        let mut validators = vec![Validator {
            effective_balance: MinimalConfig::max_effective_balance(),
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
            ..Validator::default()
        }];
        for seed in 1..8 {
            validators.push(staked_validator(seed));
        }
        let count = validators.len();

        let mut balances = vec![MinimalConfig::max_effective_balance(); count];
        balances[0] = 0;

        BeaconState {
            slot,
            version: ForkId::Altair,
            validators: VariableList::from(validators),
            balances: VariableList::from(balances),
            previous_epoch_participation: VariableList::from(vec![
                ParticipationFlags::default();
                count
            ]),
            current_epoch_participation: VariableList::from(vec![
                ParticipationFlags::default();
                count
            ]),
            inactivity_scores: VariableList::from(vec![0; count]),
            ..BeaconState::default()
        }
    }

    #[test]
    fn slots_advance_to_the_target() {
        let mut state: BeaconState<MinimalConfig> = BeaconState::default();
        let mut hook = CountingEpochProcessor { invocations: 0 };
        process_slots(&mut state, 1, &mut hook).expect("the target slot is ahead");
        assert_eq!(state.slot, 1);
    }

    #[test]
    fn a_stale_target_slot_is_rejected() {
        let mut state: BeaconState<MinimalConfig> = BeaconState {
            slot: 3,
            ..BeaconState::default()
        };
        let mut hook = CountingEpochProcessor { invocations: 0 };
        assert_eq!(
            process_slots(&mut state, 3, &mut hook),
            Err(Error::SlotOutOfOrder),
        );
        assert_eq!(
            process_slots(&mut state, 2, &mut hook),
            Err(Error::SlotOutOfOrder),
        );
    }

    #[test]
    fn the_epoch_hook_fires_once_per_boundary() {
        let slots_per_epoch = <MinimalConfig as Config>::SlotsPerEpoch::to_u64();
        let mut state: BeaconState<MinimalConfig> = BeaconState::default();
        let mut hook = CountingEpochProcessor { invocations: 0 };

        process_slots(&mut state, slots_per_epoch * 2 + 1, &mut hook)
            .expect("the target slot is ahead");
        assert_eq!(hook.invocations, 2);
    }

    #[test]
    fn slot_transition_backfills_the_header_state_root() {
        let mut state: BeaconState<MinimalConfig> = BeaconState::default();
        assert_eq!(state.latest_block_header.state_root, H256::zero());

        let mut hook = CountingEpochProcessor { invocations: 0 };
        process_slots(&mut state, 1, &mut hook).expect("the target slot is ahead");

        assert_ne!(state.latest_block_header.state_root, H256::zero());
        assert_eq!(state.state_roots[0], state.latest_block_header.state_root);
        assert_eq!(
            state.block_roots[0],
            hash_tree_root(&state.latest_block_header),
        );
    }

    #[test]
    fn scheduled_fork_upgrades_fire_at_their_epochs() {
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
        struct ForkAtOneConfig;

        impl Config for ForkAtOneConfig {
            type EpochsPerHistoricalVector = typenum::U64;
            type EpochsPerSlashingsVector = typenum::U64;
            type HistoricalRootsLimit = typenum::U16777216;
            type MaxAttestations = typenum::U128;
            type MaxAttestationsPerEpoch = typenum::U1024;
            type MaxAttesterSlashings = typenum::U2;
            type MaxBlobCommitmentsPerBlock = typenum::U16;
            type MaxBlsToExecutionChanges = typenum::U16;
            type MaxBytesPerTransaction = typenum::U33554432;
            type MaxDeposits = typenum::U16;
            type MaxProposerSlashings = typenum::U16;
            type MaxTransactionsPerPayload = typenum::U1048576;
            type MaxValidatorsPerCommittee = typenum::U2048;
            type MaxVoluntaryExits = typenum::U16;
            type MaxWithdrawalsPerPayload = typenum::U4;
            type SlotsPerEpoch = typenum::U8;
            type SlotsPerEth1VotingPeriod = typenum::U32;
            type SlotsPerHistoricalRoot = typenum::U64;
            type SyncCommitteeSize = typenum::U32;
            type ValidatorRegistryLimit = typenum::U1099511627776;

            fn altair_fork_epoch() -> Epoch {
                1
            }
            fn bellatrix_fork_epoch() -> Epoch {
                2
            }
            fn capella_fork_epoch() -> Epoch {
                FAR_FUTURE_EPOCH
            }
            fn deneb_fork_epoch() -> Epoch {
                FAR_FUTURE_EPOCH
            }
        }

        let mut state: BeaconState<ForkAtOneConfig> = BeaconState::default();
        let mut hook = CountingEpochProcessor { invocations: 0 };

        process_slots(&mut state, 8, &mut hook).expect("the target slot is ahead");
        assert_eq!(state.version, ForkId::Altair);
        assert_eq!(
            state.fork.current_version,
            ForkAtOneConfig::altair_fork_version(),
        );

        process_slots(&mut state, 16, &mut hook).expect("the target slot is ahead");
        assert_eq!(state.version, ForkId::Bellatrix);
    }

    #[test]
    fn empty_block_advance_mixes_randao_and_leaves_balances_alone() {
        let slots_per_epoch = <MinimalConfig as Config>::SlotsPerEpoch::to_u64();
        let pre_state = altair_state_at_slot(slots_per_epoch * 4 - 1);
        let balances_before = pre_state.balances.clone();
        let mix_before = pre_state.randao_mixes[4];

        let mut state = pre_state;
        let mut hook = CountingEpochProcessor { invocations: 0 };
        let block: BeaconBlock<MinimalConfig> = BeaconBlock {
            slot: slots_per_epoch * 4,
            ..BeaconBlock::default()
        };
        let signed_block = SignedBeaconBlock {
            message: block,
            ..SignedBeaconBlock::default()
        };

        state_transition(
            &mut state,
            &signed_block,
            ValidationMode::Optimistic,
            &mut hook,
        )
        .expect("an empty block applies cleanly");

        assert_eq!(state.slot, slots_per_epoch * 4);
        assert_eq!(hook.invocations, 1);
        assert_eq!(state.balances, balances_before);

        let reveal_hash =
            H256::from_slice(&hash(signed_block.message.body.randao_reveal.as_bytes()));
        assert_eq!(state.randao_mixes[4], xor_hashes(mix_before, reveal_hash));
    }

    #[test]
    fn a_successful_transition_leaves_the_state_at_the_block_slot() {
        let slots_per_epoch = <MinimalConfig as Config>::SlotsPerEpoch::to_u64();
        let mut state = altair_state_at_slot(slots_per_epoch - 1);
        let mut hook = CountingEpochProcessor { invocations: 0 };
        let signed_block: SignedBeaconBlock<MinimalConfig> = SignedBeaconBlock {
            message: BeaconBlock {
                slot: slots_per_epoch + 3,
                ..BeaconBlock::default()
            },
            ..SignedBeaconBlock::default()
        };

        state_transition(
            &mut state,
            &signed_block,
            ValidationMode::Optimistic,
            &mut hook,
        )
        .expect("an empty block applies cleanly");
        assert_eq!(state.slot, signed_block.message.slot);
    }
}
