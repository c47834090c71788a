use ssz_types::VariableList;
use types::beacon_state::{BeaconState, ForkId};
use types::config::Config;
use types::primitives::ParticipationFlags;
use types::types::{ExecutionPayloadHeader, Fork};

use helper_functions::beacon_state_accessors::get_current_epoch;

use crate::error::Error;

fn bump_fork<C: Config>(state: &mut BeaconState<C>, current_version: types::primitives::Version) {
    state.fork = Fork {
        previous_version: state.fork.current_version,
        current_version,
        epoch: get_current_epoch(state),
    };
}

/// Swaps the pending-attestation accounting for participation flags and
/// inactivity scores.
pub fn upgrade_to_altair<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    if state.version != ForkId::Phase0 {
        return Err(Error::ConfigError);
    }
    bump_fork(state, C::altair_fork_version());

    let zero_flags = vec![ParticipationFlags::default(); state.validators.len()];
    state.previous_epoch_participation =
        VariableList::from(zero_flags.clone());
    state.current_epoch_participation = VariableList::from(zero_flags);
    state.inactivity_scores = VariableList::from(vec![0; state.validators.len()]);

    state.previous_epoch_attestations = Default::default();
    state.current_epoch_attestations = Default::default();
    state.previous_epoch_caches = Default::default();
    state.current_epoch_caches = Default::default();

    state.version = ForkId::Altair;
    log::info!("upgraded state to altair at epoch {}", state.fork.epoch);
    Ok(())
}

pub fn upgrade_to_bellatrix<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    if state.version != ForkId::Altair {
        return Err(Error::ConfigError);
    }
    bump_fork(state, C::bellatrix_fork_version());
    state.latest_execution_payload_header = ExecutionPayloadHeader::default();
    state.version = ForkId::Bellatrix;
    log::info!("upgraded state to bellatrix at epoch {}", state.fork.epoch);
    Ok(())
}

pub fn upgrade_to_capella<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    if state.version != ForkId::Bellatrix {
        return Err(Error::ConfigError);
    }
    bump_fork(state, C::capella_fork_version());
    state.next_withdrawal_index = 0;
    state.next_withdrawal_validator_index = 0;
    state.version = ForkId::Capella;
    log::info!("upgraded state to capella at epoch {}", state.fork.epoch);
    Ok(())
}

pub fn upgrade_to_deneb<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    if state.version != ForkId::Capella {
        return Err(Error::ConfigError);
    }
    bump_fork(state, C::deneb_fork_version());
    state.version = ForkId::Deneb;
    log::info!("upgraded state to deneb at epoch {}", state.fork.epoch);
    Ok(())
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;
    use types::config::MinimalConfig;
    use types::types::Validator;

    use super::*;

    fn phase0_state() -> BeaconState<MinimalConfig> {
        BeaconState {
            validators: VariableList::from(vec![Validator::default(); 3]),
            ..BeaconState::default()
        }
    }

    #[test]
    fn upgrades_apply_in_order() {
        let mut state = phase0_state();
        upgrade_to_altair(&mut state).expect("state is phase0");
        upgrade_to_bellatrix(&mut state).expect("state is altair");
        upgrade_to_capella(&mut state).expect("state is bellatrix");
        upgrade_to_deneb(&mut state).expect("state is capella");
        assert_eq!(state.version, ForkId::Deneb);
        assert_eq!(
            state.fork.current_version,
            MinimalConfig::deneb_fork_version(),
        );
        assert_eq!(
            state.fork.previous_version,
            MinimalConfig::capella_fork_version(),
        );
    }

    #[test]
    fn out_of_order_upgrade_is_rejected() {
        let mut state = phase0_state();
        assert_eq!(upgrade_to_bellatrix(&mut state), Err(Error::ConfigError));
        upgrade_to_altair(&mut state).expect("state is phase0");
        assert_eq!(upgrade_to_altair(&mut state), Err(Error::ConfigError));
    }

    #[test]
    fn altair_upgrade_sizes_participation_to_the_registry() {
        let mut state = phase0_state();
        upgrade_to_altair(&mut state).expect("state is phase0");
        assert_eq!(state.previous_epoch_participation.len(), 3);
        assert_eq!(state.current_epoch_participation.len(), 3);
        assert_eq!(state.inactivity_scores.len(), 3);
        assert!(state.current_epoch_attestations.is_empty());
    }
}
