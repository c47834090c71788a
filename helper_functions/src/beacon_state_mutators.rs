use std::cmp;
use std::convert::TryFrom;

use typenum::marker_traits::Unsigned;
use types::beacon_state::{BeaconState, ForkId};
use types::config::Config;
use types::primitives::*;

use crate::{
    beacon_state_accessors::{
        get_beacon_proposer_index, get_current_epoch, get_validator_churn_limit,
    },
    error::Error,
    misc::compute_activation_exit_epoch,
};

pub fn increase_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    match usize::try_from(index) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => {
            let balance = state.balances.get_mut(id).ok_or(Error::IndexOutOfRange)?;
            *balance += delta;
            Ok(())
        }
    }
}

pub fn decrease_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    match usize::try_from(index) {
        Err(_err) => Err(Error::IndexOutOfRange),
        Ok(id) => {
            let balance = state.balances.get_mut(id).ok_or(Error::IndexOutOfRange)?;
            *balance = balance.saturating_sub(delta);
            Ok(())
        }
    }
}

/// Queues the validator for exit behind the churn limit. A validator whose
/// exit is already scheduled is left untouched.
pub fn initiate_validator_exit<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
) -> Result<(), Error> {
    let exit_epoch = state
        .validators
        .get(index as usize)
        .ok_or(Error::IndexOutOfRange)?
        .exit_epoch;
    if exit_epoch != C::far_future_epoch() {
        return Ok(());
    }

    let mut exit_queue_epoch = state
        .validators
        .iter()
        .map(|validator| validator.exit_epoch)
        .filter(|epoch| *epoch != C::far_future_epoch())
        .max()
        .unwrap_or(0);
    exit_queue_epoch = cmp::max(
        exit_queue_epoch,
        compute_activation_exit_epoch::<C>(get_current_epoch(state)),
    );

    let exit_queue_churn = state
        .validators
        .iter()
        .filter(|validator| validator.exit_epoch == exit_queue_epoch)
        .count() as u64;
    if exit_queue_churn >= get_validator_churn_limit(state) {
        exit_queue_epoch += 1;
    }

    let validator = &mut state.validators[index as usize];
    validator.exit_epoch = exit_queue_epoch;
    validator.withdrawable_epoch = exit_queue_epoch + C::min_validator_withdrawability_delay();
    Ok(())
}

/// Slashes the validator: forces its exit, burns the immediate penalty,
/// records the effective balance in the slashings ring, and pays the
/// whistleblower and the block proposer.
pub fn slash_validator<C: Config>(
    state: &mut BeaconState<C>,
    slashed_index: ValidatorIndex,
    whistleblower_index: Option<ValidatorIndex>,
) -> Result<(), Error> {
    let epoch = get_current_epoch(state);
    initiate_validator_exit(state, slashed_index)?;

    let effective_balance = {
        let validator = state
            .validators
            .get_mut(slashed_index as usize)
            .ok_or(Error::IndexOutOfRange)?;
        validator.slashed = true;
        validator.withdrawable_epoch = cmp::max(
            validator.withdrawable_epoch,
            epoch + C::EpochsPerSlashingsVector::to_u64(),
        );
        validator.effective_balance
    };

    let slashings_index = (epoch % C::EpochsPerSlashingsVector::to_u64()) as usize;
    state.slashings[slashings_index] += effective_balance;

    let penalty_quotient = match state.version {
        ForkId::Phase0 => C::min_slashing_penalty_quotient(),
        ForkId::Altair => C::min_slashing_penalty_quotient_altair(),
        _ => C::min_slashing_penalty_quotient_bellatrix(),
    };
    decrease_balance(state, slashed_index, effective_balance / penalty_quotient)?;

    let proposer_index = get_beacon_proposer_index(state)?;
    let whistleblower_index = whistleblower_index.unwrap_or(proposer_index);
    let whistleblower_reward = effective_balance / C::whistleblower_reward_quotient();
    let proposer_reward = match state.version {
        ForkId::Phase0 => whistleblower_reward / C::proposer_reward_quotient(),
        _ => whistleblower_reward * C::proposer_weight() / C::weight_denominator(),
    };
    increase_balance(state, proposer_index, proposer_reward)?;
    increase_balance(
        state,
        whistleblower_index,
        whistleblower_reward - proposer_reward,
    )?;
    Ok(())
}
