use types::beacon_state::BeaconState;
use types::config::Config;

use crate::error::Error;

/// The epoch-boundary hook. Rewards, penalties, justification and
/// finalization live behind this seam; the slot driver only decides when to
/// call it.
pub trait EpochProcessor<C: Config> {
    fn process_epoch(&mut self, state: &mut BeaconState<C>) -> Result<(), Error>;
}

/// Stand-in used when the caller brings no epoch processing of its own.
#[derive(Clone, Copy, Default)]
pub struct NullEpochProcessor;

impl<C: Config> EpochProcessor<C> for NullEpochProcessor {
    fn process_epoch(&mut self, state: &mut BeaconState<C>) -> Result<(), Error> {
        log::debug!("crossing epoch boundary at slot {}", state.slot);
        Ok(())
    }
}
