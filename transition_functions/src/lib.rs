pub mod attestations;
pub mod blocks;
pub mod epochs;
pub mod error;
pub mod process_slot;

pub use crate::error::Error;

/// How much of the block to cryptographically verify.
///
/// `Optimistic` skips BLS signature checks (and the Merkle and KZG
/// cross-checks that exist purely for validation) but performs every state
/// mutation identically, so an optimistically synced state matches a fully
/// validated one bit for bit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValidationMode {
    Full,
    Optimistic,
}

impl ValidationMode {
    pub fn is_full(self) -> bool {
        self == ValidationMode::Full
    }
}
