pub use crate::primitives::{Epoch, Slot};

pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
pub const JUSTIFICATION_BITS_LENGTH: usize = 4;
pub const DEPOSIT_CONTRACT_TREE_DEPTH: u64 = 32;
pub const FAR_FUTURE_EPOCH: Epoch = u64::max_value();

pub const TIMELY_SOURCE_FLAG_INDEX: usize = 0;
pub const TIMELY_TARGET_FLAG_INDEX: usize = 1;
pub const TIMELY_HEAD_FLAG_INDEX: usize = 2;
pub const PARTICIPATION_FLAG_COUNT: usize = 3;

pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

// Offset of the versioned-hash list offset inside a signed blob transaction
// message: chain_id (32) + nonce (8) + priority fee (32) + max fee (32) +
// gas (8) + to (4, offset) + value (32) + data (4, offset) +
// access_list (4, offset) + max_fee_per_data_gas (32) = 188 bytes.
pub const BLOB_TX_VERSIONED_HASHES_OFFSET: usize = 188;

pub type DepositContractTreeDepth = typenum::U32;
pub type JustificationBitsLength = typenum::U4;
pub type MaxExtraDataBytes = typenum::U32;
pub type BytesPerLogsBloom = typenum::U256;
