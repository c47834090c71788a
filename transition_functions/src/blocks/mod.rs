pub mod block_processing;
pub mod execution_payload;
pub mod fork_upgrades;
