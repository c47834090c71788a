use core::fmt::Debug;

use typenum::marker_traits::Unsigned;

use crate::consts;
use crate::primitives::{DomainType, Epoch, Gwei, Slot, Version};

/// Compile-time chain parameters.
///
/// SSZ list and vector lengths are associated `typenum` types so container
/// types can be sized by the compiler; everything that never sizes a
/// container is a plain constant function. The defaults are the mainnet
/// values; `MinimalConfig` overrides the handful that differ.
pub trait Config: Clone + PartialEq + Eq + Debug + Default + Send + Sync + 'static {
    type EpochsPerHistoricalVector: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type EpochsPerSlashingsVector: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type HistoricalRootsLimit: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxAttestations: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxAttestationsPerEpoch: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxAttesterSlashings: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxBlobCommitmentsPerBlock: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxBlsToExecutionChanges: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxBytesPerTransaction: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxDeposits: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxProposerSlashings: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxTransactionsPerPayload: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxValidatorsPerCommittee: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxVoluntaryExits: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type MaxWithdrawalsPerPayload: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type SlotsPerEpoch: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type SlotsPerEth1VotingPeriod: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type SlotsPerHistoricalRoot: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type SyncCommitteeSize: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;
    type ValidatorRegistryLimit: Unsigned + Clone + PartialEq + Eq + Debug + Default + Send + Sync;

    // Time
    fn seconds_per_slot() -> u64 {
        12
    }

    // Misc
    fn genesis_epoch() -> Epoch {
        consts::GENESIS_EPOCH
    }
    fn far_future_epoch() -> Epoch {
        consts::FAR_FUTURE_EPOCH
    }
    fn target_committee_size() -> u64 {
        128
    }
    fn max_committees_per_slot() -> u64 {
        64
    }
    fn shuffle_round_count() -> u8 {
        90
    }
    fn min_per_epoch_churn_limit() -> u64 {
        4
    }
    fn churn_limit_quotient() -> u64 {
        65_536
    }

    // Validator lifecycle
    fn min_attestation_inclusion_delay() -> Slot {
        1
    }
    fn min_seed_lookahead() -> Epoch {
        1
    }
    fn max_seed_lookahead() -> Epoch {
        4
    }
    fn min_validator_withdrawability_delay() -> Epoch {
        256
    }
    fn shard_committee_period() -> Epoch {
        256
    }

    // Balances
    fn effective_balance_increment() -> Gwei {
        1_000_000_000
    }
    fn max_effective_balance() -> Gwei {
        32_000_000_000
    }
    fn ejection_balance() -> Gwei {
        16_000_000_000
    }

    // Rewards and penalties
    fn base_reward_factor() -> u64 {
        64
    }
    fn whistleblower_reward_quotient() -> u64 {
        512
    }
    fn proposer_reward_quotient() -> u64 {
        8
    }
    fn min_slashing_penalty_quotient() -> u64 {
        128
    }
    fn min_slashing_penalty_quotient_altair() -> u64 {
        64
    }
    fn min_slashing_penalty_quotient_bellatrix() -> u64 {
        32
    }

    // Participation weights: timely source, timely target, timely head.
    fn participation_flag_weights() -> [u64; consts::PARTICIPATION_FLAG_COUNT] {
        [14, 26, 14]
    }
    fn proposer_weight() -> u64 {
        8
    }
    fn sync_reward_weight() -> u64 {
        2
    }
    fn weight_denominator() -> u64 {
        64
    }

    // Eth1 voting
    fn epochs_per_eth1_voting_period() -> u64 {
        64
    }

    // Withdrawals
    fn max_validators_per_withdrawals_sweep() -> u64 {
        16_384
    }
    fn bls_withdrawal_prefix_byte() -> u8 {
        0x00
    }
    fn eth1_address_withdrawal_prefix_byte() -> u8 {
        0x01
    }

    // Blobs
    fn blob_tx_type() -> u8 {
        0x03
    }

    // Fork schedule
    fn genesis_fork_version() -> Version {
        Version::from([0, 0, 0, 0])
    }
    fn altair_fork_version() -> Version {
        Version::from([1, 0, 0, 0])
    }
    fn bellatrix_fork_version() -> Version {
        Version::from([2, 0, 0, 0])
    }
    fn capella_fork_version() -> Version {
        Version::from([3, 0, 0, 0])
    }
    fn deneb_fork_version() -> Version {
        Version::from([4, 0, 0, 0])
    }
    fn altair_fork_epoch() -> Epoch {
        74_240
    }
    fn bellatrix_fork_epoch() -> Epoch {
        144_896
    }
    fn capella_fork_epoch() -> Epoch {
        194_048
    }
    fn deneb_fork_epoch() -> Epoch {
        269_568
    }

    // Signature domains
    fn domain_beacon_proposer() -> DomainType {
        [0, 0, 0, 0]
    }
    fn domain_beacon_attester() -> DomainType {
        [1, 0, 0, 0]
    }
    fn domain_randao() -> DomainType {
        [2, 0, 0, 0]
    }
    fn domain_deposit() -> DomainType {
        [3, 0, 0, 0]
    }
    fn domain_voluntary_exit() -> DomainType {
        [4, 0, 0, 0]
    }
    fn domain_sync_committee() -> DomainType {
        [7, 0, 0, 0]
    }
    fn domain_bls_to_execution_change() -> DomainType {
        [10, 0, 0, 0]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MainnetConfig;

impl Config for MainnetConfig {
    type EpochsPerHistoricalVector = typenum::U65536;
    type EpochsPerSlashingsVector = typenum::U8192;
    type HistoricalRootsLimit = typenum::U16777216;
    type MaxAttestations = typenum::U128;
    type MaxAttestationsPerEpoch = typenum::U4096;
    type MaxAttesterSlashings = typenum::U2;
    type MaxBlobCommitmentsPerBlock = typenum::U4096;
    type MaxBlsToExecutionChanges = typenum::U16;
    type MaxBytesPerTransaction = typenum::U33554432;
    type MaxDeposits = typenum::U16;
    type MaxProposerSlashings = typenum::U16;
    type MaxTransactionsPerPayload = typenum::U1048576;
    type MaxValidatorsPerCommittee = typenum::U2048;
    type MaxVoluntaryExits = typenum::U16;
    type MaxWithdrawalsPerPayload = typenum::U16;
    type SlotsPerEpoch = typenum::U32;
    type SlotsPerEth1VotingPeriod = typenum::U2048;
    type SlotsPerHistoricalRoot = typenum::U8192;
    type SyncCommitteeSize = typenum::U512;
    type ValidatorRegistryLimit = typenum::U1099511627776;
}

/// The test configuration: small committees, short vectors, forks never
/// scheduled (tests trigger upgrades explicitly).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MinimalConfig;

impl Config for MinimalConfig {
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

    fn seconds_per_slot() -> u64 {
        6
    }
    fn target_committee_size() -> u64 {
        4
    }
    fn max_committees_per_slot() -> u64 {
        4
    }
    fn shuffle_round_count() -> u8 {
        10
    }
    fn churn_limit_quotient() -> u64 {
        32
    }
    fn shard_committee_period() -> Epoch {
        64
    }
    fn epochs_per_eth1_voting_period() -> u64 {
        4
    }
    fn max_validators_per_withdrawals_sweep() -> u64 {
        16
    }
    fn genesis_fork_version() -> Version {
        Version::from([0, 0, 0, 1])
    }
    fn altair_fork_version() -> Version {
        Version::from([1, 0, 0, 1])
    }
    fn bellatrix_fork_version() -> Version {
        Version::from([2, 0, 0, 1])
    }
    fn capella_fork_version() -> Version {
        Version::from([3, 0, 0, 1])
    }
    fn deneb_fork_version() -> Version {
        Version::from([4, 0, 0, 1])
    }
    fn altair_fork_epoch() -> Epoch {
        consts::FAR_FUTURE_EPOCH
    }
    fn bellatrix_fork_epoch() -> Epoch {
        consts::FAR_FUTURE_EPOCH
    }
    fn capella_fork_epoch() -> Epoch {
        consts::FAR_FUTURE_EPOCH
    }
    fn deneb_fork_epoch() -> Epoch {
        consts::FAR_FUTURE_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth1_voting_period_matches_slot_list_length() {
        assert_eq!(
            MainnetConfig::epochs_per_eth1_voting_period()
                * <MainnetConfig as Config>::SlotsPerEpoch::to_u64(),
            <MainnetConfig as Config>::SlotsPerEth1VotingPeriod::to_u64(),
        );
        assert_eq!(
            MinimalConfig::epochs_per_eth1_voting_period()
                * <MinimalConfig as Config>::SlotsPerEpoch::to_u64(),
            <MinimalConfig as Config>::SlotsPerEth1VotingPeriod::to_u64(),
        );
    }
}
