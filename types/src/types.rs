use bls::PublicKeyBytes;
use ssz::{Decode, DecodeError, Encode};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitList, BitVector, FixedVector, VariableList};
use tree_hash::{Hash256, TreeHash, TreeHashType};
use tree_hash_derive::TreeHash;
use typenum::{Sum, U1};

use crate::config::*;
use crate::consts;
use crate::primitives::*;

/// Raw execution-layer transaction bytes.
pub type Transaction<C> = VariableList<u8, <C as Config>::MaxBytesPerTransaction>;

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct Attestation<C: Config> {
    pub aggregation_bits: BitList<C::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub signature: AggregateSignatureBytes,
}

impl<C: Config> Default for Attestation<C> {
    fn default() -> Self {
        Self {
            aggregation_bits: BitList::with_capacity(0)
                .expect("empty bitlist fits any length limit"),
            data: Default::default(),
            signature: Default::default(),
        }
    }
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Hash, Default, Encode, Decode, TreeHash,
)]
pub struct AttestationData {
    pub slot: Slot,
    pub index: CommitteeIndex,
    pub beacon_block_root: H256,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct AttesterSlashing<C: Config> {
    pub attestation_1: IndexedAttestation<C>,
    pub attestation_2: IndexedAttestation<C>,
}

#[derive(Clone, PartialEq, Debug, Default, Encode, Decode, TreeHash)]
pub struct BeaconBlock<C: Config> {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BeaconBlockBody<C>,
}

/// The block body carries every field of every fork; processors are gated on
/// the state version, so pre-fork blocks simply leave the later fields at
/// their defaults.
#[derive(Clone, PartialEq, Debug, Default, Encode, Decode, TreeHash)]
pub struct BeaconBlockBody<C: Config> {
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub graffiti: H256,
    pub proposer_slashings: VariableList<ProposerSlashing, C::MaxProposerSlashings>,
    pub attester_slashings: VariableList<AttesterSlashing<C>, C::MaxAttesterSlashings>,
    pub attestations: VariableList<Attestation<C>, C::MaxAttestations>,
    pub deposits: VariableList<Deposit, C::MaxDeposits>,
    pub voluntary_exits: VariableList<SignedVoluntaryExit, C::MaxVoluntaryExits>,
    pub sync_aggregate: SyncAggregate<C>,
    pub execution_payload: ExecutionPayload<C>,
    pub bls_to_execution_changes:
        VariableList<SignedBlsToExecutionChange, C::MaxBlsToExecutionChanges>,
    pub blob_kzg_commitments: VariableList<KzgCommitment, C::MaxBlobCommitmentsPerBlock>,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Encode, Decode, TreeHash,
)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: H256,
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct Deposit {
    pub proof: FixedVector<H256, Sum<consts::DepositContractTreeDepth, U1>>,
    pub data: DepositData,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash)]
pub struct DepositData {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub amount: Gwei,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash)]
pub struct DepositMessage {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub amount: Gwei,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct Eth1Data {
    pub deposit_root: H256,
    pub deposit_count: u64,
    pub block_hash: H256,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    pub epoch: Epoch,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct ForkData {
    pub current_version: Version,
    pub genesis_validators_root: H256,
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct IndexedAttestation<C: Config> {
    pub attesting_indices: VariableList<u64, C::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub signature: AggregateSignatureBytes,
}

impl<C: Config> Default for IndexedAttestation<C> {
    fn default() -> Self {
        Self {
            attesting_indices: Default::default(),
            data: Default::default(),
            signature: Default::default(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct PendingAttestation<C: Config> {
    pub aggregation_bits: BitList<C::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub inclusion_delay: u64,
    pub proposer_index: ValidatorIndex,
}

impl<C: Config> Default for PendingAttestation<C> {
    fn default() -> Self {
        Self {
            aggregation_bits: BitList::with_capacity(0)
                .expect("empty bitlist fits any length limit"),
            data: Default::default(),
            inclusion_delay: Default::default(),
            proposer_index: Default::default(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash)]
pub struct ProposerSlashing {
    pub signed_header_1: SignedBeaconBlockHeader,
    pub signed_header_2: SignedBeaconBlockHeader,
}

#[derive(Clone, PartialEq, Debug, Default, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlock<C: Config> {
    pub message: BeaconBlock<C>,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: SignatureBytes,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct SigningData {
    pub object_root: H256,
    pub domain: Domain,
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct SyncAggregate<C: Config> {
    pub sync_committee_bits: BitVector<C::SyncCommitteeSize>,
    pub sync_committee_signature: AggregateSignatureBytes,
}

impl<C: Config> Default for SyncAggregate<C> {
    fn default() -> Self {
        Self {
            sync_committee_bits: Default::default(),
            sync_committee_signature: Default::default(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct SyncCommittee<C: Config> {
    pub pubkeys: FixedVector<PublicKeyBytes, C::SyncCommitteeSize>,
    pub aggregate_pubkey: PublicKeyBytes,
}

impl<C: Config> Default for SyncCommittee<C> {
    fn default() -> Self {
        Self {
            pubkeys: Default::default(),
            aggregate_pubkey: Default::default(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash)]
pub struct Validator {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub effective_balance: Gwei,
    pub slashed: bool,
    pub activation_eligibility_epoch: Epoch,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
    pub withdrawable_epoch: Epoch,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct VoluntaryExit {
    pub epoch: Epoch,
    pub validator_index: ValidatorIndex,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct Withdrawal {
    pub index: WithdrawalIndex,
    pub validator_index: ValidatorIndex,
    pub address: ExecutionAddress,
    pub amount: Gwei,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct BlsToExecutionChange {
    pub validator_index: ValidatorIndex,
    pub from_bls_pubkey: PublicKeyBytes,
    pub to_execution_address: ExecutionAddress,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Encode, Decode, TreeHash,
)]
pub struct SignedBlsToExecutionChange {
    pub message: BlsToExecutionChange,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Debug, Encode, Decode, TreeHash)]
pub struct ExecutionPayload<C: Config> {
    pub parent_hash: H256,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: FixedVector<u8, consts::BytesPerLogsBloom>,
    pub prev_randao: H256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: UnixSeconds,
    pub extra_data: VariableList<u8, consts::MaxExtraDataBytes>,
    pub base_fee_per_gas: ethereum_types::U256,
    pub block_hash: H256,
    pub transactions: VariableList<Transaction<C>, C::MaxTransactionsPerPayload>,
    pub withdrawals: VariableList<Withdrawal, C::MaxWithdrawalsPerPayload>,
}

impl<C: Config> Default for ExecutionPayload<C> {
    fn default() -> Self {
        Self {
            parent_hash: Default::default(),
            fee_recipient: Default::default(),
            state_root: Default::default(),
            receipts_root: Default::default(),
            logs_bloom: Default::default(),
            prev_randao: Default::default(),
            block_number: Default::default(),
            gas_limit: Default::default(),
            gas_used: Default::default(),
            timestamp: Default::default(),
            extra_data: Default::default(),
            base_fee_per_gas: Default::default(),
            block_hash: Default::default(),
            transactions: Default::default(),
            withdrawals: Default::default(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, Encode, Decode, TreeHash)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: H256,
    pub fee_recipient: ExecutionAddress,
    pub state_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: FixedVector<u8, consts::BytesPerLogsBloom>,
    pub prev_randao: H256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: UnixSeconds,
    pub extra_data: VariableList<u8, consts::MaxExtraDataBytes>,
    pub base_fee_per_gas: ethereum_types::U256,
    pub block_hash: H256,
    pub transactions_root: H256,
    pub withdrawals_root: H256,
}

type KzgCommitmentAsArray = [u8; 48];

/// A KZG commitment to a blob, same length as a compressed G1 point.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct KzgCommitment(KzgCommitmentAsArray);

impl KzgCommitment {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for KzgCommitment {
    fn default() -> Self {
        Self([0; 48])
    }
}

impl From<KzgCommitmentAsArray> for KzgCommitment {
    fn from(array: KzgCommitmentAsArray) -> Self {
        Self(array)
    }
}

impl Encode for KzgCommitment {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        48
    }

    fn ssz_bytes_len(&self) -> usize {
        48
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl Decode for KzgCommitment {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        48
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != 48 {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 48,
            });
        }
        let mut array = [0; 48];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }
}

impl TreeHash for KzgCommitment {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::Vector
    }

    fn tree_hash_packed_encoding(&self) -> Vec<u8> {
        unreachable!("vectors are not packed")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("vectors are not packed")
    }

    fn tree_hash_root(&self) -> Hash256 {
        tree_hash::merkle_root(&self.0, 0)
    }
}
