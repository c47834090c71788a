use core::fmt;
use core::ops::Index;

use ethereum_types::H160;
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{Hash256, TreeHash, TreeHashType};

pub use bls::{PublicKeyBytes, SignatureBytes};
pub use ethereum_types::H256;

pub type AggregateSignatureBytes = SignatureBytes;
pub type CommitteeIndex = u64;
pub type Domain = H256;
pub type DomainType = [u8; 4];
pub type Epoch = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;
pub type WithdrawalIndex = u64;

type VersionAsArray = [u8; 4];

/// A fork version. Kept as a wrapper so SSZ and tree hashing can be
/// delegated to the underlying 4-byte array.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Version(VersionAsArray);

impl Version {
    pub fn as_array(&self) -> &VersionAsArray {
        &self.0
    }
}

impl From<VersionAsArray> for Version {
    fn from(array: VersionAsArray) -> Self {
        Self(array)
    }
}

impl From<Version> for VersionAsArray {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl Index<usize> for Version {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        self.0.index(index)
    }
}

impl Encode for Version {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        4
    }

    fn ssz_bytes_len(&self) -> usize {
        4
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
}

impl Decode for Version {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        4
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != 4 {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 4,
            });
        }
        let mut array = [0; 4];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }
}

impl TreeHash for Version {
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

type AddressAsArray = [u8; 20];

/// An execution-layer address.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionAddress(H160);

impl ExecutionAddress {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ExecutionAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{:?}", self.0)
    }
}

impl From<AddressAsArray> for ExecutionAddress {
    fn from(array: AddressAsArray) -> Self {
        Self(array.into())
    }
}

impl From<H160> for ExecutionAddress {
    fn from(hash: H160) -> Self {
        Self(hash)
    }
}

impl Encode for ExecutionAddress {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        20
    }

    fn ssz_bytes_len(&self) -> usize {
        20
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.0.as_bytes());
    }
}

impl Decode for ExecutionAddress {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        20
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != 20 {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 20,
            });
        }
        Ok(Self(H160::from_slice(bytes)))
    }
}

impl TreeHash for ExecutionAddress {
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
        tree_hash::merkle_root(self.0.as_bytes(), 0)
    }
}

/// Per-validator epoch participation flags, one bit per timely duty.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ParticipationFlags(u8);

impl ParticipationFlags {
    pub fn has_flag(self, flag_index: usize) -> bool {
        self.0 & (1 << flag_index) != 0
    }

    pub fn add_flag(self, flag_index: usize) -> Self {
        Self(self.0 | (1 << flag_index))
    }

    pub fn into_u8(self) -> u8 {
        self.0
    }
}

impl From<u8> for ParticipationFlags {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl Encode for ParticipationFlags {
    fn is_ssz_fixed_len() -> bool {
        <u8 as Encode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <u8 as Encode>::ssz_fixed_len()
    }

    fn ssz_bytes_len(&self) -> usize {
        self.0.ssz_bytes_len()
    }

    fn ssz_append(&self, buf: &mut Vec<u8>) {
        self.0.ssz_append(buf);
    }
}

impl Decode for ParticipationFlags {
    fn is_ssz_fixed_len() -> bool {
        <u8 as Decode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <u8 as Decode>::ssz_fixed_len()
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        u8::from_ssz_bytes(bytes).map(Self)
    }
}

impl TreeHash for ParticipationFlags {
    fn tree_hash_type() -> TreeHashType {
        u8::tree_hash_type()
    }

    fn tree_hash_packed_encoding(&self) -> Vec<u8> {
        self.0.tree_hash_packed_encoding()
    }

    fn tree_hash_packing_factor() -> usize {
        u8::tree_hash_packing_factor()
    }

    fn tree_hash_root(&self) -> Hash256 {
        self.0.tree_hash_root()
    }
}
