//! Binary Merkle hashing over flat 32-byte leaves, as used for SSZ list
//! roots, deposit proofs and the execution payload transactions root.

use core::fmt;

use ethereum_types::H256;
use lazy_static::lazy_static;
use ring::digest::{digest, SHA256};

mod hasher;

pub use hasher::{
    merkle_root_from_flat_leaves, merkle_root_from_flat_leaves_with_scratch,
    transactions_list_root, uint64_root,
};

/// Enough levels for every limit in use; the deposit tree needs 33.
pub const MAX_TREE_DEPTH: usize = 40;

pub const BYTES_PER_CHUNK: usize = 32;

lazy_static! {
    /// `ZERO_HASHES[0]` is thirty-two zero bytes and each following entry is
    /// the hash of the previous one concatenated with itself.
    pub static ref ZERO_HASHES: [[u8; BYTES_PER_CHUNK]; MAX_TREE_DEPTH + 1] = {
        let mut hashes = [[0; BYTES_PER_CHUNK]; MAX_TREE_DEPTH + 1];
        for depth in 0..MAX_TREE_DEPTH {
            hashes[depth + 1] = hash_concat(&hashes[depth], &hashes[depth]);
        }
        hashes
    };
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    /// The flat leaf buffer is not a multiple of 32 bytes.
    UnalignedLeaves,
    /// The requested limit needs more levels than the zero-hash table has.
    LimitTooLarge,
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnalignedLeaves => write!(formatter, "leaf buffer is not chunk-aligned"),
            Error::LimitTooLarge => write!(formatter, "limit exceeds the supported tree depth"),
        }
    }
}

impl std::error::Error for Error {}

/// Number of tree levels needed for a list bounded by `limit` leaves.
pub fn depth_for_limit(limit: u64) -> u8 {
    if limit <= 1 {
        return 0;
    }
    (64 - (limit - 1).leading_zeros()) as u8
}

pub(crate) fn hash_chunks(input: &[u8]) -> [u8; BYTES_PER_CHUNK] {
    let mut output = [0; BYTES_PER_CHUNK];
    output.copy_from_slice(digest(&SHA256, input).as_ref());
    output
}

pub(crate) fn hash_concat(left: &[u8], right: &[u8]) -> [u8; BYTES_PER_CHUNK] {
    let mut input = [0; BYTES_PER_CHUNK * 2];
    input[..BYTES_PER_CHUNK].copy_from_slice(left);
    input[BYTES_PER_CHUNK..].copy_from_slice(right);
    hash_chunks(&input)
}

/// Walks a proof from `leaf` up to the claimed `root`. Bit `i` of `index`
/// says whether the sibling at level `i` is on the left.
pub fn is_valid_merkle_branch(
    leaf: H256,
    branch: &[H256],
    depth: u64,
    index: u64,
    root: H256,
) -> bool {
    if branch.len() < depth as usize {
        return false;
    }

    let mut node = leaf.to_fixed_bytes();
    for (level, sibling) in branch.iter().take(depth as usize).enumerate() {
        node = if index >> level & 1 == 1 {
            hash_concat(sibling.as_bytes(), &node)
        } else {
            hash_concat(&node, sibling.as_bytes())
        };
    }

    node == root.to_fixed_bytes()
}
