use ethereum_types::H256;

use crate::{
    depth_for_limit, hash_chunks, hash_concat, Error, BYTES_PER_CHUNK, MAX_TREE_DEPTH,
    ZERO_HASHES,
};

/// Root of a little-endian `u64` leaf.
pub fn uint64_root(value: u64) -> H256 {
    let mut chunk = [0; BYTES_PER_CHUNK];
    chunk[..8].copy_from_slice(&value.to_le_bytes());
    H256::from(chunk)
}

/// Merkleizes a flat buffer of 32-byte leaves into the root of a tree sized
/// for `limit` leaves, padding odd layers with the precomputed zero hashes.
pub fn merkle_root_from_flat_leaves(leaves: &[u8], limit: u64) -> Result<H256, Error> {
    let mut scratch = Vec::new();
    merkle_root_from_flat_leaves_with_scratch(leaves, limit, &mut scratch)
}

/// As [`merkle_root_from_flat_leaves`], reusing a caller-owned scratch
/// buffer. The buffer grows as needed and carries no state between calls;
/// callers that hash in a loop avoid re-allocating per tree.
pub fn merkle_root_from_flat_leaves_with_scratch(
    leaves: &[u8],
    limit: u64,
    scratch: &mut Vec<u8>,
) -> Result<H256, Error> {
    if leaves.len() % BYTES_PER_CHUNK != 0 {
        return Err(Error::UnalignedLeaves);
    }
    let depth = depth_for_limit(limit) as usize;
    if depth > MAX_TREE_DEPTH {
        return Err(Error::LimitTooLarge);
    }
    if leaves.is_empty() {
        return Ok(H256::from(ZERO_HASHES[depth]));
    }

    scratch.clear();
    scratch.extend_from_slice(leaves);

    let mut layer_len = scratch.len();
    for level in 0..depth {
        if (layer_len / BYTES_PER_CHUNK) % 2 == 1 && layer_len > BYTES_PER_CHUNK {
            scratch.truncate(layer_len);
            scratch.extend_from_slice(&ZERO_HASHES[level]);
            layer_len += BYTES_PER_CHUNK;
        }
        if layer_len == BYTES_PER_CHUNK {
            // A single node is only ever paired with zero hashes from here up.
            let node = hash_concat(&scratch[..BYTES_PER_CHUNK], &ZERO_HASHES[level]);
            scratch[..BYTES_PER_CHUNK].copy_from_slice(&node);
            continue;
        }
        for pair in 0..layer_len / (2 * BYTES_PER_CHUNK) {
            let input_start = pair * 2 * BYTES_PER_CHUNK;
            let node = hash_chunks(&scratch[input_start..input_start + 2 * BYTES_PER_CHUNK]);
            let output_start = pair * BYTES_PER_CHUNK;
            scratch[output_start..output_start + BYTES_PER_CHUNK].copy_from_slice(&node);
        }
        layer_len /= 2;
    }

    Ok(H256::from_slice(&scratch[..BYTES_PER_CHUNK]))
}

/// Root of the execution payload transactions list: each transaction is
/// hashed as a byte list bounded by `max_bytes_per_transaction`, the
/// per-transaction roots form a list bounded by `max_transactions`, and both
/// levels mix in their actual lengths.
pub fn transactions_list_root(
    transactions: &[&[u8]],
    max_bytes_per_transaction: u64,
    max_transactions: u64,
) -> Result<H256, Error> {
    let mut leaves = Vec::with_capacity(transactions.len() * BYTES_PER_CHUNK);
    let mut scratch = Vec::new();

    for transaction in transactions {
        let mut padded = transaction.to_vec();
        let remainder = padded.len() % BYTES_PER_CHUNK;
        if remainder != 0 {
            padded.resize(padded.len() + BYTES_PER_CHUNK - remainder, 0);
        }

        let chunks_root = merkle_root_from_flat_leaves_with_scratch(
            &padded,
            max_bytes_per_transaction / BYTES_PER_CHUNK as u64,
            &mut scratch,
        )?;
        let length_root = uint64_root(transaction.len() as u64);
        leaves.extend_from_slice(&hash_concat(
            chunks_root.as_bytes(),
            length_root.as_bytes(),
        ));
    }

    let list_root =
        merkle_root_from_flat_leaves_with_scratch(&leaves, max_transactions, &mut scratch)?;
    let count_root = uint64_root(transactions.len() as u64);

    Ok(H256::from(hash_concat(
        list_root.as_bytes(),
        count_root.as_bytes(),
    )))
}
