use types::primitives::H256;

// endianness is not configurable
pub fn int_to_bytes(int: u64, length: usize) -> Vec<u8> {
    let mut vec = int.to_le_bytes().to_vec();
    vec.resize(length, 0);
    vec
}

pub fn bytes_to_int(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

pub fn xor_hashes(left: H256, right: H256) -> H256 {
    let mut output = [0; 32];
    for (index, byte) in output.iter_mut().enumerate() {
        *byte = left[index] ^ right[index];
    }
    H256::from(output)
}
