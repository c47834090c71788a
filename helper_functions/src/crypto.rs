use bls::{PublicKeyBytes, SignatureBytes};
use ring::digest::{digest, SHA256};
use tree_hash::TreeHash;
use types::primitives::H256;

pub fn hash(input: &[u8]) -> Vec<u8> {
    digest(&SHA256, input).as_ref().to_vec()
}

pub fn hash_tree_root<T: TreeHash>(object: &T) -> H256 {
    object.tree_hash_root()
}

/// `Ok(false)` is an invalid signature; `Err` is a failure of the signature
/// library itself and must not be treated as a mere verification failure.
pub fn bls_verify(
    pubkey: &PublicKeyBytes,
    message: &[u8],
    signature: &SignatureBytes,
) -> Result<bool, bls::Error> {
    bls::verify(signature, message, pubkey)
}

pub fn bls_verify_aggregate(
    pubkeys: &[PublicKeyBytes],
    message: &[u8],
    signature: &SignatureBytes,
) -> Result<bool, bls::Error> {
    bls::verify_aggregate(signature, message, pubkeys)
}
