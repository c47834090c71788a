//! Thin wrapper around `blst` exposing the two verification entry points the
//! state transition needs, plus byte-level key and signature types that can
//! live inside SSZ containers without forcing point decompression.

use core::fmt;

use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
use blst::BLST_ERROR;
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{Hash256, TreeHash, TreeHashType};

mod secret_key;

pub use secret_key::SecretKey;

pub(crate) const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

pub const PUBLIC_KEY_BYTES_LEN: usize = 48;
pub const SIGNATURE_BYTES_LEN: usize = 96;

/// A failure inside the signature library itself: malformed points, points
/// off the curve, empty aggregation sets. Distinct from a signature that
/// simply does not verify.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    InvalidPublicKey,
    InvalidSignature,
    EmptyAggregate,
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidPublicKey => write!(formatter, "public key bytes are not a valid point"),
            Error::InvalidSignature => write!(formatter, "signature bytes are not a valid point"),
            Error::EmptyAggregate => write!(formatter, "no public keys to aggregate"),
        }
    }
}

impl std::error::Error for Error {}

macro_rules! bytes_struct {
    ($name: ident, $len: expr, $doc: expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn to_fixed_bytes(self) -> [u8; $len] {
                self.0
            }

            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                if bytes.len() != $len {
                    return None;
                }
                let mut array = [0; $len];
                array.copy_from_slice(bytes);
                Some(Self(array))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0; $len])
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(array: [u8; $len]) -> Self {
                Self(array)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "0x{}", hex::encode(&self.0[..]))
            }
        }

        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn ssz_bytes_len(&self) -> usize {
                $len
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                Self::from_slice(bytes).ok_or(DecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected: $len,
                })
            }
        }

        impl TreeHash for $name {
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
    };
}

bytes_struct!(
    PublicKeyBytes,
    PUBLIC_KEY_BYTES_LEN,
    "A compressed BLS12-381 G1 public key, kept as bytes."
);
bytes_struct!(
    SignatureBytes,
    SIGNATURE_BYTES_LEN,
    "A compressed BLS12-381 G2 signature, kept as bytes."
);

impl SignatureBytes {
    /// The compressed point at infinity, the aggregate of nothing.
    pub fn infinity() -> Self {
        let mut bytes = [0; SIGNATURE_BYTES_LEN];
        bytes[0] = 0xc0;
        Self(bytes)
    }
}

fn decompress_pubkey(pubkey: &PublicKeyBytes) -> Result<PublicKey, Error> {
    PublicKey::key_validate(pubkey.as_bytes()).map_err(|_| Error::InvalidPublicKey)
}

fn decompress_signature(signature: &SignatureBytes) -> Result<Signature, Error> {
    Signature::uncompress(signature.as_bytes()).map_err(|_| Error::InvalidSignature)
}

/// Verifies a single signature over `message`.
///
/// `Ok(false)` means the inputs were well-formed but the signature does not
/// verify; `Err` means the inputs never made it to the pairing.
pub fn verify(
    signature: &SignatureBytes,
    message: &[u8],
    pubkey: &PublicKeyBytes,
) -> Result<bool, Error> {
    let pubkey = decompress_pubkey(pubkey)?;
    let signature = decompress_signature(signature)?;

    let outcome = signature.verify(true, message, DST, &[], &pubkey, false);
    Ok(outcome == BLST_ERROR::BLST_SUCCESS)
}

/// Verifies an aggregate signature of `pubkeys` over a single `message`.
pub fn verify_aggregate(
    signature: &SignatureBytes,
    message: &[u8],
    pubkeys: &[PublicKeyBytes],
) -> Result<bool, Error> {
    if pubkeys.is_empty() {
        return Err(Error::EmptyAggregate);
    }

    let decompressed = pubkeys
        .iter()
        .map(decompress_pubkey)
        .collect::<Result<Vec<_>, _>>()?;
    let references = decompressed.iter().collect::<Vec<_>>();
    let aggregate = AggregatePublicKey::aggregate(references.as_slice(), false)
        .map_err(|_| Error::InvalidPublicKey)?;
    let signature = decompress_signature(signature)?;

    let outcome = signature.verify(
        true,
        message,
        DST,
        &[],
        &aggregate.to_public_key(),
        false,
    );
    Ok(outcome == BLST_ERROR::BLST_SUCCESS)
}
