use blst::min_pk::{AggregateSignature, SecretKey as BlstSecretKey, Signature};

use crate::{Error, PublicKeyBytes, SignatureBytes, DST};

/// A signing key. Production signing lives in the validator client; this
/// type exists so fixtures can produce signatures that actually verify.
pub struct SecretKey(BlstSecretKey);

impl SecretKey {
    /// Deterministic key derivation from a small seed.
    pub fn from_seed(seed: u64) -> Self {
        let mut ikm = [0; 32];
        ikm[..8].copy_from_slice(&seed.to_le_bytes());
        let key = BlstSecretKey::key_gen(&ikm, &[])
            .expect("32 bytes of key material are enough for key generation");
        Self(key)
    }

    pub fn public_key(&self) -> PublicKeyBytes {
        PublicKeyBytes::from(self.0.sk_to_pk().compress())
    }

    pub fn sign(&self, message: &[u8]) -> SignatureBytes {
        SignatureBytes::from(self.0.sign(message, DST, &[]).compress())
    }

    /// Aggregates individual signatures over the same message.
    pub fn aggregate_signatures(signatures: &[SignatureBytes]) -> Result<SignatureBytes, Error> {
        let decompressed = signatures
            .iter()
            .map(|signature| {
                Signature::uncompress(signature.as_bytes()).map_err(|_| Error::InvalidSignature)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let references = decompressed.iter().collect::<Vec<_>>();
        let aggregate = AggregateSignature::aggregate(references.as_slice(), false)
            .map_err(|_| Error::InvalidSignature)?;
        Ok(SignatureBytes::from(aggregate.to_signature().compress()))
    }
}
