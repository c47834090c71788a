#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    IndexOutOfRange,
    SlotOutOfRange,
    NoActiveValidators,
    AttestationBitsInvalid,
    NoAttestingIndices,
    MaxIndicesExceeded,
    BadValidatorIndicesOrdering,
    SourceCheckpointMismatch,
    SignatureInvalid,
    Crypto(bls::Error),
}

impl From<bls::Error> for Error {
    fn from(error: bls::Error) -> Self {
        Error::Crypto(error)
    }
}
