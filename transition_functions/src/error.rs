use helper_functions::error::Error as HelperError;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum AttestationInvalid {
    #[error("target epoch is neither current nor previous, or does not match the slot")]
    TargetEpoch,
    #[error("inclusion slot is outside the allowed window")]
    SlotRange,
    #[error("committee index is out of range")]
    CommitteeIndex,
    #[error("source does not match the justified checkpoint")]
    SourceMismatch,
    #[error("aggregation bits do not match the committee size")]
    BitsLength,
    #[error("attesting indices are empty, unsorted or out of bounds")]
    Indices,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ExitInvalid {
    #[error("validator is not active")]
    NotActive,
    #[error("an exit is already queued for the validator")]
    AlreadyExiting,
    #[error("exit epoch is in the future")]
    FutureEpoch,
    #[error("validator has not been active long enough")]
    TooRecent,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("block header is inconsistent with the state")]
    InvalidHeader,
    #[error("signature verification failed")]
    InvalidSignature,
    #[error("deposit Merkle branch does not reconstruct the deposit root")]
    InvalidMerkleProof,
    #[error("invalid attestation: {0}")]
    InvalidAttestation(AttestationInvalid),
    #[error("slashing precondition violated")]
    SlashingPrecondition,
    #[error("invalid voluntary exit: {0}")]
    ExitPrecondition(ExitInvalid),
    #[error("payload withdrawals do not match the expected withdrawals")]
    WithdrawalMismatch,
    #[error("execution payload is inconsistent with the state")]
    PayloadMismatch,
    #[error("blob commitments do not match the transaction versioned hashes")]
    KzgMismatch,
    #[error("sync aggregate does not fit the sync committee")]
    SyncAggregateSize,
    #[error("withdrawal credentials do not match the change message")]
    InvalidBlsToExecutionChange,
    #[error("deposit count does not match the eth1 data")]
    DepositCountMismatch,
    #[error("fork upgrade applied out of order")]
    ConfigError,
    #[error("target slot is not beyond the state slot")]
    SlotOutOfOrder,
    #[error("a state list is full")]
    ListOverflow,
    #[error("cryptographic primitive failure")]
    CryptoError,
    #[error("state accessor failure: {0:?}")]
    StateAccessor(HelperError),
}

impl From<HelperError> for Error {
    fn from(error: HelperError) -> Self {
        match error {
            HelperError::Crypto(_) => Error::CryptoError,
            HelperError::SignatureInvalid => Error::InvalidSignature,
            HelperError::SourceCheckpointMismatch => {
                Error::InvalidAttestation(AttestationInvalid::SourceMismatch)
            }
            HelperError::AttestationBitsInvalid => {
                Error::InvalidAttestation(AttestationInvalid::BitsLength)
            }
            HelperError::NoAttestingIndices
            | HelperError::MaxIndicesExceeded
            | HelperError::BadValidatorIndicesOrdering => {
                Error::InvalidAttestation(AttestationInvalid::Indices)
            }
            other => Error::StateAccessor(other),
        }
    }
}

impl From<bls::Error> for Error {
    fn from(_error: bls::Error) -> Self {
        Error::CryptoError
    }
}
