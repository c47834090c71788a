pub mod attestations;

pub use attestations::{process_attestation, process_attestations};
