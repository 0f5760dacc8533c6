//! Proof output types

mod response;

pub use response::{ProofAttributes, ProofMetadata, ProofResponse};
