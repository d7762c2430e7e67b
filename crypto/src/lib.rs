//! This library provides the cryptographic core of a homomorphic voting
//! system built on the exponential ElGamal cryptosystem: group and key
//! generation, ballot encryption with zero-knowledge validity proofs, the
//! homomorphic tally and its verifiable decryption by a set of trustees.
//!
//! All randomness is drawn from an explicit `RngCore + CryptoRng` handle
//! passed by the caller.

pub mod artifact;
pub mod ballot;
pub mod dlog;
pub mod election;

#[allow(clippy::many_single_char_names)]
pub mod encryption;

pub mod error;

#[allow(clippy::many_single_char_names)]
pub mod helper;

#[allow(clippy::many_single_char_names)]
pub mod proofs;

pub mod random;
pub mod serde_decimal;
pub mod tally;
pub mod trustee;

#[allow(clippy::many_single_char_names)]
pub mod types;

pub mod workflow;

pub use artifact::{Artifact, ArtifactType};
pub use ballot::{EncryptedAnswer, EncryptedVote};
pub use election::{Election, Question, ResultType};
pub use error::{
    CombineError, FatalError, SelectionError, ValidationError, VerificationFailure, VerifyResult,
    WorkflowError,
};
pub use tally::{ElectionResult, Tally};
pub use trustee::{PartialDecryption, Trustee};
pub use types::{Cipher, ElGamalParams, KeyPair, PrivateKey, PublicKey};
pub use workflow::{ElectionState, ElectionWorkflow, VoterRoll};
