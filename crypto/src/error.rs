use crate::workflow::ElectionState;
use thiserror::Error;
use uuid::Uuid;

/// Errors that indicate a broken setup or a programming error.
///
/// These are never expected in a correctly operated election. Parameter
/// generation returns them, combining ciphertexts under different keys panics
/// with the message of `IncompatiblePublicKey`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("voting-crypto: incompatible public keys - ciphertexts under different keys cannot be combined")]
    IncompatiblePublicKey,

    #[error("voting-crypto: parameter generation failed: {0}")]
    ParameterGeneration(String),
}

/// Malformed input, rejected while deserializing.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("voting-crypto validation: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("voting-crypto validation: expected a {expected} artifact, found {found}")]
    UnexpectedArtifact {
        expected: &'static str,
        found: &'static str,
    },

    #[error("voting-crypto validation: election has no public key (not frozen)")]
    ElectionNotFrozen,

    #[error("voting-crypto validation: expected {expected} answers, found {found}")]
    AnswerCount { expected: usize, found: usize },

    #[error("voting-crypto validation: question {question}: expected {expected} choices, found {found}")]
    ChoiceCount {
        question: usize,
        expected: usize,
        found: usize,
    },

    #[error("voting-crypto validation: question {question}: expected {expected} individual proofs, found {found}")]
    ProofCount {
        question: usize,
        expected: usize,
        found: usize,
    },

    #[error("voting-crypto validation: question {question}: proof for choice {choice} has {found} branches, expected {expected}")]
    ProofBranchCount {
        question: usize,
        choice: usize,
        expected: usize,
        found: usize,
    },

    #[error("voting-crypto validation: question {question}: overall proof has {found} branches, expected {expected}")]
    OverallProofBranchCount {
        question: usize,
        expected: usize,
        found: usize,
    },

    #[error("voting-crypto validation: question {question}: ciphertext is not an element of the subgroup")]
    ElementOutOfRange { question: usize },
}

/// The reason a ballot, a key proof or a decryption proof was rejected.
///
/// Always recoverable: a rejection only affects the one ballot or the one
/// trustee contribution it was raised for.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("election has no public key (not frozen)")]
    ElectionNotFrozen,

    #[error("ballot answers {found} questions, election has {expected}")]
    QuestionCountMismatch { expected: usize, found: usize },

    #[error("ballot is bound to a different election hash")]
    ElectionHashMismatch,

    #[error("ballot is bound to a different election uuid")]
    ElectionUuidMismatch,

    #[error("question {question}: ballot has {found} choices, expected {expected}")]
    ChoiceCountMismatch {
        question: usize,
        expected: usize,
        found: usize,
    },

    #[error("question {question}: ciphertext is not an element of the subgroup")]
    MalformedCiphertext { question: usize },

    #[error("question {question}: individual proof for answer {answer} does not verify")]
    InvalidIndividualProof { question: usize, answer: usize },

    #[error("question {question}: overall proof is missing")]
    MissingOverallProof { question: usize },

    #[error("question {question}: overall proof present but the question has no maximum")]
    UnexpectedOverallProof { question: usize },

    #[error("question {question}: overall proof does not verify")]
    InvalidOverallProof { question: usize },

    #[error("key generation proof does not verify")]
    InvalidKeyProof,

    #[error("decryption has the wrong shape for the tally")]
    DecryptionShapeMismatch,

    #[error("decryption proof for question {question}, answer {answer} does not verify")]
    InvalidDecryptionProof { question: usize, answer: usize },
}

/// Result of every `check` style verification.
pub type VerifyResult = Result<(), VerificationFailure>;

/// A selection that the question does not allow. Raised before any
/// ciphertext is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("ineligible selection: election has no public key (not frozen)")]
    ElectionNotFrozen,

    #[error("ineligible selection: question {0} does not exist")]
    UnknownQuestion(usize),

    #[error("ineligible selection: answer {answer} does not exist, question has {answers} answers")]
    AnswerOutOfRange { answer: usize, answers: usize },

    #[error("ineligible selection: answer {0} selected more than once")]
    DuplicateAnswer(usize),

    #[error("ineligible selection: {selected} selected, at least {min} required")]
    TooFewSelections { min: usize, selected: usize },

    #[error("ineligible selection: {selected} selected, at most {max} allowed")]
    TooManySelections { max: usize, selected: usize },

    #[error("ineligible selection: {found} selections for {expected} questions")]
    QuestionCountMismatch { expected: usize, found: usize },
}

/// Errors of the decryption combination step. Combination is all-or-nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombineError {
    #[error("combination requires at least one partial decryption")]
    NoDecryptions,

    #[error("partial decryption {0} has the wrong shape for the tally")]
    ShapeMismatch(usize),

    #[error("partial decryption {index} rejected: {reason}")]
    InvalidDecryption {
        index: usize,
        reason: VerificationFailure,
    },

    #[error("question {question}, answer {answer}: count is not in the discrete log table (max {max})")]
    DiscreteLogNotFound {
        question: usize,
        answer: usize,
        max: u64,
    },
}

/// Errors raised by the election workflow state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("workflow: cannot {action} while the election is {state}")]
    InvalidTransition {
        state: ElectionState,
        action: &'static str,
    },

    #[error("workflow: stored election data does not match its state ({0})")]
    Inconsistent(ElectionState),

    #[error("workflow: at least one trustee is required")]
    NoTrustees,

    #[error("workflow: at least one question is required")]
    NoQuestions,

    #[error("workflow: voter roll is empty and registration is closed")]
    NoEligibleVoters,

    #[error("workflow: invalid question: {0}")]
    InvalidQuestion(String),

    #[error("workflow: trustee {0} uses different group parameters")]
    TrusteeParamsMismatch(Uuid),

    #[error("workflow: trustee {0} is already registered")]
    DuplicateTrustee(Uuid),

    #[error("workflow: trustee {trustee} rejected: {reason}")]
    TrusteeRejected {
        trustee: Uuid,
        reason: VerificationFailure,
    },

    #[error("workflow: unknown trustee {0}")]
    UnknownTrustee(Uuid),

    #[error("workflow: voter {0} is not eligible")]
    VoterNotEligible(String),

    #[error("workflow: ballot rejected: {0}")]
    BallotRejected(VerificationFailure),

    #[error("workflow: missing decryptions from trustees {0:?}")]
    MissingDecryptions(Vec<Uuid>),

    #[error("workflow: combination failed: {0}")]
    Combine(#[from] CombineError),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}
