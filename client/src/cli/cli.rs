use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The voting CLI to impersonate the election authority, trustees and voters
#[derive(Parser, Debug)]
#[clap(name = "voting-cli", version, author, about)]
pub struct Opts {
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Generates the group parameters (p, q, g)
    #[clap(name = "params")]
    Params(Params),
    /// Generates a trustee key pair with its proof of knowledge
    #[clap(name = "keygen")]
    KeyGen(KeyGen),
    /// Creates and freezes an election
    #[clap(name = "election")]
    Election(CreateElection),
    /// Encrypts a ballot
    #[clap(name = "vote")]
    Vote(Vote),
    /// Verifies (and audits) a ballot
    #[clap(name = "verify-ballot")]
    VerifyBallot(VerifyBallot),
    /// Folds ballots into the encrypted tally
    #[clap(name = "tally")]
    Tally(ComputeTally),
    /// Computes a trustee's partial decryption of the tally
    #[clap(name = "decrypt")]
    Decrypt(Decrypt),
    /// Combines all partial decryptions into the result
    #[clap(name = "combine")]
    Combine(Combine),
    /// Runs a whole election in memory with random voters
    #[clap(name = "simulate")]
    Simulate(Simulate),
}

/// A subcommand for generating the group parameters
#[derive(Parser, Debug)]
pub struct Params {
    /// The bit size of p, defaults to VOTING_GROUP_BITS
    #[clap(short, long)]
    pub bits: Option<u64>,
    /// Where to write the params artifact
    #[clap(short, long)]
    pub out: PathBuf,
}

/// A subcommand for generating a trustee
#[derive(Parser, Debug)]
pub struct KeyGen {
    /// The params artifact
    #[clap(short, long)]
    pub params: PathBuf,
    /// The name of the trustee
    #[clap(short, long)]
    pub name: String,
    /// Where to write the trustee including its private key
    #[clap(short, long)]
    pub out: PathBuf,
    /// Where to write the public part of the trustee
    #[clap(long)]
    pub public_out: PathBuf,
}

/// A subcommand for creating an election
#[derive(Parser, Debug)]
pub struct CreateElection {
    /// The name of the election
    #[clap(short, long)]
    pub name: String,
    /// The params artifact
    #[clap(short, long)]
    pub params: PathBuf,
    /// A JSON array of questions
    #[clap(short, long)]
    pub questions: PathBuf,
    /// The public trustee artifacts
    #[clap(short, long = "trustee", required = true)]
    pub trustees: Vec<PathBuf>,
    /// Where to write the election artifact
    #[clap(short, long)]
    pub out: PathBuf,
}

/// A subcommand for encrypting a ballot
#[derive(Parser, Debug)]
pub struct Vote {
    /// The election artifact
    #[clap(short, long)]
    pub election: PathBuf,
    /// The selected answers, questions separated by ';' and answers by ','
    /// e.g. "0;1,2;" selects answer 0, answers 1 and 2, and nothing
    #[clap(short, long, allow_hyphen_values = true)]
    pub selection: String,
    /// Keeps the randomness in the ballot so that it can be audited
    #[clap(long)]
    pub audit: bool,
    /// Where to write the encrypted vote artifact
    #[clap(short, long)]
    pub out: PathBuf,
}

/// A subcommand for verifying a ballot
#[derive(Parser, Debug)]
pub struct VerifyBallot {
    /// The election artifact
    #[clap(short, long)]
    pub election: PathBuf,
    /// The encrypted vote artifact
    #[clap(short, long)]
    pub ballot: PathBuf,
}

/// A subcommand for computing the encrypted tally
#[derive(Parser, Debug)]
pub struct ComputeTally {
    /// The election artifact
    #[clap(short, long)]
    pub election: PathBuf,
    /// The encrypted vote artifacts
    #[clap(short, long = "ballot")]
    pub ballots: Vec<PathBuf>,
    /// Where to write the tally artifact
    #[clap(short, long)]
    pub out: PathBuf,
}

/// A subcommand for the partial decryption of a trustee
#[derive(Parser, Debug)]
pub struct Decrypt {
    /// The trustee artifact including its private key
    #[clap(long)]
    pub trustee: PathBuf,
    /// The tally artifact
    #[clap(long)]
    pub tally: PathBuf,
    /// Where to write the partial decryption artifact
    #[clap(short, long)]
    pub out: PathBuf,
}

/// A subcommand for combining the partial decryptions
#[derive(Parser, Debug)]
pub struct Combine {
    /// The election artifact
    #[clap(short, long)]
    pub election: PathBuf,
    /// The tally artifact
    #[clap(long)]
    pub tally: PathBuf,
    /// The public trustee artifacts, in the order of the decryptions
    #[clap(long = "trustee", required = true)]
    pub trustees: Vec<PathBuf>,
    /// The partial decryption artifacts
    #[clap(long = "decryption", required = true)]
    pub decryptions: Vec<PathBuf>,
    /// Where to write the result artifact
    #[clap(short, long)]
    pub out: PathBuf,
}

/// A subcommand for simulating an election
#[derive(Parser, Debug)]
pub struct Simulate {
    /// The number of trustees
    #[clap(short, long, default_value_t = 3)]
    pub trustees: usize,
    /// The number of voters
    #[clap(short, long, default_value_t = 20)]
    pub voters: usize,
    /// The bit size of p, defaults to VOTING_GROUP_BITS
    #[clap(short, long)]
    pub bits: Option<u64>,
}
