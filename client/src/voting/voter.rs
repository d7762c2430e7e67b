use crate::cli::cli::{VerifyBallot, Vote};
use crate::config::Config;
use crate::error::CliError;
use crate::voting::{read_artifact, write_artifact};
use std::fs;
use voting_crypto::{Artifact, EncryptedVote};

/// Parses "0;1,2;" into [[0], [1, 2], []].
pub fn parse_selection(input: &str) -> Result<Vec<Vec<usize>>, CliError> {
    input
        .split(';')
        .map(|question| {
            question
                .split(',')
                .map(str::trim)
                .filter(|answer| !answer.is_empty())
                .map(|answer| {
                    answer.parse::<usize>().map_err(|_| {
                        CliError::InvalidArgument(format!("{:?} is not an answer index", answer))
                    })
                })
                .collect()
        })
        .collect()
}

/// Encrypts a ballot and prints its tracker.
pub fn create_vote(args: &Vote, config: &Config) -> Result<EncryptedVote, CliError> {
    let election = read_artifact(&args.election)?.into_election()?;
    let selections = parse_selection(&args.selection)?;
    let mut rng = rand::thread_rng();

    let vote = EncryptedVote::from_selections(&election, &selections, &mut rng)?;
    let vote = if args.audit { vote } else { vote.without_secrets() };
    println!("ballot tracker: {}", vote.fingerprint());
    write_artifact(&args.out, &Artifact::EncryptedVote(vote.clone()), config.pretty_json)?;
    Ok(vote)
}

/// Verifies all proofs of a ballot. If the ballot still carries its
/// randomness it is audited as well.
pub fn verify_ballot(args: &VerifyBallot) -> Result<(), CliError> {
    let election = read_artifact(&args.election)?.into_election()?;
    let bytes = fs::read(&args.ballot).map_err(|source| CliError::Io {
        path: args.ballot.clone(),
        source,
    })?;
    // the tag has to name a ballot, the shape has to fit the election
    Artifact::from_json(&bytes)?.into_encrypted_vote()?;
    let vote = EncryptedVote::from_json(&bytes, &election)?;

    vote.check(&election)?;
    println!("ballot {} is valid", vote.fingerprint());

    if vote.answers.iter().any(|answer| answer.randomness.is_some()) {
        match vote.audit(&election) {
            Some(selections) => println!("audited selections: {:?}", selections),
            None => {
                return Err(CliError::InvalidArgument(
                    "the revealed randomness does not match the ballot".to_string(),
                ))
            }
        }
    }
    Ok(())
}
