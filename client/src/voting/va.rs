use crate::cli::cli::{Combine, ComputeTally, CreateElection, Params};
use crate::config::Config;
use crate::error::CliError;
use crate::voting::{read_artifact, write_artifact};
use std::fs;
use voting_crypto::{
    Artifact, ElGamalParams, Election, ElectionResult, EncryptedVote, PublicKey, Question, Tally,
};

pub fn generate_params(args: &Params, config: &Config) -> Result<ElGamalParams, CliError> {
    let bits = args.bits.unwrap_or(config.group_bits);
    let mut rng = rand::thread_rng();
    let params = ElGamalParams::generate(bits, &mut rng)?;
    write_artifact(&args.out, &Artifact::Params(params.clone()), config.pretty_json)?;
    Ok(params)
}

/// Creates a frozen election: the questions are fixed and the public key is
/// the combination of all trustee keys.
pub fn setup_election(args: &CreateElection, config: &Config) -> Result<Election, CliError> {
    let params = read_artifact(&args.params)?.into_params()?;

    let bytes = fs::read(&args.questions).map_err(|source| CliError::Io {
        path: args.questions.clone(),
        source,
    })?;
    let questions: Vec<Question> = serde_json::from_slice(&bytes)
        .map_err(voting_crypto::ValidationError::from)?;
    if questions.is_empty() {
        return Err(CliError::InvalidArgument("at least one question is required".to_string()));
    }
    for question in questions.iter() {
        question.validate().map_err(CliError::InvalidArgument)?;
    }

    let mut keys: Vec<PublicKey> = Vec::with_capacity(args.trustees.len());
    for path in args.trustees.iter() {
        let trustee = read_artifact(path)?.into_trustee()?;
        if trustee.public_key.params != params {
            return Err(CliError::InvalidArgument(format!(
                "trustee {} uses a different group",
                trustee.name
            )));
        }
        trustee.verify_key_proof()?;
        keys.push(trustee.public_key);
    }

    let mut election = Election::new(&args.name, params);
    election.questions = questions;
    election.public_key = PublicKey::combine(&keys);
    log::info!(
        "election {} frozen with {} trustees and hash {}",
        election.uuid,
        keys.len(),
        election.hash()
    );
    write_artifact(&args.out, &Artifact::Election(election.clone()), config.pretty_json)?;
    Ok(election)
}

pub fn compute_tally(args: &ComputeTally, config: &Config) -> Result<Tally, CliError> {
    let election = read_artifact(&args.election)?.into_election()?;
    if !election.is_frozen() {
        return Err(voting_crypto::ValidationError::ElectionNotFrozen.into());
    }

    let mut votes: Vec<EncryptedVote> = Vec::with_capacity(args.ballots.len());
    for path in args.ballots.iter() {
        votes.push(read_artifact(path)?.into_encrypted_vote()?);
    }

    let (tally, results) = Tally::from_votes(&election, &votes)?;
    for (path, result) in args.ballots.iter().zip(results.iter()) {
        if let Err(reason) = result {
            log::warn!("ballot {} not tallied: {}", path.display(), reason);
        }
    }
    println!("tallied {} of {} ballots", tally.num_tallied, votes.len());
    write_artifact(&args.out, &Artifact::Tally(tally.clone()), config.pretty_json)?;
    Ok(tally)
}

pub fn combine(args: &Combine, config: &Config) -> Result<ElectionResult, CliError> {
    if args.trustees.len() != args.decryptions.len() {
        return Err(CliError::InvalidArgument(
            "one decryption per trustee is required".to_string(),
        ));
    }
    let election = read_artifact(&args.election)?.into_election()?;
    let tally = read_artifact(&args.tally)?.into_tally()?;
    if election.public_key.as_ref() != Some(&tally.public_key) {
        return Err(CliError::InvalidArgument(
            "tally does not belong to the election".to_string(),
        ));
    }

    let mut keys = Vec::with_capacity(args.trustees.len());
    let mut partials = Vec::with_capacity(args.decryptions.len());
    for (trustee, decryption) in args.trustees.iter().zip(args.decryptions.iter()) {
        keys.push(read_artifact(trustee)?.into_trustee()?.public_key);
        partials.push(read_artifact(decryption)?.into_partial_decryption()?);
    }
    // all trustees together have to reproduce the election key
    if PublicKey::combine(&keys).as_ref() != election.public_key.as_ref() {
        return Err(CliError::InvalidArgument(
            "the trustees do not match the election key".to_string(),
        ));
    }

    let contributions: Vec<_> = keys.iter().zip(partials.iter()).collect();
    let result = tally.combine_verified(&contributions)?;
    print_result(&election, &result);
    write_artifact(&args.out, &Artifact::Result(result.clone()), config.pretty_json)?;
    Ok(result)
}

pub fn print_result(election: &Election, result: &ElectionResult) {
    let winners = result.winners(&election.questions);
    println!("{} ballots tallied", result.num_tallied);
    for ((question, counts), winners) in election
        .questions
        .iter()
        .zip(result.counts.iter())
        .zip(winners.iter())
    {
        println!("{} ({})", question.question, question.result_type);
        for (index, (answer, count)) in question.answers.iter().zip(counts.iter()).enumerate() {
            let mark = if winners.contains(&index) { "*" } else { " " };
            println!("  {} {:>6}  {}", mark, count, answer);
        }
    }
}
