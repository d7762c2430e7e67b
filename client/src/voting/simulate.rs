use crate::cli::cli::Simulate;
use crate::config::Config;
use crate::error::CliError;
use crate::voting::va::print_result;
use rand::seq::index::sample;
use rand::Rng;
use voting_crypto::{
    ElGamalParams, ElectionResult, ElectionWorkflow, EncryptedVote, Question, ResultType, Trustee,
};

fn questions() -> Vec<Question> {
    vec![
        Question::new("Do you accept the proposal?", &["yes", "no"], 0, Some(1))
            .with_result_type(ResultType::Absolute),
        Question::new("Who should chair the board?", &["ann", "ben", "cat"], 1, Some(1)),
        Question::new("Which projects should be funded?", &["park", "library", "pool", "bridge"], 0, Some(2)),
    ]
}

/// Runs a whole election in memory: trustees, random voters, tally,
/// decryption and the result.
pub fn simulate(args: &Simulate, config: &Config) -> Result<ElectionResult, CliError> {
    if args.trustees == 0 || args.voters == 0 {
        return Err(CliError::InvalidArgument(
            "at least one trustee and one voter are required".to_string(),
        ));
    }
    let bits = args.bits.unwrap_or(config.group_bits);
    let mut rng = rand::thread_rng();

    println!("generating a {} bit group...", bits);
    let params = ElGamalParams::generate(bits, &mut rng)?;
    let mut workflow = ElectionWorkflow::new("simulation", params.clone());
    for question in questions() {
        workflow.add_question(question)?;
    }

    println!("setting up {} trustees...", args.trustees);
    let trustees: Vec<Trustee> = (0..args.trustees)
        .map(|i| Trustee::generate(&format!("trustee-{}", i), &params, &mut rng))
        .collect();
    for trustee in trustees.iter() {
        workflow.add_trustee(trustee)?;
    }
    for voter in 0..args.voters {
        workflow.register_voter(&format!("voter-{}", voter))?;
    }
    workflow.freeze()?;
    workflow.open_voting()?;

    println!("casting {} random ballots...", args.voters);
    for voter in 0..args.voters {
        let selections: Vec<Vec<usize>> = workflow
            .election()
            .questions
            .iter()
            .map(|question| {
                let max = question.max_selections();
                let count = rng.gen_range(question.min, max + 1);
                sample(&mut rng, question.answers.len(), count).into_vec()
            })
            .collect();
        let vote = EncryptedVote::from_selections(workflow.election(), &selections, &mut rng)?;
        let tracker = workflow.cast_vote(&format!("voter-{}", voter), &vote)?;
        log::debug!("voter-{} cast {}", voter, tracker);
    }
    workflow.close_voting()?;

    println!("computing the tally...");
    let tally = workflow.compute_tally()?;
    workflow.request_decryptions()?;

    println!("trustees decrypting...");
    for trustee in trustees.iter() {
        let partial = trustee
            .compute_decryption(&tally, &mut rng)
            .ok_or_else(|| CliError::InvalidArgument(format!("{} has no private key", trustee.name)))?;
        workflow.submit_decryption(trustee.uuid, partial)?;
    }
    workflow.combine_decryptions()?;
    let result = workflow.release_result()?;

    print_result(workflow.election(), &result);
    Ok(result)
}
