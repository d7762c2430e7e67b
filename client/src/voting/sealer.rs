use crate::cli::cli::{Decrypt, KeyGen};
use crate::config::Config;
use crate::error::CliError;
use crate::voting::{read_artifact, write_artifact};
use voting_crypto::{Artifact, Trustee};

/// Generates a trustee. The private copy and the public copy are written to
/// separate files, only the latter is meant to be shared.
pub fn keygen(args: &KeyGen, config: &Config) -> Result<Trustee, CliError> {
    let params = read_artifact(&args.params)?.into_params()?;
    let mut rng = rand::thread_rng();

    let trustee = Trustee::generate(&args.name, &params, &mut rng);
    write_artifact(&args.out, &Artifact::Trustee(trustee.clone()), config.pretty_json)?;
    write_artifact(
        &args.public_out,
        &Artifact::Trustee(trustee.public()),
        config.pretty_json,
    )?;
    Ok(trustee)
}

pub fn decrypt(args: &Decrypt, config: &Config) -> Result<(), CliError> {
    let trustee = read_artifact(&args.trustee)?.into_trustee()?;
    let tally = read_artifact(&args.tally)?.into_tally()?;
    if tally.public_key.params != trustee.public_key.params {
        return Err(CliError::InvalidArgument(
            "tally and trustee use different groups".to_string(),
        ));
    }

    let mut rng = rand::thread_rng();
    let partial = trustee.compute_decryption(&tally, &mut rng).ok_or_else(|| {
        CliError::InvalidArgument(format!(
            "{} does not contain a private key",
            args.trustee.display()
        ))
    })?;
    write_artifact(&args.out, &Artifact::PartialDecryption(partial), config.pretty_json)
}
