mod cli;
mod config;
mod error;
mod voting;

use clap::Parser;
use cli::cli::{Opts, SubCommand};
use config::Config;
use error::CliError;
use std::process;
use voting::{sealer, simulate, va, voter};

fn run(opts: Opts, config: &Config) -> Result<(), CliError> {
    match opts.subcmd {
        SubCommand::Params(t) => {
            let params = va::generate_params(&t, config)?;
            println!("generated a {} bit group", params.p.bits());
        }
        SubCommand::KeyGen(t) => {
            let trustee = sealer::keygen(&t, config)?;
            println!("generated trustee {} ({})", trustee.name, trustee.uuid);
        }
        SubCommand::Election(t) => {
            let election = va::setup_election(&t, config)?;
            println!("created election {} ({})", election.name, election.uuid);
        }
        SubCommand::Vote(t) => {
            voter::create_vote(&t, config)?;
        }
        SubCommand::VerifyBallot(t) => voter::verify_ballot(&t)?,
        SubCommand::Tally(t) => {
            va::compute_tally(&t, config)?;
        }
        SubCommand::Decrypt(t) => sealer::decrypt(&t, config)?,
        SubCommand::Combine(t) => {
            va::combine(&t, config)?;
        }
        SubCommand::Simulate(t) => {
            simulate::simulate(&t, config)?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    let config = Config::from_env();

    if let Err(err) = run(opts, &config) {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
