pub mod sealer;
pub mod simulate;
pub mod va;
pub mod voter;

use crate::error::CliError;
use std::fs;
use std::path::Path;
use voting_crypto::Artifact;

pub fn read_artifact(path: &Path) -> Result<Artifact, CliError> {
    let bytes = fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Artifact::from_json(&bytes)?)
}

pub fn write_artifact(path: &Path, artifact: &Artifact, pretty: bool) -> Result<(), CliError> {
    let json = artifact.to_json(pretty)?;
    fs::write(path, json).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote {} artifact to {}", artifact.artifact_type(), path.display());
    Ok(())
}
