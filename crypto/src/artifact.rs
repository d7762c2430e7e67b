use crate::ballot::EncryptedVote;
use crate::election::Election;
use crate::error::ValidationError;
use crate::tally::{ElectionResult, Tally};
use crate::trustee::{PartialDecryption, Trustee};
use crate::types::ElGamalParams;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every payload exchanged between the parties of an election, tagged with
/// its type.
///
/// ```json
/// { "type": "encrypted_vote", "answers": [...], "election_hash": "...", "election_uuid": "..." }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    Params(ElGamalParams),
    Trustee(Trustee),
    Election(Election),
    EncryptedVote(EncryptedVote),
    Tally(Tally),
    PartialDecryption(PartialDecryption),
    Result(ElectionResult),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactType {
    Params,
    Trustee,
    Election,
    EncryptedVote,
    Tally,
    PartialDecryption,
    Result,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Params => "params",
            ArtifactType::Trustee => "trustee",
            ArtifactType::Election => "election",
            ArtifactType::EncryptedVote => "encrypted_vote",
            ArtifactType::Tally => "tally",
            ArtifactType::PartialDecryption => "partial_decryption",
            ArtifactType::Result => "result",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

macro_rules! into_variant {
    ($name:ident, $variant:ident, $type:ty) => {
        pub fn $name(self) -> Result<$type, ValidationError> {
            match self {
                Artifact::$variant(inner) => Ok(inner),
                other => Err(ValidationError::UnexpectedArtifact {
                    expected: ArtifactType::$variant.as_str(),
                    found: other.artifact_type().as_str(),
                }),
            }
        }
    };
}

impl Artifact {
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Artifact::Params(_) => ArtifactType::Params,
            Artifact::Trustee(_) => ArtifactType::Trustee,
            Artifact::Election(_) => ArtifactType::Election,
            Artifact::EncryptedVote(_) => ArtifactType::EncryptedVote,
            Artifact::Tally(_) => ArtifactType::Tally,
            Artifact::PartialDecryption(_) => ArtifactType::PartialDecryption,
            Artifact::Result(_) => ArtifactType::Result,
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ValidationError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, ValidationError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    into_variant!(into_params, Params, ElGamalParams);
    into_variant!(into_trustee, Trustee, Trustee);
    into_variant!(into_election, Election, Election);
    into_variant!(into_encrypted_vote, EncryptedVote, EncryptedVote);
    into_variant!(into_tally, Tally, Tally);
    into_variant!(into_partial_decryption, PartialDecryption, PartialDecryption);
    into_variant!(into_result, Result, ElectionResult);
}
