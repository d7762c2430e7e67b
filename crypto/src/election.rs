use crate::helper::Helper;
use crate::types::{ElGamalParams, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How the winners of a question are determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    /// answers with strictly more than half of the ballots
    Absolute,
    /// the answers with the most votes
    Relative,
}

impl Default for ResultType {
    fn default() -> Self {
        ResultType::Relative
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultType::Absolute => write!(f, "absolute"),
            ResultType::Relative => write!(f, "relative"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answers: Vec<String>,
    /// minimum number of answers a voter must select
    #[serde(default)]
    pub min: usize,
    /// maximum number of answers, `None` means unlimited
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub result_type: ResultType,
}

impl Question {
    pub fn new(question: &str, answers: &[&str], min: usize, max: Option<usize>) -> Self {
        Question {
            question: question.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            min,
            max,
            result_type: ResultType::default(),
        }
    }

    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    /// Checks that the question can be answered at all.
    pub fn validate(&self) -> Result<(), String> {
        if self.answers.is_empty() {
            return Err(format!("{:?} has no answers", self.question));
        }
        let max = self.max_selections();
        if max > self.answers.len() {
            return Err(format!(
                "{:?} allows {} selections but has only {} answers",
                self.question,
                max,
                self.answers.len()
            ));
        }
        if self.min > max {
            return Err(format!(
                "{:?} requires at least {} but allows at most {} selections",
                self.question, self.min, max
            ));
        }
        Ok(())
    }

    /// The largest number of answers a voter may select.
    pub fn max_selections(&self) -> usize {
        self.max.unwrap_or_else(|| self.answers.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub uuid: Uuid,
    pub name: String,
    pub params: ElGamalParams,
    pub questions: Vec<Question>,
    /// combined public key of all trustees, set when the election is frozen
    #[serde(default)]
    pub public_key: Option<PublicKey>,
}

impl Election {
    pub fn new(name: &str, params: ElGamalParams) -> Self {
        Election {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            params,
            questions: Vec::new(),
            public_key: None,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.public_key.is_some()
    }

    /// Fingerprint of everything a ballot commits to: uuid, group, questions
    /// and public key. Ballots carry this value in `election_hash`.
    pub fn hash(&self) -> String {
        let mut fields: Vec<Vec<u8>> = vec![
            self.uuid.as_bytes().to_vec(),
            self.name.as_bytes().to_vec(),
            Helper::biguint_bytes(&self.params.p),
            Helper::biguint_bytes(&self.params.q),
            Helper::biguint_bytes(&self.params.g),
            (self.questions.len() as u64).to_be_bytes().to_vec(),
        ];
        for question in self.questions.iter() {
            fields.push(question.question.as_bytes().to_vec());
            fields.push((question.answers.len() as u64).to_be_bytes().to_vec());
            for answer in question.answers.iter() {
                fields.push(answer.as_bytes().to_vec());
            }
            fields.push((question.min as u64).to_be_bytes().to_vec());
            // u64::MAX stands for "no maximum"
            let max = question.max.map(|m| m as u64).unwrap_or(u64::MAX);
            fields.push(max.to_be_bytes().to_vec());
            fields.push(question.result_type.to_string().into_bytes());
        }
        match &self.public_key {
            Some(pk) => fields.push(Helper::biguint_bytes(&pk.y)),
            None => fields.push(Vec::new()),
        }
        Helper::fingerprint("election", fields.iter().map(|f| f.as_slice()))
    }
}
