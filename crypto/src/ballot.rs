use crate::election::{Election, Question};
use crate::encryption::ElGamal;
use crate::error::{SelectionError, ValidationError, VerificationFailure, VerifyResult};
use crate::helper::Helper;
use crate::proofs::chaum_pedersen::ZkProof;
use crate::proofs::disjunctive::DisjunctiveProof;
use crate::random::Random;
use crate::types::{Cipher, ModuloOperations, PublicKey};
use num_bigint::BigUint;
use num_traits::Zero;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// The encrypted answer to one question.
///
/// `choices[i]` encrypts g^1 if answer i was selected and g^0 otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAnswer {
    pub choices: Vec<Cipher>,
    pub individual_proofs: Vec<DisjunctiveProof>,
    /// proof that the number of selections lies in [min, max], absent if the
    /// question has no maximum
    pub overall_proof: Option<DisjunctiveProof>,

    /// the encryption randomness, kept until the voter casts or audits
    #[serde(
        with = "crate::serde_decimal::option_vec",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub randomness: Option<Vec<BigUint>>,

    /// the plaintext selection, kept until the voter casts or audits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Vec<usize>>,
}

/// Checks a selection against the question's rules and returns the selected
/// answers as a set.
fn check_selection(
    question: &Question,
    selection: &[usize],
) -> Result<BTreeSet<usize>, SelectionError> {
    let answers = question.answers.len();
    let mut selected = BTreeSet::new();
    for &answer in selection {
        if answer >= answers {
            return Err(SelectionError::AnswerOutOfRange { answer, answers });
        }
        if !selected.insert(answer) {
            return Err(SelectionError::DuplicateAnswer(answer));
        }
    }
    if selected.len() < question.min {
        return Err(SelectionError::TooFewSelections {
            min: question.min,
            selected: selected.len(),
        });
    }
    if selected.len() > question.max_selections() {
        return Err(SelectionError::TooManySelections {
            max: question.max_selections(),
            selected: selected.len(),
        });
    }
    Ok(selected)
}

/// The homomorphic sum of all choices, i.e. an encryption of the number of
/// selected answers.
fn sum_choices(choices: &[Cipher], pk: &PublicKey) -> Cipher {
    choices
        .iter()
        .fold(None, |acc: Option<Cipher>, choice| {
            Some(ElGamal::accumulate(acc.as_ref(), choice, &pk.params.p))
        })
        .unwrap_or_else(Cipher::neutral)
}

impl EncryptedAnswer {
    /// Encrypts the selection for question `q_num` of the election.
    ///
    /// Every answer gets an encryption of g^0 or g^1 with a proof that it is one
    /// of the two. If the question has a maximum, the product of all choices is
    /// proven to encrypt a count in [min, max].
    pub fn from_selection<R: RngCore + CryptoRng>(
        election: &Election,
        q_num: usize,
        selection: &[usize],
        rng: &mut R,
    ) -> Result<EncryptedAnswer, SelectionError> {
        let pk = election
            .public_key
            .as_ref()
            .ok_or(SelectionError::ElectionNotFrozen)?;
        let question = election
            .questions
            .get(q_num)
            .ok_or(SelectionError::UnknownQuestion(q_num))?;

        // validate before any ciphertext is produced
        let selected = check_selection(question, selection)?;

        let q = &pk.params.q;
        let zero_or_one = ElGamal::generate_plaintexts(pk, 0, 1);
        let num_answers = question.answers.len();

        let mut choices = Vec::with_capacity(num_answers);
        let mut individual_proofs = Vec::with_capacity(num_answers);
        let mut randomness = Vec::with_capacity(num_answers);
        let mut randomness_sum = BigUint::zero();

        for answer in 0..num_answers {
            let plaintext_index = if selected.contains(&answer) { 1 } else { 0 };
            let r = Random::get_random_less_than(q, rng);
            let choice = ElGamal::encrypt(&zero_or_one[plaintext_index], &r, pk);
            let proof =
                DisjunctiveProof::generate(&choice, &zero_or_one, plaintext_index, &r, pk, rng);

            randomness_sum = randomness_sum.modadd(&r, q);
            choices.push(choice);
            individual_proofs.push(proof);
            randomness.push(r);
        }

        let overall_proof = match question.max {
            Some(max) => {
                let sum = sum_choices(&choices, pk);
                let plaintexts = ElGamal::generate_plaintexts(pk, question.min as u64, max as u64);
                let real_index = selected.len() - question.min;
                Some(DisjunctiveProof::generate(
                    &sum,
                    &plaintexts,
                    real_index,
                    &randomness_sum,
                    pk,
                    rng,
                ))
            }
            None => None,
        };

        Ok(EncryptedAnswer {
            choices,
            individual_proofs,
            overall_proof,
            randomness: Some(randomness),
            answer: Some(selected.into_iter().collect()),
        })
    }

    /// Verifies all proofs of the answer to question `q_num`.
    pub fn check(&self, pk: &PublicKey, question: &Question, q_num: usize) -> VerifyResult {
        let expected = question.answers.len();
        if self.choices.len() != expected || self.individual_proofs.len() != expected {
            return Err(VerificationFailure::ChoiceCountMismatch {
                question: q_num,
                expected,
                found: self.choices.len().min(self.individual_proofs.len()),
            });
        }
        if !self.choices.iter().all(|c| c.is_well_formed(&pk.params)) {
            return Err(VerificationFailure::MalformedCiphertext { question: q_num });
        }

        let zero_or_one = ElGamal::generate_plaintexts(pk, 0, 1);
        for (answer, (choice, proof)) in self
            .choices
            .iter()
            .zip(self.individual_proofs.iter())
            .enumerate()
        {
            if !proof.verify(choice, &zero_or_one, pk) {
                return Err(VerificationFailure::InvalidIndividualProof {
                    question: q_num,
                    answer,
                });
            }
        }

        match (question.max, &self.overall_proof) {
            (Some(max), Some(_)) if question.min > max => {
                return Err(VerificationFailure::InvalidOverallProof { question: q_num })
            }
            (Some(max), Some(proof)) => {
                let sum = sum_choices(&self.choices, pk);
                let plaintexts = ElGamal::generate_plaintexts(pk, question.min as u64, max as u64);
                if !proof.verify(&sum, &plaintexts, pk) {
                    return Err(VerificationFailure::InvalidOverallProof { question: q_num });
                }
            }
            (Some(_), None) => {
                return Err(VerificationFailure::MissingOverallProof { question: q_num })
            }
            (None, Some(_)) => {
                return Err(VerificationFailure::UnexpectedOverallProof { question: q_num })
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Re-encrypts the revealed selection with the revealed randomness.
    /// Returns the selection if every ciphertext matches.
    pub fn audit(&self, pk: &PublicKey) -> Option<Vec<usize>> {
        let randomness = self.randomness.as_ref()?;
        let answer = self.answer.as_ref()?;
        if randomness.len() != self.choices.len() {
            return None;
        }
        let zero_or_one = ElGamal::generate_plaintexts(pk, 0, 1);

        let matches = self
            .choices
            .iter()
            .zip(randomness.iter())
            .enumerate()
            .all(|(i, (choice, r))| {
                let index = if answer.contains(&i) { 1 } else { 0 };
                r < &pk.params.q && &ElGamal::encrypt(&zero_or_one[index], r, pk) == choice
            });
        if matches {
            Some(answer.clone())
        } else {
            None
        }
    }

    pub fn without_secrets(&self) -> EncryptedAnswer {
        EncryptedAnswer {
            randomness: None,
            answer: None,
            ..self.clone()
        }
    }

    fn shape(&self, question: &Question, q_num: usize) -> Result<(), ValidationError> {
        let expected = question.answers.len();
        if self.choices.len() != expected {
            return Err(ValidationError::ChoiceCount {
                question: q_num,
                expected,
                found: self.choices.len(),
            });
        }
        if self.individual_proofs.len() != expected {
            return Err(ValidationError::ProofCount {
                question: q_num,
                expected,
                found: self.individual_proofs.len(),
            });
        }
        for (choice, proof) in self.individual_proofs.iter().enumerate() {
            if proof.len() != 2 {
                return Err(ValidationError::ProofBranchCount {
                    question: q_num,
                    choice,
                    expected: 2,
                    found: proof.len(),
                });
            }
        }
        if let (Some(max), Some(proof)) = (question.max, &self.overall_proof) {
            let expected = (max + 1).saturating_sub(question.min);
            if proof.len() != expected {
                return Err(ValidationError::OverallProofBranchCount {
                    question: q_num,
                    expected,
                    found: proof.len(),
                });
            }
        }
        Ok(())
    }

    fn fingerprint_fields(&self, fields: &mut Vec<Vec<u8>>) {
        fields.push((self.choices.len() as u64).to_be_bytes().to_vec());
        for choice in self.choices.iter() {
            fields.push(Helper::biguint_bytes(&choice.alpha));
            fields.push(Helper::biguint_bytes(&choice.beta));
        }
        for proof in self.individual_proofs.iter() {
            proof_fields(proof, fields);
        }
        match &self.overall_proof {
            Some(proof) => proof_fields(proof, fields),
            None => fields.push(Vec::new()),
        }
    }
}

fn proof_fields(proof: &DisjunctiveProof, fields: &mut Vec<Vec<u8>>) {
    fields.push((proof.len() as u64).to_be_bytes().to_vec());
    for ZkProof {
        commitment,
        challenge,
        response,
    } in proof.0.iter()
    {
        fields.push(Helper::biguint_bytes(&commitment.a));
        fields.push(Helper::biguint_bytes(&commitment.b));
        fields.push(Helper::biguint_bytes(challenge));
        fields.push(Helper::biguint_bytes(response));
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVote {
    pub answers: Vec<EncryptedAnswer>,
    pub election_hash: String,
    pub election_uuid: Uuid,
}

impl EncryptedVote {
    /// Bundles the answers and binds them to the election.
    pub fn from_answers(election: &Election, answers: Vec<EncryptedAnswer>) -> EncryptedVote {
        EncryptedVote {
            answers,
            election_hash: election.hash(),
            election_uuid: election.uuid,
        }
    }

    /// Encrypts one selection per question.
    pub fn from_selections<R: RngCore + CryptoRng>(
        election: &Election,
        selections: &[Vec<usize>],
        rng: &mut R,
    ) -> Result<EncryptedVote, SelectionError> {
        if !election.is_frozen() {
            return Err(SelectionError::ElectionNotFrozen);
        }
        if selections.len() != election.questions.len() {
            return Err(SelectionError::QuestionCountMismatch {
                expected: election.questions.len(),
                found: selections.len(),
            });
        }
        let answers = selections
            .iter()
            .enumerate()
            .map(|(q_num, selection)| EncryptedAnswer::from_selection(election, q_num, selection, rng))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EncryptedVote::from_answers(election, answers))
    }

    /// Verifies the ballot against the election. The first failure rejects
    /// the whole ballot.
    pub fn check(&self, election: &Election) -> VerifyResult {
        let pk = election
            .public_key
            .as_ref()
            .ok_or(VerificationFailure::ElectionNotFrozen)?;

        if self.answers.len() != election.questions.len() {
            return Err(VerificationFailure::QuestionCountMismatch {
                expected: election.questions.len(),
                found: self.answers.len(),
            });
        }
        if self.election_uuid != election.uuid {
            return Err(VerificationFailure::ElectionUuidMismatch);
        }
        if self.election_hash != election.hash() {
            return Err(VerificationFailure::ElectionHashMismatch);
        }
        for (q_num, (answer, question)) in self
            .answers
            .iter()
            .zip(election.questions.iter())
            .enumerate()
        {
            answer.check(pk, question, q_num)?;
        }
        Ok(())
    }

    pub fn verify(&self, election: &Election) -> bool {
        self.check(election).is_ok()
    }

    /// Verifies many ballots in parallel. One result per ballot, in order.
    pub fn verify_batch(votes: &[EncryptedVote], election: &Election) -> Vec<VerifyResult> {
        votes.par_iter().map(|vote| vote.check(election)).collect()
    }

    /// Opens an audited ballot: returns the selections if every answer still
    /// carries its secrets and they reproduce the ciphertexts.
    pub fn audit(&self, election: &Election) -> Option<Vec<Vec<usize>>> {
        let pk = election.public_key.as_ref()?;
        if self.election_uuid != election.uuid || self.election_hash != election.hash() {
            return None;
        }
        self.answers.iter().map(|answer| answer.audit(pk)).collect()
    }

    /// The ballot as it is cast: randomness and plaintext removed.
    pub fn without_secrets(&self) -> EncryptedVote {
        EncryptedVote {
            answers: self.answers.iter().map(|a| a.without_secrets()).collect(),
            election_hash: self.election_hash.clone(),
            election_uuid: self.election_uuid,
        }
    }

    /// Ballot tracker returned to the voter. Secrets are not part of it.
    pub fn fingerprint(&self) -> String {
        let mut fields: Vec<Vec<u8>> = vec![
            self.election_uuid.as_bytes().to_vec(),
            self.election_hash.as_bytes().to_vec(),
            (self.answers.len() as u64).to_be_bytes().to_vec(),
        ];
        for answer in self.answers.iter() {
            answer.fingerprint_fields(&mut fields);
        }
        Helper::fingerprint("ballot", fields.iter().map(|f| f.as_slice()))
    }

    /// Parses a ballot and checks its shape against the election. Proofs are
    /// not verified here, see `check`.
    pub fn from_json(bytes: &[u8], election: &Election) -> Result<EncryptedVote, ValidationError> {
        let vote: EncryptedVote = serde_json::from_slice(bytes)?;
        let pk = election
            .public_key
            .as_ref()
            .ok_or(ValidationError::ElectionNotFrozen)?;

        if vote.answers.len() != election.questions.len() {
            return Err(ValidationError::AnswerCount {
                expected: election.questions.len(),
                found: vote.answers.len(),
            });
        }
        for (q_num, (answer, question)) in vote
            .answers
            .iter()
            .zip(election.questions.iter())
            .enumerate()
        {
            answer.shape(question, q_num)?;
            if !answer.choices.iter().all(|c| c.is_well_formed(&pk.params)) {
                return Err(ValidationError::ElementOutOfRange { question: q_num });
            }
        }
        Ok(vote)
    }
}
