use crate::ballot::EncryptedVote;
use crate::dlog::DLogTable;
use crate::election::{Election, Question, ResultType};
use crate::encryption::ElGamal;
use crate::error::{CombineError, FatalError, VerificationFailure, VerifyResult};
use crate::proofs::decryption::DecryptionProof;
use crate::trustee::PartialDecryption;
use crate::types::{Cipher, ModuloOperations, PublicKey};
use num_bigint::BigUint;
use num_traits::One;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The homomorphic accumulator: one running ciphertext per (question, answer).
///
/// An empty cell (`None`) is the additive identity, no ballot has been folded
/// into it yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub public_key: PublicKey,
    pub cells: Vec<Vec<Option<Cipher>>>,
    pub num_tallied: u64,
}

impl Tally {
    pub fn new(public_key: &PublicKey, questions: &[Question]) -> Self {
        Tally {
            public_key: public_key.clone(),
            cells: questions
                .iter()
                .map(|question| vec![None; question.answers.len()])
                .collect(),
            num_tallied: 0,
        }
    }

    /// An empty tally for a frozen election.
    pub fn for_election(election: &Election) -> Option<Self> {
        let pk = election.public_key.as_ref()?;
        Some(Tally::new(pk, &election.questions))
    }

    fn assert_compatible(&self, pk: &PublicKey) {
        assert!(
            &self.public_key == pk,
            "{}",
            FatalError::IncompatiblePublicKey
        );
    }

    /// Folds a ballot into the tally, optionally verifying it first.
    ///
    /// There is no deduplication: every call counts the ballot once more.
    pub fn add_vote(&mut self, vote: &EncryptedVote, election: &Election, verify: bool) -> VerifyResult {
        let pk = election
            .public_key
            .as_ref()
            .ok_or(VerificationFailure::ElectionNotFrozen)?;
        self.assert_compatible(pk);

        if verify {
            vote.check(election)?;
        } else {
            self.check_shape(vote)?;
        }

        let p = &self.public_key.params.p;
        for (row, answer) in self.cells.iter_mut().zip(vote.answers.iter()) {
            for (cell, choice) in row.iter_mut().zip(answer.choices.iter()) {
                *cell = Some(ElGamal::accumulate(cell.as_ref(), choice, p));
            }
        }
        self.num_tallied += 1;
        Ok(())
    }

    fn check_shape(&self, vote: &EncryptedVote) -> VerifyResult {
        if vote.answers.len() != self.cells.len() {
            return Err(VerificationFailure::QuestionCountMismatch {
                expected: self.cells.len(),
                found: vote.answers.len(),
            });
        }
        for (question, (row, answer)) in self.cells.iter().zip(vote.answers.iter()).enumerate() {
            if row.len() != answer.choices.len() {
                return Err(VerificationFailure::ChoiceCountMismatch {
                    question,
                    expected: row.len(),
                    found: answer.choices.len(),
                });
            }
        }
        Ok(())
    }

    /// Merges the partial products of another tally under the same key.
    pub fn merge(&mut self, other: Tally) {
        self.assert_compatible(&other.public_key);
        assert!(
            self.cells.len() == other.cells.len()
                && self
                    .cells
                    .iter()
                    .zip(other.cells.iter())
                    .all(|(a, b)| a.len() == b.len()),
            "tallies need to have the same shape!"
        );

        let p = &self.public_key.params.p;
        for (row, other_row) in self.cells.iter_mut().zip(other.cells.into_iter()) {
            for (cell, other_cell) in row.iter_mut().zip(other_row.into_iter()) {
                if let Some(other_cipher) = other_cell {
                    *cell = Some(ElGamal::accumulate(cell.as_ref(), &other_cipher, p));
                }
            }
        }
        self.num_tallied += other.num_tallied;
    }

    /// Verifies all ballots in parallel, then folds the accepted ones with one
    /// partial tally per worker and merges them.
    ///
    /// Returns the tally and one result per ballot.
    pub fn from_votes(
        election: &Election,
        votes: &[EncryptedVote],
    ) -> Result<(Tally, Vec<VerifyResult>), VerificationFailure> {
        let base = Tally::for_election(election).ok_or(VerificationFailure::ElectionNotFrozen)?;
        let results = EncryptedVote::verify_batch(votes, election);

        let empty = || base.clone();
        let tally = votes
            .par_iter()
            .zip(results.par_iter())
            .filter(|(_, result)| result.is_ok())
            .try_fold(empty, |mut tally, (vote, _)| {
                tally.add_vote(vote, election, false).map(|_| tally)
            })
            .try_reduce(empty, |mut left, right| {
                left.merge(right);
                Ok(left)
            })?;

        log::info!(
            "tallied {} of {} ballots",
            tally.num_tallied,
            votes.len()
        );
        Ok((tally, results))
    }

    /// The ciphertext of a cell; empty cells are the trivial encryption of zero.
    pub fn cipher(&self, question: usize, answer: usize) -> Cipher {
        self.cells[question][answer]
            .clone()
            .unwrap_or_else(Cipher::neutral)
    }

    /// All cells as ciphertexts, see `cipher`.
    pub fn ciphers(&self) -> Vec<Vec<Cipher>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_else(Cipher::neutral))
                    .collect()
            })
            .collect()
    }

    fn has_shape_of(&self, partial: &PartialDecryption) -> bool {
        let rows = &partial.decryption_factors;
        let proofs = &partial.decryption_proofs;
        rows.len() == self.cells.len()
            && proofs.len() == self.cells.len()
            && self
                .cells
                .iter()
                .zip(rows.iter().zip(proofs.iter()))
                .all(|(cells, (factors, proofs))| {
                    cells.len() == factors.len() && cells.len() == proofs.len()
                })
    }

    /// Re-verifies every decryption proof of one trustee's contribution.
    pub fn verify_decryption(&self, partial: &PartialDecryption, trustee_pk: &PublicKey) -> VerifyResult {
        if !self.has_shape_of(partial) {
            return Err(VerificationFailure::DecryptionShapeMismatch);
        }
        for (question, row) in self.ciphers().iter().enumerate() {
            for (answer, cipher) in row.iter().enumerate() {
                let factor = &partial.decryption_factors[question][answer];
                let proof = &partial.decryption_proofs[question][answer];
                if !DecryptionProof::verify(cipher, factor, trustee_pk, proof) {
                    return Err(VerificationFailure::InvalidDecryptionProof { question, answer });
                }
            }
        }
        Ok(())
    }

    pub fn verify_decryption_proofs(&self, partial: &PartialDecryption, trustee_pk: &PublicKey) -> bool {
        self.verify_decryption(partial, trustee_pk).is_ok()
    }

    /// Combines the decryption factors of all trustees and recovers the counts.
    ///
    /// For each cell: raw = beta * (Π factor_i)^-1 mod p, then the discrete
    /// log of raw is looked up in a table of g^0..g^num_tallied.
    ///
    /// The factors are not verified here, see `combine_verified`.
    pub fn combine(&self, partials: &[&PartialDecryption]) -> Result<ElectionResult, CombineError> {
        if partials.is_empty() {
            return Err(CombineError::NoDecryptions);
        }
        if let Some(index) = partials.iter().position(|partial| !self.has_shape_of(partial)) {
            return Err(CombineError::ShapeMismatch(index));
        }

        let p = &self.public_key.params.p;
        let table = DLogTable::new(&self.public_key.params, self.num_tallied);
        let mut counts = Vec::with_capacity(self.cells.len());

        for (question, row) in self.ciphers().iter().enumerate() {
            let mut row_counts = Vec::with_capacity(row.len());
            for (answer, cipher) in row.iter().enumerate() {
                let combined = partials.iter().fold(BigUint::one(), |acc, partial| {
                    acc.modmul(&partial.decryption_factors[question][answer], p)
                });
                let not_found = CombineError::DiscreteLogNotFound {
                    question,
                    answer,
                    max: table.max(),
                };
                let raw = ElGamal::remove_factor(&cipher.beta, &combined, p).ok_or_else(|| not_found.clone())?;
                let count = table.lookup(&raw).ok_or(not_found)?;
                row_counts.push(count);
            }
            counts.push(row_counts);
        }

        Ok(ElectionResult {
            counts,
            num_tallied: self.num_tallied,
        })
    }

    /// Verifies every trustee's proofs before combining. A single invalid
    /// contribution blocks the whole combination.
    pub fn combine_verified(
        &self,
        contributions: &[(&PublicKey, &PartialDecryption)],
    ) -> Result<ElectionResult, CombineError> {
        for (index, (pk, partial)) in contributions.iter().enumerate() {
            self.verify_decryption(partial, pk)
                .map_err(|reason| CombineError::InvalidDecryption { index, reason })?;
        }
        let partials: Vec<&PartialDecryption> = contributions.iter().map(|(_, partial)| *partial).collect();
        self.combine(&partials)
    }
}

/// The plaintext counts per question and answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResult {
    pub counts: Vec<Vec<u64>>,
    pub num_tallied: u64,
}

impl ElectionResult {
    /// The winning answers of every question.
    ///
    /// Relative questions: the `max` (default 1) answers with the most votes,
    /// ties broken by answer order, answers without votes never win.
    /// Absolute questions: every answer with strictly more than half of the
    /// ballots.
    pub fn winners(&self, questions: &[Question]) -> Vec<Vec<usize>> {
        assert!(
            questions.len() == self.counts.len(),
            "questions and counts need to have the same length!"
        );
        questions
            .iter()
            .zip(self.counts.iter())
            .map(|(question, counts)| match question.result_type {
                ResultType::Absolute => counts
                    .iter()
                    .enumerate()
                    .filter(|(_, count)| **count * 2 > self.num_tallied)
                    .map(|(answer, _)| answer)
                    .collect(),
                ResultType::Relative => {
                    let mut ranked: Vec<(usize, u64)> = counts
                        .iter()
                        .copied()
                        .enumerate()
                        .filter(|(_, count)| *count > 0)
                        .collect();
                    // stable sort keeps the answer order for ties
                    ranked.sort_by(|a, b| b.1.cmp(&a.1));
                    ranked
                        .into_iter()
                        .take(question.max.unwrap_or(1))
                        .map(|(answer, _)| answer)
                        .collect()
                }
            })
            .collect()
    }
}
