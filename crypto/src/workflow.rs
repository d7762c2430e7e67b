use crate::ballot::EncryptedVote;
use crate::election::{Election, Question};
use crate::error::{FatalError, WorkflowError};
use crate::tally::{ElectionResult, Tally};
use crate::trustee::{PartialDecryption, Trustee};
use crate::types::{ElGamalParams, PublicKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;
use uuid::Uuid;

/// The phases of an election. Transitions only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionState {
    Created,
    Frozen,
    VotingOpen,
    VotingClosed,
    TallyComputed,
    TrusteesDecrypting,
    DecryptionsCombined,
    ResultReleased,
}

impl fmt::Display for ElectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElectionState::Created => "created",
            ElectionState::Frozen => "frozen",
            ElectionState::VotingOpen => "voting open",
            ElectionState::VotingClosed => "voting closed",
            ElectionState::TallyComputed => "tally computed",
            ElectionState::TrusteesDecrypting => "trustees decrypting",
            ElectionState::DecryptionsCombined => "decryptions combined",
            ElectionState::ResultReleased => "result released",
        };
        write!(f, "{}", name)
    }
}

/// Who may cast a ballot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRoll {
    /// if set, every voter id is eligible
    pub open_registration: bool,
    pub voters: BTreeSet<String>,
}

impl VoterRoll {
    pub fn is_eligible(&self, voter_id: &str) -> bool {
        self.open_registration || self.voters.contains(voter_id)
    }

    pub fn is_empty(&self) -> bool {
        !self.open_registration && self.voters.is_empty()
    }
}

/// The phase of an election together with the data that only exists from
/// that phase on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum Phase {
    Created,
    Frozen,
    VotingOpen,
    VotingClosed,
    TallyComputed {
        tally: Tally,
    },
    TrusteesDecrypting {
        tally: Tally,
    },
    DecryptionsCombined {
        tally: Tally,
        result: ElectionResult,
    },
    ResultReleased {
        tally: Tally,
        result: ElectionResult,
    },
}

impl Phase {
    fn state(&self) -> ElectionState {
        match self {
            Phase::Created => ElectionState::Created,
            Phase::Frozen => ElectionState::Frozen,
            Phase::VotingOpen => ElectionState::VotingOpen,
            Phase::VotingClosed => ElectionState::VotingClosed,
            Phase::TallyComputed { .. } => ElectionState::TallyComputed,
            Phase::TrusteesDecrypting { .. } => ElectionState::TrusteesDecrypting,
            Phase::DecryptionsCombined { .. } => ElectionState::DecryptionsCombined,
            Phase::ResultReleased { .. } => ElectionState::ResultReleased,
        }
    }

    fn tally(&self) -> Option<&Tally> {
        match self {
            Phase::TallyComputed { tally }
            | Phase::TrusteesDecrypting { tally }
            | Phase::DecryptionsCombined { tally, .. }
            | Phase::ResultReleased { tally, .. } => Some(tally),
            _ => None,
        }
    }
}

/// Drives one election from setup to the released result.
///
/// Every operation checks the current state first and fails with
/// `WorkflowError::InvalidTransition` otherwise, so e.g. a tally can never be
/// computed for an election that was not frozen. A stored workflow is checked
/// for the same invariants when it is deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredWorkflow")]
pub struct ElectionWorkflow {
    election: Election,
    phase: Phase,
    /// public trustee records, holding their accepted partial decryptions
    trustees: IndexMap<Uuid, Trustee>,
    voters: VoterRoll,
    /// the last ballot of every voter, in order of first cast
    ballots: IndexMap<String, EncryptedVote>,
}

#[derive(Deserialize)]
struct StoredWorkflow {
    election: Election,
    phase: Phase,
    trustees: IndexMap<Uuid, Trustee>,
    voters: VoterRoll,
    ballots: IndexMap<String, EncryptedVote>,
}

impl TryFrom<StoredWorkflow> for ElectionWorkflow {
    type Error = WorkflowError;

    fn try_from(stored: StoredWorkflow) -> Result<Self, Self::Error> {
        let workflow = ElectionWorkflow {
            election: stored.election,
            phase: stored.phase,
            trustees: stored.trustees,
            voters: stored.voters,
            ballots: stored.ballots,
        };
        workflow.check_consistency()?;
        Ok(workflow)
    }
}

impl ElectionWorkflow {
    pub fn new(name: &str, params: ElGamalParams) -> Self {
        let election = Election::new(name, params);
        log::info!("created election {} ({:?})", election.uuid, election.name);
        ElectionWorkflow {
            election,
            phase: Phase::Created,
            trustees: IndexMap::new(),
            voters: VoterRoll::default(),
            ballots: IndexMap::new(),
        }
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            state: self.state(),
            action,
        }
    }

    fn expect_state(&self, allowed: &[ElectionState], action: &'static str) -> Result<(), WorkflowError> {
        if allowed.contains(&self.state()) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn transition(&mut self, to: Phase) {
        log::info!("election {}: {} -> {}", self.election.uuid, self.state(), to.state());
        self.phase = to;
    }

    /// The invariants between the phase and the stored data.
    fn check_consistency(&self) -> Result<(), WorkflowError> {
        let state = self.state();
        let inconsistent = || WorkflowError::Inconsistent(state);

        if self.trustees.values().any(|trustee| trustee.secret_key.is_some()) {
            return Err(inconsistent());
        }
        if (state >= ElectionState::Frozen) != self.election.is_frozen() {
            return Err(inconsistent());
        }
        if state >= ElectionState::Frozen {
            let keys: Vec<PublicKey> = self
                .trustees
                .values()
                .map(|trustee| trustee.public_key.clone())
                .collect();
            if keys.is_empty() || PublicKey::combine(&keys) != self.election.public_key {
                return Err(inconsistent());
            }
        }
        if state < ElectionState::VotingOpen && !self.ballots.is_empty() {
            return Err(inconsistent());
        }

        if let Some(tally) = self.phase.tally() {
            let questions = &self.election.questions;
            let same_shape = tally.cells.len() == questions.len()
                && tally
                    .cells
                    .iter()
                    .zip(questions.iter())
                    .all(|(row, question)| row.len() == question.answers.len());
            if !same_shape || self.election.public_key.as_ref() != Some(&tally.public_key) {
                return Err(inconsistent());
            }
        }

        let decrypting = state >= ElectionState::TrusteesDecrypting;
        let combined = state >= ElectionState::DecryptionsCombined;
        for trustee in self.trustees.values() {
            match (&trustee.decryption, self.phase.tally()) {
                (Some(partial), Some(tally)) if decrypting => {
                    if tally.verify_decryption(partial, &trustee.public_key).is_err() {
                        return Err(inconsistent());
                    }
                }
                (Some(_), _) => return Err(inconsistent()),
                (None, _) if combined => return Err(inconsistent()),
                (None, _) => {}
            }
        }
        Ok(())
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), WorkflowError> {
        self.expect_state(&[ElectionState::Created], "add a question")?;
        question.validate().map_err(WorkflowError::InvalidQuestion)?;
        self.election.questions.push(question);
        Ok(())
    }

    /// Admits a trustee after checking its group and its key proof. Only the
    /// public part of the trustee is stored.
    pub fn add_trustee(&mut self, trustee: &Trustee) -> Result<(), WorkflowError> {
        self.expect_state(&[ElectionState::Created], "add a trustee")?;
        if trustee.public_key.params != self.election.params {
            return Err(WorkflowError::TrusteeParamsMismatch(trustee.uuid));
        }
        if self.trustees.contains_key(&trustee.uuid) {
            return Err(WorkflowError::DuplicateTrustee(trustee.uuid));
        }
        trustee
            .verify_key_proof()
            .map_err(|reason| WorkflowError::TrusteeRejected {
                trustee: trustee.uuid,
                reason,
            })?;

        log::info!("election {}: added trustee {}", self.election.uuid, trustee.uuid);
        let mut record = trustee.public();
        record.decryption = None;
        self.trustees.insert(trustee.uuid, record);
        Ok(())
    }

    /// Voters can be registered until voting closes.
    pub fn register_voter(&mut self, voter_id: &str) -> Result<(), WorkflowError> {
        self.expect_state(
            &[
                ElectionState::Created,
                ElectionState::Frozen,
                ElectionState::VotingOpen,
            ],
            "register a voter",
        )?;
        self.voters.voters.insert(voter_id.to_string());
        Ok(())
    }

    pub fn set_open_registration(&mut self, open: bool) -> Result<(), WorkflowError> {
        self.expect_state(&[ElectionState::Created], "change the registration policy")?;
        self.voters.open_registration = open;
        Ok(())
    }

    /// Fixes the questions and the combined public key of all trustees.
    pub fn freeze(&mut self) -> Result<(), WorkflowError> {
        self.expect_state(&[ElectionState::Created], "freeze")?;
        if self.trustees.is_empty() {
            return Err(WorkflowError::NoTrustees);
        }
        if self.election.questions.is_empty() {
            return Err(WorkflowError::NoQuestions);
        }
        if self.voters.is_empty() {
            return Err(WorkflowError::NoEligibleVoters);
        }

        let keys: Vec<PublicKey> = self
            .trustees
            .values()
            .map(|trustee| trustee.public_key.clone())
            .collect();
        let public_key = PublicKey::combine(&keys).ok_or(FatalError::IncompatiblePublicKey)?;
        self.election.public_key = Some(public_key);
        self.transition(Phase::Frozen);
        Ok(())
    }

    pub fn open_voting(&mut self) -> Result<(), WorkflowError> {
        self.expect_state(&[ElectionState::Frozen], "open voting")?;
        self.transition(Phase::VotingOpen);
        Ok(())
    }

    /// Verifies and stores a ballot. A voter casting again replaces the
    /// previous ballot, so every voter is tallied at most once.
    ///
    /// Returns the ballot tracker.
    pub fn cast_vote(&mut self, voter_id: &str, vote: &EncryptedVote) -> Result<String, WorkflowError> {
        self.expect_state(&[ElectionState::VotingOpen], "cast a vote")?;
        if !self.voters.is_eligible(voter_id) {
            return Err(WorkflowError::VoterNotEligible(voter_id.to_string()));
        }
        if let Err(reason) = vote.check(&self.election) {
            log::warn!(
                "election {}: rejected ballot of {:?}: {}",
                self.election.uuid,
                voter_id,
                reason
            );
            return Err(WorkflowError::BallotRejected(reason));
        }

        let vote = vote.without_secrets();
        let tracker = vote.fingerprint();
        if self.ballots.insert(voter_id.to_string(), vote).is_some() {
            log::debug!("election {}: voter {:?} replaced the ballot", self.election.uuid, voter_id);
        }
        Ok(tracker)
    }

    pub fn close_voting(&mut self) -> Result<(), WorkflowError> {
        self.expect_state(&[ElectionState::VotingOpen], "close voting")?;
        self.transition(Phase::VotingClosed);
        Ok(())
    }

    /// Folds all stored ballots into the tally. They were verified on cast,
    /// they are verified once more here.
    pub fn compute_tally(&mut self) -> Result<Tally, WorkflowError> {
        self.expect_state(&[ElectionState::VotingClosed], "compute the tally")?;
        let votes: Vec<EncryptedVote> = self.ballots.values().cloned().collect();
        let (tally, results) = Tally::from_votes(&self.election, &votes)
            .map_err(|_| WorkflowError::Inconsistent(ElectionState::VotingClosed))?;

        for (voter_id, result) in self.ballots.keys().zip(results.iter()) {
            if let Err(reason) = result {
                log::warn!("election {}: ballot of {:?} not tallied: {}", self.election.uuid, voter_id, reason);
            }
        }
        self.transition(Phase::TallyComputed {
            tally: tally.clone(),
        });
        Ok(tally)
    }

    pub fn request_decryptions(&mut self) -> Result<(), WorkflowError> {
        let tally = match &self.phase {
            Phase::TallyComputed { tally } => tally.clone(),
            _ => return Err(self.invalid("request decryptions")),
        };
        self.transition(Phase::TrusteesDecrypting { tally });
        Ok(())
    }

    /// Accepts a trustee's partial decryption if all its proofs verify. A
    /// trustee whose submission was rejected may submit again.
    pub fn submit_decryption(&mut self, trustee: Uuid, partial: PartialDecryption) -> Result<(), WorkflowError> {
        let tally = match &self.phase {
            Phase::TrusteesDecrypting { tally } => tally,
            _ => return Err(self.invalid("submit a decryption")),
        };
        let record = self
            .trustees
            .get_mut(&trustee)
            .ok_or(WorkflowError::UnknownTrustee(trustee))?;

        if let Err(reason) = tally.verify_decryption(&partial, &record.public_key) {
            log::warn!(
                "election {}: rejected decryption of trustee {}: {}",
                self.election.uuid,
                trustee,
                reason
            );
            return Err(WorkflowError::TrusteeRejected { trustee, reason });
        }

        log::info!("election {}: accepted decryption of trustee {}", self.election.uuid, trustee);
        record.decryption = Some(partial);
        Ok(())
    }

    /// Trustees that still have to submit a valid partial decryption.
    pub fn pending_trustees(&self) -> Vec<Uuid> {
        self.trustees
            .values()
            .filter(|trustee| trustee.decryption.is_none())
            .map(|trustee| trustee.uuid)
            .collect()
    }

    /// Combines the partial decryptions of all trustees. The result is kept
    /// back until `release_result`.
    pub fn combine_decryptions(&mut self) -> Result<ElectionResult, WorkflowError> {
        let tally = match &self.phase {
            Phase::TrusteesDecrypting { tally } => tally,
            _ => return Err(self.invalid("combine decryptions")),
        };
        let pending = self.pending_trustees();
        if !pending.is_empty() {
            return Err(WorkflowError::MissingDecryptions(pending));
        }

        let partials: Vec<&PartialDecryption> = self
            .trustees
            .values()
            .filter_map(|trustee| trustee.decryption.as_ref())
            .collect();
        let result = tally.combine(&partials)?;
        let tally = tally.clone();
        self.transition(Phase::DecryptionsCombined {
            tally,
            result: result.clone(),
        });
        Ok(result)
    }

    pub fn release_result(&mut self) -> Result<ElectionResult, WorkflowError> {
        let (tally, result) = match &self.phase {
            Phase::DecryptionsCombined { tally, result } => (tally.clone(), result.clone()),
            _ => return Err(self.invalid("release the result")),
        };
        self.transition(Phase::ResultReleased {
            tally,
            result: result.clone(),
        });
        Ok(result)
    }

    pub fn state(&self) -> ElectionState {
        self.phase.state()
    }

    pub fn election(&self) -> &Election {
        &self.election
    }

    pub fn trustees(&self) -> impl Iterator<Item = &Trustee> {
        self.trustees.values()
    }

    pub fn voters(&self) -> &VoterRoll {
        &self.voters
    }

    pub fn ballots(&self) -> impl Iterator<Item = (&String, &EncryptedVote)> {
        self.ballots.iter()
    }

    pub fn tally(&self) -> Option<&Tally> {
        self.phase.tally()
    }

    /// The result, once it has been released.
    pub fn result(&self) -> Option<&ElectionResult> {
        match &self.phase {
            Phase::ResultReleased { result, .. } => Some(result),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ElectionState, ElectionWorkflow};
    use crate::tally::ElectionResult;
    use crate::ballot::EncryptedVote;
    use crate::election::Question;
    use crate::error::{VerificationFailure, WorkflowError};
    use crate::trustee::Trustee;
    use crate::types::ElGamalParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn created(rng: &mut ChaCha20Rng, trustees: usize) -> (ElectionWorkflow, Vec<Trustee>) {
        let params = ElGamalParams::generate(64, rng).unwrap();
        let mut workflow = ElectionWorkflow::new("board", params.clone());
        workflow
            .add_question(Question::new("yes or no?", &["yes", "no"], 0, Some(1)))
            .unwrap();
        let trustees: Vec<Trustee> = (0..trustees)
            .map(|i| Trustee::generate(&format!("trustee {}", i), &params, rng))
            .collect();
        for trustee in trustees.iter() {
            workflow.add_trustee(trustee).unwrap();
        }
        (workflow, trustees)
    }

    fn vote(workflow: &ElectionWorkflow, answer: usize, rng: &mut ChaCha20Rng) -> EncryptedVote {
        EncryptedVote::from_selections(workflow.election(), &[vec![answer]], rng).unwrap()
    }

    #[test]
    fn it_should_run_an_election_from_start_to_end() {
        let mut rng = ChaCha20Rng::seed_from_u64(121);
        let (mut workflow, trustees) = created(&mut rng, 2);
        for voter in &["alice", "bob", "carol"] {
            workflow.register_voter(voter).unwrap();
        }
        workflow.freeze().unwrap();
        workflow.open_voting().unwrap();

        let first = vote(&workflow, 1, &mut rng);
        workflow.cast_vote("alice", &first).unwrap();
        // alice casts again, only the second ballot counts
        let second = vote(&workflow, 0, &mut rng);
        let tracker = workflow.cast_vote("alice", &second).unwrap();
        assert_eq!(tracker, second.fingerprint());

        let ballot = vote(&workflow, 0, &mut rng);
        workflow.cast_vote("bob", &ballot).unwrap();
        let ballot = vote(&workflow, 1, &mut rng);
        workflow.cast_vote("carol", &ballot).unwrap();
        assert_eq!(workflow.ballots().count(), 3);
        assert!(workflow.ballots().all(|(_, b)| b.answers[0].randomness.is_none()));

        workflow.close_voting().unwrap();
        assert_eq!(workflow.compute_tally().unwrap().num_tallied, 3);
        workflow.request_decryptions().unwrap();

        for trustee in trustees.iter() {
            let partial = trustee
                .compute_decryption(workflow.tally().unwrap(), &mut rng)
                .unwrap();
            workflow.submit_decryption(trustee.uuid, partial).unwrap();
        }
        assert!(workflow.pending_trustees().is_empty());
        assert!(workflow.trustees().all(|t| t.decryption.is_some()));

        assert_eq!(workflow.combine_decryptions().unwrap().counts, vec![vec![2, 1]]);
        assert_eq!(workflow.result(), None);
        workflow.release_result().unwrap();
        assert_eq!(workflow.state(), ElectionState::ResultReleased);
        assert_eq!(workflow.result().unwrap().counts, vec![vec![2, 1]]);
    }

    #[test]
    fn it_should_not_freeze_without_preconditions() {
        let mut rng = ChaCha20Rng::seed_from_u64(122);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();

        let mut workflow = ElectionWorkflow::new("board", params.clone());
        assert_eq!(workflow.freeze(), Err(WorkflowError::NoTrustees));

        workflow
            .add_trustee(&Trustee::generate("alice", &params, &mut rng))
            .unwrap();
        assert_eq!(workflow.freeze(), Err(WorkflowError::NoQuestions));

        workflow
            .add_question(Question::new("yes or no?", &["yes", "no"], 0, Some(1)))
            .unwrap();
        assert_eq!(workflow.freeze(), Err(WorkflowError::NoEligibleVoters));

        workflow.set_open_registration(true).unwrap();
        assert!(workflow.freeze().is_ok());
        assert!(workflow.election().is_frozen());
    }

    #[test]
    fn it_should_reject_invalid_transitions() {
        let mut rng = ChaCha20Rng::seed_from_u64(123);
        let (mut workflow, _) = created(&mut rng, 1);

        assert_eq!(
            workflow.open_voting(),
            Err(WorkflowError::InvalidTransition {
                state: ElectionState::Created,
                action: "open voting"
            })
        );
        assert!(workflow.compute_tally().is_err());

        workflow.set_open_registration(true).unwrap();
        workflow.freeze().unwrap();
        // there is no way back
        assert!(workflow.freeze().is_err());
        assert!(workflow
            .add_question(Question::new("late?", &["a"], 0, None))
            .is_err());
        assert_eq!(workflow.state(), ElectionState::Frozen);
    }

    #[test]
    fn it_should_reject_trustees_without_a_valid_key_proof() {
        let mut rng = ChaCha20Rng::seed_from_u64(124);
        let (mut workflow, trustees) = created(&mut rng, 1);

        assert_eq!(
            workflow.add_trustee(&trustees[0]),
            Err(WorkflowError::DuplicateTrustee(trustees[0].uuid))
        );

        let params = workflow.election().params.clone();
        let mut forged = Trustee::generate("mallory", &params, &mut rng);
        forged.pok = trustees[0].pok.clone();
        assert_eq!(
            workflow.add_trustee(&forged),
            Err(WorkflowError::TrusteeRejected {
                trustee: forged.uuid,
                reason: VerificationFailure::InvalidKeyProof
            })
        );

        let other_params = ElGamalParams::generate(64, &mut rng).unwrap();
        let stranger = Trustee::generate("stranger", &other_params, &mut rng);
        assert_eq!(
            workflow.add_trustee(&stranger),
            Err(WorkflowError::TrusteeParamsMismatch(stranger.uuid))
        );
        assert!(workflow.trustees().all(|t| t.secret_key.is_none()));
    }

    #[test]
    fn it_should_only_accept_ballots_of_eligible_voters() {
        let mut rng = ChaCha20Rng::seed_from_u64(125);
        let (mut workflow, _) = created(&mut rng, 1);
        workflow.register_voter("alice").unwrap();
        workflow.freeze().unwrap();
        workflow.open_voting().unwrap();

        let ballot = vote(&workflow, 0, &mut rng);
        assert_eq!(
            workflow.cast_vote("mallory", &ballot),
            Err(WorkflowError::VoterNotEligible("mallory".to_string()))
        );

        let mut replayed = ballot.clone();
        replayed.election_uuid = uuid::Uuid::new_v4();
        assert_eq!(
            workflow.cast_vote("alice", &replayed),
            Err(WorkflowError::BallotRejected(VerificationFailure::ElectionUuidMismatch))
        );
        assert!(workflow.cast_vote("alice", &ballot).is_ok());
    }

    #[test]
    fn it_should_block_combination_until_all_trustees_submitted_valid_decryptions() {
        let mut rng = ChaCha20Rng::seed_from_u64(126);
        let (mut workflow, trustees) = created(&mut rng, 2);
        workflow.set_open_registration(true).unwrap();
        workflow.freeze().unwrap();
        workflow.open_voting().unwrap();
        let ballot = vote(&workflow, 1, &mut rng);
        workflow.cast_vote("alice", &ballot).unwrap();
        workflow.close_voting().unwrap();
        workflow.compute_tally().unwrap();
        workflow.request_decryptions().unwrap();

        let tally = workflow.tally().unwrap().clone();
        let first = trustees[0].compute_decryption(&tally, &mut rng).unwrap();
        workflow.submit_decryption(trustees[0].uuid, first).unwrap();

        let mut corrupted = trustees[1].compute_decryption(&tally, &mut rng).unwrap();
        let p = &workflow.election().params.p;
        corrupted.decryption_factors[0][0] = (&corrupted.decryption_factors[0][0] + 1u32) % p;
        assert!(matches!(
            workflow.submit_decryption(trustees[1].uuid, corrupted),
            Err(WorkflowError::TrusteeRejected { .. })
        ));
        assert_eq!(
            workflow.combine_decryptions(),
            Err(WorkflowError::MissingDecryptions(vec![trustees[1].uuid]))
        );

        // the trustee resubmits a valid decryption
        let valid = trustees[1].compute_decryption(&tally, &mut rng).unwrap();
        workflow.submit_decryption(trustees[1].uuid, valid).unwrap();
        assert_eq!(workflow.combine_decryptions().unwrap().counts, vec![vec![0, 1]]);

        let late = trustees[0].compute_decryption(&tally, &mut rng).unwrap();
        assert_eq!(
            workflow.submit_decryption(trustees[0].uuid, late),
            Err(WorkflowError::InvalidTransition {
                state: ElectionState::DecryptionsCombined,
                action: "submit a decryption"
            })
        );
    }

    #[test]
    fn it_should_roundtrip_through_json() {
        let mut rng = ChaCha20Rng::seed_from_u64(127);
        let (mut workflow, _) = created(&mut rng, 1);
        workflow.register_voter("alice").unwrap();
        workflow.freeze().unwrap();

        let json = serde_json::to_string(&workflow).unwrap();
        assert!(json.contains("\"state\":\"frozen\""));
        let parsed: ElectionWorkflow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, workflow);
    }

    fn released(rng: &mut ChaCha20Rng) -> ElectionWorkflow {
        let (mut workflow, trustees) = created(rng, 2);
        workflow.set_open_registration(true).unwrap();
        workflow.freeze().unwrap();
        workflow.open_voting().unwrap();
        let ballot = vote(&workflow, 0, rng);
        workflow.cast_vote("alice", &ballot).unwrap();
        workflow.close_voting().unwrap();
        let tally = workflow.compute_tally().unwrap();
        workflow.request_decryptions().unwrap();
        for trustee in trustees.iter() {
            let partial = trustee.compute_decryption(&tally, rng).unwrap();
            workflow.submit_decryption(trustee.uuid, partial).unwrap();
        }
        workflow.combine_decryptions().unwrap();
        workflow.release_result().unwrap();
        workflow
    }

    #[test]
    fn it_should_restore_a_released_election() {
        let mut rng = ChaCha20Rng::seed_from_u64(128);
        let workflow = released(&mut rng);

        let json = serde_json::to_string(&workflow).unwrap();
        let parsed: ElectionWorkflow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state(), ElectionState::ResultReleased);
        assert_eq!(parsed.result().unwrap().counts, vec![vec![1, 0]]);
        assert_eq!(parsed, workflow);
    }

    #[test]
    fn it_should_refuse_to_restore_a_state_without_its_data() {
        let mut rng = ChaCha20Rng::seed_from_u64(129);
        let (workflow, _) = created(&mut rng, 1);
        let json = serde_json::to_string(&workflow).unwrap();
        assert!(json.contains("\"state\":\"created\""));

        // voting closed, but the election was never frozen
        let closed = json.replace("\"state\":\"created\"", "\"state\":\"voting_closed\"");
        assert!(serde_json::from_str::<ElectionWorkflow>(&closed).is_err());

        // a computed tally always carries the tally
        let computed = json.replace("\"state\":\"created\"", "\"state\":\"tally_computed\"");
        assert!(serde_json::from_str::<ElectionWorkflow>(&computed).is_err());
    }

    #[test]
    fn it_should_refuse_to_restore_tampered_results_and_decryptions() {
        let mut rng = ChaCha20Rng::seed_from_u64(130);
        let workflow = released(&mut rng);
        let mut value = serde_json::to_value(&workflow).unwrap();

        // released, but one trustee never submitted
        let mut missing = value.clone();
        let trustees = missing["trustees"].as_object_mut().unwrap();
        let first = trustees.values_mut().next().unwrap();
        first.as_object_mut().unwrap().remove("decryption");
        assert!(serde_json::from_value::<ElectionWorkflow>(missing).is_err());

        // a decryption factor that does not match its proof
        let trustees = value["trustees"].as_object_mut().unwrap();
        let first = trustees.values_mut().next().unwrap();
        first["decryption"]["decryption_factors"][0][0] = serde_json::json!("2");
        assert!(serde_json::from_value::<ElectionWorkflow>(value).is_err());
    }

    #[test]
    fn it_should_keep_the_result_back_until_released() {
        let mut rng = ChaCha20Rng::seed_from_u64(131);
        let workflow = released(&mut rng);
        let result: &ElectionResult = workflow.result().unwrap();
        assert_eq!(result.num_tallied, 1);

        let mut json = serde_json::to_value(&workflow).unwrap();
        json["phase"]["state"] = serde_json::json!("decryptions_combined");
        let combined: ElectionWorkflow = serde_json::from_value(json).unwrap();
        assert_eq!(combined.result(), None);
        assert_eq!(combined.tally(), workflow.tally());
    }
}
