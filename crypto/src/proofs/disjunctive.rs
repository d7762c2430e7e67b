use crate::proofs::chaum_pedersen::{Commitment, DhTuple, ZkProof};
use crate::proofs::FiatShamir;
use crate::random::Random;
use crate::types::{Cipher, ModuloOperations, PublicKey};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// A proof that a ciphertext encrypts one of k candidate plaintexts.
///
/// One `ZkProof` per candidate, index-aligned with the plaintexts. Exactly one
/// branch is real, the others are simulated, and the challenges sum up to the
/// Fiat-Shamir challenge of all commitments.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisjunctiveProof(pub Vec<ZkProof>);

/// v_i = beta * m_i^-1, the value that must equal y^r if the cipher encrypts m_i.
///
/// m_i is a power of g, so m_i^-1 = m_i^(q - 1).
fn strip_plaintext(cipher: &Cipher, plaintext: &BigUint, pk: &PublicKey) -> BigUint {
    let p = &pk.params.p;
    let q_less_one = &pk.params.q - BigUint::one();
    let inverse = plaintext.modpow(&q_less_one, p);
    cipher.beta.modmul(&inverse, p)
}

impl DisjunctiveProof {
    /// Generates the proof that `cipher` = (g^r, m * y^r) with m = plaintexts[real_index].
    ///
    /// Branch i proves the DH tuple (g, y, alpha, beta * m_i^-1).
    ///
    /// Step by Step:
    /// 1. simulate every branch i != real_index with a random challenge c_i
    /// 2. commit (A, B) = (g^w, y^w) for the real branch
    /// 3. C = FiatShamir(all commitments) mod q
    /// 4. c_real = C - Σ c_i mod q, t_real = w + r * c_real mod q
    pub fn generate<R: RngCore + CryptoRng>(
        cipher: &Cipher,
        plaintexts: &[BigUint],
        real_index: usize,
        r: &BigUint,
        pk: &PublicKey,
        rng: &mut R,
    ) -> DisjunctiveProof {
        assert!(!plaintexts.is_empty(), "plaintexts cannot be empty!");
        assert!(
            real_index < plaintexts.len(),
            "real index must point to one of the plaintexts!"
        );
        let params = &pk.params;
        let q = &params.q;
        let g = &params.g;

        let stripped: Vec<BigUint> = plaintexts
            .iter()
            .map(|plaintext| strip_plaintext(cipher, plaintext, pk))
            .collect();

        let w = Random::get_random_less_than(q, rng);
        let mut branches: Vec<Option<ZkProof>> = Vec::with_capacity(plaintexts.len());
        let mut commitments: Vec<Commitment> = Vec::with_capacity(plaintexts.len());
        let mut simulated_sum = BigUint::zero();

        for (i, v_i) in stripped.iter().enumerate() {
            let tuple = DhTuple::new(g, &pk.y, &cipher.alpha, v_i);
            if i == real_index {
                commitments.push(tuple.commit(&w, params));
                branches.push(None);
            } else {
                let challenge = Random::get_random_less_than(q, rng);
                simulated_sum = simulated_sum.modadd(&challenge, q);
                let simulated = ZkProof::simulate(&tuple, challenge, params, rng);
                commitments.push(simulated.commitment.clone());
                branches.push(Some(simulated));
            }
        }

        let global_challenge = FiatShamir::challenge_mod(&commitments, q);
        let real_challenge = global_challenge.modsub(&simulated_sum, q);
        let real = ZkProof::respond(
            commitments[real_index].clone(),
            real_challenge,
            &w,
            r,
            params,
        );

        let proofs = branches
            .into_iter()
            .map(|branch| match branch {
                Some(simulated) => simulated,
                None => real.clone(),
            })
            .collect();
        DisjunctiveProof(proofs)
    }

    /// Verifies that every branch satisfies its equations and that the
    /// challenges sum up to the Fiat-Shamir challenge of all commitments.
    pub fn verify(&self, cipher: &Cipher, plaintexts: &[BigUint], pk: &PublicKey) -> bool {
        let proofs = &self.0;
        if proofs.is_empty() || proofs.len() != plaintexts.len() {
            return false;
        }
        let params = &pk.params;
        let q = &params.q;
        if !cipher.is_well_formed(params) {
            return false;
        }

        let mut challenge_sum = BigUint::zero();
        for (proof, plaintext) in proofs.iter().zip(plaintexts.iter()) {
            let v_i = strip_plaintext(cipher, plaintext, pk);
            let tuple = DhTuple::new(&params.g, &pk.y, &cipher.alpha, &v_i);
            if !tuple.verify_equations(proof, params) {
                return false;
            }
            challenge_sum = challenge_sum.modadd(&proof.challenge, q);
        }

        let commitments: Vec<Commitment> = proofs
            .iter()
            .map(|proof| proof.commitment.clone())
            .collect();
        challenge_sum == FiatShamir::challenge_mod(&commitments, q)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
