use crate::proofs::FiatShamir;
use crate::random::Random;
use crate::types::{ElGamalParams, ModuloOperations};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// The prover's first message (A, B) = (g^w, h^w).
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(rename = "A", with = "crate::serde_decimal")]
    pub a: BigUint,
    #[serde(rename = "B", with = "crate::serde_decimal")]
    pub b: BigUint,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct ZkProof {
    pub commitment: Commitment,
    #[serde(with = "crate::serde_decimal")]
    pub challenge: BigUint,
    #[serde(with = "crate::serde_decimal")]
    pub response: BigUint,
}

/// A Diffie-Hellman tuple (g, h, u = g^x, v = h^x).
///
/// The Chaum-Pedersen proof shows that log_g(u) == log_h(v) without revealing x.
#[derive(Clone, Copy, Debug)]
pub struct DhTuple<'a> {
    pub g: &'a BigUint,
    pub h: &'a BigUint,
    pub u: &'a BigUint,
    pub v: &'a BigUint,
}

impl<'a> DhTuple<'a> {
    pub fn new(g: &'a BigUint, h: &'a BigUint, u: &'a BigUint, v: &'a BigUint) -> Self {
        DhTuple { g, h, u, v }
    }

    /// The commitment for nonce w: (A, B) = (g^w, h^w)
    pub fn commit(&self, w: &BigUint, params: &ElGamalParams) -> Commitment {
        Commitment {
            a: params.secret_pow(self.g, w),
            b: params.secret_pow(self.h, w),
        }
    }

    /// Back-computes a commitment that satisfies both verification equations
    /// for the given challenge and response:
    /// - A = g^t * (u^c)^-1
    /// - B = h^t * (v^c)^-1
    ///
    /// u and v must be elements of the subgroup of order q, (u^c)^-1 is computed as u^(q - c).
    pub fn simulate_commitment(
        &self,
        challenge: &BigUint,
        response: &BigUint,
        params: &ElGamalParams,
    ) -> Commitment {
        let p = &params.p;
        let q = &params.q;
        let neg_c = (q - (challenge % q)) % q;

        let a = self.g.modpow(response, p).modmul(&self.u.modpow(&neg_c, p), p);
        let b = self.h.modpow(response, p).modmul(&self.v.modpow(&neg_c, p), p);
        Commitment { a, b }
    }

    /// Checks g^t == A * u^c and h^t == B * v^c.
    ///
    /// All values must be in range: commitments in [1, p), challenge and response in [0, q).
    pub fn verify_equations(&self, proof: &ZkProof, params: &ElGamalParams) -> bool {
        let p = &params.p;
        let q = &params.q;
        let (c, t) = (&proof.challenge, &proof.response);
        let commitment = &proof.commitment;

        if !params.in_range(&commitment.a) || !params.in_range(&commitment.b) || c >= q || t >= q
        {
            return false;
        }

        // g^t == A * u^c
        let g_pow_t = self.g.modpow(t, p);
        let a_u_pow_c = commitment.a.modmul(&self.u.modpow(c, p), p);

        // h^t == B * v^c
        let h_pow_t = self.h.modpow(t, p);
        let b_v_pow_c = commitment.b.modmul(&self.v.modpow(c, p), p);

        g_pow_t == a_u_pow_c && h_pow_t == b_v_pow_c
    }
}

impl ZkProof {
    /// Generates a non-interactive Chaum-Pedersen proof that the prover knows x
    /// with u = g^x and v = h^x.
    ///
    /// Step by Step:
    /// 1. pick a random nonce w ∈ Zq, commit (A, B) = (g^w, h^w)
    /// 2. compute the challenge c = FiatShamir(A, B) mod q
    /// 3. compute the response t = w + x * c mod q
    pub fn generate<R: RngCore + CryptoRng>(
        tuple: &DhTuple,
        x: &BigUint,
        params: &ElGamalParams,
        rng: &mut R,
    ) -> ZkProof {
        let w = Random::get_random_less_than(&params.q, rng);
        let commitment = tuple.commit(&w, params);
        let challenge = FiatShamir::challenge_mod(&[commitment.clone()], &params.q);
        ZkProof::respond(commitment, challenge, &w, x, params)
    }

    /// Completes a proof for an externally chosen challenge: t = w + x * c mod q
    pub fn respond(
        commitment: Commitment,
        challenge: BigUint,
        w: &BigUint,
        x: &BigUint,
        params: &ElGamalParams,
    ) -> ZkProof {
        let q = &params.q;
        let x_c = x.modmul(&challenge, q);
        let response = w.modadd(&x_c, q);
        ZkProof {
            commitment,
            challenge,
            response,
        }
    }

    /// Produces an accepting transcript for a fixed challenge without knowing x.
    pub fn simulate<R: RngCore + CryptoRng>(
        tuple: &DhTuple,
        challenge: BigUint,
        params: &ElGamalParams,
        rng: &mut R,
    ) -> ZkProof {
        let response = Random::get_random_less_than(&params.q, rng);
        let commitment = tuple.simulate_commitment(&challenge, &response, params);
        ZkProof {
            commitment,
            challenge,
            response,
        }
    }

    /// Verifies a standalone proof: the challenge must be the Fiat-Shamir
    /// challenge of its own commitment and both equations must hold.
    pub fn verify(&self, tuple: &DhTuple, params: &ElGamalParams) -> bool {
        let expected = FiatShamir::challenge_mod(&[self.commitment.clone()], &params.q);
        self.challenge == expected && tuple.verify_equations(self, params)
    }
}
