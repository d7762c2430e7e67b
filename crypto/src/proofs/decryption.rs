use crate::proofs::chaum_pedersen::{DhTuple, ZkProof};
use crate::types::{Cipher, PrivateKey, PublicKey};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

/// Proof that a decryption factor alpha^x was computed with the same x as the
/// trustee's public key y = g^x: Chaum-Pedersen on (g, alpha, y, factor).
pub struct DecryptionProof;

impl DecryptionProof {
    pub fn generate<R: RngCore + CryptoRng>(
        cipher: &Cipher,
        factor: &BigUint,
        sk: &PrivateKey,
        rng: &mut R,
    ) -> ZkProof {
        let pk = &sk.public_key;
        let tuple = DhTuple::new(&pk.params.g, &cipher.alpha, &pk.y, factor);
        ZkProof::generate(&tuple, &sk.x, &pk.params, rng)
    }

    /// Verifies the proof of a single decryption factor. The factor must be an
    /// element of the subgroup of order q.
    pub fn verify(cipher: &Cipher, factor: &BigUint, pk: &PublicKey, proof: &ZkProof) -> bool {
        if !pk.params.in_subgroup(factor) {
            return false;
        }
        let tuple = DhTuple::new(&pk.params.g, &cipher.alpha, &pk.y, factor);
        proof.verify(&tuple, &pk.params)
    }
}
