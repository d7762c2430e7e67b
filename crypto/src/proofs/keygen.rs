use crate::proofs::chaum_pedersen::{DhTuple, ZkProof};
use crate::types::{PrivateKey, PublicKey};
use rand::{CryptoRng, RngCore};

/// Proof of knowledge of the private key x behind a public key y = g^x.
///
/// This is the Chaum-Pedersen proof on the tuple (g, g, y, y), which reduces
/// to a Schnorr proof.
pub struct KeyGenerationProof;

impl KeyGenerationProof {
    pub fn generate<R: RngCore + CryptoRng>(sk: &PrivateKey, rng: &mut R) -> ZkProof {
        let pk = &sk.public_key;
        let g = &pk.params.g;
        let tuple = DhTuple::new(g, g, &pk.y, &pk.y);
        ZkProof::generate(&tuple, &sk.x, &pk.params, rng)
    }

    pub fn verify(pk: &PublicKey, proof: &ZkProof) -> bool {
        let g = &pk.params.g;
        let tuple = DhTuple::new(g, g, &pk.y, &pk.y);
        proof.verify(&tuple, &pk.params)
    }
}
