use crate::encryption::ElGamal;
use crate::error::{VerificationFailure, VerifyResult};
use crate::helper::Helper;
use crate::proofs::chaum_pedersen::ZkProof;
use crate::proofs::decryption::DecryptionProof;
use crate::proofs::keygen::KeyGenerationProof;
use crate::tally::Tally;
use crate::types::{Cipher, ElGamalParams, PrivateKey, PublicKey};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One trustee's contribution to decrypting a tally: a decryption factor
/// alpha^x and a proof of its correctness per tally cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDecryption {
    #[serde(with = "crate::serde_decimal::nested")]
    pub decryption_factors: Vec<Vec<BigUint>>,
    pub decryption_proofs: Vec<Vec<ZkProof>>,
}

/// A key holder of the election.
///
/// The private key only lives in the trustee's own copy, everything that is
/// published goes through `public()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trustee {
    pub uuid: Uuid,
    pub name: String,
    pub public_key: PublicKey,
    /// proof of knowledge of the private key
    pub pok: ZkProof,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<PrivateKey>,
    /// the accepted partial decryption, set by the election once the trustee
    /// submitted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decryption: Option<PartialDecryption>,
}

impl Trustee {
    /// Generates a fresh key pair and the proof of knowledge for it.
    pub fn generate<R: RngCore + CryptoRng>(name: &str, params: &ElGamalParams, rng: &mut R) -> Self {
        let key_pair = Helper::generate_key_pair(params, rng);
        let pok = KeyGenerationProof::generate(&key_pair.secret_key, rng);
        log::debug!("generated key pair for trustee {:?}", name);

        Trustee {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            public_key: key_pair.public_key,
            pok,
            secret_key: Some(key_pair.secret_key),
            decryption: None,
        }
    }

    /// Registers a trustee that generated its key elsewhere. The proof of
    /// knowledge has to verify.
    pub fn from_public_key(name: &str, public_key: PublicKey, pok: ZkProof) -> Result<Self, VerificationFailure> {
        let trustee = Trustee {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            public_key,
            pok,
            secret_key: None,
            decryption: None,
        };
        trustee.verify_key_proof()?;
        Ok(trustee)
    }

    pub fn verify_key_proof(&self) -> VerifyResult {
        if self.public_key.params.in_subgroup(&self.public_key.y)
            && KeyGenerationProof::verify(&self.public_key, &self.pok)
        {
            Ok(())
        } else {
            Err(VerificationFailure::InvalidKeyProof)
        }
    }

    /// The decryption factor alpha^x of a single ciphertext and its proof.
    ///
    /// Returns `None` if this copy of the trustee holds no private key.
    pub fn decryption_factor_and_proof<R: RngCore + CryptoRng>(
        &self,
        cipher: &Cipher,
        rng: &mut R,
    ) -> Option<(BigUint, ZkProof)> {
        let sk = self.secret_key.as_ref()?;
        let factor = ElGamal::decryption_factor(cipher, sk);
        let proof = DecryptionProof::generate(cipher, &factor, sk, rng);
        Some((factor, proof))
    }

    /// Computes the partial decryption of every cell of the tally.
    ///
    /// Returns `None` if this copy of the trustee holds no private key.
    pub fn compute_decryption<R: RngCore + CryptoRng>(
        &self,
        tally: &Tally,
        rng: &mut R,
    ) -> Option<PartialDecryption> {
        assert!(
            tally.public_key.params == self.public_key.params,
            "tally and trustee need to share the same group!"
        );
        self.secret_key.as_ref()?;

        let mut decryption_factors = Vec::with_capacity(tally.cells.len());
        let mut decryption_proofs = Vec::with_capacity(tally.cells.len());
        for row in tally.ciphers().iter() {
            let (factors, proofs): (Vec<BigUint>, Vec<ZkProof>) = row
                .iter()
                .filter_map(|cipher| self.decryption_factor_and_proof(cipher, rng))
                .unzip();
            decryption_factors.push(factors);
            decryption_proofs.push(proofs);
        }
        log::debug!("trustee {} computed its partial decryption", self.uuid);

        Some(PartialDecryption {
            decryption_factors,
            decryption_proofs,
        })
    }

    /// A copy without the private key, safe to publish.
    pub fn public(&self) -> Trustee {
        Trustee {
            secret_key: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Trustee;
    use crate::election::Question;
    use crate::encryption::ElGamal;
    use crate::error::VerificationFailure;
    use crate::random::Random;
    use crate::tally::Tally;
    use crate::types::ElGamalParams;
    use num_bigint::BigUint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn it_should_generate_a_trustee_with_a_valid_key_proof() {
        let mut rng = ChaCha20Rng::seed_from_u64(81);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let trustee = Trustee::generate("alice", &params, &mut rng);

        assert!(trustee.verify_key_proof().is_ok());
        assert!(trustee.secret_key.is_some());
        assert_eq!(trustee.public_key.params, params);
    }

    #[test]
    fn it_should_not_publish_the_secret_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(82);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let trustee = Trustee::generate("alice", &params, &mut rng);

        let public = trustee.public();
        assert!(public.secret_key.is_none());
        assert_eq!(public.uuid, trustee.uuid);

        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("secret_key").is_none());
        let parsed: Trustee = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, public);
    }

    #[test]
    fn it_should_register_a_trustee_by_public_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(83);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let trustee = Trustee::generate("alice", &params, &mut rng);
        let other = Trustee::generate("bob", &params, &mut rng);

        let registered = Trustee::from_public_key("alice", trustee.public_key.clone(), trustee.pok.clone());
        assert!(registered.is_ok());

        let stolen = Trustee::from_public_key("mallory", other.public_key.clone(), trustee.pok.clone());
        assert_eq!(stolen, Err(VerificationFailure::InvalidKeyProof));
    }

    #[test]
    fn it_should_produce_verifiable_decryption_factors() {
        let mut rng = ChaCha20Rng::seed_from_u64(84);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let trustee = Trustee::generate("alice", &params, &mut rng);
        let pk = &trustee.public_key;

        let r = Random::get_random_less_than(&params.q, &mut rng);
        let cipher = ElGamal::encrypt_encode(&BigUint::from(1u32), &r, pk);
        let (factor, proof) = trustee.decryption_factor_and_proof(&cipher, &mut rng).unwrap();

        assert!(crate::proofs::decryption::DecryptionProof::verify(&cipher, &factor, pk, &proof));
        let plain = ElGamal::remove_factor(&cipher.beta, &factor, &params.p).unwrap();
        assert_eq!(plain, params.g);
    }

    #[test]
    fn it_should_not_decrypt_without_the_secret_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(85);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let trustee = Trustee::generate("alice", &params, &mut rng).public();

        let questions = vec![Question::new("yes or no?", &["yes", "no"], 0, Some(1))];
        let tally = Tally::new(&trustee.public_key, &questions);
        assert!(trustee.compute_decryption(&tally, &mut rng).is_none());
    }

    #[test]
    fn it_should_decrypt_a_tally_with_the_tally_shape() {
        let mut rng = ChaCha20Rng::seed_from_u64(86);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let trustee = Trustee::generate("alice", &params, &mut rng);

        let questions = vec![
            Question::new("yes or no?", &["yes", "no"], 0, Some(1)),
            Question::new("pick", &["a", "b", "c"], 0, None),
        ];
        let tally = Tally::new(&trustee.public_key, &questions);
        let partial = trustee.compute_decryption(&tally, &mut rng).unwrap();

        assert_eq!(partial.decryption_factors.len(), 2);
        assert_eq!(partial.decryption_factors[1].len(), 3);
        assert_eq!(partial.decryption_proofs[1].len(), 3);
        assert!(tally.verify_decryption(&partial, &trustee.public_key).is_ok());
    }

    #[test]
    fn it_should_reject_a_key_outside_the_subgroup() {
        let mut rng = ChaCha20Rng::seed_from_u64(87);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let mut trustee = Trustee::generate("mallory", &params, &mut rng);
        trustee.public_key.y = &params.p - &trustee.public_key.y;

        assert_eq!(trustee.verify_key_proof(), Err(VerificationFailure::InvalidKeyProof));
    }
}
