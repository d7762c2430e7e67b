use crate::error::FatalError;
use crate::random::{Random, MILLER_RABIN_ROUNDS};
use crate::types::{ElGamalParams, KeyPair, PrivateKey, PublicKey};
use blake2::{Blake2b, Digest};
use num_bigint::BigUint;
use num_traits::One;
use rand::{CryptoRng, RngCore};

pub struct Helper;

impl Helper {
    /// Generates a fresh group: a safe prime p = 2q + 1 of `bit_size` bits and
    /// a generator g of the subgroup of order q.
    pub fn generate_params<R: RngCore + CryptoRng>(
        bit_size: u64,
        rng: &mut R,
    ) -> Result<ElGamalParams, FatalError> {
        let (p, q) = Random::generate_safe_prime(bit_size, rng)?;
        let two = BigUint::from(2u32);

        // sample candidates in [2, p) until one lies in the subgroup of order q
        let g = loop {
            let candidate = Random::get_random_in_range(&two, &p, rng);
            if candidate.modpow(&q, &p).is_one() {
                break candidate;
            }
        };
        let params = ElGamalParams { p, g, q };

        if !Self::validate_params(&params, rng) {
            return Err(FatalError::ParameterGeneration(
                "generated group failed validation".to_string(),
            ));
        }
        log::info!("generated a {} bit group", bit_size);
        Ok(params)
    }

    /// Checks that q is prime, p = 2q + 1 is prime and g generates the
    /// subgroup of order q.
    pub fn validate_params<R: RngCore + CryptoRng>(params: &ElGamalParams, rng: &mut R) -> bool {
        let two = BigUint::from(2u32);
        params.p == &params.q * &two + BigUint::one()
            && Random::is_prime(&params.q, MILLER_RABIN_ROUNDS, rng)
            && Random::is_prime(&params.p, MILLER_RABIN_ROUNDS, rng)
            && Self::is_generator(params)
    }

    pub fn is_generator(params: &ElGamalParams) -> bool {
        // g is a generator (valid) if:
        // 1. 1 < g < p
        // 2. g^q mod p == 1
        params.g > BigUint::one()
            && params.g < params.p
            && params.g.modpow(&params.q, &params.p).is_one()
    }

    /// Generates a key pair: x uniformly in [0, q), y = g^x mod p
    pub fn generate_key_pair<R: RngCore + CryptoRng>(params: &ElGamalParams, rng: &mut R) -> KeyPair {
        let x = Random::get_random_less_than(&params.q, rng);
        Self::key_pair_from_secret(params, x)
    }

    pub fn key_pair_from_secret(params: &ElGamalParams, x: BigUint) -> KeyPair {
        assert!(x < params.q, "private key must be less than q!");
        let y = params.g_pow_secret(&x);
        let public_key = PublicKey {
            y,
            params: params.clone(),
        };
        let secret_key = PrivateKey {
            public_key: public_key.clone(),
            x,
        };
        KeyPair {
            public_key,
            secret_key,
        }
    }

    /// Blake2b over a list of fields, each prefixed with its length so that
    /// field boundaries are unambiguous. Returns the hex encoded digest.
    pub fn fingerprint<'a, I>(domain: &str, fields: I) -> String
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Blake2b::new()
            .chain((domain.len() as u64).to_be_bytes())
            .chain(domain);
        for field in fields {
            hasher = hasher.chain((field.len() as u64).to_be_bytes()).chain(field);
        }
        hex::encode(hasher.finalize())
    }

    /// Canonical byte encoding of a big integer used in fingerprints.
    pub fn biguint_bytes(value: &BigUint) -> Vec<u8> {
        value.to_bytes_be()
    }
}
