pub mod chaum_pedersen;
pub mod decryption;
pub mod disjunctive;
pub mod keygen;

use chaum_pedersen::Commitment;
use num_bigint::BigUint;
use sha1::{Digest, Sha1};

/// Fiat-Shamir challenge generator shared by all proofs.
pub struct FiatShamir;

impl FiatShamir {
    /// The exact input of the hash: the decimal strings of every commitment's
    /// A then B, in branch order, joined by commas. "A0,B0,A1,B1,..."
    pub fn hash_input(commitments: &[Commitment]) -> String {
        commitments
            .iter()
            .flat_map(|commitment| {
                vec![
                    commitment.a.to_str_radix(10),
                    commitment.b.to_str_radix(10),
                ]
            })
            .collect::<Vec<String>>()
            .join(",")
    }

    /// SHA1 of the hash input, read as a big-endian integer.
    pub fn challenge(commitments: &[Commitment]) -> BigUint {
        assert!(!commitments.is_empty(), "commitments cannot be empty!");
        let digest = Sha1::digest(Self::hash_input(commitments).as_bytes());
        BigUint::from_bytes_be(&digest)
    }

    /// The challenge reduced into the exponent domain Zq.
    pub fn challenge_mod(commitments: &[Commitment], q: &BigUint) -> BigUint {
        Self::challenge(commitments) % q
    }
}
