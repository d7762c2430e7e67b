use crate::{error::FatalError, helper::Helper};
use core::ops::{Add, Mul, Sub};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct ElGamalParams {
    // modulus: p = 2q + 1 (safe prime)
    #[serde(with = "crate::serde_decimal")]
    pub p: BigUint,

    // generator g of the subgroup of order q
    #[serde(with = "crate::serde_decimal")]
    pub g: BigUint,

    // order of the subgroup: q = (p - 1) / 2
    #[serde(with = "crate::serde_decimal")]
    pub q: BigUint,
}

impl ElGamalParams {
    /// Builds the parameters from p and g, deriving q = (p - 1) / 2.
    pub fn from_p_and_g(p: BigUint, g: BigUint) -> Self {
        let q = (p.clone() - BigUint::one()) / BigUint::from(2u32);
        ElGamalParams { p, g, q }
    }

    /// Generates a new group of `bit_size` bits, see `Helper::generate_params`.
    pub fn generate<R: RngCore + CryptoRng>(
        bit_size: u64,
        rng: &mut R,
    ) -> Result<Self, FatalError> {
        Helper::generate_params(bit_size, rng)
    }

    pub fn validate<R: RngCore + CryptoRng>(&self, rng: &mut R) -> bool {
        Helper::validate_params(self, rng)
    }

    /// Exponentiation with a secret exponent (x, r or a proof nonce).
    ///
    /// All secret exponents are < q, the ladder always runs q.bits() steps.
    pub fn secret_pow(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        base.ct_modpow(exponent, &self.p, self.q.bits())
    }

    /// g^x mod p for a secret exponent x.
    pub fn g_pow_secret(&self, exponent: &BigUint) -> BigUint {
        self.secret_pow(&self.g, exponent)
    }

    /// true if 0 < value < p
    pub fn in_range(&self, value: &BigUint) -> bool {
        !value.is_zero() && value < &self.p
    }

    /// true if value is an element of the subgroup of order q: value^q mod p == 1
    ///
    /// Every value received from another party has to pass this check, e.g.
    /// p - beta is in range but encrypts -m.
    pub fn in_subgroup(&self, value: &BigUint) -> bool {
        self.in_range(value) && value.modpow(&self.q, &self.p).is_one()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    // public key: y = g^x mod p
    // - g: generator
    // - x: private key
    #[serde(with = "crate::serde_decimal")]
    pub y: BigUint,

    // system parameters (p, g, q)
    #[serde(flatten)]
    pub params: ElGamalParams,
}

impl PublicKey {
    /// Combines the public keys of all trustees into the election public key:
    /// y = y_1 * y_2 * ... * y_n mod p
    ///
    /// Returns `None` if the keys do not share the same group parameters.
    pub fn combine(keys: &[PublicKey]) -> Option<PublicKey> {
        assert!(!keys.is_empty(), "at least one public key is required!");
        let params = &keys[0].params;
        if keys.iter().any(|key| &key.params != params) {
            return None;
        }
        let y = keys
            .iter()
            .fold(BigUint::one(), |acc, key| acc.modmul(&key.y, &params.p));
        Some(PublicKey {
            y,
            params: params.clone(),
        })
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct PrivateKey {
    // the matching public key y = g^x mod p
    pub public_key: PublicKey,

    // private key: x
    // - x: a random value (x ∈ Zq)
    #[serde(with = "crate::serde_decimal")]
    pub x: BigUint,
}

impl PrivateKey {
    pub fn params(&self) -> &ElGamalParams {
        &self.public_key.params
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: PrivateKey,
}

#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub struct Cipher {
    // alpha = g^r mod p
    // - g: generator
    // - r: random value (r ∈ Zq)
    #[serde(with = "crate::serde_decimal")]
    pub alpha: BigUint,

    // beta = m * y^r mod p
    // - y: public key
    // - m: plaintext (group element g^v)
    #[serde(with = "crate::serde_decimal")]
    pub beta: BigUint,
}

impl Cipher {
    /// The trivial encryption of zero: (g^0, g^0 * y^0) = (1, 1).
    pub fn neutral() -> Self {
        Cipher {
            alpha: BigUint::one(),
            beta: BigUint::one(),
        }
    }

    /// true if both components are elements of the subgroup of order q
    pub fn is_well_formed(&self, params: &ElGamalParams) -> bool {
        params.in_subgroup(&self.alpha) && params.in_subgroup(&self.beta)
    }
}

pub trait ModuloOperations {
    /// Calculates the modular multiplicative of a BigUint: result = self * rhs % modulus.
    fn modmul(&self, rhs: &Self, modulus: &Self) -> Self;

    /// Calculates the modular division of two BigUints: result = self / divisor % modulus.
    fn moddiv(&self, divisor: &Self, modulus: &Self) -> Option<BigUint>;

    /// Calculates the modular addition of two BigUints: result = (self + other) % modulus.
    fn modadd(&self, other: &Self, modulus: &Self) -> Self;

    /// Calculates the modular subtraction of two BigUints: result = ((self + modulus) - other) % modulus.
    fn modsub(&self, other: &Self, modulus: &Self) -> Self;

    /// Calculates the modular multiplicative inverse x of an integer a such that ax ≡ 1 (mod m).
    /// Alternative formulation: a^-1 (mod m)
    fn invmod(&self, modulus: &Self) -> Option<BigUint>;

    /// Calculates self^exponent % modulus with a Montgomery ladder.
    ///
    /// The ladder performs exactly one multiplication and one squaring for each
    /// of the `width` exponent bits, whatever their values.
    fn ct_modpow(&self, exponent: &Self, modulus: &Self, width: u64) -> Self;
}

impl ModuloOperations for BigUint {
    fn modmul(&self, multiplier: &Self, modulus: &Self) -> Self {
        assert!(
            !modulus.is_zero(),
            "attempt to calculate with zero modulus!"
        );
        self.mul(multiplier) % modulus
    }

    fn moddiv(&self, divisor: &Self, modulus: &Self) -> Option<BigUint> {
        assert!(
            !modulus.is_zero(),
            "attempt to calculate with zero modulus!"
        );
        assert!(
            divisor < modulus,
            "modulus must be greater than the divisor!"
        );
        assert!(self < modulus, "modulus must be greater than the dividend!");
        let inverse_divisor = divisor.invmod(modulus)?;
        Some(self.mul(&inverse_divisor) % modulus)
    }

    fn modadd(&self, other: &Self, modulus: &Self) -> Self {
        assert!(
            !modulus.is_zero(),
            "attempt to calculate with zero modulus!"
        );
        self.add(other) % modulus
    }

    fn modsub(&self, other: &Self, modulus: &Self) -> Self {
        assert!(
            !modulus.is_zero(),
            "attempt to calculate with zero modulus!"
        );
        // reduce first, then shift by the whole modulus to stay > 0
        let a = self % modulus;
        let b = other % modulus;
        a.add(modulus).sub(b) % modulus
    }

    fn invmod(&self, modulus: &Self) -> Option<BigUint> {
        assert!(
            !modulus.is_zero(),
            "attempt to calculate with zero modulus!"
        );
        assert!(
            self < modulus,
            "modulus must be greater or equal to the number!"
        );
        let a = BigInt::from(self.clone());
        let m = BigInt::from(modulus.clone());

        let (g, x) = extended_gcd(&a, &m);
        if !g.is_one() {
            None
        } else {
            let result = ((x % &m) + &m) % &m;
            result.to_biguint()
        }
    }

    fn ct_modpow(&self, exponent: &Self, modulus: &Self, width: u64) -> Self {
        assert!(
            !modulus.is_zero(),
            "attempt to calculate with zero modulus!"
        );
        assert!(
            exponent.bits() <= width,
            "exponent is wider than the ladder!"
        );
        let bytes = exponent.to_bytes_le();

        // invariant: r1 = r0 * base
        let mut r0 = BigUint::one() % modulus;
        let mut r1 = self % modulus;

        for i in (0..width).rev() {
            let byte = bytes.get((i / 8) as usize).copied().unwrap_or(0);
            let swap = (byte >> (i % 8)) & 1 == 1;

            if swap {
                core::mem::swap(&mut r0, &mut r1);
            }
            r1 = r0.modmul(&r1, modulus);
            r0 = r0.modmul(&r0, modulus);
            if swap {
                core::mem::swap(&mut r0, &mut r1);
            }
        }
        r0
    }
}

/// Iterative extended Euclid. Returns (gcd, x) with a * x ≡ gcd (mod m).
fn extended_gcd(a: &BigInt, m: &BigInt) -> (BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), m.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let next_r = &old_r - &quotient * &r;
        old_r = core::mem::replace(&mut r, next_r);
        let next_s = &old_s - &quotient * &s;
        old_s = core::mem::replace(&mut s, next_s);
    }
    (old_r, old_s)
}
