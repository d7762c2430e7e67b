use crate::error::FatalError;
use core::ops::AddAssign;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

/// Number of Miller-Rabin rounds. Each round has a false positive
/// probability of at most 1/4, 40 rounds bound it by 2^-80.
pub const MILLER_RABIN_ROUNDS: u32 = 40;

/// Smallest accepted bit size for generated groups.
pub const MIN_GROUP_BITS: u64 = 16;

// every odd prime below 256
const SMALL_PRIMES: [u32; 53] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Random;

impl Random {
    /// Generates a uniformly distributed random value: 0 <= x < number
    ///
    /// Draws values of the bit length of `number` until one is in range, so
    /// the result has no modulo bias. Every draw succeeds with probability > 1/2.
    ///
    /// Arguments
    /// * `number` - upper limit (exclusive)
    /// * `rng` - cryptographically secure random source
    pub fn get_random_less_than<R: RngCore + CryptoRng>(number: &BigUint, rng: &mut R) -> BigUint {
        assert!(*number > BigUint::zero(), "q must be greater than zero!");
        let bit_size: u64 = number.bits();
        loop {
            let candidate = rng.gen_biguint(bit_size);
            if &candidate < number {
                return candidate;
            }
        }
    }

    /// Generates a random value in the range: low <= x < high
    pub fn get_random_in_range<R: RngCore + CryptoRng>(
        low: &BigUint,
        high: &BigUint,
        rng: &mut R,
    ) -> BigUint {
        assert!(low < high, "empty range!");
        let width = high - low;
        low + Self::get_random_less_than(&width, rng)
    }

    /// Generates a safe prime p = 2q + 1 of exactly `bit_size` bits.
    /// Returns the pair (p, q).
    ///
    /// Arguments
    /// * `bit_size` - size of p in bits
    /// * `rng` - cryptographically secure random source
    pub fn generate_safe_prime<R: RngCore + CryptoRng>(
        bit_size: u64,
        rng: &mut R,
    ) -> Result<(BigUint, BigUint), FatalError> {
        if bit_size < MIN_GROUP_BITS {
            return Err(FatalError::ParameterGeneration(format!(
                "a group of {} bits is too small, at least {} bits are required",
                bit_size, MIN_GROUP_BITS
            )));
        }
        let one = BigUint::one();
        let two = BigUint::from(2u32);
        let top_bit = one.clone() << (bit_size - 2);
        let mut candidates: u64 = 0;

        loop {
            // q has bit_size - 1 bits with the highest bit set -> p has bit_size bits
            let mut q = rng.gen_biguint(bit_size - 1);
            q |= &top_bit;
            if (&q % &two).is_zero() {
                q.add_assign(&one);
            }
            if q.bits() != bit_size - 1 {
                continue;
            }
            candidates += 1;

            let p = &q * &two + &one;

            // cheap sieve on both q and p before running Miller-Rabin
            if Self::has_small_factor(&q) || Self::has_small_factor(&p) {
                continue;
            }
            if Self::is_prime(&q, MILLER_RABIN_ROUNDS, rng)
                && Self::is_prime(&p, MILLER_RABIN_ROUNDS, rng)
            {
                log::debug!(
                    "found a {} bit safe prime after {} candidates",
                    bit_size,
                    candidates
                );
                return Ok((p, q));
            }
        }
    }

    /// true if `num` is divisible by one of the small primes (and not equal to it)
    fn has_small_factor(num: &BigUint) -> bool {
        SMALL_PRIMES.iter().any(|&prime| {
            let prime = BigUint::from(prime);
            num != &prime && (num % &prime).is_zero()
        })
    }

    /// Miller-Rabin Primality Test
    ///
    /// Trial division by the small primes, then `rounds` rounds with random
    /// witnesses.
    ///
    /// https://en.wikipedia.org/wiki/Miller-Rabin_primality_test
    pub fn is_prime<R: RngCore + CryptoRng>(num: &BigUint, rounds: u32, rng: &mut R) -> bool {
        let zero: BigUint = BigUint::zero();
        let one: BigUint = BigUint::one();
        let two = BigUint::from(2u32);

        if *num < two {
            return false;
        }
        if *num == two {
            return true;
        }
        if num % &two == zero {
            return false;
        }
        for &prime in SMALL_PRIMES.iter() {
            let prime = BigUint::from(prime);
            if *num == prime {
                return true;
            }
            if (num % &prime).is_zero() {
                return false;
            }
        }

        // here num > 251, so the witness range [2, num - 2] is never empty
        let num_less_one = num - &one;

        // write num - 1 = 2^s * d with d odd
        let mut d = num_less_one.clone();
        let mut s: u64 = 0;
        while (&d % &two).is_zero() {
            d /= &two;
            s += 1;
        }

        'witness: for _ in 0..rounds {
            let a = rng.gen_biguint_range(&two, &num_less_one);
            let mut x = a.modpow(&d, num);
            if x == one || x == num_less_one {
                continue;
            }
            for _ in 1..s {
                x = x.modpow(&two, num);
                if x == num_less_one {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::random::{Random, MILLER_RABIN_ROUNDS};
    use num_bigint::BigUint;
    use num_traits::One;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn it_should_generate_random_number() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let number = BigUint::parse_bytes(b"123", 10).unwrap();
        for _ in 0..200 {
            let random = Random::get_random_less_than(&number, &mut rng);
            assert!(random < number);
        }
    }

    #[test]
    fn it_should_reach_every_value_below_a_small_bound() {
        // 5 = 0b101: rejection sampling draws 3 bit values and drops 5, 6, 7
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let number = BigUint::from(5u32);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let random = Random::get_random_less_than(&number, &mut rng);
            let index = random.to_u32_digits().first().copied().unwrap_or(0) as usize;
            seen[index] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn it_should_only_return_zero_for_bound_one() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..10 {
            let random = Random::get_random_less_than(&BigUint::one(), &mut rng);
            assert_eq!(random, BigUint::from(0u32));
        }
    }

    #[test]
    #[should_panic(expected = "q must be greater than zero!")]
    fn it_should_panic_for_bound_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        Random::get_random_less_than(&BigUint::from(0u32), &mut rng);
    }

    #[test]
    fn it_should_generate_random_number_in_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let low = BigUint::from(2u32);
        let high = BigUint::from(23u32);
        for _ in 0..100 {
            let random = Random::get_random_in_range(&low, &high, &mut rng);
            assert!(random >= low && random < high);
        }
    }

    #[test]
    fn check_that_2_is_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let number = BigUint::parse_bytes(b"2", 10).unwrap();
        let is_prime = Random::is_prime(&number, 20, &mut rng);
        assert!(is_prime);
    }

    #[test]
    fn check_that_0_and_1_are_not_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert!(!Random::is_prime(&BigUint::from(0u32), 20, &mut rng));
        assert!(!Random::is_prime(&BigUint::from(1u32), 20, &mut rng));
    }

    #[test]
    fn check_that_11_is_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let number = BigUint::from(11u32);
        let is_prime = Random::is_prime(&number, 20, &mut rng);
        assert!(is_prime);
    }

    #[test]
    fn check_that_84532559_is_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let number = BigUint::parse_bytes(b"84532559", 10).unwrap();
        let is_prime = Random::is_prime(&number, MILLER_RABIN_ROUNDS, &mut rng);
        assert!(is_prime);
    }

    #[test]
    fn check_that_84532560_is_not_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let number = BigUint::parse_bytes(b"84532560", 10).unwrap();
        let is_prime = Random::is_prime(&number, MILLER_RABIN_ROUNDS, &mut rng);
        assert!(!is_prime);
    }

    #[test]
    fn check_that_composite_numbers_are_not_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        // carmichael numbers 561 and 294409, 67591 = 257 * 263 passes the sieve
        for n in &[561u32, 294_409u32, 67_591u32] {
            let number = BigUint::from(*n);
            assert!(!Random::is_prime(&number, MILLER_RABIN_ROUNDS, &mut rng), "{}", n);
        }
    }

    #[test]
    fn check_that_mersenne_prime_61_is_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let number = (BigUint::one() << 61) - BigUint::one();
        assert!(Random::is_prime(&number, MILLER_RABIN_ROUNDS, &mut rng));
    }

    #[test]
    fn it_should_generate_a_safe_prime() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let bit_size = 48;

        let (p, q) = Random::generate_safe_prime(bit_size, &mut rng).unwrap();

        // check that p has exactly the requested size
        assert_eq!(p.bits(), bit_size);
        assert_eq!(p, &q * BigUint::from(2u32) + BigUint::one());

        assert!(Random::is_prime(&p, MILLER_RABIN_ROUNDS, &mut rng));
        assert!(Random::is_prime(&q, MILLER_RABIN_ROUNDS, &mut rng));
    }

    #[test]
    fn it_should_refuse_too_small_groups() {
        let mut rng = ChaCha20Rng::seed_from_u64(14);
        assert!(Random::generate_safe_prime(8, &mut rng).is_err());
    }
}
