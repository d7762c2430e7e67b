use crate::dlog::DLogTable;
use crate::types::{Cipher, ModuloOperations, PrivateKey, PublicKey};
use num_bigint::BigUint;
use num_traits::One;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ElGamal;

impl ElGamal {
    /// Returns an ElGamal Encryption of a group element
    /// - (alpha, beta) = (g^r, m * y^r)
    ///
    /// ## Arguments
    ///
    /// * `m`  - The plaintext, an element of the subgroup (BigUint)
    /// * `r`  - The random number used to encrypt the vote (r ∈ Zq)
    /// * `pk` - The public key used to encrypt the vote
    pub fn encrypt(m: &BigUint, r: &BigUint, pk: &PublicKey) -> Cipher {
        let params = &pk.params;
        let p = &params.p;

        // alpha = g^r
        let alpha = params.g_pow_secret(r);

        // beta = m * y^r
        let y_pow_r = params.secret_pow(&pk.y, r);
        let beta = y_pow_r.modmul(m, p);

        Cipher { alpha, beta }
    }

    /// Returns an ElGamal Encryption of a message
    /// - (alpha, beta) = (g^r, g^v * y^r)
    ///
    /// ## Arguments
    ///
    /// * `v`  - The message (BigUint), encoded as g^v
    /// * `r`  - The random number used to encrypt the vote
    /// * `pk` - The public key used to encrypt the vote
    pub fn encrypt_encode(v: &BigUint, r: &BigUint, pk: &PublicKey) -> Cipher {
        let encoded = ElGamal::encode_message(v, &pk.params.g, &pk.params.p);
        ElGamal::encrypt(&encoded, r, pk)
    }

    /// Encodes a plain-text message to be used in an exponential ElGamal scheme
    /// Returns encoded_message = g^v.
    ///
    /// ## Arguments
    ///
    /// * `v` - The message (BigUint)
    /// * `g` - The generator of the cyclic group (BigUint)
    /// * `p` - The group modulus p (BigUint)
    pub fn encode_message(v: &BigUint, g: &BigUint, p: &BigUint) -> BigUint {
        g.modpow(v, p)
    }

    /// Returns the candidate plaintexts [g^min, g^(min+1), ..., g^max].
    pub fn generate_plaintexts(pk: &PublicKey, min: u64, max: u64) -> Vec<BigUint> {
        assert!(min <= max, "min must not be greater than max!");
        let p = &pk.params.p;
        let g = &pk.params.g;
        let mut plaintexts = Vec::with_capacity((max - min + 1) as usize);

        let mut current = ElGamal::encode_message(&BigUint::from(min), g, p);
        for _ in min..=max {
            let next = current.modmul(g, p);
            plaintexts.push(current);
            current = next;
        }
        plaintexts
    }

    /// The partial decryption of a trustee: alpha^x mod p
    pub fn decryption_factor(cipher: &Cipher, sk: &PrivateKey) -> BigUint {
        sk.params().secret_pow(&cipher.alpha, &sk.x)
    }

    /// Removes the combined decryption factor from beta: beta * factor^-1 mod p
    ///
    /// Returns `None` if the factor is not invertible.
    pub fn remove_factor(beta: &BigUint, factor: &BigUint, p: &BigUint) -> Option<BigUint> {
        let inverse = (factor % p).invmod(p)?;
        Some(beta.modmul(&inverse, p))
    }

    /// Returns the group element contained in an ElGamal Encryption
    /// - s = alpha^x
    /// - m = beta * s^-1
    ///
    /// ## Arguments
    ///
    /// * `cipher` - The ElGamal Encryption (alpha: BigUint, beta: BigUint)
    /// * `sk`     - The private key used to decrypt the vote
    pub fn decrypt(cipher: &Cipher, sk: &PrivateKey) -> Option<BigUint> {
        let s = ElGamal::decryption_factor(cipher, sk);
        ElGamal::remove_factor(&cipher.beta, &s, &sk.params().p)
    }

    /// Decrypts and recovers the exponent v of m = g^v from the lookup table.
    pub fn decrypt_decode(cipher: &Cipher, sk: &PrivateKey, table: &DLogTable) -> Option<u64> {
        let m = ElGamal::decrypt(cipher, sk)?;
        table.lookup(&m)
    }

    /// Homomorphically adds two ElGamal encryptions.
    /// Returns an ElGamal encryption.
    ///
    /// ## Arguments
    ///
    /// * `this`  - a Cipher { alpha, beta } (ElGamal encryption)
    /// * `other` - a Cipher { alpha, beta } (ElGamal encryption)
    /// * `p`     - The group modulus p (BigUint)
    pub fn add(this: &Cipher, other: &Cipher, p: &BigUint) -> Cipher {
        Cipher {
            alpha: this.alpha.modmul(&other.alpha, p),
            beta: this.beta.modmul(&other.beta, p),
        }
    }

    /// Adds `other` to an accumulator. An empty accumulator is the additive
    /// identity and yields `other` unchanged.
    pub fn accumulate(acc: Option<&Cipher>, other: &Cipher, p: &BigUint) -> Cipher {
        match acc {
            Some(this) => ElGamal::add(this, other, p),
            None => other.clone(),
        }
    }

    /// Returns an ElGamal re-encryption of a message
    /// - message:      (alpha, beta)   = (g^r, y^r * m)
    /// - reencryption: (alpha', beta') = (alpha * g^r', beta * y^r') = (g^(r + r'), y^(r + r') * m)
    ///
    /// ## Arguments
    ///
    /// * `cipher` - An ElGamal Encryption { alpha: BigUint, beta: BigUint }
    /// * `r`      - The random number used to re-encrypt the vote
    /// * `pk`     - The public key used to re-encrypt the vote
    pub fn re_encrypt(cipher: &Cipher, r: &BigUint, pk: &PublicKey) -> Cipher {
        let zero = ElGamal::encrypt(&BigUint::one(), r, pk);
        ElGamal::add(cipher, &zero, &pk.params.p)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        dlog::DLogTable, encryption::ElGamal, helper::Helper, random::Random, types::ElGamalParams,
        types::KeyPair, types::PublicKey,
    };
    use num_bigint::BigUint;
    use num_traits::{One, Zero};
    use quickcheck_macros::quickcheck;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    // p = 2039, q = 1019, g = 4
    fn setup_system(x: u32) -> KeyPair {
        let params = ElGamalParams::from_p_and_g(BigUint::from(2039u32), BigUint::from(4u32));
        Helper::key_pair_from_secret(&params, BigUint::from(x))
    }

    #[test]
    fn it_should_encode_a_message() {
        let params = ElGamalParams::from_p_and_g(BigUint::from(7u32), BigUint::from(4u32));
        let message = BigUint::from(3u32);
        let encoded_message = ElGamal::encode_message(&message, &params.g, &params.p);

        // g^3 mod 7 -> g = 4, 4^3 mod 7 = 64 mod 7 = 1
        assert_eq!(encoded_message, BigUint::from(1u32));
    }

    #[test]
    fn it_should_encrypt() {
        let params = ElGamalParams::from_p_and_g(BigUint::from(7u32), BigUint::from(4u32));
        let pk = PublicKey {
            y: BigUint::from(2u32),
            params,
        };

        // the value of the message: 1
        let message = BigUint::from(1u32);

        // a new random value for the encryption
        let r_ = BigUint::from(1u32);

        // encrypt the message
        let encrypted_message = ElGamal::encrypt_encode(&message, &r_, &pk);

        // check that alpha = g^r_ -> g = 4 -> 4^1 mod 7 = 4
        assert_eq!(encrypted_message.alpha, BigUint::from(4u32));

        // check that beta = y^r_ * g^m
        // beta = (2^1 mod 7 * 4^1 mod 7) mod 7
        // beta = (2 * 4) mod 7 = 1
        assert_eq!(encrypted_message.beta, BigUint::from(1u32));
    }

    #[test]
    fn it_should_generate_plaintexts() {
        let key_pair = setup_system(5);
        let pk = &key_pair.public_key;
        let plaintexts = ElGamal::generate_plaintexts(pk, 2, 5);

        assert_eq!(plaintexts.len(), 4);
        for (i, plaintext) in plaintexts.iter().enumerate() {
            let v = BigUint::from(i as u32 + 2);
            assert_eq!(plaintext, &pk.params.g.modpow(&v, &pk.params.p));
        }

        let single = ElGamal::generate_plaintexts(pk, 0, 0);
        assert_eq!(single, vec![BigUint::one()]);
    }

    #[test]
    #[should_panic(expected = "min must not be greater than max!")]
    fn it_should_panic_generating_plaintexts_for_an_empty_range() {
        let key_pair = setup_system(5);
        ElGamal::generate_plaintexts(&key_pair.public_key, 3, 2);
    }

    #[test]
    fn it_should_encrypt_decrypt_two() {
        let KeyPair {
            public_key: pk,
            secret_key: sk,
        } = setup_system(17);
        let table = DLogTable::new(&pk.params, 10);

        // the value of the message: 2
        let message = BigUint::from(2u32);

        // a new random value for the encryption
        let r_ = BigUint::from(5u32);

        // encrypt the message
        let encrypted_message = ElGamal::encrypt_encode(&message, &r_, &pk);

        // decrypt the encrypted_message & check that the messages are equal
        let decrypted = ElGamal::decrypt_decode(&encrypted_message, &sk, &table);
        assert_eq!(decrypted, Some(2));
    }

    #[test]
    fn it_should_add_two_ones() {
        let KeyPair {
            public_key: pk,
            secret_key: sk,
        } = setup_system(17);
        let one = BigUint::one();

        // encryption of one
        let this = ElGamal::encrypt_encode(&one, &BigUint::from(7u32), &pk);

        // encryption of one
        let other = ElGamal::encrypt_encode(&one, &BigUint::from(5u32), &pk);

        // add both encryptions: 1 + 1
        let addition = ElGamal::add(&this, &other, &pk.params.p);

        // decrypt result: g^2
        let decrypted_addition = ElGamal::decrypt(&addition, &sk).unwrap();
        assert_eq!(decrypted_addition, BigUint::from(16u32));
    }

    #[test]
    fn it_should_add_many_and_result_equals_five() {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let params = ElGamalParams::generate(64, &mut rng).unwrap();
        let KeyPair {
            public_key: pk,
            secret_key: sk,
        } = Helper::generate_key_pair(&params, &mut rng);
        let q = &params.q;
        let zero = BigUint::zero();
        let one = BigUint::one();

        // start with an encryption of zero
        // use a random number < q
        let r = Random::get_random_less_than(q, &mut rng);
        let mut base = ElGamal::encrypt_encode(&zero, &r, &pk);

        // add five encryptions of one
        for _ in 0..5 {
            let r = Random::get_random_less_than(q, &mut rng);
            let encryption_of_one = ElGamal::encrypt_encode(&one, &r, &pk);
            base = ElGamal::add(&base, &encryption_of_one, &params.p);
        }

        // add five encryptions of zero
        for _ in 0..5 {
            let r = Random::get_random_less_than(q, &mut rng);
            let encryption_of_zero = ElGamal::encrypt_encode(&zero, &r, &pk);
            base = ElGamal::add(&base, &encryption_of_zero, &params.p);
        }

        // decrypt result: 5
        let table = DLogTable::new(&params, 10);
        assert_eq!(ElGamal::decrypt_decode(&base, &sk, &table), Some(5));
    }

    #[test]
    fn it_should_accumulate_from_the_empty_sentinel() {
        let key_pair = setup_system(17);
        let pk = &key_pair.public_key;
        let cipher = ElGamal::encrypt_encode(&BigUint::one(), &BigUint::from(9u32), pk);

        let first = ElGamal::accumulate(None, &cipher, &pk.params.p);
        assert_eq!(first, cipher);

        let second = ElGamal::accumulate(Some(&first), &cipher, &pk.params.p);
        assert_eq!(second, ElGamal::add(&cipher, &cipher, &pk.params.p));
    }

    #[test]
    fn it_should_re_encrypt_five() {
        let mut rng = ChaCha20Rng::seed_from_u64(32);
        let KeyPair {
            public_key: pk,
            secret_key: sk,
        } = setup_system(123);
        let q = &pk.params.q;
        let five = BigUint::from(5u32);

        let r = Random::get_random_less_than(q, &mut rng);
        let encrypted_five = ElGamal::encrypt_encode(&five, &r, &pk);

        // re-encryption + check that encryption != re-encryption
        let r_ = BigUint::from(77u32);
        let re_encrypted_five = ElGamal::re_encrypt(&encrypted_five, &r_, &pk);
        assert!(encrypted_five != re_encrypted_five);

        // the re-encryption equals an encryption with randomness r + r'
        let combined_r = (r + &r_) % q;
        assert_eq!(re_encrypted_five, ElGamal::encrypt_encode(&five, &combined_r, &pk));

        // check that decryption is still the same as the initial value
        let table = DLogTable::new(&pk.params, 10);
        assert_eq!(ElGamal::decrypt_decode(&re_encrypted_five, &sk, &table), Some(5));
    }

    #[test]
    fn it_should_combine_decryption_factors_of_two_keys() {
        let params = ElGamalParams::from_p_and_g(BigUint::from(2039u32), BigUint::from(4u32));
        let first = Helper::key_pair_from_secret(&params, BigUint::from(100u32));
        let second = Helper::key_pair_from_secret(&params, BigUint::from(555u32));
        let pk = PublicKey::combine(&[first.public_key.clone(), second.public_key.clone()]).unwrap();

        let cipher = ElGamal::encrypt_encode(&BigUint::from(3u32), &BigUint::from(42u32), &pk);
        let factor = ElGamal::decryption_factor(&cipher, &first.secret_key)
            * ElGamal::decryption_factor(&cipher, &second.secret_key)
            % &params.p;
        let m = ElGamal::remove_factor(&cipher.beta, &factor, &params.p).unwrap();
        assert_eq!(m, params.g.modpow(&BigUint::from(3u32), &params.p));
    }

    #[quickcheck]
    fn quickcheck_homomorphism(v1: u8, v2: u8, r1: u16, r2: u16, x: u16) -> bool {
        let key_pair = setup_system(x as u32 % 1019);
        let pk = &key_pair.public_key;
        let r1 = BigUint::from(r1 % 1019);
        let r2 = BigUint::from(r2 % 1019);

        let c1 = ElGamal::encrypt_encode(&BigUint::from(v1), &r1, pk);
        let c2 = ElGamal::encrypt_encode(&BigUint::from(v2), &r2, pk);
        let sum = ElGamal::add(&c1, &c2, &pk.params.p);

        let expected = ElGamal::encode_message(
            &BigUint::from(v1 as u32 + v2 as u32),
            &pk.params.g,
            &pk.params.p,
        );
        ElGamal::decrypt(&sum, &key_pair.secret_key) == Some(expected)
    }

    #[quickcheck]
    fn quickcheck_round_trip(v: u16, r: u16, x: u16) -> bool {
        let key_pair = setup_system(x as u32 % 1019);
        let pk = &key_pair.public_key;
        let m = ElGamal::encode_message(&BigUint::from(v), &pk.params.g, &pk.params.p);
        let cipher = ElGamal::encrypt(&m, &BigUint::from(r % 1019), pk);
        ElGamal::decrypt(&cipher, &key_pair.secret_key) == Some(m)
    }
}
