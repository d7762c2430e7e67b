use crate::types::{ElGamalParams, ModuloOperations};
use num_bigint::BigUint;
use num_traits::One;
use std::collections::HashMap;

/// Precomputed powers g^0, g^1, ..., g^max used to recover small exponents
/// (vote counts) after decryption.
#[derive(Clone, Debug)]
pub struct DLogTable {
    table: HashMap<BigUint, u64>,
    max: u64,
}

impl DLogTable {
    /// Builds the table for exponents 0..=max.
    ///
    /// ## Arguments
    ///
    /// * `params` - the group, only g and p are used
    /// * `max`    - the largest exponent that can be recovered
    pub fn new(params: &ElGamalParams, max: u64) -> Self {
        let p = &params.p;
        let mut table = HashMap::with_capacity(max as usize + 1);
        let mut power = BigUint::one() % p;

        for exponent in 0..=max {
            table.entry(power.clone()).or_insert(exponent);
            power = power.modmul(&params.g, p);
        }
        DLogTable { table, max }
    }

    /// Returns v such that g^v = element, if v <= max.
    pub fn lookup(&self, element: &BigUint) -> Option<u64> {
        self.table.get(element).copied()
    }

    pub fn max(&self) -> u64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::DLogTable;
    use crate::types::ElGamalParams;
    use num_bigint::BigUint;

    #[test]
    fn it_should_recover_small_exponents() {
        // p = 2039, q = 1019, g = 4
        let params = ElGamalParams::from_p_and_g(BigUint::from(2039u32), BigUint::from(4u32));
        let table = DLogTable::new(&params, 50);

        for v in 0..=50u64 {
            let element = params.g.modpow(&BigUint::from(v), &params.p);
            assert_eq!(table.lookup(&element), Some(v));
        }
        assert_eq!(table.max(), 50);
    }

    #[test]
    fn it_should_not_recover_exponents_beyond_max() {
        let params = ElGamalParams::from_p_and_g(BigUint::from(2039u32), BigUint::from(4u32));
        let table = DLogTable::new(&params, 3);

        let four = params.g.modpow(&BigUint::from(4u32), &params.p);
        assert_eq!(table.lookup(&four), None);
    }

    #[test]
    fn it_should_keep_the_smallest_exponent_when_the_group_wraps() {
        // g = 4 has order 11 in Z*_23: g^11 = g^0 = 1
        let params = ElGamalParams::from_p_and_g(BigUint::from(23u32), BigUint::from(4u32));
        let table = DLogTable::new(&params, 15);
        assert_eq!(table.lookup(&BigUint::from(1u32)), Some(0));
        assert_eq!(table.lookup(&BigUint::from(4u32)), Some(1));
    }
}
