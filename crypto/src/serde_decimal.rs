//! Serde adapters that encode `BigUint` values as decimal strings.
//!
//! Use them with `#[serde(with = "crate::serde_decimal")]` (single value) or
//! one of the nested modules for collections.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse::<D>(&s)
}

fn parse<'de, D: Deserializer<'de>>(s: &str) -> Result<BigUint, D::Error> {
    // BigUint::from_str accepts underscores, the wire format does not
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(de::Error::custom(format!(
            "invalid decimal integer: {:?}",
            s
        )));
    }
    BigUint::from_str(s).map_err(de::Error::custom)
}

fn to_strings(values: &[BigUint]) -> Vec<String> {
    values.iter().map(|v| v.to_str_radix(10)).collect()
}

/// `Vec<BigUint>` as an array of decimal strings.
pub mod vec {
    use super::*;

    pub fn serialize<S>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_strings(values).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings.iter().map(|s| parse::<D>(s)).collect()
    }
}

/// `Vec<Vec<BigUint>>` as a nested array of decimal strings.
pub mod nested {
    use super::*;

    pub fn serialize<S>(values: &[Vec<BigUint>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let strings: Vec<Vec<String>> = values.iter().map(|row| to_strings(row)).collect();
        strings.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<BigUint>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Vec::<Vec<String>>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|row| row.iter().map(|s| parse::<D>(s)).collect())
            .collect()
    }
}

/// `Option<Vec<BigUint>>`, `null` when absent.
pub mod option_vec {
    use super::*;

    pub fn serialize<S>(values: &Option<Vec<BigUint>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        values.as_ref().map(|v| to_strings(v)).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<BigUint>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Option::<Vec<String>>::deserialize(deserializer)?;
        match strings {
            Some(strings) => strings
                .iter()
                .map(|s| parse::<D>(s))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            None => Ok(None),
        }
    }
}
