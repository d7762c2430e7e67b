use std::env::var;

const DEFAULT_GROUP_BITS: u64 = 256;

/// Settings read from the environment, command line flags take precedence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// VOTING_GROUP_BITS: bit size of p for newly generated groups
    pub group_bits: u64,
    /// VOTING_PRETTY_JSON: pretty print the written artifacts
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            group_bits: DEFAULT_GROUP_BITS,
            pretty_json: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Config::from_vars(|name| var(name).ok())
    }

    fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Config::default();

        let group_bits = match lookup("VOTING_GROUP_BITS") {
            Some(val) => match val.trim().parse::<u64>() {
                Ok(bits) => bits,
                Err(_) => {
                    log::warn!(
                        "ignoring VOTING_GROUP_BITS={:?}, using {} bits",
                        val,
                        default.group_bits
                    );
                    default.group_bits
                }
            },
            None => default.group_bits,
        };

        let pretty_json = match lookup("VOTING_PRETTY_JSON") {
            Some(val) => !matches!(val.trim().to_lowercase().as_str(), "0" | "false" | "no"),
            None => default.pretty_json,
        };

        Config {
            group_bits,
            pretty_json,
        }
    }
}
