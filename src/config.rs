//! Environment-driven configuration helpers.

use crate::error::ConfigError;

use std::env;

pub const SWEEP_PAUSE_MS: &str = "COSCHED_SWEEP_PAUSE_MS";
pub const IDLE_PAUSE_MS: &str = "COSCHED_IDLE_PAUSE_MS";
pub const FAULT_POLICY: &str = "COSCHED_FAULT_POLICY";

/// Reads `name` as an unsigned integer. Unset or empty variables are `None`.
pub fn env_u64(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => parse_u64(name, &value).map(Some),
        Err(_) => Ok(None),
    }
}

pub(crate) fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_negative_and_garbage() {
        assert_eq!(parse_u64("X", " 12 ").unwrap(), 12);
        assert!(matches!(
            parse_u64("X", "-1"),
            Err(ConfigError::InvalidNumber { name: "X", .. })
        ));
        assert!(parse_u64("X", "1ms").is_err());
    }
}
