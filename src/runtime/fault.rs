//! What the scheduler does with a continuation that panics while resumed.

use crate::error::ConfigError;

use std::fmt;
use std::str::FromStr;

/// Policy applied to a [`Fault`](crate::Fault).
///
/// Under every policy the faulted continuation is dropped and the run loop
/// keeps going; the policies differ only in how the fault is surfaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Forget the fault entirely.
    Discard,
    /// Emit a `tracing` error event.
    #[default]
    Log,
    /// Emit a `tracing` error event and keep the fault in the
    /// [`RunReport`](crate::RunReport).
    Collect,
}

impl FromStr for FaultPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "log" => Ok(Self::Log),
            "collect" => Ok(Self::Collect),
            _ => Err(ConfigError::UnknownFaultPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discard => "discard",
            Self::Log => "log",
            Self::Collect => "collect",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Collect".parse::<FaultPolicy>().unwrap(), FaultPolicy::Collect);
        assert_eq!(" discard ".parse::<FaultPolicy>().unwrap(), FaultPolicy::Discard);
        assert!(matches!(
            "abort".parse::<FaultPolicy>(),
            Err(ConfigError::UnknownFaultPolicy(_))
        ));
    }
}
