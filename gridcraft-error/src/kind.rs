//! Error kinds for gridcraft operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide whether a round can be re-played,
/// the run must stop, or the configuration has to be fixed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Invalid configuration or run parameters
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Simulation errors
    // =========================================================================
    /// A world description could not be parsed
    ParseFailed,

    /// Oracle reply named none of the four directions
    NoDirectionFound,

    /// A move was applied to an agent whose hunger already ran out
    AgentDeceased,

    // =========================================================================
    // Oracle errors
    // =========================================================================
    /// The oracle failed to produce a reply
    OracleUnavailable,

    /// The oracle did not answer before the deadline
    OracleTimeout,

    /// Rate limit exceeded
    RateLimited,

    /// Network error
    NetworkFailed,

    /// The run was stopped from outside (Ctrl-C)
    Interrupted,

    // =========================================================================
    // File errors (configs, boards, transcripts)
    // =========================================================================
    /// A run report could not be encoded
    SerializationFailed,

    /// Reading or writing a file failed for any other reason
    IoFailed,

    FileNotFound,

    PermissionDenied,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::NoDirectionFound => "NoDirectionFound",
            ErrorKind::AgentDeceased => "AgentDeceased",

            ErrorKind::OracleUnavailable => "OracleUnavailable",
            ErrorKind::OracleTimeout => "OracleTimeout",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::Interrupted => "Interrupted",

            ErrorKind::SerializationFailed => "SerializationFailed",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NoDirectionFound
                | ErrorKind::OracleUnavailable
                | ErrorKind::OracleTimeout
                | ErrorKind::RateLimited
                | ErrorKind::NetworkFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::NoDirectionFound.to_string(), "NoDirectionFound");
        assert_eq!(ErrorKind::AgentDeceased.to_string(), "AgentDeceased");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::OracleUnavailable.is_retryable());
        assert!(ErrorKind::OracleTimeout.is_retryable());
        assert!(ErrorKind::NoDirectionFound.is_retryable());
        assert!(!ErrorKind::AgentDeceased.is_retryable());
        assert!(!ErrorKind::ConfigInvalid.is_retryable());
        assert!(!ErrorKind::Interrupted.is_retryable());
        assert!(!ErrorKind::FileNotFound.is_retryable());
    }
}
