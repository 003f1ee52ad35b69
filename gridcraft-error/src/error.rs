//! The main Error type for gridcraft

use crate::{ErrorKind, ErrorStatus};
use std::fmt;
use std::path::Path;

/// The error type shared by the simulation, the turn loop and the CLI.
///
/// Besides its [`ErrorKind`] an error carries a [`ErrorStatus`] that the turn
/// loop consults before re-prompting, the operation that raised it, and
/// key-value context such as the step number or the offending reply.
///
/// # Example
///
/// ```rust
/// use gridcraft_error::{Error, ErrorKind};
///
/// let err = Error::new(ErrorKind::OracleUnavailable, "connection reset")
///     .with_operation("oracle::consult")
///     .with_context("step", "3");
///
/// assert_eq!(err.kind(), ErrorKind::OracleUnavailable);
/// assert!(err.is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// The status follows [`ErrorKind::is_retryable`]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: if kind.is_retryable() {
                ErrorStatus::Temporary
            } else {
                ErrorStatus::Permanent
            },
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }

    /// Never retry, whatever the kind says
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Retries ran out
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    /// Record the raising operation. An earlier one is kept as `called`.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Set at most once.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }
}

/// One line: `Kind (status) at operation, context { .. } => message`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{}: {}", key, value))
                .collect();
            write!(f, ", context {{ {} }}", pairs.join(", "))?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;
        if !self.message.is_empty() {
            writeln!(f, "    message: {}", self.message)?;
        }
        for (key, value) in &self.context {
            writeln!(f, "    {}: {}", key, value)?;
        }
        if let Some(source) = &self.source {
            writeln!(f, "    source: {:?}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string()).set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    /// The oracle reply carried no usable direction.
    ///
    /// The reply is kept as context so a re-prompt can be diagnosed.
    pub fn no_direction_found(reply: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoDirectionFound, "reply names no direction")
            .with_context("reply", reply)
    }

    pub fn agent_deceased(x: i64, y: i64) -> Self {
        Self::new(ErrorKind::AgentDeceased, "agent is dead, hunger reached zero")
            .with_context("position", format!("({}, {})", x, y))
    }

    pub fn oracle_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OracleUnavailable, message)
    }

    pub fn oracle_timeout(secs: u64) -> Self {
        Self::new(ErrorKind::OracleTimeout, format!("no reply within {}s", secs))
            .with_context("timeout_secs", secs.to_string())
    }

    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Interrupted, "run interrupted")
    }

    /// A file operation on `path` failed
    pub fn file(operation: &'static str, path: &Path, err: std::io::Error) -> Self {
        Error::from(err)
            .with_operation(operation)
            .with_context("path", path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_creation() {
        let err = Error::config_invalid("width must be positive");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.message(), "width must be positive");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::oracle_unavailable("timeout")
            .with_operation("oracle::consult")
            .with_context("model", "gpt-4o")
            .with_context("step", "4");

        assert_eq!(err.operation(), "oracle::consult");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("model", "gpt-4o".to_string()));
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::no_direction_found("hmm")
            .with_operation("parser::parse_direction")
            .with_operation("controller::play_turn");

        assert_eq!(err.operation(), "controller::play_turn");
        assert_eq!(
            err.context()[1],
            ("called", "parser::parse_direction".to_string())
        );
    }

    #[test]
    fn test_default_status() {
        assert!(Error::oracle_unavailable("down").is_retryable());
        assert!(Error::no_direction_found("").is_retryable());
        assert!(!Error::agent_deceased(1, 1).is_retryable());
        assert!(!Error::interrupted().is_retryable());
        assert!(!Error::oracle_unavailable("bad request").permanent().is_retryable());
    }

    #[test]
    fn test_persist() {
        let err = Error::oracle_timeout(30);
        assert!(err.is_retryable());

        let err = err.persist();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Persistent);
    }

    #[test]
    fn test_display() {
        let err = Error::agent_deceased(2, 3).with_operation("agent::move");

        let display = format!("{}", err);
        assert!(display.contains("AgentDeceased"));
        assert!(display.contains("permanent"));
        assert!(display.contains("agent::move"));
        assert!(display.contains("position: (2, 3)"));
    }

    #[test]
    fn test_file_error_kinds() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::file("world::load", Path::new("board.txt"), missing);
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "world::load");
        assert_eq!(err.context()[0], ("path", "board.txt".to_string()));
        assert!(err.source().is_some());

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert_eq!(Error::from(denied).kind(), ErrorKind::PermissionDenied);

        let other = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(Error::from(other).kind(), ErrorKind::IoFailed);
    }
}
