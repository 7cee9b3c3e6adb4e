//! Error types for the CLI application.
//!
//! Command handlers return [`CliError`] and propagate with `?`; [`crate::run`]
//! maps each variant onto an exit code.

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// I/O error (stdin reads, stdout/stderr writes)
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// Input was interrupted (e.g. Ctrl+C while reading stdin)
    Interrupted(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Interrupted(msg) => write!(f, "Interrupted: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::Interrupted {
            CliError::Interrupted(error.to_string())
        } else {
            CliError::Io(error)
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::Io(std::io::Error::other(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_reads_map_to_interrupted() {
        let err: CliError = std::io::Error::new(std::io::ErrorKind::Interrupted, "ctrl-c").into();
        assert!(matches!(err, CliError::Interrupted(_)));
    }

    #[test]
    fn config_errors_carry_their_message() {
        let err = CliError::Config("cannot read config file: missing".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: cannot read config file: missing"
        );
    }
}
