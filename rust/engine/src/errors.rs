use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Two or more submitted names are equal ignoring case. `names` holds each
    /// offending name once, lowercased.
    #[error("Please enter unique player names. Duplicate: {}", .names.join(", "))]
    DuplicateNames { names: Vec<String> },
}
