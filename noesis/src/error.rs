//! Error handling.

use std::io;

/// Type alias for `Result` with default `Error`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that are raised by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The given IRI is invalid.
    #[error("The text {0} is not a valid IRI")]
    InvalidIri(String),
    /// The given prefix is invalid.
    #[error("The text {0} is not a valid prefix")]
    InvalidPrefix(String),
    /// A prefixed name uses a prefix that was never declared.
    #[error("The prefix {0} is not declared")]
    UnknownPrefix(String),
    /// A rule could not be built from its parsed sides.
    #[error("Cannot build a rule from `{0}`")]
    InvalidRule(String),
    /// Error from parsing.
    #[error("Parser: {0}")]
    Parser(String),
    /// A forward rule with conclusion `false` fired.
    #[error("fuse triggered by rule {rule}")]
    FuseTriggered {
        /// Index of the fuse rule in document order.
        rule: usize,
    },
    /// Error from writing to target.
    #[error("Target error: {0}")]
    FromIo(#[from] io::Error),
}
