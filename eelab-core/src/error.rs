use thiserror::Error;

/// Errors raised whilst running eelab.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Argument passed into a function was invalid.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Execution was attempted with a violated kernel invariant.
    #[error("Execution invariant violation: {reason}")]
    ExecInvariantViolation {
        /// Why execution could not proceed.
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidArg`].
    pub fn invalid_arg(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArg {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result alias.
pub type Result<T> = core::result::Result<T, Error>;
