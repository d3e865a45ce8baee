use eelab_core::Error;
use thiserror::Error;

/// Validation errors raised at kernel construction or adapter binding time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required input or configuration field is empty.
    #[error("Input `{arg}` was empty.")]
    EmptyInput {
        /// Name of the argument that is empty.
        arg: &'static str,
    },
    /// A configuration argument value is invalid.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Human readable reason.
        reason: &'static str,
    },
    /// A contiguous 1D slice view could not be obtained.
    #[error("Argument `{arg}` is not contiguous in memory.")]
    NonContiguous {
        /// Name of the argument that is non-contiguous.
        arg: &'static str,
    },
    /// Output/input lengths did not match required shape.
    #[error("Length mismatch on `{arg}`. Expected {expected}, got {got}.")]
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
}

/// Runtime execution invariant violations for checked kernel entrypoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecInvariantViolation {
    /// An execution precondition was violated.
    #[error("Execution invariant violation: {reason}")]
    InvalidState {
        /// Human readable reason.
        reason: &'static str,
    },
    /// Output length mismatched the expected runtime shape.
    #[error("Execution length mismatch on `{arg}`. Expected {expected}, got {got}.")]
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// Adapter binding/configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A checked routine the kernel delegates to failed.
    #[error(transparent)]
    Routine(#[from] Error),
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        match value {
            ConfigError::InvalidArgument { arg, reason } => Error::invalid_arg(arg, reason),
            ConfigError::EmptyInput { arg } => Error::invalid_arg(arg, "must not be empty"),
            other => Error::ExecInvariantViolation {
                reason: other.to_string(),
            },
        }
    }
}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        match value {
            ExecInvariantViolation::Config(err) => err.into(),
            ExecInvariantViolation::Routine(err) => err,
            other => Error::ExecInvariantViolation {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_argument_name() {
        let err: Error = ConfigError::InvalidArgument {
            arg: "sample_rate",
            reason: "sample_rate must be positive",
        }
        .into();
        assert_eq!(
            err,
            Error::InvalidArg {
                arg: "sample_rate".into(),
                reason: "sample_rate must be positive".into(),
            }
        );
    }

    #[test]
    fn exec_errors_flatten_config_source() {
        let err: Error =
            ExecInvariantViolation::from(ConfigError::EmptyInput { arg: "signal" }).into();
        assert!(matches!(err, Error::InvalidArg { ref arg, .. } if arg == "signal"));

        let err: Error = ExecInvariantViolation::LengthMismatch {
            arg: "out",
            expected: 4,
            got: 3,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Execution invariant violation: Execution length mismatch on `out`. Expected 4, got 3."
        );
    }

    #[test]
    fn routine_errors_pass_through_unchanged() {
        let source = Error::invalid_arg("wo", "must be finite and positive");
        let err: Error = ExecInvariantViolation::from(source.clone()).into();
        assert_eq!(err, source);
    }
}
