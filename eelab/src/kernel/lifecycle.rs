use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

/// Reject non-finite or non-positive values for a named argument.
pub(crate) fn require_positive(
    value: f64,
    arg: &'static str,
    reason: &'static str,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidArgument { arg, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::{require_positive, ConfigError, KernelLifecycle};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct GainConfig {
        gain: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct GainKernel {
        gain: f64,
    }

    impl KernelLifecycle for GainKernel {
        type Config = GainConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            let gain = require_positive(config.gain, "gain", "gain must be positive")?;
            Ok(Self { gain })
        }
    }

    #[test]
    fn lifecycle_constructor_accepts_valid_config() {
        let kernel = GainKernel::try_new(GainConfig { gain: 4.0 }).expect("valid config");
        assert_eq!(kernel.gain, 4.0);
    }

    #[test]
    fn lifecycle_constructor_rejects_invalid_config() {
        for gain in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = GainKernel::try_new(GainConfig { gain }).expect_err("invalid config");
            assert_eq!(
                err,
                ConfigError::InvalidArgument {
                    arg: "gain",
                    reason: "gain must be positive",
                }
            );
        }
    }
}
