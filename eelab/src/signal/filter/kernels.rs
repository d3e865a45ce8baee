//! Trait-first kernel wrappers for filtering primitives.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::{SosFilt1D, SosFiltFilt1D, SosFiltZiDesign1D};

use super::design::Sos;
use super::{sosfilt_checked_slice, sosfilt_zi_checked_slice, sosfiltfilt_checked_slice};

/// Reject empty cascades and normalise every section to `a[0] == 1`.
fn normalized_sections(sos: Vec<Sos>) -> Result<Vec<Sos>, ConfigError> {
    if sos.is_empty() {
        return Err(ConfigError::EmptyInput { arg: "sos" });
    }
    sos.into_iter()
        .map(|mut s| {
            let a0 = s.a[0];
            if a0 == 0.0 || !a0.is_finite() {
                return Err(ConfigError::InvalidArgument {
                    arg: "sos",
                    reason: "leading denominator coefficient must be finite and non-zero",
                });
            }
            s.b.iter_mut().for_each(|c| *c /= a0);
            s.a.iter_mut().for_each(|c| *c /= a0);
            Ok(s)
        })
        .collect()
}

fn copy_checked(out_slice: &mut [f64], y: &[f64]) -> Result<(), ExecInvariantViolation> {
    if out_slice.len() != y.len() {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "out",
            expected: y.len(),
            got: out_slice.len(),
        });
    }
    out_slice.copy_from_slice(y);
    Ok(())
}

/// Constructor config for [`SosFiltKernel`].
#[derive(Debug, Clone)]
pub struct SosFiltConfig {
    /// Second-order sections with mutable filter state.
    pub sos: Vec<Sos>,
}

/// Stateful 1D `sosfilt` kernel. Section state persists across calls.
#[derive(Debug, Clone)]
pub struct SosFiltKernel {
    sos: Vec<Sos>,
}

impl KernelLifecycle for SosFiltKernel {
    type Config = SosFiltConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            sos: normalized_sections(config.sos)?,
        })
    }
}

impl SosFiltKernel {
    /// Current section state.
    pub fn sections(&self) -> &[Sos] {
        &self.sos
    }
}

impl SosFilt1D for SosFiltKernel {
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let y = self.run_alloc(input)?;
        copy_checked(out.write_slice_mut()?, &y)
    }

    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice()?;
        Ok(sosfilt_checked_slice(input, &mut self.sos)?)
    }
}

/// Constructor config for [`SosFiltFiltKernel`].
#[derive(Debug, Clone)]
pub struct SosFiltFiltConfig {
    /// Second-order sections used for forward-backward filtering.
    pub sos: Vec<Sos>,
}

/// Stateless 1D `sosfiltfilt` kernel.
#[derive(Debug, Clone)]
pub struct SosFiltFiltKernel {
    sos: Vec<Sos>,
}

impl KernelLifecycle for SosFiltFiltKernel {
    type Config = SosFiltFiltConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            sos: normalized_sections(config.sos)?,
        })
    }
}

impl SosFiltFiltKernel {
    /// Minimum input length minus one; see [`super::sosfiltfilt_padlen`].
    pub fn padlen(&self) -> usize {
        super::sosfiltfilt_padlen(&self.sos)
    }
}

impl SosFiltFilt1D for SosFiltFiltKernel {
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let y = self.run_alloc(input)?;
        copy_checked(out.write_slice_mut()?, &y)
    }

    fn run_alloc<I>(&self, input: &I) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice()?;
        if input.len() <= self.padlen() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "input must be longer than the sosfiltfilt padding",
            });
        }
        Ok(sosfiltfilt_checked_slice(input, &self.sos)?)
    }
}

/// Constructor config for [`SosFiltZiKernel`].
#[derive(Debug, Clone)]
pub struct SosFiltZiConfig {
    /// Sections whose step steady state is computed.
    pub sos: Vec<Sos>,
}

/// `sosfilt_zi` design kernel.
#[derive(Debug, Clone)]
pub struct SosFiltZiKernel {
    sos: Vec<Sos>,
}

impl KernelLifecycle for SosFiltZiKernel {
    type Config = SosFiltZiConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            sos: normalized_sections(config.sos)?,
        })
    }
}

impl SosFiltZiDesign1D for SosFiltZiKernel {
    fn run_alloc(&self) -> Result<Vec<Sos>, ExecInvariantViolation> {
        let mut sos = self.sos.clone();
        sosfilt_zi_checked_slice(&mut sos)?;
        Ok(sos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::filter::{sosfilt_checked_slice, sosfiltfilt_checked_slice};
    use ndarray::Array1;

    fn smoother() -> Vec<Sos> {
        Sos::from_scipy_dyn(1, vec![0.25, 0.5, 0.25, 1.0, -0.2, 0.1])
    }

    #[test]
    fn sosfilt_kernel_matches_function() {
        let mut kernel = SosFiltKernel::try_new(SosFiltConfig { sos: smoother() })
            .expect("kernel should initialize");
        let x = [1.0f64, 2.0, 3.0, 4.0];
        let mut y = [0.0f64; 4];
        kernel
            .run_into(&x, &mut y)
            .expect("sosfilt kernel should run");

        let mut sos = smoother();
        let expected = sosfilt_checked_slice(&x, &mut sos).unwrap();
        assert_eq!(y, expected.as_slice());
        assert_eq!(kernel.sections(), sos.as_slice());
    }

    #[test]
    fn sosfiltfilt_kernel_matches_function() {
        let kernel = SosFiltFiltKernel::try_new(SosFiltFiltConfig { sos: smoother() })
            .expect("kernel should initialize");
        let x: Array1<f64> = (0..64).map(|i| i as f64).collect();

        let actual = kernel.run_alloc(&x).expect("sosfiltfilt should run");
        let expected = sosfiltfilt_checked_slice(x.as_slice().unwrap(), &smoother()).unwrap();
        assert_eq!(actual, expected);

        let mut short = [0.0f64; 3];
        assert!(kernel.run_into(&[1.0, 2.0, 3.0], &mut short).is_err());
        let mut wrong = vec![0.0f64; 10];
        assert!(matches!(
            kernel.run_into(&x, &mut wrong),
            Err(ExecInvariantViolation::LengthMismatch { got: 10, .. })
        ));
    }

    #[test]
    fn sections_are_normalised() {
        let kernel = SosFiltZiKernel::try_new(SosFiltZiConfig {
            sos: Sos::from_scipy_dyn(1, vec![0.5, 1.0, 0.5, 2.0, -0.4, 0.2]),
        })
        .unwrap();
        let sos = kernel.run_alloc().unwrap();
        assert_eq!(sos[0].a, [1.0, -0.2, 0.1]);
        assert_eq!(sos[0].b, [0.25, 0.5, 0.25]);
        assert!(sos[0].zi0 != 0.0);
    }

    #[test]
    fn kernel_failures_keep_the_underlying_error() {
        let kernel = SosFiltZiKernel::try_new(SosFiltZiConfig {
            sos: vec![Sos::new([1.0, 0.0, 0.0], [1.0, -1.0, 0.0])],
        })
        .unwrap();
        let err = kernel.run_alloc().expect_err("integrator has no steady state");
        assert_eq!(
            err,
            ExecInvariantViolation::Routine(eelab_core::Error::ExecInvariantViolation {
                reason: "section has no step steady state".into(),
            })
        );
    }

    #[test]
    fn constructors_reject_bad_sections() {
        let err = SosFiltKernel::try_new(SosFiltConfig { sos: Vec::new() })
            .expect_err("empty sos must fail");
        assert_eq!(err, ConfigError::EmptyInput { arg: "sos" });
        let err = SosFiltFiltKernel::try_new(SosFiltFiltConfig {
            sos: vec![Sos::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0])],
        })
        .expect_err("a0 == 0 must fail");
        assert!(matches!(err, ConfigError::InvalidArgument { arg: "sos", .. }));
    }
}
