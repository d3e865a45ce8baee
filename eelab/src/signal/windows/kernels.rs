//! Trait-first window generation kernels.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D};
use crate::signal::traits::WindowGenerate;
use num_traits::Float;

/// Constructor config for [`HannKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HannConfig {
    /// Output length.
    pub nx: usize,
    /// FFT-bin mode (`Some(true)` periodic, `Some(false)` or `None` symmetric).
    pub fftbins: Option<bool>,
}

/// Trait-first Hann window kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HannKernel {
    nx: usize,
    periodic: bool,
}

impl KernelLifecycle for HannKernel {
    type Config = HannConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.nx == 0 {
            return Err(ConfigError::EmptyInput { arg: "nx" });
        }
        Ok(Self {
            nx: config.nx,
            periodic: config.fftbins.unwrap_or(false),
        })
    }
}

impl HannKernel {
    fn coefficient<F>(&self, i: usize) -> F
    where
        F: Float,
    {
        // A periodic window is the symmetric window of length nx + 1, truncated.
        let m = if self.periodic { self.nx } else { self.nx - 1 };
        if m == 0 {
            return F::one();
        }
        let phase = core::f64::consts::TAU * i as f64 / m as f64;
        F::from(0.5 - 0.5 * phase.cos()).unwrap_or_else(F::nan)
    }
}

impl<F> WindowGenerate<F> for HannKernel
where
    F: Float,
{
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if out.len() != self.nx {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: self.nx,
                got: out.len(),
            });
        }
        out.iter_mut()
            .enumerate()
            .for_each(|(i, w)| *w = self.coefficient(i));
        Ok(())
    }

    fn run_alloc(&self) -> Result<Vec<F>, ExecInvariantViolation> {
        Ok((0..self.nx).map(|i| self.coefficient(i)).collect())
    }
}
