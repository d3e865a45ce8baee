use crate::kernel::KernelLifecycle;
use crate::signal::traits::WindowGenerate;
use eelab_core::Result;

mod kernels;
pub use kernels::*;

/// Return a Hann window of `nx` points.
///
/// `sym = true` gives the symmetric window used for spectral analysis
/// (`numpy.hanning`); `sym = false` gives the periodic variant.
///
/// ```
/// use eelab::signal::windows::hann;
///
/// assert_eq!(hann(1, true).unwrap(), vec![1.0]);
/// assert_eq!(hann(3, true).unwrap(), vec![0.0, 1.0, 0.0]);
/// ```
///
/// # Errors
/// `nx == 0`.
pub fn hann(nx: usize, sym: bool) -> Result<Vec<f64>> {
    let kernel = HannKernel::try_new(HannConfig {
        nx,
        fftbins: Some(!sym),
    })?;
    Ok(kernel.run_alloc()?)
}
