//! Every kernel exposes `run_alloc`, returning a freshly allocated result.
//! Kernels whose result is a flat sample buffer also expose `run_into`,
//! writing into a caller-provided buffer of matching length.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};
use crate::signal::filter::design::Sos;
use crate::signal::filter::FilterOutcome;
use crate::signal::{Bandwidth, NoiseResult, Spectrum, Waveform};
use nalgebra::Complex;

/// Periodic waveform generation capability.
pub trait WaveformGenerate {
    /// Write the waveform samples into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<f64> + ?Sized;

    /// Generate the waveform together with its time axis and summary metrics.
    fn run_alloc(&self) -> Result<Waveform, ExecInvariantViolation>;
}

/// Window generation capability.
pub trait WindowGenerate<T> {
    /// Run window generation into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Run window generation and allocate output samples.
    fn run_alloc(&self) -> Result<Vec<T>, ExecInvariantViolation>;
}

/// Single-sided amplitude spectrum capability.
pub trait SpectrumAnalyze1D {
    /// Analyze `input` and allocate the spectrum.
    fn run_alloc<I>(&self, input: &I) -> Result<Spectrum, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Calibrated noise injection capability.
pub trait NoiseInject1D {
    /// Add noise to `input` and allocate the noisy copy.
    fn run_alloc<I>(&self, input: &I) -> Result<NoiseResult, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Occupied bandwidth estimation capability.
pub trait BandwidthEstimate1D {
    /// Estimate the bandwidth of `input`.
    fn run_alloc<I>(&self, input: &I) -> Result<Bandwidth, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// IIR design capability.
pub trait IirDesign {
    /// Output representation produced by the design kernel.
    type Output;

    /// Run IIR design and allocate output representation.
    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation>;
}

/// 1D `sosfilt` capability.
pub trait SosFilt1D {
    /// Run second-order-sections filtering into a caller-provided output buffer.
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized;

    /// Run second-order-sections filtering and allocate output.
    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// `sosfilt_zi` design capability.
pub trait SosFiltZiDesign1D {
    /// Compute step-response steady-state initial conditions and allocate
    /// the sections carrying them.
    fn run_alloc(&self) -> Result<Vec<Sos>, ExecInvariantViolation>;
}

/// 1D `sosfiltfilt` capability.
pub trait SosFiltFilt1D {
    /// Run zero-phase SOS filtering into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized;

    /// Run zero-phase SOS filtering and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Validated design-and-apply filtering capability.
///
/// Parameter problems are reported inside the returned outcome; only
/// adapter failures and empty input surface as errors.
pub trait FilterApply1D {
    /// Filter `input` and allocate the outcome.
    fn run_alloc<I>(&self, input: &I) -> Result<FilterOutcome, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// SOS frequency response capability.
pub trait SosFreqz1D {
    /// Evaluate the cascade response into caller-provided buffers.
    fn run_into<I, OW, OH>(
        &self,
        sos: &I,
        w: &mut OW,
        h: &mut OH,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<Sos> + ?Sized,
        OW: Write1D<f64> + ?Sized,
        OH: Write1D<Complex<f64>> + ?Sized;

    /// Evaluate the cascade response and allocate `(w, h)`.
    fn run_alloc<I>(&self, sos: &I) -> Result<(Vec<f64>, Vec<Complex<f64>>), ExecInvariantViolation>
    where
        I: Read1D<Sos> + ?Sized;
}

/// Parameter-driven frequency sweep capability.
pub trait FrequencySweep {
    /// Sweep result representation.
    type Output;

    /// Evaluate the network across the configured frequency axis.
    fn run_alloc(&self) -> Result<Self::Output, ExecInvariantViolation>;
}
