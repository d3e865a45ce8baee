use crate::kernel::{require_positive, ConfigError};
use eelab_core::Result;
use serde::Serialize;

/// Trait interfaces for signal-processing capabilities.
pub mod traits;

/// Periodic waveform synthesis.
pub mod wave;

/// Window functions.
pub mod windows;

/// Digital filter design and application.
pub mod filter;

mod bandwidth;
mod noise;
mod spectral;

pub use bandwidth::*;
pub use filter::design::FilterBandType;
pub use filter::{filter_signal, Cutoff, FilterConfig, FilterKernel, FilterOutcome};
pub use noise::*;
pub use spectral::*;
pub use wave::{generate_signal, WaveShape, Waveform, WaveformConfig, WaveformKernel};

/// A sampled real-valued signal with its sample rate.
///
/// Always holds at least one sample and a finite, positive sample rate.
/// Transforms never mutate a `Signal`; they produce new values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    samples: Vec<f64>,
    sample_rate: f64,
}

impl Signal {
    /// Wrap `samples` taken at `sample_rate` Hz.
    ///
    /// # Errors
    /// `samples` is empty, or `sample_rate` is not finite and positive.
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "samples" }.into());
        }
        let sample_rate = check_sample_rate(sample_rate)?;
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Borrow the samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Nyquist frequency, half the sample rate.
    pub fn nyquist(&self) -> f64 {
        0.5 * self.sample_rate
    }

    /// Timestamps `i / sample_rate` for each sample.
    pub fn time(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| i as f64 / self.sample_rate)
            .collect()
    }

    /// Consume into the sample vector.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

pub(crate) fn check_sample_rate(sample_rate: f64) -> core::result::Result<f64, ConfigError> {
    require_positive(
        sample_rate,
        "sample_rate",
        "sample rate must be finite and greater than 0",
    )
}
