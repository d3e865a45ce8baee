use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::traits::{BandwidthEstimate1D, SpectrumAnalyze1D};
use crate::signal::{Spectrum, SpectrumConfig, SpectrumKernel};
use eelab_core::Result;
use serde::{Deserialize, Serialize};

fn default_threshold_db() -> f64 {
    -3.0
}

/// Constructor config for [`BandwidthKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Threshold relative to the spectral peak, in dB. Normally negative.
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f64,
}

/// Occupied bandwidth of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bandwidth {
    /// Lowest bin at or above the threshold, in Hz.
    pub lower_frequency: f64,
    /// Highest bin at or above the threshold, in Hz.
    pub upper_frequency: f64,
    /// `upper_frequency - lower_frequency`.
    pub bandwidth: f64,
    /// Midpoint of the lower and upper frequencies.
    pub center_frequency: f64,
    /// Sample rate of the analysed signal, in Hz.
    pub sample_rate: f64,
    /// Threshold that was applied, relative to the peak.
    pub threshold_db: f64,
    /// Largest `magnitude_db` in the spectrum.
    pub peak_magnitude_db: f64,
}

impl Bandwidth {
    /// Measure the bandwidth of an already computed spectrum of a signal
    /// sampled at `sample_rate`.
    ///
    /// Every bin at or above `peak + threshold_db` counts, whether or not it
    /// is contiguous with the peak. Sidelobes that clear the threshold widen
    /// the reported band.
    pub fn from_spectrum(spectrum: &Spectrum, sample_rate: f64, threshold_db: f64) -> Self {
        let peak = spectrum
            .magnitude_db
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let floor = peak + threshold_db;
        let selected = spectrum
            .frequencies
            .iter()
            .zip(spectrum.magnitude_db.iter())
            .filter(|(_, db)| **db >= floor)
            .map(|(f, _)| *f);
        let (lower, upper) = selected.fold(None, |acc: Option<(f64, f64)>, f| match acc {
            None => Some((f, f)),
            Some((lo, hi)) => Some((lo.min(f), hi.max(f))),
        })
        .unwrap_or_default();

        Self {
            lower_frequency: lower,
            upper_frequency: upper,
            bandwidth: upper - lower,
            center_frequency: 0.5 * (upper + lower),
            sample_rate,
            threshold_db,
            peak_magnitude_db: peak,
        }
    }
}

/// Trait-first bandwidth estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthKernel {
    spectrum: SpectrumKernel,
    sample_rate: f64,
    threshold_db: f64,
}

impl KernelLifecycle for BandwidthKernel {
    type Config = BandwidthConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if !config.threshold_db.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "threshold_db",
                reason: "threshold_db must be finite",
            });
        }
        Ok(Self {
            spectrum: SpectrumKernel::try_new(SpectrumConfig {
                sample_rate: config.sample_rate,
            })?,
            sample_rate: config.sample_rate,
            threshold_db: config.threshold_db,
        })
    }
}

impl BandwidthEstimate1D for BandwidthKernel {
    fn run_alloc<I>(&self, input: &I) -> core::result::Result<Bandwidth, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let spectrum = self.spectrum.run_alloc(input)?;
        let bw = Bandwidth::from_spectrum(&spectrum, self.sample_rate, self.threshold_db);
        tracing::debug!(
            lower = bw.lower_frequency,
            upper = bw.upper_frequency,
            bandwidth = bw.bandwidth,
            "estimated bandwidth"
        );
        Ok(bw)
    }
}

/// Estimate the occupied bandwidth of `signal` at `threshold_db` below the
/// spectral peak.
///
/// # Errors
/// `signal` is empty, `sample_rate` is not finite and positive, or
/// `threshold_db` is not finite.
pub fn bandwidth_analysis<I>(
    signal: &I,
    sample_rate: f64,
    threshold_db: f64,
) -> Result<Bandwidth>
where
    I: Read1D<f64> + ?Sized,
{
    let kernel = BandwidthKernel::try_new(BandwidthConfig {
        sample_rate,
        threshold_db,
    })?;
    Ok(kernel.run_alloc(signal)?)
}
