use crate::kernel::{require_positive, ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::FrequencySweep;
use eelab_core::Result;
use serde::{Deserialize, Serialize};

use super::LogAxis;

/// Constructor config for [`AmplifierKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplifierConfig {
    /// Linear gain at DC.
    pub dc_gain: f64,
    /// -3 dB bandwidth of the pole in Hz.
    pub bandwidth: f64,
    /// Input impedance in ohms. Reported, not used by the model.
    pub input_impedance: f64,
    /// First sweep frequency in Hz.
    pub freq_start: f64,
    /// Last sweep frequency in Hz.
    pub freq_end: f64,
    /// Number of sweep points.
    pub points: usize,
}

impl Default for AmplifierConfig {
    fn default() -> Self {
        Self {
            dc_gain: 100.0,
            bandwidth: 1e6,
            input_impedance: 1e4,
            freq_start: 10.0,
            freq_end: 1e8,
            points: 500,
        }
    }
}

/// Gain and phase at one frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmplifierPoint {
    /// Frequency in Hz.
    pub frequency: f64,
    /// Gain in dB.
    pub gain_db: f64,
    /// Phase in degrees, `-atan(f / BW)`.
    pub phase_deg: f64,
}

/// Result of [`amplifier_response`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplifierResponse {
    /// Linear gain at DC.
    pub dc_gain: f64,
    /// `20 log10(dc_gain)`.
    pub dc_gain_db: f64,
    /// Model bandwidth in Hz.
    pub bandwidth: f64,
    /// Input impedance in ohms.
    pub input_impedance: f64,
    /// `dc_gain * bandwidth` in Hz.
    pub gain_bandwidth_product: f64,
    /// Sweep frequency whose gain is closest to `dc_gain_db - 3`. `None`
    /// for an empty sweep.
    pub measured_bandwidth: Option<f64>,
    /// Sweep points.
    pub sweep: Vec<AmplifierPoint>,
    /// One-paragraph summary.
    pub conclusion: String,
}

/// Single-pole amplifier frequency-response kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplifierKernel {
    dc_gain: f64,
    bandwidth: f64,
    input_impedance: f64,
    axis: LogAxis,
}

impl KernelLifecycle for AmplifierKernel {
    type Config = AmplifierConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            dc_gain: require_positive(
                config.dc_gain,
                "dc_gain",
                "dc_gain must be finite and greater than 0",
            )?,
            bandwidth: require_positive(
                config.bandwidth,
                "bandwidth",
                "bandwidth must be finite and greater than 0",
            )?,
            input_impedance: super::check_component(config.input_impedance, "input_impedance")?,
            axis: LogAxis::try_new(config.freq_start, config.freq_end, config.points)?,
        })
    }
}

impl AmplifierKernel {
    /// Gain and phase of the single-pole model at `frequency`.
    pub fn evaluate_at(&self, frequency: f64) -> AmplifierPoint {
        let ratio = frequency / self.bandwidth;
        let gain = self.dc_gain / (1.0 + ratio * ratio).sqrt();
        AmplifierPoint {
            frequency,
            gain_db: 20.0 * gain.log10(),
            phase_deg: -ratio.atan().to_degrees(),
        }
    }
}

impl FrequencySweep for AmplifierKernel {
    type Output = AmplifierResponse;

    fn run_alloc(&self) -> core::result::Result<Self::Output, ExecInvariantViolation> {
        let _span = tracing::info_span!("frequency_sweep", points = self.axis.points()).entered();
        let dc_gain_db = 20.0 * self.dc_gain.log10();
        let sweep = self
            .axis
            .frequencies()
            .into_iter()
            .map(|f| self.evaluate_at(f))
            .collect::<Vec<_>>();
        let target = dc_gain_db - 3.0;
        let measured_bandwidth = sweep
            .iter()
            .enumerate()
            .min_by(|(i, a), (j, b)| {
                (a.gain_db - target)
                    .abs()
                    .total_cmp(&(b.gain_db - target).abs())
                    .then(i.cmp(j))
            })
            .map(|(_, p)| p.frequency);
        let gain_bandwidth_product = self.dc_gain * self.bandwidth;
        tracing::debug!(
            dc_gain_db,
            gain_bandwidth_product,
            measured_bandwidth = ?measured_bandwidth,
            "amplifier response"
        );

        let conclusion = match measured_bandwidth {
            Some(bw) => format!(
                "DC gain {} ({:.1} dB), measured -3 dB bandwidth {:.0} Hz, gain-bandwidth product {:.2} MHz.",
                self.dc_gain,
                dc_gain_db,
                bw,
                gain_bandwidth_product / 1e6
            ),
            None => format!(
                "DC gain {} ({:.1} dB), gain-bandwidth product {:.2} MHz.",
                self.dc_gain,
                dc_gain_db,
                gain_bandwidth_product / 1e6
            ),
        };
        Ok(AmplifierResponse {
            dc_gain: self.dc_gain,
            dc_gain_db,
            bandwidth: self.bandwidth,
            input_impedance: self.input_impedance,
            gain_bandwidth_product,
            measured_bandwidth,
            sweep,
            conclusion,
        })
    }
}

/// Sweep a single-pole amplifier model, `A(f) = A0 / sqrt(1 + (f/BW)^2)`.
///
/// # Errors
/// `dc_gain` or `bandwidth` is not finite and positive, `input_impedance`
/// is negative, or a sweep bound is invalid.
pub fn amplifier_response(config: AmplifierConfig) -> Result<AmplifierResponse> {
    let kernel = AmplifierKernel::try_new(config)?;
    Ok(kernel.run_alloc()?)
}
