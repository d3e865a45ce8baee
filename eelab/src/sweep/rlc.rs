use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::FrequencySweep;
use eelab_core::Result;
use serde::{Deserialize, Serialize};

use super::{Resonance, SweepConfig, SweepKernel, SweepPoint};

fn default_freq_start() -> f64 {
    10.0
}

fn default_freq_end() -> f64 {
    1e5
}

fn default_points() -> usize {
    500
}

/// Transient character implied by the damping factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// `zeta < 1`.
    Underdamped,
    /// `zeta == 1`.
    CriticallyDamped,
    /// `zeta > 1`.
    Overdamped,
}

impl ResponseType {
    /// Classify a damping factor.
    pub fn from_damping(zeta: f64) -> Self {
        if zeta < 1.0 {
            ResponseType::Underdamped
        } else if zeta == 1.0 {
            ResponseType::CriticallyDamped
        } else {
            ResponseType::Overdamped
        }
    }

    /// Lowercase prose name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Underdamped => "underdamped",
            ResponseType::CriticallyDamped => "critically damped",
            ResponseType::Overdamped => "overdamped",
        }
    }
}

/// Constructor config for [`RlcResonanceKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RlcResonanceConfig {
    /// Series resistance in ohms.
    pub resistance: f64,
    /// Series inductance in henries, `> 0`.
    pub inductance: f64,
    /// Series capacitance in farads, `> 0`.
    pub capacitance: f64,
    /// First sweep frequency in Hz.
    #[serde(default = "default_freq_start")]
    pub freq_start: f64,
    /// Last sweep frequency in Hz.
    #[serde(default = "default_freq_end")]
    pub freq_end: f64,
    /// Number of sweep points.
    #[serde(default = "default_points")]
    pub points: usize,
}

impl RlcResonanceConfig {
    /// Network with the experiment's default sweep axis.
    pub fn new(resistance: f64, inductance: f64, capacitance: f64) -> Self {
        Self {
            resistance,
            inductance,
            capacitance,
            freq_start: default_freq_start(),
            freq_end: default_freq_end(),
            points: default_points(),
        }
    }
}

/// Result of [`rlc_resonance`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RlcResonance {
    /// Resonant frequency, Q and bandwidth.
    #[serde(flatten)]
    pub resonance: Resonance,
    /// `R / (2 sqrt(L / C))`.
    pub damping_factor: f64,
    /// Classification of `damping_factor`.
    pub response_type: ResponseType,
    /// Sweep across the configured axis.
    pub sweep: Vec<SweepPoint>,
    /// One-paragraph summary.
    pub conclusion: String,
}

/// Series resonance experiment kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RlcResonanceKernel {
    sweep: SweepKernel,
    damping_factor: f64,
}

impl KernelLifecycle for RlcResonanceKernel {
    type Config = RlcResonanceConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        let reason = "resonance requires a positive, finite inductance and capacitance";
        crate::kernel::require_positive(config.inductance, "inductance", reason)?;
        crate::kernel::require_positive(config.capacitance, "capacitance", reason)?;
        let sweep = SweepKernel::try_new(SweepConfig {
            resistance: config.resistance,
            inductance: config.inductance,
            capacitance: config.capacitance,
            freq_start: config.freq_start,
            freq_end: config.freq_end,
            points: config.points,
        })?;
        Ok(Self {
            sweep,
            damping_factor: config.resistance
                / (2.0 * (config.inductance / config.capacitance).sqrt()),
        })
    }
}

impl FrequencySweep for RlcResonanceKernel {
    type Output = RlcResonance;

    fn run_alloc(&self) -> core::result::Result<Self::Output, ExecInvariantViolation> {
        let result = self.sweep.run_alloc()?;
        let resonance = result
            .resonance
            .ok_or(ExecInvariantViolation::InvalidState {
                reason: "network has no resonance",
            })?;
        let response_type = ResponseType::from_damping(self.damping_factor);
        let conclusion = format!(
            "Resonance at {:.2} Hz with Q = {:.2} and a -3 dB bandwidth of {:.2} Hz; the circuit is {}.",
            resonance.resonant_frequency,
            resonance.q_factor,
            resonance.bandwidth,
            response_type.as_str()
        );
        Ok(RlcResonance {
            resonance,
            damping_factor: self.damping_factor,
            response_type,
            sweep: result.points,
            conclusion,
        })
    }
}

/// Run the series RLC resonance experiment.
///
/// # Errors
/// `inductance` or `capacitance` is not positive, or any sweep parameter is
/// invalid (see [`super::frequency_response`]).
pub fn rlc_resonance(config: RlcResonanceConfig) -> Result<RlcResonance> {
    let kernel = RlcResonanceKernel::try_new(config)?;
    Ok(kernel.run_alloc()?)
}
