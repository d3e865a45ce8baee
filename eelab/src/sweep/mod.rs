//! Logarithmic frequency sweeps of series RLC networks and single-pole
//! amplifiers.
//!
//! Frequencies run from `freq_start` to `freq_end` inclusive, evenly spaced
//! in `log10`. Sweeps are evaluated point by point from closed-form
//! impedance expressions; nothing is simulated.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::FrequencySweep;
use eelab_core::num_rs::logspace;
use eelab_core::Result;
use nalgebra::Complex;
use serde::{Deserialize, Serialize};

mod amplifier;
mod rlc;
mod tolerance;

pub use amplifier::*;
pub use rlc::*;
pub use tolerance::*;

fn default_freq_start() -> f64 {
    1.0
}

fn default_freq_end() -> f64 {
    1e6
}

fn default_points() -> usize {
    100
}

/// Complex number as an explicit `{re, im}` record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexValue {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl From<Complex<f64>> for ComplexValue {
    fn from(value: Complex<f64>) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

impl From<ComplexValue> for Complex<f64> {
    fn from(value: ComplexValue) -> Self {
        Complex::new(value.re, value.im)
    }
}

/// Constructor config for [`SweepKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Series resistance in ohms.
    pub resistance: f64,
    /// Series inductance in henries. `0` omits the inductor.
    #[serde(default)]
    pub inductance: f64,
    /// Series capacitance in farads. `0` omits the capacitor.
    #[serde(default)]
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

impl SweepConfig {
    /// Resistor-only network with the default axis.
    pub fn new(resistance: f64) -> Self {
        Self {
            resistance,
            inductance: 0.0,
            capacitance: 0.0,
            freq_start: default_freq_start(),
            freq_end: default_freq_end(),
            points: default_points(),
        }
    }
}

/// One evaluated frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Frequency in Hz.
    pub frequency: f64,
    /// `|Z|` in ohms.
    pub impedance: f64,
    /// `atan2(-X, R)` in degrees.
    pub phase_deg: f64,
    /// `20 log10(R / |Z|)`; 0 dB when `|Z| == 0`.
    pub gain_db: f64,
    /// `R + jX`.
    pub complex_impedance: ComplexValue,
}

/// Resonance metadata of a network with both reactive elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resonance {
    /// `1 / (2 pi sqrt(L C))` in Hz.
    pub resonant_frequency: f64,
    /// `sqrt(L / C) / R`; `+inf` when `R == 0`.
    pub q_factor: f64,
    /// Half-power bandwidth `f0 / Q` in Hz.
    pub bandwidth: f64,
}

/// Result of [`frequency_response`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    /// Evaluated points in sweep order.
    pub points: Vec<SweepPoint>,
    /// Present when both `L` and `C` are positive.
    pub resonance: Option<Resonance>,
}

impl SweepResult {
    /// Frequency axis.
    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.frequency).collect()
    }

    /// Point with the smallest impedance magnitude.
    pub fn min_impedance(&self) -> Option<&SweepPoint> {
        self.points
            .iter()
            .min_by(|a, b| a.impedance.total_cmp(&b.impedance))
    }
}

/// Series R, L, C network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRlc {
    resistance: f64,
    inductance: f64,
    capacitance: f64,
}

impl SeriesRlc {
    /// Net reactance `X_L - X_C` at `frequency`; absent elements contribute 0.
    pub fn reactance(&self, frequency: f64) -> f64 {
        let omega = 2.0 * core::f64::consts::PI * frequency;
        let xl = if self.inductance > 0.0 {
            omega * self.inductance
        } else {
            0.0
        };
        let xc = if self.capacitance > 0.0 {
            1.0 / (omega * self.capacitance)
        } else {
            0.0
        };
        xl - xc
    }

    /// Impedance, gain and phase at `frequency`.
    pub fn evaluate_at(&self, frequency: f64) -> SweepPoint {
        let x = self.reactance(frequency);
        let z = Complex::new(self.resistance, x);
        let impedance = z.norm();
        let gain_db = if impedance > 0.0 {
            20.0 * (self.resistance / impedance).log10()
        } else {
            0.0
        };
        SweepPoint {
            frequency,
            impedance,
            phase_deg: (-x).atan2(self.resistance).to_degrees(),
            gain_db,
            complex_impedance: z.into(),
        }
    }

    /// Resonance metadata, `None` unless both `L` and `C` are positive.
    pub fn resonance(&self) -> Option<Resonance> {
        if !(self.inductance > 0.0 && self.capacitance > 0.0) {
            return None;
        }
        let f0 = 1.0 / (2.0 * core::f64::consts::PI * (self.inductance * self.capacitance).sqrt());
        let q = (self.inductance / self.capacitance).sqrt() / self.resistance;
        Some(Resonance {
            resonant_frequency: f0,
            q_factor: q,
            bandwidth: f0 / q,
        })
    }
}

pub(crate) fn check_component(
    value: f64,
    arg: &'static str,
) -> core::result::Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidArgument {
            arg,
            reason: "component values must be finite and non-negative",
        })
    }
}

/// Validated logarithmic frequency axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LogAxis {
    start: f64,
    end: f64,
    points: usize,
}

impl LogAxis {
    pub(crate) fn try_new(
        start: f64,
        end: f64,
        points: usize,
    ) -> core::result::Result<Self, ConfigError> {
        let reason = "sweep frequencies must be finite and greater than 0";
        let start = crate::kernel::require_positive(start, "freq_start", reason)?;
        let end = crate::kernel::require_positive(end, "freq_end", reason)?;
        Ok(Self { start, end, points })
    }

    pub(crate) fn frequencies(&self) -> Vec<f64> {
        logspace(self.start, self.end, self.points)
    }

    pub(crate) fn points(&self) -> usize {
        self.points
    }
}

/// Trait-first series RLC sweep kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepKernel {
    network: SeriesRlc,
    axis: LogAxis,
}

impl KernelLifecycle for SweepKernel {
    type Config = SweepConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            network: SeriesRlc {
                resistance: check_component(config.resistance, "resistance")?,
                inductance: check_component(config.inductance, "inductance")?,
                capacitance: check_component(config.capacitance, "capacitance")?,
            },
            axis: LogAxis::try_new(config.freq_start, config.freq_end, config.points)?,
        })
    }
}

impl SweepKernel {
    /// The network being swept.
    pub fn network(&self) -> &SeriesRlc {
        &self.network
    }
}

impl FrequencySweep for SweepKernel {
    type Output = SweepResult;

    fn run_alloc(&self) -> core::result::Result<Self::Output, ExecInvariantViolation> {
        let _span = tracing::info_span!("frequency_sweep", points = self.axis.points()).entered();
        let points = self
            .axis
            .frequencies()
            .into_iter()
            .map(|f| self.network.evaluate_at(f))
            .collect::<Vec<_>>();
        let resonance = self.network.resonance();
        if let Some(r) = &resonance {
            tracing::debug!(
                resonant_frequency = r.resonant_frequency,
                q_factor = r.q_factor,
                bandwidth = r.bandwidth,
                "series resonance"
            );
        }
        Ok(SweepResult { points, resonance })
    }
}

/// Sweep a series RLC network across a logarithmic frequency axis.
///
/// # Errors
/// A component value is negative or not finite, or a sweep bound is not
/// finite and positive.
///
/// ```
/// use eelab::sweep::{frequency_response, SweepConfig};
///
/// let sweep = frequency_response(SweepConfig {
///     inductance: 1e-3,
///     capacitance: 1e-6,
///     ..SweepConfig::new(100.0)
/// })
/// .unwrap();
/// let f0 = sweep.resonance.unwrap().resonant_frequency;
/// assert!((f0 - 5032.9).abs() < 0.1);
/// ```
pub fn frequency_response(config: SweepConfig) -> Result<SweepResult> {
    let kernel = SweepKernel::try_new(config)?;
    Ok(kernel.run_alloc()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn series(resistance: f64, inductance: f64, capacitance: f64) -> SeriesRlc {
        SeriesRlc {
            resistance,
            inductance,
            capacitance,
        }
    }

    #[test]
    fn resonance_of_reference_network() {
        let net = series(100.0, 1e-3, 1e-6);
        let r = net.resonance().unwrap();
        assert_relative_eq!(r.resonant_frequency, 5032.921_210_448_704, max_relative = 1e-12);
        assert_relative_eq!(r.q_factor, 0.316_227_766_016_837_94, max_relative = 1e-12);
        assert_relative_eq!(r.bandwidth, r.resonant_frequency / r.q_factor);

        let at = net.evaluate_at(r.resonant_frequency);
        assert_abs_diff_eq!(at.impedance, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(at.gain_db, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(at.phase_deg, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn sweep_axis_is_logarithmic_and_inclusive() {
        let sweep = frequency_response(SweepConfig {
            freq_start: 10.0,
            freq_end: 1e4,
            points: 4,
            ..SweepConfig::new(50.0)
        })
        .unwrap();
        let f = sweep.frequencies();
        assert_eq!(f.len(), 4);
        assert_eq!(f[0], 10.0);
        assert_relative_eq!(f[1], 100.0, max_relative = 1e-12);
        assert_relative_eq!(f[2], 1000.0, max_relative = 1e-12);
        assert_eq!(f[3], 1e4);
        assert!(sweep.resonance.is_none());
        // Pure resistance: flat response.
        for p in &sweep.points {
            assert_eq!(p.impedance, 50.0);
            assert_eq!(p.gain_db, 0.0);
            assert_eq!(p.complex_impedance, ComplexValue { re: 50.0, im: 0.0 });
        }
    }

    #[test]
    fn reactive_phase_signs() {
        // Inductive: current lags, phase negative.
        let p = series(10.0, 1e-3, 0.0).evaluate_at(1e4);
        assert!(p.phase_deg < 0.0);
        assert!(p.complex_impedance.im > 0.0);
        // Capacitive: current leads.
        let p = series(10.0, 0.0, 1e-6).evaluate_at(10.0);
        assert!(p.phase_deg > 0.0);
        assert!(p.gain_db < 0.0);
    }

    #[test]
    fn minimum_impedance_sits_near_resonance() {
        let sweep = frequency_response(SweepConfig {
            inductance: 1e-3,
            capacitance: 1e-6,
            points: 1000,
            ..SweepConfig::new(100.0)
        })
        .unwrap();
        let min = sweep.min_impedance().unwrap();
        let f0 = sweep.resonance.unwrap().resonant_frequency;
        assert!((min.frequency / f0 - 1.0).abs() < 0.01);
    }

    #[test]
    fn degenerate_conventions() {
        // R = 0 and Z = 0 at resonance.
        let net = series(0.0, 1e-3, 1e-6);
        let r = net.resonance().unwrap();
        assert_eq!(r.q_factor, f64::INFINITY);
        assert_eq!(r.bandwidth, 0.0);
        let p = series(0.0, 0.0, 0.0).evaluate_at(100.0);
        assert_eq!(p.impedance, 0.0);
        assert_eq!(p.gain_db, 0.0);
        let p = series(0.0, 1e-3, 0.0).evaluate_at(100.0);
        assert_eq!(p.gain_db, f64::NEG_INFINITY);

        let empty = frequency_response(SweepConfig {
            points: 0,
            ..SweepConfig::new(1.0)
        })
        .unwrap();
        assert!(empty.points.is_empty());
        let single = frequency_response(SweepConfig {
            points: 1,
            freq_start: 42.0,
            ..SweepConfig::new(1.0)
        })
        .unwrap();
        assert_eq!(single.frequencies(), vec![42.0]);
    }

    #[test]
    fn invalid_configs_are_hard_errors() {
        for (config, arg) in [
            (SweepConfig::new(-1.0), "resistance"),
            (
                SweepConfig {
                    inductance: f64::NAN,
                    ..SweepConfig::new(1.0)
                },
                "inductance",
            ),
            (
                SweepConfig {
                    freq_start: 0.0,
                    ..SweepConfig::new(1.0)
                },
                "freq_start",
            ),
            (
                SweepConfig {
                    freq_end: f64::INFINITY,
                    ..SweepConfig::new(1.0)
                },
                "freq_end",
            ),
        ] {
            assert!(matches!(
                frequency_response(config),
                Err(Error::InvalidArg { arg: ref a, .. }) if a == arg
            ));
        }
    }

    #[test]
    fn config_defaults_from_json() {
        let config: SweepConfig = serde_json::from_str(r#"{"resistance": 10}"#).unwrap();
        assert_eq!(config, SweepConfig::new(10.0));
        let json = serde_json::to_value(series(3.0, 0.0, 0.0).evaluate_at(1.0)).unwrap();
        assert_eq!(json["complex_impedance"]["re"], 3.0);
    }
}
