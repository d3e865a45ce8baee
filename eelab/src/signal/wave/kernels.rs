//! Trait-first kernels for waveform generation.

use crate::kernel::{
    require_positive, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::check_sample_rate;
use crate::signal::traits::WaveformGenerate;
use crate::stats::{min_max, rms};
use nalgebra::RealField;
use serde::{Deserialize, Serialize};

fn wrap_phase<F>(t: F) -> F
where
    F: RealField + Copy,
{
    let two_pi = F::two_pi();
    let mut x = t % two_pi;
    if x < F::zero() {
        x += two_pi;
    }
    x
}

/// Constructor config for [`SquareWaveKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareWaveConfig<F>
where
    F: RealField + Copy,
{
    /// Duty cycle in the interval `[0, 1]`.
    pub duty: F,
}

/// Square wave of period `2*pi`: `+1` for the first `duty` of each period,
/// `-1` for the rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareWaveKernel<F>
where
    F: RealField + Copy,
{
    duty: F,
}

impl<F> SquareWaveKernel<F>
where
    F: RealField + Copy,
{
    /// Evaluate at phase `t` radians.
    pub fn sample(&self, t: F) -> F {
        if wrap_phase(t) < F::two_pi() * self.duty {
            F::one()
        } else {
            -F::one()
        }
    }
}

impl<F> KernelLifecycle for SquareWaveKernel<F>
where
    F: RealField + Copy,
{
    type Config = SquareWaveConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.duty < F::zero() || config.duty > F::one() {
            return Err(ConfigError::InvalidArgument {
                arg: "duty",
                reason: "duty must be in [0, 1]",
            });
        }
        Ok(Self { duty: config.duty })
    }
}

/// Constructor config for [`SawtoothWaveKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SawtoothWaveConfig<F>
where
    F: RealField + Copy,
{
    /// Width of the rising ramp in `[0, 1]`.
    pub width: F,
}

/// Ramp of period `2*pi` rising from `-1` to `1` over `[0, width*2*pi)` and
/// falling back to `-1` over the remainder. `width = 0.5` is a triangle wave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SawtoothWaveKernel<F>
where
    F: RealField + Copy,
{
    width: F,
}

impl<F> SawtoothWaveKernel<F>
where
    F: RealField + Copy,
{
    /// Evaluate at phase `t` radians.
    pub fn sample(&self, t: F) -> F {
        let x = wrap_phase(t);
        let pi = F::pi();

        if self.width == F::zero() {
            return F::one() - x / pi;
        }
        if self.width == F::one() {
            return x / pi - F::one();
        }

        let threshold = F::two_pi() * self.width;
        if x < threshold {
            x / (pi * self.width) - F::one()
        } else {
            (pi * (self.width + F::one()) - x) / (pi * (F::one() - self.width))
        }
    }
}

impl<F> KernelLifecycle for SawtoothWaveKernel<F>
where
    F: RealField + Copy,
{
    type Config = SawtoothWaveConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.width < F::zero() || config.width > F::one() {
            return Err(ConfigError::InvalidArgument {
                arg: "width",
                reason: "width must be in [0, 1]",
            });
        }
        Ok(Self {
            width: config.width,
        })
    }
}

/// Waveform shape tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveShape {
    /// `sin`.
    #[default]
    Sine,
    /// `cos`.
    Cosine,
    /// 50% duty square wave.
    Square,
    /// Rising ramp.
    Sawtooth,
    /// Symmetric triangle.
    Triangle,
    /// Any unrecognised tag. Generates silence.
    #[serde(other)]
    Unknown,
}

impl WaveShape {
    /// Lowercase tag as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaveShape::Sine => "sine",
            WaveShape::Cosine => "cosine",
            WaveShape::Square => "square",
            WaveShape::Sawtooth => "sawtooth",
            WaveShape::Triangle => "triangle",
            WaveShape::Unknown => "unknown",
        }
    }
}

fn default_sample_rate() -> f64 {
    10_000.0
}

/// Constructor config for [`WaveformKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformConfig {
    /// Waveform shape.
    #[serde(rename = "signal_type", alias = "shape")]
    pub shape: WaveShape,
    /// Fundamental frequency in Hz.
    pub frequency: f64,
    /// Peak amplitude.
    pub amplitude: f64,
    /// Length of the waveform in seconds.
    pub duration: f64,
    /// Samples per second.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Phase offset in degrees.
    #[serde(default)]
    pub phase: f64,
    /// Constant added to every sample.
    #[serde(default)]
    pub dc_offset: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            shape: WaveShape::Sine,
            frequency: 1.0,
            amplitude: 1.0,
            duration: 1.0,
            sample_rate: default_sample_rate(),
            phase: 0.0,
            dc_offset: 0.0,
        }
    }
}

/// A generated waveform with its time axis and summary metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
    /// Sample timestamps in seconds.
    pub time: Vec<f64>,
    /// Samples.
    pub signal: Vec<f64>,
    /// Shape that was generated.
    pub signal_type: WaveShape,
    /// Fundamental frequency in Hz.
    pub frequency: f64,
    /// Peak amplitude.
    pub amplitude: f64,
    /// Samples per second.
    pub sample_rate: f64,
    /// Requested duration in seconds.
    pub duration: f64,
    /// Root mean square of `signal`.
    pub rms: f64,
    /// `max(signal) - min(signal)`.
    pub peak_to_peak: f64,
}

/// Largest sample count a single waveform may hold.
pub const MAX_WAVEFORM_LEN: usize = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shaper {
    Sin,
    Cos,
    Square(SquareWaveKernel<f64>),
    Ramp(SawtoothWaveKernel<f64>),
    Silent,
}

impl Shaper {
    fn eval(&self, phase: f64) -> f64 {
        match self {
            Shaper::Sin => phase.sin(),
            Shaper::Cos => phase.cos(),
            Shaper::Square(k) => k.sample(phase),
            Shaper::Ramp(k) => k.sample(phase),
            Shaper::Silent => 0.0,
        }
    }
}

/// Trait-first periodic waveform generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformKernel {
    shape: WaveShape,
    shaper: Shaper,
    frequency: f64,
    amplitude: f64,
    duration: f64,
    sample_rate: f64,
    phase_rad: f64,
    dc_offset: f64,
    len: usize,
}

impl WaveformKernel {
    /// Number of samples the kernel emits, `round(sample_rate * duration)`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Never true for a validated kernel.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn time_at(&self, i: usize) -> f64 {
        i as f64 * self.duration / self.len as f64
    }

    fn sample(&self, t: f64) -> f64 {
        if matches!(self.shaper, Shaper::Silent) {
            return 0.0;
        }
        let phase = 2.0 * core::f64::consts::PI * self.frequency * t + self.phase_rad;
        self.amplitude * self.shaper.eval(phase) + self.dc_offset
    }
}

impl KernelLifecycle for WaveformKernel {
    type Config = WaveformConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !(config.frequency.is_finite() && config.frequency >= 0.0) {
            return Err(ConfigError::InvalidArgument {
                arg: "frequency",
                reason: "frequency must be finite and not negative",
            });
        }
        let frequency = config.frequency;
        let duration = require_positive(
            config.duration,
            "duration",
            "duration must be finite and greater than 0",
        )?;
        let sample_rate = check_sample_rate(config.sample_rate)?;
        for (arg, value) in [
            ("amplitude", config.amplitude),
            ("phase", config.phase),
            ("dc_offset", config.dc_offset),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidArgument {
                    arg,
                    reason: "value must be finite",
                });
            }
        }
        let len = (sample_rate * duration).round();
        if len < 1.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "duration",
                reason: "duration must span at least one sample",
            });
        }
        if len > MAX_WAVEFORM_LEN as f64 {
            return Err(ConfigError::InvalidArgument {
                arg: "duration",
                reason: "sample_rate * duration exceeds the maximum waveform length",
            });
        }

        let shaper = match config.shape {
            WaveShape::Sine => Shaper::Sin,
            WaveShape::Cosine => Shaper::Cos,
            WaveShape::Square => {
                Shaper::Square(SquareWaveKernel::try_new(SquareWaveConfig { duty: 0.5 })?)
            }
            WaveShape::Sawtooth => {
                Shaper::Ramp(SawtoothWaveKernel::try_new(SawtoothWaveConfig { width: 1.0 })?)
            }
            WaveShape::Triangle => {
                Shaper::Ramp(SawtoothWaveKernel::try_new(SawtoothWaveConfig { width: 0.5 })?)
            }
            WaveShape::Unknown => Shaper::Silent,
        };

        Ok(Self {
            shape: config.shape,
            shaper,
            frequency,
            amplitude: config.amplitude,
            duration,
            sample_rate,
            phase_rad: config.phase.to_radians(),
            dc_offset: config.dc_offset,
            len: len as usize,
        })
    }
}

impl WaveformGenerate for WaveformKernel {
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<f64> + ?Sized,
    {
        let out = out
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if out.len() != self.len {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: self.len,
                got: out.len(),
            });
        }
        out.iter_mut()
            .enumerate()
            .for_each(|(i, out)| *out = self.sample(self.time_at(i)));
        Ok(())
    }

    fn run_alloc(&self) -> Result<Waveform, ExecInvariantViolation> {
        if self.shape == WaveShape::Unknown {
            tracing::warn!(
                frequency = self.frequency,
                "unsupported waveform shape, generating silence"
            );
        }
        let time = (0..self.len).map(|i| self.time_at(i)).collect::<Vec<_>>();
        let signal = time.iter().map(|t| self.sample(*t)).collect::<Vec<_>>();
        let (lo, hi): (f64, f64) = min_max(signal.iter());
        Ok(Waveform {
            rms: rms(signal.iter()),
            peak_to_peak: hi - lo,
            time,
            signal,
            signal_type: self.shape,
            frequency: self.frequency,
            amplitude: self.amplitude,
            sample_rate: self.sample_rate,
            duration: self.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::PI;

    #[test]
    fn square_wave_kernel_follows_duty() {
        let kernel = SquareWaveKernel::try_new(SquareWaveConfig { duty: 0.25f64 })
            .expect("kernel should initialize");
        assert_eq!(kernel.sample(0.0), 1.0);
        assert_eq!(kernel.sample(0.4 * PI), 1.0);
        assert_eq!(kernel.sample(0.6 * PI), -1.0);
        assert_eq!(kernel.sample(-0.1), -1.0);
        assert_eq!(kernel.sample(2.0 * PI + 0.1), 1.0);
    }

    #[test]
    fn sawtooth_kernel_shapes() {
        let ramp = SawtoothWaveKernel::try_new(SawtoothWaveConfig { width: 1.0f64 })
            .expect("kernel should initialize");
        assert_abs_diff_eq!(ramp.sample(0.0), -1.0);
        assert_abs_diff_eq!(ramp.sample(PI), 0.0, epsilon = 1e-12);

        let tri = SawtoothWaveKernel::try_new(SawtoothWaveConfig { width: 0.5f64 })
            .expect("kernel should initialize");
        assert_abs_diff_eq!(tri.sample(0.0), -1.0);
        assert_abs_diff_eq!(tri.sample(0.5 * PI), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tri.sample(PI), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tri.sample(1.5 * PI), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn shape_kernels_reject_out_of_range_parameters() {
        assert_eq!(
            SquareWaveKernel::try_new(SquareWaveConfig { duty: 1.5f64 }),
            Err(ConfigError::InvalidArgument {
                arg: "duty",
                reason: "duty must be in [0, 1]",
            })
        );
        assert!(SawtoothWaveKernel::try_new(SawtoothWaveConfig { width: -0.1f64 }).is_err());
    }

    #[test]
    fn run_into_checks_length() {
        let kernel = WaveformKernel::try_new(WaveformConfig {
            duration: 0.01,
            sample_rate: 1000.0,
            ..Default::default()
        })
        .expect("kernel should initialize");
        let mut short = [0.0f64; 3];
        assert_eq!(
            kernel.run_into(&mut short),
            Err(ExecInvariantViolation::LengthMismatch {
                arg: "out",
                expected: 10,
                got: 3,
            })
        );
        let mut out = vec![0.0f64; kernel.len()];
        kernel.run_into(&mut out).expect("matching length");
        let wave = kernel.run_alloc().expect("alloc");
        assert_eq!(out, wave.signal);
    }

    #[test]
    fn sample_count_is_bounded() {
        let at_limit = WaveformKernel::try_new(WaveformConfig {
            duration: 1.0,
            sample_rate: MAX_WAVEFORM_LEN as f64,
            ..Default::default()
        })
        .expect("limit itself is allowed");
        assert_eq!(at_limit.len(), MAX_WAVEFORM_LEN);

        for (sample_rate, duration) in [(1e12, 1e12), (f64::MAX, 2.0), (10_000.0, 1e9)] {
            assert_eq!(
                WaveformKernel::try_new(WaveformConfig {
                    duration,
                    sample_rate,
                    ..Default::default()
                }),
                Err(ConfigError::InvalidArgument {
                    arg: "duration",
                    reason: "sample_rate * duration exceeds the maximum waveform length",
                })
            );
        }
    }

    #[test]
    fn unknown_tag_deserializes_to_unknown() {
        let cfg: WaveformConfig = serde_json::from_str(
            r#"{"signal_type": "chirp", "frequency": 5, "amplitude": 1, "duration": 1}"#,
        )
        .expect("valid json");
        assert_eq!(cfg.shape, WaveShape::Unknown);
        assert_eq!(cfg.sample_rate, 10_000.0);
        assert_eq!(cfg.phase, 0.0);
    }
}
