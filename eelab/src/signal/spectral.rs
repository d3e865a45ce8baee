//! Hann-windowed single-sided amplitude spectrum.

use crate::kernel::{read_nonempty, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::check_sample_rate;
use crate::signal::traits::{SpectrumAnalyze1D, WindowGenerate};
use crate::signal::windows::{HannConfig, HannKernel};
use eelab_core::Result;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;

/// Floor added to magnitudes before converting to dB.
pub const DB_FLOOR: f64 = 1e-10;

/// Single-sided spectrum of a real signal.
///
/// All vectors hold `max(N / 2, 1)` bins for an `N`-sample input.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Spectrum {
    /// Bin frequencies `k * sample_rate / N` in Hz.
    pub frequencies: Vec<f64>,
    /// Amplitude-corrected magnitude, `|X_k| * 2 / N`.
    pub magnitude: Vec<f64>,
    /// `20 * log10(magnitude + 1e-10)`.
    pub magnitude_db: Vec<f64>,
    /// Phase in degrees.
    pub phase: Vec<f64>,
    /// Frequency of the strongest non-DC bin.
    pub dominant_frequency: f64,
    /// Magnitude of the strongest non-DC bin.
    pub dominant_magnitude: f64,
    /// Magnitude of bin 0.
    pub dc_component: f64,
}

impl Spectrum {
    /// Index of the strongest bin, ignoring bin 0. `None` when there is no
    /// bin besides DC.
    pub fn dominant_index(&self) -> Option<usize> {
        argmax(self.magnitude.get(1..)?).map(|i| i + 1)
    }
}

fn argmax(x: &[f64]) -> Option<usize> {
    // First occurrence wins on ties.
    x.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if *v <= b => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}

fn fft_real(x: &[f64]) -> Vec<Complex<f64>> {
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(x.len());
    let mut buf = x
        .iter()
        .map(|v| Complex::new(*v, 0.0))
        .collect::<Vec<_>>();
    fft.process(&mut buf);
    buf
}

/// Constructor config for [`SpectrumKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

/// Trait-first spectrum analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumKernel {
    sample_rate: f64,
}

impl KernelLifecycle for SpectrumKernel {
    type Config = SpectrumConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            sample_rate: check_sample_rate(config.sample_rate)?,
        })
    }
}

impl SpectrumAnalyze1D for SpectrumKernel {
    fn run_alloc<I>(&self, input: &I) -> core::result::Result<Spectrum, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let x = read_nonempty(input, "signal")?;
        let n = x.len();
        let window: Vec<f64> = HannKernel::try_new(HannConfig {
            nx: n,
            fftbins: Some(false),
        })?
        .run_alloc()?;
        let windowed = x
            .iter()
            .zip(window.iter())
            .map(|(v, w)| v * w)
            .collect::<Vec<_>>();
        let spec = fft_real(&windowed);

        let bins = (n / 2).max(1);
        let scale = 2.0 / n as f64;
        let frequencies = (0..bins)
            .map(|k| k as f64 * self.sample_rate / n as f64)
            .collect::<Vec<_>>();
        let magnitude = spec[..bins]
            .iter()
            .map(|c| c.norm() * scale)
            .collect::<Vec<_>>();
        let magnitude_db = magnitude
            .iter()
            .map(|m| 20.0 * (m + DB_FLOOR).log10())
            .collect();
        let phase = spec[..bins]
            .iter()
            .map(|c| c.im.atan2(c.re).to_degrees())
            .collect();

        let mut spectrum = Spectrum {
            dc_component: magnitude[0],
            frequencies,
            magnitude,
            magnitude_db,
            phase,
            ..Default::default()
        };
        match spectrum.dominant_index() {
            Some(k) => {
                spectrum.dominant_frequency = spectrum.frequencies[k];
                spectrum.dominant_magnitude = spectrum.magnitude[k];
            }
            None => {
                spectrum.dominant_frequency = 0.0;
                spectrum.dominant_magnitude = spectrum.dc_component;
            }
        }
        tracing::debug!(
            n,
            dominant_frequency = spectrum.dominant_frequency,
            dc_component = spectrum.dc_component,
            "computed spectrum"
        );
        Ok(spectrum)
    }
}

/// Compute the Hann-windowed single-sided amplitude spectrum of `signal`.
///
/// Bin 0 is reported separately as `dc_component` and is never chosen as
/// the dominant frequency. Inputs with fewer than four samples have no
/// non-DC bin; their dominant frequency is 0 Hz with the DC magnitude.
///
/// # Errors
/// `signal` is empty or `sample_rate` is not finite and positive.
pub fn compute_fft<I>(signal: &I, sample_rate: f64) -> Result<Spectrum>
where
    I: Read1D<f64> + ?Sized,
{
    let kernel = SpectrumKernel::try_new(SpectrumConfig { sample_rate })?;
    Ok(kernel.run_alloc(signal)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{generate_signal, WaveShape, WaveformConfig};
    use approx::assert_abs_diff_eq;
    use core::f64::consts::PI;

    #[test]
    fn dominant_frequency_of_bin_centred_sine() {
        let wave = generate_signal(WaveformConfig {
            shape: WaveShape::Sine,
            frequency: 50.0,
            amplitude: 1.0,
            duration: 1.0,
            sample_rate: 1000.0,
            ..Default::default()
        })
        .expect("valid config");
        let spec = compute_fft(&wave, 1000.0).expect("spectrum");
        assert_eq!(spec.frequencies.len(), 500);
        assert_eq!(spec.dominant_frequency, 50.0);
        assert_abs_diff_eq!(spec.dc_component, 0.0, epsilon = 1e-2);
        // Hann coherent gain halves the amplitude.
        assert_abs_diff_eq!(spec.dominant_magnitude, 0.5, epsilon = 1e-2);
    }

    #[test]
    fn frequency_axis_and_db_floor() {
        let x = vec![0.0f64; 8];
        let spec = compute_fft(&x, 80.0).expect("spectrum");
        assert_eq!(spec.frequencies, vec![0.0, 10.0, 20.0, 30.0]);
        spec.magnitude_db
            .iter()
            .for_each(|db| assert_abs_diff_eq!(*db, -200.0, epsilon = 1e-9));
        assert_eq!(spec.dominant_frequency, 10.0);
    }

    #[test]
    fn dc_offset_lands_in_bin_zero() {
        let x = (0..256)
            .map(|i| 0.6 + (2.0 * PI * 32.0 * i as f64 / 256.0).sin())
            .collect::<Vec<_>>();
        let spec = compute_fft(&x, 256.0).expect("spectrum");
        assert_eq!(spec.dominant_frequency, 32.0);
        assert_abs_diff_eq!(spec.dc_component, 0.6, epsilon = 1e-2);
        assert!(spec.dc_component > spec.dominant_magnitude);
    }

    #[test]
    fn tiny_inputs_fall_back_to_dc() {
        let spec = compute_fft(&[2.0], 10.0).expect("spectrum");
        assert_eq!(spec.frequencies, vec![0.0]);
        assert_eq!(spec.dominant_frequency, 0.0);
        assert_eq!(spec.dominant_magnitude, spec.dc_component);
        assert_abs_diff_eq!(spec.dc_component, 4.0);

        let spec = compute_fft(&[1.0, 1.0, 1.0], 10.0).expect("spectrum");
        assert_eq!(spec.frequencies.len(), 1);
        assert_eq!(spec.dominant_frequency, 0.0);
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        let empty: [f64; 0] = [];
        assert!(compute_fft(&empty, 100.0).is_err());
        assert!(compute_fft(&[1.0, 2.0], 0.0).is_err());
        assert!(compute_fft(&[1.0, 2.0], f64::INFINITY).is_err());
    }
}
