use crate::kernel::{ConfigError, KernelLifecycle, Read1D};
use crate::signal::traits::WaveformGenerate;
use crate::signal::Signal;
use eelab_core::Result;

mod kernels;
pub use kernels::*;

/// Generate a periodic waveform.
///
/// Produces `round(sample_rate * duration)` samples of
/// `amplitude * f(2*pi*frequency*t + phase) + dc_offset` at
/// `t_i = i * duration / N`. An [`WaveShape::Unknown`] shape yields an
/// all-zero signal rather than an error, and a frequency of 0 holds the
/// shape at its starting phase.
///
/// # Errors
/// Negative or non-finite frequency, non-positive or non-finite duration or
/// sample rate, non-finite amplitude, phase or offset, or a sample count
/// below one or above [`MAX_WAVEFORM_LEN`].
pub fn generate_signal(config: WaveformConfig) -> Result<Waveform> {
    let kernel = WaveformKernel::try_new(config)?;
    Ok(kernel.run_alloc()?)
}

impl Waveform {
    /// Copy the samples into a [`Signal`] at the waveform's sample rate.
    pub fn to_signal(&self) -> Signal {
        Signal {
            samples: self.signal.clone(),
            sample_rate: self.sample_rate,
        }
    }
}

impl Read1D<f64> for Waveform {
    fn read_slice(&self) -> core::result::Result<&[f64], ConfigError> {
        Ok(&self.signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::SQRT_2;

    fn config(shape: WaveShape) -> WaveformConfig {
        WaveformConfig {
            shape,
            frequency: 50.0,
            amplitude: 2.0,
            duration: 1.0,
            sample_rate: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn sample_count_is_rounded_product() {
        for shape in [
            WaveShape::Sine,
            WaveShape::Cosine,
            WaveShape::Square,
            WaveShape::Sawtooth,
            WaveShape::Triangle,
            WaveShape::Unknown,
        ] {
            let wave = generate_signal(WaveformConfig {
                duration: 0.0123,
                sample_rate: 10_000.0,
                ..config(shape)
            })
            .expect("valid config");
            assert_eq!(wave.signal.len(), 123);
            assert_eq!(wave.time.len(), 123);
        }
    }

    #[test]
    fn time_axis_spans_half_open_duration() {
        let wave = generate_signal(WaveformConfig {
            duration: 0.5,
            sample_rate: 8.0,
            ..config(WaveShape::Sine)
        })
        .expect("valid config");
        assert_eq!(wave.time, vec![0.0, 0.125, 0.25, 0.375]);
    }

    #[test]
    fn sine_rms_is_amplitude_over_root_two() {
        let wave = generate_signal(config(WaveShape::Sine)).expect("valid config");
        assert_abs_diff_eq!(wave.rms, 2.0 / SQRT_2, epsilon = 1e-9);
        assert_abs_diff_eq!(wave.peak_to_peak, 4.0, epsilon = 1e-3);
    }

    #[test]
    fn phase_shifted_cosine_is_sine() {
        let sine = generate_signal(config(WaveShape::Sine)).expect("valid config");
        let cosine = generate_signal(WaveformConfig {
            phase: -90.0,
            ..config(WaveShape::Cosine)
        })
        .expect("valid config");
        sine.signal
            .iter()
            .zip(cosine.signal.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(*a, *b, epsilon = 1e-9));
    }

    #[test]
    fn square_wave_levels_and_offset() {
        let wave = generate_signal(WaveformConfig {
            dc_offset: 1.0,
            ..config(WaveShape::Square)
        })
        .expect("valid config");
        assert_eq!(wave.signal[0], 3.0);
        assert!(wave.signal.iter().all(|v| *v == 3.0 || *v == -1.0));
        assert_abs_diff_eq!(wave.peak_to_peak, 4.0);
    }

    #[test]
    fn unknown_shape_is_silent() {
        let wave = generate_signal(WaveformConfig {
            dc_offset: 5.0,
            ..config(WaveShape::Unknown)
        })
        .expect("unknown shape is not an error");
        assert!(wave.signal.iter().all(|v| *v == 0.0));
        assert_eq!(wave.signal_type, WaveShape::Unknown);
        assert_eq!(wave.rms, 0.0);
        assert_eq!(wave.peak_to_peak, 0.0);
    }

    #[test]
    fn invalid_parameters_are_hard_errors() {
        for cfg in [
            WaveformConfig {
                frequency: -1.0,
                ..config(WaveShape::Sine)
            },
            WaveformConfig {
                sample_rate: -1.0,
                ..config(WaveShape::Sine)
            },
            WaveformConfig {
                duration: 1e-6,
                ..config(WaveShape::Sine)
            },
            WaveformConfig {
                amplitude: f64::NAN,
                ..config(WaveShape::Sine)
            },
        ] {
            assert!(generate_signal(cfg).is_err());
        }
    }

    #[test]
    fn zero_frequency_gives_a_constant_signal() {
        let wave = generate_signal(WaveformConfig {
            frequency: 0.0,
            amplitude: 2.0,
            phase: 90.0,
            dc_offset: 1.0,
            ..config(WaveShape::Sine)
        })
        .expect("zero frequency is allowed");
        assert!(wave.signal.iter().all(|v| (v - 3.0).abs() < 1e-12));
        assert_eq!(wave.frequency, 0.0);
        assert!(wave.peak_to_peak < 1e-12);
    }

    #[test]
    fn waveform_converts_to_signal() {
        let wave = generate_signal(config(WaveShape::Triangle)).expect("valid config");
        let signal = wave.to_signal();
        assert_eq!(signal.len(), 1000);
        assert_eq!(signal.sample_rate(), 1000.0);
        assert_eq!(wave.read_slice().expect("contiguous"), signal.samples());
    }
}
