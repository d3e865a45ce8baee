//! Signal-processing and frequency-sweep engine for electrical-engineering
//! calculators.
//!
//! The crate covers waveform synthesis, Hann-windowed spectral analysis,
//! calibrated noise injection, bandwidth estimation, zero-phase Butterworth
//! filtering and logarithmic impedance/gain sweeps of RLC networks and
//! single-pole amplifiers.
//!
//! Each capability is a kernel built from a validated config (see
//! [`kernel::KernelLifecycle`]) with a free-function wrapper for one-shot use:
//!
//! ```
//! use eelab::signal::{compute_fft, generate_signal, WaveShape, WaveformConfig};
//!
//! let wave = generate_signal(WaveformConfig {
//!     shape: WaveShape::Sine,
//!     frequency: 50.0,
//!     amplitude: 1.0,
//!     duration: 1.0,
//!     sample_rate: 1000.0,
//!     ..Default::default()
//! })
//! .unwrap();
//! let spectrum = compute_fft(&wave.signal, 1000.0).unwrap();
//! assert_eq!(spectrum.dominant_frequency, 50.0);
//! ```

#![deny(missing_docs)]

/// Crate-wide error and result types.
pub mod error;
pub use error::{Error, Result};

pub mod kernel;

/// Persistence hook for calculation results.
pub mod record;

/// Signal generation, analysis and filtering.
pub mod signal;

/// Statistical reductions over sample sequences.
pub mod stats;

/// Frequency-sweep engine.
pub mod sweep;
