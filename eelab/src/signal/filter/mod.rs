//! Butterworth design and zero-phase application.
//!
//! [`filter_signal`] is the validated entry point. The lower-level pieces
//! ([`design`], [`sosfilt_checked_slice`], [`sosfilt_zi_checked_slice`],
//! [`sosfiltfilt_checked_slice`]) are exposed for callers that manage
//! their own sections.

use crate::kernel::{read_nonempty, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::check_sample_rate;
use crate::signal::traits::{FilterApply1D, IirDesign};
use crate::stats::rms;
use eelab_core::Result;
use serde::{Deserialize, Serialize};

/// Filter design: prototypes, transforms, sections and frequency response.
pub mod design;

mod arraytools;
mod kernels;
mod sosfilt;
mod sosfilt_zi;
mod sosfiltfilt;

pub use arraytools::*;
pub use kernels::*;
pub use sosfilt::*;
pub use sosfilt_zi::*;
pub use sosfiltfilt::*;

use design::{ButterConfig, ButterKernel, FilterBandType, Sos};

/// Band types [`filter_signal`] accepts.
pub const FILTER_TYPES: [FilterBandType; 4] = [
    FilterBandType::Lowpass,
    FilterBandType::Highpass,
    FilterBandType::Bandpass,
    FilterBandType::Bandstop,
];

fn default_order() -> usize {
    4
}

/// Cutoff frequency in Hz: a single edge or a `(low, high)` band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cutoff {
    /// Lowpass or highpass edge.
    Single(f64),
    /// Bandpass or bandstop edges.
    Band(f64, f64),
}

impl Cutoff {
    fn values(&self) -> Vec<f64> {
        match *self {
            Cutoff::Single(f) => vec![f],
            Cutoff::Band(lo, hi) => vec![lo, hi],
        }
    }
}

impl From<f64> for Cutoff {
    fn from(value: f64) -> Self {
        Cutoff::Single(value)
    }
}

impl From<(f64, f64)> for Cutoff {
    fn from((lo, hi): (f64, f64)) -> Self {
        Cutoff::Band(lo, hi)
    }
}

/// Constructor config for [`FilterKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Band type.
    pub filter_type: FilterBandType,
    /// Cutoff frequency or band edges, in Hz.
    pub cutoff: Cutoff,
    /// Butterworth order.
    #[serde(default = "default_order")]
    pub order: usize,
}

/// Result of [`filter_signal`].
///
/// A rejected request carries the input unchanged and an explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterOutcome {
    /// The signal was filtered.
    Filtered {
        /// Zero-phase filtered samples.
        filtered_signal: Vec<f64>,
        /// Band type applied.
        filter_type: FilterBandType,
        /// Cutoff in Hz, as requested.
        cutoff_frequency: Cutoff,
        /// Order applied.
        order: usize,
        /// RMS of the input.
        original_rms: f64,
        /// RMS of the output.
        filtered_rms: f64,
    },
    /// The request was not valid for this signal.
    Rejected {
        /// The unmodified input.
        filtered_signal: Vec<f64>,
        /// Why the request was rejected.
        error: String,
    },
}

impl FilterOutcome {
    /// Output samples; the input itself when rejected.
    pub fn filtered_signal(&self) -> &[f64] {
        match self {
            FilterOutcome::Filtered {
                filtered_signal, ..
            }
            | FilterOutcome::Rejected {
                filtered_signal, ..
            } => filtered_signal,
        }
    }

    /// Rejection message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            FilterOutcome::Filtered { .. } => None,
            FilterOutcome::Rejected { error, .. } => Some(error),
        }
    }

    /// `true` when the request was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, FilterOutcome::Rejected { .. })
    }
}

/// Design-and-apply Butterworth filter kernel.
///
/// Only the sample rate is validated at construction. Cutoff, order and
/// band type problems are reported per call as [`FilterOutcome::Rejected`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterKernel {
    sample_rate: f64,
    filter_type: FilterBandType,
    cutoff: Cutoff,
    order: usize,
}

impl KernelLifecycle for FilterKernel {
    type Config = FilterConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self {
            sample_rate: check_sample_rate(config.sample_rate)?,
            filter_type: config.filter_type,
            cutoff: config.cutoff,
            order: config.order,
        })
    }
}

impl FilterKernel {
    /// Validate the request and design its sections.
    pub fn design(&self) -> core::result::Result<Vec<Sos>, String> {
        let wn = self.normalized_cutoffs()?;
        self.butter(wn)
    }

    /// Cutoffs as fractions of Nyquist, checked against the band type and order.
    fn normalized_cutoffs(&self) -> core::result::Result<Vec<f64>, String> {
        let nyquist = 0.5 * self.sample_rate;
        let normal = self
            .cutoff
            .values()
            .into_iter()
            .map(|f| f / nyquist)
            .collect::<Vec<_>>();
        if normal.iter().any(|w| !(*w > 0.0 && *w < 1.0)) {
            return Err("Cutoff frequency must be between 0 and Nyquist frequency".into());
        }
        let expected = self
            .filter_type
            .cutoff_count()
            .ok_or_else(|| String::from("Unknown filter type"))?;
        if self.order == 0 {
            return Err("Filter order must be a positive integer".into());
        }
        if normal.len() != expected {
            return Err(match expected {
                1 => format!(
                    "{} filter requires a single cutoff frequency",
                    self.filter_type.as_str()
                ),
                _ => format!(
                    "{} filter requires a (low, high) cutoff pair",
                    self.filter_type.as_str()
                ),
            });
        }
        if let [lo, hi] = normal.as_slice() {
            if lo >= hi {
                return Err("Low cutoff must be below high cutoff".into());
            }
        }
        Ok(normal)
    }

    /// Padding the designed cascade will need, known before designing it.
    ///
    /// A digital order `n` (doubled for band filters) gives `n + 1` taps:
    /// even orders are all biquads, odd orders end in one first-order
    /// section. `None` when the count overflows.
    fn expected_padlen(&self) -> Option<usize> {
        let taps = self
            .order
            .checked_mul(self.filter_type.cutoff_count()?)?
            .checked_add(1)?;
        taps.checked_mul(3)
    }

    fn butter(&self, wn: Vec<f64>) -> core::result::Result<Vec<Sos>, String> {
        let kernel = ButterKernel::try_new(ButterConfig {
            order: self.order,
            wn,
            btype: self.filter_type,
            fs: None,
        })
        .map_err(|e| e.to_string())?;
        kernel.run_alloc().map_err(|e| e.to_string())
    }

    fn reject(&self, x: &[f64], error: String) -> FilterOutcome {
        tracing::warn!(
            filter_type = self.filter_type.as_str(),
            cutoff = ?self.cutoff,
            order = self.order,
            %error,
            "filter request rejected"
        );
        FilterOutcome::Rejected {
            filtered_signal: x.to_vec(),
            error,
        }
    }
}

impl FilterApply1D for FilterKernel {
    fn run_alloc<I>(&self, input: &I) -> core::result::Result<FilterOutcome, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let x = read_nonempty(input, "signal")?;
        let too_short = || "Signal is too short for zero-phase filtering at this order".to_owned();
        let wn = match self.normalized_cutoffs() {
            Ok(wn) => wn,
            Err(error) => return Ok(self.reject(x, error)),
        };
        if self.expected_padlen().is_none_or(|padlen| x.len() <= padlen) {
            return Ok(self.reject(x, too_short()));
        }
        let sos = match self.butter(wn) {
            Ok(sos) => sos,
            Err(error) => return Ok(self.reject(x, error)),
        };
        if x.len() <= sosfiltfilt_padlen(&sos) {
            return Ok(self.reject(x, too_short()));
        }
        let filtered = match sosfiltfilt_checked_slice(x, &sos) {
            Ok(y) => y,
            Err(e) => return Ok(self.reject(x, e.to_string())),
        };
        let original_rms: f64 = rms(x.iter());
        let filtered_rms: f64 = rms(filtered.iter());
        tracing::debug!(
            filter_type = self.filter_type.as_str(),
            sections = sos.len(),
            original_rms,
            filtered_rms,
            "applied zero-phase filter"
        );
        Ok(FilterOutcome::Filtered {
            filtered_signal: filtered,
            filter_type: self.filter_type,
            cutoff_frequency: self.cutoff,
            order: self.order,
            original_rms,
            filtered_rms,
        })
    }
}

/// Apply a zero-phase Butterworth filter to `signal`.
///
/// Invalid cutoffs, orders or band types do not fail; they come back as
/// [`FilterOutcome::Rejected`] with the signal untouched.
///
/// # Errors
/// `signal` is empty or `sample_rate` is not finite and positive.
///
/// ```
/// use eelab::signal::filter::{filter_signal, Cutoff};
/// use eelab::signal::filter::design::FilterBandType;
///
/// let x: Vec<f64> = (0..200).map(|i| (i as f64 * 0.05).sin()).collect();
/// let out = filter_signal(&x, 100.0, FilterBandType::Lowpass, Cutoff::Single(60.0), 4).unwrap();
/// assert!(out.is_rejected());
/// assert_eq!(out.filtered_signal(), x.as_slice());
/// ```
pub fn filter_signal<I>(
    signal: &I,
    sample_rate: f64,
    filter_type: FilterBandType,
    cutoff: Cutoff,
    order: usize,
) -> Result<FilterOutcome>
where
    I: Read1D<f64> + ?Sized,
{
    let kernel = FilterKernel::try_new(FilterConfig {
        sample_rate,
        filter_type,
        cutoff,
        order,
    })?;
    Ok(kernel.run_alloc(signal)?)
}
