use crate::kernel::{read_nonempty, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::iter::Sum;
use eelab_core::Result;
use itertools::{Itertools, MinMaxResult};
use num_traits::Float;
use serde::Serialize;

/// 1D summary-statistics reduction capability.
pub trait SummaryReduce1D {
    /// Reduce `input` into its summary statistics.
    fn run<I>(&self, input: &I) -> core::result::Result<SignalStatistics, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Empty config for stateless kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsConfig;

/// Amplitude summary of a sampled signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalStatistics {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Root mean square.
    pub rms: f64,
    /// Largest absolute sample.
    pub peak: f64,
    /// `max - min`.
    pub peak_to_peak: f64,
    /// `peak / rms`, 0 for an all-zero signal.
    pub crest_factor: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

/// Trait-first summary statistics kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalStatsKernel;

impl KernelLifecycle for SignalStatsKernel {
    type Config = StatsConfig;

    fn try_new(_: Self::Config) -> core::result::Result<Self, ConfigError> {
        Ok(Self)
    }
}

impl SummaryReduce1D for SignalStatsKernel {
    fn run<I>(&self, input: &I) -> core::result::Result<SignalStatistics, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let y = read_nonempty(input, "signal")?;
        let (min, max): (f64, f64) = min_max(y.iter());
        let rms: f64 = rms(y.iter());
        let peak = y.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        Ok(SignalStatistics {
            mean: mean(y.iter()).0,
            std: stdev(y.iter()).0,
            rms,
            peak,
            peak_to_peak: max - min,
            crest_factor: if rms > 0.0 { peak / rms } else { 0.0 },
            min,
            max,
        })
    }
}

/// Summary statistics of `signal`.
///
/// ```
/// use eelab::stats::signal_statistics;
///
/// let s = signal_statistics(&[1.0, -1.0, 1.0, -1.0]).unwrap();
/// assert_eq!(s.rms, 1.0);
/// assert_eq!(s.peak_to_peak, 2.0);
/// assert_eq!(s.crest_factor, 1.0);
/// ```
///
/// # Errors
/// `signal` is empty.
pub fn signal_statistics<I>(signal: &I) -> Result<SignalStatistics>
where
    I: Read1D<f64> + ?Sized,
{
    Ok(SignalStatsKernel.run(signal)?)
}

///
/// Compute the mean of the signal, `y`
///
/// Return the mean and the number of points averaged
///
/// ```
/// use approx::assert_relative_eq;
/// use eelab::stats::mean;
///
/// let y: [f64; 5] = [1.,2.,3.,4.,5.];
/// assert_relative_eq!(3f64, mean(y.iter()).0);
///
/// let y: &[f32] = &[];
/// assert_eq!((0f32, 0), mean(y.iter()));
/// ```
///
pub fn mean<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let (sum, count) = y.fold(Default::default(), |acc: (F, usize), yi| {
        (acc.0 + *yi.borrow(), acc.1 + 1)
    });
    match F::from(count) {
        Some(n) if count > 0 => (sum / n, count),
        _ => Default::default(),
    }
}

///
/// Compute the population variance of the signal, `y`
///
/// ```
/// use approx::assert_relative_eq;
/// use eelab::stats::variance;
///
/// let y: [f64; 5] = [1.,2.,3.,4.,5.];
/// assert_relative_eq!(2f64, variance(y.iter()).0);
/// ```
///
pub fn variance<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default + Sum,
    YI: Iterator + Clone,
    YI::Item: Borrow<F>,
{
    let (avg, n) = mean(y.clone());
    let sum: F = y
        .map(|f| {
            let delta = *f.borrow() - avg;
            delta * delta
        })
        .sum::<F>();
    match F::from(n) {
        Some(count) if n > 0 => (sum / count, n),
        _ => Default::default(),
    }
}

///
/// Compute the population standard deviation of the signal, `y`
///
pub fn stdev<YI, F>(y: YI) -> (F, usize)
where
    F: Float + Default + Sum,
    YI: Iterator + Clone,
    YI::Item: Borrow<F>,
{
    match variance(y) {
        (_, 0) => Default::default(),
        (v, n) => (v.sqrt(), n),
    }
}

/// Mean of the squared samples, i.e. the average power of `y`.
pub fn mean_square<YI, F>(y: YI) -> F
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    mean(y.map(|yi| {
        let v = *yi.borrow();
        v * v
    }))
    .0
}

///
/// Root Mean Square (RMS) of signal `y`.
///
/// Unlike a standard deviation, the mean is not removed first. Empty input
/// yields 0.
///
pub fn rms<YI, F>(y: YI) -> F
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    mean_square(y).sqrt()
}

/// Smallest and largest sample, `(0, 0)` for empty input.
pub fn min_max<YI, F>(y: YI) -> (F, F)
where
    F: Float + Default,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    match y
        .map(|yi| *yi.borrow())
        .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    {
        MinMaxResult::NoElements => Default::default(),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    }
}
