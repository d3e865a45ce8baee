//! Butterworth IIR design in zeros/poles/gain form, converted to
//! second-order sections.
//!
//! The route is analog prototype ([`buttap`]), frequency transform
//! ([`lp2lp_zpk`], [`lp2hp_zpk`], [`lp2bp_zpk`], [`lp2bs_zpk`]), bilinear
//! transform ([`bilinear_zpk`]) and pairing into sections ([`zpk2sos`]).

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::SosFreqz1D;
use eelab_core::{Error, Result};
use nalgebra::Complex;
use serde::{Deserialize, Serialize};

mod kernels;
pub use kernels::*;

/// Imaginary parts at or below this magnitude are treated as real roots.
const REAL_ROOT_TOL: f64 = 1e-10;

/// Filter pass-band type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterBandType {
    /// Pass below the cutoff.
    Lowpass,
    /// Pass above the cutoff.
    Highpass,
    /// Pass between two cutoffs.
    Bandpass,
    /// Reject between two cutoffs.
    Bandstop,
    /// Any unrecognised tag.
    #[serde(other)]
    Unsupported,
}

impl FilterBandType {
    /// Lowercase tag as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterBandType::Lowpass => "lowpass",
            FilterBandType::Highpass => "highpass",
            FilterBandType::Bandpass => "bandpass",
            FilterBandType::Bandstop => "bandstop",
            FilterBandType::Unsupported => "unsupported",
        }
    }

    /// Number of critical frequencies the band type takes, `None` when
    /// unsupported.
    pub fn cutoff_count(&self) -> Option<usize> {
        match self {
            FilterBandType::Lowpass | FilterBandType::Highpass => Some(1),
            FilterBandType::Bandpass | FilterBandType::Bandstop => Some(2),
            FilterBandType::Unsupported => None,
        }
    }
}

/// Second-order section with Direct Form II transposed state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sos {
    /// Numerator `[b0, b1, b2]`.
    pub b: [f64; 3],
    /// Denominator `[1, a1, a2]`.
    pub a: [f64; 3],
    /// First delay state.
    pub zi0: f64,
    /// Second delay state.
    pub zi1: f64,
}

impl Sos {
    /// Section with zeroed state.
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        Self {
            b,
            a,
            zi0: 0.0,
            zi1: 0.0,
        }
    }

    /// Build sections from scipy's row-major `(n, 6)` layout
    /// `[b0, b1, b2, a0, a1, a2]`. Trailing values that do not fill a
    /// section are ignored.
    pub fn from_scipy_dyn(sections: usize, coeffs: Vec<f64>) -> Vec<Sos> {
        coeffs
            .chunks_exact(6)
            .take(sections)
            .map(|c| Sos::new([c[0], c[1], c[2]], [c[3], c[4], c[5]]))
            .collect()
    }

    /// Clear the delay state.
    pub fn reset(&mut self) {
        self.zi0 = 0.0;
        self.zi1 = 0.0;
    }
}

/// Zeros, poles and gain of a transfer function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZpkFormatFilter {
    /// Zeros.
    pub z: Vec<Complex<f64>>,
    /// Poles.
    pub p: Vec<Complex<f64>>,
    /// System gain.
    pub k: f64,
}

impl ZpkFormatFilter {
    /// `len(p) - len(z)`.
    ///
    /// # Errors
    /// More zeros than poles.
    pub fn relative_degree(&self) -> Result<usize> {
        self.p.len().checked_sub(self.z.len()).ok_or(Error::InvalidArg {
            arg: "zpk".into(),
            reason: "improper transfer function; poles must be >= zeros".into(),
        })
    }
}

fn prod(roots: &[Complex<f64>], f: impl Fn(Complex<f64>) -> Complex<f64>) -> Complex<f64> {
    roots
        .iter()
        .fold(Complex::new(1.0, 0.0), |acc, &r| acc * f(r))
}

/// Analog Butterworth lowpass prototype of order `n` with unit cutoff.
pub fn buttap(n: usize) -> ZpkFormatFilter {
    let two_n = 2.0 * n as f64;
    let p = (0..n)
        .map(|i| {
            let m = 2.0 * i as f64 - (n as f64 - 1.0);
            -Complex::from_polar(1.0, core::f64::consts::PI * m / two_n)
        })
        .collect();
    ZpkFormatFilter {
        z: Vec::new(),
        p,
        k: 1.0,
    }
}

/// Move a lowpass prototype's cutoff to `wo` rad/s.
pub fn lp2lp_zpk(zpk: ZpkFormatFilter, wo: f64) -> Result<ZpkFormatFilter> {
    let degree = zpk.relative_degree()?;
    Ok(ZpkFormatFilter {
        z: zpk.z.iter().map(|&z| z * wo).collect(),
        p: zpk.p.iter().map(|&p| p * wo).collect(),
        k: zpk.k * wo.powi(degree as i32),
    })
}

/// Transform a lowpass prototype into a highpass with cutoff `wo` rad/s.
pub fn lp2hp_zpk(zpk: ZpkFormatFilter, wo: f64) -> Result<ZpkFormatFilter> {
    let degree = zpk.relative_degree()?;
    let mut z = zpk.z.iter().map(|&z| wo / z).collect::<Vec<_>>();
    let p = zpk.p.iter().map(|&p| wo / p).collect();
    let k = zpk.k * (prod(&zpk.z, |z| -z) / prod(&zpk.p, |p| -p)).re;
    z.extend(core::iter::repeat_n(Complex::new(0.0, 0.0), degree));
    Ok(ZpkFormatFilter { z, p, k })
}

fn split_band(roots: &[Complex<f64>], wo: f64) -> Vec<Complex<f64>> {
    let plus = roots.iter().map(|&r| r + (r * r - wo * wo).sqrt());
    let minus = roots.iter().map(|&r| r - (r * r - wo * wo).sqrt());
    plus.chain(minus).collect()
}

/// Transform a lowpass prototype into a bandpass centred on `wo` rad/s
/// with width `bw` rad/s.
pub fn lp2bp_zpk(zpk: ZpkFormatFilter, wo: f64, bw: f64) -> Result<ZpkFormatFilter> {
    let degree = zpk.relative_degree()?;
    let z_lp = zpk.z.iter().map(|&z| z * (bw / 2.0)).collect::<Vec<_>>();
    let p_lp = zpk.p.iter().map(|&p| p * (bw / 2.0)).collect::<Vec<_>>();
    let mut z = split_band(&z_lp, wo);
    z.extend(core::iter::repeat_n(Complex::new(0.0, 0.0), degree));
    Ok(ZpkFormatFilter {
        z,
        p: split_band(&p_lp, wo),
        k: zpk.k * bw.powi(degree as i32),
    })
}

/// Transform a lowpass prototype into a bandstop centred on `wo` rad/s
/// with width `bw` rad/s.
pub fn lp2bs_zpk(zpk: ZpkFormatFilter, wo: f64, bw: f64) -> Result<ZpkFormatFilter> {
    let degree = zpk.relative_degree()?;
    let z_hp = zpk.z.iter().map(|&z| (bw / 2.0) / z).collect::<Vec<_>>();
    let p_hp = zpk.p.iter().map(|&p| (bw / 2.0) / p).collect::<Vec<_>>();
    let mut z = split_band(&z_hp, wo);
    z.extend(core::iter::repeat_n(Complex::new(0.0, wo), degree));
    z.extend(core::iter::repeat_n(Complex::new(0.0, -wo), degree));
    let k = zpk.k * (prod(&zpk.z, |z| -z) / prod(&zpk.p, |p| -p)).re;
    Ok(ZpkFormatFilter {
        z,
        p: split_band(&p_hp, wo),
        k,
    })
}

/// Map an analog filter to the z-plane with the bilinear transform at
/// sample rate `fs`.
pub fn bilinear_zpk(zpk: ZpkFormatFilter, fs: f64) -> Result<ZpkFormatFilter> {
    let degree = zpk.relative_degree()?;
    let fs2 = 2.0 * fs;
    let mut z = zpk
        .z
        .iter()
        .map(|&z| (fs2 + z) / (fs2 - z))
        .collect::<Vec<_>>();
    let p = zpk.p.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    let k = zpk.k * (prod(&zpk.z, |z| fs2 - z) / prod(&zpk.p, |p| fs2 - p)).re;
    z.extend(core::iter::repeat_n(Complex::new(-1.0, 0.0), degree));
    Ok(ZpkFormatFilter { z, p, k })
}

/// Roots grouped the way a section consumes them.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RootGroup {
    /// Complex root with positive imaginary part; its conjugate is implied.
    Pair(Complex<f64>),
    /// Two real roots.
    RealPair(f64, f64),
    /// One real root.
    Real(f64),
}

impl RootGroup {
    fn anchor(&self) -> Complex<f64> {
        match *self {
            RootGroup::Pair(c) => c,
            RootGroup::RealPair(a, b) => Complex::new(if a.abs() >= b.abs() { a } else { b }, 0.0),
            RootGroup::Real(r) => Complex::new(r, 0.0),
        }
    }

    fn poly(&self) -> [f64; 3] {
        match *self {
            RootGroup::Pair(c) => [1.0, -2.0 * c.re, c.norm_sqr()],
            RootGroup::RealPair(a, b) => [1.0, -(a + b), a * b],
            RootGroup::Real(r) => [1.0, -r, 0.0],
        }
    }
}

fn split_conjugates(roots: &[Complex<f64>]) -> Result<(Vec<Complex<f64>>, Vec<f64>)> {
    let upper = roots
        .iter()
        .filter(|r| r.im > REAL_ROOT_TOL)
        .copied()
        .collect::<Vec<_>>();
    let lower = roots.iter().filter(|r| r.im < -REAL_ROOT_TOL).count();
    if upper.len() != lower {
        return Err(Error::InvalidArg {
            arg: "zpk".into(),
            reason: "complex roots must come in conjugate pairs".into(),
        });
    }
    let reals = roots
        .iter()
        .filter(|r| r.im.abs() <= REAL_ROOT_TOL)
        .map(|r| r.re)
        .collect();
    Ok((upper, reals))
}

fn closeness(c: Complex<f64>) -> f64 {
    (1.0 - c.norm()).abs()
}

fn take_nearest(items: &mut Vec<f64>, target: Complex<f64>) -> Option<f64> {
    let idx = (0..items.len()).min_by(|&i, &j| {
        let di = (Complex::new(items[i], 0.0) - target).norm();
        let dj = (Complex::new(items[j], 0.0) - target).norm();
        di.total_cmp(&dj)
    })?;
    Some(items.swap_remove(idx))
}

/// Convert zeros/poles/gain into a cascade of second-order sections.
///
/// Poles are grouped into conjugate pairs, then remaining real poles two at
/// a time. Each group takes the zeros nearest to it, starting from the
/// group closest to the unit circle. Sections are returned with the poles
/// closest to the unit circle last and the gain folded into the first
/// numerator.
///
/// # Errors
/// Unpaired complex roots, more zeros than poles, or zeros left over after
/// pairing.
pub fn zpk2sos(zpk: &ZpkFormatFilter) -> Result<Vec<Sos>> {
    zpk.relative_degree()?;
    let (pole_pairs, mut pole_reals) = split_conjugates(&zpk.p)?;
    let (mut zero_pairs, mut zero_reals) = split_conjugates(&zpk.z)?;

    pole_reals.sort_by(|a, b| {
        closeness(Complex::new(*a, 0.0)).total_cmp(&closeness(Complex::new(*b, 0.0)))
    });
    let mut groups = pole_pairs
        .into_iter()
        .map(RootGroup::Pair)
        .chain(pole_reals.chunks(2).map(|c| match *c {
            [a, b] => RootGroup::RealPair(a, b),
            [a] => RootGroup::Real(a),
            _ => RootGroup::Real(0.0),
        }))
        .collect::<Vec<_>>();
    groups.sort_by(|a, b| closeness(a.anchor()).total_cmp(&closeness(b.anchor())));

    let mut sections = Vec::with_capacity(groups.len());
    for group in groups {
        let anchor = group.anchor();
        let wants = if matches!(group, RootGroup::Real(_)) { 1 } else { 2 };
        let dist = |c: Complex<f64>| (c - anchor).norm();
        let nearest_pair = (0..zero_pairs.len())
            .min_by(|&i, &j| dist(zero_pairs[i]).total_cmp(&dist(zero_pairs[j])));
        let nearest_real_dist = zero_reals
            .iter()
            .map(|r| (Complex::new(*r, 0.0) - anchor).norm())
            .fold(f64::INFINITY, f64::min);

        let zeros = match nearest_pair {
            Some(i) if wants == 2 && (zero_pairs[i] - anchor).norm() < nearest_real_dist => {
                RootGroup::Pair(zero_pairs.swap_remove(i)).poly()
            }
            _ => match take_nearest(&mut zero_reals, anchor) {
                Some(first) if wants == 2 => match take_nearest(&mut zero_reals, anchor) {
                    Some(second) => RootGroup::RealPair(first, second).poly(),
                    None => RootGroup::Real(first).poly(),
                },
                Some(first) => RootGroup::Real(first).poly(),
                None if wants == 2 && !zero_pairs.is_empty() => {
                    RootGroup::Pair(zero_pairs.swap_remove(0)).poly()
                }
                None => [1.0, 0.0, 0.0],
            },
        };
        sections.push(Sos::new(zeros, group.poly()));
    }

    if !zero_pairs.is_empty() || !zero_reals.is_empty() {
        return Err(Error::InvalidArg {
            arg: "zpk".into(),
            reason: "zeros could not be paired with poles".into(),
        });
    }
    if sections.is_empty() {
        sections.push(Sos::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]));
    }
    sections.reverse();
    for b in sections[0].b.iter_mut() {
        *b *= zpk.k;
    }
    Ok(sections)
}

fn freqz_section(sec: &Sos, omega: f64) -> Complex<f64> {
    let z = Complex::from_polar(1.0, -omega);
    let eval = |c: &[f64; 3]| c[0] + z * (c[1] + z * c[2]);
    eval(&sec.b) / eval(&sec.a)
}

fn sosfreqz_impl(sos: &[Sos], wor_n: usize) -> (Vec<f64>, Vec<Complex<f64>>) {
    (0..wor_n)
        .map(|i| {
            let omega = core::f64::consts::PI * i as f64 / wor_n as f64;
            let h = sos
                .iter()
                .fold(Complex::new(1.0, 0.0), |acc, sec| acc * freqz_section(sec, omega));
            (omega, h)
        })
        .unzip()
}

/// Constructor config for [`SosFreqzKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosFreqzConfig {
    /// Number of frequency bins on `[0, pi)`.
    pub wor_n: usize,
}

/// Trait-first SOS frequency response kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosFreqzKernel {
    wor_n: usize,
}

impl KernelLifecycle for SosFreqzKernel {
    type Config = SosFreqzConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.wor_n == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "wor_n",
                reason: "wor_n must be > 0",
            });
        }
        Ok(Self {
            wor_n: config.wor_n,
        })
    }
}

impl SosFreqz1D for SosFreqzKernel {
    fn run_into<I, OW, OH>(
        &self,
        sos: &I,
        w: &mut OW,
        h: &mut OH,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I: Read1D<Sos> + ?Sized,
        OW: Write1D<f64> + ?Sized,
        OH: Write1D<Complex<f64>> + ?Sized,
    {
        let sos = sos.read_slice()?;
        if sos.is_empty() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "sosfreqz requires at least one section",
            });
        }
        let w_out = w.write_slice_mut()?;
        if w_out.len() != self.wor_n {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "w",
                expected: self.wor_n,
                got: w_out.len(),
            });
        }
        let (ww, hh) = sosfreqz_impl(sos, self.wor_n);
        w_out.copy_from_slice(&ww);
        let h_out = h.write_slice_mut()?;
        if h_out.len() != self.wor_n {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "h",
                expected: self.wor_n,
                got: h_out.len(),
            });
        }
        h_out.copy_from_slice(&hh);
        Ok(())
    }

    fn run_alloc<I>(
        &self,
        sos: &I,
    ) -> core::result::Result<(Vec<f64>, Vec<Complex<f64>>), ExecInvariantViolation>
    where
        I: Read1D<Sos> + ?Sized,
    {
        let sos = sos.read_slice()?;
        if sos.is_empty() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "sosfreqz requires at least one section",
            });
        }
        Ok(sosfreqz_impl(sos, self.wor_n))
    }
}

/// Frequency response of a second-order-section cascade at `wor_n`
/// evenly spaced angular frequencies on `[0, pi)` rad/sample.
///
/// # Errors
/// `sos` is empty or `wor_n == 0`.
pub fn sosfreqz(sos: &[Sos], wor_n: usize) -> Result<(Vec<f64>, Vec<Complex<f64>>)> {
    let kernel = SosFreqzKernel::try_new(SosFreqzConfig { wor_n })?;
    Ok(kernel.run_alloc(sos)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn buttap_poles_lie_on_left_unit_semicircle() {
        let proto = buttap(5);
        assert_eq!(proto.p.len(), 5);
        assert!(proto.z.is_empty());
        for p in &proto.p {
            assert_abs_diff_eq!(p.norm(), 1.0, epsilon = 1e-12);
            assert!(p.re < 0.0);
        }
        // Odd orders carry one real pole at -1.
        assert!(proto
            .p
            .iter()
            .any(|p| (p - Complex::new(-1.0, 0.0)).norm() < 1e-12));
    }

    #[test]
    fn bilinear_appends_zeros_at_nyquist() {
        let digital = bilinear_zpk(buttap(3), 2.0).expect("proper");
        assert_eq!(digital.z, vec![Complex::new(-1.0, 0.0); 3]);
        assert!(digital.p.iter().all(|p| p.norm() < 1.0));
    }

    #[test]
    fn zpk2sos_pairs_conjugates() {
        let zpk = ZpkFormatFilter {
            z: vec![Complex::new(-1.0, 0.0); 3],
            p: vec![
                Complex::new(0.5, 0.5),
                Complex::new(0.5, -0.5),
                Complex::new(0.2, 0.0),
            ],
            k: 2.0,
        };
        let sos = zpk2sos(&zpk).expect("pairable");
        assert_eq!(sos.len(), 2);
        // The pair at |p| = 0.707 is closest to the unit circle, so it is last.
        assert_eq!(sos[1].a, [1.0, -1.0, 0.5]);
        assert_eq!(sos[1].b, [1.0, 2.0, 1.0]);
        assert_eq!(sos[0].a, [1.0, -0.2, 0.0]);
        assert_eq!(sos[0].b, [2.0, 2.0, 0.0]);
    }

    #[test]
    fn zpk2sos_rejects_unpaired_roots() {
        let zpk = ZpkFormatFilter {
            z: Vec::new(),
            p: vec![Complex::new(0.1, 0.4)],
            k: 1.0,
        };
        assert!(zpk2sos(&zpk).is_err());
        let improper = ZpkFormatFilter {
            z: vec![Complex::new(0.0, 0.0); 2],
            p: vec![Complex::new(0.5, 0.0)],
            k: 1.0,
        };
        assert!(zpk2sos(&improper).is_err());
    }

    #[test]
    fn sosfreqz_of_identity_is_flat() {
        let sos = vec![Sos::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])];
        let (w, h) = sosfreqz(&sos, 8).expect("valid");
        assert_eq!(w.len(), 8);
        assert_eq!(w[0], 0.0);
        h.iter()
            .for_each(|h| assert_abs_diff_eq!(h.norm(), 1.0, epsilon = 1e-12));
        assert!(sosfreqz(&[], 8).is_err());
        assert!(sosfreqz(&sos, 0).is_err());
    }

    #[test]
    fn scipy_layout_round_trip() {
        let sos = Sos::from_scipy_dyn(2, vec![1.0, 2.0, 1.0, 1.0, -0.5, 0.25, 1.0, 0.0]);
        assert_eq!(sos.len(), 1);
        assert_eq!(sos[0].b, [1.0, 2.0, 1.0]);
        assert_eq!(sos[0].a, [1.0, -0.5, 0.25]);
    }
}
