//! Trait-first kernel for Butterworth design.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::IirDesign;
use eelab_core::Result;

use super::{
    bilinear_zpk, buttap, lp2bp_zpk, lp2bs_zpk, lp2hp_zpk, lp2lp_zpk, zpk2sos, FilterBandType,
    Sos,
};

/// Constructor config for [`ButterKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ButterConfig {
    /// Filter order.
    pub order: usize,
    /// Critical frequencies.
    pub wn: Vec<f64>,
    /// Band type.
    pub btype: FilterBandType,
    /// Optional sample rate. When absent `wn` is normalised to Nyquist.
    pub fs: Option<f64>,
}

/// Trait-first digital Butterworth design kernel producing sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ButterKernel {
    order: usize,
    wn: Vec<f64>,
    btype: FilterBandType,
}

impl KernelLifecycle for ButterKernel {
    type Config = ButterConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.order == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "order",
                reason: "order must be greater than zero",
            });
        }
        if config.wn.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "wn" });
        }
        if config.wn.len() > 2 {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "wn length must be 1 or 2",
            });
        }
        if config.wn.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "critical frequencies must be greater than 0",
            });
        }
        if config.wn.len() == 2 && config.wn[0] >= config.wn[1] {
            return Err(ConfigError::InvalidArgument {
                arg: "wn",
                reason: "wn[0] must be less than wn[1]",
            });
        }

        let wn = match config.fs {
            Some(fs) => {
                if !fs.is_finite() || fs <= 0.0 {
                    return Err(ConfigError::InvalidArgument {
                        arg: "fs",
                        reason: "fs must be finite and greater than 0",
                    });
                }
                let nyq = fs / 2.0;
                if config.wn.iter().any(|w| *w >= nyq) {
                    return Err(ConfigError::InvalidArgument {
                        arg: "wn",
                        reason: "digital wn must satisfy 0 < wn < fs/2",
                    });
                }
                config.wn.iter().map(|w| w / nyq).collect()
            }
            None => {
                if config.wn.iter().any(|w| *w >= 1.0) {
                    return Err(ConfigError::InvalidArgument {
                        arg: "wn",
                        reason: "normalized digital wn must satisfy 0 < wn < 1",
                    });
                }
                config.wn
            }
        };

        match config.btype.cutoff_count() {
            None => {
                return Err(ConfigError::InvalidArgument {
                    arg: "btype",
                    reason: "unsupported band type",
                })
            }
            Some(1) if wn.len() != 1 => {
                return Err(ConfigError::InvalidArgument {
                    arg: "wn",
                    reason: "lowpass/highpass designs require one critical frequency",
                })
            }
            Some(2) if wn.len() != 2 => {
                return Err(ConfigError::InvalidArgument {
                    arg: "wn",
                    reason: "bandpass/bandstop designs require two critical frequencies",
                })
            }
            Some(_) => {}
        }

        Ok(Self {
            order: config.order,
            wn,
            btype: config.btype,
        })
    }
}

impl ButterKernel {
    fn design(&self) -> Result<Vec<Sos>> {
        // Pre-warp for the bilinear transform at fs = 2.
        let fs = 2.0;
        let warped = self
            .wn
            .iter()
            .map(|w| 2.0 * fs * (core::f64::consts::PI * w / fs).tan())
            .collect::<Vec<_>>();
        let proto = buttap(self.order);
        let analog = match (self.btype, warped.as_slice()) {
            (FilterBandType::Lowpass, [wo]) => lp2lp_zpk(proto, *wo)?,
            (FilterBandType::Highpass, [wo]) => lp2hp_zpk(proto, *wo)?,
            (FilterBandType::Bandpass, [lo, hi]) => lp2bp_zpk(proto, (lo * hi).sqrt(), hi - lo)?,
            (FilterBandType::Bandstop, [lo, hi]) => lp2bs_zpk(proto, (lo * hi).sqrt(), hi - lo)?,
            _ => {
                return Err(ConfigError::InvalidArgument {
                    arg: "btype",
                    reason: "band type does not match critical frequencies",
                }
                .into())
            }
        };
        zpk2sos(&bilinear_zpk(analog, fs)?)
    }
}

impl IirDesign for ButterKernel {
    type Output = Vec<Sos>;

    fn run_alloc(&self) -> core::result::Result<Self::Output, ExecInvariantViolation> {
        Ok(self.design()?)
    }
}

/// Design a digital Butterworth filter as second-order sections.
///
/// `wn` is in Hz when `fs` is given, otherwise normalised so that 1 is the
/// Nyquist frequency.
///
/// ```
/// use eelab::signal::filter::design::{butter_sos, FilterBandType};
///
/// let sos = butter_sos(4, &[100.0], FilterBandType::Lowpass, Some(1000.0)).unwrap();
/// assert_eq!(sos.len(), 2);
/// ```
pub fn butter_sos(
    order: usize,
    wn: &[f64],
    btype: FilterBandType,
    fs: Option<f64>,
) -> Result<Vec<Sos>> {
    let kernel = ButterKernel::try_new(ButterConfig {
        order,
        wn: wn.to_vec(),
        btype,
        fs,
    })?;
    Ok(kernel.run_alloc()?)
}
