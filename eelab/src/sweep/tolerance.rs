use crate::kernel::{ConfigError, KernelLifecycle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use super::{AmplifierConfig, RlcResonanceConfig, SweepConfig};

fn default_percent() -> f64 {
    5.0
}

/// Constructor config for [`Tolerance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Maximum relative error in percent, at most 100.
    #[serde(default = "default_percent")]
    pub percent: f64,
    /// RNG seed. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            percent: default_percent(),
            seed: None,
        }
    }
}

/// Component tolerance source.
///
/// Each perturbed value is scaled by `1 + (percent / 100) * u` with `u`
/// drawn uniformly from `[-1, 1]`. Zero values stay zero and no value
/// changes sign, since `percent` is capped at 100.
#[derive(Debug, Clone)]
pub struct Tolerance {
    percent: f64,
    unit: Uniform<f64>,
    rng: StdRng,
}

impl KernelLifecycle for Tolerance {
    type Config = ToleranceConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !(0.0..=100.0).contains(&config.percent) {
            return Err(ConfigError::InvalidArgument {
                arg: "percent",
                reason: "tolerance percent must be between 0 and 100",
            });
        }
        let unit = Uniform::new_inclusive(-1.0, 1.0).map_err(|_| ConfigError::InvalidArgument {
            arg: "percent",
            reason: "unit interval must be a valid uniform range",
        })?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            percent: config.percent,
            unit,
            rng,
        })
    }
}

impl Tolerance {
    /// Configured tolerance in percent.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Perturb one value.
    pub fn apply(&mut self, value: f64) -> f64 {
        if value == 0.0 {
            return value;
        }
        let u = self.unit.sample(&mut self.rng);
        value + value * (self.percent / 100.0) * u
    }

    /// Perturb every component value of `nominal`, keeping the sweep axis.
    pub fn perturb<C: Perturb + Clone>(&mut self, nominal: &C) -> Toleranced<C> {
        Toleranced {
            tolerance_percent: self.percent,
            nominal: nominal.clone(),
            actual: nominal.perturbed(self),
        }
    }
}

/// Parameter records whose component values can be perturbed.
pub trait Perturb {
    /// Copy of `self` with each component value passed through `tolerance`.
    fn perturbed(&self, tolerance: &mut Tolerance) -> Self;
}

impl Perturb for SweepConfig {
    fn perturbed(&self, tolerance: &mut Tolerance) -> Self {
        Self {
            resistance: tolerance.apply(self.resistance),
            inductance: tolerance.apply(self.inductance),
            capacitance: tolerance.apply(self.capacitance),
            ..*self
        }
    }
}

impl Perturb for RlcResonanceConfig {
    fn perturbed(&self, tolerance: &mut Tolerance) -> Self {
        Self {
            resistance: tolerance.apply(self.resistance),
            inductance: tolerance.apply(self.inductance),
            capacitance: tolerance.apply(self.capacitance),
            ..*self
        }
    }
}

impl Perturb for AmplifierConfig {
    fn perturbed(&self, tolerance: &mut Tolerance) -> Self {
        Self {
            dc_gain: tolerance.apply(self.dc_gain),
            bandwidth: tolerance.apply(self.bandwidth),
            input_impedance: tolerance.apply(self.input_impedance),
            ..*self
        }
    }
}

/// Nominal and perturbed parameters side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toleranced<C> {
    /// Tolerance that was applied, in percent.
    pub tolerance_percent: f64,
    /// Parameters as requested.
    pub nominal: C,
    /// Parameters actually used.
    pub actual: C,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::rlc_resonance;

    fn seeded(percent: f64, seed: u64) -> Tolerance {
        Tolerance::try_new(ToleranceConfig {
            percent,
            seed: Some(seed),
        })
        .unwrap()
    }

    #[test]
    fn perturbation_stays_within_band() {
        let mut tol = seeded(5.0, 11);
        for _ in 0..1000 {
            let v = tol.apply(200.0);
            assert!((190.0..=210.0).contains(&v), "{v}");
        }
        assert_eq!(tol.apply(0.0), 0.0);
    }

    #[test]
    fn zero_tolerance_is_identity_and_seed_reproduces() {
        let nominal = RlcResonanceConfig::new(100.0, 1e-3, 1e-6);
        let exact = seeded(0.0, 3).perturb(&nominal);
        assert_eq!(exact.actual, nominal);

        let a = seeded(10.0, 42).perturb(&nominal);
        let b = seeded(10.0, 42).perturb(&nominal);
        assert_eq!(a, b);
        assert_ne!(a.actual, nominal);
        assert_eq!(a.actual.points, nominal.points);
        assert_eq!(a.tolerance_percent, 10.0);
        assert!(rlc_resonance(a.actual).is_ok());
    }

    #[test]
    fn zero_components_are_not_perturbed() {
        let nominal = SweepConfig::new(50.0);
        let t = seeded(20.0, 5).perturb(&nominal);
        assert_eq!(t.actual.inductance, 0.0);
        assert_eq!(t.actual.capacitance, 0.0);
        assert_eq!(t.actual.freq_end, nominal.freq_end);
    }

    #[test]
    fn full_tolerance_never_flips_sign() {
        let mut tol = seeded(100.0, 9);
        for _ in 0..1000 {
            let v = tol.apply(1e-6);
            assert!((0.0..=2e-6).contains(&v), "{v}");
        }
        let nominal = RlcResonanceConfig::new(100.0, 1e-3, 1e-6);
        let t = seeded(100.0, 9).perturb(&nominal);
        assert!(t.actual.resistance >= 0.0);
        assert!(t.actual.capacitance >= 0.0);
    }

    #[test]
    fn rejects_bad_percent() {
        for percent in [-1.0, f64::NAN, f64::INFINITY, 100.5, 250.0] {
            assert!(Tolerance::try_new(ToleranceConfig {
                percent,
                seed: None
            })
            .is_err());
        }
    }
}
