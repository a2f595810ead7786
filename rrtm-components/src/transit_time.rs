//! Power-law distribution of storage-zone transit times.

use crate::special::{power_difference, shifted_gamma_integral};
use rrtm_core::errors::{RRTMError, RRTMResult};
use serde::{Deserialize, Serialize};

/// Upper limit of the transit-time distribution.
///
/// JSON has no infinity, so an unbounded tail is spelled out rather than
/// written as a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitTimeBound {
    /// unit: s
    Finite(f64),
    Unbounded,
}

impl TransitTimeBound {
    /// The bound as a number, infinite when unbounded
    pub fn value(&self) -> f64 {
        match self {
            TransitTimeBound::Finite(value) => *value,
            TransitTimeBound::Unbounded => f64::INFINITY,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, TransitTimeBound::Finite(_))
    }
}

/// Transit times distributed as $f(\tau) \propto \tau^{-\alpha}$ on $[\tau_{min}, \tau_{max}]$.
///
/// The normalisation is
///
/// $$ N = \int_{\tau_{min}}^{\tau_{max}} \tau^{-\alpha} \, d\tau = \frac{\tau_{max}^{1-\alpha} - \tau_{min}^{1-\alpha}}{1 - \alpha} $$
///
/// which, for an unbounded tail, is finite only when $\alpha > 1$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawDistribution {
    alpha: f64,
    tau_min: f64,
    tau_max: TransitTimeBound,
    normalization: f64,
}

fn domain_error(parameter: &str, value: f64, reason: &str) -> RRTMError {
    RRTMError::numeric_domain("power-law transit times", parameter, value, reason)
}

impl PowerLawDistribution {
    pub fn new(alpha: f64, tau_min: f64, tau_max: TransitTimeBound) -> RRTMResult<Self> {
        if !alpha.is_finite() || alpha <= 0.0 {
            return Err(domain_error("alpha", alpha, "must be finite and positive"));
        }
        if alpha == 1.0 || alpha == 2.0 {
            return Err(domain_error(
                "alpha",
                alpha,
                "exponents of exactly 1 and 2 are singular",
            ));
        }
        if !tau_min.is_finite() || tau_min <= 0.0 {
            return Err(domain_error("tauMin", tau_min, "must be finite and positive"));
        }

        let normalization = match tau_max {
            TransitTimeBound::Finite(tau_max) => {
                if !tau_max.is_finite() || tau_max <= tau_min {
                    return Err(domain_error(
                        "tauMax",
                        tau_max,
                        "must be finite and greater than tauMin",
                    ));
                }
                power_difference(tau_min, tau_max, 1.0 - alpha)
            }
            TransitTimeBound::Unbounded => {
                if alpha <= 1.0 {
                    return Err(domain_error(
                        "alpha",
                        alpha,
                        "an unbounded tauMax needs alpha > 1",
                    ));
                }
                tau_min.powf(1.0 - alpha) / (alpha - 1.0)
            }
        };

        Ok(Self {
            alpha,
            tau_min,
            tau_max,
            normalization,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn tau_min(&self) -> f64 {
        self.tau_min
    }

    pub fn tau_max(&self) -> TransitTimeBound {
        self.tau_max
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    /// Probability density at `tau`
    pub fn density(&self, tau: f64) -> f64 {
        if tau < self.tau_min || tau > self.tau_max.value() {
            0.0
        } else {
            tau.powf(-self.alpha) / self.normalization
        }
    }

    /// Fraction of transit times shorter than `tau`
    pub fn cumulative(&self, tau: f64) -> f64 {
        if tau <= self.tau_min {
            0.0
        } else if tau >= self.tau_max.value() {
            1.0
        } else {
            power_difference(self.tau_min, tau, 1.0 - self.alpha) / self.normalization
        }
    }

    /// Mean transit time, infinite for an unbounded tail with `alpha <= 2`
    pub fn mean(&self) -> f64 {
        match self.tau_max {
            TransitTimeBound::Finite(tau_max) => {
                power_difference(self.tau_min, tau_max, 2.0 - self.alpha) / self.normalization
            }
            TransitTimeBound::Unbounded if self.alpha > 2.0 => {
                self.tau_min.powf(2.0 - self.alpha) / (self.alpha - 2.0) / self.normalization
            }
            TransitTimeBound::Unbounded => f64::INFINITY,
        }
    }

    /// Fraction of mass entering storage that is still present when it leaves,
    /// under first-order decay at rate `k` that only starts after `tau_rxn`.
    ///
    /// $$ R = F(\tau_{on}) + \frac{1}{N} \int_{\tau_{on}}^{\tau_{max}} \tau^{-\alpha} e^{-k(\tau - \tau_{rxn})} \, d\tau, \qquad \tau_{on} = \max(\tau_{min}, \tau_{rxn}) $$
    ///
    /// Substituting $u = k\tau$ turns the integral into
    /// $k^{\alpha - 1} e^{k\tau_{rxn}} J_{1-\alpha}(k\tau_{on}, k\tau_{max})$.
    pub fn fraction_surviving(&self, k: f64, tau_rxn: f64) -> RRTMResult<f64> {
        if k == 0.0 {
            return Ok(1.0);
        }
        let onset = self.tau_min.max(tau_rxn);
        let tau_max = self.tau_max.value();
        if onset >= tau_max {
            return Ok(1.0);
        }

        let decayed =
            shifted_gamma_integral(1.0 - self.alpha, k * onset, k * tau_max, k * tau_rxn)?;
        let surviving =
            self.cumulative(onset) + k.powf(self.alpha - 1.0) * decayed / self.normalization;
        if !surviving.is_finite() {
            return Err(domain_error(
                "k",
                k,
                "surviving fraction is not representable for this decay rate",
            ));
        }
        Ok(surviving.clamp(0.0, 1.0))
    }
}
