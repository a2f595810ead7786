//! Reaction in a transient-storage zone with power-law transit times.
//!
//! Water leaves the channel into storage (hyporheic zone, dead zones, ...)
//! and returns after a transit time drawn from a power-law distribution.
//! Solute decays first-order while it is in storage. The removal over a time
//! step is expressed through Damköhler numbers: one for the storage zone and
//! an effective one for the whole reach.

use crate::transit_time::{PowerLawDistribution, TransitTimeBound};
use log::debug;
use rrtm_core::attributes::ReactionAttribute;
use rrtm_core::errors::{RRTMError, RRTMResult};
use rrtm_core::reaction::{ReactionContext, ReactionKinetics, Removal, StorageExchange};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "PowerLawStorage";

/// Parameters for the power-law storage kinetics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLawStorageParameters {
    /// Exponent of the transit-time distribution
    pub alpha: f64,
    /// First-order decay rate in storage
    /// unit: 1 / s
    pub k: f64,
    /// Volume of water held in the storage zone
    /// unit: m^3
    pub vol_water_in_storage: f64,
    /// Shortest transit time through storage
    /// unit: s
    pub tau_min: f64,
    /// Longest transit time through storage
    pub tau_max: TransitTimeBound,
    /// Time a parcel spends in storage before decay starts
    /// unit: s
    #[serde(default)]
    pub tau_rxn: f64,
}

/// Removal by exchange with a power-law transient-storage zone.
///
/// The storage zone exchanges water with the channel at
///
/// $$ q_s = \frac{V_s}{\bar\tau} $$
///
/// where $\bar\tau$ is the mean transit time. Of the mass that enters
/// storage, a fraction $R_s$ survives (see
/// [`PowerLawDistribution::fraction_surviving`]), giving a storage Damköhler
/// number $Da_s = -\ln R_s$.
///
/// Over a step of length $\Delta t$ a fraction
/// $X = 1 - e^{-q_s \Delta t / V_c}$ of the channel volume $V_c$ passes
/// through storage, so the reach loses
///
/// $$ f_{removed} = X \left(1 - e^{-Da_s}\right), \qquad Da = -\ln(1 - f_{removed}) $$
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLawStorage {
    parameters: PowerLawStorageParameters,
}

impl PowerLawStorage {
    pub fn from_parameters(parameters: PowerLawStorageParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &PowerLawStorageParameters {
        &self.parameters
    }

    pub fn distribution(&self) -> RRTMResult<PowerLawDistribution> {
        PowerLawDistribution::new(
            self.parameters.alpha,
            self.parameters.tau_min,
            self.parameters.tau_max,
        )
        .map_err(|e| match e {
            RRTMError::NumericDomain {
                parameter,
                value,
                reason,
                ..
            } => RRTMError::NumericDomain {
                entity: ENTITY.to_string(),
                parameter,
                value,
                reason,
            },
            other => other,
        })
    }

    /// Volumetric exchange between channel and storage, zero if storage is
    /// empty or the mean transit time is infinite.
    ///
    /// unit: m^3 / s
    pub fn q_storage(&self, distribution: &PowerLawDistribution) -> f64 {
        let mean = distribution.mean();
        if self.parameters.vol_water_in_storage == 0.0 || !mean.is_finite() {
            0.0
        } else {
            self.parameters.vol_water_in_storage / mean
        }
    }

    /// Fraction of the channel water routed through storage during one step
    pub fn exchange_fraction(q_storage: f64, time_step: f64, channel_volume: f64) -> f64 {
        if q_storage == 0.0 {
            0.0
        } else if channel_volume <= 0.0 {
            1.0
        } else {
            -(-q_storage * time_step / channel_volume).exp_m1()
        }
    }

    /// Damköhler number of the storage zone, `-ln(R_s)`
    pub fn damkohler_num_storage(&self, distribution: &PowerLawDistribution) -> RRTMResult<f64> {
        let surviving = distribution
            .fraction_surviving(self.parameters.k, self.parameters.tau_rxn)
            .map_err(|e| e.within(ENTITY))?;
        Ok(-surviving.ln())
    }
}

#[typetag::serde]
impl ReactionKinetics for PowerLawStorage {
    fn validate(&self) -> RRTMResult<()> {
        let p = &self.parameters;
        if !p.k.is_finite() || p.k < 0.0 {
            return Err(RRTMError::numeric_domain(
                ENTITY,
                "k",
                p.k,
                "must be finite and non-negative",
            ));
        }
        if !p.vol_water_in_storage.is_finite() || p.vol_water_in_storage < 0.0 {
            return Err(RRTMError::numeric_domain(
                ENTITY,
                "volWaterInStorage",
                p.vol_water_in_storage,
                "must be finite and non-negative",
            ));
        }
        if !p.tau_rxn.is_finite() || p.tau_rxn < 0.0 {
            return Err(RRTMError::numeric_domain(
                ENTITY,
                "tauRxn",
                p.tau_rxn,
                "must be finite and non-negative",
            ));
        }
        let distribution = self.distribution()?;
        // Integral failures are reported when the model is built
        let damkohler_num_storage = self.damkohler_num_storage(&distribution)?;

        debug!(
            "PowerLawStorage: mean transit time {:e} s, qStorage {:e}, Da_s {:e}",
            distribution.mean(),
            self.q_storage(&distribution),
            damkohler_num_storage
        );
        Ok(())
    }

    fn removal(&self, context: &ReactionContext) -> RRTMResult<Removal> {
        let distribution = self.distribution()?;
        let q_storage = self.q_storage(&distribution);

        if self.parameters.k == 0.0 {
            return Ok(Removal::none(Some(StorageExchange::new(q_storage, 0.0))));
        }

        let damkohler_num_storage = self.damkohler_num_storage(&distribution)?;
        let storage = StorageExchange::new(q_storage, damkohler_num_storage);

        let exchanged =
            Self::exchange_fraction(q_storage, context.time_step, context.water_volume);
        let fraction_removed = exchanged * storage.fraction_removed_storage;
        let damkohler_num = -(-fraction_removed).ln_1p();

        Ok(Removal::from_damkohler(damkohler_num, Some(storage)))
    }

    fn parameter(&self, attribute: ReactionAttribute) -> Option<f64> {
        let p = &self.parameters;
        match attribute {
            ReactionAttribute::Alpha => Some(p.alpha),
            ReactionAttribute::K => Some(p.k),
            ReactionAttribute::VolWaterInStorage => Some(p.vol_water_in_storage),
            ReactionAttribute::TauMin => Some(p.tau_min),
            ReactionAttribute::TauMax => Some(p.tau_max.value()),
            ReactionAttribute::TauRxn => Some(p.tau_rxn),
            _ => None,
        }
    }
}
