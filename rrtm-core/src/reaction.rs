//! Reaction boundaries removing solute mass from a cell.
//!
//! The removal model is pluggable: a [`ReactionBoundary`] holds an
//! `Arc<dyn ReactionKinetics>` and applies the fraction it reports to the
//! mass resident in the attached cell. Kinetics are serialised through
//! `typetag` so that model tables and snapshots can name them by type.

use crate::attributes::ReactionAttribute;
use crate::cell::CellId;
use crate::errors::RRTMResult;
use crate::transport::BoundaryId;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// State handed to a kinetics model for one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionContext {
    /// Mass in the attached cell after transport
    pub starting_amount: f64,
    /// Volume of the water cell the solute is dissolved in
    pub water_volume: f64,
    /// Model time step
    pub time_step: f64,
}

/// Exchange with a transient-storage zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageExchange {
    /// Volumetric exchange flux between channel and storage
    pub q_storage: f64,
    pub damkohler_num_storage: f64,
    pub fraction_removed_storage: f64,
    pub fraction_remaining_storage: f64,
}

impl StorageExchange {
    pub fn new(q_storage: f64, damkohler_num_storage: f64) -> Self {
        Self {
            q_storage,
            damkohler_num_storage,
            fraction_removed_storage: -(-damkohler_num_storage).exp_m1(),
            fraction_remaining_storage: (-damkohler_num_storage).exp(),
        }
    }
}

/// Fraction of resident mass removed over one time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Removal {
    /// Effective Damköhler number of the whole reactor, `-ln(fraction_remaining)`
    pub damkohler_num: f64,
    pub fraction_removed: f64,
    pub fraction_remaining: f64,
    pub storage: Option<StorageExchange>,
}

impl Removal {
    /// Fractions implied by an effective Damköhler number.
    ///
    /// `fraction_remaining = exp(-Da)` and `fraction_removed = 1 - exp(-Da)`
    /// (evaluated with `expm1` so small removals keep their precision).
    pub fn from_damkohler(damkohler_num: f64, storage: Option<StorageExchange>) -> Self {
        Self {
            damkohler_num,
            fraction_removed: -(-damkohler_num).exp_m1(),
            fraction_remaining: (-damkohler_num).exp(),
            storage,
        }
    }

    /// No reaction at all
    pub fn none(storage: Option<StorageExchange>) -> Self {
        Self {
            damkohler_num: 0.0,
            fraction_removed: 0.0,
            fraction_remaining: 1.0,
            storage,
        }
    }
}

/// A removal model applied by a [`ReactionBoundary`].
#[typetag::serde(tag = "type")]
pub trait ReactionKinetics: Debug + Send + Sync {
    /// Check that the parameters lie within the domain of the model.
    ///
    /// Called once when the model is built.
    fn validate(&self) -> RRTMResult<()>;

    /// Compute the fraction of resident mass removed over one time step
    fn removal(&self, context: &ReactionContext) -> RRTMResult<Removal>;

    /// Value of a named kinetic parameter, if this model has it
    fn parameter(&self, attribute: ReactionAttribute) -> Option<f64>;
}

/// Results of the last committed iteration of a reaction boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionState {
    pub starting_amount: f64,
    pub amount_to_remove: f64,
    pub amount_to_remain: f64,
    pub removal: Removal,
}

/// Removes mass from exactly one solute cell each iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionBoundary {
    pub(crate) id: BoundaryId,
    pub(crate) cell: CellId,
    pub(crate) kinetics: Arc<dyn ReactionKinetics>,
    #[serde(default)]
    pub(crate) state: Option<ReactionState>,
}

impl ReactionBoundary {
    pub fn id(&self) -> BoundaryId {
        self.id
    }

    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn kinetics(&self) -> &Arc<dyn ReactionKinetics> {
        &self.kinetics
    }

    /// `None` until the first iteration has been committed
    pub fn state(&self) -> Option<&ReactionState> {
        self.state.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_from_damkohler_sum_to_one() {
        for da in [0.0, 1e-12, 0.3, 2.0, 40.0] {
            let removal = Removal::from_damkohler(da, None);
            approx::assert_relative_eq!(
                removal.fraction_removed + removal.fraction_remaining,
                1.0,
                epsilon = 1e-15
            );
        }
    }

    #[test]
    fn zero_damkohler_removes_nothing() {
        let removal = Removal::from_damkohler(0.0, None);
        assert_eq!(removal.fraction_removed, 0.0);
        assert_eq!(removal.fraction_remaining, 1.0);
    }

    #[test]
    fn infinite_damkohler_removes_everything() {
        let storage = StorageExchange::new(0.01, f64::INFINITY);
        assert_eq!(storage.fraction_removed_storage, 1.0);
        assert_eq!(storage.fraction_remaining_storage, 0.0);
    }
}
