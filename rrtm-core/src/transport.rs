//! Transport boundaries moving a currency between cells, or across the edge of the domain.

use crate::cell::CellId;
use crate::currency::Currency;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a boundary in the model's transport (or reaction) table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryId(pub usize);

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a transport boundary determines its rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportRate {
    /// Fixed water discharge
    ///
    /// unit: volume / time
    Discharge { discharge: f64 },
    /// Fixed solute load
    ///
    /// unit: mass / time
    Load { load: f64 },
    /// Solute riding on a water boundary.
    ///
    /// load = discharge of `water_boundary` * concentration of the upstream cell
    Linked { water_boundary: BoundaryId },
    /// Solute entering with a water boundary at a fixed external concentration.
    ///
    /// load = discharge of `water_boundary` * `concentration`
    LinkedConcentration {
        water_boundary: BoundaryId,
        concentration: f64,
    },
}

impl TransportRate {
    /// The water boundary this rate is derived from, if any
    pub fn water_boundary(&self) -> Option<BoundaryId> {
        match self {
            TransportRate::Linked { water_boundary }
            | TransportRate::LinkedConcentration { water_boundary, .. } => Some(*water_boundary),
            TransportRate::Discharge { .. } | TransportRate::Load { .. } => None,
        }
    }
}

/// Moves `rate * time_step` of one currency from `from` to `to` each iteration.
///
/// A missing `from` is an external source and a missing `to` is an external
/// sink: these are the open edges of the modelled domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransportBoundary {
    pub(crate) id: BoundaryId,
    pub(crate) currency: Currency,
    pub(crate) from: Option<CellId>,
    pub(crate) to: Option<CellId>,
    pub(crate) rate: TransportRate,
    /// Amount moved during the last committed iteration
    pub(crate) amount_moved: f64,
}

impl TransportBoundary {
    pub fn id(&self) -> BoundaryId {
        self.id
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn from(&self) -> Option<CellId> {
        self.from
    }

    pub fn to(&self) -> Option<CellId> {
        self.to
    }

    pub fn rate(&self) -> &TransportRate {
        &self.rate
    }

    pub fn amount_moved(&self) -> f64 {
        self.amount_moved
    }

    pub fn is_inflow(&self) -> bool {
        self.from.is_none()
    }

    pub fn is_outflow(&self) -> bool {
        self.to.is_none()
    }
}
