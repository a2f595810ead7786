//! Cells: state containers holding an amount of one currency.

use crate::currency::Currency;
use crate::errors::{RRTMError, RRTMResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a cell in the model's cell table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub usize);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel geometry of a reach held by a water cell.
///
/// unit: m
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReachGeometry {
    pub length: f64,
    pub width: f64,
    pub depth: f64,
}

impl ReachGeometry {
    pub fn new(length: f64, width: f64, depth: f64) -> Self {
        Self {
            length,
            width,
            depth,
        }
    }

    /// Volume of the channel, `length * width * depth`.
    pub fn channel_volume(&self) -> f64 {
        self.length * self.width * self.depth
    }

    /// Cross-sectional area of the channel perpendicular to flow.
    pub fn cross_section(&self) -> f64 {
        self.width * self.depth
    }

    /// Plan-view area of the streambed.
    pub fn bed_area(&self) -> f64 {
        self.length * self.width
    }
}

/// What a cell holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellKind {
    /// Water volume, optionally with the geometry of the reach it fills.
    Water {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        geometry: Option<ReachGeometry>,
    },
    /// Solute mass dissolved in the water of `linked_cell`.
    Solute { linked_cell: CellId },
}

/// A state container holding an amount of a single currency within a process domain.
///
/// Cells own their amount. Boundaries only reference cells by [`CellId`] and
/// all mutation happens through the model's iteration step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub(crate) id: CellId,
    pub(crate) currency: Currency,
    pub(crate) process_domain: String,
    pub(crate) amount: f64,
    pub(crate) kind: CellKind,
}

impl Cell {
    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn process_domain(&self) -> &str {
        &self.process_domain
    }

    /// Mass (solute) or volume (water) currently held
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    pub fn is_water(&self) -> bool {
        matches!(self.kind, CellKind::Water { .. })
    }

    /// The water cell this solute is dissolved in
    pub fn linked_cell(&self) -> Option<CellId> {
        match self.kind {
            CellKind::Solute { linked_cell } => Some(linked_cell),
            CellKind::Water { .. } => None,
        }
    }

    pub fn geometry(&self) -> Option<&ReachGeometry> {
        match &self.kind {
            CellKind::Water { geometry } => geometry.as_ref(),
            CellKind::Solute { .. } => None,
        }
    }

    /// Concentration of this cell's amount in the given water volume.
    ///
    /// Zero when the water volume is zero.
    pub fn concentration_in(&self, water_volume: f64) -> f64 {
        if water_volume > 0.0 {
            self.amount / water_volume
        } else {
            0.0
        }
    }

    /// Adjust the stored amount by a signed delta.
    ///
    /// A result below zero is an error unless the shortfall is within
    /// `tolerance` relative to the magnitudes involved, in which case it is
    /// treated as round-off and the amount is clamped to zero.
    pub fn apply_delta(&mut self, delta: f64, tolerance: f64) -> RRTMResult<()> {
        let updated = self.amount + delta;
        if !updated.is_finite() {
            return Err(RRTMError::numeric_domain(
                format!("cell {}", self.id),
                "amount",
                updated,
                "amounts must remain finite",
            ));
        }
        if updated < 0.0 {
            let scale = self.amount.abs().max(delta.abs());
            if -updated <= tolerance * scale {
                warn!(
                    "Cell {}: clamped round-off shortfall of {:e} to zero",
                    self.id, -updated
                );
                self.amount = 0.0;
                return Ok(());
            }
            return Err(RRTMError::NegativeMass {
                cell: self.id,
                available: self.amount,
                requested: delta,
                context: format!("{} cell in {}", self.currency, self.process_domain),
            });
        }
        self.amount = updated;
        Ok(())
    }
}
