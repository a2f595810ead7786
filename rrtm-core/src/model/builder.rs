//! Model builder for constructing models from cell and boundary tables.

use crate::cell::{Cell, CellId, CellKind};
use crate::config::{
    CellTable, ModelConfig, ReactionTable, TransportTable, DEFAULT_MASS_TOLERANCE,
};
use crate::errors::{RRTMError, RRTMResult};
use crate::reaction::{ReactionBoundary, ReactionKinetics};
use crate::transport::{BoundaryId, TransportBoundary};
use log::debug;
use std::sync::Arc;

use super::balance::{entry, MassLedger};
use super::runtime::{Model, ModelStatus};
use super::validation::{validate_config, validate_kinetics};

/// Build a new model from tables of cells, transport boundaries and reaction boundaries.
///
/// Entities are referenced by their position in their table, so the ids
/// returned by [`ModelBuilder::with_cell`] and friends can be used to wire up
/// later entries. Nothing is checked until [`ModelBuilder::build`], which
/// reports every problem it finds at once.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    time_step: f64,
    start_time: f64,
    mass_tolerance: f64,
    cells: Vec<CellTable>,
    transport: Vec<TransportTable>,
    reactions: Vec<ReactionTable>,
}

impl ModelBuilder {
    /// Create an empty builder with a one unit time step.
    pub fn new() -> Self {
        Self {
            time_step: 1.0,
            start_time: 0.0,
            mass_tolerance: DEFAULT_MASS_TOLERANCE,
            cells: vec![],
            transport: vec![],
            reactions: vec![],
        }
    }

    /// Start from a complete set of tables
    pub fn from_config(config: ModelConfig) -> Self {
        Self {
            time_step: config.time_step,
            start_time: config.start_time,
            mass_tolerance: config.mass_tolerance,
            cells: config.cells,
            transport: config.transport,
            reactions: config.reactions,
        }
    }

    pub fn with_time_step(&mut self, time_step: f64) -> &mut Self {
        self.time_step = time_step;
        self
    }

    pub fn with_start_time(&mut self, start_time: f64) -> &mut Self {
        self.start_time = start_time;
        self
    }

    /// Relative shortfall below zero that is clamped to zero instead of failing
    pub fn with_mass_tolerance(&mut self, mass_tolerance: f64) -> &mut Self {
        self.mass_tolerance = mass_tolerance;
        self
    }

    /// Append a cell, returning the id it will have in the model
    pub fn with_cell(&mut self, cell: CellTable) -> CellId {
        self.cells.push(cell);
        CellId(self.cells.len() - 1)
    }

    /// Append a transport boundary, returning the id it will have in the model
    pub fn with_transport(&mut self, boundary: TransportTable) -> BoundaryId {
        self.transport.push(boundary);
        BoundaryId(self.transport.len() - 1)
    }

    /// Attach a reaction to a solute cell, returning the id of the reaction boundary
    pub fn with_reaction(
        &mut self,
        cell: CellId,
        kinetics: Arc<dyn ReactionKinetics>,
    ) -> BoundaryId {
        self.reactions.push(ReactionTable { cell, kinetics });
        BoundaryId(self.reactions.len() - 1)
    }

    /// The tables currently held by the builder
    pub fn to_config(&self) -> ModelConfig {
        ModelConfig {
            time_step: self.time_step,
            start_time: self.start_time,
            mass_tolerance: self.mass_tolerance,
            cells: self.cells.clone(),
            transport: self.transport.clone(),
            reactions: self.reactions.clone(),
        }
    }

    /// Validate the tables and build the model.
    ///
    /// Structural problems are collected into a single
    /// [`RRTMError::Configuration`]. Only once the structure is sound are the
    /// kinetic parameters of each reaction checked.
    pub fn build(&self) -> RRTMResult<Model> {
        let issues = validate_config(&self.to_config());
        if !issues.is_empty() {
            return Err(RRTMError::Configuration { issues });
        }
        validate_kinetics(&self.reactions)?;

        let cells: Vec<Cell> = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, table)| Cell {
                id: CellId(index),
                currency: table.currency.clone(),
                process_domain: table.process_domain.clone(),
                amount: table.amount,
                kind: match table.linked_cell {
                    Some(linked_cell) => CellKind::Solute { linked_cell },
                    None => CellKind::Water {
                        geometry: table.geometry,
                    },
                },
            })
            .collect();

        let transport = self
            .transport
            .iter()
            .enumerate()
            .map(|(index, table)| TransportBoundary {
                id: BoundaryId(index),
                currency: table.currency.clone(),
                from: table.from,
                to: table.to,
                rate: table.rate.clone(),
                amount_moved: 0.0,
            })
            .collect();

        let reactions = self
            .reactions
            .iter()
            .enumerate()
            .map(|(index, table)| ReactionBoundary {
                id: BoundaryId(index),
                cell: table.cell,
                kinetics: Arc::clone(&table.kinetics),
                state: None,
            })
            .collect();

        let mut ledger: Vec<MassLedger> = vec![];
        for cell in &cells {
            entry(&mut ledger, &cell.currency).initial += cell.amount;
        }
        for boundary in &self.transport {
            entry(&mut ledger, &boundary.currency);
        }

        debug!(
            "Built model with {} cells, {} transport and {} reaction boundaries",
            self.cells.len(),
            self.transport.len(),
            self.reactions.len()
        );

        Ok(Model {
            cells,
            transport,
            reactions,
            time_step: self.time_step,
            start_time: self.start_time,
            mass_tolerance: self.mass_tolerance,
            iteration: 0,
            ledger,
            status: ModelStatus::Ready,
        })
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
