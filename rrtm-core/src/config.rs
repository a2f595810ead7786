//! Declarative model tables.
//!
//! A model is described by a table of cells, a table of transport boundaries
//! and a table of reaction boundaries plus a scalar time step. Entities are
//! referenced by their position in their table. The tables are plain serde
//! structures and are usually read from TOML:
//!
//! ```toml
//! time_step = 60.0
//!
//! [[cells]]
//! currency = "water"
//! amount = 52.5
//! geometry = { length = 250.0, width = 0.7, depth = 0.3 }
//!
//! [[cells]]
//! currency = "NO3"
//! amount = 0.0
//! linked_cell = 0
//!
//! [[transport]]
//! currency = "water"
//! to = 0
//! rate = { kind = "discharge", discharge = 0.069 }
//!
//! [[reactions]]
//! cell = 1
//! kinetics = { type = "FirstOrderDecay", k = 1e-5 }
//! ```

use crate::cell::{CellId, ReachGeometry};
use crate::currency::Currency;
use crate::errors::RRTMResult;
use crate::reaction::ReactionKinetics;
use crate::transport::TransportRate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Relative shortfall below zero that is treated as round-off
pub const DEFAULT_MASS_TOLERANCE: f64 = 1e-12;

fn default_process_domain() -> String {
    "channel".to_string()
}

fn default_mass_tolerance() -> f64 {
    DEFAULT_MASS_TOLERANCE
}

/// Initial values of one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTable {
    pub currency: Currency,
    #[serde(default = "default_process_domain")]
    pub process_domain: String,
    pub amount: f64,
    /// Water cell a solute is dissolved in. Required for solutes, forbidden for water.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_cell: Option<CellId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<ReachGeometry>,
}

impl CellTable {
    pub fn water(volume: f64) -> Self {
        Self {
            currency: Currency::Water,
            process_domain: default_process_domain(),
            amount: volume,
            linked_cell: None,
            geometry: None,
        }
    }

    pub fn solute(currency: &str, amount: f64, linked_cell: CellId) -> Self {
        Self {
            currency: Currency::solute(currency),
            process_domain: default_process_domain(),
            amount,
            linked_cell: Some(linked_cell),
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: ReachGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_process_domain(mut self, process_domain: &str) -> Self {
        self.process_domain = process_domain.to_string();
        self
    }
}

/// One transport boundary. A missing `from`/`to` is an external source/sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportTable {
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<CellId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<CellId>,
    pub rate: TransportRate,
}

impl TransportTable {
    pub fn new(
        currency: Currency,
        from: Option<CellId>,
        to: Option<CellId>,
        rate: TransportRate,
    ) -> Self {
        Self {
            currency,
            from,
            to,
            rate,
        }
    }
}

/// One reaction boundary attached to a solute cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionTable {
    pub cell: CellId,
    pub kinetics: Arc<dyn ReactionKinetics>,
}

/// The complete set of tables describing a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Duration of one iteration
    pub time_step: f64,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default = "default_mass_tolerance")]
    pub mass_tolerance: f64,
    #[serde(default)]
    pub cells: Vec<CellTable>,
    #[serde(default)]
    pub transport: Vec<TransportTable>,
    #[serde(default)]
    pub reactions: Vec<ReactionTable>,
}

impl ModelConfig {
    pub fn new(time_step: f64) -> Self {
        Self {
            time_step,
            start_time: 0.0,
            mass_tolerance: DEFAULT_MASS_TOLERANCE,
            cells: vec![],
            transport: vec![],
            reactions: vec![],
        }
    }

    pub fn from_toml_str(content: &str) -> RRTMResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RRTMResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
