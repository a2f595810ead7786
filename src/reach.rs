//! A single well-mixed river reach with power-law transient storage.
//!
//! The reach is one water cell holding the channel volume and one solute cell
//! dissolved in it. Water enters and leaves at the same discharge, solute
//! enters at a fixed concentration and leaves at the concentration of the
//! reach, and a [`PowerLawStorage`] reaction removes solute in between.

use rrtm_components::components::{PowerLawStorage, PowerLawStorageParameters};
use rrtm_components::transit_time::TransitTimeBound;
use rrtm_core::attributes::{CellAttribute, Observable, ReactionAttribute, TransportAttribute};
use rrtm_core::cell::{CellId, ReachGeometry};
use rrtm_core::config::{CellTable, ModelConfig, TransportTable};
use rrtm_core::currency::Currency;
use rrtm_core::errors::RRTMResult;
use rrtm_core::model::{Model, ModelBuilder};
use rrtm_core::transport::{BoundaryId, TransportRate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const WATER_CELL: CellId = CellId(0);
pub const SOLUTE_CELL: CellId = CellId(1);

pub const WATER_INFLOW: BoundaryId = BoundaryId(0);
pub const WATER_OUTFLOW: BoundaryId = BoundaryId(1);
pub const SOLUTE_INFLOW: BoundaryId = BoundaryId(2);
pub const SOLUTE_OUTFLOW: BoundaryId = BoundaryId(3);

/// Index of the storage reaction in the reaction table
pub const STORAGE_REACTION: BoundaryId = BoundaryId(0);

const DAY: f64 = 86400.0;

fn default_solute() -> String {
    "NO3".to_string()
}

fn default_time_step() -> f64 {
    60.0
}

/// Hydrologic and kinetic parameters of a reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachScenario {
    /// Discharge through the reach
    /// unit: m^3 / s
    pub disch: f64,
    /// unit: m
    pub reach_len: f64,
    /// unit: m
    pub reach_width: f64,
    /// unit: m
    pub reach_depth: f64,
    #[serde(default = "default_solute")]
    pub solute: String,
    /// Concentration of the solute in the inflow
    /// unit: g / m^3
    pub concentration: f64,
    /// Concentration the reach starts at
    /// unit: g / m^3
    #[serde(default)]
    pub initial_concentration: f64,
    pub alpha: f64,
    /// unit: m^3
    pub vol_water_in_storage: f64,
    /// unit: 1 / s
    pub k: f64,
    /// unit: s
    pub tau_min: f64,
    pub tau_max: TransitTimeBound,
    /// unit: s
    #[serde(default)]
    pub tau_rxn: f64,
    /// unit: s
    #[serde(default = "default_time_step")]
    pub time_step: f64,
}

impl ReachScenario {
    /// The nitrate reach the sensitivity study is built around.
    ///
    /// `tau_max` is 365 days, a long but finite storage time.
    pub fn reference() -> Self {
        Self {
            disch: 0.069,
            reach_len: 250.0,
            reach_width: 0.7,
            reach_depth: 0.3,
            solute: default_solute(),
            concentration: 19.3,
            initial_concentration: 0.0,
            alpha: 1.5,
            vol_water_in_storage: 15.0,
            k: 1e-4,
            tau_min: 60.0,
            tau_max: TransitTimeBound::Finite(365.0 * DAY),
            tau_rxn: 0.0,
            time_step: default_time_step(),
        }
    }

    pub fn from_toml_str(content: &str) -> RRTMResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RRTMResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn geometry(&self) -> ReachGeometry {
        ReachGeometry::new(self.reach_len, self.reach_width, self.reach_depth)
    }

    /// unit: m^3
    pub fn channel_volume(&self) -> f64 {
        self.geometry().channel_volume()
    }

    /// Solute load carried in by the inflow
    /// unit: g / s
    pub fn load(&self) -> f64 {
        self.disch * self.concentration
    }

    pub fn storage_parameters(&self) -> PowerLawStorageParameters {
        PowerLawStorageParameters {
            alpha: self.alpha,
            k: self.k,
            vol_water_in_storage: self.vol_water_in_storage,
            tau_min: self.tau_min,
            tau_max: self.tau_max,
            tau_rxn: self.tau_rxn,
        }
    }

    /// Lay the reach out as model tables without validating them
    pub fn builder(&self) -> ModelBuilder {
        let mut builder = ModelBuilder::new();
        builder.with_time_step(self.time_step);

        let geometry = self.geometry();
        let volume = geometry.channel_volume();
        let water = builder.with_cell(CellTable::water(volume).with_geometry(geometry));
        let solute = builder.with_cell(CellTable::solute(
            &self.solute,
            self.initial_concentration * volume,
            water,
        ));

        let inflow = builder.with_transport(TransportTable::new(
            Currency::Water,
            None,
            Some(water),
            TransportRate::Discharge {
                discharge: self.disch,
            },
        ));
        let outflow = builder.with_transport(TransportTable::new(
            Currency::Water,
            Some(water),
            None,
            TransportRate::Discharge {
                discharge: self.disch,
            },
        ));
        builder.with_transport(TransportTable::new(
            Currency::solute(&self.solute),
            None,
            Some(solute),
            TransportRate::LinkedConcentration {
                water_boundary: inflow,
                concentration: self.concentration,
            },
        ));
        builder.with_transport(TransportTable::new(
            Currency::solute(&self.solute),
            Some(solute),
            None,
            TransportRate::Linked {
                water_boundary: outflow,
            },
        ));

        builder.with_reaction(
            solute,
            Arc::new(PowerLawStorage::from_parameters(self.storage_parameters())),
        );
        builder
    }

    pub fn to_model_config(&self) -> ModelConfig {
        self.builder().to_config()
    }

    pub fn build(&self) -> RRTMResult<Model> {
        self.builder().build()
    }
}

/// Concentration of the water leaving the reach
pub fn downstream_concentration() -> Observable {
    Observable::Cell(SOLUTE_CELL, CellAttribute::Concentration)
}

/// The observables a sweep records by default
pub fn default_observables() -> Vec<Observable> {
    vec![
        downstream_concentration(),
        Observable::Transport(SOLUTE_OUTFLOW, TransportAttribute::Load),
        Observable::Reaction(STORAGE_REACTION, ReactionAttribute::FractionRemoved),
        Observable::Reaction(STORAGE_REACTION, ReactionAttribute::DamkohlerNum),
        Observable::Reaction(STORAGE_REACTION, ReactionAttribute::DamkohlerNumStorage),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reference_tables() {
        let config = ReachScenario::reference().to_model_config();
        assert_eq!(config.time_step, 60.0);
        assert_eq!(config.cells.len(), 2);
        assert_eq!(config.transport.len(), 4);
        assert_eq!(config.reactions.len(), 1);
        assert_eq!(config.cells[SOLUTE_CELL.0].linked_cell, Some(WATER_CELL));
        assert_eq!(config.reactions[STORAGE_REACTION.0].cell, SOLUTE_CELL);
        assert_eq!(
            config.transport[SOLUTE_INFLOW.0].rate,
            TransportRate::LinkedConcentration {
                water_boundary: WATER_INFLOW,
                concentration: 19.3
            }
        );
        assert_eq!(
            config.transport[SOLUTE_OUTFLOW.0].rate,
            TransportRate::Linked {
                water_boundary: WATER_OUTFLOW
            }
        );
    }

    #[test]
    fn initial_concentration_sets_solute_mass() {
        let mut scenario = ReachScenario::reference();
        scenario.initial_concentration = 2.0;
        let model = scenario.build().unwrap();
        assert_relative_eq!(model.cell(SOLUTE_CELL).unwrap().amount(), 105.0, epsilon = 1e-9);
        assert_relative_eq!(
            model.value(&downstream_concentration()).unwrap(),
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn parse_with_defaults() {
        let scenario = ReachScenario::from_toml_str(
            r#"
disch = 0.069
reach_len = 250.0
reach_width = 0.7
reach_depth = 0.3
concentration = 19.3
alpha = 1.5
vol_water_in_storage = 15.0
k = 1e-4
tau_min = 60.0
tau_max = "unbounded"
"#,
        )
        .unwrap();
        assert_eq!(scenario.solute, "NO3");
        assert_eq!(scenario.time_step, 60.0);
        assert_eq!(scenario.tau_rxn, 0.0);
        assert_eq!(scenario.tau_max, TransitTimeBound::Unbounded);
    }
}
