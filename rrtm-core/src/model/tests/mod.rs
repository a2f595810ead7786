//! Tests for building, iterating and inspecting models.
//!
//! Most tests use a single reach: one water cell with a steady discharge in
//! and out, and one NO3 cell carried by that water.

use crate::cell::CellId;
use crate::config::{CellTable, TransportTable};
use crate::currency::Currency;
use crate::model::ModelBuilder;
use crate::reaction::ReactionKinetics;
use crate::transport::TransportRate;
use std::sync::Arc;

#[cfg(test)]
mod snapshot;

pub(crate) const WATER_CELL: CellId = CellId(0);
pub(crate) const NO3_CELL: CellId = CellId(1);

/// Water volume 10 with a discharge of 1 in and out, holding 5 units of NO3.
///
/// Inflowing water carries NO3 at a concentration of 2. Transport boundaries
/// are: 0 water in, 1 water out, 2 NO3 in, 3 NO3 out.
pub(crate) fn reach_builder(kinetics: Arc<dyn ReactionKinetics>) -> ModelBuilder {
    let mut builder = ModelBuilder::new();
    builder.with_time_step(1.0);

    let water = builder.with_cell(CellTable::water(10.0));
    let no3 = builder.with_cell(CellTable::solute("NO3", 5.0, water));

    let inflow = builder.with_transport(TransportTable::new(
        Currency::Water,
        None,
        Some(water),
        TransportRate::Discharge { discharge: 1.0 },
    ));
    let outflow = builder.with_transport(TransportTable::new(
        Currency::Water,
        Some(water),
        None,
        TransportRate::Discharge { discharge: 1.0 },
    ));
    builder.with_transport(TransportTable::new(
        Currency::solute("NO3"),
        None,
        Some(no3),
        TransportRate::LinkedConcentration {
            water_boundary: inflow,
            concentration: 2.0,
        },
    ));
    builder.with_transport(TransportTable::new(
        Currency::solute("NO3"),
        Some(no3),
        None,
        TransportRate::Linked {
            water_boundary: outflow,
        },
    ));
    builder.with_reaction(no3, kinetics);
    builder
}
