//! Validation of model tables.
//!
//! All checks are run and every problem is collected so that a malformed table
//! can be corrected in a single pass.

use crate::cell::CellId;
use crate::config::{CellTable, ModelConfig, ReactionTable, TransportTable};
use crate::errors::RRTMResult;
use crate::transport::TransportRate;

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn cell_exists(cells: &[CellTable], id: CellId) -> bool {
    id.0 < cells.len()
}

/// Every structural problem in a set of tables
pub(crate) fn validate_config(config: &ModelConfig) -> Vec<String> {
    let mut issues = validate_scalars(config.time_step, config.start_time, config.mass_tolerance);
    issues.extend(validate_cells(&config.cells));
    issues.extend(validate_transport(&config.cells, &config.transport));
    issues.extend(validate_reactions(&config.cells, &config.reactions));
    issues
}

/// Check the parameters of every reaction's kinetics, naming the reaction that fails
pub(crate) fn validate_kinetics(reactions: &[ReactionTable]) -> RRTMResult<()> {
    for (index, reaction) in reactions.iter().enumerate() {
        reaction
            .kinetics
            .validate()
            .map_err(|e| e.within(&format!("reaction {}", index)))?;
    }
    Ok(())
}

pub(crate) fn validate_scalars(
    time_step: f64,
    start_time: f64,
    mass_tolerance: f64,
) -> Vec<String> {
    let mut issues = vec![];
    if !(time_step.is_finite() && time_step > 0.0) {
        issues.push(format!(
            "time step must be positive and finite, got {}",
            time_step
        ));
    }
    if !start_time.is_finite() {
        issues.push(format!("start time must be finite, got {}", start_time));
    }
    if !is_non_negative(mass_tolerance) {
        issues.push(format!(
            "mass tolerance must be finite and non-negative, got {}",
            mass_tolerance
        ));
    }
    issues
}

pub(crate) fn validate_cells(cells: &[CellTable]) -> Vec<String> {
    let mut issues = vec![];

    for (index, cell) in cells.iter().enumerate() {
        if !is_non_negative(cell.amount) {
            issues.push(format!(
                "cell {}: amount {} must be finite and non-negative",
                index, cell.amount
            ));
        }

        if cell.currency.is_water() {
            if let Some(linked) = cell.linked_cell {
                issues.push(format!(
                    "cell {}: water cells cannot be linked to another cell (linked_cell = {})",
                    index, linked
                ));
            }
            if let Some(geometry) = &cell.geometry {
                for (name, value) in [
                    ("length", geometry.length),
                    ("width", geometry.width),
                    ("depth", geometry.depth),
                ] {
                    if !(value.is_finite() && value > 0.0) {
                        issues.push(format!(
                            "cell {}: geometry {} must be positive, got {}",
                            index, name, value
                        ));
                    }
                }
            }
            continue;
        }

        if cell.geometry.is_some() {
            issues.push(format!(
                "cell {}: only water cells carry reach geometry",
                index
            ));
        }
        match cell.linked_cell {
            None => issues.push(format!(
                "cell {}: solute '{}' has no linked water cell",
                index, cell.currency
            )),
            Some(linked) if !cell_exists(cells, linked) => issues.push(format!(
                "cell {}: linked cell {} does not exist",
                index, linked
            )),
            Some(linked) if !cells[linked.0].currency.is_water() => issues.push(format!(
                "cell {}: linked cell {} holds '{}', not water",
                index, linked, cells[linked.0].currency
            )),
            Some(_) => {}
        }
    }
    issues
}

pub(crate) fn validate_transport(
    cells: &[CellTable],
    transport: &[TransportTable],
) -> Vec<String> {
    let mut issues = vec![];

    for (index, boundary) in transport.iter().enumerate() {
        if boundary.from.is_none() && boundary.to.is_none() {
            issues.push(format!(
                "transport {}: needs an upstream or a downstream cell",
                index
            ));
        }
        if boundary.from.is_some() && boundary.from == boundary.to {
            issues.push(format!(
                "transport {}: upstream and downstream are the same cell",
                index
            ));
        }

        for (role, endpoint) in [("upstream", boundary.from), ("downstream", boundary.to)] {
            let Some(id) = endpoint else { continue };
            if !cell_exists(cells, id) {
                issues.push(format!(
                    "transport {}: {} cell {} does not exist",
                    index, role, id
                ));
            } else if cells[id.0].currency != boundary.currency {
                issues.push(format!(
                    "transport {}: {} cell {} holds '{}' but the boundary moves '{}'",
                    index, role, id, cells[id.0].currency, boundary.currency
                ));
            }
        }

        match (&boundary.rate, boundary.currency.is_water()) {
            (TransportRate::Discharge { discharge }, true) => {
                if !is_non_negative(*discharge) {
                    issues.push(format!(
                        "transport {}: discharge {} must be finite and non-negative",
                        index, discharge
                    ));
                }
            }
            (_, true) => issues.push(format!(
                "transport {}: water boundaries need a 'discharge' rate",
                index
            )),
            (TransportRate::Discharge { .. }, false) => issues.push(format!(
                "transport {}: solute boundaries cannot use a 'discharge' rate",
                index
            )),
            (TransportRate::Load { load }, false) => {
                if !is_non_negative(*load) {
                    issues.push(format!(
                        "transport {}: load {} must be finite and non-negative",
                        index, load
                    ));
                }
            }
            (TransportRate::Linked { water_boundary }, false) => {
                if boundary.from.is_none() {
                    issues.push(format!(
                        "transport {}: a linked rate needs an upstream cell to take the concentration from",
                        index
                    ));
                }
                issues.extend(validate_water_link(cells, transport, index, *water_boundary));
            }
            (
                TransportRate::LinkedConcentration {
                    water_boundary,
                    concentration,
                },
                false,
            ) => {
                if !is_non_negative(*concentration) {
                    issues.push(format!(
                        "transport {}: concentration {} must be finite and non-negative",
                        index, concentration
                    ));
                }
                issues.extend(validate_water_link(cells, transport, index, *water_boundary));
            }
        }
    }
    issues
}

/// A solute boundary riding on water must reference a water boundary that
/// connects the water cells its own endpoints are dissolved in.
fn validate_water_link(
    cells: &[CellTable],
    transport: &[TransportTable],
    index: usize,
    water_boundary: crate::transport::BoundaryId,
) -> Vec<String> {
    let mut issues = vec![];
    let Some(water) = transport.get(water_boundary.0) else {
        issues.push(format!(
            "transport {}: linked water boundary {} does not exist",
            index, water_boundary
        ));
        return issues;
    };
    if !water.currency.is_water() {
        issues.push(format!(
            "transport {}: linked boundary {} moves '{}', not water",
            index, water_boundary, water.currency
        ));
        return issues;
    }

    let solute = &transport[index];
    let dissolved_in = |endpoint: Option<CellId>| {
        endpoint
            .filter(|id| cell_exists(cells, *id))
            .and_then(|id| cells[id.0].linked_cell)
    };
    for (role, solute_end, water_end) in [
        ("upstream", solute.from, water.from),
        ("downstream", solute.to, water.to),
    ] {
        if solute_end.is_some() {
            let expected = dissolved_in(solute_end);
            if expected.is_some() && expected != water_end {
                issues.push(format!(
                    "transport {}: {} cell is dissolved in water cell {} but linked water boundary {} does not connect it",
                    index,
                    role,
                    expected.map_or(String::from("?"), |id| id.to_string()),
                    water_boundary
                ));
            }
        }
    }
    issues
}

pub(crate) fn validate_reactions(
    cells: &[CellTable],
    reactions: &[ReactionTable],
) -> Vec<String> {
    let mut issues = vec![];
    for (index, reaction) in reactions.iter().enumerate() {
        if !cell_exists(cells, reaction.cell) {
            issues.push(format!(
                "reaction {}: cell {} does not exist",
                index, reaction.cell
            ));
        } else if cells[reaction.cell.0].currency.is_water() {
            issues.push(format!(
                "reaction {}: cell {} holds water, reactions need a solute cell",
                index, reaction.cell
            ));
        }
    }
    issues
}
