//! Model struct and runtime execution.

use crate::cell::{Cell, CellId};
use crate::config::{CellTable, ModelConfig, ReactionTable, TransportTable};
use crate::currency::Currency;
use crate::errors::{RRTMError, RRTMResult};
use crate::reaction::{ReactionBoundary, ReactionContext, ReactionState};
use crate::transport::{BoundaryId, TransportBoundary, TransportRate};
use log::{debug, warn};
use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use petgraph::Graph;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::balance::{entry, MassLedger};
use super::validation::{validate_config, validate_kinetics};

/// Lifecycle of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelStatus {
    /// Built but not yet iterated
    Ready,
    /// At least one iteration has been committed
    Running,
    /// An iteration failed. The model keeps its last committed state but
    /// refuses to iterate again.
    Faulted { reason: String },
}

/// A static network of cells, transport boundaries and reaction boundaries
/// advanced on a fixed time step.
///
/// Cells own all amounts. Boundaries only reference cells by id and never
/// mutate them directly: every change flows through [`Model::iterate`], which
/// stages the whole step before committing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub(crate) cells: Vec<Cell>,
    pub(crate) transport: Vec<TransportBoundary>,
    pub(crate) reactions: Vec<ReactionBoundary>,
    pub(crate) time_step: f64,
    pub(crate) start_time: f64,
    /// Relative shortfall below zero treated as round-off
    pub(crate) mass_tolerance: f64,
    /// Number of committed iterations
    pub(crate) iteration: u64,
    pub(crate) ledger: Vec<MassLedger>,
    pub(crate) status: ModelStatus,
}

/// Everything an iteration changes, computed before anything is committed
struct StagedStep {
    cells: Vec<Cell>,
    amount_moved: Vec<f64>,
    reaction_states: Vec<ReactionState>,
    ledger: Vec<MassLedger>,
}

impl Model {
    /// Advance the model by one time step.
    ///
    /// Water is moved first, then solutes, then each reaction boundary removes
    /// mass from its cell in table order. Transport rates are evaluated from
    /// the state at the start of the step.
    ///
    /// The step either commits in full or not at all. On failure the model is
    /// left exactly as it was before the call, its status becomes
    /// [`ModelStatus::Faulted`] and an [`RRTMError::IterationFault`] wrapping
    /// the cause is returned.
    pub fn iterate(&mut self) -> RRTMResult<()> {
        if let ModelStatus::Faulted { reason } = &self.status {
            return Err(RRTMError::Faulted(reason.clone()));
        }
        let iteration = self.iteration + 1;

        match self.stage() {
            Ok(staged) => {
                self.commit(staged);
                debug!("Committed iteration {} (t = {})", iteration, self.current_time());
                Ok(())
            }
            Err(source) => {
                warn!("Iteration {} failed, rolling back: {}", iteration, source);
                self.status = ModelStatus::Faulted {
                    reason: source.to_string(),
                };
                Err(RRTMError::IterationFault {
                    iteration,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Iterate `n` times, stopping at the first failure
    pub fn iterate_n(&mut self, n: u64) -> RRTMResult<()> {
        for _ in 0..n {
            self.iterate()?;
        }
        Ok(())
    }

    fn stage(&self) -> RRTMResult<StagedStep> {
        let mut cells = self.cells.clone();
        let mut ledger = self.ledger.clone();
        let mut amount_moved = vec![0.0; self.transport.len()];

        // Water moves before solutes
        self.transfer(&mut cells, &mut ledger, &mut amount_moved, true)?;
        self.transfer(&mut cells, &mut ledger, &mut amount_moved, false)?;

        let reaction_states = self.react(&mut cells, &mut ledger)?;

        for account in &ledger {
            let actual = total_of(&cells, &account.currency);
            if !account.balances(actual) {
                return Err(RRTMError::MassBalance {
                    currency: account.currency.clone(),
                    expected: account.expected(),
                    actual,
                });
            }
        }

        Ok(StagedStep {
            cells,
            amount_moved,
            reaction_states,
            ledger,
        })
    }

    /// Move one phase (water or solutes) across its transport boundaries.
    ///
    /// All boundaries of the phase act simultaneously. A cell may not be
    /// drained of more than it held at the start of the phase, whatever it
    /// receives in the same step: that would mean the time step is too long
    /// for the fluxes.
    fn transfer(
        &self,
        cells: &mut [Cell],
        ledger: &mut Vec<MassLedger>,
        amount_moved: &mut [f64],
        water: bool,
    ) -> RRTMResult<()> {
        let mut net = vec![0.0; cells.len()];
        let mut debits = vec![0.0; cells.len()];
        let mut debited_by: Vec<Vec<BoundaryId>> = vec![vec![]; cells.len()];

        for boundary in self
            .transport
            .iter()
            .filter(|b| b.currency.is_water() == water)
        {
            let amount = self.rate_of(boundary) * self.time_step;
            if !amount.is_finite() {
                return Err(RRTMError::numeric_domain(
                    format!("transport {}", boundary.id),
                    "amountMoved",
                    amount,
                    "transported amounts must be finite",
                ));
            }
            amount_moved[boundary.id.0] = amount;

            match boundary.from {
                Some(from) => {
                    net[from.0] -= amount;
                    debits[from.0] += amount;
                    debited_by[from.0].push(boundary.id);
                }
                None => entry(ledger, &boundary.currency).inflow += amount,
            }
            match boundary.to {
                Some(to) => net[to.0] += amount,
                None => entry(ledger, &boundary.currency).outflow += amount,
            }
        }

        for (index, cell) in cells.iter_mut().enumerate() {
            let available = cell.amount;
            if debits[index] > available * (1.0 + self.mass_tolerance) {
                return Err(RRTMError::NegativeMass {
                    cell: cell.id,
                    available,
                    requested: -debits[index],
                    context: format!(
                        "{} cell in {}, drained by transport {}",
                        cell.currency,
                        cell.process_domain,
                        join_ids(&debited_by[index])
                    ),
                });
            }
            if net[index] != 0.0 {
                cell.apply_delta(net[index], self.mass_tolerance)?;
            }
        }
        Ok(())
    }

    fn react(
        &self,
        cells: &mut [Cell],
        ledger: &mut Vec<MassLedger>,
    ) -> RRTMResult<Vec<ReactionState>> {
        let mut states = Vec::with_capacity(self.reactions.len());

        for reaction in &self.reactions {
            let location = format!("reaction {}", reaction.id);
            let cell = &cells[reaction.cell.0];
            let water_volume = cell
                .linked_cell()
                .map_or(0.0, |water| cells[water.0].amount);
            let context = ReactionContext {
                starting_amount: cell.amount,
                water_volume,
                time_step: self.time_step,
            };

            let removal = reaction
                .kinetics
                .removal(&context)
                .map_err(|e| e.within(&location))?;
            if !(removal.fraction_removed.is_finite()
                && (0.0..=1.0).contains(&removal.fraction_removed))
            {
                return Err(RRTMError::numeric_domain(
                    location,
                    "fractionRemoved",
                    removal.fraction_removed,
                    "must lie in [0, 1]",
                ));
            }

            let amount_to_remove = removal.fraction_removed * context.starting_amount;
            cells[reaction.cell.0].apply_delta(-amount_to_remove, self.mass_tolerance)?;
            entry(ledger, &cells[reaction.cell.0].currency).reacted += amount_to_remove;

            states.push(ReactionState {
                starting_amount: context.starting_amount,
                amount_to_remove,
                amount_to_remain: context.starting_amount - amount_to_remove,
                removal,
            });
        }
        Ok(states)
    }

    fn commit(&mut self, staged: StagedStep) {
        self.cells = staged.cells;
        for (boundary, moved) in self.transport.iter_mut().zip(staged.amount_moved) {
            boundary.amount_moved = moved;
        }
        for (reaction, state) in self.reactions.iter_mut().zip(staged.reaction_states) {
            reaction.state = Some(state);
        }
        self.ledger = staged.ledger;
        self.iteration += 1;
        self.status = ModelStatus::Running;
    }

    /// Rate of a transport boundary given the current cell state.
    ///
    /// unit: currency amount / time
    pub(crate) fn rate_of(&self, boundary: &TransportBoundary) -> f64 {
        match &boundary.rate {
            TransportRate::Discharge { discharge } => *discharge,
            TransportRate::Load { load } => *load,
            TransportRate::Linked { water_boundary } => {
                let concentration = boundary
                    .from
                    .map_or(0.0, |from| self.concentration_of(from));
                self.discharge_of(*water_boundary) * concentration
            }
            TransportRate::LinkedConcentration {
                water_boundary,
                concentration,
            } => self.discharge_of(*water_boundary) * concentration,
        }
    }

    /// Discharge of a water boundary, zero for anything else
    pub(crate) fn discharge_of(&self, id: BoundaryId) -> f64 {
        match self.transport.get(id.0).map(|b| &b.rate) {
            Some(TransportRate::Discharge { discharge }) => *discharge,
            _ => 0.0,
        }
    }

    /// Concentration of a solute cell in its linked water cell
    pub(crate) fn concentration_of(&self, id: CellId) -> f64 {
        let cell = &self.cells[id.0];
        match cell.linked_cell() {
            Some(water) => cell.concentration_in(self.cells[water.0].amount),
            None => 0.0,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> RRTMResult<&Cell> {
        self.cells.get(id.0).ok_or(RRTMError::NotFound {
            kind: "cell",
            index: id.0,
        })
    }

    pub fn transport(&self) -> &[TransportBoundary] {
        &self.transport
    }

    pub fn transport_boundary(&self, id: BoundaryId) -> RRTMResult<&TransportBoundary> {
        self.transport.get(id.0).ok_or(RRTMError::NotFound {
            kind: "transport boundary",
            index: id.0,
        })
    }

    pub fn reactions(&self) -> &[ReactionBoundary] {
        &self.reactions
    }

    pub fn reaction(&self, id: BoundaryId) -> RRTMResult<&ReactionBoundary> {
        self.reactions.get(id.0).ok_or(RRTMError::NotFound {
            kind: "reaction boundary",
            index: id.0,
        })
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Time at the end of the last committed iteration
    pub fn current_time(&self) -> f64 {
        self.start_time + self.iteration as f64 * self.time_step
    }

    /// Number of committed iterations
    pub fn iterations(&self) -> u64 {
        self.iteration
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.status, ModelStatus::Faulted { .. })
    }

    /// Cumulative per-currency accounting since the model was built
    pub fn ledger(&self) -> &[MassLedger] {
        &self.ledger
    }

    /// Total amount of a currency held by all cells
    pub fn total_amount(&self, currency: &Currency) -> f64 {
        total_of(&self.cells, currency)
    }

    /// Serialise the full model state, kinetics included, to JSON.
    ///
    /// A model restored with [`Model::from_snapshot`] continues exactly where
    /// this one stopped.
    pub fn to_snapshot(&self) -> RRTMResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a model written by [`Model::to_snapshot`].
    ///
    /// The restored network is checked like a freshly built one, so a
    /// snapshot that was edited into an inconsistent state fails with
    /// [`RRTMError::Configuration`] (or the kinetics' own domain error)
    /// instead of being iterated.
    pub fn from_snapshot(snapshot: &str) -> RRTMResult<Self> {
        let model: Model = serde_json::from_str(snapshot)?;

        let config = model.to_config();
        let mut issues = model.misplaced_ids();
        issues.extend(validate_config(&config));
        if !issues.is_empty() {
            return Err(RRTMError::Configuration { issues });
        }
        validate_kinetics(&config.reactions)?;

        debug!(
            "Restored model at iteration {} with {} cells",
            model.iteration,
            model.cells.len()
        );
        Ok(model)
    }

    /// The committed state as model tables.
    ///
    /// Building these tables gives a fresh model that starts where this one
    /// is now, without its iteration history or ledger.
    pub fn to_config(&self) -> ModelConfig {
        ModelConfig {
            time_step: self.time_step,
            start_time: self.current_time(),
            mass_tolerance: self.mass_tolerance,
            cells: self
                .cells
                .iter()
                .map(|cell| CellTable {
                    currency: cell.currency.clone(),
                    process_domain: cell.process_domain.clone(),
                    amount: cell.amount,
                    linked_cell: cell.linked_cell(),
                    geometry: cell.geometry().copied(),
                })
                .collect(),
            transport: self
                .transport
                .iter()
                .map(|boundary| TransportTable {
                    currency: boundary.currency.clone(),
                    from: boundary.from,
                    to: boundary.to,
                    rate: boundary.rate.clone(),
                })
                .collect(),
            reactions: self
                .reactions
                .iter()
                .map(|reaction| ReactionTable {
                    cell: reaction.cell,
                    kinetics: Arc::clone(&reaction.kinetics),
                })
                .collect(),
        }
    }

    /// Entities whose id does not match their position in their table
    fn misplaced_ids(&self) -> Vec<String> {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .filter(|(index, cell)| cell.id.0 != *index)
            .map(|(index, cell)| format!("cell {}: recorded with id {}", index, cell.id));
        let transport = self
            .transport
            .iter()
            .enumerate()
            .filter(|(index, boundary)| boundary.id.0 != *index)
            .map(|(index, boundary)| {
                format!("transport {}: recorded with id {}", index, boundary.id)
            });
        let reactions = self
            .reactions
            .iter()
            .enumerate()
            .filter(|(index, reaction)| reaction.id.0 != *index)
            .map(|(index, reaction)| {
                format!("reaction {}: recorded with id {}", index, reaction.id)
            });
        cells.chain(transport).chain(reactions).collect()
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> RRTMResult<()> {
        std::fs::write(path, self.to_snapshot()?)?;
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> RRTMResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_snapshot(&content)
    }

    /// Create a Graphviz diagram of the network.
    ///
    /// Cells are nodes, transport boundaries are edges and anything leaving
    /// or entering the domain is drawn against an `outside` node. Useful for
    /// debugging.
    pub fn as_dot(&self) -> String {
        let mut graph: Graph<String, String> = Graph::new();
        let nodes: Vec<NodeIndex> = self
            .cells
            .iter()
            .map(|cell| {
                graph.add_node(format!(
                    "cell {}: {} ({})",
                    cell.id, cell.currency, cell.process_domain
                ))
            })
            .collect();

        let mut outside = None;
        let mut outside_node = |graph: &mut Graph<String, String>| {
            *outside.get_or_insert_with(|| graph.add_node("outside".to_string()))
        };

        for boundary in &self.transport {
            let from = match boundary.from {
                Some(id) => nodes[id.0],
                None => outside_node(&mut graph),
            };
            let to = match boundary.to {
                Some(id) => nodes[id.0],
                None => outside_node(&mut graph),
            };
            graph.add_edge(
                from,
                to,
                format!("transport {}: {}", boundary.id, boundary.currency),
            );
        }

        for reaction in &self.reactions {
            let sink = graph.add_node(format!("reaction {}", reaction.id));
            graph.add_edge(nodes[reaction.cell.0], sink, "reacted".to_string());
        }

        format!("{}", Dot::new(&graph))
    }
}

fn total_of(cells: &[Cell], currency: &Currency) -> f64 {
    cells
        .iter()
        .filter(|c| &c.currency == currency)
        .map(|c| c.amount)
        .sum()
}

fn join_ids(ids: &[BoundaryId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
