//! Running a model until a stop condition is met.

use crate::cell::Cell;
use crate::errors::RRTMResult;
use crate::model::Model;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// When [`Model::run_until`] should stop iterating.
///
/// Whichever limit is reached first ends the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopCondition {
    /// Upper bound on the number of iterations performed by one run
    pub max_iterations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wall_time: Option<Duration>,
    /// Stop once no cell changes by more than this relative amount in a step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steady_state_tolerance: Option<f64>,
}

impl StopCondition {
    pub fn iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            max_wall_time: None,
            steady_state_tolerance: None,
        }
    }

    pub fn with_wall_time(mut self, max_wall_time: Duration) -> Self {
        self.max_wall_time = Some(max_wall_time);
        self
    }

    pub fn with_steady_state(mut self, tolerance: f64) -> Self {
        self.steady_state_tolerance = Some(tolerance);
        self
    }
}

/// Why a run stopped, with the number of iterations it performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    SteadyState { iterations: u64 },
    IterationLimit { iterations: u64 },
    TimeLimit { iterations: u64 },
}

impl RunOutcome {
    pub fn iterations(&self) -> u64 {
        match *self {
            RunOutcome::SteadyState { iterations }
            | RunOutcome::IterationLimit { iterations }
            | RunOutcome::TimeLimit { iterations } => iterations,
        }
    }
}

/// Largest relative change in amount between two snapshots of the same cells
fn max_relative_change(before: &[f64], after: &[Cell]) -> f64 {
    before
        .iter()
        .zip(after)
        .map(|(old, cell)| {
            let new = cell.amount();
            let scale = old.abs().max(new.abs());
            if scale == 0.0 {
                0.0
            } else {
                (new - old).abs() / scale
            }
        })
        .fold(0.0, f64::max)
}

impl Model {
    /// Iterate until `stop` is satisfied, calling `observer` after every committed step.
    ///
    /// An iteration fault or an observer error ends the run with that error.
    /// On a limit the model is left in its last committed state and can be
    /// run further.
    pub fn run_until<F>(&mut self, stop: &StopCondition, mut observer: F) -> RRTMResult<RunOutcome>
    where
        F: FnMut(&Model) -> RRTMResult<()>,
    {
        let started = Instant::now();
        let mut performed = 0;

        while performed < stop.max_iterations {
            if stop.max_wall_time.is_some_and(|limit| started.elapsed() >= limit) {
                debug!("Wall time limit reached after {} iterations", performed);
                return Ok(RunOutcome::TimeLimit {
                    iterations: performed,
                });
            }

            let before: Option<Vec<f64>> = stop
                .steady_state_tolerance
                .map(|_| self.cells.iter().map(|c| c.amount()).collect());

            self.iterate()?;
            performed += 1;
            observer(self)?;

            if let (Some(tolerance), Some(before)) = (stop.steady_state_tolerance, before) {
                if max_relative_change(&before, &self.cells) <= tolerance {
                    debug!("Steady state reached after {} iterations", performed);
                    return Ok(RunOutcome::SteadyState {
                        iterations: performed,
                    });
                }
            }
        }

        Ok(RunOutcome::IterationLimit {
            iterations: performed,
        })
    }
}
