//! Parameter sweeps over the storage kinetics of a reach.
//!
//! Every combination of the grid is an independent run: it builds its own
//! model from the base scenario, owns its recorder and stops on its own
//! [`StopCondition`]. Runs are spread over the rayon thread pool and share
//! nothing but the (read-only) configuration.

use crate::reach::{default_observables, ReachScenario};
use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use rrtm_core::attributes::Observable;
use rrtm_core::errors::{RRTMError, RRTMResult};
use rrtm_core::recorder::Recorder;
use rrtm_core::run::{RunOutcome, StopCondition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Values of the storage parameters to combine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub alpha: Vec<f64>,
    pub vol_water_in_storage: Vec<f64>,
    pub k: Vec<f64>,
}

impl ParameterGrid {
    /// Five transit-time shapes, five storage volumes and three rate constants
    pub fn reference() -> Self {
        Self {
            alpha: vec![1.1, 1.3, 1.5, 1.7, 1.9],
            vol_water_in_storage: vec![5.0, 10.0, 25.0, 50.0, 100.0],
            k: vec![1e-5, 1e-4, 1e-3],
        }
    }

    pub fn len(&self) -> usize {
        self.alpha.len() * self.vol_water_in_storage.len() * self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every combination, with `k` varying fastest
    pub fn points(&self) -> Vec<SweepPoint> {
        let mut points = Vec::with_capacity(self.len());
        for &alpha in &self.alpha {
            for &vol_water_in_storage in &self.vol_water_in_storage {
                for &k in &self.k {
                    points.push(SweepPoint {
                        index: points.len(),
                        alpha,
                        vol_water_in_storage,
                        k,
                    });
                }
            }
        }
        points
    }
}

/// One combination of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub index: usize,
    pub alpha: f64,
    pub vol_water_in_storage: f64,
    pub k: f64,
}

impl SweepPoint {
    pub fn label(&self) -> String {
        format!(
            "alpha={}_vol={}_k={}",
            self.alpha, self.vol_water_in_storage, self.k
        )
    }

    /// The base scenario with this point's storage parameters
    pub fn apply(&self, scenario: &ReachScenario) -> ReachScenario {
        ReachScenario {
            alpha: self.alpha,
            vol_water_in_storage: self.vol_water_in_storage,
            k: self.k,
            ..scenario.clone()
        }
    }
}

fn default_record_interval() -> u64 {
    1
}

/// How each run of a sweep is driven and what it records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Prefix of every run label
    pub label: String,
    pub stop: StopCondition,
    #[serde(default = "default_record_interval")]
    pub record_interval: u64,
    #[serde(default = "default_observables")]
    pub observables: Vec<Observable>,
}

impl RunConfig {
    pub fn new(label: &str, stop: StopCondition) -> Self {
        Self {
            label: label.to_string(),
            stop,
            record_interval: default_record_interval(),
            observables: default_observables(),
        }
    }

    pub fn with_record_interval(mut self, record_interval: u64) -> Self {
        self.record_interval = record_interval;
        self
    }

    pub fn with_observables(mut self, observables: Vec<Observable>) -> Self {
        self.observables = observables;
        self
    }
}

/// A complete sweep: base scenario, grid and per-run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub scenario: ReachScenario,
    pub grid: ParameterGrid,
    pub run: RunConfig,
}

impl SweepConfig {
    pub fn from_toml_str(content: &str) -> RRTMResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RRTMResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Result of one run of a sweep.
///
/// A failed run still carries whatever its recorder collected before the
/// failure. `recorder` is only `None` when the run never started.
#[derive(Debug)]
pub struct RunReport {
    pub point: SweepPoint,
    pub label: String,
    pub outcome: RRTMResult<RunOutcome>,
    pub recorder: Option<Recorder>,
}

impl RunReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Last recorded value of an observable
    pub fn final_value(&self, observable: &Observable) -> Option<f64> {
        self.recorder
            .as_ref()
            .and_then(|recorder| recorder.column(observable))
            .and_then(|column| column.last().copied())
    }
}

/// Build and run the model for one point of the grid.
///
/// The initial state is recorded before the first iteration.
pub fn run_one(scenario: &ReachScenario, point: &SweepPoint, run: &RunConfig) -> RunReport {
    let label = format!("{}_{}", run.label, point.label());
    let failed = |error: RRTMError| {
        warn!("Run {} could not start: {}", label, error);
        RunReport {
            point: *point,
            label: label.clone(),
            outcome: Err(error),
            recorder: None,
        }
    };

    let mut model = match point.apply(scenario).build() {
        Ok(model) => model,
        Err(e) => return failed(e),
    };
    let mut recorder = match Recorder::new(run.record_interval, run.observables.clone()) {
        Ok(recorder) => recorder,
        Err(e) => return failed(e),
    };
    if let Err(e) = recorder.record(&model) {
        return failed(e);
    }

    let outcome = model.run_until(&run.stop, |m| recorder.poll(m).map(|_| ()));
    match &outcome {
        Ok(outcome) => debug!("Run {} finished: {:?}", label, outcome),
        Err(e) => warn!(
            "Run {} failed after {} iterations: {}",
            label,
            model.iterations(),
            e
        ),
    }

    RunReport {
        point: *point,
        label,
        outcome,
        recorder: Some(recorder),
    }
}

/// Run every point of the grid in parallel.
///
/// Reports come back in grid order. A failing point never stops the others.
pub fn run_sweep(config: &SweepConfig) -> Vec<RunReport> {
    let points = config.grid.points();
    info!(
        "Starting sweep '{}' over {} parameter combinations",
        config.run.label,
        points.len()
    );

    let reports: Vec<RunReport> = points
        .par_iter()
        .map(|point| run_one(&config.scenario, point, &config.run))
        .collect();

    let failures = reports.iter().filter(|report| !report.is_ok()).count();
    info!(
        "Sweep '{}' finished: {} runs, {} failed",
        config.run.label,
        reports.len(),
        failures
    );
    reports
}

/// Final value of `observable` for every run, keyed by run label.
///
/// `None` for runs that recorded nothing.
pub fn final_values(
    reports: &[RunReport],
    observable: &Observable,
) -> IndexMap<String, Option<f64>> {
    reports
        .iter()
        .map(|report| (report.label.clone(), report.final_value(observable)))
        .collect()
}
