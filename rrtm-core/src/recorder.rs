//! Periodic recording of model attributes.

use crate::attributes::Observable;
use crate::errors::{RRTMError, RRTMResult};
use crate::model::Model;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Values of every observable at one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub iteration: u64,
    pub time: f64,
    /// One value per observable, in the order the recorder was given them.
    ///
    /// `NaN` where the attribute was not available at that iteration.
    pub values: Vec<f64>,
}

/// Collects the values of a fixed list of observables every `interval` iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recorder {
    interval: u64,
    observables: Vec<Observable>,
    rows: Vec<Record>,
}

impl Recorder {
    pub fn new(interval: u64, observables: Vec<Observable>) -> RRTMResult<Self> {
        if interval == 0 {
            return Err(RRTMError::Configuration {
                issues: vec!["recorder interval must be at least one iteration".to_string()],
            });
        }
        Ok(Self {
            interval,
            observables,
            rows: vec![],
        })
    }

    /// Create a recorder from observable names such as `cell[1].concentration`
    pub fn from_names<S: AsRef<str>>(interval: u64, names: &[S]) -> RRTMResult<Self> {
        let observables = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<RRTMResult<Vec<Observable>>>()?;
        Self::new(interval, observables)
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn observables(&self) -> &[Observable] {
        &self.observables
    }

    /// Record if the model's iteration count falls on the interval.
    ///
    /// Returns whether a row was written.
    pub fn poll(&mut self, model: &Model) -> RRTMResult<bool> {
        if model.iterations() % self.interval != 0 {
            return Ok(false);
        }
        self.record(model)?;
        Ok(true)
    }

    /// Record the current values unconditionally.
    ///
    /// Attributes that are unavailable (for instance reaction results before
    /// the first iteration) are stored as `NaN`. Observables naming an entity
    /// that does not exist are an error.
    pub fn record(&mut self, model: &Model) -> RRTMResult<()> {
        let values = self
            .observables
            .iter()
            .map(|observable| match model.attribute(observable) {
                Ok(value) => Ok(value.as_number().unwrap_or(f64::NAN)),
                Err(RRTMError::AttributeUnavailable { .. }) => Ok(f64::NAN),
                Err(e) => Err(e),
            })
            .collect::<RRTMResult<Vec<f64>>>()?;

        self.rows.push(Record {
            iteration: model.iterations(),
            time: model.current_time(),
            values,
        });
        Ok(())
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn last(&self) -> Option<&Record> {
        self.rows.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// All recorded values of one observable
    pub fn column(&self, observable: &Observable) -> Option<Vec<f64>> {
        let index = self.observables.iter().position(|o| o == observable)?;
        Some(self.rows.iter().map(|r| r.values[index]).collect())
    }

    /// Every column keyed by observable name, in recording order
    pub fn columns(&self) -> IndexMap<String, Vec<f64>> {
        self.observables
            .iter()
            .enumerate()
            .map(|(index, observable)| {
                (
                    observable.to_string(),
                    self.rows.iter().map(|r| r.values[index]).collect(),
                )
            })
            .collect()
    }
}
