use crate::cell::CellId;
use crate::currency::Currency;
use thiserror::Error;

/// Error type for model construction and iteration.
#[derive(Error, Debug)]
pub enum RRTMError {
    #[error("{0}")]
    Error(String),
    /// The model tables are malformed or inconsistent.
    ///
    /// Every problem found during validation is listed so that a table can be
    /// corrected in one pass.
    #[error("Invalid model configuration ({} issue(s)):\n  - {}", .issues.len(), .issues.join("\n  - "))]
    Configuration { issues: Vec<String> },
    #[error("{entity}: parameter '{parameter}' = {value} is outside the valid domain ({reason})")]
    NumericDomain {
        entity: String,
        parameter: String,
        value: f64,
        reason: String,
    },
    #[error("Cell {cell}: requested change of {requested} exceeds the available amount {available} ({context})")]
    NegativeMass {
        cell: CellId,
        available: f64,
        requested: f64,
        context: String,
    },
    #[error("Mass balance violated for currency '{currency}': ledger expects {expected}, cells hold {actual}")]
    MassBalance {
        currency: Currency,
        expected: f64,
        actual: f64,
    },
    #[error("Iteration {iteration} failed, model state rolled back: {source}")]
    IterationFault {
        iteration: u64,
        #[source]
        source: Box<RRTMError>,
    },
    #[error("Model is faulted and cannot be iterated: {0}")]
    Faulted(String),
    #[error("Attribute '{attribute}' is not available for {entity}")]
    AttributeUnavailable { entity: String, attribute: String },
    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),
    #[error("No {kind} with index {index}")]
    NotFound { kind: &'static str, index: usize },
    #[error("Failed to parse model tables: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RRTMError {
    /// Shorthand for a [`RRTMError::NumericDomain`] error.
    pub fn numeric_domain(
        entity: impl Into<String>,
        parameter: impl Into<String>,
        value: f64,
        reason: impl Into<String>,
    ) -> Self {
        RRTMError::NumericDomain {
            entity: entity.into(),
            parameter: parameter.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Prefix the entity of a numeric-domain error with where it was raised
    pub fn within(self, location: &str) -> Self {
        match self {
            RRTMError::NumericDomain {
                entity,
                parameter,
                value,
                reason,
            } => RRTMError::NumericDomain {
                entity: format!("{} ({})", location, entity),
                parameter,
                value,
                reason,
            },
            other => other,
        }
    }
}

/// Convenience type for `Result<T, RRTMError>`.
pub type RRTMResult<T> = Result<T, RRTMError>;
