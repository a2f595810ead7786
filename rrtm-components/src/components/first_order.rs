//! Well-mixed first-order decay

use rrtm_core::attributes::ReactionAttribute;
use rrtm_core::errors::{RRTMError, RRTMResult};
use rrtm_core::reaction::{ReactionContext, ReactionKinetics, Removal};
use serde::{Deserialize, Serialize};

/// Parameters for first-order decay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstOrderDecayParameters {
    /// Decay rate
    /// unit: 1 / s
    pub k: f64,
}

/// First-order decay of all mass resident in the cell.
///
/// $$ Da = k \Delta t, \qquad f_{remaining} = e^{-Da} $$
///
/// There is no storage zone. This is the limit of
/// [`crate::components::PowerLawStorage`] where every parcel is exposed to
/// reaction for the whole step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstOrderDecay {
    parameters: FirstOrderDecayParameters,
}

impl FirstOrderDecay {
    pub fn from_parameters(parameters: FirstOrderDecayParameters) -> Self {
        Self { parameters }
    }
}

#[typetag::serde]
impl ReactionKinetics for FirstOrderDecay {
    fn validate(&self) -> RRTMResult<()> {
        let k = self.parameters.k;
        if !k.is_finite() || k < 0.0 {
            return Err(RRTMError::numeric_domain(
                "FirstOrderDecay",
                "k",
                k,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }

    fn removal(&self, context: &ReactionContext) -> RRTMResult<Removal> {
        Ok(Removal::from_damkohler(
            self.parameters.k * context.time_step,
            None,
        ))
    }

    fn parameter(&self, attribute: ReactionAttribute) -> Option<f64> {
        match attribute {
            ReactionAttribute::K => Some(self.parameters.k),
            _ => None,
        }
    }
}
