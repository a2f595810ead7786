#![allow(dead_code)]

use crate::attributes::ReactionAttribute;
use crate::errors::{RRTMError, RRTMResult};
use crate::reaction::{ReactionContext, ReactionKinetics, Removal};
use serde::{Deserialize, Serialize};

/// Removes a fixed fraction of the resident mass every step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ConstantFraction {
    pub fraction: f64,
}

#[typetag::serde]
impl ReactionKinetics for ConstantFraction {
    fn validate(&self) -> RRTMResult<()> {
        if !(0.0..=1.0).contains(&self.fraction) {
            return Err(RRTMError::numeric_domain(
                "ConstantFraction",
                "fraction",
                self.fraction,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    fn removal(&self, _context: &ReactionContext) -> RRTMResult<Removal> {
        Ok(Removal {
            damkohler_num: -(-self.fraction).ln_1p(),
            fraction_removed: self.fraction,
            fraction_remaining: 1.0 - self.fraction,
            storage: None,
        })
    }

    fn parameter(&self, _attribute: ReactionAttribute) -> Option<f64> {
        None
    }
}

/// Fails whenever the attached cell holds more than `limit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FailAbove {
    pub limit: f64,
}

#[typetag::serde]
impl ReactionKinetics for FailAbove {
    fn validate(&self) -> RRTMResult<()> {
        Ok(())
    }

    fn removal(&self, context: &ReactionContext) -> RRTMResult<Removal> {
        if context.starting_amount > self.limit {
            return Err(RRTMError::numeric_domain(
                "FailAbove",
                "startingAmount",
                context.starting_amount,
                "exceeds the configured limit",
            ));
        }
        Ok(Removal::none(None))
    }

    fn parameter(&self, _attribute: ReactionAttribute) -> Option<f64> {
        None
    }
}
