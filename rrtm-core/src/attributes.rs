//! Named attributes that can be read from a live model between iterations.
//!
//! Each entity type has an enumerated set of attributes. The string names
//! (`concentration`, `fractionRemoved`, ...) are the ones used in recorder
//! configuration and parse back into the typed variants.

use crate::cell::CellId;
use crate::errors::RRTMError;
use crate::transport::BoundaryId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum CellAttribute {
    #[strum(to_string = "amount")]
    Amount,
    #[strum(to_string = "currency")]
    Currency,
    #[strum(to_string = "processDomain")]
    ProcessDomain,
    #[strum(to_string = "volume")]
    Volume,
    #[strum(to_string = "concentration")]
    Concentration,
    #[strum(to_string = "residenceTime")]
    ResidenceTime,
    #[strum(to_string = "velocity")]
    Velocity,
    #[strum(to_string = "hydraulicLoad")]
    HydraulicLoad,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum TransportAttribute {
    #[strum(to_string = "currency")]
    Currency,
    /// Rate in currency units per time
    #[strum(to_string = "rate")]
    Rate,
    #[strum(to_string = "discharge")]
    Discharge,
    #[strum(to_string = "load")]
    Load,
    /// Concentration carried by a solute boundary
    #[strum(to_string = "concentration")]
    Concentration,
    #[strum(to_string = "amountMoved")]
    AmountMoved,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ReactionAttribute {
    // Kinetic parameters
    #[strum(to_string = "alpha")]
    Alpha,
    #[strum(to_string = "k")]
    K,
    #[strum(to_string = "volWaterInStorage")]
    VolWaterInStorage,
    #[strum(to_string = "tauMin")]
    TauMin,
    #[strum(to_string = "tauMax")]
    TauMax,
    #[strum(to_string = "tauRxn")]
    TauRxn,
    // Results of the last iteration
    #[strum(to_string = "startingAmount")]
    StartingAmount,
    #[strum(to_string = "amountToRemove")]
    AmountToRemove,
    #[strum(to_string = "amountToRemain")]
    AmountToRemain,
    #[strum(to_string = "qStorage")]
    QStorage,
    #[strum(to_string = "damkohlerNum")]
    DamkohlerNum,
    #[strum(to_string = "damkohlerNumStorage")]
    DamkohlerNumStorage,
    #[strum(to_string = "fractionRemoved")]
    FractionRemoved,
    #[strum(to_string = "fractionRemaining")]
    FractionRemaining,
    #[strum(to_string = "fractionRemovedStorage")]
    FractionRemovedStorage,
    #[strum(to_string = "fractionRemainingStorage")]
    FractionRemainingStorage,
}

/// Value of an attribute
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Number(_) => None,
            AttributeValue::Text(s) => Some(s),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

/// An attribute of a specific entity in a model.
///
/// Written and parsed as `cell[1].concentration`, `transport[3].load` or
/// `reaction[0].fractionRemoved`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Observable {
    Cell(CellId, CellAttribute),
    Transport(BoundaryId, TransportAttribute),
    Reaction(BoundaryId, ReactionAttribute),
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::Cell(id, attribute) => write!(f, "cell[{}].{}", id, attribute),
            Observable::Transport(id, attribute) => write!(f, "transport[{}].{}", id, attribute),
            Observable::Reaction(id, attribute) => write!(f, "reaction[{}].{}", id, attribute),
        }
    }
}

impl FromStr for Observable {
    type Err = RRTMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || RRTMError::UnknownAttribute(s.to_string());

        let (entity, attribute) = s.split_once('.').ok_or_else(unknown)?;
        let (kind, index) = entity
            .strip_suffix(']')
            .and_then(|e| e.split_once('['))
            .ok_or_else(unknown)?;
        let index: usize = index.trim().parse().map_err(|_| unknown())?;

        match kind.trim() {
            "cell" => Ok(Observable::Cell(
                CellId(index),
                attribute.parse().map_err(|_| unknown())?,
            )),
            "transport" => Ok(Observable::Transport(
                BoundaryId(index),
                attribute.parse().map_err(|_| unknown())?,
            )),
            "reaction" => Ok(Observable::Reaction(
                BoundaryId(index),
                attribute.parse().map_err(|_| unknown())?,
            )),
            _ => Err(unknown()),
        }
    }
}

impl Serialize for Observable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Observable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
