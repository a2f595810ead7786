use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the water currency in model tables.
pub const WATER: &str = "water";

/// A conserved quantity tracked through the model.
///
/// Currencies are identified by a string key in the model tables.
/// The key `"water"` is reserved for water volume, every other key names a solute
/// (for example `"NO3"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    Water,
    Solute(String),
}

impl Currency {
    pub fn solute(name: &str) -> Self {
        Currency::from(name)
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Currency::Water)
    }

    pub fn name(&self) -> &str {
        match self {
            Currency::Water => WATER,
            Currency::Solute(name) => name,
        }
    }
}

impl From<&str> for Currency {
    fn from(value: &str) -> Self {
        if value == WATER {
            Currency::Water
        } else {
            Currency::Solute(value.to_string())
        }
    }
}

impl From<String> for Currency {
    fn from(value: String) -> Self {
        if value == WATER {
            Currency::Water
        } else {
            Currency::Solute(value)
        }
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
