//! Per-currency mass-balance ledger.

use crate::currency::Currency;
use serde::{Deserialize, Serialize};

/// Relative discrepancy between the ledger and the cells that is tolerated
pub(crate) const BALANCE_TOLERANCE: f64 = 1e-9;

/// Cumulative accounting of one currency since the model was built.
///
/// The amount held by all cells of the currency must always equal
/// `initial + inflow - outflow - reacted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassLedger {
    pub currency: Currency,
    pub initial: f64,
    /// Entered through boundaries without an upstream cell
    pub inflow: f64,
    /// Left through boundaries without a downstream cell
    pub outflow: f64,
    /// Removed by reaction boundaries
    pub reacted: f64,
}

impl MassLedger {
    pub fn new(currency: Currency, initial: f64) -> Self {
        Self {
            currency,
            initial,
            inflow: 0.0,
            outflow: 0.0,
            reacted: 0.0,
        }
    }

    /// Amount the cells should hold
    pub fn expected(&self) -> f64 {
        self.initial + self.inflow - self.outflow - self.reacted
    }

    /// Whether `actual` agrees with the ledger
    pub fn balances(&self, actual: f64) -> bool {
        let scale = self.initial + self.inflow + self.outflow + self.reacted;
        (self.expected() - actual).abs() <= BALANCE_TOLERANCE * scale.max(actual.abs())
    }
}

/// Find the ledger entry for a currency, creating an empty one if needed
pub(crate) fn entry<'a>(
    ledger: &'a mut Vec<MassLedger>,
    currency: &Currency,
) -> &'a mut MassLedger {
    match ledger.iter().position(|l| &l.currency == currency) {
        Some(index) => &mut ledger[index],
        None => {
            ledger.push(MassLedger::new(currency.clone(), 0.0));
            let last = ledger.len() - 1;
            &mut ledger[last]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_amount() {
        let mut ledger = MassLedger::new(Currency::solute("NO3"), 10.0);
        ledger.inflow = 5.0;
        ledger.outflow = 3.0;
        ledger.reacted = 1.5;
        assert_eq!(ledger.expected(), 10.5);
        assert!(ledger.balances(10.5));
        assert!(ledger.balances(10.5 + 1e-12));
        assert!(!ledger.balances(10.6));
    }

    #[test]
    fn empty_ledger_balances_zero() {
        let ledger = MassLedger::new(Currency::Water, 0.0);
        assert!(ledger.balances(0.0));
        assert!(!ledger.balances(1e-6));
    }

    #[test]
    fn entry_creates_missing_currency() {
        let mut ledger = vec![MassLedger::new(Currency::Water, 1.0)];
        entry(&mut ledger, &Currency::solute("PO4")).inflow += 2.0;
        entry(&mut ledger, &Currency::Water).outflow += 0.5;
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].expected(), 0.5);
        assert_eq!(ledger[1].expected(), 2.0);
    }
}
