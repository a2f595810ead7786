//! Read access to named attributes of a live model.

use crate::attributes::{
    AttributeValue, CellAttribute, Observable, ReactionAttribute, TransportAttribute,
};
use crate::cell::CellId;
use crate::errors::{RRTMError, RRTMResult};
use crate::transport::{BoundaryId, TransportRate};

use super::runtime::Model;

fn unavailable(entity: String, attribute: impl ToString) -> RRTMError {
    RRTMError::AttributeUnavailable {
        entity,
        attribute: attribute.to_string(),
    }
}

impl Model {
    /// Value of an attribute in the last committed state.
    ///
    /// Fails with [`RRTMError::NotFound`] if the entity does not exist and
    /// with [`RRTMError::AttributeUnavailable`] if the entity has no such
    /// value, e.g. the concentration of a water cell or the reaction results
    /// before the first iteration.
    pub fn attribute(&self, observable: &Observable) -> RRTMResult<AttributeValue> {
        match *observable {
            Observable::Cell(id, attribute) => self.cell_attribute(id, attribute),
            Observable::Transport(id, attribute) => self.transport_attribute(id, attribute),
            Observable::Reaction(id, attribute) => self.reaction_attribute(id, attribute),
        }
    }

    /// Numeric value of an attribute
    pub fn value(&self, observable: &Observable) -> RRTMResult<f64> {
        self.attribute(observable)?
            .as_number()
            .ok_or_else(|| unavailable(observable.to_string(), "numeric value"))
    }

    pub fn cell_attribute(
        &self,
        id: CellId,
        attribute: CellAttribute,
    ) -> RRTMResult<AttributeValue> {
        let cell = self.cell(id)?;
        let entity = || format!("cell {}", id);
        // Hydraulic attributes of a solute describe the water it is dissolved in
        let water = cell.linked_cell().unwrap_or(id);

        let value = match attribute {
            CellAttribute::Amount => cell.amount().into(),
            CellAttribute::Currency => AttributeValue::Text(cell.currency().to_string()),
            CellAttribute::ProcessDomain => AttributeValue::Text(cell.process_domain().to_string()),
            CellAttribute::Volume => self.cells[water.0].amount().into(),
            CellAttribute::Concentration => {
                if cell.is_water() {
                    return Err(unavailable(entity(), attribute));
                }
                self.concentration_of(id).into()
            }
            CellAttribute::ResidenceTime => {
                let discharge = self.outflow_discharge(water);
                if discharge > 0.0 {
                    (self.cells[water.0].amount() / discharge).into()
                } else {
                    f64::INFINITY.into()
                }
            }
            CellAttribute::Velocity => {
                let geometry = self.cells[water.0]
                    .geometry()
                    .ok_or_else(|| unavailable(entity(), attribute))?;
                (self.outflow_discharge(water) / geometry.cross_section()).into()
            }
            CellAttribute::HydraulicLoad => {
                let geometry = self.cells[water.0]
                    .geometry()
                    .ok_or_else(|| unavailable(entity(), attribute))?;
                (self.outflow_discharge(water) / geometry.bed_area()).into()
            }
        };
        Ok(value)
    }

    pub fn transport_attribute(
        &self,
        id: BoundaryId,
        attribute: TransportAttribute,
    ) -> RRTMResult<AttributeValue> {
        let boundary = self.transport_boundary(id)?;
        let entity = || format!("transport {}", id);
        let is_water = boundary.currency().is_water();

        let value = match attribute {
            TransportAttribute::Currency => AttributeValue::Text(boundary.currency().to_string()),
            TransportAttribute::Rate => self.rate_of(boundary).into(),
            TransportAttribute::AmountMoved => boundary.amount_moved().into(),
            TransportAttribute::Discharge => match boundary.rate() {
                TransportRate::Discharge { discharge } => (*discharge).into(),
                rate => match rate.water_boundary() {
                    Some(water) => self.discharge_of(water).into(),
                    None => return Err(unavailable(entity(), attribute)),
                },
            },
            TransportAttribute::Load if !is_water => self.rate_of(boundary).into(),
            TransportAttribute::Concentration => match boundary.rate() {
                TransportRate::Linked { .. } => boundary
                    .from()
                    .map_or(0.0, |from| self.concentration_of(from))
                    .into(),
                TransportRate::LinkedConcentration { concentration, .. } => {
                    (*concentration).into()
                }
                _ => return Err(unavailable(entity(), attribute)),
            },
            TransportAttribute::Load => return Err(unavailable(entity(), attribute)),
        };
        Ok(value)
    }

    pub fn reaction_attribute(
        &self,
        id: BoundaryId,
        attribute: ReactionAttribute,
    ) -> RRTMResult<AttributeValue> {
        let reaction = self.reaction(id)?;
        let entity = || format!("reaction {}", id);
        let missing = || unavailable(entity(), attribute);

        let value = match attribute {
            ReactionAttribute::Alpha
            | ReactionAttribute::K
            | ReactionAttribute::VolWaterInStorage
            | ReactionAttribute::TauMin
            | ReactionAttribute::TauMax
            | ReactionAttribute::TauRxn => {
                reaction.kinetics().parameter(attribute).ok_or_else(missing)?
            }
            _ => {
                let state = reaction.state().ok_or_else(missing)?;
                let removal = &state.removal;
                match attribute {
                    ReactionAttribute::StartingAmount => state.starting_amount,
                    ReactionAttribute::AmountToRemove => state.amount_to_remove,
                    ReactionAttribute::AmountToRemain => state.amount_to_remain,
                    ReactionAttribute::DamkohlerNum => removal.damkohler_num,
                    ReactionAttribute::FractionRemoved => removal.fraction_removed,
                    ReactionAttribute::FractionRemaining => removal.fraction_remaining,
                    _ => {
                        let storage = removal.storage.as_ref().ok_or_else(missing)?;
                        match attribute {
                            ReactionAttribute::QStorage => storage.q_storage,
                            ReactionAttribute::DamkohlerNumStorage => storage.damkohler_num_storage,
                            ReactionAttribute::FractionRemovedStorage => {
                                storage.fraction_removed_storage
                            }
                            ReactionAttribute::FractionRemainingStorage => {
                                storage.fraction_remaining_storage
                            }
                            _ => return Err(missing()),
                        }
                    }
                }
            }
        };
        Ok(value.into())
    }

    /// Total discharge leaving a water cell through transport boundaries
    fn outflow_discharge(&self, water: CellId) -> f64 {
        self.transport
            .iter()
            .filter(|b| b.from() == Some(water))
            .map(|b| match b.rate() {
                TransportRate::Discharge { discharge } => *discharge,
                _ => 0.0,
            })
            .sum()
    }
}
