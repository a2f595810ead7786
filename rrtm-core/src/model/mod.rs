//! A model owns a static network of cells and boundaries and advances it one
//! time step at a time.
//!
//! Each iteration moves water, then solutes, across the transport boundaries
//! and then lets every reaction boundary remove mass from its cell. All work is
//! staged on a copy of the state so that an iteration either commits completely
//! or leaves the model exactly as it was.
//!
//! Models are created with a [`ModelBuilder`], which validates the tables and
//! reports every unresolved reference at once.

mod balance;
mod builder;
mod introspection;
mod runtime;
mod validation;

#[cfg(test)]
mod tests;

pub use balance::MassLedger;
pub use builder::ModelBuilder;
pub use runtime::{Model, ModelStatus};
