//! Core of a reactive-transport model for river reaches.
//!
//! A model is a static network of [`cell::Cell`]s holding water volume or
//! solute mass, [`transport::TransportBoundary`]s moving those amounts between
//! cells and across the edge of the domain, and [`reaction::ReactionBoundary`]s
//! removing solute mass. Reaction kinetics are pluggable through the
//! [`reaction::ReactionKinetics`] trait.

pub mod attributes;
pub mod cell;
pub mod config;
pub mod currency;
pub mod errors;
pub mod model;
pub mod reaction;
pub mod recorder;
pub mod run;
pub mod transport;

#[cfg(test)]
mod example_kinetics;
