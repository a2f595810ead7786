//! River-reach reactive-transport models.
//!
//! The engine itself lives in [`rrtm_core`] (cells, boundaries, time stepping)
//! and [`rrtm_components`] (reaction kinetics). This crate wires them into a
//! single reach with transient storage and runs parameter sweeps over it.

pub mod reach;
pub mod sweep;
