//! Reaction kinetics for river-reach models.
//!
//! Each kinetics implements [`rrtm_core::reaction::ReactionKinetics`] and is
//! registered with `typetag`, so it can be named by `type` in model tables
//! and snapshots.

pub mod components;
pub mod special;
pub mod transit_time;
