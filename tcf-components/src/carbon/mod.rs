//! Carbon flux calculations
//!
//! - [`gpp`]: gross primary production from light use and environmental
//!   constraints
//! - [`respiration`]: heterotrophic respiration from the three SOC pools
//! - [`engine`]: daily integration of the SOC pools (the forward run)
//! - [`spin_up`]: repeated forward runs over a climatology until the pools
//!   reach a dynamic steady state

pub mod engine;
pub mod gpp;
pub mod respiration;
pub mod spin_up;
