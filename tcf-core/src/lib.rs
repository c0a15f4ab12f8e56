//! Core numerics and shared types for the Terrestrial Carbon Flux (TCF) model
//!
//! This crate holds the pieces of TCF that carry no model state:
//!
//! - [`constraints`]: the ramp, Arrhenius and soil-moisture transforms that
//!   scale photosynthesis and decomposition to the interval [0, 1]
//! - [`climatology`]: mean annual (365-day) cycles from dated daily series
//! - [`land_cover`]: plant functional types and the per-pixel land-cover map
//! - [`state`]: the three-pool soil organic carbon (SOC) state
//! - [`errors`]: the error type shared by the whole workspace

pub mod climatology;
pub mod constraints;
pub mod errors;
pub mod land_cover;
pub mod state;

/// Floating point type used for all model quantities
pub type FloatValue = f64;

/// Number of soil organic carbon pools (metabolic, structural, recalcitrant)
pub const N_POOLS: usize = 3;
