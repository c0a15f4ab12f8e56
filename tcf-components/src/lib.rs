//! The Terrestrial Carbon Flux (TCF) model
//!
//! TCF estimates daily gross primary production (GPP), heterotrophic
//! respiration (RH) from three soil organic carbon (SOC) pools, and net
//! ecosystem exchange (NEE) for a set of pixels, each with its own land-cover
//! class.
//!
//! ```text
//! ParameterTable --vectorize(LandCoverMap)--> VectorizedParameters
//!                                                   |
//!                  drivers -------------------> Tcf (+ SocState, litterfall)
//!                                                   |
//!                         gpp / rh / nee / forward_run / spin_up
//! ```
//!
//! The crate does no file I/O: parameter tables can be parsed from TOML or
//! JSON strings, and drivers are passed in as `ndarray` arrays.

pub mod carbon;
pub mod drivers;
pub mod model;
pub mod observer;
pub mod parameters;

pub use carbon::engine::{ForwardOutput, RunOptions};
pub use carbon::spin_up::{SpinUpConfig, SpinUpReport};
pub use model::Tcf;
