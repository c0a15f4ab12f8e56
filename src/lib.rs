//! Terrestrial Carbon Flux (TCF) model
//!
//! Re-exports the model ([`tcf_components`]) and its core numerics and types
//! ([`tcf_core`]).
//!
//! ```rust
//! use tcf::prelude::*;
//! use tcf::ndarray::array;
//!
//! let model = Tcf::new(&ParameterTable::cereal_croplands(), LandCoverMap::uniform(7, 2))
//!     .unwrap()
//!     .with_state(SocState::uniform([40.0, 60.0, 1000.0], 2).unwrap())
//!     .unwrap();
//!
//! let soil = SoilStep {
//!     tsoil: array![275.0, 290.0],
//!     smsf: array![0.2, 0.2],
//! };
//! let rh = model.rh_step(&soil, None).unwrap();
//! assert_eq!(rh.dim(), (3, 2));
//! assert!(rh[[0, 0]] < rh[[0, 1]]);
//! ```

pub use ndarray;
pub use tcf_components::{carbon, drivers, model, observer, parameters};
pub use tcf_core::{climatology, constraints, errors, land_cover, state, FloatValue, N_POOLS};

pub mod prelude {
    pub use tcf_components::carbon::engine::{ForwardOutput, RunOptions};
    pub use tcf_components::carbon::spin_up::{SpinUpConfig, SpinUpReport};
    pub use tcf_components::drivers::{
        DriverSeries, DriverStep, GppSeries, GppStep, SoilSeries, SoilStep,
    };
    pub use tcf_components::observer::StepObserver;
    pub use tcf_components::parameters::{DecayRates, ParameterTable, ParameterValue};
    pub use tcf_components::Tcf;
    pub use tcf_core::errors::{TcfError, TcfResult};
    pub use tcf_core::land_cover::{LandCoverMap, Pft};
    pub use tcf_core::state::{Pool, SocState};
}
