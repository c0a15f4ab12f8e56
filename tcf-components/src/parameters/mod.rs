//! TCF model parameters
//!
//! A [`ParameterTable`] holds the coefficients for each land-cover class as
//! they arrive from a configuration file. [`ParameterTable::vectorize`]
//! expands it against a land-cover map into [`VectorizedParameters`], one
//! value (or pool triple) per pixel, which is what the model computes with.

mod presets;
mod table;
mod vectorized;

pub use table::{DecayRates, ParameterTable, ParameterValue, REQUIRED_PARAMETERS};
pub use vectorized::{PixelParameters, VectorizedParameters};
