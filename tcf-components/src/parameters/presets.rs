//! Calibrated parameter sets for the cropland classes
//!
//! Values are from the SMAP Level 4 Carbon calibration used to validate the
//! model against reference runs.

use super::table::{DecayRates, ParameterTable, ParameterValue};
use tcf_core::FloatValue;

fn scalar(value: FloatValue) -> Option<ParameterValue> {
    Some(ParameterValue::Scalar(value))
}

impl ParameterTable {
    /// Parameters for cereal croplands (PFT 7)
    pub fn cereal_croplands() -> Self {
        Self {
            lue: scalar(1.61),
            tmin0: scalar(257.3),
            tmin1: scalar(285.9),
            vpd0: scalar(150.0),
            vpd1: scalar(4000.0),
            smrz0: scalar(0.1),
            smrz1: scalar(0.3),
            ft0: scalar(0.78),
            cue: scalar(0.708),
            tsoil: scalar(242.47),
            smsf0: scalar(0.0),
            smsf1: scalar(0.25),
            decay_rates: Some(DecayRates::Uniform([0.018, 0.0072, 0.000167])),
            f_structural: scalar(0.5),
            f_metabolic: scalar(0.78),
        }
    }

    /// Parameters for broadleaf croplands (PFT 8)
    pub fn broadleaf_croplands() -> Self {
        Self {
            lue: scalar(2.09),
            tmin0: scalar(262.5),
            tmin1: scalar(297.6),
            vpd0: scalar(1500.0),
            vpd1: scalar(7000.0),
            smrz0: scalar(0.0),
            smrz1: scalar(0.3),
            ft0: scalar(1.0),
            cue: scalar(0.705),
            tsoil: scalar(265.06),
            smsf0: scalar(0.0),
            smsf1: scalar(0.25),
            decay_rates: Some(DecayRates::Uniform([0.031, 0.0124, 0.00029])),
            f_structural: scalar(0.8),
            f_metabolic: scalar(0.78),
        }
    }
}
