use ndarray::{Array1, Array2};
use serde::Serialize;
use tcf_core::{FloatValue, N_POOLS};

/// Model coefficients expanded to one value per pixel.
///
/// Built by [`crate::parameters::ParameterTable::vectorize`]; every array has
/// length N (the number of pixels), `decay_rates` is (3 x N).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorizedParameters {
    pub lue: Array1<FloatValue>,
    pub tmin0: Array1<FloatValue>,
    pub tmin1: Array1<FloatValue>,
    pub vpd0: Array1<FloatValue>,
    pub vpd1: Array1<FloatValue>,
    pub smrz0: Array1<FloatValue>,
    pub smrz1: Array1<FloatValue>,
    pub ft0: Array1<FloatValue>,
    pub cue: Array1<FloatValue>,
    /// Arrhenius β0
    pub tsoil: Array1<FloatValue>,
    pub smsf0: Array1<FloatValue>,
    pub smsf1: Array1<FloatValue>,
    pub decay_rates: Array2<FloatValue>,
    pub f_structural: Array1<FloatValue>,
    pub f_metabolic: Array1<FloatValue>,
}

/// Coefficients of a single pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelParameters {
    pub lue: FloatValue,
    pub tmin0: FloatValue,
    pub tmin1: FloatValue,
    pub vpd0: FloatValue,
    pub vpd1: FloatValue,
    pub smrz0: FloatValue,
    pub smrz1: FloatValue,
    pub ft0: FloatValue,
    pub cue: FloatValue,
    pub tsoil: FloatValue,
    pub smsf0: FloatValue,
    pub smsf1: FloatValue,
    pub decay_rates: [FloatValue; N_POOLS],
    pub f_structural: FloatValue,
    pub f_metabolic: FloatValue,
}

impl VectorizedParameters {
    pub fn n_pixels(&self) -> usize {
        self.lue.len()
    }

    /// Coefficients of pixel `i`
    ///
    /// # Panics
    ///
    /// If `i` is out of bounds.
    pub fn pixel(&self, i: usize) -> PixelParameters {
        PixelParameters {
            lue: self.lue[i],
            tmin0: self.tmin0[i],
            tmin1: self.tmin1[i],
            vpd0: self.vpd0[i],
            vpd1: self.vpd1[i],
            smrz0: self.smrz0[i],
            smrz1: self.smrz1[i],
            ft0: self.ft0[i],
            cue: self.cue[i],
            tsoil: self.tsoil[i],
            smsf0: self.smsf0[i],
            smsf1: self.smsf1[i],
            decay_rates: [
                self.decay_rates[[0, i]],
                self.decay_rates[[1, i]],
                self.decay_rates[[2, i]],
            ],
            f_structural: self.f_structural[i],
            f_metabolic: self.f_metabolic[i],
        }
    }
}
