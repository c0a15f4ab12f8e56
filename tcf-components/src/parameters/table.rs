//! Parameter table as supplied by the caller
//!
//! Keys follow the conventional TCF names (`LUE`, `tmin0`, ..., `f_metabolic`).
//! Values may be a single global scalar, an array indexed by land-cover class
//! code, or a single-row 2-D table indexed the same way:
//!
//! ```toml
//! LUE = [1.61, 2.09]        # class 0, class 1
//! tmin0 = 257.3             # every class
//! ft0 = [[0.78, 1.0]]       # single-row table
//! decay_rates = [0.018, 0.0072, 0.000167]
//! ```

use super::vectorized::VectorizedParameters;
use log::{debug, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tcf_core::errors::{TcfError, TcfResult};
use tcf_core::land_cover::LandCoverMap;
use tcf_core::{FloatValue, N_POOLS};

/// Keys of every parameter required to build a model
pub const REQUIRED_PARAMETERS: [&str; 15] = [
    "LUE",
    "tmin0",
    "tmin1",
    "vpd0",
    "vpd1",
    "smrz0",
    "smrz1",
    "ft0",
    "CUE",
    "tsoil",
    "smsf0",
    "smsf1",
    "decay_rates",
    "f_structural",
    "f_metabolic",
];

const DECAY_RATES: &str = "decay_rates";

/// Value of a single (non-pool) parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// The same value for every pixel
    Scalar(FloatValue),
    /// One value per land-cover class, indexed by class code
    PerClass(Vec<FloatValue>),
    /// A (1 x classes) table, indexed by class code
    Table(Vec<Vec<FloatValue>>),
    /// Already expanded to one value per pixel
    PerPixel(Array1<FloatValue>),
}

impl From<FloatValue> for ParameterValue {
    fn from(value: FloatValue) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<Vec<FloatValue>> for ParameterValue {
    fn from(values: Vec<FloatValue>) -> Self {
        ParameterValue::PerClass(values)
    }
}

/// Decay rates of the metabolic, structural and recalcitrant SOC pools (day-1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecayRates {
    /// The same three rates for every pixel
    Uniform([FloatValue; N_POOLS]),
    /// A (3 x classes) table: one row per pool, indexed by class code
    PoolMajor(Vec<Vec<FloatValue>>),
    /// One triple per land-cover class, indexed by class code. Not read from
    /// files, where it would be indistinguishable from `PoolMajor`.
    #[serde(skip)]
    PerClass(Vec<[FloatValue; N_POOLS]>),
    /// Already expanded to a (3 x N) array
    PerPixel(Array2<FloatValue>),
}

impl TryFrom<ParameterValue> for DecayRates {
    type Error = TcfError;

    fn try_from(value: ParameterValue) -> TcfResult<Self> {
        match value {
            ParameterValue::PerClass(v) if v.len() == N_POOLS => {
                Ok(DecayRates::Uniform([v[0], v[1], v[2]]))
            }
            ParameterValue::Table(rows) => Ok(DecayRates::PoolMajor(rows)),
            other => Err(TcfError::ParameterShape {
                name: DECAY_RATES.to_string(),
                details: format!("expected 3 rates or a (3 x classes) table, got {:?}", other),
            }),
        }
    }
}

/// Model parameters keyed by name, before expansion to pixels.
///
/// Every field is optional so that a table can be assembled piecemeal or read
/// from a partial file; missing values are reported by
/// [`ParameterTable::vectorize`]. Unknown keys in a file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterTable {
    /// Light-use efficiency
    /// unit: g C MJ-1
    #[serde(rename = "LUE", skip_serializing_if = "Option::is_none")]
    pub lue: Option<ParameterValue>,

    /// Minimum temperature below which photosynthesis stops
    /// unit: K
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmin0: Option<ParameterValue>,

    /// Minimum temperature above which photosynthesis is unconstrained
    /// unit: K
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmin1: Option<ParameterValue>,

    /// Vapor pressure deficit below which photosynthesis is unconstrained
    /// unit: Pa
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpd0: Option<ParameterValue>,

    /// Vapor pressure deficit above which photosynthesis stops
    /// unit: Pa
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpd1: Option<ParameterValue>,

    /// Lower bound of the (rescaled) root-zone soil moisture ramp
    /// unit: proportion of saturation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smrz0: Option<ParameterValue>,

    /// Upper bound of the (rescaled) root-zone soil moisture ramp
    /// unit: proportion of saturation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smrz1: Option<ParameterValue>,

    /// GPP multiplier applied when the soil is frozen
    /// unit: dimensionless
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ft0: Option<ParameterValue>,

    /// Carbon-use efficiency, NPP / GPP
    /// unit: dimensionless
    #[serde(rename = "CUE", skip_serializing_if = "Option::is_none")]
    pub cue: Option<ParameterValue>,

    /// β0 coefficient of the Arrhenius soil temperature response
    /// unit: K
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsoil: Option<ParameterValue>,

    /// Lower bound of the surface soil moisture ramp
    /// unit: proportion of saturation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smsf0: Option<ParameterValue>,

    /// Upper bound of the surface soil moisture ramp
    /// unit: proportion of saturation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smsf1: Option<ParameterValue>,

    /// Optimal decay rate of each SOC pool
    /// unit: day-1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay_rates: Option<DecayRates>,

    /// Fraction of structural-pool decomposition humified into the
    /// recalcitrant pool
    /// unit: dimensionless
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_structural: Option<ParameterValue>,

    /// Fraction of litterfall entering the metabolic pool
    /// unit: dimensionless
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_metabolic: Option<ParameterValue>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from TOML
    pub fn from_toml_str(s: &str) -> TcfResult<Self> {
        toml::from_str(s).map_err(|e| TcfError::Config(e.to_string()))
    }

    /// Parse a table from JSON
    pub fn from_json_str(s: &str) -> TcfResult<Self> {
        serde_json::from_str(s).map_err(|e| TcfError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> TcfResult<String> {
        toml::to_string(self).map_err(|e| TcfError::Config(e.to_string()))
    }

    fn field(&self, key: &str) -> Option<&Option<ParameterValue>> {
        let field = match key {
            "LUE" => &self.lue,
            "tmin0" => &self.tmin0,
            "tmin1" => &self.tmin1,
            "vpd0" => &self.vpd0,
            "vpd1" => &self.vpd1,
            "smrz0" => &self.smrz0,
            "smrz1" => &self.smrz1,
            "ft0" => &self.ft0,
            "CUE" => &self.cue,
            "tsoil" => &self.tsoil,
            "smsf0" => &self.smsf0,
            "smsf1" => &self.smsf1,
            "f_structural" => &self.f_structural,
            "f_metabolic" => &self.f_metabolic,
            _ => return None,
        };
        Some(field)
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Option<ParameterValue>> {
        let field = match key {
            "LUE" => &mut self.lue,
            "tmin0" => &mut self.tmin0,
            "tmin1" => &mut self.tmin1,
            "vpd0" => &mut self.vpd0,
            "vpd1" => &mut self.vpd1,
            "smrz0" => &mut self.smrz0,
            "smrz1" => &mut self.smrz1,
            "ft0" => &mut self.ft0,
            "CUE" => &mut self.cue,
            "tsoil" => &mut self.tsoil,
            "smsf0" => &mut self.smsf0,
            "smsf1" => &mut self.smsf1,
            "f_structural" => &mut self.f_structural,
            "f_metabolic" => &mut self.f_metabolic,
            _ => return None,
        };
        Some(field)
    }

    /// Set a parameter by its conventional key.
    ///
    /// Returns `Ok(false)` and leaves the table unchanged if the key is not a
    /// TCF parameter. `decay_rates` accepts three values or a (3 x classes)
    /// table.
    pub fn set(&mut self, key: &str, value: impl Into<ParameterValue>) -> TcfResult<bool> {
        let value = value.into();
        if key == DECAY_RATES {
            self.decay_rates = Some(DecayRates::try_from(value)?);
            return Ok(true);
        }
        match self.field_mut(key) {
            Some(field) => {
                *field = Some(value);
                Ok(true)
            }
            None => {
                warn!("Ignoring unknown parameter \"{}\"", key);
                Ok(false)
            }
        }
    }

    /// Keys of required parameters that have not been set
    pub fn missing(&self) -> Vec<&'static str> {
        REQUIRED_PARAMETERS
            .iter()
            .copied()
            .filter(|&key| match key {
                DECAY_RATES => self.decay_rates.is_none(),
                _ => matches!(self.field(key), Some(None)),
            })
            .collect()
    }

    /// Combine single-class tables into one table, where the class code of
    /// each input is its position in `tables`.
    ///
    /// Every input must be complete and hold only scalar values (uniform
    /// decay rates).
    pub fn stack(tables: &[ParameterTable]) -> TcfResult<ParameterTable> {
        let mut stacked = ParameterTable::new();
        for key in REQUIRED_PARAMETERS.iter().copied() {
            if key == DECAY_RATES {
                let triples = tables
                    .iter()
                    .map(|t| match &t.decay_rates {
                        Some(DecayRates::Uniform(k)) => Ok(*k),
                        Some(_) => Err(single_class_error(key)),
                        None => Err(missing(key)),
                    })
                    .collect::<TcfResult<Vec<_>>>()?;
                let rows = (0..N_POOLS)
                    .map(|p| triples.iter().map(|k| k[p]).collect())
                    .collect();
                stacked.decay_rates = Some(DecayRates::PoolMajor(rows));
                continue;
            }
            let values = tables
                .iter()
                .map(|t| match t.field(key) {
                    Some(Some(ParameterValue::Scalar(x))) => Ok(*x),
                    Some(Some(_)) => Err(single_class_error(key)),
                    _ => Err(missing(key)),
                })
                .collect::<TcfResult<Vec<_>>>()?;
            stacked.set(key, values)?;
        }
        Ok(stacked)
    }

    /// Expand the table to one coefficient per pixel of `land_cover`.
    ///
    /// # Errors
    ///
    /// * [`TcfError::MissingParameter`] for the first required key not set
    /// * [`TcfError::UnknownLandCover`] if a pixel's class has no table entry
    /// * [`TcfError::ParameterShape`] / [`TcfError::PixelCountMismatch`] if a
    ///   value cannot be expanded to the map
    pub fn vectorize(&self, land_cover: &LandCoverMap) -> TcfResult<VectorizedParameters> {
        debug!(
            "Vectorizing parameters for {} pixels; land-cover classes: {}",
            land_cover.n_pixels(),
            land_cover.describe_classes()
        );
        let get = |key: &str| -> TcfResult<Array1<FloatValue>> {
            match self.field(key) {
                Some(Some(value)) => expand(key, value, land_cover),
                _ => Err(missing(key)),
            }
        };
        let decay_rates = match &self.decay_rates {
            Some(rates) => expand_decay_rates(rates, land_cover)?,
            None => return Err(missing(DECAY_RATES)),
        };

        Ok(VectorizedParameters {
            lue: get("LUE")?,
            tmin0: get("tmin0")?,
            tmin1: get("tmin1")?,
            vpd0: get("vpd0")?,
            vpd1: get("vpd1")?,
            smrz0: get("smrz0")?,
            smrz1: get("smrz1")?,
            ft0: get("ft0")?,
            cue: get("CUE")?,
            tsoil: get("tsoil")?,
            smsf0: get("smsf0")?,
            smsf1: get("smsf1")?,
            decay_rates,
            f_structural: get("f_structural")?,
            f_metabolic: get("f_metabolic")?,
        })
    }
}

fn missing(key: &str) -> TcfError {
    TcfError::MissingParameter {
        name: key.to_string(),
    }
}

fn single_class_error(key: &str) -> TcfError {
    TcfError::ParameterShape {
        name: key.to_string(),
        details: "only single-class (scalar) tables can be stacked".to_string(),
    }
}

/// Look up each pixel's class in a per-class array
fn lookup(
    key: &str,
    values: &[FloatValue],
    land_cover: &LandCoverMap,
) -> TcfResult<Array1<FloatValue>> {
    land_cover
        .codes()
        .iter()
        .map(|&code| {
            values
                .get(code as usize)
                .copied()
                .ok_or_else(|| TcfError::UnknownLandCover {
                    code,
                    classes: values.len(),
                    name: key.to_string(),
                })
        })
        .collect()
}

fn expand(
    key: &str,
    value: &ParameterValue,
    land_cover: &LandCoverMap,
) -> TcfResult<Array1<FloatValue>> {
    let n_pixels = land_cover.n_pixels();
    match value {
        ParameterValue::Scalar(x) => Ok(Array1::from_elem(n_pixels, *x)),
        ParameterValue::PerClass(values) => lookup(key, values, land_cover),
        ParameterValue::Table(rows) => match rows.as_slice() {
            [row] => lookup(key, row, land_cover),
            _ => Err(TcfError::ParameterShape {
                name: key.to_string(),
                details: format!("expected a table with a single row, got {} rows", rows.len()),
            }),
        },
        ParameterValue::PerPixel(values) => {
            if values.len() != n_pixels {
                return Err(TcfError::PixelCountMismatch {
                    what: format!("Parameter \"{}\"", key),
                    expected: n_pixels,
                    found: values.len(),
                });
            }
            Ok(values.clone())
        }
    }
}

fn expand_decay_rates(
    rates: &DecayRates,
    land_cover: &LandCoverMap,
) -> TcfResult<Array2<FloatValue>> {
    let n_pixels = land_cover.n_pixels();
    match rates {
        DecayRates::Uniform(k) => Ok(Array2::from_shape_fn((N_POOLS, n_pixels), |(p, _)| k[p])),
        DecayRates::PoolMajor(rows) => {
            if rows.len() != N_POOLS {
                return Err(TcfError::ParameterShape {
                    name: DECAY_RATES.to_string(),
                    details: format!("expected one row per SOC pool, got {} rows", rows.len()),
                });
            }
            let mut out = Array2::zeros((N_POOLS, n_pixels));
            for (p, row) in rows.iter().enumerate() {
                out.row_mut(p).assign(&lookup(DECAY_RATES, row, land_cover)?);
            }
            Ok(out)
        }
        DecayRates::PerClass(triples) => {
            let mut out = Array2::zeros((N_POOLS, n_pixels));
            for (i, &code) in land_cover.codes().iter().enumerate() {
                let k = triples
                    .get(code as usize)
                    .ok_or_else(|| TcfError::UnknownLandCover {
                        code,
                        classes: triples.len(),
                        name: DECAY_RATES.to_string(),
                    })?;
                for p in 0..N_POOLS {
                    out[[p, i]] = k[p];
                }
            }
            Ok(out)
        }
        DecayRates::PerPixel(values) => {
            if values.dim() != (N_POOLS, n_pixels) {
                return Err(TcfError::ParameterShape {
                    name: DECAY_RATES.to_string(),
                    details: format!(
                        "expected a ({} x {}) array, got {:?}",
                        N_POOLS,
                        n_pixels,
                        values.shape()
                    ),
                });
            }
            Ok(values.clone())
        }
    }
}
