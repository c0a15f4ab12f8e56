//! Plant functional types and land-cover maps
//!
//! Land-cover class codes key the per-class parameter tables. The codes follow
//! the eight plant functional types (PFTs) below, but any code is accepted by
//! [`LandCoverMap`] as long as the parameter table has an entry for it.

use crate::errors::{TcfError, TcfResult};
use ndarray::{Array1, ArrayD, ArrayView1, Ix1};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plant functional type (PFT)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pft {
    EvergreenNeedleleaf = 1,
    EvergreenBroadleaf = 2,
    DeciduousNeedleleaf = 3,
    DeciduousBroadleaf = 4,
    Shrubland = 5,
    Grassland = 6,
    CerealCroplands = 7,
    BroadleafCroplands = 8,
}

impl Pft {
    pub const ALL: [Pft; 8] = [
        Pft::EvergreenNeedleleaf,
        Pft::EvergreenBroadleaf,
        Pft::DeciduousNeedleleaf,
        Pft::DeciduousBroadleaf,
        Pft::Shrubland,
        Pft::Grassland,
        Pft::CerealCroplands,
        Pft::BroadleafCroplands,
    ];

    pub fn from_code(code: u16) -> Option<Pft> {
        Pft::ALL.iter().copied().find(|p| p.code() == code)
    }

    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pft::EvergreenNeedleleaf => "Evergreen Needleleaf",
            Pft::EvergreenBroadleaf => "Evergreen Broadleaf",
            Pft::DeciduousNeedleleaf => "Deciduous Needleleaf",
            Pft::DeciduousBroadleaf => "Deciduous Broadleaf",
            Pft::Shrubland => "Shrubland",
            Pft::Grassland => "Grassland",
            Pft::CerealCroplands => "Cereal Croplands",
            Pft::BroadleafCroplands => "Broadleaf Croplands",
        }
    }
}

impl fmt::Display for Pft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Land-cover class of each model pixel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandCoverMap(Array1<u16>);

impl LandCoverMap {
    pub fn new(codes: Array1<u16>) -> Self {
        Self(codes)
    }

    /// Build a map from an array of unknown dimensionality
    ///
    /// Returns [`TcfError::LandCoverDimensionality`] unless `codes` is 1-D.
    pub fn from_dyn(codes: ArrayD<u16>) -> TcfResult<Self> {
        let ndim = codes.ndim();
        codes
            .into_dimensionality::<Ix1>()
            .map(Self)
            .map_err(|_| TcfError::LandCoverDimensionality { ndim })
    }

    /// A map where every pixel has the same class
    pub fn uniform(code: u16, n_pixels: usize) -> Self {
        Self(Array1::from_elem(n_pixels, code))
    }

    pub fn n_pixels(&self) -> usize {
        self.0.len()
    }

    pub fn codes(&self) -> ArrayView1<u16> {
        self.0.view()
    }

    /// Sorted distinct class codes present in the map
    pub fn classes(&self) -> Vec<u16> {
        let mut classes = self.0.to_vec();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Human readable summary of the classes present, for logging
    pub fn describe_classes(&self) -> String {
        self.classes()
            .iter()
            .map(|&code| match Pft::from_code(code) {
                Some(pft) => format!("{} ({})", code, pft),
                None => code.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Vec<u16>> for LandCoverMap {
    fn from(codes: Vec<u16>) -> Self {
        Self(Array1::from(codes))
    }
}

impl From<&[u16]> for LandCoverMap {
    fn from(codes: &[u16]) -> Self {
        Self(Array1::from(codes.to_vec()))
    }
}
