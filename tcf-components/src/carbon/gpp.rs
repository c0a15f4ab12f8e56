//! Gross Primary Production (GPP)
//!
//! GPP follows a light-use efficiency model:
//!
//! $$ GPP = PAR \times fPAR \times \epsilon \times E_{mult} $$
//!
//! where $\epsilon$ is the light-use efficiency (LUE) and $E_{mult}$ is the
//! product of four environmental constraints, each in [0, 1]:
//!
//! | Constraint | Driver | Form     | Bounds           |
//! |------------|--------|----------|------------------|
//! | `ft`       | FT     | binary   | `ft0` when frozen |
//! | `f_tmin`   | Tmin   | standard | `tmin0`, `tmin1` |
//! | `f_vpd`    | VPD    | reversed | `vpd0`, `vpd1`   |
//! | `f_smrz`   | SMRZ   | standard | `smrz0`, `smrz1` |
//!
//! Root-zone soil moisture is first rescaled with
//! [`tcf_core::constraints::rescale_smrz`] against the pixel's historical
//! minimum. GPP does not depend on the SOC state.

use crate::drivers::GppSeries;
use crate::parameters::{PixelParameters, VectorizedParameters};
use ndarray::{Array2, ArrayView1};
use tcf_core::constraints::{
    freeze_thaw_from_tmin, freeze_thaw_multiplier, linear_constraint_array, product,
    rescale_smrz, rescale_smrz_array, ConstraintForm, LinearConstraint, SMRZ_SATURATION,
};
use tcf_core::errors::TcfResult;
use tcf_core::FloatValue;

/// Environmental constraints on GPP (each N x T)
#[derive(Debug, Clone, PartialEq)]
pub struct GppConstraints {
    /// Freeze-thaw multiplier
    pub ft: Array2<FloatValue>,
    /// Minimum temperature multiplier
    pub f_tmin: Array2<FloatValue>,
    /// Vapor pressure deficit multiplier
    pub f_vpd: Array2<FloatValue>,
    /// Root-zone soil moisture multiplier
    pub f_smrz: Array2<FloatValue>,
}

impl GppConstraints {
    /// The combined environmental constraint, $E_{mult}$
    pub fn emult(&self) -> Array2<FloatValue> {
        let e = product(self.ft.view(), self.f_tmin.view());
        let e = product(e.view(), self.f_vpd.view());
        product(e.view(), self.f_smrz.view())
    }
}

/// Calculate each environmental constraint on GPP.
///
/// # Arguments
///
/// * `params` - Vectorized parameters for N pixels
/// * `drivers` - (N x T) GPP drivers
/// * `smrz_min` - Historical minimum root-zone soil moisture of each pixel
///
/// # Panics
///
/// If the drivers or `smrz_min` do not have N rows.
pub fn gpp_constraints(
    params: &VectorizedParameters,
    drivers: &GppSeries,
    smrz_min: ArrayView1<FloatValue>,
) -> TcfResult<GppConstraints> {
    let ft = drivers.freeze_thaw();
    let ft = Array2::from_shape_fn(ft.raw_dim(), |(i, t)| {
        freeze_thaw_multiplier(ft[[i, t]], params.ft0[i])
    });
    let smrz = rescale_smrz_array(drivers.smrz.view(), smrz_min, SMRZ_SATURATION);

    Ok(GppConstraints {
        ft,
        f_tmin: linear_constraint_array(
            drivers.tmin.view(),
            params.tmin0.view(),
            params.tmin1.view(),
            ConstraintForm::Standard,
        )?,
        f_vpd: linear_constraint_array(
            drivers.vpd.view(),
            params.vpd0.view(),
            params.vpd1.view(),
            ConstraintForm::Reversed,
        )?,
        f_smrz: linear_constraint_array(
            smrz.view(),
            params.smrz0.view(),
            params.smrz1.view(),
            ConstraintForm::Standard,
        )?,
    })
}

/// GPP (g C m-2 day-1) of N pixels over T days.
///
/// See [`gpp_constraints`] for the arguments.
pub fn gpp_series(
    params: &VectorizedParameters,
    drivers: &GppSeries,
    smrz_min: ArrayView1<FloatValue>,
) -> TcfResult<Array2<FloatValue>> {
    let emult = gpp_constraints(params, drivers, smrz_min)?.emult();
    Ok(Array2::from_shape_fn(emult.raw_dim(), |(i, t)| {
        drivers.par[[i, t]] * drivers.fpar[[i, t]] * params.lue[i] * emult[[i, t]]
    }))
}

/// GPP drivers of a single pixel on a single day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGppDrivers {
    pub fpar: FloatValue,
    pub par: FloatValue,
    pub tmin: FloatValue,
    pub vpd: FloatValue,
    pub smrz: FloatValue,
    /// Freeze-thaw flag; derived from `tmin` when absent
    pub ft: Option<FloatValue>,
    /// Historical minimum root-zone soil moisture
    pub smrz_min: FloatValue,
}

/// GPP (g C m-2 day-1) of a single pixel on a single day
pub fn gpp_pixel(params: &PixelParameters, drivers: &PixelGppDrivers) -> TcfResult<FloatValue> {
    let ft = drivers.ft.unwrap_or_else(|| freeze_thaw_from_tmin(drivers.tmin));
    let smrz = rescale_smrz(drivers.smrz, drivers.smrz_min, SMRZ_SATURATION);
    let emult = freeze_thaw_multiplier(ft, params.ft0)
        * LinearConstraint::new(params.tmin0, params.tmin1, ConstraintForm::Standard)?
            .apply(drivers.tmin)
        * LinearConstraint::new(params.vpd0, params.vpd1, ConstraintForm::Reversed)?
            .apply(drivers.vpd)
        * LinearConstraint::new(params.smrz0, params.smrz1, ConstraintForm::Standard)?
            .apply(smrz);
    Ok(drivers.par * drivers.fpar * params.lue * emult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParameterTable;
    use approx::assert_relative_eq;
    use is_close::is_close;
    use ndarray::{array, Array1};
    use tcf_core::constraints::nanmin_rows;
    use tcf_core::land_cover::LandCoverMap;

    fn cereal(n_pixels: usize) -> VectorizedParameters {
        ParameterTable::cereal_croplands()
            .vectorize(&LandCoverMap::uniform(7, n_pixels))
            .unwrap()
    }

    /// Two pixels, three days: warm and moist, cold and frozen, dry and humid
    fn drivers() -> GppSeries {
        GppSeries {
            fpar: array![[0.5, 0.5, 0.5], [0.4, 0.4, 0.4]],
            par: array![[10.0, 10.0, 10.0], [8.0, 8.0, 8.0]],
            tmin: array![[290.0, 255.0, 290.0], [290.0, 250.0, 290.0]],
            vpd: array![[100.0, 100.0, 8000.0], [100.0, 100.0, 2075.0]],
            smrz: array![[0.9, 0.9, 0.1], [0.9, 0.9, 0.6]],
            ft: Some(array![[1.0, 0.0, 1.0], [1.0, 0.0, 1.0]]),
        }
    }

    // ===== Constraint Tests =====

    #[test]
    fn test_unconstrained_gpp() {
        let params = cereal(2);
        let d = drivers();
        let gpp = gpp_series(&params, &d, nanmin_rows(d.smrz.view()).view()).unwrap();
        // Day 0 is warm, moist and thawed: GPP = PAR * fPAR * LUE
        assert_relative_eq!(gpp[[0, 0]], 10.0 * 0.5 * 1.61, epsilon = 1e-12);
        assert_relative_eq!(gpp[[1, 0]], 8.0 * 0.4 * 1.61, epsilon = 1e-12);
    }

    #[test]
    fn test_cold_day_has_no_gpp() {
        let params = cereal(2);
        let d = drivers();
        let gpp = gpp_series(&params, &d, nanmin_rows(d.smrz.view()).view()).unwrap();
        assert_eq!(gpp[[0, 1]], 0.0, "Tmin below tmin0 should stop photosynthesis");
        assert_eq!(gpp[[1, 1]], 0.0);
    }

    #[test]
    fn test_constraints_bounded() {
        let params = cereal(2);
        let d = drivers();
        let c = gpp_constraints(&params, &d, nanmin_rows(d.smrz.view()).view()).unwrap();
        assert_eq!(c.ft, array![[1.0, 0.78, 1.0], [1.0, 0.78, 1.0]]);
        assert_eq!(c.f_vpd[[0, 2]], 0.0, "VPD above vpd1 should stop photosynthesis");
        let v = c.f_vpd[[1, 2]];
        assert!(is_close!(v, 0.5), "Expected 0.5, got {}", v);
        // The driest day of each pixel rescales to 0.05, below smrz0
        assert_eq!(c.f_smrz[[0, 2]], 0.0);
        assert!(c.emult().iter().all(|&e| (0.0..=1.0).contains(&e)));
    }

    #[test]
    fn test_freeze_thaw_derived_when_omitted() {
        let params = cereal(2);
        let mut d = drivers();
        d.ft = None;
        let c = gpp_constraints(&params, &d, nanmin_rows(d.smrz.view()).view()).unwrap();
        // Tmin is below freezing on day 1 only
        assert_eq!(c.ft.column(1), array![0.78, 0.78]);
        assert_eq!(c.ft.column(0), array![1.0, 1.0]);
    }

    #[test]
    fn test_gpp_is_idempotent() {
        let params = cereal(2);
        let d = drivers();
        let smrz_min = nanmin_rows(d.smrz.view());
        let first = gpp_series(&params, &d, smrz_min.view()).unwrap();
        let second = gpp_series(&params, &d, smrz_min.view()).unwrap();
        assert_eq!(first, second);
    }

    // ===== Single Pixel Tests =====

    #[test]
    fn test_gpp_pixel_matches_series() {
        let params = cereal(2);
        let d = drivers();
        let smrz_min: Array1<FloatValue> = nanmin_rows(d.smrz.view());
        let gpp = gpp_series(&params, &d, smrz_min.view()).unwrap();
        let ft = d.ft.clone().unwrap();
        for i in 0..2 {
            for t in 0..3 {
                let pixel = PixelGppDrivers {
                    fpar: d.fpar[[i, t]],
                    par: d.par[[i, t]],
                    tmin: d.tmin[[i, t]],
                    vpd: d.vpd[[i, t]],
                    smrz: d.smrz[[i, t]],
                    ft: Some(ft[[i, t]]),
                    smrz_min: smrz_min[i],
                };
                let expected = gpp[[i, t]];
                assert_relative_eq!(
                    gpp_pixel(&params.pixel(i), &pixel).unwrap(),
                    expected,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_gpp_pixel_invalid_bounds() {
        let mut params = cereal(1).pixel(0);
        params.vpd1 = 100.0;
        let drivers = PixelGppDrivers {
            fpar: 0.5,
            par: 10.0,
            tmin: 290.0,
            vpd: 50.0,
            smrz: 0.5,
            ft: None,
            smrz_min: 0.0,
        };
        assert!(gpp_pixel(&params, &drivers).is_err());
    }
}
