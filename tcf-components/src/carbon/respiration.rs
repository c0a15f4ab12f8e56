//! Heterotrophic respiration (RH)
//!
//! Each SOC pool decomposes at its optimal rate scaled by soil temperature and
//! surface soil moisture:
//!
//! $$ RH_p = k_p \times W_{mult} \times T_{mult} \times C_p $$
//!
//! where $W_{mult}$ is a standard ramp on surface soil moisture between
//! `smsf0` and `smsf1` and $T_{mult}$ is the Arrhenius response with β0 =
//! `tsoil`.
//!
//! A fraction `f_structural` of the structural pool's decomposition is
//! humified into the recalcitrant pool instead of being respired, so the
//! reported structural-pool RH is reduced by that fraction.

use crate::drivers::{SoilSeries, SoilStep};
use crate::parameters::{PixelParameters, VectorizedParameters};
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, Axis, Zip};
use tcf_core::constraints::{
    arrhenius, arrhenius_array, linear_constraint_array, product, ConstraintForm,
    LinearConstraint,
};
use tcf_core::errors::TcfResult;
use tcf_core::state::{Pool, SocState};
use tcf_core::{FloatValue, N_POOLS};

/// Environmental constraints on decomposition (each N x T)
#[derive(Debug, Clone, PartialEq)]
pub struct SoilConstraints {
    /// Soil temperature multiplier
    pub tmult: Array2<FloatValue>,
    /// Surface soil moisture multiplier
    pub wmult: Array2<FloatValue>,
}

impl SoilConstraints {
    /// The combined constraint on decomposition, $K_{mult}$
    pub fn kmult(&self) -> Array2<FloatValue> {
        product(self.tmult.view(), self.wmult.view())
    }
}

/// Calculate the temperature and moisture constraints on decomposition.
///
/// # Panics
///
/// If the drivers do not have one row per pixel of `params`.
pub fn soil_constraints(
    params: &VectorizedParameters,
    drivers: &SoilSeries,
) -> TcfResult<SoilConstraints> {
    Ok(SoilConstraints {
        tmult: arrhenius_array(drivers.tsoil.view(), params.tsoil.view()),
        wmult: linear_constraint_array(
            drivers.smsf.view(),
            params.smsf0.view(),
            params.smsf1.view(),
            ConstraintForm::Standard,
        )?,
    })
}

/// Respiration (3 x N) of each pool before humification
pub(crate) fn decompose(
    decay_rates: ArrayView2<FloatValue>,
    kmult: ArrayView1<FloatValue>,
    soc: ArrayView2<FloatValue>,
) -> Array2<FloatValue> {
    Array2::from_shape_fn(soc.raw_dim(), |(p, i)| {
        decay_rates[[p, i]] * kmult[i] * soc[[p, i]]
    })
}

/// Remove the humified fraction from the structural pool's respiration
pub(crate) fn humify(rh: &mut Array2<FloatValue>, f_structural: ArrayView1<FloatValue>) {
    Zip::from(rh.row_mut(Pool::Structural.index()))
        .and(f_structural)
        .for_each(|r, &f| *r *= 1.0 - f);
}

/// RH (g C m-2 day-1) of each pool (3 x N) on a single day.
///
/// # Panics
///
/// If the drivers or `soc` do not cover every pixel of `params`.
pub fn rh_step(
    params: &VectorizedParameters,
    drivers: &SoilStep,
    soc: &SocState,
) -> TcfResult<Array2<FloatValue>> {
    let kmult = soil_constraints(params, &drivers.to_series())?.kmult();
    let mut rh = decompose(
        params.decay_rates.view(),
        kmult.column(0),
        soc.as_array(),
    );
    humify(&mut rh, params.f_structural.view());
    Ok(rh)
}

/// RH (g C m-2 day-1) of each pool (3 x N x T) over T days with the SOC
/// pools held fixed.
///
/// Use [`crate::carbon::engine::forward_run`] to let the pools evolve.
///
/// # Panics
///
/// If the drivers or `soc` do not cover every pixel of `params`.
pub fn rh_series(
    params: &VectorizedParameters,
    drivers: &SoilSeries,
    soc: &SocState,
) -> TcfResult<Array3<FloatValue>> {
    let kmult = soil_constraints(params, drivers)?.kmult();
    let (n_pixels, n_steps) = kmult.dim();
    let mut out = Array3::zeros((N_POOLS, n_pixels, n_steps));
    for (t, k) in kmult.axis_iter(Axis(1)).enumerate() {
        let mut rh = decompose(params.decay_rates.view(), k, soc.as_array());
        humify(&mut rh, params.f_structural.view());
        out.index_axis_mut(Axis(2), t).assign(&rh);
    }
    Ok(out)
}

/// RH (g C m-2 day-1) of each pool of a single pixel on a single day
pub fn rh_pixel(
    params: &PixelParameters,
    tsoil: FloatValue,
    smsf: FloatValue,
    soc: [FloatValue; N_POOLS],
) -> TcfResult<[FloatValue; N_POOLS]> {
    let wmult = LinearConstraint::new(params.smsf0, params.smsf1, ConstraintForm::Standard)?
        .apply(smsf);
    let kmult = arrhenius(tsoil, params.tsoil) * wmult;
    let mut rh = [0.0; N_POOLS];
    for p in 0..N_POOLS {
        rh[p] = params.decay_rates[p] * kmult * soc[p];
    }
    rh[Pool::Structural.index()] *= 1.0 - params.f_structural;
    Ok(rh)
}
