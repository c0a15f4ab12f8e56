//! Environmental constraint functions
//!
//! Each function maps a meteorological driver onto a dimensionless multiplier.
//! The scalar functions are the single-pixel kernels; the `*_array` helpers
//! apply them to (N x T) driver arrays with one set of bounds per pixel (row).

use crate::errors::{TcfError, TcfResult};
use crate::FloatValue;
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// Default β1 coefficient of the Arrhenius soil temperature response (K)
pub const ARRHENIUS_BETA1: FloatValue = 66.02;
/// Default β2 coefficient of the Arrhenius soil temperature response (K)
pub const ARRHENIUS_BETA2: FloatValue = 227.13;
/// Minimum temperature below which the soil is assumed frozen (K)
pub const FREEZE_THRESHOLD_K: FloatValue = 273.15;
/// Upper bound of root-zone soil moisture, as a proportion of saturation
pub const SMRZ_SATURATION: FloatValue = 1.0;

/// Shape of a linear ramp function
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintForm {
    /// 0 below `xmin`, 1 at or above `xmax`, linear in between
    #[default]
    Standard,
    /// 1 below `xmin`, 0 at or above `xmax`, linear in between
    Reversed,
    /// `xmax` where the input is exactly 1, otherwise `xmin`
    Binary,
}

/// A linear ramp function with fixed bounds.
///
/// ```rust
/// use tcf_core::constraints::{ConstraintForm, LinearConstraint};
///
/// let f = LinearConstraint::new(0.0, 10.0, ConstraintForm::Standard).unwrap();
/// assert_eq!(f.apply(-1.0), 0.0);
/// assert_eq!(f.apply(2.5), 0.25);
/// assert_eq!(f.apply(12.0), 1.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    xmin: FloatValue,
    xmax: FloatValue,
    form: ConstraintForm,
}

impl LinearConstraint {
    /// Create a ramp function
    ///
    /// Returns [`TcfError::InvalidConstraintBounds`] if `xmax < xmin`, unless
    /// the form is [`ConstraintForm::Binary`] where the bounds are just the two
    /// output values.
    pub fn new(xmin: FloatValue, xmax: FloatValue, form: ConstraintForm) -> TcfResult<Self> {
        check_bounds(xmin, xmax, form)?;
        Ok(Self { xmin, xmax, form })
    }

    pub fn xmin(&self) -> FloatValue {
        self.xmin
    }

    pub fn xmax(&self) -> FloatValue {
        self.xmax
    }

    pub fn form(&self) -> ConstraintForm {
        self.form
    }

    /// Evaluate the ramp at `x`
    ///
    /// NaN inputs give NaN, except in binary form where they map to `xmin`.
    pub fn apply(&self, x: FloatValue) -> FloatValue {
        ramp(x, self.xmin, self.xmax, self.form)
    }
}

/// Convenience constructor for [`LinearConstraint`]
pub fn linear_constraint(
    xmin: FloatValue,
    xmax: FloatValue,
    form: ConstraintForm,
) -> TcfResult<LinearConstraint> {
    LinearConstraint::new(xmin, xmax, form)
}

fn check_bounds(xmin: FloatValue, xmax: FloatValue, form: ConstraintForm) -> TcfResult<()> {
    if form != ConstraintForm::Binary && xmax < xmin {
        return Err(TcfError::InvalidConstraintBounds { xmin, xmax });
    }
    Ok(())
}

fn ramp(x: FloatValue, xmin: FloatValue, xmax: FloatValue, form: ConstraintForm) -> FloatValue {
    match form {
        ConstraintForm::Standard => {
            if x >= xmax {
                1.0
            } else if x < xmin {
                0.0
            } else {
                (x - xmin) / (xmax - xmin)
            }
        }
        ConstraintForm::Reversed => {
            if x >= xmax {
                0.0
            } else if x < xmin {
                1.0
            } else {
                1.0 - (x - xmin) / (xmax - xmin)
            }
        }
        ConstraintForm::Binary => {
            if x == 1.0 {
                xmax
            } else {
                xmin
            }
        }
    }
}

/// Apply a ramp to an (N x T) array with per-pixel bounds.
///
/// Row `i` of `x` is constrained using `xmin[i]` and `xmax[i]`.
///
/// # Errors
///
/// * [`TcfError::PixelCountMismatch`] if either bound does not have one value
///   per row of `x`
/// * [`TcfError::InvalidConstraintBounds`] if `xmax < xmin` in any row
pub fn linear_constraint_array(
    x: ArrayView2<FloatValue>,
    xmin: ArrayView1<FloatValue>,
    xmax: ArrayView1<FloatValue>,
    form: ConstraintForm,
) -> TcfResult<Array2<FloatValue>> {
    for (what, bound) in [("Lower ramp bound", xmin.view()), ("Upper ramp bound", xmax.view())] {
        if bound.len() != x.nrows() {
            return Err(TcfError::PixelCountMismatch {
                what: what.to_string(),
                expected: x.nrows(),
                found: bound.len(),
            });
        }
    }
    for (&lo, &hi) in xmin.iter().zip(xmax.iter()) {
        check_bounds(lo, hi, form)?;
    }
    Ok(Array2::from_shape_fn(x.raw_dim(), |(i, t)| {
        ramp(x[[i, t]], xmin[i], xmax[i], form)
    }))
}

/// Arrhenius response of decomposition to soil temperature with the default
/// β1 and β2 coefficients.
///
/// See [`arrhenius_with`].
pub fn arrhenius(tsoil: FloatValue, beta0: FloatValue) -> FloatValue {
    arrhenius_with(tsoil, beta0, ARRHENIUS_BETA1, ARRHENIUS_BETA2)
}

/// Arrhenius response of decomposition to soil temperature.
///
/// $$ f(T_{soil}) = \exp\left[\beta_0 \left(\frac{1}{\beta_1} - \frac{1}{T_{soil} - \beta_2}\right)\right] $$
///
/// The result is clamped to [0, 1]; the raw exponential exceeds 1 for warm
/// soils. NaN soil temperatures give NaN.
pub fn arrhenius_with(
    tsoil: FloatValue,
    beta0: FloatValue,
    beta1: FloatValue,
    beta2: FloatValue,
) -> FloatValue {
    let y = (beta0 * (1.0 / beta1 - 1.0 / (tsoil - beta2))).exp();
    y.clamp(0.0, 1.0)
}

/// Arrhenius response for an (N x T) soil temperature array with a per-pixel
/// β0 coefficient.
pub fn arrhenius_array(
    tsoil: ArrayView2<FloatValue>,
    beta0: ArrayView1<FloatValue>,
) -> Array2<FloatValue> {
    Array2::from_shape_fn(tsoil.raw_dim(), |(i, t)| arrhenius(tsoil[[i, t]], beta0[i]))
}

/// Rescale root-zone soil moisture (SMRZ) to increase plant sensitivity to very
/// low water availability.
///
/// SMRZ is clipped to `[smrz_min, smrz_max]`, normalised onto [0.01, 1.01] and
/// then log-transformed:
///
/// $$ \theta_{RZ} = 0.05 + 0.95 \frac{\ln(100 \hat\theta)}{\ln(101)} $$
///
/// so the result ranges from 0.05 at `smrz_min` to 1 at `smrz_max`.
pub fn rescale_smrz(smrz: FloatValue, smrz_min: FloatValue, smrz_max: FloatValue) -> FloatValue {
    let clipped = if smrz < smrz_min {
        smrz_min
    } else if smrz > smrz_max {
        smrz_max
    } else {
        smrz
    };
    let norm = (clipped - smrz_min) / (smrz_max - smrz_min) + 0.01;
    0.05 + 0.95 * ((norm * 100.0).ln() / 101.0_f64.ln())
}

/// [`rescale_smrz`] over an (N x T) array with a per-pixel minimum
pub fn rescale_smrz_array(
    smrz: ArrayView2<FloatValue>,
    smrz_min: ArrayView1<FloatValue>,
    smrz_max: FloatValue,
) -> Array2<FloatValue> {
    Array2::from_shape_fn(smrz.raw_dim(), |(i, t)| {
        rescale_smrz(smrz[[i, t]], smrz_min[i], smrz_max)
    })
}

/// Freeze-thaw state implied by the minimum temperature: 0 (frozen) below
/// [`FREEZE_THRESHOLD_K`], 1 (thawed) otherwise.
pub fn freeze_thaw_from_tmin(tmin: FloatValue) -> FloatValue {
    if tmin < FREEZE_THRESHOLD_K {
        0.0
    } else {
        1.0
    }
}

/// Freeze-thaw multiplier on GPP: `ft0` when frozen (flag exactly 0),
/// 1 otherwise.
pub fn freeze_thaw_multiplier(ft: FloatValue, ft0: FloatValue) -> FloatValue {
    if ft == 0.0 {
        ft0
    } else {
        1.0
    }
}

/// NaN-ignoring minimum of each row of an (N x T) array (NaN if a row is all NaN)
pub fn nanmin_rows(x: ArrayView2<FloatValue>) -> ndarray::Array1<FloatValue> {
    x.rows()
        .into_iter()
        .map(|row| nanmin(row.iter().copied()))
        .collect()
}

/// NaN-ignoring minimum (NaN if every value is NaN)
pub fn nanmin(values: impl Iterator<Item = FloatValue>) -> FloatValue {
    values
        .filter(|v| !v.is_nan())
        .fold(FloatValue::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc })
}

/// Elementwise product of equally shaped multipliers
pub fn product(
    a: ArrayView2<FloatValue>,
    b: ArrayView2<FloatValue>,
) -> Array2<FloatValue> {
    Zip::from(a).and(b).map_collect(|&x, &y| x * y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use is_close::is_close;
    use ndarray::array;

    // ===== Linear ramp =====

    #[test]
    fn test_standard_ramp() {
        let f = LinearConstraint::new(257.3, 285.9, ConstraintForm::Standard).unwrap();
        assert_eq!(f.apply(250.0), 0.0);
        assert_eq!(f.apply(285.9), 1.0);
        assert_eq!(f.apply(300.0), 1.0);
        assert!(is_close!(f.apply(271.6), 0.5));
    }

    #[test]
    fn test_reversed_ramp() {
        let f = LinearConstraint::new(150.0, 4000.0, ConstraintForm::Reversed).unwrap();
        assert_eq!(f.apply(100.0), 1.0);
        assert_eq!(f.apply(4000.0), 0.0);
        assert_eq!(f.apply(5000.0), 0.0);
        assert!(is_close!(f.apply(2075.0), 0.5));
    }

    #[test]
    fn test_binary_ramp() {
        let f = LinearConstraint::new(0.78, 1.0, ConstraintForm::Binary).unwrap();
        assert_eq!(f.apply(1.0), 1.0);
        assert_eq!(f.apply(0.0), 0.78);
        assert_eq!(f.apply(0.5), 0.78);

        // Bounds are output values in binary form, so their order is free
        let g = LinearConstraint::new(1.0, 0.0, ConstraintForm::Binary).unwrap();
        assert_eq!(g.apply(1.0), 0.0);
    }

    #[test]
    fn test_invalid_bounds() {
        let err = LinearConstraint::new(1.0, 0.0, ConstraintForm::Standard).unwrap_err();
        assert_eq!(err, TcfError::InvalidConstraintBounds { xmin: 1.0, xmax: 0.0 });
        assert!(linear_constraint(1.0, 0.0, ConstraintForm::Reversed).is_err());
    }

    #[test]
    fn test_equal_bounds_is_a_step() {
        let f = LinearConstraint::new(0.3, 0.3, ConstraintForm::Standard).unwrap();
        assert_eq!(f.apply(0.29), 0.0);
        assert_eq!(f.apply(0.3), 1.0);
    }

    #[test]
    fn test_ramp_bounded_and_monotone() {
        let up = LinearConstraint::new(-3.0, 7.0, ConstraintForm::Standard).unwrap();
        let down = LinearConstraint::new(-3.0, 7.0, ConstraintForm::Reversed).unwrap();
        let mut last_up = FloatValue::NEG_INFINITY;
        let mut last_down = FloatValue::INFINITY;
        for i in 0..=200 {
            let x = -10.0 + 0.1 * i as FloatValue;
            let (u, d) = (up.apply(x), down.apply(x));
            assert!((0.0..=1.0).contains(&u), "{} out of range at {}", u, x);
            assert!((0.0..=1.0).contains(&d), "{} out of range at {}", d, x);
            assert!(u >= last_up, "Standard ramp decreased at {}", x);
            assert!(d <= last_down, "Reversed ramp increased at {}", x);
            last_up = u;
            last_down = d;
        }
    }

    #[test]
    fn test_ramp_nan_propagates() {
        let f = LinearConstraint::new(0.0, 1.0, ConstraintForm::Standard).unwrap();
        assert!(f.apply(FloatValue::NAN).is_nan());
    }

    #[test]
    fn test_ramp_array_uses_per_pixel_bounds() {
        let x = array![[0.5, 1.0], [0.5, 1.0]];
        let out = linear_constraint_array(
            x.view(),
            array![0.0, 0.5].view(),
            array![1.0, 1.5].view(),
            ConstraintForm::Standard,
        )
        .unwrap();
        assert_eq!(out, array![[0.5, 1.0], [0.0, 0.5]]);
    }

    #[test]
    fn test_ramp_array_checks_every_pixel() {
        let x = array![[0.5], [0.5]];
        let result = linear_constraint_array(
            x.view(),
            array![0.0, 2.0].view(),
            array![1.0, 1.0].view(),
            ConstraintForm::Standard,
        );
        assert!(matches!(
            result,
            Err(TcfError::InvalidConstraintBounds { .. })
        ));
    }

    #[test]
    fn test_ramp_array_bounds_cover_every_row() {
        let x = array![[0.5], [0.5], [0.5]];
        let result = linear_constraint_array(
            x.view(),
            array![0.0, 0.0, 0.0].view(),
            array![1.0, 1.0].view(),
            ConstraintForm::Standard,
        );
        assert_eq!(
            result.unwrap_err(),
            TcfError::PixelCountMismatch {
                what: "Upper ramp bound".to_string(),
                expected: 3,
                found: 2,
            }
        );
    }

    // ===== Arrhenius =====

    #[test]
    fn test_arrhenius_clamped() {
        // Warm soils give a raw exponential above 1
        assert_eq!(arrhenius(320.0, 242.47), 1.0);
        // At T = β1 + β2 the exponent is zero
        assert_relative_eq!(
            arrhenius(ARRHENIUS_BETA1 + ARRHENIUS_BETA2, 242.47),
            1.0,
            epsilon = 1e-12
        );
        for i in 0..200 {
            let t = 200.0 + i as FloatValue;
            let y = arrhenius(t, 242.47);
            assert!((0.0..=1.0).contains(&y), "{} out of range at {} K", y, t);
        }
    }

    #[test]
    fn test_arrhenius_value() {
        let t: FloatValue = 273.15;
        let expected = (242.47 * (1.0 / 66.02 - 1.0 / (t - 227.13))).exp();
        assert_relative_eq!(arrhenius(t, 242.47), expected, epsilon = 1e-12);
        assert!(expected > 0.0 && expected < 1.0);
    }

    #[test]
    fn test_arrhenius_increases_with_temperature() {
        assert!(arrhenius(263.15, 242.47) < arrhenius(283.15, 242.47));
    }

    #[test]
    fn test_arrhenius_array() {
        let tsoil = array![[273.15, 330.0], [273.15, 330.0]];
        let out = arrhenius_array(tsoil.view(), array![242.47, 265.06].view());
        assert_relative_eq!(out[[0, 0]], arrhenius(273.15, 242.47));
        assert_relative_eq!(out[[1, 0]], arrhenius(273.15, 265.06));
        assert_eq!(out[[0, 1]], 1.0);
    }

    // ===== Soil moisture =====

    #[test]
    fn test_rescale_smrz_endpoints() {
        assert_relative_eq!(rescale_smrz(0.2, 0.2, 1.0), 0.05, epsilon = 1e-12);
        assert_relative_eq!(rescale_smrz(1.0, 0.2, 1.0), 1.0, epsilon = 1e-12);
        // Clipped at both ends
        assert_relative_eq!(rescale_smrz(0.1, 0.2, 1.0), 0.05, epsilon = 1e-12);
        assert_relative_eq!(rescale_smrz(1.2, 0.2, 0.9), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rescale_smrz_amplifies_dry_end() {
        // Half way in the normalised range is well above half way in the output
        let mid = rescale_smrz(0.6, 0.2, 1.0);
        let expected = 0.05 + 0.95 * (51.0_f64.ln() / 101.0_f64.ln());
        assert_relative_eq!(mid, expected, epsilon = 1e-12);
        assert!(mid > 0.8);
    }

    #[test]
    fn test_rescale_smrz_array() {
        let smrz = array![[0.2, 1.0], [0.5, 1.0]];
        let out = rescale_smrz_array(smrz.view(), array![0.2, 0.5].view(), SMRZ_SATURATION);
        assert_relative_eq!(out[[0, 0]], 0.05, epsilon = 1e-12);
        assert_relative_eq!(out[[1, 0]], 0.05, epsilon = 1e-12);
        assert_relative_eq!(out[[1, 1]], 1.0, epsilon = 1e-12);
    }

    // ===== Freeze-thaw =====

    #[test]
    fn test_freeze_thaw_threshold() {
        assert_eq!(freeze_thaw_from_tmin(273.149), 0.0);
        assert_eq!(freeze_thaw_from_tmin(273.15), 1.0);
        assert_eq!(freeze_thaw_from_tmin(290.0), 1.0);
    }

    #[test]
    fn test_freeze_thaw_multiplier() {
        assert_eq!(freeze_thaw_multiplier(0.0, 0.78), 0.78);
        assert_eq!(freeze_thaw_multiplier(1.0, 0.78), 1.0);
    }

    // ===== Helpers =====

    #[test]
    fn test_nanmin_rows() {
        let x = array![[0.4, FloatValue::NAN, 0.2], [FloatValue::NAN, FloatValue::NAN, FloatValue::NAN]];
        let out = nanmin_rows(x.view());
        assert_eq!(out[0], 0.2);
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_serialization() {
        let f = LinearConstraint::new(0.0, 0.25, ConstraintForm::Reversed).unwrap();
        let json = serde_json::to_string(&f).expect("Serialization failed");
        assert!(json.contains("\"reversed\""));
        let parsed: LinearConstraint = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(parsed, f);
    }
}
