//! Seeded synthetic drivers for integration tests.
//!
//! Fields are drawn from Gaussian (and, for VPD, log-normal) distributions
//! with the mean and standard deviation of SMAP Level 4 Carbon inputs.

#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use ndarray::{Array2, Array3, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use tcf_components::drivers::DriverSeries;
use tcf_core::state::SocState;

pub const SEED: u64 = 406;

pub struct SyntheticData {
    /// Initial SOC (3 x N)
    pub soc: SocState,
    /// Drivers (8 x N x T) in stack order
    pub cube: Array3<f64>,
}

impl SyntheticData {
    pub fn drivers(&self) -> DriverSeries {
        DriverSeries::from_stack(self.cube.view()).unwrap()
    }
}

fn draw<D: Distribution<f64>>(
    rng: &mut ChaCha8Rng,
    dist: D,
    n_pixels: usize,
    n_steps: usize,
) -> Array2<f64> {
    Array2::from_shape_simple_fn((n_pixels, n_steps), || dist.sample(&mut *rng))
}

/// Values outside [0, 1] are treated as missing and set to 0
fn zero_outside_unit(x: Array2<f64>) -> Array2<f64> {
    x.mapv(|v| if (0.0..=1.0).contains(&v) { v } else { 0.0 })
}

/// Generate a synthetic driver cube and initial SOC state.
///
/// With `seasonal_cycle`, fPAR and the temperature anomalies from freezing
/// are scaled by a half-sine over the first 365 days.
pub fn synthetic_data(
    n_pixels: usize,
    n_steps: usize,
    seed: u64,
    seasonal_cycle: bool,
) -> SyntheticData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut soc = Array2::zeros((3, n_pixels));
    for (p, (lo, hi)) in [(17, 50), (15, 72), (128, 6569)].into_iter().enumerate() {
        for i in 0..n_pixels {
            soc[[p, i]] = rng.gen_range(lo..hi) as f64;
        }
    }

    let normal = |mean: f64, std: f64| Normal::new(mean, std).unwrap();
    let mut fpar = zero_outside_unit(draw(&mut rng, normal(0.46, 0.24), n_pixels, n_steps));
    let par = draw(&mut rng, normal(6.8, 3.9), n_pixels, n_steps).mapv(|v| v.max(0.0));
    let mut tmin = draw(&mut rng, normal(278.5, 12.3), n_pixels, n_steps);
    let vpd = draw(&mut rng, LogNormal::new(5.4, 1.4).unwrap(), n_pixels, n_steps);
    let smrz = zero_outside_unit(draw(&mut rng, normal(0.77, 0.15), n_pixels, n_steps));
    let ft = Array2::from_shape_simple_fn((n_pixels, n_steps), || {
        if rng.gen_bool(0.5) {
            1.0
        } else {
            0.0
        }
    });
    let mut tsoil = draw(&mut rng, normal(284.0, 10.0), n_pixels, n_steps);
    let smsf = zero_outside_unit(draw(&mut rng, normal(0.50, 0.21), n_pixels, n_steps));

    if seasonal_cycle && n_steps >= 365 {
        for t in 0..n_steps {
            let cycle = (std::f64::consts::PI * t as f64 / 365.0).sin();
            fpar.column_mut(t).mapv_inplace(|v| v * cycle);
            tmin
                .column_mut(t)
                .mapv_inplace(|v| 273.15 + (v - 273.15) * cycle);
            tsoil
                .column_mut(t)
                .mapv_inplace(|v| 273.15 + (v - 273.15) * cycle);
        }
    }

    let fields = [fpar, par, tmin, vpd, smrz, ft, tsoil, smsf];
    let views: Vec<_> = fields.iter().map(|f| f.view()).collect();
    SyntheticData {
        soc: SocState::new(soc).unwrap(),
        cube: ndarray::stack(Axis(0), &views).unwrap(),
    }
}

/// One date per step, starting on 1 January 2023
pub fn daily_dates(n_steps: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..n_steps as u64)
        .map(|d| start.checked_add_days(Days::new(d)).unwrap())
        .collect()
}

/// Linear-interpolated percentile, as used for summary checks
pub fn percentile(values: impl Iterator<Item = f64>, q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
