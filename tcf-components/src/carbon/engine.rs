//! Forward run: daily integration of the SOC pools
//!
//! GPP and the environmental constraints on decomposition do not depend on
//! the SOC state, so they are calculated for the whole run up front. The pools
//! are then stepped one day at a time:
//!
//! $$ \Delta C_{met} = L f_{met} - RH_{met} $$
//! $$ \Delta C_{str} = L (1 - f_{met}) - RH_{str} $$
//! $$ \Delta C_{rec} = f_{str} RH_{str} - RH_{rec} $$
//!
//! where $L$ is the daily litterfall. A NaN change (from missing drivers)
//! leaves that pool unchanged. After the update the structural-pool RH is
//! reduced by the humified fraction $f_{str}$, and
//! $NEE = \sum_p RH_p - NPP$ with $NPP = CUE \times GPP$.
//!
//! Litterfall is a constant daily fraction of the mean annual NPP. If it was
//! not supplied it is derived from the run's own NPP, which needs at least one
//! full year of dated steps.

use crate::carbon::gpp::gpp_series;
use crate::carbon::respiration::{decompose, humify, soil_constraints};
use crate::drivers::{check_pixel_count, DriverSeries};
use crate::observer::StepObserver;
use crate::parameters::VectorizedParameters;
use chrono::NaiveDate;
use log::debug;
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use serde::Serialize;
use tcf_core::climatology::{climatology365, DAYS_PER_YEAR};
use tcf_core::constraints::nanmin_rows;
use tcf_core::errors::{TcfError, TcfResult};
use tcf_core::state::{Pool, SocState};
use tcf_core::{FloatValue, N_POOLS};

/// Daily fluxes from a forward run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardOutput {
    /// Net ecosystem exchange (N x T), positive for a net release to the
    /// atmosphere
    pub nee: Array2<FloatValue>,
    /// Gross primary production (N x T)
    pub gpp: Array2<FloatValue>,
    /// Heterotrophic respiration of each pool (3 x N x T)
    pub rh: Array3<FloatValue>,
}

impl ForwardOutput {
    /// Total RH (N x T), summed over the pools
    pub fn total_rh(&self) -> Array2<FloatValue> {
        self.rh.sum_axis(Axis(0))
    }

    pub fn n_steps(&self) -> usize {
        self.nee.ncols()
    }
}

/// Options for a single forward run
#[derive(Default)]
pub struct RunOptions<'a> {
    /// Date of each time step; required to derive litterfall
    pub dates: Option<&'a [NaiveDate]>,
    /// Use each day's NPP as that day's litterfall, so that RH balances NPP
    /// in the steady state
    pub dynamic_litter: bool,
    /// Notified after each completed day
    pub observer: Option<&'a mut dyn StepObserver>,
}

impl<'a> RunOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dates(mut self, dates: &'a [NaiveDate]) -> Self {
        self.dates = Some(dates);
        self
    }

    pub fn with_dynamic_litter(mut self, dynamic_litter: bool) -> Self {
        self.dynamic_litter = dynamic_litter;
        self
    }

    pub fn with_observer(mut self, observer: &'a mut dyn StepObserver) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Daily litterfall (length N) as the sum of the NPP climatology spread
/// evenly over the year.
///
/// # Errors
///
/// * [`TcfError::DateCountMismatch`] if there is not one date per step
/// * [`TcfError::TooFewSteps`] if fewer than 365 steps are supplied
/// * [`TcfError::IncompleteClimatology`] if some day of the year is missing
pub fn litterfall_from_npp(
    npp: ArrayView2<FloatValue>,
    dates: &[NaiveDate],
) -> TcfResult<Array1<FloatValue>> {
    let n_steps = npp.ncols();
    if dates.len() != n_steps {
        return Err(TcfError::DateCountMismatch {
            dates: dates.len(),
            steps: n_steps,
        });
    }
    if n_steps < DAYS_PER_YEAR {
        return Err(TcfError::TooFewSteps { found: n_steps });
    }
    let annual_npp = climatology365(npp, dates)?.sum_axis(Axis(1));
    Ok(annual_npp / DAYS_PER_YEAR as FloatValue)
}

/// Run the model forward over every time step of `drivers`, updating `soc`
/// in place.
///
/// If `litterfall` is `None` it is derived from this run's NPP and stored, so
/// later runs reuse it. This happens in dynamic-litter mode too, even though
/// the daily update then uses each day's NPP instead.
///
/// # Errors
///
/// * [`TcfError::MissingLitterfall`] if litterfall has to be derived but no
///   dates were given, or [`TcfError::TooFewSteps`] /
///   [`TcfError::DateCountMismatch`] if they do not cover a year
/// * [`TcfError::PixelCountMismatch`] if the drivers, state or litterfall do
///   not have one entry per pixel
/// * [`TcfError::DriverShapeMismatch`] if the driver fields disagree in shape
///
/// Nothing is modified when an error is returned.
pub fn forward_run(
    params: &VectorizedParameters,
    litterfall: &mut Option<Array1<FloatValue>>,
    soc: &mut SocState,
    drivers: &DriverSeries,
    options: RunOptions,
) -> TcfResult<ForwardOutput> {
    let RunOptions {
        dates,
        dynamic_litter,
        mut observer,
    } = options;

    drivers.validate()?;
    let n_pixels = params.n_pixels();
    let n_steps = drivers.n_steps();
    check_pixel_count("Driver data", n_pixels, drivers.n_pixels())?;
    check_pixel_count("SOC state", n_pixels, soc.n_pixels())?;
    if let Some(litter) = litterfall.as_ref() {
        check_pixel_count("Litterfall", n_pixels, litter.len())?;
    } else {
        let dates = dates.ok_or(TcfError::MissingLitterfall)?;
        if n_steps < DAYS_PER_YEAR {
            return Err(TcfError::TooFewSteps { found: n_steps });
        }
        if dates.len() != n_steps {
            return Err(TcfError::DateCountMismatch {
                dates: dates.len(),
                steps: n_steps,
            });
        }
    }

    let smrz_min = nanmin_rows(drivers.gpp.smrz.view());
    let gpp = gpp_series(params, &drivers.gpp, smrz_min.view())?;
    let npp = Array2::from_shape_fn(gpp.raw_dim(), |(i, t)| params.cue[i] * gpp[[i, t]]);
    let kmult = soil_constraints(params, &drivers.soil)?.kmult();

    let litter = match litterfall.as_ref() {
        Some(litter) => litter.clone(),
        None => {
            let litter = litterfall_from_npp(npp.view(), dates.unwrap_or_default())?;
            debug!(
                "Derived litterfall from {} days of NPP; mean {:.4} g C m-2 day-1",
                n_steps,
                litter.mean().unwrap_or(FloatValue::NAN)
            );
            *litterfall = Some(litter.clone());
            litter
        }
    };

    let met = Pool::Metabolic.index();
    let stc = Pool::Structural.index();
    let rec = Pool::Recalcitrant.index();

    let mut rh = Array3::zeros((N_POOLS, n_pixels, n_steps));
    let mut nee = Array2::zeros((n_pixels, n_steps));
    let mut pools = soc.as_array_mut();
    for t in 0..n_steps {
        let daily_litter = if dynamic_litter {
            npp.column(t)
        } else {
            litter.view()
        };
        let mut rh_t = decompose(params.decay_rates.view(), kmult.column(t), pools.view());

        for i in 0..n_pixels {
            let f_met = params.f_metabolic[i];
            let deltas = [
                (met, daily_litter[i] * f_met - rh_t[[met, i]]),
                (stc, daily_litter[i] * (1.0 - f_met) - rh_t[[stc, i]]),
                (rec, params.f_structural[i] * rh_t[[stc, i]] - rh_t[[rec, i]]),
            ];
            for (p, delta) in deltas {
                if !delta.is_nan() {
                    pools[[p, i]] += delta;
                }
            }
        }

        humify(&mut rh_t, params.f_structural.view());
        for i in 0..n_pixels {
            nee[[i, t]] = rh_t.column(i).sum() - npp[[i, t]];
        }
        rh.index_axis_mut(Axis(2), t).assign(&rh_t);

        if let Some(observer) = observer.as_deref_mut() {
            observer.on_step(t + 1, n_steps);
        }
    }

    Ok(ForwardOutput { nee, gpp, rh })
}
