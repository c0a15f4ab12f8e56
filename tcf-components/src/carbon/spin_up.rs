//! Spin-up of the SOC pools to a dynamic steady state
//!
//! The mean annual cycle of the drivers is replayed through the forward run,
//! one 365-day climatological year per cycle, without resetting the pools in
//! between. After each cycle the annual NEE sum of every pixel is compared
//! with the previous cycle's; spin-up stops once every pixel changes by less
//! than the threshold, or after `max_cycles` cycles. Reaching the cap is not
//! an error: [`SpinUpReport::converged`] says which happened.

use crate::carbon::engine::{forward_run, RunOptions};
use crate::drivers::DriverSeries;
use crate::parameters::VectorizedParameters;
use chrono::NaiveDate;
use log::{debug, info, warn};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tcf_core::climatology::climatological_year;
use tcf_core::errors::{TcfError, TcfResult};
use tcf_core::state::SocState;
use tcf_core::FloatValue;

/// Configuration of the spin-up loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinUpConfig {
    /// Maximum number of climatological years to run
    /// default: 100
    pub max_cycles: usize,

    /// Largest change in annual NEE, in any pixel, accepted as steady state
    /// unit: g C m-2 year-1
    /// default: 1.0
    pub threshold: FloatValue,
}

impl Default for SpinUpConfig {
    fn default() -> Self {
        Self {
            max_cycles: 100,
            threshold: 1.0,
        }
    }
}

impl SpinUpConfig {
    pub fn validate(&self) -> TcfResult<()> {
        if self.max_cycles == 0 {
            return Err(TcfError::InvalidConfig(
                "max_cycles must be at least 1".to_string(),
            ));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(TcfError::InvalidConfig(format!(
                "threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of a spin-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinUpReport {
    /// Change in annual NEE of each pixel (N x cycles), previous cycle minus
    /// current cycle. The first column is NaN: there is nothing to compare
    /// the first cycle against.
    pub history: Array2<FloatValue>,
    /// Number of cycles run
    pub cycles: usize,
    /// Whether every pixel came within the threshold before the cycle cap
    pub converged: bool,
}

impl SpinUpReport {
    /// Change in annual NEE of each pixel in the last cycle
    pub fn last_change(&self) -> Array1<FloatValue> {
        self.history.column(self.cycles - 1).to_owned()
    }
}

fn nansum_rows(x: &Array2<FloatValue>) -> Array1<FloatValue> {
    x.map_axis(Axis(1), |row| row.iter().filter(|v| !v.is_nan()).sum())
}

/// Spin up `soc` by replaying the climatology of `drivers`.
///
/// # Arguments
///
/// * `dates` - Date of each time step of `drivers`; together they must cover
///   every day of the year
/// * `drivers` - (N x T) drivers from which the climatology is built
/// * `config` - Cycle cap and convergence threshold
///
/// Litterfall is derived from the climatology if not already set. The SMRZ
/// minimum used to rescale root-zone soil moisture is also taken from the
/// climatology, which is smoother than the raw series, so `f_smrz` can differ
/// from a [`forward_run`] over the raw drivers.
pub fn spin_up(
    params: &VectorizedParameters,
    litterfall: &mut Option<Array1<FloatValue>>,
    soc: &mut SocState,
    dates: &[NaiveDate],
    drivers: &DriverSeries,
    config: &SpinUpConfig,
) -> TcfResult<SpinUpReport> {
    config.validate()?;
    drivers.validate()?;
    let climatology = drivers.climatology(dates)?;
    let year = climatological_year();

    let mut history = Array2::from_elem((params.n_pixels(), config.max_cycles), FloatValue::NAN);
    let mut last_sum: Option<Array1<FloatValue>> = None;
    let mut cycles = 0;
    let mut converged = false;

    while cycles < config.max_cycles {
        let output = forward_run(
            params,
            litterfall,
            soc,
            &climatology,
            RunOptions::new().with_dates(&year),
        )?;
        let nee_sum = nansum_rows(&output.nee);
        cycles += 1;

        if let Some(last) = last_sum.as_ref() {
            let change = last - &nee_sum;
            let largest = change.iter().fold(0.0, |m: FloatValue, c| m.max(c.abs()));
            debug!(
                "Spin-up cycle {}: largest change in annual NEE {:.4} g C m-2",
                cycles, largest
            );
            converged = change.iter().all(|c| c.abs() < config.threshold);
            history.column_mut(cycles - 1).assign(&change);
        }
        last_sum = Some(nee_sum);
        if converged {
            break;
        }
    }

    if converged {
        info!("Spin-up converged after {} cycles", cycles);
    } else {
        warn!(
            "Spin-up did not converge within {} cycles (threshold {} g C m-2 year-1)",
            cycles, config.threshold
        );
    }

    Ok(SpinUpReport {
        history: history.slice(s![.., ..cycles]).to_owned(),
        cycles,
        converged,
    })
}
