//! Mean annual cycles of daily data
//!
//! A climatology maps every date onto one of 365 day-of-year slots and
//! averages the observations in each slot. Leap days are dropped and the
//! remaining days of a leap year shift down by one, so 31 December is always
//! slot 365.

use crate::errors::{TcfError, TcfResult};
use crate::FloatValue;
use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, ArrayView2};

/// Number of days in the climatological year
pub const DAYS_PER_YEAR: usize = 365;

/// Zero-based ordinal of 29 February
const LEAP_DAY_ORDINAL0: u32 = 59;

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Zero-based climatological slot of a date, or `None` for 29 February
pub fn climatology_slot(date: &NaiveDate) -> Option<usize> {
    let ordinal0 = date.ordinal0();
    if is_leap_year(date.year()) {
        if ordinal0 == LEAP_DAY_ORDINAL0 {
            return None;
        }
        if ordinal0 > LEAP_DAY_ORDINAL0 {
            return Some((ordinal0 - 1) as usize);
        }
    }
    Some(ordinal0 as usize)
}

/// Mean daily value for each day of the year.
///
/// # Arguments
///
/// * `series` - (N x T) daily values for N pixels
/// * `dates` - The date of each of the T time steps
///
/// # Returns
///
/// An (N x 365) array. Each entry is the NaN-ignoring mean of the observations
/// on that day of the year, or NaN if all of them are NaN.
///
/// # Errors
///
/// * [`TcfError::DateCountMismatch`] if `dates` does not have one date per step
/// * [`TcfError::IncompleteClimatology`] if some day of the year never occurs
pub fn climatology365(
    series: ArrayView2<FloatValue>,
    dates: &[NaiveDate],
) -> TcfResult<Array2<FloatValue>> {
    let (n_pixels, n_steps) = series.dim();
    if dates.len() != n_steps {
        return Err(TcfError::DateCountMismatch {
            dates: dates.len(),
            steps: n_steps,
        });
    }

    let mut sums = Array2::<FloatValue>::zeros((n_pixels, DAYS_PER_YEAR));
    let mut counts = Array2::<usize>::zeros((n_pixels, DAYS_PER_YEAR));
    let mut seen = [false; DAYS_PER_YEAR];

    for (t, date) in dates.iter().enumerate() {
        let Some(slot) = climatology_slot(date) else {
            continue;
        };
        seen[slot] = true;
        for i in 0..n_pixels {
            let value = series[[i, t]];
            if !value.is_nan() {
                sums[[i, slot]] += value;
                counts[[i, slot]] += 1;
            }
        }
    }

    if let Some(missing) = seen.iter().position(|s| !s) {
        return Err(TcfError::IncompleteClimatology { day: missing + 1 });
    }

    Ok(Array2::from_shape_fn((n_pixels, DAYS_PER_YEAR), |(i, d)| {
        match counts[[i, d]] {
            0 => FloatValue::NAN,
            n => sums[[i, d]] / n as FloatValue,
        }
    }))
}

/// Dates of a single non-leap year, one per climatological slot.
///
/// Used to replay a climatology through a forward run.
pub fn climatological_year() -> Vec<NaiveDate> {
    // NaiveDate::default() is 1970-01-01, which is not a leap year
    NaiveDate::default()
        .iter_days()
        .take(DAYS_PER_YEAR)
        .collect()
}
