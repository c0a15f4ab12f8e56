//! Meteorological driver containers
//!
//! Each container has a fixed rank: `*Step` types hold one value per pixel
//! (length N), `*Series` types hold a daily series per pixel (N x T). Drivers
//! arriving as a single stacked array can be split with `from_stack`, which
//! expects the fields in this order:
//!
//! | index | field  | unit                 |
//! |-------|--------|----------------------|
//! | 0     | fPAR   | fraction             |
//! | 1     | PAR    | MJ m-2 day-1         |
//! | 2     | Tmin   | K                    |
//! | 3     | VPD    | Pa                   |
//! | 4     | SMRZ   | proportion saturated |
//! | 5     | FT     | 0 frozen, 1 thawed   |
//! | 6     | Tsoil  | K                    |
//! | 7     | SMSF   | proportion saturated |
//!
//! GPP-only stacks carry the first 5 or 6 fields; when FT is omitted it is
//! derived from Tmin.

use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2};
use tcf_core::climatology::climatology365;
use tcf_core::constraints::freeze_thaw_from_tmin;
use tcf_core::errors::{TcfError, TcfResult};
use tcf_core::FloatValue;

const GPP_FIELDS: [&str; 6] = ["fpar", "par", "tmin", "vpd", "smrz", "ft"];
const SOIL_FIELDS: [&str; 2] = ["tsoil", "smsf"];

fn field_count_error(interface: &str, expected: &str, found: usize) -> TcfError {
    TcfError::DriverFieldCount {
        interface: interface.to_string(),
        expected: expected.to_string(),
        found,
    }
}

/// Check that an array covers every pixel of the land-cover map
pub(crate) fn check_pixel_count(what: &str, expected: usize, found: usize) -> TcfResult<()> {
    if expected != found {
        return Err(TcfError::PixelCountMismatch {
            what: what.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Check that every named field has the shape of the first one
fn check_shapes<'a>(fields: impl IntoIterator<Item = (&'a str, &'a [usize])>) -> TcfResult<()> {
    let mut expected: Option<&[usize]> = None;
    for (name, shape) in fields {
        match expected {
            None => expected = Some(shape),
            Some(e) if e != shape => {
                return Err(TcfError::DriverShapeMismatch {
                    field: name.to_string(),
                    expected: e.to_vec(),
                    found: shape.to_vec(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Drivers of GPP over a series of days (N x T)
#[derive(Debug, Clone, PartialEq)]
pub struct GppSeries {
    pub fpar: Array2<FloatValue>,
    pub par: Array2<FloatValue>,
    pub tmin: Array2<FloatValue>,
    pub vpd: Array2<FloatValue>,
    pub smrz: Array2<FloatValue>,
    /// Freeze-thaw flag; derived from `tmin` when absent
    pub ft: Option<Array2<FloatValue>>,
}

impl GppSeries {
    /// Split a (fields x N x T) stack of 5 or 6 fields
    pub fn from_stack(stack: ArrayView3<FloatValue>) -> TcfResult<Self> {
        let n_fields = stack.len_of(Axis(0));
        if n_fields != 5 && n_fields != 6 {
            return Err(field_count_error("GPP", "5 or 6", n_fields));
        }
        let field = |i: usize| stack.index_axis(Axis(0), i).to_owned();
        Ok(Self {
            fpar: field(0),
            par: field(1),
            tmin: field(2),
            vpd: field(3),
            smrz: field(4),
            ft: (n_fields == 6).then(|| field(5)),
        })
    }

    pub fn n_pixels(&self) -> usize {
        self.fpar.nrows()
    }

    pub fn n_steps(&self) -> usize {
        self.fpar.ncols()
    }

    /// Check that every field has the same (N x T) shape
    pub fn validate(&self) -> TcfResult<()> {
        let mut fields = vec![
            (GPP_FIELDS[0], self.fpar.shape()),
            (GPP_FIELDS[1], self.par.shape()),
            (GPP_FIELDS[2], self.tmin.shape()),
            (GPP_FIELDS[3], self.vpd.shape()),
            (GPP_FIELDS[4], self.smrz.shape()),
        ];
        if let Some(ft) = &self.ft {
            fields.push((GPP_FIELDS[5], ft.shape()));
        }
        check_shapes(fields)
    }

    /// The freeze-thaw flag, supplied or derived from `tmin`
    pub fn freeze_thaw(&self) -> Array2<FloatValue> {
        match &self.ft {
            Some(ft) => ft.clone(),
            None => self.tmin.mapv(freeze_thaw_from_tmin),
        }
    }
}

/// Drivers of GPP on a single day (length N)
#[derive(Debug, Clone, PartialEq)]
pub struct GppStep {
    pub fpar: Array1<FloatValue>,
    pub par: Array1<FloatValue>,
    pub tmin: Array1<FloatValue>,
    pub vpd: Array1<FloatValue>,
    pub smrz: Array1<FloatValue>,
    pub ft: Option<Array1<FloatValue>>,
    /// Historical minimum SMRZ of each pixel. Without it, the minimum across
    /// the supplied pixels is used.
    pub smrz_min: Option<Array1<FloatValue>>,
}

impl GppStep {
    /// Split a (fields x N) stack of 5 or 6 fields
    pub fn from_stack(stack: ArrayView2<FloatValue>) -> TcfResult<Self> {
        let n_fields = stack.nrows();
        if n_fields != 5 && n_fields != 6 {
            return Err(field_count_error("GPP", "5 or 6", n_fields));
        }
        let field = |i: usize| stack.row(i).to_owned();
        Ok(Self {
            fpar: field(0),
            par: field(1),
            tmin: field(2),
            vpd: field(3),
            smrz: field(4),
            ft: (n_fields == 6).then(|| field(5)),
            smrz_min: None,
        })
    }

    pub fn with_smrz_min(mut self, smrz_min: Array1<FloatValue>) -> Self {
        self.smrz_min = Some(smrz_min);
        self
    }

    pub fn n_pixels(&self) -> usize {
        self.fpar.len()
    }

    pub fn validate(&self) -> TcfResult<()> {
        let mut fields = vec![
            (GPP_FIELDS[0], self.fpar.shape()),
            (GPP_FIELDS[1], self.par.shape()),
            (GPP_FIELDS[2], self.tmin.shape()),
            (GPP_FIELDS[3], self.vpd.shape()),
            (GPP_FIELDS[4], self.smrz.shape()),
        ];
        if let Some(ft) = &self.ft {
            fields.push((GPP_FIELDS[5], ft.shape()));
        }
        if let Some(smrz_min) = &self.smrz_min {
            fields.push(("smrz_min", smrz_min.shape()));
        }
        check_shapes(fields)
    }

    /// View the step as a one-day series
    pub fn to_series(&self) -> GppSeries {
        let column = |a: &Array1<FloatValue>| a.clone().insert_axis(Axis(1));
        GppSeries {
            fpar: column(&self.fpar),
            par: column(&self.par),
            tmin: column(&self.tmin),
            vpd: column(&self.vpd),
            smrz: column(&self.smrz),
            ft: self.ft.as_ref().map(column),
        }
    }
}

/// Drivers of soil respiration on a single day (length N)
#[derive(Debug, Clone, PartialEq)]
pub struct SoilStep {
    pub tsoil: Array1<FloatValue>,
    pub smsf: Array1<FloatValue>,
}

impl SoilStep {
    /// Split a (2 x N) stack of Tsoil and SMSF.
    ///
    /// Respiration is a single-step calculation, so a stack with a time axis
    /// is rejected with [`TcfError::DriverDimensionality`].
    pub fn from_stack(stack: ArrayViewD<FloatValue>) -> TcfResult<Self> {
        let ndim = stack.ndim();
        let stack = stack
            .into_dimensionality::<Ix2>()
            .map_err(|_| TcfError::DriverDimensionality {
                interface: "RH".to_string(),
                expected: 2,
                found: ndim,
            })?;
        if stack.nrows() != SOIL_FIELDS.len() {
            return Err(field_count_error("RH", "2", stack.nrows()));
        }
        Ok(Self {
            tsoil: stack.row(0).to_owned(),
            smsf: stack.row(1).to_owned(),
        })
    }

    pub fn n_pixels(&self) -> usize {
        self.tsoil.len()
    }

    pub fn validate(&self) -> TcfResult<()> {
        check_shapes([
            (SOIL_FIELDS[0], self.tsoil.shape()),
            (SOIL_FIELDS[1], self.smsf.shape()),
        ])
    }

    pub fn to_series(&self) -> SoilSeries {
        SoilSeries {
            tsoil: self.tsoil.clone().insert_axis(Axis(1)),
            smsf: self.smsf.clone().insert_axis(Axis(1)),
        }
    }
}

/// Drivers of soil respiration over a series of days (N x T)
#[derive(Debug, Clone, PartialEq)]
pub struct SoilSeries {
    pub tsoil: Array2<FloatValue>,
    pub smsf: Array2<FloatValue>,
}

impl SoilSeries {
    /// Split a (2 x N x T) stack of Tsoil and SMSF
    pub fn from_stack(stack: ArrayView3<FloatValue>) -> TcfResult<Self> {
        let n_fields = stack.len_of(Axis(0));
        if n_fields != SOIL_FIELDS.len() {
            return Err(field_count_error("RH", "2", n_fields));
        }
        Ok(Self {
            tsoil: stack.index_axis(Axis(0), 0).to_owned(),
            smsf: stack.index_axis(Axis(0), 1).to_owned(),
        })
    }

    pub fn n_pixels(&self) -> usize {
        self.tsoil.nrows()
    }

    pub fn n_steps(&self) -> usize {
        self.tsoil.ncols()
    }

    pub fn validate(&self) -> TcfResult<()> {
        check_shapes([
            (SOIL_FIELDS[0], self.tsoil.shape()),
            (SOIL_FIELDS[1], self.smsf.shape()),
        ])
    }
}

/// All eight drivers over a series of days (N x T)
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSeries {
    pub gpp: GppSeries,
    pub soil: SoilSeries,
}

impl DriverSeries {
    /// Split an (8 x N x T) driver cube
    pub fn from_stack(stack: ArrayView3<FloatValue>) -> TcfResult<Self> {
        let n_fields = stack.len_of(Axis(0));
        if n_fields != 8 {
            return Err(field_count_error("Forward run", "8", n_fields));
        }
        Ok(Self {
            gpp: GppSeries::from_stack(stack.slice(ndarray::s![..6, .., ..]))?,
            soil: SoilSeries::from_stack(stack.slice(ndarray::s![6.., .., ..]))?,
        })
    }

    pub fn n_pixels(&self) -> usize {
        self.gpp.n_pixels()
    }

    pub fn n_steps(&self) -> usize {
        self.gpp.n_steps()
    }

    /// Check that every field, GPP and soil, has the same (N x T) shape
    pub fn validate(&self) -> TcfResult<()> {
        self.gpp.validate()?;
        self.soil.validate()?;
        check_shapes([
            (GPP_FIELDS[0], self.gpp.fpar.shape()),
            (SOIL_FIELDS[0], self.soil.tsoil.shape()),
        ])
    }

    /// Mean annual cycle (N x 365) of every field.
    ///
    /// The freeze-thaw flag is averaged like the other fields, so any day that
    /// was thawed in at least one year has a non-zero flag.
    pub fn climatology(&self, dates: &[NaiveDate]) -> TcfResult<DriverSeries> {
        let clim = |x: &Array2<FloatValue>| climatology365(x.view(), dates);
        Ok(DriverSeries {
            gpp: GppSeries {
                fpar: clim(&self.gpp.fpar)?,
                par: clim(&self.gpp.par)?,
                tmin: clim(&self.gpp.tmin)?,
                vpd: clim(&self.gpp.vpd)?,
                smrz: clim(&self.gpp.smrz)?,
                ft: Some(clim(&self.gpp.freeze_thaw())?),
            },
            soil: SoilSeries {
                tsoil: clim(&self.soil.tsoil)?,
                smsf: clim(&self.soil.smsf)?,
            },
        })
    }
}

/// All eight drivers on a single day (length N)
#[derive(Debug, Clone, PartialEq)]
pub struct DriverStep {
    pub gpp: GppStep,
    pub soil: SoilStep,
}

impl DriverStep {
    /// Split an (8 x N) driver stack
    pub fn from_stack(stack: ArrayView2<FloatValue>) -> TcfResult<Self> {
        let n_fields = stack.nrows();
        if n_fields != 8 {
            return Err(field_count_error("NEE", "8", n_fields));
        }
        Ok(Self {
            gpp: GppStep::from_stack(stack.slice(ndarray::s![..6, ..]))?,
            soil: SoilStep::from_stack(stack.slice(ndarray::s![6.., ..]).into_dyn())?,
        })
    }

    pub fn n_pixels(&self) -> usize {
        self.gpp.n_pixels()
    }

    pub fn validate(&self) -> TcfResult<()> {
        self.gpp.validate()?;
        self.soil.validate()?;
        check_shapes([
            (GPP_FIELDS[0], self.gpp.fpar.shape()),
            (SOIL_FIELDS[0], self.soil.tsoil.shape()),
        ])
    }
}
