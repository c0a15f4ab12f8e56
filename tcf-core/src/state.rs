//! Soil organic carbon (SOC) state
//!
//! The only persistent state in TCF. Each pixel carries three SOC pools:
//!
//! ```text
//!    litterfall --f_met--> [METABOLIC] ----------> RH
//!        |
//!        +--(1-f_met)--> [STRUCTURAL] ---------> RH
//!                              |
//!                              | f_str (humification)
//!                              v
//!                        [RECALCITRANT] -------> RH
//! ```
//!
//! Only the latest values are retained; a forward run overwrites them daily.

use crate::errors::{TcfError, TcfResult};
use crate::{FloatValue, N_POOLS};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};

/// Soil organic carbon pool
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pool {
    /// Fast-cycling pool fed directly by litterfall
    Metabolic = 0,
    /// Medium pool fed by litterfall, partially humified on decomposition
    Structural = 1,
    /// Slow pool fed only by humification of the structural pool
    Recalcitrant = 2,
}

impl Pool {
    pub const ALL: [Pool; N_POOLS] = [Pool::Metabolic, Pool::Structural, Pool::Recalcitrant];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// SOC mass in each pool for each pixel, as a (3 x N) array in g C m-2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Array2<FloatValue>", into = "Array2<FloatValue>")]
pub struct SocState(Array2<FloatValue>);

impl SocState {
    /// Create a state from a (3 x N) array
    ///
    /// # Errors
    ///
    /// * [`TcfError::WrongPoolCount`] if the first axis is not of length 3
    /// * [`TcfError::NegativeSoc`] if any pool holds a negative mass
    pub fn new(soc: Array2<FloatValue>) -> TcfResult<Self> {
        if soc.nrows() != N_POOLS {
            return Err(TcfError::WrongPoolCount { found: soc.nrows() });
        }
        for ((pool, pixel), &value) in soc.indexed_iter() {
            if value < 0.0 {
                return Err(TcfError::NegativeSoc { pool, pixel, value });
            }
        }
        Ok(Self(soc))
    }

    /// Create a state from a flat list of pool values for a single pixel
    pub fn from_slice(pools: &[FloatValue]) -> TcfResult<Self> {
        if pools.len() != N_POOLS {
            return Err(TcfError::WrongPoolCount { found: pools.len() });
        }
        Self::new(Array1::from(pools.to_vec()).insert_axis(Axis(1)))
    }

    /// The same three pool values in every pixel
    pub fn uniform(pools: [FloatValue; N_POOLS], n_pixels: usize) -> TcfResult<Self> {
        Self::new(Array2::from_shape_fn((N_POOLS, n_pixels), |(p, _)| pools[p]))
    }

    pub fn n_pixels(&self) -> usize {
        self.0.ncols()
    }

    pub fn pool(&self, pool: Pool) -> ArrayView1<FloatValue> {
        self.0.row(pool.index())
    }

    /// Total SOC in each pixel
    pub fn total(&self) -> Array1<FloatValue> {
        self.0.sum_axis(Axis(0))
    }

    pub fn as_array(&self) -> ArrayView2<FloatValue> {
        self.0.view()
    }

    /// Mutable access for the forward-run engine
    pub fn as_array_mut(&mut self) -> ArrayViewMut2<FloatValue> {
        self.0.view_mut()
    }

    pub fn into_array(self) -> Array2<FloatValue> {
        self.0
    }
}

impl TryFrom<Array2<FloatValue>> for SocState {
    type Error = TcfError;

    fn try_from(soc: Array2<FloatValue>) -> TcfResult<Self> {
        Self::new(soc)
    }
}

impl From<SocState> for Array2<FloatValue> {
    fn from(state: SocState) -> Self {
        state.0
    }
}
