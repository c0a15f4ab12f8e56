//! The TCF model
//!
//! [`Tcf`] owns the vectorized parameters, the land-cover map and, once
//! known, the SOC state and daily litterfall. Its methods are the entry
//! points of the model, one per driver shape:
//!
//! | Method                | Drivers       | Result                 |
//! |-----------------------|---------------|------------------------|
//! | [`Tcf::gpp_step`]     | [`GppStep`]   | GPP (N)                |
//! | [`Tcf::gpp_series`]   | [`GppSeries`] | GPP (N x T)            |
//! | [`Tcf::rh_step`]      | [`SoilStep`]  | RH (3 x N)             |
//! | [`Tcf::rh_series`]    | [`SoilSeries`]| RH (3 x N x T)         |
//! | [`Tcf::nee_step`]     | [`DriverStep`]| NEE (N)                |
//! | [`Tcf::forward_run`]  | [`DriverSeries`] | NEE, GPP, RH over T |
//! | [`Tcf::spin_up`]      | [`DriverSeries`] | spin-up report      |
//!
//! Single-pixel kernels live in [`crate::carbon::gpp::gpp_pixel`] and
//! [`crate::carbon::respiration::rh_pixel`].

use crate::carbon::engine::{self, ForwardOutput, RunOptions};
use crate::carbon::gpp::{self, GppConstraints};
use crate::carbon::respiration::{self, SoilConstraints};
use crate::carbon::spin_up::{self, SpinUpConfig, SpinUpReport};
use crate::drivers::{
    check_pixel_count, DriverSeries, DriverStep, GppSeries, GppStep, SoilSeries, SoilStep,
};
use crate::parameters::{ParameterTable, VectorizedParameters};
use chrono::NaiveDate;
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use tcf_core::constraints::{nanmin, nanmin_rows};
use tcf_core::errors::{TcfError, TcfResult};
use tcf_core::land_cover::LandCoverMap;
use tcf_core::state::SocState;
use tcf_core::FloatValue;

/// Terrestrial Carbon Flux model for N pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Tcf {
    params: VectorizedParameters,
    land_cover: LandCoverMap,
    state: Option<SocState>,
    litterfall: Option<Array1<FloatValue>>,
}

impl Tcf {
    /// Create a model by expanding `table` over `land_cover`.
    ///
    /// # Errors
    ///
    /// Any error from [`ParameterTable::vectorize`].
    pub fn new(table: &ParameterTable, land_cover: LandCoverMap) -> TcfResult<Self> {
        let params = table.vectorize(&land_cover)?;
        Ok(Self {
            params,
            land_cover,
            state: None,
            litterfall: None,
        })
    }

    /// Set the initial SOC state, used by calls that are not given one
    pub fn with_state(mut self, state: SocState) -> TcfResult<Self> {
        check_pixel_count("SOC state", self.n_pixels(), state.n_pixels())?;
        self.state = Some(state);
        Ok(self)
    }

    /// Set the daily litterfall (g C m-2 day-1) of each pixel
    pub fn with_litterfall(mut self, litterfall: Array1<FloatValue>) -> TcfResult<Self> {
        check_pixel_count("Litterfall", self.n_pixels(), litterfall.len())?;
        self.litterfall = Some(litterfall);
        Ok(self)
    }

    pub fn n_pixels(&self) -> usize {
        self.land_cover.n_pixels()
    }

    pub fn parameters(&self) -> &VectorizedParameters {
        &self.params
    }

    pub fn land_cover(&self) -> &LandCoverMap {
        &self.land_cover
    }

    /// The current SOC state, if one was set
    pub fn state(&self) -> Option<&SocState> {
        self.state.as_ref()
    }

    /// Take the SOC state out of the model
    pub fn take_state(&mut self) -> Option<SocState> {
        self.state.take()
    }

    /// The daily litterfall, if supplied or derived by a forward run
    pub fn litterfall(&self) -> Option<ArrayView1<FloatValue>> {
        self.litterfall.as_ref().map(|l| l.view())
    }

    fn resolve_state<'a>(&'a self, state: Option<&'a SocState>) -> TcfResult<&'a SocState> {
        let state = state.or(self.state.as_ref()).ok_or(TcfError::MissingState)?;
        check_pixel_count("SOC state", self.n_pixels(), state.n_pixels())?;
        Ok(state)
    }

    fn check_gpp_series(&self, drivers: &GppSeries) -> TcfResult<()> {
        drivers.validate()?;
        check_pixel_count("Driver data", self.n_pixels(), drivers.n_pixels())
    }

    fn check_soil_series(&self, drivers: &SoilSeries) -> TcfResult<()> {
        drivers.validate()?;
        check_pixel_count("Driver data", self.n_pixels(), drivers.n_pixels())
    }

    /// GPP (N x T) over a series of days.
    ///
    /// Root-zone soil moisture is rescaled against each pixel's minimum over
    /// the series.
    pub fn gpp_series(&self, drivers: &GppSeries) -> TcfResult<Array2<FloatValue>> {
        self.check_gpp_series(drivers)?;
        let smrz_min = nanmin_rows(drivers.smrz.view());
        gpp::gpp_series(&self.params, drivers, smrz_min.view())
    }

    /// GPP (N) on a single day
    pub fn gpp_step(&self, drivers: &GppStep) -> TcfResult<Array1<FloatValue>> {
        drivers.validate()?;
        check_pixel_count("Driver data", self.n_pixels(), drivers.n_pixels())?;
        let smrz_min = match &drivers.smrz_min {
            Some(smrz_min) => smrz_min.clone(),
            None => Array1::from_elem(
                drivers.n_pixels(),
                nanmin(drivers.smrz.iter().copied()),
            ),
        };
        let gpp = gpp::gpp_series(&self.params, &drivers.to_series(), smrz_min.view())?;
        Ok(gpp.index_axis_move(Axis(1), 0))
    }

    /// RH (3 x N) of each pool on a single day, using `state` or else the
    /// model's SOC state
    pub fn rh_step(
        &self,
        drivers: &SoilStep,
        state: Option<&SocState>,
    ) -> TcfResult<Array2<FloatValue>> {
        drivers.validate()?;
        check_pixel_count("Driver data", self.n_pixels(), drivers.n_pixels())?;
        let state = self.resolve_state(state)?;
        respiration::rh_step(&self.params, drivers, state)
    }

    /// RH (3 x N x T) of each pool over a series of days with the SOC pools
    /// held fixed
    pub fn rh_series(
        &self,
        drivers: &SoilSeries,
        state: Option<&SocState>,
    ) -> TcfResult<Array3<FloatValue>> {
        self.check_soil_series(drivers)?;
        let state = self.resolve_state(state)?;
        respiration::rh_series(&self.params, drivers, state)
    }

    /// NEE (N) on a single day without updating the SOC state
    pub fn nee_step(
        &self,
        drivers: &DriverStep,
        state: Option<&SocState>,
    ) -> TcfResult<Array1<FloatValue>> {
        drivers.validate()?;
        let gpp = self.gpp_step(&drivers.gpp)?;
        let rh = self.rh_step(&drivers.soil, state)?;
        Ok(Array1::from_shape_fn(self.n_pixels(), |i| {
            rh.column(i).sum() - self.params.cue[i] * gpp[i]
        }))
    }

    /// Each environmental constraint on GPP (N x T)
    pub fn diagnose_emult(&self, drivers: &GppSeries) -> TcfResult<GppConstraints> {
        self.check_gpp_series(drivers)?;
        let smrz_min = nanmin_rows(drivers.smrz.view());
        gpp::gpp_constraints(&self.params, drivers, smrz_min.view())
    }

    /// Each environmental constraint on decomposition (N x T)
    pub fn diagnose_kmult(&self, drivers: &SoilSeries) -> TcfResult<SoilConstraints> {
        self.check_soil_series(drivers)?;
        respiration::soil_constraints(&self.params, drivers)
    }

    /// Run the model forward from the model's SOC state, which is updated in
    /// place.
    ///
    /// See [`engine::forward_run`] for the algorithm and errors.
    pub fn forward_run(
        &mut self,
        drivers: &DriverSeries,
        options: RunOptions,
    ) -> TcfResult<ForwardOutput> {
        let Tcf {
            params,
            state,
            litterfall,
            ..
        } = self;
        let state = state.as_mut().ok_or(TcfError::MissingState)?;
        engine::forward_run(params, litterfall, state, drivers, options)
    }

    /// Run the model forward from `state`, which is updated in place. The
    /// model's own state is left untouched.
    pub fn forward_run_with_state(
        &mut self,
        state: &mut SocState,
        drivers: &DriverSeries,
        options: RunOptions,
    ) -> TcfResult<ForwardOutput> {
        engine::forward_run(&self.params, &mut self.litterfall, state, drivers, options)
    }

    /// Spin up the model's SOC state over the climatology of `drivers`.
    ///
    /// See [`spin_up::spin_up`].
    pub fn spin_up(
        &mut self,
        dates: &[NaiveDate],
        drivers: &DriverSeries,
        config: &SpinUpConfig,
    ) -> TcfResult<SpinUpReport> {
        let Tcf {
            params,
            state,
            litterfall,
            ..
        } = self;
        let state = state.as_mut().ok_or(TcfError::MissingState)?;
        spin_up::spin_up(params, litterfall, state, dates, drivers, config)
    }

    /// Spin up `state` over the climatology of `drivers`
    pub fn spin_up_with_state(
        &mut self,
        state: &mut SocState,
        dates: &[NaiveDate],
        drivers: &DriverSeries,
        config: &SpinUpConfig,
    ) -> TcfResult<SpinUpReport> {
        spin_up::spin_up(&self.params, &mut self.litterfall, state, dates, drivers, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array3};

    fn model(n_pixels: usize) -> Tcf {
        Tcf::new(
            &ParameterTable::cereal_croplands(),
            LandCoverMap::uniform(7, n_pixels),
        )
        .unwrap()
    }

    fn gpp_step() -> GppStep {
        GppStep::from_stack(
            array![
                [0.5, 0.4],
                [10.0, 8.0],
                [290.0, 290.0],
                [100.0, 100.0],
                [0.9, 0.3],
            ]
            .view(),
        )
        .unwrap()
    }

    // ===== Construction Tests =====

    #[test]
    fn test_missing_parameter() {
        let mut table = ParameterTable::cereal_croplands();
        table.lue = None;
        assert!(matches!(
            Tcf::new(&table, LandCoverMap::uniform(7, 1)),
            Err(TcfError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_state_must_cover_every_pixel() {
        let state = SocState::uniform([1.0, 1.0, 1.0], 2).unwrap();
        assert!(matches!(
            model(3).with_state(state),
            Err(TcfError::PixelCountMismatch { .. })
        ));
        assert!(model(3).with_litterfall(array![1.0]).is_err());
    }

    #[test]
    fn test_missing_state() {
        let drivers = SoilStep {
            tsoil: array![290.0],
            smsf: array![0.3],
        };
        assert_eq!(
            model(1).rh_step(&drivers, None).unwrap_err(),
            TcfError::MissingState
        );
    }

    // ===== Entry Point Tests =====

    #[test]
    fn test_gpp_step_uses_smrz_min_across_pixels() {
        let m = model(2);
        let gpp = m.gpp_step(&gpp_step()).unwrap();
        // Pixel 1 is the driest, so its rescaled SMRZ is 0.05 < smrz0
        assert_eq!(gpp[1], 0.0);
        assert_relative_eq!(gpp[0], 10.0 * 0.5 * 1.61, epsilon = 1e-12);

        let with_history = gpp_step().with_smrz_min(array![0.0, 0.0]);
        assert!(m.gpp_step(&with_history).unwrap()[1] > 0.0);
    }

    #[test]
    fn test_gpp_step_matches_series() {
        let m = model(2);
        let step = gpp_step().with_smrz_min(array![0.1, 0.1]);
        let series = step.to_series();
        let smrz_min = array![0.1, 0.1];
        let expected = gpp::gpp_series(m.parameters(), &series, smrz_min.view()).unwrap();
        assert_eq!(m.gpp_step(&step).unwrap(), expected.column(0));
    }

    #[test]
    fn test_rh_step_state_override() {
        let m = model(1).with_state(SocState::from_slice(&[10.0, 10.0, 10.0]).unwrap()).unwrap();
        let drivers = SoilStep {
            tsoil: array![320.0],
            smsf: array![0.5],
        };
        let own = m.rh_step(&drivers, None).unwrap();
        let other = SocState::from_slice(&[20.0, 20.0, 20.0]).unwrap();
        let overridden = m.rh_step(&drivers, Some(&other)).unwrap();
        assert_relative_eq!(overridden[[0, 0]], 2.0 * own[[0, 0]], epsilon = 1e-12);
    }

    #[test]
    fn test_nee_step() {
        let m = model(2).with_state(SocState::uniform([40.0, 60.0, 1000.0], 2).unwrap()).unwrap();
        let mut stack = Array2::zeros((8, 2));
        stack.slice_mut(ndarray::s![..5, ..]).assign(&array![
            [0.5, 0.4],
            [10.0, 8.0],
            [290.0, 290.0],
            [100.0, 100.0],
            [0.9, 0.3],
        ]);
        stack.row_mut(5).fill(1.0);
        stack.row_mut(6).fill(290.0);
        stack.row_mut(7).fill(0.3);
        let drivers = DriverStep::from_stack(stack.view()).unwrap();
        let nee = m.nee_step(&drivers, None).unwrap();
        let gpp = m.gpp_step(&drivers.gpp).unwrap();
        let rh = m.rh_step(&drivers.soil, None).unwrap();
        for i in 0..2 {
            assert_relative_eq!(
                nee[i],
                rh.column(i).sum() - 0.708 * gpp[i],
                epsilon = 1e-12
            );
        }
        // No GPP in the dry pixel, so NEE is all respiration
        assert!(nee[1] > 0.0);
    }

    #[test]
    fn test_rh_series_rejects_wrong_pixel_count() {
        let m = model(2).with_state(SocState::uniform([1.0, 1.0, 1.0], 2).unwrap()).unwrap();
        let stack = Array3::<FloatValue>::zeros((2, 3, 4));
        let drivers = SoilSeries::from_stack(stack.view()).unwrap();
        assert!(matches!(
            m.rh_series(&drivers, None),
            Err(TcfError::PixelCountMismatch { .. })
        ));
    }

    #[test]
    fn test_diagnostics() {
        let m = model(1);
        let drivers = SoilSeries {
            tsoil: array![[320.0, 320.0]],
            smsf: array![[0.0, 0.125]],
        };
        let k = m.diagnose_kmult(&drivers).unwrap();
        assert_eq!(k.kmult(), array![[0.0, 0.5]]);
        let e = m.diagnose_emult(&gpp_step().to_series()).unwrap_err();
        assert!(matches!(e, TcfError::PixelCountMismatch { .. }));
    }

    // ===== Stateful Run Tests =====

    #[test]
    fn test_forward_run_updates_model_state() {
        let mut m = model(1)
            .with_state(SocState::uniform([40.0, 60.0, 1000.0], 1).unwrap())
            .unwrap()
            .with_litterfall(array![2.0])
            .unwrap();
        let field = |v: FloatValue| Array2::from_elem((1, 10), v);
        let drivers = DriverSeries {
            gpp: GppSeries {
                fpar: field(0.5),
                par: field(8.0),
                tmin: field(285.0),
                vpd: field(1000.0),
                smrz: field(0.6),
                ft: None,
            },
            soil: SoilSeries {
                tsoil: field(290.0),
                smsf: field(0.3),
            },
        };
        let before = m.state().unwrap().clone();
        m.forward_run(&drivers, RunOptions::new()).unwrap();
        assert_ne!(m.state().unwrap(), &before);

        // Running from an external state leaves the model's own state alone
        let after = m.state().unwrap().clone();
        let mut external = before.clone();
        m.forward_run_with_state(&mut external, &drivers, RunOptions::new())
            .unwrap();
        assert_eq!(m.state().unwrap(), &after);
        assert_eq!(external, after);
    }
}
