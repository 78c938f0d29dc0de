use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ensure_finite, ensure_fraction, ensure_rate, ModelError};
use crate::math::ode::{euler_step_ws, EulerWorkspace};
use crate::model::trajectory::Trajectory;

// State layout: S1 | S2 | I
const S1: usize = 0;
const S2: usize = 1;
const I: usize = 2;
const STATE_SIZE: usize = 3;

/// Upper bound on samples per run (five f64 columns each).
pub const MAX_SAMPLES: usize = 50_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    // Rates (per day)
    pub beta: f64,  // contact (transmission) rate
    pub gamma: f64, // removal rate = 1/infectious mean

    pub population: f64, // N

    // Distancing-compliance factor for S1 (0 = full isolation, 1 = no distancing)
    pub q: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            beta: 0.25,
            gamma: 0.05,
            population: 1e6,
            q: 1.0,
        }
    }
}

impl ModelParameters {
    pub fn with_q(self, q: f64) -> Self {
        Self { q, ..self }
    }

    /// q outside [0, 1] is integrable but has no behavioural meaning, so it is
    /// not rejected here.
    pub fn check(&self) -> Result<(), ModelError> {
        ensure_finite("population", self.population)?;
        if self.population <= 0.0 {
            return Err(ModelError::NonPositivePopulation(self.population));
        }
        ensure_rate("beta", self.beta)?;
        ensure_rate("gamma", self.gamma)?;
        ensure_finite("q", self.q)?;
        Ok(())
    }
}

/// Initial composition of the population, as fractions of N.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub removed_fraction: f64,
    pub infected_fraction: f64,
    /// Share of the initial susceptibles that practise distancing (S1).
    pub compliant_fraction: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            removed_fraction: 0.0,
            infected_fraction: 0.01,
            compliant_fraction: 0.5,
        }
    }
}

impl InitialState {
    pub fn susceptible_fraction(&self) -> f64 {
        1.0 - self.removed_fraction - self.infected_fraction
    }

    pub fn check(&self) -> Result<(), ModelError> {
        ensure_fraction("removed_fraction", self.removed_fraction)?;
        ensure_fraction("infected_fraction", self.infected_fraction)?;
        ensure_fraction("compliant_fraction", self.compliant_fraction)?;
        if self.removed_fraction + self.infected_fraction > 1.0 {
            return Err(ModelError::InitialFractionsExceedOne {
                removed: self.removed_fraction,
                infected: self.infected_fraction,
            });
        }
        Ok(())
    }

    /// Absolute (S1, S2, I) for a population of size `n`.
    pub fn compartments(&self, n: f64) -> [f64; STATE_SIZE] {
        let s = self.susceptible_fraction() * n;
        let s1 = self.compliant_fraction * s;
        let s2 = s - s1;
        let i = self.infected_fraction * n;
        [s1, s2, i]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub dt: f64,      // days
    pub horizon: f64, // days

    /// States below `-negative_tolerance` are reported; defaults to 1e-9 * N.
    pub negative_tolerance: Option<f64>,
    /// Fail the run instead of warning when a state goes negative.
    pub strict: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            horizon: 1000.0,
            negative_tolerance: None,
            strict: false,
        }
    }
}

impl SimulationConfig {
    pub fn check(&self) -> Result<(), ModelError> {
        ensure_finite("dt", self.dt)?;
        ensure_finite("horizon", self.horizon)?;
        if self.dt <= 0.0 {
            return Err(ModelError::NonPositiveStep(self.dt));
        }
        if self.horizon <= 0.0 {
            return Err(ModelError::NonPositiveHorizon(self.horizon));
        }
        let samples = (self.horizon / self.dt).ceil();
        if !samples.is_finite() || samples > MAX_SAMPLES as f64 {
            return Err(ModelError::TooManySteps {
                dt: self.dt,
                horizon: self.horizon,
                limit: MAX_SAMPLES,
            });
        }
        if let Some(tol) = self.negative_tolerance {
            ensure_rate("negative_tolerance", tol)?;
        }
        Ok(())
    }

    /// ceil(horizon / dt), at least 1. Only meaningful once `check` passed.
    pub fn step_count(&self) -> usize {
        let steps = (self.horizon / self.dt).ceil();
        (steps as usize).max(1)
    }
}

/// Two-susceptible-group SIR model integrated with fixed-step explicit Euler.
#[derive(Debug, Clone)]
pub struct SirMixModel {
    pub params: ModelParameters,
    pub initial: InitialState,
    pub sim: SimulationConfig,
}

impl SirMixModel {
    pub fn new(
        params: ModelParameters,
        initial: InitialState,
        sim: SimulationConfig,
    ) -> Result<Self, ModelError> {
        params.check()?;
        initial.check()?;
        sim.check()?;
        Ok(Self { params, initial, sim })
    }

    pub fn deriv(&self, _t: f64, y: &[f64], dy: &mut [f64]) {
        let p = &self.params;
        let (s1, s2, i) = (y[S1], y[S2], y[I]);

        let ds1 = -(p.q * p.beta / p.population) * s1 * i;
        let ds2 = -(p.beta / p.population) * s2 * i;

        dy[S1] = ds1;
        dy[S2] = ds2;
        // new infections minus removals
        dy[I] = -ds1 - ds2 - p.gamma * i;
    }

    pub fn negative_tolerance(&self) -> f64 {
        self.sim
            .negative_tolerance
            .unwrap_or(1e-9 * self.params.population)
    }

    /// Integrate over the full horizon. Every call starts from the initial
    /// state with freshly allocated buffers.
    pub fn simulate(&self) -> Result<Trajectory, ModelError> {
        let n = self.sim.step_count();
        let dt = self.sim.dt;
        debug!(q = self.params.q, steps = n, dt, "integrating");

        let mut traj = Trajectory::with_capacity(n, self.params.population);
        let mut y = self.initial.compartments(self.params.population);
        let mut ws = EulerWorkspace::new(STATE_SIZE);

        traj.push(0.0, y[S1], y[S2], y[I]);
        for j in 1..n {
            let t = (j - 1) as f64 * dt;
            euler_step_ws(&mut y, t, dt, &mut ws, |tt, y, dy| self.deriv(tt, y, dy));
            traj.push(j as f64 * dt, y[S1], y[S2], y[I]);
        }

        if let Some(neg) = traj.first_negative(self.negative_tolerance()) {
            if self.sim.strict {
                return Err(ModelError::NegativeState {
                    step: neg.step,
                    time: neg.time,
                    compartment: neg.compartment,
                    value: neg.value,
                });
            }
            warn!(
                q = self.params.q,
                step = neg.step,
                t = neg.time,
                compartment = %neg.compartment,
                value = neg.value,
                "state went negative; dt may be too large for these rates"
            );
        }

        Ok(traj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(q: f64, dt: f64) -> SirMixModel {
        SirMixModel::new(
            ModelParameters::default().with_q(q),
            InitialState::default(),
            SimulationConfig {
                dt,
                horizon: 365.0,
                ..SimulationConfig::default()
            },
        )
        .expect("valid model")
    }

    #[test]
    fn initial_compartments_split_susceptibles() {
        let [s1, s2, i] = InitialState::default().compartments(1e6);
        assert_eq!(s1, 495_000.0);
        assert_eq!(s2, 495_000.0);
        assert_eq!(i, 10_000.0);
    }

    #[test]
    fn step_count_is_ceil_of_horizon_over_dt() {
        let sim = |dt, horizon| SimulationConfig {
            dt,
            horizon,
            ..SimulationConfig::default()
        };
        assert_eq!(sim(0.01, 365.0).step_count(), 36_500);
        assert_eq!(sim(0.01, 1000.0).step_count(), 100_000);
        assert_eq!(sim(0.3, 1.0).step_count(), 4);
        assert_eq!(sim(5.0, 1.0).step_count(), 1);
        assert_eq!(sim(1.0, 100_000.000_000_01).step_count(), 100_001);
    }

    #[test]
    fn oversized_runs_are_rejected_up_front() {
        let sim = |dt, horizon| SimulationConfig {
            dt,
            horizon,
            ..SimulationConfig::default()
        };
        // quotient overflows to infinity
        let huge = sim(1e-10, 1e300);
        assert!(matches!(huge.check(), Err(ModelError::TooManySteps { .. })));
        assert!(matches!(
            SirMixModel::new(ModelParameters::default(), InitialState::default(), huge),
            Err(ModelError::TooManySteps { .. })
        ));

        // finite, but far beyond what can be allocated
        assert_eq!(
            sim(1e-5, 1e15).check(),
            Err(ModelError::TooManySteps {
                dt: 1e-5,
                horizon: 1e15,
                limit: MAX_SAMPLES,
            })
        );

        assert!(sim(1.0, MAX_SAMPLES as f64).check().is_ok());
        assert!(sim(1.0, MAX_SAMPLES as f64 + 1.0).check().is_err());
    }

    #[test]
    fn deriv_matches_update_rule() {
        let m = model(0.5, 0.01);
        let y = [400_000.0, 500_000.0, 100_000.0];
        let mut dy = [0.0; 3];
        m.deriv(0.0, &y, &mut dy);
        // 0.5 * 0.25 / 1e6 * 4e5 * 1e5
        assert!((dy[0] + 5_000.0).abs() < 1e-9);
        assert!((dy[1] + 12_500.0).abs() < 1e-9);
        assert!((dy[2] - (5_000.0 + 12_500.0 - 5_000.0)).abs() < 1e-9);
    }

    #[test]
    fn trajectory_spans_horizon() {
        let traj = model(1.0, 0.5).simulate().expect("simulate");
        assert_eq!(traj.len(), 730);
        assert_eq!(traj.times()[0], 0.0);
        assert_eq!(traj.times()[729], 364.5);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let ok_init = InitialState::default();
        let ok_sim = SimulationConfig::default();

        let zero_pop = ModelParameters {
            population: 0.0,
            ..ModelParameters::default()
        };
        assert_eq!(
            SirMixModel::new(zero_pop, ok_init, ok_sim).unwrap_err(),
            ModelError::NonPositivePopulation(0.0)
        );

        let neg_beta = ModelParameters {
            beta: -0.1,
            ..ModelParameters::default()
        };
        assert!(matches!(
            SirMixModel::new(neg_beta, ok_init, ok_sim),
            Err(ModelError::NegativeRate { name: "beta", .. })
        ));

        let bad_dt = SimulationConfig { dt: 0.0, ..ok_sim };
        assert_eq!(
            SirMixModel::new(ModelParameters::default(), ok_init, bad_dt).unwrap_err(),
            ModelError::NonPositiveStep(0.0)
        );

        let bad_t = SimulationConfig { horizon: -1.0, ..ok_sim };
        assert_eq!(
            SirMixModel::new(ModelParameters::default(), ok_init, bad_t).unwrap_err(),
            ModelError::NonPositiveHorizon(-1.0)
        );

        let crowded = InitialState {
            removed_fraction: 0.6,
            infected_fraction: 0.5,
            ..ok_init
        };
        assert!(matches!(
            SirMixModel::new(ModelParameters::default(), crowded, ok_sim),
            Err(ModelError::InitialFractionsExceedOne { .. })
        ));

        let nan_gamma = ModelParameters {
            gamma: f64::NAN,
            ..ModelParameters::default()
        };
        assert!(matches!(
            SirMixModel::new(nan_gamma, ok_init, ok_sim),
            Err(ModelError::NonFinite { name: "gamma", .. })
        ));
    }

    #[test]
    fn q_outside_unit_interval_is_accepted() {
        let params = ModelParameters::default().with_q(1.5);
        let model = SirMixModel::new(params, InitialState::default(), SimulationConfig::default());
        assert!(model.is_ok());
    }

    #[test]
    fn strict_mode_fails_on_overshoot() {
        // dt * gamma = 2.5 drives I negative on the first step
        let m = SirMixModel::new(
            ModelParameters {
                gamma: 0.5,
                ..ModelParameters::default()
            },
            InitialState::default(),
            SimulationConfig {
                dt: 5.0,
                horizon: 50.0,
                strict: true,
                ..SimulationConfig::default()
            },
        )
        .expect("valid model");
        assert!(matches!(m.simulate(), Err(ModelError::NegativeState { step: 1, .. })));

        let lenient = SirMixModel {
            sim: SimulationConfig { strict: false, ..m.sim },
            ..m
        };
        let traj = lenient.simulate().expect("warn only");
        assert!(traj.infected()[1] < 0.0);
    }
}
