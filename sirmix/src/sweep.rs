use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ensure_finite, ModelError};
use crate::model::sir_mix::{InitialState, ModelParameters, SimulationConfig, SirMixModel};
use crate::model::trajectory::Trajectory;

/// Ordered set of distancing-compliance factors to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepSpec {
    Values(Vec<f64>),
    /// value_i = start + step * i for i in 0..count
    Linear { start: f64, step: f64, count: usize },
}

impl Default for SweepSpec {
    fn default() -> Self {
        SweepSpec::Linear {
            start: 0.0,
            step: 0.1,
            count: 5,
        }
    }
}

impl SweepSpec {
    pub fn values(&self) -> Vec<f64> {
        match self {
            SweepSpec::Values(v) => v.clone(),
            SweepSpec::Linear { start, step, count } => {
                (0..*count).map(|i| start + step * i as f64).collect()
            }
        }
    }

    pub fn check(&self) -> Result<(), ModelError> {
        let values = self.values();
        if values.is_empty() {
            return Err(ModelError::EmptySweep);
        }
        for q in values {
            ensure_finite("q", q)?;
            if !(0.0..=1.0).contains(&q) {
                warn!(q, "compliance factor outside [0, 1]");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepEntry {
    pub q: f64,
    pub trajectory: Trajectory,
}

impl SweepEntry {
    pub fn label(&self) -> String {
        format!("q = {}", format_q(self.q))
    }
}

/// Shortest decimal form of q with at least one fractional digit, rounded
/// to 10 places so linear-sweep noise (0.30000000000000004) prints as 0.3.
pub fn format_q(q: f64) -> String {
    let mut s = format!("{:.10}", q);
    if s.contains('.') {
        while s.ends_with('0') && !s.ends_with(".0") {
            s.pop();
        }
    }
    s
}

/// Trajectories keyed by compliance factor, in sweep order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepResult {
    entries: Vec<SweepEntry>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SweepEntry> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&SweepEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&SweepEntry> {
        self.entries.last()
    }

    pub fn get(&self, q: f64) -> Option<&Trajectory> {
        self.entries
            .iter()
            .find(|e| e.q == q)
            .map(|e| &e.trajectory)
    }

    pub fn q_values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.q).collect()
    }
}

impl<'a> IntoIterator for &'a SweepResult {
    type Item = &'a SweepEntry;
    type IntoIter = std::slice::Iter<'a, SweepEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Build one validated model per sweep value, before anything is integrated.
fn build_models(
    base: &ModelParameters,
    initial: &InitialState,
    sim: &SimulationConfig,
    sweep: &SweepSpec,
) -> Result<Vec<SirMixModel>, ModelError> {
    sweep.check()?;
    sweep.values()
        .into_iter()
        .map(|q| SirMixModel::new(base.with_q(q), *initial, *sim))
        .collect()
}

fn collect(models: &[SirMixModel], trajectories: Vec<Trajectory>) -> SweepResult {
    let entries = models
        .iter()
        .zip(trajectories)
        .map(|(m, trajectory)| SweepEntry {
            q: m.params.q,
            trajectory,
        })
        .collect();
    SweepResult { entries }
}

/// Run the integrator once per sweep value, sequentially.
pub fn run_sweep(
    base: &ModelParameters,
    initial: &InitialState,
    sim: &SimulationConfig,
    sweep: &SweepSpec,
) -> Result<SweepResult, ModelError> {
    let models = build_models(base, initial, sim, sweep)?;
    info!(runs = models.len(), steps = sim.step_count(), "starting sweep");

    let mut trajectories = Vec::with_capacity(models.len());
    for model in &models {
        let traj = model.simulate()?;
        if let Some((t, peak)) = traj.peak_infected() {
            info!(q = model.params.q, peak_infected = peak, peak_day = t, "run complete");
        }
        trajectories.push(traj);
    }
    Ok(collect(&models, trajectories))
}

/// Same result as [`run_sweep`], with runs spread over a rayon pool of
/// `workers` threads (0 lets rayon pick one per core). The indexed collect
/// keeps input order regardless of completion order.
pub fn run_sweep_parallel(
    base: &ModelParameters,
    initial: &InitialState,
    sim: &SimulationConfig,
    sweep: &SweepSpec,
    workers: usize,
) -> Result<SweepResult, ModelError> {
    use rayon::prelude::*;

    let models = build_models(base, initial, sim, sweep)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| ModelError::WorkerPool(e.to_string()))?;
    info!(
        runs = models.len(),
        workers = pool.current_num_threads(),
        steps = sim.step_count(),
        "starting parallel sweep"
    );

    let trajectories = pool.install(|| {
        models
            .par_iter()
            .map(SirMixModel::simulate)
            .collect::<Result<Vec<_>, _>>()
    })?;
    Ok(collect(&models, trajectories))
}
