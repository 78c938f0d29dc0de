use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::sir_mix::{InitialState, ModelParameters, SimulationConfig};
use crate::sweep::{run_sweep, run_sweep_parallel, SweepResult, SweepSpec};

/// Named parameter sets for the two standard distancing studies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// q = 0.0 .. 0.4 in steps of 0.1 over 1000 days.
    #[default]
    Partial,
    /// q = 0.0 .. 1.0 in steps of 0.1 over 365 days.
    Full,
}

/// Everything one run needs. All fields fall back to the reference scenario
/// (beta = 0.25, gamma = 0.05, N = 1e6, 1% initially infected, half of the
/// susceptibles distancing).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model: ModelParameters,
    pub initial: InitialState,
    pub simulation: SimulationConfig,
    pub sweep: SweepSpec,
}

impl RunConfig {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Partial => Self::default(),
            Preset::Full => Self {
                simulation: SimulationConfig {
                    horizon: 365.0,
                    ..SimulationConfig::default()
                },
                sweep: SweepSpec::Linear {
                    start: 0.0,
                    step: 0.1,
                    count: 11,
                },
                ..Self::default()
            },
        }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("invalid run config JSON")
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read run config failed (path={:?})", path))?;
        Self::from_json_str(&text)
            .with_context(|| format!("parse run config failed (path={:?})", path))
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        self.model.check()?;
        self.initial.check()?;
        self.simulation.check()?;
        self.sweep.check()
    }

    pub fn run(&self) -> Result<SweepResult, ModelError> {
        run_sweep(&self.model, &self.initial, &self.simulation, &self.sweep)
    }

    pub fn run_parallel(&self, workers: usize) -> Result<SweepResult, ModelError> {
        run_sweep_parallel(&self.model, &self.initial, &self.simulation, &self.sweep, workers)
    }
}
