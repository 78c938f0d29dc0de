pub mod config;
pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod reproduction;
pub mod sweep;

pub use config::{Preset, RunConfig};
pub use error::{Compartment, ModelError};
pub use model::sir_mix::{InitialState, ModelParameters, SimulationConfig, SirMixModel};
pub use model::trajectory::{StatePoint, Trajectory, TrajectorySummary};
pub use sweep::{run_sweep, run_sweep_parallel, SweepEntry, SweepResult, SweepSpec};
