use thiserror::Error;

/// Errors from setting up or running a model. All variants except
/// `NegativeState` (strict mode, raised after integration) and `WorkerPool`
/// describe invalid input and are returned before any step is taken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("population must be > 0 (got {0})")]
    NonPositivePopulation(f64),

    #[error("time step dt must be > 0 (got {0})")]
    NonPositiveStep(f64),

    #[error("horizon must be > 0 (got {0})")]
    NonPositiveHorizon(f64),

    #[error("{name} must be >= 0 (got {value})")]
    NegativeRate { name: &'static str, value: f64 },

    #[error("{name} must be > 0 for this quantity")]
    ZeroRate { name: &'static str },

    #[error("{name} must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1] (got {value})")]
    FractionOutOfRange { name: &'static str, value: f64 },

    #[error("removed + infected fractions exceed 1 (removed={removed}, infected={infected})")]
    InitialFractionsExceedOne { removed: f64, infected: f64 },

    #[error("horizon {horizon} / dt {dt} needs more than {limit} samples")]
    TooManySteps { dt: f64, horizon: f64, limit: usize },

    #[error("sweep has no values")]
    EmptySweep,

    #[error("{compartment} went negative at step {step} (t={time}): {value}")]
    NegativeState {
        step: usize,
        time: f64,
        compartment: Compartment,
        value: f64,
    },

    #[error("failed to start sweep worker pool: {0}")]
    WorkerPool(String),
}

/// Tracked compartments of the two-group SIR model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compartment {
    CompliantSusceptible,
    NonCompliantSusceptible,
    Infected,
    Removed,
}

impl std::fmt::Display for Compartment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Compartment::CompliantSusceptible => "S1",
            Compartment::NonCompliantSusceptible => "S2",
            Compartment::Infected => "I",
            Compartment::Removed => "R",
        };
        f.write_str(name)
    }
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::NonFinite { name, value })
    }
}

pub(crate) fn ensure_fraction(name: &'static str, value: f64) -> Result<(), ModelError> {
    ensure_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::FractionOutOfRange { name, value })
    }
}

pub(crate) fn ensure_rate(name: &'static str, value: f64) -> Result<(), ModelError> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::NegativeRate { name, value })
    }
}
