//! Run a distancing-compliance sweep of the two-group SIR model and print the
//! trajectories (CSV) or per-run summaries (JSON) to stdout.
//!
//! Usage:
//!   sirmix --preset full --dt 0.05 --stride 20 > sweep.csv

use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use sirmix::io::report::{write_summary_json, write_sweep_csv};
use sirmix::reproduction::{basic_reproduction_number, effective_reproduction_number};
use sirmix::{Preset, RunConfig, SweepSpec};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Partial,
    Full,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Partial => Preset::Partial,
            PresetArg::Full => Preset::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Summary,
}

#[derive(Parser, Debug)]
#[command(name = "sirmix")]
#[command(about = "Euler-integrated SIR model with distancing and non-distancing susceptibles")]
struct Args {
    /// JSON run config; overrides below are applied on top of it
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in parameter set
    #[arg(long, value_enum, default_value = "partial")]
    preset: PresetArg,

    /// Contact rate per day
    #[arg(long)]
    beta: Option<f64>,

    /// Removal rate per day
    #[arg(long)]
    gamma: Option<f64>,

    /// Total population N
    #[arg(long)]
    population: Option<f64>,

    /// Time step in days
    #[arg(long)]
    dt: Option<f64>,

    /// Simulated days
    #[arg(long)]
    horizon: Option<f64>,

    /// Initially infected fraction of N
    #[arg(long)]
    infected_fraction: Option<f64>,

    /// Initially removed fraction of N
    #[arg(long)]
    removed_fraction: Option<f64>,

    /// Fraction of susceptibles that practise distancing
    #[arg(long)]
    compliant_fraction: Option<f64>,

    /// Explicit compliance factors, e.g. 0,0.5,1
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["q_start", "q_step", "q_count"])]
    q_values: Option<Vec<f64>>,

    #[arg(long, requires_all = ["q_step", "q_count"])]
    q_start: Option<f64>,

    #[arg(long, requires_all = ["q_start", "q_count"])]
    q_step: Option<f64>,

    #[arg(long, requires_all = ["q_start", "q_step"])]
    q_count: Option<usize>,

    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Write every n-th sample in CSV output
    #[arg(long, default_value = "100")]
    stride: usize,

    /// Fail when a compartment goes negative instead of warning
    #[arg(long)]
    strict: bool,

    /// Worker threads for the sweep (1 = sequential, 0 = one per core)
    #[arg(long, default_value = "1")]
    workers: usize,
}

impl Args {
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_json_path(path)?,
            None => RunConfig::preset(self.preset.into()),
        };

        if let Some(v) = self.beta { cfg.model.beta = v; }
        if let Some(v) = self.gamma { cfg.model.gamma = v; }
        if let Some(v) = self.population { cfg.model.population = v; }
        if let Some(v) = self.dt { cfg.simulation.dt = v; }
        if let Some(v) = self.horizon { cfg.simulation.horizon = v; }
        if let Some(v) = self.infected_fraction { cfg.initial.infected_fraction = v; }
        if let Some(v) = self.removed_fraction { cfg.initial.removed_fraction = v; }
        if let Some(v) = self.compliant_fraction { cfg.initial.compliant_fraction = v; }
        if self.strict { cfg.simulation.strict = true; }

        if let Some(values) = &self.q_values {
            cfg.sweep = SweepSpec::Values(values.clone());
        }
        if let (Some(start), Some(step), Some(count)) = (self.q_start, self.q_step, self.q_count) {
            cfg.sweep = SweepSpec::Linear { start, step, count };
        }

        Ok(cfg)
    }

    /// Run config with every override applied, rejected on invalid parameters.
    fn checked_config(&self) -> anyhow::Result<RunConfig> {
        let cfg = self.run_config()?;
        cfg.validate().context("invalid parameters")?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let cfg = args.checked_config()?;

    if let Ok(r0) = basic_reproduction_number(cfg.model.beta, cfg.model.gamma) {
        info!(r0, "basic reproduction number");
    }
    for q in cfg.sweep.values() {
        if let Ok(r_eff) = effective_reproduction_number(&cfg.model.with_q(q), &cfg.initial) {
            info!(q, r_eff, "effective reproduction number at t=0");
        }
    }

    let result = if args.workers == 1 {
        cfg.run()
    } else {
        cfg.run_parallel(args.workers)
    }
    .context("sweep failed")?;

    let stdout = io::stdout();
    let out = BufWriter::new(stdout.lock());
    match args.format {
        OutputFormat::Csv => write_sweep_csv(out, &result, args.stride)?,
        OutputFormat::Summary => write_summary_json(out, &result)?,
    }

    Ok(())
}
