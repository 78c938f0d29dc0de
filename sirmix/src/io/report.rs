use std::io::Write;

use serde::Serialize;

use crate::model::trajectory::TrajectorySummary;
use crate::sweep::{format_q, SweepResult};

/// Write every trajectory of a sweep as long-format CSV (`q,t,s1,s2,i,r`).
///
/// Only every `stride`-th sample is written; the last sample of each
/// trajectory is always included so the final state is never dropped.
pub fn write_sweep_csv<W: Write>(w: W, result: &SweepResult, stride: usize) -> anyhow::Result<()> {
    anyhow::ensure!(stride >= 1, "stride must be >= 1");

    let mut out = csv::Writer::from_writer(w);
    out.write_record(["q", "t", "s1", "s2", "i", "r"])?;

    for entry in result {
        let traj = &entry.trajectory;
        let last = traj.len().saturating_sub(1);
        for (k, p) in traj.points().enumerate() {
            if k % stride != 0 && k != last {
                continue;
            }
            out.write_record([
                format_q(entry.q),
                format!("{:.3}", p.t),
                format!("{:.3}", p.s1),
                format!("{:.3}", p.s2),
                format!("{:.3}", p.i),
                format!("{:.3}", p.r),
            ])?;
        }
    }

    out.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    q: f64,
    label: String,
    samples: usize,
    #[serde(flatten)]
    summary: &'a TrajectorySummary,
}

/// Write one summary object per sweep value as a pretty-printed JSON array.
pub fn write_summary_json<W: Write>(mut w: W, result: &SweepResult) -> anyhow::Result<()> {
    let summaries: Vec<(f64, String, usize, TrajectorySummary)> = result
        .iter()
        .filter_map(|e| {
            e.trajectory
                .summary()
                .map(|s| (e.q, e.label(), e.trajectory.len(), s))
        })
        .collect();
    anyhow::ensure!(summaries.len() == result.len(), "sweep contains an empty trajectory");

    let rows: Vec<SummaryRow<'_>> = summaries
        .iter()
        .map(|(q, label, samples, summary)| SummaryRow {
            q: *q,
            label: label.clone(),
            samples: *samples,
            summary,
        })
        .collect();

    serde_json::to_writer_pretty(&mut w, &rows)?;
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sir_mix::{InitialState, ModelParameters, SimulationConfig};
    use crate::sweep::{run_sweep, SweepSpec};

    fn small_sweep() -> SweepResult {
        let sim = SimulationConfig {
            dt: 1.0,
            horizon: 10.0,
            ..SimulationConfig::default()
        };
        run_sweep(
            &ModelParameters::default(),
            &InitialState::default(),
            &sim,
            &SweepSpec::Values(vec![0.0, 1.0]),
        )
        .expect("sweep")
    }

    #[test]
    fn stride_keeps_first_and_last_sample() {
        let mut buf = Vec::new();
        write_sweep_csv(&mut buf, &small_sweep(), 4).expect("csv");
        let text = String::from_utf8(buf).expect("utf8");
        let times: Vec<&str> = text
            .lines()
            .skip(1)
            .filter(|l| l.starts_with("0.0,"))
            .map(|l| l.split(',').nth(1).unwrap_or_default())
            .collect();
        assert_eq!(times, vec!["0.000", "4.000", "8.000", "9.000"]);
        assert_eq!(text.lines().next(), Some("q,t,s1,s2,i,r"));
    }

    #[test]
    fn zero_stride_is_rejected() {
        assert!(write_sweep_csv(Vec::new(), &small_sweep(), 0).is_err());
    }

    #[test]
    fn summary_json_lists_runs_in_order() {
        let mut buf = Vec::new();
        write_summary_json(&mut buf, &small_sweep()).expect("json");
        let rows: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        let rows = rows.as_array().expect("array");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["label"], "q = 0.0");
        assert_eq!(rows[1]["label"], "q = 1.0");
        assert_eq!(rows[0]["samples"], 10);
        assert!(rows[0]["peak_infected"].as_f64().is_some());
    }
}
