use sirmix::{Preset, RunConfig};

fn main() -> anyhow::Result<()> {
    // q = 0.0 .. 1.0 over one year, coarser step to keep it quick
    let mut cfg = RunConfig::preset(Preset::Full);
    cfg.simulation.dt = 0.05;

    let result = cfg.run()?;

    println!("q,peak_day,peak_infected,final_removed");
    for entry in &result {
        let Some(s) = entry.trajectory.summary() else { continue };
        println!("{:.1},{:.1},{:.0},{:.0}", entry.q, s.peak_time, s.peak_infected, s.final_removed);
    }

    Ok(())
}
