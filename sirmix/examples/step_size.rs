use std::time::Instant;

use sirmix::{InitialState, ModelParameters, SimulationConfig, SirMixModel};

fn main() -> anyhow::Result<()> {
    // Halve dt repeatedly and watch the peak settle (explicit Euler is first order).
    let params = ModelParameters::default().with_q(0.5);
    let initial = InitialState::default();

    println!("dt,steps,peak_day,peak_infected,elapsed_ms");
    let mut dt = 1.0;
    for _ in 0..7 {
        let sim = SimulationConfig {
            dt,
            horizon: 365.0,
            ..SimulationConfig::default()
        };
        let model = SirMixModel::new(params, initial, sim)?;

        let start = Instant::now();
        let traj = model.simulate()?;
        let ms = start.elapsed().as_secs_f64() * 1000.0;

        if let Some((t, peak)) = traj.peak_infected() {
            println!("{},{},{:.2},{:.1},{:.2}", dt, traj.len(), t, peak, ms);
        }
        dt /= 2.0;
    }

    Ok(())
}
