use serde::Serialize;

use crate::error::Compartment;

/// One sampled point of a [`Trajectory`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatePoint {
    pub t: f64,
    pub s1: f64,
    pub s2: f64,
    pub i: f64,
    pub r: f64,
}

impl StatePoint {
    pub fn susceptible(&self) -> f64 {
        self.s1 + self.s2
    }

    pub fn total(&self) -> f64 {
        self.s1 + self.s2 + self.i + self.r
    }
}

/// Time series produced by one integrator run, stored column-wise.
///
/// `r` is derived from the population size when a sample is recorded and is
/// never integrated on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    population: f64,
    t: Vec<f64>,
    s1: Vec<f64>,
    s2: Vec<f64>,
    i: Vec<f64>,
    r: Vec<f64>,
}

/// First sample at which a compartment dropped below the negative tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegativeState {
    pub step: usize,
    pub time: f64,
    pub compartment: Compartment,
    pub value: f64,
}

impl Trajectory {
    pub(crate) fn with_capacity(n: usize, population: f64) -> Self {
        Self {
            population,
            t: Vec::with_capacity(n),
            s1: Vec::with_capacity(n),
            s2: Vec::with_capacity(n),
            i: Vec::with_capacity(n),
            r: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, t: f64, s1: f64, s2: f64, i: f64) {
        self.t.push(t);
        self.s1.push(s1);
        self.s2.push(s2);
        self.i.push(i);
        self.r.push(self.population - (s1 + s2) - i);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn population(&self) -> f64 {
        self.population
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn compliant_susceptible(&self) -> &[f64] {
        &self.s1
    }

    pub fn non_compliant_susceptible(&self) -> &[f64] {
        &self.s2
    }

    pub fn infected(&self) -> &[f64] {
        &self.i
    }

    pub fn removed(&self) -> &[f64] {
        &self.r
    }

    /// S1 + S2 for every sample.
    pub fn susceptible(&self) -> Vec<f64> {
        self.s1.iter().zip(&self.s2).map(|(a, b)| a + b).collect()
    }

    pub fn point(&self, k: usize) -> Option<StatePoint> {
        (k < self.len()).then(|| StatePoint {
            t: self.t[k],
            s1: self.s1[k],
            s2: self.s2[k],
            i: self.i[k],
            r: self.r[k],
        })
    }

    pub fn points(&self) -> impl Iterator<Item = StatePoint> + '_ {
        (0..self.len()).filter_map(move |k| self.point(k))
    }

    pub fn last(&self) -> Option<StatePoint> {
        self.len().checked_sub(1).and_then(|k| self.point(k))
    }

    /// Earliest sample holding the maximum infected count, as (t, I).
    pub fn peak_infected(&self) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (t, i) in self.t.iter().zip(&self.i) {
            match best {
                Some((_, b)) if *i <= b => {}
                _ => best = Some((*t, *i)),
            }
        }
        best
    }

    /// Largest |S1 + S2 + I + R - N| over all samples.
    pub fn max_conservation_drift(&self) -> f64 {
        self.points()
            .map(|p| (p.total() - self.population).abs())
            .fold(0.0, f64::max)
    }

    /// Smallest value held by any compartment at any sample.
    pub fn min_state(&self) -> f64 {
        self.s1
            .iter()
            .chain(&self.s2)
            .chain(&self.i)
            .chain(&self.r)
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    pub fn first_negative(&self, tolerance: f64) -> Option<NegativeState> {
        let columns = [
            (Compartment::CompliantSusceptible, &self.s1),
            (Compartment::NonCompliantSusceptible, &self.s2),
            (Compartment::Infected, &self.i),
            (Compartment::Removed, &self.r),
        ];
        for k in 0..self.len() {
            for (compartment, col) in &columns {
                if col[k] < -tolerance {
                    return Some(NegativeState {
                        step: k,
                        time: self.t[k],
                        compartment: *compartment,
                        value: col[k],
                    });
                }
            }
        }
        None
    }

    pub fn summary(&self) -> Option<TrajectorySummary> {
        let first = self.point(0)?;
        let last = self.last()?;
        let (peak_time, peak_infected) = self.peak_infected()?;
        Some(TrajectorySummary {
            peak_infected,
            peak_time,
            final_compliant_susceptible: last.s1,
            final_non_compliant_susceptible: last.s2,
            final_infected: last.i,
            final_removed: last.r,
            attack_rate: (last.r - first.r) / self.population,
            max_conservation_drift: self.max_conservation_drift(),
            min_state: self.min_state(),
        })
    }
}

/// Headline numbers of one run, handed to renderers alongside the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub peak_infected: f64,
    pub peak_time: f64,
    pub final_compliant_susceptible: f64,
    pub final_non_compliant_susceptible: f64,
    pub final_infected: f64,
    pub final_removed: f64,
    pub attack_rate: f64,
    pub max_conservation_drift: f64,
    pub min_state: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trajectory {
        let mut traj = Trajectory::with_capacity(4, 100.0);
        traj.push(0.0, 40.0, 40.0, 20.0);
        traj.push(1.0, 35.0, 30.0, 25.0);
        traj.push(2.0, 34.0, 25.0, 25.0);
        traj.push(3.0, 34.0, 24.0, 10.0);
        traj
    }

    #[test]
    fn removed_is_derived_from_population() {
        let traj = sample();
        assert_eq!(traj.removed(), &[0.0, 10.0, 16.0, 32.0]);
        assert_eq!(traj.susceptible(), vec![80.0, 65.0, 59.0, 58.0]);
        assert_eq!(traj.max_conservation_drift(), 0.0);
    }

    #[test]
    fn peak_picks_earliest_maximum() {
        assert_eq!(sample().peak_infected(), Some((1.0, 25.0)));
    }

    #[test]
    fn summary_reports_final_state_and_attack_rate() {
        let s = sample().summary().expect("non-empty");
        assert_eq!(s.final_infected, 10.0);
        assert_eq!(s.final_removed, 32.0);
        assert!((s.attack_rate - 0.32).abs() < 1e-12);
        assert_eq!(s.min_state, 0.0);
    }

    #[test]
    fn first_negative_respects_tolerance() {
        let mut traj = Trajectory::with_capacity(2, 10.0);
        traj.push(0.0, 5.0, 4.0, 1.0);
        traj.push(0.5, 5.0, 5.0, -1e-12);
        assert!(traj.first_negative(1e-9).is_none());

        traj.push(1.0, 5.0, 5.0, -0.25);
        let hit = traj.first_negative(1e-9).expect("negative infected");
        assert_eq!(hit.step, 2);
        assert_eq!(hit.compartment, Compartment::Infected);
        assert_eq!(hit.value, -0.25);
    }

    #[test]
    fn empty_trajectory_has_no_summary() {
        let traj = Trajectory::with_capacity(0, 1.0);
        assert!(traj.is_empty());
        assert!(traj.summary().is_none());
        assert!(traj.peak_infected().is_none());
    }
}
