use crate::core::{Model, Solver};
use crate::error::Error;
use rand::prelude::*;
use std::time::{Duration, Instant};

/// Randomized baseline: draws one start per intervention uniformly at
/// random and keeps the best point seen, restarting until the restart
/// count or the time budget is exhausted.
#[derive(Clone, Debug)]
pub struct RandomRestart {
    restarts: usize,
    rng: StdRng,
}

impl RandomRestart {
    /// Creates a seeded sampler, for reproducible runs.
    #[must_use]
    pub fn new(seed: u64, restarts: usize) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        Self { restarts, rng }
    }
}

impl Default for RandomRestart {
    fn default() -> Self {
        let restarts = 4096;
        let rng = StdRng::from_entropy();
        Self { restarts, rng }
    }
}

impl Solver for RandomRestart {
    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Vec<bool>, Error> {
        let started = Instant::now();
        let mut best: Option<(f64, f64, Vec<bool>)> = None;

        for _ in 0..self.restarts {
            if started.elapsed() >= budget {
                break;
            }

            let mut assignment = vec![false; model.variables().len()];
            for intervention in 0..model.intervention_count() {
                let starts = model.starts_of(intervention);
                assignment[starts[self.rng.gen_range(0..starts.len())]] = true;
            }

            let violation: f64 = model
                .constraints()
                .iter()
                .map(|constraint| constraint.violation(&assignment))
                .sum();
            let objective = model.objective_value(&assignment);

            let better = best
                .as_ref()
                .map_or(true, |(v, o, _)| violation < *v || (violation == *v && objective < *o));
            if better {
                best = Some((violation, objective, assignment));
            }
        }

        best.map(|(_, _, assignment)| assignment)
            .ok_or_else(|| Error::SolverTimeout {
                name: self.name().to_owned(),
                budget,
            })
    }

    fn name(&self) -> &'static str {
        "RandomRestart"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Solver> = || Box::new(RandomRestart::default());
