use crate::core::{Model, Solver};
use crate::error::Error;
use std::time::{Duration, Instant};

/// Exact backend for small models: enumerates every combination of one
/// start per intervention. Exponential; meant for fixtures and sanity
/// checks, not production instances.
#[derive(Clone, Copy, Debug, Default)]
pub struct Enumerate;

impl Solver for Enumerate {
    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Vec<bool>, Error> {
        let started = Instant::now();
        let mut assignment = vec![false; model.variables().len()];
        let mut best: Option<(f64, f64, Vec<bool>)> = None;

        search(model, &mut assignment, 0, &mut best, started, budget).map_err(|()| {
            Error::SolverTimeout {
                name: self.name().to_owned(),
                budget,
            }
        })?;

        match best {
            Some((_, _, assignment)) => Ok(assignment),
            // A model always has at least the all-false point; only an
            // empty variable set lands here.
            None => Ok(assignment),
        }
    }

    fn name(&self) -> &'static str {
        "Enumerate"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Solver> = || Box::new(Enumerate);

/// Depth-first product of feasible starts. Keeps the assignment with the
/// smallest (total violation, objective) pair, so an infeasible model still
/// yields its least-violating point for the validator to report.
fn search(
    model: &Model,
    assignment: &mut Vec<bool>,
    intervention: usize,
    best: &mut Option<(f64, f64, Vec<bool>)>,
    started: Instant,
    budget: Duration,
) -> Result<(), ()> {
    if started.elapsed() >= budget {
        return Err(());
    }

    if intervention == model.intervention_count() {
        let violation: f64 = model
            .constraints()
            .iter()
            .map(|constraint| constraint.violation(assignment))
            .sum();
        let objective = model.objective_value(assignment);

        let better = best
            .as_ref()
            .map_or(true, |(v, o, _)| violation < *v || (violation == *v && objective < *o));
        if better {
            *best = Some((violation, objective, assignment.clone()));
        }
        return Ok(());
    }

    for &id in model.starts_of(intervention) {
        assignment[id] = true;
        search(model, assignment, intervention + 1, best, started, budget)?;
        assignment[id] = false;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compile::{compile, CompileOptions};
    use crate::core::{decode, DEFAULT_TOLERANCE};
    use crate::data::fixture::small_instance;

    #[test]
    fn finds_the_feasible_optimum_of_the_fixture() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let compilation = compile(&raw, CompileOptions::default())?;

        let assignment = Enumerate.solve(&compilation.model, Duration::from_secs(10))?;
        let evaluation = decode(
            &compilation.model,
            &compilation.index,
            &compilation.store,
            &assignment,
            DEFAULT_TOLERANCE,
        )?;

        assert!(evaluation.is_feasible());
        // All-at-first-start scores 10; the enumerator may only improve on it.
        assert!(evaluation.mean_risk <= 10.0);
        Ok(())
    }

    #[test]
    fn zero_budget_times_out() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let compilation = compile(&raw, CompileOptions::default())?;

        let result = Enumerate.solve(&compilation.model, Duration::ZERO);
        assert!(matches!(result, Err(Error::SolverTimeout { .. })));
        Ok(())
    }
}
