#![allow(clippy::cast_precision_loss)]
use super::{InstanceIndex, Model, Store};
use crate::error::Error;

/// Violations at or below this magnitude are treated as numerical noise.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// One decoded start decision: an intervention and its calendar start time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedStart {
    pub intervention: String,
    pub start: i64,
}

/// A constraint violated beyond the tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    pub constraint: String,
    pub amount: f64,
}

/// The decoded and independently re-scored view of a solver assignment.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub plan: Vec<PlannedStart>,
    pub mean_risk: f64,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    /// Whether every constraint held within tolerance.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Decodes an assignment into a plan, recomputes the mean risk from the
/// store (independently of whatever the solver reported), and measures
/// every constraint's violation against the tolerance.
///
/// # Errors
/// - If the assignment length does not match the variable count.
/// - If any intervention has zero or several active starts. The
///   cardinality constraint should prevent this; it is checked anyway.
pub fn decode(
    model: &Model,
    index: &InstanceIndex,
    store: &Store,
    assignment: &[bool],
    tolerance: f64,
) -> Result<Evaluation, Error> {
    if assignment.len() != model.variables().len() {
        return Err(Error::AssignmentLength {
            got: assignment.len(),
            expected: model.variables().len(),
        });
    }

    let mut plan = Vec::with_capacity(index.intervention_count());
    let mut total_risk = 0.0;

    for intervention in 0..index.intervention_count() {
        let mut active = model
            .starts_of(intervention)
            .iter()
            .enumerate()
            .filter(|&(_, &id)| assignment[id])
            .map(|(start, _)| start);

        let start = match (active.next(), active.next()) {
            (Some(start), None) => start,
            (first, _) => {
                let count = first.map_or(0, |_| 2) + active.count();
                return Err(Error::Integrity {
                    name: index.intervention_name(intervention).to_owned(),
                    count,
                });
            }
        };

        total_risk += store.mean_risk(index, intervention, start);
        plan.push(PlannedStart {
            intervention: index.intervention_name(intervention).to_owned(),
            start: index.calendar(start),
        });
    }

    let violations = model
        .constraints()
        .iter()
        .map(|constraint| Violation {
            constraint: constraint.label().to_owned(),
            amount: constraint.violation(assignment),
        })
        .filter(|violation| violation.amount > tolerance)
        .collect();

    Ok(Evaluation {
        plan,
        mean_risk: total_risk / index.horizon() as f64,
        violations,
    })
}

/// Builds an assignment from plan lines, for validating an externally
/// produced solution file.
///
/// # Errors
/// - If a line names an unknown intervention.
/// - If a start time is outside the horizon or past the deadline.
pub fn assignment_from_plan(
    model: &Model,
    index: &InstanceIndex,
    plan: &[(String, i64)],
) -> Result<Vec<bool>, Error> {
    let mut assignment = vec![false; model.variables().len()];

    for (name, value) in plan {
        let intervention =
            index
                .intervention_id(name)
                .ok_or_else(|| Error::UnknownIntervention {
                    name: name.clone(),
                    referrer: "solution file".to_owned(),
                })?;
        let var = index
            .time_id(*value)
            .and_then(|start| model.var(intervention, start))
            .ok_or_else(|| Error::InfeasibleStart {
                name: name.clone(),
                value: *value,
            })?;
        assignment[var] = true;
    }

    Ok(assignment)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compile::{compile, CompileOptions, Compilation};
    use crate::data::fixture::small_instance;

    fn compiled() -> anyhow::Result<Compilation> {
        Ok(compile(&small_instance()?, CompileOptions::default())?)
    }

    fn all_at_first_start(model: &Model) -> Vec<bool> {
        let mut assignment = vec![false; model.variables().len()];
        for intervention in 0..3 {
            assignment[model.starts_of(intervention)[0]] = true;
        }
        assignment
    }

    #[test]
    fn round_trip_recovers_mean_risk_ten() -> anyhow::Result<()> {
        let compilation = compiled()?;
        let assignment = all_at_first_start(&compilation.model);

        let evaluation = decode(
            &compilation.model,
            &compilation.index,
            &compilation.store,
            &assignment,
            DEFAULT_TOLERANCE,
        )?;

        assert_eq!(evaluation.mean_risk, 10.0);
        assert!(evaluation.is_feasible());
        assert_eq!(
            evaluation.plan,
            vec![
                PlannedStart { intervention: "I1".into(), start: 1 },
                PlannedStart { intervention: "I2".into(), start: 1 },
                PlannedStart { intervention: "I3".into(), start: 1 },
            ]
        );
        Ok(())
    }

    #[test]
    fn decoded_risk_matches_solver_objective() -> anyhow::Result<()> {
        let compilation = compiled()?;
        let assignment = all_at_first_start(&compilation.model);

        let evaluation = decode(
            &compilation.model,
            &compilation.index,
            &compilation.store,
            &assignment,
            DEFAULT_TOLERANCE,
        )?;
        let horizon = compilation.index.horizon() as f64;
        assert_eq!(
            evaluation.mean_risk,
            compilation.model.objective_value(&assignment) / horizon
        );
        Ok(())
    }

    #[test]
    fn multiple_active_starts_fail_integrity() -> anyhow::Result<()> {
        let compilation = compiled()?;
        let mut assignment = all_at_first_start(&compilation.model);
        assignment[compilation.model.starts_of(1)[1]] = true;

        let result = decode(
            &compilation.model,
            &compilation.index,
            &compilation.store,
            &assignment,
            DEFAULT_TOLERANCE,
        );
        assert!(matches!(
            result,
            Err(Error::Integrity { name, count: 2 }) if name == "I2"
        ));
        Ok(())
    }

    #[test]
    fn missing_start_fails_integrity() -> anyhow::Result<()> {
        let compilation = compiled()?;
        let assignment = vec![false; compilation.model.variables().len()];

        let result = decode(
            &compilation.model,
            &compilation.index,
            &compilation.store,
            &assignment,
            DEFAULT_TOLERANCE,
        );
        assert!(matches!(result, Err(Error::Integrity { count: 0, .. })));
        Ok(())
    }

    #[test]
    fn violations_report_constraint_and_magnitude() -> anyhow::Result<()> {
        let compilation = compiled()?;
        // I2 at calendar 3 and I3 at calendar 2 trip the exclusion and
        // stack 22 units of workload against the max of 15 at calendar 3.
        let plan = vec![
            ("I1".to_owned(), 1),
            ("I2".to_owned(), 3),
            ("I3".to_owned(), 2),
        ];
        let assignment = assignment_from_plan(&compilation.model, &compilation.index, &plan)?;
        let evaluation = decode(
            &compilation.model,
            &compilation.index,
            &compilation.store,
            &assignment,
            DEFAULT_TOLERANCE,
        )?;

        assert!(!evaluation.is_feasible());
        assert!(evaluation
            .violations
            .iter()
            .any(|violation| violation.constraint == "excl[E1]" && violation.amount == 1.0));
        assert!(evaluation
            .violations
            .iter()
            .any(|violation| violation.constraint == "res_max[c1,3]" && violation.amount == 7.0));
        Ok(())
    }

    #[test]
    fn plan_with_unknown_intervention_is_fatal() -> anyhow::Result<()> {
        let compilation = compiled()?;
        let plan = vec![("ghost".to_owned(), 1)];
        let result = assignment_from_plan(&compilation.model, &compilation.index, &plan);
        assert!(matches!(result, Err(Error::UnknownIntervention { .. })));

        let plan = vec![("I1".to_owned(), 3)];
        let result = assignment_from_plan(&compilation.model, &compilation.index, &plan);
        assert!(matches!(result, Err(Error::InfeasibleStart { .. })));
        Ok(())
    }
}
