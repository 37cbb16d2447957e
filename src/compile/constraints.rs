use super::ExclusionForm;
use crate::core::{starts_covering, Constraint, InstanceIndex, Sense, Store, VarId};
use crate::error::Warning;
use std::collections::BTreeSet;

/// One `Σ_s x[i][s] = 1` constraint per startable intervention.
pub(super) fn cardinality(index: &InstanceIndex, starts: &[Vec<VarId>]) -> Vec<Constraint> {
    starts
        .iter()
        .enumerate()
        .map(|(intervention, ids)| {
            Constraint::linear(
                format!("one_start[{}]", index.intervention_name(intervention)),
                ids.iter().map(|&id| (id, 1.0)).collect(),
                Sense::Equal,
                1.0,
            )
        })
        .collect()
}

/// Capacity constraints per (resource, time) pair.
///
/// The lower bound is emitted only for a strictly positive minimum (a zero
/// minimum is trivially satisfiable and omitted on purpose). The upper
/// bound is emitted only when the sum of all possible contributions exceeds
/// it; an upper bound nothing can violate is redundant. A positive minimum
/// with no possible contributor marks the instance unsatisfiable, which is
/// reported but does not abort construction.
pub(super) fn resource_bounds(
    index: &InstanceIndex,
    store: &Store,
    starts: &[Vec<VarId>],
    warnings: &mut Vec<Warning>,
) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for resource in 0..index.resource_count() {
        for time in 0..index.horizon() {
            let mut terms = Vec::new();
            for (intervention, ids) in starts.iter().enumerate() {
                for start in starts_covering(index, store, intervention, time) {
                    let fraction = store.workload(intervention, resource, time, start);
                    if fraction > 0.0 {
                        terms.push((ids[start], fraction));
                    }
                }
            }

            let minimum = index.resource_min(resource)[time];
            let maximum = index.resource_max(resource)[time];
            let calendar = index.calendar(time);

            if terms.is_empty() {
                if minimum > 0.0 {
                    Warning::UnreachableMinimum {
                        resource: index.resource_name(resource).to_owned(),
                        time: calendar,
                        minimum,
                    }
                    .record(warnings);
                }
                continue;
            }

            if minimum > maximum {
                Warning::InvertedBounds {
                    resource: index.resource_name(resource).to_owned(),
                    time: calendar,
                }
                .record(warnings);
            }

            if minimum > 0.0 {
                constraints.push(Constraint::linear(
                    format!("res_min[{},{calendar}]", index.resource_name(resource)),
                    terms.clone(),
                    Sense::AtLeast,
                    minimum,
                ));
            }

            let possible: f64 = terms.iter().map(|&(_, fraction)| fraction).sum();
            if possible > maximum {
                constraints.push(Constraint::linear(
                    format!("res_max[{},{calendar}]", index.resource_name(resource)),
                    terms,
                    Sense::AtMost,
                    maximum,
                ));
            }
        }
    }

    constraints
}

/// Mutual-exclusion constraints, one exclusion record at a time.
///
/// For each conflict time the start pairs keeping both interventions active
/// are collected; pairs reachable through several conflict times count
/// once. Empty pair sets emit nothing.
pub(super) fn exclusions(
    index: &InstanceIndex,
    store: &Store,
    starts: &[Vec<VarId>],
    form: ExclusionForm,
) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for exclusion in index.exclusions() {
        let mut pairs = BTreeSet::new();
        for &time in &exclusion.times {
            let firsts = starts_covering(index, store, exclusion.first, time);
            let seconds = starts_covering(index, store, exclusion.second, time);
            for &first in &firsts {
                for &second in &seconds {
                    pairs.insert((first, second));
                }
            }
        }

        if pairs.is_empty() {
            continue;
        }

        match form {
            ExclusionForm::Quadratic => {
                let terms = pairs
                    .into_iter()
                    .map(|(first, second)| {
                        (starts[exclusion.first][first], starts[exclusion.second][second], 1.0)
                    })
                    .collect();
                constraints.push(Constraint::quadratic(
                    format!("excl[{}]", exclusion.name),
                    terms,
                    Sense::Equal,
                    0.0,
                ));
            }
            ExclusionForm::Linear => {
                for (first, second) in pairs {
                    constraints.push(Constraint::linear(
                        format!(
                            "excl[{},{},{}]",
                            exclusion.name,
                            index.calendar(first),
                            index.calendar(second)
                        ),
                        vec![
                            (starts[exclusion.first][first], 1.0),
                            (starts[exclusion.second][second], 1.0),
                        ],
                        Sense::AtMost,
                        1.0,
                    ));
                }
            }
        }
    }

    constraints
}
