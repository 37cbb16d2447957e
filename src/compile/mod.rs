#![allow(clippy::cast_precision_loss)]
mod constraints;
mod objective;

use crate::core::{InstanceIndex, Model, Store, VarId, Variable};
use crate::data::RawInstance;
use crate::error::{Error, Warning};

/// Shape chosen for mutual-exclusion constraints.
///
/// Both forms are logically equivalent over boolean variables; quadratic
/// emits one constraint per exclusion, linear emits one constraint per
/// conflicting start pair for backends without quadratic terms.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExclusionForm {
    #[default]
    Quadratic,
    Linear,
}

/// Deployment-time policy knobs of a compiler run.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompileOptions {
    pub exclusion_form: ExclusionForm,
}

/// Outcome of one compiler run: the dense index, the populated store, the
/// assembled model, and every non-fatal finding. All read-only from here on.
#[non_exhaustive]
#[derive(Debug)]
pub struct Compilation {
    pub index: InstanceIndex,
    pub store: Store,
    pub model: Model,
    pub warnings: Vec<Warning>,
}

/// Compiles a raw instance into an optimization model.
///
/// The store is fully populated before the constraint and objective passes
/// read it; the three passes write disjoint outputs and are merged into the
/// final model.
///
/// # Errors
/// - If any name or calendar reference fails to resolve; no partial model
///   is produced.
pub fn compile(raw: &RawInstance, options: CompileOptions) -> Result<Compilation, Error> {
    let mut warnings = Vec::new();

    let index = InstanceIndex::from_raw(raw, &mut warnings)?;
    let store = Store::populate(raw, &index, &mut warnings)?;

    let (variables, starts) = variables(&index);
    let mut set = constraints::cardinality(&index, &starts);
    set.extend(constraints::resource_bounds(
        &index,
        &store,
        &starts,
        &mut warnings,
    ));
    set.extend(constraints::exclusions(
        &index,
        &store,
        &starts,
        options.exclusion_form,
    ));
    let objective = objective::build(&index, &store, &starts);

    Ok(Compilation {
        index,
        store,
        model: Model::assemble(variables, starts, set, objective),
        warnings,
    })
}

/// One boolean variable per (startable intervention, feasible start).
fn variables(index: &InstanceIndex) -> (Vec<Variable>, Vec<Vec<VarId>>) {
    let mut variables = Vec::new();
    let mut starts = Vec::with_capacity(index.intervention_count());

    for intervention in 0..index.intervention_count() {
        let ids = (0..=index.max_start(intervention))
            .map(|start| {
                let id = variables.len();
                variables.push(Variable {
                    id,
                    intervention,
                    start,
                });
                id
            })
            .collect();
        starts.push(ids);
    }

    (variables, starts)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::Sense;
    use crate::data::fixture::small_instance;

    #[test]
    fn fixture_compiles_to_expected_shape() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let compilation = compile(&raw, CompileOptions::default())?;
        let model = &compilation.model;

        assert!(compilation.warnings.is_empty());
        // I1 has 1 feasible start, I2 has 3, I3 has 2.
        assert_eq!(model.variables().len(), 6);
        assert_eq!(model.starts_of(0).len(), 1);
        assert_eq!(model.starts_of(1).len(), 3);
        assert_eq!(model.starts_of(2).len(), 2);

        let cardinality: Vec<_> = model
            .constraints()
            .iter()
            .filter(|constraint| constraint.label().starts_with("one_start"))
            .collect();
        assert_eq!(cardinality.len(), 3);
        for (intervention, constraint) in cardinality.iter().enumerate() {
            assert_eq!(constraint.sense(), Sense::Equal);
            assert_eq!(constraint.bound(), 1.0);
            assert_eq!(
                constraint.linear_terms().len(),
                model.starts_of(intervention).len()
            );
            let coefficient_sum: f64 = constraint
                .linear_terms()
                .iter()
                .map(|&(_, coefficient)| coefficient)
                .sum();
            assert_eq!(
                coefficient_sum,
                model.starts_of(intervention).len() as f64
            );
        }
        Ok(())
    }

    #[test]
    fn recompilation_is_idempotent() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let first = compile(&raw, CompileOptions::default())?;
        let second = compile(&raw, CompileOptions::default())?;

        assert_eq!(first.model, second.model);
        assert_eq!(first.index, second.index);
        Ok(())
    }

    #[test]
    fn excluded_intervention_leaves_no_trace_in_the_model() -> anyhow::Result<()> {
        let mut raw = small_instance()?;
        if let Some(record) = raw.interventions.get_mut("I1") {
            record.tmax = 99;
        }

        let compilation = compile(&raw, CompileOptions::default())?;
        assert_eq!(compilation.index.intervention_id("I1"), None);
        assert_eq!(compilation.model.variables().len(), 5);
        assert!(compilation
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::DeadlineOutsideHorizon { .. })));
        Ok(())
    }
}
