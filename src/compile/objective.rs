use crate::core::{InstanceIndex, Store, VarId};

/// The linear minimization objective: one weighted term per (intervention,
/// start) with non-zero risk contribution. The raw objective value is the
/// un-normalized total; callers divide by the horizon length for the
/// published mean-risk metric.
pub(super) fn build(
    index: &InstanceIndex,
    store: &Store,
    starts: &[Vec<VarId>],
) -> Vec<(VarId, f64)> {
    let mut objective = Vec::new();

    for (intervention, ids) in starts.iter().enumerate() {
        for (start, &id) in ids.iter().enumerate() {
            let contribution = store.mean_risk(index, intervention, start);
            if contribution != 0.0 {
                objective.push((id, contribution));
            }
        }
    }

    objective
}
