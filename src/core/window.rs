use super::{InstanceIndex, Store};

/// Start indices whose execution interval covers the given time step:
/// all `s` with `s ≤ t ≤ s + duration[i][s] − 1` and `s ≤ max_start[i]`.
///
/// The search is bounded to `[max(0, t − dmax[i]), min(t, max_start[i])]`;
/// a start outside that range cannot cover `t` by construction of `dmax`.
/// The result is ascending and duplicate-free, but constraint construction
/// treats it as a set.
#[must_use]
pub fn starts_covering(
    index: &InstanceIndex,
    store: &Store,
    intervention: usize,
    time: usize,
) -> Vec<usize> {
    let durations = index.durations(intervention);
    let first = time.saturating_sub(store.dmax(intervention));
    let last = time.min(index.max_start(intervention));

    (first..=last)
        .filter(|&start| time < start + durations[start])
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{fixture::small_instance, RawInstance, RawIntervention};
    use crate::error::Warning;

    /// One intervention of constant duration 3, startable anywhere in
    /// `[0, 5]` on a seven-step horizon.
    fn synthetic() -> anyhow::Result<(InstanceIndex, Store)> {
        let mut raw: RawInstance = serde_json::from_str(
            r#"{ "Resources": {}, "Seasons": { "all": [1, 2, 3, 4, 5, 6, 7] }, "Interventions": {} }"#,
        )?;
        raw.interventions.insert(
            "J".into(),
            RawIntervention {
                tmax: 6,
                delta: vec![3.0; 6],
                workload: ahash::HashMap::default(),
                risk: ahash::HashMap::default(),
            },
        );

        let mut warnings = Vec::new();
        let index = InstanceIndex::from_raw(&raw, &mut warnings)?;
        let store = Store::populate(&raw, &index, &mut warnings)?;
        Ok((index, store))
    }

    #[test]
    fn duration_three_window_over_time_four() -> anyhow::Result<()> {
        let (index, store) = synthetic()?;
        assert_eq!(starts_covering(&index, &store, 0, 4), vec![2, 3, 4]);
        Ok(())
    }

    #[test]
    fn window_respects_horizon_edges() -> anyhow::Result<()> {
        let (index, store) = synthetic()?;
        // Early steps cannot be covered by starts before the horizon.
        assert_eq!(starts_covering(&index, &store, 0, 0), vec![0]);
        assert_eq!(starts_covering(&index, &store, 0, 1), vec![0, 1]);
        // Late steps cannot be covered by starts past the deadline.
        assert_eq!(starts_covering(&index, &store, 0, 6), vec![4, 5]);
        Ok(())
    }

    #[test]
    fn window_uses_per_start_durations() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let mut warnings: Vec<Warning> = Vec::new();
        let index = InstanceIndex::from_raw(&raw, &mut warnings)?;
        let store = Store::populate(&raw, &index, &mut warnings)?;

        let i3 = index
            .intervention_id("I3")
            .ok_or_else(|| anyhow::anyhow!("missing I3"))?;
        // I3 runs 2 steps from either feasible start.
        assert_eq!(starts_covering(&index, &store, i3, 0), vec![0]);
        assert_eq!(starts_covering(&index, &store, i3, 1), vec![0, 1]);
        assert_eq!(starts_covering(&index, &store, i3, 2), vec![1]);
        Ok(())
    }
}
