use super::InstanceIndex;
use crate::data::{RawInstance, RawIntervention};
use crate::error::{Error, Warning};
use ahash::{HashMap, HashMapExt};

/// Sparse workload and risk lookups over index space.
///
/// Workload is keyed `(intervention, resource, time, start)`, risk is one
/// sparse `(intervention, time, start)` map per scenario index. Absent
/// combinations are zero. Also derives the per-time scenario count `R[t]`
/// and each intervention's maximum duration over its feasible starts.
#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    workload: HashMap<(usize, usize, usize, usize), f64>,
    risk: Vec<HashMap<(usize, usize, usize), f64>>,
    scenarios: Vec<usize>,
    dmax: Vec<usize>,
}

impl Store {
    /// Populates the store from raw records, canonicalized through the
    /// index. Entries keyed by a start the intervention cannot take are
    /// skipped; zero values are not stored.
    ///
    /// The first risk entry seen for a time step fixes its scenario count;
    /// later entries of a different length are reported as warnings and the
    /// resolved count stands.
    ///
    /// # Errors
    /// - If a workload record references an undeclared resource.
    /// - If a workload or risk key is not a calendar value of the horizon.
    pub fn populate(
        raw: &RawInstance,
        index: &InstanceIndex,
        warnings: &mut Vec<Warning>,
    ) -> Result<Self, Error> {
        let mut store = Self {
            workload: HashMap::new(),
            risk: Vec::new(),
            scenarios: vec![0; index.horizon()],
            dmax: (0..index.intervention_count())
                .map(|i| index.durations(i).iter().copied().max().unwrap_or_default())
                .collect(),
        };

        for intervention in 0..index.intervention_count() {
            let name = index.intervention_name(intervention);
            let record = &raw.interventions[name];
            store.add_workload(index, intervention, name, record)?;
            store.add_risk(index, intervention, name, record, warnings)?;
        }

        Ok(store)
    }

    fn add_workload(
        &mut self,
        index: &InstanceIndex,
        intervention: usize,
        name: &str,
        record: &RawIntervention,
    ) -> Result<(), Error> {
        let entity = format!("workload of `{name}`");

        for (resource_name, by_time) in &record.workload {
            let resource =
                index
                    .resource_id(resource_name)
                    .ok_or_else(|| Error::UnknownResource {
                        name: resource_name.clone(),
                        intervention: name.to_owned(),
                    })?;

            for (time_key, by_start) in by_time {
                let time = resolve_time(index, &entity, time_key)?;
                for (start_key, &fraction) in by_start {
                    let start = resolve_time(index, &entity, start_key)?;
                    if start > index.max_start(intervention) || fraction == 0.0 {
                        continue;
                    }
                    self.workload
                        .insert((intervention, resource, time, start), fraction);
                }
            }
        }
        Ok(())
    }

    fn add_risk(
        &mut self,
        index: &InstanceIndex,
        intervention: usize,
        name: &str,
        record: &RawIntervention,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), Error> {
        let entity = format!("risk of `{name}`");

        for (time_key, by_start) in &record.risk {
            let time = resolve_time(index, &entity, time_key)?;
            for (start_key, values) in by_start {
                let start = resolve_time(index, &entity, start_key)?;
                if start > index.max_start(intervention) {
                    continue;
                }

                // First assignment wins for R[t].
                if self.scenarios[time] == 0 {
                    self.scenarios[time] = values.len();
                } else if self.scenarios[time] != values.len() {
                    Warning::ScenarioCountMismatch {
                        intervention: name.to_owned(),
                        time: index.calendar(time),
                        expected: self.scenarios[time],
                        got: values.len(),
                    }
                    .record(warnings);
                }

                while self.risk.len() < values.len() {
                    self.risk.push(HashMap::new());
                }
                for (scenario, &value) in values.iter().enumerate() {
                    if value != 0.0 {
                        self.risk[scenario].insert((intervention, time, start), value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Workload fraction of `(intervention, resource, time, start)`, zero
    /// when absent.
    #[must_use]
    pub fn workload(&self, intervention: usize, resource: usize, time: usize, start: usize) -> f64 {
        self.workload
            .get(&(intervention, resource, time, start))
            .copied()
            .unwrap_or_default()
    }

    /// Risk of `(scenario, intervention, time, start)`, zero when absent.
    #[must_use]
    pub fn risk(&self, scenario: usize, intervention: usize, time: usize, start: usize) -> f64 {
        self.risk
            .get(scenario)
            .and_then(|map| map.get(&(intervention, time, start)))
            .copied()
            .unwrap_or_default()
    }

    /// Number of risk scenarios evaluated at a time step.
    #[must_use]
    pub fn scenario_count(&self, time: usize) -> usize {
        self.scenarios[time]
    }

    /// Maximum duration of an intervention over all its feasible starts.
    #[must_use]
    pub fn dmax(&self, intervention: usize) -> usize {
        self.dmax[intervention]
    }

    /// Scenario-averaged risk of starting an intervention at `start`,
    /// summed over the execution window truncated to the horizon:
    /// `Σ_t Σ_r risk[r][i][t][s] / R[t]`.
    ///
    /// Single source of the risk aggregation: both the objective builder
    /// and the decoder's recomputed score go through here.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_risk(&self, index: &InstanceIndex, intervention: usize, start: usize) -> f64 {
        let duration = index.durations(intervention)[start];
        let end = (start + duration).min(index.horizon());

        (start..end)
            .map(|time| {
                let scenarios = self.scenario_count(time);
                if scenarios == 0 {
                    return 0.0;
                }
                let total: f64 = (0..scenarios)
                    .map(|scenario| self.risk(scenario, intervention, time, start))
                    .sum();
                total / scenarios as f64
            })
            .sum()
    }

    /// Number of stored workload entries.
    #[must_use]
    pub fn workload_entries(&self) -> usize {
        self.workload.len()
    }

    /// Number of stored risk entries across all scenarios.
    #[must_use]
    pub fn risk_entries(&self) -> usize {
        self.risk.iter().map(HashMap::len).sum()
    }
}

fn resolve_time(index: &InstanceIndex, entity: &str, key: &str) -> Result<usize, Error> {
    let value: i64 = key.parse().map_err(|_| Error::InvalidKey {
        entity: entity.to_owned(),
        key: key.to_owned(),
    })?;
    index.time_id(value).ok_or_else(|| Error::UnknownTime {
        entity: entity.to_owned(),
        value,
    })
}
