#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
use crate::data::RawInstance;
use crate::error::{Error, Warning};
use ahash::{HashMap, HashMapExt};

/// A pairwise exclusion resolved against the index: two interventions that
/// must not run simultaneously during the given horizon time steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exclusion {
    pub name: String,
    pub first: usize,
    pub second: usize,
    pub times: Vec<usize>,
}

/// Dense integer indices over a raw instance.
///
/// Resources, horizon time steps, and startable interventions each get
/// zero-based indices; lookups work in both directions. The horizon is the
/// sorted, deduplicated union of all season calendar values. Interventions
/// whose deadline falls outside the horizon are left out entirely and
/// reported as warnings.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceIndex {
    resource_names: Vec<String>,
    resource_ids: HashMap<String, usize>,
    resource_min: Vec<Vec<f64>>,
    resource_max: Vec<Vec<f64>>,
    times: Vec<i64>,
    time_ids: HashMap<i64, usize>,
    intervention_names: Vec<String>,
    intervention_ids: HashMap<String, usize>,
    max_start: Vec<usize>,
    durations: Vec<Vec<usize>>,
    exclusions: Vec<Exclusion>,
    skipped: Vec<String>,
}

impl InstanceIndex {
    /// Builds the index from raw records.
    ///
    /// Iteration happens in sorted name order so two runs over the same
    /// input produce identical indices.
    ///
    /// # Errors
    /// - If a resource bound vector does not span the horizon.
    /// - If an intervention's duration vector is shorter than its feasible
    ///   start range.
    /// - If an exclusion references a season or a never-declared
    ///   intervention.
    pub fn from_raw(raw: &RawInstance, warnings: &mut Vec<Warning>) -> Result<Self, Error> {
        let times = horizon_times(raw);
        let time_ids = times
            .iter()
            .enumerate()
            .map(|(id, &value)| (value, id))
            .collect();

        let mut index = Self {
            resource_names: Vec::new(),
            resource_ids: HashMap::new(),
            resource_min: Vec::new(),
            resource_max: Vec::new(),
            times,
            time_ids,
            intervention_names: Vec::new(),
            intervention_ids: HashMap::new(),
            max_start: Vec::new(),
            durations: Vec::new(),
            exclusions: Vec::new(),
            skipped: Vec::new(),
        };

        index.register_resources(raw)?;
        index.register_interventions(raw, warnings)?;
        index.register_exclusions(raw, warnings)?;

        Ok(index)
    }

    fn register_resources(&mut self, raw: &RawInstance) -> Result<(), Error> {
        for name in sorted_keys(raw.resources.keys()) {
            let resource = &raw.resources[name];
            for bounds in [&resource.min, &resource.max] {
                if bounds.len() != self.horizon() {
                    return Err(Error::BoundsLength {
                        name: name.clone(),
                        got: bounds.len(),
                        expected: self.horizon(),
                    });
                }
            }

            self.resource_ids
                .insert(name.clone(), self.resource_names.len());
            self.resource_names.push(name.clone());
            self.resource_min.push(resource.min.clone());
            self.resource_max.push(resource.max.clone());
        }
        Ok(())
    }

    fn register_interventions(
        &mut self,
        raw: &RawInstance,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), Error> {
        for name in sorted_keys(raw.interventions.keys()) {
            let intervention = &raw.interventions[name];

            let Some(max_start) = self.last_feasible_start(intervention.tmax) else {
                Warning::DeadlineOutsideHorizon {
                    intervention: name.clone(),
                    tmax: intervention.tmax,
                }
                .record(warnings);
                self.skipped.push(name.clone());
                continue;
            };

            let mut durations = Vec::with_capacity(max_start + 1);
            for start in 0..=max_start {
                let duration =
                    intervention
                        .delta
                        .get(start)
                        .ok_or_else(|| Error::MissingDuration {
                            name: name.clone(),
                            start,
                        })?;
                durations.push(duration.round() as usize);
            }

            self.intervention_ids
                .insert(name.clone(), self.intervention_names.len());
            self.intervention_names.push(name.clone());
            self.max_start.push(max_start);
            self.durations.push(durations);
        }
        Ok(())
    }

    fn register_exclusions(
        &mut self,
        raw: &RawInstance,
        warnings: &mut Vec<Warning>,
    ) -> Result<(), Error> {
        for name in sorted_keys(raw.exclusions.keys()) {
            let (first, second, season) = &raw.exclusions[name];

            let times = raw
                .seasons
                .get(season)
                .ok_or_else(|| Error::UnknownSeason {
                    name: season.clone(),
                    exclusion: name.clone(),
                })?
                .iter()
                .filter_map(|&value| self.time_id(value))
                .collect();

            let mut pair = [0; 2];
            let mut dropped = false;
            for (slot, referenced) in pair.iter_mut().zip([first, second]) {
                match self.intervention_id(referenced) {
                    Some(id) => *slot = id,
                    None if raw.interventions.contains_key(referenced) => {
                        Warning::DroppedExclusion {
                            exclusion: name.clone(),
                            intervention: referenced.clone(),
                        }
                        .record(warnings);
                        dropped = true;
                    }
                    None => {
                        return Err(Error::UnknownIntervention {
                            name: referenced.clone(),
                            referrer: format!("exclusion `{name}`"),
                        })
                    }
                }
            }

            if !dropped {
                self.exclusions.push(Exclusion {
                    name: name.clone(),
                    first: pair[0],
                    second: pair[1],
                    times,
                });
            }
        }
        Ok(())
    }

    /// Index of the last horizon step at or before the deadline, or `None`
    /// when the deadline falls outside the horizon.
    fn last_feasible_start(&self, tmax: i64) -> Option<usize> {
        let (&front, &back) = (self.times.first()?, self.times.last()?);
        if tmax < front || tmax > back {
            return None;
        }
        Some(self.times.partition_point(|&value| value <= tmax) - 1)
    }

    /// Number of time steps in the planning horizon.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.times.len()
    }

    /// Calendar value of a horizon time index.
    #[must_use]
    pub fn calendar(&self, time: usize) -> i64 {
        self.times[time]
    }

    /// Horizon index of a calendar value, if it belongs to the horizon.
    #[must_use]
    pub fn time_id(&self, value: i64) -> Option<usize> {
        self.time_ids.get(&value).copied()
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resource_names.len()
    }

    #[must_use]
    pub fn resource_name(&self, resource: usize) -> &str {
        &self.resource_names[resource]
    }

    #[must_use]
    pub fn resource_id(&self, name: &str) -> Option<usize> {
        self.resource_ids.get(name).copied()
    }

    /// Lower capacity bounds of a resource, one per horizon step.
    #[must_use]
    pub fn resource_min(&self, resource: usize) -> &[f64] {
        &self.resource_min[resource]
    }

    /// Upper capacity bounds of a resource, one per horizon step.
    #[must_use]
    pub fn resource_max(&self, resource: usize) -> &[f64] {
        &self.resource_max[resource]
    }

    /// Number of startable interventions (deadline within the horizon).
    #[must_use]
    pub fn intervention_count(&self) -> usize {
        self.intervention_names.len()
    }

    #[must_use]
    pub fn intervention_name(&self, intervention: usize) -> &str {
        &self.intervention_names[intervention]
    }

    #[must_use]
    pub fn intervention_id(&self, name: &str) -> Option<usize> {
        self.intervention_ids.get(name).copied()
    }

    /// Last feasible start index of an intervention.
    #[must_use]
    pub fn max_start(&self, intervention: usize) -> usize {
        self.max_start[intervention]
    }

    /// Execution duration per feasible start index.
    #[must_use]
    pub fn durations(&self, intervention: usize) -> &[usize] {
        &self.durations[intervention]
    }

    #[must_use]
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// Interventions left out of the model because of their deadline.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }
}

fn horizon_times(raw: &RawInstance) -> Vec<i64> {
    let mut times: Vec<i64> = raw.seasons.values().flatten().copied().collect();
    times.sort_unstable();
    times.dedup();
    times
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<&'a String> {
    let mut keys: Vec<_> = keys.collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::fixture::small_instance;

    #[test]
    fn index_maps_names_both_ways() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let mut warnings = Vec::new();
        let index = InstanceIndex::from_raw(&raw, &mut warnings)?;

        assert!(warnings.is_empty());
        assert_eq!(index.horizon(), 3);
        assert_eq!(index.calendar(0), 1);
        assert_eq!(index.time_id(3), Some(2));
        assert_eq!(index.time_id(4), None);

        assert_eq!(index.resource_count(), 1);
        assert_eq!(index.resource_id("c1"), Some(0));
        assert_eq!(index.resource_name(0), "c1");

        assert_eq!(index.intervention_count(), 3);
        for name in ["I1", "I2", "I3"] {
            let id = index.intervention_id(name);
            assert!(id.is_some_and(|id| index.intervention_name(id) == name));
        }
        Ok(())
    }

    #[test]
    fn feasible_start_ranges_follow_deadlines() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let mut warnings = Vec::new();
        let index = InstanceIndex::from_raw(&raw, &mut warnings)?;

        let i1 = index.intervention_id("I1").ok_or_else(|| anyhow::anyhow!("I1"))?;
        let i2 = index.intervention_id("I2").ok_or_else(|| anyhow::anyhow!("I2"))?;
        assert_eq!(index.max_start(i1), 0);
        assert_eq!(index.max_start(i2), 2);
        assert_eq!(index.durations(i1), &[3]);
        assert_eq!(index.durations(i2), &[1, 1, 1]);
        Ok(())
    }

    #[test]
    fn out_of_horizon_deadline_excludes_intervention() -> anyhow::Result<()> {
        let mut raw = small_instance()?;
        if let Some(intervention) = raw.interventions.get_mut("I2") {
            intervention.tmax = 9;
        }

        let mut warnings = Vec::new();
        let index = InstanceIndex::from_raw(&raw, &mut warnings)?;

        assert_eq!(index.intervention_count(), 2);
        assert_eq!(index.intervention_id("I2"), None);
        assert_eq!(index.skipped(), &["I2".to_owned()]);
        assert!(warnings
            .iter()
            .any(|w| matches!(w, Warning::DeadlineOutsideHorizon { intervention, .. } if intervention == "I2")));
        // The exclusion referencing I2 is dropped, not fatal.
        assert!(index.exclusions().is_empty());
        assert!(warnings
            .iter()
            .any(|w| matches!(w, Warning::DroppedExclusion { .. })));
        Ok(())
    }

    #[test]
    fn unresolved_exclusion_name_is_fatal() -> anyhow::Result<()> {
        let mut raw = small_instance()?;
        raw.exclusions
            .insert("E2".into(), ("I2".into(), "ghost".into(), "full".into()));

        let mut warnings = Vec::new();
        let result = InstanceIndex::from_raw(&raw, &mut warnings);
        assert!(matches!(
            result,
            Err(Error::UnknownIntervention { name, .. }) if name == "ghost"
        ));
        Ok(())
    }

    #[test]
    fn exclusion_resolves_season_times() -> anyhow::Result<()> {
        let raw = small_instance()?;
        let mut warnings = Vec::new();
        let index = InstanceIndex::from_raw(&raw, &mut warnings)?;

        let exclusion = &index.exclusions()[0];
        assert_eq!(exclusion.name, "E1");
        assert_eq!(exclusion.times, vec![2]);
        assert_eq!(index.intervention_name(exclusion.first), "I2");
        assert_eq!(index.intervention_name(exclusion.second), "I3");
        Ok(())
    }
}
