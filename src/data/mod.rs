mod plan;

pub use plan::*;

use ahash::HashMap;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Raw per-resource record: capacity bounds per horizon time step.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RawResource {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Raw per-intervention record.
///
/// `tmax` is the deadline (latest feasible calendar start). `delta` holds
/// the execution duration per candidate start index. Workload is keyed
/// resource → time → start, risk is keyed time → start → per-scenario
/// values; calendar values are serialized as JSON object keys. Absent
/// combinations carry zero workload and zero risk.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RawIntervention {
    pub tmax: i64,
    #[serde(rename = "Delta")]
    pub delta: Vec<f64>,
    #[serde(default)]
    pub workload: HashMap<String, HashMap<String, HashMap<String, f64>>>,
    #[serde(default)]
    pub risk: HashMap<String, HashMap<String, Vec<f64>>>,
}

/// A raw scheduling instance as read from disk.
///
/// The planning horizon is the sorted, deduplicated union of all season
/// time values. Exclusions name two interventions and the season during
/// which they must not run simultaneously.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RawInstance {
    #[serde(rename = "Resources")]
    pub resources: HashMap<String, RawResource>,
    #[serde(rename = "Seasons")]
    pub seasons: HashMap<String, Vec<i64>>,
    #[serde(rename = "Interventions")]
    pub interventions: HashMap<String, RawIntervention>,
    #[serde(rename = "Exclusions", default)]
    pub exclusions: HashMap<String, (String, String, String)>,
}

impl RawInstance {
    /// Creates an instance from its record families.
    #[must_use]
    pub fn new(
        resources: HashMap<String, RawResource>,
        seasons: HashMap<String, Vec<i64>>,
        interventions: HashMap<String, RawIntervention>,
        exclusions: HashMap<String, (String, String, String)>,
    ) -> Self {
        Self {
            resources,
            seasons,
            interventions,
            exclusions,
        }
    }
}

/// Reads an instance from a buffered reader.
///
/// # Errors
/// - If the reader does not hold a valid JSON instance.
pub fn deserialize(reader: &mut impl BufRead) -> anyhow::Result<RawInstance> {
    serde_json::from_reader(reader).context("reading instance")
}

/// Serializes a value into a pretty-printed JSON string.
///
/// # Errors
/// - If the value cannot be serialized.
pub fn to_string(value: &impl Serialize) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("writing instance")
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn instance_should_round_trip() -> anyhow::Result<()> {
        let instance = fixture::small_instance()?;

        let serialized = to_string(&instance)?;
        let mut reader = std::io::Cursor::new(serialized);
        let deserialized: RawInstance = deserialize(&mut reader)?;

        assert_eq!(instance, deserialized);
        Ok(())
    }

    #[test]
    fn fixture_has_expected_shape() -> anyhow::Result<()> {
        let instance = fixture::small_instance()?;

        assert_eq!(instance.resources.len(), 1);
        assert_eq!(instance.interventions.len(), 3);
        assert_eq!(instance.exclusions.len(), 1);
        assert_eq!(instance.interventions["I1"].delta, vec![3.0]);
        assert_eq!(
            instance.exclusions["E1"],
            ("I2".into(), "I3".into(), "late".into())
        );
        Ok(())
    }

    #[test]
    fn missing_exclusions_default_to_empty() -> anyhow::Result<()> {
        let text = r#"{
            "Resources": {},
            "Seasons": { "s": [1] },
            "Interventions": {}
        }"#;
        let instance = deserialize(&mut std::io::Cursor::new(text))?;
        assert!(instance.exclusions.is_empty());
        Ok(())
    }
}
