use std::time::Duration;
use thiserror::Error;

/// Errors produced while compiling an instance or decoding a solution.
///
/// Name-resolution failures abort model construction; no partial model is
/// ever handed out. Decode-time failures abort validation of the offending
/// assignment only.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A workload record references a resource the instance never declares.
    #[error("unknown resource `{name}` in workload of intervention `{intervention}`")]
    UnknownResource { name: String, intervention: String },

    /// An exclusion or solution references an intervention that does not exist.
    #[error("unknown intervention `{name}` referenced by `{referrer}`")]
    UnknownIntervention { name: String, referrer: String },

    /// An exclusion references a season that does not exist.
    #[error("unknown season `{name}` referenced by exclusion `{exclusion}`")]
    UnknownSeason { name: String, exclusion: String },

    /// A calendar value does not belong to the planning horizon.
    #[error("calendar value {value} in `{entity}` is not a horizon time step")]
    UnknownTime { entity: String, value: i64 },

    /// A workload or risk map key is not a calendar value.
    #[error("invalid calendar key `{key}` in `{entity}`")]
    InvalidKey { entity: String, key: String },

    /// An intervention's duration vector is shorter than its feasible starts.
    #[error("intervention `{name}` has no duration for start index {start}")]
    MissingDuration { name: String, start: usize },

    /// A resource's bound vectors do not span the horizon.
    #[error("resource `{name}` bounds cover {got} time steps, horizon has {expected}")]
    BoundsLength {
        name: String,
        got: usize,
        expected: usize,
    },

    /// A decoded assignment activates zero or several starts for one
    /// intervention. The cardinality constraint should rule this out, so it
    /// is checked defensively.
    #[error("intervention `{name}` has {count} active starts, expected exactly one")]
    Integrity { name: String, count: usize },

    /// The assignment's length does not match the model's variable count.
    #[error("assignment holds {got} values, model has {expected} variables")]
    AssignmentLength { got: usize, expected: usize },

    /// A solution file schedules an intervention at an infeasible start.
    #[error("intervention `{name}` cannot start at calendar time {value}")]
    InfeasibleStart { name: String, value: i64 },

    /// The solver exhausted its time budget without producing an assignment.
    #[error("solver `{name}` exceeded its time budget of {budget:?}")]
    SolverTimeout { name: String, budget: Duration },

    /// The solver backend cannot run at all.
    #[error("solver `{name}` is unavailable: {reason}")]
    SolverUnavailable { name: String, reason: String },
}

/// Non-fatal data-consistency findings. Construction continues; each finding
/// is logged and accumulated on the compilation so callers can inspect it.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Warning {
    /// Two risk entries at the same time step disagree on the scenario
    /// count. The first count encountered wins.
    ScenarioCountMismatch {
        intervention: String,
        time: i64,
        expected: usize,
        got: usize,
    },
    /// `min > max` for a resource at a time step with feasible workload.
    InvertedBounds { resource: String, time: i64 },
    /// A positive resource minimum that no (intervention, start) pair can
    /// contribute to; the instance is unsatisfiable as given.
    UnreachableMinimum {
        resource: String,
        time: i64,
        minimum: f64,
    },
    /// An intervention whose deadline falls outside the horizon; it is left
    /// out of the model entirely.
    DeadlineOutsideHorizon { intervention: String, tmax: i64 },
    /// An exclusion referencing an intervention that was left out of the
    /// model; the exclusion is dropped.
    DroppedExclusion {
        exclusion: String,
        intervention: String,
    },
}

impl Warning {
    /// Logs the warning through the crate's tracing subscriber.
    pub fn emit(&self) {
        tracing::warn!("{self}");
    }

    /// Logs the warning and accumulates it on the compilation.
    pub fn record(self, sink: &mut Vec<Self>) {
        self.emit();
        sink.push(self);
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScenarioCountMismatch {
                intervention,
                time,
                expected,
                got,
            } => write!(
                f,
                "intervention `{intervention}` reports {got} risk scenarios at time {time}, \
                 expected {expected}"
            ),
            Self::InvertedBounds { resource, time } => {
                write!(f, "resource `{resource}` has min > max at time {time}")
            }
            Self::UnreachableMinimum {
                resource,
                time,
                minimum,
            } => write!(
                f,
                "resource `{resource}` requires {minimum} at time {time} but nothing can \
                 contribute workload there"
            ),
            Self::DeadlineOutsideHorizon { intervention, tmax } => write!(
                f,
                "intervention `{intervention}` has deadline {tmax} outside the horizon and is \
                 excluded from the model"
            ),
            Self::DroppedExclusion {
                exclusion,
                intervention,
            } => write!(
                f,
                "exclusion `{exclusion}` dropped: intervention `{intervention}` is not in the \
                 model"
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn errors_carry_context() {
        let error = Error::UnknownResource {
            name: "c9".into(),
            intervention: "I1".into(),
        };
        assert!(error.to_string().contains("c9"));
        assert!(error.to_string().contains("I1"));

        let error = Error::Integrity {
            name: "I2".into(),
            count: 2,
        };
        assert!(error.to_string().contains("2 active starts"));
    }

    #[test]
    fn warnings_display_entities() {
        let warning = Warning::UnreachableMinimum {
            resource: "c1".into(),
            time: 3,
            minimum: 6.0,
        };
        assert!(warning.to_string().contains("c1"));
        assert!(warning.to_string().contains('3'));
    }
}
