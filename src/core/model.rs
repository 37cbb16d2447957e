/// Identifier of a decision variable inside one model.
pub type VarId = usize;

/// Binary decision variable `x[i][s]`: intervention `i` starts at start
/// index `s`. Identity is fixed at assembly; the solved value arrives later
/// from the solver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Variable {
    pub id: VarId,
    pub intervention: usize,
    pub start: usize,
}

/// Comparison of a constraint's left-hand side against its bound.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Sense {
    Equal,
    AtMost,
    AtLeast,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::AtMost => write!(f, "<="),
            Self::AtLeast => write!(f, ">="),
        }
    }
}

/// A named predicate over a linear or quadratic combination of variables.
/// Created once by the constraint generator, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    label: String,
    linear: Vec<(VarId, f64)>,
    quadratic: Vec<(VarId, VarId, f64)>,
    sense: Sense,
    bound: f64,
}

impl Constraint {
    /// Creates a purely linear constraint.
    #[must_use]
    pub fn linear(label: String, terms: Vec<(VarId, f64)>, sense: Sense, bound: f64) -> Self {
        Self {
            label,
            linear: terms,
            quadratic: Vec::new(),
            sense,
            bound,
        }
    }

    /// Creates a purely quadratic constraint.
    #[must_use]
    pub fn quadratic(
        label: String,
        terms: Vec<(VarId, VarId, f64)>,
        sense: Sense,
        bound: f64,
    ) -> Self {
        Self {
            label,
            linear: Vec::new(),
            quadratic: terms,
            sense,
            bound,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn sense(&self) -> Sense {
        self.sense
    }

    #[must_use]
    pub fn bound(&self) -> f64 {
        self.bound
    }

    #[must_use]
    pub fn linear_terms(&self) -> &[(VarId, f64)] {
        &self.linear
    }

    #[must_use]
    pub fn quadratic_terms(&self) -> &[(VarId, VarId, f64)] {
        &self.quadratic
    }

    /// Left-hand-side value under an assignment.
    #[must_use]
    pub fn evaluate(&self, assignment: &[bool]) -> f64 {
        let linear: f64 = self
            .linear
            .iter()
            .filter(|&&(var, _)| assignment[var])
            .map(|&(_, coefficient)| coefficient)
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .filter(|&&(first, second, _)| assignment[first] && assignment[second])
            .map(|&(_, _, coefficient)| coefficient)
            .sum();
        linear + quadratic
    }

    /// Amount by which the assignment violates the constraint; zero when
    /// satisfied.
    #[must_use]
    pub fn violation(&self, assignment: &[bool]) -> f64 {
        let value = self.evaluate(assignment);
        match self.sense {
            Sense::Equal => (value - self.bound).abs(),
            Sense::AtMost => (value - self.bound).max(0.0),
            Sense::AtLeast => (self.bound - value).max(0.0),
        }
    }
}

/// The assembled optimization model: variable set, constraint set, and the
/// linear risk objective. Read-only once assembled; handed as-is to a
/// solver backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    variables: Vec<Variable>,
    starts: Vec<Vec<VarId>>,
    constraints: Vec<Constraint>,
    objective: Vec<(VarId, f64)>,
}

impl Model {
    pub(crate) fn assemble(
        variables: Vec<Variable>,
        starts: Vec<Vec<VarId>>,
        constraints: Vec<Constraint>,
        objective: Vec<(VarId, f64)>,
    ) -> Self {
        Self {
            variables,
            starts,
            constraints,
            objective,
        }
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of interventions carrying variables.
    #[must_use]
    pub fn intervention_count(&self) -> usize {
        self.starts.len()
    }

    /// Variable ids of one intervention, indexed by start.
    #[must_use]
    pub fn starts_of(&self, intervention: usize) -> &[VarId] {
        &self.starts[intervention]
    }

    /// Variable id of `x[i][s]`, if `s` is feasible for `i`.
    #[must_use]
    pub fn var(&self, intervention: usize, start: usize) -> Option<VarId> {
        self.starts.get(intervention)?.get(start).copied()
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Weighted objective terms; only non-zero risk contributions appear.
    #[must_use]
    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    /// Raw (un-normalized) objective value under an assignment. Divide by
    /// the horizon length for the published mean-risk metric.
    #[must_use]
    pub fn objective_value(&self, assignment: &[bool]) -> f64 {
        self.objective
            .iter()
            .filter(|&&(var, _)| assignment[var])
            .map(|&(_, coefficient)| coefficient)
            .sum()
    }

    /// Number of quadratic terms across all constraints.
    #[must_use]
    pub fn quadratic_term_count(&self) -> usize {
        self.constraints
            .iter()
            .map(|constraint| constraint.quadratic_terms().len())
            .sum()
    }
}
