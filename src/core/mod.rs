mod index;
mod model;
mod solution;
mod store;
mod window;

pub use index::*;
pub use model::*;
pub use solution::*;
pub use store::*;
pub use window::*;

use crate::error::Error;
use std::time::Duration;

/// Searches a model for a low-risk assignment.
///
/// Backends receive the assembled model as-is and return one 0/1 value per
/// variable. A backend that cannot finish within the budget reports a
/// timeout instead of a partial result.
pub trait Solver {
    /// Runs the search within the given time budget.
    ///
    /// # Errors
    /// - If the budget runs out before any assignment is produced.
    /// - If the backend cannot run at all.
    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Vec<bool>, Error>;

    /// Returns whether the backend accepts quadratic constraint terms.
    /// Backends that do not need models compiled with linear exclusions.
    fn supports_quadratic(&self) -> bool {
        true
    }

    /// Returns the name of the solver.
    fn name(&self) -> &str;
}
