#![deny(clippy::all, clippy::cargo, clippy::expect_used, clippy::unwrap_used)]
#![deny(clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(clippy::unimplemented, clippy::redundant_type_annotations)]

use anyhow::Result;
use std::io::BufRead;
use std::time::Duration;

pub mod compile;
pub mod core;
pub mod data;
pub mod error;
pub mod solve;

/// Compiles the instance read from the reader, runs the given solver on the
/// assembled model, and writes the decoded plan and its mean risk to
/// stdout. Constraint violations beyond tolerance are logged.
///
/// # Errors
/// - If the instance could not be read or compiled.
/// - If the solver fails or exhausts its time budget.
/// - If the returned assignment fails the one-start-per-intervention check.
pub fn run_reader(
    solver: &mut dyn core::Solver,
    reader: &mut impl BufRead,
    options: compile::CompileOptions,
    budget: Duration,
) -> Result<()> {
    let raw = data::deserialize(reader)?;
    let compilation = compile::compile(&raw, options)?;
    let assignment = solver.solve(&compilation.model, budget)?;
    let evaluation = core::decode(
        &compilation.model,
        &compilation.index,
        &compilation.store,
        &assignment,
        core::DEFAULT_TOLERANCE,
    )?;

    for violation in &evaluation.violations {
        tracing::warn!(
            "constraint {} violated by {}",
            violation.constraint,
            violation.amount
        );
    }

    let plan: Vec<_> = evaluation
        .plan
        .iter()
        .map(|planned| (planned.intervention.clone(), planned.start))
        .collect();
    print!("{}", data::format_plan(&plan));
    println!("{}", evaluation.mean_risk);

    Ok(())
}

#[cfg(not(target_pointer_width = "64"))]
compile_error!("Must be 64-bit system!");

/// Casts the given value to `usize`.
/// It should never fail on 64-bit systems.
///
/// # Panics
/// - If the value cannot be cast to `usize`.
#[must_use]
pub fn cast_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or_else(|_| unreachable!("Must be 64-bit system!"))
}

/// Casts the given value to `u64`.
/// It should never fail on 64-bit systems.
///
/// # Panics
/// - If the value cannot be cast to `usize`.
#[must_use]
pub fn cast_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| unreachable!("Must be 64-bit system!"))
}
