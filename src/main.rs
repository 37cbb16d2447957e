use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use omsp::compile::{compile, CompileOptions, ExclusionForm};
use omsp::core::{assignment_from_plan, decode, Solver, DEFAULT_TOLERANCE};
use omsp::data::{self, RawInstance, RawIntervention, RawResource};
use omsp::{cast_u64, cast_usize, run_reader, solve};
use rand::prelude::*;
use std::fs::File;
use std::io::{BufReader, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Copy, Clone, Debug)]
struct Backend(usize, &'static str);

impl From<Backend> for Box<dyn Solver> {
    fn from(value: Backend) -> Box<dyn Solver> {
        solve::SOLVERS[value.0]()
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.1)
    }
}

impl ValueEnum for Backend {
    fn value_variants<'a>() -> &'a [Self] {
        static BACKENDS: std::sync::LazyLock<Vec<Backend>> = std::sync::LazyLock::new(|| {
            let iter = solve::SOLVERS.iter().enumerate();
            iter.map(|(i, init)| {
                let name = Box::leak(init().name().to_owned().into_boxed_str());
                Backend(i, name)
            })
            .collect()
        });

        BACKENDS.as_slice()
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.1))
    }
}

/// Application compiling outage-maintenance scheduling instances into
/// constrained binary optimization models.
#[derive(Debug, Parser)]
enum Application {
    /// Compile an instance and print model statistics.
    Compile {
        /// The instance file.
        instance: PathBuf,
        /// Emit exclusions as pairwise linear constraints instead of one
        /// quadratic constraint per exclusion.
        #[clap(short, long)]
        linear_exclusions: bool,
    },
    /// Compile an instance, run a solver backend, and print the plan.
    Solve {
        /// The solver backend.
        backend: Backend,
        /// The instance file.
        instance: PathBuf,
        /// Time budget in seconds.
        #[clap(short, long, default_value = "30")]
        time_limit: u64,
    },
    /// Validate a solution file against an instance.
    Check {
        /// The instance file.
        instance: PathBuf,
        /// The solution file, one `<intervention> <start>` pair per line.
        solution: PathBuf,
        /// Violations at or below this magnitude are ignored.
        #[clap(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
    /// Generate test instances for the scheduling problem.
    Gen {
        /// The number of interventions.
        interventions: NonZero<usize>,
        /// The number of resources.
        resources: NonZero<usize>,
        /// The number of horizon time steps.
        horizon: NonZero<usize>,
        /// The maximum execution duration of an intervention.
        #[clap(short, long, default_value = "5")]
        max_duration: NonZero<u64>,
        /// The number of risk scenarios per time step.
        #[clap(short, long, default_value = "3")]
        scenarios: NonZero<usize>,
        /// Exclusion ratio. 1.0 puts every intervention pair in conflict.
        #[clap(short, long, default_value = "0.1")]
        exclusion_ratio: f64,
        /// Number of test cases to generate.
        #[clap(short, long, default_value = "1")]
        amount: NonZero<u64>,
        /// Path to output the generated instances. If the directory does not exist, it will be created.
        #[clap(short, long, default_value = "output")]
        output: String,
    },
}

fn read_instance(path: &Path) -> anyhow::Result<RawInstance> {
    data::deserialize(&mut BufReader::new(File::open(path)?))
}

fn options(linear: bool) -> CompileOptions {
    CompileOptions {
        exclusion_form: if linear {
            ExclusionForm::Linear
        } else {
            ExclusionForm::Quadratic
        },
    }
}

fn compile_command(instance: &Path, linear_exclusions: bool) -> anyhow::Result<()> {
    let raw = read_instance(instance)?;
    let compilation = compile(&raw, options(linear_exclusions))?;

    println!("interventions: {}", compilation.index.intervention_count());
    println!("excluded interventions: {}", compilation.index.skipped().len());
    println!("horizon: {}", compilation.index.horizon());
    println!("variables: {}", compilation.model.variables().len());
    println!("constraints: {}", compilation.model.constraints().len());
    println!(
        "quadratic terms: {}",
        compilation.model.quadratic_term_count()
    );
    println!("objective terms: {}", compilation.model.objective().len());
    println!("workload entries: {}", compilation.store.workload_entries());
    println!("risk entries: {}", compilation.store.risk_entries());
    println!("warnings: {}", compilation.warnings.len());
    Ok(())
}

fn check_command(instance: &Path, solution: &Path, tolerance: f64) -> anyhow::Result<()> {
    let raw = read_instance(instance)?;
    let compilation = compile(&raw, CompileOptions::default())?;

    let plan = data::parse_plan(&mut BufReader::new(File::open(solution)?))?;
    let assignment = assignment_from_plan(&compilation.model, &compilation.index, &plan)?;
    let evaluation = decode(
        &compilation.model,
        &compilation.index,
        &compilation.store,
        &assignment,
        tolerance,
    )?;

    println!("mean risk: {}", evaluation.mean_risk);
    for violation in &evaluation.violations {
        println!("violated: {} by {}", violation.constraint, violation.amount);
    }

    if evaluation.is_feasible() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} constraints violated beyond tolerance",
            evaluation.violations.len()
        ))
    }
}

fn gen_resources(
    rng: &mut impl Rng,
    resources: usize,
    horizon: usize,
    interventions: usize,
) -> impl Iterator<Item = (String, RawResource)> {
    let capacities: Vec<f64> = (0..resources)
        .map(|_| rng.gen_range(1.0..=interventions.max(2) as f64))
        .collect();
    capacities.into_iter().enumerate().map(move |(c, capacity)| {
        let resource = RawResource {
            min: vec![0.0; horizon],
            max: vec![capacity; horizon],
        };
        (format!("c{}", c + 1), resource)
    })
}

fn gen_intervention(
    rng: &mut impl Rng,
    resources: usize,
    horizon: usize,
    max_duration: u64,
    scenarios: usize,
) -> RawIntervention {
    let tmax = rng.gen_range(1..=cast_u64(horizon));
    let delta: Vec<f64> = (0..tmax)
        .map(|_| rng.gen_range(1..=max_duration) as f64)
        .collect();
    let resource = format!("c{}", rng.gen_range(1..=resources));

    let mut workload: ahash::HashMap<String, ahash::HashMap<String, f64>> =
        ahash::HashMap::default();
    let mut risk: ahash::HashMap<String, ahash::HashMap<String, Vec<f64>>> =
        ahash::HashMap::default();

    for (start, duration) in delta.iter().enumerate() {
        let end = (start + cast_usize(*duration as u64)).min(horizon);
        for time in start..end {
            let time_key = (time + 1).to_string();
            let start_key = (start + 1).to_string();
            workload
                .entry(time_key.clone())
                .or_default()
                .insert(start_key.clone(), rng.gen_range(0.1..1.0));
            let values = (0..scenarios).map(|_| rng.gen_range(0.0..10.0)).collect();
            risk.entry(time_key).or_default().insert(start_key, values);
        }
    }

    RawIntervention {
        tmax: tmax as i64,
        delta,
        workload: [(resource, workload)].into_iter().collect(),
        risk,
    }
}

fn gen_exclusions(
    rng: &mut impl Rng,
    interventions: usize,
    ratio: f64,
) -> impl Iterator<Item = (String, (String, String, String))> {
    let all: Vec<(usize, usize)> = (0..interventions)
        .flat_map(|first| (first + 1..interventions).map(move |second| (first, second)))
        .collect();
    let required = (all.len() as f64 * ratio).ceil() as usize;
    all.into_iter()
        .choose_multiple(rng, required)
        .into_iter()
        .enumerate()
        .map(|(e, (first, second))| {
            let pair = (
                format!("I{}", first + 1),
                format!("I{}", second + 1),
                "year".to_owned(),
            );
            (format!("E{}", e + 1), pair)
        })
}

fn gen_instance(
    rng: &mut impl Rng,
    interventions: usize,
    resources: usize,
    horizon: usize,
    max_duration: u64,
    scenarios: usize,
    exclusion_ratio: f64,
) -> RawInstance {
    let mut records = ahash::HashMap::default();
    for i in 0..interventions {
        let record = gen_intervention(rng, resources, horizon, max_duration, scenarios);
        records.insert(format!("I{}", i + 1), record);
    }

    let horizon_times = (1..=cast_u64(horizon) as i64).collect();
    RawInstance::new(
        gen_resources(rng, resources, horizon, interventions).collect(),
        [("year".to_owned(), horizon_times)].into_iter().collect(),
        records,
        gen_exclusions(rng, interventions, exclusion_ratio).collect(),
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Application::parse() {
        Application::Compile {
            instance,
            linear_exclusions,
        } => compile_command(&instance, linear_exclusions),
        Application::Solve {
            backend,
            instance,
            time_limit,
        } => {
            let mut solver = Box::<dyn Solver>::from(backend);
            let form = options(!solver.supports_quadratic());
            run_reader(
                solver.as_mut(),
                &mut BufReader::new(File::open(instance)?),
                form,
                Duration::from_secs(time_limit),
            )
        }
        Application::Check {
            instance,
            solution,
            tolerance,
        } => check_command(&instance, &solution, tolerance),
        Application::Gen {
            interventions,
            resources,
            horizon,
            max_duration,
            scenarios,
            exclusion_ratio,
            amount,
            output,
        } => {
            let interventions = interventions.get();
            let resources = resources.get();
            let horizon = horizon.get();

            let output = Path::new(&output);
            if !output.try_exists()? {
                std::fs::create_dir_all(output)?;
            }

            let mut rng = thread_rng();
            for i in 0..amount.get() {
                let instance = gen_instance(
                    &mut rng,
                    interventions,
                    resources,
                    horizon,
                    max_duration.get(),
                    scenarios.get(),
                    exclusion_ratio,
                );
                let filename = format!("{interventions}_{resources}_{i}.json");
                File::create(output.join(filename))?
                    .write_all(data::to_string(&instance)?.as_bytes())?;
            }
            Ok(())
        }
    }
}
