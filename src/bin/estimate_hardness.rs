//! estimate_hardness: run every registered attack-cost model on one LWE or
//! SIS instance and print the per-strategy costs.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hardness_estimator::report;
use hardness_estimator::{
    NoiseDistribution, Norm, Orchestrator, ParameterBuilder, ProblemParameters, Registry,
    RunConfig, RunSummary, SampleCount,
};

#[derive(Parser)]
#[command(name = "estimate_hardness")]
#[command(about = "Estimate the hardness of LWE and SIS instances against known attacks")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    problem: Problem,

    /// Also run the combined-attacks strategy (after the hybrid dual attack)
    #[arg(long, global = true, env = "HARDNESS_COMBINED_ATTACKS")]
    combined: bool,

    /// Per-strategy deadline in milliseconds; late strategies are reported as skipped
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Print one JSON document instead of text blocks
    #[arg(long, global = true)]
    json: bool,

    /// Log search results at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Problem {
    /// Learning with errors
    Lwe {
        /// Secret dimension
        #[arg(long, allow_negative_numbers = true)]
        n: i64,

        /// Modulus
        #[arg(long, allow_negative_numbers = true)]
        q: i64,

        /// Number of samples
        #[arg(long, allow_negative_numbers = true)]
        m: i64,

        /// Standard deviation of a discrete Gaussian secret
        #[arg(long, allow_negative_numbers = true, required_unless_present = "secret_dist")]
        secret_stddev: Option<f64>,

        /// Mean of the discrete Gaussian secret
        #[arg(long, allow_negative_numbers = true, default_value = "0")]
        secret_mean: f64,

        /// Secret distribution as JSON, e.g. {"distribution":"centered_binomial","eta":2}
        #[arg(long, conflicts_with = "secret_stddev")]
        secret_dist: Option<String>,

        /// Standard deviation of a discrete Gaussian error
        #[arg(long, allow_negative_numbers = true, required_unless_present = "error_dist")]
        error_stddev: Option<f64>,

        /// Mean of the discrete Gaussian error
        #[arg(long, allow_negative_numbers = true, default_value = "0")]
        error_mean: f64,

        /// Error distribution as JSON
        #[arg(long, conflicts_with = "error_stddev")]
        error_dist: Option<String>,
    },
    /// Short integer solution
    Sis {
        /// Number of rows of A
        #[arg(long, allow_negative_numbers = true)]
        n: i64,

        /// Modulus
        #[arg(long, allow_negative_numbers = true)]
        q: i64,

        /// Number of columns of A, 0 for no cap
        #[arg(long, allow_negative_numbers = true, default_value = "0")]
        m: i64,

        /// Bound on the norm of the solution
        #[arg(long)]
        norm_bound: f64,

        /// Norm the bound applies to
        #[arg(long, value_enum, default_value = "linf")]
        norm: NormArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NormArg {
    L2,
    Linf,
}

impl From<NormArg> for Norm {
    fn from(arg: NormArg) -> Self {
        match arg {
            NormArg::L2 => Norm::L2,
            NormArg::Linf => Norm::Linf,
        }
    }
}

fn distribution(
    stddev: Option<f64>,
    mean: f64,
    json: Option<&str>,
    what: &str,
) -> Result<NoiseDistribution> {
    let dist = match (json, stddev) {
        (Some(json), _) => NoiseDistribution::from_json_str(json),
        (None, Some(stddev)) => NoiseDistribution::discrete_gaussian(stddev, mean),
        (None, None) => return Err(eyre::eyre!("missing {} distribution", what)),
    };
    dist.wrap_err_with(|| format!("Invalid {what} distribution"))
}

fn build_parameters(problem: &Problem) -> Result<ProblemParameters> {
    match problem {
        Problem::Lwe {
            n,
            q,
            m,
            secret_stddev,
            secret_mean,
            secret_dist,
            error_stddev,
            error_mean,
            error_dist,
        } => {
            let secret = distribution(*secret_stddev, *secret_mean, secret_dist.as_deref(), "secret")?;
            let error = distribution(*error_stddev, *error_mean, error_dist.as_deref(), "error")?;
            ParameterBuilder::lwe(*n, *q, *m, secret, error).wrap_err("Invalid LWE parameters")
        }
        Problem::Sis {
            n,
            q,
            m,
            norm_bound,
            norm,
        } => {
            let m = SampleCount::from_raw(*m).wrap_err("Invalid SIS parameters")?;
            ParameterBuilder::sis(*n, *q, m, *norm_bound, (*norm).into())
                .wrap_err("Invalid SIS parameters")
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RunConfig::new()
        .with_combined_attacks(args.combined)
        .with_strategy_timeout(args.timeout_ms.map(Duration::from_millis))
        .with_json(args.json);

    let params = build_parameters(&args.problem)?;
    let registry = Registry::for_problem(params.kind(), &config);
    info!("Running {} strategies", registry.len());

    let orchestrator = Orchestrator::from_config(&registry, &config);
    let mut run = orchestrator.run(&params);

    if config.json {
        let results: Vec<_> = run.by_ref().collect();
        let summary = RunSummary::from_results(&results);
        let doc = report::run_to_json(&params, &results, &summary);
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{}", report::header(&params));
    println!("{}", report::legend(params.kind()));
    for result in run.by_ref() {
        println!("{}", report::present(result.label, &result.outcome));
    }
    println!("{}", report::summary(run.summary()));

    Ok(())
}
