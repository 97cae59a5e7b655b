use std::path::PathBuf;

use clap::Parser;
use error_chain::ChainedError;
use flightanon_runtime::anonymize;
use flightanon_runtime::components::materialize::materialize;
use flightanon_runtime::components::utility::kl_divergence;
use flightanon_runtime::config::{AnonymizationConfig, DivergencePolicy};
use flightanon_runtime::utilities::export;
use flightanon_validator::errors::*;
use flightanon_validator::utilities::json::to_json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "flightanon",
    version,
    about = "Anonymizes travel records to k-anonymity and l-diversity"
)]
struct Cli {
    /// CSV file of travel records with a header row.
    #[arg(long)]
    input: PathBuf,
    /// Directory receiving one anonymized_data_k_{k}.csv per run.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// k of each run. Paired in order with the values of -l.
    #[arg(short, num_args = 1.., default_values_t = [15, 20, 50])]
    k: Vec<usize>,
    /// l of each run. Paired in order with the values of -k.
    #[arg(short, num_args = 1.., default_values_t = [3, 6, 15])]
    l: Vec<usize>,
    /// JSON configuration file. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Categorical attribute scored for utility.
    #[arg(long, default_value = "Flight Status")]
    sensitive: String,
    /// Treatment of categories that disappear after anonymization.
    #[arg(long, value_enum)]
    divergence: Option<DivergencePolicy>,
    /// Fail when a partition cannot reach k and l.
    #[arg(long)]
    deny_unsatisfiable: bool,
    /// Print a JSON report of each run.
    #[arg(long)]
    report: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(Cli::parse()) {
        eprintln!("{}", error.display_chain());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.k.len() != cli.l.len() {
        return Err(format!("{} values of k were given, but {} values of l", cli.k.len(), cli.l.len()).into());
    }

    let mut config = match &cli.config {
        Some(path) => AnonymizationConfig::from_path(path)?,
        None => AnonymizationConfig::default(),
    };
    if let Some(divergence) = cli.divergence {
        config.divergence = divergence;
    }
    config.deny_unsatisfiable |= cli.deny_unsatisfiable;

    let data = materialize(&cli.input)?;
    std::fs::create_dir_all(&cli.output_dir)
        .chain_err(|| format!("unable to create {}", cli.output_dir.display()))?;

    for (&k, &l) in cli.k.iter().zip(cli.l.iter()) {
        let release = anonymize(&data, &config, k, l)
            .chain_err(|| format!("anonymization failed for k={}, l={}", k, l))?;
        export(&release.data, cli.output_dir.join(format!("anonymized_data_k_{}.csv", k)))?;

        println!("Utility for k={}, and l={}: {}", k, l, release.heuristic_utility());

        let divergence = match kl_divergence(&data, &release.data, &cli.sensitive, config.divergence) {
            Ok(divergence) => Some(divergence),
            Err(Error(ErrorKind::DivergenceUndefined(category), _)) => {
                warn!(category = category.as_str(), "KL divergence is undefined");
                None
            }
            Err(error) => return Err(error),
        };
        match divergence {
            Some(divergence) => println!("KL divergence for {}: {}", cli.sensitive, divergence),
            None => println!("KL divergence for {}: undefined", cli.sensitive),
        }

        if cli.report {
            println!("{}", to_json(&release.report(divergence))?);
        }
    }
    Ok(())
}
