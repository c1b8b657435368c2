use clap::{Parser, Subcommand};
use datafuzz::core::error::FuzzError;
use datafuzz::pipeline::{run_pipeline, DataSpec, PipelineSpec};
use datafuzz::{logging, FuzzConfig, StrategyConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "datafuzz")]
#[command(version = "0.1")]
#[command(about = "Add noise, duplicates and fuzz values to datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML file or from arguments
    Run {
        /// Pipeline definition (.yaml)
        file: Option<String>,
        #[arg(long)]
        input: Option<String>,
        #[arg(long)]
        output: Option<String>,
        /// JSON strategy object or list of them
        #[arg(long)]
        strategies: Option<String>,
        #[arg(long)]
        db_uri: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        table: Option<String>,
        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_strategies(raw: &str) -> Result<Vec<StrategyConfig>, FuzzError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = FuzzConfig::load();
    logging::init(&config.logging.level);

    match cli.command {
        Commands::Run {
            file,
            input,
            output,
            strategies,
            db_uri,
            query,
            table,
            seed,
        } => {
            let spec = match file {
                Some(path) => PipelineSpec::from_yaml_file(path)?,
                None => {
                    let data = DataSpec {
                        input,
                        output,
                        db_uri,
                        query,
                        table,
                    };
                    let strategies = match strategies.as_deref() {
                        Some(raw) => parse_strategies(raw)?,
                        None => Vec::new(),
                    };
                    PipelineSpec::from_args(
                        data,
                        strategies,
                        config.strategy.default_percentage,
                    )?
                }
            };

            let result = match seed {
                Some(seed) => run_pipeline(&spec, &config, &mut StdRng::seed_from_u64(seed)),
                None => run_pipeline(&spec, &config, &mut rand::thread_rng()),
            };
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("Error running pipeline: {}", e);
                    std::process::exit(1);
                }
            };
            for failure in &report.failures {
                eprintln!("strategy {} ({}) failed: {}", failure.index, failure.strategy, failure.message);
            }
            println!("dataset now available at {}", report.output);
        }
    }

    Ok(())
}
