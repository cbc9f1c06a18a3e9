//! Command-line interface for loadgen
//!
//! # Usage Examples
//!
//! ```bash
//! # Run every sample in a schema until its end condition
//! loadgen run --schema samples.yaml
//!
//! # Larger worker pool and queues for heavier load
//! loadgen run --schema samples.yaml --workers 8 --dispatch-capacity 2048
//!
//! # Validate a schema without generating anything
//! loadgen validate --schema samples.yaml
//! ```
//!
//! Sample schemas declare, per sample: the candidate source, interval,
//! backfill window (e.g. `-2h`), sizing policy, rater, output sink, and
//! token sequence. See `LoadSchema` in `loadgen-core`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use loadgen::app;
use loadgen_core::LoadSchema;
use loadgen_framework::RuntimeConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "loadgen")]
#[command(about = "Synthetic event load generator for downstream ingestion systems")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run generation for every sample in a schema
    Run {
        /// Path to the sample schema YAML
        #[arg(long)]
        schema: PathBuf,

        /// Size of the generator worker pool
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Dispatch queue capacity
        #[arg(long, default_value_t = 512)]
        dispatch_capacity: usize,

        /// Result queue capacity
        #[arg(long, default_value_t = 512)]
        result_capacity: usize,

        /// Governor tick granularity in seconds
        #[arg(long, default_value_t = 1)]
        granularity: u64,
    },

    /// Validate a schema without running it
    Validate {
        /// Path to the sample schema YAML
        #[arg(long)]
        schema: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            schema,
            workers,
            dispatch_capacity,
            result_capacity,
            granularity,
        } => {
            let schema = LoadSchema::from_file(&schema)
                .with_context(|| format!("Failed to load schema from {schema:?}"))?;

            let runtime = RuntimeConfig::new()
                .with_generator_workers(workers)
                .with_dispatch_capacity(dispatch_capacity)
                .with_result_capacity(result_capacity)
                .with_granularity(Duration::from_secs(granularity.max(1)));

            let global_stop = Arc::new(AtomicBool::new(false));
            let ctrlc_stop = Arc::clone(&global_stop);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, stopping all governors");
                    ctrlc_stop.store(true, Ordering::SeqCst);
                }
            });

            let snapshot = app::run(schema, runtime, global_stop).await?;
            println!("{}", snapshot.summary());
        }

        Commands::Validate { schema } => {
            let loaded = LoadSchema::from_file(&schema)
                .with_context(|| format!("Failed to load schema from {schema:?}"))?;
            info!(samples = loaded.samples.len(), "schema is valid");
            println!("Schema OK: {} sample(s)", loaded.samples.len());
        }
    }

    Ok(())
}
