//! Payment Routing Pipeline CLI
//!
//! Command-line interface for enriching payment CSV files with ranked
//! provider priorities and expected profit.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- payments.csv providers.csv rates.csv --output result.csv
//! cargo run -- payments.csv providers.csv rates.csv --on-error abort
//! cargo run -- payments.csv providers.csv rates.csv --max-in-flight 8 --no-profit
//! ```
//!
//! The program bulk-loads the provider rate cards and the currency rate
//! table, then streams the payments file row by row: each row is enriched
//! with its ranked provider priority string and (unless `--no-profit`) an
//! expected profit in USD. A run summary is printed to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Missing input file, fatal collaborator failure, or a row failure
//!   under `--on-error abort`
//! - 130: Interrupted (Ctrl-C)

use payment_routing_pipeline::cli::{self, CliArgs};
use payment_routing_pipeline::{
    load_rate_cards, EligibilityResolver, HttpRankingClient, InMemoryProviderStore, Pipeline,
    PipelineError, ProfitEstimator, ProviderStore, RateTable, RunFailure, RunStatistics,
};
use std::process;
use std::sync::Arc;
use tokio_util::compat::TokioAsyncReadCompatExt;

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();

    // All input paths are validated before any work starts
    for path in [&args.payments, &args.providers, &args.rates] {
        if !path.exists() {
            eprintln!("Error: {}", PipelineError::FileNotFound {
                path: path.display().to_string(),
            });
            process::exit(1);
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    let exit_code = runtime.block_on(run(args));
    process::exit(exit_code);
}

async fn run(args: CliArgs) -> i32 {
    let store = Arc::new(InMemoryProviderStore::new());

    // The run races process interruption; on Ctrl-C in-flight remote calls
    // are abandoned and the store is still released.
    let result = tokio::select! {
        result = execute(&args, Arc::clone(&store)) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted, shutting down");
            release_store(store.as_ref()).await;
            return 130;
        }
    };

    // Truncate-on-completion, on both the success and the failure path.
    release_store(store.as_ref()).await;

    match result {
        Ok(stats) => {
            print_summary(&stats, !args.no_profit);
            0
        }
        Err(failure) => {
            // An aborted run still reports the progress made before the
            // failure.
            if failure.stats.rows_read > 0 {
                print_summary(&failure.stats, !args.no_profit);
            }
            eprintln!("Error: {}", failure.error);
            1
        }
    }
}

async fn execute(
    args: &CliArgs,
    store: Arc<InMemoryProviderStore>,
) -> Result<RunStatistics, RunFailure> {
    // Bulk-load the side inputs before the stream starts.
    let rates = RateTable::from_path(&args.rates)?;
    if rates.is_empty() && !args.no_profit {
        eprintln!("Warning: rate table is empty, every profit estimate will fail");
    }

    let providers_file = tokio::fs::File::open(&args.providers)
        .await
        .map_err(PipelineError::from)?;
    let loaded = load_rate_cards(providers_file.compat(), store.as_ref()).await?;
    eprintln!("Loaded {} provider rate cards", loaded);

    let ranking = Arc::new(HttpRankingClient::new(
        &args.ranking_url,
        args.to_ranking_config(),
    ));
    let estimator = (!args.no_profit).then(|| ProfitEstimator::new(rates));
    let pipeline = Pipeline::new(
        EligibilityResolver::new(store),
        ranking,
        estimator,
        args.to_pipeline_config(),
    );

    let payments_file = tokio::fs::File::open(&args.payments)
        .await
        .map_err(PipelineError::from)?;
    let sink = std::fs::File::create(&args.output)
        .map_err(|e| PipelineError::sink_failure(e.to_string()))?;

    pipeline.run(payments_file.compat(), sink).await
}

async fn release_store(store: &dyn ProviderStore) {
    if let Err(e) = store.truncate().await {
        eprintln!("Error: failed to release provider store: {}", e);
    }
}

fn print_summary(stats: &RunStatistics, with_profit: bool) {
    eprintln!(
        "Processed {} rows ({} succeeded, {} failed)",
        stats.rows_read, stats.rows_succeeded, stats.rows_failed
    );
    eprintln!("Average ranking latency: {:.2} ms", stats.avg_latency_ms());
    if with_profit {
        eprintln!("Total expected profit: {:.4} USD", stats.profit_usd_total);
    }
}
