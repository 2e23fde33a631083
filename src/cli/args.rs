use crate::pipeline::{FailurePolicy, PipelineConfig};
use crate::ranking::RankingClientConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Enrich payment rows with ranked providers and an expected profit
#[derive(Parser, Debug)]
#[command(name = "payment-routing-pipeline")]
#[command(about = "Enrich payment rows with ranked providers and expected profit", long_about = None)]
pub struct CliArgs {
    /// Payments CSV file
    #[arg(value_name = "PAYMENTS", help = "Path to the payments CSV file")]
    pub payments: PathBuf,

    /// Provider rate-cards CSV file
    #[arg(value_name = "PROVIDERS", help = "Path to the provider rate-cards CSV file")]
    pub providers: PathBuf,

    /// Currency exchange-rates CSV file
    #[arg(value_name = "RATES", help = "Path to the currency rates CSV file")]
    pub rates: PathBuf,

    /// Where to write the enriched output
    #[arg(long, value_name = "PATH", default_value = "result.csv")]
    pub output: PathBuf,

    /// Base URL of the ranking service
    #[arg(long = "ranking-url", value_name = "URL", default_value = "http://localhost:3000")]
    pub ranking_url: String,

    /// Per-request timeout for ranking calls, in milliseconds
    #[arg(long = "ranking-timeout-ms", value_name = "MS", default_value_t = 5000)]
    pub ranking_timeout_ms: u64,

    /// Additional attempts after a failed ranking call
    #[arg(long = "ranking-retries", value_name = "COUNT", default_value_t = 0)]
    pub ranking_retries: u32,

    /// What to do with the batch when a row fails
    #[arg(
        long = "on-error",
        value_name = "POLICY",
        value_enum,
        default_value_t = ErrorPolicy::Skip,
        help = "Row failure policy: 'skip' drops the row, 'abort' halts the batch"
    )]
    pub on_error: ErrorPolicy,

    /// Upper bound on concurrently in-flight rows
    #[arg(
        long = "max-in-flight",
        value_name = "COUNT",
        default_value_t = 1,
        help = "Rows processed concurrently (default: 1, strictly sequential; 0: CPU cores)"
    )]
    pub max_in_flight: usize,

    /// Disable the currency conversion and profit estimation stage
    #[arg(long = "no-profit")]
    pub no_profit: bool,
}

/// Row failure policy as exposed on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ErrorPolicy {
    Skip,
    Abort,
}

impl From<ErrorPolicy> for FailurePolicy {
    fn from(policy: ErrorPolicy) -> Self {
        match policy {
            ErrorPolicy::Skip => FailurePolicy::Skip,
            ErrorPolicy::Abort => FailurePolicy::Abort,
        }
    }
}

impl CliArgs {
    /// Build the pipeline configuration from the CLI arguments
    ///
    /// A zero `--max-in-flight` falls back to the number of CPU cores with
    /// a warning on stderr.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let max_in_flight = if self.max_in_flight == 0 {
            let fallback = num_cpus::get();
            eprintln!(
                "Warning: --max-in-flight 0 interpreted as CPU count ({})",
                fallback
            );
            fallback
        } else {
            self.max_in_flight
        };

        PipelineConfig {
            failure_policy: self.on_error.into(),
            max_in_flight,
        }
    }

    /// Build the ranking client configuration from the CLI arguments
    pub fn to_ranking_config(&self) -> RankingClientConfig {
        RankingClientConfig {
            timeout: Duration::from_millis(self.ranking_timeout_ms),
            retries: self.ranking_retries,
        }
    }
}
