//! Command-line arguments.
//!
//! Flags map onto core types through explicit conversions, so clap
//! attributes never leak into `quarry-core`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params / EngineConfig → Engine
//! ```

use std::{path::PathBuf, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand};
use quarry_core::{EngineConfig, PlanSpec, RetryPolicy};

/// Run multi-step SQL query plans against a SQLite database
///
/// A plan is a JSON document listing SQL steps, the steps each one reads
/// from, and the step whose result answers the question. Steps run in
/// dependency order; a dependent query refers to an upstream step's result
/// by the step id, as if it were a table.
#[derive(Parser, Debug)]
#[command(version, about, name = "quarry")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/quarry/quarry.db
    #[arg(long, env = "QUARRY_DATABASE", global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print the execution report as JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Engine tuning shared by every executing command.
#[derive(ClapArgs, Debug, Clone)]
pub struct EngineArgs {
    /// Corrections allowed per failing step
    #[arg(
        long,
        env = "QUARRY_MAX_CORRECTIONS",
        global = true,
        default_value_t = RetryPolicy::DEFAULT_MAX_CORRECTIONS
    )]
    pub max_corrections: u32,

    /// Row cap for the final step's result
    #[arg(
        long,
        env = "QUARRY_MAX_RESULTS",
        global = true,
        default_value_t = EngineConfig::DEFAULT_MAX_RESULTS
    )]
    pub max_results: usize,

    /// Per-step query timeout in seconds; 0 disables it
    #[arg(long, env = "QUARRY_TIMEOUT_SECS", global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Program that repairs failing queries. It receives the failure as JSON
    /// on stdin and prints the revised query on stdout
    #[arg(long, env = "QUARRY_CORRECTOR", global = true)]
    pub corrector: Option<PathBuf>,
}

impl EngineArgs {
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl From<&EngineArgs> for EngineConfig {
    fn from(args: &EngineArgs) -> Self {
        EngineConfig {
            retry: RetryPolicy::new(args.max_corrections),
            max_results: args.max_results,
        }
    }
}

/// Available commands for the quarry CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a plan document
    #[command(alias = "r")]
    Run(RunArgs),
    /// Execute a single query as a one-step plan
    #[command(alias = "q")]
    Query(QueryArgs),
    /// Check a plan document and print its execution order
    Validate(PlanFileArgs),
    /// Print the JSON schema of plan documents
    Schema,
}

/// Plan document location.
#[derive(ClapArgs, Debug)]
pub struct PlanFileArgs {
    /// Path to the plan JSON document, or `-` for stdin
    pub plan: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub file: PlanFileArgs,

    /// Show every step with its query and intermediate result
    #[arg(short, long)]
    pub details: bool,
}

#[derive(ClapArgs, Debug)]
pub struct QueryArgs {
    /// SQL query text
    pub sql: String,

    /// Natural-language question the query answers, recorded in the report
    #[arg(long)]
    pub question: Option<String>,
}

impl From<QueryArgs> for PlanSpec {
    fn from(val: QueryArgs) -> Self {
        PlanSpec::single(val.sql, val.question)
    }
}
