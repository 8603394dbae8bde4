//! Command handlers.
//!
//! Plans are validated on the async side; execution touches SQLite and may
//! run for a long time, so it moves to a blocking worker thread.

use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use log::info;
use quarry_core::{
    db::default_database_path, display::ExecutionSummary, EngineBuilder, EngineConfig, Plan,
    PlanSpec, SqliteExecutor,
};
use serde_json::json;
use tokio::task;

use crate::{args::EngineArgs, corrector::CommandCorrector, renderer::TerminalRenderer};

pub struct Cli {
    database_file: Option<PathBuf>,
    engine: EngineArgs,
    json: bool,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(
        database_file: Option<PathBuf>,
        engine: EngineArgs,
        json: bool,
        renderer: TerminalRenderer,
    ) -> Self {
        Self {
            database_file,
            engine,
            json,
            renderer,
        }
    }

    /// Executes a plan document and reports the outcome.
    pub async fn run_plan(&self, path: &Path, details: bool) -> Result<ExitCode> {
        let plan = load_plan(path)?;
        self.execute(plan, details).await
    }

    /// Executes one query as a single-step plan.
    pub async fn run_query(&self, spec: PlanSpec) -> Result<ExitCode> {
        let plan = Plan::from_spec(spec).context("Invalid query")?;
        self.execute(plan, false).await
    }

    /// Validates a plan document without touching any database.
    pub fn validate(&self, path: &Path) -> Result<ExitCode> {
        let plan = load_plan(path)?;

        if self.json {
            let report = json!({
                "valid": true,
                "steps": plan.len(),
                "final_step_id": plan.final_step_id(),
                "execution_order": plan.execution_order_ids(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            self.renderer.render(&plan.to_string())?;
        }
        Ok(ExitCode::SUCCESS)
    }

    /// Prints the plan document schema.
    pub fn schema(&self) -> Result<ExitCode> {
        let schema = schemars::schema_for!(PlanSpec);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(ExitCode::SUCCESS)
    }

    async fn execute(&self, plan: Plan, details: bool) -> Result<ExitCode> {
        let database = match &self.database_file {
            Some(path) => path.clone(),
            None => default_database_path().context("Failed to resolve default database path")?,
        };
        let engine = self.engine.clone();

        info!("Executing plan against {}", database.display());
        let plan = task::spawn_blocking(move || execute_blocking(&database, &engine, plan))
            .await
            .context("Execution task failed")??;

        self.report(&plan, details)?;
        Ok(if plan.is_complete() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    fn report(&self, plan: &Plan, details: bool) -> Result<()> {
        if self.json {
            println!("{}", plan.to_json_pretty()?);
            return Ok(());
        }

        if details {
            self.renderer.render(&plan.to_string())?;
        }
        self.renderer
            .render(&ExecutionSummary::new(plan).to_string())
    }
}

fn execute_blocking(database: &Path, engine: &EngineArgs, plan: Plan) -> Result<Plan> {
    let executor = SqliteExecutor::open(database)
        .with_context(|| format!("Failed to open database {}", database.display()))?
        .with_step_timeout(engine.step_timeout());
    let config = EngineConfig::from(engine);

    let plan = match &engine.corrector {
        Some(program) => {
            let corrector = CommandCorrector::new(program);
            info!("Correcting failed queries with {}", corrector.program().display());
            EngineBuilder::new(executor)
                .with_corrector(corrector)
                .with_config(config)
                .build()?
                .execute_owned(plan)
        }
        None => EngineBuilder::new(executor)
            .with_config(config)
            .build()?
            .execute_owned(plan),
    };
    Ok(plan)
}

/// Reads and validates a plan document from a file, or stdin for `-`.
fn load_plan(path: &Path) -> Result<Plan> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read plan from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan {}", path.display()))?
    };

    Plan::from_json(&text).with_context(|| format!("Invalid plan {}", path.display()))
}
