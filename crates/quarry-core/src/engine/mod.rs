//! Plan execution.
//!
//! The [`Engine`] runs a validated [`Plan`] one step at a time in execution
//! order:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │    resolver     │    │    Executor     │    │      retry      │
//! │ (inline deps as │───▶│ (run against    │───▶│ (classify, ask  │──┐
//! │  WITH relations)│    │  the store)     │    │  the Corrector) │  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘  │
//!          ▲                                                         │
//!          └──────────────── revised query, within budget ───────────┘
//! ```
//!
//! Completed steps keep their result on the plan, and those results are
//! what later steps read their dependencies from. A step that ends
//! `Failed` stops the run: steps not yet started stay `Pending` and
//! completed steps keep their results. [`Engine::execute`] never fails;
//! everything that went wrong is recorded on the steps. A panic in the
//! executor fails the step, and a panic in the corrector counts as a failed
//! correction.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    time::Instant,
};

use log::{debug, error, info, warn};

use crate::{
    error::{Error, Result},
    models::{Correction, Plan, Step, StepStatus},
    report::millis,
};

pub mod corrector;
pub mod executor;
pub mod resolver;
pub mod retry;


pub use corrector::{CorrectionRequest, Corrector, NoCorrector};
pub use executor::{Executor, StoreError, StoreErrorCode};
pub use retry::{classify, ErrorClass, RetryPolicy};

use corrector::clean_query;
use retry::Budget;

/// Tunables for plan execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Correction budget applied to each step
    pub retry: RetryPolicy,
    /// Row cap applied to the final step's result
    pub max_results: usize,
}

impl EngineConfig {
    pub const DEFAULT_MAX_RESULTS: usize = 1000;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }
}

/// Builder for creating and configuring [`Engine`] instances.
///
/// # Examples
///
/// ```rust
/// use quarry_core::{db::SqliteExecutor, EngineBuilder, Plan};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = EngineBuilder::new(SqliteExecutor::open_in_memory()?)
///     .with_max_corrections(1)
///     .build()?;
///
/// let mut plan = Plan::single("SELECT 6 * 7 AS answer", None)?;
/// engine.execute(&mut plan);
/// assert!(plan.is_complete());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EngineBuilder<E, C = NoCorrector> {
    executor: E,
    corrector: Option<C>,
    config: EngineConfig,
}

impl<E: Executor> EngineBuilder<E> {
    /// Creates a builder with default settings and no corrector.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            corrector: None,
            config: EngineConfig::default(),
        }
    }
}

impl<E: Executor, C: Corrector> EngineBuilder<E, C> {
    /// Enables automatic correction of retryable failures.
    pub fn with_corrector<D: Corrector>(self, corrector: D) -> EngineBuilder<E, D> {
        EngineBuilder {
            executor: self.executor,
            corrector: Some(corrector),
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how many corrections each step may use.
    pub fn with_max_corrections(mut self, max_corrections: u32) -> Self {
        self.config.retry = RetryPolicy::new(max_corrections);
        self
    }

    /// Sets the row cap for the final step.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    /// Builds the configured engine.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `max_results` is zero.
    pub fn build(self) -> Result<Engine<E, C>> {
        if self.config.max_results == 0 {
            return Err(Error::configuration("max_results must be at least 1"));
        }

        Ok(Engine {
            executor: self.executor,
            corrector: self.corrector,
            config: self.config,
        })
    }
}

/// Executes plans against one store.
#[derive(Debug)]
pub struct Engine<E, C = NoCorrector> {
    executor: E,
    corrector: Option<C>,
    config: EngineConfig,
}

impl<E: Executor, C: Corrector> Engine<E, C> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs every pending step of `plan` in execution order, updating the
    /// plan in place.
    ///
    /// Steps that already completed in an earlier run are kept and serve as
    /// dependencies; a previously failed step stops the run again.
    pub fn execute(&self, plan: &mut Plan) {
        info!("Executing query plan with {} steps", plan.len());
        let started = Instant::now();
        let order = plan.order_indices().to_vec();

        for index in order {
            let keep_going = match plan.step_at(index).status() {
                StepStatus::Completed => true,
                StepStatus::Failed | StepStatus::Executing => false,
                StepStatus::Pending => self.run_step(plan, index),
            };
            if !keep_going {
                let pending = plan
                    .steps()
                    .iter()
                    .filter(|step| step.status() == StepStatus::Pending)
                    .count();
                warn!("Stopping plan execution with {pending} steps not started");
                break;
            }
        }

        plan.set_total_duration(started.elapsed());
        info!(
            "Plan execution {}: {:.1}ms total",
            if plan.is_complete() { "completed" } else { "failed" },
            millis(started.elapsed())
        );
    }

    /// By-value form of [`Engine::execute`].
    pub fn execute_owned(&self, mut plan: Plan) -> Plan {
        self.execute(&mut plan);
        plan
    }

    /// Runs one step to a terminal state; returns whether it completed.
    fn run_step(&self, plan: &mut Plan, index: usize) -> bool {
        let is_final = index == plan.final_step_index();
        let mut budget = self.config.retry.budget();

        plan.step_at_mut(index).begin();
        {
            let step = plan.step_at(index);
            debug!("Executing step {}: {}", step.id(), step.description());
        }

        loop {
            let resolved = match resolve_step(plan, index) {
                Ok(query) => query,
                Err(message) => {
                    error!("{message}");
                    plan.step_at_mut(index).fail(message, None);
                    return false;
                }
            };

            let step = plan.step_at_mut(index);
            step.record_attempt();
            let started = Instant::now();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.executor.run(&resolved)));
            let elapsed = started.elapsed();
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = format!("Executor panicked: {}", panic_message(&*payload));
                    error!("Step {} failed: {message}", step.id());
                    step.fail(message, Some(elapsed));
                    return false;
                }
            };

            match outcome {
                Ok(mut result) => {
                    let truncated = is_final && result.truncate(self.config.max_results);
                    if truncated {
                        warn!(
                            "Final step {} results truncated to {} rows",
                            step.id(),
                            self.config.max_results
                        );
                    }
                    info!(
                        "Step {} completed: {} rows in {:.1}ms",
                        step.id(),
                        result.row_count(),
                        millis(elapsed)
                    );
                    step.complete(result, elapsed, truncated);
                    return true;
                }
                Err(err) => {
                    let class = classify(&err);
                    error!("Step {} failed ({class:?}): {}", step.id(), err.message);
                    if class.is_retryable() && self.correct(step, &resolved, &err, &mut budget) {
                        continue;
                    }
                    step.fail(err.message, Some(elapsed));
                    return false;
                }
            }
        }
    }

    /// Asks the corrector for a revised query and applies it to the step.
    ///
    /// Returns `false` when no corrector is configured, the budget is spent,
    /// or the corrector fails or returns nothing usable.
    fn correct(
        &self,
        step: &mut Step,
        resolved: &str,
        error: &StoreError,
        budget: &mut Budget,
    ) -> bool {
        let Some(corrector) = &self.corrector else {
            debug!("No corrector configured; not retrying step {}", step.id());
            return false;
        };
        let Some(attempt) = budget.take() else {
            warn!(
                "Step {} used all {} corrections",
                step.id(),
                self.config.retry.max_corrections
            );
            return false;
        };

        warn!(
            "Attempting correction of step {} ({attempt}/{})",
            step.id(),
            self.config.retry.max_corrections
        );

        let request = CorrectionRequest {
            query: step.query(),
            resolved_query: resolved,
            error: &error.message,
            description: step.description(),
            attempt,
        };
        let revised = match panic::catch_unwind(AssertUnwindSafe(|| corrector.fix(&request))) {
            Ok(Ok(raw)) => match clean_query(&raw) {
                Some(query) => query,
                None => {
                    error!("Corrector returned no query for step {}", step.id());
                    return false;
                }
            },
            Ok(Err(e)) => {
                error!("Correction of step {} failed: {e:#}", step.id());
                return false;
            }
            Err(payload) => {
                error!(
                    "Corrector panicked on step {}: {}",
                    step.id(),
                    panic_message(&*payload)
                );
                return false;
            }
        };

        info!("Retrying step {} with corrected query", step.id());
        let correction = Correction {
            attempt,
            failed_query: step.query().to_string(),
            error: error.message.clone(),
            revised_query: revised,
        };
        step.apply_correction(correction);
        true
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Builds the text to submit for a step from its query and the results of
/// its dependencies.
fn resolve_step(plan: &Plan, index: usize) -> std::result::Result<String, String> {
    let step = plan.step_at(index);
    let mut dependencies = Vec::with_capacity(step.depends_on().len());
    for id in step.depends_on() {
        let result = plan.step(id).and_then(Step::result).ok_or_else(|| {
            format!(
                "Dependency '{id}' of step '{}' has no result to read",
                step.id()
            )
        })?;
        dependencies.push((id.as_str(), result));
    }
    Ok(resolver::resolve(step.query(), &dependencies))
}
