//! Scenario execution
//!
//! The runner owns the session lifecycle and interprets steps strictly in
//! order: `Idle -> SessionStarting -> Running -> {Completed, Failed} ->
//! TornDown`. Teardown is unconditional — the session is released exactly
//! once on every exit path, and partial evidence is preserved on failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cdp::traits::EvaluationResult;
use crate::config::Config;
use crate::engine::actions::ActionExecutor;
use crate::engine::assertions;
use crate::engine::capture::EvidenceCapture;
use crate::scenario::step::{Scenario, Step};
use crate::session::launcher::{Session, SessionLauncher};
use crate::{Error, Result};

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SessionStarting,
    Running,
    Completed,
    Failed,
    TornDown,
}

/// Opens sessions for the runner; tests substitute a fake-page provider
#[async_trait]
pub trait SessionProvider: Send + Sync + std::fmt::Debug {
    async fn start(&self) -> Result<Session>;
}

#[async_trait]
impl SessionProvider for SessionLauncher {
    async fn start(&self) -> Result<Session> {
        self.launch().await
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Failed { kind: String, message: String },
}

/// Per-step record, collected append-only during the run
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub label: String,
    pub outcome: StepOutcome,
    /// Observed value for read steps, artifact path for screenshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<String>,
    pub duration_ms: u64,
}

/// Overall outcome of a scenario run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Failed {
        /// Index of the failing step; `None` when the session never started
        step_index: Option<usize>,
        kind: String,
        message: String,
    },
}

/// Result of running a scenario, owned by the caller
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub scenario: String,
    pub outcome: Outcome,
    pub steps: Vec<StepReport>,
    /// Screenshots written before completion or failure
    pub artifacts: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }

    /// Process exit code: 0 = pass, 1 = fail
    pub fn exit_code(&self) -> i32 {
        if self.is_completed() {
            0
        } else {
            1
        }
    }
}

/// Executes one scenario against one session at a time
#[derive(Debug)]
pub struct ScenarioRunner {
    provider: Arc<dyn SessionProvider>,
    config: Config,
    state: RunState,
}

impl ScenarioRunner {
    pub fn new(provider: Arc<dyn SessionProvider>, config: Config) -> Self {
        Self {
            provider,
            config,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run a scenario to completion or first failure.
    ///
    /// Never panics on step errors; the session is closed exactly once on
    /// every path that reaches `Running`.
    pub async fn run(&mut self, scenario: &Scenario) -> ExecutionResult {
        let started_at = Utc::now();
        info!(
            "Running scenario {:?} ({} steps)",
            scenario.name,
            scenario.steps.len()
        );

        self.state = RunState::SessionStarting;
        let session = match self.provider.start().await {
            Ok(session) => session,
            Err(e) => {
                // Fatal, no retry: the scenario never reaches Running
                error!("Session startup failed: {}", e);
                self.state = RunState::TornDown;
                return ExecutionResult {
                    scenario: scenario.name.clone(),
                    outcome: Outcome::Failed {
                        step_index: None,
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    },
                    steps: Vec::new(),
                    artifacts: Vec::new(),
                    started_at,
                    finished_at: Utc::now(),
                };
            }
        };

        self.state = RunState::Running;
        let executor = ActionExecutor::new(session.driver(), self.config.clone());
        let capture = EvidenceCapture::new(self.config.artifact_dir.clone());

        let mut steps = Vec::new();
        let mut artifacts: Vec<PathBuf> = Vec::new();
        let mut failure: Option<(usize, Error)> = None;

        for (index, step) in scenario.steps.iter().enumerate() {
            let label = step.label();
            debug!("Step {}: {}", index, label);
            let step_started = std::time::Instant::now();

            match self
                .execute_step(&executor, &capture, step, &mut artifacts)
                .await
            {
                Ok(observed) => {
                    steps.push(StepReport {
                        index,
                        label,
                        outcome: StepOutcome::Passed,
                        observed,
                        duration_ms: step_started.elapsed().as_millis() as u64,
                    });
                }
                Err(e) => {
                    error!("Step {} ({}) failed: {}", index, label, e);
                    steps.push(StepReport {
                        index,
                        label,
                        outcome: StepOutcome::Failed {
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                        },
                        observed: None,
                        duration_ms: step_started.elapsed().as_millis() as u64,
                    });
                    failure = Some((index, e));
                    break;
                }
            }
        }

        self.state = match failure {
            None => RunState::Completed,
            Some(_) => RunState::Failed,
        };

        // Unconditional teardown; errors are logged, never propagated
        if let Err(e) = session.close().await {
            warn!("Session teardown failed: {}", e);
        }
        self.state = RunState::TornDown;

        let outcome = match failure {
            None => Outcome::Completed,
            Some((step_index, e)) => Outcome::Failed {
                step_index: Some(step_index),
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        };
        info!(
            "Scenario {:?} {}",
            scenario.name,
            match &outcome {
                Outcome::Completed => "completed".to_string(),
                Outcome::Failed { step_index, .. } => format!(
                    "failed at step {}",
                    step_index.map_or("startup".to_string(), |i| i.to_string())
                ),
            }
        );

        ExecutionResult {
            scenario: scenario.name.clone(),
            outcome,
            steps,
            artifacts,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn execute_step(
        &self,
        executor: &ActionExecutor,
        capture: &EvidenceCapture,
        step: &Step,
        artifacts: &mut Vec<PathBuf>,
    ) -> Result<Option<String>> {
        match step {
            Step::Navigate { url, timeout_ms } => {
                executor.navigate(url, *timeout_ms).await?;
                Ok(None)
            }
            Step::WaitFor {
                target,
                until,
                timeout_ms,
            } => {
                executor
                    .waiter()
                    .wait_for(
                        executor.driver().as_ref(),
                        target,
                        until,
                        self.config.wait_timeout(*timeout_ms),
                    )
                    .await?;
                Ok(None)
            }
            Step::Click { target } => {
                executor.click(target).await?;
                Ok(None)
            }
            Step::Fill { target, text } => {
                executor.fill(target, text).await?;
                Ok(None)
            }
            Step::Focus { target } => {
                executor.focus(target).await?;
                Ok(None)
            }
            Step::PressKey { key } => {
                executor.press_key(key).await?;
                Ok(None)
            }
            Step::ReadAttribute { target, name } => {
                let observed = executor.read_attribute(target, name).await?;
                Ok(Some(observed.unwrap_or_else(|| "null".to_string())))
            }
            Step::ReadValue { target } => {
                let observed = executor.read_value(target).await?;
                Ok(Some(observed.unwrap_or_else(|| "null".to_string())))
            }
            Step::Assert { condition, message } => {
                assertions::check(executor.driver().as_ref(), condition, message).await?;
                Ok(None)
            }
            Step::Screenshot { path, scope } => {
                let written = capture
                    .capture(
                        executor.driver().as_ref(),
                        executor.waiter(),
                        path,
                        scope.as_ref(),
                        self.config.wait_timeout(None),
                    )
                    .await?;
                artifacts.push(written.clone());
                Ok(Some(written.display().to_string()))
            }
            Step::Evaluate { script, args } => {
                let result = executor.evaluate(script, args).await?;
                Ok(Some(display_evaluation(&result)))
            }
            Step::Sleep { duration_ms } => {
                executor.sleep(*duration_ms).await;
                Ok(None)
            }
        }
    }
}

fn display_evaluation(result: &EvaluationResult) -> String {
    match result {
        EvaluationResult::String(s) => s.clone(),
        EvaluationResult::Number(n) => n.to_string(),
        EvaluationResult::Bool(b) => b.to_string(),
        EvaluationResult::Null => "null".to_string(),
        EvaluationResult::Object(v) => v.to_string(),
    }
}
