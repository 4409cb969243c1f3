use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{ShardError, ShardResult};
use crate::report::{SetupReport, StepOutcome, StepRecord};

/// One idempotent schema setup action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SetupStep {
    /// Drop the collection if it exists.
    DropCollection { collection: String },
    /// Single-field ascending index, named `<field>_1`.
    CreateIndex { collection: String, field: String },
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropCollection { collection } => write!(f, "drop {collection}"),
            Self::CreateIndex { collection, field } => {
                write!(f, "index {collection} {{{field}: 1}}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(500)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

/// Ordered setup steps against a single database. Omitted fields take the
/// default plan's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupPlan {
    pub database: String,
    pub steps: Vec<SetupStep>,
    pub retry: RetryPolicy,
}

pub const DEFAULT_DATABASE: &str = "algo_log_db";
pub const DEFAULT_COLLECTION: &str = "algo_log_collection";
pub const DEFAULT_INDEX_FIELDS: [&str; 3] = ["DocumentType", "TradeDateID", "GateExecID"];

impl Default for SetupPlan {
    fn default() -> Self {
        let mut steps = vec![SetupStep::DropCollection {
            collection: DEFAULT_COLLECTION.into(),
        }];
        steps.extend(DEFAULT_INDEX_FIELDS.iter().map(|field| SetupStep::CreateIndex {
            collection: DEFAULT_COLLECTION.into(),
            field: (*field).into(),
        }));
        Self {
            database: DEFAULT_DATABASE.into(),
            steps,
            retry: RetryPolicy::default(),
        }
    }
}

impl SetupPlan {
    /// Returns every problem found, not just the first.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.database.trim().is_empty() {
            problems.push("setup database name is empty".to_string());
        }
        if self.steps.is_empty() {
            problems.push("setup plan has no steps".to_string());
        }
        if self.retry.max_attempts == 0 {
            problems.push("retry.max_attempts must be at least 1".to_string());
        }
        for (i, step) in self.steps.iter().enumerate() {
            let (collection, field) = match step {
                SetupStep::DropCollection { collection } => (collection, None),
                SetupStep::CreateIndex { collection, field } => (collection, Some(field)),
            };
            if collection.trim().is_empty() {
                problems.push(format!("step #{}: collection name is empty", i + 1));
            } else if collection.starts_with("system.") {
                problems.push(format!(
                    "step #{}: refusing to touch system collection '{collection}'",
                    i + 1
                ));
            }
            if field.is_some_and(|f| f.trim().is_empty()) {
                problems.push(format!("step #{}: index field is empty", i + 1));
            }
        }
        problems
    }

    pub fn validate(&self) -> ShardResult<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ShardError::Config(problems.join("; ")))
        }
    }
}

/// Administrative commands a setup plan needs from the cluster.
#[async_trait]
pub trait SetupTarget: Send + Sync {
    /// Succeeds when the collection does not exist.
    async fn drop_collection(&self, database: &str, collection: &str) -> ShardResult<()>;

    /// Create an ascending single-field index and return its name.
    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> ShardResult<String>;
}

async fn apply_step(
    target: &dyn SetupTarget,
    database: &str,
    step: &SetupStep,
) -> ShardResult<()> {
    match step {
        SetupStep::DropCollection { collection } => {
            target.drop_collection(database, collection).await?;
            tracing::info!(database, collection = %collection, "Dropped collection");
        }
        SetupStep::CreateIndex { collection, field } => {
            let index = target.create_index(database, collection, field).await?;
            tracing::info!(database, collection = %collection, index = %index, "Ensured index");
        }
    }
    Ok(())
}

/// Execute the plan in order. Each step is retried on its own; the run
/// stops at the first step that runs out of attempts.
pub async fn run_setup(target: &dyn SetupTarget, plan: &SetupPlan) -> SetupReport {
    let id = Uuid::new_v4();
    let started_at = Utc::now();
    let run_start = Instant::now();
    let max_attempts = plan.retry.max_attempts.max(1);

    tracing::info!(%id, database = %plan.database, steps = plan.steps.len(), "Starting setup");

    let mut steps = Vec::with_capacity(plan.steps.len());
    let mut halted = false;

    for step in &plan.steps {
        if halted {
            steps.push(StepRecord {
                step: step.to_string(),
                outcome: StepOutcome::Skipped,
                attempts: 0,
                duration: Duration::ZERO,
                error: None,
            });
            continue;
        }

        let step_start = Instant::now();
        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            match apply_step(target, &plan.database, step).await {
                Ok(()) => break Ok(()),
                Err(e) if attempts < max_attempts => {
                    tracing::warn!(
                        step = %step,
                        attempt = attempts,
                        error = %e,
                        "Setup step failed, retrying"
                    );
                    tokio::time::sleep(plan.retry.backoff).await;
                }
                Err(e) => {
                    break Err(ShardError::SetupStep {
                        step: step.to_string(),
                        source: anyhow::Error::new(e),
                    })
                }
            }
        };

        let record = match result {
            Ok(()) => StepRecord {
                step: step.to_string(),
                outcome: StepOutcome::Ok,
                attempts,
                duration: step_start.elapsed(),
                error: None,
            },
            Err(e) => {
                tracing::error!(step = %step, attempts, error = %e, "Setup step gave up");
                halted = true;
                StepRecord {
                    step: step.to_string(),
                    outcome: StepOutcome::Failed,
                    attempts,
                    duration: step_start.elapsed(),
                    error: Some(e.to_string()),
                }
            }
        };
        steps.push(record);
    }

    let report = SetupReport {
        id,
        database: plan.database.clone(),
        started_at,
        completed_at: Utc::now(),
        total_duration: run_start.elapsed(),
        steps,
    };
    tracing::info!(%id, success = report.is_success(), "Setup finished");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::RecordingTarget;

    fn quick(plan: SetupPlan) -> SetupPlan {
        SetupPlan {
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: Duration::ZERO,
            },
            ..plan
        }
    }

    #[test]
    fn default_plan_matches_log_schema() {
        let plan = SetupPlan::default();
        assert_eq!(plan.database, "algo_log_db");
        assert_eq!(plan.steps.len(), 4);
        assert_eq!(
            plan.steps[0],
            SetupStep::DropCollection {
                collection: "algo_log_collection".into()
            }
        );
        assert_eq!(plan.steps[3].to_string(), "index algo_log_collection {GateExecID: 1}");
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn plan_parses_from_yaml() {
        let yaml = r#"
database: app
retry:
  max_attempts: 5
  backoff: 2s
steps:
  - action: drop_collection
    collection: events
  - action: create_index
    collection: events
    field: ts
"#;
        let plan: SetupPlan = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(plan.retry.max_attempts, 5);
        assert_eq!(plan.retry.backoff, Duration::from_secs(2));
        assert_eq!(
            plan.steps[1],
            SetupStep::CreateIndex {
                collection: "events".into(),
                field: "ts".into()
            }
        );
    }

    #[test]
    fn validation_collects_every_problem() {
        let plan = SetupPlan {
            database: " ".into(),
            steps: vec![
                SetupStep::DropCollection {
                    collection: "system.users".into(),
                },
                SetupStep::CreateIndex {
                    collection: "c".into(),
                    field: String::new(),
                },
            ],
            retry: RetryPolicy::default(),
        };
        assert_eq!(plan.problems().len(), 3);
        assert!(matches!(plan.validate(), Err(ShardError::Config(_))));
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let target = RecordingTarget::default();
        let report = run_setup(&target, &quick(SetupPlan::default())).await;

        assert!(report.is_success());
        assert_eq!(
            target.calls(),
            vec![
                "drop algo_log_db.algo_log_collection",
                "index algo_log_db.algo_log_collection.DocumentType",
                "index algo_log_db.algo_log_collection.TradeDateID",
                "index algo_log_db.algo_log_collection.GateExecID",
            ]
        );
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let target = RecordingTarget::default()
            .failing("index algo_log_db.algo_log_collection.TradeDateID", 2);
        let report = run_setup(&target, &quick(SetupPlan::default())).await;

        assert!(report.is_success());
        assert_eq!(report.steps[2].attempts, 3);
        assert_eq!(report.steps[1].attempts, 1);
    }

    #[tokio::test]
    async fn exhausted_step_halts_the_run() {
        let target = RecordingTarget::default()
            .failing("index algo_log_db.algo_log_collection.DocumentType", 10);
        let report = run_setup(&target, &quick(SetupPlan::default())).await;

        assert!(!report.is_success());
        assert_eq!(report.steps[1].outcome, StepOutcome::Failed);
        assert_eq!(report.steps[1].attempts, 3);
        assert!(report.steps[1]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("DocumentType")));
        assert_eq!(report.steps[2].outcome, StepOutcome::Skipped);
        assert_eq!(report.steps[3].outcome, StepOutcome::Skipped);
        assert_eq!(target.calls().len(), 4);
    }
}
