use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ok,
    Failed,
    /// Not attempted because an earlier step failed.
    Skipped,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Ok => "OK",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        })
    }
}

/// Record of a single setup step.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: String,
    pub outcome: StepOutcome,
    pub attempts: u32,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Complete post-setup report.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub id: Uuid,
    pub database: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total_duration: Duration,
    pub steps: Vec<StepRecord>,
}

impl SetupReport {
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.outcome == StepOutcome::Ok)
    }

    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.outcome == StepOutcome::Failed)
    }
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{mins}m {secs}s")
    } else {
        let millis = d.as_millis();
        if millis < 1000 {
            format!("{millis}ms")
        } else {
            format!("{}.{}s", total_secs, d.subsec_millis() / 100)
        }
    }
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bar = "=".repeat(72);
        let thin = "-".repeat(72);
        let status = if self.is_success() { "COMPLETED" } else { "FAILED" };

        writeln!(f, "\n{bar}")?;
        writeln!(f, "  SCHEMA SETUP REPORT")?;
        writeln!(f, "{bar}\n")?;

        writeln!(f, "  Database: {}", self.database)?;
        writeln!(f, "  Run ID:   {}", self.id)?;
        writeln!(f, "  Status:   {status}")?;
        writeln!(f, "  Duration: {}", format_duration(self.total_duration))?;

        writeln!(f, "\n{thin}")?;
        writeln!(f, "  STEPS ({})", self.steps.len())?;
        writeln!(f, "{thin}\n")?;
        if self.steps.is_empty() {
            writeln!(f, "  (none)")?;
        } else {
            writeln!(
                f,
                "  {:<4} {:<40} {:<8} {:<9} {}",
                "#", "STEP", "RESULT", "ATTEMPTS", "DURATION"
            )?;
            for (i, s) in self.steps.iter().enumerate() {
                writeln!(
                    f,
                    "  {:<4} {:<40} {:<8} {:<9} {}",
                    i + 1,
                    s.step,
                    s.outcome,
                    s.attempts,
                    format_duration(s.duration)
                )?;
                if let Some(ref err) = s.error {
                    writeln!(f, "       -> {err}")?;
                }
            }
        }

        writeln!(f, "\n{thin}")?;
        writeln!(
            f,
            "  Started:    {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(
            f,
            "  Completed:  {}",
            self.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "{bar}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: &str, outcome: StepOutcome, error: Option<&str>) -> StepRecord {
        StepRecord {
            step: step.into(),
            outcome,
            attempts: 1,
            duration: Duration::from_millis(12),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn durations_render_compactly() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2_300)), "2.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn failed_report_lists_error_under_step() {
        let now = Utc::now();
        let report = SetupReport {
            id: Uuid::new_v4(),
            database: "algo_log_db".into(),
            started_at: now,
            completed_at: now,
            total_duration: Duration::from_millis(40),
            steps: vec![
                record("drop algo_log_collection", StepOutcome::Ok, None),
                record(
                    "index algo_log_collection {TradeDateID: 1}",
                    StepOutcome::Failed,
                    Some("timed out"),
                ),
                record("index algo_log_collection {GateExecID: 1}", StepOutcome::Skipped, None),
            ],
        };

        assert!(!report.is_success());
        assert_eq!(report.failed_step().map(|s| s.attempts), Some(1));
        let text = report.to_string();
        assert!(text.contains("Status:   FAILED"));
        assert!(text.contains("       -> timed out"));
        assert!(text.contains("SKIPPED"));
    }
}
