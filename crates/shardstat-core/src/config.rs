use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ShardError, ShardResult};
use crate::runbook::RunbookConfig;
use crate::setup::SetupPlan;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShardstatConfig {
    /// Driver-specific connection settings (parsed by the store crate).
    #[serde(default)]
    pub target: serde_yaml::Value,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub setup: SetupPlan,
    #[serde(default)]
    pub runbook: RunbookConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Accepted for compatibility; the report is identical either way.
    #[serde(default)]
    pub verbose: bool,
}

impl ShardstatConfig {
    pub fn from_file(path: &Path) -> ShardResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ShardError::Config(format!("Cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ShardResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ShardError::Config(format!("Invalid YAML: {e}")))
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> ShardResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ShardstatConfig::from_yaml_str("{}").unwrap();
        assert!(config.target.is_null());
        assert!(!config.report.verbose);
        assert_eq!(config.setup, SetupPlan::default());
        assert_eq!(config.runbook, RunbookConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let yaml = r#"
target:
  connection_url: mongodb://router:27017
report:
  verbose: true
runbook:
  router: 10.0.100.38
  chunk_size_mb: 64
"#;
        let config = ShardstatConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.target.get("connection_url").and_then(|v| v.as_str()),
            Some("mongodb://router:27017")
        );
        assert!(config.report.verbose);
        assert_eq!(config.runbook.router, "10.0.100.38");
        assert_eq!(config.runbook.shards.len(), 2);
    }

    #[test]
    fn partial_setup_section_keeps_remaining_defaults() {
        let config =
            ShardstatConfig::from_yaml_str("setup:\n  retry:\n    max_attempts: 5\n").unwrap();
        assert_eq!(config.setup.retry.max_attempts, 5);
        assert_eq!(config.setup.database, "algo_log_db");
        assert_eq!(config.setup.steps, SetupPlan::default().steps);

        let config = ShardstatConfig::from_yaml_str("setup:\n  database: metrics\n").unwrap();
        assert_eq!(config.setup.database, "metrics");
        assert_eq!(config.setup.steps.len(), 4);
        assert!(config.setup.validate().is_ok());
    }

    #[test]
    fn bad_yaml_is_a_config_error() {
        let err = ShardstatConfig::from_yaml_str("setup: [").unwrap_err();
        assert!(matches!(err, ShardError::Config(_)));

        let missing = ShardstatConfig::from_file(Path::new("/nonexistent/shardstat.yaml"));
        assert!(matches!(missing, Err(ShardError::Config(msg)) if msg.starts_with("Cannot read")));
    }
}
