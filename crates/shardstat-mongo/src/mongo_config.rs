use serde::{Deserialize, Serialize};

use shardstat_core::error::{ShardError, ShardResult};

pub const DEFAULT_CONNECTION_URL: &str = "mongodb://localhost:27017";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoTargetConfig {
    /// A `mongos` router; the sharding catalog is only complete there.
    #[serde(default = "default_connection_url")]
    pub connection_url: String,
    /// Database holding the sharding catalog.
    #[serde(default = "default_config_database")]
    pub config_database: String,
}

fn default_connection_url() -> String {
    DEFAULT_CONNECTION_URL.to_string()
}

fn default_config_database() -> String {
    "config".to_string()
}

impl Default for MongoTargetConfig {
    fn default() -> Self {
        Self {
            connection_url: default_connection_url(),
            config_database: default_config_database(),
        }
    }
}

impl MongoTargetConfig {
    /// A missing `target` section yields the defaults.
    pub fn from_yaml(value: &serde_yaml::Value) -> ShardResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value.clone())
            .map_err(|e| ShardError::Config(format!("Invalid MongoDB target config: {e}")))
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, url: Option<String>, config_database: Option<String>) -> Self {
        if let Some(url) = url {
            self.connection_url = url;
        }
        if let Some(name) = config_database {
            self.config_database = name;
        }
        self
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.connection_url.starts_with("mongodb://")
            && !self.connection_url.starts_with("mongodb+srv://")
        {
            problems.push(format!(
                "connection_url '{}' must start with mongodb:// or mongodb+srv://",
                self.connection_url
            ));
        }
        if self.config_database.trim().is_empty() {
            problems.push("config_database is empty".to_string());
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_target_uses_defaults() {
        let config = MongoTargetConfig::from_yaml(&serde_yaml::Value::Null).unwrap();
        assert_eq!(config, MongoTargetConfig::default());
        assert_eq!(config.config_database, "config");
    }

    #[test]
    fn overrides_win_over_file_values() {
        let yaml = "connection_url: mongodb://a:27017\nconfig_database: cfg";
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let config = MongoTargetConfig::from_yaml(&value)
            .unwrap()
            .with_overrides(Some("mongodb://b:27017".into()), None);
        assert_eq!(config.connection_url, "mongodb://b:27017");
        assert_eq!(config.config_database, "cfg");
    }

    #[test]
    fn rejects_non_mongodb_urls() {
        let config = MongoTargetConfig::default()
            .with_overrides(Some("http://x".into()), Some(" ".into()));
        assert_eq!(config.problems().len(), 2);

        let bad: serde_yaml::Value = serde_yaml::from_str("connection_url: [1, 2]").unwrap();
        assert!(matches!(MongoTargetConfig::from_yaml(&bad), Err(ShardError::Config(_))));
    }
}
