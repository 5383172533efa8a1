//! Review agent configuration.
//!
//! Repositories opt into custom behavior through a `.reviewbot.yml` (or
//! `.reviewbot.yaml`) at their root. A missing or empty file means
//! defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Model ids the agent accepts.
pub const SUPPORTED_MODELS: &[&str] = &[
    "anthropic.claude-sonnet-4-20250514-v1:0",
    "anthropic.claude-haiku-4-20251015-v1:0",
    "amazon.nova-pro-v1:0",
    "amazon.nova-lite-v1:0",
];

/// Patterns excluded from review unless the repo overrides them.
pub const DEFAULT_EXCLUDED: &[&str] = &[
    "*.lock",
    "*.min.js",
    "*.min.css",
    "vendor/**",
    "node_modules/**",
    "dist/**",
    "build/**",
];

// Config file names in order of precedence
const CONFIG_FILE_NAMES: &[&str] = &[".reviewbot.yml", ".reviewbot.yaml"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    #[serde(rename = "model")]
    pub model_id: String,
    #[serde(rename = "timeout")]
    pub timeout_seconds: u64,
    pub temperature: f64,
    pub max_files: Option<usize>,
    pub enable_rereview: bool,
    pub rules_path: String,
    pub excluded_patterns: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_id: "anthropic.claude-sonnet-4-20250514-v1:0".to_owned(),
            timeout_seconds: 600,
            temperature: 0.3,
            max_files: None,
            enable_rereview: true,
            rules_path: ".claude/rules".to_owned(),
            excluded_patterns: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a repository checkout.
    ///
    /// Returns defaults when no config file exists; fails when a file
    /// exists but does not parse or validate.
    pub fn load_from_repo(repo_root: &Path) -> Result<Self> {
        let Some(config_path) = Self::find_config_file(repo_root) else {
            debug!(path = %repo_root.display(), "no config file found, using defaults");
            return Ok(Self::default());
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        if content.trim().is_empty() {
            debug!(file = %config_path.display(), "config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

        info!(file = %config_path.display(), model_id = %config.model_id, "loaded configuration");
        Ok(config)
    }

    fn find_config_file(repo_root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| repo_root.join(name))
            .find(|path| path.is_file())
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_MODELS.contains(&self.model_id.as_str()) {
            anyhow::bail!(
                "unsupported model: {}. Supported models: {}",
                self.model_id,
                SUPPORTED_MODELS.join(", ")
            );
        }
        if !(60..=900).contains(&self.timeout_seconds) {
            anyhow::bail!(
                "timeout must be between 60 and 900 seconds, got {}",
                self.timeout_seconds
            );
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            anyhow::bail!(
                "temperature must be between 0.0 and 1.0, got {}",
                self.temperature
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.model_id, "anthropic.claude-sonnet-4-20250514-v1:0");
        assert_eq!(config.timeout_seconds, 600);
        assert!(config.enable_rereview);
        assert!(config.excluded_patterns.contains(&"*.lock".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::load_from_repo(dir.path()).unwrap();
        assert_eq!(config.timeout_seconds, 600);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".reviewbot.yml"), "  \n").unwrap();
        let config = AgentConfig::load_from_repo(dir.path()).unwrap();
        assert_eq!(config.rules_path, ".claude/rules");
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".reviewbot.yml"),
            "timeout: 120\nmax_files: 5\nexcluded_patterns:\n  - \"*.generated.rs\"\n",
        )
        .unwrap();
        let config = AgentConfig::load_from_repo(dir.path()).unwrap();
        assert_eq!(config.timeout_seconds, 120);
        assert_eq!(config.max_files, Some(5));
        assert_eq!(config.excluded_patterns, vec!["*.generated.rs"]);
        // Untouched fields keep defaults.
        assert_eq!(config.model_id, "anthropic.claude-sonnet-4-20250514-v1:0");
    }

    #[test]
    fn test_yml_takes_precedence_over_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".reviewbot.yml"), "timeout: 100\n").unwrap();
        fs::write(dir.path().join(".reviewbot.yaml"), "timeout: 200\n").unwrap();
        let config = AgentConfig::load_from_repo(dir.path()).unwrap();
        assert_eq!(config.timeout_seconds, 100);
    }

    #[test]
    fn test_unsupported_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".reviewbot.yml"), "model: gpt-2\n").unwrap();
        assert!(AgentConfig::load_from_repo(dir.path()).is_err());
    }

    #[test]
    fn test_timeout_out_of_range_rejected() {
        for timeout in ["30", "901"] {
            let dir = tempfile::tempdir().unwrap();
            fs::write(
                dir.path().join(".reviewbot.yml"),
                format!("timeout: {}\n", timeout),
            )
            .unwrap();
            assert!(AgentConfig::load_from_repo(dir.path()).is_err());
        }
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".reviewbot.yml"), "timeout: [not a number\n").unwrap();
        assert!(AgentConfig::load_from_repo(dir.path()).is_err());
    }
}
