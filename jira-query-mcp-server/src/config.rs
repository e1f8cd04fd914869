//! Configuration management for the JIRA Query MCP Server
//!
//! Handles loading configuration from environment variables, TOML files,
//! and provides sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Log levels accepted by `MCP_LOG_LEVEL`
const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Upper bound on issues returned by a single tool call
pub const MAX_RESULTS_LIMIT: u32 = 1000;

/// Main configuration structure for the JIRA Query MCP Server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Connection settings for the JIRA instance
    pub jira: JiraSettings,

    /// MCP server behaviour
    pub server: ServerSettings,
}

/// JIRA connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraSettings {
    /// JIRA instance URL (required)
    pub url: String,

    /// API token or personal access token (required)
    pub token: String,

    /// Username; enables the basic-auth fallback when bearer auth is rejected
    pub username: Option<String>,

    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

/// MCP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Path to the knowledge store document
    pub knowledge_store_path: PathBuf,

    /// Knowledge store backend (default: "yaml")
    pub knowledge_store_type: String,

    /// Log level name (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    pub log_level: String,

    /// Cap applied to every JQL query (default: 100, max: 1000)
    pub max_results: u32,
}

impl Default for JiraSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            username: None,
            request_timeout_seconds: 30,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            knowledge_store_path: PathBuf::from("knowledge_store.yaml"),
            knowledge_store_type: "yaml".to_string(),
            log_level: "INFO".to_string(),
            max_results: 100,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, TOML file, and defaults
    /// Priority: env vars > TOML file > defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::from_files_or_default();

        config.load_from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Load only the server section (env > TOML > defaults) without requiring
    /// JIRA credentials. Used by commands that never contact JIRA.
    pub fn load_server_settings() -> Result<ServerSettings> {
        let mut config = Self::from_files_or_default();
        config.load_from_env()?;
        config.server.validate()?;
        Ok(config.server)
    }

    fn from_files_or_default() -> Self {
        if let Ok(file_config) = Self::load_from_file("config/jira-mcp-config.toml") {
            info!("Loaded configuration from TOML file");
            file_config
        } else if let Ok(file_config) = Self::load_from_file("jira-mcp-config.toml") {
            info!("Loaded configuration from TOML file in current directory");
            file_config
        } else {
            debug!("No TOML configuration file found, using defaults and environment variables");
            Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("JIRA_URL") {
            self.jira.url = url;
            debug!("Loaded JIRA_URL from environment");
        }

        if let Ok(token) = env::var("JIRA_TOKEN") {
            self.jira.token = token;
            debug!("Loaded JIRA_TOKEN from environment");
        }

        if let Ok(username) = env::var("JIRA_USERNAME") {
            self.jira.username = Some(username).filter(|u| !u.trim().is_empty());
            debug!("Loaded JIRA_USERNAME from environment");
        }

        if let Ok(timeout) = env::var("JIRA_REQUEST_TIMEOUT") {
            self.jira.request_timeout_seconds = timeout
                .parse::<u64>()
                .with_context(|| format!("JIRA_REQUEST_TIMEOUT must be a number, got '{}'", timeout))?;
            debug!(
                "Set request timeout to {} seconds from environment",
                self.jira.request_timeout_seconds
            );
        }

        if let Ok(path) = env::var("MCP_KNOWLEDGE_STORE_PATH") {
            self.server.knowledge_store_path = PathBuf::from(path);
            debug!("Loaded MCP_KNOWLEDGE_STORE_PATH from environment");
        }

        if let Ok(store_type) = env::var("MCP_KNOWLEDGE_STORE_TYPE") {
            self.server.knowledge_store_type = store_type;
        }

        if let Ok(level) = env::var("MCP_LOG_LEVEL") {
            self.server.log_level = level;
        }

        if let Ok(max_results) = env::var("MCP_MAX_RESULTS") {
            self.server.max_results = max_results.parse::<u32>().with_context(|| {
                format!("MCP_MAX_RESULTS must be a number, got '{}'", max_results)
            })?;
            debug!(
                "Set max results to {} from environment",
                self.server.max_results
            );
        }

        Ok(())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.jira.url.is_empty() {
            return Err(anyhow::anyhow!(
                "JIRA URL is required. Set JIRA_URL environment variable or configure in TOML file."
            ));
        }

        if !self.jira.url.starts_with("http://") && !self.jira.url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "JIRA URL must start with http:// or https://. Got: {}",
                self.jira.url
            ));
        }

        if self.jira.token.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "JIRA token is required. Set JIRA_TOKEN environment variable or configure in TOML file."
            ));
        }

        if self.jira.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("request_timeout_seconds must be greater than 0"));
        }

        if self.jira.username.is_none() {
            info!("No JIRA username configured, using token authentication only");
        }

        self.server.validate()?;

        info!("Configuration validation successful");
        Ok(())
    }
}

impl ServerSettings {
    fn validate(&self) -> Result<()> {
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(anyhow::anyhow!(
                "max_results must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT,
                self.max_results
            ));
        }

        let level = self.log_level.to_uppercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow::anyhow!(
                "log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log_level
            ));
        }

        if self.max_results > 500 {
            warn!("max_results is above 500, large queries may be slow");
        }

        Ok(())
    }
}

/// Map a level name (DEBUG/INFO/WARNING/ERROR/CRITICAL) to a tracing directive
pub fn level_directive(level: &str) -> &'static str {
    match level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ENV_KEYS: [&str; 8] = [
        "JIRA_URL",
        "JIRA_TOKEN",
        "JIRA_USERNAME",
        "JIRA_REQUEST_TIMEOUT",
        "MCP_KNOWLEDGE_STORE_PATH",
        "MCP_KNOWLEDGE_STORE_TYPE",
        "MCP_LOG_LEVEL",
        "MCP_MAX_RESULTS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    fn valid_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.jira.url = "https://test.atlassian.net".to_string();
        config.jira.token = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.jira.request_timeout_seconds, 30);
        assert_eq!(config.server.max_results, 100);
        assert_eq!(config.server.log_level, "INFO");
        assert_eq!(config.server.knowledge_store_type, "yaml");
        assert_eq!(
            config.server.knowledge_store_path,
            PathBuf::from("knowledge_store.yaml")
        );
    }

    #[test]
    #[serial]
    fn test_env_var_loading() {
        clear_env();
        env::set_var("JIRA_URL", "https://test.atlassian.net");
        env::set_var("JIRA_TOKEN", "test_token");
        env::set_var("JIRA_USERNAME", "bot@example.com");
        env::set_var("MCP_KNOWLEDGE_STORE_PATH", "/etc/jira/queries.yaml");
        env::set_var("MCP_MAX_RESULTS", "250");
        env::set_var("MCP_LOG_LEVEL", "debug");

        let mut config = ServerConfig::default();
        config.load_from_env().unwrap();

        assert_eq!(config.jira.url, "https://test.atlassian.net");
        assert_eq!(config.jira.token, "test_token");
        assert_eq!(config.jira.username.as_deref(), Some("bot@example.com"));
        assert_eq!(
            config.server.knowledge_store_path,
            PathBuf::from("/etc/jira/queries.yaml")
        );
        assert_eq!(config.server.max_results, 250);
        assert!(config.validate().is_ok());
        assert_eq!(level_directive(&config.server.log_level), "debug");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_non_numeric_max_results_is_rejected() {
        clear_env();
        env::set_var("MCP_MAX_RESULTS", "lots");

        let mut config = ServerConfig::default();
        let err = config.load_from_env().unwrap_err();
        assert!(err.to_string().contains("MCP_MAX_RESULTS"));

        clear_env();
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ServerConfig::default();

        // Empty URL should fail validation
        assert!(config.validate().is_err());

        // Invalid URL format should fail
        config.jira.url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        // Missing token should fail
        config.jira.url = "https://test.atlassian.net".to_string();
        assert!(config.validate().is_err());

        config.jira.token = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_results_bounds() {
        let mut config = valid_config();

        config.server.max_results = 0;
        assert!(config.validate().is_err());

        config.server.max_results = 1001;
        assert!(config.validate().is_err());

        config.server.max_results = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = valid_config();

        config.server.log_level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.server.log_level = "warning".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(level_directive(&config.server.log_level), "warn");

        assert_eq!(level_directive("CRITICAL"), "error");
    }

    #[test]
    fn test_toml_file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jira-mcp-config.toml");
        std::fs::write(
            &path,
            r#"
[jira]
url = "https://jira.example.com"
token = "from-file"

[server]
knowledge_store_path = "queries.yaml"
max_results = 40
"#,
        )
        .unwrap();

        let config = ServerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.jira.url, "https://jira.example.com");
        assert_eq!(config.jira.request_timeout_seconds, 30);
        assert_eq!(config.server.max_results, 40);
        assert_eq!(config.server.log_level, "INFO");
        assert!(config.validate().is_ok());
    }
}
