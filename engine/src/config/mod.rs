//! Configuration management
//!
//! This module handles loading, validation, and management of the solver configuration.
//! Configuration is stored in TOML format at ~/.solver/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **server**: Bind address, upload ceiling, extension allow-list, scratch root
//! - **llm**: Completion endpoint, model, token variable, timeout
//! - **tools**: Local helper commands and their timeout
//! - **httpbin**: Echo service used by the request-mimicry question
//!
//! # Examples
//!
//! ```no_run
//! use solver_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Bind: {}", config.server.bind);
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use crate::secrets::SecretString;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote completion client settings
    #[serde(default)]
    pub llm: LLMConfig,

    /// Local helper commands
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Echo service settings
    #[serde(default)]
    pub httpbin: HttpbinConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Lowercase file extensions accepted for upload (without the dot)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Directory under which per-request scratch directories are created
    /// (system temp directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

/// Remote completion client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Base URL of the generative API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Name of the environment variable holding the bearer token
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout (seconds)
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Enable the search-grounding tool
    #[serde(default = "default_true")]
    pub search_tool: bool,
    // Note: the token itself is never stored in config
}

/// Local helper command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Editor executable queried with `-s`
    #[serde(default = "default_code_command")]
    pub code_command: String,

    /// Launcher used to run the formatter
    #[serde(default = "default_npx_command")]
    pub npx_command: String,

    /// Pinned formatter package
    #[serde(default = "default_prettier_package")]
    pub prettier_package: String,

    /// Upper bound for any helper command (seconds)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

/// Echo service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpbinConfig {
    /// URL queried with the extracted email
    #[serde(default = "default_httpbin_url")]
    pub url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_httpbin_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["csv", "xlsx", "xls", "zip", "md"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "LLM_API_TOKEN".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_code_command() -> String {
    "code".to_string()
}

fn default_npx_command() -> String {
    "npx".to_string()
}

fn default_prettier_package() -> String {
    "prettier@3.4.2".to_string()
}

fn default_command_timeout() -> u64 {
    60
}

fn default_httpbin_url() -> String {
    "https://httpbin.org/get".to_string()
}

fn default_httpbin_timeout() -> u64 {
    10
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
            scratch_dir: None,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
            search_tool: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            code_command: default_code_command(),
            npx_command: default_npx_command(),
            prettier_package: default_prettier_package(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl Default for HttpbinConfig {
    fn default() -> Self {
        Self {
            url: default_httpbin_url(),
            timeout_secs: default_httpbin_timeout(),
        }
    }
}

impl LLMConfig {
    /// Read the bearer token from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn api_token(&self) -> Option<SecretString> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from)
    }
}

impl Config {
    /// Load configuration from the default location (~/.solver/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();
        config.validate_and_process()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.solver/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".solver").join("config.toml"))
    }

    /// Validate and normalize configuration
    ///
    /// Lowercases and strips leading dots from the extension allow-list.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(EngineError::Config(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }

        self.server.allowed_extensions = self
            .server
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if self.server.allowed_extensions.is_empty() {
            return Err(EngineError::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.tools.command_timeout_secs == 0 {
            return Err(EngineError::Config(
                "tools.command_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.httpbin.timeout_secs == 0 {
            return Err(EngineError::Config(
                "httpbin.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.api_key_env.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.api_key_env must name an environment variable".to_string(),
            ));
        }

        Ok(())
    }
}
