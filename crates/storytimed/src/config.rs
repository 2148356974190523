//! Configuration management for storytimed.
//!
//! Loads settings from /etc/storytime/config.toml or uses defaults. The
//! provider credential always comes from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use storytime_common::llm_client::LlmConfig;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/storytime/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/storytime/config.toml";

/// Environment variables checked, in order, for the provider API key
pub const API_KEY_ENV_VARS: [&str; 2] = ["OPENAI_API_KEY", "OPENAI_API_KEY_ENV_VAR"];

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allow any origin, for a UI served from a separate dev server
    #[serde(default)]
    pub cors_permissive: bool,
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
            cors_permissive: false,
        }
    }
}

/// Illustration URL template settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IllustrationConfig {
    #[serde(default = "default_image_base_url")]
    pub base_url: String,

    #[serde(default = "default_image_size")]
    pub width: u32,

    #[serde(default = "default_image_size")]
    pub height: u32,
}

fn default_image_base_url() -> String {
    "https://image.pollinations.ai/prompt".to_string()
}

fn default_image_size() -> u32 {
    512
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            width: default_image_size(),
            height: default_image_size(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub illustration: IllustrationConfig,
}

impl Config {
    /// Load config from an explicit path, or the standard locations, or
    /// return defaults. The API key is then read from the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            // An explicit path that cannot be read is an error, not a fallback
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_from_path(Path::new(CONFIG_PATH))
                .or_else(|_| Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH)))
                .unwrap_or_else(|e| {
                    warn!("[CONFIG] Config not found, using defaults: {}", e);
                    Config::default()
                }),
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("[CONFIG] Loaded config from {}", path.display());
        Ok(config)
    }

    /// Fill the API key from the environment. A key set in the file is only
    /// used when no environment variable is present.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = API_KEY_ENV_VARS
            .iter()
            .find_map(|&name| lookup(name).filter(|v| !v.trim().is_empty()));

        if let Some(key) = from_env {
            self.llm.api_key = Some(key);
        }

        if self.llm.api_key.is_none() {
            warn!("[CONFIG] No provider API key set; every story will use the fallback text");
        }
    }

    /// Save default config to path (for init)
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("[CONFIG] Saved default config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.server.max_body_bytes, 65536);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.illustration.width, 512);
        assert_eq!(config.illustration.height, 512);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[server]
bind_addr = "0.0.0.0:8080"

[llm]
model = "gpt-4o-mini"
timeout_secs = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 5);
        // Defaults for missing fields
        assert_eq!(config.llm.max_tokens, 1000);
        assert!(!config.server.cors_permissive);
        assert_eq!(config.illustration.base_url, "https://image.pollinations.ai/prompt");
    }

    #[test]
    fn test_env_key_preferred() {
        let mut config = Config::default();
        config.llm.api_key = Some("from-file".to_string());
        config.apply_env(|name| match name {
            "OPENAI_API_KEY_ENV_VAR" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.llm.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_missing_key_does_not_fail() {
        let mut config = Config::default();
        config.apply_env(|_| None);
        assert!(config.llm.api_key.is_none());

        config.apply_env(|_| Some("   ".to_string()));
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::save_default(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.bind_addr, "127.0.0.1:5000");
        assert_eq!(loaded.llm.model, "gpt-4o");
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(missing.as_path())).is_err());
    }
}
