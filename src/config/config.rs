use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::validate_gateway_url;
use crate::constants::{
    CONFIG_FILE, DEFAULT_RELAY_URL, DEFAULT_TIMEOUT_SECS, ENV_ADMIN_CODE, ENV_GATEWAY_URL, ENV_RELAY_URL,
};
use crate::error::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "simple" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConsoleError::InvalidInput(format!("Unknown output format '{}'", other))),
        }
    }
}

/// Persisted settings. The admin code is deliberately not part of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub gateway_url: Option<String>,
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default)]
    pub default_role_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gateway_url: None,
            relay_url: default_relay_url(),
            default_role_id: None,
            timeout_secs: default_timeout_secs(),
            output_format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Applies `REVOPS_GATEWAY_URL` and `REVOPS_RELAY_URL` on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var(ENV_GATEWAY_URL) {
            if !url.trim().is_empty() {
                self.gateway_url = Some(url.trim().to_string());
            }
        }
        if let Ok(url) = env::var(ENV_RELAY_URL) {
            if !url.trim().is_empty() {
                self.relay_url = url.trim().to_string();
            }
        }
        self
    }

    pub fn set_gateway_url(&mut self, url: &str) -> ConsoleResult<()> {
        self.gateway_url = Some(validate_gateway_url(url)?);
        Ok(())
    }

    pub fn require_gateway_url(&self) -> ConsoleResult<String> {
        let url = self.gateway_url.as_deref().ok_or_else(|| {
            ConsoleError::Config(
                "No gateway URL saved. Run 'revops config set-gateway <URL>' first.".to_string(),
            )
        })?;
        validate_gateway_url(url)
    }
}

pub fn config_path() -> ConsoleResult<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| ConsoleError::Config("Could not find home directory".to_string()))?;
    Ok(home_dir.join(CONFIG_FILE))
}

pub fn load_config() -> ConsoleResult<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> ConsoleResult<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)
        .map_err(|e| ConsoleError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&config_str)
        .map_err(|e| ConsoleError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

pub fn save_config(config: &Config) -> ConsoleResult<()> {
    save_config_to(config, &config_path()?)
}

pub fn save_config_to(config: &Config, path: &Path) -> ConsoleResult<()> {
    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}

/// Admin code from the environment. Never read from or written to the config file.
pub fn get_admin_code() -> Option<String> {
    env::var(ENV_ADMIN_CODE)
        .ok()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.relay_url, DEFAULT_RELAY_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config
            .set_gateway_url("https://script.google.com/macros/s/abc/exec")
            .unwrap();
        config.output_format = OutputFormat::Json;
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(!fs::read_to_string(&path).unwrap().contains("admin"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"gateway_url":null}"#).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.relay_url, DEFAULT_RELAY_URL);
        assert_eq!(loaded.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConsoleError::Config(_))));
    }

    #[test]
    fn test_invalid_gateway_rejected() {
        let mut config = Config::default();
        assert!(config.set_gateway_url("https://evil.example/exec").is_err());
        assert!(config.gateway_url.is_none());
        assert!(config.require_gateway_url().is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("simple".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
