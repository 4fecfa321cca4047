//! Process configuration loaded from `APP_*` environment variables
//!
//! Loaded once at startup and never mutated afterwards. A `.env` file in the
//! working directory is applied first (see [`load_dotenv`]) so local runs can
//! keep settings next to the checkout.

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Prefix shared by every recognized variable
pub const ENV_PREFIX: &str = "APP_";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Pod phases counted as healthy when `APP_POD_HEALTHY_PHASES` is unset
///
/// `Succeeded` is the phase Kubernetes reports for pods whose containers all
/// exited 0. "Completed" is only what kubectl prints for it.
pub const DEFAULT_POD_HEALTHY_PHASES: &[&str] = &["Running", "Succeeded"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a boolean (true/false/t/f/1/0), got '{value}'")]
    InvalidBool { key: String, value: String },

    #[error("{key} must be a port number, got '{value}'")]
    InvalidPort { key: String, value: String },

    #[error("{key} must list at least one pod phase")]
    EmptyPhaseList { key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Local kubeconfig credentials and debug-level logging
    pub debug: bool,
    pub port: u16,
    /// Environment name embedded in badge labels, e.g. "staging"
    pub environment: String,
    pub pod_healthy_phases: Vec<String>,
    /// Explicit kubeconfig path; `None` means `~/.kube/config`
    pub kubeconfig: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            port: DEFAULT_PORT,
            environment: String::new(),
            pod_healthy_phases: DEFAULT_POD_HEALTHY_PHASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            kubeconfig: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// `lookup` receives full variable names (`APP_PORT`, ...). Tests use this
    /// with a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let var = |name: &str| {
            let key = format!("{}{}", ENV_PREFIX, name);
            let value = lookup(&key);
            (key, value)
        };

        if let (key, Some(value)) = var("DEBUG") {
            config.debug = parse_bool(&key, &value)?;
        }

        if let (key, Some(value)) = var("PORT") {
            config.port = value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { key, value })?;
        }

        if let (_, Some(value)) = var("ENV") {
            config.environment = value;
        }

        if let (key, Some(value)) = var("POD_HEALTHY_PHASES") {
            let phases: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if phases.is_empty() {
                return Err(ConfigError::EmptyPhaseList { key });
            }
            config.pod_healthy_phases = phases;
        }

        if let (_, Some(value)) = var("KUBECONFIG") {
            if !value.trim().is_empty() {
                config.kubeconfig = Some(PathBuf::from(value));
            }
        }

        Ok(config)
    }

    /// Default tracing filter directive for this configuration
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

/// Apply a `.env` file from the working directory, if one exists
///
/// Variables already present in the environment are left untouched.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => debug!(error = %e, "Ignoring unreadable .env file"),
    }
}

/// Same spellings as Go's `strconv.ParseBool`; empty is rejected
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
