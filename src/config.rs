//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default request timeout for interpretation calls.
const DEFAULT_INTERPRETER_TIMEOUT_SECS: u64 = 30;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the chat API binds to.
    pub bind_addr: String,
    /// Path of the libSQL session database.
    pub db_path: String,
    /// Interpretation-service settings.
    pub interpreter: InterpreterConfig,
}

/// Settings for the external interpretation service.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Base URL of the service, without a trailing path.
    pub base_url: String,
    /// Optional bearer token sent on every request.
    pub api_key: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `INTERPRETER_URL` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("INTERPRETER_URL")
            .map_err(|_| ConfigError::MissingEnvVar("INTERPRETER_URL".to_string()))?;

        let api_key = std::env::var("INTERPRETER_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        let timeout_secs = match std::env::var("INTERPRETER_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "INTERPRETER_TIMEOUT_SECS".to_string(),
                message: e.to_string(),
            })?,
            Err(_) => DEFAULT_INTERPRETER_TIMEOUT_SECS,
        };

        let bind_addr =
            std::env::var("LEAD_ASSIST_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let db_path = std::env::var("LEAD_ASSIST_DB_PATH")
            .unwrap_or_else(|_| "./data/lead-assist.db".to_string());

        Ok(Self {
            bind_addr,
            db_path,
            interpreter: InterpreterConfig {
                base_url,
                api_key,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_INTERPRETER_TIMEOUT_SECS),
        }
    }
}
