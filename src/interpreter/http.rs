//! HTTP client for the interpretation service.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{InterpretRequest, Interpreter, TurnReply};
use crate::config::InterpreterConfig;
use crate::error::{ConfigError, InterpreterError};

/// Talks to the interpretation service over HTTP. One POST per user turn.
pub struct HttpInterpreter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpInterpreter {
    pub fn new(config: &InterpreterConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "INTERPRETER_URL".into(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/interpret", self.base_url)
    }
}

#[async_trait]
impl Interpreter for HttpInterpreter {
    async fn interpret(&self, request: InterpretRequest) -> Result<TurnReply, InterpreterError> {
        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| InterpreterError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InterpreterError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| InterpreterError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            InterpreterError::InvalidResponse(format!("could not parse reply: {e}"))
        })
    }
}

/// Pull a human-readable message out of an error body. Services disagree on
/// the key, so try the common ones before giving up.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                if !text.trim().is_empty() {
                    return text.trim().to_string();
                }
            }
        }
        if let Some(text) = value
            .pointer("/error/message")
            .and_then(serde_json::Value::as_str)
        {
            if !text.trim().is_empty() {
                return text.trim().to_string();
            }
        }
    }
    format!("interpretation service returned status {status}")
}
