//! Error types for Lead Assist.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Interpreter error: {0}")]
    Interpreter(#[from] InterpreterError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Handoff error: {0}")]
    Handoff(#[from] HandoffError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Session-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open session store: {0}")]
    Open(String),

    #[error("Session store query failed: {0}")]
    Query(String),
}

/// Errors talking to the external interpretation service.
///
/// Display strings end up inside assistant chat messages when a turn fails,
/// so each one reads as a human sentence fragment.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    #[error("the interpretation service could not be reached: {0}")]
    Transport(String),

    #[error("the interpretation service answered with an error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("the interpretation service sent back an unreadable reply: {0}")]
    InvalidResponse(String),
}

/// Turn-processing errors.
///
/// Interpretation-service failures are NOT represented here — they are
/// recovered inside the turn as an assistant chat message. These variants
/// cover the conditions that genuinely end or refuse a turn.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("this conversation has already completed")]
    SessionComplete,

    #[error(
        "conversation completed with required fields still empty: {}",
        missing.join(", ")
    )]
    DataIntegrity { missing: Vec<&'static str> },
}

/// Completion-handoff errors.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("handoff rejected: {0}")]
    Rejected(String),
}

/// Why a stored session record was discarded instead of resumed.
///
/// Never user-facing: every variant recovers as a fresh session.
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    #[error("corrupt session record: {0}")]
    Corrupt(String),

    #[error("stored session belongs to a different context")]
    ContextMismatch,

    #[error("stored session was already completed")]
    AlreadyCompleted,
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
