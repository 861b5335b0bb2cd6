//! One conversation's state, and the persisted record it round-trips
//! through.
//!
//! A session is created fresh (greeting only) or resumed from a stored
//! record. Resume is guarded: the record must parse, must carry the same
//! context the caller opened with, and must not already be finished.
//! Anything else is discarded and the caller starts fresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::SessionContext;
use super::flow::Flow;
use super::message::Message;
use super::stage::ConversationStage;
use crate::error::ResumeError;

pub struct Session<F: Flow> {
    /// Runtime identity, fresh on every create or resume. Lets callers
    /// detect turns aimed at a session that has since been replaced.
    pub id: Uuid,
    pub context: SessionContext,
    pub messages: Vec<Message>,
    pub data: F::Data,
    pub stage: F::Stage,
    pub updated_at: DateTime<Utc>,
}

/// The stored shape. `data` and `timestamp` are tolerated when absent;
/// `context`, `messages`, and `currentStage` are not.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord<S, D> {
    context: SessionContext,
    messages: Vec<Message>,
    #[serde(default)]
    data: D,
    current_stage: S,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl<F: Flow> Session<F> {
    /// Start a new session: greeting message, first stage, empty data.
    pub fn fresh(context: SessionContext) -> Self {
        let greeting = F::greeting(&context);
        Self {
            id: Uuid::new_v4(),
            context,
            messages: vec![Message::assistant(greeting)],
            data: F::Data::default(),
            stage: F::Stage::first(),
            updated_at: Utc::now(),
        }
    }

    /// Rebuild a session from a stored record, if it is still usable for
    /// `context`.
    pub fn try_resume(raw: &str, context: &SessionContext) -> Result<Self, ResumeError> {
        let record: SessionRecord<F::Stage, F::Data> =
            serde_json::from_str(raw).map_err(|e| ResumeError::Corrupt(e.to_string()))?;

        if record.messages.is_empty() {
            return Err(ResumeError::Corrupt("record has no messages".into()));
        }
        if record.context != *context {
            return Err(ResumeError::ContextMismatch);
        }
        if record.current_stage.is_terminal() {
            return Err(ResumeError::AlreadyCompleted);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            context: record.context,
            messages: record.messages,
            data: record.data,
            stage: record.current_stage,
            updated_at: record.timestamp,
        })
    }

    /// Whether the session holds nothing beyond the opening greeting.
    /// Trivial sessions are not worth persisting.
    pub fn is_trivial(&self) -> bool {
        self.messages.len() <= 1
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Serialize to the stored record shape.
    pub fn record_json(&self) -> serde_json::Result<String> {
        let record = SessionRecord {
            context: self.context.clone(),
            messages: self.messages.clone(),
            data: self.data.clone(),
            current_stage: self.stage,
            timestamp: self.updated_at,
        };
        serde_json::to_string(&record)
    }
}

impl<F: Flow> Clone for Session<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            context: self.context.clone(),
            messages: self.messages.clone(),
            data: self.data.clone(),
            stage: self.stage,
            updated_at: self.updated_at,
        }
    }
}

impl<F: Flow> std::fmt::Debug for Session<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("stage", &self.stage)
            .field("messages", &self.messages.len())
            .finish()
    }
}
