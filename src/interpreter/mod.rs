//! Interpretation service integration.
//!
//! All natural-language understanding is delegated to an external HTTP
//! service: each user turn goes out with the conversation so far, and the
//! reply tells the engine what was extracted and whether the current stage
//! is satisfied. The engine never parses user text itself.

pub mod http;

pub use http::HttpInterpreter;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::context::SessionContext;
use crate::chat::data::{BantField, Category};
use crate::chat::message::Message;
use crate::error::InterpreterError;

/// Which assistant a request speaks for. The service prompts differently
/// for the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowKind {
    Qualify,
    GenerateRequirement,
}

/// One turn sent to the interpretation service.
///
/// `history` holds the conversation up to but not including the message in
/// `user_input`; the service sees the new input exactly once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretRequest {
    #[serde(rename = "type")]
    pub kind: FlowKind,
    pub user_input: String,
    pub stage: String,
    pub history: Vec<Message>,
    pub context: SessionContext,
}

/// What the interpretation service made of a turn.
///
/// Every field defaults, so a reply missing optional extractions still
/// parses; blank strings are treated downstream as "nothing extracted".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TurnReply {
    /// Conversational acknowledgement of what the user just said.
    pub analysis: String,
    /// Whether the current stage's goal has been met.
    pub is_stage_complete: bool,
    /// The question to ask next (or re-ask).
    pub next_question: String,
    /// Value extracted for the current stage's single slot.
    pub extracted_data: String,
    /// Requirement title, when the poster flow produced one.
    pub extracted_title: Option<String>,
    /// Requirement description, when the poster flow produced one.
    pub extracted_description: Option<String>,
    /// Requirement category, when the poster flow produced one.
    pub extracted_category: Option<Category>,
    /// Keyed BANT extractions, for stages that can touch several slots.
    pub extracted_bant_data: Option<HashMap<BantField, String>>,
}

/// A client for the external interpretation service.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, request: InterpretRequest) -> Result<TurnReply, InterpreterError>;
}
