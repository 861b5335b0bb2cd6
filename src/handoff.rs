//! Completion handoff — what leaves the assistant when a conversation
//! finishes.
//!
//! A completion is produced exactly once per session, after the final stage
//! is satisfied and before the stored session is cleared.

use async_trait::async_trait;
use serde::Serialize;

use crate::chat::context::SessionContext;
use crate::chat::data::{Category, QualificationData};
use crate::error::HandoffError;

/// A fully qualified lead, ready for the vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedLead {
    pub context: SessionContext,
    pub qualification_data: QualificationData,
}

/// A complete requirement, ready to post to the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedRequirement {
    pub context: SessionContext,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub qualification_data: QualificationData,
}

/// Either assistant's finished product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    Lead(QualifiedLead),
    Requirement(PostedRequirement),
}

/// Receives completions. The marketplace backend sits behind this in
/// production; tests record what they were handed.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn deliver(&self, completion: &Completion) -> Result<(), HandoffError>;
}

/// Sink that logs completions and accepts them all.
pub struct LogSink;

#[async_trait]
impl CompletionSink for LogSink {
    async fn deliver(&self, completion: &Completion) -> Result<(), HandoffError> {
        match completion {
            Completion::Lead(lead) => {
                tracing::info!(
                    contact = %lead.context.contact_email,
                    "Qualified lead completed"
                );
            }
            Completion::Requirement(req) => {
                tracing::info!(
                    contact = %req.context.contact_email,
                    title = %req.title,
                    category = %req.category,
                    "Requirement completed"
                );
            }
        }
        Ok(())
    }
}
