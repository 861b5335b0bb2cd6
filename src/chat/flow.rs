//! Assistant variants.
//!
//! Both assistants share one turn-processing engine; a `Flow` supplies
//! everything that differs: the stage sequence, the accumulated data shape,
//! the merge rule for extractions, and the finished payload.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::context::SessionContext;
use super::data::{QualificationData, RequirementDraft};
use super::prompts;
use super::stage::{ConversationStage, PosterStage, QualifyStage};
use crate::error::EngineError;
use crate::handoff::{Completion, PostedRequirement, QualifiedLead};
use crate::interpreter::{FlowKind, TurnReply};

/// Strategy for one assistant variant.
pub trait Flow: Send + Sync + 'static {
    type Stage: ConversationStage;
    type Data: Clone
        + Default
        + PartialEq
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Request tag the interpretation service dispatches on.
    const KIND: FlowKind;
    /// Fixed storage slot for this variant's persisted session.
    const STORE_KEY: &'static str;

    /// Opening assistant message for a fresh session.
    fn greeting(context: &SessionContext) -> String;

    /// Canned question used when the service returns a blank one.
    fn fallback_question(stage: Self::Stage) -> &'static str;

    /// Fold a turn's extractions into the accumulator. Only fields the
    /// current stage is allowed to touch may change.
    fn merge(data: &mut Self::Data, stage: Self::Stage, reply: &TurnReply);

    /// Produce the finished payload, or a data-integrity error naming what
    /// is still missing.
    fn finish(context: &SessionContext, data: &Self::Data) -> Result<Completion, EngineError>;
}

/// Lead qualification: BANT only, against a specific vendor service.
pub struct QualifyFlow;

impl Flow for QualifyFlow {
    type Stage = QualifyStage;
    type Data = QualificationData;

    const KIND: FlowKind = FlowKind::Qualify;
    const STORE_KEY: &'static str = "lead_qualification_session";

    fn greeting(context: &SessionContext) -> String {
        prompts::qualify_greeting(context)
    }

    fn fallback_question(stage: QualifyStage) -> &'static str {
        prompts::question_for_qualify(stage)
    }

    fn merge(data: &mut QualificationData, stage: QualifyStage, reply: &TurnReply) {
        if let Some(field) = stage.bant_field() {
            let value = reply.extracted_data.trim();
            if !value.is_empty() {
                data.set(field, value);
            }
        }
    }

    fn finish(
        context: &SessionContext,
        data: &QualificationData,
    ) -> Result<Completion, EngineError> {
        let missing = data.missing_fields();
        if !missing.is_empty() {
            return Err(EngineError::DataIntegrity { missing });
        }
        Ok(Completion::Lead(QualifiedLead {
            context: context.clone(),
            qualification_data: data.clone(),
        }))
    }
}

/// Requirement poster: detail gathering, then BANT, then a review pass.
pub struct PosterFlow;

impl Flow for PosterFlow {
    type Stage = PosterStage;
    type Data = RequirementDraft;

    const KIND: FlowKind = FlowKind::GenerateRequirement;
    const STORE_KEY: &'static str = "requirement_draft_session";

    fn greeting(context: &SessionContext) -> String {
        prompts::poster_greeting(context)
    }

    fn fallback_question(stage: PosterStage) -> &'static str {
        prompts::question_for_poster(stage)
    }

    fn merge(draft: &mut RequirementDraft, stage: PosterStage, reply: &TurnReply) {
        match stage {
            PosterStage::Details => apply_details(draft, reply),
            // Review accepts user-requested edits to anything already
            // gathered.
            PosterStage::Review => {
                apply_details(draft, reply);
                if let Some(fields) = &reply.extracted_bant_data {
                    draft.qualification_data.apply(fields);
                }
            }
            // BANT stages may only write their own slot; extractions for
            // other slots are dropped.
            _ => {
                let Some(field) = stage.bant_field() else {
                    return;
                };
                if let Some(value) = reply
                    .extracted_bant_data
                    .as_ref()
                    .and_then(|fields| fields.get(&field))
                {
                    let value = value.trim();
                    if !value.is_empty() {
                        draft.qualification_data.set(field, value);
                    }
                }
            }
        }
    }

    fn finish(
        context: &SessionContext,
        draft: &RequirementDraft,
    ) -> Result<Completion, EngineError> {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(EngineError::DataIntegrity { missing });
        }
        let Some(category) = draft.category else {
            return Err(EngineError::DataIntegrity {
                missing: vec!["CATEGORY"],
            });
        };
        Ok(Completion::Requirement(PostedRequirement {
            context: context.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            category,
            qualification_data: draft.qualification_data.clone(),
        }))
    }
}

fn apply_details(draft: &mut RequirementDraft, reply: &TurnReply) {
    if let Some(title) = &reply.extracted_title {
        let title = title.trim();
        if !title.is_empty() {
            draft.title = title.to_string();
        }
    }
    if let Some(description) = &reply.extracted_description {
        let description = description.trim();
        if !description.is_empty() {
            draft.description = description.to_string();
        }
    }
    if let Some(category) = reply.extracted_category {
        draft.category = Some(category);
    }
}
