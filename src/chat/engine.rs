//! The turn processor — one engine, instantiated per assistant variant.
//!
//! A turn is: record the user's message, send it with the prior history to
//! the interpretation service, fold the reply into the session, and either
//! advance the stage, hold for clarification, or finish. The engine owns
//! persistence: every non-trivial turn is saved, and a finished session is
//! delivered to the completion sink and then cleared from the store.

use std::sync::Arc;

use chrono::Utc;

use super::context::SessionContext;
use super::flow::Flow;
use super::message::Message;
use super::session::Session;
use super::stage::ConversationStage;
use crate::error::EngineError;
use crate::handoff::{Completion, CompletionSink};
use crate::interpreter::{InterpretRequest, Interpreter, TurnReply};
use crate::store::SessionStore;

/// Shared collaborators handed to every engine.
#[derive(Clone)]
pub struct EngineDeps {
    pub interpreter: Arc<dyn Interpreter>,
    pub store: Arc<dyn SessionStore>,
    pub sink: Arc<dyn CompletionSink>,
}

/// What one turn produced.
pub struct TurnOutcome<F: Flow> {
    /// Messages appended during this turn, the user's own echo first.
    pub new_messages: Vec<Message>,
    pub stage: F::Stage,
    pub data: F::Data,
    /// Present exactly once per session, on the finishing turn.
    pub completion: Option<Completion>,
}

pub struct Engine<F: Flow> {
    session: Session<F>,
    deps: EngineDeps,
}

impl<F: Flow> Engine<F> {
    /// Open a session: resume the stored one when it is still usable for
    /// this context, otherwise start fresh. A stored record that cannot be
    /// resumed is actively cleared.
    pub async fn open(context: SessionContext, deps: EngineDeps) -> Self {
        let resumed = match deps.store.fetch(F::STORE_KEY).await {
            Ok(Some(raw)) => match Session::<F>::try_resume(&raw, &context) {
                Ok(session) => {
                    tracing::info!(stage = %session.stage, "Resumed stored session");
                    Some(session)
                }
                Err(reason) => {
                    tracing::info!(%reason, "Discarding stored session");
                    if let Err(e) = deps.store.delete(F::STORE_KEY).await {
                        tracing::warn!(error = %e, "Failed to clear stale session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored session; starting fresh");
                None
            }
        };

        let session = resumed.unwrap_or_else(|| Session::fresh(context));
        Self { session, deps }
    }

    pub fn session(&self) -> &Session<F> {
        &self.session
    }

    /// Process one user turn.
    ///
    /// Interpretation failures are recovered inside the turn: the error is
    /// surfaced as an assistant message, stage and data stay untouched, and
    /// the session still persists. The returned error cases are a turn sent
    /// to a finished session and a data-integrity failure on the finishing
    /// turn.
    pub async fn submit_turn(&mut self, user_text: &str) -> Result<TurnOutcome<F>, EngineError> {
        if self.session.is_terminal() {
            return Err(EngineError::SessionComplete);
        }

        let first_new = self.session.messages.len();

        // The in-flight message rides in `user_input`; history stops just
        // before it.
        let history = self.session.messages.clone();
        self.session.messages.push(Message::user(user_text));

        let request = InterpretRequest {
            kind: F::KIND,
            user_input: user_text.to_string(),
            stage: self.session.stage.to_string(),
            history,
            context: self.session.context.clone(),
        };

        let completion = match self.deps.interpreter.interpret(request).await {
            Ok(reply) => self.apply_reply(&reply)?,
            Err(e) => {
                tracing::warn!(error = %e, stage = %self.session.stage, "Interpretation failed");
                self.session.messages.push(Message::assistant(format!(
                    "Sorry, I ran into a problem: {e}. Please try sending that again."
                )));
                None
            }
        };

        self.session.updated_at = Utc::now();

        if let Some(completion) = &completion {
            tracing::info!(stage = %self.session.stage, "Session finished");
            if let Err(e) = self.deps.sink.deliver(completion).await {
                tracing::warn!(error = %e, "Completion delivery failed");
            }
            if let Err(e) = self.deps.store.delete(F::STORE_KEY).await {
                tracing::warn!(error = %e, "Failed to clear finished session");
            }
        } else if !self.session.is_trivial() {
            self.persist().await;
        }

        Ok(TurnOutcome {
            new_messages: self.session.messages[first_new..].to_vec(),
            stage: self.session.stage,
            data: self.session.data.clone(),
            completion,
        })
    }

    /// Discard the session, stored and in memory, and start over.
    pub async fn reset(&mut self) {
        if let Err(e) = self.deps.store.delete(F::STORE_KEY).await {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
        self.session = Session::fresh(self.session.context.clone());
    }

    fn apply_reply(&mut self, reply: &TurnReply) -> Result<Option<Completion>, EngineError> {
        let analysis = reply.analysis.trim();
        if !analysis.is_empty() {
            self.session.messages.push(Message::assistant(analysis));
        }

        F::merge(&mut self.session.data, self.session.stage, reply);

        if reply.is_stage_complete {
            if let Some(next) = self.session.stage.next() {
                if next.is_terminal() {
                    // Finish before committing the terminal stage, so an
                    // integrity failure leaves the session resumable.
                    let completion = F::finish(&self.session.context, &self.session.data)?;
                    self.session.stage = next;
                    return Ok(Some(completion));
                }
                self.session.stage = next;
                self.push_prompt(reply, next);
            }
        } else {
            self.push_prompt(reply, self.session.stage);
        }
        Ok(None)
    }

    fn push_prompt(&mut self, reply: &TurnReply, stage: F::Stage) {
        let question = reply.next_question.trim();
        let text = if question.is_empty() {
            F::fallback_question(stage).to_string()
        } else {
            question.to_string()
        };
        self.session.messages.push(Message::assistant(text));
    }

    async fn persist(&self) {
        match self.session.record_json() {
            Ok(raw) => {
                if let Err(e) = self.deps.store.put(F::STORE_KEY, &raw).await {
                    tracing::warn!(error = %e, "Failed to persist session");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize session");
            }
        }
    }
}
