//! Conversational assistants — turn-based structured data gathering.
//!
//! Two assistants share one engine: the lead qualifier walks a buyer
//! through BANT questions about a listed service, and the requirement
//! poster drafts a marketplace requirement (details, BANT, then a review
//! pass). Each turn sends the user's text to the external interpretation
//! service and folds the structured reply into the session, which persists
//! between visits until the conversation finishes.

pub mod context;
pub mod data;
pub mod engine;
pub mod flow;
pub mod message;
pub mod prompts;
pub mod routes;
pub mod session;
pub mod stage;

pub use context::{SessionContext, SessionSubject};
pub use data::{BantField, Category, QualificationData, RequirementDraft};
pub use engine::{Engine, EngineDeps, TurnOutcome};
pub use flow::{Flow, PosterFlow, QualifyFlow};
pub use message::{Message, Sender};
pub use routes::{AssistState, assist_routes};
pub use session::Session;
pub use stage::{ConversationStage, PosterStage, QualifyStage};
