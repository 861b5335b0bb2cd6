//! Greetings and canned stage questions.
//!
//! The interpretation service normally supplies the next question; these are
//! the openers and the fallbacks used whenever it returns a blank one.

use super::context::{SessionContext, SessionSubject};
use super::stage::{PosterStage, QualifyStage};

/// Opening message for a lead-qualification session. Names the service and
/// vendor when the context carries them, then asks the budget question.
pub fn qualify_greeting(context: &SessionContext) -> String {
    let name = context.contact_name.trim();
    let hello = if name.is_empty() {
        "Hi there!".to_string()
    } else {
        format!("Hi {name}!")
    };

    match &context.subject {
        SessionSubject::ServiceInquiry {
            service_name,
            vendor_name,
            ..
        } => format!(
            "{hello} Thanks for your interest in {service_name} from {vendor_name}. \
             I'd like to ask a few quick questions so {vendor_name} can prepare a \
             useful response. First: {}",
            question_for_qualify(QualifyStage::Budget)
        ),
        SessionSubject::RequirementPost => format!(
            "{hello} I'd like to ask a few quick questions about what you're \
             looking for. First: {}",
            question_for_qualify(QualifyStage::Budget)
        ),
    }
}

/// Opening message for a requirement-poster session.
pub fn poster_greeting(context: &SessionContext) -> String {
    let name = context.contact_name.trim();
    let hello = if name.is_empty() {
        "Hi there!".to_string()
    } else {
        format!("Hi {name}!")
    };
    format!(
        "{hello} Let's put together your requirement so the right vendors can \
         find it. {}",
        question_for_poster(PosterStage::Details)
    )
}

/// Canned question for a qualification stage, used when the interpretation
/// service returns no next question.
pub fn question_for_qualify(stage: QualifyStage) -> &'static str {
    match stage {
        QualifyStage::Budget => "What budget range do you have in mind for this?",
        QualifyStage::Authority => "Who will be making the final decision on this purchase?",
        QualifyStage::Need => "What specific problem are you looking to solve?",
        QualifyStage::Timeline => "When are you looking to get started?",
        QualifyStage::Completed => {
            "Thanks! I have everything I need — the vendor will be in touch shortly."
        }
    }
}

/// Canned question for a poster stage.
pub fn question_for_poster(stage: PosterStage) -> &'static str {
    match stage {
        PosterStage::Details => {
            "To start, tell me what you need in a sentence or two — I'll draft \
             a title and description from it."
        }
        PosterStage::Budget => "What budget range do you have in mind for this?",
        PosterStage::Authority => "Who will be making the final decision on this purchase?",
        PosterStage::Need => "What specific problem are you looking to solve?",
        PosterStage::Timeline => "When are you looking to get started?",
        PosterStage::Review => {
            "Does it all look right, or is there anything you'd like to change?"
        }
        PosterStage::Completed => "Thanks! Your requirement has been posted.",
    }
}
