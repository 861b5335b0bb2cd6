//! Conversation stages — the fixed, ordered sequences each assistant walks.
//!
//! Qualification: Budget → Authority → Need → Timeline → Completed.
//! Poster: Details → Budget → Authority → Need → Timeline → Review →
//! Completed.

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::data::BantField;

/// A step in a fixed, ordered conversation sequence.
///
/// `next` is a pure function over the sequence: each stage maps to its
/// immediate successor and the terminal stage maps to `None`. A stage never
/// skips ahead and never regresses within a session — the engine only ever
/// assigns `stage.next()` or leaves the stage alone.
pub trait ConversationStage:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The stage a fresh session starts in.
    fn first() -> Self;

    /// The immediate successor in the fixed sequence, if any.
    fn next(self) -> Option<Self>;

    /// Whether this stage is terminal (no outgoing transitions).
    fn is_terminal(self) -> bool;

    /// The BANT slot this stage solicits, if it is a BANT stage.
    fn bant_field(self) -> Option<BantField>;
}

/// Stages of the lead-qualification assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualifyStage {
    Budget,
    Authority,
    Need,
    Timeline,
    Completed,
}

impl ConversationStage for QualifyStage {
    fn first() -> Self {
        Self::Budget
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Budget => Some(Self::Authority),
            Self::Authority => Some(Self::Need),
            Self::Need => Some(Self::Timeline),
            Self::Timeline => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    fn bant_field(self) -> Option<BantField> {
        match self {
            Self::Budget => Some(BantField::Budget),
            Self::Authority => Some(BantField::Authority),
            Self::Need => Some(BantField::Need),
            Self::Timeline => Some(BantField::Timeline),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for QualifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Budget => "BUDGET",
            Self::Authority => "AUTHORITY",
            Self::Need => "NEED",
            Self::Timeline => "TIMELINE",
            Self::Completed => "COMPLETED",
        };
        write!(f, "{s}")
    }
}

/// Stages of the requirement-poster assistant.
///
/// Review may be re-entered: the engine simply declines to advance while
/// the interpretation service reports the stage incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PosterStage {
    Details,
    Budget,
    Authority,
    Need,
    Timeline,
    Review,
    Completed,
}

impl ConversationStage for PosterStage {
    fn first() -> Self {
        Self::Details
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Details => Some(Self::Budget),
            Self::Budget => Some(Self::Authority),
            Self::Authority => Some(Self::Need),
            Self::Need => Some(Self::Timeline),
            Self::Timeline => Some(Self::Review),
            Self::Review => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    fn bant_field(self) -> Option<BantField> {
        match self {
            Self::Budget => Some(BantField::Budget),
            Self::Authority => Some(BantField::Authority),
            Self::Need => Some(BantField::Need),
            Self::Timeline => Some(BantField::Timeline),
            Self::Details | Self::Review | Self::Completed => None,
        }
    }
}

impl fmt::Display for PosterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Details => "DETAILS",
            Self::Budget => "BUDGET",
            Self::Authority => "AUTHORITY",
            Self::Need => "NEED",
            Self::Timeline => "TIMELINE",
            Self::Review => "REVIEW",
            Self::Completed => "COMPLETED",
        };
        write!(f, "{s}")
    }
}
