//! Accumulated session data — the structured output both assistants exist
//! to fill in.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four BANT qualification slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BantField {
    Budget,
    Authority,
    Need,
    Timeline,
}

impl BantField {
    pub const ALL: [BantField; 4] = [
        BantField::Budget,
        BantField::Authority,
        BantField::Need,
        BantField::Timeline,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Budget => "BUDGET",
            Self::Authority => "AUTHORITY",
            Self::Need => "NEED",
            Self::Timeline => "TIMELINE",
        }
    }
}

impl fmt::Display for BantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The four BANT answers gathered over a conversation. A field holds the
/// empty string until its stage produces an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(default)]
pub struct QualificationData {
    pub budget: String,
    pub authority: String,
    pub need: String,
    pub timeline: String,
}

impl QualificationData {
    pub fn get(&self, field: BantField) -> &str {
        match field {
            BantField::Budget => &self.budget,
            BantField::Authority => &self.authority,
            BantField::Need => &self.need,
            BantField::Timeline => &self.timeline,
        }
    }

    pub fn set(&mut self, field: BantField, value: impl Into<String>) {
        let slot = match field {
            BantField::Budget => &mut self.budget,
            BantField::Authority => &mut self.authority,
            BantField::Need => &mut self.need,
            BantField::Timeline => &mut self.timeline,
        };
        *slot = value.into();
    }

    /// Names of the fields still empty, in BANT order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        BantField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .map(BantField::name)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Folds a keyed extraction map in, skipping blank values.
    pub fn apply(&mut self, fields: &HashMap<BantField, String>) {
        for (field, value) in fields {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                self.set(*field, trimmed);
            }
        }
    }
}

/// Marketplace category a posted requirement files under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SoftwareDevelopment,
    ItServices,
    Marketing,
    Design,
    Consulting,
    Finance,
    Legal,
    Logistics,
    Manufacturing,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SoftwareDevelopment => "software_development",
            Self::ItServices => "it_services",
            Self::Marketing => "marketing",
            Self::Design => "design",
            Self::Consulting => "consulting",
            Self::Finance => "finance",
            Self::Legal => "legal",
            Self::Logistics => "logistics",
            Self::Manufacturing => "manufacturing",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Everything the poster assistant accumulates for a requirement: the
/// descriptive details plus the same BANT answers the qualifier gathers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct RequirementDraft {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub qualification_data: QualificationData,
}

impl RequirementDraft {
    /// Names of everything still missing, details first then BANT order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("TITLE");
        }
        if self.description.trim().is_empty() {
            missing.push("DESCRIPTION");
        }
        if self.category.is_none() {
            missing.push("CATEGORY");
        }
        missing.extend(self.qualification_data.missing_fields());
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
