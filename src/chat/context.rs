//! Who the assistant is talking to and what the conversation is about.
//!
//! A persisted session only resumes when the stored context equals the one
//! the caller opens with; anything else starts fresh.

use serde::{Deserialize, Serialize};

/// What a session is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionSubject {
    /// Qualifying interest in one vendor's listed service.
    ServiceInquiry {
        service_id: String,
        service_name: String,
        vendor_name: String,
    },
    /// Drafting a new requirement post, not tied to any listing.
    RequirementPost,
}

/// Identity and subject for one conversation. Equality is the resume
/// predicate: a stored session with a different context is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub contact_name: String,
    pub contact_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub subject: SessionSubject,
}

impl SessionContext {
    pub fn service_inquiry(
        contact_name: impl Into<String>,
        contact_email: impl Into<String>,
        service_id: impl Into<String>,
        service_name: impl Into<String>,
        vendor_name: impl Into<String>,
    ) -> Self {
        Self {
            contact_name: contact_name.into(),
            contact_email: contact_email.into(),
            company: None,
            subject: SessionSubject::ServiceInquiry {
                service_id: service_id.into(),
                service_name: service_name.into(),
                vendor_name: vendor_name.into(),
            },
        }
    }

    pub fn requirement_post(
        contact_name: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            contact_name: contact_name.into(),
            contact_email: contact_email.into(),
            company: None,
            subject: SessionSubject::RequirementPost,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }
}
