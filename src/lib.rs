//! Lead Assist — conversational lead qualification for a B2B marketplace.

pub mod chat;
pub mod config;
pub mod error;
pub mod handoff;
pub mod interpreter;
pub mod store;
