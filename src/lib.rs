//! Finance Assistant
//!
//! A personal-finance chat assistant for students and working professionals:
//! - Logs users in against a fixed profile table, scoped by role
//! - Runs deterministic budget templates locally
//! - Forwards advice and document questions to a hosted text-generation model
//! - Falls back to canned tips when the model is unavailable
//! - Keeps a searchable in-memory chat log
//!
//! FLOW:
//! LOGIN → SESSION → DISPATCH (TEMPLATE | PROMPT → COMPLETE) → ANSWER

pub mod api;
pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod documents;
pub mod error;
pub mod features;
pub mod history;
pub mod inference;
pub mod models;
pub mod session;
pub mod templates;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use dispatcher::{FeatureDispatcher, FeatureRequest};
pub use features::Feature;
