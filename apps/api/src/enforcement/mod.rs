//! Character-count enforcement for model-drafted statements.

pub mod enforcer;
pub mod handlers;
pub mod prompts;
pub mod sanitize;
pub mod validation;
