//! Synthesis errors.

use effectforge_store::StoreError;
use thiserror::Error;

/// Errors raised while turning a description into an effect.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("description is empty")]
    EmptyDescription,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from parsing or rendering a `{{placeholder}}` template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("no value bound for placeholder `{0}`")]
    MissingValue(String),

    #[error("placeholder opened at byte {0} is never closed")]
    Unterminated(usize),

    #[error("invalid placeholder name `{0}`")]
    InvalidName(String),
}
