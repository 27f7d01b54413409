//! Store errors.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("invalid cleanup policy: {0}")]
    InvalidPolicy(&'static str),

    #[error("upload {0} is already finished")]
    InvalidTransition(Uuid),
}

impl StoreError {
    pub(crate) fn effect_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "effect", id }
    }

    pub(crate) fn upload_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "upload", id }
    }
}
