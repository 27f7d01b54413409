//! Effect library storage.
//!
//! [`EffectRepository`] and [`UploadRepository`] are the only way the rest of
//! the backend touches stored data. [`MemoryStore`] implements both on top of
//! `HashMap`s behind async locks; nothing is persisted.

mod error;
mod memory;
mod models;
mod query;
mod repository;

pub use error::StoreError;
pub use memory::{code_hash, MemoryStore};
pub use models::{
    Effect, EffectCategory, EffectType, NewEffect, NewUpload, Platform, Upload, UploadError,
    UploadStatus,
};
pub use query::{CleanupPolicy, EffectPage, EffectQuery, EffectSort, LibrarySummary};
pub use repository::{EffectRepository, UploadRepository};
