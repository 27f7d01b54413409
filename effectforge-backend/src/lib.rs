//! HTTP surface of EffectForge: an axum router over the effect library, the
//! synthesis job queue and batch uploads.

pub mod app;
pub mod error;
pub mod handlers;
pub mod rate_limiter;
pub mod state;
pub mod validation;

pub use app::build_router;
pub use app::build_router_with_limiter;
