pub mod cancel;
pub mod clear;
pub mod get;
pub mod list;
pub mod retry;
