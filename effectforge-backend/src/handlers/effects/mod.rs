pub mod cleanup;
pub mod download;
pub mod dto;
pub mod generate;
pub mod get;
pub mod list;
pub mod preview;
pub mod rate;
