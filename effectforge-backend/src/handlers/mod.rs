pub mod effects;
pub mod jobs;
pub mod stats;
pub mod uploads;

pub mod utils;
