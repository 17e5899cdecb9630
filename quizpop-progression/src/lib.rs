mod mirror;
mod regen;
pub mod service;
pub mod writer;

use std::sync::Arc;

/// Source of "now" in unix seconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

pub use service::ProgressionService;
