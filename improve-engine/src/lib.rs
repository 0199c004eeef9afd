pub mod config;
pub mod engines;
pub mod format;
pub mod orchestrator;
pub mod post_processing;
pub mod replacements;
pub mod server;

pub use config::Config;
pub use engines::{EngineError, RewriteEngine};
pub use format::ContentFormat;
pub use orchestrator::{ImproveError, Improvement, Improver};
pub use post_processing::polish;
