pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use app::build_pipeline;
pub use config::RelayConfig;
pub use crate::core::{normalizer::LanguageNormalizer, pipeline::PreviewPipeline, sanitizer::Sanitizer};
pub use utils::error::{RelayError, Result};
