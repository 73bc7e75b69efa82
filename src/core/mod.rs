pub mod normalizer;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;

pub use crate::domain::model::{ChatMessage, ChatRequest, GenerationRequest, GenerationResult};
pub use crate::domain::ports::{LanguageDetector, ModelGateway, Translator};
pub use crate::utils::error::Result;
