// Adapters layer: concrete HTTP clients for the external services behind the domain ports.

pub mod libretranslate;
pub mod ollama;

pub use libretranslate::LibreTranslateClient;
pub use ollama::OllamaGateway;
