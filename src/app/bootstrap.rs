use crate::adapters::{LibreTranslateClient, OllamaGateway};
use crate::config::RelayConfig;
use crate::core::normalizer::LanguageNormalizer;
use crate::core::pipeline::PreviewPipeline;
use crate::core::sanitizer::Sanitizer;
use crate::domain::ports::ModelGateway;
use crate::utils::error::Result;
use std::sync::Arc;

/// 啟動時建立一次所有外部服務的 client，之後所有請求共用
pub fn build_pipeline(config: &RelayConfig) -> Result<PreviewPipeline> {
    let gateway = OllamaGateway::new(
        config.model.endpoint.clone(),
        config.model.name.clone(),
        config.model_timeout(),
    )?;
    tracing::info!(
        "🤖 Generation service: {} (model: {})",
        gateway.endpoint(),
        gateway.model_name()
    );

    let normalizer = if config.translation.enabled {
        let language = Arc::new(LibreTranslateClient::new(
            config.translation.endpoint.clone(),
            config.translation.api_key.clone(),
            config.translation_timeout(),
        )?);
        LanguageNormalizer::new(language.clone(), language)
            .with_min_detect_chars(config.translation.min_detect_chars)
    } else {
        tracing::info!("🔕 Translation stage disabled, prompts are sent as-is");
        LanguageNormalizer::disabled()
    };

    let sanitizer = Sanitizer::new(config.sanitizer.policy, config.fallback_tag());

    let mut pipeline = PreviewPipeline::new(normalizer, Arc::new(gateway), sanitizer);
    if let Some(prompt) = &config.model.system_prompt {
        pipeline = pipeline.with_system_prompt(prompt.clone());
    }

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sanitizer::FallbackPolicy;

    #[test]
    fn test_build_pipeline_from_defaults() {
        let pipeline = build_pipeline(&RelayConfig::default()).unwrap();
        assert_eq!(pipeline.model_name(), "codellama:instruct");
        assert!(pipeline.translation_enabled());
    }

    #[test]
    fn test_build_pipeline_without_translation() {
        let mut config = RelayConfig::default();
        config.translation.enabled = false;
        config.sanitizer.policy = FallbackPolicy::Salvage;

        let pipeline = build_pipeline(&config).unwrap();
        assert!(!pipeline.translation_enabled());
    }
}
