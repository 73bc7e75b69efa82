use crate::domain::ports::{LanguageDetector, Translator};
use crate::utils::error::Result;
use std::sync::Arc;

pub const ENGLISH: &str = "en";

/// 偵測語言，非英文時翻譯成英文
#[derive(Clone)]
pub struct LanguageNormalizer {
    services: Option<LanguageServices>,
    min_detect_chars: usize,
}

#[derive(Clone)]
struct LanguageServices {
    detector: Arc<dyn LanguageDetector>,
    translator: Arc<dyn Translator>,
}

impl LanguageNormalizer {
    pub fn new(detector: Arc<dyn LanguageDetector>, translator: Arc<dyn Translator>) -> Self {
        Self {
            services: Some(LanguageServices {
                detector,
                translator,
            }),
            min_detect_chars: 0,
        }
    }

    /// 關閉翻譯階段，文字原樣送出
    pub fn disabled() -> Self {
        Self {
            services: None,
            min_detect_chars: 0,
        }
    }

    /// 少於此長度的輸入不做語言偵測
    pub fn with_min_detect_chars(mut self, min_detect_chars: usize) -> Self {
        self.min_detect_chars = min_detect_chars;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.services.is_some()
    }

    pub async fn normalize(&self, text: &str) -> Result<String> {
        let Some(services) = &self.services else {
            return Ok(text.to_string());
        };

        if text.trim().chars().count() < self.min_detect_chars {
            tracing::debug!(
                "Input shorter than {} chars, skipping language detection",
                self.min_detect_chars
            );
            return Ok(text.to_string());
        }

        let detected = services.detector.detect(text).await?;
        tracing::info!("🌐 Detected language: {}", detected);

        if is_english(&detected) {
            tracing::info!("🔤 No translation needed (English detected)");
            return Ok(text.to_string());
        }

        let translated = services.translator.translate(text, "auto", ENGLISH).await?;
        tracing::info!("🔤 Translated prompt: {}", translated);
        Ok(translated)
    }
}

/// `en`、`EN`、`en-US` 都算英文
pub fn is_english(code: &str) -> bool {
    code.trim()
        .split(['-', '_'])
        .next()
        .map(|primary| primary.eq_ignore_ascii_case(ENGLISH))
        .unwrap_or(false)
}
