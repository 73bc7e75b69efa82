use crate::core::normalizer::LanguageNormalizer;
use crate::core::prompt::{compose, HTML_SYSTEM_PROMPT};
use crate::core::sanitizer::Sanitizer;
use crate::domain::model::{GenerationRequest, GenerationResult};
use crate::domain::ports::ModelGateway;
use crate::utils::error::{RelayError, Result};
use std::sync::Arc;
use std::time::Instant;

const PROBE_PROMPT: &str = "Reply with OK.";

/// translate → compose → generate → sanitize
///
/// 不持有任何跨請求的可變狀態，可直接放在 `Arc` 中由多個 handler 共用。
pub struct PreviewPipeline {
    normalizer: LanguageNormalizer,
    gateway: Arc<dyn ModelGateway>,
    sanitizer: Sanitizer,
    system_prompt: String,
}

impl PreviewPipeline {
    pub fn new(
        normalizer: LanguageNormalizer,
        gateway: Arc<dyn ModelGateway>,
        sanitizer: Sanitizer,
    ) -> Self {
        Self {
            normalizer,
            gateway,
            sanitizer,
            system_prompt: HTML_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn model_name(&self) -> &str {
        self.gateway.model_name()
    }

    pub fn translation_enabled(&self) -> bool {
        self.normalizer.is_enabled()
    }

    pub async fn run(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let start = Instant::now();

        if request.text.trim().is_empty() {
            return Err(RelayError::InvalidRequest {
                message: "text must not be empty".to_string(),
            });
        }

        tracing::info!("🧪 Original prompt: {}", request.text);

        // 1. 語言正規化
        let normalized = self.normalizer.normalize(&request.text).await?;

        // 2. 組合 prompt
        let chat_request = compose(&self.system_prompt, &normalized);

        // 3. 呼叫模型
        tracing::debug!("Sending prompt to model '{}'", self.gateway.model_name());
        let raw = self.gateway.generate(&chat_request).await?;
        tracing::debug!("🔁 Raw model response: {}", preview(&raw, 500));

        // 4. 清理輸出
        let html_document = self.sanitizer.sanitize(&raw)?;

        tracing::info!(
            "✅ Generated {} bytes of HTML in {:?}",
            html_document.len(),
            start.elapsed()
        );

        Ok(GenerationResult {
            html_document,
            status_code: 200,
        })
    }

    /// 對生成服務做一次最小的請求，成功時回傳模型名稱
    pub async fn probe_model(&self) -> Result<String> {
        let chat_request = compose(&self.system_prompt, PROBE_PROMPT);
        self.gateway.generate(&chat_request).await?;
        Ok(self.gateway.model_name().to_string())
    }
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
