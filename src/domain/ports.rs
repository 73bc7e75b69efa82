use crate::domain::model::ChatRequest;
use crate::utils::error::Result;
use async_trait::async_trait;

/// 偵測文字的主要語言，回傳 ISO 639-1 代碼
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<String>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// 外部生成服務 (例如 Ollama)
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate(&self, request: &ChatRequest) -> Result<String>;

    fn model_name(&self) -> &str;
}
