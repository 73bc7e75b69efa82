use crate::utils::error::{RelayError, Result};
use serde::{Deserialize, Serialize};

pub const DOCTYPE_MARKER: &str = "<!DOCTYPE html";
pub const DEFAULT_FALLBACK_TAG: &str = "<button";

const FENCE: &str = "```";

/// 找不到 doctype 時的處理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// 直接回報 SanitizationError
    #[default]
    FailClosed,
    /// 從已知的 HTML 標籤開始保留
    Salvage,
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    policy: FallbackPolicy,
    fallback_tag: String,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::fail_closed()
    }
}

impl Sanitizer {
    pub fn new(policy: FallbackPolicy, fallback_tag: impl Into<String>) -> Self {
        Self {
            policy,
            fallback_tag: fallback_tag.into(),
        }
    }

    pub fn fail_closed() -> Self {
        Self::new(FallbackPolicy::FailClosed, DEFAULT_FALLBACK_TAG)
    }

    pub fn salvage(fallback_tag: impl Into<String>) -> Self {
        Self::new(FallbackPolicy::Salvage, fallback_tag)
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// 清除模型輸出中的 markdown fence 與前言，只留下 HTML 文件
    pub fn sanitize(&self, raw: &str) -> Result<String> {
        let text = strip_fences(raw.trim());
        let text = text.trim_matches(|c: char| c.is_whitespace() || c == '`');

        if let Some(start) = text.find(DOCTYPE_MARKER) {
            if start > 0 {
                tracing::debug!("Discarding {} bytes of preamble before doctype", start);
            }
            return Ok(text[start..].to_string());
        }

        match self.policy {
            FallbackPolicy::FailClosed => Err(RelayError::Sanitization {
                message: "response missing expected document root".to_string(),
            }),
            FallbackPolicy::Salvage => {
                let start = if self.fallback_tag.is_empty() {
                    None
                } else {
                    text.find(&self.fallback_tag)
                };

                match start {
                    Some(start) => {
                        tracing::warn!(
                            "⚠️ No doctype in model output, salvaging from '{}'",
                            self.fallback_tag
                        );
                        Ok(text[start..].to_string())
                    }
                    None => Err(RelayError::Sanitization {
                        message: format!(
                            "response missing expected document root and fallback tag '{}'",
                            self.fallback_tag
                        ),
                    }),
                }
            }
        }
    }
}

/// 移除開頭的 fence 行 (含語言標記) 以及結尾的 fence
fn strip_fences(text: &str) -> &str {
    let mut text = text;

    if text.starts_with(FENCE) {
        let after_ticks = text.trim_start_matches('`');
        text = match after_ticks.find('\n') {
            // 只有純語言標記 (```html) 才整行丟掉，其餘內容保留
            Some(newline) if is_language_tag(&after_ticks[..newline]) => {
                &after_ticks[newline + 1..]
            }
            _ => after_ticks,
        };
    }

    let trimmed = text.trim_end();
    if trimmed.ends_with(FENCE) {
        text = trimmed.trim_end_matches('`');
    }

    text
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
}
