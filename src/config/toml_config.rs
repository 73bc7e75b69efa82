use crate::core::sanitizer::{FallbackPolicy, DEFAULT_FALLBACK_TAG};
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub translation: TranslationConfig,
    pub sanitizer: SanitizerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 錯誤頁面是否包含完整的錯誤鏈
    pub debug_errors: bool,
    /// `/health` 預設是否實際呼叫生成服務
    pub health_probe: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug_errors: false,
            health_probe: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub name: String,
    pub timeout_seconds: u64,
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/chat".to_string(),
            name: "codellama:instruct".to_string(),
            timeout_seconds: 180,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub min_detect_chars: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:5000".to_string(),
            api_key: None,
            timeout_seconds: 30,
            min_detect_chars: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    pub policy: FallbackPolicy,
    pub fallback_tag: Option<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            policy: FallbackPolicy::FailClosed,
            fallback_tag: Some(DEFAULT_FALLBACK_TAG.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl RelayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelayError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OLLAMA_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_range("server.port", self.server.port, 1, u16::MAX)?;
        validate_non_empty_string("server.host", &self.server.host)?;

        validate_url("model.endpoint", &self.model.endpoint)?;
        validate_non_empty_string("model.name", &self.model.name)?;
        validate_range("model.timeout_seconds", self.model.timeout_seconds, 1, 3600)?;
        if let Some(prompt) = &self.model.system_prompt {
            validate_non_empty_string("model.system_prompt", prompt)?;
        }

        // 翻譯關閉時不檢查翻譯服務設定
        if self.translation.enabled {
            validate_url("translation.endpoint", &self.translation.endpoint)?;
            validate_range(
                "translation.timeout_seconds",
                self.translation.timeout_seconds,
                1,
                3600,
            )?;
        }

        if self.sanitizer.policy == FallbackPolicy::Salvage {
            let tag = validate_required_field("sanitizer.fallback_tag", &self.sanitizer.fallback_tag)?;
            validate_non_empty_string("sanitizer.fallback_tag", tag)?;
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_seconds)
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation.timeout_seconds)
    }

    pub fn fallback_tag(&self) -> &str {
        self.sanitizer
            .fallback_tag
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_TAG)
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RelayConfig::from_toml_str("").unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.model.endpoint, "http://localhost:11434/api/chat");
        assert_eq!(config.model.name, "codellama:instruct");
        assert_eq!(config.model_timeout(), Duration::from_secs(180));
        assert!(config.translation.enabled);
        assert_eq!(config.sanitizer.policy, FallbackPolicy::FailClosed);
        assert_eq!(config.fallback_tag(), "<button");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9000
debug_errors = true

[model]
endpoint = "http://gpu-box:11434/api/chat"
name = "llama3:instruct"
timeout_seconds = 60

[translation]
enabled = false

[sanitizer]
policy = "salvage"
fallback_tag = "<div"

[logging]
json = true
"#;

        let config = RelayConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert!(config.server.debug_errors);
        assert_eq!(config.model.name, "llama3:instruct");
        assert_eq!(config.model_timeout(), Duration::from_secs(60));
        assert!(!config.translation.enabled);
        assert_eq!(config.sanitizer.policy, FallbackPolicy::Salvage);
        assert_eq!(config.fallback_tag(), "<div");
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PREVIEW_RELAY_TEST_MODEL", "mistral:instruct");

        let toml_content = r#"
[model]
name = "${PREVIEW_RELAY_TEST_MODEL}"
"#;

        let config = RelayConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model.name, "mistral:instruct");

        std::env::remove_var("PREVIEW_RELAY_TEST_MODEL");
    }

    #[test]
    fn test_config_validation() {
        let config = RelayConfig::from_toml_str(
            r#"
[model]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = RelayConfig::from_toml_str(
            r#"
[model]
timeout_seconds = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_translation_endpoint_ignored_when_disabled() {
        let config = RelayConfig::from_toml_str(
            r#"
[translation]
enabled = false
endpoint = "not a url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_salvage_requires_fallback_tag() {
        let config = RelayConfig::from_toml_str(
            r#"
[sanitizer]
policy = "salvage"
fallback_tag = "  "
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_fails_to_parse() {
        let result = RelayConfig::from_toml_str(
            r#"
[sanitizer]
policy = "best_effort"
"#,
        );
        assert!(matches!(
            result,
            Err(RelayError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[server]
port = 8123
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = RelayConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 8123);
    }
}
