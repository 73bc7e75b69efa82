use crate::domain::ports::{LanguageDetector, Translator};
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct DetectBody<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// LibreTranslate 相容服務，同時提供語言偵測與翻譯
#[derive(Clone)]
pub struct LibreTranslateClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigValidationError {
                field: "translation".to_string(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl LanguageDetector for LibreTranslateClient {
    async fn detect(&self, text: &str) -> Result<String> {
        let body = DetectBody {
            q: text,
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(self.url("detect"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Detection {
                message: e.to_string(),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Detection {
                message: format!("detection service returned HTTP {}", status.as_u16()),
                status: Some(status.as_u16()),
            });
        }

        let detections: Vec<Detection> = response.json().await.map_err(|e| RelayError::Detection {
            message: format!("unreadable detection response: {}", e),
            status: Some(status.as_u16()),
        })?;

        detections
            .into_iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|d| d.language)
            .ok_or_else(|| RelayError::Detection {
                message: "no language detected".to_string(),
                status: Some(status.as_u16()),
            })
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let body = TranslateBody {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(self.url("translate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Translation {
                message: e.to_string(),
                status: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Translation {
                message: format!("translation service returned HTTP {}", status.as_u16()),
                status: Some(status.as_u16()),
            });
        }

        let parsed: TranslateResponse =
            response.json().await.map_err(|e| RelayError::Translation {
                message: format!("unreadable translation response: {}", e),
                status: Some(status.as_u16()),
            })?;

        Ok(parsed.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer, api_key: Option<&str>) -> LibreTranslateClient {
        LibreTranslateClient::new(
            server.base_url(),
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_detect_picks_highest_confidence() {
        let server = MockServer::start();
        let detect_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/detect")
                .json_body_partial(r#"{"q": "Crea un formulario de login"}"#);
            then.status(200).json_body(serde_json::json!([
                {"language": "pt", "confidence": 41.0},
                {"language": "es", "confidence": 92.0}
            ]));
        });

        let language = client(&server, None)
            .detect("Crea un formulario de login")
            .await
            .unwrap();

        detect_mock.assert();
        assert_eq!(language, "es");
    }

    #[tokio::test]
    async fn test_detect_empty_result_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/detect");
            then.status(200).json_body(serde_json::json!([]));
        });

        let err = client(&server, None).detect("?").await.unwrap_err();
        assert!(matches!(err, RelayError::Detection { .. }));
    }

    #[tokio::test]
    async fn test_translate_sends_auto_source_and_api_key() {
        let server = MockServer::start();
        let translate_mock = server.mock(|when, then| {
            when.method(POST).path("/translate").json_body_partial(
                r#"{"q": "Crea un formulario de login", "source": "auto", "target": "en", "format": "text", "api_key": "secret"}"#,
            );
            then.status(200)
                .json_body(serde_json::json!({"translatedText": "Create a login form"}));
        });

        let translated = client(&server, Some("secret"))
            .translate("Crea un formulario de login", "auto", "en")
            .await
            .unwrap();

        translate_mock.assert();
        assert_eq!(translated, "Create a login form");
    }

    #[tokio::test]
    async fn test_translate_failure_carries_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/translate");
            then.status(429).body("slow down");
        });

        let err = client(&server, None)
            .translate("Hola", "auto", "en")
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Translation { .. }));
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_base_url_trailing_slash_is_ignored() {
        let client =
            LibreTranslateClient::new("http://localhost:5000/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("detect"), "http://localhost:5000/detect");
    }
}
