use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Language detection failed: {message}")]
    Detection {
        message: String,
        status: Option<u16>,
    },

    #[error("Translation failed: {message}")]
    Translation {
        message: String,
        status: Option<u16>,
    },

    #[error("Generation service error: {message}")]
    Gateway {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Sanitization error: {message}")]
    Sanitization { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Malformed request body: {message}")]
    MalformedBody { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl RelayError {
    /// 上游回應為非 2xx 時建立 gateway 錯誤
    pub fn upstream_status(status: u16) -> Self {
        RelayError::Gateway {
            message: format!("upstream returned HTTP {}", status),
            status: Some(status),
            source: None,
        }
    }

    /// 傳輸層錯誤 (連線拒絕、逾時、回應無法解析)
    pub fn transport(context: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("{}: request timed out", context)
        } else if err.is_connect() {
            format!("{}: connection failed", context)
        } else if err.is_decode() {
            format!("{}: malformed response body", context)
        } else {
            format!("{}: {}", context, err)
        };

        RelayError::Gateway {
            message,
            status: err.status().map(|s| s.as_u16()),
            source: Some(err),
        }
    }

    /// 上游狀態碼 (若有)
    pub fn status(&self) -> Option<u16> {
        match self {
            RelayError::Detection { status, .. }
            | RelayError::Translation { status, .. }
            | RelayError::Gateway { status, .. } => *status,
            _ => None,
        }
    }

    /// 回傳給呼叫端的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MalformedBody { .. } => 400,
            _ => 500,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            RelayError::Detection { .. } => "detection",
            RelayError::Translation { .. } => "translation",
            RelayError::Gateway { .. } => "gateway",
            RelayError::Sanitization { .. } => "sanitization",
            RelayError::InvalidRequest { .. } | RelayError::MalformedBody { .. } => "request",
            RelayError::IoError(_) => "io",
            RelayError::ConfigValidationError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::MissingConfigError { .. } => "config",
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RelayError::Detection { .. } | RelayError::Translation { .. } => {
                "Check that the translation service is running, or disable translation"
            }
            RelayError::Gateway { .. } => {
                "Check that the generation service is running and the model is pulled"
            }
            RelayError::Sanitization { .. } => {
                "The model ignored the output rules; try a different model or the salvage policy"
            }
            RelayError::InvalidRequest { .. } => "Describe the component to generate in `text`",
            RelayError::MalformedBody { .. } => "Send a JSON body like {\"text\": \"...\"}",
            RelayError::IoError(_) => "Check file paths and permissions",
            RelayError::ConfigValidationError { .. }
            | RelayError::InvalidConfigValueError { .. }
            | RelayError::MissingConfigError { .. } => {
                "Fix the configuration file or the command line overrides"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
