use crate::config::RelayConfig;
use crate::core::sanitizer::FallbackPolicy;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    FailClosed,
    Salvage,
}

impl From<PolicyArg> for FallbackPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::FailClosed => FallbackPolicy::FailClosed,
            PolicyArg::Salvage => FallbackPolicy::Salvage,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "preview-relay")]
#[command(about = "HTTP relay that turns UI descriptions into HTML previews via a local LLM")]
pub struct CliArgs {
    /// Path to TOML configuration file (optional, defaults apply when missing)
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Model identifier sent to the generation service
    #[arg(long)]
    pub model: Option<String>,

    /// Chat endpoint of the generation service
    #[arg(long)]
    pub model_endpoint: Option<String>,

    /// Override the translation stage setting
    #[arg(long)]
    pub translate: Option<bool>,

    /// Behaviour when the model output has no doctype
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Render the full error chain in 500 responses
    #[arg(long)]
    pub debug_errors: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    pub check: bool,
}

impl CliArgs {
    /// 載入配置檔 (若有) 並套用命令列覆蓋
    pub fn load_config(&self) -> Result<RelayConfig> {
        let config = match &self.config {
            Some(path) => RelayConfig::from_file(Path::new(path))?,
            None => RelayConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    pub fn apply_overrides(&self, mut config: RelayConfig) -> RelayConfig {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(endpoint) = &self.model_endpoint {
            config.model.endpoint = endpoint.clone();
        }
        if let Some(translate) = self.translate {
            config.translation.enabled = translate;
        }
        if let Some(policy) = self.policy {
            config.sanitizer.policy = policy.into();
        }
        if self.debug_errors {
            config.server.debug_errors = true;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.json_logs {
            config.logging.json = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let args = CliArgs::parse_from([
            "preview-relay",
            "--port",
            "9100",
            "--model",
            "deepseek-coder:instruct",
            "--translate",
            "false",
            "--policy",
            "salvage",
            "--debug-errors",
        ]);

        let config = args.apply_overrides(RelayConfig::default());

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.model.name, "deepseek-coder:instruct");
        assert!(!config.translation.enabled);
        assert_eq!(config.sanitizer.policy, FallbackPolicy::Salvage);
        assert!(config.server.debug_errors);
    }

    #[test]
    fn test_no_flags_keep_config_values() {
        let args = CliArgs::parse_from(["preview-relay"]);
        let config = args.load_config().unwrap();

        assert_eq!(config.server.port, 8000);
        assert!(config.translation.enabled);
        assert!(!config.logging.verbose);
    }
}
