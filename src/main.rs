use clap::Parser;
use preview_relay::utils::{logger, validation::Validate};
use preview_relay::{build_pipeline, server, CliArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.logging.verbose, config.logging.json);

    tracing::info!("Starting preview-relay");
    tracing::debug!("Effective config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    if args.check {
        println!("✅ Configuration is valid");
        return Ok(());
    }

    let pipeline = build_pipeline(&config)?;
    server::serve(&config, pipeline).await?;

    Ok(())
}
