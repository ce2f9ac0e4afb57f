mod cli;

use clap::Parser;
use cli::Cli;
use sftp_connector::services::config_service::ConfigService;
use sftp_connector::utils::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigService::new()?;
    let app_settings = config.load_app_settings()?;

    if std::env::var_os("RUST_LOG").is_some() {
        logger::init();
    } else {
        let level = cli.log_level.as_deref().unwrap_or(&app_settings.log_level);
        logger::init_with_level(level);
    }

    if let Err(e) = cli::run(cli, &config, &app_settings).await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
