//! Serve command - run the intake API server.

use clap::Args;
use tracing::info;

use intake_server::ServerConfig;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<String>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = if let Some(path) = config_path {
        ServerConfig::from_file(std::path::Path::new(path))?
    } else {
        ServerConfig::default()
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    info!("starting intake API on {}", config.server.bind);
    intake_server::run_server(&config).await
}
