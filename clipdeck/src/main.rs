#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use std::path::Path;

use args::{Args, Command, ServeArgs};
use clap::Parser;
use clipdeck_config::Config;
use clipdeck_server::Server;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "clipdeck.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    let command = args.command.unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    // Keep one-shot commands quiet unless RUST_LOG asks otherwise
    let default_filter = if matches!(command, Command::Serve(_)) { "info" } else { "warn" };
    let _telemetry_guard = clipdeck_telemetry::init(config.telemetry.as_ref(), default_filter)?;

    match command {
        Command::Serve(serve_args) => serve(config, &args.config, serve_args).await,
        Command::Upload(upload_args) => commands::upload(&config, upload_args).await,
        Command::Register(register_args) => commands::register(&config, register_args).await,
        Command::Show(show_args) => commands::show(&config, show_args).await,
    }
}

/// Load the config file, or built-in defaults when the default path is absent
fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
        return Config::from_toml("");
    }

    Config::load(path)
}

async fn serve(mut config: Config, config_path: &Path, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    tracing::info!(config_path = %config_path.display(), "starting clipdeck");

    let server = Server::new(&config)?;

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("clipdeck stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
