//! abyssrun - Main entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use abyssrun_engine::infrastructure::config::{load_env_files, AppConfig};
use abyssrun_engine::AbyssRunner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging is not up yet; failures are reported below.
    let dotenv_failures = load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "abyssrun_engine=debug,abyssrun_domain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    for (path, error) in &dotenv_failures {
        tracing::warn!(path = %path.display(), error = %error, "Failed to load env file");
    }

    tracing::info!("Starting abyssrun");

    let config = AppConfig::load()?;
    tracing::info!(
        config = %config.config_path.display(),
        replay = ?config.replay_path,
        "Configuration loaded"
    );

    let runner = Arc::new(AbyssRunner::new(config));

    setup_shutdown_signal(Arc::clone(&runner));

    runner.run_async().await.context("abyss runner failed")?;

    tracing::info!("abyssrun shut down");
    Ok(())
}

/// Spawns a task that stops the runner on SIGTERM/SIGINT
fn setup_shutdown_signal(runner: Arc<AbyssRunner>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, stopping...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, stopping...");
            }
        }

        runner.stop();
    });
}

/// Load env files from the repo root (the binary may run from `crates/engine`).
fn load_dotenv_from_repo_root() -> Vec<(PathBuf, dotenvy::Error)> {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    load_env_files(&repo_root)
}
