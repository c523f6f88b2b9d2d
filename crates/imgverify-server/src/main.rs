use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use imgverify_core::{CosignVerifier, ImageVerifier};
use imgverify_server::{logging, router, Cli};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format).map_err(|e| anyhow::anyhow!("initializing logging: {e}"))?;

    let config = cli.service_config();
    info!(
        listen = %cli.listen,
        key_file = %config.key_file.display(),
        allow_insecure = config.registry.allow_insecure,
        k8s_keychain = config.registry.kubernetes_keychain,
        "starting imgverify"
    );

    let service = Arc::new(ImageVerifier::new(config, CosignVerifier::new()));
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("binding {}", cli.listen))?;

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
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
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutting down");
}
