// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, sync::Arc, time::Duration};

use stateless_auth::{
    api::router,
    auth::InMemoryCredentialStore,
    config::{AuthSettings, LogFormat, ServerSettings},
    state::AppState,
    tls::load_rustls_config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let server = ServerSettings::from_env()?;
    init_tracing(server.log_format);

    let settings = AuthSettings::from_env()?;
    tracing::info!(
        issuer = %settings.issuer,
        algorithm = ?settings.algorithm,
        access_ttl_ms = settings.access_token_ttl.as_millis() as u64,
        refresh_ttl_ms = settings.refresh_token_ttl.as_millis() as u64,
        public_paths = ?settings.public_paths.patterns().collect::<Vec<_>>(),
        "Loaded authentication settings"
    );

    if server.seed_users.is_empty() {
        tracing::warn!("No SEED_USERS configured; the credential store is empty");
    }
    let store = InMemoryCredentialStore::seeded(&server.seed_users)?;
    tracing::info!(principals = store.len().await, "Credential store ready");

    let state = AppState::new(settings, Arc::new(store));
    let app = router(state);

    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
    });

    let addr = server.addr;
    match &server.tls {
        Some(tls) => {
            let tls_config = load_rustls_config(tls).await?;
            tracing::info!("Listening on https://{addr} (docs at /swagger-ui)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::warn!("TLS_CERT_PATH/TLS_KEY_PATH not set, serving plain HTTP");
            tracing::info!("Listening on http://{addr} (docs at /swagger-ui)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
}
