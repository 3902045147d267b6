// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTPS listener setup from PEM files.

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsSettings;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to install rustls crypto provider")]
    Provider,
    #[error("failed to load TLS certificate or key: {0}")]
    Load(#[from] std::io::Error),
}

/// Install the ring crypto provider for rustls.
///
/// Must run before any TLS configuration is built. A provider installed
/// earlier in the process is kept.
pub fn install_crypto_provider() -> Result<(), TlsError> {
    match rustls::crypto::ring::default_provider().install_default() {
        Ok(()) => Ok(()),
        Err(_) if rustls::crypto::CryptoProvider::get_default().is_some() => Ok(()),
        Err(_) => Err(TlsError::Provider),
    }
}

/// Load the certificate chain and private key named by `settings`.
pub async fn load_rustls_config(settings: &TlsSettings) -> Result<RustlsConfig, TlsError> {
    install_crypto_provider()?;
    let config = RustlsConfig::from_pem_file(&settings.cert_path, &settings.key_path).await?;
    tracing::info!(
        cert = %settings.cert_path.display(),
        "Loaded TLS certificate"
    );
    Ok(config)
}
