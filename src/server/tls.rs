//! Server transport credentials.

use tokio::fs;
use tonic::transport::{Identity, ServerTlsConfig};
use tracing::info;

use super::config::TlsConfig;
use crate::{CourierError, Result};

/// Build TLS server credentials, or `None` for a plaintext listener.
pub async fn server_tls(config: Option<&TlsConfig>) -> Result<Option<ServerTlsConfig>> {
    let Some(config) = config else {
        info!("TLS disabled, serving plaintext");
        return Ok(None);
    };
    config.validate()?;

    let cert = fs::read(&config.cert_path).await.map_err(|e| {
        CourierError::Configuration(format!(
            "Failed to read certificate {:?}: {e}",
            config.cert_path
        ))
    })?;
    let key = fs::read(&config.key_path).await.map_err(|e| {
        CourierError::Configuration(format!("Failed to read key {:?}: {e}", config.key_path))
    })?;

    info!(cert = %config.cert_path.display(), "TLS enabled");
    Ok(Some(
        ServerTlsConfig::new().identity(Identity::from_pem(cert, key)),
    ))
}
