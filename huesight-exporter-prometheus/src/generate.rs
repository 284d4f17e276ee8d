//! Pairing with a bridge and generating a configuration file.
//!
//! The bridge only hands out an API key while its link button is pressed, so
//! [`pair`] keeps asking and calls back into the caller between attempts.

use std::future::Future;
use std::time::Duration;

use huesight_bridge_client::{
    BridgeClientError, DEFAULT_DISCOVERY_URL, HueBridgeClient, discover_at,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BridgeConfig, ConfigError, ExporterConfig};

/// Device type reported to the bridge when creating the API key.
pub const DEVICE_TYPE: &str = "huesight#exporter";

const HTTPS_PORT: u16 = 443;

/// Errors while generating a configuration.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Bridge discovery failed: {0}")]
    Discovery(#[source] BridgeClientError),
    #[error("No bridges discovered; pass --address")]
    NoBridges,
    #[error("{0} bridges discovered; pass --address to pick one")]
    MultipleBridges(usize),
    #[error("Pairing failed: {0}")]
    Pairing(#[source] BridgeClientError),
    #[error("Pairing aborted")]
    Aborted,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Options for [`generate`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Bridge address; discovered when unset.
    pub address: Option<String>,
    pub discovery_url: String,
    pub timeout: Duration,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            address: None,
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Resolve the bridge address, discovering it when none is given.
///
/// Discovery must find exactly one bridge.
pub async fn resolve_address(options: &GenerateOptions) -> Result<String, GenerateError> {
    if let Some(address) = &options.address {
        return Ok(address.clone());
    }

    let bridges = discover_at(&options.discovery_url, options.timeout)
        .await
        .map_err(GenerateError::Discovery)?;

    match bridges.as_slice() {
        [] => Err(GenerateError::NoBridges),
        [bridge] => {
            info!(id = %bridge.id, address = %bridge.address, "Discovered bridge");
            Ok(bridge_address(&bridge.address, bridge.port))
        }
        many => Err(GenerateError::MultipleBridges(many.len())),
    }
}

/// The v1 API is plain HTTP. Discovery reports the bridge's TLS port (443),
/// which is dropped in favor of the default HTTP port.
fn bridge_address(address: &str, port: Option<u16>) -> String {
    match port {
        Some(port) if port != HTTPS_PORT => format!("{}:{}", address, port),
        _ => address.to_string(),
    }
}

/// Create an API key, calling `wait` each time the link button has not been
/// pressed yet. `wait` returns `false` to give up.
pub async fn pair<F, Fut>(client: &HueBridgeClient, mut wait: F) -> Result<String, GenerateError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match client.create_user(DEVICE_TYPE).await {
            Ok(api_key) => {
                info!(attempt, "Paired with bridge");
                return Ok(api_key);
            }
            Err(BridgeClientError::LinkButtonNotPressed) => {
                debug!(attempt, "Link button not pressed");
                if !wait(attempt).await {
                    return Err(GenerateError::Aborted);
                }
            }
            Err(e) => return Err(GenerateError::Pairing(e)),
        }
    }
}

/// Resolve the bridge, pair with it and build a configuration.
pub async fn generate<F, Fut>(
    options: &GenerateOptions,
    wait: F,
) -> Result<ExporterConfig, GenerateError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    let address = resolve_address(options).await?;
    let client =
        HueBridgeClient::new(&address, "", options.timeout).map_err(GenerateError::Pairing)?;
    let api_key = pair(&client, wait).await?;

    let config = ExporterConfig {
        bridge: BridgeConfig {
            address,
            api_key,
            timeout_secs: options.timeout.as_secs().max(1),
        },
        ..Default::default()
    };
    config.validate()?;
    Ok(config)
}
