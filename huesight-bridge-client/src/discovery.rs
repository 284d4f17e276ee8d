//! Bridge discovery through the Hue N-UPnP broker.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{check_api_error, decode_body};
use crate::error::{BridgeClientError, Result};

/// Public discovery endpoint operated by Signify.
pub const DEFAULT_DISCOVERY_URL: &str = "https://discovery.meethue.com/";

/// A bridge announced by the discovery broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredBridge {
    pub id: String,

    #[serde(rename = "internalipaddress")]
    pub address: String,

    #[serde(default)]
    pub port: Option<u16>,
}

/// Ask the public discovery broker for bridges on the local network.
pub async fn discover(timeout: Duration) -> Result<Vec<DiscoveredBridge>> {
    discover_at(DEFAULT_DISCOVERY_URL, timeout).await
}

/// Ask the discovery broker at `url` for bridges.
pub async fn discover_at(url: &str, timeout: Duration) -> Result<Vec<DiscoveredBridge>> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    let body = decode_body(http.get(url).send().await?).await?;
    check_api_error(&body)?;

    if !body.is_array() {
        return Err(BridgeClientError::UnexpectedResponse(
            "discovery response is not a list".to_string(),
        ));
    }

    let bridges: Vec<DiscoveredBridge> = serde_json::from_value(body)?;
    debug!(count = bridges.len(), "Discovered bridges");
    Ok(bridges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discovery_entry() {
        let json = r#"[{"id":"001788fffe100491","internalipaddress":"192.168.2.23","port":443}]"#;
        let bridges: Vec<DiscoveredBridge> = serde_json::from_str(json).unwrap();

        assert_eq!(bridges.len(), 1);
        assert_eq!(bridges[0].address, "192.168.2.23");
        assert_eq!(bridges[0].port, Some(443));
    }

    #[test]
    fn test_parse_discovery_entry_without_port() {
        let json = r#"[{"id":"001788fffe100491","internalipaddress":"10.0.0.5"}]"#;
        let bridges: Vec<DiscoveredBridge> = serde_json::from_str(json).unwrap();
        assert_eq!(bridges[0].port, None);
    }
}
