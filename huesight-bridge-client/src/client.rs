//! HTTP client for the bridge's v1 REST API.

use std::time::Duration;

use async_trait::async_trait;
use huesight_common::{GroupRecord, LightRecord, SensorRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{API_ERROR_LINK_BUTTON, BridgeClientError, Result};

/// Read-only view of a Hue bridge.
///
/// Each method performs one request and returns every record of that resource
/// class, ordered by the bridge's numeric id.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Fetch all lights.
    async fn fetch_lights(&self) -> Result<Vec<LightRecord>>;

    /// Fetch all groups.
    async fn fetch_groups(&self) -> Result<Vec<GroupRecord>>;

    /// Fetch all sensors.
    async fn fetch_sensors(&self) -> Result<Vec<SensorRecord>>;
}

/// HTTP implementation of [`BridgeClient`].
#[derive(Debug, Clone)]
pub struct HueBridgeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HueBridgeClient {
    /// Create a client for the bridge at `address`.
    ///
    /// `address` is either a bare host (`192.168.1.10`, `hue.local:8080`), in
    /// which case plain HTTP is used, or a full base URL.
    pub fn new(address: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url(address)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the API key is accepted by the bridge.
    pub async fn login(&self) -> Result<()> {
        let url = format!("{}/api/{}/config", self.base_url, self.api_key);
        let body = self.get_json(&url).await?;
        check_api_error(&body)?;

        if !body.is_object() {
            return Err(BridgeClientError::UnexpectedResponse(
                "config is not an object".to_string(),
            ));
        }

        debug!(bridge = %self.base_url, "API key accepted by bridge");
        Ok(())
    }

    /// Create a new API user ("pairing").
    ///
    /// Fails with [`BridgeClientError::LinkButtonNotPressed`] until the bridge's
    /// link button has been pressed.
    pub async fn create_user(&self, device_type: &str) -> Result<String> {
        let url = format!("{}/api", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "devicetype": device_type }))
            .send()
            .await?;

        let body = decode_body(response).await?;
        parse_create_user(&body)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        trace!(url = %redact(url, &self.api_key), "GET");
        let response = self.http.get(url).send().await?;
        decode_body(response).await
    }

    async fn get_resource<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
        let url = format!("{}/api/{}/{}", self.base_url, self.api_key, resource);
        let body = self.get_json(&url).await?;
        let records = decode_resource_map(body)?;

        debug!(resource, count = records.len(), "Fetched records from bridge");
        Ok(records)
    }
}

#[async_trait]
impl BridgeClient for HueBridgeClient {
    async fn fetch_lights(&self) -> Result<Vec<LightRecord>> {
        self.get_resource("lights").await
    }

    async fn fetch_groups(&self) -> Result<Vec<GroupRecord>> {
        self.get_resource("groups").await
    }

    async fn fetch_sensors(&self) -> Result<Vec<SensorRecord>> {
        self.get_resource("sensors").await
    }
}

fn base_url(address: &str) -> Result<String> {
    let address = address.trim().trim_end_matches('/');
    if address.is_empty() {
        return Err(BridgeClientError::InvalidAddress(
            "address is empty".to_string(),
        ));
    }

    if address.contains("://") {
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(BridgeClientError::InvalidAddress(address.to_string()));
        }
        Ok(address.to_string())
    } else {
        Ok(format!("http://{}", address))
    }
}

/// Hide the API key when logging URLs.
fn redact(url: &str, api_key: &str) -> String {
    if api_key.is_empty() {
        url.to_string()
    } else {
        url.replace(api_key, "<redacted>")
    }
}

pub(crate) async fn decode_body(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(BridgeClientError::Status {
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Return the first error envelope in a bridge response, if any.
///
/// The bridge reports failures with HTTP 200 and a body like
/// `[{"error": {"type": 1, "address": "/lights", "description": "unauthorized user"}}]`.
pub(crate) fn check_api_error(body: &Value) -> Result<()> {
    let Some(entries) = body.as_array() else {
        return Ok(());
    };

    for entry in entries {
        if let Some(error) = entry.get("error") {
            let kind = error
                .get("type")
                .and_then(Value::as_u64)
                .and_then(|k| u16::try_from(k).ok())
                .unwrap_or(0);
            let address = error
                .get("address")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let description = error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();

            return Err(BridgeClientError::api(kind, address, description));
        }
    }

    Ok(())
}

/// Decode an id-keyed resource object into records ordered by numeric id.
///
/// Records that fail to decode are skipped; the rest of the class is kept.
pub(crate) fn decode_resource_map<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    check_api_error(&body)?;

    let Value::Object(map) = body else {
        return Err(BridgeClientError::UnexpectedResponse(
            "expected an object keyed by id".to_string(),
        ));
    };

    let mut entries: Vec<(String, T)> = map
        .into_iter()
        .filter_map(|(id, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some((id, record)),
            Err(e) => {
                warn!(id = %id, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect();

    entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    });

    Ok(entries.into_iter().map(|(_, record)| record).collect())
}

fn parse_create_user(body: &Value) -> Result<String> {
    if let Err(e) = check_api_error(body) {
        return match e {
            BridgeClientError::Api { kind, .. } if kind == API_ERROR_LINK_BUTTON => {
                Err(BridgeClientError::LinkButtonNotPressed)
            }
            other => Err(other),
        };
    }

    body.as_array()
        .into_iter()
        .flatten()
        .find_map(|entry| entry.pointer("/success/username").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| {
            BridgeClientError::UnexpectedResponse("no username in pairing response".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_bare_host() {
        assert_eq!(base_url("192.168.1.10").unwrap(), "http://192.168.1.10");
        assert_eq!(base_url("hue.local:8080/").unwrap(), "http://hue.local:8080");
    }

    #[test]
    fn test_base_url_full_url() {
        assert_eq!(
            base_url("https://10.0.0.2").unwrap(),
            "https://10.0.0.2"
        );
        assert!(base_url("ftp://10.0.0.2").is_err());
        assert!(base_url("  ").is_err());
    }

    #[test]
    fn test_redact_api_key() {
        let url = "http://bridge/api/secret-key/lights";
        assert_eq!(redact(url, "secret-key"), "http://bridge/api/<redacted>/lights");
    }

    #[test]
    fn test_check_api_error() {
        let body = json!([{ "error": { "type": 1, "address": "/", "description": "unauthorized user" } }]);
        let err = check_api_error(&body).unwrap_err();
        assert!(err.is_unauthorized());

        assert!(check_api_error(&json!({ "1": {} })).is_ok());
        assert!(check_api_error(&json!([{ "success": {} }])).is_ok());
    }

    #[test]
    fn test_decode_resource_map_orders_by_numeric_id() {
        let body = json!({
            "10": { "name": "ten", "type": "Room" },
            "2": { "name": "two", "type": "Room" },
            "1": { "name": "one", "type": "Zone" }
        });

        let groups: Vec<GroupRecord> = decode_resource_map(body).unwrap();
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "ten"]);
    }

    #[test]
    fn test_decode_resource_map_rejects_array() {
        let result: Result<Vec<LightRecord>> = decode_resource_map(json!([1, 2]));
        assert!(matches!(
            result,
            Err(BridgeClientError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_decode_resource_map_skips_bad_record() {
        let body = json!({
            "1": { "name": "Hallway", "state": { "lastupdated": "2024-03-01T12:30:45" } },
            "2": { "name": "Broken", "state": { "lastupdated": "not-a-time" } },
            "3": { "name": "Kitchen", "state": { "lastupdated": "none" } }
        });

        let sensors: Vec<SensorRecord> = decode_resource_map(body).unwrap();
        let names: Vec<&str> = sensors.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Hallway", "Kitchen"]);
    }

    #[test]
    fn test_parse_create_user() {
        let ok = json!([{ "success": { "username": "abc123" } }]);
        assert_eq!(parse_create_user(&ok).unwrap(), "abc123");

        let pending = json!([{ "error": { "type": 101, "address": "", "description": "link button not pressed" } }]);
        assert!(matches!(
            parse_create_user(&pending),
            Err(BridgeClientError::LinkButtonNotPressed)
        ));

        let other = json!([{ "error": { "type": 7, "address": "/devicetype", "description": "invalid value" } }]);
        assert!(matches!(
            parse_create_user(&other),
            Err(BridgeClientError::Api { kind: 7, .. })
        ));
    }
}
