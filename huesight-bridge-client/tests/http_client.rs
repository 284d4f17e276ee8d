//! Tests for the HTTP bridge client against a mock bridge.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::routing::{get, post};
use serde_json::{Value, json};

use huesight_bridge_client::{
    BridgeClient, BridgeClientError, HueBridgeClient, discover_at,
};

const API_KEY: &str = "test-key";

fn unauthorized(address: &str) -> Value {
    json!([{ "error": { "type": 1, "address": address, "description": "unauthorized user" } }])
}

async fn lights(Path(key): Path<String>) -> Json<Value> {
    if key != API_KEY {
        return Json(unauthorized("/lights"));
    }
    Json(json!({
        "2": {
            "state": { "on": false, "bri": 1, "hue": 0, "sat": 0, "reachable": false },
            "type": "Dimmable light",
            "name": "Hallway",
            "uniqueid": "00:17:88:01:00:00:00:02-0b"
        },
        "1": {
            "state": { "on": true, "bri": 254, "hue": 41000, "sat": 80, "reachable": true },
            "type": "Extended color light",
            "name": "Desk",
            "modelid": "LCT015",
            "manufacturername": "Signify Netherlands B.V.",
            "productname": "Hue color lamp",
            "uniqueid": "00:17:88:01:00:00:00:01-0b"
        }
    }))
}

async fn groups(Path(key): Path<String>) -> Json<Value> {
    if key != API_KEY {
        return Json(unauthorized("/groups"));
    }
    Json(json!({
        "1": {
            "name": "Living room",
            "type": "Room",
            "lights": ["1", "2"],
            "state": { "all_on": false, "any_on": true },
            "action": { "on": true, "bri": 200, "hue": 100, "sat": 50 }
        }
    }))
}

async fn sensors(Path(key): Path<String>) -> Json<Value> {
    if key != API_KEY {
        return Json(unauthorized("/sensors"));
    }
    Json(json!({
        "1": {
            "state": { "daylight": true, "lastupdated": "2024-05-01T05:12:00" },
            "config": { "on": true, "configured": true },
            "name": "Daylight",
            "type": "Daylight",
            "modelid": "PHDL00",
            "manufacturername": "Signify Netherlands B.V."
        },
        "5": {
            "state": { "temperature": 2115, "lastupdated": "none" },
            "config": { "on": true, "battery": 100, "reachable": true },
            "name": "Hue temperature sensor 1",
            "type": "ZLLTemperature",
            "uniqueid": "00:17:88:01:02:03:04:05-02-0402"
        }
    }))
}

async fn config(Path(key): Path<String>) -> Json<Value> {
    if key != API_KEY {
        return Json(unauthorized("/config"));
    }
    Json(json!({ "name": "Philips hue", "apiversion": "1.60.0" }))
}

async fn create_user(Json(body): Json<Value>) -> Json<Value> {
    if body["devicetype"] == "huesight#pressed" {
        Json(json!([{ "success": { "username": "new-user" } }]))
    } else {
        Json(json!([{ "error": { "type": 101, "address": "", "description": "link button not pressed" } }]))
    }
}

async fn discovery() -> Json<Value> {
    Json(json!([{ "id": "001788fffe100491", "internalipaddress": "192.168.2.23", "port": 443 }]))
}

async fn start_mock_bridge() -> SocketAddr {
    let router = Router::new()
        .route("/api", post(create_user))
        .route("/api/:key/config", get(config))
        .route("/api/:key/lights", get(lights))
        .route("/api/:key/groups", get(groups))
        .route("/api/:key/sensors", get(sensors))
        .route("/discovery", get(discovery));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, key: &str) -> HueBridgeClient {
    HueBridgeClient::new(&addr.to_string(), key, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_fetch_lights_ordered_by_id() {
    let addr = start_mock_bridge().await;
    let lights = client(addr, API_KEY).fetch_lights().await.unwrap();

    assert_eq!(lights.len(), 2);
    assert_eq!(lights[0].name, "Desk");
    assert_eq!(lights[0].state.brightness, 254);
    assert_eq!(lights[1].name, "Hallway");
    assert!(!lights[1].state.reachable);
}

#[tokio::test]
async fn test_fetch_groups() {
    let addr = start_mock_bridge().await;
    let groups = client(addr, API_KEY).fetch_groups().await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].group_type, "Room");
    assert!(groups[0].state.any_on);
}

#[tokio::test]
async fn test_fetch_sensors_with_unset_timestamp() {
    let addr = start_mock_bridge().await;
    let sensors = client(addr, API_KEY).fetch_sensors().await.unwrap();

    assert_eq!(sensors.len(), 2);
    assert_eq!(sensors[0].sensor_type, "Daylight");
    assert!(sensors[0].state.last_updated.is_set());
    assert_eq!(sensors[1].state.temperature, 2115);
    assert!(!sensors[1].state.last_updated.is_set());
}

#[tokio::test]
async fn test_unauthorized_key_is_api_error() {
    let addr = start_mock_bridge().await;
    let client = client(addr, "wrong-key");

    let err = client.fetch_sensors().await.unwrap_err();
    assert!(err.is_unauthorized(), "unexpected error: {}", err);

    let err = client.login().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_login_accepts_valid_key() {
    let addr = start_mock_bridge().await;
    assert!(client(addr, API_KEY).login().await.is_ok());
}

#[tokio::test]
async fn test_create_user_requires_link_button() {
    let addr = start_mock_bridge().await;
    let client = client(addr, "");

    let err = client.create_user("huesight#exporter").await.unwrap_err();
    assert!(matches!(err, BridgeClientError::LinkButtonNotPressed));

    let username = client.create_user("huesight#pressed").await.unwrap();
    assert_eq!(username, "new-user");
}

#[tokio::test]
async fn test_missing_route_is_status_error() {
    let addr = start_mock_bridge().await;
    let client = HueBridgeClient::new(
        &format!("http://{}/nowhere", addr),
        API_KEY,
        Duration::from_secs(2),
    )
    .unwrap();

    let err = client.fetch_lights().await.unwrap_err();
    assert!(matches!(err, BridgeClientError::Status { status: 404 }));
}

#[tokio::test]
async fn test_unreachable_bridge_is_http_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(addr, API_KEY).fetch_groups().await.unwrap_err();
    assert!(matches!(err, BridgeClientError::Http(_)));
}

#[tokio::test]
async fn test_discover_at_mock_broker() {
    let addr = start_mock_bridge().await;
    let bridges = discover_at(&format!("http://{}/discovery", addr), Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].address, "192.168.2.23");
}
