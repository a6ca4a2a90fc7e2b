use facade_api::ConfigAction;
use facade_mock::{ServerSupervisor, SimulationError};
use serde_json::{Value, json};

fn light_server(port: u16) -> Value {
    json!({
        "type": "Light",
        "endpoint": "/light/level",
        "port": port,
        "value_field": "level"
    })
}

fn lux_server() -> Value {
    json!({
        "type": "Illuminance",
        "endpoint": "/lux",
        "port": 0,
        "simulated_values": {"Illuminance": [["2024-05-01T12:00:00Z", 320]]}
    })
}

async fn get_json(url: String) -> Value {
    reqwest::get(url).await.unwrap().json().await.unwrap()
}

#[tokio::test]
async fn test_servers_run_independently() {
    let supervisor = ServerSupervisor::new();
    supervisor
        .apply("light", ConfigAction::New, &light_server(0))
        .await
        .unwrap();
    supervisor.apply("lux", ConfigAction::New, &lux_server()).await.unwrap();

    let light = supervisor.address("light").await.unwrap();
    let lux = supervisor.address("lux").await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{light}/light/level"))
        .json(&json!({"level": 0.8}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(get_json(format!("http://{light}/light/level")).await, json!({"level": 0.8}));

    supervisor.stop_server("light").await.unwrap();

    assert!(supervisor.address("light").await.is_none());
    assert!(reqwest::get(format!("http://{light}/light/level")).await.is_err());
    assert_eq!(
        get_json(format!("http://{lux}/lux")).await,
        json!({"timestamp": "2024-05-01T12:00:00Z", "value": 320})
    );

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_reset_restores_initial_value() {
    let supervisor = ServerSupervisor::new();
    supervisor
        .apply("light", ConfigAction::New, &light_server(0))
        .await
        .unwrap();
    let before = supervisor.address("light").await.unwrap();
    reqwest::Client::new()
        .post(format!("http://{before}/light/level"))
        .json(&json!({"level": 0.3}))
        .send()
        .await
        .unwrap();

    let after = supervisor.reset_server("light").await.unwrap();

    assert_eq!(get_json(format!("http://{after}/light/level")).await, json!({"level": -1}));
    assert_eq!(supervisor.reset_all_servers().await, 1);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_invalid_update_keeps_running_server() {
    let supervisor = ServerSupervisor::new();
    supervisor.apply("lux", ConfigAction::New, &lux_server()).await.unwrap();
    let address = supervisor.address("lux").await.unwrap();

    let result = supervisor
        .apply("lux", ConfigAction::Update, &json!({"type": "Thermostat", "endpoint": "/lux", "port": 0}))
        .await;

    assert!(matches!(result, Err(SimulationError::UnsupportedType(_))));
    assert_eq!(supervisor.address("lux").await, Some(address));
    assert_eq!(get_json(format!("http://{address}/lux")).await["value"], json!(320));

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_delete_forgets_server() {
    let supervisor = ServerSupervisor::new();
    supervisor
        .apply("light", ConfigAction::New, &light_server(0))
        .await
        .unwrap();

    supervisor.apply("light", ConfigAction::Delete, &Value::Null).await.unwrap();
    supervisor.apply("light", ConfigAction::Delete, &Value::Null).await.unwrap();

    assert!(supervisor.names().await.is_empty());
    assert!(matches!(
        supervisor.stop_server("light").await,
        Err(SimulationError::ServerNotFound(_))
    ));
}
