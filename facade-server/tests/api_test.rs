use axum::http::{Method, StatusCode};
use facade_api::Sample;
use serde_json::json;
use time::macros::datetime;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_store_round_trip() {
    let app = MockApp::new().await;

    let (status, body) = app
        .send(Method::PUT, "/store/ofc.control_algorithm/config", Some(json!([])))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], json!("NEW"));

    let (_, body) = app
        .send(Method::PUT, "/store/ofc.control_algorithm/config", Some(json!({"algorithm_params": []})))
        .await;
    assert_eq!(body["action"], json!("UPDATE"));

    let (status, body) = app.send(Method::GET, "/store/ofc.control_algorithm/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"algorithm_params": []}));

    let (_, body) = app.send(Method::GET, "/store/ofc.control_algorithm", None).await;
    assert_eq!(body, json!(["config"]));

    let (status, _) = app.send(Method::DELETE, "/store/ofc.control_algorithm/config", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::DELETE, "/store/ofc.control_algorithm/config", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!(404));

    app.stop().await;
}

#[tokio::test]
async fn test_store_rejects_bad_names() {
    let app = MockApp::new().await;

    let (status, _) = app
        .send(Method::PUT, "/store/ofc.area_controller/areas/../x", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.stop().await;
}

#[tokio::test]
async fn test_area_routes() {
    let app = MockApp::new().await;
    app.record("I1", 320).await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/store/ofc.area_controller/areas/east",
            Some(json!({
                "Devices": [
                    {"Type": "Light", "VOLTTRON Endpoint": "L1"},
                    {"Type": "Illuminance", "VOLTTRON Endpoint": "I1"}
                ],
                "Control Options": {"mode": "auto"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let registry = app.agents.controller.registry().clone();
    let loaded = app
        .wait_for(|| {
            let registry = registry.clone();
            async move { registry.get("east").await.is_some() }
        })
        .await;
    assert!(loaded);

    let (_, body) = app.send(Method::GET, "/areas", None).await;
    assert_eq!(body, json!(["east"]));

    let (status, body) = app.send(Method::GET, "/areas/east", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["Light"], json!(["L1"]));
    assert_eq!(body["endpoints"]["Glare"], json!([]));
    assert_eq!(body["control_options"], json!({"mode": "auto"}));

    let (status, body) = app.send(Method::GET, "/areas/east/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    let illuminance = &body["endpoints"]["Illuminance"][0];
    assert_eq!(illuminance["endpoint"], json!("I1"));
    assert_eq!(illuminance["values"][0]["value"], json!(320));

    let (_, body) = app.send(Method::GET, "/summary", None).await;
    assert!(body.get("east").is_some());

    let (status, body) = app.send(Method::GET, "/areas/west", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], json!("Area not found: west"));

    let (status, _) = app.send(Method::GET, "/areas/west/summary", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.stop().await;
}

#[tokio::test]
async fn test_topic_routes() {
    let app = MockApp::new().await;
    let historian = &app.platform.historian;
    let prefix = "ofc_analysis/ofc.control_algorithm";

    app.record("I1", 100).await;
    historian
        .record(&format!("{prefix}/action"), Sample::new(datetime!(2024-05-01 12:00 UTC), "a1"))
        .await;
    historian
        .record(&format!("{prefix}/action"), Sample::new(datetime!(2024-05-01 12:01 UTC), "a2"))
        .await;
    historian
        .record(&format!("{prefix}/reason"), Sample::new(datetime!(2024-05-01 12:01 UTC), "r2"))
        .await;
    historian
        .record(&format!("{prefix}/reason"), Sample::new(datetime!(2024-05-01 12:02 UTC), "r3"))
        .await;

    let (_, body) = app.send(Method::GET, "/topics", None).await;
    assert_eq!(body, json!(["I1"]));

    let (_, body) = app.send(Method::GET, "/analysis", None).await;
    assert_eq!(body, json!([prefix]));

    let (status, body) = app
        .send(Method::GET, &format!("/analysis/{prefix}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"timestamp": "2024-05-01T12:00:00Z", "action": "a1", "reason": null},
            {"timestamp": "2024-05-01T12:01:00Z", "action": "a2", "reason": "r2"},
            {"timestamp": "2024-05-01T12:02:00Z", "action": null, "reason": "r3"}
        ])
    );

    let (_, body) = app.send(Method::GET, "/analysis/ofc_analysis/unknown", None).await;
    assert_eq!(body, json!([]));

    app.stop().await;
}

#[tokio::test]
async fn test_simulation_routes() {
    let app = MockApp::with_simulation().await;
    app.platform
        .store
        .store(
            "ofc.simulation_server_manager",
            "servers/light",
            json!({"type": "Light", "endpoint": "/light", "port": 0}),
        )
        .await
        .unwrap();

    let supervisor = app.agents.supervisor.clone().unwrap();
    let started = app
        .wait_for(|| {
            let supervisor = supervisor.clone();
            async move { supervisor.address("light").await.is_some() }
        })
        .await;
    assert!(started);

    let (status, body) = app.send(Method::GET, "/simulation", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], json!("light"));
    assert!(body[0]["address"].is_string());

    let (status, _) = app.send(Method::POST, "/simulation/light/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.send(Method::GET, "/simulation", None).await;
    assert!(body[0]["address"].is_null());

    let (status, body) = app.send(Method::POST, "/simulation/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"started": 1}));

    let (status, _) = app.send(Method::POST, "/simulation/ghost/reset", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.stop().await;
}

#[tokio::test]
async fn test_simulation_routes_absent_when_disabled() {
    let app = MockApp::new().await;

    let (status, _) = app.send(Method::GET, "/simulation", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.stop().await;
}
