mod common;

use std::sync::Arc;

use cep_form::form::{NOT_FOUND_MESSAGE, SUBMIT_MESSAGE};
use cep_form::server::{FormResponse, HealthResponse, SubmitResponse, build_app};
use cep_form::{FormController, LocalStore, LookupReport, MemoryStorage, RecordingNotifier};
use common::{InstantLookup, paulista};

type Controller = FormController<MemoryStorage, InstantLookup, RecordingNotifier>;

async fn start_server() -> (String, Arc<Controller>) {
    let lookup = InstantLookup::default()
        .with("01310930", Some(paulista()))
        .with("00000000", None);
    let controller = Arc::new(FormController::new(
        LocalStore::new(MemoryStorage::new()),
        lookup,
        RecordingNotifier::new(),
    ));
    let app = build_app(Arc::clone(&controller));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), controller)
}

#[tokio::test]
async fn test_health() {
    let (base, _) = start_server().await;
    let health: HealthResponse = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cep_input_fills_address() {
    let (base, controller) = start_server().await;
    let client = reqwest::Client::new();

    let response: FormResponse = client
        .post(format!("{}/api/form/input", base))
        .json(&serde_json::json!({ "field": "cep", "value": "01310930" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.lookup, Some(LookupReport::Applied));
    assert!(response.message.is_none());
    assert_eq!(response.data.postal_code, "01310-930");
    assert_eq!(response.data.street, "Av. Paulista");
    assert_eq!(response.data.city, "São Paulo");
    assert_eq!(response.data.state_code, "SP");

    let current: FormResponse = client
        .get(format!("{}/api/form", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current.data, response.data);
    assert!(controller.store().restore().unwrap().is_some());
}

#[tokio::test]
async fn test_not_found_carries_alert_text() {
    let (base, controller) = start_server().await;
    let response: FormResponse = reqwest::Client::new()
        .post(format!("{}/api/form/input", base))
        .json(&serde_json::json!({ "field": "cep", "value": "00000-000" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.lookup, Some(LookupReport::NotFound));
    assert_eq!(response.message.as_deref(), Some(NOT_FOUND_MESSAGE));
    assert_eq!(response.data.street, "");
    assert_eq!(
        controller.notifier().messages(),
        vec![NOT_FOUND_MESSAGE.to_string()]
    );
}

#[tokio::test]
async fn test_unknown_field_is_rejected() {
    let (base, controller) = start_server().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/form/input", base))
        .json(&serde_json::json!({ "field": "email", "value": "a@b.c" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("email"));
    assert!(controller.store().restore().unwrap().is_none());
}

#[tokio::test]
async fn test_clear_and_submit() {
    let (base, controller) = start_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/form/input", base))
        .json(&serde_json::json!({ "field": "numero", "value": "42" }))
        .send()
        .await
        .unwrap();
    assert_eq!(controller.snapshot().await.number, "42");

    let cleared: FormResponse = client
        .post(format!("{}/api/form/clear", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared.data.number, "");
    assert!(controller.store().restore().unwrap().is_none());

    let submitted: SubmitResponse = client
        .post(format!("{}/api/form/submit", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(submitted.success);
    assert_eq!(submitted.message, SUBMIT_MESSAGE);
}
