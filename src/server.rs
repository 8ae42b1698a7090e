//! HTTP front end for the address form.
//!
//! Each form event becomes a JSON endpoint, so a page (or any client) can
//! drive the controller remotely:
//!
//! | Method | Path | Event |
//! |--------|------|-------|
//! | GET | `/health` | |
//! | GET | `/api/form` | read current values |
//! | POST | `/api/form/input` | field input |
//! | POST | `/api/form/clear` | clear button |
//! | POST | `/api/form/submit` | submit |

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::client::LookupClient;
use crate::form::{FormController, LookupReport, NOT_FOUND_MESSAGE, Notifier};
use crate::store::StoreClient;
use crate::types::{AddressRecord, Field};

/// Application state shared across all requests
pub struct AppState<S, L, N> {
    controller: Arc<FormController<S, L, N>>,
}

// Manual impl: derive would demand S, L, N: Clone.
impl<S, L, N> Clone for AppState<S, L, N> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

/// Build the Axum application with routes and middleware
pub fn build_app<S, L, N>(controller: Arc<FormController<S, L, N>>) -> Router
where
    S: StoreClient + 'static,
    L: LookupClient + 'static,
    N: Notifier + 'static,
{
    let state = AppState { controller };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/form", get(get_form::<S, L, N>))
        .route("/api/form/input", post(input_field::<S, L, N>))
        .route("/api/form/clear", post(clear_form::<S, L, N>))
        .route("/api/form/submit", post(submit_form::<S, L, N>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn get_form<S, L, N>(State(state): State<AppState<S, L, N>>) -> Json<FormResponse>
where
    S: StoreClient + 'static,
    L: LookupClient + 'static,
    N: Notifier + 'static,
{
    Json(FormResponse::new(state.controller.snapshot().await, None))
}

/// A keystroke (or paste) in one field
async fn input_field<S, L, N>(
    State(state): State<AppState<S, L, N>>,
    Json(request): Json<InputRequest>,
) -> Result<Json<FormResponse>, ApiError>
where
    S: StoreClient + 'static,
    L: LookupClient + 'static,
    N: Notifier + 'static,
{
    let field: Field = request
        .field
        .parse()
        .map_err(|e: crate::types::UnknownField| ApiError::BadRequest(e.to_string()))?;

    tracing::debug!("Input on field {}", field);
    let report = state.controller.on_input(field, &request.value).await;

    Ok(Json(FormResponse::new(
        state.controller.snapshot().await,
        Some(report),
    )))
}

async fn clear_form<S, L, N>(State(state): State<AppState<S, L, N>>) -> Json<FormResponse>
where
    S: StoreClient + 'static,
    L: LookupClient + 'static,
    N: Notifier + 'static,
{
    state.controller.on_clear().await;
    Json(FormResponse::new(state.controller.snapshot().await, None))
}

async fn submit_form<S, L, N>(State(state): State<AppState<S, L, N>>) -> Json<SubmitResponse>
where
    S: StoreClient + 'static,
    L: LookupClient + 'static,
    N: Notifier + 'static,
{
    let message = state.controller.on_submit();
    Json(SubmitResponse {
        success: true,
        message: message.to_string(),
    })
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InputRequest {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FormResponse {
    pub success: bool,
    pub data: AddressRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupReport>,
    /// Text of the alert the page should show, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormResponse {
    fn new(data: AddressRecord, lookup: Option<LookupReport>) -> Self {
        let message = match lookup {
            Some(LookupReport::NotFound) => Some(NOT_FOUND_MESSAGE.to_string()),
            _ => None,
        };
        Self {
            success: true,
            data,
            lookup,
            message,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

/// API error types
pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}
