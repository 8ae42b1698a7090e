#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router, extract::Path, http::StatusCode, response::IntoResponse, routing::get};
use tokio::sync::Notify;

use cep_form::{LookupClient, LookupError, LookupOutcome, RemoteAddress};

pub fn paulista() -> RemoteAddress {
    RemoteAddress {
        cep: Some("01310-930".into()),
        logradouro: Some("Av. Paulista".into()),
        localidade: Some("São Paulo".into()),
        uf: Some("SP".into()),
        ..Default::default()
    }
}

pub fn rio_branco() -> RemoteAddress {
    RemoteAddress {
        cep: Some("20040-020".into()),
        logradouro: Some("Avenida Rio Branco".into()),
        bairro: Some("Centro".into()),
        localidade: Some("Rio de Janeiro".into()),
        uf: Some("RJ".into()),
        ..Default::default()
    }
}

/// Lookup whose answers are held back until the test releases them.
/// `None` answers mean "not found"; unknown codes fail.
#[derive(Default)]
pub struct GatedLookup {
    answers: HashMap<String, (Arc<Notify>, Option<RemoteAddress>)>,
    pub calls: AtomicUsize,
}

impl GatedLookup {
    pub fn with(mut self, digits: &str, answer: Option<RemoteAddress>) -> Self {
        self.answers
            .insert(digits.to_string(), (Arc::new(Notify::new()), answer));
        self
    }

    pub fn gate(&self, digits: &str) -> Arc<Notify> {
        Arc::clone(&self.answers[digits].0)
    }
}

impl LookupClient for GatedLookup {
    async fn fetch(&self, digits: &str) -> Result<LookupOutcome, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((gate, answer)) = self.answers.get(digits) else {
            return Err(LookupError::Status {
                status: 502,
                body: "bad gateway".into(),
            });
        };
        gate.notified().await;
        Ok(match answer {
            Some(remote) => LookupOutcome::Found(remote.clone()),
            None => LookupOutcome::NotFound,
        })
    }
}

/// Answers immediately from a fixed table
#[derive(Default, Clone)]
pub struct InstantLookup {
    answers: HashMap<String, Option<RemoteAddress>>,
}

impl InstantLookup {
    pub fn with(mut self, digits: &str, answer: Option<RemoteAddress>) -> Self {
        self.answers.insert(digits.to_string(), answer);
        self
    }
}

impl LookupClient for InstantLookup {
    async fn fetch(&self, digits: &str) -> Result<LookupOutcome, LookupError> {
        match self.answers.get(digits) {
            Some(Some(remote)) => Ok(LookupOutcome::Found(remote.clone())),
            Some(None) => Ok(LookupOutcome::NotFound),
            None => Err(LookupError::Status {
                status: 502,
                body: "bad gateway".into(),
            }),
        }
    }
}

async fn viacep_stub(Path(cep): Path<String>) -> axum::response::Response {
    match cep.as_str() {
        "01310930" => Json(serde_json::json!({
            "cep": "01310-930",
            "logradouro": "Av. Paulista",
            "localidade": "São Paulo",
            "uf": "SP"
        }))
        .into_response(),
        "00000000" => Json(serde_json::json!({ "erro": true })).into_response(),
        _ => (StatusCode::BAD_REQUEST, "invalid").into_response(),
    }
}

/// Serve a ViaCEP look-alike on an ephemeral port; returns its base URL.
pub async fn start_viacep_stub() -> String {
    let app = Router::new().route("/ws/:cep/json/", get(viacep_stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL nothing is listening on
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
