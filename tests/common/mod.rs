#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use insight_relay::AppConfig;
use serde_json::{Value, json};

/// What the fake inference service answers on `/api/generate`.
#[derive(Clone)]
pub enum GenerateReply {
    Chunks(Vec<String>),
    Status(StatusCode, String),
    Stall(Duration),
    /// Sends the chunks, then holds the body open for the given time.
    StallAfter(Vec<String>, Duration),
}

#[derive(Clone)]
struct StubState {
    reply: GenerateReply,
    generate_calls: Arc<Mutex<Vec<Value>>>,
    pull_calls: Arc<Mutex<Vec<Value>>>,
}

pub struct StubOllama {
    pub addr: SocketAddr,
    pub generate_calls: Arc<Mutex<Vec<Value>>>,
    pub pull_calls: Arc<Mutex<Vec<Value>>>,
}

impl StubOllama {
    pub async fn spawn(reply: GenerateReply) -> Self {
        let generate_calls = Arc::new(Mutex::new(Vec::new()));
        let pull_calls = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            reply,
            generate_calls: generate_calls.clone(),
            pull_calls: pull_calls.clone(),
        };

        let app = Router::new()
            .route("/api/version", get(version))
            .route("/api/pull", post(pull))
            .route("/api/generate", post(generate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            generate_calls,
            pull_calls,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            ollama_url: self.url(),
            ..AppConfig::default()
        }
    }
}

/// Splits a body into fragments the way a streaming backend would emit them.
pub fn fragments(parts: &[&str]) -> Vec<String> {
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(idx, part)| format!("{}\n", json!({"response": part, "done": idx == last})))
        .collect()
}

async fn version() -> Json<Value> {
    Json(json!({"version": "0.1.32"}))
}

async fn pull(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.pull_calls.lock().unwrap().push(body);
    Json(json!({"status": "success"}))
}

async fn generate(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.generate_calls.lock().unwrap().push(body);
    match state.reply {
        GenerateReply::Chunks(chunks) => {
            let chunks: Vec<Result<String, std::io::Error>> = chunks.into_iter().map(Ok).collect();
            Response::builder()
                .header("content-type", "application/x-ndjson")
                .body(Body::from_stream(futures::stream::iter(chunks)))
                .unwrap()
        }
        GenerateReply::Status(status, body) => (status, body).into_response(),
        GenerateReply::StallAfter(chunks, delay) => {
            let head = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
            let tail = futures::stream::once(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, std::io::Error>(r#"{"response":"","done":true}"#.to_string())
            });
            Response::builder()
                .header("content-type", "application/x-ndjson")
                .body(Body::from_stream(head.chain(tail)))
                .unwrap()
        }
        GenerateReply::Stall(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({"response": "too late", "done": true})).into_response()
        }
    }
}
