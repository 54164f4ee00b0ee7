use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, ResponseMode},
    error::ServiceError,
    insights::{Insight, build_prompt, parse_insights},
    model::TextGenerator,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub generator: Arc<dyn TextGenerator>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ExtractionResponse {
    Raw {
        raw_response: String,
        status: &'static str,
    },
    Insights {
        insights: Vec<Insight>,
    },
}

pub fn build_router(config: Arc<AppConfig>, generator: Arc<dyn TextGenerator>) -> Router {
    let state = AppState { config, generator };

    Router::new()
        .route("/health", get(health))
        .route("/extract/insights", post(extract_insights))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn extract_insights(
    State(state): State<AppState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResponse>, ServiceError> {
    let Json(request) =
        payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;

    let prompt = build_prompt(&request.text);
    let raw = state
        .generator
        .generate(&prompt, &state.config.sampling)
        .await
        .map_err(|err| {
            warn!(%err, "generation failed");
            ServiceError::generation(err)
        })?;

    let response = match state.config.response_mode {
        ResponseMode::Raw => ExtractionResponse::Raw {
            raw_response: raw,
            status: "success",
        },
        ResponseMode::Insights => {
            let insights = parse_insights(&raw);
            info!(count = insights.len(), "extracted insights");
            ExtractionResponse::Insights { insights }
        }
    };

    Ok(Json(response))
}

/// Binds `addr`, or the same host on an OS-assigned port if that fails.
pub async fn bind_with_fallback(addr: SocketAddr) -> Result<TcpListener, ServiceError> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) => {
            warn!(%addr, %err, "failed to bind requested port, trying an OS-assigned one");
            let fallback = SocketAddr::new(addr.ip(), 0);
            Ok(TcpListener::bind(fallback).await?)
        }
    }
}
