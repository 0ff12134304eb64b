use crate::analyzer::Analyzer;
use crate::knowledge::{KnowledgeArticle, ARTICLES};
use crate::store::TicketStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use support_core::wire::{
    ActionItem, ActionsSection, AnalysisPayload, ModelInfo, RawTicket, RoutingSection,
    SentimentSection, StatusPayload, SummarySection, TimeEstimationSection,
};

pub const OLLAMA_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TicketStore>,
    pub analyzer: Arc<dyn Analyzer>,
    pub http: reqwest::Client,
    pub ollama_url: String,
    pub model: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/tickets", get(handle_list).post(handle_create))
        .route("/tickets/:id", get(handle_get))
        .route("/knowledge-base", get(handle_knowledge_base))
        .route("/process-ticket", post(handle_process))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn handle_index() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Support desk backend is running",
        "endpoints": ["/status", "/tickets", "/knowledge-base", "/process-ticket"],
    }))
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn handle_status(State(state): State<AppState>) -> Response {
    let (code, payload) = probe_ollama(&state.http, &state.ollama_url).await;
    (code, Json(payload)).into_response()
}

/// Asks Ollama for its model list. A reachable server with a bad status is a
/// warning; no answer at all is an error.
pub async fn probe_ollama(http: &reqwest::Client, ollama_url: &str) -> (StatusCode, StatusPayload) {
    #[derive(serde::Deserialize)]
    struct Tags {
        #[serde(default)]
        models: Vec<ModelInfo>,
    }

    let started = Instant::now();
    let url = format!("{}/api/tags", ollama_url.trim_end_matches('/'));
    let response = match http.get(&url).timeout(OLLAMA_PROBE_TIMEOUT).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "ollama unreachable");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusPayload::unreachable(e.to_string()),
            );
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "ollama returned an error status");
        return (
            StatusCode::OK,
            StatusPayload {
                status: StatusPayload::STATUS_WARNING.into(),
                ollama_connected: false,
                message: Some(format!("Ollama API returned status code {}", status.as_u16())),
                ..StatusPayload::default()
            },
        );
    }

    let models = match response.json::<Tags>().await {
        Ok(tags) => tags.models,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable ollama model list");
            Vec::new()
        }
    };
    tracing::debug!(models = models.len(), "ollama connected");
    (
        StatusCode::OK,
        StatusPayload {
            status: StatusPayload::STATUS_OK.into(),
            ollama_connected: true,
            models: Some(models),
            message: None,
            response_time: Some(started.elapsed().as_secs_f64() * 1000.0),
        },
    )
}

async fn handle_list(State(state): State<AppState>) -> Json<Vec<RawTicket>> {
    Json(state.store.list().await)
}

async fn handle_get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get(&id).await {
        Some(ticket) => Json(ticket).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Ticket {id} not found")),
    }
}

async fn handle_create(State(state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let payload = body.map(|Json(v)| v).unwrap_or(Value::Null);
    match state.store.create(&payload, Utc::now()).await {
        Ok(ticket) => (StatusCode::CREATED, Json(ticket)).into_response(),
        Err(e) => {
            tracing::info!(error = %e.message(), "ticket rejected");
            error_response(StatusCode::BAD_REQUEST, e.message())
        }
    }
}

async fn handle_knowledge_base() -> Json<Vec<KnowledgeArticle>> {
    Json(ARTICLES.to_vec())
}

async fn handle_process(State(state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let Some(Json(body)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "No ticket data provided");
    };
    let Some(ticket) = body
        .get("ticket")
        .filter(|t| t.as_object().is_some_and(|o| !o.is_empty()))
    else {
        return error_response(StatusCode::BAD_REQUEST, "No ticket data provided");
    };
    let ticket: RawTicket = match serde_json::from_value(ticket.clone()) {
        Ok(t) => t,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid ticket: {e}")),
    };
    let model = body
        .get("model")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(state.model.as_str())
        .to_string();

    let history = state.store.list().await;
    let ticket_id = ticket.id.clone().unwrap_or_default();
    match state.analyzer.analyze(&ticket, &history, &model).await {
        Ok(payload) => {
            tracing::info!(ticket_id = %ticket_id, model = %model, "ticket processed");
            Json(payload).into_response()
        }
        Err(message) => {
            tracing::warn!(ticket_id = %ticket_id, error = %message, "ticket processing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(fallback_payload(message))).into_response()
        }
    }
}

/// Error payload that still carries neutral defaults in every section.
pub fn fallback_payload(message: String) -> AnalysisPayload {
    AnalysisPayload {
        error: Some(message),
        sentiment: Some(SentimentSection {
            overall_sentiment: Some("neutral".into()),
            score: Some(0.5),
            intensity: None,
        }),
        summary: Some(SummarySection {
            key_points: vec!["Error processing ticket".into()],
            ..SummarySection::default()
        }),
        actions: Some(ActionsSection {
            actions: vec![ActionItem {
                description: Some("Review ticket manually".into()),
            }],
        }),
        routing: Some(RoutingSection {
            recommended_team: Some("technical-support".into()),
            confidence: None,
        }),
        time_estimation: Some(TimeEstimationSection {
            estimated_minutes: Some(30.0),
            confidence: None,
        }),
        ..AnalysisPayload::default()
    }
}
