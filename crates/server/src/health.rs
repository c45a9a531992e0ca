use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::bootstrap::SharedAgent;

#[derive(Clone)]
pub struct HealthState {
    agent: SharedAgent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub knowledge_base: HealthCheck,
    pub lead_store: HealthCheck,
    pub checked_at: String,
}

pub fn router(agent: SharedAgent) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { agent })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let agent = state.agent.lock().await;
    let documents = agent.retriever().documents().len();

    let knowledge_base = if documents > 0 {
        HealthCheck { status: "ready", detail: format!("{documents} documents indexed") }
    } else {
        HealthCheck { status: "degraded", detail: "knowledge base is empty".to_string() }
    };
    let lead_store = HealthCheck {
        status: "ready",
        detail: format!("appending to {}", agent.lead_store_location()),
    };
    let ready = knowledge_base.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("autostream-server runtime initialized, {} turns", agent.turn_count()),
        },
        knowledge_base,
        lead_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
