//! JSON surface over the shared agent: chat turns, conversation state, and leads.

use autostream_agent::AgentError;
use autostream_core::domain::conversation::ConversationTurn;
use autostream_core::domain::lead::Lead;
use autostream_core::errors::{ApplicationError, InterfaceError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bootstrap::SharedAgent;

#[derive(Clone)]
pub struct AppState {
    agent: SharedAgent,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub intent: String,
    pub classification_source: &'static str,
    pub turn_count: usize,
    pub lead_form_required: bool,
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub turn_count: usize,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub name: String,
    pub email: String,
    pub platform: String,
}

#[derive(Debug, Serialize)]
pub struct LeadsResponse {
    pub count: usize,
    pub leads: Vec<Lead>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    correlation_id: &'a str,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn new(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(error: AgentError) -> Self {
        match error {
            AgentError::EmptyMessage => {
                Self::new(ApplicationError::InvalidRequest("Message must not be empty.".to_string()))
            }
            AgentError::Repository(source) => {
                Self::new(ApplicationError::Persistence(source.to_string()))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(
            event_name = "server.api.request_failed",
            correlation_id = self.0.correlation_id(),
            status = status.as_u16(),
            error = %self.0,
            "api request failed"
        );
        let body = ErrorBody {
            error: self.0.user_message(),
            correlation_id: self.0.correlation_id(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(agent: SharedAgent) -> Router {
    Router::new()
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/conversation", get(conversation).delete(clear_conversation))
        .route("/api/v1/leads", get(list_leads).post(capture_lead))
        .with_state(AppState { agent })
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let mut agent = state.agent.lock().await;
    let reply = agent.process_message(&request.message).await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        intent: reply.intent.as_str().to_string(),
        classification_source: reply.classification_source.as_str(),
        turn_count: reply.turn_count,
        lead_form_required: reply.lead_capture_requested,
        sources: reply.sources,
    }))
}

pub async fn conversation(State(state): State<AppState>) -> Json<ConversationResponse> {
    let agent = state.agent.lock().await;
    Json(ConversationResponse { turn_count: agent.turn_count(), turns: agent.recent_turns() })
}

pub async fn clear_conversation(State(state): State<AppState>) -> StatusCode {
    state.agent.lock().await.clear();
    StatusCode::NO_CONTENT
}

pub async fn capture_lead(
    State(state): State<AppState>,
    Json(request): Json<LeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = Lead::capture(&request.name, &request.email, &request.platform)
        .map_err(|error| ApiError::new(ApplicationError::from(error)))?;

    let agent = state.agent.lock().await;
    agent.record_lead(&lead).await?;
    info!(
        event_name = "server.api.lead_captured",
        correlation_id = "api",
        platform = lead.platform(),
        "lead captured over http"
    );

    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn list_leads(State(state): State<AppState>) -> Result<Json<LeadsResponse>, ApiError> {
    let leads = state.agent.lock().await.leads().await?;
    Ok(Json(LeadsResponse { count: leads.len(), leads }))
}
