use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use teller_agent::{AuthError, AuthService, Orchestrator, QueryRequest};
use teller_core::domain::conversation::ConversationEntry;
use teller_core::domain::customer::CustomerId;
use teller_core::stats::StatsSnapshot;
use teller_db::repositories::{ConversationRepository, CustomerRepository};

const DEFAULT_CONVERSATION_LIMIT: u32 = 50;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub auth: Arc<AuthService>,
    pub customers: Arc<dyn CustomerRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/authenticate", post(authenticate))
        .route("/logout", post(logout))
        .route("/statistics", get(statistics))
        .route("/conversations", get(conversations))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { error: message.into() }))
}

fn auth_error_response(error: AuthError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::AccountLocked { .. } => StatusCode::LOCKED,
        AuthError::AccountInactive { .. } => StatusCode::FORBIDDEN,
        AuthError::Session(_) => StatusCode::UNAUTHORIZED,
        AuthError::Repository(inner) => {
            error!(event_name = "api.repository_error", error = %inner);
            return api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "an internal error occurred",
            );
        }
    };
    api_error(status, error.to_string())
}

#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub query: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub intent: String,
    pub supported: bool,
    pub response: String,
    pub timestamp: String,
}

pub async fn query(
    State(state): State<AppState>,
    Json(payload): Json<QueryPayload>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<ApiError>)> {
    if payload.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query must not be empty"));
    }

    // A presented token must verify; a bad token is rejected rather than
    // silently downgraded to an anonymous request.
    let customer = match (&payload.session_token, &payload.customer_id) {
        (Some(token), _) => {
            Some(state.auth.verify_session(token).await.map_err(auth_error_response)?)
        }
        (None, Some(customer_id)) => state
            .customers
            .find_by_id(&CustomerId(customer_id.clone()))
            .await
            .map_err(|error| {
                error!(event_name = "api.repository_error", error = %error);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "an internal error occurred")
            })?,
        (None, None) => None,
    };

    let outcome = state
        .orchestrator
        .handle_query(QueryRequest { query: payload.query, customer })
        .await;

    Ok(Json(QueryResponse {
        intent: outcome.intent.as_str().to_string(),
        supported: outcome.supported,
        response: outcome.response,
        timestamp: outcome.timestamp.to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AuthenticatePayload {
    pub customer_id: String,
    pub credential: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub session_token: String,
    pub customer_id: String,
    pub customer_name: String,
    pub expires_at: String,
}

pub async fn authenticate(
    State(state): State<AppState>,
    Json(payload): Json<AuthenticatePayload>,
) -> Result<Json<AuthenticateResponse>, (StatusCode, Json<ApiError>)> {
    let session = state
        .auth
        .authenticate(&payload.customer_id, &payload.credential)
        .await
        .map_err(auth_error_response)?;

    Ok(Json(AuthenticateResponse {
        session_token: session.token,
        customer_id: session.customer_id.0,
        customer_name: session.customer_name,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LogoutPayload {
    pub session_token: String,
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutPayload>,
) -> StatusCode {
    state.auth.logout(&payload.session_token).await;
    StatusCode::NO_CONTENT
}

pub async fn statistics(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.orchestrator.statistics())
}

#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

pub async fn conversations(
    State(state): State<AppState>,
    Query(params): Query<ConversationsQuery>,
) -> Result<Json<Vec<ConversationEntry>>, (StatusCode, Json<ApiError>)> {
    let limit = params.limit.unwrap_or(DEFAULT_CONVERSATION_LIMIT).min(500);
    let entries = state
        .conversations
        .list(params.customer_id.as_deref(), limit)
        .await
        .map_err(|error| {
            error!(event_name = "api.repository_error", error = %error);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "an internal error occurred")
        })?;
    Ok(Json(entries))
}
