//! Minimal browser front end: a chat form that posts straight to the
//! orchestrator and renders the reply inline.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tera::{Context, Tera};
use tracing::{error, warn};

use teller_agent::QueryRequest;

use crate::api::AppState;

#[derive(Clone)]
pub struct WebState {
    app: AppState,
    templates: Arc<Tera>,
}

pub fn router(app: AppState) -> Router {
    let state = WebState { app, templates: init_templates() };
    Router::new().route("/", get(index)).route("/chat", post(chat)).with_state(state)
}

fn init_templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/chat/**/*") {
        Ok(tera) => tera,
        Err(error) => {
            warn!(error = %error, "failed to load chat templates from filesystem, using embedded copy");
            Tera::default()
        }
    };
    tera.add_raw_template("index.html", include_str!("../../../templates/chat/index.html")).ok();
    Arc::new(tera)
}

fn render(
    templates: &Tera,
    context: &Context,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    templates.render("index.html", context).map(Html).map_err(|err| {
        error!(event_name = "web.render_failed", error = %err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<html><body>Template rendering failed</body></html>".to_string()),
        )
    })
}

pub async fn index(
    State(state): State<WebState>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    render(&state.templates, &Context::new())
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub query: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

pub async fn chat(
    State(state): State<WebState>,
    Form(form): Form<ChatForm>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    let mut context = Context::new();
    context.insert("query", form.query.trim());

    if form.query.trim().is_empty() {
        context.insert("error", "Please type a question first.");
        return render(&state.templates, &context);
    }

    let customer = match form.session_token.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => match state.app.auth.verify_session(token).await {
            Ok(customer) => Some(customer),
            Err(_) => {
                context.insert("error", "Your session is no longer valid. Please sign in again.");
                return render(&state.templates, &context);
            }
        },
        None => None,
    };

    let outcome = state
        .app
        .orchestrator
        .handle_query(QueryRequest { query: form.query.trim().to_string(), customer })
        .await;

    context.insert("response", &outcome.response);
    context.insert("intent", outcome.intent.as_str());
    context.insert("supported", &outcome.supported);
    render(&state.templates, &context)
}
