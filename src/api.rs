//! REST API for the finance assistant
//!
//! Login, feature catalog, feature execution and chat search over HTTP.
//! Sessions are addressed by the opaque id returned from login.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::StaticDirectory;
use crate::config::AppConfig;
use crate::dispatcher::{FeatureDispatcher, FeatureRequest, LOGIN_REQUIRED};
use crate::documents::{decode_hex_body, Upload};
use crate::error::{AssistantError, INVALID_CREDENTIALS_MESSAGE};
use crate::features::{Feature, FeatureCatalog};
use crate::history::ChatLog;
use crate::inference::{client_from_config, CompletionClient};
use crate::models::Session;
use crate::session::SessionStore;
use crate::templates;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub account_id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: String,
    #[serde(default)]
    pub query: String,
}

/// Balance as typed by the user, or already numeric.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BalanceInput {
    Number(f64),
    Text(String),
}

impl BalanceInput {
    fn into_input(self) -> String {
        match self {
            BalanceInput::Number(n) => n.to_string(),
            BalanceInput::Text(s) => s,
        }
    }
}

/// An uploaded file carried in JSON: hex bytes or plain text.
#[derive(Debug, Deserialize)]
pub struct FileBody {
    pub name: String,
    pub content_hex: Option<String>,
    pub text: Option<String>,
}

impl FileBody {
    fn into_upload(self) -> crate::Result<Upload> {
        match (self.content_hex, self.text) {
            (Some(hex_body), _) => decode_hex_body(&self.name, &hex_body),
            (None, Some(text)) => Ok(Upload::new(self.name, text.into_bytes())),
            (None, None) => Err(AssistantError::InputError(
                "File must carry content_hex or text.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RunFeatureRequest {
    pub session_id: String,
    pub feature: String,
    pub text: Option<String>,
    pub balance: Option<BalanceInput>,
    pub language: Option<String>,
    pub file: Option<FileBody>,
}

#[derive(Debug, Deserialize)]
pub struct BudgetSplitRequest {
    pub balance: BalanceInput,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiReply = (StatusCode, Json<ApiResponse>);

fn reply_ok<T: Serialize>(data: T) -> ApiReply {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn reply_err(status: StatusCode, message: impl Into<String>) -> ApiReply {
    (status, Json(ApiResponse::error(message.into())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionStore>,
    pub dispatcher: Arc<FeatureDispatcher>,
}

impl ApiState {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(client_from_config(&config.inference), config)
    }

    pub fn with_client(client: Arc<dyn CompletionClient>, config: &AppConfig) -> Self {
        let dispatcher = FeatureDispatcher::new(client, config.inference.clone())
            .with_chat_log(Arc::new(ChatLog::new()));

        Self {
            sessions: Arc::new(SessionStore::new(Arc::new(StaticDirectory::demo()))),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Every lookup failure reads as "not logged in".
    async fn session(&self, raw_id: &str) -> Result<Session, ApiReply> {
        self.sessions
            .resolve(raw_id)
            .await
            .map_err(|_| reply_err(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED))
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Session Endpoints
/// =============================

async fn login(State(state): State<ApiState>, Json(req): Json<LoginRequest>) -> ApiReply {
    match state.sessions.login(&req.account_id, &req.password).await {
        Ok((session_id, session)) => {
            let profile = session.profile();
            reply_ok(serde_json::json!({
                "session_id": session_id,
                "role": session.role(),
                "display_name": profile.map(|p| p.display_name.as_str()),
            }))
        }
        Err(e) => {
            if !matches!(e, AssistantError::InvalidCredentials) {
                warn!("Login failed unexpectedly: {}", e);
            }
            reply_err(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE)
        }
    }
}

async fn logout(State(state): State<ApiState>, Json(req): Json<LogoutRequest>) -> ApiReply {
    let session_id = match Uuid::parse_str(req.session_id.trim()) {
        Ok(id) => id,
        Err(_) => return reply_err(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED),
    };

    match state.sessions.logout(session_id).await {
        Ok(()) => reply_ok(serde_json::json!({ "logged_out": true })),
        Err(_) => reply_err(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED),
    }
}

/// =============================
/// Feature Endpoints
/// =============================

async fn list_features(
    State(state): State<ApiState>,
    Query(query): Query<SessionQuery>,
) -> ApiReply {
    let session = match state.session(&query.session_id).await {
        Ok(session) => session,
        Err(reply) => return reply,
    };
    let Some(role) = session.role() else {
        return reply_err(StatusCode::UNAUTHORIZED, LOGIN_REQUIRED);
    };

    reply_ok(serde_json::json!({
        "role": role,
        "groups": FeatureCatalog::for_role(role),
    }))
}

async fn feature_example(Path(key): Path<String>) -> ApiReply {
    match key.parse::<Feature>() {
        Ok(feature) => reply_ok(serde_json::json!({
            "feature": feature.key(),
            "label": feature.label(),
            "example": feature.example(),
        })),
        Err(e) => reply_err(StatusCode::NOT_FOUND, e.to_string()),
    }
}

async fn run_feature(
    State(state): State<ApiState>,
    Json(req): Json<RunFeatureRequest>,
) -> ApiReply {
    let session = match state.session(&req.session_id).await {
        Ok(session) => session,
        Err(reply) => return reply,
    };

    let feature = match req.feature.parse::<Feature>() {
        Ok(feature) => feature,
        Err(e) => return reply_err(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let mut request = FeatureRequest::new(feature);
    if let Some(text) = req.text {
        request = request.with_text(text);
    }
    if let Some(balance) = req.balance {
        request = request.with_balance(balance.into_input());
    }
    if let Some(language) = req.language {
        request = request.with_language(language);
    }
    if let Some(file) = req.file {
        match file.into_upload() {
            Ok(upload) => request = request.with_upload(upload),
            Err(e) => return reply_err(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    info!(feature = feature.key(), "Feature request received");
    let answer = state.dispatcher.run_feature(&session, request).await;

    reply_ok(serde_json::json!({
        "feature": feature.key(),
        "label": feature.label(),
        "answer": answer,
    }))
}

async fn budget_split(Json(req): Json<BudgetSplitRequest>) -> ApiReply {
    let input = req.balance.into_input();
    match templates::parse_balance(&input) {
        Ok(balance) => {
            let split = templates::BudgetSplit::compute(balance);
            reply_ok(serde_json::json!({
                "answer": split.render(),
                "split": split,
            }))
        }
        Err(e) => reply_err(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// =============================
/// Chat Search
/// =============================

async fn history(State(state): State<ApiState>, Query(query): Query<HistoryQuery>) -> ApiReply {
    let session = match state.session(&query.session_id).await {
        Ok(session) => session,
        Err(reply) => return reply,
    };

    let records = state
        .dispatcher
        .chat_log()
        .search(session.account_id(), &query.query)
        .await;

    reply_ok(serde_json::json!({
        "count": records.len(),
        "rendered": ChatLog::render(&records),
        "results": records,
    }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/features", get(list_features))
        .route("/api/features/run", post(run_feature))
        .route("/api/features/:key/example", get(feature_example))
        .route("/api/budget-split", post(budget_split))
        .route("/api/history", get(history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    config: AppConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let router = create_router(ApiState::new(&config));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
