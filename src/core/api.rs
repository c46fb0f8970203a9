//! HTTP + WebSocket API for Zenome
//!
//! Endpoints:
//! - POST /session/new - Create new session
//! - GET /session/{id} - Scoreboard table and trend series
//! - POST /session/{id}/query - Submit a query
//! - GET /session/{id}/field - Field of the latest query
//! - WS /ws/{id} - Live records
//! - GET /health - Health check

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::core::session::{QueryPipeline, Session, SubmitOptions};
use crate::types::{
    ChannelOverlay, ErrorKind, Field, NarrativeOutcome, QueryRecord, Trends, ZenomeError,
};

/// Session plus its live-update channel.
///
/// The session mutex is held for a whole submission, so one session sees
/// one writer at a time. The map lock is only held long enough to clone
/// the entry.
#[derive(Debug)]
pub struct SessionEntry {
    pub session: Mutex<Session>,
    pub update_tx: broadcast::Sender<QueryRecord>,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
    pub pipeline: Arc<QueryPipeline>,
}

impl AppState {
    async fn entry(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.sessions.read().await.get(id).cloned()
    }
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub query_count: usize,
    pub table: Vec<QueryRecord>,
    pub trends: Trends,
    pub field_available: bool,
}

/// Submit query request. Overlay flags default to the configured overlay.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    pub entropy_overlay: Option<bool>,
    pub variance_overlay: Option<bool>,
    pub grid_size: Option<usize>,
}

/// Submit query response
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<QueryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<NarrativeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
    pub narrative_enabled: bool,
}

/// Pipeline failure mapped to an HTTP response
struct ApiError(ZenomeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::Config => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Tokenizer | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}

/// Create the API router
pub fn create_router(pipeline: Arc<QueryPipeline>) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        pipeline,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session))
        .route("/session/:id/query", post(submit_query))
        .route("/session/:id/field", get(get_field))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions_active = state.sessions.read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active,
        narrative_enabled: state.pipeline.has_narrator(),
    })
}

/// Create new session
async fn create_session(State(state): State<Arc<AppState>>) -> Json<NewSessionResponse> {
    let session = Session::new();
    let session_id = session.id().to_string();
    let (tx, _) = broadcast::channel(100);

    let entry = Arc::new(SessionEntry {
        session: Mutex::new(session),
        update_tx: tx,
    });
    state.sessions.write().await.insert(session_id.clone(), entry);
    log::info!("session {} created", session_id);

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
    })
}

/// Get session scoreboard
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let entry = state.entry(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let session = entry.session.lock().await;
    let log = session.log();

    Ok(Json(SessionStatusResponse {
        session_id: id,
        created_at: session.created_at(),
        query_count: log.len(),
        table: log.as_table().to_vec(),
        trends: log.trends(),
        field_available: session.latest_field().is_some(),
    }))
}

/// Submit a query to a session
async fn submit_query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Response, StatusCode> {
    let entry = state.entry(&id).await.ok_or(StatusCode::NOT_FOUND)?;

    let defaults = state.pipeline.config().overlay;
    let options = SubmitOptions {
        overlay: Some(ChannelOverlay {
            entropy: req.entropy_overlay.unwrap_or(defaults.entropy),
            variance: req.variance_overlay.unwrap_or(defaults.variance),
        }),
        grid_size: req.grid_size,
    };

    let mut session = entry.session.lock().await;
    let submission = match session.submit(&state.pipeline, &req.text, options).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("session {}: submission failed: {}", id, e);
            return Ok(ApiError(e).into_response());
        }
    };

    let response = match submission {
        Some(sub) => {
            let _ = entry.update_tx.send(sub.record.clone());
            QueryResponse {
                accepted: true,
                index: Some(sub.index),
                warning: sub.narrative.as_ref().and_then(|n| n.warning()),
                record: Some(sub.record),
                field: Some(sub.field),
                narrative: sub.narrative,
            }
        }
        None => QueryResponse {
            accepted: false,
            index: None,
            record: None,
            field: None,
            narrative: None,
            warning: None,
        },
    };

    Ok(Json(response).into_response())
}

/// Get field of the latest accepted query
async fn get_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Field>, StatusCode> {
    let entry = state.entry(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let session = entry.session.lock().await;
    let field = session.latest_field().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(field.clone()))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let entry = state.entry(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let rx = entry.update_tx.subscribe();

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Forward new records until either side hangs up
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<QueryRecord>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(record) => {
                    let json = serde_json::to_string(&record).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("websocket client lagged, {} records skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    pipeline: Arc<QueryPipeline>,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Zenome API listening on {}", addr);
    println!("🧠 Zenome API running on {}", addr);
    println!("  POST /session/new        - Create session");
    println!("  GET  /session/:id        - Scoreboard + trends");
    println!("  POST /session/:id/query  - Submit query");
    println!("  GET  /session/:id/field  - Latest field");
    println!("  WS   /ws/:id             - Live records");
    println!("  GET  /health             - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
