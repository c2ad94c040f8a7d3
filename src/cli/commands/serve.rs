//! HTTP API server for integration with other systems.
//!
//! Each client creates a session, loads a video into it, then asks for a
//! summary or asks questions. Sessions live in memory until deleted, or until
//! they sit idle past the configured limit.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::error::{ErrorKind, TubeqaError};
use crate::orchestrator::Orchestrator;
use crate::rag::Answer;
use crate::session::{Session, SessionSummary};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// A session, when it was opened, and when it was last used.
pub struct SessionEntry {
    pub session: Session,
    pub created_at: DateTime<Utc>,
    last_used: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            session: Session::new(),
            created_at: Utc::now(),
            last_used: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_used = Instant::now();
    }
}

/// Bounds on the session registry.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub idle_timeout: Duration,
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        SessionLimits::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for SessionLimits {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            idle_timeout: Duration::from_secs(settings.session_idle_minutes * 60),
            max_sessions: settings.max_sessions.max(1),
        }
    }
}

type SessionRegistry = HashMap<Uuid, Arc<Mutex<SessionEntry>>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    /// Open sessions. Each is locked for the duration of one operation.
    sessions: Arc<RwLock<SessionRegistry>>,
    limits: SessionLimits,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, limits: SessionLimits) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            limits,
        }
    }

    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<SessionEntry>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))
    }

    /// Open a session, first dropping idle ones and, at capacity, the least
    /// recently used one. Sessions busy with a request are never dropped.
    async fn open_session(&self) -> Result<Uuid, ApiError> {
        let mut sessions = self.sessions.write().await;

        let idle_timeout = self.limits.idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry
                .try_lock()
                .map_or(true, |entry| entry.last_used.elapsed() < idle_timeout)
        });
        let expired = before - sessions.len();
        if expired > 0 {
            info!("Dropped {} idle sessions", expired);
        }

        if sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .iter()
                .filter_map(|(id, entry)| entry.try_lock().ok().map(|e| (*id, e.last_used)))
                .min_by_key(|(_, last_used)| *last_used)
                .map(|(id, _)| id);

            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    info!(
                        "Session limit reached; dropped least recently used session {}",
                        id
                    );
                }
                None => return Err(ApiError::TooManySessions(self.limits.max_sessions)),
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Arc::new(Mutex::new(SessionEntry::new())));
        Ok(id)
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/video", post(load_video))
        .route("/sessions/{id}/summary", post(summarize))
        .route("/sessions/{id}/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = prepare(Operation::Serve, &settings)?;
    let app = router(AppState::new(orchestrator, SessionLimits::from(&settings.server)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("tubeqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Load video", "POST   /sessions/{id}/video");
    Output::kv("Session info", "GET    /sessions/{id}");
    Output::kv("Summarize", "POST   /sessions/{id}/summary");
    Output::kv("Ask", "POST   /sessions/{id}/ask");
    Output::kv("Close session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Errors ===

/// Failure of an API call.
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(Uuid),
    TooManySessions(usize),
    Pipeline(TubeqaError),
}

impl From<TubeqaError> for ApiError {
    fn from(err: TubeqaError) -> Self {
        ApiError::Pipeline(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: ErrorKind,
}

/// HTTP status for an error kind.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Configuration | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: format!("Session {} not found", id),
                    kind: ErrorKind::Input,
                },
            ),
            ApiError::TooManySessions(limit) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: format!("All {} sessions are busy; try again later", limit),
                    kind: ErrorKind::State,
                },
            ),
            ApiError::Pipeline(err) => {
                let kind = err.kind();
                if kind == ErrorKind::Upstream || kind == ErrorKind::Internal {
                    warn!("Request failed: {}", err);
                }
                (
                    status_for(kind),
                    ErrorResponse {
                        error: err.to_string(),
                        kind,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

// === Request/Response Types ===

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: Uuid,
}

#[derive(Deserialize)]
struct LoadVideoRequest {
    url: String,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: SessionSummary,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    k: Option<usize>,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let id = state.open_session().await?;
    info!("Created session {}", id);

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id: id }),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut entry = entry.lock().await;
    entry.touch();

    Ok(Json(SessionResponse {
        session_id: id,
        created_at: entry.created_at,
        summary: entry.session.summary(),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or(ApiError::SessionNotFound(id))?;
    info!("Closed session {}", id);

    Ok(StatusCode::NO_CONTENT)
}

async fn load_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LoadVideoRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut entry = entry.lock().await;
    entry.touch();

    state
        .orchestrator
        .load_video(&mut entry.session, &req.url)
        .await?;

    Ok(Json(SessionResponse {
        session_id: id,
        created_at: entry.created_at,
        summary: entry.session.summary(),
    }))
}

async fn summarize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut entry = entry.lock().await;
    entry.touch();

    let summary = state.orchestrator.summarize(&entry.session).await?;

    Ok(Json(SummaryResponse { summary }))
}

async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let entry = state.session(id).await?;
    let mut entry = entry.lock().await;
    entry.touch();

    let k = req.k.unwrap_or(state.orchestrator.config().k);
    let answer = state
        .orchestrator
        .ask_question_top_k(&mut entry.session, &req.question, k)
        .await?;

    Ok(Json(answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::orchestrator::PipelineConfig;
    use crate::testing::{CannedTranscriptSource, CountingEmbedder, RecordingGenerator};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<RecordingGenerator>) {
        app_with_limits(SessionLimits::default())
    }

    fn app_with_limits(limits: SessionLimits) -> (Router, Arc<RecordingGenerator>) {
        let generator = Arc::new(RecordingGenerator::replying("a concise summary"));
        let orchestrator = Orchestrator::with_components(
            Arc::new(
                CannedTranscriptSource::new()
                    .with_text("dQw4w9WgXcQ", "We talk about rust traits and async tasks."),
            ),
            Arc::new(CountingEmbedder::new()),
            generator.clone(),
            Prompts::default(),
            PipelineConfig::default(),
        )
        .unwrap();

        (router(AppState::new(orchestrator, limits)), generator)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Input), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::State), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Upstream), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorKind::Configuration),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_session_flow() {
        let (app, generator) = app();
        let id = new_session(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "no_transcript");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/sessions/{}/video", id),
            Some(json!({"url": "https://youtu.be/dQw4w9WgXcQ"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "transcript_loaded");
        assert_eq!(body["video_id"], "dQw4w9WgXcQ");

        let (status, body) =
            call(&app, Method::POST, &format!("/sessions/{}/summary", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "a concise summary");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/sessions/{}/ask", id),
            Some(json!({"question": "What about traits?", "k": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "a concise summary");
        assert_eq!(body["sources"].as_array().unwrap().len(), 1);
        assert_eq!(generator.calls(), 2);

        let (_, body) = call(&app, Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(body["phase"], "indexed");
        assert_eq!(body["indexed_chunks"], 1);

        let (status, _) = call(&app, Method::DELETE, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(&app, Method::GET, &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "input");
    }

    #[tokio::test]
    async fn test_error_responses() {
        let (app, generator) = app();
        let id = new_session(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/sessions/{}/ask", id),
            Some(json!({"question": "anything?"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "state");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/sessions/{}/video", id),
            Some(json!({"url": "not a video"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "input");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/sessions/{}/video", id),
            Some(json!({"url": "https://youtu.be/aaaaaaaaaaa"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "upstream");
        assert!(body["error"].as_str().unwrap().contains("aaaaaaaaaaa"));

        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let (app, _) = app_with_limits(SessionLimits {
            idle_timeout: Duration::from_millis(50),
            max_sessions: 10,
        });
        let stale = new_session(&app).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        let fresh = new_session(&app).await;

        let (status, _) = call(&app, Method::GET, &format!("/sessions/{}", stale), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::GET, &format!("/sessions/{}", fresh), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_cap_drops_least_recently_used() {
        let (app, _) = app_with_limits(SessionLimits {
            idle_timeout: Duration::from_secs(3600),
            max_sessions: 2,
        });
        let first = new_session(&app).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = new_session(&app).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Using the first session makes the second the oldest
        let (status, _) = call(&app, Method::GET, &format!("/sessions/{}", first), None).await;
        assert_eq!(status, StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(5)).await;

        let third = new_session(&app).await;

        for (id, expected) in [
            (&first, StatusCode::OK),
            (&second, StatusCode::NOT_FOUND),
            (&third, StatusCode::OK),
        ] {
            let (status, _) = call(&app, Method::GET, &format!("/sessions/{}", id), None).await;
            assert_eq!(status, expected, "session {}", id);
        }
    }

    #[test]
    fn test_limits_from_settings() {
        let limits = SessionLimits::from(&ServerSettings {
            session_idle_minutes: 2,
            max_sessions: 0,
        });
        assert_eq!(limits.idle_timeout, Duration::from_secs(120));
        assert_eq!(limits.max_sessions, 1);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (app, _) = app();
        let uri = format!("/sessions/{}/summary", Uuid::new_v4());
        let (status, body) = call(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }
}
