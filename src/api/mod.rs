use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::agent::{
    AgentError, ChatMessage, ChatOutcome, ChatSession, ConversationalAgent, DEFAULT_AGENT_ID,
    DisabledAgent, HttpAgent,
};
use crate::core::{
    Achievement, Action, DEFAULT_INVESTMENT_YEARS, DEFAULT_MONTHLY_SIP, FinancialPlan,
    MAX_INVESTMENT_YEARS, MAX_MONTHLY_SIP, MIN_INVESTMENT_YEARS, MIN_MONTHLY_SIP, PlanMetrics,
    Projection, Session, Transition, check_achievements, compute_metrics, project,
};
use crate::export::{EXPORT_FILE_NAME, render_plan, share_text};
use crate::store::{FileStore, SnapshotStore, load_session, save_session};

#[derive(Parser, Debug)]
#[command(
    name = "financial-warrior",
    about = "Financial Warrior plan engine: surplus, safety net, SIP projection and progress"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API for the walkthrough UI
    Serve(ServeArgs),
    /// Print a SIP projection as JSON
    Project(ProjectArgs),
    /// Print the saved plan as text, or write it to a file
    Export(ExportArgs),
    /// Delete the saved progress snapshot
    Reset(StoreArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(
        long,
        env = "WARRIOR_DATA_DIR",
        default_value = ".",
        help = "Directory holding the progress snapshot"
    )]
    pub data_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(
        long,
        env = "WARRIOR_AGENT_URL",
        help = "Chat agent endpoint; chat replies with an apology when unset"
    )]
    pub agent_url: Option<String>,
    #[arg(long, env = "WARRIOR_AGENT_KEY", hide_env_values = true)]
    pub agent_key: Option<String>,
    #[arg(long, default_value = DEFAULT_AGENT_ID)]
    pub agent_id: String,
    #[arg(long, help = "Agent request timeout in seconds; no timeout when unset")]
    pub agent_timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = DEFAULT_MONTHLY_SIP, help = "Monthly SIP amount")]
    pub monthly_sip: f64,
    #[arg(long, default_value_t = DEFAULT_INVESTMENT_YEARS, help = "Investment horizon in years")]
    pub years: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(long, help = "Write the plan to this file instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub agent_url: Option<String>,
    pub agent_key: Option<String>,
    pub agent_id: String,
    pub agent_timeout: Option<Duration>,
}

pub fn build_config(args: ServeArgs) -> Result<ServeConfig, String> {
    if args.agent_id.trim().is_empty() {
        return Err("--agent-id must not be empty".to_string());
    }

    let agent_url = args
        .agent_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());
    if let Some(url) = &agent_url {
        reqwest::Url::parse(url).map_err(|e| format!("--agent-url is not a valid URL: {e}"))?;
    }

    if args.agent_timeout_secs == Some(0) {
        return Err("--agent-timeout-secs must be > 0".to_string());
    }

    Ok(ServeConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], args.port)),
        data_dir: args.store.data_dir,
        agent_url,
        agent_key: args.agent_key.filter(|k| !k.is_empty()),
        agent_id: args.agent_id,
        agent_timeout: args.agent_timeout_secs.map(Duration::from_secs),
    })
}

pub fn build_projection(args: &ProjectArgs) -> Result<Projection, String> {
    if !(MIN_MONTHLY_SIP..=MAX_MONTHLY_SIP).contains(&args.monthly_sip) {
        return Err(format!(
            "--monthly-sip must be between {MIN_MONTHLY_SIP} and {MAX_MONTHLY_SIP}"
        ));
    }
    if !(MIN_INVESTMENT_YEARS..=MAX_INVESTMENT_YEARS).contains(&args.years) {
        return Err(format!(
            "--years must be between {MIN_INVESTMENT_YEARS} and {MAX_INVESTMENT_YEARS}"
        ));
    }
    Ok(project(args.monthly_sip, args.years))
}

struct AppState {
    session: Mutex<Session>,
    chat: Mutex<ChatSession>,
    store: Arc<dyn SnapshotStore>,
    agent: Arc<dyn ConversationalAgent>,
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    #[serde(flatten)]
    session: Session,
    can_advance: bool,
    metrics: PlanMetrics,
    achievements: Vec<Achievement>,
}

impl SessionView {
    fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            can_advance: session.can_advance(),
            metrics: compute_metrics(session.plan()),
            achievements: check_achievements(session.plan()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResponse {
    #[serde(flatten)]
    view: SessionView,
    transition: Transition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsResponse {
    metrics: PlanMetrics,
    achievements: Vec<Achievement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionQuery {
    monthly_sip: Option<f64>,
    years: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatView {
    session_id: String,
    loading: bool,
    messages: Vec<ChatMessage>,
}

impl ChatView {
    fn new(chat: &ChatSession) -> Self {
        Self {
            session_id: chat.session_id().to_string(),
            loading: chat.is_loading(),
            messages: chat.messages().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    outcome: ChatOutcome,
    #[serde(flatten)]
    chat: ChatView,
}

#[derive(Debug, Serialize)]
struct ShareResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_agent(config: &ServeConfig) -> anyhow::Result<Arc<dyn ConversationalAgent>> {
    match &config.agent_url {
        Some(url) => {
            let agent = HttpAgent::new(url.clone(), config.agent_key.clone(), config.agent_timeout)?;
            Ok(Arc::new(agent))
        }
        None => {
            warn!("no agent endpoint configured; chat will reply with a fallback message");
            Ok(Arc::new(DisabledAgent))
        }
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/session", get(session_handler))
        .route("/api/session/actions", post(action_handler))
        .route("/api/session/reset", post(reset_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/api/projection", get(projection_handler))
        .route("/api/export", get(export_handler))
        .route("/api/share", get(share_handler))
        .route("/api/chat", get(chat_get_handler).post(chat_post_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServeConfig) -> anyhow::Result<()> {
    let store: Arc<dyn SnapshotStore> = Arc::new(FileStore::in_dir(&config.data_dir));
    let session = load_session(store.as_ref());
    let state = Arc::new(AppState {
        session: Mutex::new(session),
        chat: Mutex::new(ChatSession::new(config.agent_id.clone())),
        store,
        agent: build_agent(&config)?,
    });

    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, data_dir = %config.data_dir.display(), "Financial Warrior API listening");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn session_handler(State(state): State<SharedState>) -> Response {
    let session = state.session.lock().await;
    json_response(StatusCode::OK, SessionView::new(&session))
}

async fn action_handler(State(state): State<SharedState>, Json(action): Json<Action>) -> Response {
    let mut session = state.session.lock().await;
    let transition = session.apply(action);
    save_session(state.store.as_ref(), &session);
    json_response(
        StatusCode::OK,
        ActionResponse {
            view: SessionView::new(&session),
            transition,
        },
    )
}

async fn reset_handler(State(state): State<SharedState>) -> Response {
    let mut session = state.session.lock().await;
    *session = Session::default();
    if let Err(e) = state.store.clear() {
        warn!("could not clear saved progress: {e}");
    }
    info!("progress reset");
    json_response(StatusCode::OK, SessionView::new(&session))
}

async fn metrics_handler(State(state): State<SharedState>) -> Response {
    let session = state.session.lock().await;
    json_response(
        StatusCode::OK,
        MetricsResponse {
            metrics: compute_metrics(session.plan()),
            achievements: check_achievements(session.plan()),
        },
    )
}

async fn projection_handler(Query(query): Query<ProjectionQuery>) -> Response {
    json_response(StatusCode::OK, projection_from_query(&query))
}

// Out-of-range query values are clamped the same way the sliders clamp.
fn projection_from_query(query: &ProjectionQuery) -> Projection {
    let mut plan = FinancialPlan::default();
    if let Some(v) = query.monthly_sip {
        plan.set_monthly_sip(v);
    }
    if let Some(v) = query.years {
        plan.set_investment_years(v);
    }
    project(plan.monthly_sip(), plan.investment_years())
}

async fn export_handler(State(state): State<SharedState>) -> Response {
    let text = render_plan(&*state.session.lock().await);
    let disposition = format!("attachment; filename=\"{EXPORT_FILE_NAME}\"");
    with_cache_control(
        (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            text,
        )
            .into_response(),
    )
}

async fn share_handler(State(state): State<SharedState>) -> Response {
    let text = share_text(&*state.session.lock().await);
    json_response(StatusCode::OK, ShareResponse { text })
}

async fn chat_get_handler(State(state): State<SharedState>) -> Response {
    let chat = state.chat.lock().await;
    json_response(StatusCode::OK, ChatView::new(&chat))
}

async fn chat_post_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatPayload>,
) -> Response {
    if payload.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let request = {
        let session = state.session.lock().await;
        state.chat.lock().await.begin(&payload.message, &session)
    };
    let Some(request) = request else {
        return error_response(StatusCode::CONFLICT, "a reply is already pending");
    };

    // Locks are released while the agent call is in flight.
    let pending = PendingReply::new(state.clone());
    let result = state.agent.send(&request).await;
    json_response(StatusCode::OK, pending.settle(result).await)
}

// Settles the chat turn with the fallback reply if the request is dropped
// before the agent answers, so the next message is not rejected forever.
struct PendingReply {
    state: SharedState,
    settled: bool,
}

impl PendingReply {
    fn new(state: SharedState) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    async fn settle(mut self, result: Result<String, AgentError>) -> ChatResponse {
        let mut chat = self.state.chat.lock().await;
        let outcome = chat.finish(result);
        self.settled = true;
        ChatResponse {
            outcome,
            chat: ChatView::new(&chat),
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("chat request dropped while awaiting the agent");
        if let Ok(mut chat) = self.state.chat.try_lock() {
            chat.finish(Err(AgentError::Interrupted));
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = self.state.clone();
            handle.spawn(async move {
                state.chat.lock().await.finish(Err(AgentError::Interrupted));
            });
        }
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn with_cache_control(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)).into_response())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
