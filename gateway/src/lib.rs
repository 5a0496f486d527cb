mod api;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
    routing::get,
    Router,
};
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn, error};
use tower_http::trace::TraceLayer;
use std::sync::Arc;

// Internal imports
use crate::api::QueryParams;
use bridge_core::{BridgeConfig, BridgeRecord, FailurePolicy, Invocation, Registry, Runtime};

// 1. Application State
// Read-only for the whole life of the server; every request gets a clone.
#[derive(Clone)]
pub struct AppState {
    bridge: Arc<BridgeRecord>,
    runtime: Arc<Runtime>,
    failure_policy: FailurePolicy,
}

impl AppState {
    pub fn new(bridge: BridgeRecord, runtime: Runtime, failure_policy: FailurePolicy) -> Self {
        Self {
            bridge: Arc::new(bridge),
            runtime: Arc::new(runtime),
            failure_policy,
        }
    }
}

// 2. Routes: the page and the query endpoint
pub fn router(state: AppState) -> Router {
    let query_route = format!("/{}", state.bridge.route);

    Router::new()
        .route("/", get(serve_page))
        .route(&query_route, get(query_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// 3. Start a named bridge and serve until the listener fails
pub async fn launch(name: &str) -> Result<()> {
    let config = BridgeConfig::from_env()?;

    let bridge = Registry::find(config.bridges().await?, name)?;
    bridge.validate()?;
    info!(
        "Bridge '{}': GET /{}?{}=... -> {}",
        bridge.name, bridge.route, bridge.param, bridge.program.display()
    );

    let state = AppState::new(bridge, Runtime::new(), config.failure_policy);

    let listener = TcpListener::bind(config.addr()).await
        .with_context(|| format!("Failed to bind {}", config.addr()))?;
    let local = listener.local_addr()?;
    info!("App running at http://{}:{}", local.ip(), local.port());

    axum::serve(listener, router(state)).await
        .context("Server terminated")?;

    Ok(())
}

// --- HANDLERS ---

async fn serve_page(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.bridge.page).await {
        Ok(content) => api::html_page(content),
        Err(e) => {
            error!("Page {} unavailable: {}", state.bridge.page.display(), e);
            api::page_not_found()
        }
    }
}

// The bridge itself: query parameter -> tool run -> stdout as JSON
async fn query_tool(
    State(state): State<AppState>,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> Response {
    // An undecodable query string counts as "no parameter"
    let params = match query {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!("Ignoring malformed query string: {}", e);
            QueryParams::new()
        }
    };
    let value = params.get(&state.bridge.param).map(String::as_str);

    info!("got request for {} query: {}={}", state.bridge.name, state.bridge.param, value.unwrap_or(""));

    let invocation = Invocation::for_bridge(&state.bridge, value);

    match state.runtime.run(&invocation).await {
        Ok(output) => {
            if !output.success() {
                warn!(
                    "Tool {} exited with {}: {}",
                    invocation.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim_end()
                );
                if state.failure_policy == FailurePolicy::Report {
                    return api::tool_failed(&invocation, &output);
                }
            }
            api::json_passthrough(output.stdout)
        }
        Err(e) => {
            error!("{:#}", e);
            match state.failure_policy {
                FailurePolicy::Passthrough => api::json_passthrough(Vec::new()),
                FailurePolicy::Report => api::tool_unavailable(&e),
            }
        }
    }
}
