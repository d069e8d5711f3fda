//! HTTP front door: listing page, lifecycle actions, static assets
//!
//! Every request is handled on its own: the listing asks the engine for the
//! full inventory and renders it, actions forward one lifecycle call. Nothing
//! is cached between requests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::post,
    Router,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::action::{Action, UnknownAction};
use crate::assets;
use crate::engine::{with_deadline, ContainerEngine, EngineError};
use crate::inventory::{EngineInfo, PageData};

/// Shared state for the live dashboard
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ContainerEngine>,
    /// Per-call engine deadline; `None` waits as long as the engine takes.
    pub deadline: Option<Duration>,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    page: PageData,
    live: bool,
}

/// Errors a handler can answer with. Bodies are the plain error text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown action")]
    UnknownAction,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Render(#[from] askama::Error),
}

impl From<UnknownAction> for AppError {
    fn from(_: UnknownAction) -> Self {
        AppError::UnknownAction
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnknownAction => StatusCode::BAD_REQUEST,
            AppError::Engine(_) | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Router for the engine-backed dashboard.
///
/// Any request without a more specific route renders the listing page,
/// including a method other than POST on an action path.
pub fn live_router(state: AppState, assets_dir: Option<&Path>) -> Router {
    Router::new()
        .route(
            "/containers/:id/:action",
            post(container_action).fallback(listing),
        )
        .merge(assets::routes(assets_dir, listing))
        .fallback(listing)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Router for the stub variant: the page shell and assets, no engine.
pub fn stub_router(assets_dir: Option<&Path>) -> Router {
    Router::new()
        .merge(assets::routes(assets_dir, stub_page))
        .fallback(stub_page)
        .layer(TraceLayer::new_for_http())
}

async fn listing(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let records = with_deadline(state.deadline, state.engine.list(true))
        .await
        .inspect_err(|e| warn!("Failed to list containers: {e}"))?;

    let mut page = PageData::from_records(records);

    // The page is still useful without host details.
    match with_deadline(state.deadline, state.engine.info()).await {
        Ok(snapshot) => page = page.with_engine(EngineInfo::from(snapshot)),
        Err(e) => debug!("Engine info unavailable: {e}"),
    }

    render(page, true)
}

async fn stub_page() -> Result<Html<String>, AppError> {
    render(PageData::default(), false)
}

fn render(page: PageData, live: bool) -> Result<Html<String>, AppError> {
    let html = IndexTemplate { page, live }.render()?;
    Ok(Html(html))
}

async fn container_action(
    State(state): State<AppState>,
    UrlPath((id, action)): UrlPath<(String, String)>,
) -> Result<StatusCode, AppError> {
    let action = action
        .parse::<Action>()
        .inspect_err(|e| warn!(container = %id, verb = %e.0, "Rejected action"))?;

    with_deadline(state.deadline, action.apply(state.engine.as_ref(), &id))
        .await
        .inspect_err(|e| warn!(container = %id, %action, "Action failed: {e}"))?;

    info!(container = %id, %action, "Container action applied");
    Ok(StatusCode::NO_CONTENT)
}
