//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the routing handler and middleware
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve page records on the configured page data path
//! - Translate each routing decision into a response or an upstream rewrite
//! - Swap in new routing state when the configuration is reloaded
//!
//! # Design Decisions
//! - Page data path, upstream and renderer are read per request so reloads apply
//! - Listener, request timeout and observability changes need a restart
//! - A rewrite that cannot be forwarded falls back to pass-through

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::{CmsConfig, UpstreamConfig};
use crate::content::page::{get_standalone, PageQuery};
use crate::engine::Engine;
use crate::error::{PageError, RouterError};
use crate::http::forward::Forwarder;
use crate::http::request::request_id;
use crate::http::response::{redirect_response, renderer_target, request_base_url, resolve_destination};
use crate::routing::router::RoutingDecision;

/// Settings that only take effect after a restart.
const RESTART_FIELDS: &[&str] = &[
    "listener.bind_address",
    "timeouts.request_secs",
    "observability.log_level",
    "observability.json_logs",
    "observability.metrics_enabled",
    "observability.metrics_address",
];

/// Everything a request needs, rebuilt from each configuration.
pub struct RoutingState {
    pub engine: Engine,
    pub forwarder: Forwarder,
    pub upstream: UpstreamConfig,
}

impl RoutingState {
    pub fn from_config(config: &CmsConfig) -> Result<Self, RouterError> {
        let app = Url::parse(&config.upstream.app_url).map_err(|source| RouterError::InvalidContentUrl {
            url: config.upstream.app_url.clone(),
            source,
        })?;

        Ok(Self {
            engine: Engine::from_config(config)?,
            forwarder: Forwarder::new(app),
            upstream: config.upstream.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<ArcSwap<RoutingState>>,
}

/// HTTP front end for the routing engine.
pub struct HttpServer {
    router: Router,
    config: CmsConfig,
    routing: Arc<ArcSwap<RoutingState>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given (validated) configuration.
    pub fn new(config: CmsConfig) -> Result<Self, RouterError> {
        let routing = Arc::new(ArcSwap::from_pointee(RoutingState::from_config(&config)?));
        let state = AppState {
            routing: routing.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config, routing })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &CmsConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .fallback(route_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires, applying config updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<CmsConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(
            self.routing.clone(),
            self.config.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Rebuild the routing state for every reloaded configuration.
async fn apply_config_updates(
    routing: Arc<ArcSwap<RoutingState>>,
    mut current: CmsConfig,
    mut updates: mpsc::UnboundedReceiver<CmsConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { break };
                let changed = current.changed_fields(&config);

                let pending: Vec<&str> = changed
                    .iter()
                    .copied()
                    .filter(|field| RESTART_FIELDS.contains(field))
                    .collect();
                if !pending.is_empty() {
                    tracing::warn!(fields = ?pending, "Changed settings take effect after a restart");
                }

                match RoutingState::from_config(&config) {
                    Ok(state) => {
                        routing.store(Arc::new(state));
                        tracing::info!(changed = ?changed, "Routing engine reloaded");
                        current = config;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reloaded config rejected, keeping current engine");
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

/// Serves the page record for the rendering handler as JSON.
async fn page_response(routing: &RoutingState, uri: &Uri) -> Response {
    let query = match Query::<PageQuery>::try_from_uri(uri) {
        Ok(Query(query)) => query,
        Err(rejection) => return rejection.into_response(),
    };

    match get_standalone(&routing.engine.router, &routing.engine.validator, &query).await {
        Ok(page) => Json(page).into_response(),
        Err(PageError::NotFound) => (StatusCode::NOT_FOUND, "Page not found").into_response(),
    }
}

/// Routes every request: page data, content rewrite, redirect, or pass-through.
async fn route_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let routing = state.routing.load_full();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    if request.method() == Method::GET && path == routing.upstream.page_data_path {
        return page_response(&routing, request.uri()).await;
    }

    let decision = routing.engine.router.route(&path).await;
    tracing::debug!(
        request_id = %request_id(request.headers()),
        path = %path,
        decision = decision.kind(),
        "Request routed"
    );

    let target = match decision {
        RoutingDecision::RewriteToRenderer(original) => {
            renderer_target(&routing.upstream.renderer_path, &original, query.as_deref())
        }
        RoutingDecision::Redirect(redirect) => {
            let base = request_base_url(request.headers(), request.uri());
            let destination = resolve_destination(&redirect.url, base.as_ref());
            match redirect.disposal.status_code().and_then(|code| StatusCode::from_u16(code).ok()) {
                Some(status) => {
                    if let Some(response) = redirect_response(status, &destination) {
                        return response;
                    }
                    original_target(&path, query.as_deref())
                }
                None => internal_target(&redirect.url, &destination),
            }
        }
        RoutingDecision::PassThrough => original_target(&path, query.as_deref()),
    };

    let forwarder = &routing.forwarder;
    let uri = forwarder.target_uri(&target).or_else(|| {
        tracing::warn!(
            request_id = %request_id(request.headers()),
            target = %target,
            "Rewrite target cannot be forwarded, passing request through"
        );
        forwarder.target_uri(&original_target(&path, query.as_deref()))
    });

    match uri {
        Some(uri) => forwarder.forward(request, uri).await,
        None => (StatusCode::BAD_REQUEST, "Invalid request target").into_response(),
    }
}

fn original_target(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}

/// PASSTHRU rewrites stay on the application unless the rule names another origin.
fn internal_target(rule_url: &str, resolved: &str) -> String {
    if Url::parse(rule_url).is_ok() {
        return resolved.to_string();
    }
    match Url::parse(resolved) {
        Ok(url) => original_target(url.path(), url.query()),
        Err(_) => rule_url.to_string(),
    }
}
