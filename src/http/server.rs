//! HTTP server setup and request forwarding.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing)
//! - Match the request path against the rule table
//! - Forward matched requests to the rule's backend origin
//! - Serve the front end build (or 404) for everything else
//! - Turn upstream failures into the proxy error response

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        header::HOST,
        uri::PathAndQuery,
        HeaderValue, Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::BridgeConfig;
use crate::http::request::RequestId;
use crate::http::response::ProxyError;
use crate::observability::metrics;
use crate::routing::{ProxyRule, RoutingError, RuleTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<RuleTable>,
    pub client: Client<HttpConnector, Body>,
    pub static_files: Option<ServeDir<ServeFile>>,
}

/// The development request proxy.
pub struct DevProxy {
    router: Router,
    rules: Arc<RuleTable>,
}

impl DevProxy {
    /// Create a new proxy with the given configuration.
    pub fn new(config: BridgeConfig) -> Result<Self, RoutingError> {
        let rules = Arc::new(RuleTable::from_config(&config.rules)?);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let static_files = config.static_dir.as_ref().map(|dir| {
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
        });

        let state = AppState {
            rules: rules.clone(),
            client,
            static_files,
        };

        let router = Self::build_router(state);
        Ok(Self { router, rules })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// A handle to the router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Dev proxy listening");
        for rule in self.rules.rules() {
            tracing::info!(prefix = %rule.prefix(), target = %rule.target(), "Forwarding rule");
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Dev proxy stopped");
        Ok(())
    }
}

/// Catch-all handler.
/// Looks up the rule for the path and forwards, or falls back to static files.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = RequestId::from_headers(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(rule) = state.rules.match_path(&path).cloned() else {
        return match state.static_files {
            Some(files) => serve_static(files, request).await,
            None => {
                tracing::debug!(request_id = %request_id, path = %path, "No rule matched");
                (StatusCode::NOT_FOUND, "No matching route found").into_response()
            }
        };
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        target = %rule.target(),
        "Proxying request"
    );

    let response = match forward(&state.client, &rule, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Proxy error"
            );
            e.into_response()
        }
    };

    metrics::record_request(rule.prefix(), response.status().as_u16(), start_time);
    response
}

/// Send `request` to the rule's origin. Only the scheme, authority and
/// `Host` header change; the response streams back untouched.
async fn forward(
    client: &Client<HttpConnector, Body>,
    rule: &ProxyRule,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.scheme = Some(rule.scheme().clone());
    uri_parts.authority = Some(rule.authority().clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = Uri::from_parts(uri_parts)?;

    parts
        .headers
        .insert(HOST, HeaderValue::from_str(rule.authority().as_str())?);
    // The upstream connection is HTTP/1.1 regardless of how the caller connected.
    parts.version = Version::HTTP_11;

    let upstream = Request::from_parts(parts, body);
    let response = client
        .request(upstream)
        .await
        .map_err(|source| ProxyError::Upstream {
            target: rule.target(),
            source,
        })?;

    Ok(response.map(Body::new))
}

async fn serve_static(files: ServeDir<ServeFile>, request: Request<Body>) -> Response {
    match files.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
