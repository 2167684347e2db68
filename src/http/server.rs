//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all gateway handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run the gate for every request and act on its decision
//! - Forward admitted requests to the upstream application
//! - Spawn the rate-limit sweeper and config-reload tasks
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::uri::{Authority, PathAndQuery, Scheme},
    http::{HeaderValue, Request, StatusCode, Uri},
    response::Response,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::gate::{GateDecision, GatePolicy, Gatekeeper};
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::security::headers::apply_security_headers;
use crate::security::rate_limit::{self, RateLimiter};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<Gatekeeper>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    gate: Arc<Gatekeeper>,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new());
        let gate = Arc::new(Gatekeeper::from_config(&config, limiter.clone()));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let upstream: Authority = config
            .upstream
            .address
            .parse()
            .unwrap_or_else(|_| Authority::from_static("127.0.0.1:3000"));

        let state = AppState {
            gate: gate.clone(),
            client,
            upstream,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            gate,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Owns the background tasks for the request lifetime of the process:
    /// the rate-limit sweeper and the config-reload listener. Both stop on
    /// the shutdown signal, as does the server itself.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        rate_limit::spawn_sweeper(
            self.limiter.clone(),
            Duration::from_millis(self.config.rate_limit.window_ms),
            shutdown.resubscribe(),
        );

        let gate = self.gate.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(new_config) => {
                            gate.reload(GatePolicy::from_config(&new_config));
                            tracing::info!("Gate policy reloaded");
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main gateway handler.
///
/// Runs the gate; forwards on admit, renders the rejection otherwise. The
/// protective headers go on every response either way.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let client_id = rate_limit::client_id(request.headers(), Some(addr));

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        client = %client_id,
        "Gating request"
    );

    let mut response = match state.gate.handle(request, &client_id).await {
        GateDecision::Forward(admitted) => {
            forward_upstream(&state, admitted, &request_id).await
        }
        GateDecision::Reject(rejection) => {
            metrics::record_rejected(rejection.kind.label());
            response::rejection_response(&rejection)
        }
    };

    apply_security_headers(response.headers_mut());
    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

/// Forward an admitted request to the upstream application.
async fn forward_upstream(state: &AppState, request: Request<Body>, request_id: &str) -> Response {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    match Uri::from_parts(uri_parts) {
        Ok(uri) => parts.uri = uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            return response::error_response(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    }

    if let Ok(value) = HeaderValue::from_str(request_id) {
        parts.headers.insert(X_REQUEST_ID, value);
    }

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(upstream_response) => {
            let (parts, body) = upstream_response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            response::error_response(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
    }
}
