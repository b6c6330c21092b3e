pub mod handlers;

use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use axum::{
    Router,
    extract::{ConnectInfo, FromRef},
    http::{Method, Request, StatusCode, header},
    middleware,
};
use ogimg_core::config::Config;
use ogimg_images::OgRenderer;
use tower::ServiceBuilder;
use tower_http::{
    ServiceBuilderExt,
    cors::{self, CorsLayer},
    normalize_path::NormalizePathLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, MakeSpan, TraceLayer},
};
use tracing::{Level, Span};

use crate::handlers::{build_router, csp::csp_middleware};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<Config>,
    pub renderer: Arc<OgRenderer>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let renderer = OgRenderer::new(&config.render)?;
        Ok(Self { config: Arc::new(config), renderer: Arc::new(renderer) })
    }
}

pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(RequestSpan)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(30)))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(CorsLayer::new().allow_methods([Method::GET]).allow_origin(cors::Any))
        .layer(middleware::from_fn(csp_middleware))
        .compression();
    build_router().with_state(state).layer(middleware)
}

/// Request span with the client address and user agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("[unknown]");
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            ip = %client_ip(request),
            user_agent = %user_agent,
        )
    }
}

/// Client address, preferring `CF-Connecting-IP` over the socket peer.
fn client_ip<B>(request: &Request<B>) -> IpAddr {
    let ip = if let Some(v) = request.headers().get("CF-Connecting-IP") {
        v.to_str().ok().and_then(|s| IpAddr::from_str(s.trim()).ok())
    } else {
        request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip())
    };
    ip.unwrap_or(IpAddr::from([0, 0, 0, 0]))
}
