use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use ogimg_core::config::Config;
use ogimg_web::{AppState, app};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::builder()
        // Default to info level
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config = Config::load("config.yml").expect("Failed to load config");
    let port = config.server.port;
    match &config.server.base_url {
        Some(url) => tracing::info!("Base URL: {}", url),
        None => tracing::info!("Base URL: derived from requests"),
    }
    let state = AppState::new(config).expect("Failed to create renderer");
    let router = app(state).into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    tracing::info!("Web server: Listening on {}", addr);
    let listener = TcpListener::bind(addr).await.expect("bind error");
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error");
    if let Err(e) = result {
        tracing::error!("{e:?}");
    }
    tracing::info!("Shut down gracefully");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let Ok(mut sigterm) = signal::unix::signal(signal::unix::SignalKind::terminate()) else {
            tracing::warn!("Failed to install SIGTERM handler");
            let _ = signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
