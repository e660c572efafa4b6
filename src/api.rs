use axum::{http::header, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub async fn ping() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "pong")
}

pub fn create_router() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server on {}", addr);
    Ok(listener)
}

/// Serves `/ping` until the process dies. Losing the liveness port is fatal.
pub async fn start_server(listener: TcpListener) {
    if let Err(e) = axum::serve(listener, create_router()).await {
        error!("Health server stopped: {}", e);
        std::process::exit(1);
    }
}
