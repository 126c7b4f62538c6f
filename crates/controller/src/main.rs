use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use shared::{
    error::ApiError,
    protocol::{ControllerEvent, ViewChange},
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod switch;

use config::load_settings;
use switch::ViewSwitcher;

struct AppState {
    switcher: ViewSwitcher,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let state = AppState {
        switcher: ViewSwitcher::new(settings.event_buffer),
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "controller listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("controller stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/views", post(http_switch_view))
        .route("/views/current", get(http_current_view))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn http_switch_view(
    State(state): State<Arc<AppState>>,
    Json(change): Json<ViewChange>,
) -> Result<Json<ControllerEvent>, (StatusCode, Json<ApiError>)> {
    let change = state.switcher.switch_view(&change).await.map_err(|e| {
        warn!(requested = %change.view, error = %e, "controller: rejected view change");
        (StatusCode::BAD_REQUEST, Json(ApiError::from(e)))
    })?;
    Ok(Json(ControllerEvent::ViewChange(change)))
}

async fn http_current_view(State(state): State<Arc<AppState>>) -> Json<ControllerEvent> {
    Json(ControllerEvent::ViewChange(state.switcher.current().await))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.switcher.subscribe();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ControllerEvent>();

    // New displays start from whatever is currently shown.
    let _ = reply_tx.send(ControllerEvent::ViewChange(state.switcher.current().await));
    info!("controller: display connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                Some(event) = reply_rx.recv() => event,
                received = events_rx.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "controller: display lagged behind; dropping stale events");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        if let Message::Text(text) = message {
            if let Some(reply) = state.switcher.handle_frame(&text).await {
                let _ = reply_tx.send(reply);
            }
        }
    }

    send_task.abort();
    info!("controller: display disconnected");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
