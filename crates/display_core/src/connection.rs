use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use shared::protocol::{event_name, ControllerRequest};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot, watch, Mutex, RwLock},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::{backoff::BackoffPolicy, error::ConnectionError};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub type MessageHandler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// `connect` has not been called yet.
    Idle,
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
        retry_in: Duration,
    },
    Closed,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// Accepts `ws`/`wss` as-is and maps `http`/`https` onto them.
pub fn endpoint_from_str(raw: &str) -> Result<Url, ConnectionError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConnectionError::InvalidEndpoint {
        endpoint: raw.to_string(),
        source,
    })?;
    let scheme = match url.scheme() {
        "ws" | "wss" => return Ok(url),
        "http" => "ws",
        "https" => "wss",
        other => return Err(ConnectionError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| ConnectionError::UnsupportedScheme(url.scheme().to_string()))?;
    Ok(url)
}

struct Shared {
    handlers: RwLock<HashMap<String, Vec<MessageHandler>>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    status: watch::Sender<ConnectionStatus>,
}

impl Shared {
    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    async fn dispatch(&self, text: &str) {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "display: ignoring malformed frame");
                return;
            }
        };
        let Some(name) = event_name(&frame) else {
            warn!("display: ignoring frame without a type tag");
            return;
        };

        let handlers = self.handlers.read().await;
        match handlers.get(name) {
            Some(registered) => {
                for handler in registered {
                    handler(&frame);
                }
            }
            None => debug!(event = name, "display: no handler registered for event"),
        }
    }
}

struct ActiveTask {
    handle: JoinHandle<()>,
    shutdown: oneshot::Sender<()>,
}

enum SessionEnd {
    Shutdown,
    Dropped(String),
}

/// Owns the single connection from the display to its controller. The
/// connection task retries forever with backoff until `disconnect`.
pub struct ConnectionManager {
    endpoint: Url,
    backoff: BackoffPolicy,
    shared: Arc<Shared>,
    task: Mutex<Option<ActiveTask>>,
}

impl ConnectionManager {
    pub fn new(endpoint: Url, backoff: BackoffPolicy) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Idle);
        Self {
            endpoint,
            backoff,
            shared: Arc::new(Shared {
                handlers: RwLock::new(HashMap::new()),
                outbound: Mutex::new(None),
                status,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Registers `handler` for frames whose `type` tag equals `event`. The
    /// handler receives the whole frame.
    pub async fn on_message<F>(&self, event: &str, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared
            .handlers
            .write()
            .await
            .entry(event.to_string())
            .or_default()
            .push(Arc::new(handler));
    }

    pub async fn connect(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|active| !active.handle.is_finished()) {
            debug!(endpoint = %self.endpoint, "display: connection task already running");
            return;
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_connection(
            Arc::clone(&self.shared),
            self.endpoint.clone(),
            self.backoff,
            shutdown_rx,
        ));
        *task = Some(ActiveTask {
            handle,
            shutdown: shutdown_tx,
        });
    }

    /// Fire-and-forget; nothing waits for the controller to acknowledge.
    pub async fn send(&self, request: &ControllerRequest) -> Result<(), ConnectionError> {
        let text = serde_json::to_string(request)?;
        let outbound = self.shared.outbound.lock().await;
        let sender = outbound.as_ref().ok_or(ConnectionError::NotConnected)?;
        sender
            .send(Message::Text(text))
            .map_err(|_| ConnectionError::NotConnected)
    }

    /// Closes the connection and stops reconnecting. Safe to call before
    /// `connect` and more than once.
    pub async fn disconnect(&self) {
        let Some(active) = self.task.lock().await.take() else {
            if self.status() != ConnectionStatus::Closed {
                self.shared.set_status(ConnectionStatus::Closed);
            }
            return;
        };

        let _ = active.shutdown.send(());
        let mut handle = active.handle;
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
            warn!(
                endpoint = %self.endpoint,
                "display: connection task did not stop in time; aborting"
            );
            handle.abort();
        }
        self.shared.outbound.lock().await.take();
        self.shared.set_status(ConnectionStatus::Closed);
        info!(endpoint = %self.endpoint, "display: disconnected from controller");
    }
}

async fn run_connection(
    shared: Arc<Shared>,
    endpoint: Url,
    backoff: BackoffPolicy,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut failures: u32 = 0;
    loop {
        shared.set_status(ConnectionStatus::Connecting);
        let connected = tokio::select! {
            _ = &mut shutdown => return,
            result = connect_async(endpoint.as_str()) => result,
        };

        match connected {
            Ok((stream, _)) => {
                failures = 0;
                info!(endpoint = %endpoint, "display: connected to controller");
                match serve_connection(&shared, stream, &mut shutdown).await {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Dropped(reason) => {
                        warn!(endpoint = %endpoint, reason = %reason, "display: connection dropped");
                    }
                }
            }
            Err(err) => {
                warn!(
                    endpoint = %endpoint,
                    error = %err,
                    attempt = failures + 1,
                    "display: failed to connect to controller"
                );
            }
        }

        failures = failures.saturating_add(1);
        let retry_in = backoff.delay_for(failures);
        shared.set_status(ConnectionStatus::Reconnecting {
            attempt: failures,
            retry_in,
        });
        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(retry_in) => {}
        }
    }
}

async fn serve_connection(
    shared: &Shared,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    shutdown: &mut oneshot::Receiver<()>,
) -> SessionEnd {
    let (mut writer, mut reader) = stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    *shared.outbound.lock().await = Some(outbound_tx);
    shared.set_status(ConnectionStatus::Connected);

    let end = loop {
        tokio::select! {
            _ = &mut *shutdown => {
                let _ = writer.send(Message::Close(None)).await;
                break SessionEnd::Shutdown;
            }
            Some(message) = outbound_rx.recv() => {
                if let Err(err) = writer.send(message).await {
                    break SessionEnd::Dropped(format!("send failed: {err}"));
                }
            }
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => shared.dispatch(&text).await,
                Some(Ok(Message::Close(_))) | None => {
                    break SessionEnd::Dropped("closed by controller".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => break SessionEnd::Dropped(format!("receive failed: {err}")),
            },
        }
    };

    shared.outbound.lock().await.take();
    end
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
