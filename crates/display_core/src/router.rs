use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::{ViewKind, ViewState},
    error::ViewError,
    protocol::{ViewChange, VIEW_CHANGE_EVENT},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;

/// Single owner of the on-screen state. Every accepted event replaces the
/// state wholesale; readers only ever see the latest snapshot.
pub struct ViewRouter {
    state: watch::Sender<ViewState>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::Home);
        Self { state }
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn current_view(&self) -> ViewKind {
        self.state.borrow().kind()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Validates `change` and replaces the state with it. On error the
    /// previous state stays in place. Returns whether the state changed.
    pub fn apply(&self, change: &ViewChange) -> Result<bool, ViewError> {
        match change.to_state() {
            Ok(next) => Ok(self.replace(next)),
            Err(err) => {
                warn!(
                    requested = %change.view,
                    current = %self.current_view(),
                    error = %err,
                    "router: rejected view change; keeping current view"
                );
                Err(err)
            }
        }
    }

    /// Local navigation: shows `kind` without a payload.
    pub fn navigate(&self, kind: ViewKind) -> bool {
        self.replace(ViewState::empty(kind))
    }

    /// Entry point for raw `VIEW_CHANGE` frames from the connection.
    pub fn handle_frame(&self, frame: &Value) {
        let change = match serde_json::from_value::<ViewChange>(frame.clone()) {
            Ok(change) => change,
            Err(err) => {
                warn!(error = %err, "router: malformed view change frame");
                return;
            }
        };
        let _ = self.apply(&change);
    }

    pub async fn bind(self: &Arc<Self>, connection: &ConnectionManager) {
        let router = Arc::clone(self);
        connection
            .on_message(VIEW_CHANGE_EVENT, move |frame| router.handle_frame(frame))
            .await;
    }

    fn replace(&self, next: ViewState) -> bool {
        let kind = next.kind();
        let has_payload = next.has_payload();
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });

        if changed {
            info!(view = %kind, has_payload, "router: view changed");
        } else {
            debug!(view = %kind, "router: view unchanged");
        }
        changed
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
