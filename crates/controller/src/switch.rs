use std::collections::HashMap;

use shared::{
    domain::{ViewKind, ViewState},
    error::{ApiError, ErrorCode, ViewError},
    protocol::{ControllerEvent, ControllerRequest, ViewChange},
};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

#[derive(Default)]
struct SwitcherState {
    current: ViewState,
    last_payloads: HashMap<ViewKind, ViewState>,
}

/// Decides what every connected display shows and fans each decision out
/// to them.
pub struct ViewSwitcher {
    inner: RwLock<SwitcherState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ViewSwitcher {
    pub fn new(buffer: usize) -> Self {
        let (events, _) = broadcast::channel(buffer);
        Self {
            inner: RwLock::new(SwitcherState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn current(&self) -> ViewChange {
        ViewChange::from_state(&self.inner.read().await.current)
    }

    /// Validates `change`, makes it current and broadcasts the canonical form.
    pub async fn switch_view(&self, change: &ViewChange) -> Result<ViewChange, ViewError> {
        let state = change.to_state()?;
        Ok(self.publish(state).await)
    }

    /// Shows `view` with the payload it last carried, if any.
    pub async fn navigate(&self, view: ViewKind) -> ViewChange {
        let mut guard = self.inner.write().await;
        let state = guard
            .last_payloads
            .get(&view)
            .cloned()
            .unwrap_or_else(|| ViewState::empty(view));
        self.publish_locked(&mut guard, state)
    }

    /// Handles a text frame received on a display socket. Returns an error
    /// event to send back to that socket only.
    pub async fn handle_frame(&self, text: &str) -> Option<ControllerEvent> {
        match serde_json::from_str::<ControllerRequest>(text) {
            Ok(ControllerRequest::ViewChange(change)) => match self.switch_view(&change).await {
                Ok(_) => None,
                Err(err) => {
                    warn!(requested = %change.view, error = %err, "controller: rejected view change");
                    Some(ControllerEvent::Error(err.into()))
                }
            },
            Ok(ControllerRequest::Navigate { view }) => {
                self.navigate(view).await;
                None
            }
            Err(err) => {
                warn!(error = %err, "controller: unrecognised frame from display");
                Some(ControllerEvent::Error(ApiError::new(
                    ErrorCode::Malformed,
                    format!("unrecognised frame: {err}"),
                )))
            }
        }
    }

    async fn publish(&self, state: ViewState) -> ViewChange {
        let mut guard = self.inner.write().await;
        self.publish_locked(&mut guard, state)
    }

    /// Commits and broadcasts under one write guard so displays receive
    /// switches in the order they became current.
    fn publish_locked(&self, guard: &mut SwitcherState, state: ViewState) -> ViewChange {
        let view = state.kind();
        let change = ViewChange::from_state(&state);
        if state.has_payload() {
            guard.last_payloads.insert(view, state.clone());
        }
        guard.current = state;

        let displays = self
            .events
            .send(ControllerEvent::ViewChange(change.clone()))
            .unwrap_or(0);
        info!(%view, displays, "controller: view switched");
        change
    }
}

#[cfg(test)]
#[path = "tests/switch_tests.rs"]
mod tests;
