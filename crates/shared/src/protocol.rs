use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{ViewKind, ViewState},
    error::{ApiError, ViewError},
};

pub const VIEW_CHANGE_EVENT: &str = "VIEW_CHANGE";
pub const NAVIGATE_EVENT: &str = "message";
pub const ERROR_EVENT: &str = "ERROR";

/// A view change as it travels on the wire. `view` stays a raw string so an
/// unknown identifier can be reported rather than failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewChange {
    pub view: String,
    #[serde(default)]
    pub data: Value,
}

impl ViewChange {
    pub fn new(view: impl Into<String>, data: Value) -> Self {
        Self {
            view: view.into(),
            data,
        }
    }

    pub fn from_state(state: &ViewState) -> Self {
        let data = match state {
            ViewState::Home => None,
            ViewState::Workout(data) => data.as_ref().map(serde_json::to_value),
            ViewState::Transport(data) => data.as_ref().map(serde_json::to_value),
            ViewState::Weather(data) => data.as_ref().map(serde_json::to_value),
        };
        let data = match data {
            Some(Ok(value)) => value,
            _ => Value::Object(Map::new()),
        };
        Self::new(state.kind().as_str(), data)
    }

    pub fn kind(&self) -> Result<ViewKind, ViewError> {
        self.view.parse()
    }

    /// Checks the view identifier and the payload shape. Empty data (`{}`,
    /// `null` or absent) is accepted for every view; home ignores its data.
    pub fn to_state(&self) -> Result<ViewState, ViewError> {
        let view = self.kind()?;
        let fields = match &self.data {
            Value::Null => return Ok(ViewState::empty(view)),
            Value::Object(fields) if fields.is_empty() => return Ok(ViewState::empty(view)),
            Value::Object(fields) => fields,
            other => {
                return Err(ViewError::PayloadNotObject {
                    view,
                    found: json_type_name(other),
                })
            }
        };

        Ok(match view {
            ViewKind::Home => ViewState::Home,
            ViewKind::Workout => ViewState::Workout(Some(decode_payload(view, fields)?)),
            ViewKind::Transport => ViewState::Transport(Some(decode_payload(view, fields)?)),
            ViewKind::Weather => ViewState::Weather(Some(decode_payload(view, fields)?)),
        })
    }
}

fn decode_payload<T: DeserializeOwned>(
    view: ViewKind,
    fields: &Map<String, Value>,
) -> Result<T, ViewError> {
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|source| ViewError::PayloadMismatch { view, source })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Frames pushed from the controller to displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerEvent {
    #[serde(rename = "VIEW_CHANGE")]
    ViewChange(ViewChange),
    #[serde(rename = "ERROR")]
    Error(ApiError),
}

/// Frames sent to the controller, either by a display (navigation) or by
/// an assistant that drives the displays over the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerRequest {
    #[serde(rename = "message")]
    Navigate { view: ViewKind },
    #[serde(rename = "VIEW_CHANGE")]
    ViewChange(ViewChange),
}

/// The `type` tag of a raw frame.
pub fn event_name(frame: &Value) -> Option<&str> {
    frame.get("type")?.as_str()
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
