use super::*;
use crate::domain::{TransportData, WeatherCondition, WeatherData, WorkoutData};
use crate::error::ErrorCode;
use serde_json::json;

#[test]
fn every_view_accepts_empty_data() {
    for kind in ViewKind::ALL {
        let empty_object = ViewChange::new(kind.as_str(), json!({}));
        assert_eq!(
            empty_object.to_state().expect("empty object"),
            ViewState::empty(kind)
        );

        let null = ViewChange::new(kind.as_str(), Value::Null);
        assert_eq!(null.to_state().expect("null data"), ViewState::empty(kind));
    }
}

#[test]
fn missing_data_field_decodes_as_null() {
    let change: ViewChange = serde_json::from_str(r#"{"view":"transport"}"#).expect("json");
    assert_eq!(change.data, Value::Null);
    assert_eq!(
        change.to_state().expect("state"),
        ViewState::Transport(None)
    );
}

#[test]
fn workout_payload_decodes_with_optional_fields() {
    let change = ViewChange::new(
        "workout",
        json!({"type": "Running", "duration": 1800, "calories": 320, "heartRate": 142}),
    );
    let state = change.to_state().expect("state");
    assert_eq!(
        state,
        ViewState::Workout(Some(WorkoutData {
            kind: "Running".into(),
            duration: 1800,
            calories: 320,
            steps: None,
            heart_rate: Some(142),
        }))
    );
}

#[test]
fn unknown_view_is_rejected() {
    let err = ViewChange::new("unknown", json!({}))
        .to_state()
        .expect_err("must reject");
    assert!(matches!(err, ViewError::UnknownView(ref view) if view == "unknown"));
}

#[test]
fn view_identifiers_are_case_sensitive() {
    assert!("Weather".parse::<ViewKind>().is_err());
    assert_eq!("weather".parse::<ViewKind>().expect("kind"), ViewKind::Weather);
}

#[test]
fn workout_shaped_payload_for_weather_is_a_mismatch() {
    let err = ViewChange::new(
        "weather",
        json!({"type": "Running", "duration": 1800, "calories": 320}),
    )
    .to_state()
    .expect_err("must reject");
    assert!(matches!(
        err,
        ViewError::PayloadMismatch {
            view: ViewKind::Weather,
            ..
        }
    ));
}

#[test]
fn negative_counters_are_a_mismatch() {
    let err = ViewChange::new(
        "workout",
        json!({"type": "Cycling", "duration": -5, "calories": 10}),
    )
    .to_state()
    .expect_err("must reject");
    assert!(matches!(err, ViewError::PayloadMismatch { .. }));
}

#[test]
fn non_object_payload_is_rejected() {
    let err = ViewChange::new("transport", json!("route 42"))
        .to_state()
        .expect_err("must reject");
    assert!(matches!(
        err,
        ViewError::PayloadNotObject {
            view: ViewKind::Transport,
            found: "string"
        }
    ));
}

#[test]
fn home_ignores_its_data() {
    let change = ViewChange::new("home", json!({"greeting": "hi"}));
    assert_eq!(change.to_state().expect("state"), ViewState::Home);
}

#[test]
fn from_state_emits_camel_case_fields() {
    let state = ViewState::Transport(Some(TransportData {
        route: "42".into(),
        next_arrival: "08:15".into(),
        status: "on time".into(),
    }));
    let change = ViewChange::from_state(&state);
    assert_eq!(change.view, "transport");
    assert_eq!(
        change.data,
        json!({"route": "42", "nextArrival": "08:15", "status": "on time"})
    );
    assert_eq!(change.to_state().expect("state"), state);
}

#[test]
fn from_state_uses_empty_object_without_payload() {
    let change = ViewChange::from_state(&ViewState::Weather(None));
    assert_eq!(change.data, json!({}));
}

#[test]
fn view_change_event_uses_type_tag_on_the_wire() {
    let event = ControllerEvent::ViewChange(ViewChange::new(
        "weather",
        json!({"temperature": 22, "condition": "sunny"}),
    ));
    let wire = serde_json::to_value(&event).expect("json");
    assert_eq!(
        wire,
        json!({
            "type": "VIEW_CHANGE",
            "view": "weather",
            "data": {"temperature": 22, "condition": "sunny"}
        })
    );
    assert_eq!(event_name(&wire), Some(VIEW_CHANGE_EVENT));
}

#[test]
fn error_event_flattens_api_error() {
    let event = ControllerEvent::Error(ApiError::new(ErrorCode::Validation, "bad view"));
    let wire = serde_json::to_value(&event).expect("json");
    assert_eq!(
        wire,
        json!({"type": "ERROR", "code": "validation", "message": "bad view"})
    );
}

#[test]
fn navigate_request_matches_outbound_message_shape() {
    let request = ControllerRequest::Navigate {
        view: ViewKind::Weather,
    };
    let wire = serde_json::to_value(&request).expect("json");
    assert_eq!(wire, json!({"type": "message", "view": "weather"}));
    assert_eq!(event_name(&wire), Some(NAVIGATE_EVENT));
}

#[test]
fn assistant_frame_decodes_as_view_change_request() {
    let raw = r#"{"type":"VIEW_CHANGE","view":"weather","data":{"temperature":22,"condition":"sunny"}}"#;
    let request: ControllerRequest = serde_json::from_str(raw).expect("json");
    let ControllerRequest::ViewChange(change) = request else {
        panic!("expected view change");
    };
    let ViewState::Weather(Some(weather)) = change.to_state().expect("state") else {
        panic!("expected weather");
    };
    assert_eq!(
        weather,
        WeatherData {
            temperature: 22.0,
            condition: "sunny".into()
        }
    );
    assert_eq!(weather.condition_kind(), WeatherCondition::Sunny);
}

#[test]
fn open_condition_vocabulary_falls_back_to_other() {
    assert_eq!(WeatherCondition::parse(" Rainy "), WeatherCondition::Rainy);
    assert_eq!(WeatherCondition::parse("haze"), WeatherCondition::Other);
}
