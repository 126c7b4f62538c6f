use super::*;
use serde_json::json;
use shared::domain::{WeatherData, WorkoutData};

fn running() -> ViewChange {
    ViewChange::new(
        "workout",
        json!({"type": "Running", "duration": 1800, "calories": 320}),
    )
}

#[test]
fn starts_on_home_without_payload() {
    let router = ViewRouter::new();
    assert_eq!(router.snapshot(), ViewState::Home);
    assert_eq!(router.current_view(), ViewKind::Home);
}

#[test]
fn every_view_with_empty_data_is_accepted() {
    let router = ViewRouter::new();
    for kind in ViewKind::ALL {
        router
            .apply(&ViewChange::new(kind.as_str(), json!({})))
            .expect("empty data");
        assert_eq!(router.current_view(), kind);
    }
}

#[test]
fn repeating_an_event_is_idempotent() {
    let router = ViewRouter::new();
    assert!(router.apply(&running()).expect("first"));
    let after_first = router.snapshot();

    assert!(!router.apply(&running()).expect("second"));
    assert_eq!(router.snapshot(), after_first);
}

#[test]
fn last_write_wins_without_residue() {
    let router = ViewRouter::new();
    router
        .apply(&ViewChange::new(
            "weather",
            json!({"temperature": 18.5, "condition": "cloudy"}),
        ))
        .expect("weather");
    router.apply(&running()).expect("workout");

    assert_eq!(
        router.snapshot(),
        ViewState::Workout(Some(WorkoutData {
            kind: "Running".into(),
            duration: 1800,
            calories: 320,
            steps: None,
            heart_rate: None,
        }))
    );
}

#[test]
fn unknown_view_keeps_previous_state() {
    let router = ViewRouter::new();
    router.apply(&running()).expect("workout");
    let before = router.snapshot();

    let err = router
        .apply(&ViewChange::new("unknown", json!({})))
        .expect_err("must reject");
    assert!(matches!(err, ViewError::UnknownView(_)));
    assert_eq!(router.snapshot(), before);
}

#[test]
fn mismatched_payload_keeps_previous_state() {
    let router = ViewRouter::new();
    router
        .apply(&ViewChange::new(
            "weather",
            json!({"temperature": 22, "condition": "sunny"}),
        ))
        .expect("weather");

    router
        .apply(&ViewChange::new("transport", json!({"route": "42"})))
        .expect_err("missing fields");
    assert_eq!(
        router.snapshot(),
        ViewState::Weather(Some(WeatherData {
            temperature: 22.0,
            condition: "sunny".into(),
        }))
    );
}

#[test]
fn end_to_end_home_workout_home() {
    let router = ViewRouter::new();
    assert_eq!(router.snapshot(), ViewState::Home);

    router.apply(&running()).expect("workout");
    let ViewState::Workout(Some(workout)) = router.snapshot() else {
        panic!("expected workout payload");
    };
    assert_eq!(workout.kind, "Running");
    assert_eq!(workout.duration, 1800);
    assert_eq!(workout.calories, 320);

    router
        .apply(&ViewChange::new("home", json!({})))
        .expect("home");
    assert_eq!(router.snapshot(), ViewState::Home);
}

#[test]
fn local_navigation_replaces_payload_with_empty_view() {
    let router = ViewRouter::new();
    router.apply(&running()).expect("workout");

    assert!(router.navigate(ViewKind::Transport));
    assert_eq!(router.snapshot(), ViewState::Transport(None));
    assert!(!router.navigate(ViewKind::Transport));
}

#[test]
fn handle_frame_ignores_frames_without_view() {
    let router = ViewRouter::new();
    router.handle_frame(&json!({"type": "VIEW_CHANGE", "data": {}}));
    assert_eq!(router.snapshot(), ViewState::Home);

    router.handle_frame(&json!({"type": "VIEW_CHANGE", "view": "weather", "data": {}}));
    assert_eq!(router.snapshot(), ViewState::Weather(None));
}

#[tokio::test]
async fn subscribers_see_only_the_latest_state() {
    let router = ViewRouter::new();
    let mut rx = router.subscribe();

    router.apply(&ViewChange::new("weather", json!({}))).expect("weather");
    router.apply(&running()).expect("workout");

    rx.changed().await.expect("changed");
    assert_eq!(rx.borrow_and_update().kind(), ViewKind::Workout);
    assert!(!rx.has_changed().expect("sender alive"));
}

#[tokio::test]
async fn unchanged_state_does_not_notify_subscribers() {
    let router = ViewRouter::new();
    let rx = router.subscribe();

    router.apply(&ViewChange::new("home", json!({}))).expect("home");
    router.apply(&ViewChange::new("nope", json!({}))).expect_err("unknown");

    assert!(!rx.has_changed().expect("sender alive"));
}
