use super::*;
use display_core::BackoffPolicy;
use tokio::sync::oneshot;

const WAIT: Duration = Duration::from_secs(5);

fn offline_connection() -> ConnectionManager {
    let endpoint = endpoint_from_str("ws://127.0.0.1:9/ws").expect("endpoint");
    ConnectionManager::new(endpoint, BackoffPolicy::default())
}

#[tokio::test]
async fn shutdown_raised_before_the_loop_waits_is_honoured() {
    let router = ViewRouter::new();
    let connection = offline_connection();
    let (signal, received) = oneshot::channel::<()>();
    signal.send(()).expect("receiver alive");

    let shutdown = async move {
        received.await.map_err(io::Error::other)
    };
    tokio::time::timeout(WAIT, run_display(&router, &connection, false, shutdown))
        .await
        .expect("display loop stopped")
        .expect("clean exit");
}

#[tokio::test]
async fn shutdown_during_view_changes_stops_the_loop() {
    let router = ViewRouter::new();
    let connection = offline_connection();
    let (signal, received) = oneshot::channel::<()>();

    let display = run_display(&router, &connection, false, async move {
        received.await.map_err(io::Error::other)
    });
    let driver = async {
        for view in ViewKind::ALL.iter().cycle().take(12) {
            router.navigate(*view);
            tokio::task::yield_now().await;
        }
        signal.send(()).expect("receiver alive");
    };

    let (result, ()) = tokio::time::timeout(WAIT, async { tokio::join!(display, driver) })
        .await
        .expect("display loop stopped");
    result.expect("clean exit");
}

#[tokio::test]
async fn unknown_navigation_input_keeps_current_view() {
    let router = ViewRouter::new();
    let connection = offline_connection();

    handle_command(&router, &connection, "garage").await;
    assert_eq!(router.current_view(), ViewKind::Home);

    handle_command(&router, &connection, " weather \n").await;
    assert_eq!(router.snapshot(), ViewState::Weather(None));
}
