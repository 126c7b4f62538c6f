use std::{
    future::Future,
    io::{self, Write as _},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use display_core::{
    connection::endpoint_from_str, ConnectionManager, ConnectionStatus, ViewRouter,
};
use shared::{
    domain::{ViewKind, ViewState},
    protocol::{ControllerRequest, ERROR_EVENT},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod display;

const CLOCK_REFRESH: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(about = "Wall display that follows view changes pushed by the controller")]
struct Args {
    /// Controller WebSocket endpoint, e.g. ws://127.0.0.1:8000/ws
    #[arg(long, env = "KIOSK_ENDPOINT")]
    endpoint: Option<String>,
    #[arg(long, default_value = "kiosk.toml")]
    config: PathBuf,
    /// Read view names from stdin and navigate locally.
    #[arg(long)]
    navigation: bool,
    #[arg(long)]
    initial_backoff_ms: Option<u64>,
    #[arg(long)]
    max_backoff_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config);
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(ms) = args.initial_backoff_ms {
        settings.initial_backoff_ms = ms;
    }
    if let Some(ms) = args.max_backoff_ms {
        settings.max_backoff_ms = ms;
    }
    settings.navigation |= args.navigation;

    let endpoint = endpoint_from_str(&settings.endpoint)
        .with_context(|| format!("bad controller endpoint '{}'", settings.endpoint))?;
    info!(%endpoint, navigation = settings.navigation, "kiosk starting");

    let router = Arc::new(ViewRouter::new());
    let connection = ConnectionManager::new(endpoint, settings.backoff());
    router.bind(&connection).await;
    connection
        .on_message(ERROR_EVENT, |frame| {
            warn!(%frame, "kiosk: controller reported an error");
        })
        .await;
    connection.connect().await;

    let result = run_display(
        &router,
        &connection,
        settings.navigation,
        tokio::signal::ctrl_c(),
    )
    .await;
    connection.disconnect().await;
    result
}

async fn run_display(
    router: &ViewRouter,
    connection: &ConnectionManager,
    navigation: bool,
    shutdown: impl Future<Output = io::Result<()>>,
) -> Result<()> {
    let mut views = router.subscribe();
    let mut status = connection.subscribe_status();
    let mut commands = navigation.then(|| BufReader::new(tokio::io::stdin()).lines());
    let mut clock = tokio::time::interval(CLOCK_REFRESH);
    // Polled across iterations so a signal raised mid-redraw is not lost.
    tokio::pin!(shutdown);

    loop {
        draw(&mut views, &mut status)?;
        tokio::select! {
            _ = &mut shutdown => {
                info!("kiosk: shutting down");
                return Ok(());
            }
            changed = views.changed() => changed.context("view router dropped")?,
            changed = status.changed() => changed.context("connection status dropped")?,
            _ = clock.tick() => {}
            line = next_command(&mut commands) => match line? {
                Some(line) => handle_command(router, connection, &line).await,
                None => {
                    info!("kiosk: navigation input closed");
                    commands = None;
                }
            },
        }
    }
}

fn draw(
    views: &mut watch::Receiver<ViewState>,
    status: &mut watch::Receiver<ConnectionStatus>,
) -> Result<()> {
    let state = views.borrow_and_update().clone();
    let status = *status.borrow_and_update();
    let screen = display::compose(&state, status, Local::now().naive_local());

    let mut out = io::stdout().lock();
    write!(out, "\x1b[2J\x1b[H{screen}")?;
    out.flush()?;
    Ok(())
}

async fn next_command(commands: &mut Option<Lines<BufReader<Stdin>>>) -> io::Result<Option<String>> {
    match commands {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}

async fn handle_command(router: &ViewRouter, connection: &ConnectionManager, line: &str) {
    let requested = line.trim();
    if requested.is_empty() {
        return;
    }
    let view = match requested.parse::<ViewKind>() {
        Ok(view) => view,
        Err(error) => {
            warn!(%error, "kiosk: ignoring navigation input");
            return;
        }
    };

    router.navigate(view);
    if let Err(error) = connection
        .send(&ControllerRequest::Navigate { view })
        .await
    {
        warn!(%view, %error, "kiosk: navigation not forwarded to controller");
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
