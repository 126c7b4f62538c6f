use std::{fs, path::Path, time::Duration};

use display_core::BackoffPolicy;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub navigation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000/ws".into(),
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            navigation: false,
        }
    }
}

impl Settings {
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms.max(1)),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    initial_backoff_ms: Option<u64>,
    max_backoff_ms: Option<u64>,
    navigation: Option<bool>,
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, path);
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    let file_cfg = match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable kiosk settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if let Some(v) = file_cfg.initial_backoff_ms {
        settings.initial_backoff_ms = v;
    }
    if let Some(v) = file_cfg.max_backoff_ms {
        settings.max_backoff_ms = v;
    }
    if let Some(v) = file_cfg.navigation {
        settings.navigation = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = var("APP__INITIAL_BACKOFF_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.initial_backoff_ms = parsed;
        }
    }
    if let Some(v) = var("APP__MAX_BACKOFF_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.max_backoff_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
