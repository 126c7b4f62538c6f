//! Text rendering of view snapshots. Missing payloads render as placeholders.

use std::fmt;

use chrono::NaiveDateTime;
use display_core::ConnectionStatus;
use shared::domain::{TransportData, ViewState, WeatherCondition, WeatherData, WorkoutData};

const PLACEHOLDER: &str = "--";
const DAILY_STEP_GOAL: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub banner: Option<String>,
    pub title: &'static str,
    pub lines: Vec<String>,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(banner) = &self.banner {
            writeln!(f, "[{banner}]")?;
            writeln!(f)?;
        }
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

pub fn compose(state: &ViewState, status: ConnectionStatus, now: NaiveDateTime) -> Screen {
    let (title, lines) = match state {
        ViewState::Home => ("Home", home_lines(now)),
        ViewState::Workout(data) => ("Workout", workout_lines(data.as_ref())),
        ViewState::Transport(data) => ("Transport", transport_lines(data.as_ref())),
        ViewState::Weather(data) => ("Weather", weather_lines(data.as_ref())),
    };
    Screen {
        banner: status_banner(status),
        title,
        lines,
    }
}

pub fn status_banner(status: ConnectionStatus) -> Option<String> {
    match status {
        ConnectionStatus::Connected => None,
        ConnectionStatus::Idle | ConnectionStatus::Connecting => {
            Some("connecting to controller".to_string())
        }
        ConnectionStatus::Reconnecting { attempt, retry_in } => Some(format!(
            "disconnected: showing last known view, retry {attempt} in {}s",
            retry_in.as_secs_f32().ceil() as u64
        )),
        ConnectionStatus::Closed => Some("offline".to_string()),
    }
}

fn home_lines(now: NaiveDateTime) -> Vec<String> {
    vec![
        now.format("%H:%M").to_string(),
        now.format("%A, %-d %B %Y").to_string(),
    ]
}

fn workout_lines(data: Option<&WorkoutData>) -> Vec<String> {
    let Some(data) = data else {
        return vec![
            PLACEHOLDER.to_string(),
            format!("Duration: {PLACEHOLDER}"),
            format!("Calories: {PLACEHOLDER}"),
        ];
    };

    let mut lines = vec![
        data.kind.clone(),
        format!("Duration: {} min", data.duration_minutes()),
        format!("Calories: {} kcal", data.calories),
    ];
    if let Some(steps) = data.steps {
        let progress = u64::from(steps) * 100 / u64::from(DAILY_STEP_GOAL);
        lines.push(format!(
            "Steps: {} ({progress}% of {})",
            group_thousands(steps),
            group_thousands(DAILY_STEP_GOAL)
        ));
    }
    if let Some(heart_rate) = data.heart_rate {
        lines.push(format!("Heart rate: {heart_rate} bpm"));
    }
    lines
}

fn weather_lines(data: Option<&WeatherData>) -> Vec<String> {
    match data {
        Some(data) => vec![
            format!("Temperature: {:.0}°C", data.temperature),
            format!(
                "Condition: {}",
                condition_label(data.condition_kind(), &data.condition)
            ),
        ],
        None => vec![
            format!("Temperature: {PLACEHOLDER}"),
            format!("Condition: {PLACEHOLDER}"),
        ],
    }
}

fn transport_lines(data: Option<&TransportData>) -> Vec<String> {
    let (route, next_arrival, status) = match data {
        Some(data) => (
            data.route.as_str(),
            data.next_arrival.as_str(),
            data.status.as_str(),
        ),
        None => (PLACEHOLDER, PLACEHOLDER, PLACEHOLDER),
    };
    vec![
        format!("Route: {route}"),
        format!("Next arrival: {next_arrival}"),
        format!("Status: {status}"),
    ]
}

fn condition_label(condition: WeatherCondition, raw: &str) -> String {
    let label = match condition {
        WeatherCondition::Clear => "Clear",
        WeatherCondition::Sunny => "Sunny",
        WeatherCondition::Cloudy => "Cloudy",
        WeatherCondition::Rainy => "Rainy",
        WeatherCondition::Snowy => "Snow",
        WeatherCondition::Stormy => "Storm",
        WeatherCondition::Foggy => "Fog",
        WeatherCondition::Other => return raw.trim().to_string(),
    };
    label.to_string()
}

fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
#[path = "tests/display_tests.rs"]
mod tests;
