use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Home,
    Workout,
    Transport,
    Weather,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Home,
        ViewKind::Workout,
        ViewKind::Transport,
        ViewKind::Weather,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Home => "home",
            ViewKind::Workout => "workout",
            ViewKind::Transport => "transport",
            ViewKind::Weather => "weather",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = ViewError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ViewKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ViewError::UnknownView(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutData {
    #[serde(rename = "type")]
    pub kind: String,
    /// Seconds.
    pub duration: u32,
    pub calories: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
}

impl WorkoutData {
    pub fn duration_minutes(&self) -> u32 {
        self.duration / 60
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// Degrees Celsius.
    pub temperature: f64,
    pub condition: String,
}

impl WeatherData {
    pub fn condition_kind(&self) -> WeatherCondition {
        WeatherCondition::parse(&self.condition)
    }
}

/// Conditions the display knows how to label. The vocabulary is open, so
/// anything else is carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
    Other,
}

impl WeatherCondition {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "clear" => WeatherCondition::Clear,
            "sunny" => WeatherCondition::Sunny,
            "cloudy" | "overcast" => WeatherCondition::Cloudy,
            "rainy" | "rain" | "showers" => WeatherCondition::Rainy,
            "snowy" | "snow" => WeatherCondition::Snowy,
            "stormy" | "thunderstorm" => WeatherCondition::Stormy,
            "foggy" | "fog" | "mist" => WeatherCondition::Foggy,
            _ => WeatherCondition::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportData {
    pub route: String,
    pub next_arrival: String,
    pub status: String,
}

/// What is on screen right now. Each view carries its own payload; `None`
/// means the view was requested without data and renders placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Home,
    Workout(Option<WorkoutData>),
    Transport(Option<TransportData>),
    Weather(Option<WeatherData>),
}

impl ViewState {
    pub fn empty(kind: ViewKind) -> Self {
        match kind {
            ViewKind::Home => ViewState::Home,
            ViewKind::Workout => ViewState::Workout(None),
            ViewKind::Transport => ViewState::Transport(None),
            ViewKind::Weather => ViewState::Weather(None),
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            ViewState::Home => ViewKind::Home,
            ViewState::Workout(_) => ViewKind::Workout,
            ViewState::Transport(_) => ViewKind::Transport,
            ViewState::Weather(_) => ViewKind::Weather,
        }
    }

    pub fn has_payload(&self) -> bool {
        match self {
            ViewState::Home => false,
            ViewState::Workout(data) => data.is_some(),
            ViewState::Transport(data) => data.is_some(),
            ViewState::Weather(data) => data.is_some(),
        }
    }
}
