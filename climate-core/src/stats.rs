use serde::{Deserialize, Serialize};

use crate::model::{Observation, TimeSeries};

/// Quantity plotted on the dashboard chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Temperature,
    Humidity,
    WindSpeed,
}

impl Metric {
    pub const fn all() -> &'static [Metric] {
        &[Metric::Temperature, Metric::Humidity, Metric::WindSpeed]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::WindSpeed => "wind",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::WindSpeed => "Wind speed",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::WindSpeed => "m/s",
        }
    }

    pub fn value(&self, observation: &Observation) -> Option<f64> {
        match self {
            Metric::Temperature => Some(observation.temperature),
            Metric::Humidity => observation.humidity,
            Metric::WindSpeed => observation.wind_speed,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label(), self.unit())
    }
}

impl TryFrom<&str> for Metric {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::Humidity),
            "wind" | "wind_speed" => Ok(Metric::WindSpeed),
            _ => Err(anyhow::anyhow!(
                "Unknown metric '{value}'. Supported metrics: temperature, humidity, wind."
            )),
        }
    }
}

/// Summary figures over a (usually window-filtered) series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub samples: usize,
    pub mean_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub mean_humidity: Option<f64>,
    pub mean_wind_speed: Option<f64>,
}

impl SummaryStats {
    /// `None` for an empty series.
    pub fn from_series(series: &TimeSeries) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        let observations = || series.rows().iter().map(|r| &r.observation);
        let temps: Vec<f64> = observations().map(|o| o.temperature).collect();

        Some(Self {
            samples: temps.len(),
            mean_temperature: mean(temps.iter().copied())?,
            max_temperature: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_temperature: temps.iter().copied().fold(f64::INFINITY, f64::min),
            mean_humidity: mean(observations().filter_map(|o| o.humidity)),
            mean_wind_speed: mean(observations().filter_map(|o| o.wind_speed)),
        })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}
