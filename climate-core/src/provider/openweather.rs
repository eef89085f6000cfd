use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    error::{ClimateError, Result},
    model::{NO_DESCRIPTION, Observation, TIMESTAMP_FORMAT, TimeSeries},
};

use super::{ForecastSource, ensure_city};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_LANGUAGE: &str = "pt_br";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Five-day / three-hour forecast client for OpenWeather.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    language: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherBuilder {
    api_key: String,
    base_url: String,
    language: String,
    timeout: Duration,
}

impl OpenWeatherBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherProvider> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("climate/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build OpenWeather HTTP client")?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            language: self.language,
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherBuilder {
        OpenWeatherBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_forecast(&self, city: &str) -> Result<TimeSeries> {
        let url = format!("{}/forecast", self.base_url);
        debug!(city, %url, lang = %self.language, "Requesting OpenWeather forecast");

        let network = |source| ClimateError::Network {
            city: city.to_string(),
            source,
        };

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(network)?;

        let status = res.status();
        let body = res.text().await.map_err(network)?;

        if !status.is_success() {
            return Err(ClimateError::HttpStatus {
                city: city.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        let series = parse_forecast(city, &body)?;
        info!(city, samples = series.len(), "Fetched forecast");
        Ok(series)
    }
}

#[async_trait]
impl ForecastSource for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<TimeSeries> {
        ensure_city(city)?;
        self.fetch_forecast(city).await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwMain,
    #[serde(default)]
    weather: Option<Vec<OwWeather>>,
    #[serde(default)]
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Option<Vec<OwForecastEntry>>,
}

/// Reshape a `/forecast` payload into a feature-engineered series.
///
/// An empty or missing `list` means the city has no data and yields
/// `NotFound`; any other shape problem is a `MalformedResponse`.
pub fn parse_forecast(city: &str, body: &str) -> Result<TimeSeries> {
    let parsed: OwForecastResponse = serde_json::from_str(body)
        .map_err(|e| ClimateError::malformed(city, format!("invalid forecast JSON: {e}")))?;

    let entries = parsed.list.unwrap_or_default();
    if entries.is_empty() {
        return Err(ClimateError::NotFound {
            city: city.to_string(),
        });
    }

    let observations = entries
        .into_iter()
        .map(|entry| observation_from_entry(city, entry))
        .collect::<Result<Vec<_>>>()?;

    let series = TimeSeries::new(city, observations);
    if !series.is_strictly_increasing() {
        warn!(city, "Forecast timestamps are not strictly increasing; keeping delivered order");
    }

    Ok(series)
}

fn observation_from_entry(city: &str, entry: OwForecastEntry) -> Result<Observation> {
    let timestamp = NaiveDateTime::parse_from_str(&entry.dt_txt, TIMESTAMP_FORMAT).map_err(|e| {
        ClimateError::malformed(city, format!("bad timestamp '{}': {e}", entry.dt_txt))
    })?;

    let description = entry
        .weather
        .and_then(|w| w.into_iter().next())
        .and_then(|w| w.description)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    Ok(Observation {
        timestamp,
        temperature: entry.main.temp,
        humidity: entry.main.humidity,
        wind_speed: entry.wind.and_then(|w| w.speed),
        description,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "cod": "200",
        "cnt": 3,
        "list": [
            {
                "dt": 1710504000,
                "main": {"temp": 27.4, "feels_like": 30.1, "humidity": 84},
                "weather": [{"id": 500, "main": "Rain", "description": "chuva leve"}],
                "wind": {"speed": 1.8, "deg": 90},
                "dt_txt": "2024-03-15 12:00:00"
            },
            {
                "dt": 1710514800,
                "main": {"temp": 29.0, "humidity": 76},
                "weather": [],
                "wind": {"speed": 2.3},
                "dt_txt": "2024-03-15 15:00:00"
            },
            {
                "dt": 1710525600,
                "main": {"temp": 26.1, "humidity": 88},
                "dt_txt": "2024-03-15 18:00:00"
            }
        ],
        "city": {"name": "Manaus", "country": "BR"}
    }"#;

    #[test]
    fn parses_samples_in_delivered_order() {
        let series = parse_forecast("Manaus", PAYLOAD).unwrap();

        assert_eq!(series.len(), 3);
        let rows = series.rows();
        assert_eq!(rows[0].observation.temperature, 27.4);
        assert_eq!(rows[0].observation.humidity, Some(84.0));
        assert_eq!(rows[0].observation.wind_speed, Some(1.8));
        assert_eq!(rows[0].observation.description, "chuva leve");
        assert_eq!(rows[2].hours_since_start, 6.0);
    }

    #[test]
    fn missing_or_empty_weather_list_falls_back_to_sentinel() {
        let series = parse_forecast("Manaus", PAYLOAD).unwrap();

        assert_eq!(series.rows()[1].observation.description, NO_DESCRIPTION);
        assert_eq!(series.rows()[2].observation.description, NO_DESCRIPTION);
    }

    #[test]
    fn missing_wind_leaves_column_unavailable() {
        let series = parse_forecast("Manaus", PAYLOAD).unwrap();

        assert_eq!(series.rows()[2].observation.wind_speed, None);
        assert!(!series.available_features().contains(&crate::Feature::WindSpeed));
    }

    #[test]
    fn empty_list_is_not_found() {
        let err = parse_forecast("Nowhere", r#"{"cod":"200","cnt":0,"list":[]}"#).unwrap_err();
        assert!(matches!(err, ClimateError::NotFound { .. }));

        let err = parse_forecast("Nowhere", r#"{"cod":"200"}"#).unwrap_err();
        assert!(matches!(err, ClimateError::NotFound { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_forecast("Manaus", "<html>oops</html>").unwrap_err();
        assert!(matches!(err, ClimateError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_temperature_is_malformed() {
        let body = r#"{"list":[{"main":{"humidity":80},"dt_txt":"2024-03-15 12:00:00"}]}"#;
        let err = parse_forecast("Manaus", body).unwrap_err();
        assert!(matches!(err, ClimateError::MalformedResponse { .. }));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let body = r#"{"list":[{"main":{"temp":20.0},"dt_txt":"15/03/2024 12h"}]}"#;
        let err = parse_forecast("Manaus", body).unwrap_err();

        assert!(matches!(err, ClimateError::MalformedResponse { .. }));
        assert!(err.to_string().contains("15/03/2024 12h"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "á".repeat(300);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let provider = OpenWeatherProvider::builder("KEY")
            .base_url("http://localhost:8080/data/2.5/")
            .build()
            .unwrap();

        assert_eq!(provider.base_url(), "http://localhost:8080/data/2.5");
    }
}
