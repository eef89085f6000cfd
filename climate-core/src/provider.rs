use crate::{
    Config, TimeSeries,
    error::{ClimateError, Result},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::debug;

pub mod openweather;

/// Anything that can turn a city name into a forecast series.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<TimeSeries>;
}

/// Construct the OpenWeather source from config.
pub fn source_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `climate configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    OpenWeatherProvider::builder(api_key)
        .base_url(config.base_url())
        .language(config.language())
        .timeout(Duration::from_secs(config.timeout_secs()))
        .build()
}

/// Read-through memoization of successful fetches, keyed by the exact city
/// string. Failures are never cached.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, (Instant, TimeSeries)>>,
}

impl<S: ForecastSource> CachedSource<S> {
    /// Entries live for `ttl`, or for the lifetime of the cache when `None`.
    pub fn new(inner: S, ttl: Option<Duration>) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lookup(&self, city: &str) -> Option<TimeSeries> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let (stored_at, series) = entries.get(city)?;
        match self.ttl {
            Some(ttl) if stored_at.elapsed() >= ttl => None,
            _ => Some(series.clone()),
        }
    }
}

#[async_trait]
impl<S: ForecastSource> ForecastSource for CachedSource<S> {
    async fn fetch(&self, city: &str) -> Result<TimeSeries> {
        if let Some(series) = self.lookup(city) {
            debug!(city, "Forecast served from cache");
            return Ok(series);
        }

        let series = self.inner.fetch(city).await?;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(city.to_string(), (Instant::now(), series.clone()));

        Ok(series)
    }
}

/// Rejects blank city names before any request is made.
pub(crate) fn ensure_city(city: &str) -> Result<()> {
    if city.trim().is_empty() {
        return Err(ClimateError::NotFound {
            city: city.to_string(),
        });
    }
    Ok(())
}
