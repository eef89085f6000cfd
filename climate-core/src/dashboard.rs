//! Assembly of everything the presentation layer shows for one request.
//!
//! The selections a user makes (city, comparison city, window, metric) travel
//! as a [`DashboardRequest`]. Each city becomes a [`CityPanel`] that either
//! carries data or notices explaining why it doesn't; a failure for one city
//! never prevents the other panel from being built.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{ClimateError, ErrorKind},
    model::TimeSeries,
    predict::{ForecastResult, TrendPredictor},
    provider::ForecastSource,
    stats::{Metric, SummaryStats},
    window::{TimeWindow, filter_window},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub city: String,
    pub compare_city: Option<String>,
    pub window: TimeWindow,
    pub metric: Metric,
}

impl DashboardRequest {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            compare_city: None,
            window: TimeWindow::default(),
            metric: Metric::default(),
        }
    }

    /// Blank comparison names count as "no comparison".
    fn comparison(&self) -> Option<&str> {
        self.compare_city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Observed,
    Forecast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub city: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub kind: PointKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    NotFound,
    Unavailable,
    Malformed,
    InsufficientData,
    EmptyWindow,
}

impl From<ErrorKind> for NoticeKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => NoticeKind::NotFound,
            ErrorKind::Network => NoticeKind::Unavailable,
            ErrorKind::MalformedResponse => NoticeKind::Malformed,
            ErrorKind::InsufficientData => NoticeKind::InsufficientData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl From<&ClimateError> for Notice {
    fn from(err: &ClimateError) -> Self {
        Self {
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityPanel {
    pub city: String,
    pub primary: bool,
    /// Window-filtered rows, `None` when the fetch failed.
    pub series: Option<TimeSeries>,
    pub chart: Vec<ChartPoint>,
    pub stats: Option<SummaryStats>,
    /// Only computed for the primary city, on the unfiltered series.
    pub forecast: Option<ForecastResult>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub request: DashboardRequest,
    pub now: NaiveDateTime,
    pub panels: Vec<CityPanel>,
}

impl Dashboard {
    pub fn primary(&self) -> Option<&CityPanel> {
        self.panels.iter().find(|p| p.primary)
    }

    /// Chart points of every panel, primary first.
    pub fn chart(&self) -> impl Iterator<Item = &ChartPoint> {
        self.panels.iter().flat_map(|p| p.chart.iter())
    }
}

/// Fetches the requested cities concurrently and builds their panels.
///
/// Comparing a city with itself reuses the primary fetch.
pub async fn build_dashboard<S>(
    source: &S,
    request: &DashboardRequest,
    now: NaiveDateTime,
) -> Dashboard
where
    S: ForecastSource + ?Sized,
{
    let comparison = request.comparison();
    let same_city = comparison.is_some_and(|c| c == request.city.trim());

    let (primary, compared) = tokio::join!(source.fetch(&request.city), async {
        match comparison {
            Some(city) if !same_city => Some(source.fetch(city).await),
            _ => None,
        }
    });

    let mut panels = vec![build_panel(&request.city, true, primary.as_ref(), request, now)];
    if let Some(city) = comparison {
        let fetched = match &compared {
            Some(result) => result.as_ref(),
            None => primary.as_ref(),
        };
        panels.push(build_panel(city, false, fetched, request, now));
    }

    Dashboard {
        request: request.clone(),
        now,
        panels,
    }
}

fn build_panel(
    city: &str,
    primary: bool,
    fetched: Result<&TimeSeries, &ClimateError>,
    request: &DashboardRequest,
    now: NaiveDateTime,
) -> CityPanel {
    let mut panel = CityPanel {
        city: city.to_string(),
        primary,
        series: None,
        chart: Vec::new(),
        stats: None,
        forecast: None,
        notices: Vec::new(),
    };

    let series = match fetched {
        Ok(series) => series,
        Err(err) => {
            warn!(city, error = %err, "Could not load forecast");
            panel.notices.push(Notice::from(err));
            return panel;
        }
    };

    let filtered = filter_window(series, now, request.window);
    if filtered.is_empty() {
        panel.notices.push(Notice {
            kind: NoticeKind::EmptyWindow,
            message: format!("No data available for {city} in the period '{}'", request.window),
        });
    }

    panel.chart = filtered
        .rows()
        .iter()
        .filter_map(|row| {
            request.metric.value(&row.observation).map(|value| ChartPoint {
                city: city.to_string(),
                timestamp: row.timestamp(),
                value,
                kind: PointKind::Observed,
            })
        })
        .collect();
    panel.stats = SummaryStats::from_series(&filtered);

    if primary {
        match TrendPredictor::new().predict(series) {
            Ok(forecast) => {
                if request.metric == Metric::Temperature {
                    panel.chart.push(ChartPoint {
                        city: city.to_string(),
                        timestamp: forecast.target_timestamp,
                        value: forecast.predicted_temperature,
                        kind: PointKind::Forecast,
                    });
                }
                panel.forecast = Some(forecast);
            }
            Err(err) => {
                warn!(city, error = %err, "Could not predict next temperature");
                panel.notices.push(Notice::from(&err));
            }
        }
    }

    panel.series = Some(filtered);
    panel
}
