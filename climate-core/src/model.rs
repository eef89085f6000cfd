use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Format of the `dt_txt` field delivered by the forecast API.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Label used when a sample carries no weather description.
pub const NO_DESCRIPTION: &str = "N/A";

/// One forecast sample as delivered by the upstream API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub description: String,
}

/// Calendar features derived from a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// 0–23
    pub hour: u32,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    /// 1–366
    pub day_of_year: u32,
    /// 1–12
    pub month: u32,
}

impl CalendarFeatures {
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Self {
            hour: ts.hour(),
            day_of_week: ts.weekday().num_days_from_monday(),
            day_of_year: ts.ordinal(),
            month: ts.month(),
        }
    }
}

/// Elapsed hours between `origin` and `ts`, fractional.
pub fn hours_between(origin: NaiveDateTime, ts: NaiveDateTime) -> f64 {
    (ts - origin).num_seconds() as f64 / 3600.0
}

/// Recognized regression feature columns, in their canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Hour,
    DayOfWeek,
    DayOfYear,
    Month,
    HoursSinceStart,
    Temperature,
    Humidity,
    WindSpeed,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::Hour,
        Feature::DayOfWeek,
        Feature::DayOfYear,
        Feature::Month,
        Feature::HoursSinceStart,
        Feature::Temperature,
        Feature::Humidity,
        Feature::WindSpeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Hour => "hour",
            Feature::DayOfWeek => "day_of_week",
            Feature::DayOfYear => "day_of_year",
            Feature::Month => "month",
            Feature::HoursSinceStart => "hours_since_start",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::WindSpeed => "wind_speed",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An observation together with the features derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(flatten)]
    pub observation: Observation,
    #[serde(flatten)]
    pub calendar: CalendarFeatures,
    pub hours_since_start: f64,
}

impl Row {
    /// Value of a feature column for this row, `None` when the underlying
    /// measurement is missing.
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Hour => Some(f64::from(self.calendar.hour)),
            Feature::DayOfWeek => Some(f64::from(self.calendar.day_of_week)),
            Feature::DayOfYear => Some(f64::from(self.calendar.day_of_year)),
            Feature::Month => Some(f64::from(self.calendar.month)),
            Feature::HoursSinceStart => Some(self.hours_since_start),
            Feature::Temperature => Some(self.observation.temperature),
            Feature::Humidity => self.observation.humidity,
            Feature::WindSpeed => self.observation.wind_speed,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.observation.timestamp
    }
}

/// Ordered forecast samples for one city with derived features.
///
/// `origin` is the minimum timestamp of the series the rows were computed
/// against. Subsets produced by window filtering keep the origin of the
/// series they came from, so `hours_since_start` stays comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub city: String,
    origin: Option<NaiveDateTime>,
    rows: Vec<Row>,
}

impl TimeSeries {
    /// Builds the series in delivered order; rows are never re-sorted.
    pub fn new(city: impl Into<String>, observations: Vec<Observation>) -> Self {
        let origin = observations.iter().map(|o| o.timestamp).min();

        let rows = observations
            .into_iter()
            .map(|observation| {
                let ts = observation.timestamp;
                Row {
                    calendar: CalendarFeatures::from_timestamp(ts),
                    hours_since_start: origin.map_or(0.0, |o| hours_between(o, ts)),
                    observation,
                }
            })
            .collect();

        Self {
            city: city.into(),
            origin,
            rows,
        }
    }

    /// Keeps the rows matching `keep`, unchanged and in order.
    pub fn subset(&self, mut keep: impl FnMut(&Row) -> bool) -> Self {
        Self {
            city: self.city.clone(),
            origin: self.origin,
            rows: self.rows.iter().filter(|&r| keep(r)).cloned().collect(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn origin(&self) -> Option<NaiveDateTime> {
        self.origin
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Recognized feature columns for which every row has a value.
    pub fn available_features(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|&f| self.rows.iter().all(|r| r.feature(f).is_some()))
            .collect()
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.rows
            .windows(2)
            .all(|w| w[0].timestamp() < w[1].timestamp())
    }
}
