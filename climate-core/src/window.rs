use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::TimeSeries;

/// Selectable look-ahead window relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Next24Hours,
    Next3Days,
    #[default]
    Next5Days,
    AllFuture,
}

impl TimeWindow {
    pub const fn all() -> &'static [TimeWindow] {
        &[
            TimeWindow::Next24Hours,
            TimeWindow::Next3Days,
            TimeWindow::Next5Days,
            TimeWindow::AllFuture,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Next24Hours => "24h",
            TimeWindow::Next3Days => "3d",
            TimeWindow::Next5Days => "5d",
            TimeWindow::AllFuture => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::Next24Hours => "Next 24 hours",
            TimeWindow::Next3Days => "Next 3 days",
            TimeWindow::Next5Days => "Next 5 days",
            TimeWindow::AllFuture => "All future samples",
        }
    }

    /// Upper bound of the window; `None` means open-ended.
    ///
    /// The API never forecasts past five days, so `Next5Days` keeps every
    /// future sample.
    pub fn horizon(&self) -> Option<Duration> {
        match self {
            TimeWindow::Next24Hours => Some(Duration::days(1)),
            TimeWindow::Next3Days => Some(Duration::days(3)),
            TimeWindow::Next5Days | TimeWindow::AllFuture => None,
        }
    }

    pub fn contains(&self, now: NaiveDateTime, ts: NaiveDateTime) -> bool {
        ts >= now && self.horizon().is_none_or(|h| ts <= now + h)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for TimeWindow {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "24h" | "1d" => Ok(TimeWindow::Next24Hours),
            "3d" => Ok(TimeWindow::Next3Days),
            "5d" => Ok(TimeWindow::Next5Days),
            "all" => Ok(TimeWindow::AllFuture),
            _ => Err(anyhow::anyhow!(
                "Unknown window '{value}'. Supported windows: 24h, 3d, 5d, all."
            )),
        }
    }
}

/// Rows of `series` whose timestamp falls inside `window` as seen from `now`.
///
/// Rows keep their derived features and order; nothing is recomputed.
pub fn filter_window(series: &TimeSeries, now: NaiveDateTime, window: TimeWindow) -> TimeSeries {
    series.subset(|row| window.contains(now, row.timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Observation, TIMESTAMP_FORMAT};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn series() -> TimeSeries {
        let start = ts("2024-03-15 00:00:00");
        let observations = (0..40)
            .map(|i| Observation {
                timestamp: start + Duration::hours(3 * i),
                temperature: 25.0,
                humidity: Some(80.0),
                wind_speed: Some(2.0),
                description: "nublado".into(),
            })
            .collect();
        TimeSeries::new("Manaus", observations)
    }

    #[test]
    fn next_24_hours_is_inclusive_on_both_ends() {
        let now = ts("2024-03-15 06:00:00");
        let filtered = filter_window(&series(), now, TimeWindow::Next24Hours);

        assert_eq!(filtered.first().unwrap().timestamp(), now);
        assert_eq!(filtered.last().unwrap().timestamp(), ts("2024-03-16 06:00:00"));
        assert_eq!(filtered.len(), 9);
    }

    #[test]
    fn past_samples_are_dropped() {
        let now = ts("2024-03-15 07:30:00");
        let filtered = filter_window(&series(), now, TimeWindow::Next3Days);

        assert_eq!(filtered.first().unwrap().timestamp(), ts("2024-03-15 09:00:00"));
        assert!(filtered.rows().iter().all(|r| r.timestamp() <= ts("2024-03-18 07:30:00")));
    }

    #[test]
    fn all_future_has_no_upper_bound() {
        let now = ts("2024-03-09 00:00:00");

        assert_eq!(filter_window(&series(), now, TimeWindow::AllFuture).len(), 40);
        assert_eq!(filter_window(&series(), now, TimeWindow::Next3Days).len(), 0);
    }

    #[test]
    fn next_5_days_keeps_samples_beyond_five_days() {
        let now = ts("2024-03-09 00:00:00");
        let filtered = filter_window(&series(), now, TimeWindow::Next5Days);

        assert_eq!(filtered.len(), 40);
        assert_eq!(filtered.last().unwrap().timestamp(), ts("2024-03-19 21:00:00"));
        assert_eq!(filtered, filter_window(&series(), now, TimeWindow::AllFuture));
    }

    #[test]
    fn next_5_days_still_drops_past_samples() {
        let now = ts("2024-03-16 00:00:00");

        assert_eq!(filter_window(&series(), now, TimeWindow::Next5Days).len(), 32);
    }

    #[test]
    fn filtered_rows_keep_their_features() {
        let full = series();
        let filtered = filter_window(&full, ts("2024-03-16 00:00:00"), TimeWindow::Next24Hours);

        assert_eq!(filtered.first().unwrap().hours_since_start, 24.0);
        assert_eq!(filtered.origin(), full.origin());
    }

    #[test]
    fn window_parses_from_short_names() {
        for w in TimeWindow::all() {
            assert_eq!(TimeWindow::try_from(w.as_str()).unwrap(), *w);
        }
        assert!(TimeWindow::try_from("week").is_err());
    }
}
