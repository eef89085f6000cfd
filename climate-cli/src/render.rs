use std::fmt::{self, Display, Formatter};

use climate_core::{
    CityPanel, Dashboard, ForecastResult, SummaryStats,
    dashboard::{ChartPoint, PointKind},
};

const BAR_WIDTH: usize = 30;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Text rendering of a dashboard: chart, statistics, forecast, raw data.
pub fn dashboard(dashboard: &Dashboard) -> DashboardView<'_> {
    DashboardView(dashboard)
}

pub struct DashboardView<'a>(&'a Dashboard);

impl Display for DashboardView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let d = self.0;
        let cities: Vec<&str> = d.panels.iter().map(|p| p.city.as_str()).collect();

        writeln!(f, "Climate dashboard: {}", cities.join(" vs "))?;
        writeln!(f, "Period: {} | Metric: {}", d.request.window, d.request.metric)?;
        writeln!(f)?;

        for panel in &d.panels {
            for notice in &panel.notices {
                writeln!(f, "! {}", notice.message)?;
            }
        }

        write_chart(f, d)?;

        writeln!(f, "Summary statistics")?;
        match d.primary() {
            Some(CityPanel {
                stats: Some(stats), ..
            }) => write_stats(f, stats)?,
            Some(panel) => writeln!(f, "  No statistics for {} in this period.", panel.city)?,
            None => writeln!(f, "  No data loaded.")?,
        }
        writeln!(f)?;

        if let Some(primary) = d.primary() {
            writeln!(f, "Temperature forecast for {}", primary.city)?;
            match &primary.forecast {
                Some(forecast) => write_forecast(f, forecast)?,
                None => writeln!(f, "  No forecast available.")?,
            }
            writeln!(f)?;
        }

        writeln!(f, "Raw data")?;
        for panel in &d.panels {
            write_raw(f, panel)?;
        }

        Ok(())
    }
}

fn write_chart(f: &mut Formatter<'_>, d: &Dashboard) -> fmt::Result {
    let points: Vec<&ChartPoint> = d.chart().collect();
    writeln!(f, "{} over time", d.request.metric.label())?;
    if points.is_empty() {
        writeln!(f, "  Enter a city name to see its forecast.")?;
        return writeln!(f);
    }

    let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.value), hi.max(p.value))
    });
    let unit = d.request.metric.unit();

    for p in points {
        let kind = match p.kind {
            PointKind::Observed => "observed",
            PointKind::Forecast => "forecast",
        };
        writeln!(
            f,
            "  {:<14} {}  {:>7.2} {:<3} {:<width$} {}",
            p.city,
            p.timestamp.format(TIME_FORMAT),
            p.value,
            unit,
            bar(p.value, lo, hi),
            kind,
            width = BAR_WIDTH,
        )?;
    }
    writeln!(f)
}

fn bar(value: f64, lo: f64, hi: f64) -> String {
    let span = hi - lo;
    let filled = if span > 0.0 {
        1 + (((value - lo) / span) * (BAR_WIDTH - 1) as f64).round() as usize
    } else {
        BAR_WIDTH / 2
    };
    "#".repeat(filled.min(BAR_WIDTH))
}

fn write_stats(f: &mut Formatter<'_>, stats: &SummaryStats) -> fmt::Result {
    writeln!(f, "  Samples:                   {}", stats.samples)?;
    writeln!(f, "  Mean temperature (°C):     {:.2}", stats.mean_temperature)?;
    writeln!(f, "  Max temperature (°C):      {:.2}", stats.max_temperature)?;
    writeln!(f, "  Min temperature (°C):      {:.2}", stats.min_temperature)?;
    writeln!(f, "  Mean humidity (%):         {}", optional(stats.mean_humidity))?;
    writeln!(f, "  Mean wind speed (m/s):     {}", optional(stats.mean_wind_speed))
}

fn write_forecast(f: &mut Formatter<'_>, forecast: &ForecastResult) -> fmt::Result {
    writeln!(
        f,
        "  Predicted for {}: {:.2} °C",
        forecast.target_timestamp.format("%d/%m %H:%M"),
        forecast.predicted_temperature
    )?;
    writeln!(
        f,
        "  In-sample fit over {} training pairs (not a held-out accuracy):",
        forecast.training_pairs
    )?;
    writeln!(
        f,
        "  MAE: {:.2}  MSE: {:.2}",
        forecast.mean_absolute_error, forecast.mean_squared_error
    )
}

fn write_raw(f: &mut Formatter<'_>, panel: &CityPanel) -> fmt::Result {
    let Some(series) = &panel.series else {
        return writeln!(f, "  {}: no data", panel.city);
    };

    writeln!(f, "  {} ({} rows)", panel.city, series.len())?;
    writeln!(
        f,
        "  {:<16} {:>6} {:>6} {:>6} {:>4} {:>3} {:>4} {:>3} {:>7}  description",
        "timestamp", "temp", "hum", "wind", "hour", "dow", "doy", "mon", "hours"
    )?;
    for row in series.rows() {
        let o = &row.observation;
        writeln!(
            f,
            "  {:<16} {:>6.2} {:>6} {:>6} {:>4} {:>3} {:>4} {:>3} {:>7.1}  {}",
            o.timestamp.format(TIME_FORMAT),
            o.temperature,
            optional(o.humidity),
            optional(o.wind_speed),
            row.calendar.hour,
            row.calendar.day_of_week,
            row.calendar.day_of_year,
            row.calendar.month,
            row.hours_since_start,
            o.description,
        )?;
    }
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use climate_core::{
        DashboardRequest, Observation, TimeSeries, TrendPredictor,
        dashboard::{Notice, NoticeKind},
    };

    fn panel(city: &str, primary: bool) -> CityPanel {
        let start = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let series = TimeSeries::new(
            city,
            (0..3)
                .map(|i| Observation {
                    timestamp: start + Duration::hours(3 * i),
                    temperature: 26.0 + i as f64,
                    humidity: Some(80.0),
                    wind_speed: None,
                    description: "chuva leve".into(),
                })
                .collect(),
        );
        let forecast = primary.then(|| TrendPredictor::new().predict(&series).unwrap());
        let chart = series
            .rows()
            .iter()
            .map(|r| ChartPoint {
                city: city.into(),
                timestamp: r.timestamp(),
                value: r.observation.temperature,
                kind: PointKind::Observed,
            })
            .collect();

        CityPanel {
            city: city.into(),
            primary,
            stats: SummaryStats::from_series(&series),
            series: Some(series),
            chart,
            forecast,
            notices: Vec::new(),
        }
    }

    fn render(panels: Vec<CityPanel>) -> String {
        let d = Dashboard {
            request: DashboardRequest::new("Manaus"),
            now: NaiveDate::from_ymd_opt(2024, 3, 15)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
            panels,
        };
        dashboard(&d).to_string()
    }

    #[test]
    fn renders_every_section() {
        let out = render(vec![panel("Manaus", true), panel("Recife", false)]);

        assert!(out.contains("Climate dashboard: Manaus vs Recife"));
        assert!(out.contains("Temperature over time"));
        assert!(out.contains("Mean temperature (°C):     27.00"));
        assert!(out.contains("Mean wind speed (m/s):     N/A"));
        assert!(out.contains("Predicted for 15/03 21:00"));
        assert!(out.contains("not a held-out accuracy"));
        assert!(out.contains("Recife (3 rows)"));
    }

    #[test]
    fn failed_panel_shows_notice_and_no_data() {
        let mut failed = panel("Atlantis", false);
        failed.series = None;
        failed.chart.clear();
        failed.notices.push(Notice {
            kind: NoticeKind::NotFound,
            message: "No forecast data found for city 'Atlantis'".into(),
        });

        let out = render(vec![panel("Manaus", true), failed]);

        assert!(out.contains("! No forecast data found for city 'Atlantis'"));
        assert!(out.contains("Atlantis: no data"));
    }

    #[test]
    fn bar_scales_between_extremes() {
        assert_eq!(bar(0.0, 0.0, 10.0).len(), 1);
        assert_eq!(bar(10.0, 0.0, 10.0).len(), BAR_WIDTH);
        assert_eq!(bar(5.0, 5.0, 5.0).len(), BAR_WIDTH / 2);
    }
}
