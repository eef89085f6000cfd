use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ClimateError, Result},
    model::{CalendarFeatures, Feature, Row, TimeSeries, hours_between},
    regression::{LinearModel, mean_absolute_error, mean_squared_error},
};

/// Native cadence of the forecast API; the predicted point lies one step ahead.
pub const FORECAST_STEP_HOURS: i64 = 3;

/// Next-step temperature forecast plus in-sample fit diagnostics.
///
/// `mean_absolute_error` and `mean_squared_error` are computed on the
/// training pairs themselves. They describe how well the line fits the
/// forecast it was trained on, not how accurate the prediction is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub city: String,
    pub predicted_temperature: f64,
    pub target_timestamp: NaiveDateTime,
    pub features: Vec<Feature>,
    pub model: LinearModel,
    pub training_pairs: usize,
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
}

/// Lag-1 linear predictor: features of sample `i` explain the temperature of
/// sample `i + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendPredictor;

impl TrendPredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn predict(&self, series: &TimeSeries) -> Result<ForecastResult> {
        let rows = series.rows();
        let (Some(last), Some(origin)) = (series.last(), series.origin()) else {
            return Err(ClimateError::InsufficientData { needed: 2, got: 0 });
        };
        if rows.len() < 2 {
            return Err(ClimateError::InsufficientData {
                needed: 2,
                got: rows.len(),
            });
        }

        // Calendar columns and temperature are always present.
        let features = series.available_features();

        let inputs: Vec<Vec<f64>> = rows[..rows.len() - 1]
            .iter()
            .map(|row| feature_vector(row, &features))
            .collect();
        let targets: Vec<f64> = rows[1..]
            .iter()
            .map(|row| row.observation.temperature)
            .collect();
        let pairs = inputs.len().min(targets.len());
        let (inputs, targets) = (&inputs[..pairs], &targets[..pairs]);

        let model = LinearModel::fit(inputs, targets)?;
        debug!(
            city = %series.city,
            pairs,
            features = ?features,
            intercept = model.intercept,
            "Fitted lag-1 temperature model"
        );

        let target_timestamp = last.timestamp() + Duration::hours(FORECAST_STEP_HOURS);
        let next = next_point(last, origin, target_timestamp);
        let predicted_temperature = model.predict_row(&feature_vector(&next, &features));

        let fitted = model.predict(inputs);
        let mae = mean_absolute_error(targets, &fitted);
        let mse = mean_squared_error(targets, &fitted);

        info!(
            city = %series.city,
            target = %target_timestamp,
            predicted = predicted_temperature,
            mae,
            mse,
            "Predicted next temperature"
        );

        Ok(ForecastResult {
            city: series.city.clone(),
            predicted_temperature,
            target_timestamp,
            features,
            model,
            training_pairs: pairs,
            mean_absolute_error: mae,
            mean_squared_error: mse,
        })
    }
}

fn feature_vector(row: &Row, features: &[Feature]) -> Vec<f64> {
    // Columns in `features` are available on every row of the series.
    features
        .iter()
        .map(|&f| row.feature(f).unwrap_or(f64::NAN))
        .collect()
}

/// Calendar features move to the target time; current conditions are held
/// at the last observed values.
fn next_point(last: &Row, origin: NaiveDateTime, target: NaiveDateTime) -> Row {
    let mut observation = last.observation.clone();
    observation.timestamp = target;

    Row {
        observation,
        calendar: CalendarFeatures::from_timestamp(target),
        hours_since_start: hours_between(origin, target),
    }
}
