//! Core library for the `climate` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast source abstraction, its OpenWeather implementation and a read-through cache
//! - The feature-engineered time series model
//! - A lag-1 linear temperature predictor
//! - Window filtering, summary statistics and dashboard assembly
//!
//! It is used by `climate-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod predict;
pub mod provider;
pub mod regression;
pub mod stats;
pub mod window;

pub use config::Config;
pub use dashboard::{CityPanel, Dashboard, DashboardRequest, build_dashboard};
pub use error::{ClimateError, ErrorKind, Result};
pub use model::{Feature, Observation, Row, TimeSeries};
pub use predict::{ForecastResult, TrendPredictor};
pub use provider::{CachedSource, ForecastSource, openweather::OpenWeatherProvider, source_from_config};
pub use stats::{Metric, SummaryStats};
pub use window::{TimeWindow, filter_window};
