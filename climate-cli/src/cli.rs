use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use climate_core::{
    CachedSource, Config, DashboardRequest, Metric, TimeWindow, build_dashboard,
    source_from_config,
};
use inquire::{Password, PasswordDisplayMode};
use tracing::info;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Forecast dashboard with next-step temperature trend")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Print the location of the config file.
    ConfigPath,

    /// Show the forecast dashboard for a city.
    Show {
        /// City name, passed to the weather API as is.
        city: String,

        /// Second city to compare against.
        #[arg(long)]
        compare: Option<String>,

        /// Time window: 24h, 3d, 5d or all.
        #[arg(long, default_value = "5d", value_parser = parse_window)]
        window: TimeWindow,

        /// Charted metric: temperature, humidity or wind.
        #[arg(long, default_value = "temperature", value_parser = parse_metric)]
        metric: Metric,

        /// Print the dashboard as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },
}

fn parse_window(s: &str) -> Result<TimeWindow, String> {
    TimeWindow::try_from(s).map_err(|e| e.to_string())
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    Metric::try_from(s).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            Command::Show {
                city,
                compare,
                window,
                metric,
                json,
            } => {
                let request = DashboardRequest {
                    city,
                    compare_city: compare,
                    window,
                    metric,
                };
                show(request, json).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save()?;

    let path = Config::config_file_path()?;
    info!(path = %path.display(), "Saved configuration");
    println!("API key saved to {}", path.display());
    Ok(())
}

async fn show(request: DashboardRequest, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?.with_env_overrides();
    let source = CachedSource::new(source_from_config(&config)?, config.cache_ttl());

    let now = Utc::now().naive_utc();
    let dashboard = build_dashboard(&source, &request, now).await;

    if json {
        let out = serde_json::to_string_pretty(&dashboard)
            .context("Failed to serialize dashboard to JSON")?;
        println!("{out}");
    } else {
        print!("{}", render::dashboard(&dashboard));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_defaults_to_five_days_of_temperature() {
        let cli = Cli::try_parse_from(["climate", "show", "Manaus"]).unwrap();

        match cli.command {
            Command::Show {
                city,
                compare,
                window,
                metric,
                json,
            } => {
                assert_eq!(city, "Manaus");
                assert_eq!(compare, None);
                assert_eq!(window, TimeWindow::Next5Days);
                assert_eq!(metric, Metric::Temperature);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_accepts_comparison_window_and_metric() {
        let cli = Cli::try_parse_from([
            "climate", "show", "São Paulo", "--compare", "Recife", "--window", "24h", "--metric",
            "wind", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Show {
                city,
                compare,
                window,
                metric,
                ..
            } => {
                assert_eq!(city, "São Paulo");
                assert_eq!(compare.as_deref(), Some("Recife"));
                assert_eq!(window, TimeWindow::Next24Hours);
                assert_eq!(metric, Metric::WindSpeed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_window_is_rejected() {
        let err = Cli::try_parse_from(["climate", "show", "Manaus", "--window", "week"]).unwrap_err();
        assert!(err.to_string().contains("Unknown window"));
    }
}
