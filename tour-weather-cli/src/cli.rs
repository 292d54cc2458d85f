use std::{fmt::Write as _, sync::Arc};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode};
use tour_weather_core::{
    Config, FileRequestBudget, HistoricalWeatherAggregator, LatLon, OpenWeatherSource,
    RequestBudget, TourQuery, TourWeatherSummary, wind_direction_text,
};
use tracing::debug;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tour-weather", version, about = "Historical weather for recorded tours")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and the daily request limit.
    Configure,

    /// Retrieve the weather for one tour.
    Tour {
        /// Tour start as RFC 3339, e.g. "2024-06-01T08:30:00+02:00".
        #[arg(long)]
        start: String,

        /// Elapsed time in minutes.
        #[arg(long)]
        duration: i64,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// IANA time zone of the tour.
        #[arg(long, default_value = "UTC")]
        tz: String,
    },

    /// Show how many provider requests were made today.
    Budget,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Tour { start, duration, lat, lon, tz } => {
                show_tour(&start, duration, LatLon::new(lat, lon), &tz).await
            }
            Command::Budget => show_budget(),
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let limit = CustomType::<u32>::new("Daily request limit (0 = unlimited):")
        .with_default(cfg.daily_request_limit)
        .with_error_message("Please enter a whole number")
        .prompt()
        .context("Failed to read request limit")?;

    cfg.set_api_key(api_key);
    cfg.daily_request_limit = limit;
    cfg.require_api_key()?;
    cfg.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show_tour(start: &str, minutes: i64, center: LatLon, tz: &str) -> anyhow::Result<()> {
    let start = parse_start(start)?;
    if minutes < 0 {
        return Err(anyhow!("Duration must not be negative, got {minutes} minutes"));
    }
    let time_zone = tz.parse::<Tz>().map_err(|e| anyhow!("Unknown time zone '{tz}': {e}"))?;

    let cfg = Config::load()?;
    let budget_path = Config::budget_file_path()?;
    debug!(budget = %budget_path.display(), limit = cfg.daily_request_limit, "using request budget");

    let source = OpenWeatherSource::from_config(&cfg)?;
    let budget = FileRequestBudget::new(budget_path, cfg.daily_request_limit);
    let aggregator = HistoricalWeatherAggregator::new(Box::new(source), Arc::new(budget));

    let query = TourQuery { start, elapsed_seconds: minutes * 60, time_zone, center };

    match aggregator.retrieve(&query).await {
        Some(summary) => print!("{}", render_summary(&summary)),
        None => println!("No weather data is available for this tour."),
    }

    Ok(())
}

fn show_budget() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let budget = FileRequestBudget::new(Config::budget_file_path()?, cfg.daily_request_limit);

    let used = budget.used_today();
    if budget.limit() == 0 {
        println!("Requests today: {used} (unlimited)");
    } else {
        println!("Requests today: {used} of {}", budget.limit());
    }

    Ok(())
}

fn parse_start(value: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid start time '{value}', expected RFC 3339"))
}

fn render_summary(summary: &TourWeatherSummary) -> String {
    let mut out = String::new();

    if let Some(weather) = &summary.weather {
        let clouds = weather.clouds.map(|c| format!(" [{c}]")).unwrap_or_default();
        let _ = writeln!(out, "Weather:      {}{clouds}", weather.description);
        let _ = writeln!(
            out,
            "Temperature:  {:.1} °C (min {:.1}, max {:.1}, feels like {:.1})",
            weather.temperature_average,
            weather.temperature_min,
            weather.temperature_max,
            weather.feels_like_average,
        );
        let _ = writeln!(out, "Humidity:     {:.0} %", weather.humidity_average);
        let _ = writeln!(out, "Pressure:     {:.0} hPa", weather.pressure_average);
        let _ = writeln!(
            out,
            "Wind:         {:.1} km/h from {} ({}°)",
            weather.wind_speed_average,
            wind_direction_text(weather.wind_direction),
            weather.wind_direction,
        );
        let _ = writeln!(
            out,
            "Precipitation: {:.1} mm rain, {:.1} mm snow",
            weather.precipitation_total, weather.snowfall_total
        );
    }

    if let Some(air_quality) = summary.air_quality {
        let _ = writeln!(out, "Air quality:  {air_quality}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tour_weather_core::{AirQuality, CloudKind, SampleAggregate};

    #[test]
    fn parse_start_converts_to_utc() {
        let start = parse_start("2024-06-01T08:30:00+02:00").unwrap();
        assert_eq!(start.to_rfc3339(), "2024-06-01T06:30:00+00:00");
    }

    #[test]
    fn parse_start_rejects_garbage() {
        let err = parse_start("yesterday").unwrap_err();
        assert!(err.to_string().contains("expected RFC 3339"));
    }

    #[test]
    fn render_full_summary() {
        let summary = TourWeatherSummary {
            weather: Some(SampleAggregate {
                description: "light rain".into(),
                clouds: Some(CloudKind::Rain),
                temperature_average: 12.0,
                wind_speed_average: 9.0,
                wind_direction: 225,
                sample_count: 2,
                ..SampleAggregate::default()
            }),
            air_quality: Some(AirQuality::Moderate),
        };

        let out = render_summary(&summary);

        assert!(out.contains("light rain [weather-rain]"));
        assert!(out.contains("12.0 °C"));
        assert!(out.contains("9.0 km/h from SW (225°)"));
        assert!(out.contains("Air quality:  Moderate"));
    }

    #[test]
    fn render_air_quality_only() {
        let summary = TourWeatherSummary { weather: None, air_quality: Some(AirQuality::Good) };

        assert_eq!(render_summary(&summary), "Air quality:  Good\n");
    }
}
