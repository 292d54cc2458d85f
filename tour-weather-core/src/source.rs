use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

pub mod openweather;
pub mod payload;

pub use openweather::OpenWeatherSource;

/// Remote weather data. Every call returns the raw JSON body of one response.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn get_current(&self, lat: f64, lon: f64, at: DateTime<Utc>) -> anyhow::Result<String>;

    /// One page of hourly samples anchored at `at`.
    async fn get_historical(&self, lat: f64, lon: f64, at: DateTime<Utc>)
    -> anyhow::Result<String>;

    async fn get_air_pollution(
        &self,
        lat: f64,
        lon: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<String>;
}
