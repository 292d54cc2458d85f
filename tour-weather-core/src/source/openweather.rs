use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::config::Config;

use super::WeatherSource;

/// OpenWeatherMap One Call 3.0 and Air Pollution endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherSource {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Self::new(
            api_key.to_owned(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn fetch(&self, what: &str, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherSource {
    async fn get_current(&self, lat: f64, lon: f64, _at: DateTime<Utc>) -> Result<String> {
        self.fetch(
            "current",
            "/data/3.0/onecall",
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("exclude", "minutely,hourly,daily,alerts".to_string()),
            ],
        )
        .await
    }

    async fn get_historical(&self, lat: f64, lon: f64, at: DateTime<Utc>) -> Result<String> {
        self.fetch(
            "timemachine",
            "/data/3.0/onecall/timemachine",
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("dt", at.timestamp().to_string()),
                ("units", "metric".to_string()),
            ],
        )
        .await
    }

    async fn get_air_pollution(
        &self,
        lat: f64,
        lon: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String> {
        self.fetch(
            "air pollution",
            "/data/2.5/air_pollution/history",
            &[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("start", start.timestamp().to_string()),
                ("end", end.timestamp().to_string()),
            ],
        )
        .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut cut = MAX;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
