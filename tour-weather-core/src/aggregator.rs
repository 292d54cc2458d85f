//! Retrieval of the weather for one tour.
//!
//! Historical data is paged in hourly chunks until the tour is covered, air
//! quality is requested separately, and both are folded into one
//! [`TourWeatherSummary`]. Every failure degrades to "no data" for the step
//! that failed; nothing here returns an error to the caller.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::{
    budget::RequestBudget,
    error::StepError,
    model::{AirQuality, AirQualitySample, TourQuery},
    sample_set::{DEFAULT_TOLERANCE_SECONDS, WeatherSampleSet},
    source::{
        WeatherSource,
        payload::{parse_air_pollution, parse_current, parse_hourly_page},
    },
    summary::{TourRecord, TourWeatherSummary},
};

const HOUR_SECONDS: i64 = 3600;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct HistoricalWeatherAggregator {
    source: Box<dyn WeatherSource>,
    budget: Arc<dyn RequestBudget>,
    clock: Box<dyn Clock>,
    tolerance_seconds: i64,
}

impl HistoricalWeatherAggregator {
    pub fn new(source: Box<dyn WeatherSource>, budget: Arc<dyn RequestBudget>) -> Self {
        Self {
            source,
            budget,
            clock: Box::new(SystemClock),
            tolerance_seconds: DEFAULT_TOLERANCE_SECONDS,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_tolerance(mut self, tolerance_seconds: i64) -> Self {
        self.tolerance_seconds = tolerance_seconds;
        self
    }

    /// Retrieves the weather for `tour` and writes it through the tour's setters.
    ///
    /// Returns `false` when no weather data is available for this tour.
    pub async fn retrieve_for<T: TourRecord + ?Sized>(&self, tour: &mut T) -> bool {
        let time_zone = match tour.time_zone_id().parse::<Tz>() {
            Ok(tz) => tz,
            Err(err) => {
                warn!(time_zone = tour.time_zone_id(), "unknown time zone, using UTC: {err}");
                Tz::UTC
            }
        };

        let query = TourQuery {
            start: tour.start_time(),
            elapsed_seconds: tour.elapsed_seconds(),
            time_zone,
            center: tour.search_center(),
        };

        match self.retrieve(&query).await {
            Some(summary) => {
                summary.apply_to(tour);
                true
            }
            None => false,
        }
    }

    pub async fn retrieve(&self, query: &TourQuery) -> Option<TourWeatherSummary> {
        let now = self.clock.now();

        if same_local_hour(query.start, now, query.time_zone) {
            return self.retrieve_current(query).await;
        }

        let hourly = match self.collect_hourly(query, now).await {
            Ok(samples) => Some(samples),
            Err(err) => {
                warn!("historical weather unavailable: {err}");
                None
            }
        };

        let air_quality = match self.collect_air_quality(query).await {
            Ok(samples) => AirQuality::from_samples(&samples),
            Err(err) => {
                warn!("air quality unavailable: {err}");
                None
            }
        };

        let weather = hourly.and_then(|mut samples| {
            let covered = samples.filter_to_window_with_tolerance(
                query.start.timestamp(),
                query.end().timestamp(),
                self.tolerance_seconds,
            );
            covered.then(|| samples.aggregate(query.midpoint().timestamp()))
        });

        let summary = TourWeatherSummary { weather, air_quality };
        if summary.is_empty() {
            info!(start = %query.start, "no weather data available for tour");
            return None;
        }

        info!(
            start = %query.start,
            samples = summary.weather.as_ref().map_or(0, |w| w.sample_count),
            air_quality = ?summary.air_quality,
            "tour weather retrieved"
        );
        Some(summary)
    }

    async fn retrieve_current(&self, query: &TourQuery) -> Option<TourWeatherSummary> {
        match self.fetch_current(query).await {
            Ok(samples) => Some(TourWeatherSummary {
                weather: Some(samples.aggregate(query.midpoint().timestamp())),
                air_quality: None,
            }),
            Err(err) => {
                warn!("current weather unavailable: {err}");
                None
            }
        }
    }

    async fn fetch_current(&self, query: &TourQuery) -> Result<WeatherSampleSet, StepError> {
        if !self.budget.try_consume() {
            return Err(StepError::BudgetExhausted);
        }

        debug!(start = %query.start, "tour started this hour, requesting current weather");

        let body = self
            .source
            .get_current(query.center.lat, query.center.lon, query.start)
            .await
            .map_err(StepError::Transport)?;
        let sample = parse_current(&body).map_err(StepError::Payload)?;

        let mut samples = WeatherSampleSet::new();
        samples.merge_add([sample]);
        Ok(samples)
    }

    /// Pages through hourly history until the tour end is covered.
    async fn collect_hourly(
        &self,
        query: &TourQuery,
        now: DateTime<Utc>,
    ) -> Result<WeatherSampleSet, StepError> {
        let tour_end = query.end().timestamp();
        let now = now.timestamp();

        let mut samples = WeatherSampleSet::new();
        let mut requested = query.start.timestamp();
        let mut pages = 0u32;

        loop {
            if requested > now {
                if samples.is_empty() {
                    return Err(StepError::FutureTime(requested));
                }
                debug!(requested, pages, "next page would be in the future, stopping");
                break;
            }

            if !self.budget.try_consume() {
                if samples.is_empty() {
                    return Err(StepError::BudgetExhausted);
                }
                warn!(pages, "daily request budget exhausted, keeping partial coverage");
                break;
            }

            let at = DateTime::from_timestamp(requested, 0)
                .ok_or_else(|| StepError::Payload(anyhow!("timestamp {requested} out of range")))?;

            debug!(requested, pages, "requesting historical page");

            let body = self
                .source
                .get_historical(query.center.lat, query.center.lon, at)
                .await
                .map_err(StepError::Transport)?;
            let page = parse_hourly_page(&body).map_err(StepError::Payload)?;
            if page.is_empty() {
                return Err(StepError::EmptyPage(requested));
            }

            pages += 1;
            let added = samples.merge_add(page);
            let last = samples.last_timestamp().unwrap_or(requested);

            if last.saturating_add(self.tolerance_seconds) >= tour_end {
                debug!(pages, last, "tour is covered");
                break;
            }

            if added == 0 {
                warn!(requested, "page contained no new samples, stopping");
                break;
            }

            requested = last
                .saturating_add(HOUR_SECONDS)
                .max(requested.saturating_add(HOUR_SECONDS));
        }

        Ok(samples)
    }

    async fn collect_air_quality(
        &self,
        query: &TourQuery,
    ) -> Result<Vec<AirQualitySample>, StepError> {
        let body = self
            .source
            .get_air_pollution(query.center.lat, query.center.lon, query.start, query.end())
            .await
            .map_err(StepError::Transport)?;

        parse_air_pollution(&body).map_err(StepError::Payload)
    }
}

/// Whether `a` and `b` fall into the same clock hour in `tz`.
fn same_local_hour(a: DateTime<Utc>, b: DateTime<Utc>, tz: Tz) -> bool {
    hour_start(a, tz) == hour_start(b, tz)
}

fn hour_start(instant: DateTime<Utc>, tz: Tz) -> i64 {
    let local = instant.with_timezone(&tz);
    local.timestamp() - i64::from(local.minute() * 60 + local.second())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn same_hour_in_utc() {
        let a = Utc.with_ymd_and_hms(2024, 6, 1, 10, 5, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 1, 10, 59, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap();

        assert!(same_local_hour(a, b, Tz::UTC));
        assert!(!same_local_hour(b, c, Tz::UTC));
    }

    #[test]
    fn half_hour_offsets_shift_the_hour_boundary() {
        // 10:20 and 10:40 UTC are 15:50 and 16:10 in Kolkata (UTC+05:30).
        let a = Utc.with_ymd_and_hms(2024, 6, 1, 10, 20, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 6, 1, 10, 40, 0).unwrap();

        assert!(same_local_hour(a, b, Tz::UTC));
        assert!(!same_local_hour(a, b, chrono_tz::Asia::Kolkata));
    }
}
