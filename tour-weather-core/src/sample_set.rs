//! Accumulation and aggregation of hourly weather samples for one tour.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{CloudKind, WeatherSample};

/// Samples up to this many seconds outside the tour are still considered representative.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 1800;

/// Ordered collection of samples, unique by timestamp.
#[derive(Debug, Clone, Default)]
pub struct WeatherSampleSet {
    samples: Vec<WeatherSample>,
    timestamps: HashSet<i64>,
}

/// Aggregated values over a sample set. Numeric fields are 0 when the set was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SampleAggregate {
    pub description: String,
    pub clouds: Option<CloudKind>,
    pub temperature_average: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub feels_like_average: f64,
    pub humidity_average: f64,
    pub pressure_average: f64,
    pub precipitation_total: f64,
    pub snowfall_total: f64,
    pub wind_speed_average: f64,
    pub wind_direction: i32,
    pub sample_count: usize,
}

impl WeatherSampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every sample whose timestamp is not present yet, returns how many were added.
    pub fn merge_add<I>(&mut self, new_samples: I) -> usize
    where
        I: IntoIterator<Item = WeatherSample>,
    {
        let before = self.samples.len();

        for sample in new_samples {
            if self.timestamps.insert(sample.timestamp) {
                self.samples.push(sample);
            }
        }

        self.samples.len() - before
    }

    /// Keeps samples within `[window_start - 1800, window_end + 1800]`.
    pub fn filter_to_window(&mut self, window_start: i64, window_end: i64) -> bool {
        self.filter_to_window_with_tolerance(window_start, window_end, DEFAULT_TOLERANCE_SECONDS)
    }

    pub fn filter_to_window_with_tolerance(
        &mut self,
        window_start: i64,
        window_end: i64,
        tolerance_seconds: i64,
    ) -> bool {
        let lower = window_start.saturating_sub(tolerance_seconds);
        let upper = window_end.saturating_add(tolerance_seconds);

        self.samples.retain(|s| s.timestamp >= lower && s.timestamp <= upper);
        self.timestamps = self.samples.iter().map(|s| s.timestamp).collect();

        !self.samples.is_empty()
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.timestamp).max()
    }

    /// Aggregates all remaining samples. Description and clouds come from the
    /// sample closest to `midpoint`.
    pub fn aggregate(&self, midpoint: i64) -> SampleAggregate {
        if self.samples.is_empty() {
            return SampleAggregate::default();
        }

        let count = self.samples.len() as f64;

        let mut aggregate = SampleAggregate {
            temperature_min: f64::MAX,
            temperature_max: f64::MIN,
            sample_count: self.samples.len(),
            ..SampleAggregate::default()
        };

        let mut temperature_sum = 0.0;
        let mut feels_like_sum = 0.0;
        let mut humidity_sum = 0.0;
        let mut pressure_sum = 0.0;

        for sample in &self.samples {
            temperature_sum += sample.temperature;
            feels_like_sum += sample.feels_like;
            humidity_sum += f64::from(sample.humidity);
            pressure_sum += f64::from(sample.pressure);

            aggregate.temperature_min = aggregate.temperature_min.min(sample.temperature);
            aggregate.temperature_max = aggregate.temperature_max.max(sample.temperature);
            aggregate.precipitation_total += sample.precipitation;
            aggregate.snowfall_total += sample.snowfall;
        }

        aggregate.temperature_average = temperature_sum / count;
        aggregate.feels_like_average = feels_like_sum / count;
        aggregate.humidity_average = humidity_sum / count;
        aggregate.pressure_average = pressure_sum / count;

        let (speed, direction) =
            average_wind(self.samples.iter().map(|s| (s.wind_speed, s.wind_direction)));
        aggregate.wind_speed_average = speed;
        aggregate.wind_direction = direction;

        let nearest = self
            .samples
            .iter()
            .min_by_key(|s| (s.timestamp.abs_diff(midpoint), s.timestamp));
        if let Some(nearest) = nearest {
            aggregate.description = nearest.description.clone();
            aggregate.clouds = CloudKind::from_weather_code(nearest.weather_code);
        }

        aggregate
    }
}

/// Vector mean of `(speed, direction in degrees)` pairs.
///
/// Returns the magnitude of the mean vector and its direction rounded into 0..=359.
/// Opposing winds cancel out, so the returned speed can be far below the arithmetic mean.
pub fn average_wind<I>(winds: I) -> (f64, i32)
where
    I: IntoIterator<Item = (f64, i32)>,
{
    let mut east = 0.0;
    let mut north = 0.0;
    let mut count = 0usize;

    for (speed, direction) in winds {
        let radians = f64::from(direction).to_radians();
        east += speed * radians.sin();
        north += speed * radians.cos();
        count += 1;
    }

    if count == 0 {
        return (0.0, 0);
    }

    east /= count as f64;
    north /= count as f64;

    let speed = east.hypot(north);
    let degrees = east.atan2(north).to_degrees().rem_euclid(360.0);

    (speed, (degrees.round() as i32).rem_euclid(360))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64, temperature: f64) -> WeatherSample {
        WeatherSample {
            timestamp,
            temperature,
            feels_like: temperature - 1.0,
            humidity: 50,
            pressure: 1010,
            wind_speed: 10.0,
            wind_direction: 90,
            precipitation: 0.5,
            snowfall: 0.0,
            weather_code: 800,
            description: format!("sample at {timestamp}"),
        }
    }

    #[test]
    fn merge_add_drops_duplicate_timestamps() {
        let mut set = WeatherSampleSet::new();

        let added = set.merge_add(vec![sample(0, 1.0), sample(3600, 2.0), sample(7200, 3.0)]);
        assert_eq!(added, 3);

        let added = set.merge_add(vec![sample(3600, 99.0), sample(7200, 99.0), sample(10800, 4.0)]);
        assert_eq!(added, 1);

        let timestamps: Vec<i64> = set.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![0, 3600, 7200, 10800]);
        // the first arrival wins
        assert_eq!(set.samples()[1].temperature, 2.0);
    }

    #[test]
    fn merge_add_drops_duplicates_within_one_page() {
        let mut set = WeatherSampleSet::new();

        let added = set.merge_add(vec![sample(0, 1.0), sample(0, 2.0)]);

        assert_eq!(added, 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn re_adding_is_idempotent() {
        let mut set = WeatherSampleSet::new();
        let page = vec![sample(0, 1.0), sample(3600, 2.0)];

        set.merge_add(page.clone());
        let added = set.merge_add(page);

        assert_eq!(added, 0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn filter_keeps_tolerance_band() {
        let mut set = WeatherSampleSet::new();
        set.merge_add((0..10).map(|h| sample(h * 1800, 0.0)));

        let start = 3 * 1800;
        let end = 5 * 1800;
        assert!(set.filter_to_window(start, end));

        for s in set.samples() {
            assert!(s.timestamp >= start - DEFAULT_TOLERANCE_SECONDS);
            assert!(s.timestamp <= end + DEFAULT_TOLERANCE_SECONDS);
        }
        assert_eq!(set.first_timestamp(), Some(2 * 1800));
        assert_eq!(set.last_timestamp(), Some(6 * 1800));
    }

    #[test]
    fn filter_reports_empty_result() {
        let mut set = WeatherSampleSet::new();
        set.merge_add(vec![sample(0, 1.0)]);

        assert!(!set.filter_to_window(10_000, 20_000));
        assert!(set.is_empty());

        // the dedup index follows the filter
        assert_eq!(set.merge_add(vec![sample(0, 1.0)]), 1);
    }

    #[test]
    fn aggregate_of_empty_set_is_zero() {
        let aggregate = WeatherSampleSet::new().aggregate(0);

        assert_eq!(aggregate.temperature_average, 0.0);
        assert_eq!(aggregate.temperature_min, 0.0);
        assert_eq!(aggregate.temperature_max, 0.0);
        assert_eq!(aggregate.feels_like_average, 0.0);
        assert_eq!(aggregate.humidity_average, 0.0);
        assert_eq!(aggregate.pressure_average, 0.0);
        assert_eq!(aggregate.precipitation_total, 0.0);
        assert_eq!(aggregate.snowfall_total, 0.0);
        assert_eq!(aggregate.wind_speed_average, 0.0);
        assert_eq!(aggregate.wind_direction, 0);
        assert_eq!(aggregate.sample_count, 0);
        assert!(aggregate.description.is_empty());
        assert_eq!(aggregate.clouds, None);
    }

    #[test]
    fn aggregate_computes_statistics() {
        let mut set = WeatherSampleSet::new();
        set.merge_add(vec![sample(0, 10.0), sample(3600, 12.0), sample(7200, 14.0)]);

        let aggregate = set.aggregate(3600);

        assert_eq!(aggregate.temperature_average, 12.0);
        assert_eq!(aggregate.temperature_min, 10.0);
        assert_eq!(aggregate.temperature_max, 14.0);
        assert_eq!(aggregate.feels_like_average, 11.0);
        assert_eq!(aggregate.humidity_average, 50.0);
        assert_eq!(aggregate.pressure_average, 1010.0);
        assert!((aggregate.precipitation_total - 1.5).abs() < 1e-9);
        assert!((aggregate.wind_speed_average - 10.0).abs() < 1e-9);
        assert_eq!(aggregate.wind_direction, 90);
        assert_eq!(aggregate.sample_count, 3);
    }

    #[test]
    fn description_comes_from_sample_nearest_midpoint() {
        let mut set = WeatherSampleSet::new();
        let mut rainy = sample(3600, 5.0);
        rainy.weather_code = 501;
        rainy.description = "moderate rain".to_string();
        set.merge_add(vec![sample(0, 5.0), rainy, sample(7200, 5.0)]);

        let aggregate = set.aggregate(4000);

        assert_eq!(aggregate.description, "moderate rain");
        assert_eq!(aggregate.clouds, Some(CloudKind::Rain));
    }

    #[test]
    fn description_tie_goes_to_earlier_sample() {
        let mut set = WeatherSampleSet::new();
        let mut later = sample(7200, 5.0);
        later.description = "later".to_string();
        let mut earlier = sample(0, 5.0);
        earlier.description = "earlier".to_string();
        // later arrives first
        set.merge_add(vec![later, earlier]);

        assert_eq!(set.aggregate(3600).description, "earlier");
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let mut set = WeatherSampleSet::new();
        set.merge_add(vec![sample(i64::MIN, 1.0), sample(i64::MAX, 2.0)]);

        let aggregate = set.aggregate(0);
        assert_eq!(aggregate.sample_count, 2);
        // i64::MAX is one second closer to 0 than i64::MIN
        assert_eq!(aggregate.description, format!("sample at {}", i64::MAX));

        assert!(set.filter_to_window(i64::MIN, i64::MAX));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn wind_direction_mean_wraps_around_north() {
        let (speed, direction) = average_wind(vec![(10.0, 350), (10.0, 10)]);

        assert_eq!(direction, 0);
        assert!(speed > 9.0);
    }

    #[test]
    fn opposing_winds_cancel() {
        let (speed, _) = average_wind(vec![(10.0, 0), (10.0, 90), (10.0, 180), (10.0, 270)]);

        assert!(speed.abs() < 1e-9, "got {speed}");
    }

    #[test]
    fn wind_mean_of_nothing_is_zero() {
        assert_eq!(average_wind(Vec::new()), (0.0, 0));
    }
}
