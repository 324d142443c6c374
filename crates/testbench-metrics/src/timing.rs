//! Wall-clock timing of the generation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Add, AddAssign};
use std::time::{Duration, Instant};

pub const PROMPT_START: &str = "prompt_start";
pub const PROMPT_END: &str = "prompt_end";
pub const API_START: &str = "api_start";
pub const API_END: &str = "api_end";
pub const PARSING_START: &str = "parsing_start";
pub const PARSING_END: &str = "parsing_end";
pub const ANALYSIS_START: &str = "analysis_start";
pub const ANALYSIS_END: &str = "analysis_end";

/// API time at or below this earns the full timing score.
const FAST_API_MS: f64 = 5_000.0;
/// API time at or above this earns nothing.
const SLOW_API_MS: f64 = 120_000.0;

/// Collects named instants and per-file durations for one generation run.
#[derive(Debug, Clone, Default)]
pub struct TimingCollector {
    started: Option<Instant>,
    markers: HashMap<String, Instant>,
    per_file: BTreeMap<String, u64>,
}

impl TimingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the clock. Markers from a previous run are dropped.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.markers.clear();
        self.per_file.clear();
    }

    pub fn mark(&mut self, marker: &str) {
        self.markers.insert(marker.to_string(), Instant::now());
    }

    pub fn record_file(&mut self, file_name: &str, duration: Duration) {
        self.per_file
            .insert(file_name.to_string(), duration_ms(duration));
    }

    /// Milliseconds between two markers, 0 when either is missing.
    pub fn duration_between(&self, start: &str, end: &str) -> u64 {
        match (self.markers.get(start), self.markers.get(end)) {
            (Some(s), Some(e)) => duration_ms(e.saturating_duration_since(*s)),
            _ => 0,
        }
    }

    pub fn metrics(&self) -> TimingMetrics {
        let total = self
            .started
            .map(|s| duration_ms(s.elapsed()))
            .unwrap_or(0);
        let average = if self.per_file.is_empty() {
            0.0
        } else {
            self.per_file.values().sum::<u64>() as f64 / self.per_file.len() as f64
        };

        TimingMetrics {
            total_generation_time_ms: total,
            prompt_generation_time_ms: self.duration_between(PROMPT_START, PROMPT_END),
            api_call_time_ms: self.duration_between(API_START, API_END),
            average_file_generation_time_ms: average,
            parsing_time_ms: self.duration_between(PARSING_START, PARSING_END),
            test_analysis_time_ms: self.duration_between(ANALYSIS_START, ANALYSIS_END),
            per_file_generation_times: self.per_file.clone(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Durations in milliseconds. Stored per source file in `timing.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingMetrics {
    pub total_generation_time_ms: u64,
    pub prompt_generation_time_ms: u64,
    pub api_call_time_ms: u64,
    pub average_file_generation_time_ms: f64,
    pub parsing_time_ms: u64,
    pub test_analysis_time_ms: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub per_file_generation_times: BTreeMap<String, u64>,
}

impl TimingMetrics {
    pub fn total_processing_time_ms(&self) -> u64 {
        self.total_generation_time_ms
            .saturating_add(self.test_analysis_time_ms)
    }

    pub fn is_empty(&self) -> bool {
        self.total_generation_time_ms == 0
            && self.prompt_generation_time_ms == 0
            && self.api_call_time_ms == 0
            && self.parsing_time_ms == 0
            && self.test_analysis_time_ms == 0
    }

    /// 0–100. Full marks up to 5 s of API time, none from 120 s on.
    ///
    /// A recorded timing of 0 ms is as fast as it gets. Missing timing is
    /// handled by the caller.
    pub fn score(&self) -> f64 {
        let api = self.api_call_time_ms as f64;
        if api <= FAST_API_MS {
            100.0
        } else if api >= SLOW_API_MS {
            0.0
        } else {
            100.0 * (SLOW_API_MS - api) / (SLOW_API_MS - FAST_API_MS)
        }
    }
}

impl Add for TimingMetrics {
    type Output = TimingMetrics;

    fn add(mut self, rhs: TimingMetrics) -> TimingMetrics {
        self += rhs;
        self
    }
}

impl AddAssign for TimingMetrics {
    fn add_assign(&mut self, rhs: TimingMetrics) {
        self.total_generation_time_ms = self
            .total_generation_time_ms
            .saturating_add(rhs.total_generation_time_ms);
        self.prompt_generation_time_ms = self
            .prompt_generation_time_ms
            .saturating_add(rhs.prompt_generation_time_ms);
        self.api_call_time_ms = self.api_call_time_ms.saturating_add(rhs.api_call_time_ms);
        self.average_file_generation_time_ms += rhs.average_file_generation_time_ms;
        self.parsing_time_ms = self.parsing_time_ms.saturating_add(rhs.parsing_time_ms);
        self.test_analysis_time_ms = self
            .test_analysis_time_ms
            .saturating_add(rhs.test_analysis_time_ms);
        self.per_file_generation_times
            .extend(rhs.per_file_generation_times);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_markers_are_zero() {
        let mut collector = TimingCollector::new();
        collector.start();
        collector.mark(API_START);

        let metrics = collector.metrics();
        assert_eq!(metrics.api_call_time_ms, 0);
        assert_eq!(metrics.prompt_generation_time_ms, 0);
        assert_eq!(metrics.average_file_generation_time_ms, 0.0);
    }

    #[test]
    fn test_marked_durations() {
        let mut collector = TimingCollector::new();
        collector.start();
        collector.mark(API_START);
        std::thread::sleep(Duration::from_millis(15));
        collector.mark(API_END);
        collector.record_file("A.kt", Duration::from_millis(100));
        collector.record_file("B.kt", Duration::from_millis(300));

        let metrics = collector.metrics();
        assert!(metrics.api_call_time_ms >= 15);
        assert_eq!(metrics.average_file_generation_time_ms, 200.0);
        assert_eq!(metrics.per_file_generation_times.len(), 2);
    }

    #[test]
    fn test_timing_score_curve() {
        let at = |api_call_time_ms| TimingMetrics {
            total_generation_time_ms: 1,
            api_call_time_ms,
            ..Default::default()
        };

        assert_eq!(at(1_000).score(), 100.0);
        assert_eq!(at(5_000).score(), 100.0);
        assert_eq!(at(62_500).score(), 50.0);
        assert_eq!(at(200_000).score(), 0.0);
    }

    #[test]
    fn test_zero_millisecond_timing_scores_full() {
        let instant = TimingMetrics {
            per_file_generation_times: BTreeMap::from([("A.kt".to_string(), 0)]),
            ..Default::default()
        };
        let one_ms = TimingMetrics {
            total_generation_time_ms: 1,
            ..instant.clone()
        };

        assert!(instant.is_empty());
        assert_eq!(instant.score(), 100.0);
        assert_eq!(instant.score(), one_ms.score());
        assert_eq!(TimingMetrics::default().score(), 100.0);
    }

    #[test]
    fn test_add_and_total_processing() {
        let a = TimingMetrics {
            total_generation_time_ms: 100,
            test_analysis_time_ms: 5,
            ..Default::default()
        };
        let b = TimingMetrics {
            total_generation_time_ms: 50,
            api_call_time_ms: 40,
            ..Default::default()
        };

        let sum = a + b;
        assert_eq!(sum.total_generation_time_ms, 150);
        assert_eq!(sum.api_call_time_ms, 40);
        assert_eq!(sum.total_processing_time_ms(), 155);
    }

    #[test]
    fn test_timing_json_shape() {
        let json = r#"{"total_generation_time_ms": 10, "api_call_time_ms": 7}"#;
        let metrics: TimingMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.api_call_time_ms, 7);
        assert_eq!(metrics.parsing_time_ms, 0);
    }
}
