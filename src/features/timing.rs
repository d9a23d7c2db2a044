//! Dwell and flight timing statistics for one session.

use crate::session::KeyEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0.0 for a single value
    pub std: f64,
    pub median: f64,
}

impl SummaryStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self { mean, std, median })
    }
}

/// Named timing features before they are laid out by a schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    pub dwell: SummaryStats,
    pub flight: SummaryStats,
}

impl TimingStats {
    /// `None` when fewer than two events exist (no flight time is defined).
    pub fn from_events(events: &[KeyEvent]) -> Option<Self> {
        if events.len() < 2 {
            return None;
        }
        let dwell: Vec<f64> = events.iter().map(KeyEvent::dwell_ms).collect();
        let flight: Vec<f64> = events
            .windows(2)
            .map(|w| w[1].down_ms - w[0].down_ms)
            .collect();
        Some(Self {
            dwell: SummaryStats::from_values(&dwell)?,
            flight: SummaryStats::from_values(&flight)?,
        })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let v = match name {
            "dwell_mean" => self.dwell.mean,
            "dwell_std" => self.dwell.std,
            "dwell_median" => self.dwell.median,
            "flight_mean" => self.flight.mean,
            "flight_std" => self.flight.std,
            "flight_median" => self.flight.median,
            _ => return None,
        };
        Some(v)
    }
}
