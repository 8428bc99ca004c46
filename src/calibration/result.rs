//! The derived suggestion produced when a calibration session terminates.

use serde::{Deserialize, Serialize};

/// Suggested threshold/weight for a mic id, plus the statistics they were
/// derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub suggested_threshold_db: f32,
    pub suggested_weight: f32,
    pub avg_db: f32,
    pub peak_db: f32,
    pub samples: usize,
}

impl CalibrationResult {
    /// The result for a session that never received a sample.
    pub fn empty() -> Self {
        Self {
            suggested_threshold_db: -45.0,
            suggested_weight: 1.0,
            avg_db: -100.0,
            peak_db: -100.0,
            samples: 0,
        }
    }

    /// Derive a result from a non-empty buffer of level samples.
    ///
    /// `suggested_threshold_db` = avg - 10 dB, rounded to one decimal.
    /// `suggested_weight` leans the mic quieter (1.2) when its peak never
    /// gets loud, or louder (0.8) when its peak runs hot, rounded to two
    /// decimals; otherwise the neutral 1.0.
    pub fn from_samples(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::empty();
        }

        let count = samples.len();
        let sum: f32 = samples.iter().sum();
        let avg = sum / count as f32;
        let peak = samples.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        let suggested_threshold_db = round_to(avg - 10.0, 1);
        let suggested_weight = if peak < -50.0 {
            1.2
        } else if peak > -30.0 {
            0.8
        } else {
            1.0
        };

        Self {
            suggested_threshold_db,
            suggested_weight: round_to(suggested_weight, 2),
            avg_db: avg,
            peak_db: peak,
            samples: count,
        }
    }
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}
