//! A single calibration session bound to one mic id.

use super::CalibrationResult;

/// Accumulates level samples for one mic over a fixed window.
///
/// Termination is time-based (`now - t0 >= duration_s`), independent of
/// sample count, so a stalled audio feed still terminates the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSession {
    mic_id: String,
    started_at: f64,
    duration_s: f64,
    samples: Vec<f32>,
}

/// Default calibration window, per the configured suggestion algorithm.
pub const DEFAULT_DURATION_S: f64 = 5.0;

impl CalibrationSession {
    pub fn new(mic_id: impl Into<String>, started_at: f64) -> Self {
        Self::with_duration(mic_id, started_at, DEFAULT_DURATION_S)
    }

    pub fn with_duration(mic_id: impl Into<String>, started_at: f64, duration_s: f64) -> Self {
        Self {
            mic_id: mic_id.into(),
            started_at,
            duration_s,
            samples: Vec::new(),
        }
    }

    pub fn mic_id(&self) -> &str {
        &self.mic_id
    }

    /// Append a level sample. Callers drive sessions only while `done(now)`
    /// is false; this never checks time itself so a session always records
    /// what it's fed.
    pub fn feed(&mut self, level_db: f32) {
        self.samples.push(level_db);
    }

    /// Whether the session's window has elapsed as of `now`.
    pub fn done(&self, now: f64) -> bool {
        now - self.started_at >= self.duration_s
    }

    /// Derive the final suggestion from accumulated samples.
    pub fn result(&self) -> CalibrationResult {
        CalibrationResult::from_samples(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_done_before_duration_elapses() {
        let session = CalibrationSession::with_duration("m1", 0.0, 5.0);
        assert!(!session.done(4.9));
    }

    #[test]
    fn done_once_duration_elapses() {
        let session = CalibrationSession::with_duration("m1", 0.0, 5.0);
        assert!(session.done(5.0));
        assert!(session.done(6.0));
    }

    #[test]
    fn feed_accumulates_samples_into_result() {
        let mut session = CalibrationSession::with_duration("m1", 0.0, 5.0);
        session.feed(-30.0);
        session.feed(-30.0);
        let result = session.result();
        assert_eq!(result.samples, 2);
        assert_eq!(result.avg_db, -30.0);
    }

    #[test]
    fn result_is_empty_default_without_samples() {
        let session = CalibrationSession::with_duration("m1", 0.0, 5.0);
        let result = session.result();
        assert_eq!(result.samples, 0);
        assert_eq!(result.suggested_threshold_db, -45.0);
    }
}
