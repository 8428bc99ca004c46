use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::AudioError;

use super::{AudioBackend, LevelSink};

/// Backend used in tests and for deterministic demos: never opens a real
/// device, accepts levels pushed directly via [`StubBackend::feed`].
pub struct StubBackend {
    running: AtomicBool,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Push a synthetic level snapshot as if it arrived from hardware.
    pub fn feed(&self, sink: &Arc<dyn LevelSink>, levels: Vec<(usize, f32)>, at: f64) {
        sink.publish(levels, at);
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for StubBackend {
    fn start(&self, _channels: usize, _sink: Arc<dyn LevelSink>) -> Result<(), AudioError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AudioError::AlreadyRunning);
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(AudioError::NotRunning);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LevelIntake;

    #[test]
    fn start_twice_fails() {
        let backend = StubBackend::new();
        let intake = Arc::new(LevelIntake::new());
        assert!(backend.start(2, intake.clone()).is_ok());
        assert!(backend.start(2, intake).is_err());
    }

    #[test]
    fn feed_reaches_sink() {
        let backend = StubBackend::new();
        let intake: Arc<dyn LevelSink> = Arc::new(LevelIntake::new());
        backend.feed(&intake, vec![(1, -20.0)], 1.0);
    }
}
