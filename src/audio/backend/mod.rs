//! Backend abstraction for audio capture.

use crate::error::AudioError;

/// Sink the capture backend pushes computed per-channel levels into.
///
/// Implemented by [`crate::audio::LevelSnapshot`]; kept as a trait so
/// backends stay decoupled from the snapshot's locking strategy.
pub trait LevelSink: Send + Sync {
    fn publish(&self, channel_levels_db: Vec<(usize, f32)>, at: f64);
}

/// Trait implemented by platform-specific (or stub) audio capture backends.
pub trait AudioBackend: Send + Sync {
    /// Open the capture device and begin publishing level snapshots to
    /// `sink` on every block arrival.
    fn start(&self, channels: usize, sink: std::sync::Arc<dyn LevelSink>) -> Result<(), AudioError>;

    fn stop(&self) -> Result<(), AudioError>;
}

mod cpal_backend;
mod stub;

pub use cpal_backend::CpalBackend;
pub use stub::StubBackend;
