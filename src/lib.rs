//! Audio-driven automatic camera-switching director.
//!
//! Continuously samples multi-channel microphone audio, scores each
//! microphone for speech activity, and drives a switch-state machine that
//! emits camera-cut and wide-shot commands to an external video mixer.

pub mod audio;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod director;
pub mod error;
pub mod output;
pub mod policy;
pub mod scoring;
pub mod state;

#[cfg(feature = "http")]
pub mod http;

/// Initialize the `log`/`env_logger` facade; call once from the binary.
pub fn init_logging() {
    env_logger::init();
}
