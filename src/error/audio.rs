// Audio intake error types

use std::fmt;

use log::error;

use crate::error::ErrorCode;

/// Errors raised by the audio intake backend.
///
/// Error code range: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No input device is available on this host.
    NoInputDevice,

    /// The backend failed to open a capture stream.
    StreamOpenFailed { reason: String },

    /// A mutex guarding intake state was poisoned.
    LockPoisoned { component: String },

    /// The backend is already running.
    AlreadyRunning,

    /// The backend is not running.
    NotRunning,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::NoInputDevice => 1001,
            AudioError::StreamOpenFailed { .. } => 1002,
            AudioError::LockPoisoned { .. } => 1003,
            AudioError::AlreadyRunning => 1004,
            AudioError::NotRunning => 1005,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::NoInputDevice => "no audio input device available".to_string(),
            AudioError::StreamOpenFailed { reason } => {
                format!("failed to open capture stream: {}", reason)
            }
            AudioError::LockPoisoned { component } => {
                format!("lock poisoned on {}", component)
            }
            AudioError::AlreadyRunning => "audio intake already running".to_string(),
            AudioError::NotRunning => "audio intake not running".to_string(),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AudioError {}

/// Log an audio error with its code and the operation it occurred in.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "audio error in {}: code={} message={}",
        context,
        err.code(),
        err.message()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AudioError::NoInputDevice.code(), 1001);
        assert_eq!(AudioError::AlreadyRunning.code(), 1004);
        assert_eq!(AudioError::NotRunning.code(), 1005);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = AudioError::StreamOpenFailed {
            reason: "busy".to_string(),
        };
        let text = format!("{}", err);
        assert!(text.contains("1002"));
        assert!(text.contains("busy"));
    }
}
