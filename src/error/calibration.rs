// Calibration error types

use std::fmt;

use log::error;

use crate::error::ErrorCode;

/// Errors raised by the calibration workflow.
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// A calibration session is already open for this mic.
    AlreadyInProgress { mic_id: String },

    /// No open session or stored result exists for this mic.
    NotFound { mic_id: String },

    /// The mic id named in a calibration request is not in configuration.
    UnknownMic { mic_id: String },

    /// A lock guarding calibration state was poisoned.
    StatePoisoned,
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::AlreadyInProgress { .. } => 2001,
            CalibrationError::NotFound { .. } => 2002,
            CalibrationError::UnknownMic { .. } => 2003,
            CalibrationError::StatePoisoned => 2004,
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::AlreadyInProgress { mic_id } => {
                format!("calibration already in progress for {}", mic_id)
            }
            CalibrationError::NotFound { mic_id } => {
                format!("no calibration result available for {}", mic_id)
            }
            CalibrationError::UnknownMic { mic_id } => {
                format!("unknown mic id {}", mic_id)
            }
            CalibrationError::StatePoisoned => "calibration state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CalibrationError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for CalibrationError {}

/// Log a calibration error with its code and the operation it occurred in.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    error!(
        "calibration error in {}: code={} message={}",
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
        assert_eq!(
            CalibrationError::AlreadyInProgress {
                mic_id: "m1".into()
            }
            .code(),
            2001
        );
        assert_eq!(CalibrationError::StatePoisoned.code(), 2004);
    }

    #[test]
    fn message_includes_mic_id() {
        let err = CalibrationError::NotFound {
            mic_id: "m2".to_string(),
        };
        assert!(err.message().contains("m2"));
    }
}
