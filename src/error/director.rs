// Director-level error types (the tick, config apply, reload)

use std::fmt;

use log::error;

use crate::error::ErrorCode;

/// Errors raised by the director's own orchestration, as opposed to a
/// specific subsystem (audio, calibration).
///
/// Error code range: 3001-3003
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorError {
    /// A lock guarding director state was poisoned.
    StatePoisoned,

    /// Rewriting the on-disk config file during calibration apply failed.
    ConfigWriteFailed { reason: String },

    /// Reloading configuration after an apply failed.
    ReloadFailed { reason: String },
}

impl ErrorCode for DirectorError {
    fn code(&self) -> i32 {
        match self {
            DirectorError::StatePoisoned => 3001,
            DirectorError::ConfigWriteFailed { .. } => 3002,
            DirectorError::ReloadFailed { .. } => 3003,
        }
    }

    fn message(&self) -> String {
        match self {
            DirectorError::StatePoisoned => "director state lock poisoned".to_string(),
            DirectorError::ConfigWriteFailed { reason } => {
                format!("failed to write config: {}", reason)
            }
            DirectorError::ReloadFailed { reason } => {
                format!("failed to reload director: {}", reason)
            }
        }
    }
}

impl fmt::Display for DirectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectorError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for DirectorError {}

/// Log a director error with its code and the operation it occurred in.
pub fn log_director_error(err: &DirectorError, context: &str) {
    error!(
        "director error in {}: code={} message={}",
        context,
        err.code(),
        err.message()
    );
}
