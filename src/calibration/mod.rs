//! Calibration sessions: time-bounded capture of level samples for one
//! microphone, used to suggest a threshold and weight.

mod result;
mod session;

pub use result::CalibrationResult;
pub use session::CalibrationSession;
