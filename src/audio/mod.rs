//! Audio intake: the most-recent per-channel level snapshot, written by a
//! capture backend and read by the director.

pub mod backend;

use std::collections::HashMap;
use std::sync::Mutex;

pub use backend::{AudioBackend, LevelSink};

/// A by-value copy of the most-recent per-channel levels, paired with the
/// timestamp the underlying driver last refreshed them.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot {
    pub levels_db: HashMap<usize, f32>,
    pub last_updated: f64,
}

impl LevelSnapshot {
    /// The degraded-mode snapshot used before any block has arrived, or
    /// when the device could not be opened: empty mapping, timestamp 0.
    pub fn degraded() -> Self {
        Self {
            levels_db: HashMap::new(),
            last_updated: 0.0,
        }
    }
}

/// Holds the latest level snapshot behind a short lock.
///
/// The audio producer (capture backend callback or thread) writes here;
/// the director reads a consistent copy via [`LevelIntake::get`]. No other
/// state is guarded by this lock.
pub struct LevelIntake {
    latest: Mutex<LevelSnapshot>,
}

impl LevelIntake {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(LevelSnapshot::degraded()),
        }
    }

    /// Read a consistent (snapshot, timestamp) copy. Never blocks longer
    /// than a single mutex acquisition.
    pub fn get(&self) -> LevelSnapshot {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => LevelSnapshot::degraded(),
        }
    }
}

impl Default for LevelIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelSink for LevelIntake {
    fn publish(&self, channel_levels_db: Vec<(usize, f32)>, at: f64) {
        if let Ok(mut guard) = self.latest.lock() {
            guard.levels_db = channel_levels_db.into_iter().collect();
            guard.last_updated = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_degraded() {
        let intake = LevelIntake::new();
        let snapshot = intake.get();
        assert!(snapshot.levels_db.is_empty());
        assert_eq!(snapshot.last_updated, 0.0);
    }

    #[test]
    fn publish_then_get_round_trips() {
        let intake = LevelIntake::new();
        intake.publish(vec![(1, -20.0), (2, -40.0)], 5.0);
        let snapshot = intake.get();
        assert_eq!(snapshot.levels_db[&1], -20.0);
        assert_eq!(snapshot.levels_db[&2], -40.0);
        assert_eq!(snapshot.last_updated, 5.0);
    }

    #[test]
    fn get_returns_owned_copy() {
        let intake = LevelIntake::new();
        intake.publish(vec![(1, -20.0)], 1.0);
        let mut snapshot = intake.get();
        snapshot.levels_db.insert(2, -10.0);
        assert!(!intake.get().levels_db.contains_key(&2));
    }
}
