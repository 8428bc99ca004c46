//! Microphone scoring: turns a level snapshot into per-mic scores, the set
//! of currently active mics, and a dominant pick.

use std::collections::HashMap;

use crate::config::MicConfig;

/// Result of scoring one level snapshot against the configured mics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub any_active: bool,
    pub dominant: Option<String>,
    pub scores: HashMap<String, f32>,
    pub dominance: f32,
    pub active: Vec<String>,
}

/// No level reading for a channel is treated as this floor.
const MISSING_LEVEL_DB: f32 = -100.0;

/// Score every enabled mic against the snapshot.
///
/// `snapshot` maps 1-based channel index to a level in dB. Disabled mics
/// contribute nothing to scores, the active set, or the dominant pick.
/// Ties for dominance are broken by configuration order: the first mic in
/// `mics` with the maximum score wins.
pub fn score(mics: &[MicConfig], snapshot: &HashMap<usize, f32>) -> ScoreResult {
    let mut scores = HashMap::with_capacity(mics.len());
    let mut active = Vec::new();
    let mut dominant: Option<&str> = None;
    let mut dominance = 0.0f32;

    for mic in mics {
        if !mic.enabled {
            continue;
        }

        let level = snapshot
            .get(&mic.input_channel)
            .copied()
            .unwrap_or(MISSING_LEVEL_DB);

        let mic_score = if level > mic.threshold_db {
            active.push(mic.id.clone());
            (level - mic.threshold_db) * mic.weight
        } else {
            0.0
        };

        scores.insert(mic.id.clone(), mic_score);

        if mic_score > 0.0 && (dominant.is_none() || mic_score > dominance) {
            dominant = Some(&mic.id);
            dominance = mic_score;
        }
    }

    ScoreResult {
        any_active: !active.is_empty(),
        dominant: dominant.map(str::to_string),
        scores,
        dominance: if dominant.is_some() { dominance } else { 0.0 },
        active,
    }
}
