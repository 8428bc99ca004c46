//! The director: composes audio intake, scoring, the switch-state machine,
//! and the wide-shot policy into one atomic per-tick decision, and owns
//! the calibration workflow that runs alongside live operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use crate::audio::LevelIntake;
use crate::calibration::{CalibrationResult, CalibrationSession};
use crate::clock::{SystemClock, TimeSource};
use crate::config::AppConfig;
use crate::error::{log_calibration_error, log_director_error, CalibrationError, DirectorError};
use crate::output::OutputSink;
use crate::policy::WidePolicy;
use crate::scoring;
use crate::state::{StateMachine, SwitchState};

/// How stale the audio intake's last update may be before audio-fail
/// latches and forces a wide shot.
const AUDIO_FAIL_THRESHOLD_S: f64 = 0.5;

/// Everything a tick returns, and what `GET /api/status` reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    pub state: SwitchState,
    pub levels_db: HashMap<usize, f32>,
    pub dominant: Option<String>,
    pub dominance: f32,
    pub audio_fail: bool,
    pub results: HashMap<String, CalibrationResult>,
    pub error: Option<String>,
}

impl TickOutput {
    fn minimal(state: SwitchState, audio_fail: bool) -> Self {
        Self {
            state,
            levels_db: HashMap::new(),
            dominant: None,
            dominance: 0.0,
            audio_fail,
            results: HashMap::new(),
            error: None,
        }
    }
}

/// All director state mutated inside a tick, behind one mutex shared with
/// HTTP-triggered mutations (`start_calibration`, `apply_calibration`,
/// `reload`).
struct DirectorState {
    machine: StateMachine,
    policy: WidePolicy,
    last_sound: f64,
    audio_fail: bool,
    /// Runtime automix toggle. Distinct from `config.automix.enabled`: a
    /// calibration session forces this false without touching (or
    /// persisting) configuration, mirroring `engine.py`'s `self.automix`
    /// instance variable versus `self.cfg["automix"]["enabled"]`.
    automix_enabled: bool,
    last_camera: Option<String>,
    sessions: HashMap<String, CalibrationSession>,
    results: HashMap<String, CalibrationResult>,
    last_output: TickOutput,
}

impl DirectorState {
    /// Fresh state as of `now`, matching `engine.py`'s `_init()`: state
    /// machine reset to `WIDE`, policy's cooldown/interval timers reset,
    /// last-sound pinned to `now`, the audio-fail latch cleared, and both
    /// calibration maps emptied. `automix_enabled` is re-derived from
    /// configuration, never carried over from the prior state.
    fn new(now: f64, automix_enabled: bool) -> Self {
        Self {
            machine: StateMachine::new(now),
            policy: WidePolicy::new(),
            last_sound: now,
            audio_fail: false,
            automix_enabled,
            last_camera: None,
            sessions: HashMap::new(),
            results: HashMap::new(),
            last_output: TickOutput::minimal(SwitchState::Wide, false),
        }
    }
}

/// Orchestrates one tick at a time; safe to share across the director
/// loop and an optional HTTP surface via `Arc`.
pub struct Director {
    config: RwLock<AppConfig>,
    config_path: Option<std::path::PathBuf>,
    intake: Arc<LevelIntake>,
    output: OutputSink,
    state: Mutex<DirectorState>,
    clock: Arc<dyn TimeSource>,
}

impl Director {
    pub fn new(
        config: AppConfig,
        config_path: Option<std::path::PathBuf>,
        intake: Arc<LevelIntake>,
    ) -> Self {
        Self::with_clock(config, config_path, intake, Arc::new(SystemClock))
    }

    /// Construct with a pluggable [`TimeSource`] — tests drive a
    /// [`crate::clock::StubClock`] instead of the real wall clock.
    pub fn with_clock(
        config: AppConfig,
        config_path: Option<std::path::PathBuf>,
        intake: Arc<LevelIntake>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let now = clock.now();
        let output = OutputSink::new(&config.osc);
        let automix_enabled = config.automix.enabled;
        Self {
            config: RwLock::new(config),
            config_path,
            intake,
            output,
            state: Mutex::new(DirectorState::new(now, automix_enabled)),
            clock,
        }
    }

    /// The most recent tick output, without running a new tick.
    pub fn status(&self) -> Result<TickOutput, DirectorError> {
        let guard = self.lock_state()?;
        Ok(guard.last_output.clone())
    }

    /// Audit log of every command emitted so far.
    pub fn audit_log(&self) -> Vec<crate::output::AuditEntry> {
        self.output.audit_log()
    }

    /// Begin a calibration session for `mic_id`. Enters `STOPPED`.
    pub fn start_calibration(&self, mic_id: &str) -> Result<(), DirectorError> {
        let config_has_mic = {
            let config = self.read_config()?;
            config.mic(mic_id).is_some()
        };
        if !config_has_mic {
            log_calibration_error(
                &CalibrationError::UnknownMic {
                    mic_id: mic_id.to_string(),
                },
                "start_calibration",
            );
        }

        let now = self.clock.now();
        let mut guard = self.lock_state()?;
        guard
            .sessions
            .insert(mic_id.to_string(), CalibrationSession::new(mic_id, now));
        guard.machine.set(SwitchState::Stopped, now);
        guard.automix_enabled = false;
        Ok(())
    }

    /// Apply a stored calibration result for `mic_id`: rewrite the
    /// suggested threshold/weight into configuration and reload.
    ///
    /// Returns whether the apply succeeded; a config-write failure is
    /// surfaced as `false` without mutating in-memory configuration.
    pub fn apply_calibration(&self, mic_id: &str) -> Result<bool, DirectorError> {
        let result = {
            let guard = self.lock_state()?;
            match guard.results.get(mic_id) {
                Some(r) => *r,
                None => return Ok(false),
            }
        };

        let mut config = {
            let config = self.read_config()?;
            config.clone()
        };

        let Some(mic) = config.mic_mut(mic_id) else {
            return Ok(false);
        };
        mic.threshold_db = result.suggested_threshold_db;
        mic.weight = result.suggested_weight;

        if let Some(path) = &self.config_path {
            if let Err(err) = config.save_to_file(path) {
                log_director_error(
                    &DirectorError::ConfigWriteFailed {
                        reason: err.to_string(),
                    },
                    "apply_calibration",
                );
                return Ok(false);
            }
        }

        self.reload(config)?;
        Ok(true)
    }

    /// Replace configuration and fully re-initialize director state,
    /// mirroring `engine.py`'s `_init()`: a fresh state machine (always
    /// `WIDE`), a fresh wide-shot policy (cooldown/interval timers reset),
    /// `last_sound` pinned to `now`, the audio-fail latch cleared, both
    /// calibration maps emptied, and automix re-derived from the new
    /// configuration's `automix.enabled` — exiting `STOPPED` and
    /// discarding any cooldown/interval state accumulated during
    /// calibration.
    pub fn reload(&self, config: AppConfig) -> Result<(), DirectorError> {
        let automix_enabled = config.automix.enabled;
        {
            let mut guard = self.write_config()?;
            *guard = config;
        }

        let now = self.clock.now();
        let mut guard = self.lock_state()?;
        *guard = DirectorState::new(now, automix_enabled);
        Ok(())
    }

    /// One atomic step, per the tick algorithm: reads a single `now` and
    /// uses it throughout for determinism.
    pub fn tick(&self) -> Result<TickOutput, DirectorError> {
        let now = self.clock.now();
        let snapshot = self.intake.get();
        let config = self.read_config()?;
        let mut guard = self.lock_state()?;

        // Step 2: audio-fail check.
        if now - snapshot.last_updated > AUDIO_FAIL_THRESHOLD_S {
            if !guard.audio_fail {
                guard.audio_fail = true;
                guard.machine.set(SwitchState::Wide, now);
                guard.policy.note_forced_wide(now);
                self.output.wide("audio_fail");
            }
            let output = TickOutput::minimal(guard.machine.state(), true);
            guard.last_output = output.clone();
            return Ok(output);
        }

        // Step 3: clear the latch once audio is fresh again.
        guard.audio_fail = false;

        // Step 4: drive open calibration sessions.
        let mut finished = Vec::new();
        for (mic_id, session) in guard.sessions.iter_mut() {
            let level = match config.mic(mic_id) {
                Some(mic) => snapshot.levels_db.get(&mic.input_channel).copied().unwrap_or(-100.0),
                None => {
                    finished.push(mic_id.clone());
                    continue;
                }
            };
            session.feed(level);
            if session.done(now) {
                finished.push(mic_id.clone());
            }
        }
        for mic_id in finished {
            if let Some(session) = guard.sessions.remove(&mic_id) {
                guard.results.insert(mic_id, session.result());
            }
        }

        // Step 5: calibration mode — automix disabled, don't touch the switch.
        if !guard.automix_enabled {
            let output = TickOutput {
                state: guard.machine.state(),
                levels_db: snapshot.levels_db.clone(),
                dominant: None,
                dominance: 0.0,
                audio_fail: false,
                results: guard.results.clone(),
                error: None,
            };
            guard.last_output = output.clone();
            return Ok(output);
        }

        // Step 6: score.
        let score_result = scoring::score(&config.mics, &snapshot.levels_db);
        if score_result.any_active {
            guard.last_sound = now;
        }

        // Step 7: wide decision.
        let silence = now - guard.last_sound;
        let (should_wide, reason) =
            guard
                .policy
                .evaluate(&config.wide, &score_result.active, silence, now);

        // Step 8: state transition logic.
        let current_state = guard.machine.state();
        if current_state == SwitchState::Wide {
            if guard.machine.duration(now) >= config.wide.min_duration_s
                && score_result.dominant.is_some()
            {
                let dominant_id = score_result.dominant.clone().unwrap();
                let camera = config.mic(&dominant_id).map(|m| m.camera.clone());
                guard.machine.set(SwitchState::Active, now);
                if let Some(camera) = camera {
                    self.output.cam(&camera);
                    guard.last_camera = Some(camera);
                }
            }
            // else: stay WIDE; min-dwell has priority over re-evaluation.
        } else if current_state == SwitchState::Stopped {
            // The director emits no switching commands in STOPPED; it
            // exits only via `reload` once calibration ends.
        } else if should_wide {
            guard.machine.set(SwitchState::Wide, now);
            if let Some(reason) = reason {
                self.output.wide(reason.as_str());
            }
            guard.last_camera = None;
        } else if let Some(dominant_id) = score_result.dominant.clone() {
            let camera = config.mic(&dominant_id).map(|m| m.camera.clone());
            guard.machine.set(SwitchState::Active, now);
            if let Some(camera) = camera {
                if guard.last_camera.as_deref() != Some(camera.as_str()) {
                    self.output.cam(&camera);
                    guard.last_camera = Some(camera);
                }
            }
        }

        let output = TickOutput {
            state: guard.machine.state(),
            levels_db: snapshot.levels_db.clone(),
            dominant: score_result.dominant,
            dominance: score_result.dominance,
            audio_fail: false,
            results: guard.results.clone(),
            error: None,
        };
        guard.last_output = output.clone();
        Ok(output)
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, DirectorState>, DirectorError> {
        self.state.lock().map_err(|_| DirectorError::StatePoisoned)
    }

    fn read_config(&self) -> Result<std::sync::RwLockReadGuard<'_, AppConfig>, DirectorError> {
        self.config.read().map_err(|_| DirectorError::StatePoisoned)
    }

    fn write_config(&self) -> Result<std::sync::RwLockWriteGuard<'_, AppConfig>, DirectorError> {
        self.config.write().map_err(|_| DirectorError::StatePoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MicConfig;

    fn two_mic_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.mics = vec![
            MicConfig {
                id: "m1".to_string(),
                input_channel: 1,
                camera: "A".to_string(),
                threshold_db: -45.0,
                weight: 1.0,
                enabled: true,
            },
            MicConfig {
                id: "m2".to_string(),
                input_channel: 2,
                camera: "B".to_string(),
                threshold_db: -45.0,
                weight: 1.0,
                enabled: true,
            },
        ];
        config.wide.cooldown_s = 8.0;
        config.wide.min_duration_s = 3.0;
        config.wide.multi_speaker.enabled = true;
        config.wide.multi_speaker.count = 2;
        config.wide.silence.enabled = true;
        config.wide.silence.time_s = 4.0;
        config.wide.interval.enabled = false;
        config
    }

    fn director_with(config: AppConfig) -> Director {
        Director::new(config, None, Arc::new(LevelIntake::new()))
    }

    #[test]
    fn starts_in_wide_with_no_audio() {
        let director = director_with(two_mic_config());
        let status = director.status().unwrap();
        assert_eq!(status.state, SwitchState::Wide);
    }

    #[test]
    fn audit_log_starts_empty() {
        let director = director_with(two_mic_config());
        assert!(director.audit_log().is_empty());
    }

    #[test]
    fn start_calibration_enters_stopped() {
        let director = director_with(two_mic_config());
        director.start_calibration("m1").unwrap();
        let status = director.status().unwrap();
        assert_eq!(status.state, SwitchState::Stopped);
    }

    #[test]
    fn apply_calibration_without_result_returns_false() {
        let director = director_with(two_mic_config());
        let applied = director.apply_calibration("m1").unwrap();
        assert!(!applied);
    }

    #[test]
    fn stopped_state_emits_nothing_even_with_dominant_mic() {
        let intake = Arc::new(LevelIntake::new());
        let clock = Arc::new(crate::clock::StubClock::new(0.0));
        let director =
            Director::with_clock(two_mic_config(), None, intake.clone(), clock.clone());

        director.start_calibration("m1").unwrap();
        assert_eq!(director.status().unwrap().state, SwitchState::Stopped);

        clock.set(1.0);
        intake.publish(vec![(1, -20.0), (2, -60.0)], 1.0);
        let tick = director.tick().unwrap();

        assert_eq!(tick.state, SwitchState::Stopped);
        assert!(director.audit_log().is_empty());
    }
}
