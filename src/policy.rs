//! Wide-shot policy: decides whether external conditions demand a forced
//! wide cut, and if so, why.

use crate::config::WideConfig;

/// Why the policy fired, or that it didn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideReason {
    MultiSpeaker,
    Silence,
    Interval,
}

impl WideReason {
    /// The string used on the wire and in the audit log.
    pub fn as_str(&self) -> &'static str {
        match self {
            WideReason::MultiSpeaker => "multi_speaker",
            WideReason::Silence => "silence",
            WideReason::Interval => "interval",
        }
    }
}

/// Tracks cooldown and interval bookkeeping across ticks; one instance
/// lives for the lifetime of the director.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidePolicy {
    last_wide_at: f64,
    last_interval_wide_at: f64,
}

impl WidePolicy {
    /// Construct a policy with no prior forced wide — cooldown and
    /// interval timers read as "long ago" so the first tick can fire.
    pub fn new() -> Self {
        Self {
            last_wide_at: f64::NEG_INFINITY,
            last_interval_wide_at: f64::NEG_INFINITY,
        }
    }

    pub fn last_wide_at(&self) -> f64 {
        self.last_wide_at
    }

    pub fn last_interval_wide_at(&self) -> f64 {
        self.last_interval_wide_at
    }

    /// Evaluate the policy for one tick.
    ///
    /// Checks run in the order `multi_speaker`, `silence`, `interval`; the
    /// first matching enabled rule wins. Still inside cooldown suppresses
    /// every rule regardless of reason.
    pub fn evaluate(
        &mut self,
        config: &WideConfig,
        active: &[String],
        silence_duration: f64,
        now: f64,
    ) -> (bool, Option<WideReason>) {
        if now - self.last_wide_at < config.cooldown_s {
            return (false, None);
        }

        if config.multi_speaker.enabled && active.len() >= config.multi_speaker.count {
            self.last_wide_at = now;
            return (true, Some(WideReason::MultiSpeaker));
        }

        if config.silence.enabled && silence_duration >= config.silence.time_s {
            self.last_wide_at = now;
            return (true, Some(WideReason::Silence));
        }

        if config.interval.enabled && now - self.last_interval_wide_at >= config.interval.every_s {
            self.last_wide_at = now;
            self.last_interval_wide_at = now;
            return (true, Some(WideReason::Interval));
        }

        (false, None)
    }

    /// Record an externally-triggered forced wide (e.g. audio-fail) so the
    /// cooldown clock also runs from it, per "regardless of reason".
    pub fn note_forced_wide(&mut self, now: f64) {
        self.last_wide_at = now;
    }
}

impl Default for WidePolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WideConfig {
        WideConfig {
            cooldown_s: 8.0,
            min_duration_s: 3.0,
            multi_speaker: crate::config::MultiSpeakerConfig {
                enabled: true,
                count: 2,
            },
            silence: crate::config::SilenceConfig {
                enabled: true,
                time_s: 4.0,
            },
            interval: crate::config::IntervalConfig {
                enabled: false,
                every_s: 30.0,
            },
        }
    }

    #[test]
    fn multi_speaker_fires_on_two_active() {
        let mut policy = WidePolicy::new();
        let active = vec!["m1".to_string(), "m2".to_string()];
        let (should_wide, reason) = policy.evaluate(&config(), &active, 0.0, 20.0);
        assert!(should_wide);
        assert_eq!(reason, Some(WideReason::MultiSpeaker));
    }

    #[test]
    fn cooldown_suppresses_repeat() {
        let mut policy = WidePolicy::new();
        let active = vec!["m1".to_string(), "m2".to_string()];
        policy.evaluate(&config(), &active, 0.0, 20.0);

        let (should_wide, reason) = policy.evaluate(&config(), &active, 0.0, 21.0);
        assert!(!should_wide);
        assert_eq!(reason, None);
    }

    #[test]
    fn cooldown_elapses_after_configured_seconds() {
        let mut policy = WidePolicy::new();
        let active = vec!["m1".to_string(), "m2".to_string()];
        policy.evaluate(&config(), &active, 0.0, 20.0);

        let (should_wide, reason) = policy.evaluate(&config(), &active, 0.0, 28.0);
        assert!(should_wide);
        assert_eq!(reason, Some(WideReason::MultiSpeaker));
    }

    #[test]
    fn silence_fires_when_no_multi_speaker() {
        let mut policy = WidePolicy::new();
        let active: Vec<String> = vec![];
        let (should_wide, reason) = policy.evaluate(&config(), &active, 4.5, 104.5);
        assert!(should_wide);
        assert_eq!(reason, Some(WideReason::Silence));
    }

    #[test]
    fn disabled_rule_never_fires() {
        let mut cfg = config();
        cfg.multi_speaker.enabled = false;
        let mut policy = WidePolicy::new();
        let active = vec!["m1".to_string(), "m2".to_string()];
        let (should_wide, reason) = policy.evaluate(&cfg, &active, 0.0, 20.0);
        assert!(!should_wide);
        assert_eq!(reason, None);
    }

    #[test]
    fn interval_fires_after_elapsed_time() {
        let mut cfg = config();
        cfg.multi_speaker.enabled = false;
        cfg.silence.enabled = false;
        cfg.interval.enabled = true;
        cfg.interval.every_s = 30.0;

        let mut policy = WidePolicy::new();
        let active: Vec<String> = vec![];
        let (should_wide, reason) = policy.evaluate(&cfg, &active, 0.0, 30.0);
        assert!(should_wide);
        assert_eq!(reason, Some(WideReason::Interval));
    }
}
