use crate::matcher::match_input;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MAX_PROGRESS: f64 = 100.0;

/// How a finished word pushes the ghost back
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryMode {
    /// accuracy * weight, plus a flat bonus for a perfect word
    #[default]
    Scaled,
    /// correct chars plus 2 for a perfect word (older balancing)
    Flat,
}

/// Tunables for decay, difficulty and recovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub decay_interval_ms: u64,
    pub difficulty_interval_ms: u64,
    pub decay_divisor: f64,
    pub level_interval_secs: u64,
    pub base_decrease_rate: f64,
    pub rate_step: f64,
    pub accuracy_weight: f64,
    pub perfect_bonus: f64,
    pub recovery: RecoveryMode,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            decay_interval_ms: 100,
            difficulty_interval_ms: 1000,
            decay_divisor: 5.0,
            level_interval_secs: 20,
            base_decrease_rate: 1.0,
            rate_step: 0.5,
            accuracy_weight: 8.0,
            perfect_bonus: 3.0,
            recovery: RecoveryMode::Scaled,
        }
    }
}

/// A rule value that would break the game: progress leaving 0..=100, or
/// the ghost slowing down
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rule {field} = {value} is out of range")]
pub struct InvalidRule {
    pub field: &'static str,
    pub value: f64,
}

impl Rules {
    /// Check every tunable. Rates and divisors must be positive, steps and
    /// weights non-negative, and all of them finite.
    pub fn validate(&self) -> Result<(), InvalidRule> {
        let positive = [
            ("decay_divisor", self.decay_divisor),
            ("base_decrease_rate", self.base_decrease_rate),
        ];
        let non_negative = [
            ("rate_step", self.rate_step),
            ("accuracy_weight", self.accuracy_weight),
            ("perfect_bonus", self.perfect_bonus),
        ];

        let bad = positive
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v > 0.0))
            .or_else(|| {
                non_negative
                    .iter()
                    .find(|(_, v)| !(v.is_finite() && *v >= 0.0))
            });

        match bad {
            Some(&(field, value)) => Err(InvalidRule { field, value }),
            None => Ok(()),
        }
    }

    pub fn decay_period(&self) -> Duration {
        Duration::from_millis(self.decay_interval_ms.max(1))
    }

    pub fn difficulty_period(&self) -> Duration {
        Duration::from_millis(self.difficulty_interval_ms.max(1))
    }

    /// Level 1 for the first interval, then one more per interval
    pub fn level_for(&self, elapsed_seconds: u64) -> u32 {
        let interval = self.level_interval_secs.max(1);
        u32::try_from(1 + elapsed_seconds / interval).unwrap_or(u32::MAX)
    }

    pub fn decrease_rate_for(&self, level: u32) -> f64 {
        self.base_decrease_rate + f64::from(level.saturating_sub(1)) * self.rate_step
    }

    /// Progress regained for a finished word
    pub fn recovery(&self, correct_chars: usize, target_len: usize, perfect: bool) -> f64 {
        match self.recovery {
            RecoveryMode::Scaled => {
                let accuracy = if target_len == 0 {
                    0.0
                } else {
                    correct_chars as f64 / target_len as f64
                };
                let bonus = if perfect { self.perfect_bonus } else { 0.0 };
                accuracy * self.accuracy_weight + bonus
            }
            RecoveryMode::Flat => correct_chars as f64 + if perfect { 2.0 } else { 0.0 },
        }
    }
}

/// Everything the screen shows about a running (or finished) game
#[derive(Debug, Clone, PartialEq)]
pub struct GameData {
    pub current_word: String,
    pub current_score: u64,
    pub high_score: u64,
    pub elapsed_seconds: u64,
    pub level: u32,
    pub progress: f64,
    pub final_score: u64,
    pub decrease_rate: f64,
}

impl GameData {
    /// Fresh game state; only the high score carries over
    pub fn fresh(current_word: String, high_score: u64, rules: &Rules) -> Self {
        Self {
            current_word,
            current_score: 0,
            high_score,
            elapsed_seconds: 0,
            level: 1,
            progress: MAX_PROGRESS,
            final_score: 0,
            decrease_rate: rules.decrease_rate_for(1),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.progress <= 0.0
    }

    /// Raise the high score if `score` beats it; never lowers it
    pub fn raise_high_score(&mut self, score: u64) -> bool {
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }
}

impl Default for GameData {
    fn default() -> Self {
        Self::fresh(String::new(), 0, &Rules::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEvent<'a> {
    /// one decay tick
    Decay,
    /// one difficulty tick (a second of play)
    Elapse,
    WordCompleted { typed: &'a str, target: &'a str },
}

fn clamp_progress(value: f64) -> f64 {
    value.clamp(0.0, MAX_PROGRESS)
}

/// Apply one event to the game data. Every mutation of `GameData` during
/// play goes through here.
pub fn reduce(mut data: GameData, event: ScoreEvent<'_>, rules: &Rules) -> GameData {
    match event {
        ScoreEvent::Decay => {
            data.progress = clamp_progress(data.progress - data.decrease_rate / rules.decay_divisor);
        }
        ScoreEvent::Elapse => {
            data.elapsed_seconds += 1;
            let level = rules.level_for(data.elapsed_seconds);
            if level > data.level {
                data.level = level;
                data.decrease_rate = rules.decrease_rate_for(level);
            }
        }
        ScoreEvent::WordCompleted { typed, target } => {
            let attempt = match_input(target, typed);
            let correct = attempt.correct_chars();

            data.current_score += correct as u64;
            let recovery = rules.recovery(correct, attempt.letter_states.len(), attempt.is_perfect());
            data.progress = clamp_progress(data.progress + recovery);
        }
    }

    data
}
