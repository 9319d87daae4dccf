#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Typing system resolving player keystrokes against enemy words.
//!
//! The state machine binds the input buffer to a single enemy, tracks combo
//! streaks with an idle decay timer, and derives a difficulty bias from recent
//! accuracy that the world feeds back into word assignment.

use std::collections::VecDeque;

use keyboard_defence_core::{
    config::TypingConfig, ComboWarningDelta, EnemyId, EnemySnapshot, EnemyView, InputOutcome,
    TypingSnapshot,
};

/// Signals raised while the combo decays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ComboSignal {
    /// Remaining decay time crossed the warning threshold.
    Warning {
        /// Combo at risk.
        combo: u32,
    },
    /// The combo decayed to zero.
    Lost(ComboWarningDelta),
}

/// Lower-cases an input character, returning `None` for non-alphanumeric input.
#[must_use]
pub fn normalize(character: char) -> Option<char> {
    if !character.is_alphanumeric() {
        return None;
    }
    character.to_lowercase().next()
}

/// Complete typing and combo state of a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypingState {
    buffer: String,
    target: Option<EnemyId>,
    total_inputs: u32,
    correct_inputs: u32,
    errors: u32,
    recent: VecDeque<bool>,
    combo: u32,
    best_combo: u32,
    decay_remaining: f64,
    warning: bool,
    accuracy_at_warning: f64,
    last_lost_combo: u32,
}

impl TypingState {
    /// Creates an empty typing state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves one typed character against the live enemies.
    ///
    /// Binding prefers the focused lane, then the enemy nearest to breaching,
    /// then the lowest id.
    pub fn input_character(
        &mut self,
        character: char,
        enemies: &EnemyView,
        lane_focus: Option<u32>,
        config: &TypingConfig,
    ) -> InputOutcome {
        let Some(character) = normalize(character) else {
            return InputOutcome::Ignored;
        };
        self.total_inputs = self.total_inputs.saturating_add(1);

        let bound = self.target.and_then(|id| enemies.get(id));
        if bound.is_none() {
            self.release();
        }

        let target = match bound {
            Some(enemy) => enemy,
            None => match bind_candidate(enemies, character, lane_focus) {
                Some(enemy) => {
                    self.target = Some(enemy.id);
                    enemy
                }
                None => return self.mismatch(None, config),
            },
        };

        let typed = self.buffer.chars().count();
        let expected = target.word.chars().nth(typed);
        if expected != Some(character) {
            return self.mismatch(expected, config);
        }

        self.buffer.push(character);
        self.correct_inputs = self.correct_inputs.saturating_add(1);
        self.record_recent(true, config);
        self.combo = self.combo.saturating_add(1);
        self.best_combo = self.best_combo.max(self.combo);
        self.decay_remaining = config.combo_decay_seconds;
        self.warning = false;

        let typed = typed + 1;
        if typed >= target.word.chars().count() {
            let enemy = target.id;
            let word = target.word.clone();
            self.release();
            return InputOutcome::Completed { enemy, word };
        }

        InputOutcome::Progress {
            enemy: target.id,
            typed: u32::try_from(typed).unwrap_or(u32::MAX),
        }
    }

    fn mismatch(&mut self, expected: Option<char>, config: &TypingConfig) -> InputOutcome {
        self.errors = self.errors.saturating_add(1);
        self.record_recent(false, config);
        self.combo = self.combo.saturating_sub(config.error_combo_penalty);
        if self.combo == 0 {
            self.warning = false;
            self.decay_remaining = 0.0;
        }
        InputOutcome::Mismatch { expected }
    }

    fn record_recent(&mut self, correct: bool, config: &TypingConfig) {
        self.recent.push_back(correct);
        while self.recent.len() > config.recent_window.max(1) {
            let _ = self.recent.pop_front();
        }
    }

    /// Removes the last typed character. The target is released once the
    /// buffer is empty.
    pub fn backspace(&mut self) {
        let _ = self.buffer.pop();
        if self.buffer.is_empty() {
            self.target = None;
        }
    }

    /// Clears the buffer and releases the target.
    pub fn purge(&mut self) {
        self.release();
    }

    /// Releases the target when it is `enemy`.
    pub fn release_target(&mut self, enemy: EnemyId) {
        if self.target == Some(enemy) {
            self.release();
        }
    }

    fn release(&mut self) {
        self.buffer.clear();
        self.target = None;
    }

    /// Counts the decay timer down by `dt`, reporting warnings and losses.
    pub fn decay(
        &mut self,
        dt: f64,
        time: f64,
        config: &TypingConfig,
        out: &mut Vec<ComboSignal>,
    ) {
        if self.combo == 0 {
            return;
        }

        self.decay_remaining -= dt;

        if !self.warning && self.decay_remaining <= config.combo_warning_threshold {
            self.warning = true;
            self.accuracy_at_warning = self.recent_accuracy();
            out.push(ComboSignal::Warning { combo: self.combo });
        }

        if self.decay_remaining <= 0.0 {
            let delta = ComboWarningDelta {
                time,
                combo_before: self.combo,
                combo_after: 0,
                accuracy_before: self.accuracy_at_warning,
                accuracy_after: self.recent_accuracy(),
            };
            self.last_lost_combo = self.combo;
            self.combo = 0;
            self.warning = false;
            self.decay_remaining = 0.0;
            out.push(ComboSignal::Lost(delta));
        }
    }

    /// Restores up to `amount` combo points, never beyond the last lost combo
    /// and never below the current combo. Returns the resulting combo.
    pub fn recover_combo(&mut self, amount: u32, config: &TypingConfig) -> u32 {
        let recovered = self
            .combo
            .saturating_add(amount)
            .min(self.last_lost_combo);
        self.combo = self.combo.max(recovered);
        if self.combo > 0 {
            self.decay_remaining = config.combo_decay_seconds;
            self.warning = false;
        }
        self.combo
    }

    /// Accuracy over every alphanumeric input; one before any input.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_inputs == 0 {
            return 1.0;
        }
        f64::from(self.correct_inputs) / f64::from(self.total_inputs)
    }

    /// Accuracy over the recent input window; one before any input.
    #[must_use]
    pub fn recent_accuracy(&self) -> f64 {
        if self.recent.is_empty() {
            return 1.0;
        }
        let correct = self.recent.iter().filter(|hit| **hit).count();
        correct as f64 / self.recent.len() as f64
    }

    /// Word difficulty bias in `[-1, 1]`; zero until enough samples exist.
    #[must_use]
    pub fn difficulty_bias(&self, config: &TypingConfig) -> f64 {
        if self.recent.len() < config.bias_min_samples {
            return 0.0;
        }
        ((self.recent_accuracy() - config.target_accuracy) * config.bias_gain).clamp(-1.0, 1.0)
    }

    /// Current combo.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Typing errors recorded so far.
    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }

    /// Bound target.
    #[must_use]
    pub const fn target(&self) -> Option<EnemyId> {
        self.target
    }

    /// Number of characters typed toward the bound target.
    #[must_use]
    pub fn typed(&self) -> u32 {
        u32::try_from(self.buffer.chars().count()).unwrap_or(u32::MAX)
    }

    /// Captures the typing state for queries.
    #[must_use]
    pub fn snapshot(&self, config: &TypingConfig) -> TypingSnapshot {
        TypingSnapshot {
            buffer: self.buffer.clone(),
            target: self.target,
            total_inputs: self.total_inputs,
            correct_inputs: self.correct_inputs,
            errors: self.errors,
            combo: self.combo,
            best_combo: self.best_combo,
            decay_remaining: self.decay_remaining,
            combo_warning: self.warning,
            accuracy: self.accuracy(),
            recent_accuracy: self.recent_accuracy(),
            difficulty_bias: self.difficulty_bias(config),
            last_lost_combo: self.last_lost_combo,
        }
    }
}

fn bind_candidate(
    enemies: &EnemyView,
    character: char,
    lane_focus: Option<u32>,
) -> Option<&EnemySnapshot> {
    let mut best: Option<&EnemySnapshot> = None;
    for enemy in enemies
        .iter()
        .filter(|enemy| enemy.initial() == Some(character))
    {
        match best {
            Some(existing) if !binding_precedes(enemy, existing, lane_focus) => {}
            _ => best = Some(enemy),
        }
    }
    best
}

fn binding_precedes(
    candidate: &EnemySnapshot,
    other: &EnemySnapshot,
    lane_focus: Option<u32>,
) -> bool {
    let focused = |enemy: &EnemySnapshot| lane_focus == Some(enemy.lane);
    if focused(candidate) != focused(other) {
        return focused(candidate);
    }

    if candidate.distance != other.distance {
        return candidate.distance > other.distance;
    }

    candidate.id < other.id
}
