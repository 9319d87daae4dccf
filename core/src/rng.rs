//! Deterministic pseudo-random stream shared by every simulation subsystem.
//!
//! The generator is a fixed-parameter 64-bit linear congruential recurrence.
//! Every operation exists in a pure form that consumes an [`RngState`] and
//! returns the advanced state alongside the value, so the owner of the state
//! decides exactly where and in which order randomness is consumed. Nothing in
//! this module reads clocks, thread identifiers, or any other entropy source.

use serde::{Deserialize, Serialize};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1_442_695_040_888_963_407;
const SEED_HASH_MULTIPLIER: u64 = 31;
const UNIT_SCALE: f64 = 1.0 / ((1u64 << 53) as f64);

/// Seed accepted by the simulation, either numeric or textual.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    /// Numeric seed used verbatim as the initial generator state.
    Number(u64),
    /// Textual seed hashed with the portable rolling string hash.
    Text(String),
}

impl Seed {
    /// Derives the initial generator state for the seed.
    #[must_use]
    pub fn to_state(&self) -> RngState {
        match self {
            Self::Number(value) => RngState::new(*value),
            Self::Text(text) => RngState::new(hash_seed_text(text)),
        }
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Multiply-and-add rolling hash over the UTF-8 bytes of a seed string.
///
/// `h = h * 31 + byte`, wrapping at 64 bits and starting from zero.
#[must_use]
pub fn hash_seed_text(text: &str) -> u64 {
    text.bytes().fold(0u64, |hash, byte| {
        hash.wrapping_mul(SEED_HASH_MULTIPLIER)
            .wrapping_add(u64::from(byte))
    })
}

/// Opaque 64-bit generator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RngState(u64);

impl RngState {
    /// Wraps a raw 64-bit state.
    #[must_use]
    pub const fn new(state: u64) -> Self {
        Self(state)
    }

    /// Retrieves the raw 64-bit state.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Advances the recurrence once, returning the raw output and next state.
    #[must_use]
    pub const fn step(self) -> (u64, Self) {
        let next = self.0.wrapping_mul(RNG_MULTIPLIER).wrapping_add(RNG_INCREMENT);
        (next, Self(next))
    }

    /// Returns a float in `[0, 1)` built from the 53 high bits of the output.
    #[must_use]
    pub fn float01(self) -> (f64, Self) {
        let (raw, next) = self.step();
        ((raw >> 11) as f64 * UNIT_SCALE, next)
    }

    /// Returns an integer in the inclusive range `[min, max]`.
    ///
    /// Reversed bounds are swapped. The output is mapped into the span with a
    /// 128-bit multiply-high so no modulo bias is introduced.
    #[must_use]
    pub fn in_range(self, min: i64, max: i64) -> (i64, Self) {
        let (low, high) = if min > max { (max, min) } else { (min, max) };
        let (raw, next) = self.step();
        let span = (i128::from(high) - i128::from(low) + 1) as u128;
        let offset = (u128::from(raw) * span) >> 64;
        let value = i128::from(low) + offset as i128;
        (value as i64, next)
    }

    /// Picks one element of `items` uniformly.
    ///
    /// Returns `None` without advancing when the slice is empty.
    #[must_use]
    pub fn choose<T>(self, items: &[T]) -> (Option<&T>, Self) {
        if items.is_empty() {
            return (None, self);
        }
        let last = i64::try_from(items.len() - 1).unwrap_or(i64::MAX);
        let (index, next) = self.in_range(0, last);
        (items.get(index as usize), next)
    }

    /// Mutating form of [`RngState::step`].
    pub fn next_u64(&mut self) -> u64 {
        let (value, next) = self.step();
        *self = next;
        value
    }

    /// Mutating form of [`RngState::float01`].
    pub fn next_float01(&mut self) -> f64 {
        let (value, next) = self.float01();
        *self = next;
        value
    }

    /// Mutating form of [`RngState::in_range`].
    pub fn next_in_range(&mut self, min: i64, max: i64) -> i64 {
        let (value, next) = self.in_range(min, max);
        *self = next;
        value
    }

    /// Mutating form of [`RngState::choose`].
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let (value, next) = self.choose(items);
        *self = next;
        value
    }

    /// Picks an index proportionally to the provided non-negative weights.
    ///
    /// Consumes exactly one float. Returns `None` when every weight is zero.
    pub fn pick_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|weight| **weight > 0.0).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.next_float01() * total;
        let mut last_positive = None;
        for (index, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            if roll < *weight {
                return Some(index);
            }
            roll -= *weight;
            last_positive = Some(index);
        }
        last_positive
    }
}
