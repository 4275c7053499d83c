//! Uniform index selection for randomized placement

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Source of "pick one of n" choices
pub trait Picker: Send {
    /// Return an index in `0..n`; `n` is never zero
    fn pick(&mut self, n: usize) -> usize;
}

/// Picker backed by a pseudo-random generator
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn new(seed: Option<u64>) -> Self {
        debug!(?seed, "RandomPicker::new: called");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl Picker for RandomPicker {
    fn pick(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n.max(1))
    }
}

/// Picker that replays a fixed sequence, for deterministic tests
#[derive(Debug, Clone)]
pub struct SequencePicker {
    choices: Vec<usize>,
    next: usize,
}

impl SequencePicker {
    pub fn new(choices: impl Into<Vec<usize>>) -> Self {
        Self {
            choices: choices.into(),
            next: 0,
        }
    }
}

impl Picker for SequencePicker {
    fn pick(&mut self, n: usize) -> usize {
        let choice = self.choices.get(self.next).copied().unwrap_or(0);
        self.next = if self.choices.is_empty() {
            0
        } else {
            (self.next + 1) % self.choices.len()
        };
        choice % n.max(1)
    }
}
