//! Scoped cache of the last satisfying value of the unknown

use num_bigint::BigUint;

/// One cached value per scope level
#[derive(Debug, Clone)]
pub struct ModelCache {
    frames: Vec<Option<BigUint>>,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCache {
    /// Cache with an invalid frame at level 0
    #[must_use]
    pub fn new() -> Self {
        Self { frames: vec![None] }
    }

    /// Cached value of the current level, if valid
    #[must_use]
    pub fn get(&self) -> Option<&BigUint> {
        self.frames.last().and_then(Option::as_ref)
    }

    /// Store a value for the current level
    pub fn store(&mut self, value: BigUint) {
        if let Some(frame) = self.frames.last_mut() {
            *frame = Some(value);
        }
    }

    /// Invalidate the current level
    pub fn invalidate(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            *frame = None;
        }
    }

    /// Open a level inheriting the current value
    pub fn push(&mut self) {
        let top = self.frames.last().cloned().flatten();
        self.frames.push(top);
    }

    /// Drop `n` levels
    pub fn pop(&mut self, n: usize) {
        assert!(n < self.frames.len(), "model cache popped below level 0");
        self.frames.truncate(self.frames.len() - n);
    }
}
