//! Minimal and maximal satisfying values
//!
//! The search fixes the bits of `x` from the most significant down. A bit is
//! tried at its preferred polarity under a temporary scope; the outcome decides
//! which polarity gets asserted for the rest of the search. Everything happens
//! inside one search scope that is closed again before returning.

use crate::solver::{BitblastSolver, UnivariateSolver, EXTREMAL_DEP};
use num_bigint::BigUint;
use tracing::debug;
use univsat_core::numeral;
use univsat_core::{CheckResult, DecisionProcedure};

/// Direction of an extremal search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value
    Min,
    /// Largest value
    Max,
}

impl Direction {
    /// Bit value that moves a candidate towards the extremum
    #[must_use]
    pub fn preferred_bit(self) -> bool {
        match self {
            Direction::Min => false,
            Direction::Max => true,
        }
    }

    fn improves(self, candidate: &BigUint, best: &BigUint) -> bool {
        match self {
            Direction::Min => candidate < best,
            Direction::Max => candidate > best,
        }
    }
}

impl<D: DecisionProcedure> BitblastSolver<D> {
    /// Force bit `index` of `x` to `value`
    fn assert_bit_value(&mut self, index: u32, value: bool) {
        self.add_bit(index, !value, EXTREMAL_DEP);
    }

    /// A satisfying value to start from, checking first if none is known
    fn starting_candidate(&mut self) -> Option<BigUint> {
        let known = self.cached_model().is_some() || self.last_check_is_sat();
        if !known && self.check() != CheckResult::Sat {
            return None;
        }
        Some(self.model())
    }

    /// Extremal satisfying value of `x` in the given direction
    pub(crate) fn find_extremum(&mut self, direction: Direction) -> Option<BigUint> {
        self.stats.extremal_searches += 1;
        let mut best = self.starting_candidate()?;
        let entry_level = self.scope_level();
        let good = direction.preferred_bit();
        debug!(?direction, start = %best, "extremal search");

        self.push();
        for k in (0..self.bit_width).rev() {
            if numeral::bit(&best, k) == good {
                self.assert_bit_value(k, good);
                continue;
            }
            self.push();
            self.assert_bit_value(k, good);
            match self.check() {
                CheckResult::Sat => {
                    let candidate = self.model();
                    debug_assert!(direction.improves(&candidate, &best));
                    debug!(bit = k, value = %candidate, "extremal search improved");
                    best = candidate;
                    self.pop(1);
                    self.assert_bit_value(k, good);
                }
                CheckResult::Unsat => {
                    self.pop(1);
                    self.assert_bit_value(k, !good);
                }
                CheckResult::Unknown => {
                    debug!(bit = k, "extremal search aborted");
                    let depth = self.scope_level() - entry_level;
                    self.pop(depth);
                    return None;
                }
            }
        }
        self.pop(1);

        if self.config.pin_extremal_witness {
            for k in (0..self.bit_width).rev() {
                self.assert_bit_value(k, numeral::bit(&best, k));
            }
            self.store_model(best.clone());
        }
        debug!(?direction, value = %best, "extremal search done");
        Some(best)
    }
}
