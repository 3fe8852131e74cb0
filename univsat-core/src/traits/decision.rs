//! Decision procedure interface.
//!
//! The univariate solver never decides satisfiability itself. It hands
//! labeled formulas to an incremental bit-vector decision procedure and asks
//! for models and unsatisfiable cores through this trait.

use crate::ast::{TermId, TermManager};
use num_bigint::BigUint;
use std::fmt;

/// Outcome of a satisfiability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckResult {
    /// The asserted formulas have a model
    Sat,
    /// The asserted formulas have no model
    Unsat,
    /// The procedure gave up
    Unknown,
}

impl CheckResult {
    /// Check if the result is `Sat`
    #[must_use]
    pub fn is_sat(self) -> bool {
        self == CheckResult::Sat
    }

    /// Check if the result is `Unsat`
    #[must_use]
    pub fn is_unsat(self) -> bool {
        self == CheckResult::Unsat
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Sat => write!(f, "sat"),
            CheckResult::Unsat => write!(f, "unsat"),
            CheckResult::Unknown => write!(f, "unknown"),
        }
    }
}

/// Internal identifier of one labeled assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(u32);

impl Label {
    /// Create a label from its index
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the label
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a!{}", self.0)
    }
}

/// Incremental bit-vector decision procedure
///
/// Terms live in a [`TermManager`] owned by the caller, which passes it to
/// every method that needs to look at term structure.
pub trait DecisionProcedure {
    /// Name of the procedure, for diagnostics
    fn name(&self) -> &str;

    /// Register a term so that [`value`](Self::value) can report it even if
    /// no assertion mentions it
    fn declare(&mut self, tm: &TermManager, term: TermId);

    /// Assert `formula` under `label`
    ///
    /// A label is unique among the assertions in force; labels of popped
    /// assertions may be issued again.
    fn assert_labeled(&mut self, tm: &TermManager, formula: TermId, label: Label);

    /// Open a scope
    fn push(&mut self);

    /// Close `n` scopes, dropping every assertion made in them
    fn pop(&mut self, n: u32);

    /// Check satisfiability of the assertions in force
    fn check(&mut self) -> CheckResult;

    /// Value of a declared term in the model of the last `Sat` check
    fn value(&self, tm: &TermManager, term: TermId) -> Option<BigUint>;

    /// Labels of an unsatisfiable subset of the assertions in force after an
    /// `Unsat` check
    fn unsat_core(&self) -> Vec<Label>;
}
