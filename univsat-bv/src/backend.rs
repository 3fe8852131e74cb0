//! Incremental decision procedure on top of the bit-blaster
//!
//! Each labeled assertion `f` gets a fresh activation literal `a` and the
//! clause `¬a ∨ f`. A check assumes the activation literals of every assertion
//! in force, so the failed assumptions of an unsatisfiable check are exactly
//! the labels of an unsatisfiable subset. Popping a scope disables its
//! activation literals for good with unit clauses, so the SAT instance of a
//! long-lived solver keeps growing with the number of pops and extremal
//! searches.

use crate::blaster::{BitBlaster, BlastStats};
use num_bigint::BigUint;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use univsat_core::ast::{Sort, TermId, TermManager};
use univsat_core::traits::{CheckResult, DecisionProcedure, Label};
use varisat::Lit;

/// Statistics for the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Satisfiability checks performed
    pub checks: u64,
    /// Labeled assertions received
    pub assertions: u64,
    /// Bit-blasting statistics
    pub blast: BlastStats,
}

/// Bit-blasting decision procedure backed by `varisat`
#[derive(Debug)]
pub struct VarisatBackend {
    blaster: BitBlaster,
    /// Activation literals of the assertions in force, oldest first
    active: Vec<(Label, Lit)>,
    /// Length of `active` at each push
    scope_marks: Vec<usize>,
    /// Activation variable index -> label
    label_of: FxHashMap<usize, Label>,
    /// Variable assignment of the last satisfiable check
    model: Option<Vec<bool>>,
    /// Failed labels of the last unsatisfiable check
    core: Vec<Label>,
    checks: u64,
    assertions: u64,
}

impl Default for VarisatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VarisatBackend {
    /// Create a new backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            blaster: BitBlaster::new(),
            active: Vec::new(),
            scope_marks: Vec::new(),
            label_of: FxHashMap::default(),
            model: None,
            core: Vec::new(),
            checks: 0,
            assertions: 0,
        }
    }

    /// Statistics gathered so far
    #[must_use]
    pub fn stats(&self) -> BackendStats {
        BackendStats {
            checks: self.checks,
            assertions: self.assertions,
            blast: self.blaster.stats(),
        }
    }

    /// Number of scopes currently open
    #[must_use]
    pub fn num_scopes(&self) -> usize {
        self.scope_marks.len()
    }

    /// Truth value of a declared formula in the last model
    #[must_use]
    pub fn formula_value(&self, formula: TermId) -> Option<bool> {
        let lit = self.blaster.formula_lit(formula)?;
        self.lit_value(lit)
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        let model = self.model.as_ref()?;
        let value = model.get(lit.var().index()).copied().unwrap_or(false);
        Some(value == lit.is_positive())
    }

    fn record_model(&mut self) {
        let Some(lits) = self.blaster.sat().model() else {
            self.model = None;
            return;
        };
        let len = lits.iter().map(|l| l.var().index() + 1).max().unwrap_or(0);
        let mut values = vec![false; len];
        for lit in lits {
            values[lit.var().index()] = lit.is_positive();
        }
        self.model = Some(values);
    }

    fn record_core(&mut self) {
        let failed: Vec<Lit> = self
            .blaster
            .sat()
            .failed_core()
            .map(<[Lit]>::to_vec)
            .unwrap_or_default();
        self.core = failed
            .iter()
            .filter_map(|lit| self.label_of.get(&lit.var().index()).copied())
            .collect();
    }
}

impl DecisionProcedure for VarisatBackend {
    fn name(&self) -> &str {
        "varisat-bitblast"
    }

    fn declare(&mut self, tm: &TermManager, term: TermId) {
        match tm.sort(term) {
            Sort::BitVec(_) => {
                self.blaster.blast_term(tm, term);
            }
            Sort::Bool => {
                self.blaster.blast_formula(tm, term);
            }
        }
    }

    fn assert_labeled(&mut self, tm: &TermManager, formula: TermId, label: Label) {
        let lit = self.blaster.blast_formula(tm, formula);
        let activation = self.blaster.fresh();
        self.blaster.add_clause(&[!activation, lit]);
        self.active.push((label, activation));
        self.label_of.insert(activation.var().index(), label);
        self.assertions += 1;
    }

    fn push(&mut self) {
        self.scope_marks.push(self.active.len());
    }

    fn pop(&mut self, n: u32) {
        assert!(
            n as usize <= self.scope_marks.len(),
            "cannot pop {n} scopes, only {} open",
            self.scope_marks.len()
        );
        for _ in 0..n {
            let Some(mark) = self.scope_marks.pop() else {
                break;
            };
            let dropped: Vec<(Label, Lit)> = self.active.drain(mark..).collect();
            for (_, activation) in dropped {
                self.blaster.add_clause(&[!activation]);
                self.label_of.remove(&activation.var().index());
            }
        }
        self.core.clear();
    }

    fn check(&mut self) -> CheckResult {
        self.checks += 1;
        let assumptions: Vec<Lit> = self.active.iter().map(|&(_, lit)| lit).collect();
        self.blaster.sat().assume(&assumptions);
        let result = match self.blaster.sat().solve() {
            Ok(true) => {
                self.record_model();
                self.core.clear();
                CheckResult::Sat
            }
            Ok(false) => {
                self.model = None;
                self.record_core();
                CheckResult::Unsat
            }
            Err(err) => {
                warn!(error = ?err, "SAT solver failed, reporting unknown");
                self.model = None;
                self.core.clear();
                CheckResult::Unknown
            }
        };
        debug!(
            %result,
            assumptions = assumptions.len(),
            vars = self.blaster.stats().vars,
            clauses = self.blaster.stats().clauses,
            "bit-blast check"
        );
        result
    }

    fn value(&self, _tm: &TermManager, term: TermId) -> Option<BigUint> {
        let bits = self.blaster.term_bits(term)?;
        let mut value = BigUint::default();
        for (i, &lit) in bits.iter().enumerate() {
            if self.lit_value(lit)? {
                value.set_bit(i as u64, true);
            }
        }
        Some(value)
    }

    fn unsat_core(&self) -> Vec<Label> {
        self.core.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bv_eq() {
        let mut tm = TermManager::new();
        let mut backend = VarisatBackend::new();
        let x = tm.mk_bv_var("x", 8);
        let c = tm.mk_bv_u64(42, 8);
        let eq = tm.mk_eq(x, c);
        backend.declare(&tm, x);
        backend.assert_labeled(&tm, eq, Label::new(0));

        assert_eq!(backend.check(), CheckResult::Sat);
        assert_eq!(backend.value(&tm, x), Some(BigUint::from(42u32)));
        assert_eq!(backend.formula_value(eq), Some(true));
    }

    #[test]
    fn test_bv_neq() {
        let mut tm = TermManager::new();
        let mut backend = VarisatBackend::new();
        let x = tm.mk_bv_var("x", 4);
        let five = tm.mk_bv_u64(5, 4);
        let six = tm.mk_bv_u64(6, 4);
        let eq5 = tm.mk_eq(x, five);
        let eq6 = tm.mk_eq(x, six);
        backend.assert_labeled(&tm, eq5, Label::new(0));
        backend.assert_labeled(&tm, eq6, Label::new(1));

        assert_eq!(backend.check(), CheckResult::Unsat);
        let mut core = backend.unsat_core();
        core.sort();
        assert_eq!(core, vec![Label::new(0), Label::new(1)]);
    }

    #[test]
    fn test_pop_releases_assertions() {
        let mut tm = TermManager::new();
        let mut backend = VarisatBackend::new();
        let x = tm.mk_bv_var("x", 4);
        let bit = tm.mk_bit2bool(x, 3);
        let not_bit = tm.mk_not(bit);
        backend.declare(&tm, x);
        backend.assert_labeled(&tm, bit, Label::new(0));
        backend.push();
        backend.assert_labeled(&tm, not_bit, Label::new(1));
        assert_eq!(backend.check(), CheckResult::Unsat);
        assert_eq!(backend.num_scopes(), 1);

        backend.pop(1);
        assert_eq!(backend.num_scopes(), 0);
        assert_eq!(backend.check(), CheckResult::Sat);
        let value = backend.value(&tm, x).unwrap();
        assert!(value.bit(3));
    }

    #[test]
    fn test_popped_scopes_stay_in_sat_instance() {
        let mut tm = TermManager::new();
        let mut backend = VarisatBackend::new();
        let x = tm.mk_bv_var("x", 4);
        let bit = tm.mk_bit2bool(x, 0);
        backend.declare(&tm, x);
        backend.push();
        backend.assert_labeled(&tm, bit, Label::new(0));
        backend.pop(1);
        let before = backend.stats().blast;

        for round in 1..=3u64 {
            backend.push();
            backend.assert_labeled(&tm, bit, Label::new(0));
            backend.pop(1);
            // one activation variable, its implication and its disabling unit
            let blast = backend.stats().blast;
            assert_eq!(blast.vars, before.vars + round);
            assert_eq!(blast.clauses, before.clauses + 2 * round);
        }
        assert_eq!(backend.check(), CheckResult::Sat);
    }

    #[test]
    fn test_undeclared_term_has_no_value() {
        let mut tm = TermManager::new();
        let mut backend = VarisatBackend::new();
        let x = tm.mk_bv_var("x", 4);
        assert_eq!(backend.check(), CheckResult::Sat);
        assert_eq!(backend.value(&tm, x), None);
    }

    #[test]
    #[should_panic(expected = "cannot pop")]
    fn test_pop_too_far() {
        let mut backend = VarisatBackend::new();
        backend.push();
        backend.pop(2);
    }
}
