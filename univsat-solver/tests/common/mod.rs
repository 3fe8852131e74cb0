//! Brute-force decision procedure for small widths

#![allow(dead_code)]

use num_bigint::BigUint;
use rustc_hash::FxHashMap;
use univsat_core::ast::{TermId, TermKind, TermManager, Value};
use univsat_core::{CheckResult, DecisionProcedure, Label};

/// Order in which candidate values are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrder {
    Ascending,
    Descending,
    /// `i -> 5i + 3 mod 2^W`
    Scrambled,
}

/// Decides formulas over one unknown by enumerating all of its values
#[derive(Debug)]
pub struct ExhaustiveBackend {
    order: ValueOrder,
    /// Checks after which every check answers `Unknown`
    unknown_after: Option<u64>,
    x: Option<TermId>,
    width: u32,
    /// Truth table of each active assertion
    active: Vec<(Label, Vec<bool>)>,
    scope_marks: Vec<usize>,
    model: Option<u64>,
    core: Vec<Label>,
    pub checks: u64,
}

impl ExhaustiveBackend {
    pub fn new(order: ValueOrder) -> Self {
        Self {
            order,
            unknown_after: None,
            x: None,
            width: 0,
            active: Vec::new(),
            scope_marks: Vec::new(),
            model: None,
            core: Vec::new(),
            checks: 0,
        }
    }

    /// Answer `Unknown` from check number `n + 1` on
    pub fn with_unknown_after(mut self, n: u64) -> Self {
        self.unknown_after = Some(n);
        self
    }

    pub fn num_scopes(&self) -> usize {
        self.scope_marks.len()
    }

    fn candidate(&self, i: u64) -> u64 {
        let size = 1u64 << self.width;
        match self.order {
            ValueOrder::Ascending => i,
            ValueOrder::Descending => size - 1 - i,
            ValueOrder::Scrambled => (5 * i + 3) % size,
        }
    }
}

impl DecisionProcedure for ExhaustiveBackend {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn declare(&mut self, tm: &TermManager, term: TermId) {
        if self.x.is_none() && matches!(tm.get(term).kind, TermKind::BvVar(_)) {
            self.x = Some(term);
            self.width = tm.width(term).unwrap();
            assert!(self.width <= 12, "exhaustive backend is for small widths");
        }
    }

    fn assert_labeled(&mut self, tm: &TermManager, formula: TermId, label: Label) {
        let x = self.x.expect("unknown declared before assertions");
        let table = (0..1u64 << self.width)
            .map(|v| {
                let mut env = FxHashMap::default();
                env.insert(x, BigUint::from(v));
                tm.eval(formula, &env) == Some(Value::Bool(true))
            })
            .collect();
        self.active.push((label, table));
    }

    fn push(&mut self) {
        self.scope_marks.push(self.active.len());
    }

    fn pop(&mut self, n: u32) {
        for _ in 0..n {
            let mark = self.scope_marks.pop().expect("pop below base scope");
            self.active.truncate(mark);
        }
        self.core.clear();
    }

    fn check(&mut self) -> CheckResult {
        self.checks += 1;
        if self.unknown_after.is_some_and(|n| self.checks > n) {
            self.model = None;
            return CheckResult::Unknown;
        }
        let found = (0..1u64 << self.width)
            .map(|i| self.candidate(i))
            .find(|&v| self.active.iter().all(|(_, table)| table[v as usize]));
        self.model = found;
        if found.is_some() {
            self.core.clear();
            CheckResult::Sat
        } else {
            self.core = self.active.iter().map(|&(label, _)| label).collect();
            CheckResult::Unsat
        }
    }

    fn value(&self, tm: &TermManager, term: TermId) -> Option<BigUint> {
        let mut env = FxHashMap::default();
        env.insert(self.x?, BigUint::from(self.model?));
        tm.eval(term, &env)?.as_bv().cloned()
    }

    fn unsat_core(&self) -> Vec<Label> {
        self.core.clone()
    }
}

pub fn poly(coeffs: &[u64]) -> Vec<BigUint> {
    coeffs.iter().map(|&c| BigUint::from(c)).collect()
}

pub fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

/// Route solver logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
