//! Univariate solver over a bit-vector decision procedure

use crate::cache::ModelCache;
use crate::encoder::PolyEncoder;
use num_bigint::BigUint;
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::{debug, trace};
use univsat_bv::VarisatBackend;
use univsat_core::ast::{TermId, TermManager, Value};
use univsat_core::{CheckResult, DecisionProcedure, Label, Result, SolverConfig, UnivsatError};

/// Caller-chosen dependency id of an assertion
pub type Dep = u32;

/// Dependency id carried by the bit assertions of an extremal search
pub const EXTREMAL_DEP: Dep = 0;

/// Incremental solver for constraints over one bit-vector unknown `x`
///
/// Polynomials are coefficient lists, constant coefficient first. Every
/// `add_*` takes a `sign` flag asserting the negation of the constraint and a
/// dependency id reported back by [`unsat_core`](Self::unsat_core).
pub trait UnivariateSolver: fmt::Display {
    /// Open a scope
    fn push(&mut self);

    /// Close `n` scopes, discarding their assertions
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`scope_level`](Self::scope_level).
    fn pop(&mut self, n: u32);

    /// Number of open scopes
    fn scope_level(&self) -> u32;

    /// `lhs <= rhs` (unsigned)
    fn add_ule(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep);

    /// `lhs * rhs` overflows (unsigned)
    fn add_umul_ovfl(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep);

    /// `lhs * rhs` overflows (signed)
    fn add_smul_ovfl(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep);

    /// `lhs * rhs` underflows (signed)
    fn add_smul_udfl(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep);

    /// `in1 >> in2 = out` (logical)
    fn add_lshr(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `in1 >> in2 = out` (arithmetic)
    fn add_ashr(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `in1 << in2 = out`
    fn add_shl(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `in1 & in2 = out`
    fn add_and(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `in1 | in2 = out`
    fn add_or(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `in1 ^ in2 = out`
    fn add_xor(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `~input = out`
    fn add_not(&mut self, input: &[BigUint], out: &[BigUint], sign: bool, dep: Dep);

    /// `x <= value`
    fn add_ule_const(&mut self, value: &BigUint, sign: bool, dep: Dep);

    /// `x >= value`
    fn add_uge_const(&mut self, value: &BigUint, sign: bool, dep: Dep);

    /// Bit `index` of `x` is set
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the bit width.
    fn add_bit(&mut self, index: u32, sign: bool, dep: Dep);

    /// Bit `index` of `x` is clear
    fn add_bit0(&mut self, index: u32, dep: Dep) {
        self.add_bit(index, true, dep);
    }

    /// Bit `index` of `x` is set
    fn add_bit1(&mut self, index: u32, dep: Dep) {
        self.add_bit(index, false, dep);
    }

    /// Decide the assertions in force
    fn check(&mut self) -> CheckResult;

    /// Satisfying value of `x`
    ///
    /// # Panics
    ///
    /// Panics unless a value is cached for the current scope or the last
    /// check returned `Sat`.
    fn model(&mut self) -> BigUint;

    /// Smallest satisfying value of `x`, `None` if unsatisfiable or unknown
    fn find_min(&mut self) -> Option<BigUint>;

    /// Largest satisfying value of `x`, `None` if unsatisfiable or unknown
    fn find_max(&mut self) -> Option<BigUint>;

    /// Dependency ids of an unsatisfiable subset of the assertions in force
    ///
    /// # Panics
    ///
    /// Panics unless the last check returned `Unsat` and no scope was popped
    /// since.
    fn unsat_core(&mut self) -> Vec<Dep>;
}

/// Statistics for a solver instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Assertions added, including those of extremal searches
    pub assertions: u64,
    /// Satisfiability checks
    pub checks: u64,
    /// `model()` calls answered from the cache
    pub cache_hits: u64,
    /// `model()` calls answered by the decision procedure
    pub cache_misses: u64,
    /// `find_min`/`find_max` calls
    pub extremal_searches: u64,
}

/// One labeled assertion; its label is its index in the log
#[derive(Debug, Clone, Copy)]
struct Assertion {
    formula: TermId,
    dep: Dep,
}

/// Univariate solver that encodes constraints as bit-vector formulas
pub struct BitblastSolver<D> {
    pub(crate) tm: TermManager,
    pub(crate) backend: D,
    pub(crate) bit_width: u32,
    pub(crate) x: TermId,
    encoder: PolyEncoder,
    pub(crate) config: SolverConfig,
    /// Assertions in force, oldest first
    assertions: Vec<Assertion>,
    /// Length of `assertions` at each push
    scope_marks: Vec<usize>,
    cache: ModelCache,
    last_check: Option<CheckResult>,
    pub(crate) stats: SolverStats,
}

impl BitblastSolver<VarisatBackend> {
    /// Create a solver backed by the bit-blasting SAT backend
    pub fn new(bit_width: u32) -> Result<Self> {
        Self::with_backend(bit_width, VarisatBackend::new(), SolverConfig::default())
    }
}

impl<D: DecisionProcedure> BitblastSolver<D> {
    /// Create a solver over a given decision procedure
    pub fn with_backend(bit_width: u32, mut backend: D, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        UnivsatError::check_width(bit_width, config.max_bit_width)?;

        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", bit_width);
        backend.declare(&tm, x);
        debug!(bit_width, backend = backend.name(), "created univariate solver");
        Ok(Self {
            tm,
            backend,
            bit_width,
            x,
            encoder: PolyEncoder::new(x, bit_width, config.pow2_as_shift),
            config,
            assertions: Vec::new(),
            scope_marks: Vec::new(),
            cache: ModelCache::new(),
            last_check: None,
            stats: SolverStats::default(),
        })
    }

    /// Bit width of the unknown
    #[must_use]
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Statistics gathered so far
    #[must_use]
    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The decision procedure
    #[must_use]
    pub fn backend(&self) -> &D {
        &self.backend
    }

    /// Number of assertions in force
    #[must_use]
    pub fn num_assertions(&self) -> usize {
        self.assertions.len()
    }

    fn encode(&mut self, poly: &[BigUint]) -> TermId {
        self.encoder.encode(&mut self.tm, poly)
    }

    /// Record and forward one assertion, negated if `sign` is set
    fn assert_formula(&mut self, formula: TermId, sign: bool, dep: Dep) {
        self.cache.invalidate();
        self.last_check = None;
        let formula = if sign { self.tm.mk_not(formula) } else { formula };
        let label = Label::new(self.assertions.len() as u32);
        trace!(%label, dep, formula = %self.tm.display(formula), "assert");
        self.assertions.push(Assertion { formula, dep });
        self.backend.assert_labeled(&self.tm, formula, label);
        self.stats.assertions += 1;
    }

    fn add_binop(
        &mut self,
        op: fn(&mut TermManager, TermId, TermId) -> TermId,
        in1: &[BigUint],
        in2: &[BigUint],
        out: &[BigUint],
        sign: bool,
        dep: Dep,
    ) {
        let a = self.encode(in1);
        let b = self.encode(in2);
        let c = self.encode(out);
        let result = op(&mut self.tm, a, b);
        let formula = self.tm.mk_eq(result, c);
        self.assert_formula(formula, sign, dep);
    }

    /// Read the backend's model of `x` into the current cache frame
    fn fetch_model(&mut self) -> BigUint {
        let value = self.backend.value(&self.tm, self.x).unwrap_or_else(|| {
            panic!("{} returned no value for x after sat", self.backend.name())
        });
        debug_assert!(
            self.satisfies_all(&value),
            "model {value} violates an assertion in force"
        );
        self.stats.cache_misses += 1;
        self.cache.store(value.clone());
        value
    }

    pub(crate) fn cached_model(&self) -> Option<&BigUint> {
        self.cache.get()
    }

    pub(crate) fn last_check_is_sat(&self) -> bool {
        self.last_check == Some(CheckResult::Sat)
    }

    pub(crate) fn store_model(&mut self, value: BigUint) {
        debug_assert!(self.satisfies_all(&value));
        self.cache.store(value);
    }

    /// Does `value` satisfy every assertion in force?
    pub(crate) fn satisfies_all(&self, value: &BigUint) -> bool {
        let mut env = FxHashMap::default();
        env.insert(self.x, value.clone());
        self.assertions
            .iter()
            .all(|a| self.tm.eval(a.formula, &env) == Some(Value::Bool(true)))
    }
}

impl<D: DecisionProcedure> UnivariateSolver for BitblastSolver<D> {
    fn push(&mut self) {
        // the outer frame must answer model() again after the matching pop
        if self.last_check_is_sat() && self.cache.get().is_none() {
            self.fetch_model();
        }
        self.scope_marks.push(self.assertions.len());
        self.cache.push();
        self.backend.push();
        debug!(level = self.scope_marks.len(), "push");
    }

    fn pop(&mut self, n: u32) {
        let level = self.scope_marks.len();
        assert!(
            n as usize <= level,
            "cannot pop {n} scopes at scope level {level}"
        );
        if n == 0 {
            return;
        }
        let mark = self.scope_marks[level - n as usize];
        self.scope_marks.truncate(level - n as usize);
        self.assertions.truncate(mark);
        self.cache.pop(n as usize);
        self.backend.pop(n);
        if self.last_check == Some(CheckResult::Unsat) {
            self.last_check = None;
        }
        debug!(level = self.scope_marks.len(), "pop");
    }

    fn scope_level(&self) -> u32 {
        self.scope_marks.len() as u32
    }

    fn add_ule(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep) {
        let a = self.encode(lhs);
        let b = self.encode(rhs);
        let formula = self.tm.mk_bv_ule(a, b);
        self.assert_formula(formula, sign, dep);
    }

    fn add_umul_ovfl(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep) {
        let a = self.encode(lhs);
        let b = self.encode(rhs);
        let formula = self.tm.mk_bvumul_no_ovfl(a, b);
        self.assert_formula(formula, !sign, dep);
    }

    fn add_smul_ovfl(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep) {
        let a = self.encode(lhs);
        let b = self.encode(rhs);
        let formula = self.tm.mk_bvsmul_no_ovfl(a, b);
        self.assert_formula(formula, !sign, dep);
    }

    fn add_smul_udfl(&mut self, lhs: &[BigUint], rhs: &[BigUint], sign: bool, dep: Dep) {
        let a = self.encode(lhs);
        let b = self.encode(rhs);
        let formula = self.tm.mk_bvsmul_no_udfl(a, b);
        self.assert_formula(formula, !sign, dep);
    }

    fn add_lshr(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        self.add_binop(TermManager::mk_bv_lshr, in1, in2, out, sign, dep);
    }

    fn add_ashr(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        self.add_binop(TermManager::mk_bv_ashr, in1, in2, out, sign, dep);
    }

    fn add_shl(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        self.add_binop(TermManager::mk_bv_shl, in1, in2, out, sign, dep);
    }

    fn add_and(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        self.add_binop(TermManager::mk_bv_and, in1, in2, out, sign, dep);
    }

    fn add_or(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        self.add_binop(TermManager::mk_bv_or, in1, in2, out, sign, dep);
    }

    fn add_xor(&mut self, in1: &[BigUint], in2: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        self.add_binop(TermManager::mk_bv_xor, in1, in2, out, sign, dep);
    }

    fn add_not(&mut self, input: &[BigUint], out: &[BigUint], sign: bool, dep: Dep) {
        let a = self.encode(input);
        let b = self.encode(out);
        let negated = self.tm.mk_bv_not(a);
        let formula = self.tm.mk_eq(negated, b);
        self.assert_formula(formula, sign, dep);
    }

    fn add_ule_const(&mut self, value: &BigUint, sign: bool, dep: Dep) {
        let k = self.tm.mk_bv_numeral(value, self.bit_width);
        let formula = self.tm.mk_bv_ule(self.x, k);
        self.assert_formula(formula, sign, dep);
    }

    fn add_uge_const(&mut self, value: &BigUint, sign: bool, dep: Dep) {
        let k = self.tm.mk_bv_numeral(value, self.bit_width);
        let formula = self.tm.mk_bv_ule(k, self.x);
        self.assert_formula(formula, sign, dep);
    }

    fn add_bit(&mut self, index: u32, sign: bool, dep: Dep) {
        assert!(
            index < self.bit_width,
            "bit index {index} out of range for width {}",
            self.bit_width
        );
        let formula = self.tm.mk_bit2bool(self.x, index);
        self.assert_formula(formula, sign, dep);
    }

    fn check(&mut self) -> CheckResult {
        self.stats.checks += 1;
        let result = self.backend.check();
        debug!(%result, level = self.scope_level(), assertions = self.assertions.len(), "check");
        self.last_check = Some(result);
        result
    }

    fn model(&mut self) -> BigUint {
        if let Some(value) = self.cache.get() {
            self.stats.cache_hits += 1;
            return value.clone();
        }
        assert_eq!(
            self.last_check,
            Some(CheckResult::Sat),
            "model() requires a satisfiable check"
        );
        self.fetch_model()
    }

    fn find_min(&mut self) -> Option<BigUint> {
        self.find_extremum(crate::extremal::Direction::Min)
    }

    fn find_max(&mut self) -> Option<BigUint> {
        self.find_extremum(crate::extremal::Direction::Max)
    }

    fn unsat_core(&mut self) -> Vec<Dep> {
        assert_eq!(
            self.last_check,
            Some(CheckResult::Unsat),
            "unsat_core() requires an unsatisfiable check"
        );
        let mut deps: Vec<Dep> = self
            .backend
            .unsat_core()
            .into_iter()
            .map(|label| {
                let assertion = self.assertions.get(label.index()).unwrap_or_else(|| {
                    panic!("core label {label} does not name an assertion in force")
                });
                assertion.dep
            })
            .collect();
        deps.sort_unstable();
        deps.dedup();
        assert!(
            !deps.is_empty(),
            "{} reported an empty unsat core",
            self.backend.name()
        );
        deps
    }
}

impl<D> fmt::Debug for BitblastSolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitblastSolver")
            .field("bit_width", &self.bit_width)
            .field("scope_level", &self.scope_marks.len())
            .field("assertions", &self.assertions.len())
            .field("last_check", &self.last_check)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<D> fmt::Display for BitblastSolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(declare-const x (_ BitVec {}))", self.bit_width)?;
        for a in &self.assertions {
            writeln!(f, "(assert (! {} :named d{}))", self.tm.display(a.formula), a.dep)?;
        }
        Ok(())
    }
}
