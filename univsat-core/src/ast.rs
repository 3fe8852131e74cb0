//! Hash-consed terms over a single bit-vector unknown.
//!
//! A [`TermManager`] is owned by exactly one solver instance. Terms are
//! identified by [`TermId`] and structurally shared: building the same term
//! twice returns the same id.

use crate::numeral;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;
use std::fmt;

/// Identifier of a term inside a [`TermManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermId(u32);

impl TermId {
    /// Create a term id from a raw index
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index of the term
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Sort of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Boolean formula
    Bool,
    /// Bit vector of the given width
    BitVec(u32),
}

/// Term constructors
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Bit-vector numeral, always reduced modulo `2^width`
    BvConst(BigUint),
    /// Named bit-vector constant (the unknown)
    BvVar(String),
    /// Modular addition
    BvAdd(TermId, TermId),
    /// Modular multiplication
    BvMul(TermId, TermId),
    /// Shift left
    BvShl(TermId, TermId),
    /// Logical shift right
    BvLshr(TermId, TermId),
    /// Arithmetic shift right
    BvAshr(TermId, TermId),
    /// Bitwise and
    BvAnd(TermId, TermId),
    /// Bitwise or
    BvOr(TermId, TermId),
    /// Bitwise xor
    BvXor(TermId, TermId),
    /// Bitwise complement
    BvNot(TermId),
    /// Boolean negation
    Not(TermId),
    /// Bit-vector equality
    Eq(TermId, TermId),
    /// Unsigned less than or equal
    BvUle(TermId, TermId),
    /// Single bit as a boolean
    Bit(TermId, u32),
    /// Unsigned product fits in the width
    BvUmulNoOvfl(TermId, TermId),
    /// Signed product does not exceed the largest signed value
    BvSmulNoOvfl(TermId, TermId),
    /// Signed product is not below the smallest signed value
    BvSmulNoUdfl(TermId, TermId),
}

/// A term with its sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Constructor and arguments
    pub kind: TermKind,
    /// Sort of the term
    pub sort: Sort,
}

/// Result of evaluating a term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Bit-vector value in `[0, 2^width)`
    BitVec(BigUint),
}

impl Value {
    /// Boolean payload, if any
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::BitVec(_) => None,
        }
    }

    /// Bit-vector payload, if any
    #[must_use]
    pub fn as_bv(&self) -> Option<&BigUint> {
        match self {
            Value::BitVec(v) => Some(v),
            Value::Bool(_) => None,
        }
    }
}

/// Arena of hash-consed terms
#[derive(Debug, Default)]
pub struct TermManager {
    terms: Vec<Term>,
    cache: FxHashMap<(TermKind, Sort), TermId>,
}

impl TermManager {
    /// Create an empty term manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check whether no term has been created
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Get a term by id
    ///
    /// Panics if the id was not issued by this manager.
    #[must_use]
    pub fn get(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize]
    }

    /// Sort of a term
    #[must_use]
    pub fn sort(&self, id: TermId) -> Sort {
        self.get(id).sort
    }

    /// Width of a bit-vector term
    #[must_use]
    pub fn width(&self, id: TermId) -> Option<u32> {
        match self.sort(id) {
            Sort::BitVec(w) => Some(w),
            Sort::Bool => None,
        }
    }

    /// Value of a numeral term
    #[must_use]
    pub fn numeral_value(&self, id: TermId) -> Option<&BigUint> {
        match &self.get(id).kind {
            TermKind::BvConst(v) => Some(v),
            _ => None,
        }
    }

    fn intern(&mut self, kind: TermKind, sort: Sort) -> TermId {
        let key = (kind, sort);
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let (kind, sort) = key;
        let id = TermId(self.terms.len() as u32);
        self.cache.insert((kind.clone(), sort), id);
        self.terms.push(Term { kind, sort });
        id
    }

    fn bv_width(&self, id: TermId) -> u32 {
        match self.sort(id) {
            Sort::BitVec(w) => w,
            Sort::Bool => panic!("expected a bit-vector term, got a formula"),
        }
    }

    fn same_width(&self, a: TermId, b: TermId) -> u32 {
        let wa = self.bv_width(a);
        let wb = self.bv_width(b);
        assert_eq!(wa, wb, "bit-vector operands must have equal width");
        wa
    }

    fn expect_bool(&self, id: TermId) {
        assert_eq!(self.sort(id), Sort::Bool, "expected a formula");
    }

    /// Declare a named bit-vector constant
    pub fn mk_bv_var(&mut self, name: &str, width: u32) -> TermId {
        assert!(width > 0, "bit-vector width must be positive");
        self.intern(TermKind::BvVar(name.to_string()), Sort::BitVec(width))
    }

    /// Bit-vector numeral, reduced modulo `2^width`
    pub fn mk_bv_numeral(&mut self, value: &BigUint, width: u32) -> TermId {
        assert!(width > 0, "bit-vector width must be positive");
        let value = numeral::truncate(value, width);
        self.intern(TermKind::BvConst(value), Sort::BitVec(width))
    }

    /// Numeral from a machine integer
    pub fn mk_bv_u64(&mut self, value: u64, width: u32) -> TermId {
        self.mk_bv_numeral(&BigUint::from(value), width)
    }

    /// `a + b`
    pub fn mk_bv_add(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvAdd(a, b), Sort::BitVec(w))
    }

    /// `a * b`
    pub fn mk_bv_mul(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvMul(a, b), Sort::BitVec(w))
    }

    /// `a << b`
    pub fn mk_bv_shl(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvShl(a, b), Sort::BitVec(w))
    }

    /// `a >> b` (logical)
    pub fn mk_bv_lshr(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvLshr(a, b), Sort::BitVec(w))
    }

    /// `a >> b` (arithmetic)
    pub fn mk_bv_ashr(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvAshr(a, b), Sort::BitVec(w))
    }

    /// `a & b`
    pub fn mk_bv_and(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvAnd(a, b), Sort::BitVec(w))
    }

    /// `a | b`
    pub fn mk_bv_or(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvOr(a, b), Sort::BitVec(w))
    }

    /// `a ^ b`
    pub fn mk_bv_xor(&mut self, a: TermId, b: TermId) -> TermId {
        let w = self.same_width(a, b);
        self.intern(TermKind::BvXor(a, b), Sort::BitVec(w))
    }

    /// `~a`
    pub fn mk_bv_not(&mut self, a: TermId) -> TermId {
        let w = self.bv_width(a);
        self.intern(TermKind::BvNot(a), Sort::BitVec(w))
    }

    /// Boolean negation; double negations cancel
    pub fn mk_not(&mut self, f: TermId) -> TermId {
        self.expect_bool(f);
        if let TermKind::Not(inner) = self.get(f).kind {
            return inner;
        }
        self.intern(TermKind::Not(f), Sort::Bool)
    }

    /// `a = b`
    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        self.same_width(a, b);
        self.intern(TermKind::Eq(a, b), Sort::Bool)
    }

    /// `a <= b` (unsigned)
    pub fn mk_bv_ule(&mut self, a: TermId, b: TermId) -> TermId {
        self.same_width(a, b);
        self.intern(TermKind::BvUle(a, b), Sort::Bool)
    }

    /// Bit `index` of `a` as a formula
    pub fn mk_bit2bool(&mut self, a: TermId, index: u32) -> TermId {
        let w = self.bv_width(a);
        assert!(index < w, "bit index {index} out of range for width {w}");
        self.intern(TermKind::Bit(a, index), Sort::Bool)
    }

    /// The unsigned product of `a` and `b` does not overflow
    pub fn mk_bvumul_no_ovfl(&mut self, a: TermId, b: TermId) -> TermId {
        self.same_width(a, b);
        self.intern(TermKind::BvUmulNoOvfl(a, b), Sort::Bool)
    }

    /// The signed product of `a` and `b` does not overflow
    pub fn mk_bvsmul_no_ovfl(&mut self, a: TermId, b: TermId) -> TermId {
        self.same_width(a, b);
        self.intern(TermKind::BvSmulNoOvfl(a, b), Sort::Bool)
    }

    /// The signed product of `a` and `b` does not underflow
    pub fn mk_bvsmul_no_udfl(&mut self, a: TermId, b: TermId) -> TermId {
        self.same_width(a, b);
        self.intern(TermKind::BvSmulNoUdfl(a, b), Sort::Bool)
    }

    /// Evaluate a term under an assignment of its variables
    ///
    /// Returns `None` if a variable reachable from `id` is unassigned.
    #[must_use]
    pub fn eval(&self, id: TermId, env: &FxHashMap<TermId, BigUint>) -> Option<Value> {
        let mut memo = FxHashMap::default();
        self.eval_rec(id, env, &mut memo)
    }

    fn eval_bv(
        &self,
        id: TermId,
        env: &FxHashMap<TermId, BigUint>,
        memo: &mut FxHashMap<TermId, Value>,
    ) -> Option<BigUint> {
        match self.eval_rec(id, env, memo)? {
            Value::BitVec(v) => Some(v),
            Value::Bool(_) => None,
        }
    }

    fn eval_rec(
        &self,
        id: TermId,
        env: &FxHashMap<TermId, BigUint>,
        memo: &mut FxHashMap<TermId, Value>,
    ) -> Option<Value> {
        if let Some(v) = memo.get(&id) {
            return Some(v.clone());
        }
        let term = self.get(id);
        let width = match term.sort {
            Sort::BitVec(w) => w,
            Sort::Bool => 0,
        };
        let value = match &term.kind {
            TermKind::BvConst(v) => Value::BitVec(v.clone()),
            TermKind::BvVar(_) => Value::BitVec(numeral::truncate(env.get(&id)?, width)),
            TermKind::BvAdd(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(numeral::truncate(&(a + b), width))
            }
            TermKind::BvMul(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(numeral::truncate(&(a * b), width))
            }
            TermKind::BvShl(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(match shift_amount(&b, width) {
                    Some(s) => numeral::truncate(&(a << s), width),
                    None => BigUint::zero(),
                })
            }
            TermKind::BvLshr(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(match shift_amount(&b, width) {
                    Some(s) => a >> s,
                    None => BigUint::zero(),
                })
            }
            TermKind::BvAshr(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                let negative = numeral::bit(&a, width - 1);
                let mask = numeral::mask(width);
                Value::BitVec(match (shift_amount(&b, width), negative) {
                    (Some(s), false) => a >> s,
                    (Some(s), true) => (a >> s) | (&mask - (&mask >> s)),
                    (None, false) => BigUint::zero(),
                    (None, true) => mask,
                })
            }
            TermKind::BvAnd(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(a & b)
            }
            TermKind::BvOr(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(a | b)
            }
            TermKind::BvXor(a, b) => {
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::BitVec(a ^ b)
            }
            TermKind::BvNot(a) => {
                let a = self.eval_bv(*a, env, memo)?;
                Value::BitVec(numeral::mask(width) ^ a)
            }
            TermKind::Not(f) => Value::Bool(!self.eval_rec(*f, env, memo)?.as_bool()?),
            TermKind::Eq(a, b) => {
                Value::Bool(self.eval_bv(*a, env, memo)? == self.eval_bv(*b, env, memo)?)
            }
            TermKind::BvUle(a, b) => {
                Value::Bool(self.eval_bv(*a, env, memo)? <= self.eval_bv(*b, env, memo)?)
            }
            TermKind::Bit(a, index) => Value::Bool(numeral::bit(&self.eval_bv(*a, env, memo)?, *index)),
            TermKind::BvUmulNoOvfl(a, b) => {
                let w = self.bv_width(*a);
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                Value::Bool(a * b <= numeral::mask(w))
            }
            TermKind::BvSmulNoOvfl(a, b) => {
                let w = self.bv_width(*a);
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                let product = numeral::to_signed(&a, w) * numeral::to_signed(&b, w);
                let max = num_bigint::BigInt::from(numeral::mask(w - 1));
                Value::Bool(product <= max)
            }
            TermKind::BvSmulNoUdfl(a, b) => {
                let w = self.bv_width(*a);
                let (a, b) = (self.eval_bv(*a, env, memo)?, self.eval_bv(*b, env, memo)?);
                let product = numeral::to_signed(&a, w) * numeral::to_signed(&b, w);
                let min = -(num_bigint::BigInt::one() << (w - 1));
                Value::Bool(product >= min)
            }
        };
        memo.insert(id, value.clone());
        Some(value)
    }

    /// SMT-LIB rendering of a term
    #[must_use]
    pub fn display(&self, id: TermId) -> TermDisplay<'_> {
        TermDisplay { tm: self, id }
    }
}

/// Shift amount if it is below the width
fn shift_amount(amount: &BigUint, width: u32) -> Option<u32> {
    if amount < &BigUint::from(width) {
        u32::try_from(amount).ok()
    } else {
        None
    }
}

/// SMT-LIB printer returned by [`TermManager::display`]
pub struct TermDisplay<'a> {
    tm: &'a TermManager,
    id: TermId,
}

impl TermDisplay<'_> {
    fn child(&self, id: TermId) -> Self {
        TermDisplay { tm: self.tm, id }
    }

    fn binary(&self, f: &mut fmt::Formatter<'_>, op: &str, a: TermId, b: TermId) -> fmt::Result {
        write!(f, "({op} {} {})", self.child(a), self.child(b))
    }
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let term = self.tm.get(self.id);
        match &term.kind {
            TermKind::BvConst(v) => match term.sort {
                Sort::BitVec(w) => write!(f, "(_ bv{v} {w})"),
                Sort::Bool => unreachable!("numerals are bit-vectors"),
            },
            TermKind::BvVar(name) => write!(f, "{name}"),
            TermKind::BvAdd(a, b) => self.binary(f, "bvadd", *a, *b),
            TermKind::BvMul(a, b) => self.binary(f, "bvmul", *a, *b),
            TermKind::BvShl(a, b) => self.binary(f, "bvshl", *a, *b),
            TermKind::BvLshr(a, b) => self.binary(f, "bvlshr", *a, *b),
            TermKind::BvAshr(a, b) => self.binary(f, "bvashr", *a, *b),
            TermKind::BvAnd(a, b) => self.binary(f, "bvand", *a, *b),
            TermKind::BvOr(a, b) => self.binary(f, "bvor", *a, *b),
            TermKind::BvXor(a, b) => self.binary(f, "bvxor", *a, *b),
            TermKind::BvNot(a) => write!(f, "(bvnot {})", self.child(*a)),
            TermKind::Not(a) => write!(f, "(not {})", self.child(*a)),
            TermKind::Eq(a, b) => self.binary(f, "=", *a, *b),
            TermKind::BvUle(a, b) => self.binary(f, "bvule", *a, *b),
            TermKind::Bit(a, i) => write!(f, "(= ((_ extract {i} {i}) {}) #b1)", self.child(*a)),
            TermKind::BvUmulNoOvfl(a, b) => self.binary(f, "bvumul_noovfl", *a, *b),
            TermKind::BvSmulNoOvfl(a, b) => self.binary(f, "bvsmul_noovfl", *a, *b),
            TermKind::BvSmulNoUdfl(a, b) => self.binary(f, "bvsmul_noudfl", *a, *b),
        }
    }
}
