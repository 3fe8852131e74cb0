//! Bit-blasting of terms into CNF
//!
//! Every bit-vector term becomes a vector of SAT literals (LSB first) and every
//! formula a single literal. Gate outputs are defined by Tseitin clauses that
//! hold unconditionally, so blasted terms can be shared across scopes.
//! Gates fold constant inputs, which turns shifts by numerals and products with
//! numeral coefficients into plain wiring and sparse adders.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use univsat_core::ast::{Sort, TermId, TermKind, TermManager};
use univsat_core::numeral;
use varisat::{ExtendFormula, Lit, Solver as SatSolver};

/// Literals of a bit vector, LSB first
pub type Bits = SmallVec<[Lit; 32]>;

/// Statistics for bit-blasting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlastStats {
    /// Terms and formulas translated
    pub terms_blasted: u64,
    /// SAT variables allocated
    pub vars: u64,
    /// Clauses emitted
    pub clauses: u64,
}

/// Direction of a barrel shifter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Left,
    LogicalRight,
    ArithmeticRight,
}

/// Translates terms into clauses of an embedded SAT solver
pub struct BitBlaster {
    /// Embedded SAT solver
    sat: SatSolver<'static>,
    /// Literal fixed to true by a unit clause
    true_lit: Lit,
    /// Blasted bit-vector terms
    term_bits: FxHashMap<TermId, Bits>,
    /// Blasted formulas
    formula_lits: FxHashMap<TermId, Lit>,
    stats: BlastStats,
}

impl Default for BitBlaster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BitBlaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitBlaster")
            .field("terms", &self.term_bits.len())
            .field("formulas", &self.formula_lits.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl BitBlaster {
    /// Create a bit-blaster with a fresh SAT solver
    #[must_use]
    pub fn new() -> Self {
        let mut sat = SatSolver::new();
        let true_lit = sat.new_lit();
        sat.add_clause(&[true_lit]);
        Self {
            sat,
            true_lit,
            term_bits: FxHashMap::default(),
            formula_lits: FxHashMap::default(),
            stats: BlastStats {
                terms_blasted: 0,
                vars: 1,
                clauses: 1,
            },
        }
    }

    /// Statistics gathered so far
    #[must_use]
    pub fn stats(&self) -> BlastStats {
        self.stats
    }

    /// The embedded SAT solver
    pub fn sat(&mut self) -> &mut SatSolver<'static> {
        &mut self.sat
    }

    /// Bits of an already blasted term
    #[must_use]
    pub fn term_bits(&self, term: TermId) -> Option<&Bits> {
        self.term_bits.get(&term)
    }

    /// Literal of an already blasted formula
    #[must_use]
    pub fn formula_lit(&self, formula: TermId) -> Option<Lit> {
        self.formula_lits.get(&formula).copied()
    }

    /// Allocate a fresh literal
    pub fn fresh(&mut self) -> Lit {
        self.stats.vars += 1;
        self.sat.new_lit()
    }

    /// Emit a clause
    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.stats.clauses += 1;
        self.sat.add_clause(lits);
    }

    fn const_lit(&self, value: bool) -> Lit {
        if value {
            self.true_lit
        } else {
            !self.true_lit
        }
    }

    fn const_value(&self, lit: Lit) -> Option<bool> {
        if lit == self.true_lit {
            Some(true)
        } else if lit == !self.true_lit {
            Some(false)
        } else {
            None
        }
    }

    // ===== Term translation =====

    /// Blast a bit-vector term
    pub fn blast_term(&mut self, tm: &TermManager, term: TermId) -> Bits {
        if let Some(bits) = self.term_bits.get(&term) {
            return bits.clone();
        }
        let width = match tm.sort(term) {
            Sort::BitVec(w) => w,
            Sort::Bool => panic!("blast_term called on a formula"),
        };
        let bits: Bits = match &tm.get(term).kind {
            TermKind::BvConst(value) => (0..width)
                .map(|i| self.const_lit(numeral::bit(value, i)))
                .collect(),
            TermKind::BvVar(_) => (0..width).map(|_| self.fresh()).collect(),
            TermKind::BvAdd(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                self.adder(&a, &b)
            }
            TermKind::BvMul(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                self.multiplier(&a, &b, a.len())
            }
            TermKind::BvShl(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                self.barrel_shifter(&a, &b, ShiftKind::Left)
            }
            TermKind::BvLshr(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                self.barrel_shifter(&a, &b, ShiftKind::LogicalRight)
            }
            TermKind::BvAshr(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                self.barrel_shifter(&a, &b, ShiftKind::ArithmeticRight)
            }
            TermKind::BvAnd(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                a.iter().zip(&b).map(|(&x, &y)| self.mk_and(x, y)).collect()
            }
            TermKind::BvOr(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                a.iter().zip(&b).map(|(&x, &y)| self.mk_or(x, y)).collect()
            }
            TermKind::BvXor(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                a.iter().zip(&b).map(|(&x, &y)| self.mk_xor(x, y)).collect()
            }
            TermKind::BvNot(a) => self.blast_term(tm, *a).iter().map(|&x| !x).collect(),
            _ => unreachable!("bit-vector sorted term with formula constructor"),
        };
        debug_assert_eq!(bits.len(), width as usize);
        self.stats.terms_blasted += 1;
        self.term_bits.insert(term, bits.clone());
        bits
    }

    /// Blast a formula into a literal equivalent to it
    pub fn blast_formula(&mut self, tm: &TermManager, formula: TermId) -> Lit {
        if let Some(&lit) = self.formula_lits.get(&formula) {
            return lit;
        }
        assert_eq!(tm.sort(formula), Sort::Bool, "blast_formula called on a term");
        let lit = match &tm.get(formula).kind {
            TermKind::Not(f) => !self.blast_formula(tm, *f),
            TermKind::Eq(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                self.equal(&a, &b)
            }
            TermKind::BvUle(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                !self.less_than(&b, &a)
            }
            TermKind::Bit(a, index) => self.blast_term(tm, *a)[*index as usize],
            TermKind::BvUmulNoOvfl(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                let width = a.len();
                let product = self.multiplier(&a, &b, 2 * width);
                !self.mk_or_many(&product[width..])
            }
            TermKind::BvSmulNoOvfl(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                let width = a.len();
                let product = self.signed_product(&a, &b);
                // product <= 2^(w-1) - 1: negative, or bits w-1.. all clear
                let sign = product[2 * width - 1];
                let fits = !self.mk_or_many(&product[width - 1..]);
                self.mk_or(sign, fits)
            }
            TermKind::BvSmulNoUdfl(a, b) => {
                let (a, b) = (self.blast_term(tm, *a), self.blast_term(tm, *b));
                let width = a.len();
                let product = self.signed_product(&a, &b);
                // product >= -2^(w-1): non-negative, or bits w-1.. all set
                let sign = product[2 * width - 1];
                let fits = self.mk_and_many(&product[width - 1..]);
                self.mk_or(!sign, fits)
            }
            _ => unreachable!("formula sorted term with bit-vector constructor"),
        };
        self.stats.terms_blasted += 1;
        self.formula_lits.insert(formula, lit);
        lit
    }

    // ===== Word-level circuits =====

    /// Ripple-carry adder, result truncated to the operand width
    fn adder(&mut self, a: &[Lit], b: &[Lit]) -> Bits {
        assert_eq!(a.len(), b.len());
        let mut carry = self.const_lit(false);
        let mut sum = Bits::with_capacity(a.len());
        for (&ai, &bi) in a.iter().zip(b) {
            let (s, c) = self.full_adder(ai, bi, carry);
            sum.push(s);
            carry = c;
        }
        sum
    }

    /// Product of `a` and `b` truncated to `out_width` bits
    ///
    /// Partial products are collected per column and compressed with full
    /// adders until every column holds at most two bits, then summed with a
    /// ripple-carry adder.
    fn multiplier(&mut self, a: &[Lit], b: &[Lit], out_width: usize) -> Bits {
        let mut columns: Vec<Vec<Lit>> = vec![Vec::new(); out_width];
        for (i, &a_bit) in a.iter().enumerate() {
            for (j, &b_bit) in b.iter().enumerate() {
                if i + j >= out_width {
                    break;
                }
                let pp = self.mk_and(a_bit, b_bit);
                if self.const_value(pp) != Some(false) {
                    columns[i + j].push(pp);
                }
            }
        }

        loop {
            let max_height = columns.iter().map(Vec::len).max().unwrap_or(0);
            if max_height <= 2 {
                break;
            }
            let mut next: Vec<Vec<Lit>> = vec![Vec::new(); out_width];
            for (k, column) in columns.iter().enumerate() {
                let mut chunks = column.chunks_exact(3);
                for chunk in &mut chunks {
                    let (sum, carry) = self.full_adder(chunk[0], chunk[1], chunk[2]);
                    next[k].push(sum);
                    if k + 1 < out_width {
                        next[k + 1].push(carry);
                    }
                }
                next[k].extend_from_slice(chunks.remainder());
            }
            columns = next;
        }

        let zero = self.const_lit(false);
        let operand_a: Bits = columns.iter().map(|c| c.first().copied().unwrap_or(zero)).collect();
        let operand_b: Bits = columns.iter().map(|c| c.get(1).copied().unwrap_or(zero)).collect();
        self.adder(&operand_a, &operand_b)
    }

    /// Exact signed product of two `w`-bit values as a `2w`-bit vector
    fn signed_product(&mut self, a: &[Lit], b: &[Lit]) -> Bits {
        let width = a.len();
        let extend = |bits: &[Lit]| -> Bits {
            let sign = bits[width - 1];
            bits.iter().copied().chain(std::iter::repeat(sign).take(width)).collect()
        };
        let (a, b) = (extend(a), extend(b));
        self.multiplier(&a, &b, 2 * width)
    }

    /// Barrel shifter; shifting by the width or more yields the fill value
    fn barrel_shifter(&mut self, a: &[Lit], amount: &[Lit], kind: ShiftKind) -> Bits {
        assert_eq!(a.len(), amount.len());
        let width = a.len();
        let fill = match kind {
            ShiftKind::ArithmeticRight => a[width - 1],
            ShiftKind::Left | ShiftKind::LogicalRight => self.const_lit(false),
        };

        let mut current: Bits = a.iter().copied().collect();
        let mut stage = 0;
        while stage < amount.len() && (1usize << stage) < width {
            let shift_by = 1usize << stage;
            let sel = amount[stage];
            let mut next = Bits::with_capacity(width);
            for i in 0..width {
                let shifted = match kind {
                    ShiftKind::Left if i >= shift_by => current[i - shift_by],
                    ShiftKind::Left => fill,
                    _ if i + shift_by < width => current[i + shift_by],
                    _ => fill,
                };
                next.push(self.mk_mux(sel, shifted, current[i]));
            }
            current = next;
            stage += 1;
        }

        // any remaining amount bit moves every bit out
        let out_of_range = self.mk_or_many(&amount[stage..]);
        current
            .iter()
            .map(|&bit| self.mk_mux(out_of_range, fill, bit))
            .collect()
    }

    /// `a < b` (unsigned), compared from LSB to MSB
    fn less_than(&mut self, a: &[Lit], b: &[Lit]) -> Lit {
        assert_eq!(a.len(), b.len());
        let mut lt = self.const_lit(false);
        for (&ai, &bi) in a.iter().zip(b) {
            // higher bits override lower ones
            let lt_here = self.mk_and(!ai, bi);
            let same = !self.mk_xor(ai, bi);
            let carried = self.mk_and(same, lt);
            lt = self.mk_or(lt_here, carried);
        }
        lt
    }

    /// `a = b`
    fn equal(&mut self, a: &[Lit], b: &[Lit]) -> Lit {
        assert_eq!(a.len(), b.len());
        let same: Bits = a.iter().zip(b).map(|(&x, &y)| !self.mk_xor(x, y)).collect();
        self.mk_and_many(&same)
    }

    /// Full adder: (a ^ b ^ carry_in, majority(a, b, carry_in))
    fn full_adder(&mut self, a: Lit, b: Lit, carry_in: Lit) -> (Lit, Lit) {
        let xor_ab = self.mk_xor(a, b);
        let sum = self.mk_xor(xor_ab, carry_in);
        let and_ab = self.mk_and(a, b);
        let and_cin_xor = self.mk_and(carry_in, xor_ab);
        let carry_out = self.mk_or(and_ab, and_cin_xor);
        (sum, carry_out)
    }

    // ===== Gates with constant folding =====

    fn mk_and(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(false), _) | (_, Some(false)) => return self.const_lit(false),
            (Some(true), _) => return b,
            (_, Some(true)) => return a,
            _ => {}
        }
        if a == b {
            return a;
        }
        if a == !b {
            return self.const_lit(false);
        }
        let out = self.fresh();
        self.encode_and(out, a, b);
        out
    }

    fn mk_or(&mut self, a: Lit, b: Lit) -> Lit {
        !self.mk_and(!a, !b)
    }

    fn mk_xor(&mut self, a: Lit, b: Lit) -> Lit {
        match (self.const_value(a), self.const_value(b)) {
            (Some(x), Some(y)) => return self.const_lit(x != y),
            (Some(false), None) => return b,
            (Some(true), None) => return !b,
            (None, Some(false)) => return a,
            (None, Some(true)) => return !a,
            (None, None) => {}
        }
        if a == b {
            return self.const_lit(false);
        }
        if a == !b {
            return self.const_lit(true);
        }
        let out = self.fresh();
        self.encode_xor(out, a, b);
        out
    }

    fn mk_mux(&mut self, sel: Lit, if_true: Lit, if_false: Lit) -> Lit {
        match self.const_value(sel) {
            Some(true) => return if_true,
            Some(false) => return if_false,
            None => {}
        }
        if if_true == if_false {
            return if_true;
        }
        let out = self.fresh();
        self.encode_mux(out, sel, if_true, if_false);
        out
    }

    fn mk_and_many(&mut self, lits: &[Lit]) -> Lit {
        let mut inputs: SmallVec<[Lit; 32]> = SmallVec::new();
        for &lit in lits {
            match self.const_value(lit) {
                Some(false) => return self.const_lit(false),
                Some(true) => {}
                None => inputs.push(lit),
            }
        }
        match inputs.len() {
            0 => self.const_lit(true),
            1 => inputs[0],
            _ => {
                let out = self.fresh();
                // out => each input
                for &lit in &inputs {
                    self.add_clause(&[!out, lit]);
                }
                // all inputs => out
                let mut clause: SmallVec<[Lit; 32]> = inputs.iter().map(|&l| !l).collect();
                clause.push(out);
                self.add_clause(&clause);
                out
            }
        }
    }

    fn mk_or_many(&mut self, lits: &[Lit]) -> Lit {
        let negated: SmallVec<[Lit; 32]> = lits.iter().map(|&l| !l).collect();
        !self.mk_and_many(&negated)
    }

    // ===== Clause encodings =====

    /// Encode AND gate: out = a & b
    fn encode_and(&mut self, out: Lit, a: Lit, b: Lit) {
        self.add_clause(&[!out, a]);
        self.add_clause(&[!out, b]);
        self.add_clause(&[out, !a, !b]);
    }

    /// Encode XOR gate: out = a ^ b
    fn encode_xor(&mut self, out: Lit, a: Lit, b: Lit) {
        self.add_clause(&[!out, !a, !b]);
        self.add_clause(&[!out, a, b]);
        self.add_clause(&[out, !a, b]);
        self.add_clause(&[out, a, !b]);
    }

    /// Encode multiplexer: out = sel ? if_true : if_false
    fn encode_mux(&mut self, out: Lit, sel: Lit, if_true: Lit, if_false: Lit) {
        self.add_clause(&[!sel, !if_true, out]);
        self.add_clause(&[!sel, if_true, !out]);
        self.add_clause(&[sel, !if_false, out]);
        self.add_clause(&[sel, if_false, !out]);
    }
}
