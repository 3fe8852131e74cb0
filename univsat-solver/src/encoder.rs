//! Polynomial encoding
//!
//! Turns a coefficient list `[c0, c1, ..., cn]` into the bit-vector term
//! `c0 + c1*x + ... + cn*x^n` over the solver's unknown.

use num_bigint::BigUint;
use num_traits::Zero;
use univsat_core::ast::{TermId, TermManager};
use univsat_core::numeral;

/// Encoder of univariate polynomials over a fixed unknown
#[derive(Debug, Clone, Copy)]
pub struct PolyEncoder {
    x: TermId,
    width: u32,
    pow2_as_shift: bool,
}

impl PolyEncoder {
    /// Create an encoder for the unknown `x` of the given width
    #[must_use]
    pub fn new(x: TermId, width: u32, pow2_as_shift: bool) -> Self {
        Self {
            x,
            width,
            pow2_as_shift,
        }
    }

    /// Encode `poly` (constant coefficient first)
    ///
    /// Coefficients are taken modulo `2^width`. The empty polynomial is 0.
    pub fn encode(&self, tm: &mut TermManager, poly: &[BigUint]) -> TermId {
        let Some((c0, rest)) = poly.split_first() else {
            return tm.mk_bv_numeral(&BigUint::zero(), self.width);
        };
        let mut result = tm.mk_bv_numeral(c0, self.width);
        let mut power = self.x;
        for (i, coeff) in rest.iter().enumerate() {
            if i > 0 {
                power = tm.mk_bv_mul(power, self.x);
            }
            let coeff = numeral::truncate(coeff, self.width);
            if coeff.is_zero() {
                continue;
            }
            let term = self.scale(tm, power, &coeff);
            result = tm.mk_bv_add(result, term);
        }
        result
    }

    /// `coeff * power`, as a shift when `coeff` is a power of two
    fn scale(&self, tm: &mut TermManager, power: TermId, coeff: &BigUint) -> TermId {
        if self.pow2_as_shift {
            if let Some(k) = numeral::power_of_two(coeff) {
                if k == 0 {
                    return power;
                }
                let amount = tm.mk_bv_u64(k, self.width);
                return tm.mk_bv_shl(power, amount);
            }
        }
        let c = tm.mk_bv_numeral(coeff, self.width);
        tm.mk_bv_mul(c, power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rustc_hash::FxHashMap;
    use univsat_core::ast::{TermKind, Value};

    fn eval_at(tm: &TermManager, x: TermId, term: TermId, v: u64) -> BigUint {
        let mut env = FxHashMap::default();
        env.insert(x, BigUint::from(v));
        match tm.eval(term, &env) {
            Some(Value::BitVec(v)) => v,
            other => panic!("unexpected value {other:?}"),
        }
    }

    fn reference(poly: &[u64], v: u64, width: u32) -> BigUint {
        let mut acc = BigUint::zero();
        let mut power = BigUint::from(1u32);
        for &c in poly {
            acc += BigUint::from(c) * &power;
            power *= v;
        }
        numeral::truncate(&acc, width)
    }

    #[test]
    fn test_empty_is_zero() {
        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", 8);
        let enc = PolyEncoder::new(x, 8, true);
        let t = enc.encode(&mut tm, &[]);
        assert_eq!(tm.numeral_value(t), Some(&BigUint::zero()));
    }

    #[test]
    fn test_constant_only() {
        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", 8);
        let enc = PolyEncoder::new(x, 8, true);
        let t = enc.encode(&mut tm, &[BigUint::from(300u32)]);
        assert_eq!(tm.numeral_value(t), Some(&BigUint::from(44u32)));
    }

    #[test]
    fn test_power_of_two_becomes_shift() {
        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", 8);
        let enc = PolyEncoder::new(x, 8, true);
        let t = enc.encode(&mut tm, &[BigUint::zero(), BigUint::from(8u32)]);
        let TermKind::BvAdd(_, scaled) = tm.get(t).kind else {
            panic!("expected an addition");
        };
        assert!(matches!(tm.get(scaled).kind, TermKind::BvShl(..)));
        assert_eq!(eval_at(&tm, x, t, 5), BigUint::from(40u32));
    }

    #[test]
    fn test_shift_disabled_uses_multiply() {
        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", 8);
        let enc = PolyEncoder::new(x, 8, false);
        let t = enc.encode(&mut tm, &[BigUint::zero(), BigUint::from(8u32)]);
        let TermKind::BvAdd(_, scaled) = tm.get(t).kind else {
            panic!("expected an addition");
        };
        assert!(matches!(tm.get(scaled).kind, TermKind::BvMul(..)));
    }

    #[test]
    fn test_coefficient_wrapping_to_zero_is_dropped() {
        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", 4);
        let enc = PolyEncoder::new(x, 4, true);
        // 16 == 0 mod 2^4, so only the constant survives
        let t = enc.encode(&mut tm, &[BigUint::from(3u32), BigUint::from(16u32)]);
        assert_eq!(tm.numeral_value(t), Some(&BigUint::from(3u32)));
    }

    #[test]
    fn test_wide_power_of_two_reduced_first() {
        let mut tm = TermManager::new();
        let x = tm.mk_bv_var("x", 4);
        let enc = PolyEncoder::new(x, 4, true);
        // 2^4 + 2 reduces to 2
        let t = enc.encode(&mut tm, &[BigUint::zero(), BigUint::from(18u32)]);
        for v in 0..16 {
            assert_eq!(eval_at(&tm, x, t, v), BigUint::from((2 * v) % 16));
        }
    }

    proptest! {
        #[test]
        fn prop_encoding_evaluates_polynomial(
            poly in prop::collection::vec(0u64..1024, 0..5),
            v in 0u64..256,
            shift in any::<bool>(),
        ) {
            let mut tm = TermManager::new();
            let x = tm.mk_bv_var("x", 8);
            let enc = PolyEncoder::new(x, 8, shift);
            let coeffs: Vec<BigUint> = poly.iter().map(|&c| BigUint::from(c)).collect();
            let t = enc.encode(&mut tm, &coeffs);
            prop_assert_eq!(eval_at(&tm, x, t, v), reference(&poly, v, 8));
        }

        #[test]
        fn prop_shift_and_multiply_agree(k in 0u64..12, v in 0u64..1024) {
            let mut tm = TermManager::new();
            let x = tm.mk_bv_var("x", 10);
            let coeffs = [BigUint::from(1u32), BigUint::zero(), BigUint::from(1u64 << k)];
            let shifted = PolyEncoder::new(x, 10, true).encode(&mut tm, &coeffs);
            let multiplied = PolyEncoder::new(x, 10, false).encode(&mut tm, &coeffs);
            prop_assert_eq!(eval_at(&tm, x, shifted, v), eval_at(&tm, x, multiplied, v));
        }
    }
}
