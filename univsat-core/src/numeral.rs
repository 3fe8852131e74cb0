//! Fixed-width numeral helpers.
//!
//! Bit-vector values are represented as `BigUint` in `[0, 2^width)`.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

/// `2^width - 1`
#[must_use]
pub fn mask(width: u32) -> BigUint {
    (BigUint::one() << width) - BigUint::one()
}

/// Reduce a value modulo `2^width`
#[must_use]
pub fn truncate(value: &BigUint, width: u32) -> BigUint {
    value & mask(width)
}

/// Return `k` if `value == 2^k`
#[must_use]
pub fn power_of_two(value: &BigUint) -> Option<u64> {
    if value.count_ones() == 1 {
        value.trailing_zeros()
    } else {
        None
    }
}

/// Test bit `index` (LSB is 0)
#[must_use]
pub fn bit(value: &BigUint, index: u32) -> bool {
    value.bit(u64::from(index))
}

/// Interpret a `width`-bit value as two's complement
#[must_use]
pub fn to_signed(value: &BigUint, width: u32) -> BigInt {
    if width > 0 && bit(value, width - 1) {
        BigInt::from(value.clone()) - (BigInt::one() << width)
    } else {
        BigInt::from(value.clone())
    }
}

/// Reduce a signed value to its `width`-bit two's complement encoding
#[must_use]
pub fn from_signed(value: &BigInt, width: u32) -> BigUint {
    let modulus = BigInt::one() << width;
    let mut reduced = value % &modulus;
    if reduced.sign() == Sign::Minus {
        reduced += modulus;
    }
    reduced.to_biguint().unwrap_or_else(BigUint::zero)
}
