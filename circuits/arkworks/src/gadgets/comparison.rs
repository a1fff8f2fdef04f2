//! Bounded Comparator Gadget
//!
//! Proves x <= y by showing (y - x) is in range [0, 2^BITS).
//!
//! # Strategy
//! 1. Compute diff = y - x (in finite field)
//! 2. Range check that diff fits in `bitlen(bound)` bits
//! 3. If x <= y, diff is small and in range
//! 4. If x > y, diff wraps to p - (x - y) which is huge, failing the range check
//!
//! # Important Constraint
//! Both operands MUST lie within [0, bound], or be the field image of a
//! signed integer whose magnitude is at most `bound`. The gadget cannot check
//! this itself; an operand outside the bound can make a false inequality
//! pass through wraparound.

use ark_ff::PrimeField;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar};
use ark_relations::r1cs::SynthesisError;

use super::range_check::enforce_bit_length;

/// Comparator for values bounded by a fixed power-of-two-aligned maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedComparator {
    num_bits: usize,
}

impl BoundedComparator {
    /// Comparator whose differences must fit in `num_bits` bits.
    pub const fn with_bits(num_bits: usize) -> Self {
        Self { num_bits }
    }

    /// Comparator for operands bounded by `max` (uses `bitlen(max)` bits).
    pub const fn for_max(max: u64) -> Self {
        Self {
            num_bits: (u64::BITS - max.leading_zeros()) as usize,
        }
    }

    pub const fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Whether the bound leaves enough headroom below the modulus.
    ///
    /// A wrapped difference `p - d` with `d < 2^n` must never fit in `n`
    /// bits, which holds while `2^(n+1) <= p`.
    pub fn is_sound_for<F: PrimeField>(&self) -> bool {
        self.num_bits + 2 <= F::MODULUS_BIT_SIZE as usize
    }

    /// Enforce `x <= y`.
    pub fn assert_less_or_equal<F: PrimeField>(
        &self,
        x: &FpVar<F>,
        y: &FpVar<F>,
    ) -> Result<(), SynthesisError> {
        self.difference_bits(x, y).map(|_| ())
    }

    /// Enforce `x < y`, i.e. `x + 1 <= y`.
    pub fn assert_less<F: PrimeField>(
        &self,
        x: &FpVar<F>,
        y: &FpVar<F>,
    ) -> Result<(), SynthesisError> {
        let x_plus_one = x + F::one();
        self.assert_less_or_equal(&x_plus_one, y)
    }

    /// Bits of `y - x`; only satisfiable when `x <= y`.
    pub fn difference_bits<F: PrimeField>(
        &self,
        x: &FpVar<F>,
        y: &FpVar<F>,
    ) -> Result<Vec<Boolean<F>>, SynthesisError> {
        if !self.is_sound_for::<F>() {
            return Err(SynthesisError::Unsatisfiable);
        }
        let diff = y - x;
        enforce_bit_length(&diff, self.num_bits)
    }
}
