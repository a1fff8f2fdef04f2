//! Three-Way Compare Gadget
//!
//! `a.compare(&b)` yields `1` if a > b, `0` if a == b and `-1` (p - 1) if
//! a < b, reading both operands as their canonical integers in [0, p).
//!
//! Unlike the bounded comparator there is no caller-supplied bound: both
//! operands are fully decomposed into canonical bits (including the `< p`
//! check) and folded from the most significant bit down. That is exact for
//! any field values, but only matches the *signed* reading of the operands
//! when both are non-negative, which is why it is reserved for small
//! business constants (percentages, leverage ratios, spread products).

use ark_ff::PrimeField;
use ark_r1cs_std::{
    alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, prelude::*, ToBitsGadget,
};
use ark_relations::r1cs::SynthesisError;

/// Instructions for sign-of-difference comparisons
pub trait CompareGadget<F: PrimeField> {
    /// sign(self - other) as a field element in {-1, 0, 1}
    fn compare(&self, other: &Self) -> Result<FpVar<F>, SynthesisError>;

    /// Enforce self <= other, i.e. `compare != 1`
    fn enforce_not_greater(&self, other: &Self) -> Result<(), SynthesisError> {
        let sign = self.compare(other)?;
        enforce_nonzero(&(sign - FpVar::one()))
    }

    /// Boolean for self < other, i.e. `compare == -1`
    fn is_less_than(&self, other: &Self) -> Result<Boolean<F>, SynthesisError> {
        let sign = self.compare(other)?;
        sign.is_eq(&FpVar::constant(-F::one()))
    }
}

impl<F: PrimeField> CompareGadget<F> for FpVar<F> {
    fn compare(&self, other: &Self) -> Result<FpVar<F>, SynthesisError> {
        let self_bits = self.to_bits_le()?;
        let other_bits = other.to_bits_le()?;
        compare_bits(&self_bits, &other_bits)
    }
}

/// Fold two little-endian bit strings of equal weight into sign(a - b).
pub fn compare_bits<F: PrimeField>(
    a_bits: &[Boolean<F>],
    b_bits: &[Boolean<F>],
) -> Result<FpVar<F>, SynthesisError> {
    let mut sign = FpVar::zero();

    for (a, b) in a_bits.iter().zip(b_bits.iter()).rev() {
        let bit_sign = FpVar::from(a.clone()) - FpVar::from(b.clone());

        // sign is in {-1, 0, 1}: sign^2 is 1 once a higher bit decided
        let undecided = FpVar::one() - sign.square()?;
        sign += undecided * bit_sign;
    }

    Ok(sign)
}

/// Enforce `value != 0` by witnessing its inverse.
///
/// A zero value gets a zero "inverse", which leaves `value * inv = 1`
/// unsatisfied instead of aborting synthesis.
pub fn enforce_nonzero<F: PrimeField>(value: &FpVar<F>) -> Result<(), SynthesisError> {
    if let FpVar::Constant(c) = value {
        return if c.is_zero() {
            Err(SynthesisError::Unsatisfiable)
        } else {
            Ok(())
        };
    }

    let inverse = FpVar::new_witness(value.cs(), || {
        Ok(value.value()?.inverse().unwrap_or_else(F::zero))
    })?;
    value.mul_equals(&inverse, &FpVar::one())
}
