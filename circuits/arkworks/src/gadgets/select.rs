//! Select / Abs Gadget
//!
//! A field has no native `if`, so selection is arithmetic:
//! `select(c, a, b) = b + c * (a - b)`, one multiplication constraint.
//! That identity only means "if c then a else b" for c in {0, 1}, hence the
//! condition is a `Boolean` (booleanity enforced at allocation) or an
//! `FpVar` flag that gets an explicit `flag * (1 - flag) = 0` constraint.
//!
//! Absolute value routes through `select` on a sign test. The signed
//! reading of a field element `v` is negative when its canonical integer
//! exceeds `(p - 1) / 2`.

use ark_ff::PrimeField;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use super::compare::CompareGadget;

/// `when_true` if `cond` holds, otherwise `when_false`.
pub fn select<F: PrimeField>(
    cond: &Boolean<F>,
    when_true: &FpVar<F>,
    when_false: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let cond = FpVar::from(cond.clone());
    Ok(when_false + cond * (when_true - when_false))
}

/// Like [`select`], but for a flag carried as a plain field variable.
pub fn select_with_flag<F: PrimeField>(
    flag: &FpVar<F>,
    when_true: &FpVar<F>,
    when_false: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    // flag * (1 - flag) = 0
    flag.mul_equals(&(FpVar::one() - flag), &FpVar::zero())?;
    Ok(when_false + flag * (when_true - when_false))
}

/// `(p - 1) / 2`, the largest non-negative value in the signed reading.
fn max_non_negative<F: PrimeField>() -> Result<FpVar<F>, SynthesisError> {
    F::from_bigint(F::MODULUS_MINUS_ONE_DIV_TWO)
        .map(FpVar::constant)
        .ok_or(SynthesisError::Unsatisfiable)
}

/// Whether `value` is the image of a negative integer.
pub fn is_negative<F: PrimeField>(value: &FpVar<F>) -> Result<Boolean<F>, SynthesisError> {
    let sign = value.compare(&max_non_negative()?)?;
    sign.is_eq(&FpVar::one())
}

/// Enforce that `value` reads as a non-negative integer.
pub fn assert_non_negative<F: PrimeField>(value: &FpVar<F>) -> Result<(), SynthesisError> {
    value.enforce_not_greater(&max_non_negative()?)
}

/// `|value|`, reusing an already computed sign test.
///
/// The caller guarantees `is_non_negative` is true exactly when `value`
/// reads as non-negative; the circuits derive it from a comparison they
/// need anyway.
pub fn abs_with_sign<F: PrimeField>(
    value: &FpVar<F>,
    is_non_negative: &Boolean<F>,
) -> Result<FpVar<F>, SynthesisError> {
    select(is_non_negative, value, &value.negate()?)
}

/// `|value|` under the signed reading.
pub fn abs<F: PrimeField>(value: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    let negative = is_negative(value)?;
    abs_with_sign(value, &negative.not())
}
