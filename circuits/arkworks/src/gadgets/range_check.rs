//! Range Check Gadget (Bit Decomposition)
//!
//! Proves a value lies in [0, 2^n) by witnessing n boolean bits and
//! enforcing that they recompose to the value. In R1CS this costs one
//! booleanity constraint per bit plus one linear recomposition check.
//!
//! If the value does not fit, the witnessed low bits cannot recompose to it
//! and the constraint system becomes unsatisfiable. Synthesis never fails
//! because of an out-of-range value, so a bad position surfaces as a
//! constraint violation rather than a witness-generation error.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

/// Enforce `value < 2^num_bits` and return the little-endian bits.
///
/// `num_bits` must be smaller than the field's bit size, otherwise the
/// recomposition itself could wrap around the modulus.
pub fn enforce_bit_length<F: PrimeField>(
    value: &FpVar<F>,
    num_bits: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    if num_bits >= F::MODULUS_BIT_SIZE as usize {
        return Err(SynthesisError::Unsatisfiable);
    }

    let cs = value.cs();
    if cs.is_none() {
        // Constant: decide natively
        let bits = value.value()?.into_bigint().to_bits_le();
        if bits.iter().skip(num_bits).any(|bit| *bit) {
            return Err(SynthesisError::Unsatisfiable);
        }
        return Ok(bits.into_iter().take(num_bits).map(Boolean::constant).collect());
    }

    if num_bits == 0 {
        value.enforce_equal(&FpVar::zero())?;
        return Ok(Vec::new());
    }

    // Unknown during setup, known while proving
    let bit_values = value.value().ok().map(|v| v.into_bigint().to_bits_le());

    let bits = (0..num_bits)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                bit_values
                    .as_ref()
                    .map(|bits| bits[i])
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let recomposed = Boolean::le_bits_to_fp_var(&bits)?;
    recomposed.enforce_equal(value)?;

    Ok(bits)
}
