//! Field Value helpers
//!
//! Every circuit quantity is a prime-field element. Business inputs are
//! signed integers, so a negative value `v` is embedded as `p - |v|` and
//! read back the same way.

use ark_ff::{BigInteger, PrimeField};

/// Embed a signed integer into the field (`-1` becomes `p - 1`).
pub fn field_from_i64<F: PrimeField>(value: i64) -> F {
    let magnitude = F::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Embed a signed 128-bit integer into the field.
pub fn field_from_i128<F: PrimeField>(value: i128) -> F {
    let magnitude = F::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Signed reading of a field element.
///
/// Values up to `(p - 1) / 2` are non-negative, everything above is the
/// image of a negative integer. Returns `None` when the magnitude does not
/// fit in an `i128`.
pub fn field_to_i128<F: PrimeField>(value: F) -> Option<i128> {
    let bigint = value.into_bigint();
    if bigint <= F::MODULUS_MINUS_ONE_DIV_TWO {
        magnitude_to_i128::<F>(bigint)
    } else {
        magnitude_to_i128::<F>((-value).into_bigint()).map(|m| -m)
    }
}

fn magnitude_to_i128<F: PrimeField>(bigint: F::BigInt) -> Option<i128> {
    if bigint.num_bits() > 127 {
        return None;
    }
    let limbs = bigint.as_ref();
    let low = limbs.first().copied().unwrap_or(0) as u128;
    let high = limbs.get(1).copied().unwrap_or(0) as u128;
    Some(((high << 64) | low) as i128)
}

/// Canonical decimal representation (`0 <= s < p`), as used by the JSON exports.
pub fn to_decimal_string<F: PrimeField>(value: &F) -> String {
    value.into_bigint().to_string()
}
