//! Risk-Neutral Circuit - arkworks R1CS Implementation
//!
//! Proves a position's leverage and delta spread respect public bounds
//! without revealing the leverage or the delta range.
//!
//! # Circuit Constraints
//! 1. Ordering (bounded): 0 <= delta_min <= delta_max, spread below 2^63
//! 2. Bounds: delta_upper, leverage_upper in [0, 100], leverage >= 0
//! 3. Confirmation: leverage_confirm == sign(leverage - leverage_upper)
//! 4. Confirmation: delta_confirm == sign(100 * (max - min) - delta_upper * max)
//!
//! The verifier learns only the two signs. A holder may prove a position
//! that breaches a bound, as long as the published sign says so.
//!
//! # Public Input Order
//! `[leverage_upper, delta_upper, leverage_confirm, delta_confirm]`

use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use serde::{Deserialize, Serialize};

use crate::backend::ComplianceCircuit;
use crate::error::validation::{sign, PERCENT_SCALE};
use crate::field::field_from_i64;
use crate::funding_rate::DEFAULT_DELTA_BOUND_BITS;
use crate::gadgets::{assert_non_negative, BoundedComparator, CompareGadget};

/// Risk-Neutral Circuit for arkworks
#[derive(Clone, Debug)]
pub struct RiskNeutralCircuit<F: PrimeField> {
    /// Private: actual leverage ratio
    pub leverage: Option<F>,
    /// Private: upper end of the delta range
    pub delta_max: Option<F>,
    /// Private: lower end of the delta range
    pub delta_min: Option<F>,
    /// Public: leverage bound (percentage scale)
    pub leverage_upper: Option<F>,
    /// Public: tolerated delta spread (percentage of delta_max)
    pub delta_upper: Option<F>,
    /// Public: claimed sign(leverage - leverage_upper)
    pub leverage_confirm: Option<F>,
    /// Public: claimed sign of the spread test
    pub delta_confirm: Option<F>,
}

impl<F: PrimeField> RiskNeutralCircuit<F> {
    /// Create a new circuit
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        leverage: F,
        delta_max: F,
        delta_min: F,
        leverage_upper: F,
        delta_upper: F,
        leverage_confirm: F,
        delta_confirm: F,
    ) -> Self {
        Self {
            leverage: Some(leverage),
            delta_max: Some(delta_max),
            delta_min: Some(delta_min),
            leverage_upper: Some(leverage_upper),
            delta_upper: Some(delta_upper),
            leverage_confirm: Some(leverage_confirm),
            delta_confirm: Some(delta_confirm),
        }
    }

    /// Create empty circuit for setup
    pub fn empty() -> Self {
        Self {
            leverage: None,
            delta_max: None,
            delta_min: None,
            leverage_upper: None,
            delta_upper: None,
            leverage_confirm: None,
            delta_confirm: None,
        }
    }

    /// Embed integer inputs into the field
    pub fn from_inputs(inputs: &RiskNeutralInputs) -> Self {
        Self::new(
            field_from_i64(inputs.leverage),
            field_from_i64(inputs.delta_max),
            field_from_i64(inputs.delta_min),
            field_from_i64(inputs.leverage_upper),
            field_from_i64(inputs.delta_upper),
            field_from_i64(inputs.leverage_confirm),
            field_from_i64(inputs.delta_confirm),
        )
    }
}

impl<F: PrimeField> ComplianceCircuit<F> for RiskNeutralCircuit<F> {
    const NAME: &'static str = "risk_neutral";

    fn public_inputs(&self) -> Option<Vec<F>> {
        Some(vec![
            self.leverage_upper?,
            self.delta_upper?,
            self.leverage_confirm?,
            self.delta_confirm?,
        ])
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for RiskNeutralCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let delta_check = BoundedComparator::with_bits(DEFAULT_DELTA_BOUND_BITS);

        // ======== Allocate Private Inputs ========

        let leverage = FpVar::new_witness(cs.clone(), || {
            self.leverage.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_max = FpVar::new_witness(cs.clone(), || {
            self.delta_max.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_min = FpVar::new_witness(cs.clone(), || {
            self.delta_min.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs ========

        let leverage_upper = FpVar::new_input(cs.clone(), || {
            self.leverage_upper.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_upper = FpVar::new_input(cs.clone(), || {
            self.delta_upper.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let leverage_confirm = FpVar::new_input(cs.clone(), || {
            self.leverage_confirm.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_confirm = FpVar::new_input(cs, || {
            self.delta_confirm.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let zero = FpVar::zero();
        let hundred = FpVar::constant(F::from(PERCENT_SCALE as u64));

        // ======== Constraint 1: Delta Ordering ========
        // Bounded, so the spread products below cannot wrap the modulus

        delta_check.assert_less_or_equal(&zero, &delta_min)?;
        delta_check.assert_less_or_equal(&delta_min, &delta_max)?;

        // ======== Constraint 2: Public Bounds ========

        assert_non_negative(&delta_upper)?;
        delta_upper.enforce_not_greater(&hundred)?;
        assert_non_negative(&leverage_upper)?;
        leverage_upper.enforce_not_greater(&hundred)?;
        assert_non_negative(&leverage)?;

        // ======== Constraint 3: Leverage Confirmation ========

        leverage
            .compare(&leverage_upper)?
            .enforce_equal(&leverage_confirm)?;

        // ======== Constraint 4: Delta Spread Confirmation ========
        // (max - min) / max vs upper / 100  ->  100 * (max - min) vs upper * max

        let spread_pct = (&delta_max - &delta_min) * &hundred;
        let tolerance = &delta_upper * &delta_max;
        spread_pct.compare(&tolerance)?.enforce_equal(&delta_confirm)?;

        Ok(())
    }
}

/// Integer view of a risk-neutral statement, as read from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskNeutralInputs {
    pub leverage: i64,
    pub delta_max: i64,
    pub delta_min: i64,
    pub leverage_upper: i64,
    pub delta_upper: i64,
    pub leverage_confirm: i64,
    pub delta_confirm: i64,
}

impl RiskNeutralInputs {
    /// Build inputs with the confirmations the position actually yields
    pub fn new(
        leverage: i64,
        delta_max: i64,
        delta_min: i64,
        leverage_upper: i64,
        delta_upper: i64,
    ) -> Self {
        let mut inputs = Self {
            leverage,
            delta_max,
            delta_min,
            leverage_upper,
            delta_upper,
            leverage_confirm: 0,
            delta_confirm: 0,
        };
        let (leverage_confirm, delta_confirm) = inputs.expected_confirmations();
        inputs.leverage_confirm = leverage_confirm;
        inputs.delta_confirm = delta_confirm;
        inputs
    }

    /// `(sign(leverage - leverage_upper), sign(100 * spread - upper * max))`
    pub fn expected_confirmations(&self) -> (i64, i64) {
        let leverage_confirm = sign(self.leverage as i128, self.leverage_upper as i128);
        let spread_pct = (self.delta_max as i128 - self.delta_min as i128) * PERCENT_SCALE as i128;
        let tolerance = self.delta_upper as i128 * self.delta_max as i128;
        (leverage_confirm, sign(spread_pct, tolerance))
    }

    /// Public inputs in circuit order
    pub fn public_inputs<F: PrimeField>(&self) -> Vec<F> {
        vec![
            field_from_i64(self.leverage_upper),
            field_from_i64(self.delta_upper),
            field_from_i64(self.leverage_confirm),
            field_from_i64(self.delta_confirm),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    fn is_satisfied(inputs: &RiskNeutralInputs) -> bool {
        let circuit = RiskNeutralCircuit::<Fr>::from_inputs(inputs);
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    fn scenario_a() -> RiskNeutralInputs {
        RiskNeutralInputs {
            leverage: 1,
            delta_max: 100,
            delta_min: 99,
            leverage_upper: 3,
            delta_upper: 5,
            leverage_confirm: -1,
            delta_confirm: -1,
        }
    }

    #[test]
    fn test_within_bounds() {
        assert!(is_satisfied(&scenario_a()));
    }

    #[test]
    fn test_confirmations_computed() {
        assert_eq!(RiskNeutralInputs::new(1, 100, 99, 3, 5), scenario_a());
    }

    #[test]
    fn test_breach_is_provable_when_disclosed() {
        // leverage 4 over bound 3, spread 50% over 5%: both signs published
        let inputs = RiskNeutralInputs::new(4, 100, 50, 3, 5);
        assert_eq!((inputs.leverage_confirm, inputs.delta_confirm), (1, 1));
        assert!(is_satisfied(&inputs));
    }

    #[test]
    fn test_exact_bounds() {
        // leverage == upper, 100 * (100 - 95) == 5 * 100
        let inputs = RiskNeutralInputs::new(3, 100, 95, 3, 5);
        assert_eq!((inputs.leverage_confirm, inputs.delta_confirm), (0, 0));
        assert!(is_satisfied(&inputs));
    }

    #[test]
    fn test_zero_width_delta_range() {
        let inputs = RiskNeutralInputs::new(2, 50, 50, 3, 5);
        assert_eq!(inputs.delta_confirm, -1);
        assert!(is_satisfied(&inputs));
    }

    #[test]
    fn test_wrong_leverage_confirm() {
        let inputs = RiskNeutralInputs {
            leverage_confirm: 1,
            ..scenario_a()
        };
        assert!(!is_satisfied(&inputs));
    }

    #[test]
    fn test_wrong_delta_confirm() {
        let inputs = RiskNeutralInputs {
            delta_confirm: 0,
            ..scenario_a()
        };
        assert!(!is_satisfied(&inputs));
    }

    #[test]
    fn test_inverted_delta_range() {
        let mut inputs = RiskNeutralInputs::new(1, 99, 100, 3, 5);
        inputs.delta_confirm = -1;
        assert!(!is_satisfied(&inputs));
    }

    #[test]
    fn test_negative_delta_min() {
        let inputs = RiskNeutralInputs::new(1, 100, -1, 3, 5);
        assert!(!is_satisfied(&inputs));
    }

    #[test]
    fn test_negative_leverage() {
        let inputs = RiskNeutralInputs::new(-1, 100, 99, 3, 5);
        assert_eq!(inputs.leverage_confirm, -1);
        assert!(!is_satisfied(&inputs));
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(!is_satisfied(&RiskNeutralInputs::new(1, 100, 99, 3, 101)));
        assert!(!is_satisfied(&RiskNeutralInputs::new(1, 100, 99, 101, 5)));
        assert!(is_satisfied(&RiskNeutralInputs::new(1, 100, 99, 100, 100)));
    }

    #[test]
    fn test_negative_public_bounds() {
        assert!(!is_satisfied(&RiskNeutralInputs::new(1, 100, 99, 3, -5)));
        assert!(!is_satisfied(&RiskNeutralInputs::new(1, 100, 99, -3, 5)));
    }

    #[test]
    fn test_wrapping_spread_rejected() {
        use ark_ff::{BigInteger, One};

        // delta_max = ceil(p / 100): 100 * delta_max wraps to a tiny value,
        // so an unbounded spread of 100% would read as within 5%
        let mut limbs = Fr::MODULUS;
        let mut rem: u128 = 0;
        for limb in limbs.0.iter_mut().rev() {
            let cur = (rem << 64) | *limb as u128;
            *limb = (cur / 100) as u64;
            rem = cur % 100;
        }
        assert!(limbs.num_bits() > 240);
        let delta_max = Fr::from_bigint(limbs).unwrap() + Fr::one();

        let circuit = RiskNeutralCircuit::new(
            Fr::from(1u64),
            delta_max,
            Fr::from(0u64),
            Fr::from(3u64),
            Fr::from(5u64),
            -Fr::one(),
            -Fr::one(),
        );
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_largest_delta_range() {
        let inputs = RiskNeutralInputs::new(1, i64::MAX, 0, 3, 100);
        assert_eq!(inputs.delta_confirm, 0);
        assert!(is_satisfied(&inputs));
    }

    #[test]
    fn test_public_input_order() {
        let inputs = scenario_a();
        let circuit = RiskNeutralCircuit::<Fr>::from_inputs(&inputs);
        assert_eq!(circuit.public_inputs(), Some(inputs.public_inputs::<Fr>()));
        assert_eq!(
            inputs.public_inputs::<Fr>(),
            vec![Fr::from(3u64), Fr::from(5u64), -Fr::from(1u64), -Fr::from(1u64)]
        );
        assert_eq!(RiskNeutralCircuit::<Fr>::empty().public_inputs(), None);
    }

    #[test]
    fn test_constraint_count() {
        let circuit = RiskNeutralCircuit::<Fr>::from_inputs(&scenario_a());
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();

        println!("\n=== Risk-Neutral Circuit R1CS Statistics ===");
        println!("Constraints: {}", cs.num_constraints());
        println!("Witness variables: {}", cs.num_witness_variables());
        println!("Public inputs: {}", cs.num_instance_variables() - 1);
        assert_eq!(cs.num_instance_variables(), 5);
    }
}
