//! Funding-Rate-Neutrality Circuit - arkworks R1CS Implementation
//!
//! Proves a spot + perpetual book is close to delta-neutral, bound to a
//! registered policy instance through a public project id.
//!
//! # Circuit Constraints
//! 1. Policy binding: project_id == policy.project_id
//! 2. Sign conventions (bounded): spot >= 0, perp_long >= 0, perp_short <= 0
//! 3. Bounds: delta_upper, leverage_upper in [0, 100], leverage >= 1
//! 4. Leverage: leverage <= leverage_upper (asserted, not published)
//! 5. Netting (bounded): net = long + short <= 0
//! 6. max = max(spot, -net) via a shared test `-net <= spot`
//! 7. Neutrality: 100 * |net + spot| <= delta_upper * max
//!
//! Unlike the risk-neutral circuit nothing about the position is
//! disclosed: a non-compliant book simply has no proof.
//!
//! # Public Input Order
//! `[leverage_upper, delta_upper, project_id]`

use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use serde::{Deserialize, Serialize};

use crate::backend::ComplianceCircuit;
use crate::error::validation::PERCENT_SCALE;
use crate::field::field_from_i64;
use crate::gadgets::{abs_with_sign, select, BoundedComparator, CompareGadget};

/// Project id the default policy is registered under
pub const DEFAULT_PROJECT_ID: u64 = 10005;

/// Bits of the delta comparator: magnitudes up to `i64::MAX`
pub const DEFAULT_DELTA_BOUND_BITS: usize = 63;

/// Policy instance a funding-rate proof is bound to
///
/// Both values are baked into the constraint system, so keys generated
/// under one policy never verify proofs built under another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRatePolicy {
    pub project_id: u64,
    pub delta_bound_bits: usize,
}

impl Default for FundingRatePolicy {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID,
            delta_bound_bits: DEFAULT_DELTA_BOUND_BITS,
        }
    }
}

impl FundingRatePolicy {
    /// Comparator for delta legs and net exposure
    pub fn delta_comparator(&self) -> BoundedComparator {
        BoundedComparator::with_bits(self.delta_bound_bits)
    }
}

/// Funding-Rate-Neutrality Circuit for arkworks
#[derive(Clone, Debug)]
pub struct FundingRateCircuit<F: PrimeField> {
    /// Private: actual leverage ratio
    pub leverage: Option<F>,
    /// Private: spot delta (non-negative)
    pub delta_spot: Option<F>,
    /// Private: long perpetual delta (non-negative)
    pub delta_perp_long: Option<F>,
    /// Private: short perpetual delta (non-positive)
    pub delta_perp_short: Option<F>,
    /// Public: leverage bound (percentage scale)
    pub leverage_upper: Option<F>,
    /// Public: tolerated net exposure (percentage)
    pub delta_upper: Option<F>,
    /// Public: policy instance identifier
    pub project_id: Option<F>,
    /// Structural parameters, not a circuit input
    pub policy: FundingRatePolicy,
}

impl<F: PrimeField> FundingRateCircuit<F> {
    /// Create a new circuit under the default policy
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        leverage: F,
        delta_spot: F,
        delta_perp_long: F,
        delta_perp_short: F,
        leverage_upper: F,
        delta_upper: F,
        project_id: F,
    ) -> Self {
        Self {
            leverage: Some(leverage),
            delta_spot: Some(delta_spot),
            delta_perp_long: Some(delta_perp_long),
            delta_perp_short: Some(delta_perp_short),
            leverage_upper: Some(leverage_upper),
            delta_upper: Some(delta_upper),
            project_id: Some(project_id),
            policy: FundingRatePolicy::default(),
        }
    }

    /// Create empty circuit for setup
    pub fn empty() -> Self {
        Self {
            leverage: None,
            delta_spot: None,
            delta_perp_long: None,
            delta_perp_short: None,
            leverage_upper: None,
            delta_upper: None,
            project_id: None,
            policy: FundingRatePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FundingRatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Embed integer inputs into the field
    pub fn from_inputs(inputs: &FundingRateInputs, policy: FundingRatePolicy) -> Self {
        Self::new(
            field_from_i64(inputs.leverage),
            field_from_i64(inputs.delta_spot),
            field_from_i64(inputs.delta_perp_long),
            field_from_i64(inputs.delta_perp_short),
            field_from_i64(inputs.leverage_upper),
            field_from_i64(inputs.delta_upper),
            F::from(inputs.project_id),
        )
        .with_policy(policy)
    }
}

impl<F: PrimeField> ComplianceCircuit<F> for FundingRateCircuit<F> {
    const NAME: &'static str = "funding_rate";

    fn public_inputs(&self) -> Option<Vec<F>> {
        Some(vec![self.leverage_upper?, self.delta_upper?, self.project_id?])
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for FundingRateCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let delta_check = self.policy.delta_comparator();
        if !delta_check.is_sound_for::<F>() {
            return Err(SynthesisError::Unsatisfiable);
        }
        let percent_check = BoundedComparator::for_max(PERCENT_SCALE as u64);

        // ======== Allocate Private Inputs ========

        let leverage = FpVar::new_witness(cs.clone(), || {
            self.leverage.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_spot = FpVar::new_witness(cs.clone(), || {
            self.delta_spot.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_perp_long = FpVar::new_witness(cs.clone(), || {
            self.delta_perp_long.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_perp_short = FpVar::new_witness(cs.clone(), || {
            self.delta_perp_short.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ======== Allocate Public Inputs ========

        let leverage_upper = FpVar::new_input(cs.clone(), || {
            self.leverage_upper.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let delta_upper = FpVar::new_input(cs.clone(), || {
            self.delta_upper.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let project_id = FpVar::new_input(cs, || {
            self.project_id.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let zero = FpVar::zero();
        let one = FpVar::one();
        let hundred = FpVar::constant(F::from(PERCENT_SCALE as u64));

        // ======== Constraint 1: Policy Binding ========

        project_id.enforce_equal(&FpVar::constant(F::from(self.policy.project_id)))?;

        // ======== Constraint 2: Leg Sign Conventions ========

        delta_check.assert_less_or_equal(&zero, &delta_spot)?;
        delta_check.assert_less_or_equal(&zero, &delta_perp_long)?;
        delta_check.assert_less_or_equal(&delta_perp_short, &zero)?;

        // ======== Constraint 3: Public Bounds ========

        delta_upper.enforce_not_greater(&hundred)?;
        percent_check.assert_less_or_equal(&zero, &delta_upper)?;
        leverage_upper.enforce_not_greater(&hundred)?;
        percent_check.assert_less_or_equal(&zero, &leverage_upper)?;
        percent_check.assert_less_or_equal(&one, &leverage)?;

        // ======== Constraint 4: Leverage Bound ========

        leverage.enforce_not_greater(&leverage_upper)?;

        // ======== Constraint 5: Perpetual Netting ========

        let net = &delta_perp_long + &delta_perp_short;
        delta_check.assert_less_or_equal(&net, &zero)?;

        // ======== Constraint 6: Larger Exposure ========
        // spot_covers <=> -net <= spot, shared with the abs below

        let short_exposure = net.negate()?;
        let spot_covers = delta_spot.is_less_than(&short_exposure)?.not();
        let max_exposure = select(&spot_covers, &delta_spot, &short_exposure)?;

        // ======== Constraint 7: Book-Wide Neutrality ========
        // |net + spot| / max <= upper / 100  ->  100 * |total| <= upper * max

        let total = &net + &delta_spot;
        let abs_total = abs_with_sign(&total, &spot_covers)?;
        let exposure_pct = abs_total * &hundred;
        let tolerance = &delta_upper * &max_exposure;
        exposure_pct.enforce_not_greater(&tolerance)?;

        Ok(())
    }
}

/// Integer view of a funding-rate statement, as read from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRateInputs {
    pub leverage: i64,
    pub delta_spot: i64,
    pub delta_perp_long: i64,
    pub delta_perp_short: i64,
    pub leverage_upper: i64,
    pub delta_upper: i64,
    pub project_id: u64,
}

impl FundingRateInputs {
    /// `perp_long + perp_short`
    pub fn net_perp_exposure(&self) -> i128 {
        self.delta_perp_long as i128 + self.delta_perp_short as i128
    }

    /// `(100 * |net + spot|, delta_upper * max(spot, -net))`
    pub fn exposure_and_tolerance(&self) -> (i128, i128) {
        let net = self.net_perp_exposure();
        let spot = self.delta_spot as i128;
        let max_exposure = spot.max(-net);
        let exposure_pct = (net + spot).abs() * PERCENT_SCALE as i128;
        (exposure_pct, self.delta_upper as i128 * max_exposure)
    }

    /// Public inputs in circuit order
    pub fn public_inputs<F: PrimeField>(&self) -> Vec<F> {
        vec![
            field_from_i64(self.leverage_upper),
            field_from_i64(self.delta_upper),
            F::from(self.project_id),
        ]
    }
}
