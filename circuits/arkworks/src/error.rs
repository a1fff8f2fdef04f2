//! Error types for the risk compliance circuits
//!
//! `CircuitError` covers the proof lifecycle (compile, setup, witness
//! assignment, proving, verification, artifact I/O). `ValidationError`
//! reports which business rule a position breaks, checked natively before
//! any constraint system is built.

use thiserror::Error;

use crate::artifact::ArtifactError;

/// Error types for circuit operations
#[derive(Debug, Error)]
pub enum CircuitError {
    /// The circuit graph could not be synthesized
    #[error("failed to compile {circuit} circuit: {reason}")]
    Compile { circuit: String, reason: String },

    /// Key generation failed or produced keys of the wrong shape
    #[error("key generation failed for {circuit} circuit: {reason}")]
    Setup { circuit: String, reason: String },

    /// Concrete values could not be embedded into the constraint structure
    #[error("witness assignment failed for {circuit} circuit: {reason}")]
    Assignment { circuit: String, reason: String },

    /// The witness does not satisfy the circuit (non-compliant position)
    #[error("{circuit} constraint #{constraint} is not satisfied")]
    ConstraintViolation { circuit: String, constraint: usize },

    /// Proof generation failed
    #[error("proof generation failed: {0}")]
    Prove(String),

    /// A well-formed proof did not verify against the public inputs
    #[error("proof rejected by verifying key")]
    VerificationRejected,

    /// The public witness does not match the verifying key
    #[error("verifying key expects {expected} public inputs, got {actual}")]
    PublicInputMismatch { expected: usize, actual: usize },

    /// The verifier itself failed (malformed key material)
    #[error("verification failed: {0}")]
    Verification(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for circuit operations
pub type CircuitResult<T> = Result<T, CircuitError>;

/// Business rule violations found by native validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: i64 },

    #[error("delta range inverted: min {min} > max {max}")]
    DeltaRangeInverted { min: i64, max: i64 },

    #[error("{field} must be a percentage in [0, 100], got {value}")]
    PercentageOutOfRange { field: &'static str, value: i64 },

    #[error("{field} claims {actual}, position yields {expected}")]
    ConfirmationMismatch {
        field: &'static str,
        expected: i64,
        actual: i64,
    },

    #[error("proof is bound to project {expected}, got {actual}")]
    ProjectMismatch { expected: u64, actual: u64 },

    #[error("{field} = {value} violates its sign convention ({rule})")]
    SignConvention {
        field: &'static str,
        value: i64,
        rule: &'static str,
    },

    #[error("{field} magnitude {magnitude} exceeds the {bits}-bit delta bound")]
    DeltaOutOfBound {
        field: &'static str,
        magnitude: i128,
        bits: usize,
    },

    #[error("leverage {leverage} is outside [1, {max}]")]
    LeverageOutOfRange { leverage: i64, max: i64 },

    #[error("leverage {leverage} exceeds upper bound {upper}")]
    LeverageExceeded { leverage: i64, upper: i64 },

    #[error("net perpetual exposure {net} is net-long")]
    NetLongPerpExposure { net: i128 },

    #[error("net exposure {exposure_pct} exceeds tolerance {tolerance} (both scaled by 100)")]
    NetExposureExceeded { exposure_pct: i128, tolerance: i128 },
}

/// Input validation utilities
///
/// Each function mirrors the constraints of one circuit over plain
/// integers. A position accepted here satisfies the circuit; a rejected
/// one would fail at proving time with a less descriptive
/// `ConstraintViolation`.
pub mod validation {
    use super::*;
    use crate::funding_rate::{FundingRateInputs, FundingRatePolicy};
    use crate::risk_neutral::RiskNeutralInputs;

    /// Percentages are scaled to [0, 100]
    pub const PERCENT_SCALE: i64 = 100;

    /// The percent comparator checks `leverage - 1` in `bitlen(100)` bits
    pub const MAX_FUNDING_LEVERAGE: i64 = 1 << 7;

    /// sign(a - b) in {-1, 0, 1}
    pub fn sign(a: i128, b: i128) -> i64 {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }
    }

    /// Validate a value is non-negative
    pub fn validate_non_negative(value: i64, field: &'static str) -> Result<(), ValidationError> {
        if value < 0 {
            return Err(ValidationError::NegativeValue { field, value });
        }
        Ok(())
    }

    /// Validate a percentage lies in [0, 100]
    pub fn validate_percentage(value: i64, field: &'static str) -> Result<(), ValidationError> {
        if !(0..=PERCENT_SCALE).contains(&value) {
            return Err(ValidationError::PercentageOutOfRange { field, value });
        }
        Ok(())
    }

    /// Validate a magnitude fits the bounded comparator's bit width
    pub fn validate_delta_bound(
        magnitude: i128,
        bits: usize,
        field: &'static str,
    ) -> Result<(), ValidationError> {
        let fits = magnitude >= 0 && (bits >= 127 || magnitude < (1i128 << bits));
        if !fits {
            return Err(ValidationError::DeltaOutOfBound {
                field,
                magnitude,
                bits,
            });
        }
        Ok(())
    }

    /// Validate a leverage-bound position
    pub fn validate_risk_neutral(inputs: &RiskNeutralInputs) -> Result<(), ValidationError> {
        validate_non_negative(inputs.delta_min, "delta_min")?;
        if inputs.delta_min > inputs.delta_max {
            return Err(ValidationError::DeltaRangeInverted {
                min: inputs.delta_min,
                max: inputs.delta_max,
            });
        }

        validate_percentage(inputs.delta_upper, "delta_upper")?;
        validate_percentage(inputs.leverage_upper, "leverage_upper")?;
        validate_non_negative(inputs.leverage, "leverage")?;

        let (leverage_confirm, delta_confirm) = inputs.expected_confirmations();
        if inputs.leverage_confirm != leverage_confirm {
            return Err(ValidationError::ConfirmationMismatch {
                field: "leverage_confirm",
                expected: leverage_confirm,
                actual: inputs.leverage_confirm,
            });
        }
        if inputs.delta_confirm != delta_confirm {
            return Err(ValidationError::ConfirmationMismatch {
                field: "delta_confirm",
                expected: delta_confirm,
                actual: inputs.delta_confirm,
            });
        }

        Ok(())
    }

    /// Validate a funding-rate-neutral position against a policy
    pub fn validate_funding_rate(
        inputs: &FundingRateInputs,
        policy: &FundingRatePolicy,
    ) -> Result<(), ValidationError> {
        if inputs.project_id != policy.project_id {
            return Err(ValidationError::ProjectMismatch {
                expected: policy.project_id,
                actual: inputs.project_id,
            });
        }

        let bits = policy.delta_bound_bits;
        if inputs.delta_spot < 0 {
            return Err(ValidationError::SignConvention {
                field: "delta_spot",
                value: inputs.delta_spot,
                rule: "spot leg must be non-negative",
            });
        }
        validate_delta_bound(inputs.delta_spot as i128, bits, "delta_spot")?;

        if inputs.delta_perp_long < 0 {
            return Err(ValidationError::SignConvention {
                field: "delta_perp_long",
                value: inputs.delta_perp_long,
                rule: "long leg must be non-negative",
            });
        }
        validate_delta_bound(inputs.delta_perp_long as i128, bits, "delta_perp_long")?;

        if inputs.delta_perp_short > 0 {
            return Err(ValidationError::SignConvention {
                field: "delta_perp_short",
                value: inputs.delta_perp_short,
                rule: "short leg must be non-positive",
            });
        }
        validate_delta_bound(-(inputs.delta_perp_short as i128), bits, "delta_perp_short")?;

        validate_percentage(inputs.delta_upper, "delta_upper")?;
        validate_percentage(inputs.leverage_upper, "leverage_upper")?;

        if !(1..=MAX_FUNDING_LEVERAGE).contains(&inputs.leverage) {
            return Err(ValidationError::LeverageOutOfRange {
                leverage: inputs.leverage,
                max: MAX_FUNDING_LEVERAGE,
            });
        }
        if inputs.leverage > inputs.leverage_upper {
            return Err(ValidationError::LeverageExceeded {
                leverage: inputs.leverage,
                upper: inputs.leverage_upper,
            });
        }

        let net = inputs.net_perp_exposure();
        if net > 0 {
            return Err(ValidationError::NetLongPerpExposure { net });
        }
        validate_delta_bound(-net, bits, "net_perp_exposure")?;

        let (exposure_pct, tolerance) = inputs.exposure_and_tolerance();
        if exposure_pct > tolerance {
            return Err(ValidationError::NetExposureExceeded {
                exposure_pct,
                tolerance,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;
    use crate::funding_rate::{FundingRateInputs, FundingRatePolicy};
    use crate::risk_neutral::RiskNeutralInputs;

    #[test]
    fn test_sign() {
        assert_eq!(sign(1, 3), -1);
        assert_eq!(sign(3, 3), 0);
        assert_eq!(sign(4, 3), 1);
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(0, "delta_upper").is_ok());
        assert!(validate_percentage(100, "delta_upper").is_ok());
        assert!(validate_percentage(101, "delta_upper").is_err());
        assert!(validate_percentage(-1, "delta_upper").is_err());
    }

    #[test]
    fn test_validate_delta_bound() {
        assert!(validate_delta_bound(i64::MAX as i128, 63, "delta_spot").is_ok());
        assert!(validate_delta_bound(1i128 << 63, 63, "delta_spot").is_err());
        assert!(validate_delta_bound(-1, 63, "delta_spot").is_err());
        assert!(validate_delta_bound(1i128 << 100, 128, "delta_spot").is_ok());
    }

    #[test]
    fn test_validate_risk_neutral() {
        // Scenario A
        let inputs = RiskNeutralInputs {
            leverage: 1,
            delta_max: 100,
            delta_min: 99,
            leverage_upper: 3,
            delta_upper: 5,
            leverage_confirm: -1,
            delta_confirm: -1,
        };
        assert!(validate_risk_neutral(&inputs).is_ok());

        let inverted = RiskNeutralInputs {
            delta_min: 101,
            ..inputs.clone()
        };
        assert_eq!(
            validate_risk_neutral(&inverted),
            Err(ValidationError::DeltaRangeInverted { min: 101, max: 100 })
        );

        let wrong_confirm = RiskNeutralInputs {
            leverage_confirm: 1,
            ..inputs
        };
        let err = validate_risk_neutral(&wrong_confirm).unwrap_err();
        assert!(err.to_string().contains("leverage_confirm"));
    }

    #[test]
    fn test_validate_funding_rate() {
        let policy = FundingRatePolicy::default();

        // Scenario B
        let inputs = FundingRateInputs {
            leverage: 1,
            delta_spot: 0,
            delta_perp_long: 0,
            delta_perp_short: 0,
            leverage_upper: 3,
            delta_upper: 5,
            project_id: 10005,
        };
        assert!(validate_funding_rate(&inputs, &policy).is_ok());

        // Scenario C
        let wrong_project = FundingRateInputs {
            project_id: 1,
            ..inputs.clone()
        };
        assert_eq!(
            validate_funding_rate(&wrong_project, &policy),
            Err(ValidationError::ProjectMismatch {
                expected: 10005,
                actual: 1
            })
        );

        let positive_short = FundingRateInputs {
            delta_perp_short: 5,
            ..inputs.clone()
        };
        assert!(matches!(
            validate_funding_rate(&positive_short, &policy),
            Err(ValidationError::SignConvention { .. })
        ));

        let zero_leverage = FundingRateInputs {
            leverage: 0,
            ..inputs
        };
        assert!(matches!(
            validate_funding_rate(&zero_leverage, &policy),
            Err(ValidationError::LeverageOutOfRange { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = CircuitError::ConstraintViolation {
            circuit: "risk_neutral".to_string(),
            constraint: 17,
        };
        assert_eq!(err.to_string(), "risk_neutral constraint #17 is not satisfied");

        let err: CircuitError = ValidationError::NetLongPerpExposure { net: 5 }.into();
        assert!(err.to_string().contains("net-long"));
    }
}
