//! ZK Risk Compliance Circuits
//!
//! Leverage and delta-neutrality rules for a leveraged trading position,
//! expressed as R1CS constraints and proven with Groth16 over BN254.
//!
//! # Available Circuits
//!
//! | Circuit | Purpose | Public inputs |
//! |---------|---------|---------------|
//! | RiskNeutralCircuit | publish sign(leverage - bound) and the delta spread sign | 4 |
//! | FundingRateCircuit | prove a spot + perp book is net-neutral under a policy | 3 |
//!
//! # Comparisons
//! A prime field has no ordering, so every inequality goes through a gadget:
//! - `BoundedComparator`: x <= y for operands within a declared bit bound
//! - `CompareGadget::compare`: sign(a - b) for small business constants
//!
//! # Example
//! ```ignore
//! use zk_risk_circuits::{backend, RiskNeutralCircuit, RiskNeutralInputs};
//! use ark_bn254::{Bn254, Fr};
//!
//! let compiled = backend::compile(RiskNeutralCircuit::<Fr>::empty())?;
//! let keys = backend::setup::<Bn254, _, _>(&compiled, RiskNeutralCircuit::empty(), &mut rng)?;
//!
//! let inputs = RiskNeutralInputs::new(1, 100, 99, 3, 5);
//! let witness = backend::assign_witness(&compiled, RiskNeutralCircuit::from_inputs(&inputs))?;
//! let proof = backend::prove(&compiled, &keys.proving_key, &witness, &mut rng)?;
//! backend::verify(&keys.verifying_key, &witness.public(), &proof)?;
//! ```

pub mod artifact;
pub mod backend;
pub mod error;
pub mod export;
pub mod field;
pub mod funding_rate;
pub mod gadgets;
pub mod risk_neutral;


// Circuit exports
pub use funding_rate::{FundingRateCircuit, FundingRateInputs, FundingRatePolicy};
pub use risk_neutral::{RiskNeutralCircuit, RiskNeutralInputs};

// Lifecycle
pub use artifact::{Artifact, ArtifactDir, ArtifactError, ArtifactKind};
pub use backend::{ComplianceCircuit, CompiledCircuit, KeyPair, PublicWitness, Verifier, Witness};

// Error handling
pub use error::validation;
pub use error::{CircuitError, CircuitResult, ValidationError};

// Gadget exports
pub use gadgets::{BoundedComparator, CompareGadget};

// Concrete curve used by the CLI and artifacts
pub use ark_bn254::{Bn254, Fr};
