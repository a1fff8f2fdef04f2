//! Groth16 Proof Lifecycle
//!
//! compile → setup → assign witness → prove → verify, each step a plain
//! function over the circuit types of this crate.
//!
//! # Flow
//! ```text
//! circuit (empty) ──compile──► CompiledCircuit ──setup──► KeyPair
//! circuit (values) ──assign_witness──► Witness ──prove──► Proof
//! Proof + VerifyingKey + PublicWitness ──verify──► Ok | VerificationRejected
//! ```
//!
//! The compiled constraint matrices are kept around so a witness can be
//! checked row by row before proving. A non-compliant position therefore
//! surfaces as `ConstraintViolation` naming the first failing row, instead
//! of an opaque prover error or a proof that silently fails to verify.

use std::time::Instant;

use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintMatrices, ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, Matrix,
    OptimizationGoal, SynthesisError, SynthesisMode,
};
use ark_serialize::{
    CanonicalDeserialize, CanonicalSerialize, Compress, Read, SerializationError, Valid, Validate,
    Write,
};
use ark_snark::SNARK;
use ark_std::{
    rand::{CryptoRng, RngCore},
    UniformRand,
};

use crate::error::{CircuitError, CircuitResult};
use crate::field::to_decimal_string;

/// A statement this crate knows how to prove
pub trait ComplianceCircuit<F: PrimeField>: ConstraintSynthesizer<F> + Clone {
    /// Stable identifier, used for artifact directories and messages
    const NAME: &'static str;

    /// Public inputs in allocation order, `None` for an empty circuit
    fn public_inputs(&self) -> Option<Vec<F>>;
}

/// Constraint system produced by `compile`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCircuit<F: PrimeField> {
    pub circuit: String,
    pub matrices: ConstraintMatrices<F>,
}

impl<F: PrimeField> CompiledCircuit<F> {
    pub fn num_constraints(&self) -> usize {
        self.matrices.num_constraints
    }

    /// Public inputs, excluding the constant-one variable
    pub fn num_public_inputs(&self) -> usize {
        self.matrices.num_instance_variables - 1
    }

    pub fn num_witness_variables(&self) -> usize {
        self.matrices.num_witness_variables
    }

    /// Index of the first row with `<a, z> * <b, z> != <c, z>`
    pub fn first_unsatisfied(&self, assignment: &[F]) -> Option<usize> {
        let eval = |row: &[(F, usize)]| -> F {
            row.iter()
                .map(|(coeff, index)| *coeff * assignment[*index])
                .sum()
        };

        let m = &self.matrices;
        (0..m.num_constraints).find(|&i| eval(&m.a[i]) * eval(&m.b[i]) != eval(&m.c[i]))
    }
}

/// Groth16 key pair for one compiled circuit
#[derive(Clone)]
pub struct KeyPair<E: Pairing> {
    pub proving_key: ProvingKey<E>,
    pub verifying_key: VerifyingKey<E>,
}

/// Public part of a witness, in circuit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicWitness<F: PrimeField>(pub Vec<F>);

impl<F: PrimeField> PublicWitness<F> {
    pub fn as_slice(&self) -> &[F] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values as canonical decimal strings
    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.0.iter().map(to_decimal_string).collect()
    }
}

/// Full assignment for one proof instance
#[derive(Debug, Clone)]
pub struct Witness<F: PrimeField> {
    pub circuit: String,
    /// Instance assignment, leading constant one included
    pub instance: Vec<F>,
    pub witness: Vec<F>,
}

impl<F: PrimeField> Witness<F> {
    pub fn public(&self) -> PublicWitness<F> {
        PublicWitness(self.instance[1..].to_vec())
    }

    /// `instance || witness`, the vector the constraint matrices index into
    pub fn full_assignment(&self) -> Vec<F> {
        let mut z = self.instance.clone();
        z.extend_from_slice(&self.witness);
        z
    }
}

fn new_constraint_system<F: PrimeField>(mode: SynthesisMode) -> ConstraintSystemRef<F> {
    let cs = ConstraintSystem::<F>::new_ref();
    // Same goal Groth16 uses internally, so row layouts agree
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(mode);
    cs
}

/// Synthesize the constraint structure of `circuit`
///
/// Values in `circuit` are ignored; pass the empty circuit.
pub fn compile<F, C>(circuit: C) -> CircuitResult<CompiledCircuit<F>>
where
    F: PrimeField,
    C: ComplianceCircuit<F>,
{
    let start = Instant::now();
    let compile_error = |reason: String| CircuitError::Compile {
        circuit: C::NAME.to_string(),
        reason,
    };

    let cs = new_constraint_system::<F>(SynthesisMode::Setup);
    circuit
        .generate_constraints(cs.clone())
        .map_err(|e| compile_error(e.to_string()))?;
    cs.finalize();

    let matrices = cs
        .to_matrices()
        .ok_or_else(|| compile_error("constraint matrices were not constructed".to_string()))?;

    tracing::info!(
        "Compiled {} circuit: {} constraints, {} public inputs in {}ms",
        C::NAME,
        matrices.num_constraints,
        matrices.num_instance_variables - 1,
        start.elapsed().as_millis()
    );

    Ok(CompiledCircuit {
        circuit: C::NAME.to_string(),
        matrices,
    })
}

/// Run the per-circuit trusted setup
///
/// Randomized: run once per compiled circuit and distribute the verifying
/// key to every verifier.
pub fn setup<E, C, R>(
    compiled: &CompiledCircuit<E::ScalarField>,
    circuit: C,
    rng: &mut R,
) -> CircuitResult<KeyPair<E>>
where
    E: Pairing,
    C: ComplianceCircuit<E::ScalarField>,
    R: RngCore + CryptoRng,
{
    let start = Instant::now();
    let setup_error = |reason: String| CircuitError::Setup {
        circuit: C::NAME.to_string(),
        reason,
    };

    if compiled.circuit != C::NAME {
        return Err(setup_error(format!(
            "constraint system was compiled for {}",
            compiled.circuit
        )));
    }

    // Structural parameters (e.g. a funding-rate policy) must match too
    if compile(circuit.clone())?.matrices != compiled.matrices {
        return Err(setup_error(
            "circuit does not match the compiled constraint system".to_string(),
        ));
    }

    let (proving_key, verifying_key) = Groth16::<E>::circuit_specific_setup(circuit, rng)
        .map_err(|e| setup_error(e.to_string()))?;

    // One query point per instance variable, constant one included
    if verifying_key.gamma_abc_g1.len() != compiled.matrices.num_instance_variables {
        return Err(setup_error(
            "generated keys do not match the compiled constraint system".to_string(),
        ));
    }

    tracing::info!(
        "{} keys generated in {}ms",
        C::NAME,
        start.elapsed().as_millis()
    );

    Ok(KeyPair {
        proving_key,
        verifying_key,
    })
}

/// Embed concrete values into the compiled constraint structure
pub fn assign_witness<F, C>(
    compiled: &CompiledCircuit<F>,
    circuit: C,
) -> CircuitResult<Witness<F>>
where
    F: PrimeField,
    C: ComplianceCircuit<F>,
{
    let assignment_error = |reason: String| CircuitError::Assignment {
        circuit: C::NAME.to_string(),
        reason,
    };

    if compiled.circuit != C::NAME {
        return Err(assignment_error(format!(
            "constraint system was compiled for {}",
            compiled.circuit
        )));
    }

    let expected_public = circuit
        .public_inputs()
        .ok_or_else(|| assignment_error("public input values are missing".to_string()))?;

    let cs = new_constraint_system::<F>(SynthesisMode::Prove {
        construct_matrices: true,
    });
    circuit
        .generate_constraints(cs.clone())
        .map_err(|e| match e {
            SynthesisError::AssignmentMissing => {
                assignment_error("private input values are missing".to_string())
            }
            other => assignment_error(other.to_string()),
        })?;
    cs.finalize();

    // Same shape is not enough: policy constants live in the coefficients
    let matrices = cs
        .to_matrices()
        .ok_or_else(|| assignment_error("constraint matrices were not constructed".to_string()))?;
    if matrices != compiled.matrices {
        return Err(assignment_error(
            "values were synthesized against a different constraint system".to_string(),
        ));
    }

    let cs = cs
        .borrow()
        .ok_or_else(|| assignment_error("constraint system is not available".to_string()))?;

    let witness = Witness {
        circuit: C::NAME.to_string(),
        instance: cs.instance_assignment.clone(),
        witness: cs.witness_assignment.clone(),
    };

    if witness.instance[1..] != expected_public[..] {
        return Err(assignment_error(
            "public inputs were not allocated in declaration order".to_string(),
        ));
    }

    tracing::debug!(
        "{} witness assigned: {} instance, {} witness values",
        C::NAME,
        witness.instance.len(),
        witness.witness.len()
    );

    Ok(witness)
}

/// Produce a Groth16 proof for a satisfying witness
pub fn prove<E, R>(
    compiled: &CompiledCircuit<E::ScalarField>,
    proving_key: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    rng: &mut R,
) -> CircuitResult<Proof<E>>
where
    E: Pairing,
    R: RngCore + CryptoRng,
{
    let start = Instant::now();
    let matrices = &compiled.matrices;

    if witness.circuit != compiled.circuit
        || witness.instance.len() != matrices.num_instance_variables
        || witness.witness.len() != matrices.num_witness_variables
    {
        return Err(CircuitError::Assignment {
            circuit: compiled.circuit.clone(),
            reason: format!("witness was assigned for {}", witness.circuit),
        });
    }

    let full_assignment = witness.full_assignment();
    if let Some(constraint) = compiled.first_unsatisfied(&full_assignment) {
        tracing::warn!(
            "{} witness violates constraint #{}",
            compiled.circuit,
            constraint
        );
        return Err(CircuitError::ConstraintViolation {
            circuit: compiled.circuit.clone(),
            constraint,
        });
    }

    let r = E::ScalarField::rand(rng);
    let s = E::ScalarField::rand(rng);
    let proof = Groth16::<E>::create_proof_with_reduction_and_matrices(
        proving_key,
        r,
        s,
        matrices,
        matrices.num_instance_variables,
        matrices.num_constraints,
        &full_assignment,
    )
    .map_err(|e| CircuitError::Prove(e.to_string()))?;

    tracing::info!(
        "{} proof generated in {}ms",
        compiled.circuit,
        start.elapsed().as_millis()
    );

    Ok(proof)
}

/// Verifier with a preprocessed verifying key
///
/// Read-only after construction; share it across threads to verify many
/// proofs against the same key.
#[derive(Clone)]
pub struct Verifier<E: Pairing> {
    prepared: PreparedVerifyingKey<E>,
    num_public_inputs: usize,
}

impl<E: Pairing> Verifier<E> {
    pub fn new(verifying_key: &VerifyingKey<E>) -> CircuitResult<Self> {
        let num_public_inputs = verifying_key
            .gamma_abc_g1
            .len()
            .checked_sub(1)
            .ok_or_else(|| CircuitError::Verification("verifying key has no query points".into()))?;
        let prepared = Groth16::<E>::process_vk(verifying_key)
            .map_err(|e| CircuitError::Verification(e.to_string()))?;
        Ok(Self {
            prepared,
            num_public_inputs,
        })
    }

    pub fn num_public_inputs(&self) -> usize {
        self.num_public_inputs
    }

    /// Accept or reject `proof` for `public`
    pub fn verify(
        &self,
        public: &PublicWitness<E::ScalarField>,
        proof: &Proof<E>,
    ) -> CircuitResult<()> {
        if public.len() != self.num_public_inputs {
            return Err(CircuitError::PublicInputMismatch {
                expected: self.num_public_inputs,
                actual: public.len(),
            });
        }

        let accepted =
            Groth16::<E>::verify_with_processed_vk(&self.prepared, public.as_slice(), proof)
                .map_err(|e| CircuitError::Verification(e.to_string()))?;
        if !accepted {
            tracing::warn!("Proof rejected");
            return Err(CircuitError::VerificationRejected);
        }
        Ok(())
    }
}

/// Verify a proof against a verifying key and public inputs
pub fn verify<E: Pairing>(
    verifying_key: &VerifyingKey<E>,
    public: &PublicWitness<E::ScalarField>,
    proof: &Proof<E>,
) -> CircuitResult<()> {
    Verifier::new(verifying_key)?.verify(public, proof)
}

// ======== Raw Encoding of Compiled Circuits ========
//
// name || num_instance || num_witness || num_constraints || a || b || c
// where each matrix is a row count followed by (len, (coeff, index)*) rows.

fn serialize_matrix<F: PrimeField, W: Write>(
    matrix: &Matrix<F>,
    mut writer: W,
    compress: Compress,
) -> Result<(), SerializationError> {
    (matrix.len() as u64).serialize_with_mode(&mut writer, compress)?;
    for row in matrix {
        (row.len() as u64).serialize_with_mode(&mut writer, compress)?;
        for (coeff, index) in row {
            coeff.serialize_with_mode(&mut writer, compress)?;
            (*index as u64).serialize_with_mode(&mut writer, compress)?;
        }
    }
    Ok(())
}

fn matrix_size<F: PrimeField>(matrix: &Matrix<F>, compress: Compress) -> usize {
    let entry = F::zero().serialized_size(compress) + 8;
    8 + matrix.iter().map(|row| 8 + row.len() * entry).sum::<usize>()
}

fn deserialize_matrix<F: PrimeField, R: Read>(
    mut reader: R,
    compress: Compress,
    validate: Validate,
) -> Result<Matrix<F>, SerializationError> {
    let rows = u64::deserialize_with_mode(&mut reader, compress, validate)? as usize;
    let mut matrix = Vec::with_capacity(rows.min(1 << 20));
    for _ in 0..rows {
        let len = u64::deserialize_with_mode(&mut reader, compress, validate)? as usize;
        let mut row = Vec::with_capacity(len.min(1 << 16));
        for _ in 0..len {
            let coeff = F::deserialize_with_mode(&mut reader, compress, validate)?;
            let index = u64::deserialize_with_mode(&mut reader, compress, validate)? as usize;
            row.push((coeff, index));
        }
        matrix.push(row);
    }
    Ok(matrix)
}

impl<F: PrimeField> CanonicalSerialize for CompiledCircuit<F> {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        let m = &self.matrices;
        self.circuit
            .as_bytes()
            .to_vec()
            .serialize_with_mode(&mut writer, compress)?;
        (m.num_instance_variables as u64).serialize_with_mode(&mut writer, compress)?;
        (m.num_witness_variables as u64).serialize_with_mode(&mut writer, compress)?;
        (m.num_constraints as u64).serialize_with_mode(&mut writer, compress)?;
        serialize_matrix(&m.a, &mut writer, compress)?;
        serialize_matrix(&m.b, &mut writer, compress)?;
        serialize_matrix(&m.c, &mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        let m = &self.matrices;
        8 + self.circuit.len()
            + 3 * 8
            + matrix_size(&m.a, compress)
            + matrix_size(&m.b, compress)
            + matrix_size(&m.c, compress)
    }
}

impl<F: PrimeField> Valid for CompiledCircuit<F> {
    fn check(&self) -> Result<(), SerializationError> {
        let m = &self.matrices;
        let num_variables = m.num_instance_variables + m.num_witness_variables;
        let well_formed = m.num_instance_variables >= 1
            && [&m.a, &m.b, &m.c].iter().all(|matrix| {
                matrix.len() == m.num_constraints
                    && matrix
                        .iter()
                        .flatten()
                        .all(|(_, index)| *index < num_variables)
            });
        if well_formed {
            Ok(())
        } else {
            Err(SerializationError::InvalidData)
        }
    }
}

impl<F: PrimeField> CanonicalDeserialize for CompiledCircuit<F> {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let name = Vec::<u8>::deserialize_with_mode(&mut reader, compress, validate)?;
        let circuit = String::from_utf8(name).map_err(|_| SerializationError::InvalidData)?;
        let num_instance_variables =
            u64::deserialize_with_mode(&mut reader, compress, validate)? as usize;
        let num_witness_variables =
            u64::deserialize_with_mode(&mut reader, compress, validate)? as usize;
        let num_constraints = u64::deserialize_with_mode(&mut reader, compress, validate)? as usize;
        let a = deserialize_matrix(&mut reader, compress, validate)?;
        let b = deserialize_matrix(&mut reader, compress, validate)?;
        let c = deserialize_matrix(&mut reader, compress, validate)?;

        let non_zero = |matrix: &Matrix<F>| matrix.iter().map(Vec::len).sum();
        let compiled = Self {
            circuit,
            matrices: ConstraintMatrices {
                num_instance_variables,
                num_witness_variables,
                num_constraints,
                a_num_non_zero: non_zero(&a),
                b_num_non_zero: non_zero(&b),
                c_num_non_zero: non_zero(&c),
                a,
                b,
                c,
            },
        };

        if let Validate::Yes = validate {
            compiled.check()?;
        }
        Ok(compiled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk_neutral::{RiskNeutralCircuit, RiskNeutralInputs};
    use ark_bn254::{Bn254, Fr};
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_compile_counts() {
        let compiled = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        assert_eq!(compiled.circuit, "risk_neutral");
        assert_eq!(compiled.num_public_inputs(), 4);
        assert!(compiled.num_constraints() > 0);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let first = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        let second = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_unsatisfied() {
        let compiled = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();

        let good = RiskNeutralInputs::new(1, 100, 99, 3, 5);
        let witness = assign_witness(&compiled, RiskNeutralCircuit::from_inputs(&good)).unwrap();
        assert_eq!(compiled.first_unsatisfied(&witness.full_assignment()), None);

        let lying = RiskNeutralInputs {
            leverage_confirm: 1,
            ..good
        };
        let witness = assign_witness(&compiled, RiskNeutralCircuit::from_inputs(&lying)).unwrap();
        assert!(compiled.first_unsatisfied(&witness.full_assignment()).is_some());
    }

    #[test]
    fn test_assign_without_values() {
        let compiled = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        let err = assign_witness(&compiled, RiskNeutralCircuit::<Fr>::empty()).unwrap_err();
        assert!(matches!(err, CircuitError::Assignment { .. }));
    }

    #[test]
    fn test_public_witness_decimal() {
        let inputs = RiskNeutralInputs::new(1, 100, 99, 3, 5);
        let public = PublicWitness(inputs.public_inputs::<Fr>());
        let strings = public.to_decimal_strings();
        assert_eq!(strings[0], "3");
        assert_eq!(strings[1], "5");
        assert_eq!(
            strings[2],
            "21888242871839275222246405745257275088548364400416034343698204186575808495616"
        );
    }

    #[test]
    fn test_compiled_circuit_round_trip() {
        let compiled = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        let mut bytes = Vec::new();
        compiled.serialize_uncompressed(&mut bytes).unwrap();
        assert_eq!(bytes.len(), compiled.uncompressed_size());

        let restored = CompiledCircuit::<Fr>::deserialize_uncompressed(&bytes[..]).unwrap();
        assert_eq!(restored, compiled);
    }

    #[test]
    fn test_truncated_compiled_circuit() {
        let compiled = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        let mut bytes = Vec::new();
        compiled.serialize_uncompressed(&mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(CompiledCircuit::<Fr>::deserialize_uncompressed(&bytes[..]).is_err());
    }

    #[test]
    fn test_verifier_rejects_wrong_arity() {
        let mut rng = StdRng::seed_from_u64(7);
        let compiled = compile(RiskNeutralCircuit::<Fr>::empty()).unwrap();
        let keys = setup::<Bn254, _, _>(&compiled, RiskNeutralCircuit::empty(), &mut rng).unwrap();

        let inputs = RiskNeutralInputs::new(1, 100, 99, 3, 5);
        let witness = assign_witness(&compiled, RiskNeutralCircuit::from_inputs(&inputs)).unwrap();
        let proof = prove(&compiled, &keys.proving_key, &witness, &mut rng).unwrap();

        let verifier = Verifier::new(&keys.verifying_key).unwrap();
        assert_eq!(verifier.num_public_inputs(), 4);
        verifier.verify(&witness.public(), &proof).unwrap();

        let short = PublicWitness(witness.public().0[..3].to_vec());
        assert!(matches!(
            verifier.verify(&short, &proof),
            Err(CircuitError::PublicInputMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }
}
