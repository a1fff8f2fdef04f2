//! Subcommand handlers
//!
//! Every handler is generic over a [`Statement`], so both circuits share
//! one implementation of the lifecycle:
//!
//! ```text
//! compile → setup → assign witness → prove → persist → reload → verify
//! ```

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ark_groth16::{Proof, ProvingKey, VerifyingKey};
use ark_serialize::CanonicalSerialize;
use clap::{Args, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zk_risk_circuits::artifact::{self, ArtifactDir};
use zk_risk_circuits::backend::{self, CompiledCircuit, PublicWitness};
use zk_risk_circuits::export::{
    PublicWitnessDocument, VerifyingKeyDocument, PUBLIC_WITNESS_JSON, VK_JSON,
};
use zk_risk_circuits::validation::{validate_funding_rate, validate_risk_neutral};
use zk_risk_circuits::{
    Bn254, ComplianceCircuit, Fr, FundingRateCircuit, FundingRateInputs, RiskNeutralCircuit,
    RiskNeutralInputs, ValidationError,
};

use crate::config::Config;

/// Which circuit a command operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CircuitKind {
    RiskNeutral,
    FundingRate,
}

#[derive(Args, Debug)]
pub struct CircuitArgs {
    /// Circuit to operate on.
    #[arg(long, value_enum)]
    pub circuit: CircuitKind,
}

#[derive(Args, Debug)]
pub struct InputArgs {
    #[command(flatten)]
    pub circuit: CircuitArgs,

    /// JSON file with the statement's inputs.
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub circuit: CircuitArgs,

    /// Public witness JSON; defaults to the one `prove` wrote.
    #[arg(long)]
    pub public: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProveArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Skip native validation and let the circuit reject bad inputs.
    #[arg(long)]
    pub skip_validation: bool,
}

/// Glue between a circuit and its JSON inputs
pub trait Statement {
    type Circuit: ComplianceCircuit<Fr>;
    type Inputs: Serialize + DeserializeOwned + Debug;

    fn empty(config: &Config) -> Self::Circuit;
    fn validate(inputs: &Self::Inputs, config: &Config) -> Result<(), ValidationError>;
    fn circuit(inputs: &Self::Inputs, config: &Config) -> Self::Circuit;
    fn public_inputs(inputs: &Self::Inputs) -> Vec<Fr>;
    fn demo_inputs(config: &Config) -> Self::Inputs;
}

pub struct RiskNeutral;

impl Statement for RiskNeutral {
    type Circuit = RiskNeutralCircuit<Fr>;
    type Inputs = RiskNeutralInputs;

    fn empty(_config: &Config) -> Self::Circuit {
        RiskNeutralCircuit::empty()
    }

    fn validate(inputs: &Self::Inputs, _config: &Config) -> Result<(), ValidationError> {
        validate_risk_neutral(inputs)
    }

    fn circuit(inputs: &Self::Inputs, _config: &Config) -> Self::Circuit {
        RiskNeutralCircuit::from_inputs(inputs)
    }

    fn public_inputs(inputs: &Self::Inputs) -> Vec<Fr> {
        inputs.public_inputs()
    }

    fn demo_inputs(_config: &Config) -> Self::Inputs {
        RiskNeutralInputs::new(1, 100, 99, 3, 5)
    }
}

pub struct FundingRate;

impl Statement for FundingRate {
    type Circuit = FundingRateCircuit<Fr>;
    type Inputs = FundingRateInputs;

    fn empty(config: &Config) -> Self::Circuit {
        FundingRateCircuit::empty().with_policy(config.funding_policy())
    }

    fn validate(inputs: &Self::Inputs, config: &Config) -> Result<(), ValidationError> {
        validate_funding_rate(inputs, &config.funding_policy())
    }

    fn circuit(inputs: &Self::Inputs, config: &Config) -> Self::Circuit {
        FundingRateCircuit::from_inputs(inputs, config.funding_policy())
    }

    fn public_inputs(inputs: &Self::Inputs) -> Vec<Fr> {
        inputs.public_inputs()
    }

    fn demo_inputs(config: &Config) -> Self::Inputs {
        FundingRateInputs {
            leverage: 1,
            delta_spot: 0,
            delta_perp_long: 0,
            delta_perp_short: 0,
            leverage_upper: 3,
            delta_upper: 5,
            project_id: config.project_id,
        }
    }
}

fn circuit_name<S: Statement>() -> &'static str {
    <S::Circuit as ComplianceCircuit<Fr>>::NAME
}

fn artifact_dir<S: Statement>(config: &Config) -> ArtifactDir {
    ArtifactDir::new(&config.artifact_dir, circuit_name::<S>())
}

/// Seeded when configured, otherwise from OS entropy
pub fn rng(config: &Config) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn read_inputs<S: Statement>(path: &Path) -> Result<S::Inputs> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inputs from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid {} inputs in {}", circuit_name::<S>(), path.display()))
}

/// Compile the circuit and persist the constraint system
pub fn compile<S: Statement>(config: &Config) -> Result<CompiledCircuit<Fr>> {
    let compiled = backend::compile(S::empty(config))?;
    let path = artifact_dir::<S>(config).save(&compiled)?;
    println!(
        "{}: {} constraints, {} public inputs -> {}",
        circuit_name::<S>(),
        compiled.num_constraints(),
        compiled.num_public_inputs(),
        path.display()
    );
    Ok(compiled)
}

/// Generate and persist the key pair (plus the JSON verifying key)
pub fn setup<S: Statement>(config: &Config, rng: &mut StdRng) -> Result<()> {
    let dir = artifact_dir::<S>(config);
    let compiled: CompiledCircuit<Fr> = dir
        .load()
        .context("Constraint system not found; run `compile` first")?;

    let keys = backend::setup::<Bn254, _, _>(&compiled, S::empty(config), rng)?;
    dir.save(&keys.proving_key)?;
    let vk_path = dir.save(&keys.verifying_key)?;
    dir.save_json(VK_JSON, &VerifyingKeyDocument::from(&keys.verifying_key))?;

    println!("{}: keys written, verifying key at {}", circuit_name::<S>(), vk_path.display());
    Ok(())
}

/// Validate, assign, prove and persist the proof with its public witness
pub fn prove<S: Statement>(
    config: &Config,
    inputs: &S::Inputs,
    skip_validation: bool,
    rng: &mut StdRng,
) -> Result<Proof<Bn254>> {
    if skip_validation {
        tracing::warn!("Skipping native validation of {} inputs", circuit_name::<S>());
    } else {
        S::validate(inputs, config)
            .with_context(|| format!("{} inputs are not compliant", circuit_name::<S>()))?;
    }

    let dir = artifact_dir::<S>(config);
    let compiled: CompiledCircuit<Fr> = dir
        .load()
        .context("Constraint system not found; run `compile` first")?;
    let proving_key: ProvingKey<Bn254> = dir
        .load()
        .context("Proving key not found; run `setup` first")?;

    let witness = backend::assign_witness(&compiled, S::circuit(inputs, config))?;
    let proof = backend::prove(&compiled, &proving_key, &witness, rng)?;

    dir.save(&proof)?;
    dir.save_json(
        PUBLIC_WITNESS_JSON,
        &PublicWitnessDocument::new(circuit_name::<S>(), &witness.public()),
    )?;

    let mut bytes = Vec::new();
    proof
        .serialize_compressed(&mut bytes)
        .context("Failed to encode proof")?;
    println!("{}: proof 0x{}", circuit_name::<S>(), hex::encode(bytes));
    Ok(proof)
}

/// Load a public witness document and check it belongs to this circuit
pub fn read_public_witness<S: Statement>(path: &Path) -> Result<PublicWitness<Fr>> {
    let document: PublicWitnessDocument = artifact::load_json(path)?;
    if document.circuit != circuit_name::<S>() {
        bail!(
            "{} holds a {} public witness, expected {}",
            path.display(),
            document.circuit,
            circuit_name::<S>()
        );
    }
    document
        .to_public_witness()
        .with_context(|| format!("{} holds a value that is not a field element", path.display()))
}

/// Verify the stored proof against public inputs only
pub fn verify<S: Statement>(config: &Config, public: Option<&Path>) -> Result<()> {
    let dir = artifact_dir::<S>(config);
    let verifying_key: VerifyingKey<Bn254> = dir
        .load()
        .context("Verifying key not found; run `setup` first")?;
    let proof: Proof<Bn254> = dir.load().context("Proof not found; run `prove` first")?;

    let public_path = match public {
        Some(path) => path.to_path_buf(),
        None => dir.path().join(PUBLIC_WITNESS_JSON),
    };
    let public = read_public_witness::<S>(&public_path)?;
    backend::verify(&verifying_key, &public, &proof)
        .with_context(|| format!("{} proof did not verify", circuit_name::<S>()))?;

    println!("{}: proof verified", circuit_name::<S>());
    Ok(())
}

/// The whole lifecycle for one set of inputs
pub fn run<S: Statement>(config: &Config, inputs: &S::Inputs, rng: &mut StdRng) -> Result<()> {
    tracing::info!("Running {} lifecycle for {:?}", circuit_name::<S>(), inputs);

    let compiled = compile::<S>(config)?;
    setup::<S>(config, rng)?;
    let proof = prove::<S>(config, inputs, false, rng)?;

    // Reloaded artifacts must behave exactly like the in-memory ones
    let dir = artifact_dir::<S>(config);
    let reloaded: CompiledCircuit<Fr> = dir.load()?;
    let reloaded_proof: Proof<Bn254> = dir.load()?;
    if reloaded != compiled || reloaded_proof != proof {
        bail!("{} artifacts changed on reload", circuit_name::<S>());
    }
    let public = read_public_witness::<S>(&dir.path().join(PUBLIC_WITNESS_JSON))?;
    if public != PublicWitness(S::public_inputs(inputs)) {
        bail!("{} public witness does not match the inputs", circuit_name::<S>());
    }

    verify::<S>(config, None)
}

/// Run the lifecycle on both built-in scenarios
pub fn demo(config: &Config, rng: &mut StdRng) -> Result<()> {
    run::<RiskNeutral>(config, &RiskNeutral::demo_inputs(config), rng)?;
    run::<FundingRate>(config, &FundingRate::demo_inputs(config), rng)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &Path) -> Config {
        Config {
            artifact_dir: root.to_path_buf(),
            seed: Some(11),
            ..Config::default()
        }
    }

    #[test]
    fn test_demo_writes_all_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let mut rng = rng(&config);

        demo(&config, &mut rng).unwrap();

        for circuit in ["risk_neutral", "funding_rate"] {
            for file in [
                "circuit.ccs",
                "proving.key",
                "verifying.key",
                "proof.data",
                VK_JSON,
                PUBLIC_WITNESS_JSON,
            ] {
                assert!(tmp.path().join(circuit).join(file).is_file(), "{}/{}", circuit, file);
            }
        }
    }

    #[test]
    fn test_non_compliant_inputs_rejected_before_proving() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let mut rng = rng(&config);

        compile::<FundingRate>(&config).unwrap();
        setup::<FundingRate>(&config, &mut rng).unwrap();

        let inputs = FundingRateInputs {
            project_id: 1,
            ..FundingRate::demo_inputs(&config)
        };
        let err = prove::<FundingRate>(&config, &inputs, false, &mut rng).unwrap_err();
        assert!(err.to_string().contains("not compliant"));

        // Without validation the circuit itself refuses
        assert!(prove::<FundingRate>(&config, &inputs, true, &mut rng).is_err());
        assert!(!artifact_dir::<FundingRate>(&config).contains(zk_risk_circuits::ArtifactKind::Proof));
    }

    #[test]
    fn test_verify_from_public_witness_only() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let mut rng = rng(&config);

        let inputs = RiskNeutral::demo_inputs(&config);
        run::<RiskNeutral>(&config, &inputs, &mut rng).unwrap();

        // Only the public values, no leverage or deltas
        let path = tmp.path().join("public.json");
        fs::write(
            &path,
            serde_json::to_string(&PublicWitnessDocument::new(
                "risk_neutral",
                &PublicWitness(inputs.public_inputs()),
            ))
            .unwrap(),
        )
        .unwrap();
        verify::<RiskNeutral>(&config, Some(&path)).unwrap();
        verify::<RiskNeutral>(&config, None).unwrap();

        let tampered = RiskNeutralInputs {
            delta_confirm: 1,
            ..inputs
        };
        fs::write(
            &path,
            serde_json::to_string(&PublicWitnessDocument::new(
                "risk_neutral",
                &PublicWitness(tampered.public_inputs()),
            ))
            .unwrap(),
        )
        .unwrap();
        assert!(verify::<RiskNeutral>(&config, Some(&path)).is_err());
    }

    #[test]
    fn test_public_witness_for_other_circuit() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("public.json");
        fs::write(&path, r#"{"circuit":"funding_rate","public_inputs":["3","5","10005"]}"#)
            .unwrap();

        let err = read_public_witness::<RiskNeutral>(&path).unwrap_err();
        assert!(err.to_string().contains("expected risk_neutral"));
        assert_eq!(read_public_witness::<FundingRate>(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_demo_project_id_beyond_i64() {
        let config = Config {
            project_id: u64::MAX,
            ..Config::default()
        };
        let inputs = FundingRate::demo_inputs(&config);
        assert_eq!(inputs.project_id, u64::MAX);
        assert!(FundingRate::validate(&inputs, &config).is_ok());
    }

    #[test]
    fn test_prove_without_setup() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let mut rng = rng(&config);

        let inputs = RiskNeutral::demo_inputs(&config);
        let err = prove::<RiskNeutral>(&config, &inputs, false, &mut rng).unwrap_err();
        assert!(err.to_string().contains("compile"));
    }

    #[test]
    fn test_read_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("inputs.json");
        fs::write(
            &path,
            r#"{"leverage":1,"delta_max":100,"delta_min":99,"leverage_upper":3,
                "delta_upper":5,"leverage_confirm":-1,"delta_confirm":-1}"#,
        )
        .unwrap();
        let inputs = read_inputs::<RiskNeutral>(&path).unwrap();
        assert_eq!(inputs, RiskNeutralInputs::new(1, 100, 99, 3, 5));

        fs::write(&path, "{}").unwrap();
        assert!(read_inputs::<RiskNeutral>(&path).is_err());
    }
}
