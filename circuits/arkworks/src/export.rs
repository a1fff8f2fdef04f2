//! Human-readable exports
//!
//! JSON views of a BN254 verifying key and of a public witness, with every
//! field element as a decimal string. The verifying key view is display
//! only; the public witness is what a verifier reads instead of the
//! prover's inputs.

use std::str::FromStr;

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_groth16::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::backend::PublicWitness;
use crate::field::to_decimal_string;

/// File name of the exported verifying key
pub const VK_JSON: &str = "vk.json";

/// File name of the exported public witness
pub const PUBLIC_WITNESS_JSON: &str = "public_witness.json";

/// `[x, y]`
pub type G1Json = [String; 2];

/// `[[x.c0, x.c1], [y.c0, y.c1]]`
pub type G2Json = [[String; 2]; 2];

fn fq(value: &Fq) -> String {
    to_decimal_string(value)
}

fn fq2(value: &Fq2) -> [String; 2] {
    [fq(&value.c0), fq(&value.c1)]
}

fn g1(point: &G1Affine) -> G1Json {
    [fq(&point.x), fq(&point.y)]
}

fn g2(point: &G2Affine) -> G2Json {
    [fq2(&point.x), fq2(&point.y)]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKeyDocument {
    pub protocol: String,
    pub curve: String,
    pub num_public_inputs: usize,
    pub alpha_g1: G1Json,
    pub beta_g2: G2Json,
    pub gamma_g2: G2Json,
    pub delta_g2: G2Json,
    pub gamma_abc_g1: Vec<G1Json>,
}

impl From<&VerifyingKey<Bn254>> for VerifyingKeyDocument {
    fn from(vk: &VerifyingKey<Bn254>) -> Self {
        Self {
            protocol: "groth16".to_string(),
            curve: "bn254".to_string(),
            num_public_inputs: vk.gamma_abc_g1.len().saturating_sub(1),
            alpha_g1: g1(&vk.alpha_g1),
            beta_g2: g2(&vk.beta_g2),
            gamma_g2: g2(&vk.gamma_g2),
            delta_g2: g2(&vk.delta_g2),
            gamma_abc_g1: vk.gamma_abc_g1.iter().map(g1).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicWitnessDocument {
    pub circuit: String,
    pub public_inputs: Vec<String>,
}

impl PublicWitnessDocument {
    pub fn new(circuit: &str, public: &PublicWitness<Fr>) -> Self {
        Self {
            circuit: circuit.to_string(),
            public_inputs: public.to_decimal_strings(),
        }
    }

    /// Parse the decimal strings back; `None` if one is not a field element
    pub fn to_public_witness(&self) -> Option<PublicWitness<Fr>> {
        self.public_inputs
            .iter()
            .map(|value| Fr::from_str(value).ok())
            .collect::<Option<Vec<_>>>()
            .map(PublicWitness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{compile, setup};
    use crate::funding_rate::FundingRateCircuit;
    use ark_ec::AffineRepr;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_vk_document_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let compiled = compile(FundingRateCircuit::<Fr>::empty()).unwrap();
        let keys = setup::<Bn254, _, _>(&compiled, FundingRateCircuit::empty(), &mut rng).unwrap();

        let doc = VerifyingKeyDocument::from(&keys.verifying_key);
        assert_eq!(doc.curve, "bn254");
        assert_eq!(doc.num_public_inputs, 3);
        assert_eq!(doc.gamma_abc_g1.len(), 4);
        assert!(doc.alpha_g1.iter().all(|s| s.chars().all(|c| c.is_ascii_digit())));

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"gamma_abc_g1\""));
    }

    #[test]
    fn test_generator_coordinates() {
        // BN254 G1 generator is (1, 2)
        assert_eq!(g1(&G1Affine::generator()), ["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_public_witness_document() {
        let public = PublicWitness(vec![Fr::from(3u64), Fr::from(5u64), Fr::from(10005u64)]);
        let doc = PublicWitnessDocument::new("funding_rate", &public);
        assert_eq!(doc.public_inputs, vec!["3", "5", "10005"]);
        assert_eq!(doc.to_public_witness(), Some(public));
    }

    #[test]
    fn test_public_witness_negative_values() {
        let public = PublicWitness(vec![Fr::from(3u64), -Fr::from(1u64)]);
        let doc = PublicWitnessDocument::new("risk_neutral", &public);
        assert_eq!(doc.to_public_witness(), Some(public));

        let bad = PublicWitnessDocument {
            circuit: "risk_neutral".to_string(),
            public_inputs: vec!["3".to_string(), "-x".to_string()],
        };
        assert_eq!(bad.to_public_witness(), None);
    }
}
