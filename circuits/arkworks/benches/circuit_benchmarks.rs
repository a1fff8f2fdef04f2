//! Benchmarks for the compliance circuits
//!
//! Run with: cargo bench

use ark_bn254::{Bn254, Fr};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use criterion::{criterion_group, criterion_main, Criterion};
use zk_risk_circuits::{
    backend, FundingRateCircuit, FundingRateInputs, FundingRatePolicy, RiskNeutralCircuit,
    RiskNeutralInputs,
};

fn funding_inputs() -> FundingRateInputs {
    FundingRateInputs {
        leverage: 2,
        delta_spot: 100,
        delta_perp_long: 50,
        delta_perp_short: -140,
        leverage_upper: 3,
        delta_upper: 10,
        project_id: 10005,
    }
}

fn bench_constraint_satisfaction(c: &mut Criterion) {
    let risk = RiskNeutralCircuit::<Fr>::from_inputs(&RiskNeutralInputs::new(1, 100, 99, 3, 5));
    let funding = FundingRateCircuit::<Fr>::from_inputs(&funding_inputs(), FundingRatePolicy::default());

    c.bench_function("RiskNeutral satisfaction", |b| {
        b.iter(|| {
            let cs = ConstraintSystem::<Fr>::new_ref();
            risk.clone().generate_constraints(cs.clone()).unwrap();
            assert!(cs.is_satisfied().unwrap());
        });
    });

    c.bench_function("FundingRate satisfaction", |b| {
        b.iter(|| {
            let cs = ConstraintSystem::<Fr>::new_ref();
            funding.clone().generate_constraints(cs.clone()).unwrap();
            assert!(cs.is_satisfied().unwrap());
        });
    });
}

fn bench_groth16(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let compiled = backend::compile(FundingRateCircuit::<Fr>::empty()).unwrap();
    let keys =
        backend::setup::<Bn254, _, _>(&compiled, FundingRateCircuit::empty(), &mut rng).unwrap();
    let circuit = FundingRateCircuit::<Fr>::from_inputs(&funding_inputs(), FundingRatePolicy::default());
    let witness = backend::assign_witness(&compiled, circuit).unwrap();
    let proof = backend::prove(&compiled, &keys.proving_key, &witness, &mut rng).unwrap();
    let verifier = backend::Verifier::new(&keys.verifying_key).unwrap();
    let public = witness.public();

    let mut group = c.benchmark_group("FundingRate Groth16");
    group.sample_size(10);
    group.bench_function("prove", |b| {
        b.iter(|| backend::prove(&compiled, &keys.proving_key, &witness, &mut rng).unwrap());
    });
    group.bench_function("verify", |b| {
        b.iter(|| verifier.verify(&public, &proof).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_constraint_satisfaction, bench_groth16);
criterion_main!(benches);
