//! zk-risk CLI Entry Point
//!
//! Proves leverage and delta-neutrality compliance with Groth16 and
//! verifies the resulting proofs.
//!
//! ```text
//! zk-risk compile --circuit risk-neutral
//! zk-risk setup   --circuit risk-neutral
//! zk-risk prove   --circuit risk-neutral --input position.json
//! zk-risk verify  --circuit risk-neutral [--public public_witness.json]
//! zk-risk run     --circuit funding-rate --input book.json
//! zk-risk demo
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zk_risk::commands::{self, CircuitArgs, InputArgs, ProveArgs, VerifyArgs};
use zk_risk::{CircuitKind, Config, FundingRate, RiskNeutral};

/// Zero-knowledge risk compliance proofs.
#[derive(Parser, Debug)]
#[command(name = "zk-risk", version, about)]
struct Cli {
    /// Artifact root directory [env: ZK_RISK_ARTIFACT_DIR]
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    /// Deterministic RNG seed [env: ZK_RISK_SEED]
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Funding-rate project id [env: ZK_RISK_PROJECT_ID]
    #[arg(long, global = true)]
    project_id: Option<u64>,

    /// Funding-rate delta comparator width in bits [env: ZK_RISK_DELTA_BOUND_BITS]
    #[arg(long, global = true)]
    delta_bound_bits: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compile a circuit into a constraint system.
    Compile(CircuitArgs),
    /// Generate the proving and verifying keys.
    Setup(CircuitArgs),
    /// Prove a statement from a JSON input file.
    Prove(ProveArgs),
    /// Verify the stored proof against a public witness.
    Verify(VerifyArgs),
    /// Compile, set up, prove, reload and verify in one go.
    Run(InputArgs),
    /// Run the built-in scenarios for both circuits.
    Demo,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.artifacts {
            config.artifact_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(project_id) = self.project_id {
            config.project_id = project_id;
        }
        if let Some(bits) = self.delta_bound_bits {
            config.delta_bound_bits = bits;
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // RUST_LOG=debug 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zk_risk=info,zk_risk_circuits=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    cli.apply_overrides(&mut config);
    tracing::debug!("Configuration: {:?}", config);

    let mut rng = commands::rng(&config);

    match cli.command {
        Commands::Compile(args) => match args.circuit {
            CircuitKind::RiskNeutral => commands::compile::<RiskNeutral>(&config).map(|_| ()),
            CircuitKind::FundingRate => commands::compile::<FundingRate>(&config).map(|_| ()),
        },
        Commands::Setup(args) => match args.circuit {
            CircuitKind::RiskNeutral => commands::setup::<RiskNeutral>(&config, &mut rng),
            CircuitKind::FundingRate => commands::setup::<FundingRate>(&config, &mut rng),
        },
        Commands::Prove(args) => {
            let skip = args.skip_validation;
            let input = &args.inputs.input;
            match args.inputs.circuit.circuit {
                CircuitKind::RiskNeutral => {
                    let inputs = commands::read_inputs::<RiskNeutral>(input)?;
                    commands::prove::<RiskNeutral>(&config, &inputs, skip, &mut rng).map(|_| ())
                }
                CircuitKind::FundingRate => {
                    let inputs = commands::read_inputs::<FundingRate>(input)?;
                    commands::prove::<FundingRate>(&config, &inputs, skip, &mut rng).map(|_| ())
                }
            }
        }
        Commands::Verify(args) => {
            let public = args.public.as_deref();
            match args.circuit.circuit {
                CircuitKind::RiskNeutral => commands::verify::<RiskNeutral>(&config, public),
                CircuitKind::FundingRate => commands::verify::<FundingRate>(&config, public),
            }
        }
        Commands::Run(args) => match args.circuit.circuit {
            CircuitKind::RiskNeutral => {
                let inputs = commands::read_inputs::<RiskNeutral>(&args.input)?;
                commands::run::<RiskNeutral>(&config, &inputs, &mut rng)
            }
            CircuitKind::FundingRate => {
                let inputs = commands::read_inputs::<FundingRate>(&args.input)?;
                commands::run::<FundingRate>(&config, &inputs, &mut rng)
            }
        },
        Commands::Demo => commands::demo(&config, &mut rng),
    }
}
