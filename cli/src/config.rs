//! Configuration Module
//!
//! Settings come from the environment (a `.env` file is loaded first by
//! `main`); command-line flags override individual values.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use zk_risk_circuits::funding_rate::{DEFAULT_DELTA_BOUND_BITS, DEFAULT_PROJECT_ID};
use zk_risk_circuits::FundingRatePolicy;

/// CLI settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the per-circuit artifact directories
    pub artifact_dir: PathBuf,

    /// Project id funding-rate proofs are bound to
    pub project_id: u64,

    /// Bit width of the funding-rate delta comparator
    pub delta_bound_bits: usize,

    /// Seed for setup and proving randomness; entropy when unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("./artifacts"),
            project_id: DEFAULT_PROJECT_ID,
            delta_bound_bits: DEFAULT_DELTA_BOUND_BITS,
            seed: None,
        }
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// # Optional Environment Variables
    ///
    /// - `ZK_RISK_ARTIFACT_DIR`: artifact root (default `./artifacts`)
    /// - `ZK_RISK_PROJECT_ID`: funding-rate project id (default 10005)
    /// - `ZK_RISK_DELTA_BOUND_BITS`: delta comparator width (default 63)
    /// - `ZK_RISK_SEED`: deterministic RNG seed
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Config {
            artifact_dir: lookup("ZK_RISK_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),

            project_id: lookup("ZK_RISK_PROJECT_ID")
                .map(|v| v.parse())
                .transpose()
                .context("ZK_RISK_PROJECT_ID must be a non-negative integer")?
                .unwrap_or(defaults.project_id),

            delta_bound_bits: lookup("ZK_RISK_DELTA_BOUND_BITS")
                .map(|v| v.parse())
                .transpose()
                .context("ZK_RISK_DELTA_BOUND_BITS must be a bit count")?
                .unwrap_or(defaults.delta_bound_bits),

            seed: lookup("ZK_RISK_SEED")
                .map(|v| v.parse())
                .transpose()
                .context("ZK_RISK_SEED must be a u64")?,
        })
    }

    pub fn funding_policy(&self) -> FundingRatePolicy {
        FundingRatePolicy {
            project_id: self.project_id,
            delta_bound_bits: self.delta_bound_bits,
        }
    }
}
