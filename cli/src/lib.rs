//! zk-risk CLI Library
//!
//! ## Modules
//!
//! - `config`: environment settings (artifact root, funding-rate policy, RNG seed)
//! - `commands`: subcommand handlers, generic over the proven statement
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zk_risk::{commands, Config};
//!
//! let config = Config::from_env()?;
//! let mut rng = commands::rng(&config);
//! commands::demo(&config, &mut rng)?;
//! ```

pub mod commands;
pub mod config;

pub use commands::{CircuitKind, FundingRate, RiskNeutral, Statement};
pub use config::Config;
