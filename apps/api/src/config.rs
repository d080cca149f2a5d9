//! Configuration
//!
//! Environment variables win over their flag equivalents; the flags cover
//! local runs where the environment is not set.

use anyhow::Context;
use clap::Parser;

const DEFAULT_SECRET: &str = "key";

#[derive(Parser, Debug)]
#[command(name = "api", about = "Loyalty-points accrual gateway")]
struct Flags {
    /// HTTP server address
    #[arg(short = 'a', long = "address")]
    address: Option<String>,

    /// Database connection URI
    #[arg(short = 'd', long = "database-uri")]
    database_uri: Option<String>,

    /// Accrual provider base URL
    #[arg(short = 'r', long = "accrual-address")]
    accrual_address: Option<String>,

    /// Bearer-token signing secret
    #[arg(short = 's', long = "secret")]
    secret: Option<String>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub run_address: String,
    pub database_uri: String,
    pub accrual_address: String,
    pub secret: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_flags(Flags::parse())
    }

    fn from_flags(flags: Flags) -> anyhow::Result<Self> {
        let run_address = pick(env_var("RUN_ADDRESS"), flags.address)
            .context("RUN_ADDRESS (or -a) must be set")?;
        let database_uri = pick(env_var("DATABASE_URI"), flags.database_uri)
            .context("DATABASE_URI (or -d) must be set")?;
        let accrual_address = pick(env_var("ACCRUAL_SYSTEM_ADDRESS"), flags.accrual_address)
            .context("ACCRUAL_SYSTEM_ADDRESS (or -r) must be set")?;
        let secret = pick(env_var("SECRET"), flags.secret)
            .unwrap_or_else(|| DEFAULT_SECRET.to_string());

        Ok(Self {
            run_address,
            database_uri,
            accrual_address,
            secret,
        })
    }
}

/// A non-empty environment value beats the flag; empty counts as unset.
fn pick(env: Option<String>, flag: Option<String>) -> Option<String> {
    env.filter(|value| !value.is_empty())
        .or_else(|| flag.filter(|value| !value.is_empty()))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_wins_over_flag() {
        let picked = pick(Some("from-env".into()), Some("from-flag".into()));
        assert_eq!(picked.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_flag_fills_in_for_empty_env() {
        let picked = pick(Some(String::new()), Some("from-flag".into()));
        assert_eq!(picked.as_deref(), Some("from-flag"));

        let picked = pick(None, Some("from-flag".into()));
        assert_eq!(picked.as_deref(), Some("from-flag"));
    }

    #[test]
    fn test_neither_set() {
        assert_eq!(pick(None, None), None);
        assert_eq!(pick(Some(String::new()), None), None);
    }
}
