use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_SCORING_ENGINE_URL: &str = "http://127.0.0.1:5001";
const DEFAULT_ADMIN_EMAIL: &str = "admin@gmail.com";
const MAX_SCORING_ATTEMPTS: u32 = 10;

/// How a submission reaches the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// One attempt inside the submitting request, bounded by the scoring timeout.
    Inline,
    /// Persist as Pending and hand the work to the background scoring worker.
    Queued,
}

impl std::str::FromStr for ScoringMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(ScoringMode::Inline),
            "queued" => Ok(ScoringMode::Queued),
            other => bail!("SCORING_MODE must be 'inline' or 'queued', got '{other}'"),
        }
    }
}

/// Bootstrap admin account created at start-up when a password is configured.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Application configuration loaded from environment variables.
/// Start-up fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: PathBuf,
    pub scoring_engine_url: String,
    pub scoring_timeout: Duration,
    pub scoring_mode: ScoringMode,
    pub scoring_max_attempts: u32,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let scoring_timeout_secs = optional("SCORING_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .context("SCORING_TIMEOUT_SECS must be a whole number of seconds")?;
        let scoring_max_attempts = optional("SCORING_MAX_ATTEMPTS", "3")
            .parse::<u32>()
            .context("SCORING_MAX_ATTEMPTS must be a positive integer")?;
        if !(1..=MAX_SCORING_ATTEMPTS).contains(&scoring_max_attempts) {
            bail!("SCORING_MAX_ATTEMPTS must be between 1 and {MAX_SCORING_ATTEMPTS}");
        }

        let admin_seed = lookup("ADMIN_PASSWORD")
            .filter(|p| !p.is_empty())
            .map(|password| AdminSeed {
                email: optional("ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
                password,
            });

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            jwt_secret: require("JWT_SECRET")?,
            port: optional("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG", "info"),
            upload_dir: PathBuf::from(optional("UPLOAD_DIR", "uploads")),
            scoring_engine_url: optional("SCORING_ENGINE_URL", DEFAULT_SCORING_ENGINE_URL)
                .trim_end_matches('/')
                .to_string(),
            scoring_timeout: Duration::from_secs(scoring_timeout_secs),
            scoring_mode: optional("SCORING_MODE", "inline").parse()?,
            scoring_max_attempts,
            admin_seed,
        })
    }
}
