use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Request bodies above this size are rejected before any parsing.
    pub max_payload_bytes: usize,
    pub session_ttl_secs: u64,
    pub theme_dir: PathBuf,
    /// Directory holding a `resume.html` override. Embedded template otherwise.
    pub template_dir: Option<PathBuf>,
    /// Selects the Redis session store when set.
    pub redis_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            max_payload_bytes: 256 * 1024,
            session_ttl_secs: 3600,
            theme_dir: PathBuf::from("static/themes"),
            template_dir: None,
            redis_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            max_payload_bytes: parse_or(
                get("MAX_PAYLOAD_BYTES"),
                "MAX_PAYLOAD_BYTES",
                defaults.max_payload_bytes,
            )?,
            session_ttl_secs: parse_or(
                get("SESSION_TTL_SECS"),
                "SESSION_TTL_SECS",
                defaults.session_ttl_secs,
            )?,
            theme_dir: get("THEME_DIR").map(PathBuf::from).unwrap_or(defaults.theme_dir),
            template_dir: get("TEMPLATE_DIR").map(PathBuf::from),
            redis_url: get("REDIS_URL"),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
    }
}
