//! Server configuration: an optional TOML file overridden by environment variables
use anyhow::{Context, bail};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "BOOKSWAP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "bookswap.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_path: PathBuf::from("bookswap.db"),
            jwt_secret: String::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Read the file named by `BOOKSWAP_CONFIG` (or `bookswap.toml`) if it exists,
    /// then apply the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let path = Path::new(&path);

        let file = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = match file {
            Some(contents) => {
                toml::from_str::<Config>(contents).context("invalid configuration file")?
            }
            None => Config::default(),
        };

        if let Some(addr) = env("BOOKSWAP_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("BOOKSWAP_BIND_ADDR is not a socket address: {addr}"))?;
        }
        if let Some(path) = env("BOOKSWAP_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(secret) = env("JWT_SECRET") {
            config.jwt_secret = secret;
        }
        if let Some(filter) = env("RUST_LOG") {
            config.log_filter = filter;
        }

        if config.jwt_secret.trim().is_empty() {
            bail!("jwt_secret must be set (config file or JWT_SECRET)");
        }
        Ok(config)
    }
}
