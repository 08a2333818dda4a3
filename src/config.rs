//! Gateway configuration.
//!
//! [`GatewayConfig::default`] carries the design defaults; `from_env` overlays
//! environment variables on top of them, and `from_env_file` also reads a
//! `.env` file. Values are fixed for the lifetime of the process.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Development signing secret. The binary warns when it is still in use.
pub const DEFAULT_JWT_SECRET: &str = "catalog-gateway-dev-secret-change-me";

/// Price enrichment parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    /// USD → BRL multiplier.
    pub conversion_rate: f64,
    /// Prices strictly above this get `discount_rate`.
    pub discount_threshold: f64,
    pub discount_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            conversion_rate: 5.5,
            discount_threshold: 100.0,
            discount_rate: 0.1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub bind_addr: String,
    pub upstream_base_url: String,
    pub upstream_timeout: Duration,
    pub cache_ttl: Duration,
    pub jwt_secret: String,
    pub jwt_expiration: Duration,
    pub pricing: PricingConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            bind_addr: "0.0.0.0:3000".to_string(),
            upstream_base_url: "https://fakestoreapi.com".to_string(),
            upstream_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(5 * 60),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration: Duration::from_secs(24 * 60 * 60),
            pricing: PricingConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load from the process environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `GATEWAY_ADDR` (or `PORT`) | `bind_addr` |
    /// | `UPSTREAM_BASE_URL` | `upstream_base_url` |
    /// | `UPSTREAM_TIMEOUT_SECS` | `upstream_timeout` |
    /// | `CACHE_TTL_SECS` | `cache_ttl` |
    /// | `JWT_SECRET` | `jwt_secret` |
    /// | `JWT_EXPIRATION_SECS` | `jwt_expiration` |
    /// | `BRL_CONVERSION_RATE` | `pricing.conversion_rate` |
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for unparsable or non-positive values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Process environment over the variables of a dotenv file at `path`.
    /// Variables already set in the process win, as with `dotenvy::dotenv`.
    /// A missing file is not an error.
    ///
    /// # Errors
    /// `Error::ConfigError` if the file exists but cannot be parsed, or for
    /// the same values [`from_env`](Self::from_env) rejects.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_and_lookup(path.as_ref(), |name| std::env::var(name).ok())
    }

    fn from_file_and_lookup<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file_vars = HashMap::new();
        match dotenvy::from_path_iter(path) {
            Ok(items) => {
                for item in items {
                    let (name, value) = item.map_err(|e| {
                        Error::ConfigError(format!("cannot read {}: {}", path.display(), e))
                    })?;
                    file_vars.insert(name, value);
                }
                debug!("Loaded {} variables from {}", file_vars.len(), path.display());
            }
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(Error::ConfigError(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        Self::from_lookup(|name| lookup(name).or_else(|| file_vars.get(name).cloned()))
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GatewayConfig::default();

        if let Some(addr) = lookup("GATEWAY_ADDR") {
            config.bind_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| Error::ConfigError(format!("PORT is not a port number: {}", port)))?;
            config.bind_addr = format!("0.0.0.0:{}", port);
        }

        if let Some(url) = lookup("UPSTREAM_BASE_URL") {
            config.upstream_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
            config.upstream_timeout = parse_secs("UPSTREAM_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CACHE_TTL_SECS") {
            config.cache_ttl = parse_secs("CACHE_TTL_SECS", &secs)?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            if secret.is_empty() {
                return Err(Error::ConfigError("JWT_SECRET must not be empty".to_string()));
            }
            config.jwt_secret = secret;
        }
        if let Some(secs) = lookup("JWT_EXPIRATION_SECS") {
            config.jwt_expiration = parse_secs("JWT_EXPIRATION_SECS", &secs)?;
        }
        if let Some(rate) = lookup("BRL_CONVERSION_RATE") {
            config.pricing.conversion_rate = rate
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|r| r.is_finite() && *r > 0.0)
                .ok_or_else(|| {
                    Error::ConfigError(format!("BRL_CONVERSION_RATE is not a positive number: {}", rate))
                })?;
        }

        Ok(config)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::ConfigError(format!("{} must be a positive number of seconds: {}", name, raw)))
}
