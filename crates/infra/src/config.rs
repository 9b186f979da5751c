//! Store configuration, read from the environment.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `SHELF_DB_PATH` | database file, or `:memory:` | `{data_dir}/shelf/products.db` |
//! | `SHELF_SEED` | insert demo products into an empty store | `true` |

use std::path::PathBuf;

use anyhow::{Context, bail};

pub const DB_PATH_ENV: &str = "SHELF_DB_PATH";
pub const SEED_ENV: &str = "SHELF_SEED";

const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub seed_on_start: bool,
}

impl StoreConfig {
    /// Throwaway in-memory store with demo data.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            seed_on_start: true,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let location = match lookup(DB_PATH_ENV).map(|v| v.trim().to_string()) {
            Some(v) if v == IN_MEMORY => StoreLocation::InMemory,
            Some(v) if !v.is_empty() => StoreLocation::File(PathBuf::from(v)),
            _ => {
                let path = default_db_path()?;
                tracing::info!(path = %path.display(), "{DB_PATH_ENV} not set; using default database location");
                StoreLocation::File(path)
            }
        };

        let seed_on_start = match lookup(SEED_ENV) {
            Some(v) => parse_flag(SEED_ENV, &v)?,
            None => true,
        };

        Ok(Self {
            location,
            seed_on_start,
        })
    }
}

fn parse_flag(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean (true/false/1/0), got '{other}'"),
    }
}

/// Resolve the default database path: `{app_data_dir}/shelf/products.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    dir.push("shelf");
    dir.push("products.db");
    Ok(dir)
}
