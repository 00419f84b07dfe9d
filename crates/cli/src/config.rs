//! CLI configuration.
//!
//! Settings come from, in order of precedence: command-line flags, the
//! environment (`BWT_SECRET`, `SQLITE_PATH`), an optional TOML file and
//! built-in defaults. Flags and environment are merged by clap before they
//! reach [`Settings::resolve`].

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use bwt::Secret;
use serde::{Deserialize, Serialize};

/// Contents of the optional TOML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Base64-encoded signing secret.
    #[serde(default)]
    pub secret: Option<String>,

    /// Session database location.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// Token lifetime when `issue` gets no explicit expiry.
    #[serde(default = "default_validity_days")]
    pub default_validity_days: u32,
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./db.sqlite3")
}

fn default_validity_days() -> u32 {
    365
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            secret: None,
            sqlite_path: default_sqlite_path(),
            default_validity_days: default_validity_days(),
        }
    }
}

impl CliConfig {
    /// Load a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Effective settings after merging every source.
#[derive(Debug, Clone)]
pub struct Settings {
    secret: Option<String>,
    pub sqlite_path: PathBuf,
    pub validity_days: u32,
}

impl Settings {
    /// Merge flag/env values over the file config.
    ///
    /// The secret stays encoded until a command asks for it, so commands
    /// that never sign are not blocked by a bad `BWT_SECRET`.
    pub fn resolve(secret: Option<&str>, sqlite_path: Option<PathBuf>, file: CliConfig) -> Self {
        Self {
            secret: secret.map(str::to_owned).or(file.secret),
            sqlite_path: sqlite_path.unwrap_or(file.sqlite_path),
            validity_days: file.default_validity_days,
        }
    }

    /// Decoded signing secret, required by commands that mint or verify.
    pub fn secret(&self) -> Result<Secret> {
        let encoded = self.secret.as_deref().ok_or_else(|| {
            anyhow!("No signing secret configured; set BWT_SECRET or pass --secret")
        })?;
        Secret::from_base64(encoded).context("Signing secret is not valid base64")
    }
}
