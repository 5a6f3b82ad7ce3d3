//! Interpreter configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//! Environment variables override file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::licensing::DEFAULT_MO_PREFIXES_URL;
use crate::{Error, Result};

pub const DEFAULT_RESOLVER_DOMAIN: &str = "https://id.gs1.org";

pub const ENV_RESOLVER_DOMAIN: &str = "GS1SCAN_RESOLVER_DOMAIN";
pub const ENV_LICENSING_URL: &str = "GS1SCAN_LICENSING_URL";
pub const ENV_LICENSING_TIMEOUT_MS: &str = "GS1SCAN_LICENSING_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Domain used when an element string is turned into a Digital Link URI
    #[serde(default = "default_resolver_domain")]
    pub resolver_domain: String,

    #[serde(default)]
    pub licensing: LicensingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicensingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_licensing_url")]
    pub url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Local prefix list, used instead of `url` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes_file: Option<PathBuf>,
}

fn default_resolver_domain() -> String {
    DEFAULT_RESOLVER_DOMAIN.to_string()
}

fn default_licensing_url() -> String {
    DEFAULT_MO_PREFIXES_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            resolver_domain: default_resolver_domain(),
            licensing: LicensingConfig::default(),
        }
    }
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_licensing_url(),
            timeout_ms: default_timeout_ms(),
            prefixes_file: None,
        }
    }
}

impl LicensingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl InterpreterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Apply `GS1SCAN_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(domain) = var(ENV_RESOLVER_DOMAIN) {
            self.resolver_domain = domain;
        }
        if let Some(url) = var(ENV_LICENSING_URL) {
            self.licensing.url = url;
        }
        if let Some(raw) = var(ENV_LICENSING_TIMEOUT_MS) {
            self.licensing.timeout_ms = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a number of milliseconds, got '{}'", ENV_LICENSING_TIMEOUT_MS, raw))
            })?;
        }
        Ok(self)
    }
}
