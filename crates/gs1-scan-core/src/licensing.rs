//! Licensing resolver - which GS1 Member Organisation issued a key
//!
//! GS1 Company Prefixes are licensed by Member Organisations; the prefix list
//! is published as JSON (`[{"prefix": "...", "mo": "..."}]`). Lookup is the
//! only asynchronous step of interpretation and is always best-effort.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::OnceCell;

use crate::{Error, Result};

/// Default location of the published prefix list
pub const DEFAULT_MO_PREFIXES_URL: &str = "https://gs1.github.io/interpretGS1scan/MOprefixStrings.json";

/// One prefix → Member Organisation record
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MoPrefix {
    pub prefix: String,
    pub mo: String,
}

/// Find the Member Organisation licensing `value` of primary key `primary_ai`.
///
/// GTINs carry a leading indicator digit that is not part of the company
/// prefix, so matching starts at offset 1 for AI `01`. The first matching
/// record wins; an empty prefix therefore acts as a catch-all.
pub fn resolve_licensing_mo<'p>(primary_ai: &str, value: &str, prefixes: &'p [MoPrefix]) -> Result<&'p str> {
    let offset = if primary_ai == "01" { 1 } else { 0 };
    let candidate = value.get(offset..).unwrap_or("");
    prefixes
        .iter()
        .find(|record| candidate.starts_with(record.prefix.as_str()))
        .map(|record| record.mo.as_str())
        .ok_or_else(|| Error::LicensingUnmatched {
            ai: primary_ai.to_string(),
            value: value.to_string(),
        })
}

/// Supplier of the prefix list
#[async_trait]
pub trait LicensingSource: Send + Sync {
    async fn fetch_prefixes(&self) -> Result<Vec<MoPrefix>>;
}

/// Fetches the prefix list over HTTP on every call
pub struct HttpLicensingSource {
    http: Client,
    url: String,
}

impl HttpLicensingSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::LicensingFetch(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, url: url.into() })
    }
}

#[async_trait]
impl LicensingSource for HttpLicensingSource {
    async fn fetch_prefixes(&self) -> Result<Vec<MoPrefix>> {
        tracing::debug!(url = %self.url, "fetching licensing prefix list");
        let response = self
            .http
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::LicensingFetch(format!("Failed to fetch {}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::LicensingFetch(format!("{} returned {}", self.url, status)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::LicensingFetch(format!("Failed to parse response from {}: {}", self.url, e)))
    }
}

/// A fixed, in-memory prefix list
#[derive(Debug, Clone, Default)]
pub struct StaticLicensingSource {
    prefixes: Vec<MoPrefix>,
}

impl StaticLicensingSource {
    pub fn new(prefixes: Vec<MoPrefix>) -> Self {
        Self { prefixes }
    }

    /// Load a prefix list in the published JSON format
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::LicensingFetch(format!("Failed to read {}: {}", path.display(), e)))?;
        let prefixes = serde_json::from_str(&text)
            .map_err(|e| Error::LicensingFetch(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(Self { prefixes })
    }
}

#[async_trait]
impl LicensingSource for StaticLicensingSource {
    async fn fetch_prefixes(&self) -> Result<Vec<MoPrefix>> {
        Ok(self.prefixes.clone())
    }
}

/// Fetches once, then serves the cached list
pub struct CachedLicensingSource<S> {
    inner: S,
    cache: OnceCell<Vec<MoPrefix>>,
}

impl<S: LicensingSource> CachedLicensingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: OnceCell::new(),
        }
    }
}

#[async_trait]
impl<S: LicensingSource> LicensingSource for CachedLicensingSource<S> {
    async fn fetch_prefixes(&self) -> Result<Vec<MoPrefix>> {
        // A failed fetch leaves the cell empty, so the next call retries.
        let prefixes = self
            .cache
            .get_or_try_init(|| self.inner.fetch_prefixes())
            .await?;
        Ok(prefixes.clone())
    }
}
