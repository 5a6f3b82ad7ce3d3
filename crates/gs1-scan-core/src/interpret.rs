//! Interpreter - one raw scan in, one [`Interpretation`] out
//!
//! # Pipeline
//!
//! prepare → detect → canonicalize → order & serialize → (licensing)
//!
//! The synchronous part never touches the network. Licensing is an optional
//! async step layered on top; it can add `licensingMO` to a success but can
//! never turn a success into a failure.

use std::sync::Arc;

use serde::Serialize;

use crate::canonicalizer::canonicalize;
use crate::config::InterpreterConfig;
use crate::detector::{prepare_scan, Plausibility};
use crate::licensing::{resolve_licensing_mo, LicensingSource};
use crate::observer::{ScanObserver, TracingObserver};
use crate::serializer::{element_strings, ordered_elements, primary_identifier, OrderedElement};
use crate::toolkit::{BuiltinToolkit, Toolkit};
use crate::{date, Error, ErrorKind, Result};

/// Outcome of interpreting one scan
///
/// Serializes to either the success object or `{"errmsg": ...}`, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Interpretation {
    Success(ScanResult),
    Failure(ScanFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Bracketed element string
    #[serde(rename = "AIbrackets")]
    pub ai_brackets: String,
    /// Element string with group separators, as a scanner would emit it
    #[serde(rename = "AIfnc1")]
    pub ai_fnc1: String,
    /// Canonical uncompressed Digital Link URI
    pub dl: String,
    /// Every element, in Digital Link order
    pub ol: Vec<OrderedElement>,
    #[serde(rename = "licensingMO", skip_serializing_if = "Option::is_none")]
    pub licensing_mo: Option<String>,
    #[serde(skip)]
    primary: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub errmsg: String,
    #[serde(skip)]
    pub kind: ErrorKind,
}

impl From<Error> for ScanFailure {
    fn from(error: Error) -> Self {
        ScanFailure {
            kind: error.kind(),
            errmsg: error.to_string(),
        }
    }
}

impl Interpretation {
    pub fn is_success(&self) -> bool {
        matches!(self, Interpretation::Success(_))
    }

    pub fn as_success(&self) -> Option<&ScanResult> {
        match self {
            Interpretation::Success(result) => Some(result),
            Interpretation::Failure(_) => None,
        }
    }

    pub fn errmsg(&self) -> Option<&str> {
        match self {
            Interpretation::Success(_) => None,
            Interpretation::Failure(failure) => Some(&failure.errmsg),
        }
    }
}

impl ScanResult {
    /// Primary identification key as `(ai, value)`, if the scan has one
    pub fn primary(&self) -> Option<(&str, &str)> {
        self.primary.as_ref().map(|(ai, value)| (ai.as_str(), value.as_str()))
    }

    /// Look up the licensing Member Organisation and record it on success.
    ///
    /// `Ok(None)` when there is no primary key to look up.
    pub async fn resolve_licensing(&mut self, source: &dyn LicensingSource) -> Result<Option<String>> {
        let Some((ai, value)) = self.primary.as_ref() else {
            return Ok(None);
        };
        let prefixes = source.fetch_prefixes().await?;
        let mo = resolve_licensing_mo(ai, value, &prefixes)?.to_string();
        self.licensing_mo = Some(mo.clone());
        Ok(Some(mo))
    }
}

pub struct Interpreter {
    toolkit: Arc<dyn Toolkit>,
    observer: Arc<dyn ScanObserver>,
    config: InterpreterConfig,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl Interpreter {
    /// Interpreter over the built-in toolkit, reporting through `tracing`
    pub fn new(config: InterpreterConfig) -> Self {
        Interpreter {
            toolkit: Arc::new(BuiltinToolkit::new()),
            observer: Arc::new(TracingObserver),
            config,
        }
    }

    pub fn with_toolkit(mut self, toolkit: Arc<dyn Toolkit>) -> Self {
        self.toolkit = toolkit;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Interpret a scan, resolving two-digit years against the current year
    pub fn interpret(&self, scan: &str) -> Interpretation {
        self.interpret_at(scan, date::current_year())
    }

    /// Interpret a scan against an explicit date-window reference year
    pub fn interpret_at(&self, scan: &str, reference_year: i32) -> Interpretation {
        let interpretation = self.interpret_core(scan, reference_year);
        self.observer.on_result(&interpretation);
        interpretation
    }

    /// Interpret a scan and attach the licensing Member Organisation.
    ///
    /// Fetch errors, timeouts and unmatched prefixes are logged and leave
    /// `licensing_mo` unset.
    pub async fn interpret_with_licensing(&self, scan: &str, source: &dyn LicensingSource) -> Interpretation {
        self.interpret_with_licensing_at(scan, source, date::current_year()).await
    }

    /// [`Interpreter::interpret_with_licensing`] against an explicit reference year
    pub async fn interpret_with_licensing_at(
        &self,
        scan: &str,
        source: &dyn LicensingSource,
        reference_year: i32,
    ) -> Interpretation {
        let mut interpretation = self.interpret_core(scan, reference_year);

        if let Interpretation::Success(result) = &mut interpretation {
            let timeout = self.config.licensing.timeout();
            match tokio::time::timeout(timeout, result.resolve_licensing(source)).await {
                Ok(Ok(Some(mo))) => tracing::debug!(mo = %mo, "licensing resolved"),
                Ok(Ok(None)) => tracing::debug!("no primary identification key, licensing skipped"),
                Ok(Err(e)) => tracing::warn!(kind = %e.kind(), "licensing lookup failed: {}", e),
                Err(_) => tracing::warn!(timeout_ms = self.config.licensing.timeout_ms, "licensing lookup timed out"),
            }
        }

        self.observer.on_result(&interpretation);
        interpretation
    }

    fn interpret_core(&self, raw: &str, reference_year: i32) -> Interpretation {
        match self.try_interpret(raw, reference_year) {
            Ok(result) => Interpretation::Success(result),
            Err(error) => {
                self.observer.on_conversion_error(&error);
                Interpretation::Failure(error.into())
            }
        }
    }

    fn try_interpret(&self, raw: &str, reference_year: i32) -> Result<ScanResult> {
        let scan = prepare_scan(raw);
        let plausibility = if scan.gtin_shortcut {
            Plausibility::default()
        } else {
            self.toolkit.plausibility(&scan.text)
        };
        self.observer.on_detection(&scan.text, &plausibility);

        let canonical = canonicalize(&scan, &plausibility, self.toolkit.as_ref(), &self.config.resolver_domain)?;

        let table = self.toolkit.ai_table();
        let gs1 = &canonical.extraction.gs1;
        let primary = primary_identifier(gs1, table)?.map(|ai| (ai.to_string(), gs1[ai].clone()));
        let ol = ordered_elements(gs1, &canonical.extraction.other, table, reference_year)?;
        let strings = element_strings(gs1, table, self.toolkit.group_separator())?;

        Ok(ScanResult {
            ai_brackets: strings.brackets,
            ai_fnc1: strings.fnc1,
            dl: canonical.dl,
            ol,
            licensing_mo: None,
            primary,
        })
    }
}

/// Interpret a scan with the default configuration
pub fn interpret_scan(scan: &str) -> Interpretation {
    Interpreter::default().interpret(scan)
}
