//! Hooks into the interpretation pipeline
//!
//! Observers see what the interpreter saw. They are never needed for a
//! correct result and cannot change one.

use crate::detector::Plausibility;
use crate::interpret::Interpretation;
use crate::Error;

pub trait ScanObserver: Send + Sync {
    /// After the scan has been prepared and tested for Digital Link syntax
    fn on_detection(&self, _scan: &str, _plausibility: &Plausibility) {}

    /// When canonicalization or serialization fails
    fn on_conversion_error(&self, _error: &Error) {}

    /// Once per interpretation, with the final outcome
    fn on_result(&self, _interpretation: &Interpretation) {}
}

/// Ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Forwards pipeline events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn on_detection(&self, scan: &str, plausibility: &Plausibility) {
        tracing::debug!(
            scan,
            uncompressed_with_alphas = plausibility.uncompressed_with_alphas,
            uncompressed = plausibility.uncompressed,
            compressed = plausibility.compressed,
            any = plausibility.any,
            "scan detected"
        );
    }

    fn on_conversion_error(&self, error: &Error) {
        tracing::warn!(kind = %error.kind(), "conversion failed: {}", error);
    }

    fn on_result(&self, interpretation: &Interpretation) {
        match interpretation {
            Interpretation::Success(result) => tracing::debug!(
                dl = %result.dl,
                elements = result.ol.len(),
                licensing_mo = result.licensing_mo.as_deref().unwrap_or("-"),
                "scan interpreted"
            ),
            Interpretation::Failure(failure) => {
                tracing::debug!(kind = %failure.kind, errmsg = %failure.errmsg, "scan rejected")
            }
        }
    }
}
