//! GS1 Scan Core - interpretation of GS1 barcode scans
//!
//! Accepts whatever a scanner produced (a bare GTIN, a bracketed or FNC1
//! element string, or a GS1 Digital Link URI) and normalizes it to one
//! canonical form.
//!
//! # Architecture
//!
//! ```text
//! Raw scan → Detector → Canonicalizer → AI Value Map + Extensions
//!                          ↓ (Toolkit)          ↓
//!                     Digital Link URI     Serializer → AIbrackets, AIfnc1, ol
//!                                               ↓
//!                                   Licensing (async, optional) → licensingMO
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: Same scan and reference year always give identical output
//! - **Exclusive**: A result is either a success or a failure, never both
//! - **Round-trip**: `AIfnc1` interprets back to the same AI Value Map
//! - **Non-fatal licensing**: Licensing can only add to a success
//!
//! # Example
//!
//! ```
//! use gs1_scan_core::interpret_scan;
//!
//! let result = interpret_scan("09506000134352");
//! let success = result.as_success().unwrap();
//! assert_eq!(success.dl, "https://id.gs1.org/01/09506000134352");
//! assert_eq!(success.ai_brackets, "(01)09506000134352");
//! ```

pub mod canonicalizer;
pub mod config;
pub mod date;
pub mod detector;
pub mod error;
pub mod interpret;
pub mod licensing;
pub mod observer;
pub mod serializer;
pub mod toolkit;

pub use config::{InterpreterConfig, LicensingConfig};
pub use detector::{is_plausible_gs1_dl_uri, Plausibility, GROUP_SEPARATOR};
pub use error::{Error, ErrorKind, Result};
pub use interpret::{interpret_scan, Interpretation, Interpreter, ScanFailure, ScanResult};
pub use licensing::{
    CachedLicensingSource, HttpLicensingSource, LicensingSource, MoPrefix, StaticLicensingSource,
};
pub use observer::{NoopObserver, ScanObserver, TracingObserver};
pub use serializer::OrderedElement;
pub use toolkit::{AiKind, AiRecord, AiTable, AiValueMap, BuiltinToolkit, ExtensionMap, Toolkit};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
