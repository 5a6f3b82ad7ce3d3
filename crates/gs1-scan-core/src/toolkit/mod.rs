//! Toolkit - the conversion engine the interpreter delegates to
//!
//! The interpreter never parses element strings or URIs itself; it goes
//! through [`Toolkit`], which bundles the AI metadata table with the
//! element string ↔ Digital Link conversions. [`BuiltinToolkit`] is the
//! implementation shipped with the crate. A toolkit with compressed Digital
//! Link support can be injected in its place.

pub mod ai_table;
pub mod digital_link;
pub mod element;

use std::collections::BTreeMap;

pub use ai_table::{AiKind, AiRecord, AiTable, Charset, StaticAiTable};

use crate::detector::{self, Plausibility, GROUP_SEPARATOR};
use crate::{serializer, Error, Result};

/// AI code → decoded value. Ordered by key, so iteration is deterministic.
pub type AiValueMap = BTreeMap<String, String>;

/// Non-GS1 query parameter → decoded value
pub type ExtensionMap = BTreeMap<String, String>;

/// Everything a Digital Link URI carries
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Extraction {
    /// GS1 Application Identifiers
    #[serde(rename = "GS1")]
    pub gs1: AiValueMap,
    /// Non-GS1 query parameters
    pub other: ExtensionMap,
}

/// Conversion engine consumed by the interpreter
pub trait Toolkit: Send + Sync {
    /// AI metadata and qualifier relations
    fn ai_table(&self) -> &dyn AiTable;

    /// Digital Link plausibility pre-filter
    fn plausibility(&self, s: &str) -> Plausibility {
        detector::is_plausible_gs1_dl_uri(s)
    }

    /// Decompress a Digital Link URI, producing an uncompressed URI on `domain`
    fn decompress_digital_link(&self, uri: &str, domain: &str) -> Result<String>;

    /// Convert an element string (values percent-escaped) to a Digital Link URI
    fn element_strings_to_digital_link(
        &self,
        element_strings: &str,
        use_short_text: bool,
        domain: &str,
    ) -> Result<String>;

    /// Convert an uncompressed Digital Link URI to an element string
    fn digital_link_to_element_strings(&self, uri: &str, brackets: bool) -> Result<String>;

    /// Split an uncompressed Digital Link URI into GS1 and non-GS1 parts
    fn extract_from_digital_link(&self, uri: &str) -> Result<Extraction>;

    /// Character standing in for FNC1 in element strings
    fn group_separator(&self) -> char {
        GROUP_SEPARATOR
    }
}

/// Toolkit over an in-memory AI table
///
/// Handles bracketed and FNC1 element strings and uncompressed Digital Link
/// URIs. Compressed URIs are rejected.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinToolkit {
    table: &'static StaticAiTable,
}

impl BuiltinToolkit {
    pub fn new() -> Self {
        Self::with_table(StaticAiTable::builtin())
    }

    pub fn with_table(table: &'static StaticAiTable) -> Self {
        BuiltinToolkit { table }
    }
}

impl Default for BuiltinToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolkit for BuiltinToolkit {
    fn ai_table(&self) -> &dyn AiTable {
        self.table
    }

    fn decompress_digital_link(&self, uri: &str, _domain: &str) -> Result<String> {
        // Already uncompressed: nothing to do.
        if digital_link::parse_digital_link(uri, self.table).is_ok() {
            return Ok(uri.to_string());
        }
        Err(Error::ConversionFailed(format!(
            "'{}' looks like a compressed GS1 Digital Link URI; \
             decompression needs a toolkit with compression support",
            uri
        )))
    }

    fn element_strings_to_digital_link(
        &self,
        element_strings: &str,
        use_short_text: bool,
        domain: &str,
    ) -> Result<String> {
        let pairs = element::parse_element_string(element_strings, self.table, self.group_separator())?;
        digital_link::build_digital_link(&pairs, self.table, use_short_text, domain)
    }

    fn digital_link_to_element_strings(&self, uri: &str, brackets: bool) -> Result<String> {
        let extraction = digital_link::parse_digital_link(uri, self.table)?;
        let strings = serializer::element_strings(&extraction.gs1, self.table, self.group_separator())?;
        Ok(if brackets { strings.brackets } else { strings.fnc1 })
    }

    fn extract_from_digital_link(&self, uri: &str) -> Result<Extraction> {
        digital_link::parse_digital_link(uri, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_strings_to_digital_link() {
        let toolkit = BuiltinToolkit::new();
        let uri = toolkit
            .element_strings_to_digital_link("(01)09506000134352(10)ABC", false, "https://id.gs1.org")
            .unwrap();
        assert_eq!(uri, "https://id.gs1.org/01/09506000134352/10/ABC");
    }

    #[test]
    fn test_digital_link_to_element_strings() {
        let toolkit = BuiltinToolkit::new();
        let uri = "https://id.gs1.org/01/09506000134352/10/ABC?17=290101";
        assert_eq!(
            toolkit.digital_link_to_element_strings(uri, true).unwrap(),
            "(01)09506000134352(17)290101(10)ABC"
        );
        assert_eq!(
            toolkit.digital_link_to_element_strings(uri, false).unwrap(),
            "\u{1d}01095060001343521729010110ABC"
        );
    }

    #[test]
    fn test_decompress_passes_uncompressed_through() {
        let toolkit = BuiltinToolkit::new();
        let uri = "https://id.gs1.org/01/09506000134352";
        assert_eq!(toolkit.decompress_digital_link(uri, "https://id.gs1.org").unwrap(), uri);
    }

    #[test]
    fn test_decompress_rejects_compressed() {
        let toolkit = BuiltinToolkit::new();
        let err = toolkit
            .decompress_digital_link("https://id.gs1.org/AQnYUc1gmiAyAiqeb8A", "https://id.gs1.org")
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ConversionFailed);
    }

    #[test]
    fn test_extraction_json_shape() {
        let toolkit = BuiltinToolkit::new();
        let extraction = toolkit
            .extract_from_digital_link("https://id.gs1.org/01/09506000134352?foo=bar")
            .unwrap();
        let json = serde_json::to_value(&extraction).unwrap();
        assert_eq!(json["GS1"]["01"], "09506000134352");
        assert_eq!(json["other"]["foo"], "bar");
    }
}
