//! Canonicalizer - any accepted scan to a canonical Digital Link URI plus maps
//!
//! The toolkit does the actual conversion; this module decides which
//! conversions to run and tags failures with the stage they happened in.

use std::sync::LazyLock;

use regex::Regex;

use crate::detector::{Plausibility, PreparedScan};
use crate::toolkit::{Extraction, Toolkit};
use crate::Result;

static AI_BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d{2,4}\)").unwrap());

/// Percent-encode the characters GS1 reserves in Digital Link values.
///
/// Every occurrence is replaced in a single pass, so an escaped `%` is never
/// escaped again. The group separator is left alone.
pub fn escape_reserved_characters(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let escaped = match c {
            '#' => "%23",
            '/' => "%2F",
            '%' => "%25",
            '&' => "%26",
            '+' => "%2B",
            ',' => "%2C",
            '!' => "%21",
            '(' => "%28",
            ')' => "%29",
            '*' => "%2A",
            '\'' => "%27",
            ':' => "%3A",
            ';' => "%3B",
            '<' => "%3C",
            '=' => "%3D",
            '>' => "%3E",
            '?' => "%3F",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(escaped);
    }
    out
}

/// Escape the values of an element string, leaving `(ai)` brackets intact
pub fn escape_element_values(element_strings: &str) -> String {
    let mut out = String::with_capacity(element_strings.len());
    let mut last = 0;
    for bracket in AI_BRACKET_RE.find_iter(element_strings) {
        out.push_str(&escape_reserved_characters(&element_strings[last..bracket.start()]));
        out.push_str(bracket.as_str());
        last = bracket.end();
    }
    out.push_str(&escape_reserved_characters(&element_strings[last..]));
    out
}

/// A scan in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// Uncompressed Digital Link URI
    pub dl: String,
    pub extraction: Extraction,
}

/// Convert a prepared scan to its canonical URI and extract its maps.
///
/// Any toolkit failure aborts with the toolkit's message.
pub fn canonicalize(
    scan: &PreparedScan,
    plausibility: &Plausibility,
    toolkit: &dyn Toolkit,
    resolver_domain: &str,
) -> Result<Canonical> {
    let dl = if plausibility.any {
        let uri = if plausibility.uncompressed_with_alphas {
            scan.text.clone()
        } else {
            toolkit
                .decompress_digital_link(&scan.text, resolver_domain)
                .map_err(|e| e.into_conversion())?
        };
        toolkit
            .digital_link_to_element_strings(&uri, true)
            .map_err(|e| e.into_conversion())?;
        uri
    } else {
        let element_strings = if scan.gtin_shortcut {
            scan.text.clone()
        } else {
            escape_element_values(&scan.text)
        };
        toolkit
            .element_strings_to_digital_link(&element_strings, false, resolver_domain)
            .map_err(|e| e.into_conversion())?
    };

    let extraction = toolkit
        .extract_from_digital_link(&dl)
        .map_err(|e| e.into_extraction())?;
    Ok(Canonical { dl, extraction })
}
