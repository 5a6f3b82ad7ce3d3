//! Format detector - classifies a raw scan before any conversion
//!
//! Three surface syntaxes are accepted: a bare GTIN (as read from an EAN/UPC
//! symbol), a GS1 element string (bracketed or FNC1-delimited) and a GS1
//! Digital Link URI (compressed or uncompressed).
//!
//! The Digital Link tests use the regular expressions from GS1 Digital Link
//! URI syntax 1.2 §6. They are a pre-filter only: a string that is
//! *plausibly* a Digital Link URI can still fail full parsing, and the only
//! way to be sure is to parse it.

use std::sync::LazyLock;

use regex::Regex;

/// ASCII 29, the group separator that stands in for FNC1 in scanner output
pub const GROUP_SEPARATOR: char = '\u{1d}';

static GTIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{8})$|^(\d{12,14})$").unwrap());

// Uncompressed; the primary key may be a convenience alpha such as `gtin`.
static DL_UNCOMPRESSED_WITH_ALPHAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^https?:(//((([^/?#]*)@)?([^/?#:]*)(:([^/?#]*))?))?([^?#]*)",
        r"(((/(01|gtin|8006|itip|8013|gmn|8010|cpid|414|gln|417|party|8017|gsrnp|8018|gsrn|255|gcn|00|sscc|253|gdti|401|ginc|402|gsin|8003|grai|8004|giai)/)",
        r"(\d{4}[^/]+)(/[^/]+/[^/]+)?[/]?(\?([^?\n]*))?(#([^\n]*))?))",
    ))
    .unwrap()
});

// Uncompressed; numeric primary key only. Qualifiers are assumed, not checked, to be numeric.
static DL_UNCOMPRESSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^https?:(//((([^/?#]*)@)?([^/?#:]*)(:([^/?#]*))?))?([^?#]*)",
        r"(((/(01|8006|8013|8010|414|417|8017|8018|255|00|253|401|402|8003|8004)/)",
        r"(\d{4}[^/]+)(/[^/]+/[^/]+)?[/]?(\?([^?\n]*))?(#([^\n]*))?))",
    ))
    .unwrap()
});

// Compressed: one opaque segment of 10+ base64url characters closing the path.
static DL_COMPRESSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?:(//((([^/?#]*)@)?([^/?#:]*)(:([^/?#]*))?))?([^?#]*)((/[0-9A-Za-z_-]{10,}$))")
        .unwrap()
});

/// Outcome of the Digital Link plausibility tests
///
/// Only [`Plausibility::any`] gates processing; the other flags are diagnostic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Plausibility {
    /// Plausibly uncompressed, convenience alphas allowed for the primary key
    pub uncompressed_with_alphas: bool,
    /// Plausibly uncompressed with a numeric primary key
    pub uncompressed: bool,
    /// Plausibly compressed (a weaker test than the other two)
    pub compressed: bool,
    /// `uncompressed_with_alphas || compressed`
    pub any: bool,
    /// `uncompressed || compressed`
    pub any_no_alphas: bool,
}

/// Test whether `s` plausibly is, or definitely is not, a GS1 Digital Link URI.
///
/// If `any` is false the string is definitely not a Digital Link URI.
pub fn is_plausible_gs1_dl_uri(s: &str) -> Plausibility {
    let uncompressed_with_alphas = DL_UNCOMPRESSED_WITH_ALPHAS_RE.is_match(s);
    let uncompressed = DL_UNCOMPRESSED_RE.is_match(s);
    let compressed = DL_COMPRESSED_RE.is_match(s);
    Plausibility {
        uncompressed_with_alphas,
        uncompressed,
        compressed,
        any: uncompressed_with_alphas || compressed,
        any_no_alphas: uncompressed || compressed,
    }
}

/// True for 8, 12, 13 or 14 digits and nothing else
pub fn is_bare_gtin(s: &str) -> bool {
    GTIN_RE.is_match(s)
}

/// A raw scan rewritten into something the toolkit can convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedScan {
    /// Text handed to the canonicalizer
    pub text: String,
    /// The scan was a bare GTIN and has been rewritten as `(01)<gtin>`.
    /// Its value is pure digits, so reserved-character escaping is skipped.
    pub gtin_shortcut: bool,
}

/// Apply the bare-GTIN shortcut, or strip a leading group separator left by
/// scanners that transmit FNC1 in first position.
///
/// GTIN-8, GTIN-12 and GTIN-13 are zero-padded to 14 digits.
pub fn prepare_scan(raw: &str) -> PreparedScan {
    if is_bare_gtin(raw) {
        return PreparedScan {
            text: format!("(01){:0>14}", raw),
            gtin_shortcut: true,
        };
    }
    let text = raw.strip_prefix(GROUP_SEPARATOR).unwrap_or(raw);
    PreparedScan {
        text: text.to_string(),
        gtin_shortcut: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_gtin_lengths() {
        assert!(is_bare_gtin("12345670"));
        assert!(is_bare_gtin("012345678905"));
        assert!(is_bare_gtin("4006381333931"));
        assert!(is_bare_gtin("01234567890128"));
        assert!(!is_bare_gtin("123456789"));
        assert!(!is_bare_gtin("123456789012345"));
        assert!(!is_bare_gtin("(01)01234567890128"));
    }

    #[test]
    fn test_prepare_gtin_shortcut() {
        let prepared = prepare_scan("01234567890128");
        assert_eq!(prepared.text, "(01)01234567890128");
        assert!(prepared.gtin_shortcut);
    }

    #[test]
    fn test_prepare_pads_short_gtins() {
        assert_eq!(prepare_scan("12345670").text, "(01)00000012345670");
        assert_eq!(prepare_scan("012345678905").text, "(01)00012345678905");
        assert_eq!(prepare_scan("4006381333931").text, "(01)04006381333931");
    }

    #[test]
    fn test_prepare_strips_leading_group_separator() {
        let prepared = prepare_scan("\u{1d}0101234567890128\u{1d}10ABC");
        assert_eq!(prepared.text, "0101234567890128\u{1d}10ABC");
        assert!(!prepared.gtin_shortcut);
    }

    #[test]
    fn test_prepare_keeps_inner_group_separators() {
        let prepared = prepare_scan("10ABC\u{1d}21XYZ");
        assert_eq!(prepared.text, "10ABC\u{1d}21XYZ");
    }

    #[test]
    fn test_uncompressed_numeric() {
        let p = is_plausible_gs1_dl_uri("https://id.gs1.org/01/09506000134352/10/ABC123?17=290101");
        assert!(p.uncompressed_with_alphas);
        assert!(p.uncompressed);
        assert!(p.any);
        assert!(p.any_no_alphas);
    }

    #[test]
    fn test_uncompressed_with_convenience_alpha() {
        let p = is_plausible_gs1_dl_uri("https://example.com/gtin/09506000134352/lot/ABC123");
        assert!(p.uncompressed_with_alphas);
        assert!(!p.uncompressed);
        assert!(p.any);
    }

    #[test]
    fn test_compressed() {
        let p = is_plausible_gs1_dl_uri("https://id.gs1.org/AQnYUc1gmiAyAiqeb8A");
        assert!(p.compressed);
        assert!(!p.uncompressed_with_alphas);
        assert!(p.any);
    }

    #[test]
    fn test_element_strings_are_not_plausible() {
        for s in ["(01)09506000134352(10)ABC", "0109506000134352", "not a gs1 string"] {
            let p = is_plausible_gs1_dl_uri(s);
            assert!(!p.any, "{} should not be a Digital Link", s);
            assert!(!p.any_no_alphas);
        }
    }

    #[test]
    fn test_plausible_is_not_valid() {
        // Passes the pattern, but 0950 is not a valid GTIN; parsing decides.
        let p = is_plausible_gs1_dl_uri("http://x/01/0950junk");
        assert!(p.any);
    }
}
