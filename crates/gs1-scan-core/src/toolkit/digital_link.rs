//! Uncompressed GS1 Digital Link URIs - building and parsing
//!
//! Layout: `{domain}/{key}/{value}[/{qualifier}/{value}...][?{ai}={value}&...]`.
//! The key and its qualifiers live in the path, in qualifier-table order;
//! every other AI goes in the query string. Query parameters that are not
//! numeric AIs are carried through as non-GS1 extensions.

use super::ai_table::{AiKind, AiRecord, AiTable};
use super::element::{decode_value, validate_value};
use super::{AiValueMap, Extraction};
use crate::{Error, Result};

/// Build a Digital Link URI from decoded `(ai, value)` pairs.
///
/// At most one primary identification key is allowed. Without one, every AI
/// goes in the query string of the bare domain.
pub fn build_digital_link(
    pairs: &[(String, String)],
    table: &dyn AiTable,
    use_short_text: bool,
    domain: &str,
) -> Result<String> {
    let mut primary: Option<&AiRecord> = None;
    for (ai, _) in pairs {
        let record = table.lookup(ai).ok_or_else(|| Error::UnknownAi(ai.clone()))?;
        if record.kind == AiKind::Identifier {
            if let Some(existing) = primary {
                return Err(Error::ConversionFailed(format!(
                    "More than one primary identification key: ({}) and ({})",
                    existing.ai, record.ai
                )));
            }
            primary = Some(record);
        }
    }

    let values: AiValueMap = pairs.iter().cloned().collect();
    let path_key = |record: &AiRecord| -> String {
        match (&record.short_name, use_short_text) {
            (Some(name), true) => name.clone(),
            _ => record.ai.clone(),
        }
    };

    let mut uri = domain.trim_end_matches('/').to_string();
    let mut in_path: Vec<&str> = Vec::new();
    match primary {
        Some(primary) => {
            push_segment(&mut uri, &path_key(primary), &values[&primary.ai]);
            in_path.push(primary.ai.as_str());
            for qualifier in table.qualifiers(&primary.ai).unwrap_or_default() {
                if let Some(value) = values.get(qualifier) {
                    let record = table
                        .lookup(qualifier)
                        .ok_or_else(|| Error::UnknownAi(qualifier.clone()))?;
                    push_segment(&mut uri, &path_key(record), value);
                    in_path.push(qualifier.as_str());
                }
            }
        }
        None => uri.push('/'),
    }

    let query: Vec<String> = values
        .iter()
        .filter(|(ai, _)| !in_path.contains(&ai.as_str()))
        .map(|(ai, value)| format!("{}={}", ai, urlencoding::encode(value)))
        .collect();
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(&query.join("&"));
    }
    Ok(uri)
}

fn push_segment(uri: &mut String, key: &str, value: &str) {
    uri.push('/');
    uri.push_str(key);
    uri.push('/');
    uri.push_str(&urlencoding::encode(value));
}

/// Parse an uncompressed Digital Link URI into GS1 and extension maps
pub fn parse_digital_link(uri: &str, table: &dyn AiTable) -> Result<Extraction> {
    let parsed = url::Url::parse(uri)
        .map_err(|e| Error::ConversionFailed(format!("Invalid URI '{}': {}", uri, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::ConversionFailed(format!(
            "GS1 Digital Link URIs must use http or https, found '{}'",
            parsed.scheme()
        )));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|split| split.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let key_start = segments
        .iter()
        .enumerate()
        .filter(|(idx, _)| (segments.len() - idx) % 2 == 0)
        .find_map(|(idx, segment)| {
            resolve_key(segment, table)
                .filter(|record| record.kind == AiKind::Identifier)
                .map(|record| (idx, record))
        });

    let mut extraction = Extraction::default();
    match key_start {
        Some((start, primary)) => {
            insert_value(&mut extraction.gs1, primary, segments[start + 1])?;
            insert_qualifiers(&mut extraction.gs1, primary, &segments[start + 2..], table)?;
        }
        // Attribute-only URIs have an empty path; anything else must carry a key.
        None if segments.is_empty() => {}
        None => {
            return Err(Error::ConversionFailed(format!(
                "No GS1 primary identification key found in the path of '{}'",
                uri
            )))
        }
    }

    for param in parsed.query().unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = param.split_once('=').unwrap_or((param, ""));
        if !raw_key.is_empty() && raw_key.chars().all(|c| c.is_ascii_digit()) {
            let record = table
                .lookup(raw_key)
                .ok_or_else(|| Error::UnknownAi(raw_key.to_string()))?;
            if record.kind == AiKind::Identifier {
                return Err(Error::ConversionFailed(format!(
                    "Primary identification key ({}) is not allowed in the query string",
                    record.ai
                )));
            }
            insert_value(&mut extraction.gs1, record, raw_value)?;
        } else {
            let key = decode_value(raw_key, raw_key)?;
            let value = decode_value(raw_key, raw_value)?;
            extraction.other.insert(key, value);
        }
    }

    if extraction.gs1.is_empty() {
        return Err(Error::ConversionFailed(format!(
            "No GS1 Application Identifiers found in '{}'",
            uri
        )));
    }
    Ok(extraction)
}

fn insert_qualifiers(
    map: &mut AiValueMap,
    primary: &AiRecord,
    segments: &[&str],
    table: &dyn AiTable,
) -> Result<()> {
    let qualifiers = table.qualifiers(&primary.ai).unwrap_or_default();
    let mut last_position: Option<usize> = None;
    for pair in segments.chunks(2) {
        let record = resolve_key(pair[0], table).ok_or_else(|| Error::UnknownAi(pair[0].to_string()))?;
        let position = qualifiers.iter().position(|q| *q == record.ai).ok_or_else(|| {
            Error::ConversionFailed(format!(
                "AI ({}) is not a key qualifier of ({})",
                record.ai, primary.ai
            ))
        })?;
        if last_position.is_some_and(|last| position <= last) {
            return Err(Error::ConversionFailed(format!(
                "Key qualifier ({}) is out of order after ({})",
                record.ai, primary.ai
            )));
        }
        last_position = Some(position);
        insert_value(map, record, pair[1])?;
    }
    Ok(())
}

fn resolve_key<'t>(segment: &str, table: &'t dyn AiTable) -> Option<&'t AiRecord> {
    if segment.chars().all(|c| c.is_ascii_digit()) {
        table.lookup(segment)
    } else {
        table.lookup_short_name(segment)
    }
}

fn insert_value(map: &mut AiValueMap, record: &AiRecord, raw: &str) -> Result<()> {
    let mut value = decode_value(&record.ai, raw)?;
    if record.ai == "01" && matches!(value.len(), 8 | 12 | 13) && value.bytes().all(|b| b.is_ascii_digit()) {
        value = format!("{:0>14}", value);
    }
    validate_value(record, &value)?;
    if map.insert(record.ai.clone(), value).is_some() {
        return Err(Error::ConversionFailed(format!(
            "AI ({}) appears more than once",
            record.ai
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::StaticAiTable;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(a, v)| (a.to_string(), v.to_string())).collect()
    }

    fn parse(uri: &str) -> Result<Extraction> {
        parse_digital_link(uri, StaticAiTable::builtin())
    }

    #[test]
    fn test_build_orders_path_and_query() {
        let uri = build_digital_link(
            &pairs(&[("17", "290101"), ("21", "XYZ"), ("01", "09506000134352"), ("10", "ABC")]),
            StaticAiTable::builtin(),
            false,
            "https://id.gs1.org/",
        )
        .unwrap();
        assert_eq!(uri, "https://id.gs1.org/01/09506000134352/10/ABC/21/XYZ?17=290101");
    }

    #[test]
    fn test_build_short_text_and_encoding() {
        let uri = build_digital_link(
            &pairs(&[("01", "09506000134352"), ("10", "A/B")]),
            StaticAiTable::builtin(),
            true,
            "https://example.com",
        )
        .unwrap();
        assert_eq!(uri, "https://example.com/gtin/09506000134352/lot/A%2FB");
    }

    #[test]
    fn test_build_without_primary_uses_query_only() {
        let uri = build_digital_link(
            &pairs(&[("17", "290101"), ("10", "ABC")]),
            StaticAiTable::builtin(),
            false,
            "https://id.gs1.org",
        )
        .unwrap();
        assert_eq!(uri, "https://id.gs1.org/?10=ABC&17=290101");
        let extraction = parse(&uri).unwrap();
        assert_eq!(extraction.gs1.len(), 2);
    }

    #[test]
    fn test_build_rejects_two_primaries() {
        let err = build_digital_link(
            &pairs(&[("01", "09506000134352"), ("414", "9506000164908")]),
            StaticAiTable::builtin(),
            false,
            "https://id.gs1.org",
        )
        .unwrap_err();
        assert!(err.to_string().contains("More than one"));
    }

    #[test]
    fn test_parse_path_and_query() {
        let extraction =
            parse("https://id.gs1.org/01/09506000134352/10/ABC/21/XYZ?17=290101&linkType=gs1:pip")
                .unwrap();
        assert_eq!(extraction.gs1["01"], "09506000134352");
        assert_eq!(extraction.gs1["10"], "ABC");
        assert_eq!(extraction.gs1["21"], "XYZ");
        assert_eq!(extraction.gs1["17"], "290101");
        assert_eq!(extraction.other["linkType"], "gs1:pip");
    }

    #[test]
    fn test_parse_path_prefix_and_short_names() {
        let extraction = parse("https://brand.example.com/products/gtin/09506000134352/lot/A%2FB").unwrap();
        assert_eq!(extraction.gs1["01"], "09506000134352");
        assert_eq!(extraction.gs1["10"], "A/B");
        assert!(extraction.other.is_empty());
    }

    #[test]
    fn test_parse_pads_short_gtin() {
        assert_eq!(parse("https://id.gs1.org/01/4006381333931").unwrap().gs1["01"], "04006381333931");
        assert_eq!(parse("https://id.gs1.org/gtin/12345670").unwrap().gs1["01"], "00000012345670");
        assert!(parse("https://id.gs1.org/01/4006381333932").is_err());
        assert!(parse("https://id.gs1.org/01/40063813339").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_qualifier_order() {
        let err = parse("https://id.gs1.org/01/09506000134352/21/XYZ/10/ABC").unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_parse_rejects_foreign_qualifier() {
        let err = parse("https://id.gs1.org/01/09506000134352/8019/123").unwrap_err();
        assert!(err.to_string().contains("not a key qualifier"));
    }

    #[test]
    fn test_parse_rejects_unknown_query_ai() {
        let err = parse("https://id.gs1.org/01/09506000134352?06=1").unwrap_err();
        assert_eq!(err, Error::UnknownAi("06".into()));
    }

    #[test]
    fn test_parse_rejects_bad_check_digit() {
        assert!(parse("https://id.gs1.org/01/09506000134353").is_err());
    }

    #[test]
    fn test_parse_without_primary() {
        assert!(parse("https://id.gs1.org/products/list").is_err());
        assert!(parse("https://id.gs1.org/").is_err());
        assert!(parse("https://id.gs1.org/?01=09506000134352").is_err());
        assert!(parse("ftp://id.gs1.org/01/09506000134352").is_err());
    }

    #[test]
    fn test_build_then_parse() {
        let table = StaticAiTable::builtin();
        let input = pairs(&[("01", "09506000134352"), ("10", "AB&C"), ("3103", "000195")]);
        let uri = build_digital_link(&input, table, false, "https://id.gs1.org").unwrap();
        let extraction = parse_digital_link(&uri, table).unwrap();
        let expected: AiValueMap = input.into_iter().collect();
        assert_eq!(extraction.gs1, expected);
    }
}
