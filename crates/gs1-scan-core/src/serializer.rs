//! AI ordering and serialization - the canonical output forms
//!
//! Given an AI Value Map, produce the ordered element list and the two
//! element string syntaxes. Every output is a pure function of the map.
//!
//! # Ordering
//!
//! 1. The primary identification key
//! 2. Its key qualifiers present in the map, in qualifier-table order
//!    (ordered list only)
//! 3. Remaining predefined-length AIs, in map order
//! 4. Everything else, in map order
//! 5. Non-GS1 extension parameters, without label (ordered list only)
//!
//! # FNC1 syntax
//!
//! The primary key is preceded by a group separator (FNC1 in first position).
//! Predefined-length AIs need no separator; every other AI is followed by
//! one, except at the very end of the string.

use crate::date;
use crate::toolkit::{AiKind, AiRecord, AiTable, AiValueMap, ExtensionMap};
use crate::{Error, Result};

/// One interpreted field, in Digital Link order
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrderedElement {
    pub ai: String,
    /// Absent for non-GS1 extension parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
}

/// Bracketed and FNC1 renderings of the same AI Value Map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementStrings {
    pub brackets: String,
    pub fnc1: String,
}

fn record<'t>(table: &'t dyn AiTable, ai: &str) -> Result<&'t AiRecord> {
    table.lookup(ai).ok_or_else(|| Error::UnknownAi(ai.to_string()))
}

/// The primary identification key of `map`, if it has one.
///
/// Fails if any AI in the map is unknown to `table`. When several keys are
/// present the first in map order wins; the others are placed as attributes.
pub fn primary_identifier<'m>(map: &'m AiValueMap, table: &dyn AiTable) -> Result<Option<&'m str>> {
    let mut primary = None;
    for ai in map.keys() {
        if record(table, ai)?.kind == AiKind::Identifier && primary.is_none() {
            primary = Some(ai.as_str());
        }
    }
    Ok(primary)
}

/// AI codes of `map` in output order
fn placement_order<'m>(
    map: &'m AiValueMap,
    table: &dyn AiTable,
    with_qualifiers: bool,
) -> Result<Vec<&'m str>> {
    let primary = primary_identifier(map, table)?;
    let mut placed: Vec<&'m str> = Vec::with_capacity(map.len());

    if let Some(key) = primary {
        placed.push(key);
        if with_qualifiers {
            for qualifier in table.qualifiers(key).unwrap_or_default() {
                if let Some((ai, _)) = map.get_key_value(qualifier) {
                    if !placed.contains(&ai.as_str()) {
                        placed.push(ai);
                    }
                }
            }
        }
    }

    for ai in map.keys() {
        if !placed.contains(&ai.as_str()) && record(table, ai)?.fixed_length {
            placed.push(ai);
        }
    }
    for ai in map.keys() {
        if !placed.contains(&ai.as_str()) {
            placed.push(ai);
        }
    }
    Ok(placed)
}

/// Build the ordered element list.
///
/// Date AIs are shown as ISO 8601, resolved against `reference_year`.
pub fn ordered_elements(
    map: &AiValueMap,
    extensions: &ExtensionMap,
    table: &dyn AiTable,
    reference_year: i32,
) -> Result<Vec<OrderedElement>> {
    let mut elements = Vec::with_capacity(map.len() + extensions.len());
    for ai in placement_order(map, table, true)? {
        let raw = &map[ai];
        let value = if date::is_date_ai(ai) {
            date::gs1_to_iso_with_year(raw, reference_year)
        } else {
            raw.clone()
        };
        elements.push(OrderedElement {
            ai: ai.to_string(),
            label: Some(record(table, ai)?.label.clone()),
            value,
        });
    }
    elements.extend(extensions.iter().map(|(name, value)| OrderedElement {
        ai: name.clone(),
        label: None,
        value: value.clone(),
    }));
    Ok(elements)
}

/// Render `map` as bracketed and FNC1 element strings.
///
/// Values are written raw; dates keep their six-digit form.
pub fn element_strings(map: &AiValueMap, table: &dyn AiTable, group_separator: char) -> Result<ElementStrings> {
    let primary = primary_identifier(map, table)?;
    let mut out = ElementStrings::default();

    for ai in placement_order(map, table, false)? {
        let value = &map[ai];
        out.brackets.push('(');
        out.brackets.push_str(ai);
        out.brackets.push(')');
        out.brackets.push_str(value);

        if Some(ai) == primary {
            out.fnc1.push(group_separator);
        }
        out.fnc1.push_str(ai);
        out.fnc1.push_str(value);
        if !record(table, ai)?.fixed_length {
            out.fnc1.push(group_separator);
        }
    }

    if out.fnc1.ends_with(group_separator) {
        out.fnc1.pop();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::GROUP_SEPARATOR;
    use crate::toolkit::StaticAiTable;

    const GS: char = GROUP_SEPARATOR;

    fn map(items: &[(&str, &str)]) -> AiValueMap {
        items.iter().map(|(a, v)| (a.to_string(), v.to_string())).collect()
    }

    fn table() -> &'static StaticAiTable {
        StaticAiTable::builtin()
    }

    fn ais(elements: &[OrderedElement]) -> Vec<&str> {
        elements.iter().map(|e| e.ai.as_str()).collect()
    }

    #[test]
    fn test_ordering_primary_qualifiers_fixed_rest() {
        let values = map(&[
            ("01", "09506000134352"),
            ("10", "ABC"),
            ("21", "XYZ"),
            ("22", "2A"),
            ("17", "290101"),
            ("3103", "000195"),
            ("400", "PO-1"),
        ]);
        let mut ext = ExtensionMap::new();
        ext.insert("linkType".into(), "gs1:pip".into());

        let elements = ordered_elements(&values, &ext, table(), 2024).unwrap();
        assert_eq!(ais(&elements), ["01", "22", "10", "21", "17", "3103", "400", "linkType"]);
        assert_eq!(elements[0].label.as_deref(), Some("GTIN"));
        assert_eq!(elements[4].value, "2029-01-01");
        assert_eq!(elements[7].label, None);
        assert_eq!(elements[7].value, "gs1:pip");
    }

    #[test]
    fn test_element_strings_order_and_separators() {
        let values = map(&[
            ("01", "09506000134352"),
            ("10", "ABC"),
            ("17", "290101"),
            ("21", "XYZ"),
        ]);
        let strings = element_strings(&values, table(), GS).unwrap();
        assert_eq!(strings.brackets, "(01)09506000134352(17)290101(10)ABC(21)XYZ");
        assert_eq!(
            strings.fnc1,
            format!("{GS}01095060001343521729010110ABC{GS}21XYZ")
        );
    }

    #[test]
    fn test_no_trailing_separator() {
        let values = map(&[("01", "09506000134352"), ("10", "ABC")]);
        let strings = element_strings(&values, table(), GS).unwrap();
        assert!(!strings.fnc1.ends_with(GS));
        assert_eq!(strings.fnc1, format!("{GS}010950600013435210ABC"));
    }

    #[test]
    fn test_variable_length_primary_is_terminated() {
        let values = map(&[("8004", "ASSET1"), ("11", "240101")]);
        let strings = element_strings(&values, table(), GS).unwrap();
        assert_eq!(strings.brackets, "(8004)ASSET1(11)240101");
        assert_eq!(strings.fnc1, format!("{GS}8004ASSET1{GS}11240101"));
    }

    #[test]
    fn test_missing_primary_is_degraded_not_fatal() {
        let values = map(&[("10", "ABC"), ("17", "290101")]);
        assert_eq!(primary_identifier(&values, table()).unwrap(), None);

        let elements = ordered_elements(&values, &ExtensionMap::new(), table(), 2024).unwrap();
        assert_eq!(ais(&elements), ["17", "10"]);

        let strings = element_strings(&values, table(), GS).unwrap();
        assert_eq!(strings.brackets, "(17)290101(10)ABC");
        assert_eq!(strings.fnc1, "1729010110ABC");
    }

    #[test]
    fn test_empty_map() {
        let strings = element_strings(&AiValueMap::new(), table(), GS).unwrap();
        assert_eq!(strings, ElementStrings::default());
        let elements = ordered_elements(&AiValueMap::new(), &ExtensionMap::new(), table(), 2024).unwrap();
        assert!(elements.is_empty());
    }

    #[test]
    fn test_unknown_ai_is_fatal() {
        let values = map(&[("01", "09506000134352"), ("06", "X")]);
        assert_eq!(
            element_strings(&values, table(), GS).unwrap_err(),
            Error::UnknownAi("06".into())
        );
        assert!(ordered_elements(&values, &ExtensionMap::new(), table(), 2024).is_err());
    }

    #[test]
    fn test_qualifier_order_follows_table_not_input() {
        let synthetic = StaticAiTable::new(
            vec![
                AiRecord::new("90", "KEY", AiKind::Identifier).fixed().numeric(2),
                AiRecord::new("91", "SECOND", AiKind::Qualifier),
                AiRecord::new("92", "FIRST", AiKind::Qualifier),
                AiRecord::new("93", "ATTR", AiKind::Data),
            ],
            vec![("90", vec!["92", "91"])],
        );
        let values = map(&[("93", "a"), ("91", "b"), ("92", "c"), ("90", "12")]);
        let elements = ordered_elements(&values, &ExtensionMap::new(), &synthetic, 2024).unwrap();
        assert_eq!(ais(&elements), ["90", "92", "91", "93"]);
    }

    #[test]
    fn test_determinism_100_iterations() {
        let values = map(&[
            ("01", "09506000134352"),
            ("10", "ABC"),
            ("17", "290101"),
            ("3922", "1299"),
        ]);
        let first = element_strings(&values, table(), GS).unwrap();
        for i in 0..100 {
            let result = element_strings(&values, table(), GS).unwrap();
            assert_eq!(first, result, "Non-determinism at iteration {}", i);
        }
    }
}
