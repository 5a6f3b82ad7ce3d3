//! Element string parsing and value validation
//!
//! Handles both surface forms of a GS1 element string:
//!
//! - bracketed: `(01)09506000134352(10)ABC123`
//! - FNC1: `0109506000134352` `10ABC123` `<GS>` `21...`
//!
//! Values arrive percent-escaped (reserved characters as `%XX`) and are
//! decoded before validation.

use std::collections::BTreeSet;

use super::ai_table::{AiRecord, AiTable};
use crate::{Error, Result};

/// Longest AI code in the GS1 system
const MAX_AI_LEN: usize = 4;

/// Compute the GS1 mod-10 check digit for `body` (digits without the check digit)
pub fn check_digit(body: &str) -> Option<u32> {
    let mut sum = 0;
    for (idx, c) in body.chars().rev().enumerate() {
        let d = c.to_digit(10)?;
        sum += if idx % 2 == 0 { d * 3 } else { d };
    }
    Some((10 - sum % 10) % 10)
}

/// True if the last digit of `digits` is the mod-10 check digit of the rest
pub fn has_valid_check_digit(digits: &str) -> bool {
    let Some((body, last)) = digits.len().checked_sub(1).map(|n| digits.split_at(n)) else {
        return false;
    };
    match (check_digit(body), last.chars().next().and_then(|c| c.to_digit(10))) {
        (Some(expected), Some(found)) => expected == found,
        _ => false,
    }
}

/// Validate a decoded value against its AI record
pub fn validate_value(record: &AiRecord, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len < record.min_length || len > record.max_length {
        let expected = if record.min_length == record.max_length {
            format!("{}", record.max_length)
        } else {
            format!("{} to {}", record.min_length, record.max_length)
        };
        return Err(Error::ConversionFailed(format!(
            "Value for AI ({}) has length {}, expected {} characters",
            record.ai, len, expected
        )));
    }
    if let Some(bad) = value.chars().find(|&c| !record.charset.allows(c)) {
        return Err(Error::ConversionFailed(format!(
            "Invalid character '{}' in value for AI ({})",
            bad, record.ai
        )));
    }
    if let Some(span) = record.check_digit {
        let digits = value.get(..span).unwrap_or(value);
        if !digits.chars().all(|c| c.is_ascii_digit()) || !has_valid_check_digit(digits) {
            return Err(Error::ConversionFailed(format!(
                "Invalid check digit in value for AI ({}): {}",
                record.ai, value
            )));
        }
    }
    Ok(())
}

/// Decode a percent-escaped value
pub fn decode_value(ai: &str, raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .map_err(|e| Error::ConversionFailed(format!("Value for AI ({}) is not valid UTF-8: {}", ai, e)))
}

/// Parse an element string into `(ai, decoded value)` pairs in input order.
///
/// Every AI must be known to `table`, every value must validate, and no AI
/// may appear twice.
pub fn parse_element_string(
    input: &str,
    table: &dyn AiTable,
    group_separator: char,
) -> Result<Vec<(String, String)>> {
    let raw = if input.starts_with('(') {
        parse_bracketed(input, table)?
    } else if input.starts_with(|c: char| c.is_ascii_digit()) {
        parse_fnc1(input, table, group_separator)?
    } else {
        return Err(Error::InvalidFormat(format!(
            "'{}' is neither a GS1 element string nor a GS1 Digital Link URI",
            input
        )));
    };

    let mut seen = BTreeSet::new();
    let mut pairs = Vec::with_capacity(raw.len());
    for (ai, raw_value) in raw {
        if !seen.insert(ai.clone()) {
            return Err(Error::ConversionFailed(format!("AI ({}) appears more than once", ai)));
        }
        let record = table.lookup(&ai).ok_or_else(|| Error::UnknownAi(ai.clone()))?;
        let value = decode_value(&ai, &raw_value)?;
        validate_value(record, &value)?;
        pairs.push((ai, value));
    }
    Ok(pairs)
}

fn parse_bracketed(input: &str, table: &dyn AiTable) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let body = rest.strip_prefix('(').ok_or_else(|| {
            Error::InvalidFormat(format!("Expected '(' before AI in element string at '{}'", rest))
        })?;
        let close = body
            .find(')')
            .ok_or_else(|| Error::InvalidFormat("Unterminated AI bracket in element string".into()))?;
        let ai = &body[..close];
        if ai.len() < 2 || ai.len() > MAX_AI_LEN || !ai.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidFormat(format!("'({})' is not a valid AI", ai)));
        }
        if table.lookup(ai).is_none() {
            return Err(Error::UnknownAi(ai.to_string()));
        }
        let after = &body[close + 1..];
        let end = after.find('(').unwrap_or(after.len());
        if end == 0 {
            return Err(Error::ConversionFailed(format!("AI ({}) has no value", ai)));
        }
        pairs.push((ai.to_string(), after[..end].to_string()));
        rest = &after[end..];
    }
    Ok(pairs)
}

fn parse_fnc1(input: &str, table: &dyn AiTable, group_separator: char) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let record = match_ai(rest, table).ok_or_else(|| {
            let shown: String = rest.chars().take(MAX_AI_LEN).collect();
            Error::UnknownAi(shown)
        })?;
        let after = &rest[record.ai.len()..];
        let (value, remainder) = if record.fixed_length {
            let split = after
                .char_indices()
                .nth(record.max_length)
                .map(|(idx, _)| idx)
                .unwrap_or(after.len());
            let (value, remainder) = after.split_at(split);
            (value, remainder.strip_prefix(group_separator).unwrap_or(remainder))
        } else {
            match after.find(group_separator) {
                Some(idx) => (&after[..idx], &after[idx + group_separator.len_utf8()..]),
                None => (after, ""),
            }
        };
        if value.is_empty() {
            return Err(Error::ConversionFailed(format!("AI ({}) has no value", record.ai)));
        }
        pairs.push((record.ai.clone(), value.to_string()));
        rest = remainder;
    }
    Ok(pairs)
}

/// GS1 AIs are prefix-free, so the shortest matching code is the only one
fn match_ai<'t>(input: &str, table: &'t dyn AiTable) -> Option<&'t AiRecord> {
    (2..=MAX_AI_LEN)
        .filter_map(|len| input.get(..len))
        .filter(|code| code.chars().all(|c| c.is_ascii_digit()))
        .find_map(|code| table.lookup(code))
}
