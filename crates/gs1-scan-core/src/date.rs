//! GS1 date normalizer - `YYMMDD` to ISO 8601
//!
//! Two-digit years are resolved with the GS1 sliding window: a year more than
//! 50 years ahead of the reference year belongs to the previous century, one
//! 50 or more years behind belongs to the next. Day `00` means "unknown day"
//! and is dropped from the output. Only the shape is validated: `500099`
//! still yields `2050-00-99`.

use chrono::Datelike;

/// AIs whose values are `YYMMDD` dates
pub const DATE_AIS: [&str; 5] = ["11", "12", "13", "15", "17"];

pub fn is_date_ai(ai: &str) -> bool {
    DATE_AIS.contains(&ai)
}

/// The current calendar year, used as the window reference
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Convert a GS1 date using the current year as reference.
///
/// Returns an empty string for anything other than exactly six digits.
pub fn gs1_to_iso(gs1_date: &str) -> String {
    gs1_to_iso_with_year(gs1_date, current_year())
}

/// Convert a GS1 date against an explicit reference year
pub fn gs1_to_iso_with_year(gs1_date: &str, reference_year: i32) -> String {
    if gs1_date.len() != 6 || !gs1_date.bytes().all(|b| b.is_ascii_digit()) {
        return String::new();
    }
    let (yy, rest) = gs1_date.split_at(2);
    let (mm, dd) = rest.split_at(2);

    let Ok(year) = yy.parse::<i32>() else {
        return String::new();
    };
    let current_century = reference_year.div_euclid(100);
    let diff = year - reference_year.rem_euclid(100);
    let century = match diff {
        51..=99 => current_century - 1,
        -99..=-50 => current_century + 1,
        _ => current_century,
    };

    let mut iso = format!("{:04}-{}", century * 100 + year, mm);
    if dd != "00" {
        iso.push('-');
        iso.push_str(dd);
    }
    iso
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_century() {
        assert_eq!(gs1_to_iso_with_year("210101", 2024), "2021-01-01");
        assert_eq!(gs1_to_iso_with_year("290615", 2024), "2029-06-15");
        assert_eq!(gs1_to_iso_with_year("050310", 2024), "2005-03-10");
    }

    #[test]
    fn test_window_looks_back() {
        // 99 - 24 = 75: more than 50 years ahead, so last century
        assert_eq!(gs1_to_iso_with_year("991200", 2024), "1999-12");
        assert_eq!(gs1_to_iso_with_year("750101", 2024), "1975-01-01");
        assert_eq!(gs1_to_iso_with_year("740101", 2024), "2074-01-01");
    }

    #[test]
    fn test_window_looks_ahead() {
        // 10 - 85 = -75: more than 50 years behind, so next century
        assert_eq!(gs1_to_iso_with_year("100101", 2085), "2110-01-01");
        assert_eq!(gs1_to_iso_with_year("350101", 2085), "2135-01-01");
        assert_eq!(gs1_to_iso_with_year("360101", 2085), "2036-01-01");
    }

    #[test]
    fn test_unknown_day_is_omitted() {
        assert_eq!(gs1_to_iso_with_year("290600", 2024), "2029-06");
    }

    #[test]
    fn test_no_calendar_validation() {
        assert_eq!(gs1_to_iso_with_year("500099", 2024), "2050-00-99");
        assert_eq!(gs1_to_iso_with_year("251340", 2024), "2025-13-40");
    }

    #[test]
    fn test_malformed_input_is_empty() {
        for input in ["", "12345", "1234567", "12a456", "２１０１０１"] {
            assert_eq!(gs1_to_iso_with_year(input, 2024), "", "{:?}", input);
        }
    }

    #[test]
    fn test_four_digit_year() {
        assert_eq!(gs1_to_iso_with_year("010101", 2000), "2001-01-01");
        assert_eq!(gs1_to_iso_with_year("000000", 2000), "2000-00");
    }

    #[test]
    fn test_current_year_reference() {
        let year = current_year();
        let yy = format!("{:02}", year.rem_euclid(100));
        assert_eq!(gs1_to_iso(&format!("{}0101", yy)), format!("{}-01-01", year));
    }

    #[test]
    fn test_date_ais() {
        assert!(is_date_ai("17"));
        assert!(!is_date_ai("16"));
        assert!(!is_date_ai("7003"));
    }
}
