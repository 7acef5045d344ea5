use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Transform, TransformProvider};
use crate::utils::{render_number, DATE_FORMATS};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

/// Transforms for museum collection records: encoded keys, unit
/// conversion, date ranges and label casing.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionsProvider;

impl TransformProvider for CollectionsProvider {
    fn name(&self) -> &str {
        "collections"
    }

    fn lookup(&self, name: &str) -> Option<Transform> {
        let transform: Transform = match name {
            "encodevalue" => Arc::new(encode_value),
            "unittomilliunit" => Arc::new(unit_to_milliunit),
            "formatearliestdateasxsddate" => Arc::new(|input: &str| format_xsd_date(input, 1, 1)),
            "formatlatestdateasxsddate" => Arc::new(|input: &str| format_xsd_date(input, 12, 31)),
            "settitlecase" => Arc::new(title_case),
            _ => return None,
        };
        Some(transform)
    }
}

fn encode_value(input: &str) -> String {
    input.replace([' ', '.'], "_").trim().to_string()
}

fn unit_to_milliunit(input: &str) -> String {
    match input.trim().parse::<f64>() {
        Ok(value) => render_number(value / 1000.0),
        Err(_) => {
            tracing::warn!("unittomilliunit: '{}' is not a number", input);
            String::new()
        }
    }
}

/// Dates come in two shapes: production dates known to the year (`1984`,
/// `1100 BC`) which are pinned to `month`/`day`, and full acquisition dates
/// (`23 May 2012`) which are reformatted as they are.
fn format_xsd_date(input: &str, month: u32, day: u32) -> String {
    if input.is_empty() {
        return String::new();
    }
    if input.contains("BC") || input.contains("thC") || input.chars().count() == 4 {
        format_production_date(input, month, day)
    } else {
        format_acquisition_date(input)
    }
}

fn format_production_date(input: &str, month: u32, day: u32) -> String {
    let is_bc = input.trim().to_lowercase().contains("bc");
    let year = if is_bc {
        DIGITS.find(input).map(|m| m.as_str()).unwrap_or_default()
    } else {
        input.trim()
    };
    match year.parse::<i32>() {
        Ok(year) => format!(
            "{}{:04}-{:02}-{:02}",
            if is_bc { "-" } else { "" },
            year,
            month,
            day
        ),
        Err(_) => String::new(),
    }
}

fn format_acquisition_date(input: &str) -> String {
    let trimmed = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| {
            tracing::warn!("Unrecognized date '{}'", input);
            String::new()
        })
}

/// Capitalize each word and lowercase the rest, leaving all-caps words
/// (acronyms) alone.
fn title_case(input: &str) -> String {
    WORD.replace_all(input, |caps: &regex::Captures| {
        let word = &caps[0];
        let has_letters = word.chars().any(char::is_alphabetic);
        if has_letters && !word.chars().any(char::is_lowercase) {
            return word.to_string();
        }
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(name: &str, input: &str) -> String {
        CollectionsProvider.lookup(name).unwrap()(input)
    }

    #[test]
    fn test_encode_value() {
        assert_eq!(apply("encodevalue", "Dept. of Coins"), "Dept__of_Coins");
    }

    #[test]
    fn test_unit_to_milliunit() {
        assert_eq!(apply("unittomilliunit", "1500"), "1.5");
        assert_eq!(apply("unittomilliunit", "3000"), "3");
        assert_eq!(apply("unittomilliunit", "n/a"), "");
    }

    #[test]
    fn test_production_dates() {
        assert_eq!(apply("formatearliestdateasxsddate", "1984"), "1984-01-01");
        assert_eq!(apply("formatlatestdateasxsddate", "1984"), "1984-12-31");
        assert_eq!(apply("formatearliestdateasxsddate", "1100 BC"), "-1100-01-01");
        assert_eq!(apply("formatlatestdateasxsddate", "13thC"), "");
    }

    #[test]
    fn test_acquisition_dates() {
        assert_eq!(apply("formatearliestdateasxsddate", "23 May 2012"), "2012-05-23");
        assert_eq!(apply("formatlatestdateasxsddate", "2012-05-25"), "2012-05-25");
        assert_eq!(apply("formatlatestdateasxsddate", "someday"), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(apply("settitlecase", "the ROMAN empire  coins"), "The ROMAN Empire  Coins");
        assert_eq!(apply("settitlecase", "vASE"), "Vase");
    }

    #[test]
    fn test_unknown_name() {
        assert!(CollectionsProvider.lookup("md5").is_none());
    }
}
