//! Built-in parsers.
//!
//! Text parsers leave non-string values untouched. Numeric and boolean
//! conversions let `Null` through, so a missing field stays empty instead of
//! failing the record.

use crate::parsers::{ParseError, ParserRegistry};
use crate::record::RecordValue;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use convert_case::{Case, Casing};
use regex::Regex;
use std::sync::OnceLock;

/// Default format accepted by the `to_date` parser
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default format accepted by the `to_datetime` parser
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

fn whitespace_run() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Trim a string and collapse every internal whitespace run to one space
pub fn normalize_str(s: &str) -> String {
    whitespace_run().replace_all(s.trim(), " ").into_owned()
}

fn invalid(expected: &'static str, value: &RecordValue) -> ParseError {
    ParseError::InvalidValue {
        expected,
        found: format!("{} `{}`", value.type_name(), value),
    }
}

fn map_str(value: RecordValue, f: impl Fn(&str) -> String) -> RecordValue {
    match value {
        RecordValue::String(s) => RecordValue::String(f(&s)),
        other => other,
    }
}

/// Trim surrounding whitespace; `Null` becomes an empty string
pub fn clean_string(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(match value {
        RecordValue::Null => RecordValue::String(String::new()),
        other => map_str(other, |s| s.trim().to_string()),
    })
}

/// Trim and collapse internal whitespace
pub fn normalize_whitespace(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(map_str(value, normalize_str))
}

pub fn trim(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(map_str(value, |s| s.trim().to_string()))
}

pub fn lowercase(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(map_str(value, str::to_lowercase))
}

pub fn uppercase(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(map_str(value, str::to_uppercase))
}

/// `first_name` -> `firstName`
pub fn to_camel_case(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(map_str(value, |s| s.to_case(Case::Camel)))
}

/// `firstName` -> `first_name`
pub fn to_snake_case(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(map_str(value, |s| s.to_case(Case::Snake)))
}

/// `"Yes"` (any case) is true; anything else, including empty, is false
pub fn yes_no_to_bool(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(match value {
        RecordValue::String(s) => RecordValue::Bool(s.trim().eq_ignore_ascii_case("yes")),
        RecordValue::Bool(b) => RecordValue::Bool(b),
        _ => RecordValue::Bool(false),
    })
}

/// Empty or whitespace-only strings become `Null`
pub fn empty_to_null(value: RecordValue) -> Result<RecordValue, ParseError> {
    Ok(match value {
        RecordValue::String(s) if s.trim().is_empty() => RecordValue::Null,
        other => other,
    })
}

pub fn to_int(value: RecordValue) -> Result<RecordValue, ParseError> {
    match value {
        RecordValue::Null | RecordValue::Int(_) => Ok(value),
        RecordValue::Bool(b) => Ok(RecordValue::Int(b as i64)),
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
        RecordValue::Float(f)
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
        {
            Ok(RecordValue::Int(f as i64))
        }
        RecordValue::String(ref s) => s
            .trim()
            .parse::<i64>()
            .map(RecordValue::Int)
            .map_err(|_| invalid("integer", &value)),
        _ => Err(invalid("integer", &value)),
    }
}

pub fn to_float(value: RecordValue) -> Result<RecordValue, ParseError> {
    match value {
        RecordValue::Null | RecordValue::Float(_) => Ok(value),
        RecordValue::Int(i) => Ok(RecordValue::Float(i as f64)),
        RecordValue::String(ref s) => s
            .trim()
            .parse::<f64>()
            .map(RecordValue::Float)
            .map_err(|_| invalid("float", &value)),
        _ => Err(invalid("float", &value)),
    }
}

pub fn to_bool(value: RecordValue) -> Result<RecordValue, ParseError> {
    match value {
        RecordValue::Null | RecordValue::Bool(_) => Ok(value),
        RecordValue::Int(i) => Ok(RecordValue::Bool(i != 0)),
        RecordValue::String(ref s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Ok(RecordValue::Bool(true)),
            "false" | "0" | "no" | "n" | "off" | "" => Ok(RecordValue::Bool(false)),
            _ => Err(invalid("boolean", &value)),
        },
        _ => Err(invalid("boolean", &value)),
    }
}

/// Parser: parse a date in `format`, emitting an ISO `YYYY-MM-DD` string.
///
/// Unparseable or empty input yields `Null`.
pub fn date_format(
    format: impl Into<String>,
) -> impl Fn(RecordValue) -> Result<RecordValue, ParseError> + Send + Sync + Clone {
    let format = format.into();
    move |value: RecordValue| {
        Ok(match value {
            RecordValue::String(s) => NaiveDate::parse_from_str(s.trim(), &format)
                .map(|d| RecordValue::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(RecordValue::Null),
            _ => RecordValue::Null,
        })
    }
}

/// Parser: parse a UTC timestamp in `format`, emitting RFC 3339.
///
/// Unparseable or empty input yields `Null`.
pub fn datetime_format(
    format: impl Into<String>,
) -> impl Fn(RecordValue) -> Result<RecordValue, ParseError> + Send + Sync + Clone {
    let format = format.into();
    move |value: RecordValue| {
        Ok(match value {
            RecordValue::String(s) => NaiveDateTime::parse_from_str(s.trim(), &format)
                .map(|dt| RecordValue::String(Utc.from_utc_datetime(&dt).to_rfc3339()))
                .unwrap_or(RecordValue::Null),
            _ => RecordValue::Null,
        })
    }
}

/// Parser: replace `Null` with a fixed value
pub fn default_value(
    default: RecordValue,
) -> impl Fn(RecordValue) -> Result<RecordValue, ParseError> + Send + Sync + Clone {
    move |value: RecordValue| {
        Ok(if value.is_null() {
            default.clone()
        } else {
            value
        })
    }
}

/// Register every built-in parser under its public name
pub fn register_builtins(registry: &mut ParserRegistry) {
    registry.register("clean_string", clean_string);
    registry.register("normalize_whitespace", normalize_whitespace);
    registry.register("trim", trim);
    registry.register("lowercase", lowercase);
    registry.register("uppercase", uppercase);
    registry.register("to_camel_case", to_camel_case);
    registry.register("to_snake_case", to_snake_case);
    registry.register("yes_no_to_bool", yes_no_to_bool);
    registry.register("empty_to_null", empty_to_null);
    registry.register("to_int", to_int);
    registry.register("to_float", to_float);
    registry.register("to_bool", to_bool);
    registry.register("to_date", date_format(DEFAULT_DATE_FORMAT));
    registry.register("to_datetime", datetime_format(DEFAULT_DATETIME_FORMAT));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> RecordValue {
        RecordValue::string(v)
    }

    #[test]
    fn test_normalize_str() {
        assert_eq!(normalize_str("  Jane   Doe  "), "Jane Doe");
        assert_eq!(normalize_str("a\t\nb"), "a b");
        assert_eq!(normalize_str("   "), "");
    }

    #[test]
    fn test_clean_string() {
        assert_eq!(clean_string(s("  hi ")).unwrap(), s("hi"));
        assert_eq!(clean_string(RecordValue::Null).unwrap(), s(""));
        assert_eq!(clean_string(RecordValue::Int(3)).unwrap(), RecordValue::Int(3));
    }

    #[test]
    fn test_case_parsers() {
        assert_eq!(lowercase(s("MiXeD")).unwrap(), s("mixed"));
        assert_eq!(uppercase(s("MiXeD")).unwrap(), s("MIXED"));
        assert_eq!(to_camel_case(s("first_name")).unwrap(), s("firstName"));
        assert_eq!(to_snake_case(s("firstName")).unwrap(), s("first_name"));
    }

    #[test]
    fn test_text_parsers_pass_non_strings() {
        assert_eq!(trim(RecordValue::Int(1)).unwrap(), RecordValue::Int(1));
        assert_eq!(lowercase(RecordValue::Null).unwrap(), RecordValue::Null);
    }

    #[test]
    fn test_yes_no_to_bool() {
        assert_eq!(yes_no_to_bool(s("Yes")).unwrap(), RecordValue::Bool(true));
        assert_eq!(yes_no_to_bool(s("no")).unwrap(), RecordValue::Bool(false));
        assert_eq!(yes_no_to_bool(s("")).unwrap(), RecordValue::Bool(false));
        assert_eq!(yes_no_to_bool(RecordValue::Null).unwrap(), RecordValue::Bool(false));
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(s(" 42 ")).unwrap(), RecordValue::Int(42));
        assert_eq!(to_int(RecordValue::Float(3.0)).unwrap(), RecordValue::Int(3));
        assert_eq!(to_int(RecordValue::Null).unwrap(), RecordValue::Null);
        assert!(to_int(s("forty")).is_err());
        assert!(to_int(RecordValue::Float(3.5)).is_err());
    }

    #[test]
    fn test_to_int_rejects_out_of_range_floats() {
        assert!(to_int(RecordValue::Float(1e20)).is_err());
        assert!(to_int(RecordValue::Float(-1e20)).is_err());
        assert!(to_int(RecordValue::Float(f64::INFINITY)).is_err());
        assert!(to_int(RecordValue::Float(f64::NAN)).is_err());

        // u64 values past i64::MAX arrive as floats
        let big: RecordValue = serde_json::from_str("18446744073709551615").unwrap();
        assert!(matches!(big, RecordValue::Float(_)));
        assert!(matches!(
            to_int(big),
            Err(ParseError::InvalidValue { expected: "integer", .. })
        ));

        assert_eq!(
            to_int(RecordValue::Float(-9.0e18)).unwrap(),
            RecordValue::Int(-9_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(s("2.5")).unwrap(), RecordValue::Float(2.5));
        assert_eq!(to_float(RecordValue::Int(2)).unwrap(), RecordValue::Float(2.0));
        assert!(to_float(s("abc")).is_err());
    }

    #[test]
    fn test_to_bool() {
        assert_eq!(to_bool(s("TRUE")).unwrap(), RecordValue::Bool(true));
        assert_eq!(to_bool(s("0")).unwrap(), RecordValue::Bool(false));
        assert_eq!(to_bool(RecordValue::Int(5)).unwrap(), RecordValue::Bool(true));
        assert!(to_bool(s("maybe")).is_err());
    }

    #[test]
    fn test_empty_to_null() {
        assert_eq!(empty_to_null(s("  ")).unwrap(), RecordValue::Null);
        assert_eq!(empty_to_null(s("x")).unwrap(), s("x"));
    }

    #[test]
    fn test_to_date() {
        let parse = date_format(DEFAULT_DATE_FORMAT);
        assert_eq!(parse(s("2024-01-15")).unwrap(), s("2024-01-15"));
        assert_eq!(parse(s("15/01/2024")).unwrap(), RecordValue::Null);
        assert_eq!(parse(s("")).unwrap(), RecordValue::Null);

        let dmy = date_format("%d/%m/%Y");
        assert_eq!(dmy(s("15/01/2024")).unwrap(), s("2024-01-15"));
    }

    #[test]
    fn test_to_datetime() {
        let parse = datetime_format(DEFAULT_DATETIME_FORMAT);
        assert_eq!(
            parse(s("2024-01-15T10:30:00.000Z")).unwrap(),
            s("2024-01-15T10:30:00+00:00")
        );
        assert_eq!(parse(s("yesterday")).unwrap(), RecordValue::Null);
    }

    #[test]
    fn test_default_value() {
        let parse = default_value(RecordValue::Int(0));
        assert_eq!(parse(RecordValue::Null).unwrap(), RecordValue::Int(0));
        assert_eq!(parse(RecordValue::Int(7)).unwrap(), RecordValue::Int(7));
    }
}
