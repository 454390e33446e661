//! Compact JSON rendering of envelope claims.
//!
//! Tokens in circulation were issued over claims rendered by the previous
//! deployment's JSON writer, which differs from serde_json's compact output
//! in two places:
//!
//! - `/` is always written as `\/`, in keys and values alike;
//! - numbers that hold a whole value print as integers (`1.0` is `1`), and
//!   other doubles outside `[1e-3, 1e7)` use `1.5E-5` notation.
//!
//! Key order, spacing and all other escapes already agree.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

/// Renders `value` as compact JSON in the legacy writer's dialect.
pub(crate) fn to_vec(value: &serde_json::Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, LegacyFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Compact formatter with the legacy slash escaping and number layout.
#[derive(Debug, Clone, Copy, Default)]
struct LegacyFormatter;

impl Formatter for LegacyFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut rest = fragment;
        while let Some(pos) = rest.find('/') {
            writer.write_all(rest[..pos].as_bytes())?;
            writer.write_all(b"\\/")?;
            rest = &rest[pos + 1..];
        }
        writer.write_all(rest.as_bytes())
    }

    fn write_u64<W>(&mut self, writer: &mut W, value: u64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // Above i64::MAX the legacy parser fell back to a double.
        if value > i64::MAX as u64 {
            return writer.write_all(number_text(value as f64).as_bytes());
        }
        write!(writer, "{value}")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(number_text(value).as_bytes())
    }
}

/// A double as the legacy writer printed it.
fn number_text(value: f64) -> String {
    if value == 0.0 && value.is_sign_negative() {
        return "-0".to_string();
    }
    // Saturating cast, same as the legacy long conversion.
    let truncated = value as i64;
    if value == truncated as f64 {
        return truncated.to_string();
    }
    double_text(value)
}

/// Shortest round-trip digits, plain in `[1e-3, 1e7)`, `d.dddE±n` outside.
fn double_text(value: f64) -> String {
    if (1e-3..1e7).contains(&value.abs()) {
        return value.to_string();
    }
    let sci = format!("{value:e}");
    match sci.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => sci,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: serde_json::Value) -> String {
        String::from_utf8(to_vec(&value).unwrap()).unwrap()
    }

    #[test]
    fn test_slash_is_escaped_in_keys_and_values() {
        assert_eq!(
            render(json!({"url": "https://x.io/a", "a/b": "2024/01/02"})),
            r#"{"url":"https:\/\/x.io\/a","a\/b":"2024\/01\/02"}"#
        );
    }

    #[test]
    fn test_slash_next_to_other_escapes() {
        assert_eq!(
            render(json!({"s": "/\"/\n/"})),
            r#"{"s":"\/\"\/\n\/"}"#
        );
    }

    #[test]
    fn test_whole_doubles_print_as_integers() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"a":1.0,"b":-3.0,"c":1e5,"d":-0.0,"e":0.0}"#).unwrap();
        assert_eq!(render(value), r#"{"a":1,"b":-3,"c":100000,"d":-0,"e":0}"#);
    }

    #[test]
    fn test_fractional_doubles() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"a":2.5,"b":0.001,"c":1234567.25,"d":0.00015}"#).unwrap();
        assert_eq!(
            render(value),
            r#"{"a":2.5,"b":0.001,"c":1234567.25,"d":1.5E-4}"#
        );
    }

    #[test]
    fn test_doubles_beyond_long_range() {
        assert_eq!(number_text(1e20), "1.0E20");
        assert_eq!(number_text(-2.5e30), "-2.5E30");
        // The saturated long compares equal at exactly 2^63.
        assert_eq!(number_text(9.223372036854775807e18), "9223372036854775807");
    }

    #[test]
    fn test_integers_untouched() {
        assert_eq!(
            render(json!({"n": 10, "m": -7, "big": i64::MAX})),
            format!(r#"{{"n":10,"m":-7,"big":{}}}"#, i64::MAX)
        );
        assert_eq!(
            render(json!({"huge": u64::MAX})),
            r#"{"huge":1.8446744073709552E19}"#
        );
    }

    #[test]
    fn test_nested_structures_stay_compact() {
        assert_eq!(
            render(json!({"a": [1, {"b": null, "c": true}], "d": {}})),
            r#"{"a":[1,{"b":null,"c":true}],"d":{}}"#
        );
    }
}
