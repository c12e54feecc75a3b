//! Conversion of generated strings into typed field values.
//!
//! Tags and templates always produce text. [`parse_value`] turns that text
//! into a [`Value`] matching the field's declared kind:
//!
//! | Kind | Accepted input |
//! |------|----------------|
//! | bool | `1 t T TRUE true True 0 f F FALSE false False` |
//! | enum, signed ints | `-12`, `0x1F`, `0o17`, `017`, `0b101`, `1_000` |
//! | unsigned ints | as above, without a sign |
//! | float, double | `1.23`, `-4.5e3`, `1_000.5`, `0x1.8p1`, `inf`, `NaN` |
//! | string, bytes | anything, verbatim |
//! | Timestamp | text matching the configured time format |
//! | Duration | `1h30m`, `-1.5s`, `300ms`, `0` |

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::config::DEFAULT_TIME_FORMAT;
use crate::error::{Error, Result};
use crate::kind::{Kind, WellKnown};
use crate::reflect::{FieldInfo, Value};

/// Parse `input` into the value type of `field`.
///
/// Enum numbers are taken as-is, without checking them against the declared
/// values. Message fields other than the well-known types are rejected with
/// [`Error::UnexpectedKind`].
pub fn parse_value<M, F>(field: &F, input: &str, time_format: &str) -> Result<Value<M>>
where
    F: FieldInfo + ?Sized,
{
    let fail = |kind: &str, reason: String| Error::Parse {
        field: field.full_name().to_string(),
        kind: kind.to_string(),
        input: input.to_string(),
        reason,
    };

    if let Some(wkt) = field.well_known() {
        return match wkt {
            WellKnown::Timestamp => parse_time(input, time_format)
                .map(Value::Timestamp)
                .map_err(|reason| fail(wkt.full_name(), reason)),
            WellKnown::Duration => parse_duration(input)
                .map(Value::Duration)
                .map_err(|reason| fail(wkt.full_name(), reason)),
        };
    }

    let kind = field.kind();
    let value = match kind {
        Kind::Bool => parse_bool(input)
            .map(Value::Bool)
            .ok_or_else(|| "invalid syntax".to_string()),
        Kind::Enum => parse_int(input, 32).map(|n| Value::Enum(n as i32)),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            parse_int(input, 32).map(|n| Value::I32(n as i32))
        }
        Kind::Uint32 | Kind::Fixed32 => parse_uint(input, 32).map(|n| Value::U32(n as u32)),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => parse_int(input, 64).map(Value::I64),
        Kind::Uint64 | Kind::Fixed64 => parse_uint(input, 64).map(Value::U64),
        Kind::Float => parse_float(input, 32).map(|f| Value::F32(f as f32)),
        Kind::Double => parse_float(input, 64).map(Value::F64),
        Kind::String => Ok(Value::String(input.to_string())),
        Kind::Bytes => Ok(Value::Bytes(input.as_bytes().to_vec())),
        Kind::Message | Kind::Group => {
            return Err(Error::UnexpectedKind {
                field: field.full_name().to_string(),
                kind: kind.to_string(),
            });
        }
    };
    value.map_err(|reason| fail(kind.name(), reason))
}

/// Boolean literals.
pub fn parse_bool(input: &str) -> Option<bool> {
    match input {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a signed integer literal that must fit in `bits` bits.
pub fn parse_int(input: &str, bits: u32) -> std::result::Result<i64, String> {
    let (negative, body) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    let magnitude = parse_magnitude(body)?;
    let limit = 1u64 << (bits - 1);
    if negative {
        if magnitude > limit {
            return Err(out_of_range());
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        if magnitude >= limit {
            return Err(out_of_range());
        }
        Ok(magnitude as i64)
    }
}

/// Parse an unsigned integer literal that must fit in `bits` bits.
pub fn parse_uint(input: &str, bits: u32) -> std::result::Result<u64, String> {
    let value = parse_magnitude(input)?;
    if bits < 64 && value >= 1u64 << bits {
        return Err(out_of_range());
    }
    Ok(value)
}

fn parse_magnitude(input: &str) -> std::result::Result<u64, String> {
    let lower = input.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits, prefixed) = match lower.as_deref() {
        Some("0x") => (16, &input[2..], true),
        Some("0o") => (8, &input[2..], true),
        Some("0b") => (2, &input[2..], true),
        _ if input.len() > 1 && input.starts_with('0') => (8, &input[1..], true),
        _ => (10, input, false),
    };

    if digits.contains('_') && !underscores_ok(digits, prefixed) {
        return Err(invalid_syntax());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid_syntax());
    }
    u64::from_str_radix(&cleaned, radix).map_err(|_| out_of_range())
}

/// Separators must sit between digits, or directly after a base prefix.
fn underscores_ok(digits: &str, prefixed: bool) -> bool {
    if digits.ends_with('_') || digits.contains("__") {
        return false;
    }
    prefixed || !digits.starts_with('_')
}

fn invalid_syntax() -> String {
    "invalid syntax".to_string()
}

fn out_of_range() -> String {
    "value out of range".to_string()
}

/// Parse a decimal or hexadecimal (`0x1.8p1`) float at `bits` precision.
///
/// A finite literal that rounds past the largest value of the width is a
/// range error. `inf`, `infinity` and `nan` are accepted in any case. For
/// `bits == 32` the result is exactly representable as `f32`.
pub fn parse_float(input: &str, bits: u32) -> std::result::Result<f64, String> {
    let (negative, body) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    let sign = if negative { -1.0 } else { 1.0 };

    match body.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => return Ok(sign * f64::INFINITY),
        "nan" => return Ok(f64::NAN),
        _ => {}
    }

    let hex = matches!(body.get(..2), Some("0x" | "0X"));
    if body.contains('_') && !float_underscores_ok(body, hex) {
        return Err(invalid_syntax());
    }
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();

    let magnitude = if hex {
        parse_hex_float(&cleaned[2..], bits)?
    } else {
        if !cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return Err(invalid_syntax());
        }
        let parsed = if bits == 32 {
            cleaned.parse::<f32>().map(f64::from)
        } else {
            cleaned.parse::<f64>()
        };
        parsed.map_err(|_| invalid_syntax())?
    };

    if magnitude.is_infinite() {
        return Err(out_of_range());
    }
    Ok(sign * magnitude)
}

/// `<hex digits>[.<hex digits>]p<exponent>`, after the `0x` prefix.
fn parse_hex_float(body: &str, bits: u32) -> std::result::Result<f64, String> {
    let (mantissa, exponent) = body
        .split_once(['p', 'P'])
        .ok_or_else(|| "hexadecimal mantissa requires a 'p' exponent".to_string())?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid_syntax());
    }

    let mut value = 0.0_f64;
    for c in int_part.chars().chain(frac_part.chars()) {
        let digit = c.to_digit(16).ok_or_else(invalid_syntax)?;
        value = value * 16.0 + f64::from(digit);
    }

    let exp_digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_syntax());
    }
    let exp: i64 = exponent.parse().unwrap_or(if exponent.starts_with('-') {
        i64::MIN / 2
    } else {
        i64::MAX / 2
    });
    let scale = exp
        .saturating_sub(4 * frac_part.len() as i64)
        .clamp(-4_000, 4_000) as i32;

    // Two steps keep large mantissas with tiny exponents from underflowing early.
    let half = scale / 2;
    let value = value * 2f64.powi(half) * 2f64.powi(scale - half);
    Ok(if bits == 32 {
        f64::from(value as f32)
    } else {
        value
    })
}

/// Separators must sit between digits, or directly after a `0x` prefix.
fn float_underscores_ok(body: &str, hex: bool) -> bool {
    let bytes = body.as_bytes();
    let is_digit = |b: u8| {
        if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        }
    };
    let start = if hex { 2 } else { 0 };
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if b != b'_' {
            continue;
        }
        let after_prefix = hex && i == start;
        let before_ok = after_prefix || (i > start && is_digit(bytes[i - 1]));
        let after_ok = bytes.get(i + 1).is_some_and(|&n| is_digit(n));
        if !before_ok || !after_ok {
            return false;
        }
    }
    true
}

/// Parse a duration such as `"1h15m30.5s"`, `"-300ms"` or `"0"`.
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. The result must fit in a
/// signed 64-bit count of nanoseconds.
pub fn parse_duration(input: &str) -> std::result::Result<TimeDelta, String> {
    let invalid = || format!("invalid duration {input:?}");

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let max = i64::MAX as u128 + u128::from(negative);
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let scale: u128 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            "" => return Err(format!("missing unit in duration {input:?}")),
            unit => return Err(format!("unknown unit {unit:?} in duration {input:?}")),
        };
        rest = &rest[unit_len..];

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;

        // Digits past 18 cannot change the result by a whole nanosecond.
        let frac_part = &frac_part[..frac_part.len().min(18)];
        if !frac_part.is_empty() {
            let numerator: u128 = frac_part.parse().map_err(|_| invalid())?;
            nanos += numerator * scale / 10u128.pow(frac_part.len() as u32);
        }

        total = total.checked_add(nanos).ok_or_else(invalid)?;
        if total > max {
            return Err(invalid());
        }
    }

    let nanos = if negative {
        -(total as i128)
    } else {
        total as i128
    };
    i64::try_from(nanos)
        .map(TimeDelta::nanoseconds)
        .map_err(|_| invalid())
}

/// Parse a point in time with a `strftime` format.
///
/// The default format accepts any RFC 3339 timestamp. A custom format is
/// tried as an offset-carrying datetime, then as a UTC datetime, then as a
/// date at midnight UTC.
pub fn parse_time(input: &str, format: &str) -> std::result::Result<DateTime<Utc>, String> {
    if format == DEFAULT_TIME_FORMAT {
        return DateTime::parse_from_rfc3339(input)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| e.to_string());
    }
    DateTime::parse_from_str(input, format)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(input, format).map(|ts| ts.and_utc()))
        .or_else(|_| {
            NaiveDate::parse_from_str(input, format).map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|e| format!("{e} (format {format:?})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Directive;
    use crate::kind::{DURATION_FULL_NAME, TIMESTAMP_FULL_NAME};

    // ── Test field ──

    struct TestField {
        kind: Kind,
        message: Option<&'static str>,
    }

    impl TestField {
        fn scalar(kind: Kind) -> Self {
            Self {
                kind,
                message: None,
            }
        }

        fn message(name: &'static str) -> Self {
            Self {
                kind: Kind::Message,
                message: Some(name),
            }
        }
    }

    impl FieldInfo for TestField {
        fn name(&self) -> &str {
            "f"
        }
        fn full_name(&self) -> &str {
            "test.M.f"
        }
        fn kind(&self) -> Kind {
            self.kind
        }
        fn is_list(&self) -> bool {
            false
        }
        fn is_map(&self) -> bool {
            false
        }
        fn map_key(&self) -> Option<&Self> {
            None
        }
        fn map_value(&self) -> Option<&Self> {
            None
        }
        fn message_name(&self) -> Option<&str> {
            self.message
        }
        fn enum_numbers(&self) -> Vec<i32> {
            vec![0, 1]
        }
        fn containing_oneof(&self) -> Option<&str> {
            None
        }
        fn directive(&self) -> Option<&Directive> {
            None
        }
    }

    fn parse(kind: Kind, input: &str) -> Result<Value<()>> {
        parse_value(&TestField::scalar(kind), input, DEFAULT_TIME_FORMAT)
    }

    // ── Scalars ──

    #[test]
    fn scalars_parse_to_their_kind() {
        assert_eq!(parse(Kind::Bool, "true").unwrap(), Value::Bool(true));
        assert_eq!(parse(Kind::Int32, "123").unwrap(), Value::I32(123));
        assert_eq!(parse(Kind::Sint32, "-456").unwrap(), Value::I32(-456));
        assert_eq!(parse(Kind::Fixed32, "1213").unwrap(), Value::U32(1213));
        assert_eq!(parse(Kind::Sint64, "-1617").unwrap(), Value::I64(-1617));
        assert_eq!(parse(Kind::Fixed64, "2223").unwrap(), Value::U64(2223));
        assert_eq!(parse(Kind::Float, "1.23").unwrap(), Value::F32(1.23));
        assert_eq!(parse(Kind::Double, "-4.56").unwrap(), Value::F64(-4.56));
        assert_eq!(
            parse(Kind::String, "foobar").unwrap(),
            Value::String("foobar".into())
        );
        assert_eq!(
            parse(Kind::Bytes, "fizzbuzz").unwrap(),
            Value::Bytes(b"fizzbuzz".to_vec())
        );
    }

    #[test]
    fn floats_out_of_range_are_errors() {
        for input in ["1e39", "-1e39", "3.5e38", "0x1p128"] {
            let err = parse(Kind::Float, input).unwrap_err();
            assert!(
                matches!(err, Error::Parse { ref reason, .. } if reason == "value out of range"),
                "{input}: {err}"
            );
        }
        for input in ["1e309", "-1e309", "0x1p1024"] {
            assert!(parse(Kind::Double, input).is_err(), "{input}");
        }
        assert_eq!(parse(Kind::Float, "3.4e38").unwrap(), Value::F32(3.4e38));
        assert_eq!(parse(Kind::Double, "1e308").unwrap(), Value::F64(1e308));
    }

    #[test]
    fn float_literals() {
        assert_eq!(parse(Kind::Float, "-Inf").unwrap(), Value::F32(f32::NEG_INFINITY));
        assert_eq!(parse(Kind::Double, "infinity").unwrap(), Value::F64(f64::INFINITY));
        assert!(matches!(parse(Kind::Double, "NaN").unwrap(), Value::F64(f) if f.is_nan()));
        assert_eq!(parse(Kind::Double, "0x1.8p1").unwrap(), Value::F64(3.0));
        assert_eq!(parse(Kind::Float, "-0x1p-2").unwrap(), Value::F32(-0.25));
        assert_eq!(parse(Kind::Double, "0x_1p4").unwrap(), Value::F64(16.0));
        assert_eq!(parse(Kind::Double, "1_000.5").unwrap(), Value::F64(1000.5));
        assert_eq!(parse(Kind::Double, ".5").unwrap(), Value::F64(0.5));
        for input in ["0x1.8", "1__0", "_1", "1_", "1_.5", "--1", "+-1", "0x", "1e"] {
            assert!(parse(Kind::Double, input).is_err(), "{input}");
        }
    }

    #[test]
    fn enum_numbers_are_not_validated() {
        assert_eq!(parse(Kind::Enum, "2").unwrap(), Value::Enum(2));
        assert_eq!(parse(Kind::Enum, "99").unwrap(), Value::Enum(99));
    }

    #[test]
    fn parse_errors_carry_context() {
        let err = parse(Kind::Int32, "not-a-number").unwrap_err();
        match err {
            Error::Parse {
                field, kind, input, ..
            } => {
                assert_eq!(field, "test.M.f");
                assert_eq!(kind, "int32");
                assert_eq!(input, "not-a-number");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse(Kind::Bool, "yes").is_err());
        assert!(parse(Kind::Double, "one").is_err());
    }

    #[test]
    fn plain_messages_are_unexpected() {
        let field = TestField::message("example.User");
        let err = parse_value::<(), _>(&field, "x", DEFAULT_TIME_FORMAT).unwrap_err();
        assert!(matches!(err, Error::UnexpectedKind { .. }));
    }

    #[test]
    fn bool_literals() {
        for s in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(s), Some(true), "{s}");
        }
        for s in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(s), Some(false), "{s}");
        }
        assert_eq!(parse_bool("tRuE"), None);
        assert_eq!(parse_bool(""), None);
    }

    // ── Integers ──

    #[test]
    fn integer_prefixes() {
        assert_eq!(parse_int("0x1F", 32), Ok(31));
        assert_eq!(parse_int("0X1f", 32), Ok(31));
        assert_eq!(parse_int("0o17", 32), Ok(15));
        assert_eq!(parse_int("017", 32), Ok(15));
        assert_eq!(parse_int("0b101", 32), Ok(5));
        assert_eq!(parse_int("-0x10", 32), Ok(-16));
        assert_eq!(parse_int("1_000", 32), Ok(1000));
        assert_eq!(parse_int("0x_ff", 32), Ok(255));
        assert_eq!(parse_int("0", 32), Ok(0));
    }

    #[test]
    fn integer_syntax_errors() {
        for s in ["", "-", "_1", "1_", "1__0", "0x", "08", "1.5", "0x+1", " 1"] {
            assert!(parse_int(s, 64).is_err(), "{s:?}");
        }
        assert!(parse_uint("-1", 64).is_err());
        assert!(parse_uint("+1", 64).is_err());
    }

    #[test]
    fn integer_width_limits() {
        assert_eq!(parse_int("2147483647", 32), Ok(i32::MAX as i64));
        assert_eq!(parse_int("-2147483648", 32), Ok(i32::MIN as i64));
        assert!(parse_int("2147483648", 32).is_err());
        assert!(parse_int("-2147483649", 32).is_err());
        assert_eq!(parse_int("-9223372036854775808", 64), Ok(i64::MIN));
        assert!(parse_int("9223372036854775808", 64).is_err());
        assert_eq!(parse_uint("4294967295", 32), Ok(u32::MAX as u64));
        assert!(parse_uint("4294967296", 32).is_err());
        assert_eq!(parse_uint("18446744073709551615", 64), Ok(u64::MAX));
        assert!(parse_uint("18446744073709551616", 64).is_err());
    }

    // ── Durations ──

    #[test]
    fn durations() {
        assert_eq!(parse_duration("0"), Ok(TimeDelta::zero()));
        assert_eq!(parse_duration("1s"), Ok(TimeDelta::seconds(1)));
        assert_eq!(parse_duration("-1.5s"), Ok(TimeDelta::milliseconds(-1500)));
        assert_eq!(
            parse_duration("1h15m30s"),
            Ok(TimeDelta::seconds(3600 + 15 * 60 + 30))
        );
        assert_eq!(parse_duration("300ms"), Ok(TimeDelta::milliseconds(300)));
        assert_eq!(parse_duration("2µs"), Ok(TimeDelta::microseconds(2)));
        assert_eq!(parse_duration("2us3ns"), Ok(TimeDelta::nanoseconds(2003)));
        assert_eq!(parse_duration(".5m"), Ok(TimeDelta::seconds(30)));
    }

    #[test]
    fn duration_errors() {
        for s in ["", "-", "1", "1x", ".s", "s", "1.2.3s", "3000000h"] {
            assert!(parse_duration(s).is_err(), "{s:?}");
        }
    }

    #[test]
    fn duration_bounds() {
        assert_eq!(
            parse_duration("-9223372036854775808ns"),
            Ok(TimeDelta::nanoseconds(i64::MIN))
        );
        assert!(parse_duration("9223372036854775808ns").is_err());
    }

    #[test]
    fn duration_field() {
        let field = TestField::message(DURATION_FULL_NAME);
        let value: Value<()> = parse_value(&field, "1m", DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(value, Value::Duration(TimeDelta::seconds(60)));
        let err = parse_value::<(), _>(&field, "soon", DEFAULT_TIME_FORMAT).unwrap_err();
        assert!(err.to_string().contains(DURATION_FULL_NAME));
    }

    // ── Timestamps ──

    #[test]
    fn rfc3339_timestamps() {
        let ts = parse_time("2021-03-17T10:11:12.5Z", DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-17T10:11:12.500+00:00");
        let ts = parse_time("2021-03-17T12:11:12+02:00", DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(ts.timestamp(), 1_615_975_872);
        assert!(parse_time("yesterday", DEFAULT_TIME_FORMAT).is_err());
    }

    #[test]
    fn custom_formats() {
        let ts = parse_time("Mar 17 2021 10:11:12", "%b %e %Y %H:%M:%S").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-17T10:11:12+00:00");
        let ts = parse_time("2021-03-17", "%Y-%m-%d").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-17T00:00:00+00:00");
        let ts = parse_time("2021-03-17 10:11 +0100", "%Y-%m-%d %H:%M %z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-03-17T09:11:00+00:00");
    }

    #[test]
    fn timestamp_field() {
        let field = TestField::message(TIMESTAMP_FULL_NAME);
        let value: Value<()> =
            parse_value(&field, "1970-01-01T00:00:01Z", DEFAULT_TIME_FORMAT).unwrap();
        assert_eq!(
            value,
            Value::Timestamp(DateTime::from_timestamp(1, 0).unwrap())
        );
    }
}
