//! Leaf conversion: raw configuration strings to typed scalar values.
//!
//! | Kind      | Rule                                                      |
//! |-----------|-----------------------------------------------------------|
//! | string    | identity                                                  |
//! | integer   | trimmed, strict base-10, range-checked against the target |
//! | boolean   | trimmed, case-insensitive `true` / `false`                |
//! | decimal   | trimmed, `.` as the decimal point, scientific as fallback |
//! | float     | trimmed, Rust float syntax, finite at the target width    |
//! | date-time | permissive, see [`parse_date_time`]                       |
//! | uri       | absolute URIs only                                        |

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use url::Url;

use crate::error::{BindError, ConfigurationBindError, ParseFailure};
use crate::shape::{Bindable, FloatWidth, IntegerRange, ScalarKind, TypeDescriptor};
use crate::value::BoundValue;

/// Convert `raw`, read from `key`, into a value of `kind`.
pub fn convert(raw: &str, key: &str, kind: ScalarKind) -> Result<BoundValue, ConfigurationBindError> {
    let failed = |cause: ParseFailure| ConfigurationBindError::ConversionFailed {
        value: raw.to_string(),
        key: key.to_string(),
        target: target_name(kind),
        cause,
    };

    match kind {
        ScalarKind::String => Ok(BoundValue::String(raw.to_string())),
        ScalarKind::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(BoundValue::Char(c)),
                _ => Err(failed(ParseFailure::Char)),
            }
        }
        ScalarKind::Integer(range) => {
            let n = raw
                .trim()
                .parse::<i128>()
                .map_err(|e| failed(e.into()))?;
            if n < range.min || n > range.max {
                return Err(failed(ParseFailure::OutOfRange(range.name)));
            }
            Ok(BoundValue::Integer(n))
        }
        ScalarKind::Boolean => {
            let trimmed = raw.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(BoundValue::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(BoundValue::Boolean(false))
            } else {
                Err(failed(ParseFailure::Boolean))
            }
        }
        ScalarKind::Decimal => {
            let trimmed = raw.trim();
            if trimmed.contains('_') {
                return Err(failed(ParseFailure::DigitSeparator));
            }
            Decimal::from_str(trimmed)
                .or_else(|e| Decimal::from_scientific(trimmed).map_err(|_| e))
                .map(BoundValue::Decimal)
                .map_err(|e| failed(e.into()))
        }
        ScalarKind::Float(width) => {
            let f = raw.trim().parse::<f64>().map_err(|e| failed(e.into()))?;
            if !f.is_finite() {
                return Err(failed(ParseFailure::NonFinite));
            }
            if !width.fits(f) {
                return Err(failed(ParseFailure::OutOfRange(width.name())));
            }
            Ok(BoundValue::Float(OrderedFloat(f)))
        }
        ScalarKind::DateTime => parse_date_time(raw)
            .map(BoundValue::DateTime)
            .ok_or_else(|| failed(ParseFailure::DateTime)),
        ScalarKind::Uri => Url::parse(raw.trim())
            .map(BoundValue::Uri)
            .map_err(|e| failed(e.into())),
        ScalarKind::Other(type_name) => {
            Err(ConfigurationBindError::UnhandledType(type_name.to_string()))
        }
    }
}

fn target_name(kind: ScalarKind) -> String {
    match kind {
        ScalarKind::DateTime => "a DateTime".to_string(),
        ScalarKind::Uri => "a Uri".to_string(),
        other => other.to_string(),
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Best-effort calendar parse.
///
/// Accepts RFC 3339 and RFC 2822 (offset preserved), ISO-like date-times with
/// a `T` or a space, `/`-separated and US month-first dates, and dates with
/// month names. Inputs without an offset are placed at UTC; date-only inputs
/// at midnight.
pub fn parse_date_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    let utc = FixedOffset::east_opt(0)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %:z") {
        return Some(dt);
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return utc.from_local_datetime(&naive).single();
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single();
        }
    }
    None
}

macro_rules! bindable_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Bindable for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::Scalar(ScalarKind::Integer(IntegerRange {
                    name: stringify!($ty),
                    min: <$ty>::MIN as i128,
                    max: <$ty>::MAX as i128,
                }))
            }

            fn from_bound(value: BoundValue) -> Result<Self, BindError> {
                match value {
                    BoundValue::Integer(n) => <$ty>::try_from(n)
                        .map_err(|_| BindError::mismatch(stringify!($ty), format!("{n} is out of range"))),
                    other => Err(mismatch(stringify!($ty), &other)),
                }
            }
        }
    )*};
}

bindable_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

fn mismatch(target: &str, value: &BoundValue) -> BindError {
    BindError::mismatch(target, format!("received {}", value.kind()))
}

impl Bindable for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::String)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::String(s) => Ok(s),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl Bindable for char {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Char)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Char(c) => Ok(c),
            other => Err(mismatch("char", &other)),
        }
    }
}

impl Bindable for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Boolean)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Boolean(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl Bindable for Decimal {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Decimal)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Decimal(d) => Ok(d),
            other => Err(mismatch("Decimal", &other)),
        }
    }
}

impl Bindable for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Float(FloatWidth::F64))
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Float(f) => Ok(f.into_inner()),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl Bindable for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Float(FloatWidth::F32))
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Float(f) => Ok(f.into_inner() as f32),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl Bindable for DateTime<FixedOffset> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::DateTime)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::DateTime(dt) => Ok(dt),
            other => Err(mismatch("DateTime<FixedOffset>", &other)),
        }
    }
}

impl Bindable for DateTime<Utc> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::DateTime)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::DateTime(dt) => Ok(dt.with_timezone(&Utc)),
            other => Err(mismatch("DateTime<Utc>", &other)),
        }
    }
}

/// Wall-clock time as written in the configuration.
impl Bindable for NaiveDateTime {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::DateTime)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::DateTime(dt) => Ok(dt.naive_local()),
            other => Err(mismatch("NaiveDateTime", &other)),
        }
    }
}

impl Bindable for NaiveDate {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::DateTime)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::DateTime(dt) => Ok(dt.date_naive()),
            other => Err(mismatch("NaiveDate", &other)),
        }
    }
}

impl Bindable for Url {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Scalar(ScalarKind::Uri)
    }

    fn from_bound(value: BoundValue) -> Result<Self, BindError> {
        match value {
            BoundValue::Uri(u) => Ok(u),
            other => Err(mismatch("Uri", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn int(name: &'static str, min: i128, max: i128) -> ScalarKind {
        ScalarKind::Integer(IntegerRange { name, min, max })
    }

    fn conversion_error(raw: &str, kind: ScalarKind) -> String {
        match convert(raw, "App:field", kind) {
            Err(e @ ConfigurationBindError::ConversionFailed { .. }) => e.to_string(),
            other => panic!("Expected ConversionFailed, got {other:?}"),
        }
    }

    #[test]
    fn string_is_identity() {
        let v = convert("  spaced  ", "k", ScalarKind::String).unwrap();
        assert_eq!(v, BoundValue::String("  spaced  ".into()));
    }

    #[test]
    fn integer_parses_with_whitespace_and_sign() {
        let kind = int("i32", i32::MIN as i128, i32::MAX as i128);
        assert_eq!(convert(" 42 ", "k", kind).unwrap(), BoundValue::Integer(42));
        assert_eq!(convert("-7", "k", kind).unwrap(), BoundValue::Integer(-7));
    }

    #[test]
    fn integer_rejects_fractions_and_garbage() {
        let kind = int("i32", i32::MIN as i128, i32::MAX as i128);
        let msg = conversion_error("4.2", kind);
        assert!(msg.contains("'4.2'"));
        assert!(msg.contains("i32"));
        assert!(msg.contains("App:field"));
        conversion_error("0x10", kind);
    }

    #[test]
    fn integer_range_is_enforced() {
        let kind = int("u8", 0, 255);
        assert!(conversion_error("256", kind).contains("u8"));
        conversion_error("-1", kind);
        assert_eq!(convert("255", "k", kind).unwrap(), BoundValue::Integer(255));
    }

    #[test]
    fn boolean_is_case_insensitive() {
        assert_eq!(
            convert("True", "k", ScalarKind::Boolean).unwrap(),
            BoundValue::Boolean(true)
        );
        assert_eq!(
            convert("FALSE", "k", ScalarKind::Boolean).unwrap(),
            BoundValue::Boolean(false)
        );
        let msg = conversion_error("yes", ScalarKind::Boolean);
        assert!(msg.contains("'yes'"));
        assert!(msg.contains("App:field"));
    }

    #[test]
    fn decimal_fixed_point_and_scientific() {
        assert_eq!(
            convert("3.14", "k", ScalarKind::Decimal).unwrap(),
            BoundValue::Decimal(Decimal::new(314, 2))
        );
        assert_eq!(
            convert("1.5e2", "k", ScalarKind::Decimal).unwrap(),
            BoundValue::Decimal(Decimal::new(150, 0))
        );
        let msg = conversion_error("3,14.x", ScalarKind::Decimal);
        assert!(msg.contains("'3,14.x'"));
        assert!(msg.contains("Decimal"));
    }

    #[test]
    fn decimal_rejects_digit_separators() {
        let msg = conversion_error("1_000", ScalarKind::Decimal);
        assert!(msg.contains("'1_000'"));
        conversion_error("1_0e2", ScalarKind::Decimal);
    }

    #[test]
    fn float_parses() {
        assert_eq!(
            convert("1.5", "k", ScalarKind::Float(FloatWidth::F64)).unwrap(),
            BoundValue::Float(OrderedFloat(1.5))
        );
        conversion_error("one", ScalarKind::Float(FloatWidth::F64));
    }

    #[test]
    fn float_rejects_non_finite() {
        for raw in ["inf", "-infinity", "NaN", "1e400"] {
            conversion_error(raw, ScalarKind::Float(FloatWidth::F64));
        }
    }

    #[test]
    fn float_range_follows_target_width() {
        let msg = conversion_error("1e40", ScalarKind::Float(FloatWidth::F32));
        assert!(msg.contains("f32"));
        assert_eq!(
            convert("1e40", "k", ScalarKind::Float(FloatWidth::F64)).unwrap(),
            BoundValue::Float(OrderedFloat(1e40))
        );
        let value = convert("3.5", "k", ScalarKind::Float(FloatWidth::F32)).unwrap();
        assert_eq!(f32::from_bound(value).unwrap(), 3.5);
    }

    #[test]
    fn char_requires_exactly_one() {
        assert_eq!(
            convert("x", "k", ScalarKind::Char).unwrap(),
            BoundValue::Char('x')
        );
        conversion_error("xy", ScalarKind::Char);
        conversion_error("", ScalarKind::Char);
    }

    #[test]
    fn date_only_is_midnight_utc() {
        let dt = parse_date_time("1999-12-31").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (1999, 12, 31));
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn date_time_variants() {
        for raw in [
            "2001-01-01T10:30:00",
            "2001-01-01 10:30:00",
            "2001-01-01T10:30",
            "01/01/2001 10:30:00",
            "2001-01-01T10:30:00Z",
            "Mon, 01 Jan 2001 10:30:00 +0000",
        ] {
            let dt = parse_date_time(raw).unwrap_or_else(|| panic!("failed to parse {raw}"));
            assert_eq!(dt.year(), 2001, "{raw}");
            assert_eq!(dt.minute(), 30, "{raw}");
        }
        assert!(parse_date_time("January 5, 2020").is_some());
        assert!(parse_date_time("5 Jan 2020").is_some());
    }

    #[test]
    fn offset_is_preserved() {
        let dt = parse_date_time("2022-02-02T08:00:00+02:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 7200);
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn date_time_failure_names_value_and_key() {
        let msg = conversion_error("not-a-date", ScalarKind::DateTime);
        assert!(msg.contains("'not-a-date'"));
        assert!(msg.contains("DateTime"));
        assert!(msg.contains("App:field"));
    }

    #[test]
    fn uri_must_be_absolute() {
        let v = convert("https://example.com", "k", ScalarKind::Uri).unwrap();
        assert_eq!(v, BoundValue::Uri(Url::parse("https://example.com").unwrap()));
        let msg = conversion_error("/relative/path", ScalarKind::Uri);
        assert!(msg.contains("'/relative/path'"));
        assert!(msg.contains("Uri"));
    }

    #[test]
    fn other_kind_is_unhandled() {
        let err = convert("x", "k", ScalarKind::Other("demo::Opaque")).unwrap_err();
        assert!(matches!(err, ConfigurationBindError::UnhandledType(ref n) if n == "demo::Opaque"));
        assert_eq!(err.to_string(), "Unhandled type 'demo::Opaque'");
    }

    #[test]
    fn typed_date_targets() {
        let dt = BoundValue::DateTime(parse_date_time("2022-02-02T08:00:00+02:00").unwrap());
        let naive = NaiveDateTime::from_bound(dt.clone()).unwrap();
        assert_eq!(naive.hour(), 8);
        let utc = DateTime::<Utc>::from_bound(dt.clone()).unwrap();
        assert_eq!(utc.hour(), 6);
        let date = NaiveDate::from_bound(dt).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2022, 2, 2).unwrap());
    }

    #[test]
    fn typed_integer_mismatch_is_reported() {
        let err = i32::from_bound(BoundValue::String("1".into())).unwrap_err();
        assert!(err.to_string().contains("i32"));
    }
}
