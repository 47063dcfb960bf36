//! Datatype-aware literal values.
//!
//! Literal terms carry only their raw lexical form; this module parses a
//! form into a [`Value`] on demand. Parsed values are cached per session.
//!
//! Observed datatypes: `xsd:string|integer|decimal|float|double|boolean|
//! date|dateTime|duration`, `rdf:JSON`, `rdf:langString`. A plain quoted
//! string is equivalent to `xsd:string`; a bare numeral carries the
//! datatype its lexical shape implies.

use crate::ns::{rdf, xsd};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use num_bigint::BigInt;
use regex::Regex;

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^[+-]?[0-9]*\.[0-9]+$").unwrap();
    static ref DOUBLE: Regex =
        Regex::new(r"^[+-]?([0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)[eE][+-]?[0-9]+$").unwrap();
    static ref DURATION: Regex = Regex::new(
        r"^(-)?P(?:([0-9]+)Y)?(?:([0-9]+)M)?(?:([0-9]+)D)?(?:T(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+(?:\.[0-9]+)?)S)?)?$"
    )
    .unwrap();
}

/// A parsed literal value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `xsd:boolean`.
    Boolean(bool),
    /// Any numeric datatype; see [`Number`].
    Number(Number),
    /// A plain string or `xsd:string`.
    Str(String),
    /// `rdf:langString`: text plus language tag.
    LangStr(String, String),
    /// `xsd:dateTime`, normalized to an offset-carrying instant.
    DateTime(DateTime<FixedOffset>),
    /// `xsd:date` (any timezone suffix is dropped).
    Date(NaiveDate),
    /// `xsd:duration`.
    Duration(Duration),
    /// `rdf:JSON`.
    Json(serde_json::Value),
    /// Any other datatype, or an ill-typed form: (text, datatype IRI).
    Typed(String, String),
}

/// A numeric literal value. The promotion order for results of mixed
/// arithmetic is integer < decimal < float < double.
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    /// `xsd:integer`, exact.
    Integer(BigInt),
    /// `xsd:decimal`.
    Decimal(f64),
    /// `xsd:float`.
    Float(f64),
    /// `xsd:double`.
    Double(f64),
}

impl Number {
    /// Position in the promotion order.
    pub fn rank(&self) -> u8 {
        match self {
            Number::Integer(_) => 0,
            Number::Decimal(_) => 1,
            Number::Float(_) => 2,
            Number::Double(_) => 3,
        }
    }

    /// The value as a float, lossy for large integers.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => i.to_string().parse().unwrap_or(f64::NAN),
            Number::Decimal(v) | Number::Float(v) | Number::Double(v) => *v,
        }
    }

    /// Rebuilds a number of the given promotion rank from a float.
    pub fn from_rank(rank: u8, v: f64) -> Number {
        match rank {
            1 => Number::Decimal(v),
            2 => Number::Float(v),
            _ => Number::Double(v),
        }
    }

    /// True for finite floats; always true for integers.
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Decimal(v) | Number::Float(v) | Number::Double(v) => v.is_finite(),
        }
    }

    /// The canonical digit string of the value (no datatype decoration).
    pub fn lexical(&self) -> String {
        match self {
            Number::Integer(i) => i.to_string(),
            Number::Decimal(v) | Number::Float(v) | Number::Double(v) => format_f64(*v),
        }
    }

    /// The literal lexical form carrying this value: bare numerals for
    /// integers and decimals, quoted-and-typed forms for floats and
    /// doubles (which have no bare shorthand without an exponent).
    pub fn literal_lexical(&self) -> String {
        match self {
            Number::Integer(i) => i.to_string(),
            Number::Decimal(v) => format_f64(*v),
            Number::Float(v) => format!("\"{}\"^^<{}>", format_f64(*v), xsd::float),
            Number::Double(v) => format!("\"{}\"^^<{}>", format_f64(*v), xsd::double),
        }
    }

    /// Numeric ordering; integers compare exactly, mixed pairs through
    /// float conversion.
    pub fn cmp_num(&self, other: &Number) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

/// Formats a float with at least one fractional digit. Rust's `Display`
/// for `f64` never emits an exponent, so the output is a valid decimal
/// lexical for every finite input.
pub fn format_f64(v: f64) -> String {
    let s = format!("{}", v);
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// An `xsd:duration` value: a month part and a second part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Duration {
    /// Calendar months (years folded in).
    pub months: i64,
    /// Seconds (days, hours and minutes folded in).
    pub seconds: f64,
}

impl Duration {
    /// A duration of whole seconds.
    pub fn from_seconds(seconds: f64) -> Duration {
        Duration { months: 0, seconds }
    }

    /// Parses an `xsd:duration` lexical such as `P1Y2MT3.5S` or `-P2D`.
    pub fn parse(lex: &str) -> Option<Duration> {
        if lex.len() < 2 {
            return None;
        }
        let caps = DURATION.captures(lex)?;
        if caps
            .iter()
            .skip(2)
            .all(|group| group.is_none())
        {
            // a bare "P" or "-PT" carries no components
            return None;
        }
        let int = |i: usize| -> i64 {
            caps.get(i)
                .map(|m| m.as_str().parse().unwrap_or(0))
                .unwrap_or(0)
        };
        let months = int(2) * 12 + int(3);
        let mut seconds = (int(4) * 86_400 + int(5) * 3_600 + int(6) * 60) as f64;
        if let Some(m) = caps.get(7) {
            seconds += m.as_str().parse::<f64>().unwrap_or(0.0);
        }
        if caps.get(1).is_some() {
            Some(Duration {
                months: -months,
                seconds: -seconds,
            })
        } else {
            Some(Duration { months, seconds })
        }
    }

    /// The canonical lexical form, e.g. `P1YT2H` or `-PT30.5S`.
    pub fn lexical(&self) -> String {
        let negative = self.months < 0 || self.seconds < 0.0;
        let months = self.months.abs();
        let seconds = self.seconds.abs();
        let mut out = String::from(if negative { "-P" } else { "P" });
        if months >= 12 {
            out.push_str(&format!("{}Y", months / 12));
        }
        if months % 12 != 0 {
            out.push_str(&format!("{}M", months % 12));
        }
        let days = (seconds / 86_400.0).floor();
        if days >= 1.0 {
            out.push_str(&format!("{}D", days as i64));
        }
        let mut rest = seconds - days * 86_400.0;
        let hours = (rest / 3_600.0).floor();
        let minutes = ((rest - hours * 3_600.0) / 60.0).floor();
        rest -= hours * 3_600.0 + minutes * 60.0;
        if hours >= 1.0 || minutes >= 1.0 || rest > 0.0 {
            out.push('T');
            if hours >= 1.0 {
                out.push_str(&format!("{}H", hours as i64));
            }
            if minutes >= 1.0 {
                out.push_str(&format!("{}M", minutes as i64));
            }
            if rest > 0.0 {
                let lex = format!("{}", rest);
                out.push_str(&format!("{}S", lex));
            }
        }
        if out.ends_with('P') {
            out.push_str("T0S");
        }
        out
    }
}

/// The suffix of a quoted literal lexical form.
#[derive(Clone, Debug, PartialEq)]
pub enum Suffix {
    /// Plain string.
    None,
    /// `@lang` tag.
    Lang(String),
    /// `^^<datatype>` IRI.
    Datatype(String),
}

/// Splits a quoted lexical form into unescaped text and suffix.
///
/// Returns `None` if the form does not start with a quote or the quote is
/// never closed.
pub fn split_quoted(lex: &str) -> Option<(String, Suffix)> {
    if !lex.starts_with('"') {
        return None;
    }
    let bytes = lex.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => break,
            _ => i += 1,
        }
    }
    if i >= bytes.len() {
        return None;
    }
    let text = unescape(&lex[1..i]);
    let rest = &lex[i + 1..];
    if rest.is_empty() {
        Some((text, Suffix::None))
    } else if let Some(lang) = rest.strip_prefix('@') {
        Some((text, Suffix::Lang(lang.to_string())))
    } else if rest.starts_with("^^<") && rest.ends_with('>') {
        Some((text, Suffix::Datatype(rest[3..rest.len() - 1].to_string())))
    } else {
        None
    }
}

/// Parses a raw literal lexical form into a [`Value`].
pub fn parse_lexical(lex: &str) -> Value {
    match lex {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    if INTEGER.is_match(lex) {
        if let Ok(i) = lex.parse::<BigInt>() {
            return Value::Number(Number::Integer(i));
        }
    }
    if DECIMAL.is_match(lex) {
        if let Ok(v) = lex.parse::<f64>() {
            return Value::Number(Number::Decimal(v));
        }
    }
    if DOUBLE.is_match(lex) {
        if let Ok(v) = lex.parse::<f64>() {
            return Value::Number(Number::Double(v));
        }
    }
    if let Some((text, suffix)) = split_quoted(lex) {
        return typed_value(text, suffix);
    }
    Value::Typed(lex.to_string(), String::new())
}

fn typed_value(text: String, suffix: Suffix) -> Value {
    let dt = match suffix {
        Suffix::None => return Value::Str(text),
        Suffix::Lang(lang) => return Value::LangStr(text, lang),
        Suffix::Datatype(dt) => dt,
    };
    if dt == xsd::string {
        Value::Str(text)
    } else if dt == xsd::boolean {
        if text == "true" || text == "1" {
            Value::Boolean(true)
        } else if text == "false" || text == "0" {
            Value::Boolean(false)
        } else {
            Value::Typed(text, dt)
        }
    } else if dt == xsd::integer {
        match text.parse::<BigInt>() {
            Ok(i) => Value::Number(Number::Integer(i)),
            Err(_) => Value::Typed(text, dt),
        }
    } else if dt == xsd::decimal {
        match text.parse::<f64>() {
            Ok(v) => Value::Number(Number::Decimal(v)),
            Err(_) => Value::Typed(text, dt),
        }
    } else if dt == xsd::float {
        match text.parse::<f64>() {
            Ok(v) => Value::Number(Number::Float(v)),
            Err(_) => Value::Typed(text, dt),
        }
    } else if dt == xsd::double {
        match text.parse::<f64>() {
            Ok(v) => Value::Number(Number::Double(v)),
            Err(_) => Value::Typed(text, dt),
        }
    } else if dt == xsd::date {
        match parse_date(&text) {
            Some(d) => Value::Date(d),
            None => Value::Typed(text, dt),
        }
    } else if dt == xsd::dateTime {
        match parse_datetime(&text) {
            Some(d) => Value::DateTime(d),
            None => Value::Typed(text, dt),
        }
    } else if dt == xsd::duration {
        match Duration::parse(&text) {
            Some(d) => Value::Duration(d),
            None => Value::Typed(text, dt),
        }
    } else if dt == rdf::JSON {
        match serde_json::from_str(&text) {
            Ok(v) => Value::Json(v),
            Err(_) => Value::Typed(text, dt),
        }
    } else {
        Value::Typed(text, dt)
    }
}

/// Parses an `xsd:dateTime` lexical; offset-less forms are read as UTC.
pub fn parse_datetime(lex: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(lex) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(lex, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Parses an `xsd:date` lexical, dropping any timezone suffix.
pub fn parse_date(lex: &str) -> Option<NaiveDate> {
    let trimmed = lex.strip_suffix('Z').unwrap_or(lex);
    let trimmed = if trimmed.len() > 10 { &trimmed[..10] } else { trimmed };
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Datatype-aware literal equality: equal lexicals, equal string values,
/// or numerically equal under promotion to a common datatype.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        _ => a == b,
    }
}

/// Like [`values_equal`] but integer/decimal cross-datatype equality does
/// not hold; used when comparing index literals during list iteration.
pub fn values_equal_no_int_decimal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(Number::Integer(_)), Value::Number(y)) if y.rank() > 0 => false,
        (Value::Number(x), Value::Number(Number::Integer(_))) if x.rank() > 0 => false,
        _ => values_equal(a, b),
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

/// The string content of a value, for the `string:` builtins: the text of
/// strings and language-tagged strings, the lexical of numbers and
/// booleans.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::LangStr(s, _) => Some(s.clone()),
        Value::Number(n) => Some(n.lexical()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolves the string escapes of N3: `\t \b \n \r \f \" \' \\`, plus
/// `\uXXXX` and `\UXXXXXXXX` numeric escapes.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => push_codepoint(&mut out, &mut chars, 4),
            Some('U') => push_codepoint(&mut out, &mut chars, 8),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_codepoint(out: &mut String, chars: &mut std::str::Chars<'_>, digits: usize) {
    let hex: String = chars.take(digits).collect();
    if let Ok(code) = u32::from_str_radix(&hex, 16) {
        if let Some(c) = char::from_u32(code) {
            out.push(c);
            return;
        }
    }
    out.push('\u{fffd}');
}

/// Escapes text for embedding in a quoted lexical form.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds the canonical lexical form of a plain string literal.
pub fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("5" => true ; "bare integer")]
    #[test_case("-5" => true ; "negative integer")]
    #[test_case("5.5" => false ; "decimal is not integer")]
    fn integer_shapes(lex: &str) -> bool {
        matches!(parse_lexical(lex), Value::Number(Number::Integer(_)))
    }

    #[test]
    fn quoted_forms() {
        assert_eq!(parse_lexical("\"hi\""), Value::Str("hi".into()));
        assert_eq!(
            parse_lexical("\"hi\"@en"),
            Value::LangStr("hi".into(), "en".into())
        );
        assert_eq!(
            parse_lexical("\"5\"^^<http://www.w3.org/2001/XMLSchema#integer>"),
            Value::Number(Number::Integer(5.into()))
        );
    }

    #[test]
    fn promotion_equality() {
        let a = parse_lexical("1");
        let b = parse_lexical("1.0");
        assert!(values_equal(&a, &b));
        assert!(!values_equal_no_int_decimal(&a, &b));
        assert!(values_equal_no_int_decimal(&a, &parse_lexical("01")));
    }

    #[test]
    fn plain_and_typed_strings_coincide() {
        let plain = parse_lexical("\"x\"");
        let typed = parse_lexical("\"x\"^^<http://www.w3.org/2001/XMLSchema#string>");
        assert!(values_equal(&plain, &typed));
    }

    #[test_case("P1Y" => (12, 0.0) ; "one year")]
    #[test_case("PT1H30M" => (0, 5400.0) ; "ninety minutes")]
    #[test_case("-P1D" => (0, -86400.0) ; "negative day")]
    fn durations(lex: &str) -> (i64, f64) {
        let d = Duration::parse(lex).unwrap();
        (d.months, d.seconds)
    }

    #[test]
    fn duration_roundtrip() {
        for lex in &["P1Y", "PT1H30M", "P2DT3H", "PT0S"] {
            let d = Duration::parse(lex).unwrap();
            assert_eq!(&d.lexical(), lex);
        }
    }

    #[test]
    fn datetime_difference_inputs() {
        let a = parse_datetime("2024-01-01T00:00:00Z").unwrap();
        let b = parse_datetime("2024-01-01T01:00:00+01:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn escapes_roundtrip() {
        let text = "a\"b\\c\nd";
        assert_eq!(unescape(&escape(text)), text);
    }

    #[test]
    fn format_floats() {
        assert_eq!(format_f64(5.5), "5.5");
        assert_eq!(format_f64(5.0), "5.0");
    }
}
