//! Arithmetic and comparison builtins of the `math:` vocabulary.
//!
//! Results use a promoted numeric datatype (integer < decimal < float <
//! double); integer-integer arithmetic stays exact. Division by zero and
//! non-finite results yield zero solutions. `math:difference` doubles as
//! date arithmetic: two date/dateTime operands yield an `xsd:duration`,
//! a dateTime and a duration yield the dateTime shifted in UTC.

use super::{check_or_bind, number_of, numbers_of, succeed, try_opt, value_of, Solutions};
use crate::ns::xsd;
use crate::reason::Prover;
use crate::term::literal::{Duration, Number, Value};
use crate::term::Term;
use chrono::{DateTime, FixedOffset, Utc};
use num_bigint::BigInt;
use std::cmp::Ordering;

fn rank2(a: &Number, b: &Number) -> u8 {
    a.rank().max(b.rank())
}

fn finite(rank: u8, v: f64) -> Option<Number> {
    if v.is_finite() {
        Some(Number::from_rank(rank.max(1), v))
    } else {
        None
    }
}

fn add(a: &Number, b: &Number) -> Option<Number> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => Some(Number::Integer(x + y)),
        _ => finite(rank2(a, b), a.as_f64() + b.as_f64()),
    }
}

fn sub(a: &Number, b: &Number) -> Option<Number> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => Some(Number::Integer(x - y)),
        _ => finite(rank2(a, b), a.as_f64() - b.as_f64()),
    }
}

fn mul(a: &Number, b: &Number) -> Option<Number> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => Some(Number::Integer(x * y)),
        _ => finite(rank2(a, b), a.as_f64() * b.as_f64()),
    }
}

fn div(a: &Number, b: &Number) -> Option<Number> {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => {
            if *y == BigInt::from(0) {
                return None;
            }
            if (x % y) == BigInt::from(0) {
                Some(Number::Integer(x / y))
            } else {
                finite(1, a.as_f64() / b.as_f64())
            }
        }
        _ => finite(rank2(a, b), a.as_f64() / b.as_f64()),
    }
}

fn big_pow(base: &BigInt, mut exp: u32) -> BigInt {
    let mut result = BigInt::from(1);
    let mut base = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result = &result * &base;
        }
        base = &base * &base;
        exp >>= 1;
    }
    result
}

fn bind_number(o: &Term, n: Number, pv: &Prover<'_>) -> Solutions {
    check_or_bind(o, &pv.session.number(&n), pv.session)
}

/// `(a b …) math:sum ?x` — n-ary addition.
pub fn sum(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    let mut acc = Number::Integer(BigInt::from(0));
    for n in &numbers {
        acc = try_opt!(add(&acc, n));
    }
    bind_number(o, acc, pv)
}

/// `(a b …) math:product ?x` — n-ary multiplication.
pub fn product(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    let mut acc = Number::Integer(BigInt::from(1));
    for n in &numbers {
        acc = try_opt!(mul(&acc, n));
    }
    bind_number(o, acc, pv)
}

/// `(a b) math:difference ?x` — subtraction, or date/duration
/// arithmetic when the operands are temporal values.
pub fn difference(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let pair = try_opt!(super::elements_of(s));
    if pair.len() != 2 {
        return Vec::new();
    }
    if let (Some(a), Some(b)) = (number_of(&pair[0], pv.session), number_of(&pair[1], pv.session))
    {
        let result = try_opt!(sub(&a, &b));
        return bind_number(o, result, pv);
    }
    temporal_difference(&pair[0], &pair[1], o, pv)
}

fn temporal_difference(a: &Term, b: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let left = try_opt!(value_of(a, pv.session));
    let right = try_opt!(value_of(b, pv.session));
    match (&*left, &*right) {
        (Value::DateTime(x), Value::DateTime(y)) => {
            let seconds = (*x - *y).num_milliseconds() as f64 / 1000.0;
            bind_duration(o, Duration::from_seconds(seconds), pv)
        }
        (Value::Date(x), Value::Date(y)) => {
            let seconds = (*x - *y).num_days() as f64 * 86_400.0;
            bind_duration(o, Duration::from_seconds(seconds), pv)
        }
        (Value::DateTime(x), Value::Duration(d)) => {
            let shifted = try_opt!(shift_datetime(*x, d, true));
            let lex = format!(
                "\"{}\"^^<{}>",
                shifted.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                xsd::dateTime
            );
            check_or_bind(o, &pv.session.literal(&lex), pv.session)
        }
        _ => Vec::new(),
    }
}

fn bind_duration(o: &Term, d: Duration, pv: &Prover<'_>) -> Solutions {
    let lex = format!("\"{}\"^^<{}>", d.lexical(), xsd::duration);
    check_or_bind(o, &pv.session.literal(&lex), pv.session)
}

fn shift_datetime(
    dt: DateTime<FixedOffset>,
    d: &Duration,
    negate: bool,
) -> Option<DateTime<Utc>> {
    let months = if negate { -d.months } else { d.months };
    let seconds = if negate { -d.seconds } else { d.seconds };
    let utc = dt.with_timezone(&Utc);
    let utc = if months >= 0 {
        utc.checked_add_months(chrono::Months::new(months as u32))?
    } else {
        utc.checked_sub_months(chrono::Months::new((-months) as u32))?
    };
    utc.checked_add_signed(chrono::Duration::milliseconds((seconds * 1000.0) as i64))
}

/// `(a b) math:quotient ?x` — division; integer division stays exact
/// when it divides evenly.
pub fn quotient(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    if numbers.len() != 2 {
        return Vec::new();
    }
    let result = try_opt!(div(&numbers[0], &numbers[1]));
    bind_number(o, result, pv)
}

/// `(a b) math:remainder ?x`
pub fn remainder(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    if numbers.len() != 2 {
        return Vec::new();
    }
    let result = match (&numbers[0], &numbers[1]) {
        (Number::Integer(x), Number::Integer(y)) => {
            if *y == BigInt::from(0) {
                return Vec::new();
            }
            Number::Integer(x % y)
        }
        (a, b) => try_opt!(finite(rank2(a, b), a.as_f64() % b.as_f64())),
    };
    bind_number(o, result, pv)
}

/// `(a b) math:integerQuotient ?x` — division truncated toward zero.
pub fn integer_quotient(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    if numbers.len() != 2 {
        return Vec::new();
    }
    let result = match (&numbers[0], &numbers[1]) {
        (Number::Integer(x), Number::Integer(y)) => {
            if *y == BigInt::from(0) {
                return Vec::new();
            }
            Number::Integer(x / y)
        }
        (a, b) => {
            let v = a.as_f64() / b.as_f64();
            if !v.is_finite() {
                return Vec::new();
            }
            let truncated = format!("{}", v.trunc());
            Number::Integer(try_opt!(truncated.parse().ok()))
        }
    };
    bind_number(o, result, pv)
}

/// `(a b) math:exponentiation ?x`
pub fn exponentiation(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    if numbers.len() != 2 {
        return Vec::new();
    }
    let result = match (&numbers[0], &numbers[1]) {
        (Number::Integer(x), Number::Integer(y)) => match y.to_string().parse::<u32>() {
            Ok(exp) => Number::Integer(big_pow(x, exp)),
            Err(_) => try_opt!(finite(1, numbers[0].as_f64().powf(numbers[1].as_f64()))),
        },
        (a, b) => try_opt!(finite(rank2(a, b), a.as_f64().powf(b.as_f64()))),
    };
    bind_number(o, result, pv)
}

/// `a math:absoluteValue ?x`
pub fn absolute_value(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let n = try_opt!(number_of(s, pv.session));
    let result = match &n {
        Number::Integer(x) => {
            if *x < BigInt::from(0) {
                Number::Integer(-x)
            } else {
                n.clone()
            }
        }
        other => try_opt!(finite(other.rank(), other.as_f64().abs())),
    };
    bind_number(o, result, pv)
}

/// `a math:rounded ?x` — the nearest integer.
pub fn rounded(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let n = try_opt!(number_of(s, pv.session));
    let result = match &n {
        Number::Integer(_) => n.clone(),
        other => {
            let v = other.as_f64();
            if !v.is_finite() {
                return Vec::new();
            }
            Number::Integer(try_opt!(format!("{}", v.round()).parse().ok()))
        }
    };
    bind_number(o, result, pv)
}

/// `a math:negation ?x`, usable in either direction.
pub fn negation(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let negate = |n: &Number| -> Option<Number> {
        match n {
            Number::Integer(x) => Some(Number::Integer(-x)),
            other => finite(other.rank(), -other.as_f64()),
        }
    };
    if let Some(n) = number_of(s, pv.session) {
        return bind_number(o, try_opt!(negate(&n)), pv);
    }
    if let Some(n) = number_of(o, pv.session) {
        return bind_number(s, try_opt!(negate(&n)), pv);
    }
    Vec::new()
}

fn unary_double(s: &Term, o: &Term, pv: &Prover<'_>, f: fn(f64) -> f64) -> Solutions {
    let n = try_opt!(number_of(s, pv.session));
    let v = f(n.as_f64());
    if !v.is_finite() {
        return Vec::new();
    }
    bind_number(o, Number::Double(v), pv)
}

macro_rules! trig {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub fn $name(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
            unary_double(s, o, pv, f64::$name)
        }
    };
}

trig!(/** `a math:sin ?x` */ sin);
trig!(/** `a math:cos ?x` */ cos);
trig!(/** `a math:tan ?x` */ tan);
trig!(/** `a math:asin ?x` */ asin);
trig!(/** `a math:acos ?x` */ acos);
trig!(/** `a math:atan ?x` */ atan);
trig!(/** `a math:sinh ?x` */ sinh);
trig!(/** `a math:cosh ?x` */ cosh);
trig!(/** `a math:tanh ?x` */ tanh);

/// `(y x) math:atan2 ?a`
pub fn atan2(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let numbers = try_opt!(numbers_of(s, pv.session));
    if numbers.len() != 2 {
        return Vec::new();
    }
    let v = numbers[0].as_f64().atan2(numbers[1].as_f64());
    if !v.is_finite() {
        return Vec::new();
    }
    bind_number(o, Number::Double(v), pv)
}

/// `radians math:degrees ?x`
pub fn degrees(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    unary_double(s, o, pv, f64::to_degrees)
}

fn compare(s: &Term, o: &Term, pv: &Prover<'_>, test: fn(Ordering) -> bool) -> Solutions {
    let a = try_opt!(number_of(s, pv.session));
    let b = try_opt!(number_of(o, pv.session));
    match a.cmp_num(&b) {
        Some(ordering) if test(ordering) => succeed(),
        _ => Vec::new(),
    }
}

/// `a math:equalTo b`
pub fn equal_to(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    compare(s, o, pv, |ord| ord == Ordering::Equal)
}

/// `a math:notEqualTo b`
pub fn not_equal_to(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    compare(s, o, pv, |ord| ord != Ordering::Equal)
}

/// `a math:lessThan b`
pub fn less_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    compare(s, o, pv, |ord| ord == Ordering::Less)
}

/// `a math:greaterThan b`
pub fn greater_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    compare(s, o, pv, |ord| ord == Ordering::Greater)
}

/// `a math:notLessThan b`
pub fn not_less_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    compare(s, o, pv, |ord| ord != Ordering::Less)
}

/// `a math:notGreaterThan b`
pub fn not_greater_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    compare(s, o, pv, |ord| ord != Ordering::Greater)
}
