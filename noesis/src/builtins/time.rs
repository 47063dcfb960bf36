//! Time builtins of the `time:` vocabulary.
//!
//! The extraction builtins read components out of an `xsd:dateTime`
//! literal; `time:localTime` binds a wall-clock value memoized for the
//! run (or the fixed override, when one is set).

use super::{check_or_bind, try_opt, value_of, Solutions};
use crate::ns::xsd;
use crate::reason::Prover;
use crate::term::literal::{Number, Value};
use crate::term::Term;
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use num_bigint::BigInt;

fn datetime_of(term: &Term, pv: &Prover<'_>) -> Option<DateTime<FixedOffset>> {
    match &*value_of(term, pv.session)? {
        Value::DateTime(dt) => Some(*dt),
        _ => None,
    }
}

fn extract(s: &Term, o: &Term, pv: &Prover<'_>, f: fn(&DateTime<FixedOffset>) -> i64) -> Solutions {
    let dt = try_opt!(datetime_of(s, pv));
    let n = Number::Integer(BigInt::from(f(&dt)));
    check_or_bind(o, &pv.session.number(&n), pv.session)
}

/// `dt time:year ?n`
pub fn year(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    extract(s, o, pv, |dt| dt.year() as i64)
}

/// `dt time:month ?n`
pub fn month(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    extract(s, o, pv, |dt| dt.month() as i64)
}

/// `dt time:day ?n`
pub fn day(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    extract(s, o, pv, |dt| dt.day() as i64)
}

/// `dt time:hour ?n`
pub fn hour(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    extract(s, o, pv, |dt| dt.hour() as i64)
}

/// `dt time:minute ?n`
pub fn minute(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    extract(s, o, pv, |dt| dt.minute() as i64)
}

/// `dt time:second ?n` — seconds with the fractional part.
pub fn second(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let dt = try_opt!(datetime_of(s, pv));
    let seconds = dt.second() as f64 + dt.nanosecond() as f64 / 1e9;
    let n = if seconds.fract() == 0.0 {
        Number::Integer(BigInt::from(dt.second() as i64))
    } else {
        Number::Decimal(seconds)
    };
    check_or_bind(o, &pv.session.number(&n), pv.session)
}

/// `dt time:timeZone ?tz` — the offset as written, `Z` for UTC.
pub fn time_zone(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let dt = try_opt!(datetime_of(s, pv));
    let seconds = dt.offset().local_minus_utc();
    let text = if seconds == 0 {
        "Z".to_string()
    } else {
        let sign = if seconds < 0 { '-' } else { '+' };
        let abs = seconds.abs();
        format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    };
    check_or_bind(o, &pv.session.str_literal(&text), pv.session)
}

/// `?any time:localTime ?dt` — the per-run wall clock.
pub fn local_time(_s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let lex = format!("\"{}\"^^<{}>", pv.session.now_lexical(), xsd::dateTime);
    check_or_bind(o, &pv.session.literal(&lex), pv.session)
}
