//! The builtin library.
//!
//! Each builtin is addressed by the predicate IRI of a goal `s P o`,
//! where either side may be a list acting as a multi-argument tuple.
//! Handlers receive subject and object with the current substitution
//! already applied and return substitution deltas:
//!
//! - an unbound output side is bound to the computed value;
//! - ground sides are checked against the relation;
//! - a type or shape mismatch yields zero solutions, never an error.

pub mod crypto;
pub mod lists;
pub mod math;
pub mod meta;
pub mod strings;
pub mod time;

use crate::ns;
use crate::reason::Prover;
use crate::session::Session;
use crate::term::literal::{Number, Value};
use crate::term::Term;
use crate::unify::{unify, Subst};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// The substitution deltas produced by one builtin evaluation.
pub type Solutions = Vec<Subst>;

/// A builtin handler: substituted subject, substituted object, prover
/// context.
pub type BuiltinFn = fn(&Term, &Term, &Prover<'_>) -> Solutions;

macro_rules! table {
    ($($iri:expr => $handler:path),+ $(,)?) => {{
        let mut m: FxHashMap<&'static str, BuiltinFn> = FxHashMap::default();
        $( m.insert($iri, $handler as BuiltinFn); )+
        m
    }};
}

lazy_static! {
    static ref TABLE: FxHashMap<&'static str, BuiltinFn> = table! {
        ns::math::sum => math::sum,
        ns::math::difference => math::difference,
        ns::math::product => math::product,
        ns::math::quotient => math::quotient,
        ns::math::remainder => math::remainder,
        ns::math::integerQuotient => math::integer_quotient,
        ns::math::exponentiation => math::exponentiation,
        ns::math::absoluteValue => math::absolute_value,
        ns::math::rounded => math::rounded,
        ns::math::negation => math::negation,
        ns::math::sin => math::sin,
        ns::math::cos => math::cos,
        ns::math::tan => math::tan,
        ns::math::asin => math::asin,
        ns::math::acos => math::acos,
        ns::math::atan => math::atan,
        ns::math::atan2 => math::atan2,
        ns::math::sinh => math::sinh,
        ns::math::cosh => math::cosh,
        ns::math::tanh => math::tanh,
        ns::math::degrees => math::degrees,
        ns::math::equalTo => math::equal_to,
        ns::math::notEqualTo => math::not_equal_to,
        ns::math::lessThan => math::less_than,
        ns::math::greaterThan => math::greater_than,
        ns::math::notLessThan => math::not_less_than,
        ns::math::notGreaterThan => math::not_greater_than,
        ns::string::concatenation => strings::concatenation,
        ns::string::format => strings::format,
        ns::string::contains => strings::contains,
        ns::string::containsIgnoringCase => strings::contains_ignoring_case,
        ns::string::startsWith => strings::starts_with,
        ns::string::endsWith => strings::ends_with,
        ns::string::equal => strings::equal,
        ns::string::notEqual => strings::not_equal,
        ns::string::equalIgnoringCase => strings::equal_ignoring_case,
        ns::string::notEqualIgnoringCase => strings::not_equal_ignoring_case,
        ns::string::lessThan => strings::less_than,
        ns::string::greaterThan => strings::greater_than,
        ns::string::notLessThan => strings::not_less_than,
        ns::string::notGreaterThan => strings::not_greater_than,
        ns::string::matches => strings::matches,
        ns::string::notMatches => strings::not_matches,
        ns::string::replace => strings::replace,
        ns::string::scrape => strings::scrape,
        ns::string::jsonPointer => strings::json_pointer,
        ns::list::first => lists::first,
        ns::list::rest => lists::rest,
        ns::list::firstRest => lists::first_rest,
        ns::list::last => lists::last,
        ns::list::length => lists::length,
        ns::list::append => lists::append,
        ns::list::member => lists::member,
        ns::list::memberAt => lists::member_at,
        ns::list::iterate => lists::iterate,
        ns::list::in_ => lists::in_list,
        ns::list::notMember => lists::not_member,
        ns::list::remove => lists::remove,
        ns::list::reverse => lists::reverse,
        ns::list::sort => lists::sort,
        ns::list::map => lists::map,
        ns::rdf::first => lists::rdf_first,
        ns::rdf::rest => lists::rdf_rest,
        ns::time::year => time::year,
        ns::time::month => time::month,
        ns::time::day => time::day,
        ns::time::hour => time::hour,
        ns::time::minute => time::minute,
        ns::time::second => time::second,
        ns::time::timeZone => time::time_zone,
        ns::time::localTime => time::local_time,
        ns::crypto::md5 => crypto::md5,
        ns::crypto::sha => crypto::sha,
        ns::crypto::sha256 => crypto::sha256,
        ns::crypto::sha512 => crypto::sha512,
        ns::log::equalTo => meta::equal_to,
        ns::log::notEqualTo => meta::not_equal_to,
        ns::log::conjunction => meta::conjunction,
        ns::log::conclusion => meta::conclusion,
        ns::log::implies => meta::implies,
        ns::log::impliedBy => meta::implied_by,
        ns::log::includes => meta::includes,
        ns::log::notIncludes => meta::not_includes,
        ns::log::forAllIn => meta::for_all_in,
        ns::log::collectAllIn => meta::collect_all_in,
        ns::log::trace => meta::trace,
        ns::log::outputString => meta::output_string,
        ns::log::skolem => meta::skolem,
        ns::log::uri => meta::uri,
        ns::log::dtlit => meta::dtlit,
        ns::log::langlit => meta::langlit,
        ns::log::rawType => meta::raw_type,
        ns::log::parsedAsN3 => meta::parsed_as_n3,
        ns::log::semantics => meta::semantics,
        ns::log::semanticsOrError => meta::semantics_or_error,
        ns::log::content => meta::content,
    };
}

/// Resolves a predicate IRI to its handler. In super-restricted mode
/// every builtin except `log:implies` and `log:impliedBy` is disabled
/// (the I/O builtins in particular are never attempted).
pub fn lookup(session: &Session, pred: &str) -> Option<BuiltinFn> {
    if session.options.super_restricted
        && pred != ns::log::implies
        && pred != ns::log::impliedBy
    {
        return None;
    }
    TABLE.get(pred).copied()
}

/// Unwraps an `Option` inside a builtin, reporting zero solutions on
/// `None`; the shape-mismatch contract of the whole library.
macro_rules! try_opt {
    ($e:expr) => {
        match $e {
            Some(value) => value,
            None => return Vec::new(),
        }
    };
}
pub(crate) use try_opt;

/// One delta when `out` unifies with `computed`, zero otherwise.
pub(crate) fn check_or_bind(out: &Term, computed: &Term, session: &Session) -> Solutions {
    match unify(out, computed, &Subst::new(), session) {
        Some(delta) => vec![delta],
        None => Vec::new(),
    }
}

/// A trivially successful evaluation.
pub(crate) fn succeed() -> Solutions {
    vec![Subst::new()]
}

/// The parsed value of a literal term.
pub(crate) fn value_of(term: &Term, session: &Session) -> Option<Rc<Value>> {
    match term {
        Term::Literal(lex) => Some(session.value(lex)),
        _ => None,
    }
}

/// The numeric value of a literal term.
pub(crate) fn number_of(term: &Term, session: &Session) -> Option<Number> {
    match &*value_of(term, session)? {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

/// The numeric values of a list term, all or nothing.
pub(crate) fn numbers_of(term: &Term, session: &Session) -> Option<Vec<Number>> {
    match term {
        Term::List(elements) => elements
            .iter()
            .map(|e| number_of(e, session))
            .collect(),
        _ => None,
    }
}

/// The string content of a literal term (text of strings, lexical of
/// numbers and booleans).
pub(crate) fn text_of(term: &Term, session: &Session) -> Option<String> {
    crate::term::literal::text_of(&*value_of(term, session)?)
}

/// The elements of a concrete list term.
pub(crate) fn elements_of(term: &Term) -> Option<&[Term]> {
    match term {
        Term::List(elements) => Some(elements),
        _ => None,
    }
}
