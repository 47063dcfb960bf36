//! String builtins of the `string:` vocabulary.

use super::{check_or_bind, elements_of, succeed, text_of, try_opt, value_of, Solutions};
use crate::reason::Prover;
use crate::term::literal::{Number, Value};
use crate::term::Term;
use regex::Regex;
use std::cmp::Ordering;

/// `(a b …) string:concatenation ?x`
pub fn concatenation(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let parts = try_opt!(elements_of(s));
    let mut out = String::new();
    for part in parts {
        out.push_str(&try_opt!(text_of(part, pv.session)));
    }
    check_or_bind(o, &pv.session.str_literal(&out), pv.session)
}

/// `(fmt a b …) string:format ?x` — only `%s` and `%%` are
/// interpreted.
pub fn format(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let parts = try_opt!(elements_of(s));
    if parts.is_empty() {
        return Vec::new();
    }
    let template = try_opt!(text_of(&parts[0], pv.session));
    let mut args = parts[1..].iter();
    let mut out = String::new();
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => {
                let arg = try_opt!(args.next());
                out.push_str(&try_opt!(text_of(arg, pv.session)));
            }
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    check_or_bind(o, &pv.session.str_literal(&out), pv.session)
}

fn pair_test(
    s: &Term,
    o: &Term,
    pv: &Prover<'_>,
    test: impl Fn(&str, &str) -> bool,
) -> Solutions {
    let a = try_opt!(text_of(s, pv.session));
    let b = try_opt!(text_of(o, pv.session));
    if test(&a, &b) {
        succeed()
    } else {
        Vec::new()
    }
}

/// `a string:contains b`
pub fn contains(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a.contains(b))
}

/// `a string:containsIgnoringCase b`
pub fn contains_ignoring_case(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| {
        a.to_lowercase().contains(&b.to_lowercase())
    })
}

/// `a string:startsWith b`
pub fn starts_with(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a.starts_with(b))
}

/// `a string:endsWith b`
pub fn ends_with(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a.ends_with(b))
}

/// `a string:equal b` — case-sensitive text equality.
pub fn equal(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a == b)
}

/// `a string:notEqual b`
pub fn not_equal(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a != b)
}

/// `a string:equalIgnoringCase b`
pub fn equal_ignoring_case(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a.to_lowercase() == b.to_lowercase())
}

/// `a string:notEqualIgnoringCase b`
pub fn not_equal_ignoring_case(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, b| a.to_lowercase() != b.to_lowercase())
}

fn ordering_test(s: &Term, o: &Term, pv: &Prover<'_>, test: fn(Ordering) -> bool) -> Solutions {
    pair_test(s, o, pv, |a, b| test(a.cmp(b)))
}

/// `a string:lessThan b` — code point order.
pub fn less_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    ordering_test(s, o, pv, |ord| ord == Ordering::Less)
}

/// `a string:greaterThan b`
pub fn greater_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    ordering_test(s, o, pv, |ord| ord == Ordering::Greater)
}

/// `a string:notLessThan b`
pub fn not_less_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    ordering_test(s, o, pv, |ord| ord != Ordering::Less)
}

/// `a string:notGreaterThan b`
pub fn not_greater_than(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    ordering_test(s, o, pv, |ord| ord != Ordering::Greater)
}

/// Compiles a pattern; `\u{…}` escapes are accepted in the JavaScript
/// spelling and mapped to this engine's `\x{…}` (Unicode mode is always
/// on here, so `\p{…}` needs no switch).
fn compile(pattern: &str) -> Option<Regex> {
    let translated = pattern.replace("\\u{", "\\x{");
    Regex::new(&translated).ok()
}

/// `a string:matches pattern`
pub fn matches(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, p| {
        compile(p).map(|re| re.is_match(a)).unwrap_or(false)
    })
}

/// `a string:notMatches pattern`
pub fn not_matches(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    pair_test(s, o, pv, |a, p| {
        compile(p).map(|re| !re.is_match(a)).unwrap_or(false)
    })
}

/// `(text pattern replacement) string:replace ?x` — global replacement.
pub fn replace(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let parts = try_opt!(elements_of(s));
    if parts.len() != 3 {
        return Vec::new();
    }
    let text = try_opt!(text_of(&parts[0], pv.session));
    let pattern = try_opt!(text_of(&parts[1], pv.session));
    let replacement = try_opt!(text_of(&parts[2], pv.session));
    let re = try_opt!(compile(&pattern));
    let replaced = re.replace_all(&text, replacement.as_str());
    check_or_bind(o, &pv.session.str_literal(&replaced), pv.session)
}

/// `(text pattern) string:scrape ?x` — the first capture group of the
/// first match.
pub fn scrape(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let parts = try_opt!(elements_of(s));
    if parts.len() != 2 {
        return Vec::new();
    }
    let text = try_opt!(text_of(&parts[0], pv.session));
    let pattern = try_opt!(text_of(&parts[1], pv.session));
    let re = try_opt!(compile(&pattern));
    let caps = try_opt!(re.captures(&text));
    let group = try_opt!(caps.get(1));
    check_or_bind(o, &pv.session.str_literal(group.as_str()), pv.session)
}

/// `(jsonLiteral pointer) string:jsonPointer ?x` — RFC 6901 evaluation
/// against an `rdf:JSON` literal; the fragment form (`#/a/b` with
/// percent escapes) is accepted. Evaluations are cached per run.
pub fn json_pointer(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let parts = try_opt!(elements_of(s));
    if parts.len() != 2 {
        return Vec::new();
    }
    let json_lex = match &parts[0] {
        Term::Literal(lex) => lex.clone(),
        _ => return Vec::new(),
    };
    let pointer = try_opt!(text_of(&parts[1], pv.session));
    let cache_key = format!("{}\u{1}{}", pointer, json_lex);
    let resolved = match pv.session.cached_json_pointer(&cache_key) {
        Some(hit) => hit,
        None => {
            let computed = evaluate_pointer(&parts[0], &pointer, pv);
            pv.session.cache_json_pointer(cache_key, computed.clone());
            computed
        }
    };
    match resolved {
        Some(term) => check_or_bind(o, &term, pv.session),
        None => Vec::new(),
    }
}

fn evaluate_pointer(json: &Term, pointer: &str, pv: &Prover<'_>) -> Option<Term> {
    let value = value_of(json, pv.session)?;
    let doc = match &*value {
        Value::Json(v) => v.clone(),
        _ => return None,
    };
    let normalized = if let Some(fragment) = pointer.strip_prefix('#') {
        percent_decode(fragment)
    } else {
        pointer.to_string()
    };
    let found = doc.pointer(&normalized)?.clone();
    json_to_term(&found, pv)
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = [bytes[i + 1], bytes[i + 2]];
            if let Ok(code) = u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or("zz"), 16) {
                out.push(code);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

/// Maps a JSON value to a term: scalars become literals, containers stay
/// `rdf:JSON` literals.
pub(crate) fn json_to_term(value: &serde_json::Value, pv: &Prover<'_>) -> Option<Term> {
    use serde_json::Value as Json;
    match value {
        Json::Null => None,
        Json::Bool(b) => Some(pv.session.literal(if *b { "true" } else { "false" })),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(pv.session.number(&Number::Integer(i.into())))
            } else {
                n.as_f64()
                    .filter(|v| v.is_finite())
                    .map(|v| pv.session.number(&Number::Double(v)))
            }
        }
        Json::String(text) => Some(pv.session.str_literal(text)),
        container => {
            let lex = format!(
                "\"{}\"^^<{}>",
                crate::term::literal::escape(&container.to_string()),
                crate::ns::rdf::JSON
            );
            Some(pv.session.literal(&lex))
        }
    }
}
