//! List builtins of the `list:` vocabulary, plus `rdf:first`/`rdf:rest`
//! acting on native list terms.

use super::{check_or_bind, elements_of, succeed, try_opt, value_of, Solutions};
use crate::reason::Prover;
use crate::term::literal::{Number, Value};
use crate::term::{canon_key, Term, Triple};
use crate::unify::{terms_equal, terms_equal_no_int_decimal, unify, Subst};
use num_bigint::BigInt;
use std::cmp::Ordering;

fn index_literal(pv: &Prover<'_>, index: usize) -> Term {
    pv.session.number(&Number::Integer(BigInt::from(index)))
}

/// `l list:first ?x`
pub fn first(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    let head = try_opt!(elements.first());
    check_or_bind(o, head, pv.session)
}

/// `l list:rest ?x`
pub fn rest(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    if elements.is_empty() {
        return Vec::new();
    }
    check_or_bind(o, &Term::List(elements[1..].to_vec()), pv.session)
}

/// `l list:firstRest (?f ?r)`
pub fn first_rest(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    if elements.is_empty() {
        return Vec::new();
    }
    let pair = Term::List(vec![
        elements[0].clone(),
        Term::List(elements[1..].to_vec()),
    ]);
    check_or_bind(o, &pair, pv.session)
}

/// `l list:last ?x`
pub fn last(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    let tail = try_opt!(elements.last());
    check_or_bind(o, tail, pv.session)
}

/// `l list:length ?n`
pub fn length(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    check_or_bind(o, &index_literal(pv, elements.len()), pv.session)
}

/// `(l1 l2 …) list:append ?x` — concatenation when the parts are known,
/// and splitting: with the result known, variable parts enumerate every
/// way of cutting it.
pub fn append(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let parts = try_opt!(elements_of(s));
    if parts.iter().all(|p| matches!(p, Term::List(_))) {
        let mut out = Vec::new();
        for part in parts {
            out.extend(try_opt!(elements_of(part)).iter().cloned());
        }
        return check_or_bind(o, &Term::List(out), pv.session);
    }
    let whole = try_opt!(elements_of(o));
    let mut solutions = Vec::new();
    split_parts(parts, whole, &Subst::new(), pv, &mut solutions);
    solutions
}

fn split_parts(
    parts: &[Term],
    remaining: &[Term],
    acc: &Subst,
    pv: &Prover<'_>,
    out: &mut Vec<Subst>,
) {
    match parts.split_first() {
        None => {
            if remaining.is_empty() {
                out.push(acc.clone());
            }
        }
        Some((part, rest_parts)) => {
            // the last part swallows the remainder; earlier parts try
            // every cut point
            if rest_parts.is_empty() {
                if let Some(next) =
                    unify(part, &Term::List(remaining.to_vec()), acc, pv.session)
                {
                    split_parts(rest_parts, &[], &next, pv, out);
                }
                return;
            }
            for cut in 0..=remaining.len() {
                if let Some(next) =
                    unify(part, &Term::List(remaining[..cut].to_vec()), acc, pv.session)
                {
                    split_parts(rest_parts, &remaining[cut..], &next, pv, out);
                }
            }
        }
    }
}

/// `l list:member ?x` — enumerates the elements.
pub fn member(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    elements
        .iter()
        .filter_map(|e| unify(o, e, &Subst::new(), pv.session))
        .collect()
}

/// `?x list:in l` — membership with the list on the object side.
pub fn in_list(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(o));
    elements
        .iter()
        .filter_map(|e| unify(s, e, &Subst::new(), pv.session))
        .collect()
}

/// `(l i) list:memberAt ?x` — zero-based access; index literals compare
/// without integer/decimal promotion, so `1.0` addresses nothing.
pub fn member_at(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let pair = try_opt!(elements_of(s));
    if pair.len() != 2 {
        return Vec::new();
    }
    let elements = try_opt!(elements_of(&pair[0]));
    match &pair[1] {
        Term::Var(_) => {
            let mut solutions = Vec::new();
            for (i, element) in elements.iter().enumerate() {
                if let Some(delta) = unify(&pair[1], &index_literal(pv, i), &Subst::new(), pv.session)
                {
                    if let Some(delta) = unify(o, element, &delta, pv.session) {
                        solutions.push(delta);
                    }
                }
            }
            solutions
        }
        given => {
            for (i, element) in elements.iter().enumerate() {
                if terms_equal_no_int_decimal(given, &index_literal(pv, i), pv.session) {
                    return check_or_bind(o, element, pv.session);
                }
            }
            Vec::new()
        }
    }
}

/// `l list:iterate (?i ?x)` — enumerates (index, value) pairs.
pub fn iterate(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    let mut solutions = Vec::new();
    for (i, element) in elements.iter().enumerate() {
        let pair = Term::List(vec![index_literal(pv, i), element.clone()]);
        if let Some(delta) = unify(o, &pair, &Subst::new(), pv.session) {
            solutions.push(delta);
        }
    }
    solutions
}

/// `l list:notMember x` — no element equals the ground item.
pub fn not_member(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    if elements.iter().any(|e| terms_equal(e, o, pv.session)) {
        Vec::new()
    } else {
        succeed()
    }
}

/// `(l x) list:remove ?out` — the list minus every occurrence of the
/// ground item.
pub fn remove(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let pair = try_opt!(elements_of(s));
    if pair.len() != 2 {
        return Vec::new();
    }
    let elements = try_opt!(elements_of(&pair[0]));
    let kept: Vec<Term> = elements
        .iter()
        .filter(|e| !terms_equal(e, &pair[1], pv.session))
        .cloned()
        .collect();
    check_or_bind(o, &Term::List(kept), pv.session)
}

/// `l list:reverse ?out`
pub fn reverse(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let elements = try_opt!(elements_of(s));
    let reversed: Vec<Term> = elements.iter().rev().cloned().collect();
    check_or_bind(o, &Term::List(reversed), pv.session)
}

/// `l list:sort ?out` — numerics by value, everything else by its
/// canonical encoding.
pub fn sort(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let mut elements: Vec<Term> = try_opt!(elements_of(s)).to_vec();
    elements.sort_by(|a, b| term_order(a, b, pv));
    check_or_bind(o, &Term::List(elements), pv.session)
}

fn term_order(a: &Term, b: &Term, pv: &Prover<'_>) -> Ordering {
    let num = |t: &Term| match value_of(t, pv.session).as_deref() {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };
    match (num(a), num(b)) {
        (Some(x), Some(y)) => x.cmp_num(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => canon_key(a).cmp(&canon_key(b)),
    }
}

/// `(l pred) list:map ?out` — applies a one-place predicate through the
/// fact store (and backward rules): `out[i]` is the first `v` proving
/// `l[i] pred v`.
pub fn map(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let pair = try_opt!(elements_of(s));
    if pair.len() != 2 {
        return Vec::new();
    }
    let elements = try_opt!(elements_of(&pair[0]));
    let pred = &pair[1];
    let result_var: std::rc::Rc<str> = std::rc::Rc::from("mapped.value");
    let mut mapped = Vec::new();
    for element in elements {
        let goal = Triple::new(
            element.clone(),
            pred.clone(),
            Term::Var(result_var.clone()),
        );
        let answers = pv.prove(&[goal], Some(1), &[result_var.clone()]);
        let answer = try_opt!(answers.first());
        mapped.push(try_opt!(answer.get(&result_var).cloned()));
    }
    check_or_bind(o, &Term::List(mapped), pv.session)
}

/// `l rdf:first ?x` on a native list term.
pub fn rdf_first(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    first(s, o, pv)
}

/// `l rdf:rest ?x` on a native list term.
pub fn rdf_rest(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    rest(s, o, pv)
}
