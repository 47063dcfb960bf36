//! Builtin library behavior, driven through the prover.

use noesis::ns::{crypto, list, log, math, string, time, xsd};
use noesis::{Options, Reasoner, Subst, Term, Triple};
use std::rc::Rc;

fn fixture() -> Reasoner {
    Reasoner::new(Options::default())
}

fn ask(r: &Reasoner, s: Term, p: &str, o: Term) -> Vec<Subst> {
    let goal = Triple::new(s, r.session().iri(p), o);
    r.prove(&[goal], None, &[Rc::from("x"), Rc::from("y")])
}

fn one(r: &Reasoner, s: Term, p: &str, o: Term) -> Term {
    let answers = ask(r, s, p, o);
    assert_eq!(answers.len(), 1, "expected exactly one solution");
    answers[0].get("x").cloned().expect("?x bound")
}

#[test]
fn exact_integer_arithmetic() {
    let r = fixture();
    let big = "123456789012345678901234567890";
    let args = Term::List(vec![r.session().literal(big), r.session().literal(big)]);
    assert_eq!(
        one(&r, args, math::sum, Term::var("x")),
        r.session().literal("246913578024691357802469135780")
    );
}

#[test]
fn division_by_zero_has_no_solutions() {
    let r = fixture();
    let args = Term::List(vec![r.session().literal("1"), r.session().literal("0")]);
    assert!(ask(&r, args, math::quotient, Term::var("x")).is_empty());
}

#[test]
fn quotient_promotes_when_inexact() {
    let r = fixture();
    let args = Term::List(vec![r.session().literal("7"), r.session().literal("2")]);
    assert_eq!(
        one(&r, args, math::quotient, Term::var("x")),
        r.session().literal("3.5")
    );
    let exact = Term::List(vec![r.session().literal("8"), r.session().literal("2")]);
    assert_eq!(
        one(&r, exact, math::quotient, Term::var("x")),
        r.session().literal("4")
    );
}

#[test]
fn datetime_difference_is_a_duration() {
    let r = fixture();
    let dt = |lex: &str| {
        r.session()
            .literal(&format!("\"{}\"^^<{}>", lex, xsd::dateTime))
    };
    let args = Term::List(vec![
        dt("2024-01-02T00:00:00Z"),
        dt("2024-01-01T22:30:00Z"),
    ]);
    assert_eq!(
        one(&r, args, math::difference, Term::var("x")),
        r.session()
            .literal(&format!("\"PT1H30M\"^^<{}>", xsd::duration))
    );
}

#[test]
fn comparisons_mix_integer_and_float() {
    let r = fixture();
    let a = r.session().literal("2");
    let b = r.session().literal("2.5");
    assert_eq!(ask(&r, a.clone(), math::lessThan, b.clone()).len(), 1);
    assert!(ask(&r, b, math::lessThan, a).is_empty());
}

#[test]
fn string_concatenation_and_format() {
    let r = fixture();
    let parts = Term::List(vec![
        r.session().str_literal("n3 "),
        r.session().literal("42"),
    ]);
    assert_eq!(
        one(&r, parts, string::concatenation, Term::var("x")),
        r.session().str_literal("n3 42")
    );
    let fmt = Term::List(vec![
        r.session().str_literal("%s%% of %s"),
        r.session().literal("90"),
        r.session().str_literal("tests"),
    ]);
    assert_eq!(
        one(&r, fmt, string::format, Term::var("x")),
        r.session().str_literal("90% of tests")
    );
}

#[test]
fn string_equality_in_both_case_modes() {
    let r = fixture();
    let upper = r.session().str_literal("Agent");
    let lower = r.session().str_literal("agent");
    assert!(ask(&r, upper.clone(), string::equal, lower.clone()).is_empty());
    assert_eq!(
        ask(&r, upper.clone(), string::notEqual, lower.clone()).len(),
        1
    );
    assert_eq!(
        ask(&r, upper.clone(), string::equalIgnoringCase, lower).len(),
        1
    );
    assert_eq!(ask(&r, upper.clone(), string::equal, upper).len(), 1);
}

#[test]
fn regex_matching_and_scraping() {
    let r = fixture();
    let hay = r.session().str_literal("agent smith");
    let pattern = r.session().str_literal("^agent\\s+(\\w+)$");
    assert_eq!(ask(&r, hay.clone(), string::matches, pattern.clone()).len(), 1);
    let scraped = one(
        &r,
        Term::List(vec![hay, pattern]),
        string::scrape,
        Term::var("x"),
    );
    assert_eq!(scraped, r.session().str_literal("smith"));
}

#[test]
fn global_replacement() {
    let r = fixture();
    let args = Term::List(vec![
        r.session().str_literal("a-b-c"),
        r.session().str_literal("-"),
        r.session().str_literal("+"),
    ]);
    assert_eq!(
        one(&r, args, string::replace, Term::var("x")),
        r.session().str_literal("a+b+c")
    );
}

#[test]
fn json_pointer_with_fragment_form() {
    let r = fixture();
    let json = r.session().literal(&format!(
        "\"{}\"^^<{}>",
        "{\\\"users\\\":[{\\\"name\\\":\\\"ada\\\"}]}",
        noesis::ns::rdf::JSON
    ));
    let direct = Term::List(vec![json.clone(), r.session().str_literal("/users/0/name")]);
    assert_eq!(
        one(&r, direct, string::jsonPointer, Term::var("x")),
        r.session().str_literal("ada")
    );
    let fragment = Term::List(vec![json, r.session().str_literal("#/users/0/name")]);
    assert_eq!(
        one(&r, fragment, string::jsonPointer, Term::var("x")),
        r.session().str_literal("ada")
    );
}

#[test]
fn list_access_and_length() {
    let r = fixture();
    let l = Term::List(vec![
        r.session().iri("http://e/a"),
        r.session().iri("http://e/b"),
        r.session().iri("http://e/c"),
    ]);
    assert_eq!(
        one(&r, l.clone(), list::first, Term::var("x")),
        r.session().iri("http://e/a")
    );
    assert_eq!(
        one(&r, l.clone(), list::last, Term::var("x")),
        r.session().iri("http://e/c")
    );
    assert_eq!(
        one(&r, l.clone(), list::length, Term::var("x")),
        r.session().literal("3")
    );
    assert_eq!(ask(&r, l, list::member, Term::var("x")).len(), 3);
}

#[test]
fn append_concatenates_and_splits() {
    let r = fixture();
    let ab = Term::List(vec![r.session().literal("1"), r.session().literal("2")]);
    let c = Term::List(vec![r.session().literal("3")]);
    let whole = Term::List(vec![
        r.session().literal("1"),
        r.session().literal("2"),
        r.session().literal("3"),
    ]);
    assert_eq!(
        one(
            &r,
            Term::List(vec![ab, c]),
            list::append,
            Term::var("x")
        ),
        whole
    );
    // splitting: both parts unknown, result given
    let parts = Term::List(vec![Term::var("x"), Term::var("y")]);
    let splits = ask(&r, parts, list::append, whole);
    assert_eq!(splits.len(), 4);
}

#[test]
fn member_at_rejects_decimal_indexes() {
    let r = fixture();
    let l = Term::List(vec![
        r.session().iri("http://e/a"),
        r.session().iri("http://e/b"),
    ]);
    let at_one = Term::List(vec![l.clone(), r.session().literal("1")]);
    assert_eq!(
        one(&r, at_one, list::memberAt, Term::var("x")),
        r.session().iri("http://e/b")
    );
    let at_decimal = Term::List(vec![l, r.session().literal("1.0")]);
    assert!(ask(&r, at_decimal, list::memberAt, Term::var("x")).is_empty());
}

#[test]
fn sort_orders_numerics_by_value() {
    let r = fixture();
    let l = Term::List(vec![
        r.session().literal("10"),
        r.session().literal("2.5"),
        r.session().literal("3"),
    ]);
    assert_eq!(
        one(&r, l, list::sort, Term::var("x")),
        Term::List(vec![
            r.session().literal("2.5"),
            r.session().literal("3"),
            r.session().literal("10"),
        ])
    );
}

#[test]
fn digest_vectors() {
    let r = fixture();
    let abc = r.session().str_literal("abc");
    assert_eq!(
        one(&r, abc.clone(), crypto::md5, Term::var("x")),
        r.session()
            .str_literal("900150983cd24fb0d6963f7d28e17f72")
    );
    assert_eq!(
        one(&r, abc.clone(), crypto::sha, Term::var("x")),
        r.session()
            .str_literal("a9993e364706816aba3e25717850c26c9cd0d89d")
    );
    assert_eq!(
        one(&r, abc, crypto::sha256, Term::var("x")),
        r.session()
            .str_literal("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
    );
}

#[test]
fn time_components() {
    let r = fixture();
    let dt = r.session().literal(&format!(
        "\"2024-03-09T17:45:30.5+01:00\"^^<{}>",
        xsd::dateTime
    ));
    assert_eq!(
        one(&r, dt.clone(), time::year, Term::var("x")),
        r.session().literal("2024")
    );
    assert_eq!(
        one(&r, dt.clone(), time::minute, Term::var("x")),
        r.session().literal("45")
    );
    assert_eq!(
        one(&r, dt.clone(), time::second, Term::var("x")),
        r.session().literal("30.5")
    );
    assert_eq!(
        one(&r, dt, time::timeZone, Term::var("x")),
        r.session().str_literal("+01:00")
    );
}

#[test]
fn fixed_local_time() {
    let r = Reasoner::new(Options {
        fixed_now: Some("2024-02-01T00:00:00Z".into()),
        ..Options::default()
    });
    let now = one(
        &r,
        r.session().iri("http://e/any"),
        time::localTime,
        Term::var("x"),
    );
    assert_eq!(
        now,
        r.session()
            .literal(&format!("\"2024-02-01T00:00:00Z\"^^<{}>", xsd::dateTime))
    );
}

#[test]
fn skolem_is_stable_within_and_across_runs() {
    let a = fixture();
    let b = fixture();
    let subject = |r: &Reasoner| {
        Term::List(vec![
            r.session().iri("http://e/a"),
            r.session().literal("1"),
        ])
    };
    let first = one(&a, subject(&a), log::skolem, Term::var("x"));
    let again = one(&a, subject(&a), log::skolem, Term::var("x"));
    let other_run = one(&b, subject(&b), log::skolem, Term::var("x"));
    assert_eq!(first, again);
    assert_eq!(first, other_run);
    match &first {
        Term::Iri(iri) => assert!(iri.starts_with(noesis::ns::SKOLEM_NS)),
        other => panic!("expected an IRI, got {:?}", other),
    }
}

#[test]
fn uri_conversion_both_ways() {
    let r = fixture();
    assert_eq!(
        one(
            &r,
            r.session().iri("http://e/a"),
            log::uri,
            Term::var("x")
        ),
        r.session().str_literal("http://e/a")
    );
    let answers = r.prove(
        &[Triple::new(
            Term::var("x"),
            r.session().iri(log::uri),
            r.session().str_literal("http://e/b"),
        )],
        None,
        &[Rc::from("x")],
    );
    assert_eq!(answers[0].get("x"), Some(&r.session().iri("http://e/b")));
}

#[test]
fn dtlit_builds_and_splits() {
    let r = fixture();
    let parts = Term::List(vec![
        r.session().str_literal("5"),
        r.session().iri(xsd::integer),
    ]);
    assert_eq!(
        one(&r, parts, log::dtlit, Term::var("x")),
        r.session()
            .literal(&format!("\"5\"^^<{}>", xsd::integer))
    );
    // splitting a bare numeral infers its datatype
    let answers = r.prove(
        &[Triple::new(
            Term::var("x"),
            r.session().iri(log::dtlit),
            r.session().literal("5"),
        )],
        None,
        &[Rc::from("x")],
    );
    assert_eq!(
        answers[0].get("x"),
        Some(&Term::List(vec![
            r.session().str_literal("5"),
            r.session().iri(xsd::integer),
        ]))
    );
}

#[test]
fn langlit_builds_and_splits() {
    let r = fixture();
    let parts = Term::List(vec![
        r.session().str_literal("hallo"),
        r.session().str_literal("de"),
    ]);
    assert_eq!(
        one(&r, parts, log::langlit, Term::var("x")),
        r.session().literal("\"hallo\"@de")
    );
}

#[test]
fn raw_types() {
    let r = fixture();
    let cases: Vec<(Term, &str)> = vec![
        (Term::Formula(vec![]), log::Formula),
        (r.session().literal("5"), log::Literal),
        (Term::List(vec![]), noesis::ns::rdf::List),
        (r.session().iri("http://e/a"), log::Other),
        (Term::blank("b"), log::Other),
    ];
    for (term, expected) in cases {
        assert_eq!(
            one(&r, term, log::rawType, Term::var("x")),
            r.session().iri(expected)
        );
    }
}

#[test]
fn conjunction_unions_and_commutes() {
    let r = fixture();
    let f = Term::Formula(vec![Triple::new(
        r.session().iri("http://e/a"),
        r.session().iri("http://e/p"),
        r.session().iri("http://e/b"),
    )]);
    let g = Term::Formula(vec![Triple::new(
        r.session().iri("http://e/c"),
        r.session().iri("http://e/q"),
        r.session().iri("http://e/d"),
    )]);
    let empty = Term::Formula(vec![]);

    // conjunction with the empty formula is identity
    assert_eq!(
        one(
            &r,
            Term::List(vec![f.clone(), empty]),
            log::conjunction,
            Term::var("x")
        ),
        f
    );
    let fg = one(
        &r,
        Term::List(vec![f.clone(), g.clone()]),
        log::conjunction,
        Term::var("x"),
    );
    let gf = one(&r, Term::List(vec![g, f]), log::conjunction, Term::var("x"));
    assert!(noesis::unify::formulas_alpha_eq(
        match &fg {
            Term::Formula(ts) => ts,
            _ => panic!(),
        },
        match &gf {
            Term::Formula(ts) => ts,
            _ => panic!(),
        },
        r.session()
    ));
}

#[test]
fn parsed_as_n3_lifts_rules_into_the_formula() {
    let r = fixture();
    let text = r.session().str_literal(
        "@prefix : <http://e/> . :a :p :b . { ?x :p ?y } => { ?x :q ?y } .",
    );
    let formula = one(&r, text, log::parsedAsN3, Term::var("x"));
    match formula {
        Term::Formula(ts) => {
            assert_eq!(ts.len(), 2);
            assert!(ts
                .iter()
                .any(|t| t.p == r.session().iri(log::implies)));
        }
        other => panic!("expected formula, got {:?}", other),
    }
}

#[test]
fn conclusion_computes_an_embedded_closure() {
    let r = fixture();
    let text = r.session().str_literal(
        "@prefix : <http://e/> . :a :p :b . { ?x :p ?y } => { ?x :q ?y } .",
    );
    let formula = one(&r, text, log::parsedAsN3, Term::var("x"));
    let closed = one(&r, formula, log::conclusion, Term::var("x"));
    match closed {
        Term::Formula(ts) => {
            assert_eq!(ts.len(), 2);
            assert!(ts.iter().any(|t| t.p == r.session().iri("http://e/q")));
        }
        other => panic!("expected formula, got {:?}", other),
    }
}

#[test]
fn implies_enumerates_active_rules() {
    let mut r = fixture();
    r.load_str(
        "@prefix : <http://e/> . { ?x :p ?y } => { ?x :q ?y } .",
    )
    .unwrap();
    let answers = r.prove(
        &[Triple::new(
            Term::var("x"),
            r.session().iri(log::implies),
            Term::var("y"),
        )],
        None,
        &[Rc::from("x"), Rc::from("y")],
    );
    assert_eq!(answers.len(), 1);
    assert!(matches!(answers[0].get("x"), Some(Term::Formula(_))));
    assert!(matches!(answers[0].get("y"), Some(Term::Formula(_))));
}
