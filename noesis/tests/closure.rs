//! End-to-end closure scenarios.

use noesis::{Error, Options, Reasoner, Term, Triple};
use std::rc::Rc;

fn reasoner(doc: &str) -> Reasoner {
    let mut r = Reasoner::new(Options::default());
    r.load_str(doc).unwrap();
    r
}

#[test]
fn transitive_closure_over_backward_rules() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        :alice :parent :bob .
        { ?x :ancestor ?z } <= { ?x :parent ?z } .
        { ?x :ancestor ?z } <= { ?x :parent ?y . ?y :ancestor ?z } .
        "#,
    );
    r.run().unwrap();
    let goal = Triple::new(
        Term::var("x"),
        r.session().iri("http://example.org/ancestor"),
        r.session().iri("http://example.org/bob"),
    );
    let answers = r.prove(&[goal], None, &[Rc::from("x")]);
    assert_eq!(answers.len(), 1);
    assert_eq!(
        answers[0].get("x"),
        Some(&r.session().iri("http://example.org/alice"))
    );
}

#[test]
fn deeper_ancestry_enumerates_all_bindings() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        :alice :parent :bob .
        :bob :parent :carol .
        :carol :parent :dora .
        { ?x :ancestor ?z } <= { ?x :parent ?z } .
        { ?x :ancestor ?z } <= { ?x :parent ?y . ?y :ancestor ?z } .
        "#,
    );
    r.run().unwrap();
    let goal = Triple::new(
        Term::var("x"),
        r.session().iri("http://example.org/ancestor"),
        r.session().iri("http://example.org/dora"),
    );
    let answers = r.prove(&[goal], None, &[Rc::from("x")]);
    let mut found: Vec<String> = answers
        .iter()
        .filter_map(|a| match a.get("x") {
            Some(Term::Iri(iri)) => Some(iri.to_string()),
            _ => None,
        })
        .collect();
    found.sort();
    found.dedup();
    assert_eq!(
        found,
        vec![
            "http://example.org/alice",
            "http://example.org/bob",
            "http://example.org/carol"
        ]
    );
}

#[test]
fn forward_derivation_skolemizes_head_blanks() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        :a :wantsPet true .
        { :a :wantsPet true } => { :a :hasPet _:p . _:p :kind :Cat } .
        "#,
    );
    r.run().unwrap();
    assert_eq!(r.derived().len(), 2);
    let has_pet = r.session().iri("http://example.org/hasPet");
    let kind = r.session().iri("http://example.org/kind");
    let pet = r
        .facts()
        .find(|t| t.p == has_pet)
        .map(|t| t.o.clone())
        .unwrap();
    assert!(matches!(pet, Term::Blank(_)));
    // the same skolemized node carries the :kind edge
    assert!(r.facts().any(|t| t.p == kind && t.s == pet));

    // closure idempotence: running again derives nothing new
    let before = r.derived().len();
    r.run().unwrap();
    assert_eq!(r.derived().len(), before);
}

#[test]
fn fuse_terminates_the_run() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix math: <http://www.w3.org/2000/10/swap/math#> .
        :a :age -1 .
        { ?x :age ?n . ?n math:lessThan 0 } => false .
        "#,
    );
    match r.run() {
        Err(Error::FuseTriggered { rule }) => assert_eq!(rule, 0),
        other => panic!("expected a fuse, got {:?}", other.err()),
    }
    // no literal `false` entered the store
    assert!(!r.facts().any(|t| matches!(&t.o, Term::Literal(lex) if &**lex == "false")));
}

#[test]
fn numeric_promotion_in_sums() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix math: <http://www.w3.org/2000/10/swap/math#> .
        :p :h 3 .
        :p :t 2.5 .
        { ?x :h ?a . ?x :t ?b . (?a ?b) math:sum ?s } => { ?x :tot ?s } .
        "#,
    );
    r.run().unwrap();
    let tot = r.session().iri("http://example.org/tot");
    let derived = r.facts().find(|t| t.p == tot).unwrap();
    assert_eq!(derived.o, r.session().literal("5.5"));
}

#[test]
fn output_strings_collect_in_key_order() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix log: <http://www.w3.org/2000/10/swap/log#> .
        :go :now true .
        { :go :now true } => { 2 log:outputString "world" } .
        { :go :now true } => { 10 log:outputString "!" } .
        { :go :now true } => { 1 log:outputString "hello " } .
        "#,
    );
    r.run().unwrap();
    assert_eq!(r.output_strings(), "hello world!");
}

#[test]
fn scoped_closure_against_a_formula() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix log: <http://www.w3.org/2000/10/swap/log#> .
        { { :a :p :b } log:notIncludes { :a :q :b } } => { :a :r :b } .
        "#,
    );
    r.run().unwrap();
    let rel = r.session().iri("http://example.org/r");
    assert!(r.facts().any(|t| t.p == rel));

    // widening the scope formula makes the premise fail
    let mut closed = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix log: <http://www.w3.org/2000/10/swap/log#> .
        { { :a :p :b . :a :q :b } log:notIncludes { :a :q :b } } => { :a :r :b } .
        "#,
    );
    closed.run().unwrap();
    let rel = closed.session().iri("http://example.org/r");
    assert!(!closed.facts().any(|t| t.p == rel));
}

#[test]
fn scoped_closure_snapshot_via_variable_scope() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix log: <http://www.w3.org/2000/10/swap/log#> .
        :a :p :b .
        { ?world log:includes { :a :p :b } } => { :a :seen :b } .
        "#,
    );
    r.run().unwrap();
    let seen = r.session().iri("http://example.org/seen");
    assert!(r.facts().any(|t| t.p == seen));
}

#[test]
fn empty_premise_fires_unconditionally() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        true => { :sun :is :shining } .
        "#,
    );
    r.run().unwrap();
    assert_eq!(r.derived().len(), 1);
}

#[test]
fn rule_as_data_promotes_runtime_rules() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        @prefix log: <http://www.w3.org/2000/10/swap/log#> .
        :a :p :b .
        :trigger :on true .
        { :trigger :on true } => { { ?x :p ?y } log:implies { ?x :q ?y } } .
        "#,
    );
    r.run().unwrap();
    let q = r.session().iri("http://example.org/q");
    assert!(r.facts().any(|t| t.p == q));
    // the promoted rule is also visible as data
    assert_eq!(r.rules().forward.len(), 2);
}

#[test]
fn non_ground_conclusions_are_dropped() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        :a :p :b .
        { :a :p :b } => { :a :q ?unbound } .
        "#,
    );
    r.run().unwrap();
    let q = r.session().iri("http://example.org/q");
    assert!(!r.facts().any(|t| t.p == q));
}

#[test]
fn derivations_carry_premises_and_bindings() {
    let mut r = reasoner(
        r#"
        @prefix : <http://example.org/> .
        :alice :parent :bob .
        { ?x :parent ?y } => { ?y :child ?x } .
        "#,
    );
    r.run().unwrap();
    let derivation = &r.derived()[0];
    assert_eq!(derivation.rule, 0);
    assert_eq!(derivation.premises.len(), 1);
    assert_eq!(
        derivation.bindings.get("x"),
        Some(&r.session().iri("http://example.org/alice"))
    );
    let rendered = derivation.render(r.rules(), r.prolog());
    assert!(rendered.contains("rule 0"));
    assert!(rendered.contains("?x = "));
}

#[test]
fn super_restricted_mode_disables_builtins() {
    let mut r = Reasoner::new(Options {
        super_restricted: true,
        ..Options::default()
    });
    r.load_str(
        r#"
        @prefix : <http://example.org/> .
        @prefix math: <http://www.w3.org/2000/10/swap/math#> .
        :go :now true .
        { :go :now true . (1 2) math:sum ?s } => { :go :sum ?s } .
        "#,
    )
    .unwrap();
    r.run().unwrap();
    let sum = r.session().iri("http://example.org/sum");
    assert!(!r.facts().any(|t| t.p == sum));
}
