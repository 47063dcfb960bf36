//! The term model of the reasoner.
//!
//! Terms are immutable after construction. IRIs and literals are
//! hash-consed per [`Session`](crate::session::Session): requesting the
//! same lexical form twice yields the same allocation, so equality checks
//! hit the pointer fast path before falling back to content comparison.
//! Containers (lists, formulas) own their children by value and are
//! compared structurally.

pub mod literal;

use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A Notation3 term.
#[derive(Clone, Debug)]
pub enum Term {
    /// An absolute resource identifier.
    Iri(Rc<str>),
    /// A literal, stored by its raw lexical form (e.g. `5`, `"hi"@en`,
    /// `"2"^^<http://www.w3.org/2001/XMLSchema#integer>`). The form is
    /// parsed on demand into a [`literal::Value`].
    Literal(Rc<str>),
    /// A universal rule variable, named without the leading `?`.
    Var(Rc<str>),
    /// An existentially scoped node, labeled without the leading `_:`.
    /// Blanks inside a quoted formula are scoped to that formula.
    Blank(Rc<str>),
    /// A finite ordered sequence (concrete RDF collection).
    List(Vec<Term>),
    /// A partially known list: a concrete prefix and a variable tail.
    /// Produced by unifying lists of different known lengths.
    OpenList(Vec<Term>, Rc<str>),
    /// A quoted graph: an unordered multiset of triples, compared up to
    /// α-renaming of its interior variables and blanks.
    Formula(Vec<Triple>),
}

/// A subject-predicate-object statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject term.
    pub s: Term,
    /// Predicate term. Typically an IRI but may be any term.
    pub p: Term,
    /// Object term.
    pub o: Term,
}

impl Triple {
    /// Assembles a triple.
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Triple { s, p, o }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Term::Iri(a), Term::Iri(b))
            | (Term::Literal(a), Term::Literal(b))
            | (Term::Var(a), Term::Var(b))
            | (Term::Blank(a), Term::Blank(b)) => Rc::ptr_eq(a, b) || a == b,
            (Term::List(a), Term::List(b)) => a == b,
            (Term::OpenList(a, at), Term::OpenList(b, bt)) => at == bt && a == b,
            (Term::Formula(a), Term::Formula(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Term::Iri(s) | Term::Literal(s) | Term::Var(s) | Term::Blank(s) => {
                s.hash(state);
            }
            Term::List(xs) => xs.hash(state),
            Term::OpenList(xs, tail) => {
                xs.hash(state);
                tail.hash(state);
            }
            Term::Formula(ts) => ts.hash(state),
        }
    }
}

impl Term {
    /// A variable term from a bare name.
    pub fn var(name: impl AsRef<str>) -> Term {
        Term::Var(Rc::from(name.as_ref()))
    }

    /// A blank node term from a bare label.
    pub fn blank(label: impl AsRef<str>) -> Term {
        Term::Blank(Rc::from(label.as_ref()))
    }

    /// True when the term contains no `Var` and no `OpenList`.
    ///
    /// Blanks are allowed (they are existentials) and quoted formulas
    /// count as ground regardless of their interior: variables inside a
    /// formula are bound by the quotation.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) | Term::OpenList(..) => false,
            Term::List(xs) => xs.iter().all(Term::is_ground),
            _ => true,
        }
    }

    /// True when the term contains no variable, blank or open list
    /// anywhere, including inside quoted formulas.
    pub fn is_strictly_ground(&self) -> bool {
        match self {
            Term::Var(_) | Term::Blank(_) | Term::OpenList(..) => false,
            Term::List(xs) => xs.iter().all(Term::is_strictly_ground),
            Term::Formula(ts) => ts.iter().all(Triple::is_strictly_ground),
            _ => true,
        }
    }

    /// Collects the names of variables reachable in the term, including
    /// those quoted inside formulas and open-list tails.
    pub fn collect_vars(&self, into: &mut Vec<Rc<str>>) {
        match self {
            Term::Var(v) => push_name(into, v),
            Term::List(xs) => xs.iter().for_each(|t| t.collect_vars(into)),
            Term::OpenList(xs, tail) => {
                xs.iter().for_each(|t| t.collect_vars(into));
                push_name(into, tail);
            }
            Term::Formula(ts) => ts.iter().for_each(|t| t.collect_vars(into)),
            _ => {}
        }
    }

    /// Collects blank labels textually present in the term, stopping at
    /// formula boundaries (quoted blanks belong to their formula).
    pub fn collect_blanks(&self, into: &mut FxHashSet<Rc<str>>) {
        match self {
            Term::Blank(b) => {
                into.insert(b.clone());
            }
            Term::List(xs) | Term::OpenList(xs, _) => {
                xs.iter().for_each(|t| t.collect_blanks(into))
            }
            _ => {}
        }
    }
}

impl Triple {
    /// True when subject, predicate and object are all [`Term::is_ground`].
    pub fn is_ground(&self) -> bool {
        self.s.is_ground() && self.p.is_ground() && self.o.is_ground()
    }

    /// True when all three positions are [`Term::is_strictly_ground`].
    pub fn is_strictly_ground(&self) -> bool {
        self.s.is_strictly_ground() && self.p.is_strictly_ground() && self.o.is_strictly_ground()
    }

    /// Collects variable names from all three positions.
    pub fn collect_vars(&self, into: &mut Vec<Rc<str>>) {
        self.s.collect_vars(into);
        self.p.collect_vars(into);
        self.o.collect_vars(into);
    }

    /// Collects head blank labels from all three positions.
    pub fn collect_blanks(&self, into: &mut FxHashSet<Rc<str>>) {
        self.s.collect_blanks(into);
        self.p.collect_blanks(into);
        self.o.collect_blanks(into);
    }
}

fn push_name(into: &mut Vec<Rc<str>>, name: &Rc<str>) {
    if !into.iter().any(|n| **n == **name) {
        into.push(name.clone());
    }
}

/// Variable names of a triple list, first-seen order, deduplicated.
pub fn vars_of(triples: &[Triple]) -> Vec<Rc<str>> {
    let mut names = Vec::new();
    for t in triples {
        t.collect_vars(&mut names);
    }
    names
}

/// Blank labels textually present in a rule conclusion. These are the
/// existentials subject to skolemization when the rule fires.
pub fn blanks_of_head(head: &[Triple]) -> FxHashSet<Rc<str>> {
    let mut labels = FxHashSet::default();
    for t in head {
        t.collect_blanks(&mut labels);
    }
    labels
}

/// Hash-consing tables for IRI and literal lexical forms.
///
/// One instance lives in each [`Session`](crate::session::Session); the
/// tables are dropped with the session at the end of a run.
#[derive(Debug, Default)]
pub struct Interner {
    iris: RefCell<FxHashSet<Rc<str>>>,
    literals: RefCell<FxHashSet<Rc<str>>>,
}

impl Interner {
    /// The canonical allocation for an IRI lexical form.
    pub fn iri(&self, lex: &str) -> Rc<str> {
        Self::intern(&self.iris, lex)
    }

    /// The canonical allocation for a literal lexical form.
    pub fn literal(&self, lex: &str) -> Rc<str> {
        Self::intern(&self.literals, lex)
    }

    fn intern(table: &RefCell<FxHashSet<Rc<str>>>, lex: &str) -> Rc<str> {
        let mut table = table.borrow_mut();
        if let Some(found) = table.get(lex) {
            return found.clone();
        }
        let fresh: Rc<str> = Rc::from(lex);
        table.insert(fresh.clone());
        fresh
    }
}

/// A compact key for triples whose three positions are IRIs or literals.
///
/// Used by the store's duplicate-detection set. `None` when any position
/// is a blank, list or formula; those triples are compared structurally.
pub fn fast_key(triple: &Triple) -> Option<String> {
    fn leaf(t: &Term) -> Option<(char, &str)> {
        match t {
            Term::Iri(s) => Some(('I', s)),
            Term::Literal(s) => Some(('L', s)),
            _ => None,
        }
    }
    let (st, s) = leaf(&triple.s)?;
    let (pt, p) = leaf(&triple.p)?;
    let (ot, o) = leaf(&triple.o)?;
    let mut key = String::with_capacity(s.len() + p.len() + o.len() + 6);
    for (tag, text) in &[(st, s), (pt, p), (ot, o)] {
        key.push(*tag);
        key.push_str(text);
        key.push('\u{1}');
    }
    Some(key)
}

/// A canonical textual encoding of an arbitrary term.
///
/// Distinct terms yield distinct encodings (up to lexical identity of
/// leaves); used for firing keys, formula deduplication and caches.
pub fn canon_key(term: &Term) -> String {
    let mut out = String::new();
    write_canon(term, &mut out);
    out
}

/// Canonical encoding of a triple; see [`canon_key`].
pub fn canon_triple_key(triple: &Triple) -> String {
    let mut out = String::new();
    write_canon_triple(triple, &mut out);
    out
}

fn write_canon(term: &Term, out: &mut String) {
    match term {
        Term::Iri(s) => {
            out.push('I');
            out.push_str(s);
        }
        Term::Literal(s) => {
            out.push('L');
            out.push_str(s);
        }
        Term::Var(s) => {
            out.push('V');
            out.push_str(s);
        }
        Term::Blank(s) => {
            out.push('B');
            out.push_str(s);
        }
        Term::List(xs) => {
            out.push('(');
            for x in xs {
                write_canon(x, out);
                out.push('\u{1}');
            }
            out.push(')');
        }
        Term::OpenList(xs, tail) => {
            out.push('(');
            for x in xs {
                write_canon(x, out);
                out.push('\u{1}');
            }
            out.push('|');
            out.push_str(tail);
            out.push(')');
        }
        Term::Formula(ts) => {
            out.push('{');
            for t in ts {
                write_canon_triple(t, out);
                out.push('\u{2}');
            }
            out.push('}');
        }
    }
}

fn write_canon_triple(triple: &Triple, out: &mut String) {
    write_canon(&triple.s, out);
    out.push('\u{1}');
    write_canon(&triple.p, out);
    out.push('\u{1}');
    write_canon(&triple.o, out);
}

#[cfg(test)]
mod test {
    use super::*;

    fn iri(s: &str) -> Term {
        Term::Iri(Rc::from(s))
    }

    #[test]
    fn interner_dedups() {
        let interner = Interner::default();
        let a = interner.iri("http://example.org/a");
        let b = interner.iri("http://example.org/a");
        assert!(Rc::ptr_eq(&a, &b));
        let c = interner.iri("http://example.org/c");
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn groundness() {
        let t = Term::List(vec![iri("http://e.org/x"), Term::var("v")]);
        assert!(!t.is_ground());
        let quoted = Term::Formula(vec![Triple::new(
            Term::var("v"),
            iri("http://e.org/p"),
            Term::blank("b"),
        )]);
        assert!(quoted.is_ground());
        assert!(!quoted.is_strictly_ground());
    }

    #[test]
    fn head_blanks_stop_at_formulas() {
        let head = vec![Triple::new(
            Term::blank("p"),
            iri("http://e.org/says"),
            Term::Formula(vec![Triple::new(
                Term::blank("inner"),
                iri("http://e.org/q"),
                Term::blank("inner"),
            )]),
        )];
        let blanks = blanks_of_head(&head);
        assert_eq!(blanks.len(), 1);
        assert!(blanks.contains("p"));
    }

    #[test]
    fn fast_key_only_for_leaf_triples() {
        let yes = Triple::new(iri("http://e/s"), iri("http://e/p"), iri("http://e/o"));
        assert!(fast_key(&yes).is_some());
        let no = Triple::new(Term::blank("b"), iri("http://e/p"), iri("http://e/o"));
        assert!(fast_key(&no).is_none());
    }

    #[test]
    fn vars_first_seen_order() {
        let triples = vec![
            Triple::new(Term::var("x"), iri("http://e/p"), Term::var("y")),
            Triple::new(Term::var("y"), iri("http://e/p"), Term::var("x")),
        ];
        let names = vars_of(&triples);
        let names: Vec<&str> = names.iter().map(|n| &**n).collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}
