//! Substitutions and structural unification.
//!
//! A substitution is a finite map from variable names to terms. `unify`
//! extends a substitution so that two terms become equal under it;
//! literal positions compare by datatype-aware value equality and quoted
//! formulas by α-equivalence with permutation backtracking.

use crate::session::Session;
use crate::term::literal::{values_equal, values_equal_no_int_decimal};
use crate::term::{Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// A finite map from variable names to terms.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: FxHashMap<Rc<str>, Term>,
}

impl Subst {
    /// The empty substitution.
    pub fn new() -> Self {
        Subst::default()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The raw binding of a name, if any.
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.map.get(name)
    }

    /// Binds a name. Existing bindings are overwritten; callers go
    /// through [`unify`] or [`compose`] to keep bindings consistent.
    pub fn bind(&mut self, name: Rc<str>, term: Term) {
        self.map.insert(name, term);
    }

    /// Iterates over the raw bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Term)> {
        self.map.iter()
    }

    /// Recursively substitutes into a term. Var-to-var chains are chased
    /// with a cycle guard; open lists whose tail resolves to a concrete
    /// list collapse into one.
    pub fn apply(&self, term: &Term) -> Term {
        let mut guard = Vec::new();
        self.apply_guarded(term, &mut guard)
    }

    /// [`Subst::apply`] over all three positions of a triple.
    pub fn apply_triple(&self, triple: &Triple) -> Triple {
        Triple::new(
            self.apply(&triple.s),
            self.apply(&triple.p),
            self.apply(&triple.o),
        )
    }

    fn apply_guarded(&self, term: &Term, guard: &mut Vec<Rc<str>>) -> Term {
        match term {
            Term::Var(name) => self.resolve_var(name, guard),
            Term::List(xs) => Term::List(xs.iter().map(|t| self.apply_guarded(t, guard)).collect()),
            Term::OpenList(xs, tail) => {
                let prefix: Vec<Term> = xs.iter().map(|t| self.apply_guarded(t, guard)).collect();
                match self.resolve_var(tail, guard) {
                    Term::List(mut rest) => {
                        let mut all = prefix;
                        all.append(&mut rest);
                        Term::List(all)
                    }
                    Term::OpenList(mut mid, far_tail) => {
                        let mut all = prefix;
                        all.append(&mut mid);
                        Term::OpenList(all, far_tail)
                    }
                    Term::Var(still) => Term::OpenList(prefix, still),
                    _ => Term::OpenList(prefix, tail.clone()),
                }
            }
            Term::Formula(ts) => Term::Formula(
                ts.iter()
                    .map(|t| {
                        Triple::new(
                            self.apply_guarded(&t.s, guard),
                            self.apply_guarded(&t.p, guard),
                            self.apply_guarded(&t.o, guard),
                        )
                    })
                    .collect(),
            ),
            leaf => leaf.clone(),
        }
    }

    fn resolve_var(&self, name: &Rc<str>, guard: &mut Vec<Rc<str>>) -> Term {
        if guard.iter().any(|seen| **seen == **name) {
            return Term::Var(name.clone());
        }
        let mut current = name.clone();
        let mut chain = vec![current.clone()];
        loop {
            match self.map.get(&*current) {
                Some(Term::Var(next)) => {
                    if chain.iter().any(|seen| **seen == **next) {
                        return Term::Var(next.clone());
                    }
                    chain.push(next.clone());
                    current = next.clone();
                }
                Some(bound) => {
                    guard.push(current.clone());
                    let resolved = self.apply_guarded(&bound.clone(), guard);
                    guard.pop();
                    return resolved;
                }
                None => return Term::Var(current),
            }
        }
    }

    /// Restricts the substitution to the given names, with each kept
    /// binding fully resolved. Unbound names are omitted.
    pub fn project(&self, names: &[Rc<str>]) -> Subst {
        let mut out = Subst::new();
        for name in names {
            let resolved = self.apply(&Term::Var(name.clone()));
            match &resolved {
                Term::Var(v) if **v == **name => {}
                _ => out.bind(name.clone(), resolved),
            }
        }
        out
    }

    /// Drops every binding not reachable from the given roots. Keeps the
    /// closure: a kept binding's term may mention further variables,
    /// which are then kept as well.
    pub fn shrink(&mut self, roots: &FxHashSet<Rc<str>>) {
        let mut keep: FxHashSet<Rc<str>> = roots.clone();
        let mut queue: Vec<Rc<str>> = roots.iter().cloned().collect();
        while let Some(name) = queue.pop() {
            if let Some(bound) = self.map.get(&*name) {
                let mut mentioned = Vec::new();
                bound.collect_vars(&mut mentioned);
                for v in mentioned {
                    if keep.insert(v.clone()) {
                        queue.push(v);
                    }
                }
            }
        }
        self.map.retain(|name, _| keep.contains(name));
    }
}

/// Equality mode for literal positions.
#[derive(Clone, Copy, PartialEq)]
enum EqMode {
    Full,
    NoIntDecimal,
}

/// Structural term equality with datatype-aware literal comparison and
/// α-equivalence for quoted formulas.
pub fn terms_equal(a: &Term, b: &Term, session: &Session) -> bool {
    terms_equal_mode(a, b, session, EqMode::Full)
}

/// Like [`terms_equal`] but integer/decimal cross-datatype equality does
/// not hold; used for comparing index literals during list iteration.
pub fn terms_equal_no_int_decimal(a: &Term, b: &Term, session: &Session) -> bool {
    terms_equal_mode(a, b, session, EqMode::NoIntDecimal)
}

fn terms_equal_mode(a: &Term, b: &Term, session: &Session, mode: EqMode) -> bool {
    match (a, b) {
        (Term::Iri(x), Term::Iri(y)) => Rc::ptr_eq(x, y) || x == y,
        (Term::Var(x), Term::Var(y)) | (Term::Blank(x), Term::Blank(y)) => x == y,
        (Term::Literal(x), Term::Literal(y)) => literals_equal_mode(x, y, session, mode),
        (Term::List(xs), Term::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| terms_equal_mode(x, y, session, mode))
        }
        (Term::OpenList(xs, xt), Term::OpenList(ys, yt)) => {
            xt == yt
                && xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| terms_equal_mode(x, y, session, mode))
        }
        (Term::Formula(f), Term::Formula(g)) => formulas_alpha_eq(f, g, session),
        _ => false,
    }
}

fn literals_equal_mode(x: &Rc<str>, y: &Rc<str>, session: &Session, mode: EqMode) -> bool {
    if Rc::ptr_eq(x, y) || x == y {
        return true;
    }
    let a = session.value(x);
    let b = session.value(y);
    match mode {
        EqMode::Full => values_equal(&a, &b),
        EqMode::NoIntDecimal => values_equal_no_int_decimal(&a, &b),
    }
}

/// Extends `base` so that `a` and `b` become equal under it, or fails.
pub fn unify(a: &Term, b: &Term, base: &Subst, session: &Session) -> Option<Subst> {
    let mut out = base.clone();
    if unify_into(a, b, &mut out, session) {
        Some(out)
    } else {
        None
    }
}

/// Unifies two triples position-wise under `base`.
pub fn unify_triples(a: &Triple, b: &Triple, base: &Subst, session: &Session) -> Option<Subst> {
    let mut out = base.clone();
    if unify_into(&a.s, &b.s, &mut out, session)
        && unify_into(&a.p, &b.p, &mut out, session)
        && unify_into(&a.o, &b.o, &mut out, session)
    {
        Some(out)
    } else {
        None
    }
}

fn unify_into(a: &Term, b: &Term, subst: &mut Subst, session: &Session) -> bool {
    let a = subst.apply(a);
    let b = subst.apply(b);
    match (&a, &b) {
        (Term::Var(x), Term::Var(y)) if x == y => true,
        (Term::Var(x), t) => bind_checked(x, t, subst),
        (t, Term::Var(y)) => bind_checked(y, t, subst),
        (Term::Iri(x), Term::Iri(y)) => Rc::ptr_eq(x, y) || x == y,
        (Term::Blank(x), Term::Blank(y)) => x == y,
        (Term::Literal(x), Term::Literal(y)) => {
            literals_equal_mode(x, y, session, EqMode::Full)
        }
        (Term::List(xs), Term::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| unify_into(x, y, subst, session))
        }
        (Term::OpenList(xs, tail), Term::List(ys)) | (Term::List(ys), Term::OpenList(xs, tail)) => {
            if ys.len() < xs.len() {
                return false;
            }
            if !xs
                .iter()
                .zip(ys.iter())
                .all(|(x, y)| unify_into(x, y, subst, session))
            {
                return false;
            }
            let rest = Term::List(ys[xs.len()..].to_vec());
            unify_into(&Term::Var(tail.clone()), &rest, subst, session)
        }
        (Term::OpenList(xs, xt), Term::OpenList(ys, yt)) => {
            xt == yt
                && xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| unify_into(x, y, subst, session))
        }
        (Term::Formula(f), Term::Formula(g)) => formulas_alpha_eq(f, g, session),
        _ => false,
    }
}

fn bind_checked(name: &Rc<str>, term: &Term, subst: &mut Subst) -> bool {
    if occurs(name, term) {
        return false;
    }
    subst.bind(name.clone(), term.clone());
    true
}

fn occurs(name: &Rc<str>, term: &Term) -> bool {
    let mut vars = Vec::new();
    term.collect_vars(&mut vars);
    vars.iter().any(|v| **v == **name)
}

/// Merges two substitutions. When a name is bound in both, the bound
/// terms must already be equal; otherwise the composition fails.
pub fn compose(outer: &Subst, delta: &Subst, session: &Session) -> Option<Subst> {
    let mut out = outer.clone();
    for (name, term) in delta.iter() {
        match out.get(name) {
            Some(existing) => {
                if !terms_equal(existing, term, session) {
                    return None;
                }
            }
            None => out.bind(name.clone(), term.clone()),
        }
    }
    Some(out)
}

#[derive(Clone, Default)]
struct AlphaMap {
    fwd: FxHashMap<Rc<str>, Rc<str>>,
    rev: FxHashMap<Rc<str>, Rc<str>>,
}

impl AlphaMap {
    fn pair(&mut self, a: &Rc<str>, b: &Rc<str>) -> bool {
        match (self.fwd.get(a), self.rev.get(b)) {
            (None, None) => {
                self.fwd.insert(a.clone(), b.clone());
                self.rev.insert(b.clone(), a.clone());
                true
            }
            (Some(x), Some(y)) => **x == **b && **y == **a,
            _ => false,
        }
    }
}

/// α-equivalence of two formulas: same multiset of triples modulo a
/// bijective renaming of interior variables and blanks. Matching is
/// unordered; the renaming is threaded through branches and backtracked.
pub fn formulas_alpha_eq(f: &[Triple], g: &[Triple], session: &Session) -> bool {
    let mut map = AlphaMap::default();
    formula_alpha(f, g, &mut map, session)
}

/// α-equivalence of two single triples.
pub fn triples_alpha_eq(a: &Triple, b: &Triple, session: &Session) -> bool {
    let mut map = AlphaMap::default();
    triple_alpha(a, b, &mut map, session)
}

/// α-equivalence of paired triple lists under one renaming threaded
/// through every pair; used to compare the two halves of a rule.
pub fn triple_lists_alpha_eq(pairs: &[(&[Triple], &[Triple])], session: &Session) -> bool {
    let mut map = AlphaMap::default();
    pairs
        .iter()
        .all(|(f, g)| formula_alpha(f, g, &mut map, session))
}

fn formula_alpha(f: &[Triple], g: &[Triple], map: &mut AlphaMap, session: &Session) -> bool {
    if f.len() != g.len() {
        return false;
    }
    let mut used = vec![false; g.len()];
    match match_rest(f, 0, g, &mut used, map, session) {
        Some(extended) => {
            *map = extended;
            true
        }
        None => false,
    }
}

fn match_rest(
    f: &[Triple],
    index: usize,
    g: &[Triple],
    used: &mut Vec<bool>,
    map: &AlphaMap,
    session: &Session,
) -> Option<AlphaMap> {
    if index == f.len() {
        return Some(map.clone());
    }
    for j in 0..g.len() {
        if used[j] {
            continue;
        }
        let mut branch = map.clone();
        if triple_alpha(&f[index], &g[j], &mut branch, session) {
            used[j] = true;
            if let Some(done) = match_rest(f, index + 1, g, used, &branch, session) {
                return Some(done);
            }
            used[j] = false;
        }
    }
    None
}

fn triple_alpha(a: &Triple, b: &Triple, map: &mut AlphaMap, session: &Session) -> bool {
    term_alpha(&a.s, &b.s, map, session)
        && term_alpha(&a.p, &b.p, map, session)
        && term_alpha(&a.o, &b.o, map, session)
}

fn term_alpha(a: &Term, b: &Term, map: &mut AlphaMap, session: &Session) -> bool {
    match (a, b) {
        (Term::Var(x), Term::Var(y)) | (Term::Blank(x), Term::Blank(y)) => map.pair(x, y),
        (Term::Iri(x), Term::Iri(y)) => Rc::ptr_eq(x, y) || x == y,
        (Term::Literal(x), Term::Literal(y)) => {
            literals_equal_mode(x, y, session, EqMode::Full)
        }
        (Term::List(xs), Term::List(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| term_alpha(x, y, map, session))
        }
        (Term::OpenList(xs, xt), Term::OpenList(ys, yt)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(x, y)| term_alpha(x, y, map, session))
                && map.pair(xt, yt)
        }
        (Term::Formula(f), Term::Formula(g)) => formula_alpha(f, g, map, session),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn iri(s: &str) -> Term {
        let session = Session::default();
        session.iri(s)
    }

    fn triple(s: Term, p: Term, o: Term) -> Triple {
        Triple::new(s, p, o)
    }

    #[test]
    fn bind_and_apply() {
        let session = Session::default();
        let goal = Term::var("x");
        let fact = session.iri("http://e/a");
        let subst = unify(&goal, &fact, &Subst::new(), &session).unwrap();
        assert_eq!(subst.apply(&goal), fact);
    }

    #[test]
    fn var_chains_are_chased() {
        let session = Session::default();
        let mut subst = Subst::new();
        subst.bind(Rc::from("x"), Term::var("y"));
        subst.bind(Rc::from("y"), session.iri("http://e/a"));
        assert_eq!(subst.apply(&Term::var("x")), session.iri("http://e/a"));
    }

    #[test]
    fn occurs_check_fails() {
        let session = Session::default();
        let cyclic = Term::List(vec![Term::var("x")]);
        assert!(unify(&Term::var("x"), &cyclic, &Subst::new(), &session).is_none());
    }

    #[test]
    fn lists_of_unequal_length_make_open_lists_concrete() {
        let session = Session::default();
        let open = Term::OpenList(vec![session.iri("http://e/a")], Rc::from("rest"));
        let full = Term::List(vec![
            session.iri("http://e/a"),
            session.iri("http://e/b"),
            session.iri("http://e/c"),
        ]);
        let subst = unify(&open, &full, &Subst::new(), &session).unwrap();
        assert_eq!(
            subst.apply(&Term::var("rest")),
            Term::List(vec![session.iri("http://e/b"), session.iri("http://e/c")])
        );
        assert_eq!(subst.apply(&open), full);
    }

    #[test]
    fn numeric_literals_unify_by_value() {
        let session = Session::default();
        let a = session.literal("1");
        let b = session.literal("01");
        assert!(unify(&a, &b, &Subst::new(), &session).is_some());
        let c = session.literal("1.0");
        assert!(unify(&a, &c, &Subst::new(), &session).is_some());
        assert!(!terms_equal_no_int_decimal(&a, &c, &session));
    }

    #[test]
    fn formulas_match_unordered_with_renaming() {
        let session = Session::default();
        let p = iri("http://e/p");
        let q = iri("http://e/q");
        let f = vec![
            triple(Term::var("x"), p.clone(), Term::var("y")),
            triple(Term::var("y"), q.clone(), Term::var("x")),
        ];
        let g = vec![
            triple(Term::var("b"), q.clone(), Term::var("a")),
            triple(Term::var("a"), p.clone(), Term::var("b")),
        ];
        assert!(formulas_alpha_eq(&f, &g, &session));
        let h = vec![
            triple(Term::var("b"), q, Term::var("a")),
            triple(Term::var("a"), p, Term::var("a")),
        ];
        assert!(!formulas_alpha_eq(&f, &h, &session));
    }

    #[test]
    fn compose_rejects_conflicts() {
        let session = Session::default();
        let mut outer = Subst::new();
        outer.bind(Rc::from("x"), session.iri("http://e/a"));
        let mut delta = Subst::new();
        delta.bind(Rc::from("x"), session.iri("http://e/b"));
        assert!(compose(&outer, &delta, &session).is_none());
        let mut same = Subst::new();
        same.bind(Rc::from("x"), session.iri("http://e/a"));
        assert!(compose(&outer, &same, &session).is_some());
    }

    #[test]
    fn shrink_keeps_reachable_bindings() {
        let session = Session::default();
        let mut subst = Subst::new();
        subst.bind(Rc::from("keep"), Term::List(vec![Term::var("via")]));
        subst.bind(Rc::from("via"), session.iri("http://e/a"));
        subst.bind(Rc::from("drop"), session.iri("http://e/b"));
        let mut roots: FxHashSet<Rc<str>> = FxHashSet::default();
        roots.insert(Rc::from("keep"));
        subst.shrink(&roots);
        assert!(subst.get("keep").is_some());
        assert!(subst.get("via").is_some());
        assert!(subst.get("drop").is_none());
    }

    #[test]
    fn projection_resolves_fully() {
        let session = Session::default();
        let mut subst = Subst::new();
        subst.bind(Rc::from("x"), Term::var("y"));
        subst.bind(Rc::from("y"), session.iri("http://e/a"));
        let projected = subst.project(&[Rc::from("x")]);
        assert_eq!(projected.get("x"), Some(&session.iri("http://e/a")));
        assert!(projected.get("y").is_none());
    }
}
