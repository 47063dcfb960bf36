//! The fact store and its indexes.
//!
//! Facts are appended and never retracted. Three buckets speed up goal
//! candidate enumeration: by predicate IRI, and by (predicate, subject
//! key) / (predicate, object key) for goals whose other position is an
//! IRI or a literal. A fast-key set gives O(1) duplicate detection for
//! fully IRI/literal triples; triples containing blanks are compared
//! strictly and are not deduplicated modulo blank renaming.

use crate::term::{fast_key, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// An append-only sequence of ground triples with derived indexes.
#[derive(Clone, Debug, Default)]
pub struct FactStore {
    triples: Vec<Triple>,
    by_pred: FxHashMap<Rc<str>, Vec<usize>>,
    by_pred_subj: FxHashMap<(Rc<str>, String), Vec<usize>>,
    by_pred_obj: FxHashMap<(Rc<str>, String), Vec<usize>>,
    dedup: FxHashSet<String>,
}

/// A bucket key for an IRI or literal in subject/object position.
/// Blank, list and formula positions are not keyed.
fn position_key(term: &Term) -> Option<String> {
    match term {
        Term::Iri(s) => Some(format!("I{}", s)),
        Term::Literal(s) => Some(format!("L{}", s)),
        _ => None,
    }
}

impl FactStore {
    /// An empty store.
    pub fn new() -> Self {
        FactStore::default()
    }

    /// A store filled from an iterator; duplicates are skipped.
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut store = FactStore::new();
        for t in triples {
            store.insert(t);
        }
        store
    }

    /// Number of stored facts.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// True when no fact is stored.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All facts in append order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// The fact at the given append index.
    pub fn get(&self, index: usize) -> &Triple {
        &self.triples[index]
    }

    /// True when an equal triple is already stored. Fully IRI/literal
    /// triples hit the fast-key set; others are scanned with strict
    /// structural equality.
    pub fn contains(&self, triple: &Triple) -> bool {
        if let Some(key) = fast_key(triple) {
            return self.dedup.contains(&key);
        }
        self.candidates(triple)
            .into_iter()
            .any(|i| &self.triples[i] == triple)
    }

    /// Appends a fact unless an equal one is present. Returns whether the
    /// store changed.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.contains(&triple) {
            return false;
        }
        let index = self.triples.len();
        if let Some(key) = fast_key(&triple) {
            self.dedup.insert(key);
        }
        if let Term::Iri(p) = &triple.p {
            self.by_pred.entry(p.clone()).or_default().push(index);
            if let Some(key) = position_key(&triple.s) {
                self.by_pred_subj
                    .entry((p.clone(), key))
                    .or_default()
                    .push(index);
            }
            if let Some(key) = position_key(&triple.o) {
                self.by_pred_obj
                    .entry((p.clone(), key))
                    .or_default()
                    .push(index);
            }
        }
        self.triples.push(triple);
        true
    }

    /// Candidate fact indexes for a goal, in append order.
    ///
    /// For a goal with a predicate IRI the smallest available bucket is
    /// returned; goals with non-IRI predicates fall back to a full scan.
    pub fn candidates(&self, goal: &Triple) -> Vec<usize> {
        let p = match &goal.p {
            Term::Iri(p) => p,
            _ => return (0..self.triples.len()).collect(),
        };
        let mut best: Option<&Vec<usize>> = None;
        static EMPTY: Vec<usize> = Vec::new();
        match self.by_pred.get(p) {
            Some(bucket) => best = Some(bucket),
            None => return Vec::new(),
        }
        if let Some(key) = position_key(&goal.s) {
            let bucket = self.by_pred_subj.get(&(p.clone(), key)).unwrap_or(&EMPTY);
            if best.map_or(true, |b| bucket.len() < b.len()) {
                best = Some(bucket);
            }
        }
        if let Some(key) = position_key(&goal.o) {
            let bucket = self.by_pred_obj.get(&(p.clone(), key)).unwrap_or(&EMPTY);
            if best.map_or(true, |b| bucket.len() < b.len()) {
                best = Some(bucket);
            }
        }
        best.cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::Session;

    fn sample(session: &Session) -> FactStore {
        FactStore::from_triples(vec![
            Triple::new(
                session.iri("http://e/alice"),
                session.iri("http://e/knows"),
                session.iri("http://e/bob"),
            ),
            Triple::new(
                session.iri("http://e/bob"),
                session.iri("http://e/knows"),
                session.iri("http://e/carol"),
            ),
            Triple::new(
                session.iri("http://e/alice"),
                session.iri("http://e/age"),
                session.literal("42"),
            ),
        ])
    }

    #[test]
    fn duplicate_detection() {
        let session = Session::default();
        let mut store = sample(&session);
        assert_eq!(store.len(), 3);
        let dup = Triple::new(
            session.iri("http://e/alice"),
            session.iri("http://e/knows"),
            session.iri("http://e/bob"),
        );
        assert!(!store.insert(dup));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn blank_triples_compare_strictly() {
        let session = Session::default();
        let mut store = FactStore::new();
        let a = Triple::new(
            Term::blank("b1"),
            session.iri("http://e/p"),
            session.iri("http://e/o"),
        );
        let renamed = Triple::new(
            Term::blank("b2"),
            session.iri("http://e/p"),
            session.iri("http://e/o"),
        );
        assert!(store.insert(a.clone()));
        assert!(!store.insert(a));
        // not deduplicated modulo blank renaming
        assert!(store.insert(renamed));
    }

    #[test]
    fn smallest_bucket_wins() {
        let session = Session::default();
        let store = sample(&session);
        let goal = Triple::new(
            session.iri("http://e/alice"),
            session.iri("http://e/knows"),
            Term::var("x"),
        );
        let hits = store.candidates(&goal);
        assert_eq!(hits.len(), 1);
        assert_eq!(store.get(hits[0]).o, session.iri("http://e/bob"));
    }

    #[test]
    fn non_iri_predicate_scans_all() {
        let session = Session::default();
        let store = sample(&session);
        let goal = Triple::new(Term::var("s"), Term::var("p"), Term::var("o"));
        assert_eq!(store.candidates(&goal).len(), 3);
    }

    #[test]
    fn unknown_predicate_is_empty() {
        let session = Session::default();
        let store = sample(&session);
        let goal = Triple::new(
            Term::var("s"),
            session.iri("http://e/unknown"),
            Term::var("o"),
        );
        assert!(store.candidates(&goal).is_empty());
    }
}
