//! Per-run state.
//!
//! The original design of this kind of engine tends to accumulate
//! process-wide caches; here they are gathered into a [`Session`] value
//! owned by one reasoning run and dropped at its end. Sessions are not
//! thread-safe and must not be shared between runs.

use crate::term::literal::{self, Value};
use crate::term::{Interner, Term};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Behavior switches for a reasoning run.
#[derive(Clone, Debug)]
pub struct Options {
    /// Disables every builtin except `log:implies` and `log:impliedBy`.
    pub super_restricted: bool,
    /// Rewrites `http://` to `https://` before dereferencing.
    pub enforce_https: bool,
    /// Emit derivation comments when rendering output.
    pub proof_comments: bool,
    /// Keep `log:skolem` IRIs stable across runs (the default). When
    /// disabled a per-run salt is mixed into the skolem digest.
    pub deterministic_skolem: bool,
    /// A fixed lexical for `time:localTime`, overriding the wall clock.
    pub fixed_now: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            super_restricted: false,
            enforce_https: false,
            proof_comments: false,
            deterministic_skolem: true,
            fixed_now: None,
        }
    }
}

/// Caches and switches for one reasoning run.
#[derive(Debug)]
pub struct Session {
    /// Behavior switches.
    pub options: Options,
    interner: Interner,
    values: RefCell<FxHashMap<Rc<str>, Rc<Value>>>,
    json_pointers: RefCell<FxHashMap<String, Option<Term>>>,
    skolem_iris: RefCell<FxHashMap<String, Rc<str>>>,
    conclusions: RefCell<FxHashMap<String, Term>>,
    fetched: RefCell<FxHashMap<String, Result<Rc<str>, String>>>,
    now: RefCell<Option<Rc<str>>>,
    outputs: RefCell<Vec<(Term, String)>>,
    outputs_suspended: Cell<bool>,
    fresh: Cell<u64>,
    skolem_salt: Option<u64>,
}

impl Session {
    /// A fresh session with the given options.
    pub fn new(options: Options) -> Self {
        let skolem_salt = if options.deterministic_skolem {
            None
        } else {
            Some(clock_salt())
        };
        Session {
            options,
            interner: Interner::default(),
            values: RefCell::new(FxHashMap::default()),
            json_pointers: RefCell::new(FxHashMap::default()),
            skolem_iris: RefCell::new(FxHashMap::default()),
            conclusions: RefCell::new(FxHashMap::default()),
            fetched: RefCell::new(FxHashMap::default()),
            now: RefCell::new(None),
            outputs: RefCell::new(Vec::new()),
            outputs_suspended: Cell::new(false),
            fresh: Cell::new(0),
            skolem_salt,
        }
    }

    /// An interned IRI term.
    pub fn iri(&self, lex: &str) -> Term {
        Term::Iri(self.interner.iri(lex))
    }

    /// An interned literal term from a raw lexical form.
    pub fn literal(&self, lex: &str) -> Term {
        Term::Literal(self.interner.literal(lex))
    }

    /// An interned plain-string literal from unescaped text.
    pub fn str_literal(&self, text: &str) -> Term {
        self.literal(&literal::quote(text))
    }

    /// An interned literal carrying a numeric value.
    pub fn number(&self, n: &literal::Number) -> Term {
        self.literal(&n.literal_lexical())
    }

    /// The parsed value of a literal lexical form, cached.
    pub fn value(&self, lex: &Rc<str>) -> Rc<Value> {
        if let Some(v) = self.values.borrow().get(lex) {
            return v.clone();
        }
        let v = Rc::new(literal::parse_lexical(lex));
        self.values
            .borrow_mut()
            .insert(lex.clone(), v.clone());
        v
    }

    /// A strictly increasing counter for standardization-apart.
    pub fn fresh_id(&self) -> u64 {
        let n = self.fresh.get();
        self.fresh.set(n + 1);
        n
    }

    /// The memoized `time:localTime` lexical; resolved once per run, from
    /// the fixed override when one is set.
    pub fn now_lexical(&self) -> Rc<str> {
        if let Some(now) = self.now.borrow().as_ref() {
            return now.clone();
        }
        let lex: Rc<str> = match &self.options.fixed_now {
            Some(fixed) => Rc::from(fixed.as_str()),
            None => Rc::from(
                chrono::Local::now()
                    .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
                    .to_string()
                    .as_str(),
            ),
        };
        *self.now.borrow_mut() = Some(lex.clone());
        lex
    }

    /// Records a `log:outputString` pair unless collection is suspended.
    pub fn record_output(&self, key: Term, text: String) {
        if !self.outputs_suspended.get() {
            self.outputs.borrow_mut().push((key, text));
        }
    }

    /// The recorded output pairs, in assertion order.
    pub fn outputs(&self) -> Vec<(Term, String)> {
        self.outputs.borrow().clone()
    }

    /// Runs `f` with output collection suspended; used by the closure
    /// computation of `log:conclusion`.
    pub fn with_outputs_suspended<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.outputs_suspended.replace(true);
        let result = f();
        self.outputs_suspended.set(previous);
        result
    }

    /// Cache lookup for `log:conclusion` results, keyed by the canonical
    /// encoding of the subject formula.
    pub fn cached_conclusion(&self, key: &str) -> Option<Term> {
        self.conclusions.borrow().get(key).cloned()
    }

    /// Stores a computed `log:conclusion` result.
    pub fn cache_conclusion(&self, key: String, formula: Term) {
        self.conclusions.borrow_mut().insert(key, formula);
    }

    /// Cache lookup for a JSON-pointer evaluation.
    pub fn cached_json_pointer(&self, key: &str) -> Option<Option<Term>> {
        self.json_pointers.borrow().get(key).cloned()
    }

    /// Stores a JSON-pointer evaluation.
    pub fn cache_json_pointer(&self, key: String, result: Option<Term>) {
        self.json_pointers.borrow_mut().insert(key, result);
    }

    /// Cache lookup for a skolem IRI, keyed by the canonical JSON
    /// encoding of the subject.
    pub fn cached_skolem(&self, key: &str) -> Option<Rc<str>> {
        self.skolem_iris.borrow().get(key).cloned()
    }

    /// Stores a minted skolem IRI.
    pub fn cache_skolem(&self, key: String, iri: Rc<str>) {
        self.skolem_iris.borrow_mut().insert(key, iri);
    }

    /// The per-run skolem salt; `None` in the default deterministic mode.
    pub fn skolem_salt(&self) -> Option<u64> {
        self.skolem_salt
    }

    /// Cache lookup for a dereferenced resource, keyed by the
    /// fragment-stripped IRI.
    pub fn cached_fetch(&self, key: &str) -> Option<Result<Rc<str>, String>> {
        self.fetched.borrow().get(key).cloned()
    }

    /// Stores a dereference result (success or failure).
    pub fn cache_fetch(&self, key: String, result: Result<Rc<str>, String>) {
        self.fetched.borrow_mut().insert(key, result);
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Options::default())
    }
}

fn clock_salt() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9e37_79b9)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literal_values_are_cached() {
        let session = Session::default();
        let lex = match session.literal("5") {
            Term::Literal(lex) => lex,
            _ => unreachable!(),
        };
        let a = session.value(&lex);
        let b = session.value(&lex);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn fixed_now_overrides_clock() {
        let session = Session::new(Options {
            fixed_now: Some("2024-02-01T00:00:00Z".into()),
            ..Options::default()
        });
        assert_eq!(&*session.now_lexical(), "2024-02-01T00:00:00Z");
    }

    #[test]
    fn suspended_outputs_are_dropped() {
        let session = Session::default();
        session.record_output(Term::var("k"), "kept".into());
        session.with_outputs_suspended(|| {
            session.record_output(Term::var("k"), "dropped".into());
        });
        assert_eq!(session.outputs().len(), 1);
    }
}
