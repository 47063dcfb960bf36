//! The forward engine: rule-firing fixpoint with scoped-closure levels,
//! keyed skolemization and rule-as-data promotion.

use crate::error::{Error, Result};
use crate::ns::log as logvocab;
use crate::parse::{Document, Prolog};
use crate::rule::{rule_from_parts, Direction, Rule, RuleSet};
use crate::session::{Options, Session};
use crate::store::FactStore;
use crate::term::literal::Value;
use crate::term::{canon_key, canon_triple_key, Term, Triple};
use crate::unify::Subst;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::rc::Rc;

use super::explain::Derivation;
use super::prove::Prover;

/// A scoped-closure snapshot: the fact store frozen at a level, plus the
/// same facts rendered as a formula for binding variable scopes.
pub struct Snapshot {
    /// The closure level at which the snapshot was taken.
    pub level: u64,
    /// The frozen facts.
    pub store: FactStore,
    /// The frozen facts as a quoted formula.
    pub formula: Term,
}

impl Snapshot {
    fn new(level: u64, store: FactStore) -> Self {
        let formula = Term::Formula(store.iter().cloned().collect());
        Snapshot {
            level,
            store,
            formula,
        }
    }
}

/// The mutable heart of a run, separated from the session so that
/// builtins can spin up nested closures over the same caches.
#[derive(Default)]
struct Core {
    store: FactStore,
    rules: RuleSet,
    derived: Vec<Derivation>,
    snapshot: Option<Snapshot>,
    skolem_labels: FxHashMap<String, Rc<str>>,
    skolem_next: u64,
}

impl Core {
    fn run(&mut self, session: &Session, sink: &mut dyn FnMut(&Derivation)) -> Result<()> {
        let result = self.run_inner(session, sink);
        self.snapshot = None;
        result
    }

    /// The outer scoped-closure loop: alternate a plain fixpoint and a
    /// fixpoint against a fresh snapshot, until an adjacent pair changes
    /// nothing and the level covers every scope priority the program
    /// demands.
    fn run_inner(&mut self, session: &Session, sink: &mut dyn FnMut(&Derivation)) -> Result<()> {
        let mut level: u64 = 0;
        self.snapshot = None;
        loop {
            let needed = self.max_scope_priority(session);
            let changed_plain = self.fixpoint(session, sink)?;
            level += 1;
            debug!("taking scoped snapshot at level {}", level);
            self.snapshot = Some(Snapshot::new(level, self.store.clone()));
            let changed_scoped = self.fixpoint(session, sink)?;
            self.snapshot = None;
            if !changed_plain && !changed_scoped && level >= needed {
                return Ok(());
            }
        }
    }

    /// The inner naive fixpoint: fire every forward rule in order until
    /// a whole round adds nothing.
    fn fixpoint(&mut self, session: &Session, sink: &mut dyn FnMut(&Derivation)) -> Result<bool> {
        let mut changed_any = false;
        loop {
            let mut changed = false;
            let mut index = 0;
            while index < self.rules.forward.len() {
                if self.fire(index, session, sink)? {
                    changed = true;
                }
                index += 1;
            }
            if !changed {
                break;
            }
            changed_any = true;
        }
        Ok(changed_any)
    }

    fn fire(
        &mut self,
        index: usize,
        session: &Session,
        sink: &mut dyn FnMut(&Derivation),
    ) -> Result<bool> {
        let rule = self.rules.forward[index].clone();
        let max_results = if rule.fuse {
            Some(1)
        } else if !rule.conclusion.is_empty()
            && rule.conclusion.iter().all(Triple::is_strictly_ground)
            && rule.conclusion.iter().all(|t| self.store.contains(t))
        {
            // nothing new can come out; one answer settles the premise
            Some(1)
        } else {
            None
        };
        let projection = rule.vars();
        let solutions = {
            let prover = Prover {
                store: &self.store,
                rules: &self.rules,
                session,
                snapshot: self.snapshot.as_ref(),
            };
            prover.prove(&rule.premise, max_results, &projection)
        };
        if rule.fuse && !solutions.is_empty() {
            eprintln!("# fuse triggered by rule {}", index);
            return Err(Error::FuseTriggered { rule: index });
        }
        let mut changed = false;
        for solution in solutions {
            let premises: Vec<Triple> = rule
                .premise
                .iter()
                .map(|t| solution.apply_triple(t))
                .collect();
            let firing_key = firing_key(index, &premises);
            for template in &rule.conclusion {
                let instantiated = solution.apply_triple(template);
                if let Term::Iri(p) = &instantiated.p {
                    if let Some(runtime_rule) =
                        rule_from_parts(&instantiated.s, p, &instantiated.o)
                    {
                        if instantiated.is_ground()
                            && self.push_fact(instantiated.clone(), index, &solution, &premises, sink)
                        {
                            changed = true;
                        }
                        let added = match runtime_rule.direction {
                            Direction::Forward => self.rules.add_forward(runtime_rule, session),
                            Direction::Backward => self.rules.add_backward(runtime_rule, session),
                        };
                        if added {
                            changed = true;
                        }
                        continue;
                    }
                }
                let skolemized = self.skolemize(&instantiated, &rule, &firing_key);
                if !skolemized.is_ground() {
                    continue;
                }
                if self.push_fact(skolemized, index, &solution, &premises, sink) {
                    changed = true;
                }
            }
        }
        Ok(changed)
    }

    fn push_fact(
        &mut self,
        fact: Triple,
        rule: usize,
        bindings: &Subst,
        premises: &[Triple],
        sink: &mut dyn FnMut(&Derivation),
    ) -> bool {
        if !self.store.insert(fact.clone()) {
            return false;
        }
        let record = Derivation {
            fact,
            rule,
            premises: premises.to_vec(),
            bindings: bindings.clone(),
        };
        sink(&record);
        self.derived.push(record);
        true
    }

    /// Replaces head blanks with stable labels keyed by the firing: the
    /// same rule firing yields the same blank across iterations, which
    /// the fixpoint needs to terminate. Quoted formulas keep their own
    /// blanks.
    fn skolemize(&mut self, triple: &Triple, rule: &Rule, firing_key: &str) -> Triple {
        Triple::new(
            self.skolem_term(&triple.s, rule, firing_key),
            self.skolem_term(&triple.p, rule, firing_key),
            self.skolem_term(&triple.o, rule, firing_key),
        )
    }

    fn skolem_term(&mut self, term: &Term, rule: &Rule, firing_key: &str) -> Term {
        match term {
            Term::Blank(label) if rule.head_blanks.contains(label) => {
                let map_key = format!("{}|{}", firing_key, label);
                if let Some(existing) = self.skolem_labels.get(&map_key) {
                    return Term::Blank(existing.clone());
                }
                let fresh: Rc<str> = Rc::from(format!("sk_{}", self.skolem_next).as_str());
                self.skolem_next += 1;
                self.skolem_labels.insert(map_key, fresh.clone());
                Term::Blank(fresh)
            }
            Term::List(xs) => Term::List(
                xs.iter()
                    .map(|t| self.skolem_term(t, rule, firing_key))
                    .collect(),
            ),
            Term::OpenList(xs, tail) => Term::OpenList(
                xs.iter()
                    .map(|t| self.skolem_term(t, rule, firing_key))
                    .collect(),
                tail.clone(),
            ),
            other => other.clone(),
        }
    }

    /// The maximum scoped-closure priority the program demands, from the
    /// scope arguments of the scoped builtins in rule premises: a
    /// formula does not drive the loop, a variable demands level 1, a
    /// positive integer demands that level.
    fn max_scope_priority(&self, session: &Session) -> u64 {
        let mut needed = 0;
        let all = self.rules.forward.iter().chain(self.rules.backward.iter());
        for rule in all {
            for t in &rule.premise {
                let scope = match &t.p {
                    Term::Iri(p) if **p == *logvocab::includes || **p == *logvocab::notIncludes => {
                        &t.s
                    }
                    Term::Iri(p)
                        if **p == *logvocab::forAllIn || **p == *logvocab::collectAllIn =>
                    {
                        &t.o
                    }
                    _ => continue,
                };
                match scope {
                    Term::Var(_) => needed = needed.max(1),
                    Term::Literal(lex) => {
                        if let Value::Number(n) = &*session.value(lex) {
                            if let Ok(level) = n.lexical().parse::<u64>() {
                                needed = needed.max(level);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        needed
    }
}

fn firing_key(rule_index: usize, premises: &[Triple]) -> String {
    let mut key = format!("{}|", rule_index);
    for premise in premises {
        key.push_str(&canon_triple_key(premise));
        key.push('\u{3}');
    }
    key
}

/// The deductive closure of a formula's triples under its own embedded
/// rules; used by `log:conclusion` and kin.
pub(crate) fn formula_closure(session: &Session, triples: &[Triple]) -> Result<FactStore> {
    let mut core = Core::default();
    for t in triples {
        if let Term::Iri(p) = &t.p {
            if let Some(rule) = rule_from_parts(&t.s, p, &t.o) {
                match rule.direction {
                    Direction::Forward => core.rules.add_forward(rule, session),
                    Direction::Backward => core.rules.add_backward(rule, session),
                };
                continue;
            }
        }
        if t.is_ground() {
            core.store.insert(t.clone());
        }
    }
    let mut noop = |_d: &Derivation| {};
    core.run(session, &mut noop)?;
    Ok(core.store)
}

/// One reasoning run: facts, rules, caches, derivations.
///
/// ```
/// use noesis::{Options, Reasoner};
///
/// let mut reasoner = Reasoner::new(Options::default());
/// reasoner
///     .load_str("@prefix : <http://e/> . :a :p :b . { ?x :p ?y } => { ?y :q ?x } .")
///     .unwrap();
/// reasoner.run().unwrap();
/// assert_eq!(reasoner.derived().len(), 1);
/// ```
pub struct Reasoner {
    session: Session,
    prolog: Prolog,
    core: Core,
    on_derived: Option<Box<dyn FnMut(&Derivation)>>,
}

impl Reasoner {
    /// A fresh reasoner with its own session.
    pub fn new(options: Options) -> Self {
        Reasoner {
            session: Session::new(options),
            prolog: Prolog::new(),
            core: Core::default(),
            on_derived: None,
        }
    }

    /// The session owning this run's caches.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The prefix environment gathered from loaded documents.
    pub fn prolog(&self) -> &Prolog {
        &self.prolog
    }

    /// Parses and loads a document.
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let doc = Document::parse(text, &self.session)?;
        self.load(doc);
        Ok(())
    }

    /// Loads a parsed document: ground triples become facts (non-ground
    /// ones are dropped), rules are normalized and indexed.
    pub fn load(&mut self, doc: Document) {
        self.prolog.absorb(&doc.prolog);
        for t in doc.triples {
            if t.is_ground() {
                self.core.store.insert(t);
            } else {
                warn!("dropping non-ground input triple");
            }
        }
        for rule in doc.forward {
            self.core.rules.add_forward(rule, &self.session);
        }
        for rule in doc.backward {
            self.core.rules.add_backward(rule, &self.session);
        }
    }

    /// Sets a sink invoked once per newly derived fact.
    pub fn on_derived(&mut self, sink: Box<dyn FnMut(&Derivation)>) {
        self.on_derived = Some(sink);
    }

    /// Computes the closure. The only error a well-formed program can
    /// produce is a triggered fuse.
    pub fn run(&mut self) -> Result<()> {
        let mut noop = |_d: &Derivation| {};
        match &mut self.on_derived {
            Some(sink) => self.core.run(&self.session, sink.as_mut()),
            None => self.core.run(&self.session, &mut noop),
        }
    }

    /// The final fact store, originals included, in append order.
    pub fn facts(&self) -> impl Iterator<Item = &Triple> {
        self.core.store.iter()
    }

    /// The derivation records, in derivation order.
    pub fn derived(&self) -> &[Derivation] {
        &self.core.derived
    }

    /// The active rules, runtime-derived ones included.
    pub fn rules(&self) -> &RuleSet {
        &self.core.rules
    }

    /// Proves an ad-hoc goal list against the current store and rules.
    pub fn prove(
        &self,
        goals: &[Triple],
        max_results: Option<usize>,
        projection: &[Rc<str>],
    ) -> Vec<Subst> {
        let prover = Prover {
            store: &self.core.store,
            rules: &self.core.rules,
            session: &self.session,
            snapshot: None,
        };
        prover.prove(goals, max_results, projection)
    }

    /// The collected `log:outputString` texts, ordered by key (numeric
    /// order when both keys are numeric, canonical order otherwise).
    ///
    /// Pairs come from two places: premises that evaluated the builtin,
    /// and derived facts whose predicate is `log:outputString`.
    pub fn output_strings(&self) -> String {
        let mut pairs = self.session.outputs();
        let out_pred = self.session.iri(logvocab::outputString);
        for t in self.core.store.iter() {
            if t.p == out_pred {
                if let Term::Literal(lex) = &t.o {
                    match &*self.session.value(lex) {
                        Value::Str(text) => pairs.push((t.s.clone(), text.clone())),
                        Value::LangStr(text, _) => pairs.push((t.s.clone(), text.clone())),
                        _ => {}
                    }
                }
            }
        }
        let session = &self.session;
        pairs.sort_by(|a, b| output_key_order(&a.0, &b.0, session));
        pairs.into_iter().map(|(_, text)| text).collect()
    }
}

fn output_key_order(a: &Term, b: &Term, session: &Session) -> Ordering {
    let number = |t: &Term| match t {
        Term::Literal(lex) => match &*session.value(lex) {
            Value::Number(n) => Some(n.clone()),
            _ => None,
        },
        _ => None,
    };
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.cmp_num(&y).unwrap_or(Ordering::Equal),
        _ => canon_key(a).cmp(&canon_key(b)),
    }
}
