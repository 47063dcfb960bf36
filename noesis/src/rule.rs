//! Rules and the rule index.
//!
//! A forward rule `{P} => {C}` fires during the fixpoint; a backward rule
//! `{H} <= {B}` is consulted during proof search. Rules are normalized on
//! construction: premise blanks that do not belong to the head are lifted
//! to universal variables, and constraint-like builtins are moved to the
//! end of the premise so they evaluate only after bindings exist.

use crate::ns::{list, log, math, string};
use crate::session::Session;
use crate::term::{blanks_of_head, vars_of, Term, Triple};
use crate::unify::{triple_lists_alpha_eq, Subst};
use lazy_static::lazy_static;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// Chaining direction of a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `{P} => {C}`: fires in the forward fixpoint.
    Forward,
    /// `{H} <= {B}`: consulted by the goal prover.
    Backward,
}

lazy_static! {
    /// Predicates that are pure tests: they constrain bindings without
    /// producing any, so premise reordering moves them to the end.
    static ref CONSTRAINTS: FxHashSet<&'static str> = {
        let mut set = FxHashSet::default();
        for p in &[
            math::equalTo,
            math::notEqualTo,
            math::lessThan,
            math::greaterThan,
            math::notLessThan,
            math::notGreaterThan,
            string::contains,
            string::containsIgnoringCase,
            string::startsWith,
            string::endsWith,
            string::equal,
            string::notEqual,
            string::equalIgnoringCase,
            string::notEqualIgnoringCase,
            string::lessThan,
            string::greaterThan,
            string::notLessThan,
            string::notGreaterThan,
            string::matches,
            string::notMatches,
            list::notMember,
            log::notEqualTo,
            log::notIncludes,
            log::outputString,
            log::forAllIn,
        ] {
            set.insert(*p);
        }
        set
    };
}

/// A Horn rule.
#[derive(Clone, Debug)]
pub struct Rule {
    /// Premise triples; empty for a rule that fires unconditionally.
    pub premise: Vec<Triple>,
    /// Conclusion triples; empty for a fuse.
    pub conclusion: Vec<Triple>,
    /// Chaining direction.
    pub direction: Direction,
    /// True for a forward rule whose conclusion is the literal `false`.
    pub fuse: bool,
    /// Blank labels textually present in the conclusion; the
    /// existentials skolemized when the rule fires.
    pub head_blanks: FxHashSet<Rc<str>>,
}

impl Rule {
    /// Builds and normalizes a rule.
    pub fn new(
        direction: Direction,
        premise: Vec<Triple>,
        conclusion: Vec<Triple>,
        fuse: bool,
    ) -> Rule {
        let head_blanks = blanks_of_head(&conclusion);
        let mut rule = Rule {
            premise,
            conclusion,
            direction,
            fuse,
            head_blanks,
        };
        rule.normalize();
        rule
    }

    fn normalize(&mut self) {
        let head_blanks = self.head_blanks.clone();
        for t in &mut self.premise {
            *t = Triple::new(
                lift_blanks(&t.s, &head_blanks),
                lift_blanks(&t.p, &head_blanks),
                lift_blanks(&t.o, &head_blanks),
            );
        }
        let (free, constrained): (Vec<Triple>, Vec<Triple>) = self
            .premise
            .drain(..)
            .partition(|t| !is_constraint(&t.p));
        self.premise = free;
        self.premise.extend(constrained);
    }

    /// Variable names of premise and conclusion, first-seen order.
    pub fn vars(&self) -> Vec<Rc<str>> {
        let mut names = vars_of(&self.premise);
        for t in &self.conclusion {
            t.collect_vars(&mut names);
        }
        let mut seen: FxHashSet<Rc<str>> = FxHashSet::default();
        names.retain(|n| seen.insert(n.clone()));
        names
    }

    /// A copy with every variable renamed fresh, so applying the rule
    /// cannot capture variables of the goal it is applied to.
    pub fn rename_apart(&self, session: &Session) -> Rule {
        let id = session.fresh_id();
        let mut renaming = Subst::new();
        for name in self.vars() {
            let fresh: Rc<str> = Rc::from(format!("{}.{}", name, id).as_str());
            renaming.bind(name, Term::Var(fresh));
        }
        Rule {
            premise: self
                .premise
                .iter()
                .map(|t| renaming.apply_triple(t))
                .collect(),
            conclusion: self
                .conclusion
                .iter()
                .map(|t| renaming.apply_triple(t))
                .collect(),
            direction: self.direction,
            fuse: self.fuse,
            head_blanks: self.head_blanks.clone(),
        }
    }

    /// α-equivalence of two rules: same direction and fuse flag, and
    /// premise/conclusion matching under one shared renaming.
    pub fn alpha_eq(&self, other: &Rule, session: &Session) -> bool {
        self.direction == other.direction
            && self.fuse == other.fuse
            && triple_lists_alpha_eq(
                &[
                    (&self.premise, &other.premise),
                    (&self.conclusion, &other.conclusion),
                ],
                session,
            )
    }

    /// The rule-as-data triple this rule corresponds to, with the empty
    /// premise rendered as the literal `true` and a fuse conclusion as
    /// the literal `false`.
    pub fn as_triple(&self, session: &Session) -> Triple {
        let formula_or_true = |triples: &[Triple]| {
            if triples.is_empty() {
                session.literal("true")
            } else {
                Term::Formula(triples.to_vec())
            }
        };
        match self.direction {
            Direction::Forward => Triple::new(
                formula_or_true(&self.premise),
                session.iri(log::implies),
                if self.fuse {
                    session.literal("false")
                } else {
                    formula_or_true(&self.conclusion)
                },
            ),
            Direction::Backward => Triple::new(
                formula_or_true(&self.conclusion),
                session.iri(log::impliedBy),
                formula_or_true(&self.premise),
            ),
        }
    }
}

fn is_constraint(pred: &Term) -> bool {
    match pred {
        Term::Iri(p) => CONSTRAINTS.contains(&**p),
        _ => false,
    }
}

/// Renames premise blanks outside the head's blank set to variables, so
/// they unify freely during proving. The variable name embeds a `.` to
/// stay clear of anything the parser can produce.
fn lift_blanks(term: &Term, head_blanks: &FxHashSet<Rc<str>>) -> Term {
    match term {
        Term::Blank(label) if !head_blanks.contains(label) => {
            Term::Var(Rc::from(format!("bl.{}", label).as_str()))
        }
        Term::List(xs) => Term::List(xs.iter().map(|t| lift_blanks(t, head_blanks)).collect()),
        Term::OpenList(xs, tail) => Term::OpenList(
            xs.iter().map(|t| lift_blanks(t, head_blanks)).collect(),
            tail.clone(),
        ),
        other => other.clone(),
    }
}

/// Reads a rule out of a rule-as-data triple with predicate
/// `log:implies` or `log:impliedBy`. Sides must be quoted formulas, with
/// the literal `true` accepted as the empty formula and the literal
/// `false` as a fuse conclusion. Returns `None` for any other shape.
pub fn rule_from_parts(s: &Term, pred: &str, o: &Term) -> Option<Rule> {
    let side = |t: &Term| -> Option<Vec<Triple>> {
        match t {
            Term::Formula(ts) => Some(ts.clone()),
            Term::Literal(lex) if &**lex == "true" => Some(Vec::new()),
            _ => None,
        }
    };
    if pred == log::implies {
        let premise = side(s)?;
        if let Term::Literal(lex) = o {
            if &**lex == "false" {
                return Some(Rule::new(Direction::Forward, premise, Vec::new(), true));
            }
        }
        let conclusion = side(o)?;
        Some(Rule::new(Direction::Forward, premise, conclusion, false))
    } else if pred == log::impliedBy {
        let head = match s {
            Term::Formula(ts) => ts.clone(),
            _ => return None,
        };
        let body = side(o)?;
        Some(Rule::new(Direction::Backward, body, head, false))
    } else {
        None
    }
}

/// The active rules of a run: forward rules in document order and
/// backward rules indexed by head-predicate IRI.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    /// Forward rules, fired in order.
    pub forward: Vec<Rule>,
    /// Backward rules, consulted during proof search.
    pub backward: Vec<Rule>,
    by_head: FxHashMap<Rc<str>, Vec<(usize, usize)>>,
    wildcard: Vec<(usize, usize)>,
}

impl RuleSet {
    /// An empty set.
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Adds a forward rule unless an α-equivalent one exists. Returns
    /// whether the set changed.
    pub fn add_forward(&mut self, rule: Rule, session: &Session) -> bool {
        if self.forward.iter().any(|r| r.alpha_eq(&rule, session)) {
            return false;
        }
        self.forward.push(rule);
        true
    }

    /// Adds and indexes a backward rule unless an α-equivalent one
    /// exists. Returns whether the set changed.
    pub fn add_backward(&mut self, rule: Rule, session: &Session) -> bool {
        if self.backward.iter().any(|r| r.alpha_eq(&rule, session)) {
            return false;
        }
        let index = self.backward.len();
        for (hi, head) in rule.conclusion.iter().enumerate() {
            match &head.p {
                Term::Iri(p) => self
                    .by_head
                    .entry(p.clone())
                    .or_default()
                    .push((index, hi)),
                _ => self.wildcard.push((index, hi)),
            }
        }
        self.backward.push(rule);
        true
    }

    /// Backward-rule candidates for a goal predicate: the head-IRI bucket
    /// followed by the rules whose head predicate is not an IRI.
    pub fn backward_candidates(&self, pred: &Term) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        if let Term::Iri(p) = pred {
            if let Some(bucket) = self.by_head.get(p) {
                out.extend_from_slice(bucket);
            }
            out.extend_from_slice(&self.wildcard);
        } else {
            // non-IRI goal predicate: every head may match
            for (i, rule) in self.backward.iter().enumerate() {
                for hi in 0..rule.conclusion.len() {
                    out.push((i, hi));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn session() -> Session {
        Session::default()
    }

    #[test]
    fn premise_blanks_are_lifted() {
        let s = session();
        let rule = Rule::new(
            Direction::Forward,
            vec![Triple::new(
                Term::blank("x"),
                s.iri("http://e/p"),
                Term::blank("kept"),
            )],
            vec![Triple::new(
                Term::blank("kept"),
                s.iri("http://e/q"),
                s.iri("http://e/o"),
            )],
            false,
        );
        assert!(matches!(rule.premise[0].s, Term::Var(_)));
        // a premise blank shared with the head stays a blank
        assert!(matches!(rule.premise[0].o, Term::Blank(_)));
        assert!(rule.head_blanks.contains("kept"));
    }

    #[test]
    fn constraints_move_to_the_end() {
        let s = session();
        let test = Triple::new(
            Term::var("n"),
            s.iri(math::lessThan),
            s.literal("0"),
        );
        let producer = Triple::new(Term::var("x"), s.iri("http://e/age"), Term::var("n"));
        let rule = Rule::new(
            Direction::Forward,
            vec![test.clone(), producer.clone()],
            vec![],
            true,
        );
        assert_eq!(rule.premise[0], producer);
        assert_eq!(rule.premise[1], test);
    }

    #[test]
    fn rename_apart_is_capture_free() {
        let s = session();
        let rule = Rule::new(
            Direction::Backward,
            vec![Triple::new(
                Term::var("x"),
                s.iri("http://e/p"),
                Term::var("y"),
            )],
            vec![Triple::new(
                Term::var("x"),
                s.iri("http://e/q"),
                Term::var("y"),
            )],
            false,
        );
        let renamed = rule.rename_apart(&s);
        assert!(rule.alpha_eq(&renamed, &s));
        assert_ne!(rule.premise[0].s, renamed.premise[0].s);
    }

    #[test]
    fn rule_as_data_roundtrip() {
        let s = session();
        let premise = Term::Formula(vec![Triple::new(
            Term::var("x"),
            s.iri("http://e/p"),
            Term::var("y"),
        )]);
        let conclusion = Term::Formula(vec![Triple::new(
            Term::var("x"),
            s.iri("http://e/q"),
            Term::var("y"),
        )]);
        let rule = rule_from_parts(&premise, log::implies, &conclusion).unwrap();
        assert_eq!(rule.direction, Direction::Forward);
        let triple = rule.as_triple(&s);
        let again = rule_from_parts(&triple.s, log::implies, &triple.o).unwrap();
        assert!(rule.alpha_eq(&again, &s));
    }

    #[test]
    fn true_is_empty_premise_and_false_is_fuse() {
        let s = session();
        let rule = rule_from_parts(&s.literal("true"), log::implies, &s.literal("false")).unwrap();
        assert!(rule.premise.is_empty());
        assert!(rule.fuse);
    }

    #[test]
    fn backward_index_buckets_by_head_predicate() {
        let s = session();
        let mut rules = RuleSet::new();
        let rule = Rule::new(
            Direction::Backward,
            vec![],
            vec![Triple::new(
                Term::var("x"),
                s.iri("http://e/head"),
                Term::var("y"),
            )],
            false,
        );
        assert!(rules.add_backward(rule.clone(), &s));
        assert!(!rules.add_backward(rule, &s));
        assert_eq!(
            rules.backward_candidates(&s.iri("http://e/head")).len(),
            1
        );
        assert!(rules
            .backward_candidates(&s.iri("http://e/other"))
            .is_empty());
    }
}
