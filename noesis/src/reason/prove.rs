//! The goal prover: depth-first backward chaining with an explicit work
//! stack.
//!
//! Each frame holds a residual goal list, the current substitution, a
//! visited-goal chain for loop protection, and a depth. Builtin goals
//! dispatch to the builtin library; everything else is matched against
//! fact candidates (first) and backward rules (second), both in stable
//! order. Substitutions that grow past a threshold are garbage-collected
//! down to the variables the answer and the remaining goals can reach.

use crate::builtins;
use crate::rule::RuleSet;
use crate::session::Session;
use crate::store::FactStore;
use crate::term::{Term, Triple};
use crate::unify::{compose, triples_alpha_eq, unify_triples, Subst};
use rustc_hash::FxHashSet;
use std::rc::Rc;

use super::engine::Snapshot;

/// Substitution size past which a frame's substitution is shrunk.
const SUBST_GC_LEN: usize = 64;
/// Depth past which every frame shrinks its substitution.
const SUBST_GC_DEPTH: usize = 128;

/// One proof search over a fact store, rule set and session.
pub struct Prover<'a> {
    /// Facts to match goals against.
    pub store: &'a FactStore,
    /// Backward rules (and the forward rules, for `log:implies`).
    pub rules: &'a RuleSet,
    /// Per-run caches and options.
    pub session: &'a Session,
    /// The scoped-closure snapshot, when one is attached.
    pub snapshot: Option<&'a Snapshot>,
}

struct Frame {
    goals: Vec<Triple>,
    subst: Subst,
    visited: Option<Rc<Visited>>,
    depth: usize,
}

struct Visited {
    goal: Triple,
    parent: Option<Rc<Visited>>,
}

impl<'a> Prover<'a> {
    /// Proves a goal list. Answers are substitutions projected to
    /// `projection`; `max_results` stops the enumeration early.
    pub fn prove(
        &self,
        goals: &[Triple],
        max_results: Option<usize>,
        projection: &[Rc<str>],
    ) -> Vec<Subst> {
        let mut answers = Vec::new();
        let mut stack = vec![Frame {
            goals: goals.to_vec(),
            subst: Subst::new(),
            visited: None,
            depth: 0,
        }];
        while let Some(frame) = stack.pop() {
            if frame.goals.is_empty() {
                answers.push(frame.subst.project(projection));
                match max_results {
                    Some(max) if answers.len() >= max => break,
                    _ => continue,
                }
            }
            let goal = frame.subst.apply_triple(&frame.goals[0]);
            let rest: Vec<Triple> = frame.goals[1..].to_vec();

            if let Term::Iri(p) = &goal.p {
                if let Some(handler) = builtins::lookup(self.session, p) {
                    let deltas = handler(&goal.s, &goal.o, self);
                    for delta in deltas.into_iter().rev() {
                        if let Some(next) = compose(&frame.subst, &delta, self.session) {
                            stack.push(self.frame(
                                rest.clone(),
                                next,
                                frame.visited.clone(),
                                frame.depth + 1,
                                projection,
                            ));
                        }
                    }
                    continue;
                }
            }

            // the same pattern is already being proved further up
            if self.in_visited(&frame.visited, &goal) {
                continue;
            }
            let visited = Some(Rc::new(Visited {
                goal: goal.clone(),
                parent: frame.visited.clone(),
            }));

            // rules are pushed first so facts are explored first
            for (ri, hi) in self.rules.backward_candidates(&goal.p).into_iter().rev() {
                let rule = self.rules.backward[ri].rename_apart(self.session);
                if let Some(next) =
                    unify_triples(&goal, &rule.conclusion[hi], &frame.subst, self.session)
                {
                    let mut goals = rule.premise;
                    goals.extend(rest.iter().cloned());
                    stack.push(self.frame(
                        goals,
                        next,
                        visited.clone(),
                        frame.depth + 1,
                        projection,
                    ));
                }
            }
            for index in self.store.candidates(&goal).into_iter().rev() {
                let fact = self.store.get(index);
                if let Some(next) = unify_triples(&goal, fact, &frame.subst, self.session) {
                    stack.push(self.frame(
                        rest.clone(),
                        next,
                        visited.clone(),
                        frame.depth + 1,
                        projection,
                    ));
                }
            }
        }
        answers
    }

    /// True when the goal list has at least one proof.
    pub fn provable(&self, goals: &[Triple]) -> bool {
        !self.prove(goals, Some(1), &[]).is_empty()
    }

    fn frame(
        &self,
        goals: Vec<Triple>,
        mut subst: Subst,
        visited: Option<Rc<Visited>>,
        depth: usize,
        projection: &[Rc<str>],
    ) -> Frame {
        if subst.len() > SUBST_GC_LEN || depth > SUBST_GC_DEPTH {
            let mut roots: FxHashSet<Rc<str>> = projection.iter().cloned().collect();
            let mut mentioned = Vec::new();
            for goal in &goals {
                goal.collect_vars(&mut mentioned);
            }
            roots.extend(mentioned);
            subst.shrink(&roots);
        }
        Frame {
            goals,
            subst,
            visited,
            depth,
        }
    }

    fn in_visited(&self, chain: &Option<Rc<Visited>>, goal: &Triple) -> bool {
        let mut current = chain;
        while let Some(node) = current {
            if triples_alpha_eq(&node.goal, goal, self.session) {
                return true;
            }
            current = &node.parent;
        }
        false
    }
}
