//! Captured derivations.

use crate::parse::Prolog;
use crate::rule::RuleSet;
use crate::serialize::Serializer;
use crate::term::{Term, Triple};
use crate::unify::Subst;

/// Why a fact entered the store: the rule that fired, the instantiated
/// premises it fired on, and the solution substitution restricted to the
/// rule's own variables.
pub struct Derivation {
    /// The materialized fact.
    pub fact: Triple,
    /// Index of the firing rule in the forward list.
    pub rule: usize,
    /// The premises, instantiated under the solution.
    pub premises: Vec<Triple>,
    /// The solution substitution, projected to the rule's variables.
    pub bindings: Subst,
}

impl Derivation {
    /// A human-readable explanation line: the schematic rule followed by
    /// the bindings that fired it.
    pub fn render(&self, rules: &RuleSet, prolog: &Prolog) -> String {
        let writer = Serializer::new(prolog);
        let mut out = format!("# rule {}", self.rule);
        if let Some(rule) = rules.forward.get(self.rule) {
            let premise = Term::Formula(rule.premise.clone());
            let conclusion = if rule.fuse {
                "false".to_string()
            } else {
                writer.term(&Term::Formula(rule.conclusion.clone()))
            };
            out.push_str(&format!(
                ": {} => {}",
                writer.term(&premise),
                conclusion
            ));
        }
        let mut bindings: Vec<String> = self
            .bindings
            .iter()
            .map(|(name, term)| format!("?{} = {}", name, writer.term(term)))
            .collect();
        bindings.sort();
        if !bindings.is_empty() {
            out.push_str(&format!(" with {}", bindings.join(", ")));
        }
        out
    }
}
