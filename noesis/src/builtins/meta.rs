//! Meta-logical builtins of the `log:` vocabulary: structural equality,
//! formula algebra, rule reflection, scoped-closure tests, skolemization
//! and the dereferencing builtins.

use super::{check_or_bind, elements_of, succeed, try_opt, value_of, Solutions};
use crate::fetch::fetch;
use crate::ns::{self, log, rdf, xsd};
use crate::parse::Document;
use crate::reason::{formula_closure, Prover};
use crate::rule::RuleSet;
use crate::serialize::Serializer;
use crate::session::Session;
use crate::store::FactStore;
use crate::term::literal::{quote, split_quoted, Suffix, Value};
use crate::term::{canon_key, canon_triple_key, vars_of, Term, Triple};
use crate::unify::{compose, terms_equal, unify, Subst};
use rustc_hash::FxHashSet;
use std::rc::Rc;

/// `a log:equalTo b` — structural equality; an unbound side is bound.
pub fn equal_to(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    match unify(s, o, &Subst::new(), pv.session) {
        Some(delta) => vec![delta],
        None => Vec::new(),
    }
}

/// `a log:notEqualTo b` — structural inequality.
pub fn not_equal_to(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    if terms_equal(s, o, pv.session) {
        Vec::new()
    } else {
        succeed()
    }
}

/// `(F G …) log:conjunction ?H` — the union of quoted formulas, with
/// duplicate triples dropped by their canonical key.
pub fn conjunction(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let formulas = try_opt!(elements_of(s));
    let mut seen = FxHashSet::default();
    let mut triples = Vec::new();
    for f in formulas {
        match f {
            Term::Formula(ts) => {
                for t in ts {
                    if seen.insert(canon_triple_key(t)) {
                        triples.push(t.clone());
                    }
                }
            }
            _ => return Vec::new(),
        }
    }
    check_or_bind(o, &Term::Formula(triples), pv.session)
}

/// `F log:conclusion ?G` — the deductive closure of a quoted formula
/// under its own embedded rules, cached per run. Output strings produced
/// inside the computation are not collected.
pub fn conclusion(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let triples = match s {
        Term::Formula(ts) => ts,
        _ => return Vec::new(),
    };
    let key = canon_key(s);
    if let Some(hit) = pv.session.cached_conclusion(&key) {
        return check_or_bind(o, &hit, pv.session);
    }
    let closed = pv
        .session
        .with_outputs_suspended(|| formula_closure(pv.session, triples));
    match closed {
        Ok(store) => {
            let formula = Term::Formula(store.iter().cloned().collect());
            pv.session.cache_conclusion(key, formula.clone());
            check_or_bind(o, &formula, pv.session)
        }
        // a fuse inside the closure means the formula concludes nothing
        Err(_) => Vec::new(),
    }
}

/// `?P log:implies ?C` — enumerates the active forward rules
/// (loaded and runtime-derived alike) as standardized-apart
/// premise/conclusion formula pairs.
pub fn implies(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    enumerate_rules(s, o, pv, true)
}

/// `?H log:impliedBy ?B` — likewise for the backward rules.
pub fn implied_by(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    enumerate_rules(s, o, pv, false)
}

fn enumerate_rules(s: &Term, o: &Term, pv: &Prover<'_>, forward: bool) -> Solutions {
    let rules = if forward {
        &pv.rules.forward
    } else {
        &pv.rules.backward
    };
    let mut out = Vec::new();
    for rule in rules {
        let fresh = rule.rename_apart(pv.session);
        let triple = fresh.as_triple(pv.session);
        if let Some(delta) = unify(s, &triple.s, &Subst::new(), pv.session) {
            if let Some(delta) = unify(o, &triple.o, &delta, pv.session) {
                out.push(delta);
            }
        }
    }
    out
}

/// The world a scope argument denotes.
enum Scope<'a> {
    /// A quoted formula: its own triples and embedded rules.
    Owned(FactStore, RuleSet),
    /// The engine's scoped-closure snapshot.
    Shared(&'a FactStore),
}

/// Resolves the scope argument of the scoped builtins: a formula is a
/// self-contained world; a variable takes the current snapshot (and is
/// bound to it rendered as a formula); a positive integer takes the
/// snapshot once the closure level has reached it.
fn resolve_scope<'a>(scope: &Term, pv: &Prover<'a>) -> Option<(Scope<'a>, Subst)> {
    match scope {
        Term::Formula(triples) => {
            let (store, rules) = world_of(triples, pv.session);
            Some((Scope::Owned(store, rules), Subst::new()))
        }
        Term::Var(name) => {
            let snapshot = pv.snapshot?;
            let mut delta = Subst::new();
            delta.bind(name.clone(), snapshot.formula.clone());
            Some((Scope::Shared(&snapshot.store), delta))
        }
        Term::Literal(lex) => {
            let level = match &*pv.session.value(lex) {
                Value::Number(n) => n.lexical().parse::<u64>().ok()?,
                _ => return None,
            };
            if level == 0 {
                return None;
            }
            let snapshot = pv.snapshot?;
            if snapshot.level >= level {
                Some((Scope::Shared(&snapshot.store), Subst::new()))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn world_of(triples: &[Triple], session: &Session) -> (FactStore, RuleSet) {
    let mut store = FactStore::new();
    let mut rules = RuleSet::new();
    for t in triples {
        if let Term::Iri(p) = &t.p {
            if let Some(rule) = crate::rule::rule_from_parts(&t.s, p, &t.o) {
                match rule.direction {
                    crate::rule::Direction::Forward => rules.add_forward(rule, session),
                    crate::rule::Direction::Backward => rules.add_backward(rule, session),
                };
                continue;
            }
        }
        store.insert(t.clone());
    }
    (store, rules)
}

fn prove_in_scope(
    scope: &Scope<'_>,
    pv: &Prover<'_>,
    goals: &[Triple],
    max: Option<usize>,
    projection: &[Rc<str>],
) -> Vec<Subst> {
    match scope {
        Scope::Owned(store, rules) => Prover {
            store,
            rules,
            session: pv.session,
            snapshot: None,
        }
        .prove(goals, max, projection),
        Scope::Shared(store) => Prover {
            store,
            rules: pv.rules,
            session: pv.session,
            snapshot: None,
        }
        .prove(goals, max, projection),
    }
}

/// `SCOPE log:includes {G}` — the goal formula is provable against the
/// scope; bindings of the goal's variables are returned.
pub fn includes(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let goals = match o {
        Term::Formula(ts) => ts.clone(),
        _ => return Vec::new(),
    };
    let (scope, scope_delta) = try_opt!(resolve_scope(s, pv));
    let projection = vars_of(&goals);
    let answers = prove_in_scope(&scope, pv, &goals, Some(1), &projection);
    match answers.into_iter().next() {
        Some(delta) => match compose(&scope_delta, &delta, pv.session) {
            Some(merged) => vec![merged],
            None => Vec::new(),
        },
        None => Vec::new(),
    }
}

/// `SCOPE log:notIncludes {G}` — the goal formula is not provable.
pub fn not_includes(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let goals = match o {
        Term::Formula(ts) => ts.clone(),
        _ => return Vec::new(),
    };
    let (scope, scope_delta) = try_opt!(resolve_scope(s, pv));
    if prove_in_scope(&scope, pv, &goals, Some(1), &[]).is_empty() {
        vec![scope_delta]
    } else {
        Vec::new()
    }
}

/// `({W} {T}) log:forAllIn SCOPE` — every valuation of the where-clause
/// against the scope also proves the then-clause.
pub fn for_all_in(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let pair = try_opt!(elements_of(s));
    if pair.len() != 2 {
        return Vec::new();
    }
    let (where_goals, then_goals) = match (&pair[0], &pair[1]) {
        (Term::Formula(w), Term::Formula(t)) => (w.clone(), t.clone()),
        _ => return Vec::new(),
    };
    let (scope, scope_delta) = try_opt!(resolve_scope(o, pv));
    let projection = vars_of(&where_goals);
    for valuation in prove_in_scope(&scope, pv, &where_goals, None, &projection) {
        let instantiated: Vec<Triple> = then_goals
            .iter()
            .map(|t| valuation.apply_triple(t))
            .collect();
        if prove_in_scope(&scope, pv, &instantiated, Some(1), &[]).is_empty() {
            return Vec::new();
        }
    }
    vec![scope_delta]
}

/// `(TEMPLATE {W} ?L) log:collectAllIn SCOPE` — collects the template
/// instance of every valuation of the where-clause into a list.
pub fn collect_all_in(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let trio = try_opt!(elements_of(s));
    if trio.len() != 3 {
        return Vec::new();
    }
    let where_goals = match &trio[1] {
        Term::Formula(ts) => ts.clone(),
        _ => return Vec::new(),
    };
    let (scope, scope_delta) = try_opt!(resolve_scope(o, pv));
    let mut projection = vars_of(&where_goals);
    let mut template_vars = Vec::new();
    trio[0].collect_vars(&mut template_vars);
    for v in template_vars {
        if !projection.iter().any(|p| **p == *v) {
            projection.push(v);
        }
    }
    let collected: Vec<Term> = prove_in_scope(&scope, pv, &where_goals, None, &projection)
        .into_iter()
        .map(|valuation| valuation.apply(&trio[0]))
        .collect();
    match unify(&trio[2], &Term::List(collected), &scope_delta, pv.session) {
        Some(delta) => vec![delta],
        None => Vec::new(),
    }
}

/// `a log:trace b` — writes a diagnostic line to standard error and
/// succeeds.
pub fn trace(s: &Term, o: &Term, _pv: &Prover<'_>) -> Solutions {
    let writer = Serializer::plain();
    eprintln!("# trace: {} {}", writer.term(s), writer.term(o));
    succeed()
}

/// `key log:outputString text` — marks a key→text pair for ordered
/// output collection after the run.
pub fn output_string(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let text = match value_of(o, pv.session).as_deref() {
        Some(Value::Str(text)) => text.clone(),
        Some(Value::LangStr(text, _)) => text.clone(),
        _ => return Vec::new(),
    };
    pv.session.record_output(s.clone(), text);
    succeed()
}

/// `t log:skolem ?iri` — a stable IRI in the reserved namespace, derived
/// deterministically from the canonical JSON encoding of the subject.
pub fn skolem(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    if !s.is_ground() {
        return Vec::new();
    }
    let key = canonical_json(s).to_string();
    let iri = match pv.session.cached_skolem(&key) {
        Some(iri) => iri,
        None => {
            let uuid = fnv_uuid(&key, pv.session.skolem_salt());
            let iri: Rc<str> = Rc::from(format!("{}{}", ns::SKOLEM_NS, uuid).as_str());
            pv.session.cache_skolem(key, iri.clone());
            iri
        }
    };
    check_or_bind(o, &pv.session.iri(&iri), pv.session)
}

fn canonical_json(term: &Term) -> serde_json::Value {
    use serde_json::json;
    match term {
        Term::Iri(s) => json!({ "iri": &**s }),
        Term::Literal(s) => json!({ "lit": &**s }),
        Term::Var(s) => json!({ "var": &**s }),
        Term::Blank(s) => json!({ "blank": &**s }),
        Term::List(xs) => {
            json!({ "list": xs.iter().map(canonical_json).collect::<Vec<_>>() })
        }
        Term::OpenList(xs, tail) => json!({
            "open": xs.iter().map(canonical_json).collect::<Vec<_>>(),
            "tail": &**tail,
        }),
        Term::Formula(ts) => json!({
            "formula": ts
                .iter()
                .map(|t| vec![canonical_json(&t.s), canonical_json(&t.p), canonical_json(&t.o)])
                .collect::<Vec<_>>(),
        }),
    }
}

/// A deterministic 32-hex-digit UUID from four parallel FNV-1a-style
/// accumulators over the key, formatted 8-4-4-4-12.
fn fnv_uuid(key: &str, salt: Option<u64>) -> String {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 16_777_619;
    let mut h = [0u32; 4];
    for (i, slot) in h.iter_mut().enumerate() {
        *slot = FNV_OFFSET ^ (i as u32).wrapping_mul(0x9e37_79b9);
    }
    if let Some(salt) = salt {
        for &b in &salt.to_le_bytes() {
            for (i, slot) in h.iter_mut().enumerate() {
                *slot = (*slot ^ (u32::from(b) ^ i as u32)).wrapping_mul(FNV_PRIME);
            }
        }
    }
    for &b in key.as_bytes() {
        for (i, slot) in h.iter_mut().enumerate() {
            *slot = (*slot ^ (u32::from(b) ^ i as u32)).wrapping_mul(FNV_PRIME);
        }
    }
    let hex = format!("{:08x}{:08x}{:08x}{:08x}", h[0], h[1], h[2], h[3]);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// `iri log:uri ?str` / `?iri log:uri str` — conversion between an IRI
/// and its string form.
pub fn uri(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    if let Term::Iri(iri) = s {
        return check_or_bind(o, &pv.session.str_literal(iri), pv.session);
    }
    if let Some(Value::Str(text)) = value_of(o, pv.session).as_deref() {
        return check_or_bind(s, &pv.session.iri(text), pv.session);
    }
    Vec::new()
}

/// `("lex" dt) log:dtlit ?lit` — builds a typed literal, or splits one
/// when the object is given.
pub fn dtlit(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    if let Some(pair) = elements_of(s) {
        if pair.len() == 2 {
            if let (Some(Value::Str(text)), Term::Iri(dt)) =
                (value_of(&pair[0], pv.session).as_deref(), &pair[1])
            {
                let lex = if &**dt == xsd::string {
                    quote(text)
                } else {
                    format!("\"{}\"^^<{}>", crate::term::literal::escape(text), dt)
                };
                return check_or_bind(o, &pv.session.literal(&lex), pv.session);
            }
        }
    }
    if let Term::Literal(lex) = o {
        let (text, datatype) = match split_quoted(lex) {
            Some((text, Suffix::None)) => (text, xsd::string.to_string()),
            Some((text, Suffix::Datatype(dt))) => (text, dt),
            Some((text, Suffix::Lang(_))) => (text, rdf::langString.to_string()),
            None => match &*pv.session.value(lex) {
                Value::Boolean(_) => (lex.to_string(), xsd::boolean.to_string()),
                Value::Number(n) => (
                    lex.to_string(),
                    match n.rank() {
                        0 => xsd::integer.to_string(),
                        1 => xsd::decimal.to_string(),
                        _ => xsd::double.to_string(),
                    },
                ),
                _ => return Vec::new(),
            },
        };
        let parts = Term::List(vec![
            pv.session.str_literal(&text),
            pv.session.iri(&datatype),
        ]);
        return check_or_bind(s, &parts, pv.session);
    }
    Vec::new()
}

/// `("text" "lang") log:langlit ?lit` — builds a language-tagged
/// literal, or splits one when the object is given.
pub fn langlit(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    if let Some(pair) = elements_of(s) {
        if pair.len() == 2 {
            if let (Some(Value::Str(text)), Some(Value::Str(lang))) = (
                value_of(&pair[0], pv.session).as_deref(),
                value_of(&pair[1], pv.session).as_deref(),
            ) {
                let lex = format!("\"{}\"@{}", crate::term::literal::escape(text), lang);
                return check_or_bind(o, &pv.session.literal(&lex), pv.session);
            }
        }
    }
    if let Some(Value::LangStr(text, lang)) = value_of(o, pv.session).as_deref() {
        let parts = Term::List(vec![
            pv.session.str_literal(text),
            pv.session.str_literal(lang),
        ]);
        return check_or_bind(s, &parts, pv.session);
    }
    Vec::new()
}

/// `t log:rawType ?type` — one of `log:Formula`, `log:Literal`,
/// `rdf:List`, `log:Other`.
pub fn raw_type(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let type_iri = match s {
        Term::Formula(_) => log::Formula,
        Term::Literal(_) => log::Literal,
        Term::List(_) | Term::OpenList(..) => rdf::List,
        Term::Iri(_) | Term::Blank(_) => log::Other,
        Term::Var(_) => return Vec::new(),
    };
    check_or_bind(o, &pv.session.iri(type_iri), pv.session)
}

fn document_formula(doc: &Document, session: &Session) -> Term {
    let mut triples = doc.triples.clone();
    for rule in doc.forward.iter().chain(doc.backward.iter()) {
        triples.push(rule.as_triple(session));
    }
    Term::Formula(triples)
}

/// `"text" log:parsedAsN3 ?F` — parses N3 text into a quoted formula;
/// top-level rules come back as rule-as-data triples.
pub fn parsed_as_n3(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let text = match value_of(s, pv.session).as_deref() {
        Some(Value::Str(text)) => text.clone(),
        _ => return Vec::new(),
    };
    match Document::parse(&text, pv.session) {
        Ok(doc) => check_or_bind(o, &document_formula(&doc, pv.session), pv.session),
        Err(_) => Vec::new(),
    }
}

fn dereferenced_formula(iri: &str, pv: &Prover<'_>) -> Result<Term, (String, String)> {
    let text = fetch(pv.session, iri).map_err(|detail| ("fetch".to_string(), detail))?;
    let doc = Document::parse_with_base(&text, pv.session, iri)
        .map_err(|e| ("parse".to_string(), e.to_string()))?;
    Ok(document_formula(&doc, pv.session))
}

/// `iri log:semantics ?F` — dereferences and parses; failures yield no
/// solutions.
pub fn semantics(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let iri = match s {
        Term::Iri(iri) => iri.clone(),
        _ => return Vec::new(),
    };
    match dereferenced_formula(&iri, pv) {
        Ok(formula) => check_or_bind(o, &formula, pv.session),
        Err(_) => Vec::new(),
    }
}

/// `iri log:semanticsOrError ?F` — like `log:semantics`, but a failure
/// binds a distinguished `error(kind, detail)` string literal so that
/// programs can test for it without halting.
pub fn semantics_or_error(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let iri = match s {
        Term::Iri(iri) => iri.clone(),
        _ => return Vec::new(),
    };
    match dereferenced_formula(&iri, pv) {
        Ok(formula) => check_or_bind(o, &formula, pv.session),
        Err((kind, detail)) => check_or_bind(
            o,
            &pv.session.str_literal(&format!("error({}, {})", kind, detail)),
            pv.session,
        ),
    }
}

/// `iri log:content ?text` — dereferences to the raw text.
pub fn content(s: &Term, o: &Term, pv: &Prover<'_>) -> Solutions {
    let iri = match s {
        Term::Iri(iri) => iri.clone(),
        _ => return Vec::new(),
    };
    match fetch(pv.session, &iri) {
        Ok(text) => check_or_bind(o, &pv.session.str_literal(&text), pv.session),
        Err(_) => Vec::new(),
    }
}
