//! Production rules of N3.
//!
//! The supported grammar is the Horn subset the engine consumes:
//!
//! | Production      | Rule |
//! | --------------- | ---- |
//! | `document`      | `(statement '.')* EOF` |
//! | `statement`     | `directive \| subject property_list` |
//! | `directive`     | `'@prefix' PNAME_NS IRIREF '.' \| '@base' IRIREF '.'` |
//! | `property_list` | `verb object (',' object)* (';' (verb object_list)?)*` |
//! | `verb`          | `'a' \| '=>' \| '<=' \| expression` |
//! | `expression`    | `iri \| literal \| variable \| blank \| '[' ... ']' \| '(' ... ')' \| '{' ... '}'` |
//!
//! `@forAll`/`@forSome` declarations, paths and datatyped variables are
//! not part of the subset.

use super::terminals::*;
use super::Context;
use crate::ns::{log, rdf, xsd};
use crate::parse::util::{terminal, unwrap_str};
use crate::term::literal::{escape, unescape};
use crate::term::{Term, Triple};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::{error::ErrorKind, error_position, Err as NomError, IResult};
use std::cell::RefCell;

/// A context wrapped in a `RefCell`.
///
/// This is necessary due to the constraints of `nom`'s parser generators
/// (they only take `Fn`).
pub type RefContext<'s> = RefCell<Context<'s>>;

fn soft(i: &str) -> NomError<(&str, ErrorKind)> {
    NomError::Error(error_position!(i, ErrorKind::Alt))
}

fn hard(i: &str) -> NomError<(&str, ErrorKind)> {
    NomError::Failure(error_position!(i, ErrorKind::Verify))
}

/// Parses a whole document into the context's top-level frame.
pub fn document<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, ()> {
    let (mut rest, _) = multispace0(i)?;
    while !rest.is_empty() {
        let (r, _) = statement(rest, ctx)?;
        let (r, _) = multispace0(r)?;
        rest = r;
    }
    Ok((rest, ()))
}

/// `statement ::= directive | simple_statement '.'`
fn statement<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, ()> {
    if i.starts_with("@prefix") {
        return prefix_id(i, ctx);
    }
    if i.starts_with("@base") {
        return base_decl(i, ctx);
    }
    let (rest, _) = simple_statement(i, ctx)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = tag(".")(rest)?;
    Ok((rest, ()))
}

/// `prefix_id ::= '@prefix' PNAME_NS IRIREF '.'`
fn prefix_id<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, ()> {
    let (rest, _) = tag("@prefix")(i)?;
    let (rest, _) = multispace1(rest)?;
    let (rest, pname) = terminal(&PNAME_NS)(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, namespace) = iriref_text(rest, ctx)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = tag(".")(rest)?;
    let prefix = &pname[..pname.len() - 1];
    ctx.borrow_mut()
        .prolog
        .add_prefix(prefix, &namespace)
        .map_err(|_| hard(i))?;
    Ok((rest, ()))
}

/// `base ::= '@base' IRIREF '.'`
fn base_decl<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, ()> {
    let (rest, _) = tag("@base")(i)?;
    let (rest, _) = multispace1(rest)?;
    let (rest, base) = iriref_text(rest, ctx)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = tag(".")(rest)?;
    ctx.borrow_mut()
        .prolog
        .set_base(base)
        .map_err(|_| hard(i))?;
    Ok((rest, ()))
}

/// `simple_statement ::= subject property_list`; the produced triples go
/// to the innermost open frame.
fn simple_statement<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, ()> {
    let (rest, subject) = expression(i, ctx)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, pairs) = property_list(rest, ctx)?;
    let mut borrowed = ctx.borrow_mut();
    for (p, o) in pairs {
        borrowed.push_triple(Triple::new(subject.clone(), p, o));
    }
    Ok((rest, ()))
}

/// `property_list ::= verb object_list (';' (verb object_list)?)*`
fn property_list<'a>(
    i: &'a str,
    ctx: &RefContext<'_>,
) -> IResult<&'a str, Vec<(Term, Term)>> {
    let (rest, v) = verb(i, ctx)?;
    let (rest, _) = multispace0(rest)?;
    let (mut rest, objects) = object_list(rest, ctx)?;
    let mut pairs: Vec<(Term, Term)> = objects.into_iter().map(|o| (v.clone(), o)).collect();
    loop {
        let (r, _) = multispace0(rest)?;
        if !r.starts_with(';') {
            break;
        }
        let (r, _) = tag(";")(r)?;
        let (r, _) = multispace0(r)?;
        match verb(r, ctx) {
            Ok((r, v)) => {
                let (r, _) = multispace0(r)?;
                let (r, objects) = object_list(r, ctx)?;
                pairs.extend(objects.into_iter().map(|o| (v.clone(), o)));
                rest = r;
            }
            // a trailing `;` carries no pair
            Err(NomError::Error(_)) => {
                rest = r;
            }
            Err(e) => return Err(e),
        }
    }
    Ok((rest, pairs))
}

/// `object_list ::= object (',' object)*`
fn object_list<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Vec<Term>> {
    let (mut rest, first) = expression(i, ctx)?;
    let mut objects = vec![first];
    loop {
        let (r, _) = multispace0(rest)?;
        if !r.starts_with(',') {
            break;
        }
        let (r, _) = tag(",")(r)?;
        let (r, _) = multispace0(r)?;
        let (r, next) = expression(r, ctx)?;
        objects.push(next);
        rest = r;
    }
    Ok((rest, objects))
}

/// `verb ::= 'a' | '=>' | '<=' | expression`
fn verb<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    if let Ok((rest, _)) = keyword_a(i) {
        return Ok((rest, ctx.borrow().session.iri(rdf::type_)));
    }
    if let Some(rest) = i.strip_prefix("=>") {
        return Ok((rest, ctx.borrow().session.iri(log::implies)));
    }
    if let Some(rest) = i.strip_prefix("<=") {
        return Ok((rest, ctx.borrow().session.iri(log::impliedBy)));
    }
    expression(i, ctx)
}

/// The keyword `a`, only when not the start of a longer name.
fn keyword_a(i: &str) -> IResult<&str, &str> {
    if !i.starts_with('a') {
        return Err(soft(i));
    }
    match i[1..].chars().next() {
        None => Err(soft(i)),
        Some(c) if c.is_whitespace() || "<([{?\"'#_".contains(c) => Ok((&i[1..], "a")),
        _ => Err(soft(i)),
    }
}

/// `expression ::= iri | literal | variable | blank | bnode_property_list
/// | collection | formula`, dispatched on the first character.
pub fn expression<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    match i.chars().next() {
        Some('{') => formula(i, ctx),
        Some('(') => collection(i, ctx),
        Some('[') => bnode_property_list(i, ctx),
        Some('?') => variable(i),
        Some('<') => iri_term(i, ctx),
        Some('_') => blank_node(i),
        Some('"') | Some('\'') => string_literal(i, ctx),
        Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' => {
            numeric_literal(i, ctx)
        }
        Some(_) => alt((
            |i| boolean_literal(i, ctx),
            |i| iri_term(i, ctx),
        ))(i),
        None => Err(soft(i)),
    }
}

/// `iri ::= IRIREF | prefixed_name`
fn iri_term<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    if i.starts_with('<') {
        let (rest, iri) = iriref_text(i, ctx)?;
        return Ok((rest, ctx.borrow().session.iri(&iri)));
    }
    let (rest, iri) = prefixed_name(i, ctx)?;
    Ok((rest, ctx.borrow().session.iri(&iri)))
}

/// Parses an `IRIREF`, resolves escapes and the base.
fn iriref_text<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, String> {
    let (rest, wrapped) = terminal(&IRIREF)(i)?;
    let raw = unwrap_str(wrapped, 1);
    let resolved = ctx.borrow().resolve(&unescape(raw));
    Ok((rest, resolved))
}

/// `prefixed_name ::= PNAME_LN | PNAME_NS`, expanded against the prolog.
fn prefixed_name<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, String> {
    let (after_ns, ns_part) = terminal(&PNAME_NS)(i)?;
    let prefix = &ns_part[..ns_part.len() - 1];
    // pn_local is greedy over dots; statement terminators stay out
    let local = match pn_local(after_ns) {
        Ok((_, local)) => local.trim_end_matches('.'),
        Err(_) => "",
    };
    let rest = &after_ns[local.len()..];
    let expanded = ctx
        .borrow()
        .prolog
        .expand(prefix, &unescape_local(local))
        .map_err(|_| hard(i))?;
    Ok((rest, expanded))
}

fn unescape_local(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    let mut chars = local.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `variable ::= '?' VARNAME`
fn variable(i: &str) -> IResult<&str, Term> {
    let (rest, name) = terminal(&VAR1)(i)?;
    Ok((rest, Term::var(&name[1..])))
}

/// `blank ::= BLANK_NODE_LABEL`
fn blank_node(i: &str) -> IResult<&str, Term> {
    let (rest, label) = blank_node_label(i)?;
    Ok((rest, Term::blank(&label[2..])))
}

/// `literal ::= INTEGER | DECIMAL | DOUBLE`, stored by its bare lexical.
fn numeric_literal<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    let (rest, lex) = alt((
        terminal(&DOUBLE),
        terminal(&DECIMAL),
        terminal(&INTEGER),
    ))(i)?;
    Ok((rest, ctx.borrow().session.literal(lex)))
}

/// `boolean_literal ::= 'true' | 'false'`, only at a name boundary.
fn boolean_literal<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    for keyword in &["true", "false"] {
        if let Some(rest) = i.strip_prefix(keyword) {
            let boundary = match rest.chars().next() {
                None => true,
                Some(c) => !(c.is_alphanumeric() || c == '_' || c == ':' || c == '-'),
            };
            if boundary {
                return Ok((rest, ctx.borrow().session.literal(keyword)));
            }
        }
    }
    Err(soft(i))
}

/// `rdf_literal ::= String (LANGTAG | '^^' iri)?`, normalized to a
/// double-quoted escaped lexical with a full datatype IRI.
fn string_literal<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    let (rest, raw) = lexical_value(i)?;
    let text = unescape(raw);
    if let Some(after) = rest.strip_prefix("^^") {
        let (after, datatype) = if after.starts_with('<') {
            iriref_text(after, ctx)?
        } else {
            prefixed_name(after, ctx)?
        };
        let lex = if datatype == xsd::string {
            format!("\"{}\"", escape(&text))
        } else {
            format!("\"{}\"^^<{}>", escape(&text), datatype)
        };
        return Ok((after, ctx.borrow().session.literal(&lex)));
    }
    if let Ok((after, lang)) = terminal(&LANGTAG)(rest) {
        let lex = format!("\"{}\"{}", escape(&text), lang);
        return Ok((after, ctx.borrow().session.literal(&lex)));
    }
    Ok((rest, ctx.borrow().session.literal(&format!("\"{}\"", escape(&text)))))
}

/// `String ::=` any of the four Turtle quote forms; returns the raw body.
fn lexical_value(i: &str) -> IResult<&str, &str> {
    if i.starts_with("\"\"\"") {
        let (rest, s) = terminal(&STRING_LITERAL_LONG_QUOTE)(i)?;
        return Ok((rest, unwrap_str(s, 3)));
    }
    if i.starts_with("'''") {
        let (rest, s) = terminal(&STRING_LITERAL_LONG_SINGLE_QUOTE)(i)?;
        return Ok((rest, unwrap_str(s, 3)));
    }
    if i.starts_with('"') {
        let (rest, s) = terminal(&STRING_LITERAL_QUOTE)(i)?;
        return Ok((rest, unwrap_str(s, 1)));
    }
    let (rest, s) = terminal(&STRING_LITERAL_SINGLE_QUOTE)(i)?;
    Ok((rest, unwrap_str(s, 1)))
}

/// `collection ::= '(' expression* ')'`, built as a native list term.
fn collection<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    let (rest, _) = tag("(")(i)?;
    let (mut rest, _) = multispace0(rest)?;
    let mut elements = Vec::new();
    while !rest.starts_with(')') {
        let (r, element) = expression(rest, ctx)?;
        let (r, _) = multispace0(r)?;
        elements.push(element);
        rest = r;
    }
    let (rest, _) = tag(")")(rest)?;
    Ok((rest, Term::List(elements)))
}

/// `formula ::= '{' (simple_statement ('.' simple_statement?)*)? '}'`
///
/// The closing `.` of the last inner statement is optional. Triples of
/// the interior land in their own frame and become the formula term.
fn formula<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    let (rest, _) = tag("{")(i)?;
    ctx.borrow_mut().begin_formula();
    let result = formula_body(rest, ctx);
    let triples = ctx.borrow_mut().end_formula();
    let (rest, _) = result?;
    Ok((rest, Term::Formula(triples)))
}

fn formula_body<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, ()> {
    let (mut rest, _) = multispace0(i)?;
    loop {
        if rest.starts_with('}') {
            break;
        }
        let (r, _) = simple_statement(rest, ctx)?;
        let (r, _) = multispace0(r)?;
        rest = r;
        if rest.starts_with('.') {
            let (r, _) = tag(".")(rest)?;
            let (r, _) = multispace0(r)?;
            rest = r;
        } else {
            break;
        }
    }
    let (rest, _) = tag("}")(rest)?;
    Ok((rest, ()))
}

/// `bnode_property_list ::= '[' property_list? ']'`; a fresh anonymous
/// blank node, with the interior triples pushed to the open frame.
fn bnode_property_list<'a>(i: &'a str, ctx: &RefContext<'_>) -> IResult<&'a str, Term> {
    if let Ok((rest, _)) = terminal(&ANON)(i) {
        return Ok((rest, ctx.borrow_mut().new_anon_bnode()));
    }
    let (rest, _) = tag("[")(i)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, pairs) = property_list(rest, ctx)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = tag("]")(rest)?;
    let mut borrowed = ctx.borrow_mut();
    let bn = borrowed.new_anon_bnode();
    for (p, o) in pairs {
        borrowed.push_triple(Triple::new(bn.clone(), p, o));
    }
    Ok((rest, bn))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::Document;
    use crate::session::Session;

    fn parse(text: &str, session: &Session) -> Document {
        Document::parse(text, session).unwrap()
    }

    #[test]
    fn parse_facts() {
        let session = Session::default();
        let doc = parse(
            r#"   # initial comment
            @prefix : <http://example.org/> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

            :alice :knows :bob ;
                   :age 42 .
            :bob :label "bob"@en .
            :carol :height "1.7"^^xsd:decimal .
            "#,
            &session,
        );
        assert_eq!(doc.triples.len(), 4);
        assert_eq!(doc.triples[0].s, session.iri("http://example.org/alice"));
        assert_eq!(doc.triples[1].o, session.literal("42"));
        assert_eq!(doc.triples[2].o, session.literal("\"bob\"@en"));
        assert_eq!(
            doc.triples[3].o,
            session.literal("\"1.7\"^^<http://www.w3.org/2001/XMLSchema#decimal>")
        );
    }

    #[test]
    fn parse_rules_and_lists() {
        let session = Session::default();
        let doc = parse(
            r#"
            @prefix : <http://example.org/> .
            @prefix math: <http://www.w3.org/2000/10/swap/math#> .

            :config :iterations "10" .

            {
                ?id :input ?x .
                (?x "0.6") math:product ?y .
            } => {
                ?id :seed ?y .
            } .

            { ?x :ancestor ?z } <= { ?x :parent ?z } .
            "#,
            &session,
        );
        assert_eq!(doc.triples.len(), 1);
        assert_eq!(doc.forward.len(), 1);
        assert_eq!(doc.backward.len(), 1);
        let rule = &doc.forward[0];
        assert_eq!(rule.premise.len(), 2);
        assert!(matches!(rule.premise[1].s, Term::List(_)));
        assert_eq!(doc.backward[0].conclusion.len(), 1);
    }

    #[test]
    fn parse_bnode_property_lists() {
        let session = Session::default();
        let doc = parse(
            r#"
            @prefix : <http://e/> .
            :obs :result [ :unit :meter ; :value 15 ] .
            "#,
            &session,
        );
        // the bracketed node contributes two triples plus the outer one
        assert_eq!(doc.triples.len(), 3);
        assert!(doc.triples.iter().any(|t| matches!(&t.s, Term::Blank(_))));
    }

    #[test]
    fn parse_nested_formulas() {
        let session = Session::default();
        let doc = parse(
            r#"
            @prefix : <http://e/> .
            @prefix log: <http://www.w3.org/2000/10/swap/log#> .
            :claim :says { :a :p { :b :q :c } } .
            "#,
            &session,
        );
        assert_eq!(doc.triples.len(), 1);
        match &doc.triples[0].o {
            Term::Formula(ts) => {
                assert_eq!(ts.len(), 1);
                assert!(matches!(ts[0].o, Term::Formula(_)));
            }
            other => panic!("expected formula, got {:?}", other),
        }
    }

    #[test]
    fn keyword_a_does_not_eat_names() {
        let session = Session::default();
        let doc = parse(
            r#"
            @prefix : <http://e/> .
            @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
            :alice a :Person .
            "#,
            &session,
        );
        assert_eq!(
            doc.triples[0].p,
            session.iri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")
        );
    }

    #[test]
    fn empty_collection_is_the_empty_list() {
        let session = Session::default();
        let doc = parse(
            r#"
            @prefix : <http://e/> .
            :x :value () .
            "#,
            &session,
        );
        assert_eq!(doc.triples[0].o, Term::List(vec![]));
    }

    #[test]
    fn fuse_statement_lifts_to_a_fuse_rule() {
        let session = Session::default();
        let doc = parse(
            r#"
            @prefix : <http://e/> .
            { :a :broken true } => false .
            "#,
            &session,
        );
        assert_eq!(doc.forward.len(), 1);
        assert!(doc.forward[0].fuse);
    }
}
