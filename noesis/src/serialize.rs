//! Serialization of terms and triples back to N3 text.

use crate::parse::Prolog;
use crate::term::{Term, Triple};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Local names safe to print in prefixed form without escaping.
    static ref SAFE_LOCAL: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-]*$").unwrap();
    /// Splits a typed literal lexical into value part and datatype IRI.
    static ref TYPED_LITERAL: Regex = Regex::new(r#"(?s)^(".*")\^\^<([^>]*)>$"#).unwrap();
}

/// Writes terms in N3 syntax, shrinking IRIs against a prolog.
pub struct Serializer<'a> {
    prolog: Option<&'a Prolog>,
}

impl<'a> Serializer<'a> {
    /// A serializer shrinking against the given prolog.
    pub fn new(prolog: &'a Prolog) -> Self {
        Serializer {
            prolog: Some(prolog),
        }
    }

    /// A serializer that always writes full IRIs.
    pub fn plain() -> Self {
        Serializer { prolog: None }
    }

    /// The N3 text of a term.
    pub fn term(&self, term: &Term) -> String {
        let mut out = String::new();
        self.write_term(term, &mut out);
        out
    }

    /// The N3 text of a triple, terminated with ` .`.
    pub fn triple(&self, triple: &Triple) -> String {
        let mut out = String::new();
        self.write_triple(triple, &mut out);
        out.push_str(" .");
        out
    }

    /// Writes the `@prefix` and `@base` preamble.
    pub fn write_preamble(&self, out: &mut String) {
        if let Some(prolog) = self.prolog {
            let mut prefixes: Vec<(&str, &str)> = prolog.prefixes().collect();
            prefixes.sort();
            for (p, namespace) in prefixes {
                out.push_str(&format!("@prefix {}: <{}> .\n", p, namespace));
            }
            if let Some(base) = prolog.base() {
                out.push_str(&format!("@base <{}> .\n", base));
            }
            if !out.is_empty() {
                out.push('\n');
            }
        }
    }

    fn write_triple(&self, triple: &Triple, out: &mut String) {
        self.write_term(&triple.s, out);
        out.push(' ');
        self.write_term(&triple.p, out);
        out.push(' ');
        self.write_term(&triple.o, out);
    }

    fn write_term(&self, term: &Term, out: &mut String) {
        match term {
            Term::Iri(iri) => match self.shrink(iri) {
                Some(short) => out.push_str(&short),
                None => {
                    out.push('<');
                    out.push_str(iri);
                    out.push('>');
                }
            },
            Term::Literal(lex) => self.write_literal(lex, out),
            Term::Var(name) => {
                out.push('?');
                out.push_str(name);
            }
            Term::Blank(label) => {
                out.push_str("_:");
                out.push_str(label);
            }
            Term::List(elements) => {
                out.push('(');
                for element in elements {
                    out.push(' ');
                    self.write_term(element, out);
                }
                out.push_str(" )");
            }
            Term::OpenList(elements, tail) => {
                out.push('(');
                for element in elements {
                    out.push(' ');
                    self.write_term(element, out);
                }
                out.push_str(&format!(" ?{} )", tail));
            }
            Term::Formula(triples) => {
                out.push('{');
                for (index, t) in triples.iter().enumerate() {
                    if index > 0 {
                        out.push_str(" .");
                    }
                    out.push(' ');
                    self.write_triple(t, out);
                }
                out.push_str(" }");
            }
        }
    }

    fn write_literal(&self, lex: &str, out: &mut String) {
        if let Some(caps) = TYPED_LITERAL.captures(lex) {
            let value = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let datatype = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            out.push_str(value);
            out.push_str("^^");
            match self.shrink(datatype) {
                Some(short) => out.push_str(&short),
                None => {
                    out.push('<');
                    out.push_str(datatype);
                    out.push('>');
                }
            }
        } else {
            out.push_str(lex);
        }
    }

    fn shrink(&self, iri: &str) -> Option<String> {
        let prolog = self.prolog?;
        let mut best: Option<(usize, String)> = None;
        for (prefix, namespace) in prolog.prefixes() {
            if let Some(local) = iri.strip_prefix(namespace) {
                if (local.is_empty() || SAFE_LOCAL.is_match(local))
                    && best
                        .as_ref()
                        .map_or(true, |(len, _)| namespace.len() > *len)
                {
                    best = Some((namespace.len(), format!("{}:{}", prefix, local)));
                }
            }
        }
        best.map(|(_, short)| short)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::Session;

    fn prolog() -> Prolog {
        let mut prolog = Prolog::new();
        prolog.add_prefix("ex", "http://example.org/").unwrap();
        prolog
            .add_prefix("xsd", "http://www.w3.org/2001/XMLSchema#")
            .unwrap();
        prolog
    }

    #[test]
    fn shrinks_known_namespaces() {
        let session = Session::default();
        let prolog = prolog();
        let writer = Serializer::new(&prolog);
        assert_eq!(writer.term(&session.iri("http://example.org/a")), "ex:a");
        assert_eq!(
            writer.term(&session.iri("http://other.org/a")),
            "<http://other.org/a>"
        );
    }

    #[test]
    fn typed_literals_shrink_their_datatype() {
        let session = Session::default();
        let prolog = prolog();
        let writer = Serializer::new(&prolog);
        let term = session.literal("\"1.7\"^^<http://www.w3.org/2001/XMLSchema#decimal>");
        assert_eq!(writer.term(&term), "\"1.7\"^^xsd:decimal");
    }

    #[test]
    fn lists_and_formulas_roundtrip_syntax() {
        let session = Session::default();
        let prolog = prolog();
        let writer = Serializer::new(&prolog);
        let list = Term::List(vec![session.literal("1"), session.literal("2")]);
        assert_eq!(writer.term(&list), "( 1 2 )");
        let formula = Term::Formula(vec![
            Triple::new(
                session.iri("http://example.org/a"),
                session.iri("http://example.org/p"),
                session.literal("1"),
            ),
            Triple::new(
                session.iri("http://example.org/b"),
                session.iri("http://example.org/q"),
                session.literal("2"),
            ),
        ]);
        assert_eq!(writer.term(&formula), "{ ex:a ex:p 1 . ex:b ex:q 2 }");
    }

    #[test]
    fn preamble_lists_prefixes_sorted() {
        let prolog = prolog();
        let writer = Serializer::new(&prolog);
        let mut out = String::new();
        writer.write_preamble(&mut out);
        let first = out.lines().next().unwrap();
        assert!(first.starts_with("@prefix ex:"));
    }
}
