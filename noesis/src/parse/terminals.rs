//! Parsers for the terminals of the N3 grammar.
//!
//! Escapes are recognized but not resolved here; resolution happens when
//! the production layer builds terms.
//!
//! Most terminals are regular expressions taken from the
//! [Turtle spec](https://www.w3.org/TR/turtle/#sec-grammar); variables
//! use SPARQL's `VAR1` shape. The few terminals too awkward for one
//! expression are `nom` parser functions.

use crate::parse::util::terminal;
use lazy_static::lazy_static;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::{opt, recognize};
use nom::multi::many0;
use nom::sequence::tuple;
use nom::IResult;
use regex::Regex;

lazy_static! {
    /// Production of IRIREF according to the Turtle spec.
    pub static ref IRIREF: Regex = Regex::new(r#"^<([^\u{00}-\u{20}<>"\{\}\|\^`\\]|(\\u[[:xdigit:]]{4})|(\\U[[:xdigit:]]{8}))*>"#).unwrap();

    /// Production of PN_CHARS_U according to the Turtle spec.
    pub static ref PN_CHARS_U: Regex = Regex::new(r#"^[_A-Za-z\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{02FF}\u{0370}-\u{037D}\u{037F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{00010000}-\U{000EFFFF}]"#).unwrap();

    /// Production of PN_CHARS according to the Turtle spec.
    pub static ref PN_CHARS: Regex = Regex::new(r#"^[-0-9_A-Za-z\u{00B7}\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{02FF}\u{0300}-\u{037D}\u{037F}-\u{1FFF}\u{200C}-\u{200D}\u{203F}-\u{2040}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{00010000}-\U{000EFFFF}]"#).unwrap();

    /// Production of PNAME_NS according to the Turtle spec.
    pub static ref PNAME_NS: Regex = Regex::new(r#"^([A-Za-z\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{02FF}\u{0370}-\u{037D}\u{037F}-\u{1FFF}\u{200C}-\u{200D}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{00010000}-\U{000EFFFF}]([-\.0-9_A-Za-z\u{00B7}\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{02FF}\u{0300}-\u{037D}\u{037F}-\u{1FFF}\u{200C}-\u{200D}\u{203F}-\u{2040}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{00010000}-\U{000EFFFF}]*[-0-9_A-Za-z\u{00B7}\u{00C0}-\u{00D6}\u{00D8}-\u{00F6}\u{00F8}-\u{02FF}\u{0300}-\u{037D}\u{037F}-\u{1FFF}\u{200C}-\u{200D}\u{203F}-\u{2040}\u{2070}-\u{218F}\u{2C00}-\u{2FEF}\u{3001}-\u{D7FF}\u{F900}-\u{FDCF}\u{FDF0}-\u{FFFD}\U{00010000}-\U{000EFFFF}])?)?:"#).unwrap();

    /// Production of LANGTAG according to the Turtle spec.
    pub static ref LANGTAG: Regex = Regex::new(r#"^@[[:alpha:]]+(-[[:alnum:]]+)*"#).unwrap();
    /// Production of INTEGER according to the Turtle spec.
    pub static ref INTEGER: Regex = Regex::new(r#"^[+-]?[[:digit:]]+"#).unwrap();
    /// Production of DECIMAL according to the Turtle spec.
    pub static ref DECIMAL: Regex = Regex::new(r#"^[+-]?[[:digit:]]*\.[[:digit:]]+"#).unwrap();
    /// Production of DOUBLE according to the Turtle spec.
    pub static ref DOUBLE: Regex = Regex::new(r#"^[+-]?(([[:digit:]]+\.[[:digit:]]*[eE][+-]?[[:digit:]]+)|(\.[[:digit:]]+[eE][+-]?[[:digit:]]+)|([[:digit:]]+[eE][+-]?[[:digit:]]+))"#).unwrap();
    /// Production of STRING_LITERAL_QUOTE according to the Turtle spec.
    pub static ref STRING_LITERAL_QUOTE: Regex = Regex::new(r#"^"([^\u{22}\u{5C}\u{A}\u{D}]|(\\[tbnrf"'\\])|(\\u[[:xdigit:]]{4})|(\\U[[:xdigit:]]{8}))*""#).unwrap();
    /// Production of STRING_LITERAL_SINGLE_QUOTE according to the Turtle spec.
    pub static ref STRING_LITERAL_SINGLE_QUOTE: Regex = Regex::new(r#"^'([^\u{27}\u{5C}\u{A}\u{D}]|(\\[tbnrf"'\\])|(\\u[[:xdigit:]]{4})|(\\U[[:xdigit:]]{8}))*'"#).unwrap();
    /// Production of STRING_LITERAL_LONG_QUOTE according to the Turtle spec.
    pub static ref STRING_LITERAL_LONG_QUOTE: Regex = Regex::new(r#"^"""((("|"")?([^"\\]|(\\[tbnrf"'\\])|(\\u[[:xdigit:]]{4})|(\\U[[:xdigit:]]{8}))))*""""#).unwrap();
    /// Production of STRING_LITERAL_LONG_SINGLE_QUOTE according to the Turtle spec.
    pub static ref STRING_LITERAL_LONG_SINGLE_QUOTE: Regex = Regex::new(r#"^'''((('|'')?([^'\\]|(\\[tbnrf"'\\])|(\\u[[:xdigit:]]{4})|(\\U[[:xdigit:]]{8}))))*'''"#).unwrap();
    /// Production of WS according to the Turtle spec, extended with
    /// comments; a comment may be closed by the end of input.
    pub static ref WS_MANY1: Regex = Regex::new(r#"^([ \t\n\r]|(#[^\n]*(\n|$)))+"#).unwrap();
    /// Like [`struct@WS_MANY1`] but possibly empty.
    pub static ref WS_MANY0: Regex = Regex::new(r#"^([ \t\n\r]|(#[^\n]*(\n|$)))*"#).unwrap();
    /// Production of ANON according to the Turtle spec.
    pub static ref ANON: Regex = Regex::new(r#"^\[[ \t\n\r]*\]"#).unwrap();
    /// Production of PLX according to the Turtle spec.
    pub static ref PLX: Regex = Regex::new(r#"^(%[[:xdigit:]]{2})|(\\[-_~\.!\$&'#\(\)\*\+,;=/\?@%])"#).unwrap();
    /// SPARQL's VAR1 restricted to ASCII names, as N3 tools produce.
    pub static ref VAR1: Regex = Regex::new(r#"^\?[A-Za-z_][A-Za-z0-9_]*"#).unwrap();

    static ref DIGIT: Regex = Regex::new(r#"^[[:digit:]]"#).unwrap();
}

/// Parses Turtle's rule
/// [140s] PNAME_LN ::= PNAME_NS PN_LOCAL
pub fn pname_ln(i: &str) -> IResult<&str, &str> {
    recognize(tuple((terminal(&PNAME_NS), pn_local)))(i)
}

/// Parses Turtle's rule
/// [141s] BLANK_NODE_LABEL ::= '_:' (PN_CHARS_U | [[:digit:]]) ((PN_CHARS | '.')* PN_CHARS)?
pub fn blank_node_label(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag("_:"),
        alt((terminal(&PN_CHARS_U), terminal(&DIGIT))),
        many0(alt((terminal(&PN_CHARS), tag(".")))),
        opt(terminal(&PN_CHARS)),
    )))(i)
}

/// Parses Turtle's rule
/// [168s] PN_LOCAL ::= (PN_CHARS_U | ':' | [[:digit:]] | PLX) ((PN_CHARS | '.' | ':' | PLX)* (PN_CHARS | ':' | PLX))?
pub fn pn_local(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        alt((
            terminal(&PN_CHARS_U),
            tag(":"),
            terminal(&DIGIT),
            terminal(&PLX),
        )),
        many0(alt((
            terminal(&PN_CHARS),
            tag("."),
            tag(":"),
            terminal(&PLX),
        ))),
        opt(alt((terminal(&PN_CHARS), tag(":"), terminal(&PLX)))),
    )))(i)
}

/// Parses at least one whitespace (including comments).
pub fn multispace1(i: &str) -> IResult<&str, &str> {
    terminal(&WS_MANY1)(i)
}

/// Parses zero or more whitespaces (including comments).
pub fn multispace0(i: &str) -> IResult<&str, &str> {
    terminal(&WS_MANY0)(i)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("<>" => true ; "empty iri")]
    #[test_case("<http://www.w3.org/2000/10/swap/log#>" => true ; "absolute iri")]
    #[test_case("<../ns/vocab#>" => true ; "relative iri")]
    #[test_case("<\\u0ace>" => true ; "numeric escape")]
    #[test_case("<  >" => false ; "space")]
    #[test_case("<{>" => false ; "open curly")]
    fn check_iriref(to_check: &str) -> bool {
        IRIREF.is_match(to_check)
    }

    #[test_case("?x" => true ; "short")]
    #[test_case("?next_i" => true ; "underscored")]
    #[test_case("?1x" => false ; "leading digit")]
    #[test_case("x" => false ; "missing question mark")]
    fn check_var1(to_check: &str) -> bool {
        VAR1.is_match(to_check)
    }

    #[test_case("math:" => true ; "namespace only")]
    #[test_case(":" => true ; "empty prefix")]
    #[test_case("0a:" => false ; "leading digit")]
    fn check_pname_ns(to_check: &str) -> bool {
        PNAME_NS.is_match(to_check)
    }

    #[test_case("_:example  rest" => Ok(("  rest", "_:example")) ; "start alpha")]
    #[test_case("_:0  rest" => Ok(("  rest", "_:0")) ; "start num")]
    fn check_blank_node_label(i: &str) -> IResult<&str, &str> {
        blank_node_label(i)
    }

    #[test_case("# trailing comment" => true ; "comment closed by eof")]
    #[test_case("\n# line\n\t" => true ; "embedded comment")]
    #[test_case("text" => false ; "no whitespace")]
    fn check_ws_many1(to_check: &str) -> bool {
        WS_MANY1.is_match(to_check)
    }

    #[test_case("123" => true ; "integer")]
    #[test_case("-123.45" => false ; "decimal is not integer-only")]
    fn check_integer_full(to_check: &str) -> bool {
        INTEGER
            .find(to_check)
            .map(|m| m.end() == to_check.len())
            .unwrap_or(false)
    }
}
