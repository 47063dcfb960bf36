//! Structs and types to parse N3 documents.

mod util;
pub use self::util::*;

pub mod n3;
pub mod terminals;

use crate::error::{Error, Result};
use crate::ns;
use crate::rule::{rule_from_parts, Rule};
use crate::session::Session;
use crate::term::{Term, Triple};
use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::cell::RefCell;

lazy_static! {
    static ref SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap();
    static ref PREFIX_SHAPE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").unwrap();
}

/// The prolog of prefixes and base typical for Notation3 documents.
#[derive(Clone, Debug, Default)]
pub struct Prolog {
    base: Option<String>,
    prefixes: FxHashMap<String, String>,
}

impl Prolog {
    /// An empty prolog: neither base nor prefixes.
    pub fn new() -> Self {
        Prolog::default()
    }

    /// A prolog with the `rdf`, `xsd`, `log` and `math` namespaces bound
    /// to their usual prefixes.
    pub fn with_default_prefixes() -> Self {
        let mut prolog = Prolog::default();
        for (p, namespace) in &[
            ("rdf", ns::rdf::PREFIX),
            ("xsd", ns::xsd::PREFIX),
            ("log", ns::log::PREFIX),
            ("math", ns::math::PREFIX),
        ] {
            prolog.prefixes.insert((*p).to_string(), (*namespace).to_string());
        }
        prolog
    }

    /// Sets the base IRI used to resolve relative references.
    ///
    /// # Errors
    ///
    /// Fails if the base contains characters an IRI cannot.
    pub fn set_base(&mut self, base: impl Into<String>) -> Result<&mut Self> {
        let base = base.into();
        if base.chars().any(|c| c <= ' ' || "<>\"{}|^`".contains(c)) {
            return Err(Error::InvalidIri(base));
        }
        self.base = Some(base);
        Ok(self)
    }

    /// Reads the current base IRI.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Binds a prefix (without the trailing `:`) to a namespace.
    ///
    /// # Errors
    ///
    /// Checks that both prefix and namespace are plausible.
    pub fn add_prefix(&mut self, prefix: &str, namespace: &str) -> Result<&mut Self> {
        if !prefix.is_empty() && !PREFIX_SHAPE.is_match(prefix) {
            return Err(Error::InvalidPrefix(prefix.to_string()));
        }
        if namespace.chars().any(|c| c <= ' ' || "<>\"{}|^`".contains(c)) {
            return Err(Error::InvalidIri(namespace.to_string()));
        }
        self.prefixes
            .insert(prefix.to_string(), namespace.to_string());
        Ok(self)
    }

    /// Expands a prefixed name to a full IRI.
    ///
    /// # Errors
    ///
    /// Fails when the prefix was never declared.
    pub fn expand(&self, prefix: &str, local: &str) -> Result<String> {
        match self.prefixes.get(prefix) {
            Some(namespace) => Ok(format!("{}{}", namespace, local)),
            None => Err(Error::UnknownPrefix(prefix.to_string())),
        }
    }

    /// Iterates over the declared (prefix, namespace) pairs.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// Takes over the declarations of another prolog; its base wins only
    /// when none is set here.
    pub fn absorb(&mut self, other: &Prolog) {
        for (p, namespace) in other.prefixes() {
            self.prefixes.insert(p.to_string(), namespace.to_string());
        }
        if self.base.is_none() {
            self.base = other.base.clone();
        }
    }
}

/// The current context of the parser.
#[derive(Debug)]
pub struct Context<'s> {
    pub(crate) session: &'s Session,
    /// Prefixes and base.
    pub prolog: Prolog,
    /// Number of parsed anonymous blank nodes, used for naming them.
    bnode_cnt: usize,
    /// One triple sink per open formula; index 0 is the document level.
    frames: Vec<Vec<Triple>>,
}

impl<'s> Context<'s> {
    /// A fresh context writing into the given session.
    pub fn new(session: &'s Session) -> Self {
        Context {
            session,
            prolog: Prolog::default(),
            bnode_cnt: 0,
            frames: vec![Vec::new()],
        }
    }

    pub(crate) fn new_anon_bnode(&mut self) -> Term {
        let bn = Term::blank(format!("anon{}", self.bnode_cnt));
        self.bnode_cnt += 1;
        bn
    }

    pub(crate) fn push_triple(&mut self, triple: Triple) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(triple);
        }
    }

    pub(crate) fn begin_formula(&mut self) {
        self.frames.push(Vec::new());
    }

    pub(crate) fn end_formula(&mut self) -> Vec<Triple> {
        self.frames.pop().unwrap_or_default()
    }

    pub(crate) fn resolve(&self, iri: &str) -> String {
        if SCHEME.is_match(iri) {
            return iri.to_string();
        }
        match self.prolog.base() {
            Some(base) => resolve_iri(base, iri),
            None => iri.to_string(),
        }
    }
}

/// A parsed document: the four-tuple handed to the engine.
///
/// Top-level rule-as-data triples (`log:implies` / `log:impliedBy` with
/// formula-or-`true` sides, including the `=>` / `<=` spellings) are
/// lifted out of the triple list into the rule lists.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Prefixes and base of the document.
    pub prolog: Prolog,
    /// Top-level non-rule triples.
    pub triples: Vec<Triple>,
    /// Forward rules in document order.
    pub forward: Vec<Rule>,
    /// Backward rules in document order.
    pub backward: Vec<Rule>,
}

impl Document {
    /// Parses a complete document.
    pub fn parse(text: &str, session: &Session) -> Result<Document> {
        let ctx = RefCell::new(Context::new(session));
        Self::finish(text, ctx)
    }

    /// Parses a document with a pre-set base IRI for resolving relative
    /// references. A `@base` directive in the document overrides it.
    pub fn parse_with_base(text: &str, session: &Session, base: &str) -> Result<Document> {
        let mut context = Context::new(session);
        context.prolog.set_base(base)?;
        Self::finish(text, RefCell::new(context))
    }

    fn finish(text: &str, ctx: RefCell<Context<'_>>) -> Result<Document> {
        let rest = match n3::document(text, &ctx) {
            Ok((rest, _)) => rest,
            Err(e) => return Err(Error::Parser(describe_nom_error(&e))),
        };
        if !rest.is_empty() {
            return Err(Error::Parser(format!(
                "unexpected input near `{}`",
                snippet(rest)
            )));
        }
        let mut ctx = ctx.into_inner();
        let parsed = std::mem::take(&mut ctx.frames[0]);
        let mut doc = Document {
            prolog: ctx.prolog,
            ..Document::default()
        };
        for triple in parsed {
            if let Term::Iri(p) = &triple.p {
                if let Some(rule) = rule_from_parts(&triple.s, p, &triple.o) {
                    match rule.direction {
                        crate::rule::Direction::Forward => doc.forward.push(rule),
                        crate::rule::Direction::Backward => doc.backward.push(rule),
                    }
                    continue;
                }
            }
            doc.triples.push(triple);
        }
        Ok(doc)
    }
}

fn describe_nom_error(e: &nom::Err<(&str, nom::error::ErrorKind)>) -> String {
    match e {
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
        nom::Err::Error((i, kind)) | nom::Err::Failure((i, kind)) => {
            format!("{:?} near `{}`", kind, snippet(i))
        }
    }
}

fn snippet(i: &str) -> String {
    i.chars().take(40).collect()
}

/// Resolves a relative reference against a base IRI, with dot-segment
/// removal. Covers the shapes N3 documents use; exotic corner cases of
/// RFC 3986 are out of scope.
pub(crate) fn resolve_iri(base: &str, rel: &str) -> String {
    fn strip_fragment(iri: &str) -> &str {
        match iri.find('#') {
            Some(pos) => &iri[..pos],
            None => iri,
        }
    }
    if rel.is_empty() {
        return strip_fragment(base).to_string();
    }
    if rel.starts_with('#') {
        return format!("{}{}", strip_fragment(base), rel);
    }
    let scheme_end = match base.find(':') {
        Some(pos) => pos,
        None => return rel.to_string(),
    };
    let scheme = &base[..scheme_end];
    if rel.starts_with("//") {
        return format!("{}:{}", scheme, rel);
    }
    let after_scheme = &base[scheme_end + 1..];
    let authority = if let Some(rest) = after_scheme.strip_prefix("//") {
        let end = rest.find('/').unwrap_or_else(|| rest.len());
        &rest[..end]
    } else {
        ""
    };
    let root = if authority.is_empty() {
        format!("{}:", scheme)
    } else {
        format!("{}://{}", scheme, authority)
    };
    if let Some(absolute) = rel.strip_prefix('/') {
        return format!("{}/{}", root, remove_dot_segments(absolute));
    }
    let base_path_start = scheme_end + 1 + if authority.is_empty() { 0 } else { 2 + authority.len() };
    let base_path = strip_fragment(&base[base_path_start..]);
    let dir = match base_path.rfind('/') {
        Some(pos) => &base_path[..pos + 1],
        None => "/",
    };
    let merged = format!("{}{}", dir.trim_start_matches('/'), rel);
    format!("{}/{}", root, remove_dot_segments(&merged))
}

fn remove_dot_segments(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
