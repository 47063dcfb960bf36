#![deny(missing_docs)]

//! # Noesis
//!
//! A forward- and backward-chaining reasoner for a Horn subset of
//! Notation3: ground triples as facts, `{P} => {C}` forward rules,
//! `{H} <= {B}` backward rules, quoted formulas as first-class terms,
//! and the `math:`, `string:`, `list:`, `time:`, `crypto:` and `log:`
//! builtin vocabularies resolved during proof search.
//!
//! ```
//! use noesis::{Options, Reasoner};
//!
//! let mut reasoner = Reasoner::new(Options::default());
//! reasoner
//!     .load_str(
//!         "@prefix : <http://example.org/> .
//!          :alice :parent :bob .
//!          { ?x :parent ?y } => { ?x :ancestor ?y } .",
//!     )
//!     .unwrap();
//! reasoner.run().unwrap();
//! assert_eq!(reasoner.derived().len(), 1);
//! ```

pub mod builtins;
pub mod error;
pub mod fetch;
pub mod ns;
pub mod parse;
pub mod reason;
pub mod rule;
pub mod serialize;
pub mod session;
pub mod store;
pub mod term;
pub mod unify;

pub use self::error::{Error, Result};
pub use self::parse::{Document, Prolog};
pub use self::reason::{Derivation, Prover, Reasoner, Snapshot};
pub use self::rule::{Direction, Rule, RuleSet};
pub use self::serialize::Serializer;
pub use self::session::{Options, Session};
pub use self::store::FactStore;
pub use self::term::{Term, Triple};
pub use self::unify::Subst;
