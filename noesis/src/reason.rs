//! The reasoning engine.
//!
//! [`prove`] is the backward-chaining goal prover, [`engine`] the
//! forward-chaining fixpoint with scoped-closure levels, [`explain`] the
//! derivation records.

pub mod engine;
pub mod explain;
pub mod prove;

pub(crate) use self::engine::formula_closure;
pub use self::engine::{Reasoner, Snapshot};
pub use self::explain::Derivation;
pub use self::prove::Prover;
