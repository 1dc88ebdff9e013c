//! Typed intermediate representation for rill documents.
//!
//! This crate turns the parse tree of `rill-parse` into a JSON-compatible
//! value: scalars are coerced to typed values, mappings with an `id` entry
//! populate an identifier registry, and explicit references are resolved by
//! inlining a deep copy of the registered value. The result is always
//! tree-shaped data that can be handed to JSON consumers as-is.

mod builder;
mod coerce;
mod value;

pub use builder::{IrBuild, IrBuilder, IrDiagnostic};
pub use coerce::coerce_scalar;
pub use value::{Object, Value};

use rill_parse::{NodeArena, NodeId};

/// Build the IR for a (possibly partial) tree.
///
/// `root` may be `None` for an empty document, which yields `{}`.
pub fn build(arena: &NodeArena, root: Option<NodeId>) -> IrBuild {
    IrBuilder::build(arena, root)
}
