//! HTML parser module for tree construction.

/// Tree builder implementation.
mod tree_builder;

pub use tree_builder::{HTMLParser, InsertionMode, ParseIssue};
