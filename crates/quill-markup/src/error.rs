//! Error types for document parsing.

use thiserror::Error;

/// The HTML parser could not produce a document to work on.
///
/// Transcoding anomalies are never reported here: a tag that cannot be
/// rewritten is passed to the parser as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input was empty or contained only whitespace.
    #[error("cannot parse an empty document")]
    EmptyInput,

    /// Tree construction finished without an `html` element.
    #[error("parsed tree has no document element")]
    NoDocumentElement,
}
