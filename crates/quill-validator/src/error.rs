//! Error types for loading rule sets

use thiserror::Error;

/// Failure to build a [`SpecRepository`](crate::SpecRepository).
///
/// Validation itself never fails; only loading a rule set does.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The rule file is not valid JSON or does not match the schema
    #[error("rule set is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A tag spec names an attribute list that does not exist
    #[error("spec '{spec}' references unknown attribute list '{list}'")]
    UnknownAttrList {
        /// Name of the referencing spec
        spec: String,
        /// The missing list
        list: String,
    },

    /// A content pattern does not compile
    #[error("spec '{spec}' has an invalid pattern '{pattern}': {source}")]
    InvalidRegex {
        /// Name of the spec carrying the pattern
        spec: String,
        /// The pattern as written
        pattern: String,
        /// Why it failed to compile
        #[source]
        source: regex::Error,
    },

    /// Two tag specs share a spec name
    #[error("duplicate spec name '{0}'")]
    DuplicateSpecName(String),
}
