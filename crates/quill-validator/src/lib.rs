//! Rule-driven markup validation for Quill.
//!
//! Rules are tag specs: for each element name, which attributes it takes,
//! where it may appear, what its text may contain and which extensions it
//! needs. A [`SpecRepository`] loads and indexes a rule set; a [`Validator`]
//! walks a [`Document`](quill_markup::Document) and reports every violation
//! as a [`ValidationFinding`].
//!
//! ```
//! use quill_markup::Document;
//! use quill_validator::{FindingCode, ValidationOptions, Validator};
//!
//! let doc = Document::from_fragment("<blink>hi</blink>").unwrap();
//! let validator = Validator::builtin(ValidationOptions::default()).unwrap();
//! let report = validator.validate(&doc);
//! assert_eq!(report.findings[0].code, FindingCode::DisallowedTag);
//! ```

mod engine;
mod error;
mod finding;
pub mod model;
mod options;
mod repository;

pub use engine::{Validator, element_path};
pub use error::RepositoryError;
pub use finding::{FindingCode, Severity, ValidationFinding, ValidationReport};
pub use model::{Format, Layout, RuleSet, TagSpec};
pub use options::{DEFAULT_MAX_DOCUMENT_CSS_BYTES, ValidationOptions};
pub use repository::{CompiledSpec, SpecId, SpecRepository};
