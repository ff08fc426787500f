//! Common utilities for Quill.
//!
//! This crate provides shared vocabulary used by every Quill component:
//! - **Element tables** - void, raw text and global-attribute lists
//! - **URL classification** - scheme extraction for attribute value checks

pub mod elements;
pub mod url;
