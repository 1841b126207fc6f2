//! Tree-sitter transform engine for visual-test migration.
//!
//! This crate rewrites Percy, Applitools and Sauce Labs visual-test code into
//! LambdaTest SmartUI code for JavaScript, TypeScript, Python and Java:
//!
//! - Snapshot calls are renamed, or rebuilt when their options need
//!   restructuring
//! - Module references are pointed at the SmartUI driver packages
//! - Session lifecycle statements (`eyes.open`, `new Eyes()`, ...) are removed
//! - Layout regions are emulated with a visibility assertion plus ignored
//!   descendants
//!
//! # Overview
//!
//! The main entry point is [`Transformer`]. Every rewrite is driven by the
//! mapping tables in [`sm_core::mapping`]; matching happens on syntax nodes,
//! so text inside comments and string literals is never touched.
//!
//! ```
//! use sm_core::{Framework, Platform};
//! use sm_syntax::{SourceLanguage, Transformer};
//!
//! let source = "\
//! from percy import percy_snapshot
//! percy_snapshot(driver, 'Home')
//! ";
//! let mut transformer = Transformer::new();
//! let out = transformer.transform(
//!     SourceLanguage::Python,
//!     source,
//!     Platform::Percy,
//!     Framework::Selenium,
//! );
//! assert_eq!(
//!     out.content,
//!     "from lambdatest_selenium_driver import smartui_snapshot\nsmartui_snapshot(driver, 'Home')\n"
//! );
//! assert!(out.warnings.is_empty());
//! ```
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Parse | [`SyntaxParser`] | tree-sitter tree |
//! | Collect | `lower` | [`ir::CallSite`] and [`ir::ImportSite`] lists |
//! | Plan | `engine`, `snapshot` | edits, changes and warnings per site |
//! | Apply | `edit` | new text, untouched bytes copied verbatim |
//!
//! Transformation is idempotent: running it on its own output makes no
//! changes and emits no warnings.
//!
//! # Thread Safety
//!
//! [`Transformer`] owns tree-sitter parsers and is `Send` but not `Sync`.
//! Create one per worker thread; compiled queries are shared globally.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod edit;
mod engine;
pub mod error;
pub mod ir;
pub mod language;
mod lower;
mod parser;
pub mod printer;
pub mod queries;
pub mod selector;
mod snapshot;

pub use engine::{TransformOutput, Transformer, transform};
pub use error::ParseError;
pub use language::{Family, SourceLanguage};
pub use parser::SyntaxParser;
