//! markedit Format
//!
//! Turns a document tree back into text: either markup again, pretty-printed
//! or minified, or a nested-object (JSON) rendering of the same structure.
//!
//! ```text
//! Tree ─┬→ markup::dump      → markup text
//!       └→ object::to_object → JSON text
//! ```
//!
//! Both walks are iterative, so arbitrarily deep trees are safe to dump.

pub mod markup;
pub mod object;

pub use markup::dump;
pub use object::to_object;

/// Error from rendering a tree.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Format error: {0}")]
    Json(#[from] serde_json::Error),
}
