//! markedit Parser
//!
//! Builds a document tree from the token stream produced by
//! `markedit-lexer`, and checks the same token stream for well-formedness.
//! The two are independent: validation never needs a tree, and the tree
//! builder fails fast on the first token it cannot place.
//!
//! ```text
//! text → Scanner::tokenize → tokens ─┬→ Parser    → Tree
//!                                    └→ Validator → Vec<ValidationError>
//! ```

pub mod parser;
pub mod store;
pub mod tree;
pub mod validator;

pub use parser::Parser;
pub use store::ChainedMap;
pub use tree::{collapse_whitespace, Attributes, Node, NodeId, Tree};
pub use validator::{CheckMode, Validator};

/// Tree builder error. Carries the byte offset of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error at offset {offset}: expected {expected}, found {found}")]
    UnexpectedToken {
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("Parse error at offset {offset}: element <{tag}> is never closed")]
    UnterminatedElement { offset: usize, tag: String },

    #[error("Parse error: document contains no element")]
    EmptyDocument,
}

impl ParseError {
    pub fn unexpected_token(
        offset: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedToken { offset, .. } | Self::UnterminatedElement { offset, .. } => {
                Some(*offset)
            }
            Self::EmptyDocument => None,
        }
    }
}

/// Error from editing a [`Tree`] directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("self-closing element <{tag}> cannot hold text or children")]
    SelfClosingContent { tag: String },

    #[error("no node with index {0} in this tree")]
    UnknownNode(usize),
}

/// One well-formedness problem found by the [`Validator`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("offset {offset}: {kind}")]
pub struct ValidationError {
    pub offset: usize,
    pub kind: ValidationKind,
}

impl ValidationError {
    pub fn new(offset: usize, kind: ValidationKind) -> Self {
        Self { offset, kind }
    }

    /// Human-readable description without the offset.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationKind {
    #[error("closing tag </{found}> does not match, expected </{expected}>")]
    MismatchedClose { expected: String, found: String },

    #[error("closing tag </{found}> without matching opening tag")]
    UnmatchedClose { found: String },

    #[error("repeated attribute '{name}'")]
    RepeatedAttribute { name: String },

    #[error("expected '=' after attribute '{name}'")]
    MissingEquals { name: String },

    #[error("expected a value for attribute '{name}'")]
    MissingValue { name: String },

    #[error("unexpected '{found}'")]
    UnexpectedMark { found: String },

    #[error("incomplete tags: {}", .tags.join(", "))]
    IncompleteTags { tags: Vec<String> },

    #[error("document contains no element")]
    EmptyDocument,
}
