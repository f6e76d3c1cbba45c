//! markedit Lexer
//!
//! Tokenizes markup text into a flat stream of structural marks, whitespace
//! runs, quoted literals and words. Whitespace is kept so downstream
//! consumers can decide what to skip.
//!
//! # Example
//!
//! ```
//! use markedit_lexer::{Mark, Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("<a/>");
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[2].kind, TokenKind::Mark(Mark::SelfClose));
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Mark, Position, Token, TokenKind};
