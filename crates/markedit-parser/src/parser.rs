//! Tree builder.
//!
//! Walks the token stream once with a small state machine and links each
//! element into the [`Tree`] as soon as its start tag is complete. An element
//! whose start tag is still being read lives inside the parser state, not in
//! the tree, so abandoning it (on error or end of input) leaves nothing
//! behind.
//!
//! Whitespace is skipped everywhere except inside element content, where the
//! text up to the next tag is captured verbatim and trimmed. Comments and
//! processing instructions are never turned into nodes.

use markedit_lexer::{Mark, Scanner, Token, TokenKind};
use tracing::{instrument, trace};

use crate::tree::{Node, NodeId, Tree};
use crate::ParseError;

/// An element whose start tag has begun but not yet ended.
#[derive(Debug)]
struct Pending {
    node: Node,
    offset: usize,
}

#[derive(Debug)]
enum State {
    /// Outside the root element.
    ExpectStructuralMark,
    ExpectTagName { offset: usize },
    ExpectAttributeOrTerminator(Pending),
    ExpectEquals(Pending, String),
    ExpectAttributeValue(Pending, String),
    /// Inside an open element: text, a child start tag, or the close tag.
    ExpectChildOrSiblingOrClose,
    ExpectCloseName,
    ExpectCloseTerminator,
}

#[derive(Debug, Clone, Copy)]
struct OpenElement {
    id: NodeId,
    offset: usize,
}

/// Markup tree builder.
///
/// Assumes the input is well-formed (see [`crate::Validator`]) but never
/// panics on input that is not: the first token that does not fit stops the
/// build with a [`ParseError`] and the partial tree is dropped.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    state: State,
    tree: Tree,
    open: Vec<OpenElement>,
    /// Text of the innermost open element, collected until its first child
    /// or its close tag.
    text: Option<String>,
}

impl<'t> Parser<'t> {
    /// Create a new parser for the given tokens.
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            state: State::ExpectStructuralMark,
            tree: Tree::new(),
            open: Vec::new(),
            text: None,
        }
    }

    /// Tokenize and parse source text.
    pub fn parse(source: &str) -> Result<Tree, ParseError> {
        let tokens = Scanner::tokenize(source);
        Self::parse_tokens(&tokens)
    }

    /// Parse an existing token stream.
    #[instrument(level = "debug", skip_all, fields(len = tokens.len()))]
    pub fn parse_tokens(tokens: &[Token]) -> Result<Tree, ParseError> {
        let tree = Parser::new(tokens).build()?;
        tracing::debug!(elements = tree.size(), "built tree");
        Ok(tree)
    }

    fn build(mut self) -> Result<Tree, ParseError> {
        while let Some(token) = self.tokens.get(self.pos) {
            self.pos += 1;
            self.step(token)?;
        }
        self.finish()
    }

    fn step(&mut self, token: &'t Token) -> Result<(), ParseError> {
        let state = std::mem::replace(&mut self.state, State::ExpectStructuralMark);

        if token.is_whitespace() && !self.in_content(&state) {
            self.state = state;
            return Ok(());
        }

        self.state = match state {
            State::ExpectStructuralMark | State::ExpectChildOrSiblingOrClose => {
                self.content(state, token)?
            }

            State::ExpectTagName { offset } => match token.kind {
                TokenKind::Word => State::ExpectAttributeOrTerminator(Pending {
                    node: Node::new(token.text.as_str()),
                    offset,
                }),
                _ => return Err(unexpected(token, "a tag name")),
            },

            State::ExpectAttributeOrTerminator(pending) => match token.kind {
                TokenKind::Mark(Mark::Close) => self.confirm(pending, false)?,
                TokenKind::Mark(Mark::SelfClose) => self.confirm(pending, true)?,
                TokenKind::Word => State::ExpectEquals(pending, token.text.clone()),
                _ => return Err(unexpected(token, "an attribute name, '>' or '/>'")),
            },

            State::ExpectEquals(pending, name) => match token.kind {
                TokenKind::Mark(Mark::Equals) => State::ExpectAttributeValue(pending, name),
                _ => return Err(unexpected(token, format!("'=' after attribute '{name}'"))),
            },

            State::ExpectAttributeValue(mut pending, name) => {
                if !token.is_value() {
                    return Err(unexpected(token, format!("a value for attribute '{name}'")));
                }
                // Duplicate names keep the first value.
                pending.node.add_attribute(name, token.unquoted());
                State::ExpectAttributeOrTerminator(pending)
            }

            State::ExpectCloseName => {
                if token.kind != TokenKind::Word {
                    return Err(unexpected(token, "a tag name"));
                }
                let Some(top) = self.open.last() else {
                    return Err(unexpected(token, "no closing tag outside the root element"));
                };
                let tag = &self.tree[top.id].tag;
                if *tag != token.text {
                    return Err(unexpected(token, format!("</{tag}>")));
                }
                State::ExpectCloseTerminator
            }

            State::ExpectCloseTerminator => match token.kind {
                TokenKind::Mark(Mark::Close) => {
                    if let Some(closed) = self.open.pop() {
                        trace!(tag = %self.tree[closed.id].tag, "closed element");
                    }
                    self.after_element()
                }
                _ => return Err(unexpected(token, "'>'")),
            },
        };
        Ok(())
    }

    /// Handle a token between tags.
    fn content(&mut self, state: State, token: &'t Token) -> Result<State, ParseError> {
        match token.kind {
            TokenKind::Mark(Mark::Open) => {
                self.flush_text();
                Ok(State::ExpectTagName {
                    offset: token.offset,
                })
            }
            TokenKind::Mark(Mark::OpenEnd) => {
                self.flush_text();
                Ok(State::ExpectCloseName)
            }
            TokenKind::Mark(m @ (Mark::CommentOpen | Mark::PiOpen)) => {
                let start = self.pos - 1;
                let end = self.find_closing(token, m)?;
                if let Some(text) = self.text.as_mut() {
                    for t in &self.tokens[start..=end] {
                        text.push_str(&t.text);
                    }
                }
                self.pos = end + 1;
                Ok(state)
            }
            TokenKind::Mark(Mark::Close | Mark::SelfClose | Mark::CommentClose | Mark::PiClose) => {
                Err(unexpected(token, "text or a tag"))
            }
            _ => {
                if let Some(text) = self.text.as_mut() {
                    text.push_str(&token.text);
                }
                Ok(state)
            }
        }
    }

    /// Link a finished start tag into the tree.
    fn confirm(&mut self, pending: Pending, self_closing: bool) -> Result<State, ParseError> {
        let Pending { mut node, offset } = pending;
        let parent = self.open.last().map(|o| o.id);

        if parent.is_none() && !self.tree.is_empty() {
            return Err(ParseError::unexpected_token(
                offset,
                "end of document",
                format!("<{}", node.tag),
            ));
        }

        node.self_closing = self_closing;
        trace!(tag = %node.tag, self_closing, "opened element");
        let id = self.tree.attach(parent, node);

        if self_closing {
            return Ok(self.after_element());
        }
        self.open.push(OpenElement { id, offset });
        self.text = Some(String::new());
        Ok(State::ExpectChildOrSiblingOrClose)
    }

    fn after_element(&self) -> State {
        if self.open.is_empty() {
            State::ExpectStructuralMark
        } else {
            State::ExpectChildOrSiblingOrClose
        }
    }

    /// Store collected text on the innermost open element and stop collecting.
    fn flush_text(&mut self) {
        let Some(text) = self.text.take() else {
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(top) = self.open.last() {
            if let Some(node) = self.tree.get_mut(top.id) {
                node.text = text.to_string();
            }
        }
    }

    /// Index of the mark closing the comment or instruction opened by `token`.
    fn find_closing(&self, token: &Token, open: Mark) -> Result<usize, ParseError> {
        let close = open.closing_pair().unwrap_or(Mark::Close);
        self.tokens[self.pos..]
            .iter()
            .position(|t| t.is_mark(close))
            .map(|i| self.pos + i)
            .ok_or_else(|| {
                ParseError::unexpected_token(
                    self.end_offset(),
                    format!("'{}' closing the '{}' at offset {}", close.as_str(), token.text, token.offset),
                    "end of input",
                )
            })
    }

    fn in_content(&self, state: &State) -> bool {
        matches!(state, State::ExpectChildOrSiblingOrClose) && self.text.is_some()
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(0)
    }

    fn finish(self) -> Result<Tree, ParseError> {
        match self.state {
            State::ExpectTagName { .. } => {
                return Err(ParseError::unexpected_token(
                    self.end_offset(),
                    "a tag name",
                    "end of input",
                ));
            }
            State::ExpectAttributeOrTerminator(p)
            | State::ExpectEquals(p, _)
            | State::ExpectAttributeValue(p, _) => {
                return Err(ParseError::UnterminatedElement {
                    offset: p.offset,
                    tag: p.node.tag,
                });
            }
            _ => {}
        }

        if let Some(open) = self.open.last() {
            return Err(ParseError::UnterminatedElement {
                offset: open.offset,
                tag: self.tree[open.id].tag.clone(),
            });
        }

        if self.tree.is_empty() {
            return Err(ParseError::EmptyDocument);
        }
        Ok(self.tree)
    }
}

fn unexpected(token: &Token, expected: impl Into<String>) -> ParseError {
    ParseError::unexpected_token(token.offset, expected, token.text.as_str())
}
