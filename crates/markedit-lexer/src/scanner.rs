use crate::token::{Mark, Token, TokenKind};

/// Markup source scanner.
///
/// Splits text into a flat, ordered token stream. Every character of the
/// input lands in exactly one token, so concatenating the token texts gives
/// back the source. Scanning never fails: anything that is not a mark,
/// whitespace or a quoted literal is a word.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens();
        tracing::trace!(
            bytes = source.len(),
            tokens = scanner.tokens.len(),
            "tokenized source"
        );
        scanner.tokens
    }

    fn scan_tokens(&mut self) {
        while !self.is_at_end() {
            self.scan_token();
        }
    }

    fn scan_token(&mut self) {
        let rest = self.rest();

        if let Some(mark) = Mark::at_start_of(rest) {
            self.emit(TokenKind::Mark(mark), mark.as_str().len());
            return;
        }

        let ch = self.peek();
        if ch.is_whitespace() {
            self.scan_whitespace();
        } else if ch == '"' {
            self.scan_quoted();
        } else {
            self.scan_word();
        }
    }

    // --- Scanners ---

    fn scan_whitespace(&mut self) {
        let len = self
            .rest()
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.rest().len());
        self.emit(TokenKind::Whitespace, len);
    }

    /// Scan a double-quoted literal. A quote with no partner is a one-character
    /// word, which keeps the scanner total.
    fn scan_quoted(&mut self) {
        match self.rest()[1..].find('"') {
            Some(close) => self.emit(TokenKind::Quoted, close + 2),
            None => self.emit(TokenKind::Word, 1),
        }
    }

    /// Scan a word: everything up to whitespace, a quote, or the start of a mark.
    fn scan_word(&mut self) {
        let rest = self.rest();
        let mut len = 0;
        for (i, c) in rest.char_indices() {
            if i > 0 && (c.is_whitespace() || c == '"' || Mark::at_start_of(&rest[i..]).is_some())
            {
                break;
            }
            len = i + c.len_utf8();
        }
        self.emit(TokenKind::Word, len);
    }

    // --- Helpers ---

    fn emit(&mut self, kind: TokenKind, len: usize) {
        let text = &self.source[self.pos..self.pos + len];
        self.tokens.push(Token::new(kind, text, self.pos));
        self.pos += len;
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}
