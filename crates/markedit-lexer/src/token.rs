/// A structural mark recognised by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// `<`
    Open,
    /// `>`
    Close,
    /// `</`
    OpenEnd,
    /// `/>`
    SelfClose,
    /// `=`
    Equals,
    /// `<!--`
    CommentOpen,
    /// `-->`
    CommentClose,
    /// `<?`
    PiOpen,
    /// `?>`
    PiClose,
}

impl Mark {
    /// Marks ordered longest first, so a prefix scan over this list is a
    /// longest-match scan.
    pub const ALL: [Mark; 9] = [
        Mark::CommentOpen,
        Mark::CommentClose,
        Mark::OpenEnd,
        Mark::SelfClose,
        Mark::PiOpen,
        Mark::PiClose,
        Mark::Open,
        Mark::Close,
        Mark::Equals,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::Open => "<",
            Mark::Close => ">",
            Mark::OpenEnd => "</",
            Mark::SelfClose => "/>",
            Mark::Equals => "=",
            Mark::CommentOpen => "<!--",
            Mark::CommentClose => "-->",
            Mark::PiOpen => "<?",
            Mark::PiClose => "?>",
        }
    }

    /// The mark that ends a comment or processing instruction opened by `self`.
    pub fn closing_pair(self) -> Option<Mark> {
        match self {
            Mark::CommentOpen => Some(Mark::CommentClose),
            Mark::PiOpen => Some(Mark::PiClose),
            _ => None,
        }
    }

    /// Find the mark that `rest` starts with, if any.
    pub fn at_start_of(rest: &str) -> Option<Mark> {
        Mark::ALL.into_iter().find(|m| rest.starts_with(m.as_str()))
    }
}

/// Token classification.
///
/// Listed in classification priority: when a span could be read as more than
/// one class, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Mark(Mark),
    Whitespace,
    /// Text between a pair of double quotes. The token text keeps the quotes.
    Quoted,
    /// Any other maximal run of characters.
    Word,
}

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character in the source text.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }

    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn is_mark(&self, mark: Mark) -> bool {
        self.kind == TokenKind::Mark(mark)
    }

    pub fn mark(&self) -> Option<Mark> {
        match self.kind {
            TokenKind::Mark(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// Words and quoted literals can both serve as names and values.
    pub fn is_value(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::Quoted)
    }

    /// The token text with surrounding quotes removed for quoted literals.
    pub fn unquoted(&self) -> &str {
        match self.kind {
            TokenKind::Quoted => self
                .text
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(&self.text),
            _ => &self.text,
        }
    }
}

/// A 1-based line and column, for reporting offsets to humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Locate a byte offset in `source`. Columns count characters, not bytes.
    /// Offsets past the end resolve to the position just after the last character.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_longest_mark_wins() {
        assert_eq!(Mark::at_start_of("<!-- x"), Some(Mark::CommentOpen));
        assert_eq!(Mark::at_start_of("</a>"), Some(Mark::OpenEnd));
        assert_eq!(Mark::at_start_of("<a>"), Some(Mark::Open));
        assert_eq!(Mark::at_start_of("<?xml"), Some(Mark::PiOpen));
        assert_eq!(Mark::at_start_of("/>"), Some(Mark::SelfClose));
        assert_eq!(Mark::at_start_of("/a"), None);
        assert_eq!(Mark::at_start_of("--"), None);
    }

    #[test]
    fn test_unquoted() {
        let tok = Token::new(TokenKind::Quoted, "\"1\"", 0);
        assert_eq!(tok.unquoted(), "1");
        let tok = Token::new(TokenKind::Word, "plain", 0);
        assert_eq!(tok.unquoted(), "plain");
        let tok = Token::new(TokenKind::Quoted, "\"\"", 0);
        assert_eq!(tok.unquoted(), "");
    }

    #[test]
    fn test_unquoted_lone_quote_kept_raw() {
        let tok = Token::new(TokenKind::Quoted, "\"", 0);
        assert_eq!(tok.unquoted(), "\"");
        let tok = Token::new(TokenKind::Quoted, "", 0);
        assert_eq!(tok.unquoted(), "");
    }

    #[test]
    fn test_position_locate() {
        let src = "<a>\n  <b/>\n</a>";
        assert_eq!(Position::locate(src, 0), Position { line: 1, column: 1 });
        assert_eq!(Position::locate(src, 6), Position { line: 2, column: 3 });
        assert_eq!(Position::locate(src, 11), Position { line: 3, column: 1 });
        assert_eq!(Position::locate(src, 999), Position { line: 3, column: 5 });
    }
}
