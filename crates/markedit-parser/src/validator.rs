//! Structural validator.
//!
//! Checks a token stream for well-formedness with an explicit stack of open
//! tag names. It never needs a tree and always recovers locally, so in
//! [`CheckMode::CollectAll`] one pass reports every problem it can find.
//!
//! Recovery rules:
//! - a mark that cannot appear where it was found is reported and skipped,
//!   except `<`, `</`, `<!--` and `<?`, which are left in place so the next
//!   construct is checked normally;
//! - a mismatched close unwinds the stack down to the matching open tag when
//!   there is one, otherwise it pops the innermost tag. The tags it unwinds
//!   are not reported again at end of input.

use markedit_lexer::{Mark, Scanner, Token, TokenKind};
use tracing::{debug, instrument};

use crate::store::ChainedMap;
use crate::{ValidationError, ValidationKind};

/// How many errors to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Stop at the first error.
    FailFast,
    /// Scan to the end and report everything.
    #[default]
    CollectAll,
}

/// Raised internally to unwind the scan in [`CheckMode::FailFast`].
struct Halt;

type Step = Result<(), Halt>;

pub struct Validator<'t> {
    tokens: &'t [Token],
    pos: usize,
    mode: CheckMode,
    stack: Vec<String>,
    errors: Vec<ValidationError>,
    /// Whether any start tag had a name.
    seen_element: bool,
}

impl<'t> Validator<'t> {
    fn new(tokens: &'t [Token], mode: CheckMode) -> Self {
        Self {
            tokens,
            pos: 0,
            mode,
            stack: Vec::new(),
            errors: Vec::new(),
            seen_element: false,
        }
    }

    /// Tokenize and check source text.
    pub fn check_source(source: &str, mode: CheckMode) -> Result<(), Vec<ValidationError>> {
        Self::check(&Scanner::tokenize(source), mode)
    }

    /// Check a token stream. Errors come back in discovery order; in
    /// [`CheckMode::FailFast`] there is at most one.
    #[instrument(level = "debug", skip(tokens), fields(len = tokens.len()))]
    pub fn check(tokens: &[Token], mode: CheckMode) -> Result<(), Vec<ValidationError>> {
        let mut validator = Validator::new(tokens, mode);
        // A halt only means fail-fast found its error.
        let _ = validator.run();

        if validator.errors.is_empty() {
            Ok(())
        } else {
            debug!(errors = validator.errors.len(), "document is not well-formed");
            Err(validator.errors)
        }
    }

    fn run(&mut self) -> Step {
        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Mark(Mark::Open) => self.open_tag(token)?,
                TokenKind::Mark(Mark::OpenEnd) => self.close_tag(token)?,
                TokenKind::Mark(m @ (Mark::CommentOpen | Mark::PiOpen)) => {
                    self.skip_comment(token, m)?
                }
                TokenKind::Mark(
                    Mark::Close | Mark::SelfClose | Mark::CommentClose | Mark::PiClose,
                ) => self.unexpected(token)?,
                // Element text, including a bare `=`.
                _ => {}
            }
        }

        if !self.stack.is_empty() {
            let tags = self.stack.drain(..).rev().collect();
            let offset = self.end_offset();
            self.report(offset, ValidationKind::IncompleteTags { tags })?;
        }
        if !self.seen_element {
            let offset = self.end_offset();
            self.report(offset, ValidationKind::EmptyDocument)?;
        }
        Ok(())
    }

    // =========================================================================
    // Tags
    // =========================================================================

    fn open_tag(&mut self, open: &'t Token) -> Step {
        self.skip_whitespace();
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Word => {
                self.pos += 1;
                t.text.clone()
            }
            Some(t) => return self.misplaced(t),
            None => return self.unexpected(open),
        };

        self.seen_element = true;
        self.stack.push(name);

        let mut seen: ChainedMap<&'t str, ()> = ChainedMap::new();
        loop {
            self.skip_whitespace();
            let Some(token) = self.peek() else {
                // Input ended inside the tag; the name stays open.
                return Ok(());
            };
            match token.kind {
                TokenKind::Mark(Mark::Close) => {
                    self.pos += 1;
                    return Ok(());
                }
                TokenKind::Mark(Mark::SelfClose) => {
                    self.pos += 1;
                    self.stack.pop();
                    return Ok(());
                }
                TokenKind::Word => {
                    self.pos += 1;
                    if !seen.insert(token.text.as_str(), ()) {
                        self.report(
                            token.offset,
                            ValidationKind::RepeatedAttribute {
                                name: token.text.clone(),
                            },
                        )?;
                    }
                    self.attribute(token)?;
                }
                TokenKind::Mark(m) if resumes_scan(m) => {
                    // The tag never ended; leave the mark for the main loop.
                    return self.misplaced(token);
                }
                _ => self.misplaced(token)?,
            }
        }
    }

    /// Check `= value` after an attribute name.
    fn attribute(&mut self, name: &'t Token) -> Step {
        self.skip_whitespace();
        match self.peek() {
            Some(t) if t.is_mark(Mark::Equals) => self.pos += 1,
            other => {
                let offset = other.map_or(self.end_offset(), |t| t.offset);
                self.report(
                    offset,
                    ValidationKind::MissingEquals {
                        name: name.text.clone(),
                    },
                )?;
                // `k "v"` reads as a forgotten `=`; take the value with it.
                if other.is_some_and(|t| t.kind == TokenKind::Quoted) {
                    self.pos += 1;
                }
                return Ok(());
            }
        }

        self.skip_whitespace();
        match self.peek() {
            Some(t) if t.is_value() => {
                self.pos += 1;
                Ok(())
            }
            other => {
                let offset = other.map_or(self.end_offset(), |t| t.offset);
                self.report(
                    offset,
                    ValidationKind::MissingValue {
                        name: name.text.clone(),
                    },
                )
            }
        }
    }

    fn close_tag(&mut self, open_end: &'t Token) -> Step {
        self.skip_whitespace();
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Word => {
                self.pos += 1;
                t.text.clone()
            }
            Some(t) => return self.misplaced(t),
            None => return self.unexpected(open_end),
        };

        self.match_close(open_end.offset, name.clone())?;

        self.skip_whitespace();
        match self.peek() {
            Some(t) if t.is_mark(Mark::Close) => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => self.misplaced(t),
            None => {
                let offset = self.end_offset();
                self.report(
                    offset,
                    ValidationKind::UnexpectedMark {
                        found: format!("</{name}"),
                    },
                )
            }
        }
    }

    /// Pop the open tag that `</name` closes.
    fn match_close(&mut self, offset: usize, name: String) -> Step {
        let Some(top) = self.stack.last() else {
            return self.report(offset, ValidationKind::UnmatchedClose { found: name });
        };
        if *top == name {
            self.stack.pop();
            return Ok(());
        }

        let expected = top.clone();
        match self.stack.iter().rposition(|t| *t == name) {
            Some(depth) => self.stack.truncate(depth),
            None => {
                self.stack.pop();
            }
        }
        debug!(%expected, found = %name, depth = self.stack.len(), "unwound mismatched close");
        self.report(
            offset,
            ValidationKind::MismatchedClose {
                expected,
                found: name,
            },
        )
    }

    fn skip_comment(&mut self, open: &'t Token, mark: Mark) -> Step {
        let close = mark.closing_pair().unwrap_or(Mark::Close);
        match self.tokens[self.pos..].iter().position(|t| t.is_mark(close)) {
            Some(i) => {
                self.pos += i + 1;
                Ok(())
            }
            None => {
                self.pos = self.tokens.len();
                self.unexpected(open)
            }
        }
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    fn report(&mut self, offset: usize, kind: ValidationKind) -> Step {
        debug!(offset, %kind, "validation error");
        self.errors.push(ValidationError::new(offset, kind));
        match self.mode {
            CheckMode::FailFast => Err(Halt),
            CheckMode::CollectAll => Ok(()),
        }
    }

    fn unexpected(&mut self, token: &Token) -> Step {
        self.report(
            token.offset,
            ValidationKind::UnexpectedMark {
                found: token.text.clone(),
            },
        )
    }

    /// Report a token found where a name, value or terminator belonged.
    /// Marks that start a new construct are left for the main loop;
    /// everything else is consumed so the scan always moves forward.
    fn misplaced(&mut self, token: &'t Token) -> Step {
        if !token.mark().is_some_and(resumes_scan) {
            self.pos += 1;
        }
        self.unexpected(token)
    }

    // =========================================================================
    // Token navigation
    // =========================================================================

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(Token::is_whitespace) {
            self.pos += 1;
        }
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(0)
    }
}

/// Marks that begin a construct of their own.
fn resumes_scan(mark: Mark) -> bool {
    matches!(
        mark,
        Mark::Open | Mark::OpenEnd | Mark::CommentOpen | Mark::PiOpen
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check_all(source: &str) -> Vec<ValidationError> {
        match Validator::check_source(source, CheckMode::CollectAll) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        }
    }

    fn kinds(source: &str) -> Vec<ValidationKind> {
        check_all(source).into_iter().map(|e| e.kind).collect()
    }

    fn s(text: &str) -> String {
        text.to_string()
    }

    // =========================================================================
    // Well-formed input
    // =========================================================================

    #[test]
    fn test_well_formed_documents() {
        let docs = [
            "<a/>",
            "<a></a>",
            "<a x=\"1\"><b>hi</b></a>",
            "<?xml version=\"1.0\"?>\n<a>\n  <!-- note -->\n  <b k=v/>\n  <c>x = y</c>\n</a>\n",
            "<a><b><c/></b><b/></a>",
            "<a k = \"v\" j=w />",
        ];
        for doc in docs {
            assert_eq!(check_all(doc), Vec::new(), "{doc}");
        }
    }

    #[test]
    fn test_document_without_elements() {
        assert_eq!(
            check_all(""),
            vec![ValidationError::new(0, ValidationKind::EmptyDocument)]
        );
        assert_eq!(
            check_all("  <!-- c --> "),
            vec![ValidationError::new(13, ValidationKind::EmptyDocument)]
        );
        assert_eq!(kinds("text only"), vec![ValidationKind::EmptyDocument]);
    }

    // =========================================================================
    // Close tags
    // =========================================================================

    #[test]
    fn test_mismatched_close_reported_once() {
        let errors = check_all("<a><b></a>");
        assert_eq!(
            errors,
            vec![ValidationError::new(
                6,
                ValidationKind::MismatchedClose {
                    expected: s("b"),
                    found: s("a"),
                }
            )]
        );
    }

    #[test]
    fn test_mismatch_unwinds_to_matching_open() {
        assert_eq!(
            kinds("<a><b><c></a>"),
            vec![ValidationKind::MismatchedClose {
                expected: s("c"),
                found: s("a"),
            }]
        );
    }

    #[test]
    fn test_mismatch_without_match_pops_innermost() {
        assert_eq!(
            kinds("<a><b></x></a>"),
            vec![ValidationKind::MismatchedClose {
                expected: s("b"),
                found: s("x"),
            }]
        );
    }

    #[test]
    fn test_unmatched_close() {
        let errors = check_all("<a/></b>");
        assert_eq!(
            errors,
            vec![ValidationError::new(
                4,
                ValidationKind::UnmatchedClose { found: s("b") }
            )]
        );
        assert_eq!(
            errors[0].message(),
            "closing tag </b> without matching opening tag"
        );
    }

    #[test]
    fn test_close_tag_missing_terminator() {
        assert_eq!(
            kinds("<a></a"),
            vec![ValidationKind::UnexpectedMark { found: s("</a") }]
        );
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_repeated_attribute_at_second_occurrence() {
        let errors = check_all("<a k=\"1\" k=\"2\">");
        let repeated: Vec<_> = errors
            .iter()
            .filter(|e| matches!(e.kind, ValidationKind::RepeatedAttribute { .. }))
            .collect();
        assert_eq!(repeated.len(), 1);
        assert_eq!(repeated[0].offset, 9);
        assert_eq!(
            repeated[0].kind,
            ValidationKind::RepeatedAttribute { name: s("k") }
        );
    }

    #[test]
    fn test_same_attribute_on_different_tags() {
        assert_eq!(check_all("<a k=1><b k=2/></a>"), Vec::new());
    }

    #[test]
    fn test_missing_equals() {
        let errors = check_all("<a k \"v\"></a>");
        assert_eq!(
            errors,
            vec![ValidationError::new(
                5,
                ValidationKind::MissingEquals { name: s("k") }
            )]
        );
    }

    #[test]
    fn test_missing_equals_before_next_attribute() {
        assert_eq!(
            kinds("<a flag k=v/>"),
            vec![ValidationKind::MissingEquals { name: s("flag") }]
        );
    }

    #[test]
    fn test_missing_value() {
        let errors = check_all("<a k=></a>");
        assert_eq!(
            errors,
            vec![ValidationError::new(
                5,
                ValidationKind::MissingValue { name: s("k") }
            )]
        );
    }

    #[test]
    fn test_mark_in_attribute_list() {
        assert_eq!(
            kinds("<a = ></a>"),
            vec![ValidationKind::UnexpectedMark { found: s("=") }]
        );
    }

    #[test]
    fn test_open_mark_inside_tag_leaves_tag_open() {
        assert_eq!(
            kinds("<a <b></b></a>"),
            vec![ValidationKind::UnexpectedMark { found: s("<") }]
        );
    }

    // =========================================================================
    // Stray marks and recovery
    // =========================================================================

    #[test]
    fn test_stray_close_mark() {
        let errors = check_all("<a> > </a>");
        assert_eq!(
            errors,
            vec![ValidationError::new(
                4,
                ValidationKind::UnexpectedMark { found: s(">") }
            )]
        );
    }

    #[test]
    fn test_stray_marks_each_reported_once() {
        assert_eq!(
            kinds("/> > <a/>"),
            vec![
                ValidationKind::UnexpectedMark { found: s("/>") },
                ValidationKind::UnexpectedMark { found: s(">") },
            ]
        );
    }

    #[test]
    fn test_missing_tag_name_reported_once() {
        assert_eq!(
            kinds("< ><a/>"),
            vec![ValidationKind::UnexpectedMark { found: s(">") }]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let errors = check_all("<a><!-- no end </a>");
        assert_eq!(
            errors,
            vec![
                ValidationError::new(3, ValidationKind::UnexpectedMark { found: s("<!--") }),
                ValidationError::new(19, ValidationKind::IncompleteTags { tags: vec![s("a")] }),
            ]
        );
    }

    #[test]
    fn test_comment_hides_tags() {
        assert_eq!(check_all("<a><!-- <b> </c> --></a>"), Vec::new());
    }

    // =========================================================================
    // End of input
    // =========================================================================

    #[test]
    fn test_incomplete_tags_most_recent_first() {
        let errors = check_all("<a><b><c/><d>");
        assert_eq!(
            errors,
            vec![ValidationError::new(
                13,
                ValidationKind::IncompleteTags {
                    tags: vec![s("d"), s("b"), s("a")]
                }
            )]
        );
        assert_eq!(errors[0].message(), "incomplete tags: d, b, a");
    }

    #[test]
    fn test_input_ends_inside_tag() {
        assert_eq!(
            kinds("<a k=\"v\""),
            vec![ValidationKind::IncompleteTags { tags: vec![s("a")] }]
        );
    }

    // =========================================================================
    // Modes
    // =========================================================================

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let source = "<a k=1 k=2><b></a> >";
        let all = Validator::check_source(source, CheckMode::CollectAll).unwrap_err();
        assert!(all.len() > 1);

        let first = Validator::check_source(source, CheckMode::FailFast).unwrap_err();
        assert_eq!(first, vec![all[0].clone()]);
    }

    #[test]
    fn test_collect_all_offsets_non_decreasing() {
        let errors = check_all("> <a k=1 k=2 j><b></c> /> </z> <d");
        assert!(errors.len() >= 4);
        assert!(errors.windows(2).all(|w| w[0].offset <= w[1].offset));
    }

    #[test]
    fn test_validator_and_parser_agree_on_well_formedness() {
        let cases = [
            ("<a><b/></a>", true),
            ("<a><b></a>", false),
            ("<a k=1 k=2/>", false),
            ("<a>text</a>", true),
            ("<a>", false),
            ("", false),
            ("\n<!-- nothing -->\n", false),
        ];
        for (source, ok) in cases {
            assert_eq!(check_all(source).is_empty(), ok, "{source}");
            if ok {
                assert!(crate::Parser::parse(source).is_ok(), "{source}");
            }
        }
    }
}
