// mformat lexer -- tokenizer for MATLAB/Octave source code.

mod cursor;

use cursor::Cursor;
use mformat_common::token::{Delimiter, Group, Keyword, Op, Token, TokenKind};

/// The mformat lexer. Converts source text into a stream of tokens.
///
/// Wraps a [`Cursor`] for byte-level iteration and implements
/// `Iterator<Item = Token>` so callers can consume tokens lazily or collect
/// them into a `Vec`. Every byte of the input ends up in exactly one token;
/// a character with no matching pattern becomes a one-character `Unknown`
/// token, so there are no lexer errors.
///
/// Three pieces of context drive the MATLAB-specific disambiguation:
///
/// - whether anything other than blanks has appeared on the current line
///   (block comments open only at line starts),
/// - the kind of the last relevant token (`'` after an identifier, number,
///   or closer is a transpose, otherwise it opens a string; `(`/`{` after
///   an identifier are calls/subscripts),
/// - the stack of open grouping delimiters (group depth, and the
///   with/without-identifier classification of closers).
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    source: &'src str,
    /// Kind of the last relevant (non-trivia) token emitted.
    last_relevant: Option<TokenKind>,
    /// Currently open grouping delimiters.
    group_stack: Vec<Group>,
    /// Whether the current line holds anything besides blanks so far.
    line_has_code: bool,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            source,
            last_relevant: None,
            group_stack: Vec::new(),
            line_has_code: false,
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Produce the next token, or `None` at end of input.
    fn next_token(&mut self) -> Option<Token> {
        let start = self.cursor.pos();
        let c = self.cursor.peek()?;

        // ── Context-sensitive rules ─────────────────────────────────────
        if c == '%' && !self.line_has_code {
            if let Some(end) = self.block_comment_end(start) {
                self.cursor.skip_to(end);
                let text = self.cursor.slice(start, end);
                return Some(self.emit(Token::new(text, start, TokenKind::BlockComment)));
            }
        }
        if c == '\''
            && matches!(
                self.last_relevant,
                Some(TokenKind::Identifier | TokenKind::Number | TokenKind::Close(_))
            )
        {
            self.cursor.advance();
            let token = Token::new("'", start, TokenKind::Operator(Op::ConjugateTranspose));
            return Some(self.emit(token));
        }
        if (c == '(' || c == '{') && self.last_relevant == Some(TokenKind::Identifier) {
            self.cursor.advance();
            let delimiter = if c == '(' {
                Delimiter::Parenthesis
            } else {
                Delimiter::Brace
            };
            let kind = TokenKind::Open(Group {
                delimiter,
                with_identifier: true,
            });
            let text = self.cursor.slice(start, self.cursor.pos());
            return Some(self.emit(Token::new(text, start, kind)));
        }

        // ── Ordered dispatch ───────────────────────────────────────────
        let token = match c {
            ' ' | '\t' => {
                self.cursor.eat_while(|c| c == ' ' || c == '\t');
                self.token_from(start, TokenKind::Whitespace)
            }
            '\n' => {
                self.cursor.advance();
                self.token_from(start, TokenKind::Newline)
            }
            '%' => self.lex_line_comment(start),
            '.' => self.lex_dot(start),
            '0'..='9' => self.lex_number(start),
            '\'' => self.lex_string(start),
            c if c.is_ascii_alphabetic() => self.lex_word(start),
            '(' => self.open_token(start, Delimiter::Parenthesis),
            '[' => self.open_token(start, Delimiter::Bracket),
            '{' => self.open_token(start, Delimiter::Brace),
            ')' => self.close_token(start, Delimiter::Parenthesis),
            ']' => self.close_token(start, Delimiter::Bracket),
            '}' => self.close_token(start, Delimiter::Brace),
            '=' => self.one_or_two(start, '=', Op::Eq, Op::Assign),
            '~' => self.one_or_two(start, '=', Op::Ne, Op::Not),
            '&' => self.one_or_two(start, '&', Op::ShortCircuitAnd, Op::And),
            '|' => self.one_or_two(start, '|', Op::ShortCircuitOr, Op::Or),
            '<' => self.one_or_two(start, '=', Op::Le, Op::Lt),
            '>' => self.one_or_two(start, '=', Op::Ge, Op::Gt),
            '+' => self.operator(start, Op::Add),
            '-' => self.operator(start, Op::Sub),
            '*' => self.operator(start, Op::MatrixMul),
            '/' => self.operator(start, Op::MatrixRightDiv),
            '\\' => self.operator(start, Op::MatrixLeftDiv),
            '^' => self.operator(start, Op::MatrixPow),
            ':' => self.operator(start, Op::Colon),
            ',' => {
                self.cursor.advance();
                self.token_from(start, TokenKind::Comma)
            }
            ';' => {
                self.cursor.advance();
                self.token_from(start, TokenKind::Semicolon)
            }
            _ => {
                self.cursor.advance();
                self.token_from(start, TokenKind::Unknown)
            }
        };
        Some(self.emit(token))
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Build a token from `start` to the current cursor position.
    fn token_from(&self, start: usize, kind: TokenKind) -> Token {
        Token::new(self.cursor.slice(start, self.cursor.pos()), start, kind)
    }

    /// Consume one character and produce an operator token.
    fn operator(&mut self, start: usize, op: Op) -> Token {
        self.cursor.advance();
        self.token_from(start, TokenKind::Operator(op))
    }

    /// Consume one character, plus `second` if it follows, choosing between
    /// the two-character and one-character operator.
    fn one_or_two(&mut self, start: usize, second: char, two: Op, one: Op) -> Token {
        self.cursor.advance();
        if self.cursor.peek() == Some(second) {
            self.cursor.advance();
            self.token_from(start, TokenKind::Operator(two))
        } else {
            self.token_from(start, TokenKind::Operator(one))
        }
    }

    fn open_token(&mut self, start: usize, delimiter: Delimiter) -> Token {
        self.cursor.advance();
        let kind = TokenKind::Open(Group {
            delimiter,
            with_identifier: false,
        });
        self.token_from(start, kind)
    }

    /// The identifier flag of a closer is resolved in [`Lexer::emit`] from
    /// the opener on top of the grouping stack.
    fn close_token(&mut self, start: usize, delimiter: Delimiter) -> Token {
        self.cursor.advance();
        let kind = TokenKind::Close(Group {
            delimiter,
            with_identifier: false,
        });
        self.token_from(start, kind)
    }

    // ── Comments ───────────────────────────────────────────────────────

    /// `%` to end of line; the newline itself is not consumed.
    fn lex_line_comment(&mut self, start: usize) -> Token {
        self.cursor.eat_while(|c| c != '\n');
        self.token_from(start, TokenKind::LineComment)
    }

    /// Find the end of a block comment opening at `start`, if any.
    ///
    /// The opener `%{` must be followed directly by a newline. The closer is
    /// the *last* `%}` in the source that is preceded on its line only by
    /// blanks and followed by a newline or end of input -- matching the
    /// backtracking of the original greedy pattern. Returns the byte offset
    /// one past the closer, or `None` when no valid closer exists (the `%{`
    /// then lexes as an ordinary line comment).
    fn block_comment_end(&self, start: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        if !self.source[start..].starts_with("%{") {
            return None;
        }
        if bytes.get(start + 2) != Some(&b'\n') {
            return None;
        }

        let mut best = None;
        for (idx, _) in self.source.match_indices("%}") {
            let close_end = idx + 2;
            match bytes.get(close_end) {
                None | Some(b'\n') => {}
                Some(_) => continue,
            }
            // Only blanks between the preceding newline and the closer.
            let mut line_start = idx;
            while line_start > 0 && matches!(bytes[line_start - 1], b' ' | b'\t') {
                line_start -= 1;
            }
            if line_start == 0 || bytes[line_start - 1] != b'\n' {
                continue;
            }
            // That newline must lie within the comment body.
            if line_start - 1 < start + 2 {
                continue;
            }
            best = Some(close_end);
        }
        best
    }

    // ── Dots: continuations, dotted operators, leading-dot numbers ─────

    fn lex_dot(&mut self, start: usize) -> Token {
        if self.source[start..].starts_with("...") {
            return self.lex_line_continuation(start);
        }
        match self.cursor.peek_next() {
            Some(c) if c.is_ascii_digit() => self.lex_number(start),
            Some('*') => self.two_char_operator(start, Op::Mul),
            Some('/') => self.two_char_operator(start, Op::RightDiv),
            Some('\\') => self.two_char_operator(start, Op::LeftDiv),
            Some('^') => self.two_char_operator(start, Op::Pow),
            Some('\'') => self.two_char_operator(start, Op::Transpose),
            _ => {
                self.cursor.advance();
                self.token_from(start, TokenKind::Period)
            }
        }
    }

    fn two_char_operator(&mut self, start: usize, op: Op) -> Token {
        self.cursor.advance();
        self.cursor.advance();
        self.token_from(start, TokenKind::Operator(op))
    }

    /// `...` plus the rest of the line, *including* the terminating newline
    /// (or end of input). Joining the continued line is then a matter of
    /// deleting this single token.
    fn lex_line_continuation(&mut self, start: usize) -> Token {
        self.cursor.advance();
        self.cursor.advance();
        self.cursor.advance();
        self.cursor.eat_while(|c| c != '\n');
        if self.cursor.peek() == Some('\n') {
            self.cursor.advance();
        }
        self.token_from(start, TokenKind::LineContinuationComment)
    }

    // ── Number literals ────────────────────────────────────────────────

    /// Integer, decimal, or exponent literal. Entered either at a digit or
    /// at a `.` directly followed by a digit.
    ///
    /// A `.` after the integer digits is taken as the fraction point unless
    /// the following character turns it into something else: another `.`
    /// (line continuation `1...`), or `*` `/` `\` `^` `'` (dotted operators,
    /// so `1.*2` stays an element-wise product). The exponent is unsigned,
    /// as in the original grammar: `1e-5` lexes as `1`, `e`, `-`, `5`.
    fn lex_number(&mut self, start: usize) -> Token {
        if self.cursor.peek() == Some('.') {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        } else {
            self.cursor.eat_while(|c| c.is_ascii_digit());
            if self.cursor.peek() == Some('.')
                && !matches!(
                    self.cursor.peek_next(),
                    Some('.' | '*' | '/' | '\\' | '^' | '\'')
                )
            {
                self.cursor.advance();
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }
        if matches!(self.cursor.peek(), Some('e' | 'E'))
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        self.token_from(start, TokenKind::Number)
    }

    // ── String literals ────────────────────────────────────────────────

    /// Single-quoted string with `''` escapes. Strings may not span a
    /// newline; an unterminated string degrades to a one-character
    /// `Unknown` token for the quote.
    fn lex_string(&mut self, start: usize) -> Token {
        let bytes = self.source.as_bytes();
        let mut i = start + 1;
        let end = loop {
            match bytes.get(i) {
                None | Some(b'\n') => {
                    // Unterminated: emit the quote alone as unknown.
                    self.cursor.advance();
                    return self.token_from(start, TokenKind::Unknown);
                }
                Some(b'\'') => {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                    } else {
                        break i + 1;
                    }
                }
                Some(_) => i += 1,
            }
        };
        self.cursor.skip_to(end);
        self.token_from(start, TokenKind::SingleQuotedString)
    }

    // ── Identifiers and keywords ───────────────────────────────────────

    fn lex_word(&mut self, start: usize) -> Token {
        self.cursor.advance();
        self.cursor
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = match Keyword::from_str(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        Token::new(text, start, kind)
    }

    // ── Emission ───────────────────────────────────────────────────────

    /// Assign the group depth, resolve closer classification, maintain the
    /// grouping stack and the line/relevance context, and hand the token out.
    ///
    /// The depth is assigned *before* any stack adjustment: an opener
    /// records the depth it opens at, and its closer is decremented to
    /// match. A closer with an empty stack keeps depth 0.
    fn emit(&mut self, mut token: Token) -> Token {
        token.group_depth = self.group_stack.len();
        match token.kind {
            TokenKind::Open(group) => self.group_stack.push(group),
            TokenKind::Close(group) => {
                let with_identifier = self
                    .group_stack
                    .last()
                    .is_some_and(|open| open.with_identifier);
                token.kind = TokenKind::Close(Group {
                    delimiter: group.delimiter,
                    with_identifier,
                });
                if self.group_stack.pop().is_some() {
                    token.group_depth -= 1;
                }
            }
            _ => {}
        }

        if token.is_relevant() {
            self.last_relevant = Some(token.kind);
        }
        match token.kind {
            TokenKind::Newline => self.line_has_code = false,
            TokenKind::LineContinuationComment if token.text.ends_with('\n') => {
                self.line_has_code = false
            }
            TokenKind::Whitespace => {}
            _ => self.line_has_code = true,
        }

        token
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
