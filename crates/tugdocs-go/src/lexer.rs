//! Go tokenizer.
//!
//! Produces the token stream the declaration parser works on, including
//! comments (kept as tokens so the parser can group them and find doc
//! comments) and the semicolons Go inserts automatically at line ends.
//!
//! ## Semicolon insertion
//!
//! A newline (or the end of a line comment / a multi-line block comment, or
//! EOF) inserts a semicolon when the last token on the line was an
//! identifier, a literal, one of the keywords `break`, `continue`,
//! `fallthrough`, `return`, one of `++ -- ) ] }`. The inserted token has an
//! empty span placed where the line ends and is emitted *before* any comment
//! that closes the line.

use thiserror::Error;
use tugdocs_core::text::Span;

/// Keywords recognized by the tokenizer.
pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Operators and delimiters, longest first so the first match wins.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "~", "(", ")", "[", "]", "{", "}", ",", ".", ":",
];

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    /// Number, string or rune literal.
    Literal,
    /// `//` or `/* */` comment.
    Comment,
    /// Operator or delimiter.
    Punct,
    /// Explicit `;` or one inserted at a line end.
    Semi { implicit: bool },
}

/// A token with its byte span and starting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-indexed line of `span.start`.
    pub line: u32,
    /// 1-indexed line of `span.end` (differs from `line` for raw strings and
    /// block comments).
    pub end_line: u32,
}

impl Token {
    /// Source text of this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }

    /// True if this token is the punctuation `p`.
    pub fn is_punct(&self, source: &str, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(source) == p
    }

    /// True if this token is the keyword `kw`.
    pub fn is_keyword(&self, source: &str, kw: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == kw
    }

    /// True for identifiers that are not keywords.
    pub fn is_name(&self, source: &str) -> bool {
        self.kind == TokenKind::Ident && !KEYWORDS.contains(&self.text(source))
    }

    pub fn is_semi(&self) -> bool {
        matches!(self.kind, TokenKind::Semi { .. })
    }
}

/// Tokenizer failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("{line}:{col}: unexpected character {ch:?}")]
    UnexpectedChar { ch: char, line: u32, col: u32 },

    #[error("{line}:{col}: comment not terminated")]
    UnterminatedComment { line: u32, col: u32 },

    #[error("{line}:{col}: string literal not terminated")]
    UnterminatedString { line: u32, col: u32 },

    #[error("{line}:{col}: rune literal not terminated")]
    UnterminatedRune { line: u32, col: u32 },
}

/// Tokenize Go source.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: u32,
    line_start: usize,
    tokens: Vec<Token>,
    /// Whether a newline here would insert a semicolon.
    insert_semi: bool,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        let pos = if source.starts_with('\u{feff}') { 3 } else { 0 };
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos,
            line: 1,
            line_start: 0,
            tokens: Vec::new(),
            insert_semi: false,
        }
    }

    fn col(&self, offset: usize) -> u32 {
        (offset - self.line_start) as u32 + 1
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn newline_at(&mut self, offset: usize) {
        self.line += 1;
        self.line_start = offset + 1;
    }

    fn push(&mut self, kind: TokenKind, start: usize, start_line: u32) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
            line: start_line,
            end_line: self.line,
        });
    }

    fn push_implicit_semi(&mut self, at: usize) {
        if self.insert_semi {
            self.tokens.push(Token {
                kind: TokenKind::Semi { implicit: true },
                span: Span::new(at, at),
                line: self.line,
                end_line: self.line,
            });
            self.insert_semi = false;
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' => {
                    self.push_implicit_semi(self.pos);
                    self.newline_at(self.pos);
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment()?,
                b'"' => self.interpreted_string()?,
                b'`' => self.raw_string()?,
                b'\'' => self.rune()?,
                b'0'..=b'9' => self.number(),
                b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                b';' => {
                    let start = self.pos;
                    self.pos += 1;
                    self.push(TokenKind::Semi { implicit: false }, start, self.line);
                    self.insert_semi = false;
                }
                _ => {
                    let ch = self.source[self.pos..].chars().next().unwrap_or('\0');
                    if ch == '_' || ch.is_alphabetic() {
                        self.identifier();
                    } else {
                        self.operator(ch)?;
                    }
                }
            }
        }
        self.push_implicit_semi(self.pos);
        Ok(self.tokens)
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        self.push_implicit_semi(start);
        let end = self.source[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.source.len());
        // Keep a CRLF terminator out of the comment text.
        self.pos = if end > start && self.bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        self.push(TokenKind::Comment, start, self.line);
        self.pos = end;
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let start_line = self.line;
        let col = self.col(start);
        let close = self.source[start + 2..]
            .find("*/")
            .map(|i| start + 2 + i + 2)
            .ok_or(LexError::UnterminatedComment {
                line: start_line,
                col,
            })?;
        let has_newline = self.source[start..close].contains('\n');
        if has_newline {
            self.push_implicit_semi(start);
        }
        let bytes = self.bytes;
        for (i, b) in bytes[start..close].iter().enumerate() {
            if *b == b'\n' {
                self.newline_at(start + i);
            }
        }
        self.pos = close;
        self.push(TokenKind::Comment, start, start_line);
        Ok(())
    }

    fn interpreted_string(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let col = self.col(start);
        self.pos += 1;
        loop {
            match self.peek(0) {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.pos += 2,
                Some(b'\n') | None => {
                    return Err(LexError::UnterminatedString {
                        line: self.line,
                        col,
                    })
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::Literal, start, self.line);
        self.insert_semi = true;
        Ok(())
    }

    fn raw_string(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let start_line = self.line;
        let col = self.col(start);
        let close = self.source[start + 1..]
            .find('`')
            .map(|i| start + 1 + i + 1)
            .ok_or(LexError::UnterminatedString {
                line: start_line,
                col,
            })?;
        let bytes = self.bytes;
        for (i, b) in bytes[start..close].iter().enumerate() {
            if *b == b'\n' {
                self.newline_at(start + i);
            }
        }
        self.pos = close;
        self.push(TokenKind::Literal, start, start_line);
        self.insert_semi = true;
        Ok(())
    }

    fn rune(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        let col = self.col(start);
        self.pos += 1;
        loop {
            match self.peek(0) {
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.pos += 2,
                Some(b'\n') | None => {
                    return Err(LexError::UnterminatedRune {
                        line: self.line,
                        col,
                    })
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::Literal, start, self.line);
        self.insert_semi = true;
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        let hex = self.source[start..].starts_with("0x") || self.source[start..].starts_with("0X");
        while let Some(b) = self.peek(0) {
            let exponent = if hex {
                matches!(b, b'p' | b'P')
            } else {
                matches!(b, b'e' | b'E')
            };
            if exponent && matches!(self.peek(1), Some(b'+') | Some(b'-')) {
                self.pos += 2;
            } else if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Literal, start, self.line);
        self.insert_semi = true;
    }

    fn identifier(&mut self) {
        let start = self.pos;
        let len: usize = self.source[start..]
            .chars()
            .take_while(|c| *c == '_' || c.is_alphanumeric())
            .map(char::len_utf8)
            .sum();
        self.pos += len;
        self.push(TokenKind::Ident, start, self.line);
        let word = &self.source[start..self.pos];
        self.insert_semi = !KEYWORDS.contains(&word)
            || matches!(word, "break" | "continue" | "fallthrough" | "return");
    }

    fn operator(&mut self, ch: char) -> Result<(), LexError> {
        let start = self.pos;
        let rest = &self.source[start..];
        let op = OPERATORS
            .iter()
            .find(|op| rest.starts_with(**op))
            .ok_or(LexError::UnexpectedChar {
                ch,
                line: self.line,
                col: self.col(start),
            })?;
        self.pos += op.len();
        self.push(TokenKind::Punct, start, self.line);
        self.insert_semi = matches!(*op, ")" | "]" | "}" | "++" | "--");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_text(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text(source).to_string()))
            .collect()
    }

    const SEMI: TokenKind = TokenKind::Semi { implicit: true };

    mod semicolons {
        use super::*;

        #[test]
        fn inserted_after_identifier_at_line_end() {
            let toks = kinds_and_text("package p\n");
            assert_eq!(
                toks,
                vec![
                    (TokenKind::Ident, "package".to_string()),
                    (TokenKind::Ident, "p".to_string()),
                    (SEMI, String::new()),
                ]
            );
        }

        #[test]
        fn not_inserted_after_open_brace_or_keyword() {
            let toks = kinds_and_text("type (\nfunc\n");
            assert!(toks.iter().all(|(k, _)| *k != SEMI));
        }

        #[test]
        fn inserted_before_trailing_comment() {
            let toks = kinds_and_text("x // note\ny");
            assert_eq!(toks[1].0, SEMI);
            assert_eq!(toks[2], (TokenKind::Comment, "// note".to_string()));
        }

        #[test]
        fn inserted_at_eof() {
            let toks = kinds_and_text("return");
            assert_eq!(toks.last().unwrap().0, SEMI);
        }

        #[test]
        fn explicit_semicolon_clears_insertion() {
            let toks = kinds_and_text("a;\n");
            assert_eq!(toks.len(), 2);
            assert_eq!(toks[1].0, TokenKind::Semi { implicit: false });
        }

        #[test]
        fn multi_line_block_comment_ends_line() {
            let toks = kinds_and_text("x /* a\nb */ y");
            assert_eq!(toks[1].0, SEMI);
        }

        #[test]
        fn single_line_block_comment_does_not() {
            let toks = kinds_and_text("x /* a */ y");
            assert_eq!(toks[1].0, TokenKind::Comment);
        }
    }

    mod literals {
        use super::*;

        #[test]
        fn strings_runes_and_raw_strings() {
            let src = "\"a\\\"b\" 'x' '\\'' `raw\nline`";
            let toks = tokenize(src).unwrap();
            let lits: Vec<&str> = toks
                .iter()
                .filter(|t| t.kind == TokenKind::Literal)
                .map(|t| t.text(src))
                .collect();
            assert_eq!(lits, vec!["\"a\\\"b\"", "'x'", "'\\''", "`raw\nline`"]);
            let raw = toks.iter().find(|t| t.text(src).starts_with('`')).unwrap();
            assert_eq!((raw.line, raw.end_line), (1, 2));
        }

        #[test]
        fn numbers() {
            let src = "1_000 0x1p-2 1e+10 .5 3i 0b101";
            let toks = tokenize(src).unwrap();
            let lits: Vec<&str> = toks
                .iter()
                .filter(|t| t.kind == TokenKind::Literal)
                .map(|t| t.text(src))
                .collect();
            assert_eq!(lits, vec!["1_000", "0x1p-2", "1e+10", ".5", "3i", "0b101"]);
        }

        #[test]
        fn hex_e_is_not_an_exponent() {
            let src = "0x1e+2";
            let toks = tokenize(src).unwrap();
            assert_eq!(toks[0].text(src), "0x1e");
            assert_eq!(toks[1].text(src), "+");
        }

        #[test]
        fn unterminated_string_is_an_error() {
            assert!(matches!(
                tokenize("x := \"abc\n"),
                Err(LexError::UnterminatedString { line: 1, col: 6 })
            ));
        }

        #[test]
        fn unterminated_comment_is_an_error() {
            assert!(matches!(
                tokenize("/* never"),
                Err(LexError::UnterminatedComment { .. })
            ));
        }
    }

    mod operators_and_positions {
        use super::*;

        #[test]
        fn longest_operator_wins() {
            let src = "a &^= b ... <-c";
            let ops: Vec<String> = kinds_and_text(src)
                .into_iter()
                .filter(|(k, _)| *k == TokenKind::Punct)
                .map(|(_, t)| t)
                .collect();
            assert_eq!(ops, vec!["&^=", "...", "<-"]);
        }

        #[test]
        fn unexpected_character() {
            assert!(matches!(
                tokenize("a $ b"),
                Err(LexError::UnexpectedChar { ch: '$', line: 1, col: 3 })
            ));
        }

        #[test]
        fn line_numbers_track_newlines() {
            let src = "package p\n\n// doc\nfunc f() {}\n";
            let toks = tokenize(src).unwrap();
            let func = toks.iter().find(|t| t.text(src) == "func").unwrap();
            assert_eq!(func.line, 4);
            let comment = toks.iter().find(|t| t.kind == TokenKind::Comment).unwrap();
            assert_eq!(comment.line, 3);
        }

        #[test]
        fn crlf_is_not_part_of_line_comment() {
            let src = "// doc\r\nfunc";
            let toks = tokenize(src).unwrap();
            assert_eq!(toks[0].text(src), "// doc");
        }

        #[test]
        fn unicode_identifiers() {
            let toks = kinds_and_text("größe := 1");
            assert_eq!(toks[0], (TokenKind::Ident, "größe".to_string()));
        }
    }
}
