//! Swift tokenizer.
//!
//! Produces a flat token stream with line numbers and byte offsets. String
//! literal contents are dropped, except for `\( ... )` interpolations whose
//! contents are tokenized like ordinary code. Comments are skipped (block
//! comments nest, as in Swift).
//!
//! The lexer never fails. Unterminated literals and comments end the
//! affected token at the point of failure and are reported as
//! [`LexProblem`]s alongside everything tokenized so far.

/// Token categories the extractor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// Backtick-escaped identifier (never a keyword)
    EscapedIdent,
    /// Numeric literal
    Number,
    /// Run of operator characters (`==`, `->`, `?`, `<`)
    Operator,
    /// Single punctuation character
    Punct,
}

/// A lexical token borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token classification
    pub kind: TokenKind,
    /// Token text (without backticks for escaped identifiers)
    pub text: &'a str,
    /// Line of the token's first character (1-indexed)
    pub line: u32,
    /// Byte offset of the token's first character
    pub offset: usize,
}

impl Token<'_> {
    /// Whether this is the punctuation character `c`.
    #[must_use]
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.len() == c.len_utf8() && self.text.starts_with(c)
    }

    /// Whether this is an unescaped identifier with exactly this text.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }

    /// Whether this token can name something (identifier of either form).
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::EscapedIdent)
    }
}

/// A problem detected while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexProblem {
    /// Line where the unterminated construct started
    pub line: u32,
    /// Human-readable description
    pub message: String,
}

/// Tokenizer output.
#[derive(Debug, Clone, Default)]
pub struct Lexed<'a> {
    /// Tokens in source order
    pub tokens: Vec<Token<'a>>,
    /// Unterminated literals and comments, in source order
    pub problems: Vec<LexProblem>,
    /// Number of lines in the source (at least 1)
    pub line_count: u32,
}

const OPERATOR_CHARS: &str = "/=-+!*%<>&|^~?";

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Ordinary code
    Code,
    /// Code inside `\( ... )`; `depth` counts unclosed inner parentheses
    Interpolation { depth: u32 },
    /// Inside a string literal
    Str {
        multiline: bool,
        hashes: usize,
        start_line: u32,
    },
}

/// Tokenize Swift source text.
#[must_use]
pub fn tokenize(source: &str) -> Lexed<'_> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        line: 1,
        modes: vec![Mode::Code],
        out: Lexed::default(),
    };
    lexer.run();
    lexer.out.line_count = lexer.line;
    lexer.out
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    modes: Vec<Mode>,
    out: Lexed<'a>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: u32) {
        self.out.tokens.push(Token {
            kind,
            text: &self.src[start..self.pos],
            line,
            offset: start,
        });
    }

    fn problem(&mut self, line: u32, message: impl Into<String>) {
        self.out.problems.push(LexProblem {
            line,
            message: message.into(),
        });
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            match self.modes.last().copied().unwrap_or(Mode::Code) {
                Mode::Str {
                    multiline,
                    hashes,
                    start_line,
                } => self.string_body(multiline, hashes, start_line),
                Mode::Code | Mode::Interpolation { .. } => self.code(),
            }
        }

        for mode in self.modes.drain(..).rev() {
            if let Mode::Str { start_line, .. } = mode {
                self.out.problems.push(LexProblem {
                    line: start_line,
                    message: "string literal is never closed".to_string(),
                });
            }
        }
    }

    fn code(&mut self) {
        let Some(c) = self.peek() else { return };
        let start = self.pos;
        let line = self.line;

        if c.is_whitespace() {
            self.bump();
            return;
        }

        let rest = self.rest();
        if rest.starts_with("//") {
            self.bump_while(|c| c != '\n');
            return;
        }
        if rest.starts_with("/*") {
            self.block_comment();
            return;
        }

        if c == '"' || (c == '#' && self.raw_string_ahead()) {
            self.string_open();
            return;
        }

        if c == '`' {
            self.bump();
            let ident_start = self.pos;
            self.bump_while(|c| c != '`' && c != '\n');
            let ident_end = self.pos;
            if self.peek() == Some('`') {
                self.bump();
            }
            if ident_end > ident_start {
                self.out.tokens.push(Token {
                    kind: TokenKind::EscapedIdent,
                    text: &self.src[ident_start..ident_end],
                    line,
                    offset: ident_start,
                });
            }
            return;
        }

        if is_ident_start(c) {
            self.bump_while(is_ident_continue);
            self.push(TokenKind::Ident, start, line);
            return;
        }

        if c == '$' {
            // Closure shorthand arguments ($0) and property-wrapper projections
            self.bump();
            self.bump_while(is_ident_continue);
            return;
        }

        if c.is_ascii_digit() {
            self.number(start);
            self.push(TokenKind::Number, start, line);
            return;
        }

        if OPERATOR_CHARS.contains(c) {
            while let Some(c) = self.peek() {
                let rest = self.rest();
                if !OPERATOR_CHARS.contains(c) || rest.starts_with("//") || rest.starts_with("/*")
                {
                    break;
                }
                self.bump();
            }
            self.push(TokenKind::Operator, start, line);
            return;
        }

        if let Some(Mode::Interpolation { depth }) = self.modes.last_mut() {
            match c {
                '(' => *depth += 1,
                ')' if *depth == 0 => {
                    self.bump();
                    self.modes.pop();
                    return;
                }
                ')' => *depth -= 1,
                _ => {}
            }
        }

        self.bump();
        self.push(TokenKind::Punct, start, line);
    }

    fn number(&mut self, start: usize) {
        let hex = self.rest().starts_with("0x");
        while let Some(c) = self.peek() {
            let literal = &self.src[start..self.pos];
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else if c == '.' && self.peek_nth(1).is_some_and(|n| n.is_ascii_digit()) {
                self.bump();
            } else if matches!(c, '+' | '-')
                && ((!hex && literal.ends_with(['e', 'E'])) || (hex && literal.ends_with(['p', 'P'])))
            {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn block_comment(&mut self) {
        let line = self.line;
        let mut depth = 0u32;
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("/*") {
                depth += 1;
                self.pos += 2;
            } else if rest.starts_with("*/") {
                depth -= 1;
                self.pos += 2;
                if depth == 0 {
                    return;
                }
            } else {
                self.bump();
            }
        }
        self.problem(line, "block comment is never closed");
    }

    fn raw_string_ahead(&self) -> bool {
        self.rest().trim_start_matches('#').starts_with('"')
    }

    fn string_open(&mut self) {
        let start_line = self.line;
        let mut hashes = 0;
        while self.peek() == Some('#') {
            self.bump();
            hashes += 1;
        }
        let multiline = self.rest().starts_with("\"\"\"");
        let quotes = if multiline { 3 } else { 1 };
        for _ in 0..quotes {
            self.bump();
        }
        self.modes.push(Mode::Str {
            multiline,
            hashes,
            start_line,
        });
    }

    fn string_body(&mut self, multiline: bool, hashes: usize, start_line: u32) {
        let Some(c) = self.peek() else { return };
        let rest = self.rest();

        if c == '\\' && rest[1..].starts_with(&"#".repeat(hashes)) {
            self.bump();
            for _ in 0..hashes {
                self.bump();
            }
            if self.peek() == Some('(') {
                self.bump();
                self.modes.push(Mode::Interpolation { depth: 0 });
            } else {
                self.bump();
            }
            return;
        }

        let close = if multiline { "\"\"\"" } else { "\"" };
        if rest.starts_with(close) && rest[close.len()..].starts_with(&"#".repeat(hashes)) {
            self.pos += close.len() + hashes;
            self.modes.pop();
            return;
        }

        if c == '\n' && !multiline {
            self.problem(start_line, "string literal is never closed");
            self.modes.pop();
            return;
        }

        self.bump();
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
