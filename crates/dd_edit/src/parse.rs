use dd_core::{FieldKey, MAX_DEPTH, Node, name_hash};
use thiserror::Error;

/// Failure while parsing edited text back into a Structural Tree.
///
/// Carries the 1-based line and column plus the absolute character
/// offset of the first malformed token. Parsing is fail-fast: no
/// partial recovery, so a UI can place exactly one error marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),
    #[error("invalid \\u escape")]
    InvalidUnicodeEscape,
    #[error("integer literal out of 32-bit range")]
    IntOutOfRange,
    #[error("hash literal out of 32-bit range")]
    HashOutOfRange,
    #[error("malformed number literal")]
    MalformedNumber,
    #[error("unknown word {0:?}")]
    UnknownWord(String),
    #[error("nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
    #[error("text after the root value")]
    TrailingText,
}

/// Parse editable text into a Structural Tree.
///
/// Accepts exactly the grammar the renderer produces, plus in-place
/// scalar edits (any whitespace, changed literals, `###name` spelled
/// with a known name instead of a decimal hash).
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let mut parser = Parser::new(text);
    let root = parser.parse_value()?;
    let tail = parser.next_token()?;
    if !matches!(tail.kind, TokenKind::Eof) {
        return Err(tail.error(ParseErrorKind::TrailingText));
    }
    Ok(root)
}

#[derive(Debug)]
enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
    /// `###` followed by a decimal hash.
    HashLit(u32),
    /// `###` followed by an identifier-shaped name.
    HashName(String),
    Eof,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Int(v) => format!("integer {v}"),
            TokenKind::Float(_) => "float literal".to_string(),
            TokenKind::Bool(v) => format!("'{v}'"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::HashLit(v) => format!("'###{v}'"),
            TokenKind::HashName(n) => format!("'###{n}'"),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
    offset: usize,
}

impl Token {
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            offset: self.offset,
            kind,
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        self.error(ParseErrorKind::UnexpectedToken {
            expected,
            found: self.kind.describe(),
        })
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    offset: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
            offset: 0,
            depth: 0,
        }
    }

    // ---- character stream ----

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            offset: self.offset,
            kind,
        }
    }

    // ---- tokens ----

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        let (line, column, offset) = (self.line, self.column, self.offset);
        let token = |kind| Token {
            kind,
            line,
            column,
            offset,
        };

        let Some(&c) = self.chars.peek() else {
            return Ok(token(TokenKind::Eof));
        };
        match c {
            '{' => {
                self.bump();
                Ok(token(TokenKind::LBrace))
            }
            '}' => {
                self.bump();
                Ok(token(TokenKind::RBrace))
            }
            '[' => {
                self.bump();
                Ok(token(TokenKind::LBracket))
            }
            ']' => {
                self.bump();
                Ok(token(TokenKind::RBracket))
            }
            ':' => {
                self.bump();
                Ok(token(TokenKind::Colon))
            }
            ',' => {
                self.bump();
                Ok(token(TokenKind::Comma))
            }
            '"' => {
                let s = self.lex_string()?;
                Ok(token(TokenKind::Str(s)))
            }
            '#' => {
                let kind = self.lex_hash_sentinel()?;
                Ok(token(kind))
            }
            c if c.is_ascii_digit() || c == '-' => {
                let kind = self.lex_number()?;
                Ok(token(kind))
            }
            c if c.is_ascii_alphabetic() => {
                let kind = self.lex_keyword()?;
                Ok(token(kind))
            }
            c => Err(self.error_here(ParseErrorKind::UnexpectedChar(c))),
        }
    }

    fn lex_string(&mut self) -> Result<String, ParseError> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error_here(ParseErrorKind::UnterminatedString));
            };
            match c {
                '"' => return Ok(out),
                '\n' => return Err(self.error_here(ParseErrorKind::UnterminatedString)),
                '\\' => {
                    let Some(esc) = self.bump() else {
                        return Err(self.error_here(ParseErrorKind::UnterminatedString));
                    };
                    match esc {
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => out.push(self.lex_unicode_escape()?),
                        other => {
                            return Err(self.error_here(ParseErrorKind::InvalidEscape(other)));
                        }
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn lex_unicode_escape(&mut self) -> Result<char, ParseError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_here(ParseErrorKind::InvalidUnicodeEscape))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| self.error_here(ParseErrorKind::InvalidUnicodeEscape))
    }

    fn lex_hash_sentinel(&mut self) -> Result<TokenKind, ParseError> {
        for _ in 0..3 {
            match self.chars.peek() {
                Some('#') => {
                    self.bump();
                }
                _ => return Err(self.error_here(ParseErrorKind::UnexpectedChar('#'))),
            }
        }
        let mut word = String::new();
        while matches!(
            self.chars.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
        ) {
            word.push(self.bump().unwrap_or_default());
        }
        if word.is_empty() {
            return Err(self.error_here(ParseErrorKind::MalformedNumber));
        }
        if word.bytes().all(|b| b.is_ascii_digit()) {
            let hash = word
                .parse::<u32>()
                .map_err(|_| self.error_here(ParseErrorKind::HashOutOfRange))?;
            Ok(TokenKind::HashLit(hash))
        } else {
            Ok(TokenKind::HashName(word))
        }
    }

    fn lex_number(&mut self) -> Result<TokenKind, ParseError> {
        let mut text = String::new();
        if matches!(self.chars.peek(), Some('-')) {
            text.push(self.bump().unwrap_or_default());
            // '-inf' lexes as a signed keyword.
            if matches!(self.chars.peek(), Some('i')) {
                return match self.lex_keyword()? {
                    TokenKind::Float(v) => Ok(TokenKind::Float(-v)),
                    _ => Err(self.error_here(ParseErrorKind::MalformedNumber)),
                };
            }
        }
        let mut is_float = false;
        while matches!(
            self.chars.peek(),
            Some(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')
        ) {
            let c = self.bump().unwrap_or_default();
            if matches!(c, '.' | 'e' | 'E') {
                is_float = true;
            }
            text.push(c);
        }
        if is_float {
            return text
                .parse::<f32>()
                .map(TokenKind::Float)
                .map_err(|_| self.error_here(ParseErrorKind::MalformedNumber));
        }
        let digits = text.strip_prefix('-').unwrap_or(&text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error_here(ParseErrorKind::MalformedNumber));
        }
        // Well-formed digits that still fail to parse are out of range.
        text.parse::<i32>()
            .map(TokenKind::Int)
            .map_err(|_| self.error_here(ParseErrorKind::IntOutOfRange))
    }

    fn lex_keyword(&mut self) -> Result<TokenKind, ParseError> {
        let mut word = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_alphabetic()) {
            word.push(self.bump().unwrap_or_default());
        }
        match word.as_str() {
            "true" => Ok(TokenKind::Bool(true)),
            "false" => Ok(TokenKind::Bool(false)),
            "nan" => {
                if matches!(self.chars.peek(), Some('#')) {
                    let bits = self.lex_nan_payload()?;
                    Ok(TokenKind::Float(f32::from_bits(bits)))
                } else {
                    Ok(TokenKind::Float(f32::NAN))
                }
            }
            "inf" => Ok(TokenKind::Float(f32::INFINITY)),
            _ => Err(self.error_here(ParseErrorKind::UnknownWord(word))),
        }
    }

    /// `nan#0x<bits>`: a NaN whose bit pattern differs from the
    /// canonical quiet NaN. The bits must still be a NaN.
    fn lex_nan_payload(&mut self) -> Result<u32, ParseError> {
        self.bump(); // '#'
        if self.bump() != Some('0') || self.bump() != Some('x') {
            return Err(self.error_here(ParseErrorKind::MalformedNumber));
        }
        let mut digits = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_hexdigit()) {
            digits.push(self.bump().unwrap_or_default());
        }
        let bits = u32::from_str_radix(&digits, 16)
            .map_err(|_| self.error_here(ParseErrorKind::MalformedNumber))?;
        if !f32::from_bits(bits).is_nan() {
            return Err(self.error_here(ParseErrorKind::MalformedNumber));
        }
        Ok(bits)
    }

    // ---- grammar ----

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        let token = self.next_token()?;
        self.parse_value_from(token)
    }

    fn parse_value_from(&mut self, token: Token) -> Result<Node, ParseError> {
        // Recursion is bounded so pathological text cannot blow the
        // stack; the limit matches the binary decoder's.
        if matches!(token.kind, TokenKind::LBrace | TokenKind::LBracket) {
            if self.depth >= MAX_DEPTH {
                return Err(token.error(ParseErrorKind::TooDeep { limit: MAX_DEPTH }));
            }
            self.depth += 1;
            let body = match token.kind {
                TokenKind::LBrace => self.parse_object_body(),
                _ => self.parse_array_body(),
            };
            self.depth -= 1;
            return body;
        }
        match token.kind {
            TokenKind::Int(v) => Ok(Node::Int(v)),
            TokenKind::Float(v) => Ok(Node::Float(v)),
            TokenKind::Bool(v) => Ok(Node::Bool(v)),
            TokenKind::Str(s) => Ok(Node::String(s)),
            TokenKind::HashLit(hash) => Ok(Node::HashRef(hash)),
            TokenKind::HashName(name) => Ok(Node::HashRef(name_hash(&name))),
            _ => Err(token.unexpected("a value")),
        }
    }

    fn parse_object_body(&mut self) -> Result<Node, ParseError> {
        let mut fields = Vec::new();
        let mut token = self.next_token()?;
        if matches!(token.kind, TokenKind::RBrace) {
            return Ok(Node::Object(fields));
        }
        loop {
            let key = match token.kind {
                TokenKind::Str(name) => FieldKey::Name(name),
                TokenKind::HashLit(hash) => FieldKey::Unresolved(hash),
                TokenKind::HashName(name) => FieldKey::Name(name),
                _ => return Err(token.unexpected("a field key")),
            };
            let colon = self.next_token()?;
            if !matches!(colon.kind, TokenKind::Colon) {
                return Err(colon.unexpected("':'"));
            }
            fields.push((key, self.parse_value()?));

            let sep = self.next_token()?;
            match sep.kind {
                TokenKind::Comma => token = self.next_token()?,
                TokenKind::RBrace => return Ok(Node::Object(fields)),
                _ => return Err(sep.unexpected("',' or '}'")),
            }
        }
    }

    fn parse_array_body(&mut self) -> Result<Node, ParseError> {
        let mut items = Vec::new();
        let mut token = self.next_token()?;
        if matches!(token.kind, TokenKind::RBracket) {
            return Ok(Node::Array(items));
        }
        loop {
            items.push(self.parse_value_from(token)?);
            let sep = self.next_token()?;
            match sep.kind {
                TokenKind::Comma => token = self.next_token()?,
                TokenKind::RBracket => return Ok(Node::Array(items)),
                _ => return Err(sep.unexpected("',' or ']'")),
            }
        }
    }
}
